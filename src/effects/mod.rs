/// 內建技能效果
///
/// 投射物齊射與衝刺是效果契約的兩個參考實作，
/// 其餘效果由使用端透過 `EffectRegistry::register` 擴充

pub mod dash;
pub mod projectile;

pub use dash::{DashEffect, DashMotion, DashParams};
pub use projectile::{
    falloff_damage, ProjectileBurstEffect, ProjectileBurstParams, ProjectileEngine,
    ProjectileSeed, ProjectileSpawner,
};

use crate::effect::EffectRegistry;
use crate::types::SkillError;
use std::sync::Arc;

/// 註冊內建效果建構器
pub fn register_builtin(registry: &mut EffectRegistry) {
    registry.register("projectile_burst", |params| {
        let params: ProjectileBurstParams =
            serde_json::from_value(serde_json::Value::Object(params.clone()))
                .map_err(|e| SkillError::Parse(e.to_string()))?;
        Ok(Arc::new(ProjectileBurstEffect::new(params)) as Arc<dyn crate::effect::SkillEffect>)
    });
    registry.register("dash", |params| {
        let params: DashParams = serde_json::from_value(serde_json::Value::Object(params.clone()))
            .map_err(|e| SkillError::Parse(e.to_string()))?;
        Ok(Arc::new(DashEffect::new(params)) as Arc<dyn crate::effect::SkillEffect>)
    });
}
