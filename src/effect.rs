use crate::effects::projectile::ProjectileSpawner;
use crate::motion::MotionDriver;
use crate::types::{SkillContext, SkillError, WorldAccess};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 效果執行環境 - 效果在發動期間可觸及的外部能力
pub struct EffectEnv<'a> {
    pub world: &'a mut dyn WorldAccess,
    pub motions: &'a mut MotionDriver,
    pub projectiles: &'a mut dyn ProjectileSpawner,
}

/// 技能效果介面
///
/// 四階段生命週期，效果本身對技能無狀態；
/// 跨幀狀態放進它產生的延續體或投射物
pub trait SkillEffect: Send + Sync + std::fmt::Debug {
    /// 效果種類名，與註冊表鍵一致
    fn name(&self) -> &str;

    /// 唯讀前置檢查，不得有副作用
    fn can_execute(&self, _ctx: &SkillContext) -> bool {
        true
    }

    fn on_activate(&self, ctx: &SkillContext, env: &mut EffectEnv);

    /// 持續型效果的逐幀回呼
    fn on_tick(&self, _ctx: &SkillContext, _env: &mut EffectEnv) {}

    /// 清理
    fn on_deactivate(&self, _ctx: &SkillContext, _env: &mut EffectEnv) {}
}

/// 授權資料中的效果描述
///
/// kind 對應註冊表的建構器，其餘欄位原樣交給建構器解析
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EffectSpec {
    pub kind: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl EffectSpec {
    pub fn new(kind: &str) -> Self {
        EffectSpec {
            kind: kind.to_string(),
            params: serde_json::Map::new(),
        }
    }
}

type EffectBuilder =
    Box<dyn Fn(&serde_json::Map<String, serde_json::Value>) -> Result<Arc<dyn SkillEffect>, SkillError> + Send + Sync>;

/// 效果註冊表
///
/// 效果種類在目錄載入時一次解析成效果物件，
/// 之後新增技能只動授權資料，不動發動管線
pub struct EffectRegistry {
    builders: HashMap<String, EffectBuilder>,
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("builders", &format!("{} builders", self.builders.len()))
            .finish()
    }
}

impl EffectRegistry {
    pub fn new() -> Self {
        EffectRegistry {
            builders: HashMap::new(),
        }
    }

    /// 含內建效果（投射物齊射、衝刺）的註冊表
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::effects::register_builtin(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, kind: &str, builder: F)
    where
        F: Fn(&serde_json::Map<String, serde_json::Value>) -> Result<Arc<dyn SkillEffect>, SkillError>
            + Send
            + Sync
            + 'static,
    {
        self.builders.insert(kind.to_string(), Box::new(builder));
    }

    /// 由授權描述建出效果物件
    pub fn build(&self, spec: &EffectSpec) -> Result<Arc<dyn SkillEffect>, SkillError> {
        let builder = self
            .builders
            .get(&spec.kind)
            .ok_or_else(|| SkillError::UnknownEffect(spec.kind.clone()))?;
        builder(&spec.params)
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
