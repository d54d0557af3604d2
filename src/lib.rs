/// Skill System Library
///
/// 進度閘控的技能引擎：解鎖/升級進度圖、每等級參數修飾、
/// 冷卻與資源閘控，以及組合可插拔執行效果的發動管線

pub mod activator;
pub mod catalog;
pub mod config;
pub mod effect;
pub mod effects;
pub mod events;
pub mod instance;
pub mod inventory;
pub mod motion;
pub mod params;
pub mod pool;
pub mod stats;
pub mod types;
pub mod util;
pub mod world;

// Re-export commonly used types
pub use crate::activator::SkillActivator;
pub use crate::catalog::{
    ParamModification, RequiredStat, SkillCatalog, SkillConfig, SkillSpec, SkillTier,
};
pub use crate::effect::{EffectEnv, EffectRegistry, EffectSpec, SkillEffect};
pub use crate::effects::{
    DashEffect, DashMotion, ProjectileBurstEffect, ProjectileEngine, ProjectileSeed,
    ProjectileSpawner,
};
pub use crate::events::{EventBus, SkillEvent, StatsEvent};
pub use crate::instance::SkillInstance;
pub use crate::inventory::SkillInventory;
pub use crate::motion::{Motion, MotionDriver, MotionState};
pub use crate::params::{keys, SkillParams};
pub use crate::pool::ActorPool;
pub use crate::stats::ActorStats;
pub use crate::types::{
    DamageType, PassiveModifierSource, ResourceProvider, SkillContext, SkillError,
    SkillPointProvider, SkillRequest, SkillTags, SkillType, StatusGate, WorldAccess,
};
pub use crate::world::SimWorld;
