use crate::params::SkillParams;
use serde::{Deserialize, Serialize};
use specs::Entity;
use thiserror::Error;
use vek::Vec2;

/// 技能類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    Active,    // 主動技能
    Passive,   // 被動技能
    Triggered, // 條件觸發
    Toggle,    // 切換技能
}

impl Default for SkillType {
    fn default() -> Self {
        SkillType::Active
    }
}

/// 傷害類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Physical,
    Magical,
    Pure,
    True,
}

impl Default for DamageType {
    fn default() -> Self {
        DamageType::Magical
    }
}

/// 技能標籤位元集
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTags(pub u32);

impl SkillTags {
    pub const NONE: SkillTags = SkillTags(0);
    pub const PHYSICAL: SkillTags = SkillTags(1 << 0);
    pub const MAGICAL: SkillTags = SkillTags(1 << 1);
    pub const FIRE: SkillTags = SkillTags(1 << 2);
    pub const ICE: SkillTags = SkillTags(1 << 3);
    pub const LIGHTNING: SkillTags = SkillTags(1 << 4);
    pub const MELEE: SkillTags = SkillTags(1 << 5);
    pub const RANGED: SkillTags = SkillTags(1 << 6);
    pub const AREA: SkillTags = SkillTags(1 << 7);
    pub const BUFF: SkillTags = SkillTags(1 << 8);
    pub const DEBUFF: SkillTags = SkillTags(1 << 9);
    pub const MOVEMENT: SkillTags = SkillTags(1 << 10);

    pub fn contains(&self, other: SkillTags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: SkillTags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for SkillTags {
    type Output = SkillTags;

    fn bitor(self, rhs: SkillTags) -> SkillTags {
        SkillTags(self.0 | rhs.0)
    }
}

/// 技能系統錯誤
///
/// 只涵蓋目錄載入與驗證；前置條件未滿足一律以 bool/no-op 表達，不走這裡
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("未知技能: {0}")]
    UnknownSkill(String),
    #[error("技能設定無效 {id}: {reason}")]
    InvalidConfig { id: String, reason: String },
    #[error("未知效果種類: {0}")]
    UnknownEffect(String),
    #[error("目錄讀取失敗: {0}")]
    Io(#[from] std::io::Error),
    #[error("目錄解析失敗: {0}")]
    Parse(String),
}

/// 資源提供者（法力之類的消耗池）
pub trait ResourceProvider {
    fn current(&self) -> f32;
    fn maximum(&self) -> f32;
    fn can_afford(&self, cost: f32) -> bool;
    /// 原子性的檢查並扣除
    fn try_consume(&mut self, cost: f32) -> bool;
    fn restore(&mut self, amount: f32);
}

/// 技能點提供者
pub trait SkillPointProvider {
    fn available_points(&self) -> i32;
    fn try_spend(&mut self, amount: i32) -> bool;
    fn add_points(&mut self, amount: i32);
}

/// 狀態閘門 - 沉默、暈眩等禁用狀態與冷卻修正
pub trait StatusGate {
    fn is_disabled(&self) -> bool;

    fn cooldown_modifier(&self) -> f32 {
        1.0
    }
}

/// 被動技能提供的全域冷卻修正來源
pub trait PassiveModifierSource {
    fn global_cooldown_modifier(&self) -> f32 {
        1.0
    }
}

/// 世界存取介面
///
/// 技能效果對模擬世界的唯一窗口：位置、範圍查詢、傷害、
/// 碰撞層與表現層提示都經由這裡，核心不直接依賴任何實體儲存
pub trait WorldAccess {
    fn get_position(&self, entity: Entity) -> Option<Vec2<f32>>;

    /// 位移接收端，衝刺等效果用它移動角色
    fn set_position(&mut self, entity: Entity, pos: Vec2<f32>);

    fn entities_in_range(&self, center: Vec2<f32>, radius: f32) -> Vec<Entity>;

    fn is_alive(&self, entity: Entity) -> bool;

    fn apply_damage(&mut self, target: Entity, amount: f32, damage_type: DamageType, source: Entity);

    fn collision_layer(&self, _entity: Entity) -> i32 {
        0
    }

    fn set_collision_layer(&mut self, _entity: Entity, _layer: i32) {}

    fn set_invulnerable(&mut self, _entity: Entity, _on: bool) {}

    /// 表現層提示（殘影、爆炸特效），失敗不影響模擬
    fn spawn_visual(&mut self, _handle: &str, _pos: Vec2<f32>) {}
}

/// 單次發動貫穿整條管線的情境，不持久化
#[derive(Clone, Debug)]
pub struct SkillContext {
    pub caster: Entity,
    pub caster_pos: Vec2<f32>,
    pub target_pos: Option<Vec2<f32>>,
    pub target_entity: Option<Entity>,
    /// 瞄準方向
    pub direction: Vec2<f32>,
    /// 由 activate 填入
    pub skill_level: i32,
    /// 由 activate 填入，為實例參數表的快照
    pub params: SkillParams,
    pub dt: f32,
}

impl SkillContext {
    pub fn new(caster: Entity, caster_pos: Vec2<f32>, direction: Vec2<f32>) -> Self {
        SkillContext {
            caster,
            caster_pos,
            target_pos: None,
            target_entity: None,
            direction,
            skill_level: 0,
            params: SkillParams::new(),
            dt: 0.0,
        }
    }

    pub fn with_target_pos(mut self, pos: Vec2<f32>) -> Self {
        self.target_pos = Some(pos);
        self
    }

    pub fn with_target_entity(mut self, target: Entity) -> Self {
        self.target_entity = Some(target);
        self
    }
}

/// 技能使用請求
#[derive(Clone, Debug)]
pub struct SkillRequest {
    pub caster: Entity,
    pub skill_id: String,
    pub target_pos: Option<Vec2<f32>>,
    pub target_entity: Option<Entity>,
}

impl SkillRequest {
    /// 無目標（自身）施放
    pub fn self_cast(caster: Entity, skill_id: &str) -> Self {
        SkillRequest {
            caster,
            skill_id: skill_id.to_string(),
            target_pos: None,
            target_entity: None,
        }
    }

    /// 地面點目標施放
    pub fn point_cast(caster: Entity, skill_id: &str, target_pos: Vec2<f32>) -> Self {
        SkillRequest {
            caster,
            skill_id: skill_id.to_string(),
            target_pos: Some(target_pos),
            target_entity: None,
        }
    }

    /// 單位目標施放
    pub fn unit_cast(caster: Entity, skill_id: &str, target: Entity) -> Self {
        SkillRequest {
            caster,
            skill_id: skill_id.to_string(),
            target_pos: None,
            target_entity: Some(target),
        }
    }
}
