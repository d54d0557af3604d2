use crate::catalog::SkillConfig;
use crate::events::{EventBus, SkillEvent};
use crate::params::{keys, SkillParams};
use specs::Entity;
use std::sync::Arc;

/// 最短冷卻時間，避免零長或負值冷卻
const MIN_COOLDOWN: f32 = 0.1;

/// 技能實例 - 單一角色對單一技能的執行期狀態機
///
/// 狀態：Locked (level=0) → Unlocked (level>=1, 冷卻中或可用)。
/// 等級除明確 reset 外單調不減；
/// 所有變更操作在前置條件不符時皆為 no-op，不丟錯誤
#[derive(Clone, Debug)]
pub struct SkillInstance {
    config: Arc<SkillConfig>,
    owner: Entity,
    current_level: i32,
    cooldown_remaining: f32,
    global_cooldown_remaining: f32,
    /// -1 表示未指派；指派中的槽位在同一角色內唯一
    pub slot: i32,
    cached_params: SkillParams,
    params_dirty: bool,
}

impl SkillInstance {
    pub fn new(config: Arc<SkillConfig>, owner: Entity) -> Self {
        SkillInstance {
            config,
            owner,
            current_level: 0,
            cooldown_remaining: 0.0,
            global_cooldown_remaining: 0.0,
            slot: -1,
            cached_params: SkillParams::new(),
            params_dirty: true,
        }
    }

    pub fn config(&self) -> &Arc<SkillConfig> {
        &self.config
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn current_level(&self) -> i32 {
        self.current_level
    }

    pub fn is_unlocked(&self) -> bool {
        self.current_level > 0
    }

    pub fn is_max_level(&self) -> bool {
        self.current_level >= self.config.max_level
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining <= 0.0 && self.global_cooldown_remaining <= 0.0
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    pub fn global_cooldown_remaining(&self) -> f32 {
        self.global_cooldown_remaining
    }

    /// 冷卻進度 0..1，可用時為 1
    pub fn cooldown_progress(&self) -> f32 {
        if self.config.base_cooldown > 0.0 {
            1.0 - (self.cooldown_remaining / self.config.base_cooldown).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// 解鎖：Locked → level 1，已解鎖時 no-op
    pub fn unlock(&mut self, bus: &EventBus<SkillEvent>) {
        if self.is_unlocked() {
            return;
        }
        self.current_level = 1;
        self.params_dirty = true;
        bus.emit_now(SkillEvent::SkillUnlocked {
            skill_id: self.config.id.clone(),
            owner: self.owner,
        });
    }

    /// 升級：已達 max_level 時 no-op
    pub fn level_up(&mut self, bus: &EventBus<SkillEvent>) {
        if self.is_max_level() {
            return;
        }
        self.current_level += 1;
        self.params_dirty = true;
        bus.emit_now(SkillEvent::SkillLevelUp {
            skill_id: self.config.id.clone(),
            owner: self.owner,
            level: self.current_level,
        });
    }

    /// 每幀推進冷卻
    ///
    /// 自身冷卻由 >0 落到 <=0 的那一幀發出 SkillReady；
    /// 仍在冷卻時每次呼叫回報一次 CooldownUpdate
    pub fn update(&mut self, dt: f32, bus: &EventBus<SkillEvent>) {
        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining -= dt;
            if self.cooldown_remaining <= 0.0 {
                self.cooldown_remaining = 0.0;
                bus.emit_now(SkillEvent::SkillReady {
                    skill_id: self.config.id.clone(),
                    owner: self.owner,
                });
            } else {
                bus.emit_now(SkillEvent::CooldownUpdate {
                    skill_id: self.config.id.clone(),
                    owner: self.owner,
                    remaining: self.cooldown_remaining,
                });
            }
        }

        if self.global_cooldown_remaining > 0.0 {
            self.global_cooldown_remaining = (self.global_cooldown_remaining - dt).max(0.0);
        }
    }

    /// 進入冷卻
    ///
    /// final = base * modifier * (1 - cooldownReduction)，下限 0.1
    pub fn start_cooldown(&mut self, cooldown_modifier: f32, global_cooldown: f32) {
        let reduction = self.params().get(keys::COOLDOWN_REDUCTION, 0.0);
        let final_cooldown = self.config.base_cooldown * cooldown_modifier * (1.0 - reduction);
        self.cooldown_remaining = final_cooldown.max(MIN_COOLDOWN);
        self.global_cooldown_remaining = global_cooldown;
    }

    /// 依基礎耗魔與 manaCostReduction 算出本次費用，下限 0
    pub fn cost(&mut self) -> f32 {
        let reduction = self.params().get(keys::MANA_COST_REDUCTION, 0.0);
        (self.config.base_cost * (1.0 - reduction)).max(0.0)
    }

    /// 取得參數表，需要時先重建快取
    pub fn params(&mut self) -> &SkillParams {
        if self.params_dirty {
            self.rebuild_params();
        }
        &self.cached_params
    }

    /// 重建：清空後按層內授權順序套用每條修飾，不殘留舊值
    fn rebuild_params(&mut self) {
        self.cached_params.clear();
        if let Some(tier) = self.config.resolve_tier(self.current_level) {
            for modification in &tier.modifications {
                if modification.override_base {
                    self.cached_params
                        .set_base(&modification.key, modification.override_value);
                } else {
                    self.cached_params.add_modifier(
                        &modification.key,
                        modification.additive,
                        modification.multiplicative,
                    );
                }
            }
        }
        self.params_dirty = false;
    }

    /// 明確重置回未解鎖，唯一被允許的非單調轉移（洗點用）
    pub fn reset(&mut self) {
        self.current_level = 0;
        self.slot = -1;
        self.cooldown_remaining = 0.0;
        self.global_cooldown_remaining = 0.0;
        self.params_dirty = true;
    }
}
