use crate::effect::EffectEnv;
use crate::events::{EventBus, SkillEvent};
use crate::instance::SkillInstance;
use crate::types::{PassiveModifierSource, ResourceProvider, SkillContext, StatusGate};
use log::debug;

/// 技能發動器 - 無狀態的管線協調者
///
/// 驗證 → 扣費 → 執行效果 → 進入冷卻 → 發佈事件。
/// 費用在效果之前提交：效果中途出錯不會讓扣費記帳不同步，
/// 代價是效果失敗時資源照樣消耗（既定取捨，非缺陷）
#[derive(Clone, Debug)]
pub struct SkillActivator {
    /// 任一技能發動後的共用短鎖定
    pub global_cooldown: f32,
}

impl Default for SkillActivator {
    fn default() -> Self {
        SkillActivator {
            global_cooldown: 0.5,
        }
    }
}

impl SkillActivator {
    pub fn new(global_cooldown: f32) -> Self {
        SkillActivator { global_cooldown }
    }

    /// 唯讀可發動檢查，由便宜到昂貴短路求值：
    /// 已解鎖且冷卻完畢 → 狀態閘門未禁用 → 每個基礎效果同意執行。
    ///
    /// 費用負擔刻意不在這裡檢查，扣費交由 activate 的交易式
    /// try_consume 一步完成；UI 要預先灰掉圖示的話應直接問
    /// 資源提供者的 can_afford
    pub fn can_activate(
        &self,
        skill: &SkillInstance,
        ctx: &SkillContext,
        status: Option<&dyn StatusGate>,
    ) -> bool {
        if !skill.is_unlocked() || !skill.is_ready() {
            return false;
        }
        if let Some(gate) = status {
            if gate.is_disabled() {
                return false;
            }
        }
        for effect in &skill.config().base_effects {
            if !effect.can_execute(ctx) {
                return false;
            }
        }
        true
    }

    /// 被動來源與狀態修正的乘積，缺席的協作者視為 1
    pub fn cooldown_modifier(
        &self,
        passives: Option<&dyn PassiveModifierSource>,
        status: Option<&dyn StatusGate>,
    ) -> f32 {
        let passive = passives
            .map(|p| p.global_cooldown_modifier())
            .unwrap_or(1.0);
        let status = status.map(|s| s.cooldown_modifier()).unwrap_or(1.0);
        passive * status
    }

    /// 發動技能
    ///
    /// 任一階段拒絕時靜默中止且不留下部分提交：
    /// 扣費被拒 → 沒有冷卻、沒有效果、沒有事件
    pub fn activate(
        &self,
        skill: &mut SkillInstance,
        ctx: &mut SkillContext,
        resources: &mut dyn ResourceProvider,
        status: Option<&dyn StatusGate>,
        passives: Option<&dyn PassiveModifierSource>,
        env: &mut EffectEnv,
        bus: &EventBus<SkillEvent>,
    ) -> bool {
        if !self.can_activate(skill, ctx, status) {
            return false;
        }

        let cost = skill.cost();
        if !resources.try_consume(cost) {
            debug!("技能 {} 資源不足 (需要 {:.1})", skill.id(), cost);
            return false;
        }

        ctx.skill_level = skill.current_level();
        ctx.params = skill.params().clone();

        // 效果物件在目錄載入時就已解析，這裡只照授權順序執行
        let config = skill.config().clone();
        for effect in &config.base_effects {
            effect.on_activate(ctx, env);
        }
        if let Some(tier) = config.resolve_tier(skill.current_level()) {
            for effect in &tier.additional_effects {
                effect.on_activate(ctx, env);
            }
        }

        let modifier = self.cooldown_modifier(passives, status);
        skill.start_cooldown(modifier, self.global_cooldown);

        bus.emit_now(SkillEvent::SkillActivated {
            skill_id: config.id.clone(),
            caster: ctx.caster,
            level: ctx.skill_level,
        });

        // 表現層提示：投遞即忘，後續失敗不回滾已提交的狀態
        if config.cast_vfx.is_some() || config.cast_sound.is_some() {
            bus.emit_now(SkillEvent::CastFx {
                vfx: config.cast_vfx.clone(),
                sound: config.cast_sound.clone(),
                pos: ctx.caster_pos,
            });
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SkillConfig, SkillSpec};
    use crate::effect::EffectRegistry;
    use crate::effects::ProjectileEngine;
    use crate::motion::MotionDriver;
    use crate::stats::ActorStats;
    use crate::world::SimWorld;
    use std::sync::Arc;
    use vek::Vec2;

    struct Silenced;

    impl StatusGate for Silenced {
        fn is_disabled(&self) -> bool {
            true
        }
    }

    struct Haste;

    impl StatusGate for Haste {
        fn is_disabled(&self) -> bool {
            false
        }

        fn cooldown_modifier(&self) -> f32 {
            0.5
        }
    }

    struct PassiveHaste;

    impl PassiveModifierSource for PassiveHaste {
        fn global_cooldown_modifier(&self) -> f32 {
            0.8
        }
    }

    fn fireball_config() -> Arc<SkillConfig> {
        let registry = EffectRegistry::with_builtin();
        let json = r#"{
            "name": "火球",
            "base_cooldown": 2.0,
            "base_cost": 10.0,
            "cast_vfx": "cast_flash",
            "effects": [{ "kind": "projectile_burst", "damage": 20.0, "speed": 10.0 }]
        }"#;
        let spec: SkillSpec = serde_json::from_str(json).unwrap();
        Arc::new(SkillConfig::from_spec("fireball", spec, &registry).unwrap())
    }

    struct Fixture {
        world: SimWorld,
        caster: specs::Entity,
        skill: SkillInstance,
        stats: ActorStats,
        motions: MotionDriver,
        projectiles: ProjectileEngine,
        bus: EventBus<SkillEvent>,
    }

    fn fixture() -> Fixture {
        let mut world = SimWorld::new();
        let caster = world.spawn_actor(Vec2::zero(), 100.0);
        let bus = EventBus::new();
        let mut skill = SkillInstance::new(fireball_config(), caster);
        skill.unlock(&bus);
        Fixture {
            world,
            caster,
            skill,
            stats: ActorStats::new(50.0, 0.0),
            motions: MotionDriver::new(),
            projectiles: ProjectileEngine::new(),
            bus,
        }
    }

    #[test]
    fn test_activate_happy_path() {
        let mut f = fixture();
        let rx = f.bus.subscribe();
        let mut ctx = SkillContext::new(f.caster, Vec2::zero(), Vec2::new(1.0, 0.0));

        let activator = SkillActivator::default();
        let mut env = EffectEnv {
            world: &mut f.world,
            motions: &mut f.motions,
            projectiles: &mut f.projectiles,
        };
        assert!(activator.activate(
            &mut f.skill,
            &mut ctx,
            &mut f.stats,
            None,
            None,
            &mut env,
            &f.bus,
        ));

        assert_eq!(f.stats.current(), 40.0);
        assert_eq!(f.projectiles.active_count(), 1);
        assert!((f.skill.cooldown_remaining() - 2.0).abs() < 1e-5);
        assert!((f.skill.global_cooldown_remaining() - 0.5).abs() < 1e-5);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, SkillEvent::SkillActivated { skill_id, .. } if skill_id == "fireball")));
        assert!(events
            .iter()
            .any(|e| matches!(e, SkillEvent::CastFx { .. })));
    }

    #[test]
    fn test_denied_consumption_leaves_state_untouched() {
        let mut f = fixture();
        f.stats = ActorStats::new(5.0, 0.0); // 不夠付 10
        let rx = f.bus.subscribe();
        let mut ctx = SkillContext::new(f.caster, Vec2::zero(), Vec2::new(1.0, 0.0));

        let activator = SkillActivator::default();
        let mut env = EffectEnv {
            world: &mut f.world,
            motions: &mut f.motions,
            projectiles: &mut f.projectiles,
        };
        assert!(!activator.activate(
            &mut f.skill,
            &mut ctx,
            &mut f.stats,
            None,
            None,
            &mut env,
            &f.bus,
        ));

        // 冷卻沒動、效果沒跑、事件沒發
        assert_eq!(f.skill.cooldown_remaining(), 0.0);
        assert!(f.skill.is_ready());
        assert_eq!(f.projectiles.active_count(), 0);
        assert!(rx.try_iter().next().is_none());
        assert_eq!(f.stats.current(), 5.0);
    }

    #[test]
    fn test_locked_or_cooling_skill_rejected() {
        let mut f = fixture();
        let ctx = SkillContext::new(f.caster, Vec2::zero(), Vec2::new(1.0, 0.0));
        let activator = SkillActivator::default();

        f.skill.start_cooldown(1.0, 0.0);
        assert!(!activator.can_activate(&f.skill, &ctx, None));

        let locked = SkillInstance::new(fireball_config(), f.caster);
        assert!(!activator.can_activate(&locked, &ctx, None));
    }

    #[test]
    fn test_status_gate_blocks() {
        let f = fixture();
        let ctx = SkillContext::new(f.caster, Vec2::zero(), Vec2::new(1.0, 0.0));
        let activator = SkillActivator::default();
        assert!(!activator.can_activate(&f.skill, &ctx, Some(&Silenced)));
        assert!(activator.can_activate(&f.skill, &ctx, None));
    }

    #[test]
    fn test_effect_can_execute_consulted() {
        let f = fixture();
        let activator = SkillActivator::default();
        // 齊射效果拒絕零向量瞄準
        let ctx = SkillContext::new(f.caster, Vec2::zero(), Vec2::zero());
        assert!(!activator.can_activate(&f.skill, &ctx, None));
    }

    #[test]
    fn test_cost_not_part_of_can_activate() {
        let mut f = fixture();
        f.stats = ActorStats::new(0.0, 0.0);
        let ctx = SkillContext::new(f.caster, Vec2::zero(), Vec2::new(1.0, 0.0));
        let activator = SkillActivator::default();
        // 付不起也通過唯讀檢查，扣費在 activate 內交易式處理
        assert!(activator.can_activate(&f.skill, &ctx, None));
    }

    #[test]
    fn test_cooldown_modifier_composition() {
        let activator = SkillActivator::default();
        assert_eq!(activator.cooldown_modifier(None, None), 1.0);
        assert_eq!(activator.cooldown_modifier(Some(&PassiveHaste), None), 0.8);
        assert!(
            (activator.cooldown_modifier(Some(&PassiveHaste), Some(&Haste)) - 0.4).abs() < 1e-6
        );
    }

    #[test]
    fn test_modified_cooldown_applied() {
        let mut f = fixture();
        let mut ctx = SkillContext::new(f.caster, Vec2::zero(), Vec2::new(1.0, 0.0));
        let activator = SkillActivator::default();
        let mut env = EffectEnv {
            world: &mut f.world,
            motions: &mut f.motions,
            projectiles: &mut f.projectiles,
        };
        assert!(activator.activate(
            &mut f.skill,
            &mut ctx,
            &mut f.stats,
            Some(&Haste),
            Some(&PassiveHaste),
            &mut env,
            &f.bus,
        ));
        // 2.0 * 0.8 * 0.5 = 0.8
        assert!((f.skill.cooldown_remaining() - 0.8).abs() < 1e-5);
    }
}
