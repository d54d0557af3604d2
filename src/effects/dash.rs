use crate::effect::{EffectEnv, SkillEffect};
use crate::motion::{Motion, MotionState};
use crate::params::keys;
use crate::types::{SkillContext, WorldAccess};
use serde::{Deserialize, Serialize};
use specs::Entity;
use vek::Vec2;

/// 三次緩出曲線
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// 衝刺效果的授權參數
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DashParams {
    pub distance: f32,
    pub duration: f32,
    pub invulnerability_time: f32,
    /// 衝刺期間是否穿越障礙（暫時換到不碰撞層）
    pub pass_through: bool,
    pub dash_layer: i32,
    pub after_images: i32,
    pub after_image_vfx: String,
    pub trail_vfx: Option<String>,
}

impl Default for DashParams {
    fn default() -> Self {
        DashParams {
            distance: 5.0,
            duration: 0.2,
            invulnerability_time: 0.2,
            pass_through: true,
            dash_layer: 8,
            after_images: 3,
            after_image_vfx: "afterimage".to_string(),
            trail_vfx: None,
        }
    }
}

/// 衝刺效果
///
/// 發動時把位移延續體交給驅動器，之後由幀迴圈推進；
/// 發動當下即進入無敵與穿越狀態
#[derive(Clone, Debug)]
pub struct DashEffect {
    params: DashParams,
}

impl DashEffect {
    pub fn new(params: DashParams) -> Self {
        DashEffect { params }
    }
}

impl SkillEffect for DashEffect {
    fn name(&self) -> &str {
        "dash"
    }

    fn can_execute(&self, ctx: &SkillContext) -> bool {
        // 衝刺需要有效方向
        ctx.direction.magnitude_squared() > 1e-4
    }

    fn on_activate(&self, ctx: &SkillContext, env: &mut EffectEnv) {
        let base = &self.params;
        let distance = ctx.params.get(keys::DASH_DISTANCE, base.distance);
        let duration = ctx.params.get(keys::DURATION, base.duration).max(0.01);
        let invulnerability =
            ctx.params.get(keys::INVULNERABILITY_TIME, base.invulnerability_time);

        let direction = ctx.direction.normalized();
        let start = env
            .world
            .get_position(ctx.caster)
            .unwrap_or(ctx.caster_pos);

        let original_layer = env.world.collision_layer(ctx.caster);
        if base.pass_through {
            env.world.set_collision_layer(ctx.caster, base.dash_layer);
        }
        env.world.set_invulnerable(ctx.caster, true);
        if let Some(vfx) = &base.trail_vfx {
            env.world.spawn_visual(vfx, start);
        }

        env.motions.push(Box::new(DashMotion::new(
            ctx.caster,
            start,
            start + direction * distance,
            duration,
            invulnerability,
            base.pass_through,
            original_layer,
            base.after_images,
            base.after_image_vfx.clone(),
        )));
    }
}

/// 衝刺位移延續體
///
/// 位移階段以緩出曲線插值，結束時對齊終點並回復碰撞層；
/// 若無敵時間超過位移時間，剩餘窗口在位移完成後繼續倒數
#[derive(Clone, Debug)]
pub struct DashMotion {
    caster: Entity,
    start: Vec2<f32>,
    target: Vec2<f32>,
    duration: f32,
    /// 無敵持續到 max(duration, invulnerability_time)
    invuln_until: f32,
    elapsed: f32,
    pass_through: bool,
    original_layer: i32,
    layer_restored: bool,
    move_done: bool,
    after_images: i32,
    images_spawned: i32,
    image_interval: f32,
    after_image_vfx: String,
}

impl DashMotion {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        caster: Entity,
        start: Vec2<f32>,
        target: Vec2<f32>,
        duration: f32,
        invulnerability_time: f32,
        pass_through: bool,
        original_layer: i32,
        after_images: i32,
        after_image_vfx: String,
    ) -> Self {
        let image_interval = if after_images > 0 {
            duration / (after_images + 1) as f32
        } else {
            0.0
        };
        DashMotion {
            caster,
            start,
            target,
            duration,
            invuln_until: duration.max(invulnerability_time),
            elapsed: 0.0,
            pass_through,
            original_layer,
            layer_restored: false,
            move_done: false,
            after_images,
            images_spawned: 0,
            image_interval,
            after_image_vfx,
        }
    }

    pub fn is_invulnerable(&self) -> bool {
        self.elapsed < self.invuln_until
    }

    fn restore_layer(&mut self, world: &mut dyn WorldAccess) {
        if self.pass_through && !self.layer_restored {
            world.set_collision_layer(self.caster, self.original_layer);
            self.layer_restored = true;
        }
    }
}

impl Motion for DashMotion {
    fn advance(&mut self, world: &mut dyn WorldAccess, dt: f32) -> MotionState {
        // 比較都帶小量容差，抵銷 dt 累加的浮點誤差
        const EPS: f32 = 1e-4;
        self.elapsed += dt;

        if !self.move_done {
            let t = (self.elapsed / self.duration).min(1.0);
            let pos = self.start + (self.target - self.start) * ease_out_cubic(t);
            world.set_position(self.caster, pos);

            while self.images_spawned < self.after_images
                && self.elapsed + EPS >= self.image_interval * (self.images_spawned + 1) as f32
            {
                world.spawn_visual(&self.after_image_vfx, pos);
                self.images_spawned += 1;
            }

            if self.elapsed + EPS >= self.duration {
                // 終點對齊
                world.set_position(self.caster, self.target);
                self.restore_layer(world);
                self.move_done = true;
            }
        }

        if self.move_done && self.elapsed + EPS >= self.invuln_until {
            world.set_invulnerable(self.caster, false);
            return MotionState::Finished;
        }

        MotionState::Continuing
    }

    fn cancel(&mut self, world: &mut dyn WorldAccess) {
        self.restore_layer(world);
        world.set_invulnerable(self.caster, false);
        self.move_done = true;
        self.elapsed = self.invuln_until;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimWorld;

    fn dash_motion(
        world: &mut SimWorld,
        duration: f32,
        invulnerability: f32,
        after_images: i32,
    ) -> (Entity, DashMotion) {
        let caster = world.spawn_actor(Vec2::zero(), 100.0);
        world.set_invulnerable(caster, true);
        let motion = DashMotion::new(
            caster,
            Vec2::zero(),
            Vec2::new(5.0, 0.0),
            duration,
            invulnerability,
            true,
            0,
            after_images,
            "afterimage".to_string(),
        );
        world.set_collision_layer(caster, 8);
        (caster, motion)
    }

    #[test]
    fn test_ease_out_cubic_shape() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        // 前段速度高於線性
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn test_dash_reaches_target_with_trailing_invulnerability() {
        // distance=5, duration=0.2, invulnerability=0.5 → 位移結束後無敵再持續 0.3
        let mut world = SimWorld::new();
        let (caster, mut motion) = dash_motion(&mut world, 0.2, 0.5, 0);

        let mut state = MotionState::Continuing;
        for _ in 0..4 {
            state = motion.advance(&mut world, 0.05);
        }
        // 位移完成：位置精確落在終點，碰撞層回復，但仍無敵
        assert_eq!(state, MotionState::Continuing);
        assert_eq!(world.get_position(caster).unwrap(), Vec2::new(5.0, 0.0));
        assert_eq!(world.collision_layer(caster), 0);
        assert!(world.is_invulnerable(caster));

        // 再 0.25：仍在無敵窗口內
        for _ in 0..5 {
            state = motion.advance(&mut world, 0.05);
        }
        assert_eq!(state, MotionState::Continuing);
        assert!(world.is_invulnerable(caster));

        // 跨過 0.5 總時長後結束且解除無敵
        state = motion.advance(&mut world, 0.05);
        assert_eq!(state, MotionState::Finished);
        assert!(!world.is_invulnerable(caster));
    }

    #[test]
    fn test_dash_without_trailing_window_ends_at_duration() {
        let mut world = SimWorld::new();
        let (caster, mut motion) = dash_motion(&mut world, 0.2, 0.1, 0);

        let mut state = MotionState::Continuing;
        for _ in 0..4 {
            state = motion.advance(&mut world, 0.05);
        }
        assert_eq!(state, MotionState::Finished);
        assert!(!world.is_invulnerable(caster));
        assert_eq!(world.get_position(caster).unwrap(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_dash_position_follows_ease_out() {
        let mut world = SimWorld::new();
        let (caster, mut motion) = dash_motion(&mut world, 0.2, 0.0, 0);

        motion.advance(&mut world, 0.1);
        let halfway = world.get_position(caster).unwrap().x;
        assert!((halfway - 5.0 * ease_out_cubic(0.5)).abs() < 1e-4);
    }

    #[test]
    fn test_after_images_spawned_at_intervals() {
        let mut world = SimWorld::new();
        let (_caster, mut motion) = dash_motion(&mut world, 0.2, 0.0, 3);

        for _ in 0..4 {
            motion.advance(&mut world, 0.05);
        }
        let images = world
            .visuals()
            .iter()
            .filter(|(handle, _)| handle == "afterimage")
            .count();
        assert_eq!(images, 3);
    }

    #[test]
    fn test_cancel_restores_world_state() {
        let mut world = SimWorld::new();
        let (caster, mut motion) = dash_motion(&mut world, 0.2, 0.5, 0);

        motion.advance(&mut world, 0.05);
        motion.cancel(&mut world);
        assert_eq!(world.collision_layer(caster), 0);
        assert!(!world.is_invulnerable(caster));
    }
}
