use crate::effect::{EffectEnv, SkillEffect};
use crate::motion::MotionState;
use crate::params::keys;
use crate::pool::ActorPool;
use crate::types::{DamageType, SkillContext, WorldAccess};
use log::warn;
use serde::{Deserialize, Serialize};
use specs::Entity;
use uuid::Uuid;
use vek::Vec2;

/// 爆炸範圍傷害衰減
///
/// 至少保留 50%，避免爆炸邊緣的傷害趨近於零
pub fn falloff_damage(damage: f32, distance: f32, radius: f32) -> f32 {
    damage * (1.0 - distance / radius).max(0.5)
}

/// 齊射扇形的每發方向
///
/// 單發時直接沿瞄準方向；多發時以 spread/(n-1) 為間隔、
/// 自 -spread/2 起均勻展開（spread 單位為度）
pub fn fan_directions(direction: Vec2<f32>, count: i32, spread_deg: f32) -> Vec<Vec2<f32>> {
    if count <= 1 {
        return vec![direction];
    }
    let step = spread_deg / (count - 1) as f32;
    let start = -spread_deg / 2.0;
    (0..count)
        .map(|i| {
            let angle = (start + step * i as f32).to_radians();
            direction.rotated_z(angle)
        })
        .collect()
}

/// 投射物齊射效果的授權參數
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileBurstParams {
    pub archetype: String,
    pub speed: f32,
    pub damage: f32,
    pub damage_type: DamageType,
    pub lifetime: f32,
    pub count: i32,
    pub spread_angle: f32,
    pub hit_radius: f32,
    pub explosion_radius: f32,
    pub impact_vfx: Option<String>,
}

impl Default for ProjectileBurstParams {
    fn default() -> Self {
        ProjectileBurstParams {
            archetype: "projectile".to_string(),
            speed: 10.0,
            damage: 20.0,
            damage_type: DamageType::Magical,
            lifetime: 5.0,
            count: 1,
            spread_angle: 15.0,
            hit_radius: 0.5,
            explosion_radius: 0.0,
            impact_vfx: None,
        }
    }
}

/// 投射物齊射效果
///
/// 發動時生成 N 發投射物，實際數值以實例參數表為準、
/// 授權參數為預設值
#[derive(Clone, Debug)]
pub struct ProjectileBurstEffect {
    params: ProjectileBurstParams,
}

impl ProjectileBurstEffect {
    pub fn new(params: ProjectileBurstParams) -> Self {
        ProjectileBurstEffect { params }
    }
}

impl SkillEffect for ProjectileBurstEffect {
    fn name(&self) -> &str {
        "projectile_burst"
    }

    fn can_execute(&self, ctx: &SkillContext) -> bool {
        // 齊射需要有效瞄準方向
        ctx.direction.magnitude_squared() > 1e-6
    }

    fn on_activate(&self, ctx: &SkillContext, env: &mut EffectEnv) {
        let base = &self.params;
        let speed = ctx.params.get(keys::SPEED, base.speed);
        let damage = ctx.params.get(keys::DAMAGE, base.damage);
        let lifetime = ctx.params.get(keys::DURATION, base.lifetime);
        let count = ctx
            .params
            .get(keys::PROJECTILE_COUNT, base.count as f32)
            .round() as i32;
        if count <= 0 {
            return;
        }

        for dir in fan_directions(ctx.direction, count, base.spread_angle) {
            env.projectiles.spawn(ProjectileSeed {
                archetype: base.archetype.clone(),
                owner: ctx.caster,
                origin: ctx.caster_pos,
                direction: dir,
                speed,
                damage,
                damage_type: base.damage_type,
                lifetime,
                hit_radius: base.hit_radius,
                explosion_radius: base.explosion_radius,
                impact_vfx: base.impact_vfx.clone(),
            });
        }
    }
}

/// 生成一發投射物所需的全部資料
#[derive(Clone, Debug)]
pub struct ProjectileSeed {
    pub archetype: String,
    pub owner: Entity,
    pub origin: Vec2<f32>,
    pub direction: Vec2<f32>,
    pub speed: f32,
    pub damage: f32,
    pub damage_type: DamageType,
    pub lifetime: f32,
    pub hit_radius: f32,
    pub explosion_radius: f32,
    pub impact_vfx: Option<String>,
}

/// 投射物生成介面
pub trait ProjectileSpawner {
    fn spawn(&mut self, seed: ProjectileSeed) -> Option<Uuid>;
}

/// 飛行中的投射物狀態
#[derive(Clone, Debug, Default)]
pub struct Projectile {
    pub id: Uuid,
    owner: Option<Entity>,
    pos: Vec2<f32>,
    dir: Vec2<f32>,
    speed: f32,
    damage: f32,
    damage_type: DamageType,
    time_left: f32,
    hit_radius: f32,
    explosion_radius: f32,
    impact_vfx: Option<String>,
    archetype: String,
}

impl Projectile {
    fn init(&mut self, seed: ProjectileSeed) {
        self.id = Uuid::new_v4();
        self.owner = Some(seed.owner);
        self.pos = seed.origin;
        self.dir = seed.direction.normalized();
        self.speed = seed.speed;
        self.damage = seed.damage;
        self.damage_type = seed.damage_type;
        self.time_left = seed.lifetime;
        self.hit_radius = seed.hit_radius;
        self.explosion_radius = seed.explosion_radius;
        self.impact_vfx = seed.impact_vfx;
        self.archetype = seed.archetype;
    }

    pub fn position(&self) -> Vec2<f32> {
        self.pos
    }

    /// 前進一幀：壽命倒數、直線位移、接觸判定
    fn advance(&mut self, world: &mut dyn WorldAccess, dt: f32) -> MotionState {
        self.time_left -= dt;
        if self.time_left <= 0.0 {
            // 壽命到期，不產生任何傷害
            return MotionState::Finished;
        }

        self.pos += self.dir * self.speed * dt;

        let hit = world
            .entities_in_range(self.pos, self.hit_radius)
            .into_iter()
            .find(|e| Some(*e) != self.owner && world.is_alive(*e));
        if let Some(target) = hit {
            self.impact(world, target);
            return MotionState::Finished;
        }

        MotionState::Continuing
    }

    /// 命中：直接傷害，或帶爆炸半徑時對範圍內所有目標套用衰減傷害
    fn impact(&self, world: &mut dyn WorldAccess, target: Entity) {
        let source = self.owner.unwrap_or(target);
        if self.explosion_radius > 0.0 {
            for entity in world.entities_in_range(self.pos, self.explosion_radius) {
                if Some(entity) == self.owner || !world.is_alive(entity) {
                    continue;
                }
                let entity_pos = world.get_position(entity).unwrap_or(self.pos);
                let distance = (entity_pos - self.pos).magnitude();
                let amount = falloff_damage(self.damage, distance, self.explosion_radius);
                world.apply_damage(entity, amount, self.damage_type, source);
            }
        } else {
            world.apply_damage(target, self.damage, self.damage_type, source);
        }

        if let Some(vfx) = &self.impact_vfx {
            world.spawn_visual(vfx, self.pos);
        }
    }
}

/// 投射物引擎 - 持有活躍投射物並逐幀推進，退役的物件回到池中
#[derive(Debug, Default)]
pub struct ProjectileEngine {
    pool: ActorPool<Projectile>,
    active: Vec<Projectile>,
}

impl ProjectileEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prewarm(&mut self, archetype: &str, count: usize) {
        self.pool.prewarm(archetype, count);
    }

    /// 推進所有投射物；命中或過期者回收進池
    pub fn advance(&mut self, world: &mut dyn WorldAccess, dt: f32) {
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].advance(world, dt) == MotionState::Finished {
                let projectile = self.active.swap_remove(i);
                let archetype = projectile.archetype.clone();
                self.pool.release(&archetype, projectile);
            } else {
                i += 1;
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pool(&self) -> &ActorPool<Projectile> {
        &self.pool
    }
}

impl ProjectileSpawner for ProjectileEngine {
    fn spawn(&mut self, seed: ProjectileSeed) -> Option<Uuid> {
        if seed.direction.magnitude_squared() < 1e-8 {
            warn!("投射物方向為零，忽略生成: {}", seed.archetype);
            return None;
        }
        let mut projectile = self.pool.acquire(&seed.archetype);
        projectile.init(seed);
        let id = projectile.id;
        self.active.push(projectile);
        Some(id)
    }
}
