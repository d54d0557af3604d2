use crate::types::{DamageType, WorldAccess};
use log::debug;
use serde::{Deserialize, Serialize};
use specs::storage::VecStorage;
use specs::{Builder, Component, Entity, Join, World, WorldExt};
use vek::Vec2;

/// Position
#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pos(pub Vec2<f32>);

impl Component for Pos {
    type Storage = VecStorage<Self>;
}

/// 生命值
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Health { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }
}

impl Component for Health {
    type Storage = VecStorage<Self>;
}

/// 碰撞層
#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollisionLayer(pub i32);

impl Component for CollisionLayer {
    type Storage = VecStorage<Self>;
}

/// 無敵旗標
#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invulnerable(pub bool);

impl Component for Invulnerable {
    type Storage = VecStorage<Self>;
}

/// 模擬世界 - `WorldAccess` 的參考實作
///
/// 由示範程式與整合測試使用；正式遊戲可用自己的世界實作
/// 替換，核心只透過 `WorldAccess` 介面觸及它
pub struct SimWorld {
    pub ecs: World,
    visuals: Vec<(String, Vec2<f32>)>,
}

impl SimWorld {
    pub fn new() -> Self {
        let mut ecs = World::new();
        ecs.register::<Pos>();
        ecs.register::<Health>();
        ecs.register::<CollisionLayer>();
        ecs.register::<Invulnerable>();
        SimWorld {
            ecs,
            visuals: Vec::new(),
        }
    }

    /// 建立一個帶位置與生命的角色實體
    pub fn spawn_actor(&mut self, pos: Vec2<f32>, max_health: f32) -> Entity {
        self.ecs
            .create_entity()
            .with(Pos(pos))
            .with(Health::new(max_health))
            .with(CollisionLayer(0))
            .with(Invulnerable(false))
            .build()
    }

    pub fn health(&self, entity: Entity) -> Option<f32> {
        self.ecs
            .read_storage::<Health>()
            .get(entity)
            .map(|h| h.current)
    }

    pub fn is_invulnerable(&self, entity: Entity) -> bool {
        self.ecs
            .read_storage::<Invulnerable>()
            .get(entity)
            .map(|i| i.0)
            .unwrap_or(false)
    }

    /// 已記錄的表現層提示（測試與示範輸出用）
    pub fn visuals(&self) -> &[(String, Vec2<f32>)] {
        &self.visuals
    }

    pub fn clear_visuals(&mut self) {
        self.visuals.clear();
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldAccess for SimWorld {
    fn get_position(&self, entity: Entity) -> Option<Vec2<f32>> {
        self.ecs.read_storage::<Pos>().get(entity).map(|p| p.0)
    }

    fn set_position(&mut self, entity: Entity, pos: Vec2<f32>) {
        let mut storage = self.ecs.write_storage::<Pos>();
        if let Some(p) = storage.get_mut(entity) {
            p.0 = pos;
        } else {
            let _ = storage.insert(entity, Pos(pos));
        }
    }

    fn entities_in_range(&self, center: Vec2<f32>, radius: f32) -> Vec<Entity> {
        let entities = self.ecs.entities();
        let positions = self.ecs.read_storage::<Pos>();
        (&entities, &positions)
            .join()
            .filter(|(_, p)| (p.0 - center).magnitude_squared() <= radius * radius)
            .map(|(e, _)| e)
            .collect()
    }

    fn is_alive(&self, entity: Entity) -> bool {
        self.ecs
            .read_storage::<Health>()
            .get(entity)
            .map(|h| h.is_alive())
            .unwrap_or(false)
    }

    fn apply_damage(
        &mut self,
        target: Entity,
        amount: f32,
        _damage_type: DamageType,
        _source: Entity,
    ) {
        if self.is_invulnerable(target) {
            debug!("目標處於無敵狀態，傷害無效");
            return;
        }
        let mut storage = self.ecs.write_storage::<Health>();
        if let Some(health) = storage.get_mut(target) {
            health.current = (health.current - amount).max(0.0);
        }
    }

    fn collision_layer(&self, entity: Entity) -> i32 {
        self.ecs
            .read_storage::<CollisionLayer>()
            .get(entity)
            .map(|l| l.0)
            .unwrap_or(0)
    }

    fn set_collision_layer(&mut self, entity: Entity, layer: i32) {
        let mut storage = self.ecs.write_storage::<CollisionLayer>();
        if let Some(l) = storage.get_mut(entity) {
            l.0 = layer;
        } else {
            let _ = storage.insert(entity, CollisionLayer(layer));
        }
    }

    fn set_invulnerable(&mut self, entity: Entity, on: bool) {
        let mut storage = self.ecs.write_storage::<Invulnerable>();
        if let Some(i) = storage.get_mut(entity) {
            i.0 = on;
        } else {
            let _ = storage.insert(entity, Invulnerable(on));
        }
    }

    fn spawn_visual(&mut self, handle: &str, pos: Vec2<f32>) {
        self.visuals.push((handle.to_string(), pos));
    }
}
