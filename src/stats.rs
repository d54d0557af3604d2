use crate::events::{EventBus, StatsEvent};
use crate::types::{ResourceProvider, SkillPointProvider};
use crossbeam_channel::Receiver;
use log::debug;

/// 角色能力值 - 資源池與技能點提供者的參考實作
///
/// 法力隨時間回復；經驗值累積到門檻時連鎖升級並發放技能點。
/// 資源與點數由單一角色獨占，不跨角色競爭
#[derive(Debug)]
pub struct ActorStats {
    level: i32,
    xp: i32,
    max_mana: f32,
    current_mana: f32,
    mana_regen: f32,
    skill_points: i32,
    points_per_level: i32,
    events: EventBus<StatsEvent>,
}

impl Default for ActorStats {
    fn default() -> Self {
        ActorStats::new(50.0, 1.0)
    }
}

impl ActorStats {
    pub fn new(max_mana: f32, mana_regen: f32) -> Self {
        ActorStats {
            level: 1,
            xp: 0,
            max_mana,
            current_mana: max_mana,
            mana_regen,
            skill_points: 0,
            points_per_level: 1,
            events: EventBus::new(),
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn xp(&self) -> i32 {
        self.xp
    }

    /// 訂閱資源／點數變化事件
    pub fn subscribe(&self) -> Receiver<StatsEvent> {
        self.events.subscribe()
    }

    /// 每幀回魔
    pub fn update(&mut self, dt: f32) {
        if self.current_mana < self.max_mana {
            self.restore(self.mana_regen * dt);
        }
    }

    /// 升到下一級所需經驗
    pub fn required_xp(next_level: i32) -> i32 {
        (100.0 * (next_level as f32).powf(1.5)).round() as i32
    }

    /// 累積經驗，跨越門檻時可一次連升多級，每級發放技能點
    pub fn add_experience(&mut self, amount: i32) {
        self.xp += amount;
        self.events.emit_now(StatsEvent::XpGained {
            amount,
            total: self.xp,
        });

        let mut required = Self::required_xp(self.level + 1);
        while self.xp >= required {
            self.xp -= required;
            self.level += 1;
            self.skill_points += self.points_per_level;
            debug!("升級到 {} 級，技能點 {}", self.level, self.skill_points);
            self.events.emit_now(StatsEvent::LevelUp { level: self.level });
            self.events.emit_now(StatsEvent::PointsChanged {
                available: self.skill_points,
            });
            required = Self::required_xp(self.level + 1);
        }
    }
}

impl ResourceProvider for ActorStats {
    fn current(&self) -> f32 {
        self.current_mana
    }

    fn maximum(&self) -> f32 {
        self.max_mana
    }

    fn can_afford(&self, cost: f32) -> bool {
        self.current_mana >= cost
    }

    fn try_consume(&mut self, cost: f32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current_mana = (self.current_mana - cost).max(0.0);
        self.events.emit_now(StatsEvent::ResourceChanged {
            current: self.current_mana,
            max: self.max_mana,
        });
        true
    }

    fn restore(&mut self, amount: f32) {
        self.current_mana = (self.current_mana + amount).min(self.max_mana);
        self.events.emit_now(StatsEvent::ResourceChanged {
            current: self.current_mana,
            max: self.max_mana,
        });
    }
}

impl SkillPointProvider for ActorStats {
    fn available_points(&self) -> i32 {
        self.skill_points
    }

    fn try_spend(&mut self, amount: i32) -> bool {
        if self.skill_points < amount {
            return false;
        }
        self.skill_points -= amount;
        self.events.emit_now(StatsEvent::PointsChanged {
            available: self.skill_points,
        });
        true
    }

    fn add_points(&mut self, amount: i32) {
        self.skill_points += amount;
        self.events.emit_now(StatsEvent::PointsChanged {
            available: self.skill_points,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_and_restore() {
        let mut stats = ActorStats::new(50.0, 1.0);
        assert!(stats.try_consume(20.0));
        assert_eq!(stats.current(), 30.0);

        // 不足時原子性拒絕，不留下部分扣除
        assert!(!stats.try_consume(40.0));
        assert_eq!(stats.current(), 30.0);

        stats.restore(100.0);
        assert_eq!(stats.current(), 50.0);
    }

    #[test]
    fn test_regen_capped_at_max() {
        let mut stats = ActorStats::new(10.0, 2.0);
        stats.try_consume(5.0);
        for _ in 0..10 {
            stats.update(0.5);
        }
        assert_eq!(stats.current(), 10.0);
    }

    #[test]
    fn test_point_spend() {
        let mut stats = ActorStats::default();
        stats.add_points(2);
        assert!(stats.try_spend(1));
        assert!(stats.try_spend(1));
        assert!(!stats.try_spend(1));
        assert_eq!(stats.available_points(), 0);
    }

    #[test]
    fn test_multi_level_up_grants_points() {
        let mut stats = ActorStats::default();
        let rx = stats.subscribe();

        // 2 級需 283、3 級需 520：一次給足兩級的量
        let to_level_3 = ActorStats::required_xp(2) + ActorStats::required_xp(3);
        stats.add_experience(to_level_3);
        assert_eq!(stats.level(), 3);
        assert_eq!(stats.available_points(), 2);
        assert_eq!(stats.xp(), 0);

        let levels = rx
            .try_iter()
            .filter(|e| matches!(e, StatsEvent::LevelUp { .. }))
            .count();
        assert_eq!(levels, 2);
    }

    #[test]
    fn test_resource_change_events() {
        let mut stats = ActorStats::new(50.0, 0.0);
        let rx = stats.subscribe();
        stats.try_consume(10.0);
        assert!(matches!(
            rx.try_recv().unwrap(),
            StatsEvent::ResourceChanged { current, .. } if current == 40.0
        ));
    }
}
