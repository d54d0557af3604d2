use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use specs::Entity;
use std::collections::VecDeque;
use vek::Vec2;

/// 技能生命週期事件
///
/// 引擎只負責發佈，訂閱端（UI、音效、統計）自行決定如何消化
#[derive(Clone, Debug)]
pub enum SkillEvent {
    SkillUnlocked {
        skill_id: String,
        owner: Entity,
    },
    SkillLevelUp {
        skill_id: String,
        owner: Entity,
        level: i32,
    },
    /// 冷卻結束，邊緣觸發
    SkillReady {
        skill_id: String,
        owner: Entity,
    },
    /// 冷卻中每幀回報剩餘時間
    CooldownUpdate {
        skill_id: String,
        owner: Entity,
        remaining: f32,
    },
    SkillActivated {
        skill_id: String,
        caster: Entity,
        level: i32,
    },
    /// 施放表現層提示，投遞後不追蹤結果
    CastFx {
        vfx: Option<String>,
        sound: Option<String>,
        pos: Vec2<f32>,
    },
}

/// 角色資源／點數變化事件
#[derive(Clone, Debug)]
pub enum StatsEvent {
    ResourceChanged { current: f32, max: f32 },
    PointsChanged { available: i32 },
    LevelUp { level: i32 },
    XpGained { amount: i32, total: i32 },
}

/// 行程內事件匯流排，由模擬情境持有，不做全域單例
///
/// 訂閱端各持有一條 channel，接收端被丟棄後
/// 下次發佈時自動剔除
pub struct EventBus<E> {
    subscribers: Mutex<Vec<Sender<E>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        EventBus {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 註冊訂閱者，回傳的 Receiver 丟棄即取消訂閱
    pub fn subscribe(&self) -> Receiver<E> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// 立即廣播給所有存活的訂閱者
    pub fn emit_now(&self, event: E) {
        let mut subs = self.subscribers.lock();
        subs.retain(|s| s.send(event.clone()).is_ok());
    }

    pub fn emitter(&self) -> Emitter<E> {
        Emitter {
            bus: self,
            events: VecDeque::new(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// 批次發佈器，Drop 時一次送出累積的事件
pub struct Emitter<'a, E: Clone> {
    bus: &'a EventBus<E>,
    events: VecDeque<E>,
}

impl<'a, E: Clone> Emitter<'a, E> {
    pub fn emit(&mut self, event: E) {
        self.events.push_back(event);
    }

    pub fn append_vec(&mut self, vec: Vec<E>) {
        self.events.extend(vec)
    }
}

impl<'a, E: Clone> Drop for Emitter<'a, E> {
    fn drop(&mut self) {
        for event in self.events.drain(..) {
            self.bus.emit_now(event);
        }
    }
}
