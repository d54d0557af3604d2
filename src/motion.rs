use crate::types::WorldAccess;

/// 逐幀推進的結果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionState {
    Continuing,
    Finished,
}

/// 跨幀延續體 - 以外部幀時鐘驅動的顯式狀態物件
///
/// 每次 advance 只前進該幀的 dt，呼叫之間不會留下半套用的變動
pub trait Motion: Send + Sync + std::fmt::Debug {
    fn advance(&mut self, world: &mut dyn WorldAccess, dt: f32) -> MotionState;

    /// 中止延續體並回復它暫時施加的世界狀態
    fn cancel(&mut self, world: &mut dyn WorldAccess);
}

/// 延續體驅動器，由模擬情境持有並在每幀推進
#[derive(Debug, Default)]
pub struct MotionDriver {
    motions: Vec<Box<dyn Motion>>,
}

impl MotionDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, motion: Box<dyn Motion>) {
        self.motions.push(motion);
    }

    /// 推進所有延續體，完成者移除
    pub fn advance(&mut self, world: &mut dyn WorldAccess, dt: f32) {
        self.motions
            .retain_mut(|m| m.advance(world, dt) == MotionState::Continuing);
    }

    /// 中止並清空所有延續體
    pub fn cancel_all(&mut self, world: &mut dyn WorldAccess) {
        for mut motion in self.motions.drain(..) {
            motion.cancel(world);
        }
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}
