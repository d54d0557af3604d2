use hashbrown::HashMap;
use log::warn;

/// 依原型鍵值回收短命物件的池
///
/// acquire/release 必須走同一個池實例，池由模擬情境持有，
/// 不提供全域存取點
#[derive(Debug)]
pub struct ActorPool<T> {
    free: HashMap<String, Vec<T>>,
    issued: HashMap<String, usize>,
}

impl<T: Default> ActorPool<T> {
    pub fn new() -> Self {
        ActorPool {
            free: HashMap::new(),
            issued: HashMap::new(),
        }
    }

    /// 預先建立指定數量的待用物件
    pub fn prewarm(&mut self, archetype: &str, count: usize) {
        let bucket = self.free.entry(archetype.to_string()).or_default();
        for _ in 0..count {
            bucket.push(T::default());
        }
    }

    /// 取出一個物件，池空時新建
    pub fn acquire(&mut self, archetype: &str) -> T {
        *self.issued.entry(archetype.to_string()).or_insert(0) += 1;
        self.free
            .get_mut(archetype)
            .and_then(|bucket| bucket.pop())
            .unwrap_or_default()
    }

    /// 歸還物件；歸還非本池發出的物件視為設定錯誤，記錄後丟棄
    pub fn release(&mut self, archetype: &str, item: T) {
        match self.issued.get_mut(archetype) {
            Some(count) if *count > 0 => {
                *count -= 1;
                self.free.entry(archetype.to_string()).or_default().push(item);
            }
            _ => {
                warn!("釋放了非本池發出的物件: {}", archetype);
            }
        }
    }

    /// 尚未歸還的數量
    pub fn issued_count(&self, archetype: &str) -> usize {
        self.issued.get(archetype).copied().unwrap_or(0)
    }

    /// 待用數量
    pub fn free_count(&self, archetype: &str) -> usize {
        self.free.get(archetype).map(|b| b.len()).unwrap_or(0)
    }
}

impl<T: Default> Default for ActorPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_cycle() {
        let mut pool: ActorPool<Vec<u8>> = ActorPool::new();
        let item = pool.acquire("fireball");
        assert_eq!(pool.issued_count("fireball"), 1);
        assert_eq!(pool.free_count("fireball"), 0);

        pool.release("fireball", item);
        assert_eq!(pool.issued_count("fireball"), 0);
        assert_eq!(pool.free_count("fireball"), 1);
    }

    #[test]
    fn test_prewarm() {
        let mut pool: ActorPool<Vec<u8>> = ActorPool::new();
        pool.prewarm("fireball", 4);
        assert_eq!(pool.free_count("fireball"), 4);

        let _item = pool.acquire("fireball");
        assert_eq!(pool.free_count("fireball"), 3);
    }

    #[test]
    fn test_reuses_released_item() {
        let mut pool: ActorPool<Vec<u8>> = ActorPool::new();
        let mut item = pool.acquire("arrow");
        item.push(9);
        pool.release("arrow", item);

        // 回收的是同一顆物件，內容由使用端重新初始化
        let reused = pool.acquire("arrow");
        assert_eq!(reused, vec![9]);
        assert_eq!(pool.free_count("arrow"), 0);
    }

    #[test]
    fn test_foreign_release_dropped() {
        let mut pool: ActorPool<Vec<u8>> = ActorPool::new();
        pool.release("ghost", Vec::new());
        assert_eq!(pool.free_count("ghost"), 0);
        assert_eq!(pool.issued_count("ghost"), 0);
    }
}
