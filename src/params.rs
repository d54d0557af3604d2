use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// 常用技能參數鍵
///
/// 數值型參數一律透過 `SkillParams` 以字串鍵存取，
/// 這裡列出引擎與內建效果共用的鍵名
pub mod keys {
    pub const DAMAGE: &str = "damage";
    pub const SPEED: &str = "speed";
    pub const RANGE: &str = "range";
    pub const DURATION: &str = "duration";
    pub const COOLDOWN_REDUCTION: &str = "cooldownReduction";
    pub const MANA_COST_REDUCTION: &str = "manaCostReduction";
    pub const LIFE_STEAL: &str = "lifeSteal";
    pub const CRIT_CHANCE: &str = "critChance";
    pub const CRIT_DAMAGE: &str = "critDamage";
    pub const PROJECTILE_COUNT: &str = "projectileCount";
    pub const AREA_OF_EFFECT: &str = "areaOfEffect";
    pub const DASH_DISTANCE: &str = "dashDistance";
    pub const INVULNERABILITY_TIME: &str = "invulnerabilityTime";
}

/// 單一參數的組成值
///
/// 導出值 = (base + additive) * multiplicative
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParamValue {
    pub base: f32,
    pub additive: f32,
    pub multiplicative: f32,
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue {
            base: 0.0,
            additive: 0.0,
            multiplicative: 1.0,
        }
    }
}

impl ParamValue {
    /// 計算導出值
    pub fn calculated(&self) -> f32 {
        (self.base + self.additive) * self.multiplicative
    }
}

/// 技能參數表 - 每個技能實例專屬的數值暫存器
///
/// 由 `SkillInstance` 在等級變更時重建，修飾值不會跨重建殘留；
/// 不做序列化，存檔只需要等級與槽位，表可隨時重建
#[derive(Clone, Debug, Default)]
pub struct SkillParams {
    values: HashMap<String, ParamValue>,
}

impl SkillParams {
    pub fn new() -> Self {
        SkillParams {
            values: HashMap::new(),
        }
    }

    /// 覆寫基礎值，保留既有的加法與乘法修飾
    pub fn set_base(&mut self, key: &str, value: f32) {
        self.values.entry(key.to_string()).or_default().base = value;
    }

    /// 累加修飾值：加法累加、乘法累乘，套用順序不影響結果
    pub fn add_modifier(&mut self, key: &str, additive: f32, multiplicative: f32) {
        let entry = self.values.entry(key.to_string()).or_default();
        entry.additive += additive;
        entry.multiplicative *= multiplicative;
    }

    /// 讀取導出值，鍵不存在時回傳呼叫端給定的預設值
    pub fn get(&self, key: &str, default: f32) -> f32 {
        self.values
            .get(key)
            .map(|v| v.calculated())
            .unwrap_or(default)
    }

    /// 清除指定鍵的修飾值，基礎值保留
    pub fn reset(&mut self, key: &str) {
        if let Some(entry) = self.values.get_mut(key) {
            entry.additive = 0.0;
            entry.multiplicative = 1.0;
        }
    }

    /// 移除所有參數
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// 導出所有參數的計算結果快照
    pub fn to_map(&self) -> HashMap<String, f32> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.calculated()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_returns_default() {
        let params = SkillParams::new();
        assert_eq!(params.get("damage", 42.0), 42.0);
        assert_eq!(params.get("damage", 0.0), 0.0);
    }

    #[test]
    fn test_derived_value() {
        let mut params = SkillParams::new();
        params.set_base(keys::DAMAGE, 20.0);
        params.add_modifier(keys::DAMAGE, 5.0, 1.0);
        params.add_modifier(keys::DAMAGE, 0.0, 2.0);
        // (20 + 5) * 2
        assert_eq!(params.get(keys::DAMAGE, 0.0), 50.0);
    }

    #[test]
    fn test_modifier_commutativity() {
        // 任意順序套用同一組修飾，導出值必須一致
        let mods = [(3.0, 1.0), (0.0, 1.5), (7.0, 0.5), (2.0, 2.0)];

        let mut forward = SkillParams::new();
        forward.set_base("x", 10.0);
        for (add, mult) in mods.iter() {
            forward.add_modifier("x", *add, *mult);
        }

        let mut reverse = SkillParams::new();
        reverse.set_base("x", 10.0);
        for (add, mult) in mods.iter().rev() {
            reverse.add_modifier("x", *add, *mult);
        }

        let expected = (10.0 + 3.0 + 7.0 + 2.0) * 1.5 * 0.5 * 2.0;
        assert!((forward.get("x", 0.0) - expected).abs() < 1e-5);
        assert!((forward.get("x", 0.0) - reverse.get("x", 0.0)).abs() < 1e-5);
    }

    #[test]
    fn test_set_base_preserves_modifiers() {
        let mut params = SkillParams::new();
        params.add_modifier("speed", 2.0, 3.0);
        params.set_base("speed", 4.0);
        assert_eq!(params.get("speed", 0.0), (4.0 + 2.0) * 3.0);
    }

    #[test]
    fn test_reset_keeps_base() {
        let mut params = SkillParams::new();
        params.set_base("range", 8.0);
        params.add_modifier("range", 4.0, 2.0);
        params.reset("range");
        assert_eq!(params.get("range", 0.0), 8.0);
    }

    #[test]
    fn test_clear_removes_entries() {
        let mut params = SkillParams::new();
        params.set_base("a", 1.0);
        params.set_base("b", 2.0);
        params.clear();
        assert!(params.is_empty());
        assert_eq!(params.get("a", 9.0), 9.0);
    }

    #[test]
    fn test_to_map_snapshot() {
        let mut params = SkillParams::new();
        params.set_base("a", 2.0);
        params.add_modifier("a", 1.0, 2.0);
        let map = params.to_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], 6.0);
    }
}
