use crate::effect::{EffectRegistry, EffectSpec, SkillEffect};
use crate::types::{SkillError, SkillTags, SkillType};
use crate::util::JsonPreprocessor;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

fn default_one() -> f32 {
    1.0
}

fn default_required_level() -> i32 {
    1
}

fn default_max_level() -> i32 {
    5
}

fn default_points_per_level() -> i32 {
    1
}

fn default_base_cooldown() -> f32 {
    1.0
}

fn default_base_cost() -> f32 {
    10.0
}

/// 單條參數修飾
///
/// override_base 時覆寫基礎值，否則以加法/乘法累積
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParamModification {
    pub key: String,
    #[serde(default)]
    pub additive: f32,
    #[serde(default = "default_one")]
    pub multiplicative: f32,
    #[serde(default)]
    pub override_base: bool,
    #[serde(default)]
    pub override_value: f32,
}

/// 能力值需求
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequiredStat {
    pub stat: String,
    pub required: i32,
}

impl RequiredStat {
    pub fn is_met(&self, stats: &HashMap<String, i32>) -> bool {
        stats.get(&self.stat).copied().unwrap_or(0) >= self.required
    }
}

/// 授權資料中的等級層（序列化形態）
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SkillTierSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modifications: Vec<ParamModification>,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

/// 授權資料中的技能定義（序列化形態）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skill_type: SkillType,
    #[serde(default)]
    pub tags: SkillTags,
    #[serde(default = "default_required_level")]
    pub required_level: i32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub required_stats: Vec<RequiredStat>,
    #[serde(default = "default_max_level")]
    pub max_level: i32,
    #[serde(default = "default_points_per_level")]
    pub points_per_level: i32,
    #[serde(default = "default_base_cooldown")]
    pub base_cooldown: f32,
    #[serde(default = "default_base_cost")]
    pub base_cost: f32,
    #[serde(default)]
    pub base_cast_time: f32,
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
    #[serde(default)]
    pub tiers: Vec<SkillTierSpec>,
    #[serde(default)]
    pub cast_vfx: Option<String>,
    #[serde(default)]
    pub cast_sound: Option<String>,
    #[serde(default)]
    pub impact_vfx: Option<String>,
    #[serde(default)]
    pub impact_sound: Option<String>,
}

/// 等級層 - 每個等級附帶的參數修飾與追加效果
#[derive(Clone, Debug)]
pub struct SkillTier {
    pub name: String,
    pub modifications: Vec<ParamModification>,
    pub additional_effects: Vec<Arc<dyn SkillEffect>>,
}

/// 技能定義 - 不可變的授權資料，所有實例以 Arc 共享同一份
#[derive(Clone, Debug)]
pub struct SkillConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub skill_type: SkillType,
    pub tags: SkillTags,
    pub required_level: i32,
    pub prerequisites: Vec<String>,
    pub required_stats: Vec<RequiredStat>,
    pub max_level: i32,
    pub points_per_level: i32,
    pub base_cooldown: f32,
    pub base_cost: f32,
    pub base_cast_time: f32,
    pub base_effects: Vec<Arc<dyn SkillEffect>>,
    pub tiers: Vec<SkillTier>,
    pub cast_vfx: Option<String>,
    pub cast_sound: Option<String>,
    pub impact_vfx: Option<String>,
    pub impact_sound: Option<String>,
}

impl SkillConfig {
    /// 由授權描述建出定義，效果物件在此一次解析完成
    pub fn from_spec(
        id: &str,
        spec: SkillSpec,
        registry: &EffectRegistry,
    ) -> Result<Self, SkillError> {
        if id.is_empty() {
            return Err(SkillError::InvalidConfig {
                id: id.to_string(),
                reason: "技能 id 不可為空".to_string(),
            });
        }
        if spec.max_level < 1 {
            return Err(SkillError::InvalidConfig {
                id: id.to_string(),
                reason: format!("max_level 必須 >= 1 (得到 {})", spec.max_level),
            });
        }

        let base_effects = spec
            .effects
            .iter()
            .map(|e| registry.build(e))
            .collect::<Result<Vec<_>, _>>()?;

        let tiers = spec
            .tiers
            .into_iter()
            .map(|tier| {
                let additional_effects = tier
                    .effects
                    .iter()
                    .map(|e| registry.build(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SkillTier {
                    name: tier.name,
                    modifications: tier.modifications,
                    additional_effects,
                })
            })
            .collect::<Result<Vec<_>, SkillError>>()?;

        Ok(SkillConfig {
            id: id.to_string(),
            name: spec.name,
            description: spec.description,
            skill_type: spec.skill_type,
            tags: spec.tags,
            required_level: spec.required_level,
            prerequisites: spec.prerequisites,
            required_stats: spec.required_stats,
            max_level: spec.max_level,
            points_per_level: spec.points_per_level,
            base_cooldown: spec.base_cooldown,
            base_cost: spec.base_cost,
            base_cast_time: spec.base_cast_time,
            base_effects,
            tiers,
            cast_vfx: spec.cast_vfx,
            cast_sound: spec.cast_sound,
            impact_vfx: spec.impact_vfx,
            impact_sound: spec.impact_sound,
        })
    }

    /// 取得等級對應的層；索引以 level-1 夾限在已授權範圍內，
    /// 超出的等級沿用最後一層
    pub fn resolve_tier(&self, level: i32) -> Option<&SkillTier> {
        if self.tiers.is_empty() || level <= 0 {
            return None;
        }
        let index = ((level - 1) as usize).min(self.tiers.len() - 1);
        Some(&self.tiers[index])
    }

    /// 純判定：角色等級與能力值是否滿足學習需求，無副作用
    pub fn meets_requirements(&self, actor_level: i32, stats: &HashMap<String, i32>) -> bool {
        if actor_level < self.required_level {
            return false;
        }
        self.required_stats.iter().all(|req| req.is_met(stats))
    }
}

/// 技能目錄 - id 對定義的查找表
#[derive(Debug, Default)]
pub struct SkillCatalog {
    entries: BTreeMap<String, Arc<SkillConfig>>,
}

impl SkillCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: SkillConfig) {
        self.entries.insert(config.id.clone(), Arc::new(config));
    }

    /// 查無此 id 時回傳 None，不會憑空捏造定義
    pub fn get(&self, id: &str) -> Option<Arc<SkillConfig>> {
        self.entries.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<SkillConfig>)> {
        self.entries.iter()
    }

    /// 從 JSON 字串載入（支援 C-style 註解），回傳載入數量
    pub fn load_json_str(
        &mut self,
        json: &str,
        registry: &EffectRegistry,
    ) -> Result<usize, SkillError> {
        let stripped = JsonPreprocessor::remove_comments(json);
        let specs: BTreeMap<String, SkillSpec> =
            serde_json::from_str(&stripped).map_err(|e| SkillError::Parse(e.to_string()))?;
        self.load_specs(specs, registry)
    }

    /// 從 YAML 字串載入
    pub fn load_yaml_str(
        &mut self,
        yaml: &str,
        registry: &EffectRegistry,
    ) -> Result<usize, SkillError> {
        let specs: BTreeMap<String, SkillSpec> =
            serde_yaml::from_str(yaml).map_err(|e| SkillError::Parse(e.to_string()))?;
        self.load_specs(specs, registry)
    }

    /// 依副檔名載入目錄檔
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        registry: &EffectRegistry,
    ) -> Result<usize, SkillError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => self.load_yaml_str(&content, registry),
            _ => self.load_json_str(&content, registry),
        }
    }

    fn load_specs(
        &mut self,
        specs: BTreeMap<String, SkillSpec>,
        registry: &EffectRegistry,
    ) -> Result<usize, SkillError> {
        let count = specs.len();
        for (id, spec) in specs {
            self.insert(SkillConfig::from_spec(&id, spec, registry)?);
        }
        Ok(count)
    }

    /// 目錄層級驗證：所有前置技能 id 必須存在
    pub fn validate(&self) -> Result<(), SkillError> {
        for (id, config) in &self.entries {
            for prereq in &config.prerequisites {
                if !self.entries.contains_key(prereq) {
                    return Err(SkillError::InvalidConfig {
                        id: id.clone(),
                        reason: format!("未知的前置技能 {}", prereq),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_spec(name: &str) -> SkillSpec {
        serde_json::from_str(&format!("{{\"name\": \"{}\"}}", name)).unwrap()
    }

    #[test]
    fn test_spec_defaults() {
        let spec = minimal_spec("火球");
        assert_eq!(spec.skill_type, SkillType::Active);
        assert_eq!(spec.required_level, 1);
        assert_eq!(spec.max_level, 5);
        assert_eq!(spec.points_per_level, 1);
        assert_eq!(spec.base_cooldown, 1.0);
        assert_eq!(spec.base_cost, 10.0);
        assert!(spec.tiers.is_empty());
    }

    #[test]
    fn test_invalid_max_level_rejected() {
        let registry = EffectRegistry::with_builtin();
        let mut spec = minimal_spec("broken");
        spec.max_level = 0;
        let result = SkillConfig::from_spec("broken", spec, &registry);
        assert!(matches!(result, Err(SkillError::InvalidConfig { .. })));
    }

    #[test]
    fn test_resolve_tier_clamps() {
        let registry = EffectRegistry::with_builtin();
        let json = r#"{
            "name": "火球",
            "max_level": 5,
            "tiers": [
                { "name": "t1", "modifications": [{ "key": "damage", "override_base": true, "override_value": 20.0 }] },
                { "name": "t2", "modifications": [{ "key": "damage", "override_base": true, "override_value": 30.0 }] }
            ]
        }"#;
        let spec: SkillSpec = serde_json::from_str(json).unwrap();
        let config = SkillConfig::from_spec("fireball", spec, &registry).unwrap();

        assert!(config.resolve_tier(0).is_none());
        assert_eq!(config.resolve_tier(1).unwrap().name, "t1");
        assert_eq!(config.resolve_tier(2).unwrap().name, "t2");
        // 超出授權層數時沿用最後一層
        assert_eq!(config.resolve_tier(5).unwrap().name, "t2");
    }

    #[test]
    fn test_resolve_tier_empty() {
        let registry = EffectRegistry::with_builtin();
        let config = SkillConfig::from_spec("plain", minimal_spec("素"), &registry).unwrap();
        assert!(config.resolve_tier(1).is_none());
    }

    #[test]
    fn test_meets_requirements() {
        let registry = EffectRegistry::with_builtin();
        let json = r#"{
            "name": "重擊",
            "required_level": 5,
            "required_stats": [{ "stat": "strength", "required": 10 }]
        }"#;
        let spec: SkillSpec = serde_json::from_str(json).unwrap();
        let config = SkillConfig::from_spec("heavy_blow", spec, &registry).unwrap();

        let mut stats = HashMap::new();
        stats.insert("strength".to_string(), 12);
        assert!(!config.meets_requirements(4, &stats));
        assert!(config.meets_requirements(5, &stats));

        stats.insert("strength".to_string(), 9);
        assert!(!config.meets_requirements(5, &stats));
    }

    #[test]
    fn test_load_json_with_comments() {
        let registry = EffectRegistry::with_builtin();
        let mut catalog = SkillCatalog::new();
        let json = r#"{
            // 火球術
            "fireball": {
                "name": "火球",
                "base_cooldown": 2.0,
                "effects": [{ "kind": "projectile_burst", "damage": 20.0 }]
            },
            /* 衝刺 */
            "shadow_dash": {
                "name": "暗影衝刺",
                "effects": [{ "kind": "dash", "distance": 5.0 }]
            }
        }"#;
        let count = catalog.load_json_str(json, &registry).unwrap();
        assert_eq!(count, 2);
        assert!(catalog.get("fireball").is_some());
        assert_eq!(catalog.get("fireball").unwrap().base_effects.len(), 1);
        assert!(catalog.get("unknown").is_none());
    }

    #[test]
    fn test_load_yaml() {
        let registry = EffectRegistry::with_builtin();
        let mut catalog = SkillCatalog::new();
        let yaml = r#"
fireball:
  name: 火球
  base_cooldown: 2.0
"#;
        assert_eq!(catalog.load_yaml_str(yaml, &registry).unwrap(), 1);
        assert_eq!(catalog.get("fireball").unwrap().base_cooldown, 2.0);
    }

    #[test]
    fn test_validate_unknown_prerequisite() {
        let registry = EffectRegistry::with_builtin();
        let mut catalog = SkillCatalog::new();
        let mut spec = minimal_spec("後繼");
        spec.prerequisites = vec!["missing".to_string()];
        catalog.insert(SkillConfig::from_spec("follow_up", spec, &registry).unwrap());
        assert!(catalog.validate().is_err());
    }
}
