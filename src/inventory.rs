use crate::catalog::SkillConfig;
use crate::events::{EventBus, SkillEvent};
use crate::instance::SkillInstance;
use crate::types::{SkillPointProvider, SkillType};
use hashbrown::HashMap;
use specs::Entity;
use std::sync::Arc;

/// 技能欄 - 一個角色持有的全部技能實例與進度圖
///
/// 前置檢查是平面集合檢查，不走遞移閉包：
/// 解鎖單調不可逆，前置技能已解鎖即代表它自己的前置鏈
/// 在當時已被滿足
#[derive(Debug)]
pub struct SkillInventory {
    owner: Entity,
    skills: Vec<SkillInstance>,
    lookup: HashMap<String, usize>,
    max_slots: i32,
}

impl SkillInventory {
    pub fn new(owner: Entity, max_slots: i32) -> Self {
        SkillInventory {
            owner,
            skills: Vec::new(),
            lookup: HashMap::new(),
            max_slots,
        }
    }

    pub fn owner(&self) -> Entity {
        self.owner
    }

    pub fn max_slots(&self) -> i32 {
        self.max_slots
    }

    /// 登錄一個技能（未解鎖狀態），同 id 重複登錄回傳 false
    pub fn add_skill(&mut self, config: Arc<SkillConfig>) -> bool {
        if self.lookup.contains_key(&config.id) {
            return false;
        }
        let instance = SkillInstance::new(config, self.owner);
        self.lookup.insert(instance.id().to_string(), self.skills.len());
        self.skills.push(instance);
        true
    }

    pub fn get(&self, skill_id: &str) -> Option<&SkillInstance> {
        self.lookup.get(skill_id).map(|&i| &self.skills[i])
    }

    pub fn get_mut(&mut self, skill_id: &str) -> Option<&mut SkillInstance> {
        if let Some(&i) = self.lookup.get(skill_id) {
            Some(&mut self.skills[i])
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillInstance> {
        self.skills.iter()
    }

    /// 嘗試解鎖
    ///
    /// id 未知、已解鎖、任一前置未解鎖、點數不足 → false 且不動任何狀態；
    /// 成功時先扣點再轉移 Locked → Unlocked
    pub fn try_unlock(
        &mut self,
        skill_id: &str,
        points: &mut dyn SkillPointProvider,
        bus: &EventBus<SkillEvent>,
    ) -> bool {
        let index = match self.lookup.get(skill_id) {
            Some(&i) => i,
            None => return false,
        };
        if self.skills[index].is_unlocked() {
            return false;
        }
        if !self.prerequisites_met(index) {
            return false;
        }

        let cost = self.skills[index].config().points_per_level;
        if !points.try_spend(cost) {
            return false;
        }

        self.skills[index].unlock(bus);
        true
    }

    /// 嘗試升級，與解鎖對稱的點數記帳
    pub fn try_level_up(
        &mut self,
        skill_id: &str,
        points: &mut dyn SkillPointProvider,
        bus: &EventBus<SkillEvent>,
    ) -> bool {
        let index = match self.lookup.get(skill_id) {
            Some(&i) => i,
            None => return false,
        };
        if !self.skills[index].is_unlocked() || self.skills[index].is_max_level() {
            return false;
        }

        let cost = self.skills[index].config().points_per_level;
        if !points.try_spend(cost) {
            return false;
        }

        self.skills[index].level_up(bus);
        true
    }

    /// 指派槽位
    ///
    /// 槽位超界或技能未解鎖 → false；
    /// 原佔位者被驅逐（slot = -1），同一槽位永遠最多一個技能
    pub fn try_assign_slot(&mut self, skill_id: &str, slot: i32) -> bool {
        if slot < 0 || slot >= self.max_slots {
            return false;
        }
        let index = match self.lookup.get(skill_id) {
            Some(&i) => i,
            None => return false,
        };
        if !self.skills[index].is_unlocked() {
            return false;
        }

        for skill in self.skills.iter_mut() {
            if skill.slot == slot {
                skill.slot = -1;
            }
        }
        self.skills[index].slot = slot;
        true
    }

    /// 每幀推進所有實例，未解鎖者也照跑（其計時器維持 0）
    pub fn tick(&mut self, dt: f32, bus: &EventBus<SkillEvent>) {
        for skill in self.skills.iter_mut() {
            skill.update(dt, bus);
        }
    }

    /// 已解鎖且佔有槽位的技能
    pub fn active_skills(&self) -> impl Iterator<Item = &SkillInstance> {
        self.skills
            .iter()
            .filter(|s| s.is_unlocked() && s.slot >= 0)
    }

    /// 已解鎖的被動技能
    pub fn passive_skills(&self) -> impl Iterator<Item = &SkillInstance> {
        self.skills
            .iter()
            .filter(|s| s.is_unlocked() && s.config().skill_type == SkillType::Passive)
    }

    fn prerequisites_met(&self, index: usize) -> bool {
        self.skills[index]
            .config()
            .prerequisites
            .iter()
            .all(|prereq| {
                self.lookup
                    .get(prereq)
                    .map(|&i| self.skills[i].is_unlocked())
                    .unwrap_or(false)
            })
    }
}
