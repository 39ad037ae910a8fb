//! The skill block: one level byte per class skill slot

use crate::item::ItemProperty;
use crate::{CharacterClass, D2SaveError, Result, SKILL_SLOTS};
use serde::{Deserialize, Serialize};

/// One class skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Global skill id
    pub skill_id: u16,
    /// Hard points, 0..=20
    pub level: u8,
    /// Passive bonuses derived from the level and equipped items
    pub bonuses: Vec<ItemProperty>,
}

/// Read the [`SKILL_SLOTS`] level bytes at `offset`
pub fn read_skills(data: &[u8], offset: usize, class: CharacterClass) -> Result<Vec<SkillRecord>> {
    let levels = data
        .get(offset..offset + SKILL_SLOTS)
        .ok_or(D2SaveError::UnexpectedEof { offset })?;

    Ok(levels
        .iter()
        .zip(class.skill_offset()..)
        .map(|(&level, skill_id)| SkillRecord {
            skill_id,
            level,
            bonuses: Vec::new(),
        })
        .collect())
}
