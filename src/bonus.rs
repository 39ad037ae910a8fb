//! Set and passive skill bonuses
//!
//! Runs after every item of a character is decoded. Set items lose the
//! tier properties their set does not yet unlock, active set bonuses are
//! collected per set, and the level-dependent resistances of a few passive
//! skills are recomputed from the character's equipped gear. Inputs are
//! never mutated; adjusted copies are returned.

use crate::item::property::{
    ItemProperty, FLAG_SET_FULL, FLAG_SET_PARTIAL, FLAG_SET_TIER, STAT_ALL_SKILLS,
    STAT_COLD_RESIST, STAT_FIRE_RESIST, STAT_LIGHTNING_RESIST, STAT_POISON_RESIST,
    STAT_SKILL_TAB,
};
use crate::item::{Item, Quality};
use crate::reference::{PropertyTemplate, ReferenceData};
use crate::save::skills::SkillRecord;
use crate::tables::NATURAL_RESISTANCE;
use crate::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Paladin aura: Resist Fire
pub const SKILL_RESIST_FIRE: u16 = 100;
/// Paladin aura: Resist Cold
pub const SKILL_RESIST_COLD: u16 = 105;
/// Paladin aura: Resist Lightning
pub const SKILL_RESIST_LIGHTNING: u16 = 110;
/// Barbarian mastery: Natural Resistance
pub const SKILL_NATURAL_RESISTANCE: u16 = 153;

/// Skill tab parameter of the Paladin defensive auras
const TAB_DEFENSIVE_AURAS: i32 = 26;
/// Skill tab parameter of the Barbarian masteries
const TAB_MASTERIES: i32 = 33;

const FIRE: &[u16] = &[STAT_FIRE_RESIST];
const COLD: &[u16] = &[STAT_COLD_RESIST];
const LIGHTNING: &[u16] = &[STAT_LIGHTNING_RESIST];
const ALL_RESISTS: &[u16] = &[
    STAT_FIRE_RESIST,
    STAT_LIGHTNING_RESIST,
    STAT_COLD_RESIST,
    STAT_POISON_RESIST,
];

/// Highest effective level the Natural Resistance table covers
const NATURAL_RESISTANCE_CAP: usize = 60;

/// Bonuses of one set unlocked by the equipped items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBonus {
    /// Set name
    pub set_name: String,
    /// Number of distinct set items equipped
    pub equipped: u8,
    /// Partial and full set properties in effect
    pub properties: Vec<ItemProperty>,
}

/// Items with inactive set tiers removed, plus the active set bonuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItems {
    /// Adjusted copies of the input items, in input order
    pub items: Vec<Item>,
    /// Active set bonuses, ordered by set name
    pub set_bonuses: Vec<SetBonus>,
}

/// Number of distinct set item names equipped, per set
pub fn equipped_set_counts(items: &[Item]) -> BTreeMap<String, u8> {
    let mut names: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for item in items.iter().filter(|item| item.is_equipped()) {
        if let Some(set_name) = item.set_name() {
            names.entry(set_name).or_default().insert(item.name.as_str());
        }
    }
    names
        .into_iter()
        .map(|(set_name, items)| (set_name.to_string(), items.len() as u8))
        .collect()
}

/// Gate set tier properties and collect set bonuses
pub fn resolve_sets(items: &[Item], tables: &dyn ReferenceData) -> Result<ResolvedItems> {
    let counts = equipped_set_counts(items);

    let items = items
        .iter()
        .map(|item| {
            let Some(Quality::Set { set_name, .. }) = item.quality() else {
                return item.clone();
            };
            let count = if item.is_equipped() {
                counts.get(set_name).copied().unwrap_or(1)
            } else {
                1
            };
            let mut item = item.clone();
            item.properties.retain(|property| tier_active(property.quality_flag, count));
            item
        })
        .collect();

    let mut set_bonuses = Vec::new();
    for (set_name, &count) in counts.iter().filter(|(_, count)| **count > 1) {
        let Some(bonuses) = tables.set_bonuses(set_name) else {
            debug!("no bonus table for set {set_name:?}");
            continue;
        };

        let mut properties = Vec::new();
        for template in bonuses
            .partial
            .iter()
            .filter(|template| template.quality_flag <= FLAG_SET_PARTIAL + count)
        {
            properties.push(from_template(template, tables)?);
        }
        if count == bonuses.item_count {
            for template in &bonuses.full {
                properties.push(ItemProperty::from_template(
                    template,
                    tables,
                    FLAG_SET_FULL,
                )?);
            }
        }

        set_bonuses.push(SetBonus {
            set_name: set_name.clone(),
            equipped: count,
            properties,
        });
    }

    Ok(ResolvedItems { items, set_bonuses })
}

/// Set tier flags (2..=6) unlock at that many equipped items
fn tier_active(flag: u8, count: u8) -> bool {
    !(FLAG_SET_TIER..FLAG_SET_TIER + 5).contains(&flag) || flag <= count
}

fn from_template(template: &PropertyTemplate, tables: &dyn ReferenceData) -> Result<ItemProperty> {
    ItemProperty::from_template(template, tables, template.quality_flag)
}

/// Recompute the passive resistance bonuses of `skills`
///
/// `equipped` is every property in effect on the character: equipped item
/// properties after set gating, plus active set bonuses.
pub fn resolve_skills(
    skills: &[SkillRecord],
    equipped: &[ItemProperty],
    tables: &dyn ReferenceData,
) -> Result<Vec<SkillRecord>> {
    let mut resolved = Vec::with_capacity(skills.len());
    for skill in skills {
        resolved.push(SkillRecord {
            bonuses: skill_bonuses(skill, equipped, tables)?,
            ..skill.clone()
        });
    }
    Ok(resolved)
}

fn skill_bonuses(
    skill: &SkillRecord,
    equipped: &[ItemProperty],
    tables: &dyn ReferenceData,
) -> Result<Vec<ItemProperty>> {
    let (tab, resists) = match skill.skill_id {
        SKILL_RESIST_FIRE => (TAB_DEFENSIVE_AURAS, FIRE),
        SKILL_RESIST_COLD => (TAB_DEFENSIVE_AURAS, COLD),
        SKILL_RESIST_LIGHTNING => (TAB_DEFENSIVE_AURAS, LIGHTNING),
        SKILL_NATURAL_RESISTANCE => (TAB_MASTERIES, ALL_RESISTS),
        _ => return Ok(Vec::new()),
    };
    if skill.level == 0 {
        return Ok(Vec::new());
    }

    let level = effective_level(skill.level, tab, equipped);
    let value = if skill.skill_id == SKILL_NATURAL_RESISTANCE {
        NATURAL_RESISTANCE[level.min(NATURAL_RESISTANCE_CAP)]
    } else {
        level as i32 / 2
    };

    resists
        .iter()
        .map(|&stat_id| {
            let template = PropertyTemplate {
                stat_id,
                values: vec![value],
                quality_flag: 0,
            };
            ItemProperty::from_template(&template, tables, 0)
        })
        .collect()
}

/// Hard points plus +all skills and +skill tab bonuses for `tab`
fn effective_level(base: u8, tab: i32, equipped: &[ItemProperty]) -> usize {
    let bonus: i32 = equipped
        .iter()
        .filter(|property| {
            property.stat_id == STAT_ALL_SKILLS
                || (property.stat_id == STAT_SKILL_TAB && property.param() == Some(tab))
        })
        .map(ItemProperty::value)
        .sum();
    (i32::from(base) + bonus).max(0) as usize
}
