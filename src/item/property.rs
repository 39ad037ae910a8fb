//! Item property lists
//!
//! A property list is a run of `(9-bit stat id, value fields...)` records
//! closed by stat id 511. Field widths and biases come from the stat cost
//! table. A handful of stats are stored in other shapes, dispatched by id
//! below.

use crate::bitstream::BitReader;
use crate::reference::{PropertyTemplate, ReferenceData};
use crate::{D2SaveError, Result};
use serde::{Deserialize, Serialize};

/// Stat id that closes a property list
pub const STAT_TERMINATOR: u16 = 511;

/// Enhanced maximum damage percent (followed by the minimum)
pub const STAT_ENHANCED_DAMAGE: u16 = 17;
/// Fire resistance
pub const STAT_FIRE_RESIST: u16 = 39;
/// Lightning resistance
pub const STAT_LIGHTNING_RESIST: u16 = 41;
/// Cold resistance
pub const STAT_COLD_RESIST: u16 = 43;
/// Poison resistance
pub const STAT_POISON_RESIST: u16 = 45;
/// Minimum fire damage
pub const STAT_FIRE_MIN: u16 = 48;
/// Minimum lightning damage
pub const STAT_LIGHTNING_MIN: u16 = 50;
/// Minimum magic damage
pub const STAT_MAGIC_MIN: u16 = 52;
/// Minimum cold damage
pub const STAT_COLD_MIN: u16 = 54;
/// Minimum poison damage
pub const STAT_POISON_MIN: u16 = 57;
/// Damage percent against undead
pub const STAT_UNDEAD_DAMAGE: u16 = 122;
/// +all skills
pub const STAT_ALL_SKILLS: u16 = 127;
/// +skill tab, parameterized by `class * 8 + tab`
pub const STAT_SKILL_TAB: u16 = 188;
/// Charged skill
pub const STAT_CHARGED_SKILL: u16 = 204;

/// Quality flag of a jewel's own properties
pub const FLAG_JEWEL: u8 = 1;
/// Quality flag of the first set-tier block; tier `n` uses `FLAG_SET_TIER + n`
pub const FLAG_SET_TIER: u8 = 2;
/// Socket mods that apply inside a weapon
pub const FLAG_SOCKET_WEAPON: u8 = 7;
/// Socket mods that apply inside a helm or body armor
pub const FLAG_SOCKET_HELM: u8 = 8;
/// Socket mods that apply inside a shield or other armor
pub const FLAG_SOCKET_SHIELD: u8 = 9;
/// Base of partial set bonus flags; `n` worn items unlock `FLAG_SET_PARTIAL + n`
pub const FLAG_SET_PARTIAL: u8 = 20;
/// Full set bonus
pub const FLAG_SET_FULL: u8 = 26;

/// Skill-on-event stats: level (6), skill (10), chance
const SKILL_ON_EVENT: [u16; 6] = [195, 196, 197, 198, 199, 201];

/// A single decoded stat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProperty {
    /// Stat id
    pub stat_id: u16,
    /// Stat name from the stat cost table
    pub name: String,
    /// One to four values, depending on the stat's shape
    pub values: Vec<i32>,
    /// Activation context, not part of the stored bits
    pub quality_flag: u8,
    /// Display priority
    pub display_order: i32,
}

impl ItemProperty {
    /// Build a property from a reference table template
    pub fn from_template(
        template: &PropertyTemplate,
        tables: &dyn ReferenceData,
        quality_flag: u8,
    ) -> Result<Self> {
        let cost = tables
            .stat_cost(template.stat_id)
            .ok_or(D2SaveError::UnknownStat(template.stat_id))?;
        Ok(Self {
            stat_id: template.stat_id,
            name: cost.name.clone(),
            values: template.values.clone(),
            quality_flag,
            display_order: cost.display_order,
        })
    }

    /// The value that carries the stat's magnitude (the last one)
    pub fn value(&self) -> i32 {
        self.values.last().copied().unwrap_or(0)
    }

    /// The parameter of a parameterized stat
    pub fn param(&self) -> Option<i32> {
        if self.values.len() == 2 {
            self.values.first().copied()
        } else {
            None
        }
    }
}

/// Stats stored directly after `id` without their own 9-bit id
fn implicit_followers(id: u16) -> &'static [u16] {
    match id {
        STAT_ENHANCED_DAMAGE => &[18],
        STAT_FIRE_MIN => &[49],
        STAT_LIGHTNING_MIN => &[51],
        STAT_MAGIC_MIN => &[53],
        STAT_COLD_MIN => &[55, 56],
        STAT_POISON_MIN => &[58, 59],
        _ => &[],
    }
}

/// Widest field a stat cost entry may declare
const MAX_FIELD_BITS: u32 = 32;

/// Decode one property list, stamping `quality_flag` on every entry
pub fn read_properties(
    reader: &mut BitReader<'_>,
    tables: &dyn ReferenceData,
    quality_flag: u8,
) -> Result<Vec<ItemProperty>> {
    let mut properties = Vec::new();

    loop {
        let id = reader.read_uint(9) as u16;
        if id == STAT_TERMINATOR {
            return Ok(properties);
        }
        if reader.is_exhausted() {
            return Err(D2SaveError::UnexpectedEof {
                offset: reader.byte_position(),
            });
        }

        properties.push(read_property(reader, tables, id, quality_flag)?);
        for &follower in implicit_followers(id) {
            properties.push(read_property(reader, tables, follower, quality_flag)?);
        }
    }
}

fn read_property(
    reader: &mut BitReader<'_>,
    tables: &dyn ReferenceData,
    id: u16,
    quality_flag: u8,
) -> Result<ItemProperty> {
    let cost = tables.stat_cost(id).ok_or(D2SaveError::UnknownStat(id))?;
    let widest = cost.save_bits.max(cost.save_param_bits.unwrap_or(0));
    if widest > MAX_FIELD_BITS {
        return Err(D2SaveError::InvalidStatWidth {
            stat_id: id,
            bits: widest,
        });
    }
    let read_value = |reader: &mut BitReader<'_>| -> i32 {
        (i64::from(reader.read_uint(cost.save_bits)) - i64::from(cost.save_add)) as i32
    };

    let values = if SKILL_ON_EVENT.contains(&id) {
        let level = reader.read_uint(6) as i32;
        let skill = reader.read_uint(10) as i32;
        vec![level, skill, read_value(reader)]
    } else if id == STAT_CHARGED_SKILL {
        let level = reader.read_uint(6) as i32;
        let skill = reader.read_uint(10) as i32;
        let charges = reader.read_uint(8) as i32;
        let max_charges = reader.read_uint(8) as i32;
        vec![level, skill, charges, max_charges]
    } else if let Some(param_bits) = cost.save_param_bits {
        let param = reader.read_uint(param_bits) as i32;
        vec![param, read_value(reader)]
    } else {
        vec![read_value(reader)]
    };

    Ok(ItemProperty {
        stat_id: id,
        name: cost.name.clone(),
        values,
        quality_flag,
        display_order: cost.display_order,
    })
}

/// Order properties for display
///
/// Higher `display_order` first; properties with equal order keep the order
/// they were decoded in.
pub fn sort_properties(properties: &mut [ItemProperty]) {
    properties.sort_by(|a, b| b.display_order.cmp(&a.display_order));
}
