//! The character attribute block
//!
//! A self-terminating run of `(9-bit id, value)` pairs; widths and divisors
//! come from [`ATTRIBUTE_DEFS`]. Attributes the game does not store (zero
//! values) are simply absent.

use crate::bitstream::BitReader;
use crate::tables::{starter_attributes, ATTRIBUTE_DEFS, ATTRIBUTE_TERMINATOR};
use crate::{CharacterClass, D2SaveError, Result};
use serde::{Deserialize, Serialize};

/// Character attributes
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: u32,
    pub energy: u32,
    pub dexterity: u32,
    pub vitality: u32,
    pub stat_points: u32,
    pub skill_points: u32,
    pub life: u32,
    pub max_life: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub stamina: u32,
    pub max_stamina: u32,
    pub level: u32,
    pub experience: u32,
    pub gold: u32,
    pub stashed_gold: u32,
}

impl Attributes {
    /// Attributes of a level 1 character of `class`
    pub fn starter(class: CharacterClass) -> Self {
        let starter = starter_attributes(class);
        Self {
            strength: starter.strength,
            energy: starter.energy,
            dexterity: starter.dexterity,
            vitality: starter.vitality,
            life: starter.life,
            max_life: starter.life,
            mana: starter.mana,
            max_mana: starter.mana,
            stamina: starter.stamina,
            max_stamina: starter.stamina,
            level: 1,
            ..Default::default()
        }
    }

    /// Decode the block that follows the `gf` marker
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let mut attributes = Self::default();
        loop {
            let id = reader.read_uint(9) as u16;
            if id == ATTRIBUTE_TERMINATOR {
                return Ok(attributes);
            }
            if reader.is_exhausted() {
                return Err(D2SaveError::UnexpectedEof {
                    offset: reader.byte_position(),
                });
            }

            let def = ATTRIBUTE_DEFS
                .get(usize::from(id))
                .ok_or(D2SaveError::UnknownStat(id))?;
            let value = reader.read_uint(def.bits) / def.coefficient;
            attributes.set(id, value);
        }
    }

    fn set(&mut self, id: u16, value: u32) {
        let field = match id {
            0 => &mut self.strength,
            1 => &mut self.energy,
            2 => &mut self.dexterity,
            3 => &mut self.vitality,
            4 => &mut self.stat_points,
            5 => &mut self.skill_points,
            6 => &mut self.life,
            7 => &mut self.max_life,
            8 => &mut self.mana,
            9 => &mut self.max_mana,
            10 => &mut self.stamina,
            11 => &mut self.max_stamina,
            12 => &mut self.level,
            13 => &mut self.experience,
            14 => &mut self.gold,
            15 => &mut self.stashed_gold,
            _ => return,
        };
        *field = value;
    }
}
