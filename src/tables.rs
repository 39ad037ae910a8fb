//! Static tables baked into the save format
//!
//! These never change between game data versions, so unlike the reference
//! data in [`crate::reference`] they are compiled in.

use crate::CharacterClass;

/// Prefix codes for item base codes, as `(symbol, bits in read order)`
pub const ITEM_CODE_HUFFMAN: [(char, &str); 37] = [
    (' ', "10"),
    ('a', "11110"),
    ('b', "0101"),
    ('c', "01000"),
    ('d', "110001"),
    ('e', "110000"),
    ('f', "010011"),
    ('g', "11010"),
    ('h', "00011"),
    ('i', "1111110"),
    ('j', "000101110"),
    ('k', "010010"),
    ('l', "11101"),
    ('m', "01101"),
    ('n', "001101"),
    ('o', "1111111"),
    ('p', "11001"),
    ('q', "11011001"),
    ('r', "11100"),
    ('s', "0010"),
    ('t', "01100"),
    ('u', "00001"),
    ('v', "1101110"),
    ('w', "00000"),
    ('x', "00111"),
    ('y', "0001010"),
    ('z', "11011000"),
    ('0', "11111011"),
    ('1', "1111100"),
    ('2', "001100"),
    ('3', "1101101"),
    ('4', "11111010"),
    ('5', "00010110"),
    ('6', "1101111"),
    ('7', "01111"),
    ('8', "000100"),
    ('9', "01110"),
];

/// One entry of the character attribute block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDef {
    /// Stat index as stored in the block
    pub id: u16,
    /// Field width in bits
    pub bits: u32,
    /// Divisor applied to the raw value
    pub coefficient: u32,
}

/// Attribute index that ends the attribute block
pub const ATTRIBUTE_TERMINATOR: u16 = 0x1FF;

/// Attribute block layout, indexed by stat id
pub const ATTRIBUTE_DEFS: [AttributeDef; 16] = [
    AttributeDef { id: 0, bits: 10, coefficient: 1 },   // strength
    AttributeDef { id: 1, bits: 10, coefficient: 1 },   // energy
    AttributeDef { id: 2, bits: 10, coefficient: 1 },   // dexterity
    AttributeDef { id: 3, bits: 10, coefficient: 1 },   // vitality
    AttributeDef { id: 4, bits: 10, coefficient: 1 },   // stat points
    AttributeDef { id: 5, bits: 8, coefficient: 1 },    // skill points
    AttributeDef { id: 6, bits: 21, coefficient: 256 }, // life
    AttributeDef { id: 7, bits: 21, coefficient: 256 }, // max life
    AttributeDef { id: 8, bits: 21, coefficient: 256 }, // mana
    AttributeDef { id: 9, bits: 21, coefficient: 256 }, // max mana
    AttributeDef { id: 10, bits: 21, coefficient: 256 }, // stamina
    AttributeDef { id: 11, bits: 21, coefficient: 256 }, // max stamina
    AttributeDef { id: 12, bits: 7, coefficient: 1 },   // level
    AttributeDef { id: 13, bits: 32, coefficient: 1 },  // experience
    AttributeDef { id: 14, bits: 25, coefficient: 1 },  // gold
    AttributeDef { id: 15, bits: 25, coefficient: 1 },  // stashed gold
];

/// Starting attributes of a fresh level 1 character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarterAttributes {
    /// Strength
    pub strength: u32,
    /// Dexterity
    pub dexterity: u32,
    /// Vitality
    pub vitality: u32,
    /// Energy
    pub energy: u32,
    /// Life
    pub life: u32,
    /// Mana
    pub mana: u32,
    /// Stamina
    pub stamina: u32,
}

/// Starting attributes for a class
pub fn starter_attributes(class: CharacterClass) -> StarterAttributes {
    let (strength, dexterity, vitality, energy, life, mana, stamina) = match class {
        CharacterClass::Amazon => (20, 25, 20, 15, 50, 15, 84),
        CharacterClass::Sorceress => (10, 25, 10, 35, 40, 35, 74),
        CharacterClass::Necromancer => (15, 25, 15, 25, 45, 25, 79),
        CharacterClass::Paladin => (25, 20, 25, 15, 55, 15, 89),
        CharacterClass::Barbarian => (30, 20, 25, 10, 55, 10, 92),
        CharacterClass::Druid => (15, 20, 25, 20, 55, 20, 84),
        CharacterClass::Assassin => (20, 20, 20, 25, 50, 25, 95),
    };
    StarterAttributes {
        strength,
        dexterity,
        vitality,
        energy,
        life,
        mana,
        stamina,
    }
}

/// Natural Resistance bonus by effective skill level (diminishing returns, capped at 60)
pub const NATURAL_RESISTANCE: [i32; 61] = [
    0, 12, 21, 28, 35, 40, 44, 47, 49, 52, 54, 56, 58, 60, 61, 62, 64, 64, 65, 66, 67, 68, 68,
    69, 70, 70, 71, 72, 72, 72, 72, 73, 73, 74, 74, 74, 75, 75, 76, 76, 76, 76, 76, 76, 76, 77,
    77, 77, 77, 78, 78, 78, 78, 78, 79, 79, 79, 79, 79, 79, 80,
];
