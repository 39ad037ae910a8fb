//! Reference data consumed by the decoder
//!
//! Item bases, affixes, sets and the stat cost table come from the game's data
//! files. The decoder never parses those files itself: it asks a
//! [`ReferenceData`] implementation for single records. [`TableSet`] is the
//! in-memory implementation shipped with the crate; it is built once, then
//! shared by reference (or `Arc`) across any number of decode calls.

use crate::{CharacterClass, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Base stats of an armor, weapon or misc item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseItem {
    /// Three character base code
    pub code: String,
    /// Display name
    pub name: String,
    /// Item type code (`helm`, `tors`, `shie`, `rune`, `gema`, `amul`, ...)
    pub item_type: String,
    /// Required level
    pub req_level: u16,
    /// Required strength
    pub req_str: i32,
    /// Required dexterity
    pub req_dex: i32,
    /// Inventory width in cells
    pub width: u8,
    /// Inventory height in cells
    pub height: u8,
    /// Whether the item stores a durability pair
    pub durability: bool,
    /// Whether the item stores a quantity
    pub stackable: bool,
    /// Two-handed weapon
    pub two_handed: bool,
    /// Throwing weapon
    pub thrown: bool,
    /// Blunt weapon (bonus damage against undead)
    pub blunt: bool,
}

impl BaseItem {
    /// Runes
    pub fn is_rune(&self) -> bool {
        self.item_type == "rune"
    }

    /// Gems of every grade
    pub fn is_gem(&self) -> bool {
        self.item_type.starts_with("gem")
    }

    /// Jewels
    pub fn is_jewel(&self) -> bool {
        self.code == "jew"
    }

    /// Amulets and rings
    pub fn is_jewelry(&self) -> bool {
        matches!(self.item_type.as_str(), "amul" | "ring")
    }

    /// Small, large and grand charms
    pub fn is_charm(&self) -> bool {
        matches!(self.item_type.as_str(), "scha" | "mcha" | "lcha")
    }

    /// Helms and body armor share the armor socket context
    pub fn is_helm_or_torso(&self) -> bool {
        matches!(
            self.item_type.as_str(),
            "helm" | "circ" | "pelt" | "phlm" | "tors"
        )
    }
}

/// Encoding of one stat in item property lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatCost {
    /// Stat name
    pub name: String,
    /// Width of the stored value
    pub save_bits: u32,
    /// Bias subtracted from the stored value
    pub save_add: i32,
    /// Width of the parameter field, for parameterized stats
    pub save_param_bits: Option<u32>,
    /// Display priority; higher sorts first
    pub display_order: i32,
}

/// A magic prefix or suffix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Affix {
    /// Name fragment
    pub name: String,
    /// Required level
    pub req_level: u16,
    /// Class the affix restricts the item to
    pub class: Option<CharacterClass>,
}

/// A unique item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueItem {
    /// Unique name
    pub name: String,
    /// Required level
    pub req_level: u16,
}

/// One member of an item set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetItem {
    /// Item name
    pub name: String,
    /// Name of the set it belongs to
    pub set_name: String,
    /// Required level
    pub req_level: u16,
}

/// A stat with fixed values, as found in the reference tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyTemplate {
    /// Stat id
    pub stat_id: u16,
    /// Values in the same shape the property codec produces
    pub values: Vec<i32>,
    /// Activation context (20+n for n-item set bonuses, 26 for full set)
    pub quality_flag: u8,
}

/// Bonuses granted by wearing several items of one set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetBonuses {
    /// Number of items in the set
    pub item_count: u8,
    /// Partial bonuses, tagged 22..=25
    pub partial: Vec<PropertyTemplate>,
    /// Full set bonuses, tagged 26
    pub full: Vec<PropertyTemplate>,
}

/// A runeword
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Runeword {
    /// Runeword name
    pub name: String,
    /// Required level
    pub req_level: u16,
}

/// Mods a gem or rune grants depending on where it is socketed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Socketable {
    /// Mods inside a weapon
    pub weapon: Vec<PropertyTemplate>,
    /// Mods inside a helm or body armor
    pub helm: Vec<PropertyTemplate>,
    /// Mods inside a shield or other armor
    pub shield: Vec<PropertyTemplate>,
}

/// Lookups the decoder needs from the game's reference data
pub trait ReferenceData {
    /// Armor base by code
    fn armor(&self, code: &str) -> Option<&BaseItem>;
    /// Weapon base by code
    fn weapon(&self, code: &str) -> Option<&BaseItem>;
    /// Misc base by code
    fn misc(&self, code: &str) -> Option<&BaseItem>;
    /// Stat encoding by stat id
    fn stat_cost(&self, id: u16) -> Option<&StatCost>;
    /// Magic prefix by id
    fn magic_prefix(&self, id: u16) -> Option<&Affix>;
    /// Magic suffix by id
    fn magic_suffix(&self, id: u16) -> Option<&Affix>;
    /// First half of a rare name
    fn rare_prefix(&self, id: u16) -> Option<&str>;
    /// Second half of a rare name
    fn rare_suffix(&self, id: u16) -> Option<&str>;
    /// Unique item by id
    fn unique_item(&self, id: u16) -> Option<&UniqueItem>;
    /// Set item by id
    fn set_item(&self, id: u16) -> Option<&SetItem>;
    /// Set bonuses by set name
    fn set_bonuses(&self, set_name: &str) -> Option<&SetBonuses>;
    /// Runeword by concatenated rune names (`"TalEth"`)
    fn runeword(&self, runes: &str) -> Option<&Runeword>;
    /// Socket mods of a gem, rune or other socketable by code
    fn socketable(&self, code: &str) -> Option<&Socketable>;
}

/// In-memory reference tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSet {
    /// Armor bases by code
    pub armor: HashMap<String, BaseItem>,
    /// Weapon bases by code
    pub weapons: HashMap<String, BaseItem>,
    /// Misc bases by code
    pub misc: HashMap<String, BaseItem>,
    /// Stat encodings by id
    pub stats: HashMap<u16, StatCost>,
    /// Magic prefixes by id
    pub magic_prefixes: HashMap<u16, Affix>,
    /// Magic suffixes by id
    pub magic_suffixes: HashMap<u16, Affix>,
    /// Rare name prefixes by id
    pub rare_prefixes: HashMap<u16, String>,
    /// Rare name suffixes by id
    pub rare_suffixes: HashMap<u16, String>,
    /// Unique items by id
    pub uniques: HashMap<u16, UniqueItem>,
    /// Set items by id
    pub set_items: HashMap<u16, SetItem>,
    /// Set bonuses by set name
    pub sets: HashMap<String, SetBonuses>,
    /// Runewords by concatenated rune names
    pub runewords: HashMap<String, Runeword>,
    /// Socket mods by code
    pub socketables: HashMap<String, Socketable>,
}

impl TableSet {
    /// Create an empty table set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table set from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a table set from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the table set to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add an armor base
    pub fn with_armor(mut self, base: BaseItem) -> Self {
        self.armor.insert(base.code.clone(), base);
        self
    }

    /// Add a weapon base
    pub fn with_weapon(mut self, base: BaseItem) -> Self {
        self.weapons.insert(base.code.clone(), base);
        self
    }

    /// Add a misc base
    pub fn with_misc(mut self, base: BaseItem) -> Self {
        self.misc.insert(base.code.clone(), base);
        self
    }

    /// Add a stat encoding
    pub fn with_stat(mut self, id: u16, cost: StatCost) -> Self {
        self.stats.insert(id, cost);
        self
    }

    /// Add a magic prefix
    pub fn with_magic_prefix(mut self, id: u16, affix: Affix) -> Self {
        self.magic_prefixes.insert(id, affix);
        self
    }

    /// Add a magic suffix
    pub fn with_magic_suffix(mut self, id: u16, affix: Affix) -> Self {
        self.magic_suffixes.insert(id, affix);
        self
    }

    /// Add a rare name prefix
    pub fn with_rare_prefix(mut self, id: u16, name: &str) -> Self {
        self.rare_prefixes.insert(id, name.to_string());
        self
    }

    /// Add a rare name suffix
    pub fn with_rare_suffix(mut self, id: u16, name: &str) -> Self {
        self.rare_suffixes.insert(id, name.to_string());
        self
    }

    /// Add a unique item
    pub fn with_unique(mut self, id: u16, unique: UniqueItem) -> Self {
        self.uniques.insert(id, unique);
        self
    }

    /// Add a set item
    pub fn with_set_item(mut self, id: u16, item: SetItem) -> Self {
        self.set_items.insert(id, item);
        self
    }

    /// Add the bonuses of a set
    pub fn with_set(mut self, set_name: &str, bonuses: SetBonuses) -> Self {
        self.sets.insert(set_name.to_string(), bonuses);
        self
    }

    /// Add a runeword keyed by its concatenated rune names
    pub fn with_runeword(mut self, runes: &str, runeword: Runeword) -> Self {
        self.runewords.insert(runes.to_string(), runeword);
        self
    }

    /// Add socket mods for a socketable code
    pub fn with_socketable(mut self, code: &str, socketable: Socketable) -> Self {
        self.socketables.insert(code.to_string(), socketable);
        self
    }
}

impl ReferenceData for TableSet {
    fn armor(&self, code: &str) -> Option<&BaseItem> {
        self.armor.get(code)
    }

    fn weapon(&self, code: &str) -> Option<&BaseItem> {
        self.weapons.get(code)
    }

    fn misc(&self, code: &str) -> Option<&BaseItem> {
        self.misc.get(code)
    }

    fn stat_cost(&self, id: u16) -> Option<&StatCost> {
        self.stats.get(&id)
    }

    fn magic_prefix(&self, id: u16) -> Option<&Affix> {
        self.magic_prefixes.get(&id)
    }

    fn magic_suffix(&self, id: u16) -> Option<&Affix> {
        self.magic_suffixes.get(&id)
    }

    fn rare_prefix(&self, id: u16) -> Option<&str> {
        self.rare_prefixes.get(&id).map(String::as_str)
    }

    fn rare_suffix(&self, id: u16) -> Option<&str> {
        self.rare_suffixes.get(&id).map(String::as_str)
    }

    fn unique_item(&self, id: u16) -> Option<&UniqueItem> {
        self.uniques.get(&id)
    }

    fn set_item(&self, id: u16) -> Option<&SetItem> {
        self.set_items.get(&id)
    }

    fn set_bonuses(&self, set_name: &str) -> Option<&SetBonuses> {
        self.sets.get(set_name)
    }

    fn runeword(&self, runes: &str) -> Option<&Runeword> {
        self.runewords.get(runes)
    }

    fn socketable(&self, code: &str) -> Option<&Socketable> {
        self.socketables.get(code)
    }
}
