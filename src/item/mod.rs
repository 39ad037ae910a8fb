//! Item records
//!
//! An item is a bit-packed record of variable length: a fixed header, a
//! Huffman-coded base code, an optional extended block whose shape depends
//! on the item's quality and base category, property lists, and finally
//! the items socketed into it. [`ItemDecoder`] turns one such record into
//! an [`Item`].

pub mod decoder;
pub mod flags;
pub mod property;
pub mod quality;

pub use decoder::ItemDecoder;
pub use flags::ItemFlags;
pub use property::{read_properties, sort_properties, ItemProperty};
pub use quality::{Quality, QualityKind, RareAffixes};

use crate::CharacterClass;
use serde::{Deserialize, Serialize};

/// Where an item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// In a grid container (inventory, cube, stash)
    Stored,
    /// Worn by the character or mercenary
    Equipped,
    /// In the belt
    Belt,
    /// Held by the mouse cursor
    Cursor,
    /// Inside another item's socket
    Socketed,
    /// Any other raw value
    Unknown(u8),
}

impl From<u8> for Location {
    fn from(value: u8) -> Self {
        match value {
            0 => Location::Stored,
            1 => Location::Equipped,
            2 => Location::Belt,
            4 => Location::Cursor,
            6 => Location::Socketed,
            other => Location::Unknown(other),
        }
    }
}

/// Body slot of an equipped item
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    None,
    Head,
    Neck,
    Torso,
    RightHand,
    LeftHand,
    RightRing,
    LeftRing,
    Belt,
    Feet,
    Gloves,
    SwapRight,
    SwapLeft,
    Unknown(u8),
}

impl EquipSlot {
    /// Weapon-swap slots do not count as worn
    pub fn is_swap(&self) -> bool {
        matches!(self, EquipSlot::SwapRight | EquipSlot::SwapLeft)
    }
}

impl From<u8> for EquipSlot {
    fn from(value: u8) -> Self {
        match value {
            0 => EquipSlot::None,
            1 => EquipSlot::Head,
            2 => EquipSlot::Neck,
            3 => EquipSlot::Torso,
            4 => EquipSlot::RightHand,
            5 => EquipSlot::LeftHand,
            6 => EquipSlot::RightRing,
            7 => EquipSlot::LeftRing,
            8 => EquipSlot::Belt,
            9 => EquipSlot::Feet,
            10 => EquipSlot::Gloves,
            11 => EquipSlot::SwapRight,
            12 => EquipSlot::SwapLeft,
            other => EquipSlot::Unknown(other),
        }
    }
}

/// Grid container of a stored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Container {
    /// Not stored in a grid
    None,
    /// Character inventory
    Inventory,
    /// Horadric Cube
    Cube,
    /// Personal stash
    Stash,
    /// Any other raw value
    Unknown(u8),
}

impl From<u8> for Container {
    fn from(value: u8) -> Self {
        match value {
            0 => Container::None,
            1 => Container::Inventory,
            4 => Container::Cube,
            5 => Container::Stash,
            other => Container::Unknown(other),
        }
    }
}

/// Which base item table the code was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseCategory {
    /// Armor table
    Armor,
    /// Weapon table
    Weapon,
    /// Misc table
    Misc,
}

/// Requirements to use an item
///
/// Strength and dexterity are signed: the ethereal reduction is not clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Required character level
    pub level: u16,
    /// Required strength
    pub strength: i32,
    /// Required dexterity
    pub dexterity: i32,
}

/// A player ear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ear {
    /// Class of the previous owner, if the id is valid
    pub class: Option<CharacterClass>,
    /// Level of the previous owner
    pub level: u8,
    /// Name of the previous owner
    pub owner: String,
}

/// Maximum and current durability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durability {
    /// Maximum durability; 0 means indestructible
    pub max: u16,
    /// Current durability
    pub current: u16,
}

/// Fields present only on non-simple items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extended {
    /// Random seed the game uses to roll the item
    pub fingerprint: u32,
    /// Item level
    pub item_level: u8,
    /// Quality and its ids
    pub quality: Quality,
    /// Alternate graphic
    pub picture_id: Option<u8>,
    /// Class-specific auto affix
    pub class_specific: Option<u16>,
    /// Owner name of a personalized item
    pub personalized_name: Option<String>,
    /// Number of sockets holding an item
    pub filled_sockets: u8,
    /// Total number of sockets
    pub total_sockets: u8,
    /// Armor defense
    pub defense: Option<i32>,
    /// Durability of armor and weapons that have it
    pub durability: Option<Durability>,
    /// Which of the five set-tier property blocks are present
    pub set_tiers: [bool; 5],
}

/// A decoded item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item flags
    pub flags: ItemFlags,
    /// Item format version
    pub version: u8,
    /// Where the item is
    pub location: Location,
    /// Body slot when equipped
    pub slot: EquipSlot,
    /// Grid column
    pub x: u8,
    /// Grid row
    pub y: u8,
    /// Grid container
    pub container: Container,
    /// Three character base code (empty for ears)
    pub code: String,
    /// Display name
    pub name: String,
    /// Base item table (none for ears)
    pub category: Option<BaseCategory>,
    /// Item type code from the base table
    pub item_type: String,
    /// Requirements after affixes, sockets and ethereal adjustment
    pub requirements: Requirements,
    /// Class an affix restricts the item to
    pub class_restriction: Option<CharacterClass>,
    /// Ear data
    pub ear: Option<Ear>,
    /// Extended data of non-simple items
    pub extended: Option<Extended>,
    /// Stack size of stackable items
    pub quantity: Option<u16>,
    /// Unique identifier of items that carry one
    pub guid: Option<[u32; 4]>,
    /// Properties in display order
    pub properties: Vec<ItemProperty>,
    /// Items in the sockets, in socket order
    pub socketed: Vec<Item>,
    /// A reserved affix id (2047) was found
    pub affix_overflow: bool,
}

impl Item {
    /// Quality of a non-simple item
    pub fn quality(&self) -> Option<&Quality> {
        self.extended.as_ref().map(|extended| &extended.quality)
    }

    /// Set name of a set item
    pub fn set_name(&self) -> Option<&str> {
        self.quality().and_then(Quality::set_name)
    }

    /// Worn in a slot that grants bonuses (weapon swap excluded)
    pub fn is_equipped(&self) -> bool {
        self.location == Location::Equipped && !self.slot.is_swap()
    }

    /// Whether this item or one of its socketed children has an overflowed
    /// affix id
    pub fn has_affix_overflow(&self) -> bool {
        self.affix_overflow || self.socketed.iter().any(Item::has_affix_overflow)
    }
}
