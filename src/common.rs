//! Common types and constants for the Diablo II save formats
//!
//! This module defines the error type, the file-level constants (magic values,
//! section markers, fixed offsets) and the small enums shared by the character
//! and stash decoders.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Character file magic, as stored on disk
pub const CHARACTER_MAGIC: [u8; 4] = [0xAA, 0x55, 0xAA, 0x55];

/// Shared stash tab marker, as stored on disk
pub const STASH_TAB_MAGIC: [u8; 4] = [0x55, 0xAA, 0x55, 0xAA];

/// Quest section marker
pub const MARKER_QUESTS: &[u8; 4] = b"Woo!";

/// Waypoint section marker
pub const MARKER_WAYPOINTS: &[u8; 2] = b"WS";

/// Attribute block marker
pub const MARKER_ATTRIBUTES: &[u8; 2] = b"gf";

/// Skill block marker
pub const MARKER_SKILLS: &[u8; 2] = b"if";

/// Item list marker
pub const MARKER_ITEMS: &[u8; 2] = b"JM";

/// Mercenary item section marker
pub const MARKER_MERCENARY: &[u8; 2] = b"jf";

/// Iron golem section marker
pub const MARKER_GOLEM: &[u8; 2] = b"kf";

/// Offset of the quest section
pub const QUESTS_OFFSET: usize = 0x14F;

/// Offset of the waypoint section
pub const WAYPOINTS_OFFSET: usize = 0x279;

/// Earliest offset of the attribute block
pub const ATTRIBUTES_OFFSET: usize = 0x2FD;

/// Length of a character file the game wrote before the first save in game.
///
/// Such a file ends where the attribute block would start.
pub const NEW_CHARACTER_LEN: usize = ATTRIBUTES_OFFSET;

/// How far past [`ATTRIBUTES_OFFSET`] the attribute marker may be found
pub const STAT_SCAN_WINDOW: usize = 0x100;

/// How far the skill and corpse markers may drift from where they are expected
pub const SECTION_SCAN_WINDOW: usize = 0x10;

/// Maximum nesting of socketed items
pub const MAX_SOCKET_DEPTH: usize = 3;

/// Number of skill slots per class
pub const SKILL_SLOTS: usize = 30;

/// Size of the fixed stash tab header fields
pub const STASH_TAB_HEADER_LEN: usize = 0x14;

/// Stash tab header size when the game zero-pads it
pub const STASH_TAB_PADDED_HEADER_LEN: usize = 0x40;

/// Supported character file versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileVersion {
    /// Diablo II: Resurrected up to patch 2.3 (0x61)
    Resurrected = 0x61,
    /// Diablo II: Resurrected patch 2.4 and later (0x62)
    Resurrected24 = 0x62,
}

impl FileVersion {
    /// Map a raw version field to a supported layout
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0x61 => Ok(FileVersion::Resurrected),
            0x62 => Ok(FileVersion::Resurrected24),
            _ => Err(D2SaveError::MalformedHeader(format!(
                "unsupported file version {value:#x}"
            ))),
        }
    }
}

/// Fixed header offsets of a character file
///
/// Both supported versions share these offsets; the version field only
/// decides whether a file is accepted.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub file_size: usize,
    pub checksum: usize,
    pub active_weapon: usize,
    pub status: usize,
    pub progression: usize,
    pub class: usize,
    pub level: usize,
    pub last_played: usize,
    pub difficulty: usize,
    pub map_id: usize,
    pub mercenary_dead: usize,
    pub mercenary_id: usize,
    pub mercenary_name: usize,
    pub mercenary_type: usize,
    pub mercenary_experience: usize,
    pub name: usize,
    pub name_len: usize,
}

/// Header offsets of every supported character file
pub const HEADER_LAYOUT: HeaderLayout = HeaderLayout {
    file_size: 0x08,
    checksum: 0x0C,
    active_weapon: 0x10,
    status: 0x24,
    progression: 0x25,
    class: 0x28,
    level: 0x2B,
    last_played: 0x30,
    difficulty: 0xA8,
    map_id: 0xAB,
    mercenary_dead: 0xB1,
    mercenary_id: 0xB3,
    mercenary_name: 0xB7,
    mercenary_type: 0xB9,
    mercenary_experience: 0xBB,
    name: 0x12B,
    name_len: 16,
};


/// Playable character classes
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Amazon = 0,
    Sorceress = 1,
    Necromancer = 2,
    Paladin = 3,
    Barbarian = 4,
    Druid = 5,
    Assassin = 6,
}

impl CharacterClass {
    /// All classes in file order
    pub const ALL: [CharacterClass; 7] = [
        CharacterClass::Amazon,
        CharacterClass::Sorceress,
        CharacterClass::Necromancer,
        CharacterClass::Paladin,
        CharacterClass::Barbarian,
        CharacterClass::Druid,
        CharacterClass::Assassin,
    ];

    /// Create a CharacterClass from its raw id
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Skill id of the first skill slot of this class
    pub fn skill_offset(&self) -> u16 {
        match self {
            CharacterClass::Amazon => 6,
            CharacterClass::Sorceress => 36,
            CharacterClass::Necromancer => 66,
            CharacterClass::Paladin => 96,
            CharacterClass::Barbarian => 126,
            CharacterClass::Druid => 221,
            CharacterClass::Assassin => 251,
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CharacterClass::Amazon => "Amazon",
            CharacterClass::Sorceress => "Sorceress",
            CharacterClass::Necromancer => "Necromancer",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Barbarian => "Barbarian",
            CharacterClass::Druid => "Druid",
            CharacterClass::Assassin => "Assassin",
        };
        f.write_str(name)
    }
}

/// Which reference table an unresolved id belongs to
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffixTable {
    MagicPrefix,
    MagicSuffix,
    RarePrefix,
    RareSuffix,
    Unique,
    SetItem,
}

impl fmt::Display for AffixTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AffixTable::MagicPrefix => "magic prefix",
            AffixTable::MagicSuffix => "magic suffix",
            AffixTable::RarePrefix => "rare prefix",
            AffixTable::RareSuffix => "rare suffix",
            AffixTable::Unique => "unique item",
            AffixTable::SetItem => "set item",
        };
        f.write_str(name)
    }
}

/// Error type for save decoding
#[derive(Debug, Error)]
pub enum D2SaveError {
    /// Bad magic, unsupported version or truncated header
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Base code not found in exactly one base item table
    #[error("Unknown base item code: {0:?}")]
    UnknownBaseItem(String),

    /// Stat id missing from the stat cost table
    #[error("Unknown stat id: {0}")]
    UnknownStat(u16),

    /// Affix, unique or set item id missing from its table
    #[error("Unknown {table} id: {id}")]
    UnknownAffix {
        /// Table that was searched
        table: AffixTable,
        /// The id that was not found
        id: u16,
    },

    /// A stat cost entry declares a field wider than 32 bits
    #[error("Stat {stat_id} declares a {bits}-bit field")]
    InvalidStatWidth {
        /// Stat id of the entry
        stat_id: u16,
        /// Declared width
        bits: u32,
    },

    /// Item quality outside the defined range
    #[error("Unknown item quality: {0}")]
    UnknownQuality(u8),

    /// A required section marker was not found
    #[error("Missing {marker:?} marker near offset {offset:#x}")]
    MissingMarker {
        /// The marker text
        marker: String,
        /// Where the search started
        offset: usize,
    },

    /// An item code did not terminate within the bit budget
    #[error("Huffman code did not terminate after {bits} bits")]
    HuffmanOverrun {
        /// Bits consumed before giving up
        bits: u32,
    },

    /// A field extends past the end of the buffer
    #[error("Unexpected end of input at offset {offset:#x}")]
    UnexpectedEof {
        /// Byte offset of the read that failed
        offset: usize,
    },

    /// Socketed items nested deeper than the game allows
    #[error("Socketed items nested {depth} levels deep")]
    SocketDepthExceeded {
        /// Nesting depth reached
        depth: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reference table (de)serialization error
    #[error("Reference table error: {0}")]
    Json(#[from] serde_json::Error),
}

impl D2SaveError {
    pub(crate) fn missing_marker(marker: &[u8], offset: usize) -> Self {
        D2SaveError::MissingMarker {
            marker: String::from_utf8_lossy(marker).into_owned(),
            offset,
        }
    }
}

/// Result type alias for save decoding
pub type Result<T> = std::result::Result<T, D2SaveError>;
