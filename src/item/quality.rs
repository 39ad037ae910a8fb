//! Item quality variants
//!
//! The 4-bit quality field selects which sub-format follows. [`QualityKind`]
//! is the raw tag; [`Quality`] is the decoded variant with its ids.

use crate::{D2SaveError, Result};
use serde::{Deserialize, Serialize};

/// Raw quality tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityKind {
    /// Low quality
    Inferior = 1,
    /// Normal
    Normal = 2,
    /// Superior
    Superior = 3,
    /// Magic
    Magic = 4,
    /// Set item
    Set = 5,
    /// Rare
    Rare = 6,
    /// Unique
    Unique = 7,
    /// Crafted
    Crafted = 8,
}

impl QualityKind {
    /// Map the raw 4-bit field; 0 (none) and 9..=15 are invalid
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(QualityKind::Inferior),
            2 => Ok(QualityKind::Normal),
            3 => Ok(QualityKind::Superior),
            4 => Ok(QualityKind::Magic),
            5 => Ok(QualityKind::Set),
            6 => Ok(QualityKind::Rare),
            7 => Ok(QualityKind::Unique),
            8 => Ok(QualityKind::Crafted),
            _ => Err(D2SaveError::UnknownQuality(value)),
        }
    }
}

/// Name prefix of an inferior item
pub fn inferior_prefix(grade: u8) -> Option<&'static str> {
    match grade {
        0 => Some("Crude"),
        1 => Some("Cracked"),
        2 => Some("Damaged"),
        3 => Some("Low Quality"),
        _ => None,
    }
}

/// Affix ids of a rare or crafted item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RareAffixes {
    /// First name fragment id
    pub name_prefix: u16,
    /// Second name fragment id
    pub name_suffix: u16,
    /// Present magic prefix ids, in stored order
    pub prefixes: Vec<u16>,
    /// Present magic suffix ids, in stored order
    pub suffixes: Vec<u16>,
}

/// Decoded quality data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    /// Low quality, with its grade
    Inferior {
        /// 3-bit grade
        grade: u8,
    },
    /// Normal quality
    Normal {
        /// Spell id of a tome
        tome_id: Option<u8>,
    },
    /// Superior quality
    Superior {
        /// 3-bit grade
        grade: u8,
    },
    /// Magic, with a prefix and a suffix (0 when absent)
    Magic {
        /// Magic prefix id
        prefix: u16,
        /// Magic suffix id
        suffix: u16,
    },
    /// Member of an item set
    Set {
        /// Set item id
        id: u16,
        /// Name of the set
        set_name: String,
    },
    /// Rare
    Rare(RareAffixes),
    /// Unique
    Unique {
        /// Unique item id
        id: u16,
    },
    /// Crafted
    Crafted(RareAffixes),
}

impl Quality {
    /// The raw tag of this variant
    pub fn kind(&self) -> QualityKind {
        match self {
            Quality::Inferior { .. } => QualityKind::Inferior,
            Quality::Normal { .. } => QualityKind::Normal,
            Quality::Superior { .. } => QualityKind::Superior,
            Quality::Magic { .. } => QualityKind::Magic,
            Quality::Set { .. } => QualityKind::Set,
            Quality::Rare(_) => QualityKind::Rare,
            Quality::Unique { .. } => QualityKind::Unique,
            Quality::Crafted(_) => QualityKind::Crafted,
        }
    }

    /// Set name of a set item
    pub fn set_name(&self) -> Option<&str> {
        match self {
            Quality::Set { set_name, .. } => Some(set_name),
            _ => None,
        }
    }
}
