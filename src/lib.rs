//! d2save - Rust decoder for Diablo II: Resurrected save files
//!
//! This crate reads character files (`.d2s`) and shared stash files (`.d2i`)
//! written by Diablo II: Resurrected. Character files carry a fixed header
//! followed by marker-tagged sections; items are bit-packed, variable-length
//! records whose shape depends on game reference tables, which the caller
//! supplies through [`ReferenceData`].
//!
//! # Features
//!
//! - Character header decoding without reference data
//! - Attributes, skills, quests and waypoints
//! - Full item decoding: qualities, affixes, sockets, runewords, ears
//! - Set bonus and skill bonus resolution for equipped gear
//! - Shared stash tabs and the rare monster chronicle
//! - Serde serialization of every decoded record
//!
//! # Example - Header only
//!
//! ```no_run
//! use d2save::read_header;
//!
//! let data = std::fs::read("Tester.d2s")?;
//! let header = read_header(&data)?;
//! println!("{} - level {} {:?}", header.name, header.level, header.class);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example - Full decode
//!
//! ```no_run
//! use d2save::{decode_character_file, TableSet};
//!
//! let tables = TableSet::load("tables.json")?;
//! let character = decode_character_file("Tester.d2s", &tables)?;
//! for item in &character.items {
//!     println!("{} ({})", item.name, item.code);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod bitstream;
pub mod bonus;
pub mod common;
pub mod error;
pub mod huffman;
pub mod item;
pub mod reference;
pub mod save;
pub mod tables;

// Async modules (only available with async feature)
#[cfg(feature = "async")]
pub mod async_batch;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use bitstream::BitReader;
pub use bonus::{ResolvedItems, SetBonus};
pub use common::{
    AffixTable, CharacterClass, D2SaveError, FileVersion, HeaderLayout, Result, HEADER_LAYOUT,
    ATTRIBUTES_OFFSET, CHARACTER_MAGIC, MARKER_ATTRIBUTES, MARKER_GOLEM, MARKER_ITEMS,
    MARKER_MERCENARY, MARKER_QUESTS, MARKER_SKILLS, MARKER_WAYPOINTS, MAX_SOCKET_DEPTH,
    NEW_CHARACTER_LEN, QUESTS_OFFSET, SECTION_SCAN_WINDOW, SKILL_SLOTS, STASH_TAB_HEADER_LEN,
    STASH_TAB_MAGIC, STASH_TAB_PADDED_HEADER_LEN, STAT_SCAN_WINDOW, WAYPOINTS_OFFSET,
};
pub use item::{Item, ItemDecoder, ItemFlags, ItemProperty, Quality, QualityKind};
pub use reference::{ReferenceData, TableSet};
pub use save::{
    Attributes, Character, CharacterHeader, ChronicleEntry, SkillRecord, Stash, StashTab,
};

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
pub use async_batch::{AsyncBatchDecoder, DecodedFile};

use std::path::Path;

// Convenience functions

/// Decode a character file held in memory
///
/// # Arguments
/// * `data` - The complete `.d2s` file
/// * `tables` - Game reference tables
///
/// # Returns
/// The decoded character with items and resolved bonuses
pub fn decode_character(data: &[u8], tables: &dyn ReferenceData) -> Result<Character> {
    save::character::decode_character(data, tables)
}

/// Decode a shared stash file held in memory
///
/// # Arguments
/// * `data` - The complete `.d2i` file
/// * `tables` - Game reference tables
///
/// # Returns
/// The decoded stash tabs and, for seven-tab files, the chronicle
pub fn decode_stash(data: &[u8], tables: &dyn ReferenceData) -> Result<Stash> {
    save::stash::decode_stash(data, tables)
}

/// Decode only the fixed character header
///
/// # Arguments
/// * `data` - At least the header bytes of a `.d2s` file
///
/// # Returns
/// The header fields; no reference data is needed
pub fn read_header(data: &[u8]) -> Result<CharacterHeader> {
    save::character::read_header(data)
}

/// Read and decode a character file from disk
pub fn decode_character_file<P: AsRef<Path>>(
    path: P,
    tables: &dyn ReferenceData,
) -> Result<Character> {
    let data = std::fs::read(path)?;
    decode_character(&data, tables)
}

/// Read and decode a shared stash file from disk
pub fn decode_stash_file<P: AsRef<Path>>(path: P, tables: &dyn ReferenceData) -> Result<Stash> {
    let data = std::fs::read(path)?;
    decode_stash(&data, tables)
}
