//! Character files (`.d2s`)
//!
//! The first 0x2FD bytes are fixed: header scalars, the quest section and
//! the waypoint section. Everything after is variable length and located by
//! marker scans:
//!
//! ```text
//! gf <attributes> if <skills> JM <items> JM <corpse> [jf <mercenary>] [kf <golem>]
//! ```

use crate::bitstream::{read_u16_le_at, read_u32_le_at, read_u8_at, BitReader};
use crate::bonus::{resolve_sets, resolve_skills, SetBonus};
use crate::item::{Item, ItemDecoder, ItemProperty};
use crate::reference::ReferenceData;
use crate::save::attributes::Attributes;
use crate::save::scanner::{find_backward, find_forward, marker_at};
use crate::save::skills::{read_skills, SkillRecord};
use crate::{
    CharacterClass, D2SaveError, FileVersion, Result, ATTRIBUTES_OFFSET, CHARACTER_MAGIC,
    HEADER_LAYOUT, MARKER_ATTRIBUTES, MARKER_GOLEM, MARKER_ITEMS, MARKER_MERCENARY,
    MARKER_QUESTS, MARKER_SKILLS, MARKER_WAYPOINTS, NEW_CHARACTER_LEN, QUESTS_OFFSET,
    SECTION_SCAN_WINDOW, SKILL_SLOTS, STAT_SCAN_WINDOW, WAYPOINTS_OFFSET,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const STATUS_HARDCORE: u8 = 0x04;
const STATUS_DIED: u8 = 0x08;
const STATUS_EXPANSION: u8 = 0x20;
const STATUS_LADDER: u8 = 0x40;

/// Quest words per difficulty
pub const QUEST_WORDS: usize = 48;
const QUEST_HEADER_LEN: usize = 6;

/// Waypoints per difficulty
pub const WAYPOINT_COUNT: usize = 39;
const WAYPOINT_HEADER_LEN: usize = 8;
const WAYPOINT_RECORD_LEN: usize = 24;
const WAYPOINT_BITS_OFFSET: usize = 2;

/// Bytes between the corpse count and the corpse item list
const CORPSE_HEADER_LEN: usize = 12;

/// Status byte flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Hardcore character
    pub hardcore: bool,
    /// Has died at least once
    pub died: bool,
    /// Lord of Destruction character
    pub expansion: bool,
    /// Ladder character
    pub ladder: bool,
}

impl From<u8> for Status {
    fn from(bits: u8) -> Self {
        Self {
            hardcore: bits & STATUS_HARDCORE != 0,
            died: bits & STATUS_DIED != 0,
            expansion: bits & STATUS_EXPANSION != 0,
            ladder: bits & STATUS_LADDER != 0,
        }
    }
}

/// Where the character was last, per difficulty
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProgress {
    /// The character was last played in this difficulty
    pub active: bool,
    /// Act, counted from 0
    pub act: u8,
}

impl From<u8> for DifficultyProgress {
    fn from(bits: u8) -> Self {
        Self {
            active: bits & 0x80 != 0,
            act: bits & 0x07,
        }
    }
}

/// Hired mercenary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mercenary {
    /// Currently dead
    pub dead: bool,
    /// Unique id; 0 when no mercenary was ever hired
    pub id: u32,
    /// Index into the mercenary name list
    pub name_id: u16,
    /// Mercenary type and difficulty
    pub kind: u16,
    /// Experience
    pub experience: u32,
}

/// Fixed-offset header fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterHeader {
    /// File version
    pub version: FileVersion,
    /// File size as recorded in the header
    pub file_size: u32,
    /// Checksum as recorded in the header
    pub checksum: u32,
    /// Active weapon set (0 or 1)
    pub active_weapon: u32,
    /// Status flags
    pub status: Status,
    /// Number of acts completed, across difficulties
    pub progression: u8,
    /// Character class
    pub class: CharacterClass,
    /// Character level shown in the menu
    pub level: u8,
    /// Last played, seconds since the Unix epoch
    pub last_played: u32,
    /// Normal, Nightmare, Hell
    pub difficulty: [DifficultyProgress; 3],
    /// Map seed
    pub map_id: u32,
    /// Hired mercenary, if any
    pub mercenary: Option<Mercenary>,
    /// Character name
    pub name: String,
}

/// Quest state words of one difficulty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestLog {
    /// One word per quest slot; bit 0 marks completion
    pub words: Vec<u16>,
}

/// The `Woo!` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quests {
    /// Normal, Nightmare, Hell
    pub difficulties: [QuestLog; 3],
}

impl Quests {
    fn read(data: &[u8]) -> Result<Self> {
        let mut quests = Self::default();
        let mut offset = QUESTS_OFFSET + QUEST_HEADER_LEN;
        for log in quests.difficulties.iter_mut() {
            for _ in 0..QUEST_WORDS {
                log.words.push(read_u16_le_at(data, offset)?);
                offset += 2;
            }
        }
        Ok(quests)
    }

    /// Whether quest slot `quest` of `difficulty` is complete
    pub fn is_complete(&self, difficulty: usize, quest: usize) -> bool {
        self.difficulties
            .get(difficulty)
            .and_then(|log| log.words.get(quest))
            .is_some_and(|word| word & 1 != 0)
    }
}

/// The `WS` section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoints {
    /// Activated waypoint bits of Normal, Nightmare, Hell
    pub difficulties: [u64; 3],
}

impl Waypoints {
    fn read(data: &[u8]) -> Result<Self> {
        let mut waypoints = Self::default();
        for (index, bits) in waypoints.difficulties.iter_mut().enumerate() {
            let offset = WAYPOINTS_OFFSET
                + WAYPOINT_HEADER_LEN
                + index * WAYPOINT_RECORD_LEN
                + WAYPOINT_BITS_OFFSET;
            let bytes = data
                .get(offset..offset + 5)
                .ok_or(D2SaveError::UnexpectedEof { offset })?;
            *bits = bytes
                .iter()
                .rev()
                .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
                & ((1u64 << WAYPOINT_COUNT) - 1);
        }
        Ok(waypoints)
    }

    /// Whether waypoint `index` is active in `difficulty`
    pub fn is_active(&self, difficulty: usize, index: usize) -> bool {
        index < WAYPOINT_COUNT
            && self
                .difficulties
                .get(difficulty)
                .is_some_and(|bits| bits & (1 << index) != 0)
    }

    /// Number of active waypoints in `difficulty`
    pub fn count(&self, difficulty: usize) -> u32 {
        self.difficulties
            .get(difficulty)
            .map_or(0, |bits| bits.count_ones())
    }
}

/// A decoded character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Header fields
    pub header: CharacterHeader,
    /// Attributes
    pub attributes: Attributes,
    /// Quest state (absent for a character never saved in game)
    pub quests: Option<Quests>,
    /// Waypoints (absent for a character never saved in game)
    pub waypoints: Option<Waypoints>,
    /// Class skills with their derived bonuses
    pub skills: Vec<SkillRecord>,
    /// Items carried and worn, set tiers resolved
    pub items: Vec<Item>,
    /// Items on the character's corpse
    pub corpse_items: Vec<Item>,
    /// Items worn by the mercenary
    pub mercenary_items: Vec<Item>,
    /// The item an iron golem was made from
    pub golem: Option<Item>,
    /// Active set bonuses
    pub set_bonuses: Vec<SetBonus>,
    /// Whether the stored checksum matches the data
    pub checksum_valid: bool,
}

impl Character {
    /// Whether any item carries an overflowed affix id
    pub fn has_affix_overflow(&self) -> bool {
        self.items
            .iter()
            .chain(&self.corpse_items)
            .chain(&self.mercenary_items)
            .chain(&self.golem)
            .any(Item::has_affix_overflow)
    }

    /// Every property in effect on the character: equipped items and set
    /// bonuses
    pub fn equipped_properties(&self) -> Vec<ItemProperty> {
        equipped_properties(&self.items, &self.set_bonuses)
    }
}

fn equipped_properties(items: &[Item], set_bonuses: &[SetBonus]) -> Vec<ItemProperty> {
    items
        .iter()
        .filter(|item| item.is_equipped())
        .flat_map(|item| item.properties.iter())
        .chain(set_bonuses.iter().flat_map(|bonus| bonus.properties.iter()))
        .cloned()
        .collect()
}

/// Decode the fixed header fields
///
/// Needs no reference data; fails with `MalformedHeader` on a bad magic,
/// an unsupported version, an unknown class or a truncated header.
pub fn read_header(data: &[u8]) -> Result<CharacterHeader> {
    if !data.starts_with(&CHARACTER_MAGIC) {
        return Err(D2SaveError::MalformedHeader(
            "not a character file (bad magic)".to_string(),
        ));
    }
    let truncated = |_| D2SaveError::MalformedHeader("truncated header".to_string());

    let version = FileVersion::from_u32(read_u32_le_at(data, 4).map_err(truncated)?)?;
    let layout = &HEADER_LAYOUT;
    let name_bytes = data
        .get(layout.name..layout.name + layout.name_len)
        .ok_or_else(|| D2SaveError::MalformedHeader("truncated header".to_string()))?;

    let class_id = read_u8_at(data, layout.class)?;
    let class = CharacterClass::from_u8(class_id).ok_or_else(|| {
        D2SaveError::MalformedHeader(format!("unknown character class {class_id}"))
    })?;

    let mercenary_id = read_u32_le_at(data, layout.mercenary_id)?;
    let mercenary = if mercenary_id != 0 {
        Some(Mercenary {
            dead: read_u16_le_at(data, layout.mercenary_dead)? != 0,
            id: mercenary_id,
            name_id: read_u16_le_at(data, layout.mercenary_name)?,
            kind: read_u16_le_at(data, layout.mercenary_type)?,
            experience: read_u32_le_at(data, layout.mercenary_experience)?,
        })
    } else {
        None
    };

    let name_len = name_bytes
        .iter()
        .position(|&byte| byte == 0)
        .unwrap_or(name_bytes.len());

    Ok(CharacterHeader {
        version,
        file_size: read_u32_le_at(data, layout.file_size)?,
        checksum: read_u32_le_at(data, layout.checksum)?,
        active_weapon: read_u32_le_at(data, layout.active_weapon)?,
        status: Status::from(read_u8_at(data, layout.status)?),
        progression: read_u8_at(data, layout.progression)?,
        class,
        level: read_u8_at(data, layout.level)?,
        last_played: read_u32_le_at(data, layout.last_played)?,
        difficulty: [
            DifficultyProgress::from(read_u8_at(data, layout.difficulty)?),
            DifficultyProgress::from(read_u8_at(data, layout.difficulty + 1)?),
            DifficultyProgress::from(read_u8_at(data, layout.difficulty + 2)?),
        ],
        map_id: read_u32_le_at(data, layout.map_id)?,
        mercenary,
        name: String::from_utf8_lossy(&name_bytes[..name_len]).into_owned(),
    })
}

/// File checksum: rotate left by one, then add each byte, with the checksum
/// field itself read as zero
pub fn compute_checksum(data: &[u8], checksum_offset: usize) -> u32 {
    let field = checksum_offset..checksum_offset + 4;
    data.iter().enumerate().fold(0u32, |sum, (index, &byte)| {
        let byte = if field.contains(&index) { 0 } else { byte };
        sum.rotate_left(1).wrapping_add(u32::from(byte))
    })
}

/// Decode a complete character file
pub fn decode_character(data: &[u8], tables: &dyn ReferenceData) -> Result<Character> {
    let header = read_header(data)?;
    let checksum_valid = compute_checksum(data, HEADER_LAYOUT.checksum) == header.checksum;
    if !checksum_valid {
        warn!("checksum mismatch in character {:?}", header.name);
    }

    if data.len() == NEW_CHARACTER_LEN {
        debug!("{:?} has not been saved in game yet", header.name);
        return Ok(Character {
            attributes: Attributes::starter(header.class),
            header,
            quests: None,
            waypoints: None,
            skills: Vec::new(),
            items: Vec::new(),
            corpse_items: Vec::new(),
            mercenary_items: Vec::new(),
            golem: None,
            set_bonuses: Vec::new(),
            checksum_valid,
        });
    }

    if !marker_at(data, MARKER_QUESTS, QUESTS_OFFSET) {
        return Err(D2SaveError::missing_marker(MARKER_QUESTS, QUESTS_OFFSET));
    }
    let quests = Quests::read(data)?;
    if !marker_at(data, MARKER_WAYPOINTS, WAYPOINTS_OFFSET) {
        return Err(D2SaveError::missing_marker(MARKER_WAYPOINTS, WAYPOINTS_OFFSET));
    }
    let waypoints = Waypoints::read(data)?;

    let attributes_at = find_forward(data, MARKER_ATTRIBUTES, ATTRIBUTES_OFFSET, STAT_SCAN_WINDOW)
        .ok_or_else(|| D2SaveError::missing_marker(MARKER_ATTRIBUTES, ATTRIBUTES_OFFSET))?;
    let mut reader = BitReader::at_byte(data, attributes_at + MARKER_ATTRIBUTES.len());
    let attributes = Attributes::read(&mut reader)?;
    reader.align_to_byte();
    debug!("attributes at {attributes_at:#x}, level {}", attributes.level);

    let skills_search = reader.byte_position();
    let skills_at = find_forward(data, MARKER_SKILLS, skills_search, SECTION_SCAN_WINDOW)
        .ok_or_else(|| D2SaveError::missing_marker(MARKER_SKILLS, skills_search))?;
    let skills = read_skills(data, skills_at + MARKER_SKILLS.len(), header.class)?;

    let decoder = ItemDecoder::new(tables);
    let items_search = skills_at + MARKER_SKILLS.len() + SKILL_SLOTS;
    let (items, items_end) =
        read_item_list(data, &decoder, items_search, SECTION_SCAN_WINDOW)?;
    debug!("{} items before {items_end:#x}", items.len());

    let corpse_items = match find_forward(data, MARKER_ITEMS, items_end, SECTION_SCAN_WINDOW) {
        Some(corpse_at) if read_u16_le_at(data, corpse_at + MARKER_ITEMS.len())? == 1 => {
            let list_at = corpse_at + MARKER_ITEMS.len() + 2 + CORPSE_HEADER_LEN;
            read_item_list(data, &decoder, list_at, SECTION_SCAN_WINDOW)?.0
        }
        _ => Vec::new(),
    };

    let (mercenary_items, golem) = if header.status.expansion {
        read_expansion_sections(data, &decoder, header.mercenary.is_some())?
    } else {
        (Vec::new(), None)
    };

    let resolved = resolve_sets(&items, tables)?;
    let equipped = equipped_properties(&resolved.items, &resolved.set_bonuses);
    let skills = resolve_skills(&skills, &equipped, tables)?;

    Ok(Character {
        header,
        attributes,
        quests: Some(quests),
        waypoints: Some(waypoints),
        skills,
        items: resolved.items,
        corpse_items,
        mercenary_items,
        golem,
        set_bonuses: resolved.set_bonuses,
        checksum_valid,
    })
}

/// `JM`, item count, items; the marker is searched in `from..from + window`
///
/// Returns the items and the byte offset after the last one.
pub(crate) fn read_item_list(
    data: &[u8],
    decoder: &ItemDecoder<'_>,
    from: usize,
    window: usize,
) -> Result<(Vec<Item>, usize)> {
    let list_at = find_forward(data, MARKER_ITEMS, from, window)
        .ok_or_else(|| D2SaveError::missing_marker(MARKER_ITEMS, from))?;
    let count = read_u16_le_at(data, list_at + MARKER_ITEMS.len())?;

    let mut reader = BitReader::at_byte(data, list_at + MARKER_ITEMS.len() + 2);
    let items = decoder.decode_items(&mut reader, usize::from(count))?;
    if reader.is_exhausted() {
        return Err(D2SaveError::UnexpectedEof {
            offset: data.len(),
        });
    }
    Ok((items, reader.byte_position()))
}

/// Mercenary items (`jf`) and the iron golem (`kf`), both optional
fn read_expansion_sections(
    data: &[u8],
    decoder: &ItemDecoder<'_>,
    hired: bool,
) -> Result<(Vec<Item>, Option<Item>)> {
    let golem_at = find_backward(data, MARKER_GOLEM, data.len());
    let golem = match golem_at {
        Some(at) if read_u8_at(data, at + MARKER_GOLEM.len())? == 1 => {
            let mut reader = BitReader::at_byte(data, at + MARKER_GOLEM.len() + 1);
            Some(decoder.decode_item(&mut reader)?)
        }
        _ => None,
    };

    let mercenary_at = find_backward(data, MARKER_MERCENARY, golem_at.unwrap_or(data.len()));
    let mercenary_items = match mercenary_at {
        Some(at) if hired => {
            read_item_list(data, decoder, at + MARKER_MERCENARY.len(), SECTION_SCAN_WINDOW)?.0
        }
        _ => Vec::new(),
    };
    debug!(
        "mercenary section {mercenary_at:?} with {} items, golem section {golem_at:?}",
        mercenary_items.len()
    );

    Ok((mercenary_items, golem))
}
