//! Shared stash files (`.d2i`)
//!
//! A stash file is a run of tabs, each opening with `55 AA 55 AA` and a
//! 20-byte header that records the tab's total length. Newer files pad
//! that header with zeros up to 64 bytes. Most tabs hold an
//! item list; when the file has seven tabs the last one holds the
//! chronicle of rare monster kills instead.

use crate::bitstream::read_u32_le_at;
use crate::item::{Item, ItemDecoder};
use crate::reference::ReferenceData;
use crate::save::character::read_item_list;
use crate::save::scanner::find_next;
use crate::{
    D2SaveError, Result, STASH_TAB_HEADER_LEN, STASH_TAB_MAGIC, STASH_TAB_PADDED_HEADER_LEN,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Tab count of files with item tabs only
pub const ITEM_TAB_LAYOUT: usize = 3;
/// Tab count of files whose last tab is the chronicle
pub const CHRONICLE_TAB_LAYOUT: usize = 7;

const VERSION_OFFSET: usize = 8;
const GOLD_OFFSET: usize = 12;
const LENGTH_OFFSET: usize = 16;
const CHRONICLE_RECORD_LEN: usize = 8;

/// One item tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashTab {
    /// Tab format version
    pub version: u32,
    /// Gold stored in the tab
    pub gold: u32,
    /// Tab length in bytes, header included
    pub length: u32,
    /// Items in the tab
    pub items: Vec<Item>,
}

/// One chronicle record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronicleEntry {
    /// Monster id
    pub monster_id: u32,
    /// Kill time, seconds since the Unix epoch
    pub timestamp: u32,
}

/// A decoded shared stash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stash {
    /// Item tabs in file order
    pub tabs: Vec<StashTab>,
    /// Chronicle records, when the file has a chronicle tab
    pub chronicle: Option<Vec<ChronicleEntry>>,
}

impl Stash {
    /// Gold across every tab
    pub fn total_gold(&self) -> u64 {
        self.tabs.iter().map(|tab| u64::from(tab.gold)).sum()
    }

    /// Items across every tab
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.tabs.iter().flat_map(|tab| tab.items.iter())
    }
}

/// Byte range of one tab
#[derive(Debug, Clone, Copy)]
struct TabBounds {
    start: usize,
    end: usize,
}

impl TabBounds {
    /// Bytes after the fixed header fields
    fn body(&self) -> (usize, usize) {
        let from = self.start + STASH_TAB_HEADER_LEN;
        (from, self.end - from)
    }

    /// Start of the payload, past the zero padding when the header has it
    fn payload_start(&self, data: &[u8]) -> usize {
        let padded = self.start + STASH_TAB_PADDED_HEADER_LEN;
        let padding = &data[self.start + STASH_TAB_HEADER_LEN..padded.min(self.end)];
        if padded <= self.end && padding.iter().all(|&byte| byte == 0) {
            padded
        } else {
            self.start + STASH_TAB_HEADER_LEN
        }
    }
}

/// Locate every tab marker, hopping over each tab's recorded length
fn find_tabs(data: &[u8]) -> Result<Vec<TabBounds>> {
    let mut tabs = Vec::new();
    let mut from = 0;
    while let Some(start) = find_next(data, &STASH_TAB_MAGIC, from) {
        let length = read_u32_le_at(data, start + LENGTH_OFFSET)? as usize;
        let end = start.saturating_add(length);
        if length < STASH_TAB_HEADER_LEN || end > data.len() {
            return Err(D2SaveError::MalformedHeader(format!(
                "stash tab at {start:#x} has invalid length {length}"
            )));
        }
        tabs.push(TabBounds { start, end });
        from = end;
    }
    Ok(tabs)
}

/// Decode a shared stash file
pub fn decode_stash(data: &[u8], tables: &dyn ReferenceData) -> Result<Stash> {
    let bounds = find_tabs(data)?;
    let item_tabs = match bounds.len() {
        ITEM_TAB_LAYOUT => ITEM_TAB_LAYOUT,
        CHRONICLE_TAB_LAYOUT => CHRONICLE_TAB_LAYOUT - 1,
        count => {
            return Err(D2SaveError::MalformedHeader(format!(
                "expected {ITEM_TAB_LAYOUT} or {CHRONICLE_TAB_LAYOUT} stash tabs, found {count}"
            )))
        }
    };
    debug!("stash with {} tabs", bounds.len());

    let decoder = ItemDecoder::new(tables);
    let mut tabs = Vec::with_capacity(item_tabs);
    for tab in &bounds[..item_tabs] {
        let (from, window) = tab.body();
        let (items, end) = read_item_list(data, &decoder, from, window)?;
        if end > tab.end {
            return Err(D2SaveError::UnexpectedEof { offset: tab.end });
        }
        tabs.push(StashTab {
            version: read_u32_le_at(data, tab.start + VERSION_OFFSET)?,
            gold: read_u32_le_at(data, tab.start + GOLD_OFFSET)?,
            length: (tab.end - tab.start) as u32,
            items,
        });
    }

    let chronicle = match bounds.get(item_tabs) {
        Some(tab) => Some(read_chronicle(data, *tab)?),
        None => None,
    };

    Ok(Stash { tabs, chronicle })
}

fn read_chronicle(data: &[u8], tab: TabBounds) -> Result<Vec<ChronicleEntry>> {
    let mut entries = Vec::new();
    let mut offset = tab.payload_start(data);
    while offset + CHRONICLE_RECORD_LEN <= tab.end {
        entries.push(ChronicleEntry {
            monster_id: read_u32_le_at(data, offset)?,
            timestamp: read_u32_le_at(data, offset + 4)?,
        });
        offset += CHRONICLE_RECORD_LEN;
    }
    Ok(entries)
}
