//! Shared fixtures for the integration tests
//!
//! Everything here goes through the public API: the bit writer mirrors
//! `BitReader`, and the tables are loaded from `tests/data/tables.json`.

#![allow(dead_code)]

use d2save::item::property::STAT_TERMINATOR;
use d2save::reference::TableSet;
use d2save::save::compute_checksum;
use d2save::tables::{ATTRIBUTE_DEFS, ATTRIBUTE_TERMINATOR, ITEM_CODE_HUFFMAN};
use d2save::{
    CharacterClass, CHARACTER_MAGIC, MARKER_ATTRIBUTES, MARKER_GOLEM, MARKER_ITEMS,
    MARKER_MERCENARY, MARKER_QUESTS, MARKER_SKILLS, MARKER_WAYPOINTS, NEW_CHARACTER_LEN,
    QUESTS_OFFSET, SKILL_SLOTS, STASH_TAB_HEADER_LEN, STASH_TAB_MAGIC, WAYPOINTS_OFFSET,
};

pub const IDENTIFIED: u32 = 1 << 4;
pub const SIMPLE: u32 = 1 << 21;

pub const STORED: u32 = 0;
pub const EQUIPPED: u32 = 1;

pub const SLOT_HEAD: u32 = 1;
pub const SLOT_TORSO: u32 = 3;
pub const SLOT_LEFT_HAND: u32 = 5;
pub const SLOT_SWAP_LEFT: u32 = 12;

pub const STATUS_EXPANSION: u8 = 0x20;

/// LSB-first bit writer
#[derive(Debug, Default)]
pub struct Bits {
    bytes: Vec<u8>,
    len: usize,
}

impl Bits {
    pub fn push(&mut self, value: u32, n: u32) -> &mut Self {
        for i in 0..n {
            if self.len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                self.bytes[self.len / 8] |= 1 << (self.len % 8);
            }
            self.len += 1;
        }
        self
    }

    pub fn code(&mut self, code: &str) -> &mut Self {
        for symbol in code.chars().chain(Some(' ')) {
            let (_, pattern) = ITEM_CODE_HUFFMAN
                .iter()
                .find(|(c, _)| *c == symbol)
                .expect("symbol in Huffman table");
            for bit in pattern.chars() {
                self.push(u32::from(bit == '1'), 1);
            }
        }
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        let pad = (8 - self.len % 8) % 8;
        self.push(0, pad as u32);
        std::mem::take(&mut self.bytes)
    }
}

/// Reference tables shared with the unit tests
pub fn tables() -> TableSet {
    TableSet::from_json(include_str!("../data/tables.json")).expect("fixture tables parse")
}

/// A potion in the inventory
pub fn potion() -> Vec<u8> {
    let mut bits = Bits::default();
    item_header(&mut bits, IDENTIFIED | SIMPLE, STORED, 0);
    bits.code("mp1").push(0, 1).push(0, 3);
    bits.finish()
}

fn item_header(bits: &mut Bits, flags: u32, location: u32, slot: u32) {
    let container = if location == STORED { 1 } else { 0 };
    bits.push(flags, 32)
        .push(5, 3)
        .push(location, 3)
        .push(slot, 4)
        .push(0, 4)
        .push(0, 4)
        .push(container, 3);
}

fn extended_head(bits: &mut Bits, item_level: u32, quality: u32) {
    bits.push(0, 3)
        .push(0xCAFE_F00D, 32)
        .push(item_level, 7)
        .push(quality, 4)
        .push(0, 1)
        .push(0, 1);
}

/// A normal-quality armor piece with one `(stat, raw value)` property
pub fn armor(code: &str, location: u32, slot: u32, property: Option<(u16, u32)>) -> Vec<u8> {
    let mut bits = Bits::default();
    item_header(&mut bits, IDENTIFIED, location, slot);
    bits.code(code);
    extended_head(&mut bits, 5, 2);
    bits.push(0, 1).push(10 + 10, 11).push(12, 8).push(12, 9);
    if let Some((stat_id, raw)) = property {
        let width = tables().stats[&stat_id].save_bits;
        bits.push(u32::from(stat_id), 9).push(raw, width);
    }
    bits.push(u32::from(STAT_TERMINATOR), 9);
    bits.finish()
}

/// A magic helm granting `+levels` to the Sorceress skills
pub fn magic_class_helm(location: u32, slot: u32, levels: u32) -> Vec<u8> {
    let mut bits = Bits::default();
    item_header(&mut bits, IDENTIFIED, location, slot);
    bits.code("skp");
    extended_head(&mut bits, 9, 4);
    bits.push(5, 11).push(0, 11);
    bits.push(0, 1).push(10 + 3, 11).push(12, 8).push(12, 9);
    bits.push(83, 9)
        .push(CharacterClass::Sorceress as u32, 3)
        .push(levels, 3)
        .push(u32::from(STAT_TERMINATOR), 9);
    bits.finish()
}

/// A worn set item whose first tier bonus (two pieces worn) adds +4 strength
pub fn set_piece(code: &str, set_id: u32, slot: u32) -> Vec<u8> {
    let mut bits = Bits::default();
    item_header(&mut bits, IDENTIFIED, EQUIPPED, slot);
    bits.code(code);
    extended_head(&mut bits, 12, 5);
    bits.push(set_id, 12);
    bits.push(0, 1).push(10 + 15, 11).push(20, 8).push(20, 9);
    bits.push(0b00001, 5);
    bits.push(u32::from(STAT_TERMINATOR), 9);
    bits.push(0, 9).push(32 + 4, 8);
    bits.push(u32::from(STAT_TERMINATOR), 9);
    bits.finish()
}

/// `JM`, count, item records
pub fn item_list(items: &[Vec<u8>]) -> Vec<u8> {
    let mut data = MARKER_ITEMS.to_vec();
    data.extend_from_slice(&(items.len() as u16).to_le_bytes());
    for item in items {
        data.extend_from_slice(item);
    }
    data
}

/// Inputs of a synthetic character file
#[derive(Debug, Clone)]
pub struct CharacterSpec {
    pub class: CharacterClass,
    pub name: &'static str,
    pub status: u8,
    pub mercenary_id: u32,
    pub attributes: Vec<(u16, u32)>,
    pub skills: [u8; SKILL_SLOTS],
    pub items: Vec<Vec<u8>>,
    pub mercenary_items: Vec<Vec<u8>>,
}

impl CharacterSpec {
    pub fn new(class: CharacterClass) -> Self {
        Self {
            class,
            name: "Fixture",
            status: 0,
            mercenary_id: 0,
            attributes: vec![(0, 25), (12, 8), (13, 6000), (14, 250)],
            skills: [0; SKILL_SLOTS],
            items: Vec::new(),
            mercenary_items: Vec::new(),
        }
    }
}

/// Fixed sections only, as written when a character is created
pub fn header_only(class: CharacterClass, name: &str) -> Vec<u8> {
    let mut data = vec![0u8; NEW_CHARACTER_LEN];
    data[0..4].copy_from_slice(&CHARACTER_MAGIC);
    data[4..8].copy_from_slice(&0x62u32.to_le_bytes());
    data[0x28] = class as u8;
    data[0x2B] = 1;
    data[0x12B..0x12B + name.len()].copy_from_slice(name.as_bytes());
    data[QUESTS_OFFSET..QUESTS_OFFSET + 4].copy_from_slice(MARKER_QUESTS);
    data[WAYPOINTS_OFFSET..WAYPOINTS_OFFSET + 2].copy_from_slice(MARKER_WAYPOINTS);
    seal(&mut data);
    data
}

/// A complete character file
pub fn character(spec: &CharacterSpec) -> Vec<u8> {
    let mut data = header_only(spec.class, spec.name);
    data[0x24] = spec.status;
    data[0x2B] = 8;
    data[0xB3..0xB7].copy_from_slice(&spec.mercenary_id.to_le_bytes());

    // Den of Evil done in Normal, first three waypoints
    data[QUESTS_OFFSET + 8] = 0x01;
    data[WAYPOINTS_OFFSET + 10] = 0b111;

    data.extend_from_slice(MARKER_ATTRIBUTES);
    let mut bits = Bits::default();
    for &(id, value) in &spec.attributes {
        let def = ATTRIBUTE_DEFS[usize::from(id)];
        bits.push(u32::from(id), 9).push(value * def.coefficient, def.bits);
    }
    bits.push(u32::from(ATTRIBUTE_TERMINATOR), 9);
    data.extend(bits.finish());

    data.extend_from_slice(MARKER_SKILLS);
    data.extend_from_slice(&spec.skills);
    data.extend(item_list(&spec.items));
    data.extend(item_list(&[]));

    if spec.status & STATUS_EXPANSION != 0 {
        data.extend_from_slice(MARKER_MERCENARY);
        if spec.mercenary_id != 0 {
            data.extend(item_list(&spec.mercenary_items));
        }
        data.extend_from_slice(MARKER_GOLEM);
        data.push(0);
    }

    seal(&mut data);
    data
}

/// Write the file size and checksum fields
pub fn seal(data: &mut [u8]) {
    let len = data.len() as u32;
    data[0x08..0x0C].copy_from_slice(&len.to_le_bytes());
    let checksum = compute_checksum(data, 0x0C);
    data[0x0C..0x10].copy_from_slice(&checksum.to_le_bytes());
}

/// One stash tab with a 20-byte header holding the given payload
pub fn stash_tab(gold: u32, payload: &[u8]) -> Vec<u8> {
    stash_tab_with_header(STASH_TAB_HEADER_LEN, gold, payload)
}

/// One stash tab whose header is zero-padded to `header_len` bytes
pub fn stash_tab_with_header(header_len: usize, gold: u32, payload: &[u8]) -> Vec<u8> {
    let mut tab = vec![0u8; header_len];
    tab[0..4].copy_from_slice(&STASH_TAB_MAGIC);
    tab[8..12].copy_from_slice(&0x62u32.to_le_bytes());
    tab[12..16].copy_from_slice(&gold.to_le_bytes());
    let length = (header_len + payload.len()) as u32;
    tab[16..20].copy_from_slice(&length.to_le_bytes());
    tab.extend_from_slice(payload);
    tab
}
