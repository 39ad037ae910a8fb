//! Synthetic buffers and reference tables for unit tests

use crate::reference::{ReferenceData, TableSet};
use crate::save::character::compute_checksum;
use crate::tables::{ATTRIBUTE_DEFS, ITEM_CODE_HUFFMAN};
use crate::{
    CHARACTER_MAGIC, MARKER_ATTRIBUTES, MARKER_GOLEM, MARKER_ITEMS, MARKER_MERCENARY,
    MARKER_QUESTS, MARKER_SKILLS, MARKER_WAYPOINTS, NEW_CHARACTER_LEN, QUESTS_OFFSET,
    SKILL_SLOTS, WAYPOINTS_OFFSET,
};

pub(crate) const F_IDENTIFIED: u32 = 1 << 4;
pub(crate) const F_SOCKETED: u32 = 1 << 11;
pub(crate) const F_EAR: u32 = 1 << 16;
pub(crate) const F_SIMPLE: u32 = 1 << 21;
pub(crate) const F_ETHEREAL: u32 = 1 << 22;
pub(crate) const F_PERSONALIZED: u32 = 1 << 24;
pub(crate) const F_RUNEWORD: u32 = 1 << 26;

/// LSB-first bit writer, the mirror image of `BitReader`
#[derive(Debug, Default, Clone)]
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    len: usize,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bits(mut self, value: u32, n: u32) -> Self {
        for i in 0..n {
            if self.len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 != 0 {
                self.bytes[self.len / 8] |= 1 << (self.len % 8);
            }
            self.len += 1;
        }
        self
    }

    pub(crate) fn bit(self, set: bool) -> Self {
        self.bits(u32::from(set), 1)
    }

    /// Huffman-encode an item code followed by the space terminator
    pub(crate) fn code(mut self, code: &str) -> Self {
        for symbol in code.chars().chain(std::iter::once(' ')) {
            let bits = ITEM_CODE_HUFFMAN
                .iter()
                .find(|(c, _)| *c == symbol)
                .map(|(_, bits)| *bits)
                .unwrap();
            for bit in bits.chars() {
                self = self.bit(bit == '1');
            }
        }
        self
    }

    /// Fixed-width characters followed by a zero terminator
    pub(crate) fn text(mut self, text: &str, width: u32) -> Self {
        for byte in text.bytes() {
            self = self.bits(u32::from(byte), width);
        }
        self.bits(0, width)
    }

    pub(crate) fn align(self) -> Self {
        let pad = (8 - self.len % 8) % 8;
        self.bits(0, pad as u32)
    }

    pub(crate) fn bytes(mut self, data: &[u8]) -> Self {
        for &byte in data {
            self = self.bits(u32::from(byte), 8);
        }
        self
    }

    /// Item header: flags, version, location, slot, x, y, container
    pub(crate) fn item_header(self, flags: u32, location: u32, slot: u32, container: u32) -> Self {
        self.bits(flags, 32)
            .bits(5, 3)
            .bits(location, 3)
            .bits(slot, 4)
            .bits(0, 4)
            .bits(0, 4)
            .bits(container, 3)
    }

    /// Extended part 1 up to and including the quality field, with no
    /// picture and no class-specific data
    pub(crate) fn extended_head(self, filled_sockets: u32, item_level: u32, quality: u32) -> Self {
        self.bits(filled_sockets, 3)
            .bits(0x1234_5678, 32)
            .bits(item_level, 7)
            .bits(quality, 4)
            .bit(false)
            .bit(false)
    }

    pub(crate) fn terminator(self) -> Self {
        self.bits(511, 9)
    }

    pub(crate) fn bit_len(&self) -> usize {
        self.len
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A complete simple item stored in the inventory, without a GUID
pub(crate) fn simple_item(code: &str) -> BitWriter {
    let tables = fixture_tables();
    let writer = BitWriter::new()
        .item_header(F_IDENTIFIED | F_SIMPLE, 0, 0, 1)
        .code(code)
        .bit(false);
    let quirk_bits = tables.misc(code).is_some_and(|base| {
        !(base.is_rune() || base.is_gem() || base.is_jewelry() || base.is_charm())
            && code != "isc"
    });
    let writer = if quirk_bits { writer.bits(0, 3) } else { writer };
    writer.align()
}

/// Reference tables shared with the integration tests
const FIXTURE_TABLES_JSON: &str = include_str!("../tests/data/tables.json");

/// Small reference data set covering every decoder path
pub(crate) fn fixture_tables() -> TableSet {
    TableSet::from_json(FIXTURE_TABLES_JSON).unwrap()
}

/// Builder for synthetic character files
#[derive(Debug, Clone)]
pub(crate) struct CharacterFile {
    class: u8,
    status: u8,
    mercenary: u32,
    new_character: bool,
    attributes: Vec<(u16, u32)>,
    skills: [u8; SKILL_SLOTS],
    items: Vec<Vec<u8>>,
    corpse: Vec<Vec<u8>>,
    mercenary_items: Vec<Vec<u8>>,
    golem: Option<Vec<u8>>,
}

impl CharacterFile {
    pub(crate) fn new(class: u8) -> Self {
        Self {
            class,
            status: 0,
            mercenary: 0,
            new_character: false,
            attributes: vec![(12, 1)],
            skills: [0; SKILL_SLOTS],
            items: Vec::new(),
            corpse: Vec::new(),
            mercenary_items: Vec::new(),
            golem: None,
        }
    }

    /// Stop after the fixed sections, like a file written at creation
    pub(crate) fn new_character(mut self) -> Self {
        self.new_character = true;
        self
    }

    pub(crate) fn status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn mercenary(mut self, id: u32) -> Self {
        self.mercenary = id;
        self
    }

    pub(crate) fn attribute(mut self, id: u16, value: u32) -> Self {
        self.attributes.retain(|(existing, _)| *existing != id);
        self.attributes.push((id, value));
        self
    }

    pub(crate) fn skill(mut self, slot: usize, level: u8) -> Self {
        self.skills[slot] = level;
        self
    }

    pub(crate) fn item(mut self, item: Vec<u8>) -> Self {
        self.items.push(item);
        self
    }

    pub(crate) fn corpse(mut self, items: Vec<Vec<u8>>) -> Self {
        self.corpse = items;
        self
    }

    pub(crate) fn mercenary_items(mut self, items: Vec<Vec<u8>>) -> Self {
        self.mercenary_items = items;
        self
    }

    pub(crate) fn golem(mut self, item: Vec<u8>) -> Self {
        self.golem = Some(item);
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut data = vec![0u8; NEW_CHARACTER_LEN];
        data[0..4].copy_from_slice(&CHARACTER_MAGIC);
        data[4..8].copy_from_slice(&0x62u32.to_le_bytes());
        data[0x24] = self.status;
        data[0x28] = self.class;
        data[0x2B] = 1;
        data[0xA8] = 0x80 | 2;
        data[0xB3..0xB7].copy_from_slice(&self.mercenary.to_le_bytes());
        data[0x12B..0x12B + 6].copy_from_slice(b"Tester");

        data[QUESTS_OFFSET..QUESTS_OFFSET + 4].copy_from_slice(MARKER_QUESTS);
        let quest_word = QUESTS_OFFSET + 6 + 2;
        data[quest_word] = 1;
        data[WAYPOINTS_OFFSET..WAYPOINTS_OFFSET + 2].copy_from_slice(MARKER_WAYPOINTS);
        data[WAYPOINTS_OFFSET + 8 + 2] = 0b11;

        if !self.new_character {
            data.extend_from_slice(MARKER_ATTRIBUTES);
            let mut writer = BitWriter::new();
            for (id, value) in &self.attributes {
                let def = ATTRIBUTE_DEFS[usize::from(*id)];
                writer = writer
                    .bits(u32::from(*id), 9)
                    .bits(value * def.coefficient, def.bits);
            }
            data.extend(writer.bits(0x1FF, 9).align().into_bytes());

            data.extend_from_slice(MARKER_SKILLS);
            data.extend_from_slice(&self.skills);

            push_item_list(&mut data, &self.items);

            data.extend_from_slice(MARKER_ITEMS);
            if self.corpse.is_empty() {
                data.extend_from_slice(&0u16.to_le_bytes());
            } else {
                data.extend_from_slice(&1u16.to_le_bytes());
                data.extend_from_slice(&[0u8; 12]);
                push_item_list(&mut data, &self.corpse);
            }

            if self.status & 0x20 != 0 {
                data.extend_from_slice(MARKER_MERCENARY);
                if self.mercenary != 0 {
                    push_item_list(&mut data, &self.mercenary_items);
                }
                data.extend_from_slice(MARKER_GOLEM);
                match &self.golem {
                    Some(item) => {
                        data.push(1);
                        data.extend_from_slice(item);
                    }
                    None => data.push(0),
                }
            }
        }

        let len = data.len() as u32;
        data[0x08..0x0C].copy_from_slice(&len.to_le_bytes());
        let checksum = compute_checksum(&data, 0x0C);
        data[0x0C..0x10].copy_from_slice(&checksum.to_le_bytes());
        data
    }
}

/// `JM`, count, items
pub(crate) fn push_item_list(data: &mut Vec<u8>, items: &[Vec<u8>]) {
    data.extend_from_slice(MARKER_ITEMS);
    data.extend_from_slice(&(items.len() as u16).to_le_bytes());
    for item in items {
        data.extend_from_slice(item);
    }
}
