//! Item record decoder
//!
//! Decoding runs in the order the fields are stored:
//!
//! 1. header: flags, version, location, slot, position, container
//! 2. ear data, or the Huffman-coded base code
//! 3. extended part 1 (non-simple items): sockets, fingerprint, level,
//!    quality and its ids, runeword and personalization data
//! 4. the GUID block
//! 5. extended part 2 (non-simple items): defense, durability, quantity,
//!    socket count, set-tier flags, property lists
//! 6. byte alignment, then the socketed children
//!
//! Names and requirements are assembled along the way and settled once the
//! children are known.

use crate::bitstream::BitReader;
use crate::huffman::decode_item_code;
use crate::item::property::{
    read_properties, sort_properties, ItemProperty, FLAG_JEWEL, FLAG_SET_TIER,
    FLAG_SOCKET_HELM, FLAG_SOCKET_SHIELD, FLAG_SOCKET_WEAPON, STAT_UNDEAD_DAMAGE,
};
use crate::item::quality::{inferior_prefix, Quality, QualityKind, RareAffixes};
use crate::item::{
    BaseCategory, Container, Durability, Ear, EquipSlot, Extended, Item, ItemFlags, Location,
    Requirements,
};
use crate::reference::{BaseItem, PropertyTemplate, ReferenceData};
use crate::{AffixTable, CharacterClass, D2SaveError, Result, MAX_SOCKET_DEPTH};
use log::{trace, warn};
use std::fmt;

/// Reserved affix id written by tampered files
const AFFIX_OVERFLOW: u16 = 2047;

/// Bias subtracted from the stored armor defense
const DEFENSE_BIAS: i32 = 10;

/// Requirement reduction of ethereal items
const ETHEREAL_REDUCTION: i32 = 10;

/// Implicit bonus of blunt weapons against undead
const BLUNT_UNDEAD_BONUS: i32 = 50;

/// Longest owner name the game writes, terminator included
const MAX_NAME_LEN: usize = 16;

/// Bases that store a tome spell id in normal quality
const TOME_CODES: [&str; 2] = ["tbk", "ibk"];

/// Quest items that skip an extra byte when they end on a boundary
const BOUNDARY_SKIP_CODES: [&str; 2] = ["tr1", "ass"];

/// What affixes and quality ids add to an item
#[derive(Debug, Default)]
struct AffixEffects {
    req_level: u16,
    surcharge: u16,
    class: Option<CharacterClass>,
    overflow: bool,
}

/// Extended part 1
#[derive(Debug)]
struct ExtendedHead {
    filled_sockets: u8,
    fingerprint: u32,
    item_level: u8,
    quality: Quality,
    name: String,
    picture_id: Option<u8>,
    class_specific: Option<u16>,
    personalized_name: Option<String>,
}

/// Decodes item records against a set of reference tables
pub struct ItemDecoder<'t> {
    tables: &'t dyn ReferenceData,
}

impl fmt::Debug for ItemDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemDecoder").finish_non_exhaustive()
    }
}

impl<'t> ItemDecoder<'t> {
    /// Create a decoder borrowing `tables`
    pub fn new(tables: &'t dyn ReferenceData) -> Self {
        Self { tables }
    }

    /// Decode `count` consecutive items
    ///
    /// The count excludes socketed children; each item pulls its own.
    pub fn decode_items(&self, reader: &mut BitReader<'_>, count: usize) -> Result<Vec<Item>> {
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode_item(reader)?);
        }
        Ok(items)
    }

    /// Decode one item and its socketed children
    ///
    /// The reader must be at the start of the record; on success it is left
    /// byte-aligned after the last child.
    pub fn decode_item(&self, reader: &mut BitReader<'_>) -> Result<Item> {
        self.decode_nested(reader, 0)
    }

    fn decode_nested(&self, reader: &mut BitReader<'_>, depth: usize) -> Result<Item> {
        if depth > MAX_SOCKET_DEPTH {
            return Err(D2SaveError::SocketDepthExceeded { depth });
        }

        let start = reader.byte_position();
        let mut flags = ItemFlags::from_bits(reader.read_uint(32));
        let version = reader.read_uint(3) as u8;
        let location = Location::from(reader.read_uint(3) as u8);
        let slot = EquipSlot::from(reader.read_uint(4) as u8);
        let x = reader.read_uint(4) as u8;
        let y = reader.read_uint(4) as u8;
        let container = Container::from(reader.read_uint(3) as u8);

        if flags.ear {
            let class = CharacterClass::from_u8(reader.read_uint(3) as u8);
            let level = reader.read_uint(7) as u8;
            let owner = read_name(reader, 7);
            reader.align_to_byte();
            trace!("ear of {owner:?} at byte {start:#x}");
            return Ok(Item {
                flags,
                version,
                location,
                slot,
                x,
                y,
                container,
                code: String::new(),
                name: format!("{owner}'s Ear"),
                category: None,
                item_type: String::new(),
                requirements: Requirements::default(),
                class_restriction: None,
                ear: Some(Ear {
                    class,
                    level,
                    owner,
                }),
                extended: None,
                quantity: None,
                guid: None,
                properties: Vec::new(),
                socketed: Vec::new(),
                affix_overflow: false,
            });
        }

        let code = decode_item_code(reader)?;
        let (category, base) = self.resolve_base(&code)?;
        if category == BaseCategory::Weapon {
            flags.two_handed = base.two_handed;
            flags.thrown = base.thrown;
        }

        let mut effects = AffixEffects::default();
        let head = if flags.simple {
            None
        } else {
            Some(self.read_extended_head(reader, &flags, base, &code, &mut effects)?)
        };

        let guid_present = reader.read_bit();
        let guid = if carries_guid(category, base) {
            guid_present.then(|| {
                [
                    reader.read_uint(32),
                    reader.read_uint(32),
                    reader.read_uint(32),
                    reader.read_uint(32),
                ]
            })
        } else {
            if code != "isc" {
                reader.skip(3);
            }
            None
        };

        let mut properties = Vec::new();
        let mut quantity = None;
        let mut extended = None;
        match head {
            None => {
                properties = self.socketable_properties(&code)?;
                finish_record(reader, &code);
            }
            Some(head) => {
                let mut defense = None;
                let mut durability = None;
                match category {
                    BaseCategory::Armor => {
                        defense = Some(reader.read_uint(11) as i32 - DEFENSE_BIAS);
                        durability = read_durability(reader, base);
                    }
                    BaseCategory::Weapon => {
                        durability = read_durability(reader, base);
                        if base.stackable {
                            quantity = Some(reader.read_uint(9) as u16);
                        }
                        if base.blunt {
                            properties.push(self.undead_bonus()?);
                        }
                    }
                    BaseCategory::Misc => {
                        if base.stackable {
                            quantity = Some(reader.read_uint(9) as u16);
                        }
                    }
                }

                let total_sockets = if flags.socketed {
                    reader.read_uint(4) as u8
                } else {
                    0
                };

                let mut set_tiers = [false; 5];
                if head.quality.kind() == QualityKind::Set {
                    for tier in set_tiers.iter_mut() {
                        *tier = reader.read_bit();
                    }
                }

                let own_flag = if base.is_jewel() { FLAG_JEWEL } else { 0 };
                properties.extend(read_properties(reader, self.tables, own_flag)?);
                for (tier, _) in set_tiers.iter().enumerate().filter(|(_, present)| **present) {
                    let flag = FLAG_SET_TIER + tier as u8;
                    properties.extend(read_properties(reader, self.tables, flag)?);
                }
                if flags.runeword {
                    properties.extend(read_properties(reader, self.tables, 0)?);
                }
                finish_record(reader, &code);

                extended = Some((head, total_sockets, defense, durability, set_tiers));
            }
        }

        let mut requirements = Requirements {
            level: base
                .req_level
                .max(effects.req_level)
                .saturating_add(effects.surcharge),
            strength: base.req_str,
            dexterity: base.req_dex,
        };

        let filled_sockets = extended
            .as_ref()
            .map_or(0, |(head, ..)| head.filled_sockets);
        let mut socketed = Vec::with_capacity(usize::from(filled_sockets));
        for _ in 0..filled_sockets {
            socketed.push(self.decode_nested(reader, depth + 1)?);
        }
        for child in &socketed {
            let context = socket_context(category, base, child);
            properties.extend(
                child
                    .properties
                    .iter()
                    .filter(|property| property.quality_flag == context)
                    .cloned(),
            );
            requirements.level = requirements.level.max(child.requirements.level);
        }

        let mut name = extended
            .as_ref()
            .map_or_else(|| base.name.clone(), |(head, ..)| head.name.clone());
        if flags.runeword {
            let runes: String = socketed
                .iter()
                .map(|child| child.name.strip_suffix(" Rune").unwrap_or(&child.name))
                .collect();
            match self.tables.runeword(&runes) {
                Some(runeword) => {
                    name = runeword.name.clone();
                    requirements.level = requirements.level.max(runeword.req_level);
                }
                None => warn!("no runeword matches {runes:?} in {code} at byte {start:#x}"),
            }
        }
        let normal = extended
            .as_ref()
            .is_some_and(|(head, ..)| head.quality.kind() == QualityKind::Normal);
        if filled_sockets > 0 && normal && !flags.runeword {
            name = format!("Gemmed {name}");
        }
        if flags.ethereal {
            requirements.strength -= ETHEREAL_REDUCTION;
            requirements.dexterity -= ETHEREAL_REDUCTION;
        }
        if let Some(owner) = extended
            .as_ref()
            .and_then(|(head, ..)| head.personalized_name.as_deref())
        {
            name = personalize(owner, &name);
        }

        sort_properties(&mut properties);
        trace!(
            "{code} {name:?} at byte {start:#x}: {} properties, {} socketed",
            properties.len(),
            socketed.len()
        );

        Ok(Item {
            flags,
            version,
            location,
            slot,
            x,
            y,
            container,
            code,
            name,
            category: Some(category),
            item_type: base.item_type.clone(),
            requirements,
            class_restriction: effects.class,
            ear: None,
            extended: extended.map(
                |(head, total_sockets, defense, durability, set_tiers)| Extended {
                    fingerprint: head.fingerprint,
                    item_level: head.item_level,
                    quality: head.quality,
                    picture_id: head.picture_id,
                    class_specific: head.class_specific,
                    personalized_name: head.personalized_name,
                    filled_sockets: head.filled_sockets,
                    total_sockets,
                    defense,
                    durability,
                    set_tiers,
                },
            ),
            quantity,
            guid,
            properties,
            socketed,
            affix_overflow: effects.overflow,
        })
    }

    /// Exactly one base table must know the code
    fn resolve_base(&self, code: &str) -> Result<(BaseCategory, &'t BaseItem)> {
        let mut hits = [
            (BaseCategory::Armor, self.tables.armor(code)),
            (BaseCategory::Weapon, self.tables.weapon(code)),
            (BaseCategory::Misc, self.tables.misc(code)),
        ]
        .into_iter()
        .filter_map(|(category, base)| base.map(|base| (category, base)));

        match (hits.next(), hits.next()) {
            (Some(hit), None) => Ok(hit),
            _ => Err(D2SaveError::UnknownBaseItem(code.to_string())),
        }
    }

    fn read_extended_head(
        &self,
        reader: &mut BitReader<'_>,
        flags: &ItemFlags,
        base: &BaseItem,
        code: &str,
        effects: &mut AffixEffects,
    ) -> Result<ExtendedHead> {
        let filled_sockets = reader.read_uint(3) as u8;
        let fingerprint = reader.read_uint(32);
        let item_level = reader.read_uint(7) as u8;
        let kind = QualityKind::from_u8(reader.read_uint(4) as u8)?;
        let picture_id = if reader.read_bit() {
            Some(reader.read_uint(3) as u8)
        } else {
            None
        };
        let class_specific = if reader.read_bit() {
            Some(reader.read_uint(11) as u16)
        } else {
            None
        };

        let (quality, name) = self.read_quality(reader, kind, base, code, effects)?;

        if flags.runeword {
            reader.skip(16);
        }
        let personalized_name = if flags.personalized {
            Some(read_name(reader, 8))
        } else {
            None
        };

        Ok(ExtendedHead {
            filled_sockets,
            fingerprint,
            item_level,
            quality,
            name,
            picture_id,
            class_specific,
            personalized_name,
        })
    }

    /// Quality-specific ids, plus the display name they produce
    fn read_quality(
        &self,
        reader: &mut BitReader<'_>,
        kind: QualityKind,
        base: &BaseItem,
        code: &str,
        effects: &mut AffixEffects,
    ) -> Result<(Quality, String)> {
        let decoded = match kind {
            QualityKind::Inferior => {
                let grade = reader.read_uint(3) as u8;
                let name = match inferior_prefix(grade) {
                    Some(prefix) => format!("{prefix} {}", base.name),
                    None => base.name.clone(),
                };
                (Quality::Inferior { grade }, name)
            }
            QualityKind::Normal => {
                let tome_id = if TOME_CODES.contains(&code) {
                    Some(reader.read_uint(5) as u8)
                } else {
                    None
                };
                (Quality::Normal { tome_id }, base.name.clone())
            }
            QualityKind::Superior => {
                let grade = reader.read_uint(3) as u8;
                (Quality::Superior { grade }, base.name.clone())
            }
            QualityKind::Magic => {
                let prefix = reader.read_uint(11) as u16;
                let suffix = reader.read_uint(11) as u16;
                let prefix_name = self.magic_affix(AffixTable::MagicPrefix, prefix, effects)?;
                let suffix_name = self.magic_affix(AffixTable::MagicSuffix, suffix, effects)?;
                let name = [prefix_name, Some(base.name.as_str()), suffix_name]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                (Quality::Magic { prefix, suffix }, name)
            }
            QualityKind::Set => {
                let id = reader.read_uint(12) as u16;
                let set_item = self.tables.set_item(id).ok_or(D2SaveError::UnknownAffix {
                    table: AffixTable::SetItem,
                    id,
                })?;
                effects.req_level = effects.req_level.max(set_item.req_level);
                let quality = Quality::Set {
                    id,
                    set_name: set_item.set_name.clone(),
                };
                (quality, set_item.name.clone())
            }
            QualityKind::Rare | QualityKind::Crafted => {
                let (affixes, name) = self.read_rare(reader, effects)?;
                if kind == QualityKind::Crafted {
                    let surcharge =
                        10 + 3 * affixes.suffixes.len() as u16 + affixes.prefixes.len() as u16;
                    effects.surcharge = surcharge;
                    (Quality::Crafted(affixes), name)
                } else {
                    (Quality::Rare(affixes), name)
                }
            }
            QualityKind::Unique => {
                let id = reader.read_uint(12) as u16;
                let unique = self.tables.unique_item(id).ok_or(D2SaveError::UnknownAffix {
                    table: AffixTable::Unique,
                    id,
                })?;
                effects.req_level = effects.req_level.max(unique.req_level);
                (Quality::Unique { id }, unique.name.clone())
            }
        };
        Ok(decoded)
    }

    /// Two name ids, then six optional affixes alternating prefix and suffix
    fn read_rare(
        &self,
        reader: &mut BitReader<'_>,
        effects: &mut AffixEffects,
    ) -> Result<(RareAffixes, String)> {
        let name_prefix = reader.read_uint(8) as u16;
        let name_suffix = reader.read_uint(8) as u16;
        let first = self
            .tables
            .rare_prefix(name_prefix)
            .ok_or(D2SaveError::UnknownAffix {
                table: AffixTable::RarePrefix,
                id: name_prefix,
            })?;
        let second = self
            .tables
            .rare_suffix(name_suffix)
            .ok_or(D2SaveError::UnknownAffix {
                table: AffixTable::RareSuffix,
                id: name_suffix,
            })?;

        let mut affixes = RareAffixes {
            name_prefix,
            name_suffix,
            ..Default::default()
        };
        for slot in 0..6 {
            if !reader.read_bit() {
                continue;
            }
            let id = reader.read_uint(11) as u16;
            if slot % 2 == 0 {
                self.magic_affix(AffixTable::MagicPrefix, id, effects)?;
                affixes.prefixes.push(id);
            } else {
                self.magic_affix(AffixTable::MagicSuffix, id, effects)?;
                affixes.suffixes.push(id);
            }
        }

        Ok((affixes, format!("{first} {second}")))
    }

    /// Resolve one magic affix id; 0 means none
    fn magic_affix(
        &self,
        table: AffixTable,
        id: u16,
        effects: &mut AffixEffects,
    ) -> Result<Option<&'t str>> {
        if id == 0 {
            return Ok(None);
        }
        if id == AFFIX_OVERFLOW {
            warn!("{table} id {id} is the overflow sentinel, affix left unresolved");
            effects.overflow = true;
            return Ok(None);
        }

        let affix = match table {
            AffixTable::MagicPrefix => self.tables.magic_prefix(id),
            _ => self.tables.magic_suffix(id),
        }
        .ok_or(D2SaveError::UnknownAffix { table, id })?;

        effects.req_level = effects.req_level.max(affix.req_level);
        if effects.class.is_none() {
            effects.class = affix.class;
        }
        Ok(Some(affix.name.as_str()))
    }

    /// Mods a simple socketable grants in each socket context
    fn socketable_properties(&self, code: &str) -> Result<Vec<ItemProperty>> {
        let Some(socketable) = self.tables.socketable(code) else {
            return Ok(Vec::new());
        };
        let contexts = [
            (&socketable.weapon, FLAG_SOCKET_WEAPON),
            (&socketable.helm, FLAG_SOCKET_HELM),
            (&socketable.shield, FLAG_SOCKET_SHIELD),
        ];

        let mut properties = Vec::new();
        for (templates, flag) in contexts {
            for template in templates {
                properties.push(ItemProperty::from_template(template, self.tables, flag)?);
            }
        }
        Ok(properties)
    }

    fn undead_bonus(&self) -> Result<ItemProperty> {
        let template = PropertyTemplate {
            stat_id: STAT_UNDEAD_DAMAGE,
            values: vec![BLUNT_UNDEAD_BONUS],
            quality_flag: 0,
        };
        ItemProperty::from_template(&template, self.tables, 0)
    }
}

/// Whether the GUID block holds four words when its flag is set
///
/// Other misc items store three unused bits instead.
fn carries_guid(category: BaseCategory, base: &BaseItem) -> bool {
    category != BaseCategory::Misc
        || base.is_rune()
        || base.is_gem()
        || base.is_jewelry()
        || base.is_charm()
}

fn read_durability(reader: &mut BitReader<'_>, base: &BaseItem) -> Option<Durability> {
    if !base.durability {
        return None;
    }
    let max = reader.read_uint(8) as u16;
    let current = if max > 0 {
        reader.read_uint(9) as u16
    } else {
        0
    };
    Some(Durability { max, current })
}

/// Characters of `width` bits up to a zero
fn read_name(reader: &mut BitReader<'_>, width: u32) -> String {
    let mut name = String::new();
    for _ in 0..MAX_NAME_LEN {
        let byte = reader.read_uint(width) as u8;
        if byte == 0 {
            break;
        }
        name.push(char::from(byte));
    }
    name
}

/// Byte-align the end of a record
fn finish_record(reader: &mut BitReader<'_>, code: &str) {
    if reader.bits_to_boundary() == 0 && BOUNDARY_SKIP_CODES.contains(&code) {
        reader.skip(8);
    } else {
        reader.align_to_byte();
    }
}

/// Quality flag of the child mods that apply to the parent
fn socket_context(category: BaseCategory, parent: &BaseItem, child: &Item) -> u8 {
    if child.code == "jew" {
        FLAG_JEWEL
    } else if category == BaseCategory::Weapon {
        FLAG_SOCKET_WEAPON
    } else if parent.is_helm_or_torso() {
        FLAG_SOCKET_HELM
    } else {
        FLAG_SOCKET_SHIELD
    }
}

fn personalize(owner: &str, name: &str) -> String {
    if owner.ends_with('s') {
        format!("{owner}' {name}")
    } else {
        format!("{owner}'s {name}")
    }
}
