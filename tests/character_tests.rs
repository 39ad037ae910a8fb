//! Character file decoding against synthetic saves
//!
//! These tests build complete `.d2s` buffers through the public API and
//! check the decoded records end to end.

mod common;

use common::*;
use d2save::item::{EquipSlot, Location};
use d2save::{
    decode_character, read_header, Character, CharacterClass, D2SaveError, QUESTS_OFFSET,
};

#[test]
fn test_minimal_sorceress() {
    let data = header_only(CharacterClass::Sorceress, "Tester");
    let character = decode_character(&data, &tables()).unwrap();

    assert_eq!(character.header.name, "Tester");
    assert_eq!(character.header.class, CharacterClass::Sorceress);
    assert_eq!(character.attributes.strength, 10);
    assert_eq!(character.attributes.dexterity, 25);
    assert_eq!(character.attributes.vitality, 10);
    assert_eq!(character.attributes.energy, 35);
    assert_eq!(character.attributes.level, 1);
    assert!(character.quests.is_none());
    assert!(character.waypoints.is_none());
    assert!(character.items.is_empty());
    assert!(character.checksum_valid);
}

#[test]
fn test_malformed_headers() {
    let good = header_only(CharacterClass::Amazon, "Tester");

    let mut bad_magic = good.clone();
    bad_magic[0] = 0x00;
    let mut bad_version = good.clone();
    bad_version[4] = 0x60;
    let mut bad_class = good.clone();
    bad_class[0x28] = 9;
    let truncated = &good[..0x40];

    for data in [&bad_magic[..], &bad_version[..], &bad_class[..], truncated] {
        assert!(
            matches!(read_header(data), Err(D2SaveError::MalformedHeader(_))),
            "header should be rejected"
        );
        assert!(matches!(
            decode_character(data, &tables()),
            Err(D2SaveError::MalformedHeader(_))
        ));
    }
}

#[test]
fn test_full_character() {
    let mut spec = CharacterSpec::new(CharacterClass::Necromancer);
    spec.items = vec![
        potion(),
        armor("qui", EQUIPPED, SLOT_TORSO, Some((39, 50 + 20))),
    ];
    let data = character(&spec);
    let character = decode_character(&data, &tables()).unwrap();

    assert!(character.checksum_valid);
    assert_eq!(character.header.level, 8);
    assert_eq!(character.attributes.strength, 25);
    assert_eq!(character.attributes.level, 8);
    assert_eq!(character.attributes.experience, 6000);
    assert_eq!(character.attributes.gold, 250);

    let quests = character.quests.as_ref().unwrap();
    assert!(quests.is_complete(0, 1));
    assert!(!quests.is_complete(1, 1));
    let waypoints = character.waypoints.as_ref().unwrap();
    assert_eq!(waypoints.count(0), 3);
    assert_eq!(waypoints.count(2), 0);

    assert_eq!(character.items.len(), 2);
    assert_eq!(character.items[0].name, "Minor Mana Potion");
    assert_eq!(character.items[0].location, Location::Stored);

    let armor = &character.items[1];
    assert_eq!(armor.name, "Quilted Armor");
    assert_eq!(armor.slot, EquipSlot::Torso);
    let extended = armor.extended.as_ref().unwrap();
    assert_eq!(extended.defense, Some(10));
    assert_eq!(extended.durability.map(|d| (d.max, d.current)), Some((12, 12)));
    assert_eq!(armor.properties.len(), 1);
    assert_eq!(armor.properties[0].value(), 20);

    assert_eq!(character.equipped_properties().len(), 1);
    assert!(character.corpse_items.is_empty());
    assert!(!character.has_affix_overflow());
}

#[test]
fn test_set_bonus_with_two_pieces_worn() {
    let mut spec = CharacterSpec::new(CharacterClass::Barbarian);
    spec.items = vec![
        set_piece("skp", 20, SLOT_HEAD),
        set_piece("qui", 21, SLOT_TORSO),
    ];
    let character = decode_character(&character(&spec), &tables()).unwrap();

    assert_eq!(character.items[0].name, "Arctic Horn");
    for item in &character.items {
        assert_eq!(item.set_name(), Some("Arctic Gear"));
        assert_eq!(item.properties.len(), 1);
        assert_eq!(item.properties[0].stat_id, 0);
        assert_eq!(item.properties[0].value(), 4);
    }

    assert_eq!(character.set_bonuses.len(), 1);
    let bonus = &character.set_bonuses[0];
    assert_eq!(bonus.set_name, "Arctic Gear");
    assert_eq!(bonus.equipped, 2);
    assert_eq!(bonus.properties.len(), 1);
    assert_eq!(bonus.properties[0].stat_id, 7);
    assert_eq!(bonus.properties[0].value(), 40);
}

#[test]
fn test_set_piece_on_weapon_swap_does_not_count() {
    let mut spec = CharacterSpec::new(CharacterClass::Barbarian);
    spec.items = vec![
        set_piece("skp", 20, SLOT_HEAD),
        set_piece("buc", 21, SLOT_SWAP_LEFT),
    ];
    let character = decode_character(&character(&spec), &tables()).unwrap();

    assert!(character.set_bonuses.is_empty());
    assert!(character.items.iter().all(|item| item.properties.is_empty()));
}

#[test]
fn test_resist_fire_counts_equipped_all_skills() {
    let mut spec = CharacterSpec::new(CharacterClass::Paladin);
    // Resist Fire is the fifth Paladin skill
    spec.skills[4] = 6;
    spec.items = vec![
        armor("skp", EQUIPPED, SLOT_HEAD, Some((127, 2))),
        armor("skp", STORED, 0, Some((127, 3))),
    ];
    let character = decode_character(&character(&spec), &tables()).unwrap();

    let resist_fire = character
        .skills
        .iter()
        .find(|skill| skill.skill_id == 100)
        .unwrap();
    assert_eq!(resist_fire.level, 6);
    assert_eq!(resist_fire.bonuses.len(), 1);
    assert_eq!(resist_fire.bonuses[0].stat_id, 39);
    assert_eq!(resist_fire.bonuses[0].value(), 4);

    assert!(character
        .skills
        .iter()
        .filter(|skill| skill.skill_id != 100)
        .all(|skill| skill.bonuses.is_empty()));
}

#[test]
fn test_class_skill_helm() {
    let mut spec = CharacterSpec::new(CharacterClass::Sorceress);
    spec.items = vec![magic_class_helm(EQUIPPED, SLOT_HEAD, 2)];
    let character = decode_character(&character(&spec), &tables()).unwrap();

    let helm = &character.items[0];
    assert_eq!(helm.name, "Glimmering Skull Cap");
    assert_eq!(helm.requirements.level, 2);
    assert_eq!(helm.properties[0].stat_id, 83);
    assert_eq!(
        helm.properties[0].param(),
        Some(CharacterClass::Sorceress as i32)
    );
    assert_eq!(helm.properties[0].value(), 2);
}

#[test]
fn test_expansion_mercenary_items() {
    let mut spec = CharacterSpec::new(CharacterClass::Druid);
    spec.status = STATUS_EXPANSION;
    spec.mercenary_id = 0x1234;
    spec.items = vec![potion()];
    spec.mercenary_items = vec![armor("buc", EQUIPPED, SLOT_LEFT_HAND, None)];
    let character = decode_character(&character(&spec), &tables()).unwrap();

    assert!(character.header.status.expansion);
    assert_eq!(character.header.mercenary.map(|m| m.id), Some(0x1234));
    assert_eq!(character.items.len(), 1);
    assert_eq!(character.mercenary_items.len(), 1);
    assert_eq!(character.mercenary_items[0].name, "Buckler");
    assert!(character.golem.is_none());
}

#[test]
fn test_checksum_mismatch_is_not_fatal() {
    let mut data = character(&CharacterSpec::new(CharacterClass::Assassin));
    data[0x0C] ^= 0xFF;
    let character = decode_character(&data, &tables()).unwrap();
    assert!(!character.checksum_valid);
    assert_eq!(character.header.class, CharacterClass::Assassin);
}

#[test]
fn test_missing_quest_marker() {
    let mut data = character(&CharacterSpec::new(CharacterClass::Amazon));
    data[QUESTS_OFFSET] = b'X';
    assert!(matches!(
        decode_character(&data, &tables()),
        Err(D2SaveError::MissingMarker { offset, .. }) if offset == QUESTS_OFFSET
    ));
}

#[test]
fn test_truncated_item_list() {
    let mut spec = CharacterSpec::new(CharacterClass::Sorceress);
    spec.items = vec![armor("qui", EQUIPPED, SLOT_TORSO, None)];
    let mut data = character(&spec);
    let item_list_end = data.len() - 4;
    data.truncate(item_list_end - 6);
    seal(&mut data);
    assert!(decode_character(&data, &tables()).is_err());
}

#[test]
fn test_json_round_trip() {
    let mut spec = CharacterSpec::new(CharacterClass::Paladin);
    spec.items = vec![set_piece("skp", 20, SLOT_HEAD), potion()];
    let character = decode_character(&character(&spec), &tables()).unwrap();

    let json = serde_json::to_string(&character).unwrap();
    let restored: Character = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, character);
}
