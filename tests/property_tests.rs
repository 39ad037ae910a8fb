//! Property-based tests for the bit reader and the decoders
//!
//! Random input must never panic: every malformed buffer ends in an error.

mod common;

use common::*;
use d2save::{decode_character, decode_stash, read_header, BitReader, CharacterClass};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_read_uint_matches_written_bits(
        fields in prop::collection::vec((any::<u32>(), 1u32..=32), 1..40)
    ) {
        let mut bits = Bits::default();
        for &(value, width) in &fields {
            bits.push(value, width);
        }
        let data = bits.finish();

        let mut reader = BitReader::new(&data);
        for &(value, width) in &fields {
            let mask = if width == 32 { u32::MAX } else { (1 << width) - 1 };
            prop_assert_eq!(reader.read_uint(width), value & mask);
        }
    }
}

proptest! {
    #[test]
    fn test_align_lands_on_byte_boundary(
        data in prop::collection::vec(any::<u8>(), 1..64),
        skip in 0usize..256
    ) {
        let skip = skip % (data.len() * 8);
        let mut reader = BitReader::new(&data);
        reader.skip(skip);
        reader.align_to_byte();
        prop_assert_eq!(reader.bit_position() % 8, 0);
        prop_assert!(reader.bit_position() >= skip);
        prop_assert!(reader.bit_position() < skip + 8);
    }
}

proptest! {
    #[test]
    fn test_reads_past_end_are_zero(
        data in prop::collection::vec(any::<u8>(), 0..16),
        width in 1u32..=32
    ) {
        let mut reader = BitReader::new(&data);
        reader.skip(data.len() * 8);
        prop_assert_eq!(reader.read_uint(width), 0);
        prop_assert!(reader.is_exhausted());
    }
}

proptest! {
    #[test]
    fn test_header_never_panics(data in prop::collection::vec(any::<u8>(), 0..0x400)) {
        let _ = read_header(&data);
    }
}

proptest! {
    #[test]
    fn test_stash_never_panics(data in prop::collection::vec(any::<u8>(), 0..0x200)) {
        let _ = decode_stash(&data, &tables());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn test_corrupted_character_never_panics(
        flips in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..16)
    ) {
        let mut spec = CharacterSpec::new(CharacterClass::Paladin);
        spec.items = vec![
            potion(),
            armor("qui", EQUIPPED, SLOT_TORSO, Some((39, 60))),
            set_piece("skp", 20, SLOT_HEAD),
        ];
        let mut data = character(&spec);
        for (index, value) in flips {
            let at = index.index(data.len());
            data[at] = value;
        }
        let _ = decode_character(&data, &tables());
    }
}

proptest! {
    #[test]
    fn test_random_tail_never_panics(tail in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut data = character(&CharacterSpec::new(CharacterClass::Druid));
        data.truncate(data.len() - 8);
        data.extend_from_slice(&tail);
        seal(&mut data);
        let _ = decode_character(&data, &tables());
    }
}
