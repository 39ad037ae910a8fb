//! The 32-bit flag field that opens every item record

use serde::{Deserialize, Serialize};

const IDENTIFIED: u32 = 1 << 4;
const SOCKETED: u32 = 1 << 11;
const EAR: u32 = 1 << 16;
const SIMPLE: u32 = 1 << 21;
const ETHEREAL: u32 = 1 << 22;
const PERSONALIZED: u32 = 1 << 24;
const RUNEWORD: u32 = 1 << 26;

/// Item flags
///
/// `two_handed` and `thrown` are not part of the stored field; they are copied
/// from the weapon table once the base code is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFlags {
    /// Identified
    pub identified: bool,
    /// Has sockets
    pub socketed: bool,
    /// Player ear
    pub ear: bool,
    /// Simple (compact) record without extended data
    pub simple: bool,
    /// Ethereal
    pub ethereal: bool,
    /// Carries an owner name
    pub personalized: bool,
    /// Runeword
    pub runeword: bool,
    /// Throwing weapon
    pub thrown: bool,
    /// Two-handed weapon
    pub two_handed: bool,
}

impl ItemFlags {
    /// Decode the stored flag field
    pub fn from_bits(bits: u32) -> Self {
        Self {
            identified: bits & IDENTIFIED != 0,
            socketed: bits & SOCKETED != 0,
            ear: bits & EAR != 0,
            simple: bits & SIMPLE != 0,
            ethereal: bits & ETHEREAL != 0,
            personalized: bits & PERSONALIZED != 0,
            runeword: bits & RUNEWORD != 0,
            thrown: false,
            two_handed: false,
        }
    }
}
