//! Error handling for save decoding
//!
//! This module defines the error types used throughout the decoder.
//! It uses thiserror for ergonomic error handling and provides context-specific
//! error variants.

pub use crate::common::AffixTable;
pub use crate::common::D2SaveError;
pub use crate::common::Result;
