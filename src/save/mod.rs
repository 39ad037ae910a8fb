//! Save file containers
//!
//! Character files (`.d2s`) carry a fixed header followed by marker-tagged
//! sections; shared stash files (`.d2i`) are a run of tabs. Both embed item
//! lists that are handed to [`crate::item::ItemDecoder`].

pub mod attributes;
pub mod character;
pub mod scanner;
pub mod skills;
pub mod stash;

pub use attributes::Attributes;
pub use character::{
    compute_checksum, decode_character, read_header, Character, CharacterHeader,
    DifficultyProgress, Mercenary, QuestLog, Quests, Status, Waypoints,
};
pub use skills::{read_skills, SkillRecord};
pub use stash::{decode_stash, ChronicleEntry, Stash, StashTab};
