use crate::basket::DexKind;
use crate::constants::DEFAULT_SWAP_DEADLINE_SECS;

pub mod loader;
pub mod types;
pub mod well_known;

pub use loader::*;
pub use types::*;

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_dex() -> DexKind {
    DexKind::DeDust
}

pub(crate) fn default_swap_deadline_secs() -> u32 {
    DEFAULT_SWAP_DEADLINE_SECS
}
