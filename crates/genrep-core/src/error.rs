//! Error types shared between the recorder and its host.

use thiserror::Error;

/// A serialized slot layout could not be parsed.
///
/// Returned by [`SessionHost::parse_slot_layout`](crate::SessionHost::parse_slot_layout).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlotParseError {
    /// A `key=value` entry was missing its `=` or had an unknown key.
    #[error("malformed slot layout entry '{entry}'")]
    MalformedEntry {
        /// The offending entry text.
        entry: String,
    },
    /// A numeric field did not parse.
    #[error("invalid number '{value}' for '{key}'")]
    InvalidNumber {
        /// The key whose value was bad.
        key: String,
        /// The raw value text.
        value: String,
    },
    /// More slots were described than the format allows.
    #[error("slot layout describes {count} slots, at most {max} are allowed")]
    TooManySlots {
        /// Number of slots found.
        count: usize,
        /// [`MAX_SLOTS`](crate::MAX_SLOTS).
        max: usize,
    },
    /// A required entry was absent.
    #[error("slot layout is missing '{key}'")]
    Missing {
        /// The missing key.
        key: String,
    },
}
