//! Test utilities and mock collaborators for genrep development.
//!
//! Provides [`MockHost`], a [`SessionHost`] with an in-memory slot layout
//! and a small textual layout codec, plus command [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use genrep_core::{
    GameMode, SessionHost, SlotLayout, SlotParseError, SlotSnapshot, SlotState, MAX_SLOTS,
};

/// Serialize a layout as `M=<map>;SD=<seed>;C=<interval>;S=<slot>,...;`.
///
/// Slots are `X` (closed), `O` (open), `C` (computer) or `H:<name>`.
/// `crc_interval` replaces the layout's own interval.
pub fn encode_layout(layout: &SlotLayout, crc_interval: u32) -> String {
    let slots: Vec<String> = layout
        .slots
        .iter()
        .map(|slot| match slot {
            SlotState::Closed => "X".to_owned(),
            SlotState::Open => "O".to_owned(),
            SlotState::Computer => "C".to_owned(),
            SlotState::Human { name } => format!("H:{name}"),
        })
        .collect();
    format!(
        "M={};SD={};C={};S={};",
        layout.map,
        layout.seed,
        crc_interval,
        slots.join(",")
    )
}

/// Parse a layout written by [`encode_layout`]. Missing trailing slots are closed.
pub fn decode_layout(text: &str) -> Result<SlotLayout, SlotParseError> {
    let mut layout = SlotLayout::default();
    let (mut map, mut seed, mut interval, mut slots) = (None, None, None, None);

    for entry in text.split(';').filter(|e| !e.is_empty()) {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| SlotParseError::MalformedEntry {
                entry: entry.to_owned(),
            })?;
        match key {
            "M" => map = Some(value.to_owned()),
            "SD" => seed = Some(parse_number(key, value)?),
            "C" => interval = Some(parse_number(key, value)?),
            "S" => slots = Some(value.to_owned()),
            _ => {
                return Err(SlotParseError::MalformedEntry {
                    entry: entry.to_owned(),
                })
            }
        }
    }

    layout.map = map.ok_or_else(|| missing("M"))?;
    layout.seed = seed.ok_or_else(|| missing("SD"))?;
    layout.crc_interval = interval.ok_or_else(|| missing("C"))?;
    let slots = slots.ok_or_else(|| missing("S"))?;

    let parts: Vec<&str> = slots.split(',').filter(|s| !s.is_empty()).collect();
    if parts.len() > MAX_SLOTS {
        return Err(SlotParseError::TooManySlots {
            count: parts.len(),
            max: MAX_SLOTS,
        });
    }
    for (slot, part) in layout.slots.iter_mut().zip(parts) {
        *slot = match part {
            "X" => SlotState::Closed,
            "O" => SlotState::Open,
            "C" => SlotState::Computer,
            _ => match part.strip_prefix("H:") {
                Some(name) => SlotState::Human {
                    name: name.to_owned(),
                },
                None => {
                    return Err(SlotParseError::MalformedEntry {
                        entry: part.to_owned(),
                    })
                }
            },
        };
    }
    Ok(layout)
}

fn parse_number(key: &str, value: &str) -> Result<u32, SlotParseError> {
    value.parse().map_err(|_| SlotParseError::InvalidNumber {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn missing(key: &str) -> SlotParseError {
    SlotParseError::Missing {
        key: key.to_owned(),
    }
}

/// Mock implementation of [`SessionHost`].
///
/// Players are named `player<slot>` for every occupied slot, matching the
/// names the checksum tracker looks for.
#[derive(Clone, Debug)]
pub struct MockHost {
    pub layout: SlotLayout,
    pub local_slot: i32,
    pub game_mode: GameMode,
    pub multiplayer: bool,
}

impl MockHost {
    /// A skirmish: Alice in slot 0 against a computer in slot 1.
    pub fn new() -> Self {
        let mut layout = SlotLayout {
            map: "maps/alpine_assault".into(),
            seed: 0x5EED,
            ..SlotLayout::default()
        };
        layout.slots[0] = SlotState::Human {
            name: "Alice".into(),
        };
        layout.slots[1] = SlotState::Computer;
        Self {
            layout,
            local_slot: 0,
            game_mode: GameMode::Skirmish,
            multiplayer: true,
        }
    }

    /// A campaign mission: no occupied slots and no local slot.
    pub fn single_player() -> Self {
        Self {
            layout: SlotLayout {
                map: "maps/campaign_01".into(),
                seed: 7,
                ..SlotLayout::default()
            },
            local_slot: -1,
            game_mode: GameMode::SinglePlayer,
            multiplayer: false,
        }
    }

    pub fn with_layout(mut self, layout: SlotLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_local_slot(mut self, local_slot: i32) -> Self {
        self.local_slot = local_slot;
        self
    }

    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }

    pub fn with_multiplayer(mut self, multiplayer: bool) -> Self {
        self.multiplayer = multiplayer;
        self
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHost for MockHost {
    fn slot_snapshot(&self, crc_interval: u32) -> SlotSnapshot {
        SlotSnapshot {
            config: encode_layout(&self.layout, crc_interval),
            local_slot: self.local_slot,
        }
    }

    fn parse_slot_layout(&self, config: &str) -> Result<SlotLayout, SlotParseError> {
        decode_layout(config)
    }

    fn player_name(&self, player_index: i32) -> Option<String> {
        let slot = usize::try_from(player_index).ok()?;
        self.layout
            .is_occupied(slot)
            .then(|| format!("player{slot}"))
    }

    fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    fn has_multiplayer_setup(&self) -> bool {
        self.multiplayer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_text_roundtrip() {
        let host = MockHost::new();
        let snapshot = host.slot_snapshot(100);
        assert_eq!(
            snapshot.config,
            "M=maps/alpine_assault;SD=24301;C=100;S=H:Alice,C,X,X,X,X,X,X;"
        );
        let parsed = host.parse_slot_layout(&snapshot.config).unwrap();
        assert_eq!(parsed.crc_interval, 100);
        assert_eq!(parsed.slots, host.layout.slots);
        assert_eq!(parsed.seed, 0x5EED);
    }

    #[test]
    fn layout_parse_errors() {
        assert!(matches!(
            decode_layout("M=x;SD=1;C=1"),
            Err(SlotParseError::Missing { .. })
        ));
        assert!(matches!(
            decode_layout("M=x;SD=abc;C=1;S=X;"),
            Err(SlotParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            decode_layout("garbage"),
            Err(SlotParseError::MalformedEntry { .. })
        ));
        assert!(matches!(
            decode_layout("M=x;SD=1;C=1;S=X,X,X,X,X,X,X,X,X;"),
            Err(SlotParseError::TooManySlots { count: 9, .. })
        ));
    }

    #[test]
    fn player_names_follow_occupancy() {
        let host = MockHost::new();
        assert_eq!(host.player_name(0).as_deref(), Some("player0"));
        assert_eq!(host.player_name(1).as_deref(), Some("player1"));
        assert_eq!(host.player_name(2), None);
        assert_eq!(host.player_name(-1), None);
    }
}
