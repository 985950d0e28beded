//! Run-length tier layout strings describing the physical key arrangement.

use serde::{Deserialize, Serialize};

/// The standard twelve-tone keyboard pattern.
pub const STANDARD_LAYOUT: &str = "121121211212";

/// Tier of a key position within a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// A full-size key (`'1'`).
    Full,
    /// A shorter key inserted between full-size keys (`'2'`).
    Short,
}

/// A validated tier-layout string over the alphabet `'1'`/`'2'`.
///
/// The pattern repeats across the keyboard, so the last and first
/// characters are effectively adjacent. Construction goes through
/// [`KeyLayout::parse`]; an existing `KeyLayout` value is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyLayout(String);

impl KeyLayout {
    /// Validate a layout string. Rejects the empty string, two adjacent
    /// short keys (including the pair formed across the pattern wrap), and
    /// any character outside `'1'`/`'2'`.
    pub fn parse(layout: &str) -> Result<Self, InvalidLayout> {
        if layout.is_empty() {
            return Err(InvalidLayout::Empty);
        }
        if layout.contains("22") {
            return Err(InvalidLayout::AdjacentShortKeys);
        }
        if layout.starts_with('2') && layout.ends_with('2') {
            return Err(InvalidLayout::WrapsToAdjacentShortKeys);
        }
        if let Some(c) = layout.chars().find(|c| !matches!(c, '1' | '2')) {
            return Err(InvalidLayout::BadCharacter(c));
        }
        Ok(Self(layout.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        // A validated layout is never empty; kept for the len/is_empty pair.
        self.0.is_empty()
    }

    /// Tier at a key position, with the pattern repeating.
    pub fn tier(&self, position: usize) -> Tier {
        match self.0.as_bytes()[position % self.0.len()] {
            b'2' => Tier::Short,
            _ => Tier::Full,
        }
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self(STANDARD_LAYOUT.to_string())
    }
}

impl std::fmt::Display for KeyLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for KeyLayout {
    type Error = InvalidLayout;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyLayout> for String {
    fn from(layout: KeyLayout) -> String {
        layout.0
    }
}

/// Why a layout string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidLayout {
    Empty,
    AdjacentShortKeys,
    WrapsToAdjacentShortKeys,
    BadCharacter(char),
}

impl std::fmt::Display for InvalidLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "layout string is empty"),
            Self::AdjacentShortKeys => write!(f, "layout places two short keys next to each other"),
            Self::WrapsToAdjacentShortKeys => write!(
                f,
                "layout starts and ends with a short key, which become adjacent when the pattern repeats"
            ),
            Self::BadCharacter(c) => write!(f, "layout contains invalid character {:?}", c),
        }
    }
}

impl std::error::Error for InvalidLayout {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_is_valid() {
        assert!(KeyLayout::parse("121121211212").is_ok());
    }

    #[test]
    fn wholetone_layout_is_valid() {
        assert!(KeyLayout::parse("12").is_ok());
    }

    #[test]
    fn empty_layout_rejected() {
        assert_eq!(KeyLayout::parse(""), Err(InvalidLayout::Empty));
    }

    #[test]
    fn adjacent_short_keys_rejected() {
        assert_eq!(KeyLayout::parse("22"), Err(InvalidLayout::AdjacentShortKeys));
        assert_eq!(
            KeyLayout::parse("1221"),
            Err(InvalidLayout::AdjacentShortKeys)
        );
    }

    #[test]
    fn wrap_adjacency_rejected() {
        // The repeating pattern makes the trailing and leading short keys
        // neighbors: "212" + "212" contains "22".
        assert_eq!(
            KeyLayout::parse("212"),
            Err(InvalidLayout::WrapsToAdjacentShortKeys)
        );
        assert_eq!(
            KeyLayout::parse("2"),
            Err(InvalidLayout::WrapsToAdjacentShortKeys)
        );
    }

    #[test]
    fn bad_characters_rejected() {
        assert_eq!(KeyLayout::parse("13"), Err(InvalidLayout::BadCharacter('3')));
        assert_eq!(
            KeyLayout::parse("1a1"),
            Err(InvalidLayout::BadCharacter('a'))
        );
    }

    #[test]
    fn single_sided_short_key_is_valid() {
        // A short key at only one end never wraps into another short key.
        assert!(KeyLayout::parse("211").is_ok());
        assert!(KeyLayout::parse("112").is_ok());
    }

    #[test]
    fn tier_lookup_repeats() {
        let layout = KeyLayout::parse("12").unwrap();
        assert_eq!(layout.tier(0), Tier::Full);
        assert_eq!(layout.tier(1), Tier::Short);
        assert_eq!(layout.tier(2), Tier::Full);
        assert_eq!(layout.tier(5), Tier::Short);
    }

    #[test]
    fn serde_round_trip_validates() {
        let layout: KeyLayout = serde_json::from_str("\"121\"").unwrap();
        assert_eq!(layout.as_str(), "121");
        assert!(serde_json::from_str::<KeyLayout>("\"22\"").is_err());
    }
}
