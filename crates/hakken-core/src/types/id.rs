use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of one anime in the local metadata store.
///
/// Id `0` is reserved as the "unknown" id and never names a real entry.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AnimeId(pub u32);

impl AnimeId {
    /// The reserved "unknown" id.
    pub const UNKNOWN: AnimeId = AnimeId(0);

    /// Returns `true` for the reserved unknown id.
    #[must_use]
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl From<u32> for AnimeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for AnimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_unknown() {
        assert!(AnimeId::UNKNOWN.is_unknown());
        assert!(AnimeId(0).is_unknown());
        assert!(!AnimeId(9253).is_unknown());
    }

    #[test]
    fn default_is_unknown() {
        assert_eq!(AnimeId::default(), AnimeId::UNKNOWN);
    }

    #[test]
    fn serializes_as_bare_number() {
        assert_eq!(serde_json::to_string(&AnimeId(42)).unwrap(), "42");
        let id: AnimeId = serde_json::from_str("7").unwrap();
        assert_eq!(id, AnimeId(7));
    }
}
