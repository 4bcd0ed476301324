use std::fmt;

use serde::{Deserialize, Serialize};

/// Label attached to a substring extracted from a filename.
///
/// The set of kinds belongs to the tokenizer. Consumers must ignore kinds
/// they do not care about, so new variants can be added without breaking them.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Anime title: "Jujutsu Kaisen"
    Title,
    /// Episode number or range: "24", "01-12"
    Episode,
    /// Episode title, when the release carries one
    EpisodeTitle,
    /// Release group: "SubsPlease"
    ReleaseGroup,
    /// Season number: "3"
    Season,
    /// Release year: "2024"
    Year,
    /// Video resolution: "1080p"
    VideoResolution,
    /// Video codec or other video tag: "HEVC"
    VideoTerm,
    /// Audio codec: "FLAC"
    AudioTerm,
    /// Media source: "Blu-ray", "WEB-DL"
    Source,
    /// CRC32 checksum: "A1B2C3D4"
    FileChecksum,
    /// File extension without the dot: "mkv"
    FileExtension,
    /// Release version: "2" for v2
    ReleaseVersion,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Episode => "episode",
            Self::EpisodeTitle => "episode_title",
            Self::ReleaseGroup => "release_group",
            Self::Season => "season",
            Self::Year => "year",
            Self::VideoResolution => "video_resolution",
            Self::VideoTerm => "video_term",
            Self::AudioTerm => "audio_term",
            Self::Source => "source",
            Self::FileChecksum => "file_checksum",
            Self::FileExtension => "file_extension",
            Self::ReleaseVersion => "release_version",
        };
        f.write_str(name)
    }
}

/// A labeled substring produced by a tokenizer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    kind: ElementKind,
    value: String,
}

impl Element {
    /// Creates a new element.
    #[must_use]
    pub fn new(kind: ElementKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// The element label.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// The extracted text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.kind, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_accessors() {
        let element = Element::new(ElementKind::ReleaseGroup, "Erai-raws");
        assert_eq!(element.kind(), ElementKind::ReleaseGroup);
        assert_eq!(element.value(), "Erai-raws");
    }

    #[test]
    fn element_display() {
        let element = Element::new(ElementKind::Title, "One Piece");
        assert_eq!(element.to_string(), "title=\"One Piece\"");
    }

    #[test]
    fn element_serialization_roundtrip() {
        let element = Element::new(ElementKind::VideoResolution, "1080p");
        let json = serde_json::to_string(&element).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(element, back);
    }
}
