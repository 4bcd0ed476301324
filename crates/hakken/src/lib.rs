//! # Hakken
//!
//! Anime filename recognition: given a media filename such as
//! `[SubsPlease] Jujutsu Kaisen - 24 (1080p).mkv`, find which anime of a known
//! library it belongs to.
//!
//! Recognition is a one-way pipeline:
//!
//! 1. a [`Tokenizer`] extracts labeled elements from the filename,
//! 2. the title element is folded into a [`NormalizedKey`],
//! 3. the [`MatchIndex`] maps the key to candidate anime,
//! 4. a [`TieBreak`] policy picks one of them.
//!
//! ## Quick Start
//!
//! ```rust
//! use hakken::{AnimeEntry, AnimeId, Library, Recognizer};
//!
//! let library = Library::from_entries(vec![
//!     AnimeEntry::new(1, "Jujutsu Kaisen").with_japanese("呪術廻戦"),
//!     AnimeEntry::new(2, "Cowboy Bebop"),
//! ])
//! .unwrap();
//!
//! let recognizer = Recognizer::new(library).unwrap();
//! let result = recognizer.recognize("[SubsPlease] Jujutsu Kaisen - 24 (1080p) [A1B2C3D4].mkv");
//!
//! assert_eq!(result.anime_id, Some(AnimeId(1)));
//! assert_eq!(result.episode.episode_number(), Some(24));
//! ```
pub mod config;
pub mod recognizer;
pub mod scan;

pub use config::{RecognizerConfig, TieBreak};
pub use recognizer::{Recognition, Recognizer};
pub use scan::{ScanEntry, Scanner};

// Re-export the engine parts so most users need a single dependency
pub use hakken_core::{
    AnimeId, Element, ElementKind, HakkenError, HeuristicTokenizer, ParsedEpisode, Result,
    Tokenizer,
};
pub use hakken_index::{
    AnimeEntry, CacheState, CandidateSet, IndexError, IndexStats, Library, MatchCandidate,
    MatchIndex, MetadataStore, NormalizedKey, TitleKind, TitleLanguage, TitleWeights, Titles,
    normalize,
};
