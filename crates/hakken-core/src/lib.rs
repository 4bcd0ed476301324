//! # Hakken Core
//!
//! Element extraction for anime media filenames. A [`Tokenizer`] turns a raw
//! filename into an ordered list of labeled [`Element`]s, which are wrapped in
//! a read-only [`ParsedEpisode`] for the recognition engine to consume.
//!
//! ## Quick Start
//!
//! ```rust
//! use hakken_core::{ElementKind, HeuristicTokenizer, ParsedEpisode, Tokenizer};
//!
//! let tokenizer = HeuristicTokenizer::new().unwrap();
//! let input = "[SubsPlease] Jujutsu Kaisen - 24 (1080p) [A1B2C3D4].mkv";
//! let episode = ParsedEpisode::new(input, tokenizer.tokenize(input).unwrap());
//!
//! assert_eq!(episode.element(ElementKind::Title), "Jujutsu Kaisen");
//! assert_eq!(episode.element(ElementKind::ReleaseGroup), "SubsPlease");
//! assert_eq!(episode.element(ElementKind::Episode), "24");
//! ```
pub mod error;
pub mod parser;
pub mod types;

// Re-export primary API
pub use error::{HakkenError, Result};
pub use parser::{HeuristicTokenizer, Tokenizer};
pub use types::{AnimeId, Element, ElementKind, ParsedEpisode};
