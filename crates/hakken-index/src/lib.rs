//! # Hakken Index
//!
//! Maps anime titles to the library entries they belong to.
//!
//! Every title-like string in the metadata store (romaji, English and native
//! titles, curated and user-added synonyms) is reduced to a [`NormalizedKey`]
//! by [`normalize`] and inserted into a [`MatchIndex`]. The index is derived
//! data: it is built lazily, dropped on [`MatchIndex::invalidate`], and
//! rebuilt from the store's current contents on the next
//! [`MatchIndex::init`].
//!
//! ```rust
//! use hakken_index::{normalize, AnimeEntry, Library, MatchIndex};
//!
//! let library = Library::from_entries(vec![
//!     AnimeEntry::new(9253, "Steins;Gate"),
//! ])
//! .unwrap();
//!
//! let index = MatchIndex::new();
//! index.init(&library);
//!
//! let candidates = index.find(&normalize("steins gate")).unwrap();
//! assert_eq!(candidates.len(), 1);
//! ```
pub mod error;
pub mod index;
pub mod normalize;
pub mod store;

pub use error::{IndexError, Result};
pub use index::{CacheState, CandidateSet, IndexStats, MatchCandidate, MatchIndex, TitleWeights};
pub use normalize::{normalize, NormalizedKey};
pub use store::{AnimeEntry, Library, MetadataStore, TitleKind, TitleLanguage, Titles};
