//! # Recognizer
//!
//! Turns a media filename into an anime id: tokenize, take the title element,
//! normalize it, look it up in the match index and resolve collisions with
//! the configured [`TieBreak`] policy.

use std::cmp::Ordering;

use hakken_core::{AnimeId, ElementKind, HeuristicTokenizer, ParsedEpisode, Result, Tokenizer};
use hakken_index::{CacheState, Library, MatchCandidate, MatchIndex, MetadataStore, normalize};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{RecognizerConfig, TieBreak};

/// Result of [`Recognizer::recognize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// Elements extracted from the filename
    pub episode: ParsedEpisode,
    /// The identified anime, `None` when unknown
    pub anime_id: Option<AnimeId>,
}

impl Recognition {
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.anime_id.is_some()
    }
}

/// Anime filename recognizer.
///
/// Owns its tokenizer, a handle to the metadata store and the match index
/// derived from it. The index is built on the first [`identify`] call and
/// reused until [`invalidate`] is called, typically after the store changed.
///
/// `Recognizer` is `Send + Sync` and meant to be shared: every method takes
/// `&self`.
///
/// [`identify`]: Recognizer::identify
/// [`invalidate`]: Recognizer::invalidate
#[derive(Debug)]
pub struct Recognizer<T = HeuristicTokenizer, S = Library> {
    tokenizer: T,
    store: S,
    index: MatchIndex,
    config: RecognizerConfig,
}

impl<S: MetadataStore> Recognizer<HeuristicTokenizer, S> {
    /// Create a recognizer over `store` with the heuristic tokenizer and the
    /// default configuration.
    pub fn new(store: S) -> Result<Self> {
        Self::with_config(store, RecognizerConfig::default())
    }

    /// Create a recognizer over `store` with the heuristic tokenizer.
    pub fn with_config(store: S, config: RecognizerConfig) -> Result<Self> {
        Ok(Self::with_tokenizer(HeuristicTokenizer::new()?, store, config))
    }
}

impl<T: Tokenizer, S: MetadataStore> Recognizer<T, S> {
    /// Create a recognizer with a custom tokenizer.
    pub fn with_tokenizer(tokenizer: T, store: S, config: RecognizerConfig) -> Self {
        Self {
            tokenizer,
            store,
            index: MatchIndex::with_weights(config.weights.clone()),
            config,
        }
    }

    /// Extracts elements from a filename. Any directory prefix is ignored.
    ///
    /// Never fails: input the tokenizer rejects yields an empty episode,
    /// which [`identify`](Self::identify) reports as unknown.
    pub fn parse(&self, filename: &str) -> ParsedEpisode {
        let name = file_name(filename);
        match self.tokenizer.tokenize(name) {
            Ok(elements) => ParsedEpisode::new(name, elements),
            Err(e) => {
                debug!(input = name, error = %e, "tokenizer rejected input");
                ParsedEpisode::empty(name)
            }
        }
    }

    /// Identifies the anime an episode belongs to.
    ///
    /// Builds the match index first if it is cold. Returns `None` when the
    /// episode has no usable title or the title matches no known anime.
    pub fn identify(&self, episode: &ParsedEpisode) -> Option<AnimeId> {
        self.candidates(episode).first().map(|c| c.id)
    }

    /// [`parse`](Self::parse) followed by [`identify`](Self::identify).
    pub fn recognize(&self, filename: &str) -> Recognition {
        let episode = self.parse(filename);
        let anime_id = self.identify(&episode);
        Recognition { episode, anime_id }
    }

    /// All anime whose titles match the episode title, best first according
    /// to the tie-break policy. The first entry is what
    /// [`identify`](Self::identify) returns.
    ///
    /// Builds the match index if it is cold, even when the episode has no
    /// title.
    pub fn candidates(&self, episode: &ParsedEpisode) -> Vec<MatchCandidate> {
        let title = episode.element(ElementKind::Title);
        let key = normalize(title);
        if key.is_empty() {
            self.index.init(&self.store);
            trace!(input = episode.input(), "no usable title");
            return Vec::new();
        }

        let Some(set) = self.index.lookup(&self.store, &key) else {
            trace!(input = episode.input(), key = %key, "no candidates");
            return Vec::new();
        };

        let mut candidates = set.into_vec();
        let tie_break = self.config.tie_break;
        candidates.sort_by(|a, b| rank(tie_break, a, b));
        candidates
    }

    /// Drops the match index. Call after the store changed; the next
    /// identification rebuilds it.
    pub fn invalidate(&self) {
        self.index.invalidate();
    }

    #[must_use]
    pub fn state(&self) -> CacheState {
        self.index.state()
    }

    #[must_use]
    pub fn index(&self) -> &MatchIndex {
        &self.index
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }
}

/// Orders candidates by score per policy, then by ascending id.
fn rank(tie_break: TieBreak, a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    let by_score = match tie_break {
        TieBreak::HighestScore => b.score.total_cmp(&a.score),
        TieBreak::LowestScore => a.score.total_cmp(&b.score),
    };
    by_score.then(a.id.cmp(&b.id))
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
