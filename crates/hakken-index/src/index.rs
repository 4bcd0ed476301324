//! # Match Index
//!
//! Lazily built reverse index from [`NormalizedKey`] to the anime whose
//! titles normalize to it.
//!
//! The index is a cache over a [`MetadataStore`]: it is never the source of
//! truth, may be dropped at any time, and is rebuilt wholesale from the
//! store's current contents.
//!
//! Builds happen copy-on-write. A new map is built outside the state lock and
//! swapped in as an `Arc` snapshot, so readers either see the previous
//! snapshot, no snapshot (Cold), or the complete new one; never a partial map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hakken_core::AnimeId;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::normalize::{normalize, NormalizedKey};
use crate::store::{MetadataStore, TitleKind};

/// Default title-kind scores.
pub const SCORE_PRIMARY: f32 = 1.0;
pub const SCORE_ENGLISH: f32 = 0.9;
pub const SCORE_NATIVE: f32 = 0.8;
pub const SCORE_USER_SYNONYM: f32 = 0.7;
pub const SCORE_SYNONYM: f32 = 0.5;

/// Builds discarded because of a concurrent invalidation before a caller
/// gives up installing one.
const MAX_BUILD_ATTEMPTS: u32 = 4;

/// Reliability score assigned to each title kind at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleWeights {
    pub primary: f32,
    pub english: f32,
    pub native: f32,
    pub user_synonym: f32,
    pub synonym: f32,
}

impl Default for TitleWeights {
    fn default() -> Self {
        Self {
            primary: SCORE_PRIMARY,
            english: SCORE_ENGLISH,
            native: SCORE_NATIVE,
            user_synonym: SCORE_USER_SYNONYM,
            synonym: SCORE_SYNONYM,
        }
    }
}

impl TitleWeights {
    #[must_use]
    pub fn score(&self, kind: TitleKind) -> f32 {
        match kind {
            TitleKind::Primary => self.primary,
            TitleKind::English => self.english,
            TitleKind::Native => self.native,
            TitleKind::UserSynonym => self.user_synonym,
            TitleKind::Synonym => self.synonym,
        }
    }
}

/// One anime proposed for a normalized key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: AnimeId,
    pub score: f32,
}

/// Candidates registered under one key, at most one per anime id, sorted by
/// id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<MatchCandidate>,
}

impl CandidateSet {
    /// Adds a candidate. If the anime is already present, the higher score
    /// is kept.
    pub fn insert(&mut self, candidate: MatchCandidate) {
        match self
            .candidates
            .binary_search_by_key(&candidate.id, |c| c.id)
        {
            Ok(pos) => {
                let existing = &mut self.candidates[pos];
                existing.score = existing.score.max(candidate.score);
            }
            Err(pos) => self.candidates.insert(pos, candidate),
        }
    }

    #[must_use]
    pub fn get(&self, id: AnimeId) -> Option<&MatchCandidate> {
        self.candidates
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|pos| &self.candidates[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchCandidate> + '_ {
        self.candidates.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[MatchCandidate] {
        &self.candidates
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<MatchCandidate> {
        self.candidates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl FromIterator<MatchCandidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = MatchCandidate>>(iter: I) -> Self {
        let mut set = Self::default();
        for candidate in iter {
            set.insert(candidate);
        }
        set
    }
}

/// Whether the index is currently built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheState {
    /// Never built, or invalidated since the last build.
    Cold,
    /// Built and serving lookups.
    Warm,
}

/// Counters describing the current snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Distinct normalized keys.
    pub keys: usize,
    /// Candidates across all keys.
    pub candidates: usize,
    /// Title strings skipped during the last build.
    pub skipped: usize,
    /// Completed builds over the lifetime of the index.
    pub builds: u64,
}

/// An immutable, fully built index.
#[derive(Debug, Default)]
struct Snapshot {
    entries: HashMap<NormalizedKey, CandidateSet>,
    candidates: usize,
    skipped: usize,
}

impl Snapshot {
    fn get(&self, key: &NormalizedKey) -> Option<CandidateSet> {
        let found = self.entries.get(key).cloned();
        trace!(key = %key, hits = found.as_ref().map_or(0, CandidateSet::len), "match index lookup");
        found
    }

    fn build<S: MetadataStore + ?Sized>(store: &S, weights: &TitleWeights) -> Self {
        let mut entries: HashMap<NormalizedKey, CandidateSet> = HashMap::new();
        let mut skipped = 0;

        store.for_each_anime(&mut |anime| {
            if anime.id.is_unknown() {
                skipped += anime.titles().count();
                return;
            }
            for (kind, title) in anime.titles() {
                if title.trim().is_empty() {
                    skipped += 1;
                    continue;
                }
                let key = normalize(title);
                if key.is_empty() {
                    trace!(id = %anime.id, title, "title normalizes to nothing, skipping");
                    skipped += 1;
                    continue;
                }
                entries.entry(key).or_default().insert(MatchCandidate {
                    id: anime.id,
                    score: weights.score(kind),
                });
            }
        });

        let candidates = entries.values().map(CandidateSet::len).sum();
        Self {
            entries,
            candidates,
            skipped,
        }
    }
}

/// Title-to-anime reverse index with an explicit Cold/Warm lifecycle.
///
/// Safe to share between threads: lookups run in parallel, builds are
/// serialized, and [`invalidate`](Self::invalidate) may race with a build
/// without leaving a stale snapshot behind.
#[derive(Debug, Default)]
pub struct MatchIndex {
    weights: TitleWeights,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    build_lock: Mutex<()>,
    generation: AtomicU64,
    builds: AtomicU64,
}

impl MatchIndex {
    /// Creates a Cold index with the default title weights.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Cold index with custom title weights.
    #[must_use]
    pub fn with_weights(weights: TitleWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn weights(&self) -> &TitleWeights {
        &self.weights
    }

    /// Ensures the index is built from `store`.
    ///
    /// Cheap when Warm. When Cold, at most one caller builds; concurrent
    /// callers wait for that build and then return. Returns `true` if this
    /// call installed a build.
    ///
    /// A build that races an [`invalidate`](Self::invalidate) is discarded
    /// and retried. If invalidations keep arriving, the caller gives up after
    /// a few attempts and the index stays Cold.
    pub fn init<S: MetadataStore + ?Sized>(&self, store: &S) -> bool {
        self.ensure(store).1
    }

    /// Builds the index if it is Cold, then looks up `key` in that same
    /// snapshot.
    ///
    /// Unlike [`init`](Self::init) followed by [`find`](Self::find), a
    /// concurrent [`invalidate`](Self::invalidate) between the two steps
    /// cannot turn the lookup into a miss.
    pub fn lookup<S: MetadataStore + ?Sized>(
        &self,
        store: &S,
        key: &NormalizedKey,
    ) -> Option<CandidateSet> {
        if key.is_empty() {
            return None;
        }
        let (snapshot, _) = self.ensure(store);
        snapshot.get(key)
    }

    fn ensure<S: MetadataStore + ?Sized>(&self, store: &S) -> (Arc<Snapshot>, bool) {
        if let Some(snapshot) = self.current() {
            return (snapshot, false);
        }

        let _build = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut attempts = 0;
        loop {
            if let Some(snapshot) = self.current() {
                return (snapshot, false);
            }

            attempts += 1;
            let generation = self.generation.load(Ordering::Acquire);
            let snapshot = Arc::new(Snapshot::build(store, &self.weights));

            let mut slot = self.write();
            // An invalidation during the build may mean the store changed
            // under it; the snapshot must not be installed.
            if self.generation.load(Ordering::Acquire) != generation {
                drop(slot);
                if attempts >= MAX_BUILD_ATTEMPTS {
                    // Serve this caller from the fresh build but stay Cold,
                    // so the next caller rebuilds.
                    debug!(attempts, "match index kept being invalidated, not installing");
                    return (snapshot, false);
                }
                debug!(attempts, "match index invalidated during build, rebuilding");
                continue;
            }

            let builds = self.builds.fetch_add(1, Ordering::AcqRel) + 1;
            debug!(
                keys = snapshot.entries.len(),
                candidates = snapshot.candidates,
                skipped = snapshot.skipped,
                builds,
                "match index built"
            );
            *slot = Some(Arc::clone(&snapshot));
            return (snapshot, true);
        }
    }

    /// Looks up the candidates for `key`.
    ///
    /// Returns `None` if the key is unknown or the index is Cold.
    #[must_use]
    pub fn find(&self, key: &NormalizedKey) -> Option<CandidateSet> {
        if key.is_empty() {
            return None;
        }
        self.current()?.get(key)
    }

    /// Returns `true` if `key` has candidates in the current snapshot.
    #[must_use]
    pub fn contains(&self, key: &NormalizedKey) -> bool {
        self.current()
            .is_some_and(|snapshot| snapshot.entries.contains_key(key))
    }

    /// Drops the built index. The next [`init`](Self::init) rebuilds from
    /// the store's current snapshot.
    pub fn invalidate(&self) {
        let mut slot = self.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        if slot.take().is_some() {
            debug!("match index invalidated");
        }
    }

    #[must_use]
    pub fn state(&self) -> CacheState {
        if self.read().is_some() {
            CacheState::Warm
        } else {
            CacheState::Cold
        }
    }

    /// Number of distinct keys; 0 when Cold.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current().map_or(0, |snapshot| snapshot.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let builds = self.builds.load(Ordering::Acquire);
        match self.current() {
            Some(snapshot) => IndexStats {
                keys: snapshot.entries.len(),
                candidates: snapshot.candidates,
                skipped: snapshot.skipped,
                builds,
            },
            None => IndexStats {
                builds,
                ..IndexStats::default()
            },
        }
    }

    fn current(&self) -> Option<Arc<Snapshot>> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Arc<Snapshot>>> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Arc<Snapshot>>> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AnimeEntry, Library};

    fn library() -> Library {
        Library::from_entries(vec![
            AnimeEntry::new(1, "Steins;Gate").with_english("Steins;Gate"),
            AnimeEntry::new(2, "Steins;Gate 0").with_synonym("steins gate"),
            AnimeEntry::new(3, "Cowboy Bebop").with_japanese("カウボーイビバップ"),
            AnimeEntry::new(4, "").with_synonym("   ").with_synonym("---"),
        ])
        .unwrap()
    }

    fn key(s: &str) -> NormalizedKey {
        normalize(s)
    }

    #[test]
    fn starts_cold_and_find_misses() {
        let index = MatchIndex::new();
        assert_eq!(index.state(), CacheState::Cold);
        assert!(index.find(&key("Steins;Gate")).is_none());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn init_is_idempotent() {
        let index = MatchIndex::new();
        let store = library();
        assert!(index.init(&store));
        assert_eq!(index.state(), CacheState::Warm);
        assert!(!index.init(&store));
        assert_eq!(index.stats().builds, 1);
    }

    #[test]
    fn colliding_titles_share_a_key() {
        let index = MatchIndex::new();
        index.init(&library());

        let set = index.find(&key("STEINS GATE")).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(AnimeId(1)).unwrap().score, SCORE_PRIMARY);
        assert_eq!(set.get(AnimeId(2)).unwrap().score, SCORE_SYNONYM);
    }

    #[test]
    fn same_anime_keeps_best_score_per_key() {
        // Romaji and English normalize identically for id 1
        let index = MatchIndex::new();
        index.init(&library());
        let set = index.find(&key("steins;gate")).unwrap();
        let ids: Vec<_> = set.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![AnimeId(1), AnimeId(2)]);
        assert_eq!(set.get(AnimeId(1)).unwrap().score, SCORE_PRIMARY);
    }

    #[test]
    fn blank_titles_are_skipped_not_fatal() {
        let index = MatchIndex::new();
        index.init(&library());
        let stats = index.stats();
        // id 3 has blank English; id 1, 2 have blank Native; id 4 has three
        // unusable strings plus blank English and Native.
        assert!(stats.skipped >= 6, "skipped = {}", stats.skipped);
        assert!(index.find(&key("Cowboy Bebop")).is_some());
        assert!(index.find(&key("カウボーイビバップ")).is_some());
        assert!(index.find(&NormalizedKey::default()).is_none());
    }

    #[test]
    fn reserved_id_is_never_indexed() {
        let store = vec![AnimeEntry::new(0, "Ghost")];
        let index = MatchIndex::new();
        index.init(&store);
        assert!(index.find(&key("Ghost")).is_none());
        assert_eq!(index.stats().skipped, 3);
    }

    #[test]
    fn invalidate_then_init_sees_store_changes() {
        let store = library();
        let index = MatchIndex::new();
        index.init(&store);
        assert!(index.find(&key("Bebop")).is_none());

        assert!(store.add_user_synonym(AnimeId(3), "Bebop"));
        // Still the old snapshot until invalidated
        assert!(index.find(&key("Bebop")).is_none());

        index.invalidate();
        assert_eq!(index.state(), CacheState::Cold);
        assert!(index.init(&store));

        let set = index.find(&key("bebop")).unwrap();
        assert_eq!(set.as_slice(), &[MatchCandidate { id: AnimeId(3), score: SCORE_USER_SYNONYM }]);
        assert_eq!(index.stats().builds, 2);
    }

    #[test]
    fn lookup_builds_when_cold() {
        let store = library();
        let index = MatchIndex::new();
        let set = index.lookup(&store, &key("Cowboy Bebop")).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(index.state(), CacheState::Warm);
        assert!(index.lookup(&store, &key("Trigun")).is_none());
        assert!(index.lookup(&store, &NormalizedKey::default()).is_none());
        assert_eq!(index.stats().builds, 1);
    }

    /// Invalidates the index it feeds every time it is read.
    struct InvalidatingStore<'a> {
        index: &'a MatchIndex,
        entries: Vec<AnimeEntry>,
        reads: AtomicU64,
    }

    impl MetadataStore for InvalidatingStore<'_> {
        fn for_each_anime(&self, visit: &mut dyn FnMut(&AnimeEntry)) {
            self.reads.fetch_add(1, Ordering::Relaxed);
            self.index.invalidate();
            self.entries.for_each_anime(visit);
        }
    }

    #[test]
    fn continuous_invalidation_gives_up_without_installing() {
        let index = MatchIndex::new();
        let store = InvalidatingStore {
            index: &index,
            entries: vec![AnimeEntry::new(3, "Cowboy Bebop")],
            reads: AtomicU64::new(0),
        };

        let set = index.lookup(&store, &key("Cowboy Bebop")).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(store.reads.load(Ordering::Relaxed), u64::from(MAX_BUILD_ATTEMPTS));
        assert_eq!(index.state(), CacheState::Cold);
        assert_eq!(index.stats().builds, 0);

        assert!(!index.init(&store));
        assert_eq!(index.state(), CacheState::Cold);
    }

    #[test]
    fn custom_weights_apply() {
        let weights = TitleWeights {
            synonym: 2.0,
            ..TitleWeights::default()
        };
        let index = MatchIndex::with_weights(weights);
        index.init(&library());
        let set = index.find(&key("steins gate")).unwrap();
        assert_eq!(set.get(AnimeId(2)).unwrap().score, 2.0);
    }

    #[test]
    fn candidate_set_orders_by_id_and_dedups() {
        let set: CandidateSet = [
            MatchCandidate { id: AnimeId(9), score: 0.5 },
            MatchCandidate { id: AnimeId(2), score: 0.1 },
            MatchCandidate { id: AnimeId(9), score: 0.8 },
        ]
        .into_iter()
        .collect();
        let ids: Vec<_> = set.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![AnimeId(2), AnimeId(9)]);
        assert_eq!(set.get(AnimeId(9)).unwrap().score, 0.8);
    }

    #[test]
    fn concurrent_init_builds_once() {
        let store = Arc::new(library());
        let index = Arc::new(MatchIndex::new());

        let built: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let index = Arc::clone(&index);
                    let store = Arc::clone(&store);
                    scope.spawn(move || usize::from(index.init(&store)))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(built, 1);
        assert_eq!(index.stats().builds, 1);
    }

    #[test]
    fn lookups_never_see_partial_index_during_rebuilds() {
        let store = Arc::new(library());
        let index = Arc::new(MatchIndex::new());
        index.init(&store);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let index = Arc::clone(&index);
                scope.spawn(move || {
                    for _ in 0..200 {
                        // Either Cold (None) or a complete snapshot
                        if let Some(set) = index.find(&key("steins gate")) {
                            assert_eq!(set.len(), 2);
                        }
                    }
                });
            }
            let index = Arc::clone(&index);
            let store = Arc::clone(&store);
            scope.spawn(move || {
                for _ in 0..50 {
                    index.invalidate();
                    index.init(&store);
                }
            });
        });

        index.init(&store);
        assert_eq!(index.find(&key("steins gate")).unwrap().len(), 2);
    }
}
