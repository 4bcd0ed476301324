//! # Library Scanner
//!
//! Identifies every file of a library folder. Results are memoized per file
//! name, so rescanning a folder only pays for files that were added since.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use hakken_core::{AnimeId, ElementKind, HeuristicTokenizer, Tokenizer};
use hakken_index::{Library, MetadataStore};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::recognizer::{Recognition, Recognizer};

/// One scanned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    /// File name as given to the scanner
    pub name: String,
    /// Extracted title, empty if none was found
    pub title: String,
    /// Extracted episode number or range
    pub episode: Option<String>,
    /// Identified anime, `None` when unknown
    pub anime_id: Option<AnimeId>,
}

impl ScanEntry {
    fn from_recognition(name: &str, recognition: &Recognition) -> Self {
        Self {
            name: name.to_string(),
            title: recognition.episode.title().to_string(),
            episode: recognition
                .episode
                .find(ElementKind::Episode)
                .map(str::to_string),
            anime_id: recognition.anime_id,
        }
    }
}

/// Parallel, memoizing driver over a [`Recognizer`].
#[derive(Debug)]
pub struct Scanner<T = HeuristicTokenizer, S = Library> {
    recognizer: Recognizer<T, S>,
    memo: RwLock<HashMap<String, ScanEntry>>,
}

impl<T: Tokenizer, S: MetadataStore> Scanner<T, S> {
    pub fn new(recognizer: Recognizer<T, S>) -> Self {
        Self {
            recognizer,
            memo: RwLock::default(),
        }
    }

    pub fn recognizer(&self) -> &Recognizer<T, S> {
        &self.recognizer
    }

    /// Identifies `names` in parallel. Output order matches input order.
    pub fn scan<N>(&self, names: &[N]) -> Vec<ScanEntry>
    where
        N: AsRef<str> + Sync,
    {
        let entries: Vec<ScanEntry> = names
            .par_iter()
            .map(|name| self.scan_one(name.as_ref()))
            .collect();

        debug!(
            files = entries.len(),
            identified = entries.iter().filter(|e| e.anime_id.is_some()).count(),
            "scan finished"
        );
        entries
    }

    /// Scans the files directly inside `dir`, sorted by name.
    /// Subdirectories and names that are not valid UTF-8 are skipped.
    pub fn scan_dir(&self, dir: impl AsRef<Path>) -> io::Result<Vec<ScanEntry>> {
        let dir = dir.as_ref();
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => trace!(?name, "skipping non UTF-8 file name"),
            }
        }
        names.sort_unstable();

        debug!(dir = %dir.display(), files = names.len(), "scanning directory");
        Ok(self.scan(&names))
    }

    /// Forgets memoized results. Call after the store changed.
    pub fn clear(&self) {
        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Invalidates the recognizer's match index and forgets memoized results.
    pub fn invalidate(&self) {
        self.recognizer.invalidate();
        self.clear();
    }

    /// Number of memoized file names.
    pub fn memoized(&self) -> usize {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn scan_one(&self, name: &str) -> ScanEntry {
        if let Some(entry) = self
            .memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return entry.clone();
        }

        let entry = ScanEntry::from_recognition(name, &self.recognizer.recognize(name));
        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), entry.clone());
        entry
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use hakken_index::AnimeEntry;

    use super::*;

    fn scanner() -> Scanner {
        let library = Library::from_entries(vec![
            AnimeEntry::new(1, "Steins;Gate"),
            AnimeEntry::new(3, "Cowboy Bebop"),
        ])
        .unwrap();
        Scanner::new(Recognizer::new(library).unwrap())
    }

    #[test]
    fn scan_preserves_order_and_identifies() {
        let s = scanner();
        let names = [
            "[Group] Cowboy Bebop - 05 [1080p].mkv",
            "Unknown Show 01.mkv",
            "[Group] Steins Gate - 01 [1080p].mkv",
        ];
        let entries = s.scan(&names);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, names[0]);
        assert_eq!(entries[0].title, "Cowboy Bebop");
        assert_eq!(entries[0].episode.as_deref(), Some("05"));
        assert_eq!(entries[0].anime_id, Some(AnimeId(3)));
        assert_eq!(entries[1].anime_id, None);
        assert_eq!(entries[2].anime_id, Some(AnimeId(1)));
    }

    #[test]
    fn results_are_memoized_until_cleared() {
        let s = scanner();
        let names = ["[Group] Cowboy Bebop - 05 [1080p].mkv", "Unknown Show 01.mkv"];
        s.scan(&names);
        assert_eq!(s.memoized(), 2);

        s.scan(&names);
        assert_eq!(s.memoized(), 2);
        assert_eq!(s.recognizer().index().stats().builds, 1);

        s.clear();
        assert_eq!(s.memoized(), 0);
    }

    #[test]
    fn invalidate_picks_up_new_synonyms() {
        let s = scanner();
        let names = ["Unknown Show 01.mkv"];
        assert_eq!(s.scan(&names)[0].anime_id, None);

        assert!(s.recognizer().store().add_user_synonym(AnimeId(3), "Unknown Show"));
        assert_eq!(s.scan(&names)[0].anime_id, None, "memoized");

        s.invalidate();
        assert_eq!(s.scan(&names)[0].anime_id, Some(AnimeId(3)));
    }

    #[test]
    fn scan_dir_lists_files_only() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("[Group] Steins Gate - 01 [1080p].mkv")).unwrap();
        File::create(dir.path().join("Unknown Show 01.mkv")).unwrap();
        fs::create_dir(dir.path().join("[Group] Cowboy Bebop - 05 [1080p]")).unwrap();

        let entries = scanner().scan_dir(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Unknown Show 01.mkv", "[Group] Steins Gate - 01 [1080p].mkv"]
        );
        assert_eq!(entries[1].anime_id, Some(AnimeId(1)));
    }

    #[test]
    fn scan_dir_missing_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scanner().scan_dir(dir.path().join("missing")).is_err());
    }

    #[test]
    fn empty_scan() {
        let names: [&str; 0] = [];
        assert!(scanner().scan(&names).is_empty());
    }
}
