//! # Metadata Store
//!
//! Read-only view of the anime library that the match index is derived from,
//! plus [`Library`], an in-memory store that can be loaded from JSON.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hakken_core::AnimeId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndexError, Result};

/// Where a title string came from. Drives its score in the match index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TitleKind {
    /// Main (romaji) title.
    Primary,
    /// Official English title.
    English,
    /// Native (Japanese) title.
    Native,
    /// Alternative title the user associated with the entry.
    UserSynonym,
    /// Curated alternative title.
    Synonym,
}

/// Display language preference for [`AnimeEntry::display_title`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TitleLanguage {
    #[default]
    Romaji,
    English,
    Native,
}

/// Title strings of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Titles {
    pub romaji: String,
    pub english: String,
    pub japanese: String,
    pub synonyms: Vec<String>,
}

/// One anime known to the library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeEntry {
    pub id: AnimeId,
    #[serde(default)]
    pub titles: Titles,
    #[serde(default)]
    pub user_synonyms: Vec<String>,
}

impl AnimeEntry {
    /// Creates an entry with only a primary title.
    #[must_use]
    pub fn new(id: impl Into<AnimeId>, romaji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            titles: Titles {
                romaji: romaji.into(),
                ..Titles::default()
            },
            user_synonyms: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_english(mut self, title: impl Into<String>) -> Self {
        self.titles.english = title.into();
        self
    }

    #[must_use]
    pub fn with_japanese(mut self, title: impl Into<String>) -> Self {
        self.titles.japanese = title.into();
        self
    }

    #[must_use]
    pub fn with_synonym(mut self, title: impl Into<String>) -> Self {
        self.titles.synonyms.push(title.into());
        self
    }

    #[must_use]
    pub fn with_user_synonym(mut self, title: impl Into<String>) -> Self {
        self.user_synonyms.push(title.into());
        self
    }

    /// Every title-like string of the entry with its kind, most
    /// authoritative first. Empty strings are included; the index skips them.
    pub fn titles(&self) -> impl Iterator<Item = (TitleKind, &str)> + '_ {
        [
            (TitleKind::Primary, self.titles.romaji.as_str()),
            (TitleKind::English, self.titles.english.as_str()),
            (TitleKind::Native, self.titles.japanese.as_str()),
        ]
        .into_iter()
        .chain(
            self.user_synonyms
                .iter()
                .map(|s| (TitleKind::UserSynonym, s.as_str())),
        )
        .chain(
            self.titles
                .synonyms
                .iter()
                .map(|s| (TitleKind::Synonym, s.as_str())),
        )
    }

    /// Title to show for this entry, falling back to romaji when the
    /// preferred language is missing.
    #[must_use]
    pub fn display_title(&self, language: TitleLanguage) -> &str {
        let preferred = match language {
            TitleLanguage::Romaji => &self.titles.romaji,
            TitleLanguage::English => &self.titles.english,
            TitleLanguage::Native => &self.titles.japanese,
        };
        if preferred.is_empty() {
            &self.titles.romaji
        } else {
            preferred
        }
    }
}

/// Read-only access to "all known anime".
///
/// The match index calls [`for_each_anime`](Self::for_each_anime) once per
/// build; implementations should present a consistent snapshot for the
/// duration of that call.
pub trait MetadataStore: Send + Sync {
    /// Visits every known entry.
    fn for_each_anime(&self, visit: &mut dyn FnMut(&AnimeEntry));
}

impl<S: MetadataStore + ?Sized> MetadataStore for &S {
    fn for_each_anime(&self, visit: &mut dyn FnMut(&AnimeEntry)) {
        (**self).for_each_anime(visit);
    }
}

impl<S: MetadataStore + ?Sized> MetadataStore for Arc<S> {
    fn for_each_anime(&self, visit: &mut dyn FnMut(&AnimeEntry)) {
        (**self).for_each_anime(visit);
    }
}

impl MetadataStore for [AnimeEntry] {
    fn for_each_anime(&self, visit: &mut dyn FnMut(&AnimeEntry)) {
        self.iter().for_each(visit);
    }
}

impl MetadataStore for Vec<AnimeEntry> {
    fn for_each_anime(&self, visit: &mut dyn FnMut(&AnimeEntry)) {
        self.as_slice().for_each_anime(visit);
    }
}

/// In-memory metadata store keyed by anime id.
///
/// Interior mutability lets a recognizer share the library (through an
/// `Arc`) with the code that edits it. Edits are not seen by an already
/// built index until it is invalidated.
#[derive(Debug, Default)]
pub struct Library {
    entries: RwLock<BTreeMap<AnimeId, AnimeEntry>>,
}

impl Library {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a library from a list of entries.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DuplicateId` if two entries share an id and
    /// `IndexError::ReservedId` if an entry uses id 0.
    pub fn from_entries(entries: impl IntoIterator<Item = AnimeEntry>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if entry.id.is_unknown() {
                return Err(IndexError::ReservedId);
            }
            let id = entry.id;
            if map.insert(id, entry).is_some() {
                return Err(IndexError::DuplicateId(id));
            }
        }
        Ok(Self {
            entries: RwLock::new(map),
        })
    }

    /// Parses a JSON array of entries.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Json` on malformed input, plus the errors of
    /// [`from_entries`](Self::from_entries).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<AnimeEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Loads a JSON library file.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Io` if the file cannot be read, plus the errors
    /// of [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let library = Self::from_json_str(&json)?;
        debug!(path = %path.display(), entries = library.len(), "loaded library");
        Ok(library)
    }

    /// Serializes the library as a JSON array ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::Json` if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        let entries: Vec<AnimeEntry> = self.read().values().cloned().collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Inserts or replaces an entry, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::ReservedId` for id 0.
    pub fn insert(&self, entry: AnimeEntry) -> Result<Option<AnimeEntry>> {
        if entry.id.is_unknown() {
            return Err(IndexError::ReservedId);
        }
        Ok(self.write().insert(entry.id, entry))
    }

    pub fn remove(&self, id: AnimeId) -> Option<AnimeEntry> {
        self.write().remove(&id)
    }

    /// Resolves an id into its entry, e.g. to display an identified title.
    #[must_use]
    pub fn get(&self, id: AnimeId) -> Option<AnimeEntry> {
        self.read().get(&id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: AnimeId) -> bool {
        self.read().contains_key(&id)
    }

    /// Adds a user synonym to an entry.
    ///
    /// Returns `false` if the entry does not exist, the synonym is blank, or
    /// the entry already has it.
    pub fn add_user_synonym(&self, id: AnimeId, synonym: impl Into<String>) -> bool {
        let synonym = synonym.into();
        if synonym.trim().is_empty() {
            return false;
        }
        let mut entries = self.write();
        let Some(entry) = entries.get_mut(&id) else {
            return false;
        };
        if entry.user_synonyms.contains(&synonym) {
            return false;
        }
        entry.user_synonyms.push(synonym);
        true
    }

    #[must_use]
    pub fn ids(&self) -> Vec<AnimeId> {
        self.read().keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<AnimeId, AnimeEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<AnimeId, AnimeEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetadataStore for Library {
    fn for_each_anime(&self, visit: &mut dyn FnMut(&AnimeEntry)) {
        self.read().values().for_each(visit);
    }
}
