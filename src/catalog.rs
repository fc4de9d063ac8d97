use std::collections::HashMap;

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// Passages shorter than this are repeated until they reach it.
pub const MIN_PASSAGE_LEN: usize = 500;

/// Used only when even the fallback category has no text.
const LAST_RESORT_TEXT: &str = "the quick brown fox jumps over the lazy dog";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Category {
    Plain,
    NumbersAndPunctuation,
    SpecialCharacters,
    Quotes,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Plain,
        Category::NumbersAndPunctuation,
        Category::SpecialCharacters,
        Category::Quotes,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub const ALL: [Size; 3] = [Size::Small, Size::Medium, Size::Large];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.to_string() == key)
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

pub const FALLBACK_CATEGORY: Category = Category::Plain;
pub const FALLBACK_SIZE: Size = Size::Medium;

/// Supplies raw passage text for a category and size. Never fails.
pub trait PassageSource {
    fn get_passage(&self, category: Category, size: Size) -> String;
}

/// Always returns the same text, whatever is asked for.
#[derive(Debug, Clone)]
pub struct FixedPassage(pub String);

impl PassageSource for FixedPassage {
    fn get_passage(&self, _category: Category, _size: Size) -> String {
        self.0.clone()
    }
}

/// Passage lists keyed by category and size.
#[derive(Debug, Clone)]
pub struct PassageCatalog {
    entries: HashMap<(Category, Size), Vec<String>>,
    min_len: usize,
}

impl PassageCatalog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            min_len: MIN_PASSAGE_LEN,
        }
    }

    /// Catalog built from the JSON files compiled into the binary. A file that
    /// is missing or malformed leaves its category empty.
    pub fn embedded() -> Self {
        let mut catalog = Self::new();
        for category in Category::ALL {
            let file_name = format!("{category}.json");
            let Some(contents) = PASSAGE_DIR
                .get_file(&file_name)
                .and_then(|f| f.contents_utf8())
            else {
                warn!("passage file {file_name} not found");
                continue;
            };
            if let Err(err) = catalog.load_category_json(category, contents) {
                warn!("unable to parse passage file {file_name}: {err}");
            }
        }
        catalog
    }

    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    pub fn insert(&mut self, category: Category, size: Size, texts: Vec<String>) {
        self.entries.insert((category, size), texts);
    }

    /// Load `{"small": [...], "medium": [...], "large": [...]}` for one category.
    pub fn load_category_json(
        &mut self,
        category: Category,
        json: &str,
    ) -> Result<(), serde_json::Error> {
        let by_size: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        for (key, texts) in by_size {
            match Size::from_key(&key) {
                Some(size) => self.insert(category, size, texts),
                None => warn!("ignoring unknown passage size {key:?} in {category}"),
            }
        }
        Ok(())
    }

    pub fn texts(&self, category: Category, size: Size) -> Option<&[String]> {
        self.entries
            .get(&(category, size))
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }
}

impl Default for PassageCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PassageSource for PassageCatalog {
    fn get_passage(&self, category: Category, size: Size) -> String {
        let list = match self.texts(category, size) {
            Some(list) => list,
            None => {
                warn!(
                    "no passages for {category}/{size}, using {FALLBACK_CATEGORY}/{FALLBACK_SIZE} fallback"
                );
                match self.texts(FALLBACK_CATEGORY, FALLBACK_SIZE) {
                    Some(list) => list,
                    None => return pad_to_length(LAST_RESORT_TEXT, self.min_len),
                }
            }
        };

        let base = list
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(LAST_RESORT_TEXT);
        debug!(%category, %size, base_len = base.len(), "selected passage");
        pad_to_length(base, self.min_len)
    }
}

/// Repeat `base`, joined by single spaces, until it is at least `min_len`
/// characters long.
pub fn pad_to_length(base: &str, min_len: usize) -> String {
    let mut out = base.to_string();
    if base.is_empty() {
        return out;
    }
    while out.chars().count() < min_len {
        out.push(' ');
        out.push_str(base);
    }
    out
}
