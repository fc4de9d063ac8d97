use crate::normalize::{collapse_whitespace, normalize_passage};

/// Normalized text a session is typed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    text: String,
    chars: Vec<char>,
}

impl Passage {
    pub fn new(raw: &str) -> Self {
        let text = collapse_whitespace(&normalize_passage(raw));
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl std::fmt::Display for Passage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
