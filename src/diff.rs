use crate::normalize::normalize_char;
use crate::passage::Passage;

/// Classification of a single passage position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CharResult {
    #[default]
    Unclassified,
    Correct,
    Incorrect,
}

impl CharResult {
    pub fn is_classified(self) -> bool {
        self != CharResult::Unclassified
    }
}

/// Result of diffing the full input buffer against a passage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    /// One entry per passage character.
    pub results: Vec<CharResult>,
    pub correct: usize,
    pub total_typed: usize,
    /// Index of the next character to type. Equal to the passage length once
    /// the passage is complete.
    pub cursor: usize,
}

impl Classification {
    pub fn empty(passage: &Passage) -> Self {
        Self {
            results: vec![CharResult::Unclassified; passage.len()],
            correct: 0,
            total_typed: 0,
            cursor: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.results.len()
    }

    /// Counts over the leading run of classified characters, stopping at the
    /// first unclassified position. Returns `(correct, total)`.
    pub fn prefix_counts(&self) -> (usize, usize) {
        self.results
            .iter()
            .take_while(|r| r.is_classified())
            .fold((0, 0), |(correct, total), r| match r {
                CharResult::Correct => (correct + 1, total + 1),
                _ => (correct, total + 1),
            })
    }
}

/// Classify `typed` against `passage` from scratch.
///
/// Input beyond the passage length is ignored. Positions not yet typed are
/// left unclassified, which is what makes deletions un-mark correctly.
pub fn classify(passage: &Passage, typed: &str) -> Classification {
    let mut out = Classification::empty(passage);

    for (idx, (typed_char, expected)) in typed.chars().zip(passage.chars()).enumerate() {
        if normalize_char(typed_char) == normalize_char(*expected) {
            out.results[idx] = CharResult::Correct;
            out.correct += 1;
        } else {
            out.results[idx] = CharResult::Incorrect;
        }
        out.total_typed += 1;
    }
    out.cursor = out.total_typed;

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use CharResult::*;

    #[test]
    fn test_classify_empty_input() {
        let p = Passage::new("abcd");
        let c = classify(&p, "");
        assert_eq!(c.results, vec![Unclassified; 4]);
        assert_eq!((c.correct, c.total_typed, c.cursor), (0, 0, 0));
        assert!(!c.is_complete());
    }

    #[test]
    fn test_classify_with_error() {
        let p = Passage::new("abcd");
        let c = classify(&p, "abXd");
        assert_eq!(c.results, vec![Correct, Correct, Incorrect, Correct]);
        assert_eq!(c.correct, 3);
        assert_eq!(c.total_typed, 4);
        assert_eq!(c.cursor, 4);
        assert!(c.is_complete());
    }

    #[test]
    fn test_classify_partial() {
        let p = Passage::new("the cat");
        let c = classify(&p, "thx");
        assert_eq!(&c.results[..4], &[Correct, Correct, Incorrect, Unclassified]);
        assert_eq!(c.cursor, 3);
        assert_eq!(c.total_typed, 3);
        assert_eq!(c.correct, 2);
    }

    #[test]
    fn test_classify_input_longer_than_passage() {
        let p = Passage::new("ab");
        let c = classify(&p, "abcdef");
        assert_eq!(c.results, vec![Correct, Correct]);
        assert_eq!(c.cursor, 2);
        assert_eq!(c.total_typed, 2);
        assert!(c.is_complete());
    }

    #[test]
    fn test_classify_normalizes_both_sides() {
        let p = Passage::new("it’s");
        // passage is normalized on load already
        assert_eq!(p.as_str(), "it's");
        assert_eq!(classify(&p, "it'").results[2], Correct);
        assert_eq!(classify(&p, "it’").results[2], Correct);
        assert_eq!(classify(&p, "it‘").results[2], Correct);
    }

    #[test]
    fn test_classify_non_ascii_input_is_incorrect() {
        let p = Passage::new("cafe");
        assert_eq!(classify(&p, "café").results[3], Incorrect);
    }

    #[test]
    fn test_classify_idempotent() {
        let p = Passage::new("the quick brown fox");
        for input in ["", "t", "the q", "thw quick", "the quick brown fox"] {
            let a = classify(&p, input);
            let b = classify(&p, input);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_classify_deletion_restores_prefix_state() {
        let p = Passage::new("hello world");
        let long = "helo wor";
        let full = classify(&p, long);
        for cut in 0..long.len() {
            let after_delete = classify(&p, &long[..cut]);

            assert_eq!(after_delete.results[..cut], full.results[..cut]);
            assert!(after_delete.results[cut..]
                .iter()
                .all(|r| *r == Unclassified));
            let correct = full.results[..cut].iter().filter(|r| **r == Correct).count();
            assert_eq!(after_delete.correct, correct);
            assert_eq!(after_delete.total_typed, cut);
            assert_eq!(after_delete.cursor, cut);
        }
    }

    #[test]
    fn test_classified_iff_below_cursor() {
        let p = Passage::new("abcdefgh");
        let c = classify(&p, "abxd");
        for (i, r) in c.results.iter().enumerate() {
            assert_eq!(r.is_classified(), i < c.cursor);
        }
    }

    #[test]
    fn test_prefix_counts() {
        let p = Passage::new("abcd");
        let c = classify(&p, "abXd");
        assert_eq!(c.prefix_counts(), (3, 4));

        let mut gapped = classify(&p, "ab");
        gapped.results[3] = Correct;
        assert_eq!(gapped.prefix_counts(), (2, 2));
    }

    #[test]
    fn test_empty_passage_is_complete() {
        let p = Passage::new("");
        let c = classify(&p, "anything");
        assert!(c.is_complete());
        assert_eq!(c.total_typed, 0);
    }
}
