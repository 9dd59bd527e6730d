//! Round score tally
//!
//! Reduces a finished score list into the numbers the results view shows.

use serde::{Deserialize, Serialize};

use crate::sim::{ScoreEntry, Verdict};

/// Summary of one round's verdicts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    /// Points: number of Correct verdicts
    pub correct_count: usize,
    pub pass_count: usize,
    pub total: usize,
    /// Entries in commit order
    pub entries: Vec<ScoreEntry>,
}

impl Tally {
    /// Check if nothing was guessed or passed
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Words guessed correctly, in order
    pub fn correct_words(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.status == Verdict::Correct)
            .map(|e| e.word.as_str())
    }
}

/// Tally a score list
pub fn tally(entries: &[ScoreEntry]) -> Tally {
    let correct_count = entries
        .iter()
        .filter(|e| e.status == Verdict::Correct)
        .count();
    Tally {
        correct_count,
        pass_count: entries.len() - correct_count,
        total: entries.len(),
        entries: entries.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(word: &str, status: Verdict) -> ScoreEntry {
        ScoreEntry {
            word: word.to_string(),
            status,
        }
    }

    #[test]
    fn test_empty() {
        let t = tally(&[]);
        assert_eq!(t, Tally::default());
        assert!(t.is_empty());
    }

    #[test]
    fn test_counts() {
        let list = vec![
            entry("A", Verdict::Correct),
            entry("B", Verdict::Pass),
            entry("C", Verdict::Correct),
        ];
        let t = tally(&list);
        assert_eq!(t.correct_count, 2);
        assert_eq!(t.pass_count, 1);
        assert_eq!(t.total, 3);
        assert_eq!(t.entries, list);
        assert_eq!(t.correct_words().collect::<Vec<_>>(), vec!["A", "C"]);
    }

    fn verdict() -> impl Strategy<Value = Verdict> {
        prop_oneof![Just(Verdict::Correct), Just(Verdict::Pass)]
    }

    proptest! {
        #[test]
        fn prop_tally_is_pure(statuses in proptest::collection::vec(verdict(), 0..50)) {
            let list: Vec<_> = statuses
                .iter()
                .enumerate()
                .map(|(i, &s)| entry(&format!("w{i}"), s))
                .collect();
            let before = list.clone();

            let a = tally(&list);
            let b = tally(&list);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(&list, &before);
            prop_assert!(a.correct_count <= a.total);
            prop_assert_eq!(a.correct_count + a.pass_count, a.total);
        }
    }
}
