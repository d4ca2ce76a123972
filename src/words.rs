//! Submitted words and the per-round word pool
//!
//! Every player submits words during setup. A round draws from a copy of the
//! full list; completing a word removes it from the round's pool, and once
//! the pool is empty the next round starts from a fresh shuffle.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::player::UserId;

/// A word and the player who submitted it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    /// The word text as submitted
    pub word: String,
    /// The submitting player
    pub user_id: UserId,
}

impl WordEntry {
    /// Creates an entry for `word` submitted by `user_id`
    pub fn new(word: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        Self {
            word: word.into(),
            user_id: user_id.into(),
        }
    }

    /// Whether both entries come from the same submitter with the same
    /// word, ignoring case and surrounding whitespace
    pub fn is_duplicate_of(&self, other: &WordEntry) -> bool {
        self.user_id == other.user_id && normalize(&self.word) == normalize(&other.word)
    }
}

/// Lowercases and trims a word for duplicate detection
pub fn normalize(word: &str) -> String {
    rustrict::trim_whitespace(word).to_lowercase()
}

/// Appends `entry` unless its submitter already submitted the same word
///
/// Returns `false` and leaves `words` untouched on a duplicate.
pub fn push_unique(words: &mut Vec<WordEntry>, entry: WordEntry) -> bool {
    if words.iter().any(|w| w.is_duplicate_of(&entry)) {
        return false;
    }
    words.push(entry);
    true
}

/// Removes the first entry with the same text and submitter
///
/// Returns whether anything was removed.
pub fn remove_first(words: &mut Vec<WordEntry>, entry: &WordEntry) -> bool {
    match words.iter().position(|w| w == entry) {
        Some(index) => {
            words.remove(index);
            true
        }
        None => false,
    }
}

/// A uniformly shuffled copy of `words`
pub fn shuffled(words: &[WordEntry]) -> Vec<WordEntry> {
    let mut pool = words.to_vec();
    fastrand::shuffle(&mut pool);
    pool
}

/// Entries submitted by `user_id`, in submission order
pub fn by_user<'a>(words: &'a [WordEntry], user_id: &UserId) -> Vec<&'a WordEntry> {
    words.iter().filter(|w| &w.user_id == user_id).collect_vec()
}
