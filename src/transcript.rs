//! Speaker detection for pasted workshop transcripts.
//!
//! A speaker marker is a single capitalized word (accents allowed) followed by a
//! colon at the start of an utterance: the start of a line, or right after
//! sentence punctuation. `Note:` and similar words are picked up as speakers too;
//! there is no way to tell them apart from names.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static SPEAKER_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^[ \t]*|[.!?;][ \t]+)(\p{Lu}\p{Ll}+):[ \t]*")
        .expect("speaker marker pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessedTranscript {
    pub speakers: BTreeSet<String>,
    /// Transcript with every `Name:` marker removed.
    pub cleaned_text: String,
}

pub fn preprocess(text: &str) -> PreprocessedTranscript {
    let speakers = SPEAKER_MARKER
        .captures_iter(text)
        .filter_map(|caps| caps.get(2).map(|m| m.as_str().to_string()))
        .collect();
    let cleaned_text = SPEAKER_MARKER.replace_all(text, "${1}").into_owned();

    PreprocessedTranscript {
        speakers,
        cleaned_text,
    }
}

/// Cuts `text` to at most `budget` characters (not bytes).
pub fn truncate_chars(text: &str, budget: usize) -> (&str, bool) {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}
