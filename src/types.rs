use serde::{Deserialize, Serialize};

/// One verse of the reference text, as supplied by the reference provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    /// 1-based verse number, contiguous within a [`crate::ReferenceText`].
    pub id: u32,
    /// Space-separated words in the source alphabet.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    /// Provider audio timing for this verse, used when no transcript is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<VerseTiming>,
}

impl Verse {
    /// Ground-truth word count of the verse as the renderer indexes it.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseTiming {
    pub start_ms: u64,
    pub end_ms: u64,
    /// Raw provider rows: `[word_number (1-based), start_ms, end_ms]`.
    #[serde(default)]
    pub segments: Vec<Vec<u64>>,
}

/// One transcribed word. Interval is `[start_ms, end_ms]` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptWord {
    /// Position of the word inside its fragment.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Raw, possibly noisy text of the fragment.
    pub text: String,
    pub words: Vec<TranscriptWord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Zero-based index of the first matched word in the source word sequence.
    pub word_index: usize,
    /// Character offset of that word inside the source string.
    pub char_index: usize,
    /// Window score in [0, 1].
    pub accuracy: f64,
    /// The matched source words joined with single spaces.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedWord {
    /// Word index within the verse.
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// A verse occurrence with word timings attached.
///
/// A verse spoken across two transcript fragments yields two records with the
/// same verse id; see [`crate::alignment::realign::merge_split_verses`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedVerse {
    #[serde(flatten)]
    pub verse: Verse,
    pub start_ms: u64,
    pub end_ms: u64,
    pub words: Vec<AlignedWord>,
}

impl AlignedVerse {
    pub fn id(&self) -> u32 {
        self.verse.id
    }
}

/// Where one transcript fragment landed in the reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentMatch {
    pub fragment_index: usize,
    /// `None` when the fragment text normalizes to nothing and was placed at
    /// the running position without matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchResult>,
    pub verse_id: u32,
    pub word_offset: usize,
    pub word_count: usize,
    /// The match started before the position reached by the previous fragment.
    pub backward: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealignmentOutput {
    pub verses: Vec<AlignedVerse>,
    pub matches: Vec<FragmentMatch>,
}
