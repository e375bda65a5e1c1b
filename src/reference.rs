use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;
use crate::types::{AlignedVerse, AlignedWord, Verse};

/// Ordered, validated verses of one reference chapter. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceText {
    chapter_id: Option<u32>,
    verses: Vec<Verse>,
}

#[derive(Debug, Deserialize)]
struct ReferenceDocument {
    #[serde(default)]
    chapter_id: Option<u32>,
    verses: Vec<Verse>,
}

impl ReferenceText {
    pub fn new(chapter_id: Option<u32>, verses: Vec<Verse>) -> Result<Self, AlignmentError> {
        if verses.is_empty() {
            return Err(AlignmentError::empty("reference verses"));
        }
        for pair in verses.windows(2) {
            if pair[1].id != pair[0].id + 1 {
                return Err(AlignmentError::invalid_input(format!(
                    "verse ids must be contiguous: {} is followed by {}",
                    pair[0].id, pair[1].id
                )));
            }
        }
        if let Some(verse) = verses.iter().find(|v| v.text.trim().is_empty()) {
            return Err(AlignmentError::invalid_input(format!(
                "verse {} has no words",
                verse.id
            )));
        }
        Ok(Self { chapter_id, verses })
    }

    pub fn from_json_str(data: &str) -> Result<Self, AlignmentError> {
        let doc: ReferenceDocument = serde_json::from_str(data)
            .map_err(|e| AlignmentError::json("parse reference text", e))?;
        Self::new(doc.chapter_id, doc.verses)
    }

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read reference text", e))?;
        Self::from_json_str(&data)
    }

    pub fn chapter_id(&self) -> Option<u32> {
        self.chapter_id
    }

    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Total ground-truth word count over all verses.
    pub fn word_count(&self) -> usize {
        self.verses.iter().map(Verse::word_count).sum()
    }

    /// Verse texts joined with single spaces, in verse order.
    pub fn joined_text(&self) -> String {
        self.verses
            .iter()
            .map(|v| v.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Keeps verses with ids in `from..=to`.
    ///
    /// `0` names the last verse and negative values count back from it, so
    /// `select_range(1, 0)` keeps everything and `select_range(-1, 0)` keeps
    /// the last two verses.
    pub fn select_range(&self, from: i64, to: i64) -> Result<Self, AlignmentError> {
        let last_id = i64::from(self.verses[self.verses.len() - 1].id);
        let resolve = |n: i64| if n <= 0 { last_id + n } else { n };
        let (from, to) = (resolve(from), resolve(to));

        let verses: Vec<Verse> = self
            .verses
            .iter()
            .filter(|v| (from..=to).contains(&i64::from(v.id)))
            .cloned()
            .collect();
        if verses.is_empty() {
            return Err(AlignmentError::invalid_input(format!(
                "verse range {from}..={to} selects no verses"
            )));
        }
        Self::new(self.chapter_id, verses)
    }
}

/// Builds aligned records straight from the provider's own audio timings.
///
/// Used when no transcript is available. Provider word numbers are 1-based;
/// rows shorter than `[word, start, end]` are skipped.
pub fn provider_timings(reference: &ReferenceText) -> Result<Vec<AlignedVerse>, AlignmentError> {
    reference
        .verses()
        .iter()
        .map(|verse| {
            let timing = verse.timing.as_ref().ok_or_else(|| {
                AlignmentError::invalid_input(format!("verse {} has no provider timing", verse.id))
            })?;
            if timing.start_ms > timing.end_ms {
                return Err(AlignmentError::invalid_input(format!(
                    "verse {} timing starts after it ends ({} > {})",
                    verse.id, timing.start_ms, timing.end_ms
                )));
            }

            let mut words = Vec::with_capacity(timing.segments.len());
            for row in timing.segments.iter().filter(|row| row.len() >= 3) {
                let index = row[0].checked_sub(1).ok_or_else(|| {
                    AlignmentError::invalid_input(format!(
                        "verse {} has a timing row with word number 0",
                        verse.id
                    ))
                })?;
                words.push(AlignedWord {
                    index: index as usize,
                    start_ms: row[1],
                    end_ms: row[2],
                });
            }

            Ok(AlignedVerse {
                verse: verse.clone(),
                start_ms: timing.start_ms,
                end_ms: timing.end_ms,
                words,
            })
        })
        .collect()
}
