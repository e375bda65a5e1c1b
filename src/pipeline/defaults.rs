use crate::alignment::matching::match_text;
use crate::alignment::normalization::NormalizationTable;
use crate::error::AlignmentError;
use crate::pipeline::traits::{TextNormalizer, WindowMatcher};
use crate::types::MatchResult;

/// Normalizer backed by the built-in Arabic table.
pub struct ArabicNormalizer;

impl TextNormalizer for ArabicNormalizer {
    fn normalize(&self, text: &str) -> String {
        NormalizationTable::arabic().normalize(text)
    }
}

/// Normalizer over a caller-supplied table.
pub struct TableNormalizer {
    table: NormalizationTable,
}

impl TableNormalizer {
    pub fn new(table: NormalizationTable) -> Self {
        Self { table }
    }
}

impl TextNormalizer for TableNormalizer {
    fn normalize(&self, text: &str) -> String {
        self.table.normalize(text)
    }
}

pub struct FuzzyWindowMatcher;

impl WindowMatcher for FuzzyWindowMatcher {
    fn match_text(&self, source: &str, target: &str) -> Result<MatchResult, AlignmentError> {
        match_text(source, target)
    }
}
