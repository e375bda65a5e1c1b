use crate::error::AlignmentError;
use crate::types::MatchResult;

/// Canonicalizes text before matching.
///
/// The reference is normalized one whitespace-separated word at a time and
/// fragments are normalized whole. Both agree for normalizers that work
/// character by character; others still yield valid word offsets but may
/// match worse.
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> String;
}

pub trait WindowMatcher: Send + Sync {
    /// `source` and `target` are normalized text; the returned word index
    /// must lie within the source word sequence.
    fn match_text(&self, source: &str, target: &str) -> Result<MatchResult, AlignmentError>;
}
