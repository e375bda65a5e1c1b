use crate::alignment::realign::{merge_split_verses, realign_fragment, VerseCursor, VerseLayout};
use crate::config::RealignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::{ArabicNormalizer, FuzzyWindowMatcher};
use crate::pipeline::traits::{TextNormalizer, WindowMatcher};
use crate::reference::ReferenceText;
use crate::types::{FragmentMatch, RealignmentOutput, TranscriptFragment};

pub struct Realigner {
    config: RealignerConfig,
    normalizer: Box<dyn TextNormalizer>,
    matcher: Box<dyn WindowMatcher>,
}

pub(crate) struct RealignerParts {
    pub config: RealignerConfig,
    pub normalizer: Box<dyn TextNormalizer>,
    pub matcher: Box<dyn WindowMatcher>,
}

impl Realigner {
    pub(crate) fn from_parts(parts: RealignerParts) -> Self {
        Self {
            config: parts.config,
            normalizer: parts.normalizer,
            matcher: parts.matcher,
        }
    }

    pub fn config(&self) -> &RealignerConfig {
        &self.config
    }

    /// Locates every fragment in `reference` and attaches its word timings to
    /// the verses it covers.
    ///
    /// Fragments are processed strictly in order. Any error aborts the whole
    /// call; no partial output is returned.
    pub fn realign(
        &self,
        reference: &ReferenceText,
        fragments: &[TranscriptFragment],
    ) -> Result<RealignmentOutput, AlignmentError> {
        let layout = VerseLayout::new(reference, |text| self.normalizer.normalize(text));
        let mut cursor = VerseCursor::default();
        let mut verses = Vec::new();
        let mut matches = Vec::with_capacity(fragments.len());

        for (fragment_index, fragment) in fragments.iter().enumerate() {
            if fragment.text.trim().is_empty() {
                return Err(AlignmentError::empty("fragment text"));
            }

            let target = self.normalizer.normalize(&fragment.text);
            let (start, matched) = if target.is_empty() {
                // nothing to match on: continue where the previous fragment stopped
                let start = layout.settle(cursor);
                tracing::debug!(
                    fragment_index,
                    verse_id = layout.verse_id(start.verse_index),
                    word_offset = start.word_offset,
                    "realign: fragment normalizes to nothing, placed at cursor"
                );
                (start, None)
            } else {
                let matched = self.matcher.match_text(layout.normalized_text(), &target)?;
                let located = layout.locate(matched.word_index).ok_or_else(|| {
                    AlignmentError::invalid_input(format!(
                        "fragment {fragment_index} matched word {} outside the reference",
                        matched.word_index
                    ))
                })?;
                let leading_silent = fragment
                    .text
                    .split_whitespace()
                    .take_while(|word| self.normalizer.normalize(word).is_empty())
                    .count();
                let start = layout.rewind(located, leading_silent);

                tracing::debug!(
                    fragment_index,
                    word_index = matched.word_index,
                    char_index = matched.char_index,
                    verse_id = layout.verse_id(start.verse_index),
                    word_offset = start.word_offset,
                    leading_silent,
                    accuracy = format!("{:.3}", matched.accuracy),
                    "realign: fragment located"
                );
                if matched.accuracy < self.config.low_accuracy_threshold {
                    tracing::warn!(
                        fragment_index,
                        verse_id = layout.verse_id(start.verse_index),
                        accuracy = format!("{:.3}", matched.accuracy),
                        threshold = self.config.low_accuracy_threshold,
                        matched_text = matched.text.as_str(),
                        "realign: low-confidence match"
                    );
                }
                (start, Some(matched))
            };

            let verse_id = layout.verse_id(start.verse_index);
            let backward = start < cursor;
            if backward {
                tracing::warn!(
                    fragment_index,
                    verse_id,
                    word_offset = start.word_offset,
                    "realign: fragment matched before the previous fragment's end"
                );
            }

            let step = realign_fragment(&layout, start, fragment_index, fragment)?;
            matches.push(FragmentMatch {
                fragment_index,
                matched,
                verse_id,
                word_offset: start.word_offset,
                word_count: fragment.words.len(),
                backward,
            });
            verses.extend(step.verses);
            cursor = step.cursor;
        }

        if self.config.merge_split_verses {
            verses = merge_split_verses(verses);
        }
        Ok(RealignmentOutput { verses, matches })
    }
}

impl Default for Realigner {
    fn default() -> Self {
        Self::from_parts(RealignerParts {
            config: RealignerConfig::default(),
            normalizer: Box::new(ArabicNormalizer),
            matcher: Box::new(FuzzyWindowMatcher),
        })
    }
}
