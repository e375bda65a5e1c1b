use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::alignment::normalization::normalized_words;
use crate::error::AlignmentError;
use crate::pipeline::runtime::Realigner;
use crate::reference::ReferenceText;
use crate::types::{AlignedVerse, AlignedWord, TranscriptFragment, TranscriptWord};

/// Position inside the reference: verse (by position, not id) and word within it.
///
/// Ordering is reading order, so a later position compares greater.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct VerseCursor {
    pub verse_index: usize,
    pub word_offset: usize,
}

/// Word geometry of every verse, computed once per realignment.
///
/// The reference is normalized one raw word at a time, so every normalized
/// word knows the raw word it came from. Raw words that normalize to nothing
/// (e.g. "مع" or "حمٓ") own no normalized position but still occupy a word
/// offset in their verse.
#[derive(Debug, Clone)]
pub struct VerseLayout<'a> {
    reference: &'a ReferenceText,
    normalized_text: String,
    /// Per verse: raw word offset of each normalized word, in order.
    raw_offsets: Vec<Vec<usize>>,
    /// Ground-truth word counts; word offsets handed to the renderer use these.
    word_counts: Vec<usize>,
}

impl<'a> VerseLayout<'a> {
    pub fn new(reference: &'a ReferenceText, normalize: impl Fn(&str) -> String) -> Self {
        let mut normalized_words_all: Vec<String> = Vec::new();
        let mut raw_offsets = Vec::with_capacity(reference.len());
        for verse in reference.verses() {
            let mut offsets = Vec::new();
            for (raw_offset, raw_word) in verse.text.split_whitespace().enumerate() {
                let normalized = normalize(raw_word);
                for word in normalized_words(&normalized) {
                    offsets.push(raw_offset);
                    normalized_words_all.push(word.to_string());
                }
            }
            raw_offsets.push(offsets);
        }
        let word_counts = reference.verses().iter().map(|v| v.word_count()).collect();

        Self {
            reference,
            normalized_text: normalized_words_all.join(" "),
            raw_offsets,
            word_counts,
        }
    }

    pub fn reference(&self) -> &'a ReferenceText {
        self.reference
    }

    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    pub fn len(&self) -> usize {
        self.word_counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_counts.is_empty()
    }

    pub fn verse_id(&self, verse_index: usize) -> u32 {
        self.reference.verses()[verse_index].id
    }

    pub fn word_count(&self, verse_index: usize) -> usize {
        self.word_counts[verse_index]
    }

    /// Number of normalized words the verse contributes to the flat sequence.
    pub fn normalized_count(&self, verse_index: usize) -> usize {
        self.raw_offsets[verse_index].len()
    }

    /// Translates a flat index into the normalized word sequence into the
    /// verse that owns it and the raw word offset inside that verse.
    ///
    /// Verses whose text normalizes to nothing own no flat positions and are
    /// skipped. Returns `None` past the last word.
    pub fn locate(&self, flat_index: usize) -> Option<VerseCursor> {
        let mut remaining = flat_index;
        for (verse_index, offsets) in self.raw_offsets.iter().enumerate() {
            if let Some(&word_offset) = offsets.get(remaining) {
                return Some(VerseCursor {
                    verse_index,
                    word_offset,
                });
            }
            remaining -= offsets.len();
        }
        None
    }

    /// Moves a cursor that sits past the end of a verse onto the first word
    /// of the next verse. The last verse is never left.
    pub fn settle(&self, cursor: VerseCursor) -> VerseCursor {
        let mut cursor = cursor;
        while cursor.verse_index + 1 < self.len()
            && cursor.word_offset >= self.word_counts[cursor.verse_index]
        {
            cursor = VerseCursor {
                verse_index: cursor.verse_index + 1,
                word_offset: 0,
            };
        }
        cursor
    }

    /// Moves `cursor` back by `words` raw words, crossing into earlier verses
    /// as needed. Stops at the first word of the reference.
    pub fn rewind(&self, cursor: VerseCursor, words: usize) -> VerseCursor {
        let mut cursor = cursor;
        let mut left = words;
        while left > 0 {
            if cursor.word_offset >= left {
                cursor.word_offset -= left;
                break;
            }
            left -= cursor.word_offset;
            if cursor.verse_index == 0 {
                cursor.word_offset = 0;
                break;
            }
            cursor.verse_index -= 1;
            cursor.word_offset = self.word_counts[cursor.verse_index];
        }
        cursor
    }
}

/// Result of placing one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentStep {
    /// Position right after the fragment's last word.
    pub cursor: VerseCursor,
    pub verses: Vec<AlignedVerse>,
}

/// Places the words of one fragment starting at `start`.
///
/// Words are assigned to consecutive word offsets; when the current verse is
/// full the words gathered so far are emitted as one record and placement
/// continues at word 0 of the next verse. Whatever is gathered when the
/// fragment ends is emitted too, even if the verse is not complete.
pub fn realign_fragment(
    layout: &VerseLayout<'_>,
    start: VerseCursor,
    fragment_index: usize,
    fragment: &TranscriptFragment,
) -> Result<FragmentStep, AlignmentError> {
    validate_words(fragment_index, &fragment.words)?;
    let verse_total = layout.len();
    if start.verse_index >= verse_total {
        return Err(AlignmentError::invalid_input(format!(
            "fragment {fragment_index} starts at verse position {} but the reference has {verse_total} verses",
            start.verse_index
        )));
    }

    let mut cursor = start;
    let mut verses = Vec::new();
    let mut pending: Vec<AlignedWord> = Vec::new();

    for (placed, word) in fragment.words.iter().enumerate() {
        if cursor.word_offset >= layout.word_count(cursor.verse_index) {
            flush(layout, cursor.verse_index, &mut pending, &mut verses);
            if cursor.verse_index + 1 >= verse_total {
                return Err(AlignmentError::ReferenceExhausted {
                    fragment_index,
                    verse_id: layout.verse_id(cursor.verse_index),
                    assigned_words: placed,
                });
            }
            cursor = VerseCursor {
                verse_index: cursor.verse_index + 1,
                word_offset: 0,
            };
        }

        pending.push(AlignedWord {
            index: cursor.word_offset,
            start_ms: word.start_ms,
            end_ms: word.end_ms,
        });
        cursor.word_offset += 1;
    }
    flush(layout, cursor.verse_index, &mut pending, &mut verses);

    Ok(FragmentStep { cursor, verses })
}

/// Realigns `fragments` onto `reference` with the default pipeline.
pub fn realign(
    reference: &ReferenceText,
    fragments: &[TranscriptFragment],
) -> Result<Vec<AlignedVerse>, AlignmentError> {
    Realigner::default()
        .realign(reference, fragments)
        .map(|output| output.verses)
}

/// Merges records that share a verse id into one record per verse.
///
/// Output is ordered by verse id; words are ordered by index, then start time.
/// The merged start/end are the earliest start and latest end of the words.
pub fn merge_split_verses(records: Vec<AlignedVerse>) -> Vec<AlignedVerse> {
    let mut by_id: BTreeMap<u32, AlignedVerse> = BTreeMap::new();
    for record in records {
        match by_id.entry(record.id()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => slot.get_mut().words.extend(record.words),
        }
    }

    by_id
        .into_values()
        .map(|mut record| {
            record.words.sort_by_key(|w| (w.index, w.start_ms));
            if let Some(start) = record.words.iter().map(|w| w.start_ms).min() {
                record.start_ms = start;
            }
            if let Some(end) = record.words.iter().map(|w| w.end_ms).max() {
                record.end_ms = end;
            }
            record
        })
        .collect()
}

fn flush(
    layout: &VerseLayout<'_>,
    verse_index: usize,
    pending: &mut Vec<AlignedWord>,
    out: &mut Vec<AlignedVerse>,
) {
    let (Some(first), Some(last)) = (pending.first(), pending.last()) else {
        return;
    };
    let (start_ms, end_ms) = (first.start_ms, last.end_ms);
    out.push(AlignedVerse {
        verse: layout.reference().verses()[verse_index].clone(),
        start_ms,
        end_ms,
        words: std::mem::take(pending),
    });
}

fn validate_words(fragment_index: usize, words: &[TranscriptWord]) -> Result<(), AlignmentError> {
    if words.is_empty() {
        return Err(AlignmentError::empty("fragment has no words"));
    }
    let mut previous_start = 0u64;
    for word in words {
        if word.start_ms > word.end_ms {
            return Err(AlignmentError::invalid_input(format!(
                "fragment {fragment_index} word {} starts after it ends ({} > {})",
                word.index, word.start_ms, word.end_ms
            )));
        }
        if word.start_ms < previous_start {
            return Err(AlignmentError::invalid_input(format!(
                "fragment {fragment_index} word {} starts before the previous word",
                word.index
            )));
        }
        previous_start = word.start_ms;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::normalization::normalize_arabic_text;
    use crate::types::Verse;

    fn reference(texts: &[&str]) -> ReferenceText {
        let verses = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Verse {
                id: i as u32 + 1,
                text: text.to_string(),
                translation: None,
                timing: None,
            })
            .collect();
        ReferenceText::new(Some(1), verses).unwrap()
    }

    fn fragment(text: &str, spans: &[(u64, u64)]) -> TranscriptFragment {
        TranscriptFragment {
            text: text.to_string(),
            words: spans
                .iter()
                .enumerate()
                .map(|(index, &(start_ms, end_ms))| TranscriptWord {
                    index,
                    start_ms,
                    end_ms,
                })
                .collect(),
        }
    }

    fn offsets(verse: &AlignedVerse) -> Vec<usize> {
        verse.words.iter().map(|w| w.index).collect()
    }

    #[test]
    fn locate_walks_verse_boundaries() {
        let r = reference(&["ا ب", "ت ث ج", "خ"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        let at = |verse_index, word_offset| VerseCursor {
            verse_index,
            word_offset,
        };
        assert_eq!(layout.locate(0), Some(at(0, 0)));
        assert_eq!(layout.locate(1), Some(at(0, 1)));
        assert_eq!(layout.locate(2), Some(at(1, 0)));
        assert_eq!(layout.locate(4), Some(at(1, 2)));
        assert_eq!(layout.locate(5), Some(at(2, 0)));
        assert_eq!(layout.locate(6), None);
    }

    #[test]
    fn locate_skips_verses_that_normalize_to_nothing() {
        // "م" and "٣" are both dropped by normalization
        let r = reference(&["ا ب", "م ٣", "ت"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        assert_eq!(layout.normalized_text(), "ا ب ت");
        assert_eq!(
            layout.locate(2),
            Some(VerseCursor {
                verse_index: 2,
                word_offset: 0
            })
        );
    }

    #[test]
    fn locate_returns_raw_offsets_past_silent_words() {
        // "مع" normalizes to nothing but is still word 2 of the verse
        let r = reference(&["إن الله مع الصابرين", "حمٓ", "تنزيل"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        assert_eq!(layout.normalized_text(), "ان الله الصابرين تنزيل");
        assert_eq!(layout.normalized_count(0), 3);
        assert_eq!(layout.normalized_count(1), 0);
        let at = |verse_index, word_offset| VerseCursor {
            verse_index,
            word_offset,
        };
        assert_eq!(layout.locate(1), Some(at(0, 1)));
        assert_eq!(layout.locate(2), Some(at(0, 3)));
        assert_eq!(layout.locate(3), Some(at(2, 0)));
        assert_eq!(layout.locate(4), None);
    }

    #[test]
    fn rewind_and_settle_cross_verse_boundaries() {
        let r = reference(&["ا ب", "حمٓ", "ت ث"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        let at = |verse_index, word_offset| VerseCursor {
            verse_index,
            word_offset,
        };
        assert_eq!(layout.rewind(at(2, 0), 1), at(1, 0));
        assert_eq!(layout.rewind(at(2, 1), 3), at(0, 1));
        assert_eq!(layout.rewind(at(0, 1), 5), at(0, 0));
        assert_eq!(layout.settle(at(0, 2)), at(1, 0));
        assert_eq!(layout.settle(at(1, 1)), at(2, 0));
        assert_eq!(layout.settle(at(2, 2)), at(2, 2));
    }

    #[test]
    fn start_outside_the_reference_is_rejected() {
        let r = reference(&["ا ب"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        let f = fragment("ا", &[(0, 10)]);
        let start = VerseCursor {
            verse_index: 3,
            word_offset: 0,
        };
        assert!(matches!(
            realign_fragment(&layout, start, 0, &f),
            Err(AlignmentError::InvalidInput { .. })
        ));
    }

    #[test]
    fn fragment_spanning_a_verse_boundary_splits() {
        let r = reference(&["الرحمن الرحيم", "مالك يوم الدين"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        let f = fragment("الرحمن الرحيم مالك", &[(0, 500), (500, 1000), (1000, 1500)]);

        let step = realign_fragment(&layout, VerseCursor::default(), 0, &f).unwrap();
        assert_eq!(step.verses.len(), 2);
        assert_eq!(step.verses[0].id(), 1);
        assert_eq!(offsets(&step.verses[0]), [0, 1]);
        assert_eq!((step.verses[0].start_ms, step.verses[0].end_ms), (0, 1000));
        assert_eq!(step.verses[1].id(), 2);
        assert_eq!(offsets(&step.verses[1]), [0]);
        assert_eq!((step.verses[1].start_ms, step.verses[1].end_ms), (1000, 1500));
        assert_eq!(
            step.cursor,
            VerseCursor {
                verse_index: 1,
                word_offset: 1
            }
        );
    }

    #[test]
    fn fragment_ending_on_verse_end_does_not_open_next_verse() {
        let r = reference(&["ا ب", "ت"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        let f = fragment("ا ب", &[(0, 10), (10, 20)]);
        let step = realign_fragment(&layout, VerseCursor::default(), 0, &f).unwrap();
        assert_eq!(step.verses.len(), 1);
        assert_eq!(
            step.cursor,
            VerseCursor {
                verse_index: 0,
                word_offset: 2
            }
        );
    }

    #[test]
    fn words_past_the_last_verse_abort() {
        let r = reference(&["ا ب", "ت"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        let f = fragment("ب ت ث", &[(0, 10), (10, 20), (20, 30)]);
        let start = VerseCursor {
            verse_index: 0,
            word_offset: 1,
        };
        let err = realign_fragment(&layout, start, 3, &f).unwrap_err();
        assert!(matches!(
            err,
            AlignmentError::ReferenceExhausted {
                fragment_index: 3,
                verse_id: 2,
                assigned_words: 2
            }
        ));
    }

    #[test]
    fn empty_word_list_is_rejected() {
        let r = reference(&["ا ب"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        let f = fragment("ا", &[]);
        assert!(matches!(
            realign_fragment(&layout, VerseCursor::default(), 0, &f),
            Err(AlignmentError::EmptyInput { .. })
        ));
    }

    #[test]
    fn inverted_or_backwards_word_times_are_rejected() {
        let r = reference(&["ا ب"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);

        let inverted = fragment("ا", &[(50, 10)]);
        assert!(matches!(
            realign_fragment(&layout, VerseCursor::default(), 0, &inverted),
            Err(AlignmentError::InvalidInput { .. })
        ));

        let backwards = fragment("ا ب", &[(100, 200), (50, 60)]);
        assert!(matches!(
            realign_fragment(&layout, VerseCursor::default(), 0, &backwards),
            Err(AlignmentError::InvalidInput { .. })
        ));
    }

    #[test]
    fn realign_two_fragments_keeps_split_verse_as_two_records() {
        let r = reference(&["الرحمن الرحيم", "مالك يوم الدين"]);
        let fragments = vec![
            fragment("الرحمن الرحيم مالك", &[(0, 500), (500, 1000), (1000, 1500)]),
            fragment("يوم الدين", &[(2000, 2400), (2400, 3000)]),
        ];
        let verses = realign(&r, &fragments).unwrap();

        let ids: Vec<u32> = verses.iter().map(AlignedVerse::id).collect();
        assert_eq!(ids, [1, 2, 2]);
        assert_eq!(offsets(&verses[1]), [0]);
        assert_eq!(offsets(&verses[2]), [1, 2]);
        assert_eq!((verses[2].start_ms, verses[2].end_ms), (2000, 3000));
    }

    #[test]
    fn merge_joins_records_of_the_same_verse() {
        let r = reference(&["الرحمن الرحيم", "مالك يوم الدين"]);
        let fragments = vec![
            fragment("الرحمن الرحيم مالك", &[(0, 500), (500, 1000), (1000, 1500)]),
            fragment("يوم الدين", &[(2000, 2400), (2400, 3000)]),
        ];
        let merged = merge_split_verses(realign(&r, &fragments).unwrap());

        assert_eq!(merged.len(), 2);
        assert_eq!(offsets(&merged[1]), [0, 1, 2]);
        assert_eq!((merged[1].start_ms, merged[1].end_ms), (1000, 3000));
        assert_eq!(merged[1].verse.text, "مالك يوم الدين");
    }

    #[test]
    fn raw_word_count_drives_overflow() {
        // the second word of verse 1 is dropped entirely by normalization
        let r = reference(&["ا م ب", "ت"]);
        let layout = VerseLayout::new(&r, normalize_arabic_text);
        assert_eq!(layout.word_count(0), 3);
        let f = fragment("ا م ب ت", &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        let step = realign_fragment(&layout, VerseCursor::default(), 0, &f).unwrap();
        assert_eq!(offsets(&step.verses[0]), [0, 1, 2]);
        assert_eq!(step.verses[1].id(), 2);
    }
}
