use crate::alignment::normalization::normalized_words;
use crate::error::AlignmentError;
use crate::types::MatchResult;

const EXACT_SCORE: f64 = 1.0;
/// Source character found one position away in the target word.
const NEAR_SHIFT_SCORE: f64 = 0.8;
/// Source character found two positions away in the target word.
const FAR_SHIFT_SCORE: f64 = 0.4;

/// Finds the window of `source` words that best matches `target`.
///
/// Both strings are expected to be normalized (single spaces, no empty words).
/// Every contiguous window of `target`'s length is scored and the first
/// window with the highest score wins. A weak match is still returned; callers
/// decide what to do with a low `accuracy`.
pub fn match_text(source: &str, target: &str) -> Result<MatchResult, AlignmentError> {
    let source_words = normalized_words(source);
    let target_words = normalized_words(target);
    match_words(&source_words, &target_words)
}

pub fn match_words(
    source_words: &[&str],
    target_words: &[&str],
) -> Result<MatchResult, AlignmentError> {
    let scores = score_windows(source_words, target_words)?;

    let mut best_index = 0usize;
    let mut best_score = f64::NEG_INFINITY;
    for (index, score) in scores.into_iter().enumerate() {
        if score > best_score {
            best_index = index;
            best_score = score;
        }
    }

    let char_index = source_words[..best_index]
        .iter()
        .map(|w| w.chars().count())
        .sum::<usize>()
        + best_index;
    let text = source_words[best_index..best_index + target_words.len()].join(" ");

    Ok(MatchResult {
        word_index: best_index,
        char_index,
        accuracy: best_score,
        text,
    })
}

/// Scores every candidate window; entry `i` is the window starting at source word `i`.
///
/// Returns exactly `S - T + 1` scores for `S` source words and `T` target words.
pub fn score_windows(
    source_words: &[&str],
    target_words: &[&str],
) -> Result<Vec<f64>, AlignmentError> {
    if source_words.is_empty() {
        return Err(AlignmentError::empty("source text"));
    }
    if target_words.is_empty() {
        return Err(AlignmentError::empty("target fragment"));
    }
    if target_words.len() > source_words.len() {
        return Err(AlignmentError::MatchPrecondition {
            target_words: target_words.len(),
            source_words: source_words.len(),
        });
    }

    let source_chars: Vec<Vec<char>> = source_words.iter().map(|w| w.chars().collect()).collect();
    let target_chars: Vec<Vec<char>> = target_words.iter().map(|w| w.chars().collect()).collect();
    let window_len = target_chars.len();

    Ok((0..=source_chars.len() - window_len)
        .map(|start| window_score(&source_chars[start..start + window_len], &target_chars))
        .collect())
}

/// Mean character score over every character position of every word pair.
fn window_score(window: &[Vec<char>], target: &[Vec<char>]) -> f64 {
    let mut total = 0.0f64;
    let mut positions = 0usize;
    for (source_word, target_word) in window.iter().zip(target) {
        for n in 0..source_word.len().max(target_word.len()) {
            total += char_score(source_word, target_word, n);
            positions += 1;
        }
    }
    if positions == 0 {
        0.0
    } else {
        total / positions as f64
    }
}

fn char_score(source_word: &[char], target_word: &[char], n: usize) -> f64 {
    let Some(&c) = source_word.get(n) else {
        return 0.0;
    };
    let target_has = |shift: isize| {
        n.checked_add_signed(shift)
            .and_then(|k| target_word.get(k))
            .is_some_and(|&t| t == c)
    };

    if target_has(0) {
        EXACT_SCORE
    } else if target_has(1) || target_has(-1) {
        NEAR_SHIFT_SCORE
    } else if target_has(2) || target_has(-2) {
        FAR_SHIFT_SCORE
    } else {
        0.0
    }
}
