//! Reading word-timestamped transcription output.
//!
//! The accepted shape is the JSON written by whisper with word timestamps:
//! a list of segments, each with its text and per-word `start`/`end` in
//! seconds. Only the fields the realigner needs are read.

use std::path::Path;

use serde::Deserialize;

use crate::error::AlignmentError;
use crate::types::{TranscriptFragment, TranscriptWord};

#[derive(Debug, Deserialize)]
struct WhisperTranscript {
    #[serde(default)]
    language: Option<String>,
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    text: String,
    #[serde(default)]
    words: Vec<WhisperWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperWord {
    start: f64,
    end: f64,
}

pub fn fragments_from_whisper_json(data: &str) -> Result<Vec<TranscriptFragment>, AlignmentError> {
    let transcript: WhisperTranscript = serde_json::from_str(data)
        .map_err(|e| AlignmentError::json("parse whisper transcript", e))?;
    tracing::debug!(
        language = transcript.language.as_deref().unwrap_or("unknown"),
        segments = transcript.segments.len(),
        "transcript: parsed whisper output"
    );

    transcript
        .segments
        .into_iter()
        .enumerate()
        .map(|(segment_index, segment)| {
            let words = segment
                .words
                .iter()
                .enumerate()
                .map(|(index, word)| {
                    Ok(TranscriptWord {
                        index,
                        start_ms: seconds_to_ms(word.start, segment_index)?,
                        end_ms: seconds_to_ms(word.end, segment_index)?,
                    })
                })
                .collect::<Result<Vec<_>, AlignmentError>>()?;
            Ok(TranscriptFragment {
                text: segment.text,
                words,
            })
        })
        .collect()
}

pub fn load_whisper_transcript(path: &Path) -> Result<Vec<TranscriptFragment>, AlignmentError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AlignmentError::io("read whisper transcript", e))?;
    fragments_from_whisper_json(&data)
}

fn seconds_to_ms(seconds: f64, segment_index: usize) -> Result<u64, AlignmentError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(AlignmentError::invalid_input(format!(
            "segment {segment_index} has an invalid word time: {seconds}"
        )));
    }
    Ok((seconds * 1000.0).round() as u64)
}
