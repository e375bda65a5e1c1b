pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod reference;
pub mod transcript;
pub mod types;

pub use alignment::matching::match_text;
pub use alignment::normalization::{normalize_arabic_text, NormalizationTable};
pub use alignment::realign::{merge_split_verses, realign, VerseCursor, VerseLayout};
pub use alignment::report::{compute_report, RealignmentReport};
pub use config::RealignerConfig;
pub use error::AlignmentError;
pub use pipeline::builder::RealignerBuilder;
pub use pipeline::runtime::Realigner;
pub use pipeline::traits::{TextNormalizer, WindowMatcher};
pub use reference::{provider_timings, ReferenceText};
pub use transcript::{fragments_from_whisper_json, load_whisper_transcript};
pub use types::{
    AlignedVerse, AlignedWord, FragmentMatch, MatchResult, RealignmentOutput, TranscriptFragment,
    TranscriptWord, Verse, VerseTiming,
};
