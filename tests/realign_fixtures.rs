use std::fs;
use std::path::{Path, PathBuf};

use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use verse_align::{
    AlignedVerse, AlignmentError, RealignerBuilder, RealignerConfig, ReferenceText,
    TranscriptFragment,
};

const SUITE_NAME: &str = "realign_fixtures";

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    description: String,
    reference: serde_json::Value,
    fragments: Vec<TranscriptFragment>,
    #[serde(default)]
    merge_split_verses: bool,
    #[serde(default)]
    expected: Option<Vec<ExpectedVerse>>,
    #[serde(default)]
    expected_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpectedVerse {
    id: u32,
    start_ms: u64,
    end_ms: u64,
    /// `[index, start_ms, end_ms]` rows.
    words: Vec<[u64; 3]>,
}

fn main() {
    let args = Arguments::from_args();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let paths = match fixture_paths(&repo_root) {
        Ok(paths) => paths,
        Err(err) => {
            run_setup_failure(&args, err);
            return;
        }
    };
    if paths.is_empty() {
        run_setup_failure(
            &args,
            "No fixtures found under test-data/realign.".to_string(),
        );
        return;
    }

    let tests = paths
        .into_iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Trial::test(format!("{SUITE_NAME}::{stem}"), move || {
                run_fixture(&path).map_err(Failed::from)
            })
        })
        .collect();

    libtest_mimic::run(&args, tests).exit();
}

fn run_setup_failure(args: &Arguments, message: String) {
    let test = Trial::test(format!("{SUITE_NAME}::setup"), move || {
        Err(Failed::from(message))
    });
    libtest_mimic::run(args, vec![test]).exit();
}

fn fixture_paths(repo_root: &Path) -> Result<Vec<PathBuf>, String> {
    let dir = repo_root.join("test-data").join("realign");
    let entries = fs::read_dir(&dir)
        .map_err(|err| format!("Failed to read fixture dir '{}': {err}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| format!("Failed to list '{}': {err}", dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn run_fixture(path: &Path) -> Result<(), String> {
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))?;
    let name = if fixture.description.is_empty() {
        path.display().to_string()
    } else {
        fixture.description.clone()
    };

    let reference = ReferenceText::from_json_str(&fixture.reference.to_string())
        .map_err(|err| format!("{name}: invalid reference: {err}"))?;
    let realigner = RealignerBuilder::new(RealignerConfig {
        merge_split_verses: fixture.merge_split_verses,
        ..RealignerConfig::default()
    })
    .build()
    .map_err(|err| format!("{name}: failed to build realigner: {err}"))?;

    let result = realigner.realign(&reference, &fixture.fragments);
    match (&fixture.expected_error, result) {
        (Some(expected), Err(err)) => {
            let observed = error_kind(&err);
            if observed == expected {
                Ok(())
            } else {
                Err(format!("{name}: expected {expected} error, got {observed}: {err}"))
            }
        }
        (Some(expected), Ok(output)) => Err(format!(
            "{name}: expected {expected} error, got {} records",
            output.verses.len()
        )),
        (None, Err(err)) => Err(format!("{name}: realign() failed: {err}")),
        (None, Ok(output)) => {
            let expected = fixture
                .expected
                .as_deref()
                .ok_or_else(|| format!("{name}: fixture has neither expected nor expected_error"))?;
            compare_records(&name, expected, &output.verses)
        }
    }
}

fn error_kind(err: &AlignmentError) -> &'static str {
    match err {
        AlignmentError::Io { .. } => "Io",
        AlignmentError::Json { .. } => "Json",
        AlignmentError::MatchPrecondition { .. } => "MatchPrecondition",
        AlignmentError::EmptyInput { .. } => "EmptyInput",
        AlignmentError::ReferenceExhausted { .. } => "ReferenceExhausted",
        AlignmentError::InvalidInput { .. } => "InvalidInput",
    }
}

fn compare_records(
    name: &str,
    expected: &[ExpectedVerse],
    observed: &[AlignedVerse],
) -> Result<(), String> {
    if expected.len() != observed.len() {
        let ids: Vec<u32> = observed.iter().map(AlignedVerse::id).collect();
        return Err(format!(
            "{name}: record count mismatch (expected {}, got {} with ids {ids:?})",
            expected.len(),
            observed.len()
        ));
    }

    for (idx, (want, got)) in expected.iter().zip(observed).enumerate() {
        if want.id != got.id() {
            return Err(format!(
                "{name}: record #{idx} verse mismatch (expected {}, got {})",
                want.id,
                got.id()
            ));
        }
        if (want.start_ms, want.end_ms) != (got.start_ms, got.end_ms) {
            return Err(format!(
                "{name}: record #{idx} (verse {}) span mismatch (expected {}..{}, got {}..{})",
                want.id, want.start_ms, want.end_ms, got.start_ms, got.end_ms
            ));
        }
        let got_words: Vec<[u64; 3]> = got
            .words
            .iter()
            .map(|w| [w.index as u64, w.start_ms, w.end_ms])
            .collect();
        if want.words != got_words {
            return Err(format!(
                "{name}: record #{idx} (verse {}) words mismatch (expected {:?}, got {:?})",
                want.id, want.words, got_words
            ));
        }
    }

    Ok(())
}
