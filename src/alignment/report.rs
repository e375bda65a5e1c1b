use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::Serialize;

use crate::config::RealignerConfig;
use crate::error::AlignmentError;
use crate::reference::ReferenceText;
use crate::types::{AlignedVerse, RealignmentOutput};

const SCHEMA_VERSION: u32 = 1;
const OUTLIER_TOP_N: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct RealignmentReport {
    pub schema_version: u32,
    pub meta: Meta,
    pub fragments: Vec<FragmentReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<u32>,
    pub verse_count: u32,
    pub reference_word_count: u32,
    pub fragment_count: u32,
    pub record_count: u32,
    pub low_accuracy_threshold: f32,
    pub merged_split_verses: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FragmentReport {
    pub fragment_index: u32,
    pub verse_id: u32,
    pub word_offset: u32,
    pub word_count: u32,
    /// `false` for fragments placed at the running position without a match.
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_word_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_char_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    pub low_confidence: bool,
    pub backward: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<MetricDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_min: Option<f32>,
    pub low_confidence_count: u32,
    pub unmatched_count: u32,
    pub backward_count: u32,
    /// Verse ids emitted as more than one record.
    pub split_verse_ids: Vec<u32>,
    /// Reference verse ids no record covers.
    pub uncovered_verse_ids: Vec<u32>,
    pub structural: StructuralMetrics,
    pub outliers: Vec<OutlierEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f32,
    pub p50: f32,
    pub p90: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuralMetrics {
    /// Records whose start is after their end.
    pub inverted_record_count: u32,
    /// Records whose start/end differ from their first/last word.
    pub boundary_mismatch_count: u32,
    /// Words whose index does not increase over the previous word of the record.
    pub unordered_word_count: u32,
    pub empty_record_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub fragment_index: u32,
    pub verse_id: u32,
    pub accuracy: f32,
}

pub fn compute_report(
    reference: &ReferenceText,
    output: &RealignmentOutput,
    config: &RealignerConfig,
) -> Result<RealignmentReport, AlignmentError> {
    let mut fragments = Vec::with_capacity(output.matches.len());
    for m in &output.matches {
        let accuracy = m
            .matched
            .as_ref()
            .map(|r| checked_f32(r.accuracy, "fragment.accuracy"))
            .transpose()?;
        fragments.push(FragmentReport {
            fragment_index: to_u32(m.fragment_index),
            verse_id: m.verse_id,
            word_offset: to_u32(m.word_offset),
            word_count: to_u32(m.word_count),
            matched: m.matched.is_some(),
            match_word_index: m.matched.as_ref().map(|r| to_u32(r.word_index)),
            match_char_index: m.matched.as_ref().map(|r| to_u32(r.char_index)),
            accuracy,
            matched_text: m.matched.as_ref().map(|r| r.text.clone()),
            low_confidence: m
                .matched
                .as_ref()
                .is_some_and(|r| r.accuracy < config.low_accuracy_threshold),
            backward: m.backward,
        });
    }

    let aggregates = aggregate(reference, &output.verses, &fragments)?;

    Ok(RealignmentReport {
        schema_version: SCHEMA_VERSION,
        meta: Meta {
            generated_at: Utc::now().to_rfc3339(),
            chapter_id: reference.chapter_id(),
            verse_count: to_u32(reference.len()),
            reference_word_count: to_u32(reference.word_count()),
            fragment_count: to_u32(output.matches.len()),
            record_count: to_u32(output.verses.len()),
            low_accuracy_threshold: checked_f32(
                config.low_accuracy_threshold,
                "meta.low_accuracy_threshold",
            )?,
            merged_split_verses: config.merge_split_verses,
        },
        fragments,
        aggregates,
    })
}

/// Checks the guarantees the renderer relies on for every record.
pub fn compute_structural_metrics(records: &[AlignedVerse]) -> StructuralMetrics {
    let mut metrics = StructuralMetrics::default();
    for record in records {
        if record.start_ms > record.end_ms {
            metrics.inverted_record_count += 1;
        }
        let (Some(first), Some(last)) = (record.words.first(), record.words.last()) else {
            metrics.empty_record_count += 1;
            continue;
        };
        if first.start_ms != record.start_ms || last.end_ms != record.end_ms {
            metrics.boundary_mismatch_count += 1;
        }
        let unordered = record
            .words
            .windows(2)
            .filter(|pair| pair[1].index <= pair[0].index)
            .count();
        metrics.unordered_word_count += to_u32(unordered);
    }
    metrics
}

fn aggregate(
    reference: &ReferenceText,
    records: &[AlignedVerse],
    fragments: &[FragmentReport],
) -> Result<AggregateReport, AlignmentError> {
    let accuracies: Vec<f64> = fragments
        .iter()
        .filter_map(|f| f.accuracy)
        .map(f64::from)
        .collect();
    let accuracy_min = fragments
        .iter()
        .filter_map(|f| f.accuracy)
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut records_per_verse: BTreeMap<u32, usize> = BTreeMap::new();
    for record in records {
        *records_per_verse.entry(record.id()).or_default() += 1;
    }
    let split_verse_ids = records_per_verse
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(&id, _)| id)
        .collect();
    let covered: BTreeSet<u32> = records_per_verse.keys().copied().collect();
    let uncovered_verse_ids = reference
        .verses()
        .iter()
        .map(|v| v.id)
        .filter(|id| !covered.contains(id))
        .collect();

    Ok(AggregateReport {
        accuracy: distribution_or_none(&accuracies)?,
        accuracy_min,
        low_confidence_count: to_u32(fragments.iter().filter(|f| f.low_confidence).count()),
        unmatched_count: to_u32(fragments.iter().filter(|f| !f.matched).count()),
        backward_count: to_u32(fragments.iter().filter(|f| f.backward).count()),
        split_verse_ids,
        uncovered_verse_ids,
        structural: compute_structural_metrics(records),
        outliers: worst_matches(fragments, OUTLIER_TOP_N),
    })
}

fn worst_matches(fragments: &[FragmentReport], top_n: usize) -> Vec<OutlierEntry> {
    let mut ranked: Vec<OutlierEntry> = fragments
        .iter()
        .filter_map(|f| {
            f.accuracy.map(|accuracy| OutlierEntry {
                fragment_index: f.fragment_index,
                verse_id: f.verse_id,
                accuracy,
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.accuracy
            .partial_cmp(&b.accuracy)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.fragment_index.cmp(&b.fragment_index))
    });
    ranked.truncate(top_n);
    ranked
}

fn distribution_or_none(values: &[f64]) -> Result<Option<MetricDistribution>, AlignmentError> {
    if values.is_empty() {
        return Ok(None);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(Some(MetricDistribution {
        mean: checked_f32(mean(&sorted), "aggregate.accuracy.mean")?,
        p50: checked_f32(percentile_sorted(&sorted, 0.5), "aggregate.accuracy.p50")?,
        p90: checked_f32(percentile_sorted(&sorted, 0.9), "aggregate.accuracy.p90")?,
    }))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn checked_f32(value: f64, metric_name: &str) -> Result<f32, AlignmentError> {
    if !value.is_finite() {
        return Err(AlignmentError::invalid_input(format!(
            "metric '{metric_name}' produced non-finite value: {value}"
        )));
    }
    Ok(value as f32)
}
