//! Aggregate statistics computed over lines data.

use std::collections::BTreeMap;

use serde::Serialize;

/// Lines at or above this confidence land in the `high` bucket.
pub const HIGH_CONFIDENCE: f64 = 0.9;
/// Lines at or above this confidence (and below `HIGH_CONFIDENCE`) are `medium`.
pub const MEDIUM_CONFIDENCE: f64 = 0.7;

/// Distribution of per-line confidence values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceBuckets {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConfidenceBuckets {
    pub fn record(&mut self, confidence: f64) {
        if confidence >= HIGH_CONFIDENCE {
            self.high += 1;
        } else if confidence >= MEDIUM_CONFIDENCE {
            self.medium += 1;
        } else {
            self.low += 1;
        }
    }
}

/// Counters accumulated over a set of lines, globally or for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentCounters {
    pub total_lines: usize,
    /// Lines per content type, including types without a dedicated counter.
    pub type_counts: BTreeMap<String, usize>,
    pub math_count: usize,
    pub table_count: usize,
    pub diagram_count: usize,
    pub handwritten_lines: usize,
    pub printed_lines: usize,
    pub total_characters: usize,
    pub confidence_sum: f64,
    /// Lines that carried a confidence value.
    pub confidence_samples: usize,
    pub confidence_buckets: ConfidenceBuckets,
}

impl ContentCounters {
    /// Mean confidence over lines that reported one.
    pub fn average_confidence(&self) -> Option<f64> {
        if self.confidence_samples == 0 {
            None
        } else {
            Some(self.confidence_sum / self.confidence_samples as f64)
        }
    }

    pub fn type_count(&self, content_type: &str) -> usize {
        self.type_counts.get(content_type).copied().unwrap_or(0)
    }
}

/// Counters scoped to a single page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAnalysis {
    pub page_number: u32,
    #[serde(flatten)]
    pub counters: ContentCounters,
    pub average_confidence: Option<f64>,
}

/// Result of analyzing a lines document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAnalysis {
    pub total_pages: usize,
    #[serde(flatten)]
    pub counters: ContentCounters,
    pub average_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageAnalysis>>,
    pub summary: String,
}

impl ContentAnalysis {
    pub fn total_lines(&self) -> usize {
        self.counters.total_lines
    }

    pub fn math_count(&self) -> usize {
        self.counters.math_count
    }

    pub fn table_count(&self) -> usize {
        self.counters.table_count
    }

    pub fn diagram_count(&self) -> usize {
        self.counters.diagram_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_buckets() {
        let mut buckets = ConfidenceBuckets::default();
        for value in [0.95, 0.9, 0.75, 0.2] {
            buckets.record(value);
        }
        assert_eq!(
            buckets,
            ConfidenceBuckets {
                high: 2,
                medium: 1,
                low: 1
            }
        );
    }

    #[test]
    fn test_average_requires_samples() {
        let mut counters = ContentCounters::default();
        assert_eq!(counters.average_confidence(), None);
        counters.confidence_sum = 1.5;
        counters.confidence_samples = 2;
        assert_eq!(counters.average_confidence(), Some(0.75));
    }
}
