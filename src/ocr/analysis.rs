//! Content statistics over lines data.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::models::{ContentAnalysis, ContentCounters, Line, LinesDocument, PageAnalysis};

/// Inline or display math delimiters in free text.
static MATH_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\(|\\\[|\$\$|\$[^$\n]+\$").unwrap());

/// Line types counted as diagrams.
const DIAGRAM_TYPES: &[&str] = &["diagram", "chart"];

/// Analysis switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOptions {
    /// Include a per-page breakdown.
    pub per_page: bool,
}

/// Content type of a line: the explicit `type` when present, otherwise a
/// guess from the text and layout hints.
pub fn classify_line(line: &Line) -> String {
    if let Some(kind) = line
        .line_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return kind.to_lowercase();
    }
    if MATH_MARKERS.is_match(line.text()) {
        "math".to_string()
    } else if line.has_table_hint() {
        "table".to_string()
    } else {
        "text".to_string()
    }
}

fn record_line(counters: &mut ContentCounters, line: &Line, kind: &str) {
    counters.total_lines += 1;
    *counters.type_counts.entry(kind.to_string()).or_insert(0) += 1;

    match kind {
        "math" => counters.math_count += 1,
        "table" => counters.table_count += 1,
        k if DIAGRAM_TYPES.contains(&k) => counters.diagram_count += 1,
        _ => {}
    }

    if line.handwritten() {
        counters.handwritten_lines += 1;
    }
    if line.printed() {
        counters.printed_lines += 1;
    }
    counters.total_characters += line.text().chars().count();

    if let Some(confidence) = line.confidence.filter(|c| c.is_finite()) {
        counters.confidence_sum += confidence;
        counters.confidence_samples += 1;
        counters.confidence_buckets.record(confidence);
    }
}

/// Aggregates lines data into a [`ContentAnalysis`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentAnalyzer;

impl ContentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Validate raw lines data and analyze it.
    pub fn analyze_value(&self, raw: &Value, options: AnalysisOptions) -> Result<ContentAnalysis> {
        let document = LinesDocument::from_value(raw)?;
        self.analyze(&document, options)
    }

    pub fn analyze(
        &self,
        document: &LinesDocument,
        options: AnalysisOptions,
    ) -> Result<ContentAnalysis> {
        document.validate()?;

        let mut totals = ContentCounters::default();
        let mut pages = options
            .per_page
            .then(|| Vec::with_capacity(document.pages.len()));

        for (index, page) in document.pages.iter().enumerate() {
            let mut page_counters = ContentCounters::default();
            for line in page.lines() {
                let kind = classify_line(line);
                record_line(&mut totals, line, &kind);
                if pages.is_some() {
                    record_line(&mut page_counters, line, &kind);
                }
            }

            if let Some(ref mut pages) = pages {
                let page_number = if page.page_number > 0 {
                    page.page_number
                } else {
                    index as u32 + 1
                };
                pages.push(PageAnalysis {
                    page_number,
                    average_confidence: page_counters.average_confidence(),
                    counters: page_counters,
                });
            }
        }

        let total_pages = document.pages.len();
        let average_confidence = totals.average_confidence();
        let summary = summarize(total_pages, &totals);
        debug!(
            pages = total_pages,
            lines = totals.total_lines,
            "Analyzed lines data"
        );

        Ok(ContentAnalysis {
            total_pages,
            counters: totals,
            average_confidence,
            pages,
            summary,
        })
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// One-sentence description listing only the non-zero categories.
pub fn summarize(total_pages: usize, counters: &ContentCounters) -> String {
    let pages = plural(total_pages, "page", "pages");
    if counters.total_lines == 0 {
        return format!("No lines found across {}.", pages);
    }

    let categories = [
        (counters.math_count, "math expression", "math expressions"),
        (counters.table_count, "table", "tables"),
        (counters.diagram_count, "diagram", "diagrams"),
        (counters.handwritten_lines, "handwritten line", "handwritten lines"),
    ];
    let parts: Vec<String> = categories
        .iter()
        .filter(|(count, _, _)| *count > 0)
        .map(|(count, singular, plural_form)| plural(*count, singular, plural_form))
        .collect();

    let mut summary = format!(
        "Found {} across {}",
        plural(counters.total_lines, "line", "lines"),
        pages
    );
    if !parts.is_empty() {
        summary.push_str(&format!(", including {}", parts.join(", ")));
    }
    summary.push('.');

    if let Some(average) = counters.average_confidence() {
        summary.push_str(&format!(" Average confidence {:.1}%.", average * 100.0));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analyze(raw: Value, per_page: bool) -> ContentAnalysis {
        ContentAnalyzer::new()
            .analyze_value(&raw, AnalysisOptions { per_page })
            .unwrap()
    }

    #[test]
    fn test_counts_explicit_types() {
        let analysis = analyze(
            json!({"pages": [{"lines": [{"type": "math"}, {"type": "table"}, {"type": "text"}]}]}),
            false,
        );
        assert_eq!(analysis.total_lines(), 3);
        assert_eq!(analysis.math_count(), 1);
        assert_eq!(analysis.table_count(), 1);
        assert_eq!(analysis.counters.type_count("text"), 1);
        assert_eq!(analysis.total_pages, 1);
        assert!(analysis.pages.is_none());
    }

    #[test]
    fn test_empty_pages_is_validation_error() {
        let err = ContentAnalyzer::new()
            .analyze_value(&json!({"pages": []}), AnalysisOptions::default())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_typed_document_is_validated() {
        let err = ContentAnalyzer::new()
            .analyze(&LinesDocument::default(), AnalysisOptions::default())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_confidence_mean_excludes_missing() {
        let analysis = analyze(
            json!({"pages": [{"lines": [
                {"type": "text", "confidence": 0.8},
                {"type": "text"},
                {"type": "text", "confidence": 1.0}
            ]}]}),
            false,
        );
        let average = analysis.average_confidence.unwrap();
        assert!((average - 0.9).abs() < 1e-9);
        assert_eq!(analysis.counters.confidence_samples, 2);
        assert_eq!(analysis.counters.confidence_buckets.high, 1);
        assert_eq!(analysis.counters.confidence_buckets.medium, 1);
    }

    #[test]
    fn test_no_confidence_gives_none() {
        let analysis = analyze(json!({"pages": [{"lines": [{"text": "hi"}]}]}), false);
        assert_eq!(analysis.average_confidence, None);
        assert!(!analysis.summary.contains("confidence"));
    }

    #[test]
    fn test_heuristic_classification() {
        let math: Line = serde_json::from_value(json!({"text": "where \\(x > 0\\)"})).unwrap();
        let dollars: Line = serde_json::from_value(json!({"text": "cost $a+b$"})).unwrap();
        let table: Line =
            serde_json::from_value(json!({"text": "a b", "geometry": {"table": {"rows": 2}}}))
                .unwrap();
        let text: Line = serde_json::from_value(json!({"text": "costs $5"})).unwrap();
        let explicit: Line =
            serde_json::from_value(json!({"type": "Diagram", "text": "\\(x\\)"})).unwrap();

        assert_eq!(classify_line(&math), "math");
        assert_eq!(classify_line(&dollars), "math");
        assert_eq!(classify_line(&table), "table");
        assert_eq!(classify_line(&text), "text");
        assert_eq!(classify_line(&explicit), "diagram");
    }

    #[test]
    fn test_per_page_mirrors_totals() {
        let analysis = analyze(
            json!({"pages": [
                {"page": 1, "lines": [
                    {"type": "math", "is_handwritten": true, "text": "ab"},
                    {"type": "chart", "is_printed": true}
                ]},
                {"page": 2, "lines": [{"type": "table", "text": "abc"}]},
                {"page": 3}
            ]}),
            true,
        );

        let pages = analysis.pages.as_ref().unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].counters.math_count, 1);
        assert_eq!(pages[0].counters.diagram_count, 1);
        assert_eq!(pages[0].counters.handwritten_lines, 1);
        assert_eq!(pages[1].counters.table_count, 1);
        assert_eq!(pages[1].counters.total_characters, 3);
        assert_eq!(pages[2].counters.total_lines, 0);
        assert_eq!(pages[2].page_number, 3);

        let summed: usize = pages.iter().map(|p| p.counters.total_lines).sum();
        assert_eq!(summed, analysis.total_lines());
        assert_eq!(analysis.counters.total_characters, 5);
    }

    #[test]
    fn test_summary_omits_zero_categories() {
        let analysis = analyze(
            json!({"pages": [{"lines": [{"type": "math"}, {"type": "text"}]}]}),
            false,
        );
        assert_eq!(
            analysis.summary,
            "Found 2 lines across 1 page, including 1 math expression."
        );
        assert!(!analysis.summary.contains("table"));
        assert!(!analysis.summary.contains("diagram"));
    }

    #[test]
    fn test_summary_for_empty_document() {
        let analysis = analyze(json!({"pages": [{"lines": []}, {"lines": []}]}), false);
        assert_eq!(analysis.summary, "No lines found across 2 pages.");
    }
}
