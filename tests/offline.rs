//! Normalization and analysis of saved service responses.

use ocrbridge::models::LinesDocument;
use ocrbridge::ocr::{AnalysisOptions, ContentAnalyzer, DelimiterStyle, ResponseNormalizer};
use serde_json::json;

#[test]
fn test_table_response_normalizes_to_markdown() {
    let raw = json!({
        "text": "Name Age\nAlice 30",
        "confidence": 1.7,
        "isHandwritten": true,
        "data": [
            {"type": "tsv", "value": "Name\tAge\nAlice\t30\nBob"},
            {"type": "table_html", "value": "<table><tr><td>Name</td></tr></table>"}
        ]
    });

    let result = ResponseNormalizer::new().normalize(raw);

    assert!(result.contains_table);
    assert!(result.is_handwritten);
    assert!(!result.is_printed);
    assert_eq!(result.confidence, 1.0);
    assert_eq!(
        result.table_markdown,
        "| Name | Age |\n| --- | --- |\n| Alice | 30 |\n| Bob |  |"
    );
    assert!(result.without_raw().raw.is_null());
}

#[test]
fn test_delimiter_rewrite_and_warnings() {
    let raw = json!({"text": r"Area \(\pi r^2\) and $half"});

    let result = ResponseNormalizer::new()
        .with_delimiter_style(DelimiterStyle::Dollar)
        .normalize(raw);

    assert_eq!(result.text, r"Area $\pi r^2$ and $half");
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("inline"));
}

#[test]
fn test_multi_page_analysis() {
    let raw = json!({
        "pages": [
            {
                "page": 1,
                "page_width": 1200,
                "page_height": 1600,
                "lines": [
                    {"type": "text", "text": "Results", "confidence": 0.99, "is_printed": true},
                    {"text": "$x = 1$", "confidence": 0.75, "is_handwritten": true},
                    {"type": "chart", "confidence": 0.4}
                ]
            },
            {"page": 2},
            {
                "lines": [
                    {"text": "cell", "geometry": {"table": true}}
                ]
            }
        ]
    });

    let document = LinesDocument::from_value(&raw).unwrap();
    let analysis = ContentAnalyzer::new()
        .analyze(&document, AnalysisOptions { per_page: true })
        .unwrap();

    assert_eq!(analysis.total_pages, 3);
    assert_eq!(analysis.total_lines(), 4);
    assert_eq!(analysis.math_count(), 1);
    assert_eq!(analysis.table_count(), 1);
    assert_eq!(analysis.diagram_count(), 1);
    assert_eq!(analysis.counters.handwritten_lines, 1);
    assert_eq!(analysis.counters.printed_lines, 1);

    let buckets = analysis.counters.confidence_buckets;
    assert_eq!((buckets.high, buckets.medium, buckets.low), (1, 1, 1));

    let average = analysis.average_confidence.unwrap();
    assert!((average - (0.99 + 0.75 + 0.4) / 3.0).abs() < 1e-9);

    let pages = analysis.pages.as_ref().unwrap();
    let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(pages[1].counters.total_lines, 0);
    assert_eq!(pages[1].average_confidence, None);

    assert!(analysis.summary.contains("4 lines"));
    assert!(analysis.summary.contains("3 pages"));

    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["total_lines"], json!(4));
    assert_eq!(json["pages"][0]["page_number"], json!(1));
}

#[test]
fn test_analysis_without_pages_breakdown() {
    let raw = json!({"pages": [{"lines": []}]});

    let analysis = ContentAnalyzer::new()
        .analyze_value(&raw, AnalysisOptions::default())
        .unwrap();

    assert_eq!(analysis.total_lines(), 0);
    assert!(analysis.pages.is_none());
    assert_eq!(analysis.average_confidence, None);
    assert_eq!(analysis.summary, "No lines found across 1 page.");
}

#[test]
fn test_analysis_tolerates_loosely_typed_lines() {
    let raw = json!({
        "pages": [
            {
                "page": null,
                "lines": [
                    {"type": "math", "confidence": "0.9"},
                    {"text": "plain", "confidence": null, "is_printed": 1}
                ]
            }
        ]
    });

    let analysis = ContentAnalyzer::new()
        .analyze_value(&raw, AnalysisOptions { per_page: true })
        .unwrap();

    assert_eq!(analysis.total_lines(), 2);
    assert_eq!(analysis.math_count(), 1);
    assert_eq!(analysis.average_confidence, Some(0.9));
    assert_eq!(analysis.counters.printed_lines, 0);
    assert_eq!(analysis.pages.as_ref().unwrap()[0].page_number, 1);
}
