//! Table helpers: TSV to Markdown conversion and table detection.

use serde_json::Value;

/// Convert tab-separated rows to a Markdown table.
///
/// The first row is the header. A separator row matching the header width
/// follows it, and shorter data rows are padded with empty cells. Returns an
/// empty string when there are no rows.
pub fn tsv_to_markdown(tsv: &str) -> String {
    let rows: Vec<Vec<String>> = tsv
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').map(escape_cell).collect())
        .collect();

    let Some((header, data)) = rows.split_first() else {
        return String::new();
    };
    let columns = header.len();

    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(markdown_row(header));
    out.push(markdown_row(&vec!["---".to_string(); columns]));
    for row in data {
        let mut row = row.clone();
        if row.len() < columns {
            row.resize(columns, String::new());
        }
        out.push(markdown_row(&row));
    }
    out.join("\n")
}

fn escape_cell(cell: &str) -> String {
    cell.trim().replace('|', "\\|")
}

fn markdown_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// Whether a result contains a table.
///
/// Signals are checked in order and the first one that fires wins: non-empty
/// TSV data, a `<table` element in any of the markup strings, then a
/// structural line item typed `table`.
pub fn detect_table(tsv: &str, markup: &[&str], line_items: &[Value]) -> bool {
    if !tsv.trim().is_empty() {
        return true;
    }
    if markup
        .iter()
        .any(|text| text.to_ascii_lowercase().contains("<table"))
    {
        return true;
    }
    line_items.iter().any(|item| {
        item.get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case("table"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tsv_to_markdown() {
        let markdown = tsv_to_markdown("Name\tAge\nAlice\t30\nBob\t25");
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(
            lines,
            vec![
                "| Name | Age |",
                "| --- | --- |",
                "| Alice | 30 |",
                "| Bob | 25 |"
            ]
        );
    }

    #[test]
    fn test_short_rows_are_padded() {
        let markdown = tsv_to_markdown("A\tB\tC\n1\n2\t3");
        assert!(markdown.contains("| 1 |  |  |"));
        assert!(markdown.contains("| 2 | 3 |  |"));
    }

    #[test]
    fn test_pipes_are_escaped() {
        let markdown = tsv_to_markdown("Expr\n|x|");
        assert!(markdown.ends_with("| \\|x\\| |"));
    }

    #[test]
    fn test_empty_tsv() {
        assert_eq!(tsv_to_markdown(""), "");
        assert_eq!(tsv_to_markdown("\n\n"), "");
    }

    #[test]
    fn test_detect_table_signals() {
        assert!(detect_table("a\tb", &[], &[]));
        assert!(detect_table("", &["<div><TABLE></TABLE></div>"], &[]));
        assert!(detect_table("", &["plain"], &[json!({"type": "table"})]));
        assert!(!detect_table(
            "  ",
            &["no tables here"],
            &[json!({"type": "text"}), json!({"value": "table"})]
        ));
    }
}
