//! Math delimiter conversion and balance checks.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Bracket-style inline math: `\( ... \)`.
static BRACKET_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\((.*?)\\\)").unwrap());

/// Bracket-style display math: `\[ ... \]`.
static BRACKET_DISPLAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").unwrap());

/// Dollar-style display math: `$$ ... $$`.
static DOLLAR_DISPLAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").unwrap());

/// Dollar-style inline math on a single line: `$ ... $`.
static DOLLAR_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^$\n]+?)\$").unwrap());

/// Stand-in for `\$` while dollar delimiters are rewritten (private use area).
const ESCAPED_DOLLAR_MASK: &str = "\u{E000}";

/// Math notation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DelimiterStyle {
    /// `\( \)` inline, `\[ \]` display.
    Bracket,
    /// `$ $` inline, `$$ $$` display.
    Dollar,
}

/// Rewrite all math delimiters in `text` to `style`, keeping inline and
/// display math distinct.
pub fn convert_delimiters(text: &str, style: DelimiterStyle) -> String {
    match style {
        DelimiterStyle::Dollar => to_dollar(text),
        DelimiterStyle::Bracket => to_bracket(text),
    }
}

fn to_dollar(text: &str) -> String {
    let display = BRACKET_DISPLAY.replace_all(text, |caps: &Captures| format!("$${}$$", &caps[1]));
    BRACKET_INLINE
        .replace_all(&display, |caps: &Captures| format!("${}$", &caps[1]))
        .into_owned()
}

/// Escaped dollars are literal text and never open or close math.
fn to_bracket(text: &str) -> String {
    let masked = text.replace("\\$", ESCAPED_DOLLAR_MASK);
    let display =
        DOLLAR_DISPLAY.replace_all(&masked, |caps: &Captures| format!("\\[{}\\]", &caps[1]));
    DOLLAR_INLINE
        .replace_all(&display, |caps: &Captures| format!("\\({}\\)", &caps[1]))
        .replace(ESCAPED_DOLLAR_MASK, "\\$")
}

/// Count delimiters and describe any imbalance.
///
/// An odd number of `$$` or of lone `$`, or unequal opening and closing
/// brackets, produces a warning. Escaped dollars (`\$`) are ignored.
pub fn validate_delimiters(text: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let unescaped = text.replace("\\$", "");
    let display = unescaped.matches("$$").count();
    let inline = unescaped.replace("$$", "").matches('$').count();

    if display % 2 != 0 {
        warnings.push(format!(
            "Unbalanced display math: found {} '$$' delimiters",
            display
        ));
    }
    if inline % 2 != 0 {
        warnings.push(format!(
            "Unbalanced inline math: found {} '$' delimiters",
            inline
        ));
    }

    for (open, close) in [("\\(", "\\)"), ("\\[", "\\]")] {
        let opened = text.matches(open).count();
        let closed = text.matches(close).count();
        if opened != closed {
            warnings.push(format!(
                "Unbalanced '{}' / '{}' delimiters: {} opening, {} closing",
                open, close, opened, closed
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_to_dollar() {
        let text = r"Inline \(x^2\) and display \[\int_0^1 f\]";
        assert_eq!(
            convert_delimiters(text, DelimiterStyle::Dollar),
            r"Inline $x^2$ and display $$\int_0^1 f$$"
        );
    }

    #[test]
    fn test_dollar_to_bracket() {
        let text = r"Inline $x^2$ and display $$\int_0^1 f$$";
        assert_eq!(
            convert_delimiters(text, DelimiterStyle::Bracket),
            r"Inline \(x^2\) and display \[\int_0^1 f\]"
        );
    }

    #[test]
    fn test_escaped_dollars_stay_literal() {
        let text = r"costs \$5 and \$6 today";
        assert_eq!(convert_delimiters(text, DelimiterStyle::Bracket), text);

        let mixed = r"pay \$3 for $x$";
        assert_eq!(
            convert_delimiters(mixed, DelimiterStyle::Bracket),
            r"pay \$3 for \(x\)"
        );
        assert!(validate_delimiters(mixed).is_empty());
    }

    #[test]
    fn test_multiline_display() {
        let text = "\\[\na + b\n\\]";
        assert_eq!(
            convert_delimiters(text, DelimiterStyle::Dollar),
            "$$\na + b\n$$"
        );
    }

    #[test]
    fn test_balanced_text_has_no_warnings() {
        assert!(validate_delimiters(r"$a$ and $$b$$ and \(c\) costs \$5").is_empty());
    }

    #[test]
    fn test_odd_counts_warn() {
        let warnings = validate_delimiters("$$a$$ $$b and $c");
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("display"));
        assert!(warnings[1].contains("inline"));
    }

    #[test]
    fn test_unmatched_brackets_warn() {
        let warnings = validate_delimiters(r"\(x + y");
        assert_eq!(warnings.len(), 1);
    }
}
