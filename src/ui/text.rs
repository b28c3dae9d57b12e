use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Prepare untrusted feed text for a single terminal line.
///
/// Control characters (including ESC, so no ANSI sequences survive) are
/// dropped, line breaks and tabs become spaces, and the result is cut to
/// `max_width` columns with a trailing "..." when it does not fit.
pub fn fit_line(s: &str, max_width: usize) -> Cow<'_, str> {
    let clean = sanitize(s);
    if UnicodeWidthStr::width(clean.as_ref()) <= max_width {
        return clean;
    }
    Cow::Owned(truncate(&clean, max_width))
}

fn sanitize(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => {
                // CSI sequence: skip through its final byte
                if chars.peek() == Some(&'[') {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
            }
            '\n' | '\r' | '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn truncate(s: &str, max_width: usize) -> String {
    // Too narrow for an ellipsis: keep what fits
    let budget = if max_width <= ELLIPSIS.len() {
        max_width
    } else {
        max_width - ELLIPSIS.len()
    };

    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    if max_width > ELLIPSIS.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_borrowed() {
        let result = fit_line("Hola", 10);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hola");
    }

    #[test]
    fn test_truncates_with_ellipsis() {
        assert_eq!(fit_line("Hello World", 8), "Hello...");
        assert_eq!(fit_line("12345", 5), "12345");
    }

    #[test]
    fn test_wide_characters() {
        // Each CJK character takes two columns
        assert_eq!(fit_line("日本語テキスト", 7), "日本...");
    }

    #[test]
    fn test_narrow_width_has_no_ellipsis() {
        assert_eq!(fit_line("Testing", 3), "Tes");
        assert_eq!(fit_line("Testing", 0), "");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(fit_line("\x1b[31mRed\x1b[0m", 20), "Red");
        assert_eq!(fit_line("bare\x1bescape", 20), "bareescape");
        assert_eq!(fit_line("a\x07b\x00c", 20), "abc");
    }

    #[test]
    fn test_line_breaks_flattened() {
        assert_eq!(fit_line("first\nsecond\tthird", 40), "first second third");
    }
}
