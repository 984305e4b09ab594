//! Caption text helpers: drawtext escaping and greedy word wrap.

/// Escape literal text for a single-quoted drawtext value.
///
/// Substitutions run backslash first so later ones are not re-escaped:
/// `\` -> `\\`, `'` -> `'\''`, `:` -> `\:`, `%` -> `\%`.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

/// Reverse [`escape_drawtext`].
pub fn unescape_drawtext(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("'\\''") {
            out.push('\'');
            rest = tail;
            continue;
        }
        if c == '\\' {
            let mut chars = rest[1..].chars();
            if let Some(next @ ('\\' | ':' | '%')) = chars.next() {
                out.push(next);
                rest = &rest[1 + next.len_utf8()..];
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Escape a file path for use inside a single-quoted filter option.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "/")
        .replace('\'', "'\\''")
        .replace(':', "\\:")
}

/// Greedy word wrap.
///
/// A word joins the current line while `running + word + 1 <= width`, where
/// the running length counts one trailing space per word already placed;
/// otherwise it starts a new line. Words longer than `width` get a line of
/// their own and are never split.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut running = 0usize;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if running + len + 1 <= width {
            current.push(word);
            running += len + 1;
        } else {
            if !current.is_empty() {
                lines.push(current.join(" "));
            }
            current = vec![word];
            running = len;
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}

/// Wrap and join with line feeds, ready for drawtext.
pub fn wrap_caption(text: &str, width: usize) -> String {
    wrap_words(text, width).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_order() {
        assert_eq!(escape_drawtext(r"a\b"), r"a\\b");
        assert_eq!(escape_drawtext("it's"), r"it'\''s");
        assert_eq!(escape_drawtext("Ada:"), r"Ada\:");
        assert_eq!(escape_drawtext("50%"), r"50\%");
        // The backslash introduced for the quote must not be doubled.
        assert_eq!(escape_drawtext(r"\'"), r"\\'\''");
    }

    #[test]
    fn test_escape_roundtrip() {
        let samples = [
            "",
            "plain words",
            r"back\slash",
            "it's 50% off: really",
            r"\\''::%%",
            r"'\''",
            r"\:",
            "ünïcödé: 'quotes' \\ %",
            "trailing backslash \\",
        ];
        for s in samples {
            assert_eq!(unescape_drawtext(&escape_drawtext(s)), s, "{s:?}");
        }
    }

    #[test]
    fn test_escape_is_injective_on_near_collisions() {
        let a = escape_drawtext(r"\:");
        let b = escape_drawtext(":");
        let c = escape_drawtext(r"\\:");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_wrap_greedy() {
        let lines = wrap_words("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_wrap_long_word_stays_whole() {
        let lines = wrap_words("a supercalifragilistic word", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "word"]);
    }

    #[test]
    fn test_wrap_preserves_word_sequence() {
        let text = "Compound interest means   you earn interest on\tinterest, which snowballs over decades.";
        let words: Vec<&str> = text.split_whitespace().collect();
        for width in 1..=60 {
            let joined = wrap_words(text, width).join(" ");
            let rewrapped: Vec<&str> = joined.split_whitespace().collect();
            assert_eq!(rewrapped, words, "width {width}");
        }
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_words("   ", 40).is_empty());
        assert_eq!(wrap_caption("", 40), "");
    }

    #[test]
    fn test_wrap_caption_uses_line_feeds() {
        assert_eq!(wrap_caption("one two three", 8), "one two\nthree");
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(escape_filter_path(r"C:\fonts\a.ttf"), r"C\:/fonts/a.ttf");
    }
}
