use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Words longer than this many characters count as significant.
const SIGNIFICANT_WORD_LEN: usize = 3;

/// Truncates `s` to at most `max_width` terminal columns, appending "..."
/// when something was cut.
///
/// Widths of 3 or less leave no room for the ellipsis, so the prefix that
/// fits is returned as-is. Borrowed when no truncation is needed.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let target_width = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut width = 0;
    let mut cut = None;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if cut.is_none() && width + w > target_width {
            cut = Some(idx);
        }
        if width + w > max_width {
            let end = cut.unwrap_or(idx);
            return if max_width <= ELLIPSIS_WIDTH {
                Cow::Owned(s[..end].to_string())
            } else {
                Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
            };
        }
        width += w;
    }
    Cow::Borrowed(s)
}

fn is_control(b: u8) -> bool {
    b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
}

/// Strip terminal control characters and ANSI escape sequences.
///
/// Article titles and bodies come from a remote service and are printed
/// straight into the terminal, so CSI (`ESC [`) and OSC (`ESC ]`) sequences,
/// bare ESC and C0 controls other than tab/newline/CR are removed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| b == 0x1b || is_control(b)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            0x1b if bytes.get(i + 1) == Some(&b'[') => {
                i += 2;
                while i < bytes.len() {
                    let c = bytes[i];
                    i += 1;
                    if (0x40..=0x7e).contains(&c) {
                        break;
                    }
                }
            }
            0x1b if bytes.get(i + 1) == Some(&b']') => {
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b if b == 0x1b || is_control(b) => i += 1,
            _ => {
                let start = i;
                while i < bytes.len() && bytes[i] != 0x1b && !is_control(bytes[i]) {
                    i += 1;
                }
                // Only ASCII bytes stop the run, so this is a char boundary.
                out.push_str(&s[start..i]);
            }
        }
    }
    Cow::Owned(out)
}

/// Reduce an HTML article body to plain text.
///
/// Block-level closing tags and `<br>` become line breaks, every other tag
/// is dropped, and the handful of entities editors actually emit are
/// decoded. Runs of blank lines collapse to one.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            // Unterminated tag: keep the remainder as text.
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let tag = after[..close].trim().to_ascii_lowercase();
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");
        let is_break = name == "br"
            || (tag.starts_with('/')
                && matches!(
                    name,
                    "p" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote"
                ));
        if is_break {
            text.push('\n');
        }
        rest = &after[close + 1..];
    }
    text.push_str(rest);

    let decoded = decode_entities(&text);

    let mut out = String::with_capacity(decoded.len());
    let mut blank_run = 0;
    for line in decoded.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Up to `max` lower-cased title words longer than three characters, in
/// title order. Words are split on single spaces only.
pub fn significant_words(title: &str, max: usize) -> Vec<String> {
    title
        .to_lowercase()
        .split(' ')
        .filter(|word| word.chars().count() > SIGNIFICANT_WORD_LEN)
        .take(max)
        .map(str::to_string)
        .collect()
}

/// Short plain-text description of an HTML body: the first `max_chars`
/// characters followed by "..." when the text is longer.
pub fn describe(body_html: &str, max_chars: usize) -> String {
    let text = html_to_text(body_html).replace('\n', " ");
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", text[..cut].trim(), ELLIPSIS),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("12345", 5), "12345");
    }

    #[test]
    fn test_cjk_truncation() {
        // CJK characters are two columns wide
        assert_eq!(truncate_to_width("你好世界", 7), "你好...");
        assert_eq!(truncate_to_width("你好世界", 5), "你...");
    }

    #[test]
    fn test_narrow_widths_skip_ellipsis() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
        assert_eq!(truncate_to_width("你好", 1), "");
        assert_eq!(truncate_to_width("Hi", 3), "Hi");
    }

    #[test]
    fn test_strip_clean_text_is_borrowed() {
        let input = "line1\nline2\ttabbed";
        assert!(matches!(strip_control_chars(input), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_escape_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(
            strip_control_chars("\x1b]0;title\x07safe \x1b]0;t\x1b\\text"),
            "safe text"
        );
        assert_eq!(strip_control_chars("a\x00b\x7fc\x1bd"), "abcd");
        assert_eq!(strip_control_chars("Bakı \x1b[1mxəbər\x1b[0m"), "Bakı xəbər");
    }

    #[test]
    fn test_html_to_text_paragraphs() {
        let html = "<p>First <strong>bold</strong> line.</p><p>Second&nbsp;line &amp; more</p>";
        assert_eq!(html_to_text(html), "First bold line.\nSecond line & more");
    }

    #[test]
    fn test_html_to_text_breaks_and_blank_runs() {
        let html = "<h2>Title</h2><p><br></p><p><br/></p><ul><li>one</li><li>two</li></ul>";
        assert_eq!(html_to_text(html), "Title\n\none\ntwo");
    }

    #[test]
    fn test_html_to_text_unterminated_tag() {
        assert_eq!(html_to_text("a < b"), "a < b");
    }

    #[test]
    fn test_significant_words() {
        assert_eq!(
            significant_words("Central Bank Raises Key Interest Rate", 3),
            vec!["central", "bank", "raises"]
        );
        assert!(significant_words("A day at sea", 3).is_empty());
        // Counted in characters, not bytes
        assert_eq!(significant_words("Şəki çay", 3), vec!["şəki"]);
    }

    #[test]
    fn test_describe_truncates() {
        let body = format!("<p>{}</p>", "x".repeat(200));
        let desc = describe(&body, 160);
        assert_eq!(desc.chars().count(), 163);
        assert!(desc.ends_with("..."));

        assert_eq!(describe("<p>short</p>", 160), "short");
    }
}
