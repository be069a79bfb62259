//! Pattern-based removal of active markup.
//!
//! Strips `<script>` blocks, `<meta http-equiv="refresh">` tags and `<form>`
//! blocks from proxied pages. This is regex-only: nested or malformed markup
//! can be under- or over-matched, so it is not a security boundary.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("script pattern compiles"));

static META_REFRESH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\b[^>]*http-equiv\s*=\s*["']?refresh["']?[^>]*>"#).expect("meta refresh pattern compiles")
});

static FORM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<form\b.*?</form\s*>").expect("form pattern compiles"));

/// Remove scripts, meta refreshes and forms (including their content).
pub fn strip_active_content(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let without_refresh = META_REFRESH_RE.replace_all(&without_scripts, "");
    FORM_RE.replace_all(&without_refresh, "").into_owned()
}

/// Whether `target` contains any of the configured patterns.
pub fn matches_any(target: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| !p.is_empty() && target.contains(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script_and_form() {
        let html = "<p>keep</p><script>alert(1)</script><form action=\"/x\"><input name=\"q\"></form><p>also</p>";
        let cleaned = strip_active_content(html);
        assert_eq!(cleaned, "<p>keep</p><p>also</p>");
    }

    #[test]
    fn test_strips_multiline_and_uppercase_scripts() {
        let html = "<div>\n<SCRIPT type=\"text/javascript\">\nvar a = '<b>';\n</SCRIPT >\n</div>";
        let cleaned = strip_active_content(html);
        assert!(!cleaned.to_lowercase().contains("script"));
        assert!(cleaned.contains("<div>"));
    }

    #[test]
    fn test_strips_meta_refresh_only() {
        let html = r#"<head><meta charset="utf-8"><meta http-equiv="refresh" content="0;url=https://evil.example"></head>"#;
        let cleaned = strip_active_content(html);
        assert_eq!(cleaned, r#"<head><meta charset="utf-8"></head>"#);
    }

    #[test]
    fn test_each_script_removed_independently() {
        let html = "<script>a()</script>middle<script src=\"b.js\"></script>";
        assert_eq!(strip_active_content(html), "middle");
    }

    #[test]
    fn test_unclosed_script_left_alone() {
        let html = "<p>x</p><script>never closed";
        assert_eq!(strip_active_content(html), html);
    }

    #[test]
    fn test_plain_markup_untouched() {
        let html = "<article><h1>Title</h1><p>Body with <a href=\"/s\">link</a></p></article>";
        assert_eq!(strip_active_content(html), html);
    }

    #[test]
    fn test_matches_any() {
        let patterns = vec!["google.com/search".to_string()];
        assert!(matches_any("https://www.google.com/search?q=x", &patterns));
        assert!(!matches_any("https://www.google.com/maps", &patterns));
        assert!(!matches_any("https://x", &[String::new()]));
    }
}
