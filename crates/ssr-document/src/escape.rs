//! HTML and inline-script escaping.

/// Escape text content: `&`, `<`, `>` and `'`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value: text escaping plus `"`.
pub fn escape_attr(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}

/// Make serialized JSON safe to embed in an inline `<script>`.
///
/// Rewrites every `<` as `\u003c` so the payload cannot close the script
/// element. The result parses to the same JSON value.
pub fn escape_json_for_script(json: &str) -> String {
    json.replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x')</script> & co"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co"
        );
        assert_eq!(escape_html(r#"say "hi""#), r#"say "hi""#);
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a "b" <c>"#), "a &quot;b&quot; &lt;c&gt;");
        assert_eq!(escape_attr("&quot;"), "&amp;quot;");
    }

    #[test]
    fn test_escape_json_for_script() {
        let json = serde_json::json!({"html": "</script><script>"}).to_string();
        let escaped = escape_json_for_script(&json);

        assert!(!escaped.contains('<'));
        assert!(escaped.contains(r"\u003c/script>"));

        let back: serde_json::Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(back["html"], "</script><script>");
    }
}
