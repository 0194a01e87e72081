use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").unwrap());
static LD_JSON_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)type\s*=\s*["']?\s*application/ld\+json\s*["']?"#).unwrap()
});

/// Parse every JSON-LD script block in `html`, in document order.
///
/// Blocks that are not valid JSON are skipped; they never abort the scan.
pub fn extract_json_ld(html: &str) -> Vec<Value> {
    let mut values = Vec::new();

    for (i, caps) in SCRIPT_RE.captures_iter(html).enumerate() {
        if !LD_JSON_TYPE_RE.is_match(&caps[1]) {
            continue;
        }
        let body = unwrap_markup(&caps[2]);
        match serde_json::from_str::<Value>(body) {
            Ok(value) => values.push(value),
            Err(e) => debug!("Skipping unparseable JSON-LD block #{}: {}", i, e),
        }
    }

    values
}

/// Strip a CDATA section or HTML comment some CMSes wrap around the payload.
fn unwrap_markup(body: &str) -> &str {
    let mut s = body.trim();
    if let Some(inner) = s
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        s = inner.trim();
    }
    if let Some(inner) = s.strip_prefix("<!--").and_then(|rest| rest.strip_suffix("-->")) {
        s = inner.trim();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_blocks_in_document_order() {
        let html = r#"
            <script type="application/ld+json">{"@type":"WebSite"}</script>
            <script>var x = 1;</script>
            <script type="application/ld+json">{"@type":"Recipe"}</script>
        "#;
        let blocks = extract_json_ld(html);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["@type"], "WebSite");
        assert_eq!(blocks[1]["@type"], "Recipe");
    }

    #[test]
    fn content_type_is_case_insensitive() {
        let html = r#"<SCRIPT data-x="1" TYPE='Application/LD+JSON'>{"a":1}</SCRIPT>"#;
        assert_eq!(extract_json_ld(html).len(), 1);
    }

    #[test]
    fn unquoted_type_attribute() {
        let html = r#"<script type=application/ld+json>[1, 2]</script>"#;
        let blocks = extract_json_ld(html);
        assert_eq!(blocks, vec![serde_json::json!([1, 2])]);
    }

    #[test]
    fn invalid_block_is_skipped_not_fatal() {
        let html = r#"
            <script type="application/ld+json">{ "broken": </script>
            <script type="application/ld+json">{"@type":"Recipe","name":"Soup"}</script>
        "#;
        let blocks = extract_json_ld(html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["name"], "Soup");
    }

    #[test]
    fn ignores_other_script_types() {
        let html = r#"<script type="application/json">{"@type":"Recipe"}</script>"#;
        assert!(extract_json_ld(html).is_empty());
    }

    #[test]
    fn cdata_wrapped_payload() {
        let html = "<script type=\"application/ld+json\">\n<![CDATA[ {\"@type\":\"Recipe\"} ]]>\n</script>";
        let blocks = extract_json_ld(html);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn no_scripts() {
        assert!(extract_json_ld("<html><body>Just text</body></html>").is_empty());
        assert!(extract_json_ld("").is_empty());
    }
}
