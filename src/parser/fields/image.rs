use reqwest::Url;
use serde_json::Value;

const URL_FIELDS: &[&str] = &["url", "contentUrl"];

/// First usable image reference: a string, an `ImageObject`'s URL, or the
/// first resolvable entry of a list. Nested containers are followed.
pub fn first_image(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Object(obj) => URL_FIELDS
            .iter()
            .find_map(|field| first_image(obj.get(*field))),
        Value::Array(items) => items.iter().find_map(|item| first_image(Some(item))),
        _ => None,
    }
}

/// Resolve `image` against the page URL. Absolute URLs and unparseable bases
/// pass through unchanged.
pub fn resolve_image(image: String, page_url: &str) -> String {
    if Url::parse(&image).is_ok() {
        return image;
    }
    Url::parse(page_url)
        .and_then(|base| base.join(&image))
        .map(|u| u.to_string())
        .unwrap_or(image)
}
