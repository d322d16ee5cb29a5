//! Fallback-chain field extraction over loosely typed platform documents.
//!
//! Platforms change response shapes between tenants and API versions, so every
//! canonical field is read through an ordered list of dotted paths
//! (`"location.name"`, `"locations.0"`). The first path yielding a usable value
//! wins; when none does the field is `None`.

use serde_json::Value;
use url::Url;

/// First non-empty scalar along `paths`, rendered as text. Numbers count, so
/// numeric ids come back as their decimal form.
pub fn text(doc: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| lookup(doc, path).and_then(scalar))
}

/// First location along `paths`, flattened to a single string.
pub fn location(doc: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| lookup(doc, path).and_then(flatten_location))
}

/// First array along `paths`.
pub fn array<'a>(doc: &'a Value, paths: &[&str]) -> Option<&'a Vec<Value>> {
    paths
        .iter()
        .find_map(|path| lookup(doc, path).and_then(Value::as_array))
}

/// Resolve a dotted path. Numeric segments index into arrays.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, key| match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

const NAME_KEYS: [&str; 3] = ["name", "fullLocation", "locationName"];
const PART_KEYS: [&[&str]; 3] = [
    &["city", "addressLocality"],
    &["state", "region", "province", "addressRegion"],
    &["country", "addressCountry"],
];

/// Flatten a location value: strings pass through, objects give their display
/// name or `city, state, country`, arrays give their first usable element.
pub fn flatten_location(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => scalar(value),
        Value::Object(_) => {
            if let Some(name) = text(value, &NAME_KEYS) {
                return Some(name);
            }
            let parts: Vec<String> = PART_KEYS
                .iter()
                .filter_map(|keys| text(value, keys))
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Array(items) => items.iter().find_map(flatten_location),
        _ => None,
    }
}

/// Make a possibly relative link absolute against `base`.
pub fn absolute_url(base: &Url, link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    base.join(link).ok().map(String::from)
}
