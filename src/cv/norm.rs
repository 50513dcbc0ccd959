use serde_json::{json, Map, Value};
use time::OffsetDateTime;

/// The ordered item lists a CV document carries.
pub const SECTIONS: [&str; 7] = [
    "experience",
    "education",
    "projectsHighlight",
    "awards",
    "skills",
    "volunteering",
    "languages",
];

/// Sections whose items may carry a `{text, url}` link sub-object.
const LINKED_SECTIONS: [&str; 2] = ["projectsHighlight", "awards"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("CV data must be a JSON object")]
    NotAnObject,
}

/// Fully-defaulted document, served when nothing is stored yet.
pub fn default_document() -> Value {
    let mut doc = Map::new();
    doc.insert("summary".into(), Value::String(String::new()));
    for section in SECTIONS {
        doc.insert(section.into(), Value::Array(Vec::new()));
    }
    doc.insert("personalInfo".into(), default_personal_info());
    Value::Object(doc)
}

fn default_personal_info() -> Value {
    json!({
        "name": "",
        "title": "",
        "profileImage": "",
        "headerText": "",
        "socialLinks": []
    })
}

/// Coerces a loosely-shaped document into the complete, consistent shape.
///
/// Total for any JSON object: missing sections default to empty containers,
/// every list item gets an `id` (kept when present) and a `position` equal
/// to its array index (always overwritten), and link sub-objects become
/// `{text, url}` pairs. Non-object input is the one rejected case.
///
/// Idempotent: a second pass changes nothing, since generated ids survive
/// the first pass and positions are re-derived to the same values.
pub fn normalize(doc: Value) -> Result<Value, NormalizeError> {
    let Value::Object(mut map) = doc else {
        return Err(NormalizeError::NotAnObject);
    };

    let summary = match map.remove("summary") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    map.insert("summary".into(), Value::String(summary));

    let info = map.remove("personalInfo");
    map.insert("personalInfo".into(), normalize_personal_info(info));

    let now_millis = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
    for section in SECTIONS {
        let items = match map.remove(section) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let coerce_links = LINKED_SECTIONS.contains(&section);
        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| normalize_item(section, index, item, now_millis, coerce_links))
            .collect();
        map.insert(section.into(), Value::Array(items));
    }

    Ok(Value::Object(map))
}

fn normalize_personal_info(info: Option<Value>) -> Value {
    let mut obj = match info {
        Some(Value::Object(obj)) => obj,
        _ => Map::new(),
    };
    for field in ["name", "title", "profileImage", "headerText"] {
        if !matches!(obj.get(field), Some(Value::String(_))) {
            obj.insert(field.into(), Value::String(String::new()));
        }
    }
    if !matches!(obj.get("socialLinks"), Some(Value::Array(_))) {
        obj.insert("socialLinks".into(), Value::Array(Vec::new()));
    }
    Value::Object(obj)
}

fn normalize_item(
    section: &str,
    index: usize,
    item: Value,
    now_millis: i64,
    coerce_links: bool,
) -> Value {
    // Items are expected to be objects; anything else passes through
    // untouched rather than failing the whole document.
    let Value::Object(mut obj) = item else {
        return item;
    };

    let has_id = matches!(obj.get("id"), Some(v) if !v.is_null());
    if !has_id {
        obj.insert(
            "id".into(),
            Value::String(format!("{section}-{index}-{now_millis}")),
        );
    }
    // Last-write-wins: the array order is authoritative.
    obj.insert("position".into(), Value::Number(index.into()));

    if coerce_links {
        // Project/award items carry a `links` array of `{text, url}` pairs;
        // every entry is completed with empty-string defaults.
        match obj.remove("links") {
            Some(Value::Array(entries)) => {
                let entries = entries
                    .into_iter()
                    .map(|entry| match entry {
                        Value::Object(mut l) => {
                            if !matches!(l.get("text"), Some(Value::String(_))) {
                                l.insert("text".into(), Value::String(String::new()));
                            }
                            if !matches!(l.get("url"), Some(Value::String(_))) {
                                l.insert("url".into(), Value::String(String::new()));
                            }
                            Value::Object(l)
                        }
                        Value::String(url) => json!({ "text": "", "url": url }),
                        other => other,
                    })
                    .collect();
                obj.insert("links".into(), Value::Array(entries));
            }
            Some(other) => {
                obj.insert("links".into(), other);
            }
            None => {}
        }
        // A singular `link` is tolerated and coerced the same way.
        if let Some(link) = obj.remove("link") {
            match link {
                Value::Object(mut l) => {
                    if !matches!(l.get("text"), Some(Value::String(_))) {
                        l.insert("text".into(), Value::String(String::new()));
                    }
                    if !matches!(l.get("url"), Some(Value::String(_))) {
                        l.insert("url".into(), Value::String(String::new()));
                    }
                    obj.insert("link".into(), Value::Object(l));
                }
                Value::String(url) => {
                    obj.insert("link".into(), json!({ "text": "", "url": url }));
                }
                Value::Null => {}
                other => {
                    obj.insert("link".into(), other);
                }
            }
        }
    }

    Value::Object(obj)
}
