//! Composite keys
//!
//! A composite key is `U+0000 objectType U+0000 attr1 U+0000 attr2 U+0000 ...`.
//! Because every composite key starts with `U+0000`, composite keys sort
//! before all simple keys and are skipped by plain range scans. A partial key
//! (object type plus leading attributes) is a prefix of every full key that
//! extends it, so `[partial, partial + U+10FFFF)` covers them all.

use crate::{Error, Result};

/// Delimiter and namespace marker
pub const COMPOSITE_KEY_NAMESPACE: char = '\u{0}';

/// Highest code point, used as the exclusive end of a prefix range
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Build a composite key from an object type and ordered attributes
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> Result<String> {
    validate_component(object_type)?;
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(COMPOSITE_KEY_NAMESPACE);
    key.push_str(object_type);
    key.push(COMPOSITE_KEY_NAMESPACE);
    for attribute in attributes {
        validate_component(attribute)?;
        key.push_str(attribute);
        key.push(COMPOSITE_KEY_NAMESPACE);
    }
    Ok(key)
}

/// Split a composite key back into object type and attributes
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>)> {
    let body = key
        .strip_prefix(COMPOSITE_KEY_NAMESPACE)
        .ok_or_else(|| Error::InvalidKey(format!("{:?} is not a composite key", key)))?;

    let mut parts = body.split(COMPOSITE_KEY_NAMESPACE);
    let object_type = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::InvalidKey("composite key without object type".to_string()))?
        .to_string();

    // The trailing delimiter yields one empty tail component
    let mut attributes: Vec<String> = parts.map(str::to_string).collect();
    match attributes.pop() {
        Some(tail) if tail.is_empty() => Ok((object_type, attributes)),
        _ => Err(Error::InvalidKey(
            "composite key is missing its trailing delimiter".to_string(),
        )),
    }
}

/// Whether a key lives in the composite namespace
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(COMPOSITE_KEY_NAMESPACE)
}

/// Exclusive upper bound of all keys that start with `prefix`
pub fn prefix_range_end(prefix: &str) -> String {
    let mut end = String::with_capacity(prefix.len() + 4);
    end.push_str(prefix);
    end.push(MAX_UNICODE_RUNE);
    end
}

fn validate_component(component: &str) -> Result<()> {
    if component.contains(COMPOSITE_KEY_NAMESPACE) || component.contains(MAX_UNICODE_RUNE) {
        return Err(Error::InvalidKey(format!(
            "{:?} contains a reserved code point",
            component
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_split() {
        let key = create_composite_key("model~number", &["EV-12V-80AH", "Battery-1"]).unwrap();
        assert_eq!(key, "\u{0}model~number\u{0}EV-12V-80AH\u{0}Battery-1\u{0}");

        let (object_type, attributes) = split_composite_key(&key).unwrap();
        assert_eq!(object_type, "model~number");
        assert_eq!(attributes, vec!["EV-12V-80AH", "Battery-1"]);
    }

    #[test]
    fn test_partial_key_is_prefix_of_full_key() {
        let partial = create_composite_key("model~number", &["EV-12V"]).unwrap();
        let full = create_composite_key("model~number", &["EV-12V", "Battery-9"]).unwrap();
        let other = create_composite_key("model~number", &["EV-12V-80AH", "Battery-1"]).unwrap();

        assert!(full.starts_with(&partial));
        assert!(!other.starts_with(&partial));
        assert!(full.as_str() < prefix_range_end(&partial).as_str());
    }

    #[test]
    fn test_reserved_code_points_rejected() {
        assert!(create_composite_key("idx", &["a\u{0}b"]).is_err());
        assert!(create_composite_key("idx\u{10FFFF}", &[]).is_err());
    }

    #[test]
    fn test_split_rejects_simple_key() {
        assert!(split_composite_key("Battery-1").is_err());
        assert!(!is_composite_key("Battery-1"));
    }

    #[test]
    fn test_no_attributes() {
        let key = create_composite_key("idx", &[]).unwrap();
        let (object_type, attributes) = split_composite_key(&key).unwrap();
        assert_eq!(object_type, "idx");
        assert!(attributes.is_empty());
    }
}
