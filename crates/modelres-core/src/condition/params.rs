//! Parameter map decoding
//!
//! Placeholders in a condition are resolved against a flat
//! `key=value,key=value,` string supplied next to it.

use super::error::{ConditionError, Result};
use std::collections::HashMap;

/// Mapping from parameter name to its raw string value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    values: HashMap<String, String>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `k1=v1,k2=v2,` into a map.
    ///
    /// Empty segments are skipped, keys are trimmed and values kept verbatim.
    /// The last occurrence of a key wins.
    pub fn decode(text: &str) -> Result<Self> {
        let mut values = HashMap::new();

        for segment in text.split(',') {
            if segment.trim().is_empty() {
                continue;
            }

            let mut parts = segment.split('=');
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(ConditionError::MalformedParameters {
                    segment: segment.to_string(),
                });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(ConditionError::MalformedParameters {
                    segment: segment.to_string(),
                });
            }

            values.insert(key.to_string(), value.to_string());
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_trailing_separator() {
        let params = ParameterMap::decode("p1=192.168.1.1,p2=frank,").unwrap();

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("p1"), Some("192.168.1.1"));
        assert_eq!(params.get("p2"), Some("frank"));
    }

    #[test]
    fn test_empty_input_is_empty_map() {
        assert!(ParameterMap::decode("").unwrap().is_empty());
        assert!(ParameterMap::decode(",, ,").unwrap().is_empty());
    }

    #[test]
    fn test_last_occurrence_wins() {
        let params = ParameterMap::decode("a=1,a=2").unwrap();
        assert_eq!(params.get("a"), Some("2"));
    }

    #[test]
    fn test_keys_trimmed_values_verbatim() {
        let params = ParameterMap::decode(" name = John Smith ").unwrap();
        assert_eq!(params.get("name"), Some(" John Smith "));
    }

    #[test]
    fn test_empty_value_is_allowed() {
        let params = ParameterMap::decode("a=").unwrap();
        assert_eq!(params.get("a"), Some(""));
    }

    #[test]
    fn test_malformed_segments() {
        for text in ["a=1,b", "a=1=2", "=v"] {
            let err = ParameterMap::decode(text).unwrap_err();
            assert!(
                matches!(err, ConditionError::MalformedParameters { .. }),
                "expected malformed error for {:?}",
                text
            );
        }

        assert_eq!(
            ParameterMap::decode("ok=1,broken").unwrap_err(),
            ConditionError::MalformedParameters {
                segment: "broken".to_string()
            }
        );
    }
}
