//! In-process predicate evaluation and ordering over records

use modelres_core::ir::{Direction, FieldPath, OrderKey, Predicate};
use modelres_core::types::{Record, Value};
use std::cmp::Ordering;

static NULL: Value = Value::Null;

/// Whether a record satisfies a predicate
pub fn matches(record: &Record, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Equality(eq) => {
            let segments = eq.field.segments();
            value_matches(record.get(eq.field.root()), &segments[1..], &eq.value)
        }
        Predicate::And(left, right) => matches(record, left) && matches(record, right),
        Predicate::Or(left, right) => matches(record, left) || matches(record, right),
    }
}

// Arrays match when any element matches, which covers both to-many
// relations and membership in scalar arrays.
fn value_matches(value: Option<&Value>, rest: &[String], expected: &Value) -> bool {
    let Some(value) = value else {
        return false;
    };

    match (value, rest.split_first()) {
        (_, None) if values_equal(value, expected) => true,
        (Value::Array(items), _) => items
            .iter()
            .any(|item| value_matches(Some(item), rest, expected)),
        (Value::Object(map), Some((segment, tail))) => value_matches(map.get(segment), tail, expected),
        _ => false,
    }
}

/// Equality used by filters. Untyped paths carry string literals, so a
/// string literal also matches the stored value's text form.
pub fn values_equal(stored: &Value, expected: &Value) -> bool {
    if stored == expected {
        return true;
    }
    match (stored, expected) {
        (Value::Number(_) | Value::Bool(_), Value::String(s)) => stored.to_string() == *s,
        _ => false,
    }
}

/// The value ordering uses for a path: the first element wherever the path
/// crosses an array.
pub fn sort_value<'a>(record: &'a Record, path: &FieldPath) -> &'a Value {
    let mut current = record.get(path.root()).unwrap_or(&NULL);
    for segment in &path.segments()[1..] {
        current = match first(current) {
            Value::Object(map) => map.get(segment).unwrap_or(&NULL),
            _ => &NULL,
        };
    }
    current
}

fn first(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().map(first).unwrap_or(&NULL),
        other => other,
    }
}

/// Compare two records by ordering keys, each key breaking ties left by the
/// previous one
pub fn compare(a: &Record, b: &Record, keys: &[OrderKey]) -> Ordering {
    for key in keys {
        let ord = sort_value(a, &key.field).total_cmp(sort_value(b, &key.field));
        let ord = match key.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelres_core::types::Attributes;
    use std::collections::BTreeMap;

    fn object(pairs: &[(&str, Value)]) -> Value {
        Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn record() -> Record {
        Record::from_attributes(
            "id",
            Attributes::new()
                .with("id", 1.0)
                .with("ip", "10.0.0.1")
                .with("tags", Value::Array(vec![Value::from("db"), Value::from("prod")]))
                .with("owner", object(&[("name", Value::from("frank"))]))
                .with(
                    "teams",
                    Value::Array(vec![
                        object(&[("name", Value::from("ops")), ("size", Value::from(3.0))]),
                        object(&[("name", Value::from("dev"))]),
                    ]),
                ),
        )
    }

    #[test]
    fn test_scalar_equality() {
        let r = record();
        assert!(matches(&r, &Predicate::equals(FieldPath::field("ip"), "10.0.0.1")));
        assert!(!matches(&r, &Predicate::equals(FieldPath::field("ip"), "10.0.0.2")));
        assert!(!matches(&r, &Predicate::equals(FieldPath::field("missing"), "x")));
    }

    #[test]
    fn test_traversal_and_arrays() {
        let r = record();
        assert!(matches(&r, &Predicate::equals(FieldPath::parse("owner__name"), "frank")));
        assert!(matches(&r, &Predicate::equals(FieldPath::field("tags"), "prod")));
        assert!(matches(&r, &Predicate::equals(FieldPath::parse("teams__name"), "dev")));
        assert!(matches(&r, &Predicate::equals(FieldPath::parse("teams__size"), "3")));
        assert!(!matches(&r, &Predicate::equals(FieldPath::parse("ip__x"), "1")));
    }

    #[test]
    fn test_and_or() {
        let r = record();
        let yes = Predicate::equals(FieldPath::field("ip"), "10.0.0.1");
        let no = Predicate::equals(FieldPath::field("ip"), "nope");

        assert!(!matches(&r, &yes.clone().and(no.clone())));
        assert!(matches(&r, &no.clone().or(yes.clone())));
        assert!(matches(&r, &no.clone().or(yes.clone()).and(yes.clone())));
        assert!(!matches(&r, &yes.or(no.clone()).and(no)));
    }

    #[test]
    fn test_sort_value_takes_first_array_element() {
        let r = record();
        assert_eq!(sort_value(&r, &FieldPath::parse("teams__name")), &Value::from("ops"));
        assert_eq!(sort_value(&r, &FieldPath::parse("owner__age")), &Value::Null);
    }

    #[test]
    fn test_compare_breaks_ties_in_sequence() {
        let a = Record::from_attributes("id", Attributes::new().with("id", 1.0).with("g", "x").with("n", 2.0));
        let b = Record::from_attributes("id", Attributes::new().with("id", 2.0).with("g", "x").with("n", 1.0));
        let keys = vec![
            OrderKey::asc(FieldPath::field("g")),
            OrderKey::desc(FieldPath::field("n")),
        ];
        assert_eq!(compare(&a, &b, &keys), Ordering::Less);
        assert_eq!(compare(&a, &b, &keys[..1]), Ordering::Equal);
    }
}
