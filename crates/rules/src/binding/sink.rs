//! [`FieldSink`]: write access to the bound record.

use careform_core::{CareformError, Result};
use serde_json::{Map, Value};

use crate::resolver::{parse_path, Segment};

/// Destination for values computed by a control.
pub trait FieldSink {
    /// Store `value` at the dotted `path`.
    fn set_field(&mut self, path: &str, value: Value) -> Result<()>;
}

/// Writes into a JSON document, creating intermediate objects as needed.
///
/// Paths use the same grammar as [`FieldResolver::lookup`]: `visits[0].date`
/// and `visits.0.date` both index into an existing `visits` array. Arrays are
/// never created or grown; `null` or missing parents become objects and any
/// other parent is an error. A rejected write leaves the document untouched.
///
/// [`FieldResolver::lookup`]: crate::resolver::FieldResolver::lookup
impl FieldSink for Value {
    fn set_field(&mut self, path: &str, value: Value) -> Result<()> {
        let segments = parse_path(path).ok_or_else(|| invalid(path, "malformed path"))?;
        check_writable(self, &segments, path)?;

        let mut current = self;
        for segment in &segments {
            current = child_mut(current, *segment, path)?;
        }
        *current = value;
        Ok(())
    }
}

/// Walk the existing part of the path and reject writes that would fail
/// halfway, before anything is created.
fn check_writable(root: &Value, segments: &[Segment<'_>], path: &str) -> Result<()> {
    let mut current = Some(root);
    for segment in segments {
        current = match (current, segment) {
            (None | Some(Value::Null), Segment::Key(_)) => None,
            (None | Some(Value::Null), Segment::Index(index)) => {
                return Err(invalid(path, &format!("no array to index with [{index}]")));
            }
            (Some(value), Segment::Key(key)) => match value {
                Value::Array(items) => Some(array_item(items, key, path)?),
                Value::Object(map) => map.get(*key),
                _ => return Err(invalid(path, &format!("parent of '{key}' is not an object"))),
            },
            (Some(value), Segment::Index(index)) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| invalid(path, &format!("no array to index with [{index}]")))?;
                Some(items.get(*index).ok_or_else(|| out_of_range(path, *index))?)
            }
        };
    }
    Ok(())
}

fn child_mut<'v>(current: &'v mut Value, segment: Segment<'_>, path: &str) -> Result<&'v mut Value> {
    match segment {
        Segment::Key(key) if current.is_array() => {
            let index = array_index(key, path)?;
            current
                .as_array_mut()
                .and_then(|items| items.get_mut(index))
                .ok_or_else(|| out_of_range(path, index))
        }
        Segment::Key(key) => Ok(ensure_object(current)
            .ok_or_else(|| invalid(path, &format!("parent of '{key}' is not an object")))?
            .entry(key)
            .or_insert(Value::Null)),
        Segment::Index(index) => current
            .as_array_mut()
            .ok_or_else(|| invalid(path, &format!("no array to index with [{index}]")))?
            .get_mut(index)
            .ok_or_else(|| out_of_range(path, index)),
    }
}

fn array_item<'v>(items: &'v [Value], key: &str, path: &str) -> Result<&'v Value> {
    let index = array_index(key, path)?;
    items.get(index).ok_or_else(|| out_of_range(path, index))
}

fn array_index(key: &str, path: &str) -> Result<usize> {
    key.parse()
        .map_err(|_| invalid(path, &format!("'{key}' is not an array index")))
}

/// Replace `null` by an empty object and borrow the map.
fn ensure_object(value: &mut Value) -> Option<&mut Map<String, Value>> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    value.as_object_mut()
}

fn out_of_range(path: &str, index: usize) -> CareformError {
    invalid(path, &format!("index {index} is out of range"))
}

fn invalid(path: &str, reason: &str) -> CareformError {
    CareformError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FieldResolver;
    use serde_json::json;

    #[test]
    fn writes_nested_path_creating_objects() {
        let mut record = json!({ "encounter": { "cd4": 180 } });
        record.set_field("computed.stage", json!("stage-4")).unwrap();
        record.set_field("encounter.stage", json!("stage-4")).unwrap();
        assert_eq!(
            record,
            json!({
                "encounter": { "cd4": 180, "stage": "stage-4" },
                "computed": { "stage": "stage-4" }
            })
        );
    }

    #[test]
    fn null_root_and_parents_become_objects() {
        let mut record = Value::Null;
        record.set_field("a.b", json!(1)).unwrap();
        assert_eq!(record, json!({ "a": { "b": 1 } }));

        let mut record = json!({ "a": null });
        record.set_field("a.b", json!(2)).unwrap();
        assert_eq!(record, json!({ "a": { "b": 2 } }));
    }

    #[test]
    fn overwrites_existing_value() {
        let mut record = json!({ "events": [{ "type": "old" }] });
        record.set_field("events", json!([])).unwrap();
        assert_eq!(record, json!({ "events": [] }));
    }

    #[test]
    fn scalar_parent_is_rejected_without_changes() {
        let mut record = json!({ "a": 5 });
        let err = record.set_field("a.b.c", json!(true)).unwrap_err();
        assert!(matches!(err, CareformError::InvalidPath { .. }));
        assert_eq!(record, json!({ "a": 5 }));

        let mut record = json!({ "a": { "b": "text" } });
        assert!(record.set_field("a.b.c", json!(1)).is_err());
        assert_eq!(record, json!({ "a": { "b": "text" } }));
    }

    #[test]
    fn empty_segments_are_rejected() {
        let mut record = json!({});
        assert!(record.set_field("", json!(1)).is_err());
        assert!(record.set_field("a..b", json!(1)).is_err());
        assert!(record.set_field("a.", json!(1)).is_err());
        assert_eq!(record, json!({}));
    }

    #[test]
    fn indexes_into_existing_arrays_both_ways() {
        let mut record = json!({ "visits": [{ "events": [] }, { "date": "2024-02-01" }] });
        record.set_field("visits[0].events", json!([1])).unwrap();
        record.set_field("visits.1.stage", json!("stage-2")).unwrap();
        assert_eq!(
            record,
            json!({ "visits": [{ "events": [1] }, { "date": "2024-02-01", "stage": "stage-2" }] })
        );
    }

    #[test]
    fn written_value_is_found_by_lookup() {
        let mut record = json!({ "visits": [{ "events": [] }], "matrix": [[0, 0]] });
        for path in ["visits[0].events", "visits.0.note", "encounter.stage", "matrix[0][1]"] {
            record.set_field(path, json!(path)).unwrap();
            assert_eq!(FieldResolver::lookup(&record, path), Some(&json!(path)), "{path}");
        }
        assert!(record.get("visits[0]").is_none());
    }

    #[test]
    fn arrays_are_never_created_or_grown() {
        let mut record = json!({ "visits": [{ "events": [] }] });
        let original = record.clone();

        for path in ["visits[3].events", "visits.3.events", "visits.first", "items[0]", "a.b[0].c"] {
            let err = record.set_field(path, json!(1)).unwrap_err();
            assert!(matches!(err, CareformError::InvalidPath { .. }), "{path}");
        }
        assert_eq!(record, original);
    }
}
