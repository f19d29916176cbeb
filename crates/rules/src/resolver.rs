//! Field lookup into record and patient documents.
//!
//! Paths are dot-separated object keys. A segment may carry `[n]` index
//! suffixes (`visits[0].date`) and purely numeric segments index arrays too
//! (`visits.0.date`). Lookups never fail loudly: a missing key, an index out
//! of range or a malformed path all resolve to absent.

use careform_core::Scalar;
use serde_json::Value;

use crate::schema::FieldRef;

/// Shared `null` used where a missing document must still be borrowed.
pub(crate) static NULL: Value = Value::Null;

/// Resolves field paths against the current record or the patient document.
pub struct FieldResolver;

impl FieldResolver {
    /// Return the raw JSON node at `path`, if any.
    pub fn lookup<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
        let mut current = source;
        for segment in parse_path(path)? {
            current = match segment {
                Segment::Key(key) => step(current, key)?,
                Segment::Index(index) => current.as_array()?.get(index)?,
            };
        }
        Some(current)
    }

    /// Return the scalar at `path`; `None` means absent.
    pub fn resolve(source: &Value, path: &str) -> Option<Scalar> {
        Self::lookup(source, path).and_then(Scalar::from_json)
    }

    /// Resolve a branch's field reference against the matching document.
    pub fn resolve_ref(field: &FieldRef, data: &Value, patient: &Value) -> Option<Scalar> {
        match field {
            FieldRef::Data(path) => Self::resolve(data, path),
            FieldRef::Patient(path) => Self::resolve(patient, path),
        }
    }
}

fn step<'a>(current: &'a Value, key: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// One step of a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'p> {
    /// Object key, or an array index when the parent is an array.
    Key(&'p str),
    /// Bracketed `[n]` index.
    Index(usize),
}

/// Parse a field path into its steps. `None` for an empty or malformed path.
///
/// Readers and writers share this grammar so a value written to a path is
/// found again at the same path.
pub(crate) fn parse_path(path: &str) -> Option<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (key, indices) = split_segment(part)?;
        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }
        segments.extend(indices.into_iter().map(Segment::Index));
    }
    Some(segments)
}

/// Split `name[1][2]` into `("name", [1, 2])`.
fn split_segment(segment: &str) -> Option<(&str, Vec<usize>)> {
    let (key, mut rest) = match segment.find('[') {
        Some(i) => (&segment[..i], &segment[i..]),
        None => (segment, ""),
    };

    let mut indices = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indices.push(inner[..close].trim().parse().ok()?);
        rest = &inner[close + 1..];
    }

    if key.is_empty() && indices.is_empty() {
        return None;
    }
    Some((key, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "patient": { "age": 0, "consented": false, "name": "" },
            "visits": [
                { "date": "2024-01-01", "weight": 61.5 },
                { "date": "2024-02-01", "weight": null }
            ],
            "matrix": [[1, 2], [3, 4]]
        })
    }

    #[test]
    fn resolves_nested_keys() {
        let data = record();
        assert_eq!(FieldResolver::resolve(&data, "patient.age"), Some(Scalar::Number(0.0)));
        assert_eq!(FieldResolver::resolve(&data, "patient.consented"), Some(Scalar::Bool(false)));
        assert_eq!(FieldResolver::resolve(&data, "patient.name"), Some(Scalar::String(String::new())));
    }

    #[test]
    fn resolves_array_indices_both_ways() {
        let data = record();
        let expected = Some(Scalar::String("2024-02-01".into()));
        assert_eq!(FieldResolver::resolve(&data, "visits[1].date"), expected);
        assert_eq!(FieldResolver::resolve(&data, "visits.1.date"), expected);
        assert_eq!(FieldResolver::resolve(&data, "matrix[1][0]"), Some(Scalar::Number(3.0)));
    }

    #[test]
    fn missing_or_null_is_absent() {
        let data = record();
        assert_eq!(FieldResolver::resolve(&data, "patient.height"), None);
        assert_eq!(FieldResolver::resolve(&data, "visits[1].weight"), None);
        assert_eq!(FieldResolver::resolve(&data, "visits[7].date"), None);
        assert_eq!(FieldResolver::resolve(&data, "patient.age.years"), None);
        assert_eq!(FieldResolver::resolve(&Value::Null, "anything"), None);
    }

    #[test]
    fn objects_are_not_scalars() {
        let data = record();
        assert_eq!(FieldResolver::resolve(&data, "patient"), None);
        assert!(FieldResolver::lookup(&data, "patient").unwrap().is_object());
    }

    #[test]
    fn malformed_paths_are_absent() {
        let data = record();
        assert_eq!(FieldResolver::lookup(&data, ""), None);
        assert_eq!(FieldResolver::lookup(&data, "patient..age"), None);
        assert_eq!(FieldResolver::lookup(&data, "visits[x].date"), None);
        assert_eq!(FieldResolver::lookup(&data, "visits[0"), None);
    }

    #[test]
    fn parses_paths_into_segments() {
        assert_eq!(
            parse_path("visits[0].events"),
            Some(vec![Segment::Key("visits"), Segment::Index(0), Segment::Key("events")])
        );
        assert_eq!(
            parse_path("matrix.1[0]"),
            Some(vec![Segment::Key("matrix"), Segment::Key("1"), Segment::Index(0)])
        );
        assert_eq!(parse_path(""), None);
        assert_eq!(parse_path("a..b"), None);
    }

    #[test]
    fn resolve_ref_picks_document() {
        let data = json!({ "gender": "from-record" });
        let patient = json!({ "gender": "female" });
        assert_eq!(
            FieldResolver::resolve_ref(&FieldRef::Patient("gender".into()), &data, &patient),
            Some(Scalar::String("female".into()))
        );
        assert_eq!(
            FieldResolver::resolve_ref(&FieldRef::Data("gender".into()), &data, &patient),
            Some(Scalar::String("from-record".into()))
        );
    }
}
