use remote::{ContextPath, PathSegment, ValueType};
use value::{Record, Value, ValueKind};

use super::EvalError;

/// Walks the segments of `path` down from `root`. `Ok(None)` when nothing is there: a missing
/// key, an index out of range or a null/absent value on the way.
pub(super) fn descend<'a>(root: &'a Value, path: &ContextPath) -> Result<Option<&'a Value>, EvalError> {
    descend_segments(root, &path.segments, path)
}

/// Same as [`descend`] for the `args` and `env` records, whose first segment is always a key.
pub(super) fn descend_record<'a>(record: &'a Record, path: &ContextPath) -> Result<Option<&'a Value>, EvalError> {
    match path.segments.split_first() {
        Some((PathSegment::Key(key), rest)) => match record.get(key) {
            Some(value) => descend_segments(value, rest, path),
            None => Ok(None),
        },
        Some((PathSegment::Index(_), _)) => Err(EvalError::type_mismatch(path, "Sequence", ValueKind::Record)),
        None => Ok(None),
    }
}

fn descend_segments<'a>(
    root: &'a Value,
    segments: &[PathSegment],
    path: &ContextPath,
) -> Result<Option<&'a Value>, EvalError> {
    let mut value = root;
    for segment in segments {
        let Some(present) = value.as_present() else {
            return Ok(None);
        };
        let next = match (segment, present) {
            (_, Value::Null) => None,
            (PathSegment::Key(key), Value::Record(record)) => record.get(key),
            (PathSegment::Index(index), Value::Sequence(items)) => items.get(*index),
            (PathSegment::Key(_), found) => return Err(EvalError::type_mismatch(path, "Record", found.kind())),
            (PathSegment::Index(_), found) => return Err(EvalError::type_mismatch(path, "Sequence", found.kind())),
        };
        match next {
            Some(next) => value = next,
            None => return Ok(None),
        }
    }
    Ok(Some(value))
}

/// Checks what was found against the type the path was built with.
pub(super) fn check(found: Option<&Value>, path: &ContextPath) -> Result<Value, EvalError> {
    let Some(value) = found.filter(|value| !value.is_nullish()) else {
        return if path.expected.is_optional() {
            Ok(Value::absent())
        } else {
            Err(EvalError::MissingPath { path: path.to_string() })
        };
    };

    if !path.expected.admits(value) {
        let found = value.as_present().unwrap_or(value).kind();
        return Err(EvalError::type_mismatch(path, &path.expected, found));
    }

    Ok(match (&path.expected, value) {
        (ValueType::Any, _) | (ValueType::Optional(_), Value::Optional(_)) => value.clone(),
        (ValueType::Optional(_), _) => Value::present(value.clone()),
        (_, value) => value.as_present().unwrap_or(value).clone(),
    })
}

#[cfg(test)]
mod tests {
    use remote::PathRoot;

    use super::*;

    fn path(segments: &[PathSegment], expected: ValueType) -> ContextPath {
        ContextPath {
            root: PathRoot::Current,
            segments: segments.to_vec(),
            expected,
        }
    }

    fn resolve(root: &Value, path: &ContextPath) -> Result<Value, EvalError> {
        check(descend(root, path)?, path)
    }

    #[test]
    fn keys_and_indices() {
        let root = Value::record([("items", Value::from(vec![Value::record([("id", 7)])]))]);
        let path = path(&["items".into(), 0usize.into(), "id".into()], ValueType::Int);

        assert_eq!(resolve(&root, &path), Ok(Value::Int(7)));
    }

    #[test]
    fn present_optionals_are_entered() {
        let root = Value::record([("a", Value::present(Value::record([("b", true)])))]);
        let path = path(&["a".into(), "b".into()], ValueType::Bool);

        assert_eq!(resolve(&root, &path), Ok(Value::Bool(true)));
    }

    #[test]
    fn missing_values() {
        let root = Value::record([("a", Value::Null)]);

        let optional = path(&["a".into(), "b".into()], ValueType::Int.optional());
        assert_eq!(resolve(&root, &optional), Ok(Value::absent()));

        let required = path(&["missing".into()], ValueType::Int);
        assert_eq!(
            resolve(&root, &required),
            Err(EvalError::MissingPath { path: "value.missing".into() })
        );

        let out_of_range = path(&[0usize.into()], ValueType::Any);
        assert_eq!(resolve(&Value::Sequence(Vec::new()), &out_of_range), Ok(Value::absent()));
    }

    #[test]
    fn required_path_through_absent_intermediate() {
        let root = Value::record([("a", Value::absent())]);

        let required = path(&["a".into(), "b".into()], ValueType::Int);
        assert_eq!(
            resolve(&root, &required),
            Err(EvalError::MissingPath { path: "value.a.b".into() })
        );
    }

    #[test]
    fn records() {
        let args = Record::from_iter([("filter", Value::record([("limit", 3)]))]);
        let path = ContextPath {
            root: PathRoot::Args,
            segments: vec!["filter".into(), "limit".into()],
            expected: ValueType::Int,
        };

        assert_eq!(descend_record(&args, &path), Ok(Some(&Value::Int(3))));
    }

    #[test]
    fn found_values_are_wrapped_for_optional_paths() {
        let root = Value::record([("a", 1)]);
        let path = path(&["a".into()], ValueType::Int.optional());

        assert_eq!(resolve(&root, &path), Ok(Value::present(1)));
    }

    #[test]
    fn wrong_tags() {
        let root = Value::record([("a", "text")]);

        let leaf = path(&["a".into()], ValueType::Int);
        assert_eq!(
            resolve(&root, &leaf),
            Err(EvalError::TypeMismatch {
                at: "value.a".into(),
                expected: "Int".into(),
                found: ValueKind::String,
            })
        );

        let through = path(&["a".into(), "b".into()], ValueType::Any);
        assert!(matches!(
            resolve(&root, &through),
            Err(EvalError::TypeMismatch {
                found: ValueKind::String,
                ..
            })
        ));
    }
}
