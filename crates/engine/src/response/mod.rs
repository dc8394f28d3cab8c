mod code;
mod error;
mod path;

use value::{AbsentPolicy, Value};

pub use code::ErrorCode;
pub use error::{GraphqlError, Location};
pub use path::{ErrorPath, ErrorPathSegment};

/// Result of an execution.
///
/// `data` is `None` when the request failed before execution started (parsing, validation,
/// variables), and `Some(Value::Null)` when a null propagated up to the root.
#[derive(Debug, Clone)]
pub struct Response {
    data: Option<Value>,
    errors: Vec<GraphqlError>,
    absent_policy: AbsentPolicy,
}

impl Response {
    pub(crate) fn executed(data: Value, errors: Vec<GraphqlError>, absent_policy: AbsentPolicy) -> Self {
        Response {
            data: Some(data),
            errors,
            absent_policy,
        }
    }

    pub(crate) fn request_error(errors: impl IntoIterator<Item = GraphqlError>) -> Self {
        Response {
            data: None,
            errors: errors.into_iter().collect(),
            absent_policy: AbsentPolicy::default(),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> &[GraphqlError] {
        &self.errors
    }

    /// JSON text of the data object alone.
    pub fn data_json(&self) -> String {
        match &self.data {
            Some(data) => data.to_json_string(self.absent_policy),
            None => "null".to_owned(),
        }
    }

    /// The GraphQL response envelope, `errors` only present when there are some.
    pub fn to_json(&self) -> serde_json::Value {
        let mut envelope = serde_json::Map::new();
        if let Some(data) = &self.data {
            envelope.insert("data".into(), data.to_json(self.absent_policy));
        }
        if !self.errors.is_empty() {
            let errors = self.errors.iter().map(error_to_json).collect();
            envelope.insert("errors".into(), serde_json::Value::Array(errors));
        }
        serde_json::Value::Object(envelope)
    }
}

/// An error that fails to serialize is reported as an internal error in its place.
fn error_to_json(error: &GraphqlError) -> serde_json::Value {
    serde_json::to_value(error).unwrap_or_else(|err| {
        tracing::error!("Failed to serialize a GraphQL error: {err}");
        serde_json::json!({
            "message": "Internal server error",
            "extensions": { "code": "INTERNAL_SERVER_ERROR" },
        })
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope() {
        let data = Value::record([("a", Value::absent()), ("b", Value::Null)]);
        let response = Response::executed(
            data,
            vec![GraphqlError::new("boom", ErrorCode::ResolverError).with_path(vec![ErrorPathSegment::from("b")])],
            AbsentPolicy::Omit,
        );

        assert_eq!(response.data_json(), r#"{"b":null}"#);
        assert_eq!(
            response.to_json(),
            json!({
                "data": { "b": null },
                "errors": [{ "message": "boom", "path": ["b"], "extensions": { "code": "RESOLVER_ERROR" } }]
            })
        );
    }

    #[test]
    fn request_errors_have_no_data() {
        let response = Response::request_error([GraphqlError::internal_server_error()]);

        assert_eq!(response.data_json(), "null");
        assert_eq!(response.to_json().get("data"), None);
    }

    #[test]
    fn envelope_keeps_every_error() {
        let response = Response::executed(
            Value::record([("a", Value::Null), ("b", Value::Null)]),
            vec![
                GraphqlError::new("first", ErrorCode::ResolverError).with_path(vec![ErrorPathSegment::from("a")]),
                GraphqlError::internal_server_error(),
                GraphqlError::new("third", ErrorCode::ResolverError).with_path(vec![ErrorPathSegment::from("b")]),
            ],
            AbsentPolicy::default(),
        );

        let envelope = response.to_json();
        let messages = envelope["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|error| error["message"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(messages, ["first", "Internal server error", "third"]);
        assert_eq!(envelope["errors"][1]["extensions"], json!({ "code": "INTERNAL_SERVER_ERROR" }));
    }
}
