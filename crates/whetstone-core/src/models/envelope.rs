use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ApiError;

/// Standard paginated response shape: `{count, limit, skip, data}`.
///
/// `count` is the server-side total of matching records, `data` the records
/// of this page (or of every page, once the client has assembled them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub count: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub data: Vec<Value>,
    /// Any other top-level fields the server sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Wrap a single record as a one-element envelope
    pub fn single(record: Value, limit: u64) -> Self {
        Self {
            count: 1,
            limit,
            skip: 0,
            data: vec![record],
            extra: Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of `Whetstone::get`.
///
/// Client-session list reads come back as an assembled `Envelope`; frontend
/// reads and the unpaginated collections come back exactly as the server sent them.
#[derive(Debug, Clone, PartialEq)]
pub enum GetResponse {
    Envelope(Envelope),
    Raw(Value),
}

impl GetResponse {
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            GetResponse::Envelope(envelope) => Some(envelope),
            GetResponse::Raw(_) => None,
        }
    }

    /// Records carried by the response.
    ///
    /// For raw responses this is the body itself when it is an array, or its
    /// `data` array when it is an object.
    pub fn data(&self) -> &[Value] {
        match self {
            GetResponse::Envelope(envelope) => &envelope.data,
            GetResponse::Raw(Value::Array(items)) => items,
            GetResponse::Raw(value) => value
                .get("data")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    /// Server-reported total, falling back to the number of records present
    pub fn count(&self) -> u64 {
        match self {
            GetResponse::Envelope(envelope) => envelope.count,
            GetResponse::Raw(value) => value
                .get("count")
                .and_then(Value::as_u64)
                .unwrap_or(self.data().len() as u64),
        }
    }

    /// Owned records, consuming the response
    pub fn into_data(self) -> Vec<Value> {
        match self {
            GetResponse::Envelope(envelope) => envelope.data,
            GetResponse::Raw(Value::Array(items)) => items,
            GetResponse::Raw(Value::Object(mut map)) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            GetResponse::Raw(_) => Vec::new(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            // An Envelope always serializes: its fields are plain JSON values
            GetResponse::Envelope(envelope) => serde_json::to_value(envelope).unwrap_or(Value::Null),
            GetResponse::Raw(value) => value,
        }
    }

    /// Interpret the response as an envelope, parsing raw bodies if needed
    pub fn into_envelope(self) -> Result<Envelope, ApiError> {
        match self {
            GetResponse::Envelope(envelope) => Ok(envelope),
            GetResponse::Raw(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(format!("Response is not an envelope: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_parses_and_keeps_extra_fields() {
        let envelope: Envelope = serde_json::from_value(json!({
            "count": 2,
            "limit": 100,
            "skip": 0,
            "data": [{"_id": "a"}, {"_id": "b"}],
            "total": 2
        }))
        .expect("Failed to parse envelope");

        assert_eq!(envelope.count, 2);
        assert_eq!(envelope.len(), 2);
        assert_eq!(envelope.extra.get("total"), Some(&json!(2)));
    }

    #[test]
    fn test_single_envelope() {
        let envelope = Envelope::single(json!({"_id": "u1"}), 100);
        assert_eq!(envelope.count, 1);
        assert_eq!(envelope.limit, 100);
        assert_eq!(envelope.skip, 0);
        assert_eq!(envelope.data, vec![json!({"_id": "u1"})]);
    }

    #[test]
    fn test_raw_response_data_accessors() {
        let list = GetResponse::Raw(json!([{"name": "Teacher"}, {"name": "Coach"}]));
        assert_eq!(list.data().len(), 2);
        assert_eq!(list.count(), 2);

        let wrapped = GetResponse::Raw(json!({"count": 40, "data": ["courses", "grades"]}));
        assert_eq!(wrapped.count(), 40);
        assert_eq!(wrapped.clone().into_data(), vec![json!("courses"), json!("grades")]);

        let scalar = GetResponse::Raw(json!("ok"));
        assert!(scalar.data().is_empty());
        assert!(scalar.into_data().is_empty());
    }

    #[test]
    fn test_into_envelope_from_raw() {
        let raw = GetResponse::Raw(json!({"count": 1, "limit": 100, "skip": 0, "data": [1]}));
        let envelope = raw.into_envelope().expect("raw envelope should parse");
        assert_eq!(envelope.data, vec![json!(1)]);

        let not_envelope = GetResponse::Raw(json!([1, 2]));
        assert!(not_envelope.into_envelope().is_err());
    }
}
