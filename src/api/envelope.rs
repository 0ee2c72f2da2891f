//! Response envelope handling.
//!
//! The service wraps most payloads as `{ "success": true, "data": T }` but
//! some endpoints return `T` directly. Both shapes are accepted.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Header carrying the total number of results of a paginated list
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Decode a response body, unwrapping `data` when present.
///
/// An empty body is treated as JSON `null`.
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<T> {
  serde_json::from_value(unwrap_data(parse_body(body)?).into_value())
}

/// Decode the body of a list endpoint.
///
/// A null payload or an envelope without a `data` member means no items.
/// Anything else must be an array.
pub fn decode_list<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<Vec<T>> {
  match unwrap_data(parse_body(body)?) {
    Payload::Data(Value::Null) | Payload::Bare(Value::Null) | Payload::Bare(Value::Object(_)) => {
      Ok(Vec::new())
    }
    payload => serde_json::from_value(payload.into_value()),
  }
}

fn parse_body(body: &[u8]) -> serde_json::Result<Value> {
  if body.iter().all(u8::is_ascii_whitespace) {
    Ok(Value::Null)
  } else {
    serde_json::from_slice(body)
  }
}

/// A response body with its envelope taken apart
enum Payload {
  /// Contents of the `data` member (`null` when it was null)
  Data(Value),
  /// Body without a `data` member
  Bare(Value),
}

impl Payload {
  fn into_value(self) -> Value {
    match self {
      Payload::Data(value) | Payload::Bare(value) => value,
    }
  }
}

fn unwrap_data(value: Value) -> Payload {
  match value {
    Value::Object(mut map) => match map.remove("data") {
      Some(data) => Payload::Data(data),
      None => Payload::Bare(Value::Object(map)),
    },
    other => Payload::Bare(other),
  }
}

/// Read `X-Total-Count`; absent or malformed values mean "unknown".
pub fn total_count(headers: &HeaderMap) -> Option<u64> {
  headers
    .get(TOTAL_COUNT_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.trim().parse().ok())
}
