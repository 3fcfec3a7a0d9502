//! Request/response adapter around the decoder.
//!
//! Accepts an event either as `{ "device", "payload" }` or wrapped in an
//! HTTP-gateway envelope whose `body` holds that object as a JSON string.
//! Client errors map to 400, anything unexpected to 500.

use std::any::Any;
use std::panic;

use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, ErrorKind};
use crate::source::{EventSource, SourceError};
use crate::validation::{ValidationError, ValidationPolicy};
use crate::{BatteryHealth, InputEvent, parse_battery_health};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

pub const CLIENT_ERROR_MESSAGE: &str = "Error parsing input";
pub const INTERNAL_ERROR_MESSAGE: &str = "Unexpected server error";

/// Handler response as seen by the transport.
///
/// # Examples
/// ```
/// use batthealth_core::{ValidationPolicy, handle_event};
/// use serde_json::json;
///
/// let event = json!({ "device": "device_2", "payload": "9164293726C85400" });
/// let response = handle_event(&event, &ValidationPolicy::default());
/// assert_eq!(response.status_code, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Result {
        result: BatteryHealth,
    },
    Error {
        error: String,
        kind: ErrorKind,
        details: Vec<String>,
    },
}

impl Response {
    pub fn ok(record: BatteryHealth) -> Self {
        Self {
            status_code: STATUS_OK,
            body: ResponseBody::Result { result: record },
        }
    }

    pub fn from_error(err: &Error) -> Self {
        let kind = err.kind();
        let (status_code, message) = if kind.is_client_error() {
            (STATUS_BAD_REQUEST, CLIENT_ERROR_MESSAGE)
        } else {
            (STATUS_INTERNAL_ERROR, INTERNAL_ERROR_MESSAGE)
        };
        Self {
            status_code,
            body: ResponseBody::Error {
                error: message.to_string(),
                kind,
                details: err.details(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// Handle one raw event. Never fails; errors become error responses.
pub fn handle_event(event: &Value, policy: &ValidationPolicy) -> Response {
    let outcome = panic::catch_unwind(|| process_event(event, policy))
        .unwrap_or_else(|payload| Err(Error::Internal(panic_message(payload.as_ref()))));

    match outcome {
        Ok(record) => {
            info!(
                "{}",
                log_line("finished parsing battery health", json!({ "result": &record }))
            );
            Response::ok(record)
        }
        Err(err) => {
            let context = if err.kind().is_client_error() {
                "error parsing and processing input"
            } else {
                "unexpected error while handling event"
            };
            error!("{}", log_line(context, json!({ "error": err.to_string() })));
            Response::from_error(&err)
        }
    }
}

/// Handle every event a source yields, in order.
pub fn handle_events<S: EventSource>(
    mut source: S,
    policy: &ValidationPolicy,
) -> Result<Vec<Response>, SourceError> {
    let mut responses = Vec::new();
    while let Some(event) = source.next_event()? {
        responses.push(handle_event(&event, policy));
    }
    info!(
        "{}",
        log_line("handled events", json!({ "count": responses.len() }))
    );
    Ok(responses)
}

/// Type a raw event, unwrapping an HTTP-gateway envelope when present.
pub fn parse_input_event(event: &Value) -> Result<InputEvent, ValidationError> {
    let parsed = match event.get("body") {
        Some(Value::String(body)) => serde_json::from_str::<InputEvent>(body),
        Some(body @ Value::Object(_)) => InputEvent::deserialize(body),
        _ => InputEvent::deserialize(event),
    };
    parsed.map_err(|err| ValidationError::MalformedEvent {
        reason: err.to_string(),
    })
}

fn process_event(event: &Value, policy: &ValidationPolicy) -> Result<BatteryHealth, Error> {
    let event = parse_input_event(event)?;
    parse_battery_health(&event, policy)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "handler panicked".to_string()
}

fn log_line(message: &str, fields: Value) -> String {
    format!("{message} >>> {fields}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::State;

    fn policy() -> ValidationPolicy {
        ValidationPolicy::default()
    }

    #[test]
    fn handles_direct_event() {
        let event = json!({ "device": "device_3", "payload": "6188293726C75C00" });
        let response = handle_event(&event, &policy());
        assert_eq!(response.status_code, STATUS_OK);
        let ResponseBody::Result { result } = response.body else {
            panic!("expected result body");
        };
        assert_eq!(result.device, "device_3");
        assert_eq!(result.time, 1_668_454_534);
        assert_eq!(result.state, State::Discharge);
        assert_eq!(result.state_of_charge, 99.5);
        assert_eq!(result.temperature, 26.0);
    }

    #[test]
    fn handles_gateway_envelope() {
        let body = json!({ "device": "device_1", "payload": "F1E6E63676C75000" }).to_string();
        let event = json!({ "httpMethod": "POST", "body": body });
        let response = handle_event(&event, &policy());
        assert!(response.is_success());
    }

    #[test]
    fn missing_payload_is_bad_request() {
        let event = json!({ "key_1": "value" });
        let response = handle_event(&event, &policy());
        assert_eq!(response.status_code, STATUS_BAD_REQUEST);
        let ResponseBody::Error {
            error,
            kind,
            details,
        } = response.body
        else {
            panic!("expected error body");
        };
        assert_eq!(error, CLIENT_ERROR_MESSAGE);
        assert_eq!(kind, ErrorKind::ValidationError);
        assert!(details[0].contains("missing field"));
    }

    #[test]
    fn device_without_payload_is_bad_request() {
        let event = json!({ "device": "device_1" });
        let response = handle_event(&event, &policy());
        assert_eq!(response.status_code, STATUS_BAD_REQUEST);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["body"]["kind"], "validation_error");
        assert_eq!(
            value["body"]["details"],
            json!(["malformed event: missing field `payload`"])
        );
    }

    #[test]
    fn envelope_with_invalid_json_is_bad_request() {
        let event = json!({ "body": "{not json" });
        let response = handle_event(&event, &policy());
        assert_eq!(response.status_code, STATUS_BAD_REQUEST);
    }

    #[test]
    fn unknown_state_is_decode_error() {
        let event = json!({ "device": "d", "payload": "F1E6E63696C75000" });
        let response = handle_event(&event, &policy());
        assert_eq!(response.status_code, STATUS_BAD_REQUEST);
        assert!(matches!(
            response.body,
            ResponseBody::Error {
                kind: ErrorKind::DecodeError,
                ..
            }
        ));
    }

    #[test]
    fn internal_error_maps_to_500() {
        let err = Error::Internal("handler panicked".to_string());
        let response = Response::from_error(&err);
        assert_eq!(response.status_code, STATUS_INTERNAL_ERROR);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["body"]["error"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(value["body"]["kind"], "internal_error");
    }

    #[test]
    fn panic_message_reads_str_and_string() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "handler panicked");
    }

    #[test]
    fn response_serializes_status_code_key() {
        let event = json!({ "device": "device_2", "payload": "9164293726C85400" });
        let value = serde_json::to_value(handle_event(&event, &policy())).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"]["result"]["state"], "discharge");
        assert_eq!(value["body"]["result"]["state_of_charge"], 100.0);
    }

    #[test]
    fn handling_is_idempotent() {
        let event = json!({ "device": "device_1", "payload": "F1E6E63676C75000" });
        let first = serde_json::to_string(&handle_event(&event, &policy())).unwrap();
        let second = serde_json::to_string(&handle_event(&event, &policy())).unwrap();
        assert_eq!(first, second);
    }
}
