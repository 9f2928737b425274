// Reads a message body as a JSON object.
//
// Boundaries
// - Pure: the message is only read.

use crate::shared::infrastructure::engine::exchange::Message;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body is not valid json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Body is not expected json object")]
    UnexpectedShape,
}

pub fn convert_body(message: &Message) -> Result<Map<String, Value>, BodyError> {
    let body = message.body.as_text().unwrap_or_default();
    match serde_json::from_str::<Value>(&body)? {
        Value::Object(object) => Ok(object),
        _ => Err(BodyError::UnexpectedShape),
    }
}

#[cfg(test)]
mod hello_world_body_tests {
    use super::*;
    use crate::shared::infrastructure::engine::exchange::Body;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn it_should_return_the_object_for_a_json_object_body() {
        let object = convert_body(&Message::with_text(r#"{"a":1}"#)).expect("object");
        assert_eq!(Value::Object(object), json!({"a": 1}));
    }

    #[rstest]
    fn it_should_accept_structured_bodies() {
        let message = Message::new(Body::Json(json!({"nested": {"b": [1, 2]}})));
        let object = convert_body(&message).expect("object");
        assert_eq!(object["nested"], json!({"b": [1, 2]}));
    }

    #[rstest]
    #[case("[1,2,3]")]
    #[case("42")]
    #[case("\"text\"")]
    #[case("null")]
    fn it_should_reject_json_that_is_not_an_object(#[case] body: &str) {
        let result = convert_body(&Message::with_text(body));
        assert!(matches!(result, Err(BodyError::UnexpectedShape)));
    }

    #[rstest]
    #[case(Message::with_text("not json"))]
    #[case(Message::with_text(""))]
    #[case(Message::default())]
    fn it_should_fail_with_a_parse_error_on_invalid_json(#[case] message: Message) {
        let result = convert_body(&message);
        assert!(matches!(result, Err(BodyError::Parse(_))));
    }

    #[rstest]
    fn it_should_leave_the_message_untouched() {
        let message = Message::with_text(r#"{"a":1}"#);
        let before = message.clone();
        let _ = convert_body(&message);
        assert_eq!(message, before);
    }
}
