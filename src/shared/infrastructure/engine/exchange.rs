// Exchange and message model carried through a route.
//
// Notes
// - One exchange is created per consumer event and discarded once the last step ran.
// - Headers are JSON values so they serialise as-is into management responses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Body {
    Empty,
    Text(String),
    Json(Value),
}

impl Body {
    /// Text view of the body, `None` when empty. JSON bodies render compactly.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Body::Empty => None,
            Body::Text(text) => Some(text.clone()),
            Body::Json(value) => Some(value.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Body::Empty => "null",
            Body::Text(_) => "String",
            Body::Json(_) => "Json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub body: Body,
    pub headers: BTreeMap<String, Value>,
}

impl Message {
    pub fn new(body: Body) -> Self {
        Self {
            body,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(Body::Text(text.into()))
    }

    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers.get(name)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new(Body::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExchangePattern {
    InOnly,
    InOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub exchange_id: String,
    pub created_at: DateTime<Utc>,
    pub from_route_id: String,
    pub from_endpoint: String,
    pub pattern: ExchangePattern,
    pub message: Message,
}

impl Exchange {
    pub fn new(from_route_id: impl Into<String>, from_endpoint: impl Into<String>) -> Self {
        Self {
            exchange_id: Uuid::now_v7().to_string(),
            created_at: Utc::now(),
            from_route_id: from_route_id.into(),
            from_endpoint: from_endpoint.into(),
            pattern: ExchangePattern::InOnly,
            message: Message::default(),
        }
    }
}

#[cfg(test)]
mod engine_exchange_tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Body::Empty, None, "null")]
    #[case(Body::Text("Hello, world!".into()), Some("Hello, world!"), "String")]
    #[case(Body::Json(json!({"a": 1})), Some(r#"{"a":1}"#), "Json")]
    fn it_should_render_the_body_as_text(
        #[case] body: Body,
        #[case] expected: Option<&str>,
        #[case] type_name: &str,
    ) {
        assert_eq!(body.as_text().as_deref(), expected);
        assert_eq!(body.type_name(), type_name);
    }

    #[rstest]
    fn it_should_create_an_in_only_exchange_with_an_empty_body() {
        let exchange = Exchange::new("route1", "timer://foo?period=5000");
        assert_eq!(exchange.from_route_id, "route1");
        assert_eq!(exchange.pattern, ExchangePattern::InOnly);
        assert_eq!(exchange.message.body, Body::Empty);
        assert!(Uuid::parse_str(&exchange.exchange_id).is_ok());
    }

    #[rstest]
    fn it_should_replace_the_body_and_keep_headers() {
        let mut message = Message::with_text("previous");
        message.set_header("CamelTimerCounter", 3);
        message.set_body(Body::Text("next".into()));
        assert_eq!(message.body, Body::Text("next".into()));
        assert_eq!(message.header("CamelTimerCounter"), Some(&json!(3)));
    }
}
