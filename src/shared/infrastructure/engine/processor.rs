// Processors compiled from route steps.
//
// Responsibilities
// - SetBody evaluates its expression against the exchange and replaces the body.
// - Log renders the exchange and writes one line through tracing at the endpoint level.
//
// Simple expressions support ${exchangeId}, ${routeId} and ${header.<name>}; anything else
// inside ${..} is rejected when the route is compiled.

use crate::shared::infrastructure::engine::EngineError;
use crate::shared::infrastructure::engine::endpoint::{Endpoint, LogEndpoint};
use crate::shared::infrastructure::engine::exchange::{Body, Exchange};
use crate::shared::infrastructure::engine::route::{Expression, Step};
use serde_json::Value;
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    ExchangeId,
    RouteId,
    Header(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpression {
    tokens: Vec<Token>,
}

impl CompiledExpression {
    pub fn compile(expression: &Expression) -> Result<Self, EngineError> {
        match expression {
            Expression::Constant(text) => Ok(Self {
                tokens: vec![Token::Literal(text.clone())],
            }),
            Expression::Simple(template) => Ok(Self {
                tokens: parse_simple(template)?,
            }),
        }
    }

    pub fn evaluate(&self, exchange: &Exchange) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::ExchangeId => out.push_str(&exchange.exchange_id),
                Token::RouteId => out.push_str(&exchange.from_route_id),
                Token::Header(name) => match exchange.message.header(name) {
                    Some(Value::String(text)) => out.push_str(text),
                    Some(other) => out.push_str(&other.to_string()),
                    None => {}
                },
            }
        }
        out
    }
}

fn parse_simple(template: &str) -> Result<Vec<Token>, EngineError> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        if start > 0 {
            tokens.push(Token::Literal(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            EngineError::InvalidExpression(format!("unterminated function in: {template}"))
        })?;
        let function = &after[..end];
        let token = match function {
            "exchangeId" => Token::ExchangeId,
            "routeId" => Token::RouteId,
            _ => match function.strip_prefix("header.") {
                Some(name) if !name.is_empty() => Token::Header(name.to_string()),
                _ => {
                    return Err(EngineError::InvalidExpression(format!(
                        "unknown function ${{{function}}} in: {template}"
                    )));
                }
            },
        };
        tokens.push(token);
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Literal(rest.to_string()));
    }
    Ok(tokens)
}

#[derive(Debug, Clone)]
pub enum Processor {
    SetBody {
        node_id: String,
        expression: CompiledExpression,
    },
    Log {
        node_id: String,
        endpoint: LogEndpoint,
    },
}

impl Processor {
    pub fn compile(step: &Step, node_id: String) -> Result<Self, EngineError> {
        match step {
            Step::SetBody(expression) => Ok(Processor::SetBody {
                node_id,
                expression: CompiledExpression::compile(expression)?,
            }),
            Step::To(uri) => match uri.parse::<Endpoint>()? {
                Endpoint::Log(endpoint) => Ok(Processor::Log { node_id, endpoint }),
                Endpoint::Timer(_) => Err(EngineError::UnsupportedProducer(uri.clone())),
            },
        }
    }

    pub fn node_id(&self) -> &str {
        match self {
            Processor::SetBody { node_id, .. } | Processor::Log { node_id, .. } => node_id,
        }
    }

    /// URI of the endpoint this processor sends to, if any.
    pub fn producer_uri(&self) -> Option<&str> {
        match self {
            Processor::SetBody { .. } => None,
            Processor::Log { endpoint, .. } => Some(&endpoint.uri),
        }
    }

    pub fn process(&self, exchange: &mut Exchange) -> Result<(), EngineError> {
        match self {
            Processor::SetBody { expression, .. } => {
                let body = expression.evaluate(exchange);
                exchange.message.set_body(Body::Text(body));
            }
            Processor::Log { endpoint, .. } => {
                let line = format_exchange(exchange, endpoint);
                emit(endpoint, &line);
            }
        }
        Ok(())
    }
}

pub fn format_exchange(exchange: &Exchange, endpoint: &LogEndpoint) -> String {
    let mut parts = vec![format!("ExchangePattern: {:?}", exchange.pattern)];
    if endpoint.show_headers {
        let headers = serde_json::to_string(&exchange.message.headers).unwrap_or_default();
        parts.push(format!("Headers: {headers}"));
    }
    if endpoint.show_body_type {
        parts.push(format!("BodyType: {}", exchange.message.body.type_name()));
    }
    if endpoint.show_body {
        let body = exchange
            .message
            .body
            .as_text()
            .unwrap_or_else(|| "[Body is null]".to_string());
        parts.push(format!("Body: {body}"));
    }
    format!("Exchange[{}]", parts.join(", "))
}

fn emit(endpoint: &LogEndpoint, line: &str) {
    let logger = endpoint.logger_name.as_str();
    match endpoint.level {
        Level::TRACE => tracing::trace!(logger, "{line}"),
        Level::DEBUG => tracing::debug!(logger, "{line}"),
        Level::INFO => tracing::info!(logger, "{line}"),
        Level::WARN => tracing::warn!(logger, "{line}"),
        _ => tracing::error!(logger, "{line}"),
    }
}

#[cfg(test)]
mod engine_processor_tests {
    use super::*;
    use crate::shared::infrastructure::engine::exchange::Message;
    use crate::shared::infrastructure::engine::route::{constant, simple};
    use rstest::{fixture, rstest};

    #[fixture]
    fn exchange() -> Exchange {
        let mut exchange = Exchange::new("route1", "timer://foo?period=5000");
        exchange.message.set_header("CamelTimerName", "foo");
        exchange.message.set_header("CamelTimerCounter", 7);
        exchange
    }

    fn log_endpoint(uri: &str) -> LogEndpoint {
        match uri.parse::<Endpoint>() {
            Ok(Endpoint::Log(endpoint)) => endpoint,
            other => panic!("expected log endpoint, got {other:?}"),
        }
    }

    #[rstest]
    #[case(Body::Empty)]
    #[case(Body::Text("previous".into()))]
    #[case(Body::Json(serde_json::json!({"a": 1})))]
    fn it_should_replace_any_previous_body(mut exchange: Exchange, #[case] previous: Body) {
        exchange.message.set_body(previous);
        let processor = Processor::compile(&Step::SetBody(simple("Hello, world!")), "setBody1".into())
            .expect("compile");
        processor.process(&mut exchange).expect("process");
        assert_eq!(exchange.message.body, Body::Text("Hello, world!".into()));
    }

    #[rstest]
    fn it_should_substitute_simple_functions(exchange: Exchange) {
        let expression = CompiledExpression::compile(&simple(
            "tick ${header.CamelTimerCounter} of ${header.CamelTimerName} on ${routeId}",
        ))
        .expect("compile");
        assert_eq!(expression.evaluate(&exchange), "tick 7 of foo on route1");
    }

    #[rstest]
    fn it_should_substitute_the_exchange_id(exchange: Exchange) {
        let expression = CompiledExpression::compile(&simple("${exchangeId}")).expect("compile");
        assert_eq!(expression.evaluate(&exchange), exchange.exchange_id);
    }

    #[rstest]
    fn it_should_keep_constants_verbatim(exchange: Exchange) {
        let expression = CompiledExpression::compile(&constant("${routeId}")).expect("compile");
        assert_eq!(expression.evaluate(&exchange), "${routeId}");
    }

    #[rstest]
    #[case("${body.missing}")]
    #[case("Hello ${routeId")]
    #[case("${header.}")]
    fn it_should_reject_invalid_simple_expressions(#[case] template: &str) {
        assert!(matches!(
            CompiledExpression::compile(&simple(template)),
            Err(EngineError::InvalidExpression(_))
        ));
    }

    #[rstest]
    fn it_should_format_the_exchange_like_the_log_component(mut exchange: Exchange) {
        exchange.message = Message::with_text("Hello, world!");
        let line = format_exchange(&exchange, &log_endpoint("log:mylogger"));
        assert_eq!(
            line,
            "Exchange[ExchangePattern: InOnly, BodyType: String, Body: Hello, world!]"
        );
    }

    #[rstest]
    fn it_should_format_headers_and_null_bodies_when_asked(exchange: Exchange) {
        let line = format_exchange(
            &exchange,
            &log_endpoint("log:mylogger?showHeaders=true&showBodyType=false"),
        );
        assert_eq!(
            line,
            r#"Exchange[ExchangePattern: InOnly, Headers: {"CamelTimerCounter":7,"CamelTimerName":"foo"}, Body: [Body is null]]"#
        );
    }

    #[rstest]
    fn it_should_refuse_timers_as_producers() {
        let result = Processor::compile(&Step::To("timer://bar".into()), "to1".into());
        assert!(matches!(result, Err(EngineError::UnsupportedProducer(_))));
    }

    #[rstest]
    fn it_should_expose_node_ids_and_producer_uris() {
        let log = Processor::compile(&Step::To("log:mylogger".into()), "to1".into()).unwrap();
        assert_eq!(log.node_id(), "to1");
        assert_eq!(log.producer_uri(), Some("log:mylogger"));
        let set_body = Processor::compile(&Step::SetBody(constant("x")), "setBody1".into()).unwrap();
        assert_eq!(set_body.producer_uri(), None);
    }
}
