// Endpoint URI parsing.
//
// Supported components
// - timer:<name>?period=..&delay=..&repeatCount=..&fixedRate=..
// - log:<loggerName>?level=..&showBody=..&showBodyType=..&showHeaders=..
//
// Unknown query options are rejected so typos fail at startup instead of being ignored.

use crate::shared::infrastructure::engine::EngineError;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;
use url::Url;

const DEFAULT_TIMER_PERIOD_MS: u64 = 1000;
const DEFAULT_TIMER_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEndpoint {
    pub uri: String,
    pub name: String,
    pub period: Duration,
    pub delay: Duration,
    pub repeat_count: u64,
    pub fixed_rate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEndpoint {
    pub uri: String,
    pub logger_name: String,
    pub level: Level,
    pub show_body: bool,
    pub show_body_type: bool,
    pub show_headers: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Timer(TimerEndpoint),
    Log(LogEndpoint),
}

impl Endpoint {
    pub fn uri(&self) -> &str {
        match self {
            Endpoint::Timer(timer) => &timer.uri,
            Endpoint::Log(log) => &log.uri,
        }
    }
}

impl FromStr for Endpoint {
    type Err = EngineError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let parsed = Url::parse(uri).map_err(|e| EngineError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let name = endpoint_name(&parsed);
        if name.is_empty() {
            return Err(EngineError::InvalidUri {
                uri: uri.to_string(),
                reason: "missing endpoint name".into(),
            });
        }
        match parsed.scheme() {
            "timer" => parse_timer(uri, name, &parsed).map(Endpoint::Timer),
            "log" => parse_log(uri, name, &parsed).map(Endpoint::Log),
            other => Err(EngineError::UnknownComponent(other.to_string())),
        }
    }
}

// `timer://foo` carries the name as host, `timer:foo` and `log:foo` as path.
fn endpoint_name(url: &Url) -> String {
    match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => url.path().trim_start_matches('/').to_string(),
    }
}

fn parse_timer(uri: &str, name: String, url: &Url) -> Result<TimerEndpoint, EngineError> {
    let mut endpoint = TimerEndpoint {
        uri: uri.to_string(),
        name,
        period: Duration::from_millis(DEFAULT_TIMER_PERIOD_MS),
        delay: Duration::from_millis(DEFAULT_TIMER_DELAY_MS),
        repeat_count: 0,
        fixed_rate: false,
    };
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "period" => endpoint.period = Duration::from_millis(parse_option(uri, &key, &value)?),
            "delay" => endpoint.delay = Duration::from_millis(parse_option(uri, &key, &value)?),
            "repeatCount" => endpoint.repeat_count = parse_option(uri, &key, &value)?,
            "fixedRate" => endpoint.fixed_rate = parse_option(uri, &key, &value)?,
            _ => return Err(invalid_option(uri, &key, &value)),
        }
    }
    if endpoint.period.is_zero() {
        return Err(invalid_option(uri, "period", "0"));
    }
    Ok(endpoint)
}

fn parse_log(uri: &str, logger_name: String, url: &Url) -> Result<LogEndpoint, EngineError> {
    let mut endpoint = LogEndpoint {
        uri: uri.to_string(),
        logger_name,
        level: Level::INFO,
        show_body: true,
        show_body_type: true,
        show_headers: false,
    };
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "level" => endpoint.level = parse_option(uri, &key, &value)?,
            "showBody" => endpoint.show_body = parse_option(uri, &key, &value)?,
            "showBodyType" => endpoint.show_body_type = parse_option(uri, &key, &value)?,
            "showHeaders" => endpoint.show_headers = parse_option(uri, &key, &value)?,
            _ => return Err(invalid_option(uri, &key, &value)),
        }
    }
    Ok(endpoint)
}

fn parse_option<T: FromStr>(uri: &str, key: &str, value: &str) -> Result<T, EngineError> {
    value.parse().map_err(|_| invalid_option(uri, key, value))
}

fn invalid_option(uri: &str, key: &str, value: &str) -> EngineError {
    EngineError::InvalidOption {
        uri: uri.to_string(),
        option: key.to_string(),
        value: value.to_string(),
    }
}
