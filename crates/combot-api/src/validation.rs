//! Request payload validation.
//!
//! Chat turns arrive from a browser client that is loose with types: indices
//! may be numeric strings, logs may be JSON-encoded strings, and either
//! `sender`/`text` or `role`/`content` keys may be used. Everything is
//! normalized here before the conversation logic sees it.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use combot_types::{flow, Brand, ChatLogEntry, Level, MessageTypeEntry, ProblemType, ScenarioPatch};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};

pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const MAX_TIME_SPENT_SECS: u32 = 3600;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

/// A validated chat turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub message: String,
    pub index: u32,
    /// Seconds spent in the chat so far
    pub timer: u32,
    pub chat_log: Vec<ChatLogEntry>,
    pub class_type: Option<ProblemType>,
    pub message_type_log: Vec<MessageTypeEntry>,
    pub scenario: Option<ScenarioPatch>,
    pub email: Option<String>,
}

/// Chat turn payload as documented for clients
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    /// Latest user message (max 1000 characters)
    pub message: String,
    /// Conversation index; integers or numeric strings
    pub index: u32,
    pub timer: Option<u32>,
    pub chat_log: Option<Vec<ChatLogEntry>>,
    pub class_type: Option<ProblemType>,
    pub message_type_log: Option<Vec<MessageTypeEntry>>,
    pub scenario: Option<ScenarioPatch>,
    pub email: Option<String>,
}

/// Turn a JSON extractor result into a value, reporting malformed bodies as 400
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(format!("Invalid JSON body: {}", rejection.body_text())))
}

pub fn validate_turn(body: &Value) -> ApiResult<ChatTurn> {
    let body = body
        .as_object()
        .ok_or_else(|| ApiError::validation("request body must be a JSON object"))?;

    Ok(ChatTurn {
        message: validate_message(body.get("message"))?,
        index: validate_index(body.get("index"))?,
        timer: validate_timer(body.get("timer"))?,
        chat_log: validate_chat_log(body.get("chatLog"))?,
        class_type: validate_class_type(body.get("classType"))?,
        message_type_log: validate_message_type_log(body.get("messageTypeLog"))?,
        scenario: validate_scenario(body.get("scenario"))?,
        email: match body.get("email") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(validate_email(s)?),
            Some(_) => return Err(ApiError::invalid_field("email", "email must be a string")),
        },
    })
}

fn validate_message(value: Option<&Value>) -> ApiResult<String> {
    let message = match value {
        None | Some(Value::Null) => return Err(ApiError::invalid_field("message", "message cannot be empty")),
        Some(Value::String(s)) => s,
        Some(_) => return Err(ApiError::invalid_field("message", "message must be a string")),
    };

    if message.is_empty() {
        return Err(ApiError::invalid_field("message", "message cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::invalid_field(
            "message",
            format!("message is too long (max {} characters)", MAX_MESSAGE_CHARS),
        ));
    }

    let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(ApiError::invalid_field("message", "message cannot be empty after trimming"));
    }
    Ok(collapsed)
}

/// Integer from a JSON number or numeric string
fn parse_integer(field: &str, value: &Value) -> ApiResult<i64> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::invalid_field(field, format!("{field} must be an integer")))
}

fn non_negative(field: &str, value: i64) -> ApiResult<u32> {
    if value < 0 {
        return Err(ApiError::invalid_field(field, format!("{field} must be non-negative")));
    }
    u32::try_from(value).map_err(|_| ApiError::invalid_field(field, format!("{field} is out of range")))
}

fn validate_index(value: Option<&Value>) -> ApiResult<u32> {
    match value {
        None | Some(Value::Null) => Err(ApiError::invalid_field("index", "index is required")),
        Some(value) => {
            let index = non_negative("index", parse_integer("index", value)?)?;
            if index > flow::MAX_INDEX {
                return Err(ApiError::invalid_field(
                    "index",
                    format!("index exceeds maximum allowed value ({})", flow::MAX_INDEX),
                ));
            }
            Ok(index)
        }
    }
}

fn validate_timer(value: Option<&Value>) -> ApiResult<u32> {
    let timer = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(value) => non_negative("timer", parse_integer("timer", value)?)?,
    };
    if timer > MAX_TIME_SPENT_SECS {
        return Err(ApiError::invalid_field("timer", "timer exceeds maximum allowed time"));
    }
    Ok(timer)
}

/// List field that may be sent as a JSON-encoded string
fn list_field(field: &str, value: Option<&Value>) -> ApiResult<Vec<Value>> {
    let value = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(Vec::new()),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s).map_err(|_| {
            ApiError::invalid_field(field, format!("{field} must be valid JSON if provided as string"))
        })?,
        Some(value) => value.clone(),
    };

    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ApiError::invalid_field(field, format!("{field} must be a list"))),
    }
}

fn text_of(entry: &Map<String, Value>, keys: [&str; 2]) -> Option<String> {
    keys.iter().find_map(|key| match entry.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

fn validate_chat_log(value: Option<&Value>) -> ApiResult<Vec<ChatLogEntry>> {
    list_field("chatLog", value)?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let field = format!("chatLog[{i}]");
            let entry = item
                .as_object()
                .ok_or_else(|| ApiError::invalid_field(&field, format!("{field} must be a dictionary")))?;
            let sender = text_of(entry, ["sender", "role"])
                .ok_or_else(|| ApiError::invalid_field(&field, format!("{field} must have a 'sender' field")))?;
            let text = text_of(entry, ["text", "content"])
                .ok_or_else(|| ApiError::invalid_field(&field, format!("{field} must have a 'text' field")))?;
            Ok(ChatLogEntry::new(sender, text))
        })
        .collect()
}

fn validate_message_type_log(value: Option<&Value>) -> ApiResult<Vec<MessageTypeEntry>> {
    list_field("messageTypeLog", value)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(text) => Ok(MessageTypeEntry::Text(text)),
            Value::Object(entry) => match entry.get("text") {
                Some(Value::String(text)) => Ok(MessageTypeEntry::Tagged { text: text.clone() }),
                _ => Err(ApiError::invalid_field(
                    format!("messageTypeLog[{i}]"),
                    format!("messageTypeLog[{i}] must have a 'text' string"),
                )),
            },
            _ => Err(ApiError::invalid_field(
                format!("messageTypeLog[{i}]"),
                format!("messageTypeLog[{i}] must be a string"),
            )),
        })
        .collect()
}

fn validate_class_type(value: Option<&Value>) -> ApiResult<Option<ProblemType>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::invalid_field("classType", "classType must be one of A, B, C, Other")),
        Some(_) => Err(ApiError::invalid_field("classType", "classType must be a string")),
    }
}

fn scenario_value<T: std::str::FromStr>(
    scenario: &Map<String, Value>,
    key: &str,
    allowed: &str,
) -> ApiResult<Option<T>> {
    match scenario.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some).map_err(|_| {
            ApiError::invalid_field(format!("scenario.{key}"), format!("scenario.{key} must be one of {allowed}"))
        }),
        Some(_) => Err(ApiError::invalid_field(
            format!("scenario.{key}"),
            format!("scenario.{key} must be one of {allowed}"),
        )),
    }
}

fn validate_scenario(value: Option<&Value>) -> ApiResult<Option<ScenarioPatch>> {
    let scenario = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(scenario)) => scenario,
        Some(_) => return Err(ApiError::invalid_field("scenario", "scenario must be a dictionary")),
    };

    let patch = ScenarioPatch {
        brand: scenario_value::<Brand>(scenario, "brand", "Basic, Lulu")?,
        problem_type: scenario_value::<ProblemType>(scenario, "problem_type", "A, B, C, Other")?,
        think_level: scenario_value::<Level>(scenario, "think_level", "High, Low")?,
        feel_level: scenario_value::<Level>(scenario, "feel_level", "High, Low")?,
    };

    Ok((!patch.is_empty()).then_some(patch))
}

/// Validate an email address, returning it trimmed and lower-cased
pub fn validate_email(email: &str) -> ApiResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::invalid_field("email", "email cannot be empty"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ApiError::invalid_field("email", "email must be a valid email address"));
    }
    Ok(email.to_lowercase())
}

pub fn is_valid_email(email: &str) -> bool {
    validate_email(email).is_ok()
}
