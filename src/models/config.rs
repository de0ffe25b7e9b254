//! Configuration tree addressing and attribute values

use crate::utils::{ConfigPathError, ValueParseError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slash-delimited address of a node in the remote tree, e.g. `/Servers/AdminServer`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// The tree root (`/`)
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `Servers/AdminServer` or `/Servers/AdminServer`.
    ///
    /// A single trailing slash is tolerated; empty inner segments are not.
    pub fn parse(raw: &str) -> Result<Self, ConfigPathError> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let body = body.strip_suffix('/').unwrap_or(body);
        if body.is_empty() {
            return Ok(Self::root());
        }
        Self::from_segments(body.split('/'))
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self, ConfigPathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut path = Self::root();
        for segment in segments {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    /// A new path one level below this one
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, ConfigPathError> {
        let segment = segment.into();
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(ConfigPathError::EmptySegment(self.segments.len()));
        }
        if segment.contains('/') {
            return Err(ConfigPathError::SeparatorInSegment(segment.to_string()));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Declared type of a scalar attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Integer,
    Boolean,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Scalar attribute value
///
/// Serialized untagged so a domain snapshot reads as plain JSON
/// (`"ListenPort": 7001`, `"AutoRestart": true`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Bool(_) => AttributeKind::Boolean,
            AttributeValue::Int(_) => AttributeKind::Integer,
            AttributeValue::Str(_) => AttributeKind::String,
        }
    }

    /// Parse command-line text as a value of the given kind.
    ///
    /// Booleans accept `true`/`false` in any case (`True` is what operators type).
    pub fn parse_as(kind: AttributeKind, raw: &str) -> Result<Self, ValueParseError> {
        let trimmed = raw.trim();
        let invalid = || ValueParseError {
            raw: raw.to_string(),
            expected: kind,
        };
        match kind {
            AttributeKind::String => Ok(AttributeValue::Str(trimmed.to_string())),
            AttributeKind::Integer => trimmed
                .parse::<i64>()
                .map(AttributeValue::Int)
                .map_err(|_| invalid()),
            AttributeKind::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(AttributeValue::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(AttributeValue::Bool(false))
                } else {
                    Err(invalid())
                }
            }
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(v) => write!(f, "{}", v),
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Int(i64::from(value))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

/// One attribute write, reported back to the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeChange {
    pub path: ConfigPath,
    pub name: String,
    pub old: Option<AttributeValue>,
    pub new: AttributeValue,
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old {
            Some(old) => write!(f, "{} {}: {} -> {}", self.path, self.name, old, self.new),
            None => write!(f, "{} {}: -> {}", self.path, self.name, self.new),
        }
    }
}
