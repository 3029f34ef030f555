use crate::prelude::*;
use serde_json::Map;

///
/// Declaration
///
/// Read-only view over one raw map declaration (a class, or one of its
/// members). Every accessor reports failures against the declaration's
/// location, so callers can propagate with `?`.
///

pub(crate) struct Declaration<'a> {
    class: &'a str,
    member: Option<&'a str>,
    map: &'a Map<String, Value>,
}

impl<'a> Declaration<'a> {
    pub(crate) fn class(class: &'a str, value: &'a Value) -> Result<Self, CompileError> {
        Self::new(class, None, value)
    }

    pub(crate) fn member(
        class: &'a str,
        member: &'a str,
        value: &'a Value,
    ) -> Result<Self, CompileError> {
        Self::new(class, Some(member), value)
    }

    fn new(class: &'a str, member: Option<&'a str>, value: &'a Value) -> Result<Self, CompileError> {
        match value {
            Value::Object(map) => Ok(Self { class, member, map }),
            other => Err(CompileError::malformed(
                Location::new(class, member),
                format!("expected a map declaration, found {}", describe(other)),
            )),
        }
    }

    pub(crate) const fn class_name(&self) -> &'a str {
        self.class
    }

    pub(crate) fn location(&self) -> Location {
        Location::new(self.class, self.member)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.map.keys().map(String::as_str)
    }

    // get
    // null counts as absent
    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    /// Canonical boolean flag: `true|1|"1"` or `false|0|"0"`. Unlike the
    /// other accessors, an explicit null is rejected.
    pub(crate) fn flag(&self, key: &str, default: bool) -> Result<bool, CompileError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(value) => to_bool(value).ok_or_else(|| {
                CompileError::malformed(
                    self.location(),
                    format!("'{key}' is not a boolean value ({value})"),
                )
            }),
        }
    }

    pub(crate) fn string(&self, key: &str) -> Result<Option<String>, CompileError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(CompileError::malformed(
                self.location(),
                format!("'{key}' must be a string, found {}", describe(other)),
            )),
        }
    }

    /// Like [`Self::string`], but an empty string counts as absent.
    pub(crate) fn non_empty_string(&self, key: &str) -> Result<Option<String>, CompileError> {
        Ok(self.string(key)?.filter(|s| !s.is_empty()))
    }

    pub(crate) fn required_string(&self, key: &str) -> Result<String, CompileError> {
        self.non_empty_string(key)?
            .ok_or_else(|| CompileError::missing(self.location(), key))
    }

    /// A scalar (string, number, bool) rendered as a string; used for
    /// discriminator values.
    pub(crate) fn scalar(&self, key: &str) -> Result<Option<String>, CompileError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => scalar_to_string(value).map(Some).ok_or_else(|| {
                CompileError::malformed(
                    self.location(),
                    format!("'{key}' must be a scalar value, found {}", describe(value)),
                )
            }),
        }
    }

    pub(crate) fn map(&self, key: &str) -> Result<Option<&'a Map<String, Value>>, CompileError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(other) => Err(CompileError::malformed(
                self.location(),
                format!("'{key}' must be a map, found {}", describe(other)),
            )),
        }
    }

    /// Keys outside `known`, kept verbatim for the emitter.
    pub(crate) fn extra(&self, known: &[&str]) -> IndexMap<String, Value> {
        self.map
            .iter()
            .filter(|(key, _)| !known.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

// to_bool
pub(crate) fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

// scalar_to_string
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// describe
pub(crate) const fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
