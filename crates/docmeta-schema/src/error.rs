use std::fmt::{self, Display};
use thiserror::Error as ThisError;

///
/// Location
/// The class (and optionally the field or association) an error points at.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    pub class: String,
    pub member: Option<String>,
}

impl Location {
    #[must_use]
    pub fn class(class: &str) -> Self {
        Self {
            class: class.to_string(),
            member: None,
        }
    }

    #[must_use]
    pub fn member(class: &str, member: &str) -> Self {
        Self {
            class: class.to_string(),
            member: Some(member.to_string()),
        }
    }

    #[must_use]
    pub fn new(class: &str, member: Option<&str>) -> Self {
        Self {
            class: class.to_string(),
            member: member.map(ToString::to_string),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(f, "'{member}' of class '{}'", self.class),
            None => write!(f, "class '{}'", self.class),
        }
    }
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorKind {
    DependencyCycle,
    InvariantViolation,
    MalformedDeclaration,
    MissingRequiredKey,
    UnknownReference,
}

///
/// CompileError
///
/// Every failure is fatal for the whole compile. The error always names the
/// offending class, and the member when there is one.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum CompileError {
    #[error("dependency cycle while resolving {stage}: no progress on {}", .classes.join(", "))]
    DependencyCycle {
        stage: &'static str,
        classes: Vec<String>,
    },

    #[error("invariant violation in {location}: {message}")]
    InvariantViolation { location: Location, message: String },

    #[error("malformed declaration in {location}: {message}")]
    MalformedDeclaration { location: Location, message: String },

    #[error("{location} is missing required key '{key}'")]
    MissingRequiredKey { location: Location, key: String },

    #[error("unknown reference in {location}: {message}")]
    UnknownReference { location: Location, message: String },
}

impl CompileError {
    pub(crate) fn malformed(location: Location, message: impl Into<String>) -> Self {
        Self::MalformedDeclaration {
            location,
            message: message.into(),
        }
    }

    pub(crate) fn missing(location: Location, key: &str) -> Self {
        Self::MissingRequiredKey {
            location,
            key: key.to_string(),
        }
    }

    pub(crate) fn unknown(location: Location, message: impl Into<String>) -> Self {
        Self::UnknownReference {
            location,
            message: message.into(),
        }
    }

    pub(crate) fn invariant(location: Location, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            location,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DependencyCycle { .. } => ErrorKind::DependencyCycle,
            Self::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            Self::MalformedDeclaration { .. } => ErrorKind::MalformedDeclaration,
            Self::MissingRequiredKey { .. } => ErrorKind::MissingRequiredKey,
            Self::UnknownReference { .. } => ErrorKind::UnknownReference,
        }
    }

    /// The class this error is attributed to, if it points at a single one.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::DependencyCycle { .. } => None,
            Self::InvariantViolation { location, .. }
            | Self::MalformedDeclaration { location, .. }
            | Self::MissingRequiredKey { location, .. }
            | Self::UnknownReference { location, .. } => Some(&location.class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_class_and_member() {
        let err = CompileError::missing(Location::member("Article", "author"), "class");
        let rendered = err.to_string();

        assert!(rendered.contains("'author' of class 'Article'"), "{rendered}");
        assert!(rendered.contains("'class'"), "{rendered}");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredKey);
        assert_eq!(err.class(), Some("Article"));
    }

    #[test]
    fn dependency_cycle_lists_stalled_classes() {
        let err = CompileError::DependencyCycle {
            stage: "hasReferences",
            classes: vec!["A".to_string(), "B".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "dependency cycle while resolving hasReferences: no progress on A, B"
        );
        assert_eq!(err.class(), None);
    }
}
