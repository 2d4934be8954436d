//! @ai:module:intent Define error and warning types for the annotation compiler
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result, AnnotationError, MsonError, VersionError, Origin, Warning
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Where a docblock came from, attached to every fatal annotation error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub class: String,
    pub method: Option<String>,
    pub file: Option<PathBuf>,
    pub lines: Option<(usize, usize)>,
}

impl Origin {
    /// @ai:intent Origin for a class-level docblock
    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            ..Default::default()
        }
    }

    /// @ai:intent Origin for a method-level docblock
    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: Some(method.into()),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, file: PathBuf, start: usize, end: usize) -> Self {
        self.file = Some(file);
        self.lines = Some((start, end));
        self
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{}::{}", self.class, method)?,
            None => write!(f, "{}", self.class)?,
        }

        if let Some(file) = &self.file {
            write!(f, " ({}", file.display())?;
            if let Some((start, end)) = self.lines {
                write!(f, ":{}-{}", start, end)?;
            }
            write!(f, ")")?;
        }

        Ok(())
    }
}

/// @ai:intent Errors raised while parsing or interpreting version tokens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Unrecognized version schema: `{0}`")]
    UnrecognizedSchema(String),

    #[error("An absolute version is required, but `{0}` is a range")]
    AbsoluteVersionRequired(String),

    #[error("Version range `{0}` ends before it starts")]
    InvertedRange(String),
}

/// @ai:intent Errors raised by the MSON field-notation parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MsonError {
    #[error("Could not parse the {field} of `{content}`")]
    InvalidSyntax { field: &'static str, content: String },

    #[error("Unsupported type `{0}`")]
    UnsupportedType(String),

    #[error("Type `{ty}` does not accept a subtype (got `{subtype}`)")]
    UnsupportedSubtype { ty: String, subtype: String },

    #[error("Type `{ty}` on `{identifier}` requires enumerated values")]
    MissingOptions { identifier: String, ty: String },
}

/// @ai:intent Fatal problems with a single annotation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Mson(#[from] MsonError),

    #[error("`{tag}` is missing its required `{field}`")]
    MissingRequiredField { field: &'static str, tag: String },

    #[error("`{tag}` is declared more than once")]
    DuplicateAnnotation { tag: String },

    #[error("Invalid path `{0}`: paths are absolute and contain no whitespace")]
    InvalidPath(String),

    #[error("Unknown representation `{0}`")]
    UnknownRepresentation(String),

    #[error("Unknown error representation `{0}`")]
    UnknownErrorRepresentation(String),

    #[error("Representation `{0}` is not configured")]
    UnconfiguredRepresentation(String),

    #[error("Representation `{0}` requires an error code")]
    MissingRepresentationErrorCode(String),

    #[error("Unknown HTTP code `{0}`")]
    UnknownReturnCode(String),

    #[error("Unknown return type `{0}`")]
    UnknownReturnType(String),

    #[error("Invalid vendor tag `{0}` supplied")]
    InvalidVendorTagSupplied(String),

    #[error("Invalid scope `{0}` supplied")]
    InvalidScopeSupplied(String),

    #[error("Invalid capability `{0}` supplied")]
    InvalidCapabilitySupplied(String),

    #[error("Path parameter `{0}` does not appear in any declared path")]
    UnknownPathParameter(String),

    #[error("`{0}` is not a supported HTTP method")]
    UnsupportedHttpMethod(String),
}

/// @ai:intent Unified error type for all compiler operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("{origin}: {source}")]
    Annotation {
        origin: Origin,
        #[source]
        source: AnnotationError,
    },

    #[error("Class `{0}` could not be found")]
    ClassNotFound(String),

    #[error("Method `{class}::{method}` is not implemented")]
    MethodNotImplemented { class: String, method: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown version `{0}`")]
    UnknownVersion(String),

    #[error("`{identifier}` is declared by both `{first}` and `{second}` in version {version}")]
    DuplicateAction {
        identifier: String,
        version: String,
        first: String,
        second: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// @ai:intent Attach an origin to an annotation error
    pub fn annotation(origin: &Origin, source: impl Into<AnnotationError>) -> Self {
        Error::Annotation {
            origin: origin.clone(),
            source: source.into(),
        }
    }

    /// @ai:intent Expose the underlying annotation error, if any
    pub fn annotation_error(&self) -> Option<&AnnotationError> {
        match self {
            Error::Annotation { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// @ai:intent Non-fatal diagnostics collected while building annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    UnsupportedDecorator {
        decorator: String,
        tag: String,
        origin: Origin,
    },
    UnknownTag {
        tag: String,
        origin: Origin,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsupportedDecorator {
                decorator,
                tag,
                origin,
            } => write!(f, "{}: unsupported decorator `:{}` on `{}`", origin, decorator, tag),
            Warning::UnknownTag { tag, origin } => write!(f, "{}: unknown tag `{}`", origin, tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_display_includes_location() {
        let origin = Origin::method("MovieController", "GET").with_location(
            PathBuf::from("src/movies.rs"),
            10,
            24,
        );

        assert_eq!(
            origin.to_string(),
            "MovieController::GET (src/movies.rs:10-24)"
        );
    }

    #[test]
    fn test_annotation_error_is_exposed() {
        let err = Error::annotation(
            &Origin::class("Movie"),
            AnnotationError::UnknownRepresentation("Person".to_string()),
        );

        assert_eq!(
            err.annotation_error(),
            Some(&AnnotationError::UnknownRepresentation("Person".to_string()))
        );
        assert!(err.to_string().starts_with("Movie: Unknown representation"));
    }
}
