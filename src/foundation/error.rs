use std::fmt;

/// Result alias used across the crate.
pub type VizResult<T> = Result<T, VizError>;

/// Error taxonomy for resolution, rendering and incremental generation.
#[derive(thiserror::Error, Debug)]
pub enum VizError {
    /// Malformed intent: arity mismatch, unknown chart type, bad template or path.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A chart kind needs an option that is still unset after resolution.
    #[error("required parameter missing at '{path}': {kind} charts need '{param}'")]
    RequiredParameterMissing {
        /// Slash-joined tree path of the offending intent.
        path: String,
        /// Chart kind that raised the error.
        kind: String,
        /// Name of the missing option.
        param: String,
    },

    /// A filter or data reference names a source or column that does not exist.
    #[error("data binding error in `{expr}`: {message}")]
    DataBinding {
        /// Offending expression or data reference text.
        expr: String,
        /// What could not be bound.
        message: String,
    },

    /// The build manifest could not be read or written.
    #[error("cache io error: {0}")]
    CacheIo(String),

    /// The top-level content could not be interpreted at all.
    #[error("structural error: {0}")]
    Structure(String),

    /// A renderer or document backend failed.
    #[error("render error: {0}")]
    Render(String),

    /// (De)serialization failure outside the manifest.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The generation pass was interrupted before this unit completed.
    #[error("generation cancelled")]
    Cancelled,

    /// Any other failure, passed through unchanged.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VizError {
    /// Invalid user configuration.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Missing required option `param` for a `kind` item at `path`.
    pub fn required(path: &[String], kind: impl Into<String>, param: impl Into<String>) -> Self {
        Self::RequiredParameterMissing {
            path: join_path(path),
            kind: kind.into(),
            param: param.into(),
        }
    }

    /// A filter or column could not be bound to its data.
    pub fn data_binding(expr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataBinding {
            expr: expr.into(),
            message: message.into(),
        }
    }

    /// Manifest read or write failure.
    pub fn cache_io(msg: impl Into<String>) -> Self {
        Self::CacheIo(msg.into())
    }

    /// Invalid dashboard structure.
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }

    /// Chart shaping or backend failure.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Serialization failure.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for VizError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

/// An error attributed to one content item of an output unit.
#[derive(Debug)]
pub struct ItemError {
    /// Position of the raw intent in the unit's content list.
    pub index: usize,
    /// Tree path of the item when it got far enough to have one.
    pub path: Vec<String>,
    /// The underlying error.
    pub error: VizError,
}

impl ItemError {
    pub(crate) fn new(index: usize, path: Vec<String>, error: VizError) -> Self {
        Self { index, path, error }
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "item #{}: {}", self.index, self.error)
        } else {
            write!(
                f,
                "item #{} ({}): {}",
                self.index,
                join_path(&self.path),
                self.error
            )
        }
    }
}

pub(crate) fn join_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_owned()
    } else {
        path.join("/")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
