use html::TreeError;
use std::fmt;
use std::path::PathBuf;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum EngineError {
    /// The fragment text has no element to take as the subject.
    InvalidFragment,
    /// No locator strategy produced a node.
    NotFound { tag: String },
    /// A document, stylesheet or script file does not exist.
    ResourceMissing { path: PathBuf },
    /// A patch sub-operation could not find its target or could not be applied.
    PatchFailed { reason: String },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Config(String),
}

impl EngineError {
    pub fn patch_failed(reason: impl Into<String>) -> Self {
        EngineError::PatchFailed {
            reason: reason.into(),
        }
    }

    /// Failures that end the current fragment's cycle without implying anything
    /// about the next fragment in a batch.
    pub fn is_per_fragment(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidFragment | EngineError::NotFound { .. } | EngineError::PatchFailed { .. }
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidFragment => f.write_str("fragment contains no element"),
            EngineError::NotFound { tag } => {
                write!(f, "no <{tag}> element in the document matches the fragment")
            }
            EngineError::ResourceMissing { path } => {
                write!(f, "resource does not exist: {}", path.display())
            }
            EngineError::PatchFailed { reason } => write!(f, "patch failed: {reason}"),
            EngineError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            EngineError::Config(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl From<TreeError> for EngineError {
    fn from(err: TreeError) -> Self {
        EngineError::patch_failed(err.to_string())
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
