use std::fmt;

/// Machine-readable error codes emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A node, edge, or endpoint id collided with one already present.
    DuplicateId,
    /// A replace or remove referenced an id that does not exist.
    MissingId,
    /// The same id appeared twice within one patch's add/remove/replace sets.
    ConflictingPatchId,
    /// A node replacement dropped an endpoint, or a node removal found
    /// incident edges, that were still referenced.
    DanglingEndpoint,
    /// `Workspace::update` was entered while a transaction was already open.
    ReentrantTransaction,
    /// An error-level diagnostic was raised during a transaction.
    ValidationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DuplicateId => "DUPLICATE_ID",
            ErrorCode::MissingId => "MISSING_ID",
            ErrorCode::ConflictingPatchId => "CONFLICTING_PATCH_ID",
            ErrorCode::DanglingEndpoint => "DANGLING_ENDPOINT",
            ErrorCode::ReentrantTransaction => "REENTRANT_TRANSACTION",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level engine error (returned from public API).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into() }
    }

    pub fn duplicate_id(kind: &str, id: &str) -> Self {
        Self::new(ErrorCode::DuplicateId, format!("{kind} '{id}' already exists"))
    }

    pub fn missing_id(kind: &str, id: &str) -> Self {
        Self::new(ErrorCode::MissingId, format!("{kind} '{id}' does not exist"))
    }

    pub fn conflicting_patch_id(kind: &str, id: &str) -> Self {
        Self::new(
            ErrorCode::ConflictingPatchId,
            format!("{kind} '{id}' appears more than once in this patch"),
        )
    }

    pub fn dangling_endpoint(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::DanglingEndpoint, detail.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
