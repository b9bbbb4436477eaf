use thiserror::Error;

/// Result type alias using SysDescError
pub type Result<T> = std::result::Result<T, SysDescError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (the CLI in
/// particular) can branch on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural / format
    InvalidInput,
    MalformedDocument,
    NeedsUpgrade,
    NotUpgradable,
    FormatAhead,
    UnknownScope,
    MissingScope,
    NotFound,
    AlreadyExists,

    // Filter
    InvalidFilter,
    FilterFileMissing,

    // Migration
    InvalidMigration,
    MigrationMissing,
    ValidationFailed,

    // Integration/IO
    Io,
    Serialization,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::MalformedDocument => "ERR_MALFORMED_DOCUMENT",
            ExErrorKind::NeedsUpgrade => "ERR_NEEDS_UPGRADE",
            ExErrorKind::NotUpgradable => "ERR_NOT_UPGRADABLE",
            ExErrorKind::FormatAhead => "ERR_FORMAT_AHEAD",
            ExErrorKind::UnknownScope => "ERR_UNKNOWN_SCOPE",
            ExErrorKind::MissingScope => "ERR_MISSING_SCOPE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::InvalidFilter => "ERR_INVALID_FILTER",
            ExErrorKind::FilterFileMissing => "ERR_FILTER_FILE_MISSING",
            ExErrorKind::InvalidMigration => "ERR_INVALID_MIGRATION",
            ExErrorKind::MigrationMissing => "ERR_MIGRATION_MISSING",
            ExErrorKind::ValidationFailed => "ERR_VALIDATION_FAILED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus context for
/// debugging. Validation failures carry the aggregated error list.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
    errors: Vec<String>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
            errors: Vec::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (description name, scope name, file path)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach aggregated validation errors
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Aggregated validation errors (empty unless `ValidationFailed`)
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity: {})", entity_id)?;
        }
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for document-model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SysDescError {
    // ===== Format Errors =====
    /// Document is older than the current format and must be upgraded first
    #[error("System description '{name}' has format version {version}, needs upgrade to {current}")]
    NeedsUpgrade {
        name: String,
        version: u32,
        current: u32,
    },

    /// Document carries no format version and cannot be upgraded
    #[error("System description '{name}' has no format version and cannot be upgraded")]
    NotUpgradable { name: String },

    /// Document was written by a newer implementation
    #[error("System description '{name}' has format version {version}, newer than supported {current}")]
    FormatAhead {
        name: String,
        version: u32,
        current: u32,
    },

    /// Raw document does not have the expected shape
    #[error("Malformed document: {reason}")]
    MalformedDocument { reason: String },

    // ===== Scope Errors =====
    /// Scope name is not registered
    #[error("Unknown scope: {scope}")]
    UnknownScope { scope: String },

    /// Required scopes are absent from a description
    #[error("System description '{name}' is missing scopes: {}", scopes.join(", "))]
    MissingScopes { name: String, scopes: Vec<String> },

    // ===== Filter Errors =====
    /// Filter definition could not be parsed
    #[error("Invalid filter definition '{fragment}': {reason}")]
    InvalidFilterDefinition { fragment: String, reason: String },

    // ===== Internal Errors =====
    /// Serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<SysDescError> for ExError {
    fn from(err: SysDescError) -> Self {
        let message = err.to_string();
        match err {
            SysDescError::NeedsUpgrade { name, .. } => ExError::new(ExErrorKind::NeedsUpgrade)
                .with_entity_id(name)
                .with_message(message),
            SysDescError::NotUpgradable { name } => ExError::new(ExErrorKind::NotUpgradable)
                .with_entity_id(name)
                .with_message(message),
            SysDescError::FormatAhead { name, .. } => ExError::new(ExErrorKind::FormatAhead)
                .with_entity_id(name)
                .with_message(message),
            SysDescError::MalformedDocument { .. } => {
                ExError::new(ExErrorKind::MalformedDocument).with_message(message)
            }
            SysDescError::UnknownScope { scope } => ExError::new(ExErrorKind::UnknownScope)
                .with_entity_id(scope)
                .with_message(message),
            SysDescError::MissingScopes { name, .. } => ExError::new(ExErrorKind::MissingScope)
                .with_entity_id(name)
                .with_message(message),
            SysDescError::InvalidFilterDefinition { fragment, .. } => {
                ExError::new(ExErrorKind::InvalidFilter)
                    .with_entity_id(fragment)
                    .with_message(message)
            }
            SysDescError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to SysDescError
impl From<serde_json::Error> for SysDescError {
    fn from(err: serde_json::Error) -> Self {
        SysDescError::Serialization {
            message: err.to_string(),
        }
    }
}
