use thiserror::Error;

/// Failures surfaced to the operator by any screen action.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Failed to connect to database: {0}")]
    DatabaseUnavailable(String),

    #[error("Admin session not found")]
    Unauthenticated,

    #[error("You do not have admin privileges")]
    Forbidden,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    PolicyViolation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("A user with this email already exists")]
    DuplicateEmail,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Not an audio file: {0} (pass --any-file to upload it anyway)")]
    UnsupportedFileType(String),
}

pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    /// Whether the session artifact must be discarded and the operator sent back to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, AdminError::Unauthenticated | AdminError::Forbidden)
    }
}

/// Operator-facing message, the console counterpart of a blocking dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: "Success",
            message: message.into(),
        }
    }

    pub fn warning(title: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            title,
            message: message.into(),
        }
    }
}

impl From<&AdminError> for Notice {
    fn from(err: &AdminError) -> Self {
        let (level, title) = match err {
            AdminError::DatabaseUnavailable(_) => (NoticeLevel::Error, "Database Connection Error"),
            AdminError::Unauthenticated => (NoticeLevel::Error, "Error"),
            AdminError::Forbidden => (NoticeLevel::Error, "Access Denied"),
            AdminError::Validation(ValidationError::PasswordMismatch)
            | AdminError::Validation(ValidationError::PasswordTooShort { .. }) => {
                (NoticeLevel::Warning, "Password Error")
            }
            AdminError::Validation(ValidationError::InvalidEmail) => (NoticeLevel::Warning, "Email Error"),
            AdminError::Validation(_) => (NoticeLevel::Warning, "Input Error"),
            AdminError::PolicyViolation(_) => (NoticeLevel::Error, "Error"),
            AdminError::NotFound { .. } => (NoticeLevel::Warning, "Not Found"),
            AdminError::Database(_) => (NoticeLevel::Error, "Database Error"),
            AdminError::Io(_) => (NoticeLevel::Error, "Error"),
        };
        Notice {
            level,
            title,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.title, self.message)
    }
}
