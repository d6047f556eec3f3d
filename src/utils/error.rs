use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to fetch listing page {url}: {reason}")]
    ListingFetch { url: String, reason: String },

    #[error("Failed to persist dataset to {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Run aborted before completion ({not_issued} fetches not issued)")]
    Aborted { not_issued: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Storage,
    Processing,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HarvestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HarvestError::Http(_) | HarvestError::ListingFetch { .. } => ErrorCategory::Network,
            HarvestError::ConfigError { .. }
            | HarvestError::ConfigValidationError { .. }
            | HarvestError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            HarvestError::IoError(_) | HarvestError::Persistence { .. } => ErrorCategory::Storage,
            HarvestError::SerializationError(_) => ErrorCategory::Processing,
            HarvestError::Aborted { .. } => ErrorCategory::Cancelled,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Cancelled => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Processing => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HarvestError::Http(_) => "Check TLS and proxy settings, then rerun",
            HarvestError::ListingFetch { .. } => {
                "Check the listing URL and network connectivity, then rerun"
            }
            HarvestError::ConfigError { .. }
            | HarvestError::ConfigValidationError { .. }
            | HarvestError::InvalidConfigValueError { .. } => {
                "Fix the configuration value (see --help) and rerun"
            }
            HarvestError::IoError(_) | HarvestError::Persistence { .. } => {
                "Check that the output directory exists and is writable; the previous dataset was left untouched"
            }
            HarvestError::SerializationError(_) => "The dataset could not be encoded as JSON",
            HarvestError::Aborted { .. } => "Rerun to collect the full catalog",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            HarvestError::ListingFetch { url, .. } => {
                format!("Could not load the airfoil listing at {url}; nothing was written")
            }
            HarvestError::Persistence { path, .. } => {
                format!("Could not save the dataset to {path}")
            }
            HarvestError::Aborted { not_issued } => format!(
                "Run was cancelled with {not_issued} files not fetched; no dataset was written"
            ),
            other => other.to_string(),
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        if matches!(self, HarvestError::Aborted { .. }) {
            return 130;
        }
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
