use thiserror::Error;

/// Every failure the catalog, checkout and API layers can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Missing or malformed configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Caller input rejected before any write
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A referenced record does not exist (or is outside the store)
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record, e.g. `"product"`
        entity: &'static str,
        /// Identifier the caller supplied
        id: String,
    },

    /// The write would break a uniqueness rule or orphan dependent records
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Checkout asked for more units than a variant has
    #[error("Insufficient stock for variant {variant_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Variant being purchased
        variant_id: i64,
        /// Units requested
        requested: i32,
        /// Units on hand
        available: i32,
    },

    /// Slug candidates ran out before a free one was found
    #[error("Could not allocate a unique slug for '{base}' after {attempts} attempts")]
    SlugExhausted {
        /// Base slug derived from the name
        base: String,
        /// Number of candidates tried
        attempts: usize,
    },

    /// A sub-category parent chain loops back on itself
    #[error("Sub-category hierarchy contains a cycle at {id}")]
    CyclicHierarchy {
        /// Id at which the walk revisited a node
        id: i64,
    },

    /// Unknown hot-deals time window label
    #[error("Invalid time frame: {value}")]
    InvalidTimeWindow {
        /// Label supplied by the caller
        value: String,
    },

    /// Webhook body does not match its signature
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// The payment gateway refused or failed a request
    #[error("Payment gateway error: {message}")]
    PaymentGateway {
        /// Gateway-provided reason
        message: String,
    },

    /// I/O failure (config file, socket binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`] keyed by any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`Error::Conflict`] with the given message.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
