//! Error types for binning and information value analysis.
//!
//! Errors fall into two groups. Run-level errors invalidate every variable's
//! computation (bad outcome column, schema mismatch between training and
//! validation data, invalid configuration) and abort immediately, whether they
//! are detected up front or while one variable is being analyzed.
//! Variable-level errors are recorded against the single variable that raised
//! them. [`InfoError::is_global`] draws the line.

use polars::prelude::PolarsError;

/// Errors raised while building information tables.
#[derive(Debug, thiserror::Error)]
pub enum InfoError {
    /// The variable has no usable (non-missing) values.
    #[error("variable '{variable}' has no non-missing values to bin")]
    InsufficientData {
        /// Variable name
        variable: String,
    },

    /// The outcome of a whole dataset (or of one treatment arm) has a single
    /// class, so WOE is undefined. Counts cover every record of the dataset,
    /// validation records outside the training bins included.
    #[error("outcome is degenerate in {context}: {events} event(s), {non_events} non-event(s)")]
    DegenerateOutcome {
        /// Where the degenerate outcome was observed (training, validation, an arm)
        context: String,
        /// Number of records with outcome 1
        events: usize,
        /// Number of records with outcome 0
        non_events: usize,
    },

    /// An uplift bin has no members in one treatment arm.
    #[error("variable '{variable}', bin '{bin}': no records in the {arm} group")]
    InsufficientGroup {
        /// Variable name
        variable: String,
        /// Bin label
        bin: String,
        /// Arm that is empty ("treatment" or "control")
        arm: String,
    },

    /// Validation data does not match the training schema.
    #[error("schema mismatch for column '{column}': {reason}")]
    SchemaMismatch {
        /// Column name
        column: String,
        /// What did not match
        reason: String,
    },

    /// A named column does not exist in the dataset.
    #[error("column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// An outcome or treatment column is not binary.
    #[error("column '{column}' must be binary (0/1); found values {found:?}")]
    NonBinaryColumn {
        /// Column name
        column: String,
        /// Distinct values observed
        found: Vec<String>,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying dataframe error.
    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

impl InfoError {
    /// Whether this error aborts the whole run rather than one variable.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            InfoError::DegenerateOutcome { .. }
                | InfoError::SchemaMismatch { .. }
                | InfoError::ColumnNotFound(_)
                | InfoError::NonBinaryColumn { .. }
                | InfoError::InvalidConfig(_)
        )
    }

    /// Short machine-readable kind, used in summaries and exports.
    pub fn kind(&self) -> &'static str {
        match self {
            InfoError::InsufficientData { .. } => "insufficient_data",
            InfoError::DegenerateOutcome { .. } => "degenerate_outcome",
            InfoError::InsufficientGroup { .. } => "insufficient_group",
            InfoError::SchemaMismatch { .. } => "schema_mismatch",
            InfoError::ColumnNotFound(_) => "column_not_found",
            InfoError::NonBinaryColumn { .. } => "non_binary_column",
            InfoError::InvalidConfig(_) => "invalid_config",
            InfoError::Polars(_) => "dataframe",
        }
    }
}

/// Result alias for the analysis core.
pub type InfoResult<T> = std::result::Result<T, InfoError>;
