use thiserror::Error;

use super::model::ListingColumn;

/// Table-level failures: a column the caller needs is not there at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("required column '{0}' is missing from the table")]
    MissingColumn(ListingColumn),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{0}' is not numeric")]
    NotNumeric(ListingColumn),
}

/// Row-level failures: a single listing lacks the value a derived field needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("listing has no '{0}' value to derive from")]
    MissingField(ListingColumn),
}
