use thiserror::Error;

use crate::LineItem;

#[derive(Error, Debug)]
pub enum CreditError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to retrieve financial data for ticker '{ticker}': {message}")]
    DataRetrieval { ticker: String, message: String },

    #[error("Invalid line item '{item}': {reason}")]
    InvalidLineItem { item: LineItem, reason: String },
}

/// Coarse error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request input; rejected before any data fetch.
    Validation,
    /// Provider failure or a malformed statement.
    DataRetrieval,
}

impl CreditError {
    pub fn validation(message: impl Into<String>) -> Self {
        CreditError::Validation(message.into())
    }

    pub fn data_retrieval(ticker: impl Into<String>, message: impl Into<String>) -> Self {
        CreditError::DataRetrieval {
            ticker: ticker.into(),
            message: message.into(),
        }
    }

    pub fn invalid_line_item(item: LineItem, reason: impl Into<String>) -> Self {
        CreditError::InvalidLineItem {
            item,
            reason: reason.into(),
        }
    }

    /// A statement that cannot be scored counts as a retrieval failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CreditError::Validation(_) => ErrorKind::Validation,
            CreditError::DataRetrieval { .. } | CreditError::InvalidLineItem { .. } => {
                ErrorKind::DataRetrieval
            }
        }
    }
}
