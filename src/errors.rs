use thiserror::Error;

use crate::types::{PaymentId, PaymentStatus};

/// failures reported by a payment store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("version conflict on payment {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: PaymentId,
        expected: u64,
        actual: u64,
    },

    #[error("payment {id} already exists")]
    DuplicateId {
        id: PaymentId,
    },

    #[error("payment {id} vanished during update")]
    Missing {
        id: PaymentId,
    },

    #[error("store unavailable: {message}")]
    Unavailable {
        message: String,
    },

    #[error("serialization failure: {message}")]
    Serialization {
        message: String,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// coarse classification used by the api layer to pick a response family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("payment not found with id: {id}")]
    NotFound {
        id: PaymentId,
    },

    #[error("invalid argument: {message}")]
    InvalidArgument {
        message: String,
    },

    #[error("concurrent modification of payment {id}: gave up after {attempts} attempts")]
    Conflict {
        id: PaymentId,
        attempts: u32,
    },

    #[error("status transition not allowed: {from:?} -> {to:?}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error(transparent)]
    Infrastructure(#[from] StoreError),
}

impl LedgerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::InvalidArgument { .. } | LedgerError::InvalidTransition { .. } => {
                ErrorKind::InvalidArgument
            }
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::InvalidConfiguration { .. } | LedgerError::Infrastructure(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// true for errors the caller can fix by changing the request
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Infrastructure
    }

    /// message safe to show outside the service
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Infrastructure => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
