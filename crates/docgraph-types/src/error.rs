use thiserror::Error;

/// Errors produced when parsing or validating primitive types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid account name {name:?}: {reason}")]
    InvalidAccountName { name: String, reason: String },

    #[error("invalid symbol {symbol:?}: {reason}")]
    InvalidSymbol { symbol: String, reason: String },

    #[error("invalid asset {text:?}: {reason}")]
    InvalidAsset { text: String, reason: String },
}

/// Errors produced by content lookup and mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// No group carries the requested group label.
    #[error("group {group:?} is required but not found")]
    GroupNotFound { group: String },

    /// The group exists but has no item with the requested label.
    #[error("group {group:?}; content {label:?} is required but not found")]
    ContentNotFound { group: String, label: String },

    /// A typed accessor was used against a value of a different kind.
    #[error("content {label:?} holds {actual}, expected {expected}")]
    TypeMismatch {
        label: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A `content_group_label` (or `content_group_type`) item has the wrong kind.
    #[error("reserved item {label:?} must hold {expected}, found {actual}")]
    InvalidReservedItem {
        label: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("group index {index} out of range ({len} groups)")]
    GroupIndexOutOfRange { index: usize, len: usize },
}

impl ContentError {
    /// `true` for the fail-fast type check failures.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. } | Self::InvalidReservedItem { .. }
        )
    }

    /// `true` when the requested group or item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound { .. }
                | Self::ContentNotFound { .. }
                | Self::GroupIndexOutOfRange { .. }
        )
    }
}
