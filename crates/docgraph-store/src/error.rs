/// Errors from table operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row with this primary key exists in the scope.
    #[error("{table}: no row with primary key {key}")]
    NotFound { table: &'static str, key: u64 },

    /// A row with this primary key already exists in the scope.
    #[error("{table}: primary key {key} already in use")]
    DuplicateKey { table: &'static str, key: u64 },

    /// A unique secondary index already holds this key for another row.
    #[error("{table}.{index}: unique key {key} already held by row {existing}")]
    UniqueViolation {
        table: &'static str,
        index: &'static str,
        key: String,
        existing: u64,
    },

    /// The index name is not declared by the record type.
    #[error("{table}: unknown index {index:?}")]
    UnknownIndex { table: &'static str, index: String },

    /// Encoding or decoding a row failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A previous writer panicked while holding the table lock.
    #[error("table lock poisoned")]
    LockPoisoned,
}

/// Result alias for table operations.
pub type StoreResult<T> = Result<T, StoreError>;
