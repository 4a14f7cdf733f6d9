//! Error types for the ancestry index.

/// Errors that can occur while building or querying an ancestry index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A queried id has no entry in the ancestry.
    #[error("{0} not found in the ancestry")]
    NotFound(String),

    /// The parent references form a cycle, which violates the forest invariant.
    #[error("malformed input: parent chain starting at {node} contains a cycle")]
    MalformedInput {
        /// The node whose ancestor chain revisited an id.
        node: String,
    },

    /// A record field could not be used as a node key.
    #[error("invalid key in field `{field}`: {value}")]
    InvalidKey {
        /// The configured field name.
        field: String,
        /// The offending JSON value, rendered.
        value: String,
    },

    /// The record collection itself is not usable.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
