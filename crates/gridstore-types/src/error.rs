//! Value conversion error types.

use thiserror::Error;

/// Errors that can occur while converting values to or from their wire
/// representation.
#[derive(Debug, Error)]
pub enum ValueError {
    /// Structured serialization failed while encoding a composite value.
    #[error("structured encoding failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Structured deserialization failed while decoding a composite value.
    #[error("structured decoding failed: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The encoded value's tag does not match the requested destination
    /// type.
    #[error("cannot decode {actual} value into {expected}")]
    WrongKind {
        /// The destination type name.
        expected: &'static str,
        /// The tag actually present.
        actual: &'static str,
    },

    /// A structured-object value was decoded without a typed destination.
    ///
    /// Dynamic decoding cannot reconstruct a composite type; use
    /// [`Json<T>`](crate::Json) to name the destination shape.
    #[error("structured value requires a typed destination")]
    UntypedStructured,

    /// The caller supplied input of the wrong shape for a collection
    /// operation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A failure while decoding one column of a table, wrapped with the
    /// column name.
    #[error("column {column}: {source}")]
    Column {
        /// The column being decoded.
        column: String,
        /// The underlying failure.
        source: Box<ValueError>,
    },
}
