use thiserror::Error;

/// Errors returned while loading or binding a schema.
///
/// # Examples
/// ```
/// use protolens_core::schema::SchemaError;
///
/// let err = SchemaError::DuplicateFieldNumber {
///     message: "demo.Person".to_string(),
///     id: 1,
/// };
/// assert!(err.to_string().contains("duplicate field number 1"));
/// ```
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate type name: {name}")]
    DuplicateTypeName { name: String },
    #[error("duplicate field number {id} in {message}")]
    DuplicateFieldNumber { message: String, id: u32 },
    #[error("invalid field number {id} in {message}")]
    InvalidFieldNumber { message: String, id: u32 },
    #[error("unknown message type: {name}")]
    UnknownMessage { name: String },
}
