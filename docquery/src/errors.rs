use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for docquery operations.
///
/// Each kind names one category of failure so that callers can branch on
/// [QueryError::kind] instead of parsing messages.
///
/// # Examples
///
/// ```rust
/// use docquery::errors::{ErrorKind, QueryError, QueryResult};
///
/// fn example() -> QueryResult<()> {
///     Err(QueryError::new("collection name mismatch", ErrorKind::CollectionNameMismatch))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::CollectionNameMismatch);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Projection and conversion errors
    /// A model or its intermediate form could not be encoded or decoded
    EncodingError,
    /// Projection exceeded the maximum nesting depth
    RecursionError,
    /// A value could not be mapped to or from a typed model
    ObjectMappingError,

    // Identifier errors
    /// A store generated identifier could not be converted to the declared id type
    InvalidId,
    /// A document with the same `_id` already exists
    DuplicateKey,

    // Operation errors
    /// The operation is not valid in the current context
    InvalidOperation,
    /// The collection bound to a querier is not the one named by the caller
    CollectionNameMismatch,
    /// The collection name is empty or uses a reserved form
    InvalidCollectionName,
    /// Generic validation error
    ValidationError,

    // Connection errors
    /// The connection uri could not be parsed
    InvalidUri,
    /// No store is available for the uri scheme
    UnsupportedScheme,
    /// The store has already been closed
    StoreAlreadyClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::RecursionError => write!(f, "Recursion error"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::CollectionNameMismatch => write!(f, "Collection name mismatch"),
            ErrorKind::InvalidCollectionName => write!(f, "Invalid collection name"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidUri => write!(f, "Invalid uri"),
            ErrorKind::UnsupportedScheme => write!(f, "Unsupported scheme"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// The error type of every fallible docquery operation.
///
/// A `QueryError` carries a message, an [ErrorKind], an optional cause and the
/// backtrace captured where it was created. The backtrace is resolved lazily,
/// only when the error is printed with `{:?}`.
///
/// # Examples
///
/// ```rust
/// use docquery::errors::{ErrorKind, QueryError};
///
/// let cause = QueryError::new("value is not a document", ErrorKind::ObjectMappingError);
/// let err = QueryError::new_with_cause("failed to cast", ErrorKind::EncodingError, cause);
/// assert_eq!(err.kind(), &ErrorKind::EncodingError);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct QueryError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<QueryError>>,
    backtrace: Arc<Backtrace>,
}

impl QueryError {
    /// Creates a new `QueryError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        QueryError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new_unresolved()),
        }
    }

    /// Creates a new `QueryError` wrapping `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: QueryError) -> Self {
        QueryError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new_unresolved()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&QueryError> {
        self.cause.as_deref()
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = (*self.backtrace).clone();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, backtrace)
            }
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// `QueryResult<T>` is shorthand for `Result<T, QueryError>`.
pub type QueryResult<T> = Result<T, QueryError>;

impl de::Error for QueryError {
    fn custom<T: Display>(msg: T) -> Self {
        QueryError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl ser::Error for QueryError {
    fn custom<T: Display>(msg: T) -> Self {
        QueryError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<std::string::FromUtf8Error> for QueryError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        QueryError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<std::fmt::Error> for QueryError {
    fn from(err: std::fmt::Error) -> Self {
        QueryError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}

impl From<std::num::ParseIntError> for QueryError {
    fn from(err: std::num::ParseIntError) -> Self {
        QueryError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::ValidationError,
        )
    }
}

impl From<String> for QueryError {
    fn from(msg: String) -> Self {
        QueryError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for QueryError {
    fn from(msg: &str) -> Self {
        QueryError::new(msg, ErrorKind::InternalError)
    }
}
