use std::{
    error::Error as StdError,
    fmt, io,
    num::ParseFloatError,
    result::Result as StdResult,
};

/// A type alias for `Result<T, epispan::Error>`.
pub type Result<T> = StdResult<T, Error>;

/// Error when reading a prediction table or writing epitopes.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// A crate private constructor for `Error`.
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwrap this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

/// Specific errors that can happen.
#[derive(Debug)]
pub enum ErrorKind {
    /// I/O error.
    Io(io::Error),
    /// Could not convert a field into a float.
    Float(ParseFloatError),
    /// Error during parsing.
    Parser(String),
    /// Error whilst reading a record.
    ReadRecord(String),
    /// The residue or score column could not be identified.
    Columns(String),
    /// No field delimiter could be detected.
    Delimiter(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<ParseFloatError> for Error {
    fn from(err: ParseFloatError) -> Self {
        Error::new(ErrorKind::Float(err))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Io(ref err) => write!(f, "I/O error - {}", err),
            ErrorKind::Float(ref err) => write!(f, "parsing float error - {}", err),
            ErrorKind::Parser(ref err) => write!(f, "parser error - {}", err),
            ErrorKind::ReadRecord(ref err) => write!(f, "reading record - {}", err),
            ErrorKind::Columns(ref err) => write!(f, "column detection - {}", err),
            ErrorKind::Delimiter(ref err) => write!(f, "delimiter detection - {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self.0 {
            ErrorKind::Io(ref err) => Some(err),
            ErrorKind::Float(ref err) => Some(err),
            _ => None,
        }
    }
}
