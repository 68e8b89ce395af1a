//! Centralized error handling for the toolchain. Every fatal condition is an
//! [`Error`] built through one of the named constructors; callers bubble them
//! up with `?`. Non-fatal conditions are logged, never constructed as errors.
use std::fmt;
use std::io;

/// Convenience alias used by every crate in the workspace.
pub type SiltResult<T> = Result<T, Error>;

/// A fatal toolchain error. The kind is boxed so that `Result<T, Error>` stays
/// a single word for the common `T`s.
pub struct Error {
    kind: Box<ErrorKind>,
}

enum ErrorKind {
    /// The input netlist could not be read or decoded.
    InvalidFile(String),
    /// The output stream could not be written.
    WriteError(String),
    /// The design violates a structural rule (bad widths, missing
    /// parameters, illegal port configurations).
    MalformedStructure(String),
    /// The design is well-formed but uses a construct the backend cannot
    /// express in its target language.
    Unsupported(String),
    Misc(String),
}

impl Error {
    pub fn invalid_file<S: ToString>(msg: S) -> Self {
        ErrorKind::InvalidFile(msg.to_string()).into()
    }

    pub fn write_error<S: ToString>(msg: S) -> Self {
        ErrorKind::WriteError(msg.to_string()).into()
    }

    pub fn malformed_structure<S: ToString>(msg: S) -> Self {
        ErrorKind::MalformedStructure(msg.to_string()).into()
    }

    pub fn unsupported<S: ToString>(msg: S) -> Self {
        ErrorKind::Unsupported(msg.to_string()).into()
    }

    pub fn misc<S: ToString>(msg: S) -> Self {
        ErrorKind::Misc(msg.to_string()).into()
    }

    /// A short tag naming the error category, used by tests and diagnostics.
    pub fn kind_str(&self) -> &'static str {
        match *self.kind {
            ErrorKind::InvalidFile(_) => "invalid-file",
            ErrorKind::WriteError(_) => "write-error",
            ErrorKind::MalformedStructure(_) => "malformed-structure",
            ErrorKind::Unsupported(_) => "unsupported",
            ErrorKind::Misc(_) => "misc",
        }
    }

    pub fn message(&self) -> &str {
        match &*self.kind {
            ErrorKind::InvalidFile(m)
            | ErrorKind::WriteError(m)
            | ErrorKind::MalformedStructure(m)
            | ErrorKind::Unsupported(m)
            | ErrorKind::Misc(m) => m,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ErrorKind::InvalidFile(m) => write!(f, "Invalid file: {m}"),
            ErrorKind::WriteError(m) => write!(f, "Write failed: {m}"),
            ErrorKind::MalformedStructure(m) => {
                write!(f, "Malformed structure: {m}")
            }
            ErrorKind::Unsupported(m) => write!(f, "Unsupported: {m}"),
            ErrorKind::Misc(m) => write!(f, "{m}"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::write_error(err.to_string())
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::write_error("formatting failed")
    }
}
