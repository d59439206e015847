use std::fmt::{self, Display};

/// The kind of error that occurred while talking to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend could not be reached at all.
    Unreachable,
    /// The backend did not answer in time.
    TimedOut,
    /// The backend answered with a non-success status.
    Rejected,
    /// The response could not be understood.
    Malformed,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unreachable => write!(f, "Backend unreachable"),
            ErrorKind::TimedOut => write!(f, "Backend timed out"),
            ErrorKind::Rejected => write!(f, "Backend rejected the request"),
            ErrorKind::Malformed => write!(f, "Malformed backend response"),
            ErrorKind::Other => write!(f, "Backend error"),
        }
    }
}
