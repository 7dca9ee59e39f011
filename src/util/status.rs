use std::fmt;

/// Outcome classes surfaced to the host.
///
/// Engine-specific outcomes that have no counterpart here (merge in progress,
/// shutdown, expired, ...) collapse into [`Code::Other`]; the engine's message
/// is kept on the [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Ok,
    NotFound,
    Corruption,
    InvalidArgument,
    IOError,
    Busy,
    TimedOut,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: Code,
    message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Status {
            code: Code::Ok,
            message: None,
        }
    }

    fn with_message(code: Code, msg: impl Into<String>) -> Self {
        Status {
            code,
            message: Some(msg.into()),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_message(Code::NotFound, msg)
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::with_message(Code::Corruption, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::with_message(Code::InvalidArgument, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::with_message(Code::IOError, msg)
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Self::with_message(Code::Busy, msg)
    }

    pub fn timed_out(msg: impl Into<String>) -> Self {
        Self::with_message(Code::TimedOut, msg)
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::with_message(Code::Other, msg)
    }

    /// Status of a finished operation, for hosts that want a status value
    /// next to the result instead of matching on it.
    pub fn of<T>(result: &Result<T>) -> Status {
        match result {
            Ok(_) => Status::ok(),
            Err(status) => status.clone(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Code::NotFound
    }

    pub fn is_corruption(&self) -> bool {
        self.code == Code::Corruption
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.code == Code::InvalidArgument
    }

    pub fn is_io_error(&self) -> bool {
        self.code == Code::IOError
    }

    pub fn is_busy(&self) -> bool {
        self.code == Code::Busy
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.code, msg),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

impl From<rocksdb::Error> for Status {
    fn from(err: rocksdb::Error) -> Self {
        use rocksdb::ErrorKind;

        let code = match err.kind() {
            ErrorKind::NotFound => Code::NotFound,
            ErrorKind::Corruption => Code::Corruption,
            ErrorKind::InvalidArgument => Code::InvalidArgument,
            ErrorKind::IOError => Code::IOError,
            ErrorKind::Busy => Code::Busy,
            ErrorKind::TimedOut => Code::TimedOut,
            _ => Code::Other,
        };
        Status::with_message(code, err.into_string())
    }
}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Status::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::invalid_argument(format!("malformed options: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Status>;
