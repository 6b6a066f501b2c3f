use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Timeout,
    Status(u16),
    InvalidZone(String),
    MalformedRecord(String),
    UnknownModeCode(u8),
    UnknownFanCode(u8),
    UnsupportedIntent(String),
    Xml(String),
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Timeout => write!(f, "request timed out"),
            Error::Status(code) => write!(f, "unexpected HTTP status: {code}"),
            Error::InvalidZone(name) => write!(f, "invalid zone: {name}"),
            Error::MalformedRecord(msg) => write!(f, "malformed status record: {msg}"),
            Error::UnknownModeCode(code) => write!(f, "unknown mode code: {code}"),
            Error::UnknownFanCode(code) => write!(f, "unknown fan code: {code}"),
            Error::UnsupportedIntent(msg) => write!(f, "unsupported intent: {msg}"),
            Error::Xml(msg) => write!(f, "status document error: {msg}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(e)
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
