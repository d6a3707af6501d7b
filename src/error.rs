use std::{error::Error, fmt, fmt::Display};

#[derive(Debug)]
pub enum DashErrors {
    CommandFailed { program: String, code: Option<i32> },
    EmptyOutput(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidPattern(regex::Error),
    Config(String),
    Listen(String),
}
impl Display for DashErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashErrors::CommandFailed {
                program,
                code: Some(code),
            } => write!(f, "{program} exited with status {code}"),
            DashErrors::CommandFailed {
                program,
                code: None,
            } => write!(f, "{program} was terminated by a signal"),
            DashErrors::EmptyOutput(program) => write!(f, "{program} produced no output"),
            DashErrors::Io(err) => write!(f, "I/O error: {err}"),
            DashErrors::Json(err) => write!(f, "Malformed JSON: {err}"),
            DashErrors::InvalidPattern(err) => write!(f, "Invalid interface pattern: {err}"),
            DashErrors::Config(msg) => write!(f, "Config error: {msg}"),
            DashErrors::Listen(msg) => write!(f, "Listen error: {msg}"),
        }
    }
}
impl Error for DashErrors {}

impl From<std::io::Error> for DashErrors {
    fn from(err: std::io::Error) -> Self {
        DashErrors::Io(err)
    }
}

impl From<serde_json::Error> for DashErrors {
    fn from(err: serde_json::Error) -> Self {
        DashErrors::Json(err)
    }
}

impl From<regex::Error> for DashErrors {
    fn from(err: regex::Error) -> Self {
        DashErrors::InvalidPattern(err)
    }
}
