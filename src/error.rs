use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed error detail carried as the source of an [`Error`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Setup,
    Transport,
    Parser,
    Queue,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Setup => write!(f, "setup"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Parser => write!(f, "parser"),
            ErrorKind::Queue => write!(f, "queue"),
        }
    }
}

pub struct ErrorInner {
    pub kind: ErrorKind,
    pub source: Option<BoxError>,
    pub message: Option<String>,
}

pub struct Error {
    pub inner: Box<ErrorInner>,
}

impl Error {
    pub fn new<E>(kind: ErrorKind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(ErrorInner {
                kind,
                source: source.map(Into::into),
                message: None,
            }),
        }
    }

    pub fn with_message<E>(kind: ErrorKind, message: String, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(ErrorInner {
                kind,
                source: source.map(Into::into),
                message: Some(message),
            }),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    pub fn is_setup(&self) -> bool {
        matches!(self.inner.kind, ErrorKind::Setup)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, ErrorKind::Transport)
    }

    pub fn is_parser(&self) -> bool {
        matches!(self.inner.kind, ErrorKind::Parser)
    }

    pub fn is_queue(&self) -> bool {
        matches!(self.inner.kind, ErrorKind::Queue)
    }

    /// True when the underlying transport reported a cooperative cancel.
    pub fn is_canceled(&self) -> bool {
        if let Some(source) = &self.inner.source {
            matches!(
                source.downcast_ref::<TransportError>(),
                Some(TransportError::Canceled)
            )
        } else {
            false
        }
    }

    pub fn is_timeout(&self) -> bool {
        if let Some(source) = &self.inner.source {
            if matches!(
                source.downcast_ref::<TransportError>(),
                Some(TransportError::Timeout)
            ) {
                return true;
            }
            source.to_string().to_lowercase().contains("timeout")
        } else {
            false
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("reqflow::Error");
        f.field("kind", &self.inner.kind);
        if let Some(ref message) = self.inner.message {
            f.field("message", message);
        }
        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }
        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref message) = self.inner.message {
            write!(f, "{} error: {}", self.inner.kind, message)?;
        } else {
            write!(f, "{} error", self.inner.kind)?;
        }

        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|e| &**e as &(dyn StdError + 'static))
    }
}

impl From<SetupError> for Error {
    fn from(err: SetupError) -> Self {
        Error::new(ErrorKind::Setup, Some(err))
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::new(ErrorKind::Transport, Some(err))
    }
}

impl From<ParserError> for Error {
    fn from(err: ParserError) -> Self {
        Error::new(ErrorKind::Parser, Some(err))
    }
}

impl From<QueueError> for Error {
    fn from(err: QueueError) -> Self {
        Error::new(ErrorKind::Queue, Some(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::from(ParserError::InvalidJson(err.to_string().into()))
    }
}

/// Fatal configuration problems, raised before any I/O is issued.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("request url is empty")]
    EmptyUrl,
    #[error("parser chain is empty")]
    EmptyParserChain,
    #[error("no transport factory configured")]
    MissingTransport,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    SendFailed(#[source] BoxError),
    #[error("request timed out")]
    Timeout,
    #[error("request canceled")]
    Canceled,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("body encode failed: {0}")]
    BodyEncode(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid json: {0}")]
    InvalidJson(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("insertion cursor does not point at an open group")]
    NoOpenGroup,
    #[error("request spec has no executor after binding")]
    UnboundSpec,
}

impl Error {
    pub fn transport_canceled() -> Self {
        Error::from(TransportError::Canceled)
    }

    pub fn transport_timeout() -> Self {
        Error::from(TransportError::Timeout)
    }

    pub fn send_failed<E: Into<BoxError>>(source: E) -> Self {
        Error::from(TransportError::SendFailed(source.into()))
    }
}
