/// Generic DECT NWK Error
#[derive(Debug)]
pub struct DectError {
    kind: ErrorKind,
    inner: std::io::Error,
}

///
pub type Result<T> = std::result::Result<T, DectError>;

/// Classification of a NWK-layer failure
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Input exhausted before the announced length
    Truncated,
    /// A mandatory information element is absent
    MandatoryIeMissing,
    /// A mandatory information element failed to decode
    MandatoryIeError,
    /// An information element cannot be encoded or is not allowed here
    InvalidIe,
    /// No transaction identifier is available for this protocol
    Overload,
    /// Socket or event-loop failure
    Io,
}

impl DectError {
    /// Return a new DECT Error with a message
    pub fn new<E>(kind: ErrorKind, msg: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>> + std::fmt::Debug,
    {
        log::error!("{:?}: {:?}", kind, msg);
        DectError {
            kind,
            inner: std::io::Error::new(std::io::ErrorKind::Other, msg),
        }
    }

    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Display for DectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.inner)
    }
}

impl std::error::Error for DectError {}

impl From<std::io::Error> for DectError {
    fn from(err: std::io::Error) -> Self {
        log::error!("{:?}", err);
        DectError {
            kind: ErrorKind::Io,
            inner: err,
        }
    }
}
