use strum::IntoStaticStr;

use crate::fs::FsError;

/// The closed set of failure kinds a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    InsufficientParams,
    InvalidRequest,
    RemoteRequest,
    KeyNotFound,
    SignatureMismatch,
    SignatureInvalid,
    Cancelled,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr: &'static str = self.into();
        f.write_str(repr)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse {0}")]
    /// Malformed numeric string, document or protobuf payload
    Parse(String),
    #[error("Insufficient parameters: {0}")]
    /// A required option is missing
    InsufficientParams(String),
    #[error("Invalid request: {0}")]
    /// Conflicting or inconsistent options
    InvalidRequest(String),
    #[error("Unknown message type: {0}")]
    /// The message router has no entry for the tag
    UnknownMessageType(String),
    #[error("Remote request failed: {0}")]
    /// Simulate, account lookup, estimate gas or broadcast failure
    RemoteRequest(String),
    #[error("Key not found: {0}")]
    /// Keyring lookup miss
    KeyNotFound(String),
    #[error("Signature mismatch: {0}")]
    /// Signer count or signer address does not line up with the transaction
    SignatureMismatch(String),
    #[error("Insufficient signatures: collected {have}, threshold is {threshold}")]
    /// Fewer verified multisig member signatures than the key threshold
    InsufficientSignatures { have: usize, threshold: usize },
    #[error("Signature invalid: {0}")]
    /// Cryptographic verification failure
    SignatureInvalid(String),
    #[error("Operation cancelled")]
    /// The cancellation token fired before the remote call completed
    Cancelled,
    #[error(transparent)]
    Fs(#[from] FsError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::InsufficientParams(_) => ErrorKind::InsufficientParams,
            Error::InvalidRequest(_) | Error::UnknownMessageType(_) => ErrorKind::InvalidRequest,
            Error::RemoteRequest(_) => ErrorKind::RemoteRequest,
            Error::KeyNotFound(_) => ErrorKind::KeyNotFound,
            Error::SignatureMismatch(_) | Error::InsufficientSignatures { .. } => {
                ErrorKind::SignatureMismatch
            }
            Error::SignatureInvalid(_) => ErrorKind::SignatureInvalid,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Fs(_) => ErrorKind::Io,
        }
    }

    pub fn parse(what: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Error::Parse(format!("{what}: {err}"))
    }

    pub fn remote(what: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Error::RemoteRequest(format!("{what}: {err}"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
