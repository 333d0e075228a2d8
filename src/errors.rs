use std::{io, net::SocketAddr, sync::Arc, time::Duration};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("could not connect to {addr}")]
    ConnectFailed {
        addr: SocketAddr,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("could not send query")]
    SendFailed {
        #[source]
        source: Arc<io::Error>,
    },
    #[error("could not receive response")]
    ReceiveFailed {
        #[source]
        source: Arc<io::Error>,
    },
    #[error("connection timed out after {0:?}")]
    TimedOut(Duration),
    #[error("not an OGP packet")]
    InvalidSignature,
    #[error("unexpected end of data")]
    UnexpectedEndOfData,
    #[error("unexpected header flags: {0}")]
    UnexpectedHeaderFlags(&'static str),
    #[error("unexpected response type 0x{0:02X}")]
    UnexpectedResponseType(u8),
    #[error("server says error: '{message}'")]
    ServerError { id: u8, message: String },
    #[error("could not get challenge number")]
    NoChallengeNumber,
    #[error("request id mismatch: sent {sent:#010X}, received {received:#010X}")]
    RequestIdMismatch { sent: u32, received: u32 },
    #[error("could not resolve {host}: {reason}")]
    ResolveFailed { host: String, reason: String },
    #[error("invalid color {0:?}")]
    InvalidColor(String),
}

/// Every nom failure on a complete buffer means the data ran out before the schema did.
impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for Error {
    fn from(_: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        Error::UnexpectedEndOfData
    }
}

pub type Result<T> = std::result::Result<T, Error>;
