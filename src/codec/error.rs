use thiserror::Error;

use crate::codec::notification::{HeaderError, OpenError, UpdateError};

/// Wire-decode failures. Each variant carries enough to build the matching
/// `NotifyCode`/sub-code pair the FSM needs in order to react (not just log).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("header error: {0:?}")]
    Header(HeaderError),

    #[error("open error: {0:?}")]
    Open(OpenError),

    #[error("update error: {0:?}")]
    Update(UpdateError),

    #[error("incomplete message: need {needed} bytes, have {have}")]
    Incomplete { needed: usize, have: usize },

    #[error("nom parse error: {0}")]
    Nom(String),
}

impl CodecError {
    /// The (code, subcode) pair to send in the resulting NOTIFICATION.
    pub fn notify_code(&self) -> (u8, u8) {
        match self {
            CodecError::Header(e) => (1, *e as u8),
            CodecError::Open(e) => (2, *e as u8),
            CodecError::Update(e) => (3, *e as u8),
            CodecError::Incomplete { .. } => (1, HeaderError::BadMessageLength as u8),
            CodecError::Nom(_) => (1, HeaderError::BadMessageLength as u8),
        }
    }
}

impl<I> From<nom::Err<nom::error::Error<I>>> for CodecError
where
    I: std::fmt::Debug,
{
    fn from(e: nom::Err<nom::error::Error<I>>) -> Self {
        CodecError::Nom(format!("{e:?}"))
    }
}
