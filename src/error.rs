use thiserror::Error;

use crate::dlog::GroupId;

/// Errors raised by the arithmetic helpers and the group backends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("arithmetic domain error: {0}")]
    ArithmeticDomain(String),
    #[error("element of group {found} passed to group {expected}")]
    GroupMismatch { expected: GroupId, found: GroupId },
    #[error("cannot encode {length} bytes into one group element (at most {max})")]
    EncodingLength { length: usize, max: usize },
    #[error("cannot construct group: {0}")]
    Construction(String),
}

impl From<num_bigint::ParseBigIntError> for Error {
    fn from(err: num_bigint::ParseBigIntError) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
