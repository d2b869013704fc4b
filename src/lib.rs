pub mod backend;
pub mod bigint;
pub mod bytes;
pub mod curve;
pub mod dlog;
pub mod error;
mod exp;
pub mod groups;
pub mod math;
pub mod nat;

#[cfg(test)]
mod tests;

pub use backend::{
    CryptoBigintZpElement, CryptoBigintZpGroup, K256EcElement, K256EcGroup, NumBigintZpElement,
    NumBigintZpGroup,
};
pub use bigint::{BigInteger, Sign};
pub use dlog::{DlogGroup, GroupElement, GroupId};
pub use error::{Error, Result};
pub use groups::ZpParams;
