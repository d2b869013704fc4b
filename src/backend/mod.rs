pub mod crypto_bigint_zp;
pub mod k256_ec;
pub mod num_bigint_zp;

pub use crypto_bigint_zp::{CryptoBigintZpElement, CryptoBigintZpGroup};
pub use k256_ec::{K256EcElement, K256EcGroup};
pub use num_bigint_zp::{NumBigintZpElement, NumBigintZpGroup};
