use crate::bigint::{BigInteger, PRIME_CERTAINTY};
use crate::error::{Error, Result};
use crate::math::generate_safe_prime;

/// Smallest modulus the Zp groups accept. Anything below leaves no room for
/// the byte encoding.
pub const MIN_ZP_BITS: u64 = 16;

/// Oakley group 2 of RFC 2409, a 1024-bit safe prime
const RFC2409_MODP1024_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE65381",
    "FFFFFFFFFFFFFFFF",
);

/// Parameters of the subgroup of Zp* of prime order q,
/// where p is a safe prime with associated Sophie Germain prime q
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZpParams {
    /// Primes p and q where p = 2q+1
    pub p: BigInteger,
    pub q: BigInteger,
    /// Generator of the subgroup, ord(g) = q
    pub g: BigInteger,
}

impl ZpParams {
    pub fn new(p: BigInteger, q: BigInteger, g: BigInteger) -> Self {
        ZpParams { p, q, g }
    }

    /// Random parameters with a `bits`-bit safe prime modulus
    pub fn generate(bits: u64) -> Result<Self> {
        if bits < MIN_ZP_BITS {
            return Err(Error::Construction(format!(
                "{} bit modulus is below the minimum of {}",
                bits, MIN_ZP_BITS
            )));
        }
        let (p, q) = generate_safe_prime(bits)?;
        let g = random_subgroup_generator(&p)?;
        Ok(ZpParams { p, q, g })
    }

    /// Parameters from a named, published group
    pub fn named(name: &str) -> Result<Self> {
        match name {
            "rfc2409-modp1024" => {
                let p = BigInteger::from_hex(RFC2409_MODP1024_HEX)?;
                let q = &(&p - &BigInteger::one()) / &BigInteger::from(2);
                // p = 7 mod 8, so 2 is a quadratic residue and generates
                // the order q subgroup
                Ok(ZpParams::new(p, q, BigInteger::from(2)))
            }
            _ => Err(Error::Construction(format!("unknown Zp group {:?}", name))),
        }
    }

    pub fn bits(&self) -> u64 {
        self.p.bit_length()
    }

    /// Checks that p = 2q + 1 with p and q prime, and that g has order q
    pub fn validate(&self) -> Result<()> {
        let one = BigInteger::one();
        if self.p != &(&self.q * &BigInteger::from(2)) + &one {
            return Err(Error::Construction("p is not 2q + 1".to_string()));
        }
        if self.bits() < MIN_ZP_BITS {
            return Err(Error::Construction(format!(
                "{} bit modulus is below the minimum of {}",
                self.bits(),
                MIN_ZP_BITS
            )));
        }
        if !self.q.is_probable_prime(PRIME_CERTAINTY) || !self.p.is_probable_prime(PRIME_CERTAINTY)
        {
            return Err(Error::Construction("p is not a safe prime".to_string()));
        }
        if self.g <= one || self.g >= self.p {
            return Err(Error::Construction(format!(
                "generator {} is out of range",
                self.g
            )));
        }
        if self.g.powm(&self.q, &self.p)? != one {
            return Err(Error::Construction(format!(
                "{} does not generate the order q subgroup",
                self.g
            )));
        }
        Ok(())
    }

    /// Longest message the quadratic-residue encoding fits into one element
    pub fn max_encodable_length(&self) -> usize {
        ((self.q.bit_length() - 2) / 8) as usize
    }

    /// Maps `bytes` to `y` in `[1, q]`; the element is `y` or `p - y`,
    /// whichever is a quadratic residue.
    pub(crate) fn embed(&self, bytes: &[u8]) -> Result<BigInteger> {
        let max = self.max_encodable_length();
        if bytes.len() > max {
            return Err(Error::EncodingLength {
                length: bytes.len(),
                max,
            });
        }
        // the marker byte keeps leading zeros of the message
        let mut marked = Vec::with_capacity(bytes.len() + 1);
        marked.push(ENCODING_MARKER);
        marked.extend_from_slice(bytes);
        Ok(&BigInteger::from_be_bytes(&marked) + &BigInteger::one())
    }

    /// Inverse of [`ZpParams::embed`] applied to the element `x`
    pub(crate) fn extract(&self, x: &BigInteger) -> Result<Vec<u8>> {
        let y = if x <= &self.q { x.clone() } else { &self.p - x };
        let marked = &y - &BigInteger::one();
        let (_, bytes) = marked.encode();
        match bytes.split_first() {
            Some((&ENCODING_MARKER, message)) if bytes.len() <= self.max_encodable_length() + 1 => {
                Ok(message.to_vec())
            }
            _ => Err(Error::InvalidArgument(
                "element does not carry an encoded byte string".to_string(),
            )),
        }
    }
}

const ENCODING_MARKER: u8 = 0x01;

// Squares are exactly the members of the order q subgroup
fn random_subgroup_generator(p: &BigInteger) -> Result<BigInteger> {
    let two = BigInteger::from(2);
    let one = BigInteger::one();
    let upper = p - &two;
    loop {
        let h = BigInteger::random_range(&two, &upper)?;
        let g = h.powm(&two, p)?;
        if g != one {
            return Ok(g);
        }
    }
}

// Test for g being a generator of the subgroup
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_from_safe_prime() {
        let group = ZpParams::generate(64).unwrap();
        let raised = group.g.powm(&group.q, &group.p).unwrap();

        assert_eq!(raised, BigInteger::one());
        assert!(group.validate().is_ok());
        assert_eq!(group.bits(), 64);
    }

    #[test]
    fn test_rejects_small_or_broken_params() {
        assert!(matches!(ZpParams::generate(8), Err(Error::Construction(_))));

        let group = ZpParams::generate(32).unwrap();
        let broken = ZpParams::new(group.p.clone(), group.q.clone(), BigInteger::one());
        assert!(broken.validate().is_err());
        let broken = ZpParams::new(&group.p + &BigInteger::from(2), group.q, group.g);
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_named_group() {
        let group = ZpParams::named("rfc2409-modp1024").unwrap();
        assert_eq!(group.bits(), 1024);
        assert!(group.validate().is_ok());
        assert!(ZpParams::named("modp31337").is_err());
    }

    #[test]
    fn test_embed_extract() {
        let group = ZpParams::generate(64).unwrap();
        // q has 63 bits
        assert_eq!(group.max_encodable_length(), 7);

        for message in [&b""[..], b"\x00\x00a", b"abcdefg"] {
            let y = group.embed(message).unwrap();
            assert!(y >= BigInteger::one() && y <= group.q);
            assert_eq!(group.extract(&y).unwrap(), message);
            assert_eq!(group.extract(&(&group.p - &y)).unwrap(), message);
        }
        assert!(matches!(
            group.embed(b"abcdefgh"),
            Err(Error::EncodingLength { length: 8, max: 7 })
        ));
    }
}
