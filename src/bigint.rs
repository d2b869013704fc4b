use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};
use std::str::FromStr;

use crypto_bigint::Uint;
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::{Integer, Roots};
use num_traits::{Num, One, Signed, Zero};
use rand::rngs::OsRng;

pub use num_bigint::Sign;

use crate::error::{Error, Result};

/// Small primes used to discard candidates before running Miller-Rabin.
pub(crate) const SMALL_PRIMES: [u32; 64] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311,
];

/// Miller-Rabin rounds used wherever the crate itself decides primality.
pub const PRIME_CERTAINTY: u32 = 40;

/// A signed integer of unbounded magnitude over `num_bigint::BigInt`, with
/// fixed-length encodings and conversions to the backend integers. Every
/// operation returns a new value.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigInteger(BigInt);

impl BigInteger {
    pub fn zero() -> Self {
        BigInteger(BigInt::zero())
    }

    pub fn one() -> Self {
        BigInteger(BigInt::one())
    }

    pub fn into_bigint(self) -> BigInt {
        self.0
    }

    pub fn magnitude(&self) -> &BigUint {
        self.0.magnitude()
    }

    /// The value as an unsigned integer, failing for negative values
    pub fn to_biguint(&self) -> Result<BigUint> {
        if self.is_negative() {
            return Err(Error::InvalidArgument(format!(
                "{} has no unsigned representation",
                self
            )));
        }
        Ok(self.0.magnitude().clone())
    }

    pub fn sign(&self) -> Sign {
        self.0.sign()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Number of bits of |self|, 0 for zero
    pub fn bit_length(&self) -> u64 {
        self.0.bits()
    }

    /// Number of bytes of |self|, `ceil(bit_length / 8)`
    pub fn byte_length(&self) -> usize {
        ((self.bit_length() + 7) / 8) as usize
    }

    /// `floor(log2(self))` for positive values
    pub fn log2_floor(&self) -> Result<u64> {
        if !self.0.is_positive() {
            return Err(Error::InvalidArgument(format!(
                "log2 of non-positive value {}",
                self
            )));
        }
        Ok(self.bit_length() - 1)
    }

    /// Whether bit `index` (counted from the least significant bit) of
    /// |self| is set
    pub fn bit_test(&self, index: u64) -> bool {
        self.0.magnitude().bit(index)
    }

    /// Parses a hexadecimal string. Accepts either case, an optional
    /// leading `-` and an optional `0x` prefix.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let (negative, digits) = match hex.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, hex),
        };
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidArgument(format!("not a hex number: {:?}", hex)));
        }
        let magnitude = BigUint::from_str_radix(digits, 16)?;
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(BigInteger(BigInt::from_biguint(sign, magnitude)))
    }

    /// Lowercase hexadecimal, `-` prefixed when negative
    pub fn to_hex(&self) -> String {
        self.0.to_str_radix(16)
    }

    /// Big-endian magnitude of exactly `byte_length()` bytes. The sign is
    /// returned separately and must be handed back to [`BigInteger::decode`].
    pub fn encode(&self) -> (Sign, Vec<u8>) {
        if self.0.is_zero() {
            return (Sign::NoSign, Vec::new());
        }
        self.0.to_bytes_be()
    }

    /// Writes the big-endian magnitude right-aligned into `buf`, zeroing the
    /// bytes in front of it. `buf` must hold at least `byte_length()` bytes.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<Sign> {
        let (sign, magnitude) = self.encode();
        if buf.len() < magnitude.len() {
            return Err(Error::InvalidArgument(format!(
                "buffer of {} bytes cannot hold a {} byte integer",
                buf.len(),
                magnitude.len()
            )));
        }
        let offset = buf.len() - magnitude.len();
        buf[..offset].fill(0);
        buf[offset..].copy_from_slice(&magnitude);
        Ok(sign)
    }

    /// Inverse of [`BigInteger::encode`]
    pub fn decode(sign: Sign, bytes: &[u8]) -> Self {
        BigInteger(BigInt::from_bytes_be(sign, bytes))
    }

    /// Non-negative value as a big-endian buffer of exactly `len` bytes
    pub fn to_fixed_bytes(&self, len: usize) -> Result<Vec<u8>> {
        if self.is_negative() {
            return Err(Error::InvalidArgument(format!(
                "cannot write negative value {} as unsigned bytes",
                self
            )));
        }
        let mut buf = vec![0u8; len];
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Non-negative value read from big-endian bytes
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        BigInteger::decode(Sign::Plus, bytes)
    }

    /// `self^exponent` without modular reduction
    pub fn pow(&self, exponent: u32) -> Self {
        BigInteger(num_traits::pow(self.0.clone(), exponent as usize))
    }

    /// `self^exponent mod modulus`, always in `[0, modulus)`.
    ///
    /// A negative exponent raises the inverse of `self`, which fails with
    /// [`Error::ArithmeticDomain`] when `self` is not a unit.
    pub fn powm(&self, exponent: &BigInteger, modulus: &BigInteger) -> Result<Self> {
        if !modulus.0.is_positive() {
            return Err(Error::InvalidArgument(format!(
                "modulus must be positive, got {}",
                modulus
            )));
        }
        if exponent.is_negative() {
            let inverse = crate::math::mod_inverse(self, modulus)?;
            return inverse.powm(&-exponent, modulus);
        }
        let base = self.0.mod_floor(&modulus.0);
        Ok(BigInteger(base.modpow(&exponent.0, &modulus.0)))
    }

    /// `self mod modulus` in `[0, modulus)`
    pub fn reduce(&self, modulus: &BigInteger) -> Result<Self> {
        if !modulus.0.is_positive() {
            return Err(Error::InvalidArgument(format!(
                "modulus must be positive, got {}",
                modulus
            )));
        }
        Ok(BigInteger(self.0.mod_floor(&modulus.0)))
    }

    /// `floor(sqrt(self))`
    pub fn isqrt(&self) -> Result<Self> {
        self.isqrt_with_remainder().map(|(root, _)| root)
    }

    /// `(r, self - r^2)` where `r = floor(sqrt(self))`
    pub fn isqrt_with_remainder(&self) -> Result<(Self, Self)> {
        if self.is_negative() {
            return Err(Error::InvalidArgument(format!(
                "square root of negative value {}",
                self
            )));
        }
        let root = Roots::sqrt(&self.0);
        let remainder = &self.0 - &root * &root;
        Ok((BigInteger(root), BigInteger(remainder)))
    }

    /// Probabilistic primality test: trial division by small primes, then
    /// `rounds` Miller-Rabin rounds with random bases. A prime is never
    /// rejected; a composite passes with probability at most `4^-rounds`.
    pub fn is_probable_prime(&self, rounds: u32) -> bool {
        if self.0.sign() != Sign::Plus {
            return false;
        }
        let n = self.0.magnitude();
        if n < &BigUint::from(2u32) {
            return false;
        }
        for &p in SMALL_PRIMES.iter() {
            let p = BigUint::from(p);
            if *n == p {
                return true;
            }
            if (n % &p).is_zero() {
                return false;
            }
        }
        miller_rabin(n, rounds.max(1))
    }

    /// Uniform sample from `[low, high]`
    pub fn random_range(low: &BigInteger, high: &BigInteger) -> Result<Self> {
        if low > high {
            return Err(Error::InvalidArgument(format!(
                "empty range [{}, {}]",
                low, high
            )));
        }
        let upper = &high.0 + BigInt::one();
        Ok(BigInteger(OsRng.gen_bigint_range(&low.0, &upper)))
    }

    /// Exact conversion from a `crypto-bigint` integer of any width
    pub fn from_uint<const LIMBS: usize>(value: &Uint<LIMBS>) -> Self {
        let bytes: Vec<u8> = value
            .as_words()
            .iter()
            .rev()
            .flat_map(|word| word.to_be_bytes())
            .collect();
        BigInteger(BigInt::from_biguint(
            Sign::Plus,
            BigUint::from_bytes_be(&bytes),
        ))
    }

    /// Exact conversion into a `crypto-bigint` integer. Fails when the value
    /// is negative or does not fit in `LIMBS` limbs.
    pub fn to_uint<const LIMBS: usize>(&self) -> Result<Uint<LIMBS>> {
        if self.is_negative() {
            return Err(Error::InvalidArgument(format!(
                "{} has no unsigned representation",
                self
            )));
        }
        let width = Uint::<LIMBS>::BYTES;
        let magnitude = self.0.magnitude().to_bytes_be();
        if magnitude.len() > width {
            return Err(Error::InvalidArgument(format!(
                "{} bit value does not fit in {} bits",
                self.bit_length(),
                Uint::<LIMBS>::BITS
            )));
        }
        let mut buf = vec![0u8; width];
        buf[width - magnitude.len()..].copy_from_slice(&magnitude);
        Ok(Uint::<LIMBS>::from_be_slice(&buf))
    }
}

fn miller_rabin(n: &BigUint, rounds: u32) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let n_minus_one = n - &one;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = OsRng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for BigInteger {
    type Err = Error;

    /// Parses a decimal string
    fn from_str(s: &str) -> Result<Self> {
        Ok(BigInteger(BigInt::from_str(s)?))
    }
}

impl From<BigInt> for BigInteger {
    fn from(value: BigInt) -> Self {
        BigInteger(value)
    }
}

impl From<BigUint> for BigInteger {
    fn from(value: BigUint) -> Self {
        BigInteger(BigInt::from_biguint(Sign::Plus, value))
    }
}

macro_rules! from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BigInteger {
                fn from(value: $t) -> Self {
                    BigInteger(BigInt::from(value))
                }
            }
        )*
    };
}

from_primitive!(i32, i64, u8, u32, u64, usize);

macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl<'a, 'b> $trait<&'b BigInteger> for &'a BigInteger {
            type Output = BigInteger;

            fn $method(self, rhs: &'b BigInteger) -> BigInteger {
                BigInteger($trait::$method(&self.0, &rhs.0))
            }
        }

        impl $trait for BigInteger {
            type Output = BigInteger;

            fn $method(self, rhs: BigInteger) -> BigInteger {
                BigInteger($trait::$method(self.0, rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
// truncating, like the primitive integers
forward_binop!(Div, div);
forward_binop!(Rem, rem);

impl Neg for BigInteger {
    type Output = BigInteger;

    fn neg(self) -> BigInteger {
        BigInteger(-self.0)
    }
}

impl<'a> Neg for &'a BigInteger {
    type Output = BigInteger;

    fn neg(self) -> BigInteger {
        BigInteger(-&self.0)
    }
}
