use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{rngs::OsRng, Rng};

use crate::bigint::{BigInteger, PRIME_CERTAINTY, SMALL_PRIMES};
use crate::error::{Error, Result};

/// The two square roots of a quadratic residue modulo a prime,
/// `root2 = p - root1`. Which one the caller wants is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquareRootPair {
    pub root1: BigInteger,
    pub root2: BigInteger,
}

impl SquareRootPair {
    pub fn contains(&self, x: &BigInteger) -> bool {
        &self.root1 == x || &self.root2 == x
    }
}

/// The unique `b` in `[0, n)` with `a * b = 1 mod n`, by the extended
/// Euclidean algorithm.
pub fn mod_inverse(a: &BigInteger, n: &BigInteger) -> Result<BigInteger> {
    if n <= &BigInteger::one() {
        return Err(Error::InvalidArgument(format!(
            "modulus must be greater than one, got {}",
            n
        )));
    }

    let (mut t, mut new_t) = (BigInteger::zero(), BigInteger::one());
    let (mut r, mut new_r) = (n.clone(), a.reduce(n)?);

    while !new_r.is_zero() {
        let quotient = &r / &new_r;

        let next_t = &t - &(&quotient * &new_t);
        t = std::mem::replace(&mut new_t, next_t);

        let next_r = &r - &(&quotient * &new_r);
        r = std::mem::replace(&mut new_r, next_r);
    }

    if r != BigInteger::one() {
        return Err(Error::ArithmeticDomain(format!(
            "{} is not invertible modulo {} (gcd {})",
            a, n, r
        )));
    }
    t.reduce(n)
}

/// Chinese Remainder Theorem: the unique `x` modulo the product of `moduli`
/// with `x = congruences[i] mod moduli[i]` for every `i`.
pub fn crt(congruences: &[BigInteger], moduli: &[BigInteger]) -> Result<BigInteger> {
    if congruences.is_empty() || congruences.len() != moduli.len() {
        return Err(Error::InvalidArgument(format!(
            "need equally many congruences and moduli, got {} and {}",
            congruences.len(),
            moduli.len()
        )));
    }
    if let Some(m) = moduli.iter().find(|m| **m < BigInteger::one()) {
        return Err(Error::InvalidArgument(format!(
            "moduli must be positive, got {}",
            m
        )));
    }

    let product = moduli
        .iter()
        .fold(BigInteger::one(), |acc, m| &acc * m);

    let mut x = BigInteger::zero();
    for (a, m) in congruences.iter().zip(moduli) {
        if m == &BigInteger::one() {
            continue;
        }
        let partial = &product / m;
        let inverse = mod_inverse(&partial, m).map_err(|_| {
            Error::ArithmeticDomain(format!("moduli are not pairwise coprime ({})", m))
        })?;
        x = &x + &(&(&a.reduce(m)? * &partial) * &inverse);
    }
    x.reduce(&product)
}

/// Square roots of `a` modulo a prime `p = 3 mod 4`: `r = a^((p+1)/4) mod p`
/// and `p - r`.
///
/// Whether `a` actually is a quadratic residue is not checked; for a
/// non-residue the returned values square to `-a`.
pub fn sqrt_mod_prime_3_mod_4(a: &BigInteger, p: &BigInteger) -> Result<SquareRootPair> {
    let four = BigInteger::from(4);
    if p.is_negative() || p.reduce(&four)? != BigInteger::from(3) {
        return Err(Error::InvalidArgument(format!(
            "modulus {} is not congruent to 3 mod 4",
            p
        )));
    }

    let exponent = &(p + &BigInteger::one()) / &four;
    let root1 = a.powm(&exponent, p)?;
    let root2 = (p - &root1).reduce(p)?;
    Ok(SquareRootPair { root1, root2 })
}

/// `n!` as a machine word. Fails once the result overflows `u64` (n > 20).
pub fn factorial(n: u64) -> Result<u64> {
    (2..=n).try_fold(1_u64, |acc, k| {
        acc.checked_mul(k).ok_or_else(|| {
            Error::InvalidArgument(format!("{}! does not fit in 64 bits", n))
        })
    })
}

/// `n!` with arbitrary precision
pub fn factorial_exact(n: u64) -> BigInteger {
    let product = (2..=n).fold(BigUint::one(), |acc, k| acc * k);
    BigInteger::from(product)
}

/// A random safe prime `p = 2q + 1` of exactly `bits` bits, returned as
/// `(p, q)`.
pub fn generate_safe_prime(bits: u64) -> Result<(BigInteger, BigInteger)> {
    if bits < 3 {
        return Err(Error::InvalidArgument(format!(
            "no safe prime has {} bits",
            bits
        )));
    }
    // 5 = 2 * 2 + 1 and 7 = 2 * 3 + 1 are the only ones that small
    if bits == 3 {
        let p = if OsRng.gen_bool(0.5) { 5_u32 } else { 7 };
        return Ok((BigInteger::from(p), BigInteger::from(p / 2)));
    }

    let q_bits = bits - 1;
    let top = BigUint::one() << (q_bits - 1);
    loop {
        let q = OsRng.gen_biguint(q_bits) | &top | BigUint::one();
        let p: BigUint = (&q << 1_u32) + 1_u32;
        if sieved_out(&q) || sieved_out(&p) {
            continue;
        }
        let (p, q) = (BigInteger::from(p), BigInteger::from(q));
        if q.is_probable_prime(PRIME_CERTAINTY) && p.is_probable_prime(PRIME_CERTAINTY) {
            return Ok((p, q));
        }
    }
}

// true when `n` has a small prime factor other than itself
fn sieved_out(n: &BigUint) -> bool {
    SMALL_PRIMES.iter().any(|&p| {
        let p = BigUint::from(p);
        n != &p && (n % &p).is_zero()
    })
}
