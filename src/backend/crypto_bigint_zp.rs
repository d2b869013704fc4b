use std::time::Instant;

use crypto_bigint::{modular::runtime_mod::DynResidueParams, NonZero, RandomMod};
use crypto_primes::generate_safe_prime;
use num_bigint::BigUint;
use rand::rngs::OsRng;

use crate::bigint::BigInteger;
use crate::dlog::{DlogGroup, GroupElement, GroupId};
use crate::error::{Error, Result};
use crate::exp::{multi_exponentiate, FixedBaseTable, GroupLaw, PrecomputeCache};
use crate::groups::{ZpParams, MIN_ZP_BITS};
use crate::nat::{mul_mod, pow_mod, ModulusParams, Nat, Residue, NAT_LIMBS};

/// Element of a [`CryptoBigintZpGroup`], an integer in `[1, p)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoBigintZpElement {
    group: GroupId,
    value: Nat,
}

impl CryptoBigintZpElement {
    pub fn value(&self) -> BigInteger {
        BigInteger::from_uint(&self.value)
    }
}

impl GroupElement for CryptoBigintZpElement {
    fn group_id(&self) -> GroupId {
        self.group
    }

    fn is_identity(&self) -> bool {
        self.value == Nat::ONE
    }
}

#[derive(Debug)]
struct ResidueLaw {
    params: ModulusParams,
}

impl ResidueLaw {
    fn residue(&self, value: &Nat) -> Residue {
        Residue::new(value, self.params)
    }
}

impl GroupLaw for ResidueLaw {
    type Elem = Residue;

    fn identity(&self) -> Residue {
        Residue::one(self.params)
    }

    fn compose(&self, lhs: &Residue, rhs: &Residue) -> Residue {
        lhs.mul(rhs)
    }
}

/// The order q subgroup of Zp*, p = 2q + 1, with moduli of up to
/// [`Nat::BITS`] bits
#[derive(Debug)]
pub struct CryptoBigintZpGroup {
    id: GroupId,
    params: ZpParams,
    p: NonZero<Nat>,
    q: NonZero<Nat>,
    g: Nat,
    /// p - 1, the exponent of Zp*
    exponent_modulus: BigInteger,
    /// Bit lengths of p - 1 and q, the bounds of every exponent
    exponent_bits: usize,
    q_bits: usize,
    law: ResidueLaw,
    cache: PrecomputeCache<Residue>,
}

impl CryptoBigintZpGroup {
    /// Constructs a new group with a fresh random safe prime of `bits` bits
    pub fn new(bits: u64) -> Result<Self> {
        if bits < MIN_ZP_BITS || bits > Nat::BITS as u64 {
            return Err(Error::Construction(format!(
                "modulus size must be within {}..={} bits, got {}",
                MIN_ZP_BITS,
                Nat::BITS,
                bits
            )));
        }
        let start = Instant::now();
        let (p, q, g) = get_parameters(bits as usize)?;
        log::debug!(
            "generated {} bit safe prime group in {:?}",
            bits,
            start.elapsed()
        );
        let params = ZpParams::new(
            BigInteger::from_uint(&*p),
            BigInteger::from_uint(&*q),
            BigInteger::from_uint(&g),
        );
        Ok(Self::from_parts(params, p, q, g))
    }

    /// Constructs a group from explicit, validated parameters
    pub fn with_params(params: ZpParams) -> Result<Self> {
        params.validate()?;
        let native = |x: &BigInteger| {
            x.to_uint::<NAT_LIMBS>()
                .map_err(|err| Error::Construction(err.to_string()))
        };
        let p = non_zero(native(&params.p)?)?;
        let q = non_zero(native(&params.q)?)?;
        let g = native(&params.g)?;
        Ok(Self::from_parts(params, p, q, g))
    }

    /// Constructs a group from a named parameter set, see [`ZpParams::named`]
    pub fn named(name: &str) -> Result<Self> {
        Self::with_params(ZpParams::named(name)?)
    }

    fn from_parts(params: ZpParams, p: NonZero<Nat>, q: NonZero<Nat>, g: Nat) -> Self {
        let exponent_modulus = &params.p - &BigInteger::one();
        CryptoBigintZpGroup {
            id: GroupId::fresh(),
            exponent_bits: exponent_modulus.bit_length() as usize,
            q_bits: params.q.bit_length() as usize,
            law: ResidueLaw {
                params: DynResidueParams::new(&p),
            },
            params,
            p,
            q,
            g,
            exponent_modulus,
            cache: PrecomputeCache::new(),
        }
    }

    pub fn params(&self) -> &ZpParams {
        &self.params
    }

    fn element(&self, value: Nat) -> CryptoBigintZpElement {
        CryptoBigintZpElement {
            group: self.id,
            value,
        }
    }

    // Exponents are taken modulo p - 1, which is correct for any unit of Zp
    fn reduce_exponent(&self, exponent: &BigInteger) -> Result<BigUint> {
        exponent.reduce(&self.exponent_modulus)?.to_biguint()
    }

    fn native_exponent(&self, exponent: &BigInteger) -> Result<Nat> {
        exponent.reduce(&self.exponent_modulus)?.to_uint()
    }

    fn pow(&self, base: &Nat, exponent: &Nat) -> Nat {
        pow_mod(base, exponent, self.exponent_bits, &self.law.params)
    }

    fn is_quadratic_residue(&self, value: &Nat) -> bool {
        pow_mod(value, &self.q, self.q_bits, &self.law.params) == Nat::ONE
    }
}

fn non_zero(x: Nat) -> Result<NonZero<Nat>> {
    Option::<NonZero<Nat>>::from(NonZero::new(x))
        .ok_or_else(|| Error::Construction("zero modulus".to_string()))
}

// Generate a safe prime p = 2q + 1 and a generator of the order q subgroup
fn get_parameters(bits: usize) -> Result<(NonZero<Nat>, NonZero<Nat>, Nat)> {
    let p = non_zero(generate_safe_prime::<NAT_LIMBS>(Some(bits)))?;
    // p is odd, so (p - 1) / 2 = p >> 1
    let q = non_zero(p.shr_vartime(1))?;
    let g = generate_group_generator(&p, &q);
    Ok((p, q, g))
}

// Generate a generator of the order q subgroup using rejection sampling
fn generate_group_generator(p: &NonZero<Nat>, q: &NonZero<Nat>) -> Nat {
    let modulus = DynResidueParams::new(p);
    let mut x = Nat::random_mod(&mut OsRng, p);
    // While x^q mod p != 1 (or x is trivial) try with a new random x
    while x == Nat::ONE || pow_mod(&x, q, q.bits(), &modulus) != Nat::ONE {
        x = Nat::random_mod(&mut OsRng, p);
    }

    x
}

impl DlogGroup for CryptoBigintZpGroup {
    type Element = CryptoBigintZpElement;

    fn id(&self) -> GroupId {
        self.id
    }

    fn group_type(&self) -> &'static str {
        "Zp*"
    }

    fn generator(&self) -> CryptoBigintZpElement {
        self.element(self.g)
    }

    fn order(&self) -> &BigInteger {
        &self.params.q
    }

    fn identity(&self) -> CryptoBigintZpElement {
        self.element(Nat::ONE)
    }

    fn create_random_element(&self) -> CryptoBigintZpElement {
        let x = Nat::random_mod(&mut OsRng, &self.q);
        self.element(pow_mod(&self.g, &x, self.q_bits, &self.law.params))
    }

    fn inverse(&self, element: &CryptoBigintZpElement) -> Result<CryptoBigintZpElement> {
        self.check_element(element)?;
        let p_minus_two = self.p.wrapping_sub(&Nat::from_u8(2));
        Ok(self.element(self.pow(&element.value, &p_minus_two)))
    }

    fn multiply(
        &self,
        lhs: &CryptoBigintZpElement,
        rhs: &CryptoBigintZpElement,
    ) -> Result<CryptoBigintZpElement> {
        self.check_element(lhs)?;
        self.check_element(rhs)?;
        Ok(self.element(mul_mod(&lhs.value, &rhs.value, &self.law.params)))
    }

    fn exponentiate(
        &self,
        base: &CryptoBigintZpElement,
        exponent: &BigInteger,
    ) -> Result<CryptoBigintZpElement> {
        self.check_element(base)?;
        let exponent = self.native_exponent(exponent)?;
        Ok(self.element(self.pow(&base.value, &exponent)))
    }

    fn simultaneous_multiple_exponentiations(
        &self,
        bases: &[CryptoBigintZpElement],
        exponents: &[BigInteger],
    ) -> Result<CryptoBigintZpElement> {
        if bases.is_empty() || bases.len() != exponents.len() {
            return Err(Error::InvalidArgument(format!(
                "need equally many bases and exponents, got {} and {}",
                bases.len(),
                exponents.len()
            )));
        }
        for base in bases {
            self.check_element(base)?;
        }
        let exponents = exponents
            .iter()
            .map(|e| self.reduce_exponent(e))
            .collect::<Result<Vec<_>>>()?;
        let residues: Vec<Residue> = bases.iter().map(|b| self.law.residue(&b.value)).collect();
        let result = multi_exponentiate(&self.law, &residues, &exponents);
        Ok(self.element(result.retrieve()))
    }

    fn exponentiate_with_precomputed_values(
        &mut self,
        base: &CryptoBigintZpElement,
        exponent: &BigInteger,
    ) -> Result<CryptoBigintZpElement> {
        self.check_element(base)?;
        let exponent = self.reduce_exponent(exponent)?;
        let key = self.element_to_bytes(base)?;
        let bits = self.exponent_bits as u64;
        let id = self.id;

        let law = &self.law;
        let start = law.residue(&base.value);
        let table = self
            .cache
            .acquire(key, || FixedBaseTable::new(law, &start, bits));
        let result = table.exponentiate(law, &exponent);
        Ok(CryptoBigintZpElement {
            group: id,
            value: result.retrieve(),
        })
    }

    fn end_exponentiate_with_precomputed_values(
        &mut self,
        base: &CryptoBigintZpElement,
    ) -> Result<()> {
        self.check_element(base)?;
        let key = self.element_to_bytes(base)?;
        if self.cache.release(&key) {
            log::trace!("released fixed-base table of group {}", self.id);
        }
        Ok(())
    }

    fn precomputed_bases(&self) -> usize {
        self.cache.len()
    }

    fn is_member(&self, element: &CryptoBigintZpElement) -> bool {
        element.group == self.id
            && element.value != Nat::ZERO
            && element.value < *self.p
            && self.is_quadratic_residue(&element.value)
    }

    fn validate_group(&self) -> Result<()> {
        self.params.validate()?;
        if !self.is_quadratic_residue(&self.g) {
            return Err(Error::Construction(
                "generator is outside the order q subgroup".to_string(),
            ));
        }
        Ok(())
    }

    fn max_encodable_length(&self) -> usize {
        self.params.max_encodable_length()
    }

    fn encode_bytes(&self, bytes: &[u8]) -> Result<CryptoBigintZpElement> {
        let y: Nat = self.params.embed(bytes)?.to_uint()?;
        if self.is_quadratic_residue(&y) {
            Ok(self.element(y))
        } else {
            Ok(self.element(self.p.wrapping_sub(&y)))
        }
    }

    fn decode_element(&self, element: &CryptoBigintZpElement) -> Result<Vec<u8>> {
        self.check_element(element)?;
        self.params.extract(&element.value())
    }

    fn element_to_bytes(&self, element: &CryptoBigintZpElement) -> Result<Vec<u8>> {
        self.check_element(element)?;
        element.value().to_fixed_bytes(self.params.p.byte_length())
    }

    fn reconstruct_element(
        &self,
        bytes: &[u8],
        check_membership: bool,
    ) -> Result<CryptoBigintZpElement> {
        let value = BigInteger::from_be_bytes(bytes);
        if value.is_zero() || value >= self.params.p {
            return Err(Error::InvalidArgument(format!(
                "{} is not a unit modulo p",
                value
            )));
        }
        let element = self.element(value.to_uint()?);
        if check_membership && !self.is_member(&element) {
            return Err(Error::InvalidArgument(format!(
                "{} is not in the order q subgroup",
                value
            )));
        }
        Ok(element)
    }
}
