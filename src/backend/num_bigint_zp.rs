use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand::rngs::OsRng;

use crate::bigint::BigInteger;
use crate::dlog::{DlogGroup, GroupElement, GroupId};
use crate::error::{Error, Result};
use crate::exp::{multi_exponentiate, FixedBaseTable, GroupLaw, PrecomputeCache};
use crate::groups::ZpParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumBigintZpElement {
    group: GroupId,
    value: BigUint,
}

impl NumBigintZpElement {
    pub fn value(&self) -> BigInteger {
        BigInteger::from(self.value.clone())
    }
}

impl GroupElement for NumBigintZpElement {
    fn group_id(&self) -> GroupId {
        self.group
    }

    fn is_identity(&self) -> bool {
        self.value.is_one()
    }
}

#[derive(Debug)]
struct BigUintLaw {
    p: BigUint,
}

impl GroupLaw for BigUintLaw {
    type Elem = BigUint;

    fn identity(&self) -> BigUint {
        BigUint::one()
    }

    fn compose(&self, lhs: &BigUint, rhs: &BigUint) -> BigUint {
        (lhs * rhs) % &self.p
    }
}

/// Safe-prime Zp group on heap-allocated `num-bigint` integers, without an
/// upper bound on the modulus size
#[derive(Debug)]
pub struct NumBigintZpGroup {
    id: GroupId,
    params: ZpParams,
    q: BigUint,
    g: BigUint,
    exponent_modulus: BigInteger,
    law: BigUintLaw,
    cache: PrecomputeCache<BigUint>,
}

impl NumBigintZpGroup {
    /// Group with a fresh random `bits`-bit safe prime modulus
    pub fn new(bits: u64) -> Result<Self> {
        let params = ZpParams::generate(bits)?;
        log::debug!("generated {} bit safe prime group", bits);
        Self::from_params(params)
    }

    pub fn with_params(params: ZpParams) -> Result<Self> {
        params.validate()?;
        Self::from_params(params)
    }

    pub fn named(name: &str) -> Result<Self> {
        Self::with_params(ZpParams::named(name)?)
    }

    fn from_params(params: ZpParams) -> Result<Self> {
        let p = params.p.to_biguint()?;
        Ok(NumBigintZpGroup {
            id: GroupId::fresh(),
            q: params.q.to_biguint()?,
            g: params.g.to_biguint()?,
            exponent_modulus: &params.p - &BigInteger::one(),
            law: BigUintLaw { p },
            params,
            cache: PrecomputeCache::new(),
        })
    }

    pub fn params(&self) -> &ZpParams {
        &self.params
    }

    fn p(&self) -> &BigUint {
        &self.law.p
    }

    fn element(&self, value: BigUint) -> NumBigintZpElement {
        NumBigintZpElement {
            group: self.id,
            value,
        }
    }

    fn reduce_exponent(&self, exponent: &BigInteger) -> Result<BigUint> {
        exponent.reduce(&self.exponent_modulus)?.to_biguint()
    }

    fn is_quadratic_residue(&self, value: &BigUint) -> bool {
        value.modpow(&self.q, self.p()).is_one()
    }
}

impl DlogGroup for NumBigintZpGroup {
    type Element = NumBigintZpElement;

    fn id(&self) -> GroupId {
        self.id
    }

    fn group_type(&self) -> &'static str {
        "Zp*"
    }

    fn generator(&self) -> NumBigintZpElement {
        self.element(self.g.clone())
    }

    fn order(&self) -> &BigInteger {
        &self.params.q
    }

    fn identity(&self) -> NumBigintZpElement {
        self.element(BigUint::one())
    }

    fn create_random_element(&self) -> NumBigintZpElement {
        let x = OsRng.gen_biguint_below(&self.q);
        self.element(self.g.modpow(&x, self.p()))
    }

    fn inverse(&self, element: &NumBigintZpElement) -> Result<NumBigintZpElement> {
        self.check_element(element)?;
        // Fermat: x^(p-2) = x^-1 mod p
        let p_minus_two = self.p() - 2_u32;
        Ok(self.element(element.value.modpow(&p_minus_two, self.p())))
    }

    fn multiply(
        &self,
        lhs: &NumBigintZpElement,
        rhs: &NumBigintZpElement,
    ) -> Result<NumBigintZpElement> {
        self.check_element(lhs)?;
        self.check_element(rhs)?;
        Ok(self.element(self.law.compose(&lhs.value, &rhs.value)))
    }

    fn exponentiate(
        &self,
        base: &NumBigintZpElement,
        exponent: &BigInteger,
    ) -> Result<NumBigintZpElement> {
        self.check_element(base)?;
        let exponent = self.reduce_exponent(exponent)?;
        Ok(self.element(base.value.modpow(&exponent, self.p())))
    }

    fn simultaneous_multiple_exponentiations(
        &self,
        bases: &[NumBigintZpElement],
        exponents: &[BigInteger],
    ) -> Result<NumBigintZpElement> {
        if bases.is_empty() || bases.len() != exponents.len() {
            return Err(Error::InvalidArgument(format!(
                "need equally many bases and exponents, got {} and {}",
                bases.len(),
                exponents.len()
            )));
        }
        let mut values = Vec::with_capacity(bases.len());
        for base in bases {
            self.check_element(base)?;
            values.push(base.value.clone());
        }
        let exponents = exponents
            .iter()
            .map(|e| self.reduce_exponent(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.element(multi_exponentiate(&self.law, &values, &exponents)))
    }

    fn exponentiate_with_precomputed_values(
        &mut self,
        base: &NumBigintZpElement,
        exponent: &BigInteger,
    ) -> Result<NumBigintZpElement> {
        self.check_element(base)?;
        let exponent = self.reduce_exponent(exponent)?;
        let key = self.element_to_bytes(base)?;
        let bits = self.exponent_modulus.bit_length();

        let law = &self.law;
        let value = self
            .cache
            .acquire(key, || FixedBaseTable::new(law, &base.value, bits))
            .exponentiate(law, &exponent);
        Ok(NumBigintZpElement {
            group: self.id,
            value,
        })
    }

    fn end_exponentiate_with_precomputed_values(
        &mut self,
        base: &NumBigintZpElement,
    ) -> Result<()> {
        self.check_element(base)?;
        let key = self.element_to_bytes(base)?;
        self.cache.release(&key);
        Ok(())
    }

    fn precomputed_bases(&self) -> usize {
        self.cache.len()
    }

    fn is_member(&self, element: &NumBigintZpElement) -> bool {
        element.group == self.id
            && element.value.bits() > 0
            && &element.value < self.p()
            && self.is_quadratic_residue(&element.value)
    }

    fn validate_group(&self) -> Result<()> {
        self.params.validate()
    }

    fn max_encodable_length(&self) -> usize {
        self.params.max_encodable_length()
    }

    fn encode_bytes(&self, bytes: &[u8]) -> Result<NumBigintZpElement> {
        let y = self.params.embed(bytes)?.to_biguint()?;
        if self.is_quadratic_residue(&y) {
            Ok(self.element(y))
        } else {
            Ok(self.element(self.p() - y))
        }
    }

    fn decode_element(&self, element: &NumBigintZpElement) -> Result<Vec<u8>> {
        self.check_element(element)?;
        self.params.extract(&element.value())
    }

    fn element_to_bytes(&self, element: &NumBigintZpElement) -> Result<Vec<u8>> {
        self.check_element(element)?;
        element.value().to_fixed_bytes(self.params.p.byte_length())
    }

    fn reconstruct_element(
        &self,
        bytes: &[u8],
        check_membership: bool,
    ) -> Result<NumBigintZpElement> {
        let value = BigUint::from_bytes_be(bytes);
        if value.bits() == 0 || &value >= self.p() {
            return Err(Error::InvalidArgument(format!(
                "{} is not a unit modulo p",
                value
            )));
        }
        let element = self.element(value);
        if check_membership && !self.is_member(&element) {
            return Err(Error::InvalidArgument(
                "element is not in the order q subgroup".to_string(),
            ));
        }
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_group() {
        let mut group = NumBigintZpGroup::named("rfc2409-modp1024").unwrap();
        assert_eq!(group.group_type(), "Zp*");
        assert_eq!(group.generator().value(), BigInteger::from(2));
        assert!(group.is_order_greater_than(1000));
        assert!(group.is_generator());
        assert_eq!(group.max_encodable_length(), 127);

        let g = group.generator();
        let e = BigInteger::from(1_000_000_007_u64);
        let expected = group.exponentiate(&g, &e).unwrap();
        assert_eq!(
            group.exponentiate_with_precomputed_values(&g, &e).unwrap(),
            expected
        );
        group.end_exponentiate_with_precomputed_values(&g).unwrap();
    }

    #[test]
    fn test_element_bytes_are_fixed_width() {
        let group = NumBigintZpGroup::new(64).unwrap();
        let one = group.element_to_bytes(&group.identity()).unwrap();
        assert_eq!(one, vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert!(group.reconstruct_element(&[0; 8], false).is_err());
        let p = group.params().p.to_fixed_bytes(8).unwrap();
        assert!(group.reconstruct_element(&p, false).is_err());
    }

    #[test]
    fn test_inverse_of_generator() {
        let group = NumBigintZpGroup::new(64).unwrap();
        let g = group.generator();
        let q_minus_one = &group.params().q - &BigInteger::one();
        assert_eq!(
            group.inverse(&g).unwrap(),
            group.exponentiate(&g, &q_minus_one).unwrap()
        );
    }
}
