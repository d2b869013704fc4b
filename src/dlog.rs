use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::bigint::{BigInteger, PRIME_CERTAINTY};
use crate::error::{Error, Result};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies the group instance an element was produced by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl GroupId {
    pub(crate) fn fresh() -> Self {
        GroupId(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A member of a [`DlogGroup`].
///
/// `==` compares the mathematical value, never the internal representation
/// (Montgomery form, projective coordinates). Elements of two different
/// group instances are never equal.
pub trait GroupElement: Clone + fmt::Debug + PartialEq + Eq + Send + Sync {
    /// The group instance that produced this element
    fn group_id(&self) -> GroupId;

    fn is_identity(&self) -> bool;
}

/// A cyclic group of prime order in which discrete logarithms are hard.
///
/// Every per-element operation first checks that its inputs were produced
/// by this very instance and fails with [`Error::GroupMismatch`] otherwise.
pub trait DlogGroup {
    type Element: GroupElement;

    fn id(&self) -> GroupId;

    /// Short name of the group family, e.g. `"Zp*"` or `"secp256k1"`
    fn group_type(&self) -> &'static str;

    fn generator(&self) -> Self::Element;

    /// The prime order `q` of the group
    fn order(&self) -> &BigInteger;

    fn identity(&self) -> Self::Element;

    /// A uniformly random member of the group
    fn create_random_element(&self) -> Self::Element;

    fn inverse(&self, element: &Self::Element) -> Result<Self::Element>;

    fn multiply(&self, lhs: &Self::Element, rhs: &Self::Element) -> Result<Self::Element>;

    /// `base^exponent`; negative exponents raise the inverse of `base`
    fn exponentiate(&self, base: &Self::Element, exponent: &BigInteger) -> Result<Self::Element>;

    /// `∏ bases[i]^exponents[i]`, computed with shared squarings
    fn simultaneous_multiple_exponentiations(
        &self,
        bases: &[Self::Element],
        exponents: &[BigInteger],
    ) -> Result<Self::Element>;

    /// `base^exponent`, building a fixed-base table for `base` on first use.
    ///
    /// The table stays alive until [`DlogGroup::end_exponentiate_with_precomputed_values`]
    /// is called for the same base; nothing releases it implicitly.
    fn exponentiate_with_precomputed_values(
        &mut self,
        base: &Self::Element,
        exponent: &BigInteger,
    ) -> Result<Self::Element>;

    /// Drops the table of `base`. Does nothing if there is none.
    fn end_exponentiate_with_precomputed_values(&mut self, base: &Self::Element) -> Result<()>;

    /// Number of bases that currently hold a precomputed table
    fn precomputed_bases(&self) -> usize;

    /// Whether `element` lies in the prime-order subgroup of this group.
    /// Expensive; meant for elements received from untrusted parties.
    fn is_member(&self, element: &Self::Element) -> bool;

    /// Re-checks the group parameters
    fn validate_group(&self) -> Result<()>;

    /// Longest byte string [`DlogGroup::encode_bytes`] accepts
    fn max_encodable_length(&self) -> usize;

    /// Injective, deterministic map from at most `max_encodable_length()`
    /// bytes into the group
    fn encode_bytes(&self, bytes: &[u8]) -> Result<Self::Element>;

    /// Inverse of [`DlogGroup::encode_bytes`]. Only elements produced by
    /// `encode_bytes` decode meaningfully.
    fn decode_element(&self, element: &Self::Element) -> Result<Vec<u8>>;

    /// Canonical byte image of any element
    fn element_to_bytes(&self, element: &Self::Element) -> Result<Vec<u8>>;

    /// Inverse of [`DlogGroup::element_to_bytes`]
    fn reconstruct_element(&self, bytes: &[u8], check_membership: bool) -> Result<Self::Element>;

    fn check_element(&self, element: &Self::Element) -> Result<()> {
        if element.group_id() != self.id() {
            return Err(Error::GroupMismatch {
                expected: self.id(),
                found: element.group_id(),
            });
        }
        Ok(())
    }

    fn is_prime_order(&self) -> bool {
        self.order().is_probable_prime(PRIME_CERTAINTY)
    }

    fn is_order_greater_than(&self, bits: u64) -> bool {
        self.order().bit_length() > bits
    }

    /// In a group of prime order every element but the identity generates it
    fn is_generator(&self) -> bool {
        let generator = self.generator();
        self.is_member(&generator) && !generator.is_identity()
    }

    fn create_random_generator(&self) -> Self::Element {
        loop {
            let candidate = self.create_random_element();
            if !candidate.is_identity() {
                return candidate;
            }
        }
    }
}
