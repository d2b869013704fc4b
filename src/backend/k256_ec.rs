use elliptic_curve::ff::PrimeField;
use elliptic_curve::group::Group;
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use rand::rngs::OsRng;

use crate::bigint::BigInteger;
use crate::curve::{self, AffinePoint, EncodedPoint, FieldBytes, Point, Scalar, FIELD_BYTES};
use crate::dlog::{DlogGroup, GroupElement, GroupId};
use crate::error::{Error, Result};
use crate::exp::{multi_exponentiate, FixedBaseTable, GroupLaw, PrecomputeCache};

const CURVE_NAME: &str = "secp256k1";

// x = [0 ..][message][length][counter]
const LENGTH_INDEX: usize = FIELD_BYTES - 2;
const COUNTER_INDEX: usize = FIELD_BYTES - 1;
/// The first byte of x stays zero so x is below the field prime
const MAX_MESSAGE_BYTES: usize = FIELD_BYTES - 3;

/// SEC1 tag of a compressed point with even y
const TAG_COMPRESSED_EVEN_Y: u8 = 0x02;

#[derive(Debug, Clone, Copy)]
pub struct K256EcElement {
    group: GroupId,
    point: Point,
}

impl K256EcElement {
    pub fn point(&self) -> &Point {
        &self.point
    }
}

impl PartialEq for K256EcElement {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group && self.point == other.point
    }
}

impl Eq for K256EcElement {}

impl GroupElement for K256EcElement {
    fn group_id(&self) -> GroupId {
        self.group
    }

    fn is_identity(&self) -> bool {
        self.point == Point::IDENTITY
    }
}

#[derive(Debug)]
struct PointLaw;

impl GroupLaw for PointLaw {
    type Elem = Point;

    fn identity(&self) -> Point {
        Point::IDENTITY
    }

    fn compose(&self, lhs: &Point, rhs: &Point) -> Point {
        lhs + rhs
    }

    fn square(&self, elem: &Point) -> Point {
        elem.double()
    }
}

/// The secp256k1 curve as a discrete-log group. `k256` writes it
/// additively: `multiply` adds points and `exponentiate` is scalar
/// multiplication.
#[derive(Debug)]
pub struct K256EcGroup {
    id: GroupId,
    order: BigInteger,
    cache: PrecomputeCache<Point>,
}

impl K256EcGroup {
    pub fn new() -> Self {
        K256EcGroup {
            id: GroupId::fresh(),
            order: curve::order(),
            cache: PrecomputeCache::new(),
        }
    }

    /// Only `"secp256k1"` is known
    pub fn named(name: &str) -> Result<Self> {
        if name != CURVE_NAME {
            return Err(Error::Construction(format!("unknown curve {:?}", name)));
        }
        Ok(Self::new())
    }

    fn element(&self, point: Point) -> K256EcElement {
        K256EcElement {
            group: self.id,
            point,
        }
    }

    fn scalar(&self, exponent: &BigInteger) -> Result<Scalar> {
        let reduced = exponent.reduce(&self.order)?;
        let mut repr = FieldBytes::default();
        repr.copy_from_slice(&reduced.to_fixed_bytes(FIELD_BYTES)?);
        Option::<Scalar>::from(Scalar::from_repr(repr))
            .ok_or_else(|| Error::ArithmeticDomain(format!("{} is not a scalar", reduced)))
    }

    fn point_from_x(x: &[u8; FIELD_BYTES]) -> Option<Point> {
        let mut sec1 = [0u8; FIELD_BYTES + 1];
        sec1[0] = TAG_COMPRESSED_EVEN_Y;
        sec1[1..].copy_from_slice(x);
        let encoded = EncodedPoint::from_bytes(sec1).ok()?;
        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded)).map(Point::from)
    }
}

impl Default for K256EcGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl DlogGroup for K256EcGroup {
    type Element = K256EcElement;

    fn id(&self) -> GroupId {
        self.id
    }

    fn group_type(&self) -> &'static str {
        CURVE_NAME
    }

    fn generator(&self) -> K256EcElement {
        self.element(Point::GENERATOR)
    }

    fn order(&self) -> &BigInteger {
        &self.order
    }

    fn identity(&self) -> K256EcElement {
        self.element(Point::IDENTITY)
    }

    fn create_random_element(&self) -> K256EcElement {
        self.element(Point::random(&mut OsRng))
    }

    fn inverse(&self, element: &K256EcElement) -> Result<K256EcElement> {
        self.check_element(element)?;
        Ok(self.element(-element.point))
    }

    fn multiply(&self, lhs: &K256EcElement, rhs: &K256EcElement) -> Result<K256EcElement> {
        self.check_element(lhs)?;
        self.check_element(rhs)?;
        Ok(self.element(lhs.point + rhs.point))
    }

    fn exponentiate(&self, base: &K256EcElement, exponent: &BigInteger) -> Result<K256EcElement> {
        self.check_element(base)?;
        let scalar = self.scalar(exponent)?;
        Ok(self.element(base.point * scalar))
    }

    fn simultaneous_multiple_exponentiations(
        &self,
        bases: &[K256EcElement],
        exponents: &[BigInteger],
    ) -> Result<K256EcElement> {
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
        let points: Vec<Point> = bases.iter().map(|b| b.point).collect();
        let exponents = exponents
            .iter()
            .map(|e| e.reduce(&self.order)?.to_biguint())
            .collect::<Result<Vec<_>>>()?;
        Ok(self.element(multi_exponentiate(&PointLaw, &points, &exponents)))
    }

    fn exponentiate_with_precomputed_values(
        &mut self,
        base: &K256EcElement,
        exponent: &BigInteger,
    ) -> Result<K256EcElement> {
        self.check_element(base)?;
        let exponent = exponent.reduce(&self.order)?.to_biguint()?;
        let key = self.element_to_bytes(base)?;
        let bits = self.order.bit_length();
        let point = self
            .cache
            .acquire(key, || FixedBaseTable::new(&PointLaw, &base.point, bits))
            .exponentiate(&PointLaw, &exponent);
        Ok(self.element(point))
    }

    fn end_exponentiate_with_precomputed_values(&mut self, base: &K256EcElement) -> Result<()> {
        self.check_element(base)?;
        let key = self.element_to_bytes(base)?;
        self.cache.release(&key);
        Ok(())
    }

    fn precomputed_bases(&self) -> usize {
        self.cache.len()
    }

    // The curve has cofactor 1, so every point on it is in the group
    fn is_member(&self, element: &K256EcElement) -> bool {
        if element.group != self.id {
            return false;
        }
        let encoded = element.point.to_affine().to_encoded_point(false);
        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded)).is_some()
    }

    fn validate_group(&self) -> Result<()> {
        if !self.is_prime_order() {
            return Err(Error::Construction("curve order is not prime".to_string()));
        }
        if !self.is_generator() {
            return Err(Error::Construction(
                "base point does not generate the curve group".to_string(),
            ));
        }
        Ok(())
    }

    fn max_encodable_length(&self) -> usize {
        MAX_MESSAGE_BYTES
    }

    fn encode_bytes(&self, bytes: &[u8]) -> Result<K256EcElement> {
        if bytes.len() > MAX_MESSAGE_BYTES {
            return Err(Error::EncodingLength {
                length: bytes.len(),
                max: MAX_MESSAGE_BYTES,
            });
        }
        let mut x = [0u8; FIELD_BYTES];
        x[LENGTH_INDEX - bytes.len()..LENGTH_INDEX].copy_from_slice(bytes);
        x[LENGTH_INDEX] = bytes.len() as u8;
        // about half of all x are on the curve
        for counter in 0..=u8::MAX {
            x[COUNTER_INDEX] = counter;
            if let Some(point) = Self::point_from_x(&x) {
                log::trace!("encoded {} bytes after {} tries", bytes.len(), counter as u32 + 1);
                return Ok(self.element(point));
            }
        }
        Err(Error::InvalidArgument(
            "no curve point found for message".to_string(),
        ))
    }

    fn decode_element(&self, element: &K256EcElement) -> Result<Vec<u8>> {
        self.check_element(element)?;
        let encoded = element.point.to_affine().to_encoded_point(true);
        let x = encoded.x().ok_or_else(|| {
            Error::InvalidArgument("the identity carries no encoded bytes".to_string())
        })?;
        let length = x[LENGTH_INDEX] as usize;
        if length > MAX_MESSAGE_BYTES || x[..LENGTH_INDEX - length].iter().any(|b| *b != 0) {
            return Err(Error::InvalidArgument(
                "element does not carry an encoded byte string".to_string(),
            ));
        }
        Ok(x[LENGTH_INDEX - length..LENGTH_INDEX].to_vec())
    }

    /// Compressed SEC1 encoding, a single zero byte for the identity
    fn element_to_bytes(&self, element: &K256EcElement) -> Result<Vec<u8>> {
        self.check_element(element)?;
        Ok(element.point.to_affine().to_encoded_point(true).as_bytes().to_vec())
    }

    /// Accepts compressed and uncompressed SEC1. Decoding already puts the
    /// point on the curve, so `check_membership` adds nothing here.
    fn reconstruct_element(&self, bytes: &[u8], _check_membership: bool) -> Result<K256EcElement> {
        let encoded = EncodedPoint::from_bytes(bytes)
            .map_err(|err| Error::InvalidArgument(format!("malformed SEC1 point: {}", err)))?;
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or_else(|| Error::InvalidArgument("point is not on the curve".to_string()))?;
        Ok(self.element(Point::from(affine)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_curve() {
        let group = K256EcGroup::named("secp256k1").unwrap();
        assert_eq!(group.group_type(), "secp256k1");
        assert!(group.validate_group().is_ok());
        assert!(group.is_order_greater_than(255));
        assert!(!group.is_order_greater_than(256));
        assert!(matches!(
            K256EcGroup::named("P-256"),
            Err(Error::Construction(_))
        ));
    }

    #[test]
    fn test_exponent_wraps_at_order() {
        let group = K256EcGroup::new();
        let g = group.generator();
        let n = group.order().clone();
        assert!(group.exponentiate(&g, &n).unwrap().is_identity());
        let n_plus_two = &n + &BigInteger::from(2);
        assert_eq!(
            group.exponentiate(&g, &n_plus_two).unwrap(),
            group.multiply(&g, &g).unwrap()
        );
    }

    #[test]
    fn test_encoding_layout() {
        let group = K256EcGroup::new();
        assert_eq!(group.max_encodable_length(), 29);
        let element = group.encode_bytes(b"\x00hello").unwrap();
        let encoded = element.point().to_affine().to_encoded_point(true);
        let x = encoded.x().unwrap();
        assert_eq!(x[LENGTH_INDEX], 6);
        assert_eq!(&x[LENGTH_INDEX - 6..LENGTH_INDEX], b"\x00hello");
        assert_eq!(group.decode_element(&element).unwrap(), b"\x00hello");

        let full = [0xff_u8; 29];
        let element = group.encode_bytes(&full).unwrap();
        assert_eq!(group.decode_element(&element).unwrap(), full);
    }

    #[test]
    fn test_decode_rejects_foreign_points() {
        let group = K256EcGroup::new();
        assert!(group.decode_element(&group.generator()).is_err());
        assert!(group.decode_element(&group.identity()).is_err());
    }

    #[test]
    fn test_identity_bytes() {
        let group = K256EcGroup::new();
        let bytes = group.element_to_bytes(&group.identity()).unwrap();
        assert_eq!(bytes, vec![0]);
        let identity = group.reconstruct_element(&bytes, true).unwrap();
        assert!(identity.is_identity());
        assert!(group.reconstruct_element(&[7, 1, 2], false).is_err());
    }
}
