use elliptic_curve::Curve as _;

use crate::bigint::BigInteger;

pub type Curve = k256::Secp256k1;

pub type Point = k256::ProjectivePoint;

pub type Scalar = k256::Scalar;

pub type AffinePoint = k256::AffinePoint;

pub type EncodedPoint = k256::EncodedPoint;

pub type FieldBytes = k256::FieldBytes;

/// Size in bytes of a base field element and of a scalar
pub const FIELD_BYTES: usize = 32;

/// Order of the group of points
pub fn order() -> BigInteger {
    BigInteger::from_uint(&Curve::ORDER)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nat::Nat;
    use elliptic_curve::ff::PrimeField;
    use elliptic_curve::ops::MulByGenerator;

    fn scalar(x: u32) -> Scalar {
        let mut repr = FieldBytes::default();
        repr.copy_from_slice(&BigInteger::from(x).to_fixed_bytes(FIELD_BYTES).unwrap());
        Option::from(Scalar::from_repr(repr)).unwrap()
    }

    #[test]
    fn test_compare_scalars() {
        let y = scalar(1337);
        let z = scalar(1337);
        assert_eq!(y, z)
    }

    #[test]
    fn test_compare_points1() {
        let x_point = Point::mul_by_generator(&scalar(1337));
        let y_point = Point::mul_by_generator(&scalar(1337));

        assert_eq!(x_point, y_point);

        let z_point = Point::mul_by_generator(&scalar(42));

        assert_ne!(x_point, z_point);
    }

    #[test]
    fn test_order() {
        let n = order();
        assert_eq!(n.bit_length(), 256);
        assert_eq!(
            n.to_hex(),
            "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
        );
        assert!(n.is_probable_prime(20));
        // the order fits the wide Zp integers as well
        let wide: Nat = n.to_uint().unwrap();
        assert_eq!(BigInteger::from_uint(&wide), n);
    }
}
