use crate::bytes::random_alphanumeric_bytes;

// --------------- tests ----------------
use super::*;

const ZP_BITS: u64 = 64;

fn exponents(values: &[i64]) -> Vec<BigInteger> {
    values.iter().map(|v| BigInteger::from(*v)).collect()
}

fn check_multiply_by_inverse<G: DlogGroup>(group: &G) {
    let element = group.create_random_element();
    assert!(group.is_member(&element));
    let inverse = group.inverse(&element).unwrap();
    assert!(group.is_member(&inverse));

    let product = group.multiply(&element, &inverse).unwrap();
    assert!(product.is_identity());
    assert_eq!(product, group.identity());
}

fn check_exponentiate<G: DlogGroup>(group: &G) {
    let element = group.create_random_element();
    let cubed = group.exponentiate(&element, &BigInteger::from(3)).unwrap();
    let square = group.multiply(&element, &element).unwrap();
    assert_eq!(cubed, group.multiply(&square, &element).unwrap());

    assert_eq!(
        group.exponentiate(&element, &BigInteger::zero()).unwrap(),
        group.identity()
    );
    assert_eq!(
        group.exponentiate(&element, &BigInteger::one()).unwrap(),
        element
    );
    assert!(group
        .exponentiate(&group.generator(), group.order())
        .unwrap()
        .is_identity());
}

fn check_negative_exponent<G: DlogGroup>(group: &G) {
    let element = group.create_random_element();
    let inverse = group.inverse(&element).unwrap();
    let expected = group.exponentiate(&inverse, &BigInteger::from(5)).unwrap();
    assert_eq!(
        group.exponentiate(&element, &BigInteger::from(-5)).unwrap(),
        expected
    );
}

fn check_simultaneous_exponentiations<G: DlogGroup>(group: &G) {
    let bases = [group.create_random_element(), group.create_random_element()];
    let exps = exponents(&[3, 4]);

    let expected = group
        .multiply(
            &group.exponentiate(&bases[0], &exps[0]).unwrap(),
            &group.exponentiate(&bases[1], &exps[1]).unwrap(),
        )
        .unwrap();
    assert_eq!(
        group
            .simultaneous_multiple_exponentiations(&bases, &exps)
            .unwrap(),
        expected
    );

    // wide and negative exponents are reduced like in exponentiate
    let exps = vec![group.order() * &BigInteger::from(7), BigInteger::from(-2)];
    let expected = group.exponentiate(&bases[1], &exps[1]).unwrap();
    assert_eq!(
        group
            .simultaneous_multiple_exponentiations(&bases, &exps)
            .unwrap(),
        expected
    );

    assert!(matches!(
        group.simultaneous_multiple_exponentiations(&bases, &exponents(&[1])),
        Err(Error::InvalidArgument(_))
    ));
    assert!(group
        .simultaneous_multiple_exponentiations(&[], &[])
        .is_err());
}

fn check_precomputed_values<G: DlogGroup>(group: &mut G) {
    let base = group.create_random_element();
    let exponent = BigInteger::from(32);
    let expected = group.exponentiate(&base, &exponent).unwrap();

    let first = group
        .exponentiate_with_precomputed_values(&base, &exponent)
        .unwrap();
    assert_eq!(first, expected);
    assert_eq!(group.precomputed_bases(), 1);

    // the table is reused for other exponents of the same base
    let random = BigInteger::random_range(&BigInteger::zero(), group.order()).unwrap();
    assert_eq!(
        group
            .exponentiate_with_precomputed_values(&base, &random)
            .unwrap(),
        group.exponentiate(&base, &random).unwrap()
    );
    assert_eq!(group.precomputed_bases(), 1);

    let generator = group.generator();
    group
        .exponentiate_with_precomputed_values(&generator, &exponent)
        .unwrap();
    assert_eq!(group.precomputed_bases(), 2);

    group.end_exponentiate_with_precomputed_values(&base).unwrap();
    group
        .end_exponentiate_with_precomputed_values(&generator)
        .unwrap();
    assert_eq!(group.precomputed_bases(), 0);
    // releasing twice is harmless
    group.end_exponentiate_with_precomputed_values(&base).unwrap();

    // plain exponentiation is unaffected by the release
    assert_eq!(group.exponentiate(&base, &exponent).unwrap(), expected);

    // a released base gets a fresh table with the same results
    assert_eq!(
        group
            .exponentiate_with_precomputed_values(&base, &exponent)
            .unwrap(),
        expected
    );
    assert_eq!(group.precomputed_bases(), 1);
    group.end_exponentiate_with_precomputed_values(&base).unwrap();
    assert_eq!(group.precomputed_bases(), 0);
}

fn check_encode_decode<G: DlogGroup>(group: &G) {
    let max = group.max_encodable_length();
    for k in [0, 1, max / 2, max] {
        let message = random_alphanumeric_bytes(k);
        let element = group.encode_bytes(&message).unwrap();
        assert!(group.is_member(&element));
        assert_eq!(group.decode_element(&element).unwrap(), message);
    }

    let too_long = random_alphanumeric_bytes(max + 1);
    assert!(matches!(
        group.encode_bytes(&too_long),
        Err(Error::EncodingLength { length, max: m }) if length == max + 1 && m == max
    ));
}

fn check_element_bytes<G: DlogGroup>(group: &G) {
    for element in [group.create_random_element(), group.generator()] {
        let bytes = group.element_to_bytes(&element).unwrap();
        assert_eq!(group.reconstruct_element(&bytes, true).unwrap(), element);
        assert_eq!(group.reconstruct_element(&bytes, false).unwrap(), element);
    }
}

fn check_group_mismatch<G: DlogGroup>(group: &G, other: &G) {
    assert_ne!(group.id(), other.id());
    let foreign = other.generator();
    let own = group.generator();
    assert!(!group.is_member(&foreign));
    assert_ne!(own, foreign);

    let mismatch = Error::GroupMismatch {
        expected: group.id(),
        found: other.id(),
    };
    assert_eq!(group.inverse(&foreign).unwrap_err(), mismatch);
    assert_eq!(group.multiply(&own, &foreign).unwrap_err(), mismatch);
    assert_eq!(
        group
            .exponentiate(&foreign, &BigInteger::from(2))
            .unwrap_err(),
        mismatch
    );
    assert_eq!(
        group
            .simultaneous_multiple_exponentiations(&[own, foreign.clone()], &exponents(&[1, 1]))
            .unwrap_err(),
        mismatch
    );
    assert_eq!(group.decode_element(&foreign).unwrap_err(), mismatch);
    assert_eq!(group.element_to_bytes(&foreign).unwrap_err(), mismatch);
}

fn check_group_properties<G: DlogGroup>(group: &G) {
    assert!(group.validate_group().is_ok());
    assert!(group.is_prime_order());
    assert!(group.is_generator());
    assert!(group.is_order_greater_than(ZP_BITS - 2));
    assert!(!group.create_random_generator().is_identity());
    assert!(group.identity().is_identity());
    assert!(group.is_member(&group.identity()));
}

fn test_all<G: DlogGroup>(group: &mut G, other: &G) {
    check_group_properties(group);
    check_multiply_by_inverse(group);
    check_exponentiate(group);
    check_negative_exponent(group);
    check_simultaneous_exponentiations(group);
    check_precomputed_values(group);
    check_encode_decode(group);
    check_element_bytes(group);
    check_group_mismatch(group, other);
}

#[test_log::test]
fn test_crypto_bigint_zp_group() {
    let params = ZpParams::generate(ZP_BITS).unwrap();
    let mut group = CryptoBigintZpGroup::with_params(params.clone()).unwrap();
    // same parameters, still a distinct instance
    let other = CryptoBigintZpGroup::with_params(params).unwrap();
    test_all(&mut group, &other);
}

#[test_log::test]
fn test_crypto_bigint_zp_generated_group() {
    let mut group = CryptoBigintZpGroup::new(ZP_BITS).unwrap();
    let other = CryptoBigintZpGroup::new(ZP_BITS).unwrap();
    test_all(&mut group, &other);
}

#[test_log::test]
fn test_num_bigint_zp_group() {
    let mut group = NumBigintZpGroup::new(ZP_BITS).unwrap();
    let other = NumBigintZpGroup::new(ZP_BITS).unwrap();
    test_all(&mut group, &other);
}

#[test_log::test]
fn test_k256_ec_group() {
    let mut group = K256EcGroup::new();
    let other = K256EcGroup::new();
    test_all(&mut group, &other);
}

#[test]
fn test_zp_backends_agree() {
    let params = ZpParams::generate(ZP_BITS).unwrap();
    let fixed = CryptoBigintZpGroup::with_params(params.clone()).unwrap();
    let heap = NumBigintZpGroup::with_params(params).unwrap();

    let exponent = BigInteger::from(0x1234_5678_i64);
    let a = fixed.exponentiate(&fixed.generator(), &exponent).unwrap();
    let b = heap.exponentiate(&heap.generator(), &exponent).unwrap();
    assert_eq!(a.value(), b.value());
    assert_eq!(
        fixed.element_to_bytes(&a).unwrap(),
        heap.element_to_bytes(&b).unwrap()
    );

    let message = b"dlog";
    let a = fixed.encode_bytes(message).unwrap();
    let b = heap.encode_bytes(message).unwrap();
    assert_eq!(a.value(), b.value());
}

#[test]
fn test_zp_backends_agree_on_wide_exponents() {
    let params = ZpParams::named("rfc2409-modp1024").unwrap();
    let fixed = CryptoBigintZpGroup::with_params(params.clone()).unwrap();
    let heap = NumBigintZpGroup::with_params(params.clone()).unwrap();

    let p_minus_two = &params.p - &BigInteger::from(2);
    let random = BigInteger::random_range(&BigInteger::zero(), &p_minus_two).unwrap();
    for exponent in [p_minus_two, random, BigInteger::from(-3)] {
        let a = fixed.exponentiate(&fixed.generator(), &exponent).unwrap();
        let b = heap.exponentiate(&heap.generator(), &exponent).unwrap();
        assert_eq!(a.value(), b.value());
        assert!(fixed.is_member(&a));
    }

    let g = fixed.generator();
    let inverse = fixed.inverse(&g).unwrap();
    assert_eq!(
        inverse.value(),
        heap.inverse(&heap.generator()).unwrap().value()
    );
    assert!(fixed.multiply(&g, &inverse).unwrap().is_identity());
}
