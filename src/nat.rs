use crypto_bigint::{
    modular::runtime_mod::{DynResidue, DynResidueParams},
    U2048,
};

/// Natural numbers represented as cryptographically safe big unsigned
/// integers, wide enough for the largest supported Zp modulus
pub type Nat = U2048;

pub const NAT_LIMBS: usize = Nat::LIMBS;

/// Montgomery form of a [`Nat`] modulo an odd modulus
pub type Residue = DynResidue<NAT_LIMBS>;

/// Montgomery parameters of an odd modulus, computed once per group
pub type ModulusParams = DynResidueParams<NAT_LIMBS>;

/// Computes `lhs * rhs mod modulus`
pub fn mul_mod(lhs: &Nat, rhs: &Nat, modulus: &ModulusParams) -> Nat {
    let dyn_residue_lhs = DynResidue::new(lhs, *modulus);
    let dyn_residue_rhs = DynResidue::new(rhs, *modulus);
    dyn_residue_lhs.mul(&dyn_residue_rhs).retrieve()
}

/// Computes `base^exponent mod modulus`. `exponent` must fit in
/// `exponent_bits` bits.
pub fn pow_mod(
    base: &Nat,
    exponent: &Nat,
    exponent_bits: usize,
    modulus: &ModulusParams,
) -> Nat {
    let dyn_residue = DynResidue::new(base, *modulus);
    dyn_residue
        .pow_bounded_exp(exponent, exponent_bits)
        .retrieve()
}
