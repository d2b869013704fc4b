use std::collections::HashMap;

use num_bigint::BigUint;

/// Width in bits of the exponent windows
const WINDOW: u64 = 4;
const TABLE_SIZE: usize = 1 << WINDOW;

/// The group operation of a backend, on its native representation
pub(crate) trait GroupLaw {
    type Elem: Clone;

    fn identity(&self) -> Self::Elem;

    fn compose(&self, lhs: &Self::Elem, rhs: &Self::Elem) -> Self::Elem;

    fn square(&self, elem: &Self::Elem) -> Self::Elem {
        self.compose(elem, elem)
    }
}

// bits `index * WINDOW .. (index + 1) * WINDOW` of `exponent`
fn window_digit(exponent: &BigUint, index: u64) -> usize {
    (0..WINDOW).fold(0, |digit, j| {
        digit | ((exponent.bit(index * WINDOW + j) as usize) << j)
    })
}

// [1, base, base^2, ..., base^(TABLE_SIZE - 1)]
fn small_powers<L: GroupLaw>(law: &L, base: &L::Elem) -> Vec<L::Elem> {
    let mut powers = Vec::with_capacity(TABLE_SIZE);
    powers.push(law.identity());
    powers.push(base.clone());
    for i in 2..TABLE_SIZE {
        let next = law.compose(&powers[i - 1], base);
        powers.push(next);
    }
    powers
}

/// Interleaved fixed-window multi-exponentiation: one shared chain of
/// squarings, one multiplication per base and non-zero window.
pub(crate) fn multi_exponentiate<L: GroupLaw>(
    law: &L,
    bases: &[L::Elem],
    exponents: &[BigUint],
) -> L::Elem {
    let tables: Vec<Vec<L::Elem>> = bases.iter().map(|b| small_powers(law, b)).collect();
    let max_bits = exponents.iter().map(BigUint::bits).max().unwrap_or(0);
    let windows = (max_bits + WINDOW - 1) / WINDOW;

    let mut acc = law.identity();
    let mut started = false;
    for index in (0..windows).rev() {
        if started {
            for _ in 0..WINDOW {
                acc = law.square(&acc);
            }
        }
        for (table, exponent) in tables.iter().zip(exponents) {
            let digit = window_digit(exponent, index);
            if digit != 0 {
                acc = law.compose(&acc, &table[digit]);
                started = true;
            }
        }
    }
    acc
}

/// Fixed-base table: `rows[i][d] = base^(d * 2^(WINDOW * i))`, so an
/// exponentiation costs one multiplication per window and no squarings.
#[derive(Debug, Clone)]
pub(crate) struct FixedBaseTable<T> {
    rows: Vec<Vec<T>>,
}

impl<T: Clone> FixedBaseTable<T> {
    /// Table for exponents of at most `bits` bits
    pub(crate) fn new<L: GroupLaw<Elem = T>>(law: &L, base: &T, bits: u64) -> Self {
        let windows = ((bits + WINDOW - 1) / WINDOW).max(1);
        let mut rows = Vec::with_capacity(windows as usize);
        let mut row_base = base.clone();
        for _ in 0..windows {
            let row = small_powers(law, &row_base);
            row_base = law.compose(&row[TABLE_SIZE - 1], &row_base);
            rows.push(row);
        }
        FixedBaseTable { rows }
    }

    pub(crate) fn bits(&self) -> u64 {
        self.rows.len() as u64 * WINDOW
    }

    /// `base^exponent`; `exponent` must not be wider than [`Self::bits`]
    pub(crate) fn exponentiate<L: GroupLaw<Elem = T>>(&self, law: &L, exponent: &BigUint) -> T {
        debug_assert!(exponent.bits() <= self.bits());
        self.rows
            .iter()
            .enumerate()
            .fold(law.identity(), |acc, (index, row)| {
                match window_digit(exponent, index as u64) {
                    0 => acc,
                    digit => law.compose(&acc, &row[digit]),
                }
            })
    }
}

/// Precomputed tables of one group, keyed by the canonical bytes of their
/// base element
#[derive(Debug)]
pub(crate) struct PrecomputeCache<T> {
    tables: HashMap<Vec<u8>, FixedBaseTable<T>>,
}

impl<T: Clone> PrecomputeCache<T> {
    pub(crate) fn new() -> Self {
        PrecomputeCache {
            tables: HashMap::new(),
        }
    }

    /// The table for `key`, built with `build` if absent
    pub(crate) fn acquire(
        &mut self,
        key: Vec<u8>,
        build: impl FnOnce() -> FixedBaseTable<T>,
    ) -> &FixedBaseTable<T> {
        self.tables.entry(key).or_insert_with(|| {
            log::trace!("building fixed-base exponentiation table");
            build()
        })
    }

    /// Whether a table existed for `key`
    pub(crate) fn release(&mut self, key: &[u8]) -> bool {
        self.tables.remove(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.tables.len()
    }
}
