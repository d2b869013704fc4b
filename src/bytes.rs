use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

use crate::error::{Error, Result};

/// `n` bytes drawn from the OS generator, restricted to `[A-Za-z0-9]`.
///
/// Meant for fixtures that should stay readable when printed, never for
/// key material.
pub fn random_alphanumeric_bytes(n: usize) -> Vec<u8> {
    OsRng.sample_iter(Alphanumeric).take(n).collect()
}

/// Copies `src` into `dst` starting at `offset`. Bytes of `dst` outside
/// `offset..offset + src.len()` are left untouched.
pub fn copy_into(src: &[u8], dst: &mut [u8], offset: usize) -> Result<()> {
    let end = offset
        .checked_add(src.len())
        .filter(|end| *end <= dst.len())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "copying {} bytes at offset {} overruns a buffer of {} bytes",
                src.len(),
                offset,
                dst.len()
            ))
        })?;
    dst[offset..end].copy_from_slice(src);
    Ok(())
}

/// Owned copy of `src[offset..]`
pub fn copy_from(src: &[u8], offset: usize) -> Result<Vec<u8>> {
    src.get(offset..).map(<[u8]>::to_vec).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "offset {} is past the end of a buffer of {} bytes",
            offset,
            src.len()
        ))
    })
}
