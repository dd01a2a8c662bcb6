mod x25519;
pub use x25519::*;

use crate::Error;
use rand::TryRngCore;
use rand::rngs::OsRng;

/// Fills `buf` from the operating system's entropy source.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), Error> {
    OsRng.try_fill_bytes(buf).map_err(|_| Error::Random)
}

/// Generates a cryptographically secure random 32-byte seed.
pub(crate) fn generate_random_seed() -> Result<Box<[u8; 32]>, Error> {
    let mut seed = Box::new([0u8; 32]);
    fill_random(seed.as_mut_slice())?;
    Ok(seed)
}
