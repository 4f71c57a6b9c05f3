//! Deterministic seed streams.
//!
//! Subsampling, negative draws and walk shuffling all come from a `StdRng`
//! seeded through [`derive_seed`], so a run is reproducible from its base
//! seed alone.

use rand::rngs::StdRng;
use rand::SeedableRng;

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Mix a base seed with a path of stream identifiers (epoch, batch, ...).
pub fn derive_seed(base: u64, stream: &[u64]) -> u64 {
    stream
        .iter()
        .fold(splitmix64(base), |acc, &s| splitmix64(acc ^ splitmix64(s)))
}

/// Convenience: a `StdRng` for the given stream.
pub fn stream_rng(base: u64, stream: &[u64]) -> StdRng {
    StdRng::seed_from_u64(derive_seed(base, stream))
}
