//! Running prefix sums of the generator stream.
//!
//! `one_commit(n)` is the commitment to `n` ones: the identity for `n = 0`,
//! otherwise `G[0] + … + G[n-1]`. Callers tend to ask for increasing `n`, so
//! the sums are memoized in a grow-only table.

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::traits::Identity;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::generators;

// prefix_sums[n] = Σ_{i<n} G[i]; index 0 holds the identity.
static PREFIX_SUMS: Lazy<RwLock<Vec<RistrettoPoint>>> =
    Lazy::new(|| RwLock::new(vec![RistrettoPoint::identity()]));

/// Σ_{i<n} G[i], with `one_commit(0)` the group identity.
pub fn get_one_commit(n: u64) -> RistrettoPoint {
    let n = usize::try_from(n).expect("one-commit length exceeds addressable memory");
    {
        let cache = PREFIX_SUMS.read();
        if let Some(commit) = cache.get(n) {
            return *commit;
        }
    }
    let mut cache = PREFIX_SUMS.write();
    while cache.len() <= n {
        let next_index = (cache.len() - 1) as u64;
        let extended = cache[cache.len() - 1] + generators::generator(next_index);
        cache.push(extended);
    }
    cache[n]
}
