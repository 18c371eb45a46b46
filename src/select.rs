use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Uniform random pick among the names starting with `prefix` (an empty
/// prefix matches everything). Single-pass reservoir sample: the k-th
/// matching name replaces the reservoir with probability 1/k, so the filtered
/// subset is never materialized.
pub fn choose_by_prefix<'a, R: Rng>(
    names: &'a [String],
    prefix: &str,
    rng: &mut R,
) -> Option<&'a str> {
    let mut chosen = None;
    let mut seen = 0usize;
    for name in names.iter().filter(|n| n.starts_with(prefix)) {
        seen += 1;
        if rng.gen_range(0..seen) == 0 {
            chosen = Some(name.as_str());
        }
    }
    chosen
}

/// Sample `k` distinct names matching `prefix`, without replacement. Asking
/// for more names than are available is an error, not a short sample.
pub fn sample_by_prefix<R: Rng>(
    names: &[String],
    prefix: &str,
    k: usize,
    rng: &mut R,
) -> Result<Vec<String>> {
    let pool: Vec<&String> = names.iter().filter(|n| n.starts_with(prefix)).collect();
    if k > pool.len() {
        bail!(
            "requested {} file(s), but only {} are available",
            k,
            pool.len()
        );
    }
    Ok(pool
        .choose_multiple(rng, k)
        .map(|name| (*name).clone())
        .collect())
}
