//! Uniform reviewer sampling.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Remove every excluded id from the candidate list.
pub fn eligible<'a>(
    candidates: Vec<String>,
    excluded: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let excluded: HashSet<&str> = excluded.into_iter().collect();
    candidates
        .into_iter()
        .filter(|c| !excluded.contains(c.as_str()))
        .collect()
}

/// Pick up to `count` distinct candidates uniformly at random, without replacement.
///
/// Repeated ids in the input are collapsed first, so the result never holds
/// the same id twice.
pub fn pick<R: Rng + ?Sized>(
    mut candidates: Vec<String>,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    candidates.sort();
    candidates.dedup();

    let take = count.min(candidates.len());
    let (picked, _) = candidates.partial_shuffle(rng, take);
    picked.to_vec()
}

/// Pick a fresh random sample using a per-call, non-deterministic generator.
pub fn pick_random(candidates: Vec<String>, count: usize) -> Vec<String> {
    pick(candidates, count, &mut rand::thread_rng())
}
