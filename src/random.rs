//! Seeded RNG substrate and weighted selection.
//!
//! All randomness in a build flows through `ChaCha8Rng` streams seeded from
//! the master seed, so equal seeds and equal operation sequences always
//! yield equal maps.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::BuildError;

/// Create a deterministic RNG stream from a seed.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Draw one item from a weighted distribution.
///
/// Rates are non-negative; the draw lands in `[0, total)` and selects the
/// first item whose prefix sum exceeds it, so ties break in insertion order.
/// A zero-total distribution fails with `EmptyDistribution`.
pub fn weighted_choice<'a, T, F>(
    rng: &mut impl Rng,
    items: &'a [T],
    weight: F,
) -> Result<&'a T, BuildError>
where
    F: Fn(&T) -> u32,
{
    let total: u64 = items.iter().map(|item| u64::from(weight(item))).sum();
    if total == 0 {
        return Err(BuildError::EmptyDistribution);
    }

    let draw = rng.gen_range(0..total);
    let mut acc = 0u64;
    for item in items {
        acc += u64::from(weight(item));
        if draw < acc {
            return Ok(item);
        }
    }

    // The prefix sums cover [0, total), so the loop always returns.
    Err(BuildError::InvariantViolated(
        "weighted prefix sums did not cover the draw".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_choice_deterministic() {
        let items = vec![("grass", 3u32), ("dirt", 1u32)];
        let picks_a: Vec<&str> = {
            let mut rng = seeded_rng(7);
            (0..20)
                .map(|_| weighted_choice(&mut rng, &items, |i| i.1).unwrap().0)
                .collect()
        };
        let picks_b: Vec<&str> = {
            let mut rng = seeded_rng(7);
            (0..20)
                .map(|_| weighted_choice(&mut rng, &items, |i| i.1).unwrap().0)
                .collect()
        };
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_weighted_choice_respects_rates() {
        let items = vec![("never", 0u32), ("always", 5u32)];
        let mut rng = seeded_rng(11);
        for _ in 0..50 {
            let pick = weighted_choice(&mut rng, &items, |i| i.1).unwrap();
            assert_eq!(pick.0, "always");
        }
    }

    #[test]
    fn test_zero_total_fails() {
        let items = vec![("a", 0u32), ("b", 0u32)];
        let mut rng = seeded_rng(1);
        let result = weighted_choice(&mut rng, &items, |i| i.1);
        assert_eq!(result.unwrap_err(), BuildError::EmptyDistribution);
    }

    #[test]
    fn test_empty_slice_fails() {
        let items: Vec<(&str, u32)> = Vec::new();
        let mut rng = seeded_rng(1);
        assert!(weighted_choice(&mut rng, &items, |i| i.1).is_err());
    }
}
