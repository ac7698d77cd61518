// src/selection/selector.rs
use rand::Rng;

use crate::types::Interest;

/// Priority-proportional pick over `interests`.
///
/// Draws `r` uniformly in `[0, total)` and returns the first interest whose
/// running priority sum exceeds `r`. Returns `None` when the list is empty or
/// every priority is zero; callers then take the no-interest path.
pub fn pick_weighted<'a, R: Rng + ?Sized>(
    interests: &'a [Interest],
    rng: &mut R,
) -> Option<&'a Interest> {
    let total: u64 = interests.iter().map(|i| u64::from(i.priority)).sum();
    if total == 0 {
        return None;
    }

    let r = rng.random_range(0..total);
    let mut running = 0u64;
    for interest in interests {
        running += u64::from(interest.priority);
        if r < running {
            return Some(interest);
        }
    }
    // unreachable while r < total
    interests.last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn interests(pairs: &[(&str, u32)]) -> Vec<Interest> {
        pairs
            .iter()
            .map(|(t, p)| Interest::new("room", *t, *p))
            .collect()
    }

    #[test]
    fn empty_or_zero_weight_yields_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_weighted(&[], &mut rng).is_none());
        assert!(pick_weighted(&interests(&[("go", 0)]), &mut rng).is_none());
    }

    #[test]
    fn single_interest_always_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        let list = interests(&[("rust", 5)]);
        for _ in 0..50 {
            assert_eq!(pick_weighted(&list, &mut rng).unwrap().topic, "rust");
        }
    }

    #[test]
    fn zero_weight_entry_is_never_chosen() {
        let mut rng = StdRng::seed_from_u64(11);
        let list = interests(&[("dead", 0), ("live", 3)]);
        for _ in 0..500 {
            assert_eq!(pick_weighted(&list, &mut rng).unwrap().topic, "live");
        }
    }

    #[test]
    fn frequencies_converge_to_priority_share() {
        let mut rng = StdRng::seed_from_u64(42);
        let list = interests(&[("go", 6), ("rust", 2), ("zig", 2)]);
        let trials = 20_000;
        let mut go = 0usize;
        let mut rust = 0usize;
        for _ in 0..trials {
            match pick_weighted(&list, &mut rng).unwrap().topic.as_str() {
                "go" => go += 1,
                "rust" => rust += 1,
                _ => {}
            }
        }
        let go_share = go as f64 / trials as f64;
        let rust_share = rust as f64 / trials as f64;
        assert!((go_share - 0.6).abs() < 0.02, "go share {go_share}");
        assert!((rust_share - 0.2).abs() < 0.02, "rust share {rust_share}");
    }
}
