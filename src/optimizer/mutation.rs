use crate::consts::DONOR_COUNT;
use crate::genome::{Genome, RateDomain};
use fastrand::Rng;

/// Draws three distinct donor indices from `0..population_size`, excluding `exclude`.
pub fn select_donors(rng: &mut Rng, population_size: usize, exclude: usize) -> [usize; DONOR_COUNT] {
    assert!(
        population_size > DONOR_COUNT,
        "donor selection needs at least {} members, got {}",
        DONOR_COUNT + 1,
        population_size
    );

    let mut pool: Vec<usize> = (0..population_size).filter(|&i| i != exclude).collect();

    // Partial Fisher-Yates: the first DONOR_COUNT slots become the sample
    for k in 0..DONOR_COUNT {
        let j = rng.usize(k..pool.len());
        pool.swap(k, j);
    }
    [pool[0], pool[1], pool[2]]
}

/// `x1 + round(beta * (x2 - x3))` per coordinate, rounded onto the rate lattice.
pub fn differential_mutant(
    x1: &[f32],
    x2: &[f32],
    x3: &[f32],
    beta: f32,
    domain: &RateDomain,
) -> Genome {
    x1.iter()
        .zip(x2)
        .zip(x3)
        .map(|((&a, &b), &c)| a + domain.quantize(beta * (b - c)))
        .collect()
}

/// Binomial crossover where each coordinate KEEPS the parent value with
/// probability `keep_parent_proba` and takes the mutant otherwise.
pub fn binomial_crossover(
    parent: &[f32],
    mutant: &[f32],
    keep_parent_proba: f32,
    rng: &mut Rng,
) -> Genome {
    parent
        .iter()
        .zip(mutant)
        .map(|(&p, &m)| if rng.f32() < keep_parent_proba { p } else { m })
        .collect()
}

/// Picks the `quota` lowest-scoring members for reinitialization.
/// Ties are resolved by peeling the current minimum value and sweeping every
/// member tied at it (in index order) before rescanning. `protected` is never picked.
pub fn forced_diversity_targets(
    scores: &[f32],
    quota: usize,
    protected: Option<usize>,
) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..scores.len())
        .filter(|&i| Some(i) != protected)
        .collect();
    let mut picked = Vec::with_capacity(quota);

    while picked.len() < quota && !remaining.is_empty() {
        let min = remaining
            .iter()
            .map(|&i| scores[i])
            .fold(f32::INFINITY, f32::min);

        let (tied, rest): (Vec<usize>, Vec<usize>) =
            remaining.into_iter().partition(|&i| scores[i] == min);
        remaining = rest;

        for idx in tied {
            if picked.len() == quota {
                break;
            }
            picked.push(idx);
        }
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mutant_formula() {
        let d = RateDomain::new(-2.0, 2.0, 1.0);
        let x1 = [0.0, 1.0, -1.0];
        let x2 = [2.0, 0.0, 1.0];
        let x3 = [1.0, 0.0, -1.0];
        // beta 1.5: deltas 1.5 -> 2, 0 -> 0, 3 -> 3
        let m = differential_mutant(&x1, &x2, &x3, 1.5, &d);
        assert_eq!(m, vec![2.0, 1.0, 2.0]);

        // beta 0.5: deltas 0.5 -> 0, 0 -> 0, 1 -> 1
        let m = differential_mutant(&x1, &x2, &x3, 0.5, &d);
        assert_eq!(m, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_crossover_polarity_extremes() {
        let mut rng = Rng::with_seed(11);
        let parent = [1.0; 8];
        let mutant = [2.0; 8];
        assert_eq!(binomial_crossover(&parent, &mutant, 1.0, &mut rng), parent.to_vec());
        assert_eq!(binomial_crossover(&parent, &mutant, 0.0, &mut rng), mutant.to_vec());
    }

    #[test]
    fn test_forced_diversity_peels_ties() {
        let scores = [0.0, 5.0, 0.0, 3.0, 0.0, 9.0, 3.0, 7.0];
        let picked = forced_diversity_targets(&scores, 4, Some(5));
        assert_eq!(picked, vec![0, 2, 4, 3]);
    }

    #[test]
    fn test_forced_diversity_skips_protected() {
        let scores = [5.0; 4];
        let picked = forced_diversity_targets(&scores, 1, Some(0));
        assert_eq!(picked, vec![1]);
    }

    proptest! {
        #[test]
        fn prop_donors_distinct_and_exclude_self(
            seed in any::<u64>(),
            size in 4usize..40,
            pick in any::<prop::sample::Index>()
        ) {
            let mut rng = Rng::with_seed(seed);
            let exclude = pick.index(size);
            let donors = select_donors(&mut rng, size, exclude);

            prop_assert!(donors.iter().all(|&d| d < size && d != exclude));
            prop_assert!(donors[0] != donors[1] && donors[1] != donors[2] && donors[0] != donors[2]);
        }

        #[test]
        fn prop_forced_diversity_exact_quota(
            scores in proptest::collection::vec(0u8..4, 4..32)
        ) {
            let scores: Vec<f32> = scores.into_iter().map(f32::from).collect();
            let quota = scores.len() / 4;
            let picked = forced_diversity_targets(&scores, quota, Some(0));

            let mut unique = picked.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), quota);
            prop_assert!(!picked.contains(&0));
        }
    }
}
