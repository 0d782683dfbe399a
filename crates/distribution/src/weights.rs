//! Random simplex weights via stick breaking.
//!
//! To split a total across `n` nodes we draw `n - 1` uniform cut points on
//! the unit interval, sort them, and take consecutive gaps. The gaps are
//! non-negative and sum to exactly 1 up to floating-point error, giving an
//! unbiased random partition without any renormalization step.

use rand::Rng;

/// Generates `n` non-negative weights summing to 1.
///
/// `n == 0` yields an empty vector; `n == 1` yields `[1.0]`.
pub fn generate_weights<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let mut cuts: Vec<f64> = Vec::with_capacity(n + 1);
            cuts.push(0.0);
            for _ in 0..n - 1 {
                cuts.push(rng.gen::<f64>());
            }
            cuts.push(1.0);
            cuts.sort_by(|a, b| a.total_cmp(b));

            cuts.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_nodes_yields_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(generate_weights(&mut rng, 0).is_empty());
    }

    #[test]
    fn one_node_takes_everything() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(generate_weights(&mut rng, 1), vec![1.0]);
    }

    #[test]
    fn weights_are_non_negative_and_sum_to_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for n in [2, 3, 7, 50, 1000] {
            let weights = generate_weights(&mut rng, n);
            assert_eq!(weights.len(), n);
            assert!(weights.iter().all(|w| *w >= 0.0));
            let sum: f64 = weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "n={n}: sum={sum}");
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(generate_weights(&mut a, 10), generate_weights(&mut b, 10));
    }

    #[test]
    fn different_draws_differ() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let first = generate_weights(&mut rng, 10);
        let second = generate_weights(&mut rng, 10);
        assert_ne!(first, second);
    }
}
