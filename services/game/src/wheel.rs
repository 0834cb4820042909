//! Weighted prize selection and wheel rotation math

use rand::Rng;
use thiserror::Error;

use crate::models::Prize;

/// Full extra turns added to every spin before settling on the target segment
pub const EXTRA_SPINS: f64 = 3.0;

/// Selection preconditions that must fail loudly instead of defaulting to an
/// index and corrupting the probability contract
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Prize catalog is empty")]
    EmptyCatalog,
    #[error("Prize catalog has no positive probability mass")]
    NonPositiveTotal,
}

/// Draw one catalog index according to each entry's relative weight.
///
/// Each index is selected with probability `probability_i / total`. A draw
/// landing exactly on a segment boundary resolves to the lower index.
pub fn select<R: Rng + ?Sized>(catalog: &[Prize], rng: &mut R) -> Result<usize, SelectionError> {
    if catalog.is_empty() {
        return Err(SelectionError::EmptyCatalog);
    }

    let total: f64 = catalog.iter().map(|p| p.probability).sum();
    if !(total > 0.0) {
        return Err(SelectionError::NonPositiveTotal);
    }

    let draw = rng.gen_range(0.0..total);
    let mut running = 0.0;
    for (index, prize) in catalog.iter().enumerate() {
        running += prize.probability;
        if running >= draw {
            return Ok(index);
        }
    }

    // Float accumulation can leave the final running sum a hair under `total`
    Ok(catalog.len() - 1)
}

/// Compute the cumulative rotation the wheel settles at for a spin.
///
/// Takes the shortest forward-only path from the current angle to the selected
/// segment (delta in `[0, 360)`), then adds [`EXTRA_SPINS`] full turns for the
/// visual effect. Deterministic given its inputs so the animation target is
/// testable without any rendering.
///
/// `current_rotation` comes from the client; a non-finite value resets to the
/// zero position instead of propagating NaN into the target.
pub fn spin_rotation(selected_index: usize, entry_count: usize, current_rotation: f64) -> f64 {
    let current_rotation = if current_rotation.is_finite() {
        current_rotation
    } else {
        0.0
    };

    let segment_angle = 360.0 / entry_count as f64;
    let target_angle = selected_index as f64 * segment_angle;
    let current_angle = current_rotation.rem_euclid(360.0);

    let mut delta = target_angle - current_angle;
    if delta < 0.0 {
        delta += 360.0;
    }

    current_rotation + EXTRA_SPINS * 360.0 + delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog(weights: &[f64]) -> Vec<Prize> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &probability)| Prize {
                id: i as i64 + 1,
                name: format!("Prize {i}"),
                color: "#8B5CF6".to_string(),
                text_color: "#FFFFFF".to_string(),
                probability,
            })
            .collect()
    }

    #[test]
    fn empty_catalog_fails_explicitly() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select(&[], &mut rng), Err(SelectionError::EmptyCatalog));
    }

    #[test]
    fn zero_total_weight_fails_explicitly() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            select(&catalog(&[0.0, 0.0, 0.0]), &mut rng),
            Err(SelectionError::NonPositiveTotal)
        );
    }

    #[test]
    fn selection_frequency_converges_to_relative_weights() {
        let prizes = catalog(&[1.0, 2.0, 3.0, 4.0]);
        let total = 10.0;
        let draws = 200_000;

        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0u32; 4];
        for _ in 0..draws {
            let index = select(&prizes, &mut rng).unwrap();
            counts[index] += 1;
        }

        for (index, prize) in prizes.iter().enumerate() {
            let expected = prize.probability / total;
            let observed = f64::from(counts[index]) / f64::from(draws);
            assert!(
                (observed - expected).abs() < 0.01,
                "index {index}: observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn single_entry_is_always_selected() {
        let prizes = catalog(&[5.0]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(select(&prizes, &mut rng), Ok(0));
        }
    }

    #[test]
    fn rotation_target_is_deterministic() {
        // Four segments of 90 degrees; segment 2 sits at 180
        let rotation = spin_rotation(2, 4, 0.0);
        assert_eq!(rotation, 3.0 * 360.0 + 180.0);
    }

    #[test]
    fn rotation_delta_stays_forward_and_below_full_turn() {
        for &current in &[0.0, 90.0, 715.0, 1260.0, 3599.5] {
            for index in 0..4 {
                let rotation = spin_rotation(index, 4, current);
                let delta = rotation - current - EXTRA_SPINS * 360.0;
                assert!(
                    (0.0..360.0).contains(&delta),
                    "delta {delta} out of range for index {index} at {current}"
                );
            }
        }
    }

    #[test]
    fn non_finite_current_rotation_resets_to_zero_position() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let rotation = spin_rotation(2, 4, bad);
            assert!(rotation.is_finite(), "non-finite target for input {bad}");
            assert_eq!(rotation, spin_rotation(2, 4, 0.0));
        }
    }

    #[test]
    fn rotation_accumulates_across_spins() {
        // Wheel already aligned with the target segment: only the extra turns apply
        let first = spin_rotation(2, 4, 0.0);
        let second = spin_rotation(2, 4, first);
        assert_eq!(second, first + EXTRA_SPINS * 360.0);
    }
}
