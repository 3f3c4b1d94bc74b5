//! Speed limiting and spawn sampling.

use glam::Vec2;
use rand::Rng;

/// Limit `velocity` to `max_speed`.
///
/// `max_speed_sq` is the caller's cached `max_speed * max_speed` so the common
/// under-limit case costs one dot product and no square root. A velocity over
/// the limit keeps its direction and comes back with magnitude `max_speed`.
#[must_use]
pub fn clamp_speed(velocity: Vec2, max_speed: f32, max_speed_sq: f32) -> Vec2 {
    if velocity.length_squared() > max_speed_sq {
        with_length(velocity, max_speed)
    } else {
        velocity
    }
}

/// Rescale `v` to magnitude `length`, keeping its direction.
///
/// The vector is divided by its largest component first, so magnitudes whose
/// square would overflow `f32` still normalise. Zero and non-finite input
/// yield `Vec2::ZERO`.
#[must_use]
pub fn with_length(v: Vec2, length: f32) -> Vec2 {
    let largest = v.abs().max_element();
    if largest == 0.0 || !largest.is_finite() {
        return Vec2::ZERO;
    }
    (v / largest).normalize_or_zero() * length
}

/// Uniformly sample a point inside the unit disk.
pub fn sample_unit_disk<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    loop {
        let candidate = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_clamp_under_limit_is_identity() {
        let v = Vec2::new(1.0, 2.0);
        assert_eq!(clamp_speed(v, 5.0, 25.0), v);
    }

    #[test]
    fn test_clamp_over_limit_hits_max_speed() {
        let v = Vec2::new(30.0, 40.0);
        let clamped = clamp_speed(v, 5.0, 25.0);
        assert!((clamped.length() - 5.0).abs() < 1e-5);
        assert!((clamped - Vec2::new(3.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn test_clamp_preserves_direction() {
        let v = Vec2::new(-70.0, 0.5);
        let clamped = clamp_speed(v, 2.0, 4.0);
        let cross = v.perp_dot(clamped);
        assert!(cross.abs() < 1e-3);
        assert!(v.dot(clamped) > 0.0);
    }

    #[test]
    fn test_clamp_huge_velocity_hits_max_speed() {
        // |v|² overflows f32 here.
        let clamped = clamp_speed(Vec2::new(3e19, 4e19), 5.0, 25.0);
        assert!((clamped - Vec2::new(3.0, 4.0)).length() < 1e-5);

        let clamped = clamp_speed(Vec2::new(-1e20, 0.0), 2.0, 4.0);
        assert_eq!(clamped, Vec2::new(-2.0, 0.0));
    }

    #[test]
    fn test_with_length_degenerate_input() {
        assert_eq!(with_length(Vec2::ZERO, 3.0), Vec2::ZERO);
        assert_eq!(with_length(Vec2::new(f32::INFINITY, 1.0), 3.0), Vec2::ZERO);
        assert!((with_length(Vec2::new(0.0, f32::MAX), 3.0) - Vec2::new(0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_unit_disk_samples_stay_inside() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(sample_unit_disk(&mut rng).length_squared() <= 1.0);
        }
    }
}
