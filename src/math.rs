//! Small scalar helpers shared by the simulation phases.

use bevy::math::Vec2;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Linear interpolation; `t` is not clamped.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Quadratic ease-out on `[0, 1]`: fast start, gentle finish.
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

/// Wrap an angle difference into `[-π, π)`.
///
/// Headings are stored unwrapped, so differences can be many turns apart.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

/// Sign that treats zero as positive, so a tie still picks a direction.
#[inline]
pub fn sign_or_positive(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Uniform sample in `[min, max)`; a degenerate range returns `min`.
///
/// Unlike `Rng::gen_range` this never panics on `min >= max`.
#[inline]
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}

/// Unit vector for a heading.
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Point on a circle of `radius` around the origin at `speed * time + phase`.
#[inline]
pub fn orbit_offset(time: f32, speed: f32, phase: f32, radius: f32) -> Vec2 {
    heading(time * speed + phase) * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_angle_stays_in_half_open_range() {
        for raw in [-20.0_f32, -PI, -0.1, 0.0, 0.1, PI, 3.5 * PI, 40.0] {
            let w = wrap_angle(raw);
            assert!(w >= -PI && w < PI, "wrap_angle({raw}) = {w}");
            assert!(
                ((raw - w) / TAU - ((raw - w) / TAU).round()).abs() < 1e-4,
                "wrap_angle({raw}) must differ by whole turns"
            );
        }
    }

    #[test]
    fn wrap_angle_picks_the_short_way_round() {
        // 350° → 10° is +20°, not -340°.
        let diff = wrap_angle(10f32.to_radians() - 350f32.to_radians());
        assert!((diff - 20f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn ease_out_quad_endpoints() {
        assert_eq!(ease_out_quad(0.0), 0.0);
        assert_eq!(ease_out_quad(1.0), 1.0);
        assert!(ease_out_quad(0.5) > 0.5);
    }

    #[test]
    fn random_range_tolerates_empty_range() {
        let mut rng = rand::thread_rng();
        assert_eq!(random_range(&mut rng, 3.0, 3.0), 3.0);
    }
}
