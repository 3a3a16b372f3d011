//! Puck-puck contact detection and response
//!
//! Contacts are detected one step ahead: two pucks touch when their
//! centers are closer than two radii and the next step would bring them
//! closer still. Pucks that overlap while separating are left alone, so a
//! single approach produces a single contact.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A resolved contact between two pucks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Index of the integration step that resolved the contact
    pub step: usize,
    /// Lower puck index of the pair
    pub a: usize,
    /// Higher puck index of the pair
    pub b: usize,
}

/// Check whether two pucks are in contact and closing
///
/// `vel_a`/`vel_b` are the velocities used for the prospective step.
pub fn is_closing_contact(
    pos_a: DVec2,
    vel_a: DVec2,
    pos_b: DVec2,
    vel_b: DVec2,
    radius: f64,
    dt: f64,
) -> bool {
    let now = pos_a.distance(pos_b);
    if now >= 2.0 * radius {
        return false;
    }
    let next = (pos_a + vel_a * dt).distance(pos_b + vel_b * dt);
    now - next > 0.0
}

/// Component of `vel` along the line `normal` (which need not be unit length)
#[inline]
pub fn along_line(vel: DVec2, normal: DVec2) -> DVec2 {
    let len_sq = normal.length_squared();
    if len_sq == 0.0 {
        return DVec2::ZERO;
    }
    normal * (vel.dot(normal) / len_sq)
}

/// Resolve a contact as a 1-D elastic exchange along the line of centers
///
/// Each puck keeps the velocity component perpendicular to the line and
/// takes the other puck's component along it. This is exact only for equal
/// masses; the mass ratio never enters. A puck hitting one at rest stops
/// dead along the line and hands its full along-line speed over.
///
/// Coincident centers have no line of action and are returned unchanged.
pub fn exchange_velocities(
    pos_a: DVec2,
    vel_a: DVec2,
    pos_b: DVec2,
    vel_b: DVec2,
) -> (DVec2, DVec2) {
    let normal = pos_a - pos_b;
    if normal.length_squared() == 0.0 {
        return (vel_a, vel_b);
    }
    let along_a = along_line(vel_a, normal);
    let along_b = along_line(vel_b, normal);
    let new_a = (vel_a - along_a) + along_b;
    let new_b = (vel_b - along_b) + along_a;
    (new_a, new_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: f64 = 0.03;
    const DT: f64 = 0.01;

    #[test]
    fn test_closing_contact_detected() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(0.0, 0.05);
        assert!(is_closing_contact(a, DVec2::new(0.0, 1.0), b, DVec2::ZERO, R, DT));
    }

    #[test]
    fn test_separating_overlap_ignored() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(0.0, 0.05);
        assert!(!is_closing_contact(a, DVec2::new(0.0, -1.0), b, DVec2::ZERO, R, DT));
    }

    #[test]
    fn test_far_apart_no_contact() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(0.0, 0.5);
        assert!(!is_closing_contact(a, DVec2::new(0.0, 10.0), b, DVec2::ZERO, R, DT));
    }

    #[test]
    fn test_head_on_hands_over_velocity() {
        let (va, vb) = exchange_velocities(
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(0.0, 0.05),
            DVec2::ZERO,
        );
        assert!(va.length() < 1e-12);
        assert!((vb - DVec2::new(0.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_glancing_keeps_perpendicular() {
        // Line of centers along x, incoming velocity diagonal
        let (va, vb) = exchange_velocities(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.05, 0.0),
            DVec2::ZERO,
        );
        assert!((va - DVec2::new(0.0, 1.0)).length() < 1e-12);
        assert!((vb - DVec2::new(1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_exchange_conserves_along_line_sum() {
        let pa = DVec2::new(0.01, 0.0);
        let pb = DVec2::new(0.03, 0.04);
        let va = DVec2::new(0.3, 0.9);
        let vb = DVec2::new(-0.2, -0.1);
        let normal = pa - pb;
        let before = along_line(va, normal) + along_line(vb, normal);
        let (na, nb) = exchange_velocities(pa, va, pb, vb);
        let after = along_line(na, normal) + along_line(nb, normal);
        assert!((before - after).length() < 1e-12);
    }

    #[test]
    fn test_coincident_centers_unchanged() {
        let p = DVec2::new(0.2, 0.2);
        let va = DVec2::new(0.1, 0.0);
        let (na, nb) = exchange_velocities(p, va, p, DVec2::ZERO);
        assert_eq!(na, va);
        assert_eq!(nb, DVec2::ZERO);
    }
}
