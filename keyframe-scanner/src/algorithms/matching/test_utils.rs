//! Synthetic point clouds for registration tests.
//!
//! Generators are exact: walls are perfectly straight and share their
//! constant coordinate bit for bit. Use [`jittered`] when a test needs
//! sensor-like scatter.

use crate::core::types::{Point2D, PointCloud2D};

/// Straight wall at `x`, `n` evenly spaced points from `y_start` to `y_end`.
pub fn wall(n: usize, x: f32, y_start: f32, y_end: f32) -> PointCloud2D {
    let step = if n > 1 { (y_end - y_start) / (n - 1) as f32 } else { 0.0 };
    let mut cloud = PointCloud2D::with_capacity(n);
    for i in 0..n {
        cloud.push(Point2D::new(x, y_start + i as f32 * step));
    }
    cloud
}

/// Two perpendicular walls meeting at the origin (`2n - 1` points).
pub fn corner(n: usize, length: f32) -> PointCloud2D {
    let mut cloud = PointCloud2D::with_capacity(2 * n);
    for i in 0..n {
        cloud.push(Point2D::new((i as f32 / (n - 1) as f32) * length, 0.0));
    }
    for i in 1..n {
        cloud.push(Point2D::new(0.0, (i as f32 / (n - 1) as f32) * length));
    }
    cloud
}

/// Rectangular room outline, `n / 4` points per wall.
pub fn rectangle(n: usize, width: f32, height: f32) -> PointCloud2D {
    let per_wall = n / 4;
    let mut cloud = PointCloud2D::with_capacity(per_wall * 4);
    for i in 0..per_wall {
        let t = i as f32 / per_wall as f32;
        cloud.push(Point2D::new(t * width, 0.0));
        cloud.push(Point2D::new(width, t * height));
        cloud.push(Point2D::new(width - t * width, height));
        cloud.push(Point2D::new(0.0, height - t * height));
    }
    cloud
}

/// Copy of `cloud` with a repeatable offset of at most `amplitude` on
/// each coordinate.
pub fn jittered(cloud: &PointCloud2D, amplitude: f32) -> PointCloud2D {
    let mut noisy = PointCloud2D::with_capacity(cloud.len());
    for (i, point) in cloud.iter().enumerate() {
        let dx = ((i * 7) % 11) as f32 / 5.0 - 1.0;
        let dy = ((i * 5) % 13) as f32 / 6.0 - 1.0;
        noisy.push(Point2D::new(point.x + dx * amplitude, point.y + dy * amplitude));
    }
    noisy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_is_exactly_straight() {
        let cloud = wall(91, 2.0, -1.0, 1.0);
        assert_eq!(cloud.len(), 91);
        assert!(cloud.xs.iter().all(|&x| x == 2.0));
        assert_eq!(cloud.ys[0], -1.0);
        assert!((cloud.ys[90] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_corner() {
        let cloud = corner(50, 2.0);
        assert_eq!(cloud.len(), 99);
        assert_eq!(cloud.ys.iter().filter(|&&y| y == 0.0).count(), 50);
    }

    #[test]
    fn test_rectangle() {
        let room = rectangle(100, 4.0, 3.0);
        assert_eq!(room.len(), 100);
        assert!(room.xs.iter().all(|&x| (0.0..=4.0).contains(&x)));
        assert!(room.ys.iter().all(|&y| (0.0..=3.0).contains(&y)));
    }

    #[test]
    fn test_jitter_is_bounded_and_repeatable() {
        let base = rectangle(40, 4.0, 3.0);
        let noisy = jittered(&base, 0.01);
        assert_eq!(noisy, jittered(&base, 0.01));
        for (a, b) in base.iter().zip(noisy.iter()) {
            assert!((a.x - b.x).abs() <= 0.01 + 1e-6);
            assert!((a.y - b.y).abs() <= 0.01 + 1e-6);
        }
        assert_ne!(noisy, base);
    }
}
