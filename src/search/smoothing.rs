//! Gaussian smoothing of the advantage grid
//!
//! Contact detection is discrete, so two nearly identical shots can land on
//! opposite sides of a contact that either fires or doesn't. Averaging each
//! cell with its neighbours favours shots whose whole neighbourhood scores
//! well.
//!
//! Missing cells are handled as a normalised convolution: values and a
//! presence mask are blurred separately and divided, so excluded candidates
//! neither count as zero nor drag their neighbours down.

use super::grid::{Cell, ScoreGrid};
use crate::consts::MAX_SMOOTHING_SIGMA;

/// Kernel radius in cells, `ceil(2 * sigma)`
///
/// Zero for a zero or NaN sigma; capped at `2 * MAX_SMOOTHING_SIGMA`.
pub fn kernel_radius(sigma: f64) -> usize {
    if sigma.is_nan() || sigma <= 0.0 {
        return 0;
    }
    (2.0 * sigma).ceil().min(2.0 * MAX_SMOOTHING_SIGMA) as usize
}

/// Normalised 1-D Gaussian kernel with radius [`kernel_radius`]
///
/// A zero sigma yields the identity kernel `[1.0]`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = kernel_radius(sigma) as i64;
    if radius == 0 {
        return vec![1.0];
    }
    let weights: Vec<f64> = (-radius..=radius)
        .map(|d| (-(d * d) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Convolve one axis of a dense row-major grid, truncating at the edges
fn convolve_axis(data: &[f64], dims: Cell, axis: usize, kernel: &[f64]) -> Vec<f64> {
    if kernel.len() == 1 {
        return data.to_vec();
    }
    let radius = (kernel.len() / 2) as i64;
    let strides = [dims[1] * dims[2], dims[2], 1];
    let len = dims[axis] as i64;
    let mut out = vec![0.0; data.len()];

    for (offset, slot) in out.iter_mut().enumerate() {
        let coord = ((offset / strides[axis]) % dims[axis]) as i64;
        let base = offset - coord as usize * strides[axis];
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let c = coord + k as i64 - radius;
            if c < 0 || c >= len {
                continue;
            }
            acc += w * data[base + c as usize * strides[axis]];
        }
        *slot = acc;
    }
    out
}

/// Smooth `grid` with a separable Gaussian, one sigma per axis (in cells)
///
/// Cells that are `None` in the input stay `None` in the output.
pub fn smooth(grid: &ScoreGrid, sigma: [f64; 3]) -> ScoreGrid {
    let dims = grid.dims();
    let mut values: Vec<f64> = grid.values().iter().map(|v| v.unwrap_or(0.0)).collect();
    let mut mask: Vec<f64> = grid
        .values()
        .iter()
        .map(|v| if v.is_some() { 1.0 } else { 0.0 })
        .collect();

    for (axis, s) in sigma.iter().enumerate() {
        let kernel = gaussian_kernel(*s);
        values = convolve_axis(&values, dims, axis, &kernel);
        mask = convolve_axis(&mask, dims, axis, &kernel);
    }

    let cells = grid
        .values()
        .iter()
        .zip(values.iter().zip(&mask))
        .map(|(original, (v, w))| match original {
            Some(_) if *w > 0.0 => Some(v / w),
            _ => None,
        })
        .collect();
    ScoreGrid::from_values(dims, cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_normalised_and_symmetric() {
        let kernel = gaussian_kernel(1.0);
        assert_eq!(kernel.len(), 5);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(kernel[0], kernel[4]);
        assert_eq!(kernel[1], kernel[3]);
        assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);

        assert_eq!(gaussian_kernel(0.0), vec![1.0]);
        assert_eq!(gaussian_kernel(0.4).len(), 3);
    }

    #[test]
    fn test_kernel_radius_bounded() {
        assert_eq!(kernel_radius(0.0), 0);
        assert_eq!(kernel_radius(f64::NAN), 0);
        assert_eq!(kernel_radius(1.0), 2);
        assert_eq!(kernel_radius(1.2), 3);

        let cap = (2.0 * MAX_SMOOTHING_SIGMA) as usize;
        assert_eq!(kernel_radius(1e300), cap);
        assert_eq!(kernel_radius(f64::INFINITY), cap);
        let kernel = gaussian_kernel(1e300);
        assert_eq!(kernel.len(), 2 * cap + 1);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let mut grid = ScoreGrid::new([2, 3, 2]);
        grid.set([0, 1, 1], Some(2.0));
        grid.set([1, 2, 0], Some(-1.0));
        assert_eq!(smooth(&grid, [0.0; 3]), grid);
    }

    #[test]
    fn test_constant_grid_unchanged() {
        let dims = [3, 4, 5];
        let grid = ScoreGrid::from_values(dims, vec![Some(1.5); 60]);
        let smoothed = smooth(&grid, [1.0, 1.0, 1.0]);
        for v in smoothed.values() {
            assert!((v.unwrap() - 1.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_isolated_spike_loses_to_plateau() {
        // A lone spike next to a broad plateau of slightly lower values
        let mut grid = ScoreGrid::from_values([1, 1, 9], vec![Some(0.0); 9]);
        grid.set([0, 0, 1], Some(3.0));
        for k in 5..9 {
            grid.set([0, 0, k], Some(2.0));
        }
        assert_eq!(grid.argmax_cells(), vec![[0, 0, 1]]);

        let smoothed = smooth(&grid, [0.0, 0.0, 1.0]);
        let best = smoothed.argmax_cells();
        assert!(!best.is_empty());
        assert!(best.iter().all(|cell| cell[2] >= 5));
    }

    #[test]
    fn test_missing_cells_are_ignored() {
        let mut grid = ScoreGrid::from_values([1, 1, 5], vec![Some(1.0); 5]);
        grid.set([0, 0, 2], None);
        let smoothed = smooth(&grid, [1.0, 1.0, 1.0]);
        assert_eq!(smoothed.get([0, 0, 2]), None);
        for k in [0, 1, 3, 4] {
            assert!((smoothed.get([0, 0, k]).unwrap() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_smoothing_spreads_across_every_axis() {
        let mut grid = ScoreGrid::from_values([3, 3, 3], vec![Some(0.0); 27]);
        grid.set([1, 1, 1], Some(27.0));
        let smoothed = smooth(&grid, [1.0, 1.0, 1.0]);
        assert!(smoothed.get([0, 1, 1]).unwrap() > 0.0);
        assert!(smoothed.get([1, 0, 1]).unwrap() > 0.0);
        assert!(smoothed.get([1, 1, 0]).unwrap() > 0.0);
        assert_eq!(smoothed.argmax_cells(), vec![[1, 1, 1]]);
    }
}
