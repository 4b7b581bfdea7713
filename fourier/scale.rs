//! Per-frequency scales of Fourier coefficients and argument resolution.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use thiserror::Error;

use crate::backend::SpectralBackend;
use crate::codec::{is_even, rfft_len};

const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Contract violations raised when resolving the scale arguments of a call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScaleError {
    #[error("exactly one of the covariance and the precomputed scale must be given")]
    InvalidArgumentCombination,

    #[error("array has trailing dimension {actual}, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
}

/// Evaluate the scale of Fourier coefficients of a stationary process on a
/// grid of `size` points, from exactly one of:
///
/// - `cov`: covariance between the first grid point and the rest of the grid,
///   with `size` elements;
/// - `rfft`: the real part of the covariance's real FFT, with `size / 2 + 1`
///   elements, paired with `size`.
///
/// The scale is `sqrt(size * rfft / 2)` with the zero-frequency entry
/// multiplied by `sqrt(2)` and, for even `size`, the Nyquist entry likewise.
/// Those coefficients are real-valued and carry their variance in a single
/// real degree of freedom instead of a real and an imaginary part.
pub fn evaluate_rfft_scale<B: SpectralBackend>(
    backend: &B,
    cov: Option<ArrayView1<'_, f64>>,
    rfft: Option<(ArrayView1<'_, f64>, usize)>,
) -> Result<Array1<f64>, ScaleError> {
    let (rfft, size) = match (cov, rfft) {
        (Some(cov), None) => (backend.rfft(cov).mapv(|c| c.re), cov.len()),
        (None, Some((rfft, size))) => {
            if rfft.len() != rfft_len(size) {
                return Err(ScaleError::ShapeMismatch {
                    expected: rfft_len(size),
                    actual: rfft.len(),
                });
            }
            (rfft.to_owned(), size)
        }
        _ => return Err(ScaleError::InvalidArgumentCombination),
    };
    let mut scale = rfft.mapv(|r| (size as f64 * r / 2.0).sqrt());
    scale[0] *= SQRT_2;
    if is_even(size) {
        let nyquist = scale.len() - 1;
        scale[nyquist] *= SQRT_2;
    }
    Ok(scale)
}

/// Evaluate the scale of 2D Fourier coefficients from the covariance between
/// the first grid point and the rest of a `height x width` grid.
///
/// The 2D real FFT is a row-wise real FFT followed by a column-wise full FFT.
/// The row transform leaves a real first column and, for even width, a real
/// Nyquist column; the column transform then leaves real-only coefficients at
/// the zero-frequency row of those columns and, for even height, at their
/// Nyquist row. Each such lattice position gets the same real-only variance
/// correction as in 1D. The doubling happens before the final square root, so
/// the factor is `2` rather than `sqrt(2)`.
pub fn evaluate_rfft2_scale<B: SpectralBackend>(
    backend: &B,
    cov: ArrayView2<'_, f64>,
) -> Array2<f64> {
    let (height, width) = cov.dim();
    let size = (height * width) as f64;
    let mut scale = backend.rfft2(cov).mapv(|c| size * c.re / 2.0);
    scale[[0, 0]] *= 2.0;
    if is_even(width) {
        scale[[0, width / 2]] *= 2.0;
    }
    if is_even(height) {
        scale[[height / 2, 0]] *= 2.0;
    }
    if is_even(height) && is_even(width) {
        scale[[height / 2, width / 2]] *= 2.0;
    }
    scale.mapv_inplace(f64::sqrt);
    scale
}

/// Resolve the exactly-one-of contract shared by every transform and
/// log-probability entry point: either a covariance row of `size` elements or
/// a precomputed scale of `size / 2 + 1` elements, never both and never
/// neither.
pub fn resolve_rfft_scale<B: SpectralBackend>(
    backend: &B,
    size: usize,
    cov: Option<ArrayView1<'_, f64>>,
    rfft_scale: Option<ArrayView1<'_, f64>>,
) -> Result<Array1<f64>, ScaleError> {
    match (cov, rfft_scale) {
        (Some(cov), None) => {
            if cov.len() != size {
                return Err(ScaleError::ShapeMismatch {
                    expected: size,
                    actual: cov.len(),
                });
            }
            log::debug!("evaluating rfft scale from covariance, size {size}");
            evaluate_rfft_scale(backend, Some(cov), None)
        }
        (None, Some(scale)) => {
            if scale.len() != rfft_len(size) {
                return Err(ScaleError::ShapeMismatch {
                    expected: rfft_len(size),
                    actual: scale.len(),
                });
            }
            Ok(scale.to_owned())
        }
        _ => Err(ScaleError::InvalidArgumentCombination),
    }
}

/// 2D analogue of [`resolve_rfft_scale`]: either a covariance block matching
/// the grid shape or a precomputed scale of shape `height x (width / 2 + 1)`.
pub fn resolve_rfft2_scale<B: SpectralBackend>(
    backend: &B,
    shape: (usize, usize),
    cov: Option<ArrayView2<'_, f64>>,
    rfft2_scale: Option<ArrayView2<'_, f64>>,
) -> Result<Array2<f64>, ScaleError> {
    let (height, width) = shape;
    match (cov, rfft2_scale) {
        (Some(cov), None) => {
            if cov.ncols() != width {
                return Err(ScaleError::ShapeMismatch {
                    expected: width,
                    actual: cov.ncols(),
                });
            }
            if cov.nrows() != height {
                return Err(ScaleError::ShapeMismatch {
                    expected: height,
                    actual: cov.nrows(),
                });
            }
            log::debug!("evaluating rfft2 scale from covariance, shape {height}x{width}");
            Ok(evaluate_rfft2_scale(backend, cov))
        }
        (None, Some(scale)) => {
            if scale.ncols() != rfft_len(width) {
                return Err(ScaleError::ShapeMismatch {
                    expected: rfft_len(width),
                    actual: scale.ncols(),
                });
            }
            if scale.nrows() != height {
                return Err(ScaleError::ShapeMismatch {
                    expected: height,
                    actual: scale.nrows(),
                });
            }
            Ok(scale.to_owned())
        }
        _ => Err(ScaleError::InvalidArgumentCombination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RealFftBackend;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    #[test]
    fn scale_for_even_grid_rescales_zero_and_nyquist_entries() {
        let backend = RealFftBackend::new();
        let cov = array![1.0, 0.5, 0.2, 0.5];
        let scale = evaluate_rfft_scale(&backend, Some(cov.view()), None).unwrap();
        assert_eq!(scale.len(), 3);
        // rfft(cov).re = [2.2, 0.8, 0.2]; sqrt(4 * rfft / 2) then sqrt(2) on
        // the real-only entries.
        assert_abs_diff_eq!(scale[0], 8.8_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(scale[1], 1.6_f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(scale[2], 0.8_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn scale_for_odd_grid_rescales_only_the_zero_entry() {
        let backend = RealFftBackend::new();
        let cov = array![1.0, 0.6, 0.2, 0.2, 0.6];
        let scale = evaluate_rfft_scale(&backend, Some(cov.view()), None).unwrap();
        assert_eq!(scale.len(), 3);
        let rfft = backend.rfft(cov.view()).mapv(|c| c.re);
        assert_abs_diff_eq!(scale[0], (5.0 * rfft[0]).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(scale[1], (5.0 * rfft[1] / 2.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(scale[2], (5.0 * rfft[2] / 2.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn scale_from_precomputed_rfft_matches_scale_from_covariance() {
        let backend = RealFftBackend::new();
        let cov = array![1.0, 0.5, 0.2, 0.5];
        let rfft = backend.rfft(cov.view()).mapv(|c| c.re);
        let from_cov = evaluate_rfft_scale(&backend, Some(cov.view()), None).unwrap();
        let from_rfft = evaluate_rfft_scale(&backend, None, Some((rfft.view(), 4))).unwrap();
        assert_abs_diff_eq!(from_cov, from_rfft, epsilon = 1e-12);
    }

    #[test]
    fn scale_is_positive_for_positive_definite_covariance() {
        let backend = RealFftBackend::new();
        let cov = array![1.0, 0.5, 0.2, 0.5];
        let scale = evaluate_rfft_scale(&backend, Some(cov.view()), None).unwrap();
        assert!(scale.iter().all(|&s| s > 0.0));
    }

    #[test]
    fn rfft2_scale_doubles_the_real_only_lattice_positions() {
        let backend = RealFftBackend::new();
        // Separable covariance: the 2D spectrum is the outer product of the
        // two 1D spectra, so every entry can be checked directly.
        let row = array![1.0, 0.5, 0.2, 0.5];
        let col = array![1.0, 0.4, 0.1, 0.4];
        let cov = Array2::from_shape_fn((4, 4), |(i, j)| col[i] * row[j]);
        let scale = evaluate_rfft2_scale(&backend, cov.view());
        assert_eq!(scale.dim(), (4, 3));
        let srow = backend.rfft(row.view()).mapv(|c| c.re);
        let scol = backend.rfft(col.view()).mapv(|c| c.re);
        let base = |i: usize, j: usize| (16.0 * scol[i] * srow[j] / 2.0).sqrt();
        assert_abs_diff_eq!(scale[[0, 0]], base(0, 0) * 2.0_f64.sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(scale[[0, 2]], base(0, 2) * 2.0_f64.sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(scale[[2, 0]], base(2, 0) * 2.0_f64.sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(scale[[2, 2]], base(2, 2) * 2.0_f64.sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(scale[[1, 1]], base(1, 1), epsilon = 1e-10);
        assert_abs_diff_eq!(scale[[3, 1]], base(1, 1), epsilon = 1e-10);
    }

    #[test]
    fn both_and_neither_arguments_are_rejected() {
        let backend = RealFftBackend::new();
        let cov = array![1.0, 0.5, 0.2, 0.5];
        let scale = array![1.0, 1.0, 1.0];
        assert_eq!(
            resolve_rfft_scale(&backend, 4, Some(cov.view()), Some(scale.view())),
            Err(ScaleError::InvalidArgumentCombination)
        );
        assert_eq!(
            resolve_rfft_scale(&backend, 4, None, None),
            Err(ScaleError::InvalidArgumentCombination)
        );
        assert_eq!(
            evaluate_rfft_scale(&backend, Some(cov.view()), Some((scale.view(), 4))),
            Err(ScaleError::InvalidArgumentCombination)
        );
        let cov2 = Array2::from_elem((2, 2), 1.0);
        let scale2 = Array2::from_elem((2, 2), 1.0);
        assert_eq!(
            resolve_rfft2_scale(&backend, (2, 2), Some(cov2.view()), Some(scale2.view())),
            Err(ScaleError::InvalidArgumentCombination)
        );
        assert_eq!(
            resolve_rfft2_scale(&backend, (2, 2), None, None),
            Err(ScaleError::InvalidArgumentCombination)
        );
    }

    #[test]
    fn wrong_scale_length_is_rejected() {
        let backend = RealFftBackend::new();
        let short = array![1.0, 1.0];
        assert_eq!(
            resolve_rfft_scale(&backend, 4, None, Some(short.view())),
            Err(ScaleError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        );
        let bad = Array2::from_elem((3, 4), 1.0);
        assert_eq!(
            resolve_rfft2_scale(&backend, (3, 4), None, Some(bad.view())),
            Err(ScaleError::ShapeMismatch {
                expected: 3,
                actual: 4
            })
        );
        let bad_rows = Array2::from_elem((2, 3), 1.0);
        assert_eq!(
            resolve_rfft2_scale(&backend, (3, 4), None, Some(bad_rows.view())),
            Err(ScaleError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
