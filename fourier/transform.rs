//! Whitening transforms between grid realizations and Fourier-domain white
//! noise.
//!
//! A stationary Gaussian process realization `y` on a regular grid and an
//! unconstrained white noise vector `z` are related by an exact bijection:
//! `y = irfft(pack(z) * scale) + loc` and `z = unpack(rfft(y - loc) / scale)`,
//! where `scale` is the per-frequency standard deviation of the Fourier
//! coefficients. Under the covariance used to derive the scale, `z` is
//! standard normal.

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis, Zip};
use rayon::prelude::*;

use crate::backend::SpectralBackend;
use crate::codec::{pack_rfft, pack_rfft2, unpack_rfft, unpack_rfft2};
use crate::scale::{ScaleError, resolve_rfft2_scale, resolve_rfft_scale};

/// Transform Fourier-domain white noise to a Gaussian process realization on
/// a grid of `z.len()` points. Exactly one of `cov` and `rfft_scale` must be
/// given.
pub fn transform_irfft<B: SpectralBackend>(
    backend: &B,
    z: ArrayView1<'_, f64>,
    loc: ArrayView1<'_, f64>,
    cov: Option<ArrayView1<'_, f64>>,
    rfft_scale: Option<ArrayView1<'_, f64>>,
) -> Result<Array1<f64>, ScaleError> {
    let scale = resolve_rfft_scale(backend, z.len(), cov, rfft_scale)?;
    Ok(irfft_with_scale(backend, z, loc, &scale))
}

/// Transform a Gaussian process realization to Fourier-domain white noise.
/// Exact inverse of [`transform_irfft`] for a matching scale.
pub fn transform_rfft<B: SpectralBackend>(
    backend: &B,
    y: ArrayView1<'_, f64>,
    loc: ArrayView1<'_, f64>,
    cov: Option<ArrayView1<'_, f64>>,
    rfft_scale: Option<ArrayView1<'_, f64>>,
) -> Result<Array1<f64>, ScaleError> {
    let scale = resolve_rfft_scale(backend, y.len(), cov, rfft_scale)?;
    Ok(rfft_with_scale(backend, y, loc, &scale))
}

/// 2D analogue of [`transform_irfft`].
pub fn transform_irfft2<B: SpectralBackend>(
    backend: &B,
    z: ArrayView2<'_, f64>,
    loc: ArrayView2<'_, f64>,
    cov: Option<ArrayView2<'_, f64>>,
    rfft2_scale: Option<ArrayView2<'_, f64>>,
) -> Result<Array2<f64>, ScaleError> {
    let scale = resolve_rfft2_scale(backend, z.dim(), cov, rfft2_scale)?;
    Ok(irfft2_with_scale(backend, z, loc, &scale))
}

/// 2D analogue of [`transform_rfft`].
pub fn transform_rfft2<B: SpectralBackend>(
    backend: &B,
    y: ArrayView2<'_, f64>,
    loc: ArrayView2<'_, f64>,
    cov: Option<ArrayView2<'_, f64>>,
    rfft2_scale: Option<ArrayView2<'_, f64>>,
) -> Result<Array2<f64>, ScaleError> {
    let scale = resolve_rfft2_scale(backend, y.dim(), cov, rfft2_scale)?;
    Ok(rfft2_with_scale(backend, y, loc, &scale))
}

pub(crate) fn irfft_with_scale<B: SpectralBackend>(
    backend: &B,
    z: ArrayView1<'_, f64>,
    loc: ArrayView1<'_, f64>,
    scale: &Array1<f64>,
) -> Array1<f64> {
    let mut coefficients = pack_rfft(z);
    Zip::from(&mut coefficients)
        .and(scale)
        .for_each(|c, &s| *c *= s);
    backend.irfft(coefficients.view(), z.len()) + &loc
}

pub(crate) fn rfft_with_scale<B: SpectralBackend>(
    backend: &B,
    y: ArrayView1<'_, f64>,
    loc: ArrayView1<'_, f64>,
    scale: &Array1<f64>,
) -> Array1<f64> {
    let centered = &y - &loc;
    let mut spectrum = backend.rfft(centered.view());
    Zip::from(&mut spectrum)
        .and(scale)
        .for_each(|c, &s| *c /= s);
    unpack_rfft(spectrum.view(), y.len())
}

pub(crate) fn irfft2_with_scale<B: SpectralBackend>(
    backend: &B,
    z: ArrayView2<'_, f64>,
    loc: ArrayView2<'_, f64>,
    scale: &Array2<f64>,
) -> Array2<f64> {
    let mut coefficients = pack_rfft2(z);
    Zip::from(&mut coefficients)
        .and(scale)
        .for_each(|c, &s| *c *= s);
    backend.irfft2(coefficients.view(), z.dim()) + &loc
}

pub(crate) fn rfft2_with_scale<B: SpectralBackend>(
    backend: &B,
    y: ArrayView2<'_, f64>,
    loc: ArrayView2<'_, f64>,
    scale: &Array2<f64>,
) -> Array2<f64> {
    let centered = &y - &loc;
    let mut spectrum = backend.rfft2(centered.view());
    Zip::from(&mut spectrum)
        .and(scale)
        .for_each(|c, &s| *c /= s);
    unpack_rfft2(spectrum.view(), y.dim())
}

/// Batched [`transform_irfft`] over the leading axis. The scale is resolved
/// once and shared across the batch; rows are processed in parallel.
pub fn transform_irfft_batch<B: SpectralBackend>(
    backend: &B,
    z: ArrayView2<'_, f64>,
    loc: ArrayView2<'_, f64>,
    cov: Option<ArrayView1<'_, f64>>,
    rfft_scale: Option<ArrayView1<'_, f64>>,
) -> Result<Array2<f64>, ScaleError> {
    assert_eq!(z.dim(), loc.dim(), "white noise and mean must share a shape");
    let scale = resolve_rfft_scale(backend, z.ncols(), cov, rfft_scale)?;
    let mut out = Array2::zeros(z.raw_dim());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(z.axis_iter(Axis(0)).into_par_iter())
        .zip(loc.axis_iter(Axis(0)).into_par_iter())
        .for_each(|((mut orow, zrow), lrow)| {
            orow.assign(&irfft_with_scale(backend, zrow, lrow, &scale));
        });
    Ok(out)
}

/// Batched [`transform_rfft`] over the leading axis.
pub fn transform_rfft_batch<B: SpectralBackend>(
    backend: &B,
    y: ArrayView2<'_, f64>,
    loc: ArrayView2<'_, f64>,
    cov: Option<ArrayView1<'_, f64>>,
    rfft_scale: Option<ArrayView1<'_, f64>>,
) -> Result<Array2<f64>, ScaleError> {
    assert_eq!(y.dim(), loc.dim(), "realization and mean must share a shape");
    let scale = resolve_rfft_scale(backend, y.ncols(), cov, rfft_scale)?;
    let mut out = Array2::zeros(y.raw_dim());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(y.axis_iter(Axis(0)).into_par_iter())
        .zip(loc.axis_iter(Axis(0)).into_par_iter())
        .for_each(|((mut orow, yrow), lrow)| {
            orow.assign(&rfft_with_scale(backend, yrow, lrow, &scale));
        });
    Ok(out)
}

/// Batched [`transform_irfft2`] over the leading axis.
pub fn transform_irfft2_batch<B: SpectralBackend>(
    backend: &B,
    z: ArrayView3<'_, f64>,
    loc: ArrayView3<'_, f64>,
    cov: Option<ArrayView2<'_, f64>>,
    rfft2_scale: Option<ArrayView2<'_, f64>>,
) -> Result<Array3<f64>, ScaleError> {
    assert_eq!(z.dim(), loc.dim(), "white noise and mean must share a shape");
    let shape = (z.dim().1, z.dim().2);
    let scale = resolve_rfft2_scale(backend, shape, cov, rfft2_scale)?;
    let mut out = Array3::zeros(z.raw_dim());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(z.axis_iter(Axis(0)).into_par_iter())
        .zip(loc.axis_iter(Axis(0)).into_par_iter())
        .for_each(|((mut oplane, zplane), lplane)| {
            oplane.assign(&irfft2_with_scale(backend, zplane, lplane, &scale));
        });
    Ok(out)
}

/// Batched [`transform_rfft2`] over the leading axis.
pub fn transform_rfft2_batch<B: SpectralBackend>(
    backend: &B,
    y: ArrayView3<'_, f64>,
    loc: ArrayView3<'_, f64>,
    cov: Option<ArrayView2<'_, f64>>,
    rfft2_scale: Option<ArrayView2<'_, f64>>,
) -> Result<Array3<f64>, ScaleError> {
    assert_eq!(y.dim(), loc.dim(), "realization and mean must share a shape");
    let shape = (y.dim().1, y.dim().2);
    let scale = resolve_rfft2_scale(backend, shape, cov, rfft2_scale)?;
    let mut out = Array3::zeros(y.raw_dim());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(y.axis_iter(Axis(0)).into_par_iter())
        .zip(loc.axis_iter(Axis(0)).into_par_iter())
        .for_each(|((mut oplane, yplane), lplane)| {
            oplane.assign(&rfft2_with_scale(backend, yplane, lplane, &scale));
        });
    Ok(out)
}
