//! Backend traits and adapters for the spectral kernels.
//!
//! The engine only needs four operations: forward and inverse real FFTs in one
//! and two dimensions, with NumPy conventions (forward transforms are
//! unnormalized, inverse transforms carry the `1/n` factor). Everything else in
//! the crate is layout bookkeeping on top of these kernels, so the kernels sit
//! behind a strategy trait and the rest of the code never branches on which
//! implementation is active.

use std::sync::{Arc, Mutex};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::{Fft, FftPlanner};

use crate::codec::{expand_rfft, is_even, rfft_len};

pub trait SpectralBackend: Send + Sync {
    /// Forward real FFT: `n` samples to `n / 2 + 1` coefficients.
    fn rfft(&self, x: ArrayView1<'_, f64>) -> Array1<Complex64>;

    /// Inverse real FFT: `size / 2 + 1` coefficients to `size` samples,
    /// normalized by `1 / size`. The imaginary parts of the zero-frequency
    /// coefficient and, for even `size`, the Nyquist coefficient are ignored.
    fn irfft(&self, spectrum: ArrayView1<'_, Complex64>, size: usize) -> Array1<f64>;

    /// Forward 2D real FFT: a row-wise real FFT followed by a column-wise full
    /// FFT, `height x width` samples to `height x (width / 2 + 1)` coefficients.
    fn rfft2(&self, x: ArrayView2<'_, f64>) -> Array2<Complex64>;

    /// Inverse 2D real FFT, normalized by `1 / (height * width)`.
    fn irfft2(&self, spectrum: ArrayView2<'_, Complex64>, shape: (usize, usize)) -> Array2<f64>;
}

/// Default backend: specialized real transforms from `realfft` for the
/// real/complex legs, `rustfft` complex transforms for the 2D column pass.
/// Planners cache plans per length, so repeated calls on the same grid reuse
/// their twiddle tables.
pub struct RealFftBackend {
    real_planner: Mutex<RealFftPlanner<f64>>,
    complex_planner: Mutex<FftPlanner<f64>>,
}

impl RealFftBackend {
    pub fn new() -> Self {
        Self {
            real_planner: Mutex::new(RealFftPlanner::new()),
            complex_planner: Mutex::new(FftPlanner::new()),
        }
    }
}

impl Default for RealFftBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralBackend for RealFftBackend {
    fn rfft(&self, x: ArrayView1<'_, f64>) -> Array1<Complex64> {
        let size = x.len();
        let r2c = self
            .real_planner
            .lock()
            .expect("real FFT planner lock poisoned")
            .plan_fft_forward(size);
        let mut input = x.to_vec();
        let mut spectrum = r2c.make_output_vec();
        r2c.process(&mut input, &mut spectrum)
            .expect("planned real FFT buffers have matching lengths");
        Array1::from_vec(spectrum)
    }

    fn irfft(&self, spectrum: ArrayView1<'_, Complex64>, size: usize) -> Array1<f64> {
        debug_assert_eq!(spectrum.len(), rfft_len(size));
        let c2r = self
            .real_planner
            .lock()
            .expect("real FFT planner lock poisoned")
            .plan_fft_inverse(size);
        let mut buffer = spectrum.to_vec();
        zero_real_only_entries(&mut buffer, size);
        let mut output = c2r.make_output_vec();
        c2r.process(&mut buffer, &mut output)
            .expect("planned inverse real FFT buffers have matching lengths");
        let norm = 1.0 / size as f64;
        Array1::from_iter(output.into_iter().map(|v| v * norm))
    }

    fn rfft2(&self, x: ArrayView2<'_, f64>) -> Array2<Complex64> {
        let mut half = rfft_rows(self, x);
        let fft = self
            .complex_planner
            .lock()
            .expect("complex FFT planner lock poisoned")
            .plan_fft_forward(x.nrows());
        transform_columns(&fft, &mut half);
        half
    }

    fn irfft2(&self, spectrum: ArrayView2<'_, Complex64>, shape: (usize, usize)) -> Array2<f64> {
        let (height, width) = shape;
        debug_assert_eq!(spectrum.dim(), (height, rfft_len(width)));
        let mut half = spectrum.to_owned();
        let ifft = self
            .complex_planner
            .lock()
            .expect("complex FFT planner lock poisoned")
            .plan_fft_inverse(height);
        transform_columns(&ifft, &mut half);
        half.mapv_inplace(|c| c / height as f64);
        irfft_rows(self, &half, width)
    }
}

/// Alternative backend built on `rustfft` alone. The real transforms are
/// derived from the full complex transform by Hermitian truncation and
/// expansion. Interchangeable with [`RealFftBackend`] and cross-checked
/// against it in tests.
pub struct FullFftBackend {
    planner: Mutex<FftPlanner<f64>>,
}

impl FullFftBackend {
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(FftPlanner::new()),
        }
    }

    fn plan(&self, size: usize, forward: bool) -> Arc<dyn Fft<f64>> {
        let mut planner = self.planner.lock().expect("FFT planner lock poisoned");
        if forward {
            planner.plan_fft_forward(size)
        } else {
            planner.plan_fft_inverse(size)
        }
    }
}

impl Default for FullFftBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralBackend for FullFftBackend {
    fn rfft(&self, x: ArrayView1<'_, f64>) -> Array1<Complex64> {
        let size = x.len();
        let mut buffer: Vec<Complex64> = x.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.plan(size, true).process(&mut buffer);
        buffer.truncate(rfft_len(size));
        Array1::from_vec(buffer)
    }

    fn irfft(&self, spectrum: ArrayView1<'_, Complex64>, size: usize) -> Array1<f64> {
        debug_assert_eq!(spectrum.len(), rfft_len(size));
        let mut half = spectrum.to_vec();
        zero_real_only_entries(&mut half, size);
        let full = expand_rfft(ArrayView1::from(&half), size);
        let mut buffer = full.to_vec();
        self.plan(size, false).process(&mut buffer);
        let norm = 1.0 / size as f64;
        Array1::from_iter(buffer.into_iter().map(|c| c.re * norm))
    }

    fn rfft2(&self, x: ArrayView2<'_, f64>) -> Array2<Complex64> {
        let mut half = rfft_rows(self, x);
        let fft = self.plan(x.nrows(), true);
        transform_columns(&fft, &mut half);
        half
    }

    fn irfft2(&self, spectrum: ArrayView2<'_, Complex64>, shape: (usize, usize)) -> Array2<f64> {
        let (height, width) = shape;
        debug_assert_eq!(spectrum.dim(), (height, rfft_len(width)));
        let mut half = spectrum.to_owned();
        let ifft = self.plan(height, false);
        transform_columns(&ifft, &mut half);
        half.mapv_inplace(|c| c / height as f64);
        irfft_rows(self, &half, width)
    }
}

/// Drop the numerical residue on the entries that must be real before handing
/// a half spectrum to an inverse real transform.
fn zero_real_only_entries(spectrum: &mut [Complex64], size: usize) {
    spectrum[0].im = 0.0;
    if is_even(size) {
        let last = spectrum.len() - 1;
        spectrum[last].im = 0.0;
    }
}

/// Row-wise forward real FFT of a real matrix.
fn rfft_rows<B: SpectralBackend + ?Sized>(backend: &B, x: ArrayView2<'_, f64>) -> Array2<Complex64> {
    let (height, width) = x.dim();
    let mut out = Array2::zeros((height, rfft_len(width)));
    for (mut orow, xrow) in out.axis_iter_mut(Axis(0)).zip(x.axis_iter(Axis(0))) {
        orow.assign(&backend.rfft(xrow));
    }
    out
}

/// Row-wise inverse real FFT of a half spectrum.
fn irfft_rows<B: SpectralBackend + ?Sized>(
    backend: &B,
    half: &Array2<Complex64>,
    width: usize,
) -> Array2<f64> {
    let height = half.nrows();
    let mut out = Array2::zeros((height, width));
    for (mut orow, srow) in out.axis_iter_mut(Axis(0)).zip(half.axis_iter(Axis(0))) {
        orow.assign(&backend.irfft(srow, width));
    }
    out
}

/// In-place full FFT of every column, with the plan supplied by the caller.
fn transform_columns(fft: &Arc<dyn Fft<f64>>, data: &mut Array2<Complex64>) {
    let height = data.nrows();
    let mut buffer = vec![Complex64::new(0.0, 0.0); height];
    for j in 0..data.ncols() {
        for (b, v) in buffer.iter_mut().zip(data.column(j)) {
            *b = *v;
        }
        fft.process(&mut buffer);
        for (v, b) in data.column_mut(j).iter_mut().zip(&buffer) {
            *v = *b;
        }
    }
}
