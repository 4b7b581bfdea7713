//! Lossless codecs between complex real-FFT coefficients and flat real vectors.
//!
//! A real signal of length `n` has `n / 2 + 1` non-redundant Fourier
//! coefficients. The zero-frequency coefficient is always real, the Nyquist
//! coefficient is real when `n` is even, and the remaining `(n - 1) / 2`
//! coefficients are strictly complex. Packing and unpacking move between the
//! complex half spectrum and a real vector carrying exactly the same `n`
//! degrees of freedom: the real parts of every coefficient first, then the
//! imaginary parts of the strictly complex block.
//!
//! In two dimensions the half spectrum has shape `height x (width / 2 + 1)`.
//! Its first column is itself the real FFT of a real column (the row-wise
//! transform has a real zero-frequency column), so it is routed through the 1D
//! codec; the same holds for the column at `width / 2` when the width is even.
//! Interior columns are strictly complex and contribute their real and
//! imaginary parts as separate blocks.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip, concatenate, s};
use num_complex::Complex64;

/// Whether a grid dimension carries a real-valued Nyquist coefficient.
#[inline]
pub fn is_even(size: usize) -> bool {
    size % 2 == 0
}

/// Number of non-redundant coefficients of a length-`size` real FFT.
#[inline]
pub fn rfft_len(size: usize) -> usize {
    size / 2 + 1
}

/// Number of strictly complex coefficients of a length-`size` real FFT.
#[inline]
pub fn ncomplex(size: usize) -> usize {
    (size - 1) / 2
}

/// Unpack `size / 2 + 1` complex coefficients into a real vector of `size`
/// elements: all real parts, then the imaginary parts of the strictly complex
/// coefficients at indices `1..=(size - 1) / 2`.
pub fn unpack_rfft(z: ArrayView1<'_, Complex64>, size: usize) -> Array1<f64> {
    debug_assert_eq!(z.len(), rfft_len(size));
    let nc = ncomplex(size);
    concatenate![
        Axis(0),
        z.mapv(|c| c.re),
        z.slice(s![1..nc + 1]).mapv(|c| c.im)
    ]
}

/// Pack a real vector of `size` elements into `size / 2 + 1` complex
/// coefficients ready for an inverse real FFT. Inverse of [`unpack_rfft`]. The
/// imaginary parts of the zero-frequency coefficient and, for even `size`, the
/// Nyquist coefficient are exactly zero.
pub fn pack_rfft(z: ArrayView1<'_, f64>) -> Array1<Complex64> {
    let size = z.len();
    let half = rfft_len(size);
    let mut packed = z.slice(s![..half]).mapv(|re| Complex64::new(re, 0.0));
    for (k, &im) in z.slice(s![half..]).iter().enumerate() {
        packed[k + 1].im = im;
    }
    packed
}

/// Expand a half spectrum of `size / 2 + 1` coefficients to the full
/// Hermitian-symmetric spectrum of `size` coefficients by appending the
/// conjugate-reversed strictly complex block.
pub fn expand_rfft(rfft: ArrayView1<'_, Complex64>, size: usize) -> Array1<Complex64> {
    debug_assert_eq!(rfft.len(), rfft_len(size));
    let nc = ncomplex(size);
    concatenate![
        Axis(0),
        rfft,
        rfft.slice(s![1..nc + 1; -1]).mapv(|c| c.conj())
    ]
}

/// Unpack a 2D half spectrum of shape `height x (width / 2 + 1)` into a real
/// matrix of shape `height x width`. Column layout: the unpacked first column,
/// the real parts of the interior columns `1..=(width - 1) / 2`, their
/// imaginary parts, and the unpacked Nyquist column when the width is even.
pub fn unpack_rfft2(z: ArrayView2<'_, Complex64>, shape: (usize, usize)) -> Array2<f64> {
    let (height, width) = shape;
    debug_assert_eq!(z.dim(), (height, rfft_len(width)));
    let nc = ncomplex(width);
    let mut out = Array2::zeros((height, width));
    out.column_mut(0)
        .assign(&unpack_rfft(z.slice(s![..rfft_len(height), 0]), height));
    out.slice_mut(s![.., 1..nc + 1])
        .assign(&z.slice(s![.., 1..nc + 1]).mapv(|c| c.re));
    out.slice_mut(s![.., nc + 1..2 * nc + 1])
        .assign(&z.slice(s![.., 1..nc + 1]).mapv(|c| c.im));
    if is_even(width) {
        out.column_mut(width - 1)
            .assign(&unpack_rfft(z.slice(s![..rfft_len(height), width / 2]), height));
    }
    out
}

/// Pack a real matrix of shape `height x width` into a 2D half spectrum of
/// shape `height x (width / 2 + 1)` ready for an inverse 2D real FFT. Inverse
/// of [`unpack_rfft2`]. The first column (and the Nyquist column for even
/// width) is packed with the 1D codec and expanded to the full column
/// spectrum.
pub fn pack_rfft2(z: ArrayView2<'_, f64>) -> Array2<Complex64> {
    let (height, width) = z.dim();
    let nc = ncomplex(width);
    let mut packed = Array2::zeros((height, rfft_len(width)));
    packed
        .column_mut(0)
        .assign(&expand_rfft(pack_rfft(z.column(0)).view(), height));
    Zip::from(packed.slice_mut(s![.., 1..nc + 1]))
        .and(z.slice(s![.., 1..nc + 1]))
        .and(z.slice(s![.., nc + 1..2 * nc + 1]))
        .for_each(|p, &re, &im| *p = Complex64::new(re, im));
    if is_even(width) {
        packed
            .column_mut(width / 2)
            .assign(&expand_rfft(pack_rfft(z.column(width - 1)).view(), height));
    }
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, StandardNormal};

    fn normal_vector(rng: &mut StdRng, len: usize) -> Array1<f64> {
        Array1::from_iter((0..len).map(|_| StandardNormal.sample(rng)))
    }

    #[test]
    fn parity_helpers() {
        assert!(is_even(4));
        assert!(!is_even(5));
        assert_eq!(rfft_len(4), 3);
        assert_eq!(rfft_len(5), 3);
        assert_eq!(ncomplex(4), 1);
        assert_eq!(ncomplex(5), 2);
        assert_eq!(ncomplex(1), 0);
    }

    #[test]
    fn pack_then_unpack_is_identity_1d() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in [1usize, 2, 3, 4, 5, 8, 9] {
            let z = normal_vector(&mut rng, size);
            let packed = pack_rfft(z.view());
            assert_eq!(packed.len(), rfft_len(size));
            let unpacked = unpack_rfft(packed.view(), size);
            assert_abs_diff_eq!(z, unpacked, epsilon = 0.0);
        }
    }

    #[test]
    fn packed_real_only_entries_have_zero_imaginary_part() {
        let mut rng = StdRng::seed_from_u64(8);
        for size in [2usize, 4, 6, 5, 7] {
            let packed = pack_rfft(normal_vector(&mut rng, size).view());
            assert_eq!(packed[0].im, 0.0);
            if is_even(size) {
                assert_eq!(packed[packed.len() - 1].im, 0.0);
            }
        }
    }

    #[test]
    fn expand_rfft_is_hermitian() {
        let mut rng = StdRng::seed_from_u64(9);
        for size in [4usize, 5] {
            let half = pack_rfft(normal_vector(&mut rng, size).view());
            let full = expand_rfft(half.view(), size);
            assert_eq!(full.len(), size);
            for k in 1..size {
                let mirror = full[size - k].conj();
                assert_abs_diff_eq!(full[k].re, mirror.re, epsilon = 0.0);
                assert_abs_diff_eq!(full[k].im, mirror.im, epsilon = 0.0);
            }
        }
    }

    #[test]
    fn pack_then_unpack_is_identity_2d() {
        let mut rng = StdRng::seed_from_u64(10);
        for (height, width) in [
            (2usize, 2usize),
            (2, 3),
            (3, 2),
            (3, 3),
            (4, 4),
            (4, 5),
            (5, 4),
            (1, 3),
        ] {
            let z = Array2::from_shape_fn((height, width), |_| StandardNormal.sample(&mut rng));
            let packed = pack_rfft2(z.view());
            assert_eq!(packed.dim(), (height, rfft_len(width)));
            let unpacked = unpack_rfft2(packed.view(), (height, width));
            assert_abs_diff_eq!(z, unpacked, epsilon = 0.0);
        }
    }

    #[test]
    fn packed_2d_columns_expand_the_1d_codec() {
        let z = array![
            [0.3, -1.1, 0.4, 0.9],
            [1.2, 0.0, -0.7, 0.2],
            [-0.5, 2.0, 0.1, -0.3],
            [0.8, -0.2, 0.6, 1.5],
        ];
        let packed = pack_rfft2(z.view());
        let first = expand_rfft(pack_rfft(z.column(0)).view(), 4);
        let last = expand_rfft(pack_rfft(z.column(3)).view(), 4);
        for i in 0..4 {
            assert_abs_diff_eq!(packed[[i, 0]].re, first[i].re, epsilon = 0.0);
            assert_abs_diff_eq!(packed[[i, 0]].im, first[i].im, epsilon = 0.0);
            assert_abs_diff_eq!(packed[[i, 2]].re, last[i].re, epsilon = 0.0);
            assert_abs_diff_eq!(packed[[i, 2]].im, last[i].im, epsilon = 0.0);
        }
        assert_abs_diff_eq!(packed[[1, 1]].re, z[[1, 1]], epsilon = 0.0);
        assert_abs_diff_eq!(packed[[1, 1]].im, z[[1, 2]], epsilon = 0.0);
    }
}
