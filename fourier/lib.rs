#![deny(dead_code)]
#![deny(unused_imports)]

pub mod backend;
pub mod codec;
pub mod logprob;
pub mod scale;
pub mod transform;

pub use backend::{FullFftBackend, RealFftBackend, SpectralBackend};
pub use codec::{expand_rfft, pack_rfft, pack_rfft2, unpack_rfft, unpack_rfft2};
pub use logprob::{
    evaluate_log_prob_rfft, evaluate_log_prob_rfft2, evaluate_log_prob_rfft2_batch,
    evaluate_log_prob_rfft_batch, evaluate_rfft2_log_abs_det_jacobian,
    evaluate_rfft_log_abs_det_jacobian, log_prob_stdnorm,
};
pub use scale::{
    ScaleError, evaluate_rfft2_scale, evaluate_rfft_scale, resolve_rfft2_scale, resolve_rfft_scale,
};
pub use transform::{
    transform_irfft, transform_irfft2, transform_irfft2_batch, transform_irfft_batch,
    transform_rfft, transform_rfft2, transform_rfft2_batch, transform_rfft_batch,
};
