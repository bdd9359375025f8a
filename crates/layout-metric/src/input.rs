//! Input structure carrying a layout loss evaluation to the metrics.

use std::collections::HashMap;

use burn::{prelude::*, tensor::backend::Backend};
use derive_new::new;

/// One layout-loss evaluation as seen by the training loop.
///
/// The trainer pulls `loss` for backpropagation and the breakdown map for
/// logging; the metrics in this crate consume the same structure.
#[derive(new, Debug, Clone)]
pub struct LayoutLossInput<B: Backend> {
    /// Combined loss, shape `[1]`.
    pub loss: Tensor<B, 1>,
    /// Per-term breakdown: `classification`, `seg_area`, `edge`, `loss`.
    /// Disabled terms are absent.
    pub terms: HashMap<String, f64>,
    /// Batch size for averaging.
    pub batch_size: usize,
}
