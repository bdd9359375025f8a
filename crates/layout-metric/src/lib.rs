//! Training metrics for layout segmentation losses.
//!
//! Adapts the output of a layout loss evaluation to Burn's training metric
//! system: [`LayoutLossInput`] carries the combined loss and the per-term
//! breakdown from the loss to the trainer, [`LossMetric`] tracks the
//! combined value and [`LossTermMetric`] tracks any named term.
//!
//! ```rust,ignore
//! use layout_metric::{LayoutLossInput, LossMetric, LossTermMetric};
//!
//! let (total, terms) = layout_loss.forward(score, pred, gt_layout, gt_edge);
//! let input = LayoutLossInput::new(total, terms, batch_size);
//!
//! loss_metric.update(&input, &metadata);
//! edge_metric.update(&input, &metadata);
//! ```

mod input;
mod loss;

pub use input::LayoutLossInput;
pub use loss::{LossMetric, LossTermMetric};

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    pub type TestBackend = NdArray;
}
