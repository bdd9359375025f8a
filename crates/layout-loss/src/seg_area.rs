//! Segmentation area regularization.
//!
//! Penalizes the raw per-class logits against a one-hot encoding of the
//! ground-truth layout with the mean absolute error. Acts as an area prior:
//! it pushes the score of the true class towards 1 and every other class
//! towards 0 at each pixel.

use burn::{
    config::Config,
    module::Module,
    nn::loss::Reduction,
    tensor::{backend::Backend, Int, Tensor},
};

/// One-hot encode a layout over the class axis.
///
/// # Shapes
///
/// - targets: `[batch_size, height, width]` (class indices)
/// - output: `[batch_size, num_classes, height, width]`
///
/// Exactly one `1.0` per pixel along the class axis, at the index equal to
/// the label value, zero elsewhere.
pub fn one_hot_layout<B: Backend>(
    targets: Tensor<B, 3, Int>,
    num_classes: usize,
) -> Tensor<B, 4> {
    let planes = (0..num_classes)
        .map(|class| {
            targets
                .clone()
                .equal_elem(class as i64)
                .float()
                .unsqueeze_dim::<4>(1)
        })
        .collect();

    Tensor::cat(planes, 1)
}

/// Configuration for creating a [Segmentation area loss](SegAreaLoss).
#[derive(Config, Debug)]
pub struct SegAreaLossConfig {}

impl SegAreaLossConfig {
    /// Initialize [Segmentation area loss](SegAreaLoss).
    pub const fn init(&self) -> SegAreaLoss {
        SegAreaLoss {}
    }
}

/// L1 loss between raw class scores and the one-hot ground-truth layout.
#[derive(Module, Clone, Debug, Default)]
pub struct SegAreaLoss {}

impl SegAreaLoss {
    /// Create a new segmentation area loss.
    pub fn new() -> Self {
        SegAreaLossConfig::new().init()
    }

    /// Compute the criterion on the input tensor with reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, num_classes, height, width]` (logits)
    /// - targets: `[batch_size, height, width]` (class indices)
    /// - output: `[1]`
    pub fn forward<B: Backend>(
        &self,
        predictions: Tensor<B, 4>,
        targets: Tensor<B, 3, Int>,
        reduction: Reduction,
    ) -> Tensor<B, 1> {
        let loss = self.forward_no_reduction(predictions, targets);
        match reduction {
            Reduction::Mean | Reduction::Auto => loss.mean(),
            Reduction::Sum => loss.sum(),
        }
    }

    /// Compute the criterion on the input tensor without reduction.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, num_classes, height, width]` (logits)
    /// - targets: `[batch_size, height, width]` (class indices)
    /// - output: `[batch_size, num_classes, height, width]`
    pub fn forward_no_reduction<B: Backend>(
        &self,
        predictions: Tensor<B, 4>,
        targets: Tensor<B, 3, Int>,
    ) -> Tensor<B, 4> {
        self.assertions(&predictions, &targets);

        let [_, num_classes, _, _] = predictions.dims();
        let one_hot = one_hot_layout(targets, num_classes);

        (predictions - one_hot).abs()
    }

    fn assertions<B: Backend>(&self, predictions: &Tensor<B, 4>, targets: &Tensor<B, 3, Int>) {
        let [pred_batch, _, pred_height, pred_width] = predictions.dims();
        let [target_batch, target_height, target_width] = targets.dims();

        assert_eq!(
            [pred_batch, pred_height, pred_width],
            [target_batch, target_height, target_width],
            "Spatial shape of predictions ([{pred_batch}, {pred_height}, {pred_width}]) must \
             match targets ([{target_batch}, {target_height}, {target_width}])"
        );
    }
}
