//! Pixel-wise classification loss for layout prediction.
//!
//! Applies log-softmax over the class axis of the prediction and evaluates
//! the negative log-likelihood of the ground-truth class at every pixel.
//! An optional per-class weight vector rebalances rare classes; the weighted
//! reduction normalizes by the sum of the applied weights.

use burn::{
    config::Config,
    module::{Content, DisplaySettings, Module, ModuleDisplay},
    tensor::{activation::log_softmax, backend::Backend, Int, Tensor},
};

/// Configuration for creating a [Classification loss](ClassificationLoss).
#[derive(Config, Debug)]
pub struct ClassificationLossConfig {
    /// Per-class rebalancing weights. The order of the vector corresponds
    /// to the label integer assignment. Default: none (all classes equal).
    pub class_weights: Option<Vec<f32>>,
}

impl ClassificationLossConfig {
    /// Initialize [Classification loss](ClassificationLoss).
    pub fn init<B: Backend>(&self, device: &B::Device) -> ClassificationLoss<B> {
        self.assertions();
        ClassificationLoss {
            weights: self
                .class_weights
                .as_ref()
                .map(|w| Tensor::<B, 1>::from_floats(w.as_slice(), device)),
        }
    }

    fn assertions(&self) {
        if let Some(weights) = self.class_weights.as_ref() {
            assert!(
                weights.iter().all(|w| *w > 0.0),
                "Class weights for ClassificationLoss must be positive, got {weights:?}"
            );
        }
    }
}

/// Pixel-wise negative log-likelihood over 2D spatial class predictions.
#[derive(Module, Debug)]
#[module(custom_display)]
pub struct ClassificationLoss<B: Backend> {
    /// Per-class rebalancing weights, length = number of classes.
    pub weights: Option<Tensor<B, 1>>,
}

impl<B: Backend> ModuleDisplay for ClassificationLoss<B> {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content.add("weights", &self.weights).optional()
    }
}

impl<B: Backend> ClassificationLoss<B> {
    /// Create a new classification loss with default configuration.
    pub fn new(device: &B::Device) -> Self {
        ClassificationLossConfig::new().init(device)
    }

    /// Compute the criterion on the input tensor.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, num_classes, height, width]` (logits)
    /// - targets: `[batch_size, height, width]` (class indices)
    /// - output: `[1]`
    pub fn forward(&self, predictions: Tensor<B, 4>, targets: Tensor<B, 3, Int>) -> Tensor<B, 1> {
        self.assertions(&predictions, &targets);

        let [batch_size, num_classes, height, width] = predictions.dims();
        let pixels = batch_size * height * width;

        // [B, C, H, W] -> [B*H*W, C]
        let predictions_2d = predictions
            .reshape([batch_size, num_classes, height * width])
            .permute([0, 2, 1])
            .reshape([pixels, num_classes]);
        let targets_1d = targets.reshape([pixels]);

        let log_probs = log_softmax(predictions_2d, 1);
        let picked = log_probs
            .gather(1, targets_1d.clone().reshape([pixels, 1]))
            .reshape([pixels]);

        match &self.weights {
            Some(weights) => {
                let pixel_weights = weights.clone().gather(0, targets_1d);
                (picked * pixel_weights.clone()).sum().neg() / pixel_weights.sum()
            }
            None => picked.mean().neg(),
        }
    }

    fn assertions(&self, predictions: &Tensor<B, 4>, targets: &Tensor<B, 3, Int>) {
        let [pred_batch, num_classes, pred_height, pred_width] = predictions.dims();
        let [target_batch, target_height, target_width] = targets.dims();

        assert_eq!(
            [pred_batch, pred_height, pred_width],
            [target_batch, target_height, target_width],
            "Spatial shape of predictions ([{pred_batch}, {pred_height}, {pred_width}]) must \
             match targets ([{target_batch}, {target_height}, {target_width}])"
        );

        if let Some(weights) = &self.weights {
            let [weight_len] = weights.dims();
            assert_eq!(
                weight_len, num_classes,
                "Class weight vector length ({weight_len}) must match the number of classes \
                 ({num_classes})"
            );
        }
    }
}
