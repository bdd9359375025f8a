//! Composite layout loss combining classification, area, and edge terms.
//!
//! The total loss is:
//! ```text
//! loss = classification + l1_weight * seg_area + edge_weight * edge
//! ```
//! where `seg_area` and `edge` are computed only when their weight is
//! non-zero. Alongside the backpropagatable total, every call produces a
//! breakdown map holding the raw (unweighted) value of each computed term
//! plus the combined `loss`, for the training loop to log.

use std::collections::HashMap;

use burn::{
    config::Config,
    module::{Content, DisplaySettings, Module, ModuleDisplay},
    nn::loss::Reduction,
    tensor::{backend::Backend, cast::ToElement, Int, Tensor},
};

use crate::{
    classification::{ClassificationLoss, ClassificationLossConfig},
    edge::{LaplacianEdgeLoss, LaplacianEdgeLossConfig},
    seg_area::{SegAreaLoss, SegAreaLossConfig},
};

/// Observer invoked with the thresholded edge response map, or with `None`
/// when the edge term is disabled. A side channel for visualization and
/// logging, not part of the loss math.
pub type EdgeObserver<'a, B> = &'a mut dyn FnMut(Option<Tensor<B, 3>>);

/// Configuration for creating a [Layout loss](LayoutLoss).
#[derive(Config, Debug)]
pub struct LayoutLossConfig {
    /// Scale of the area-regularization term. Zero disables the term,
    /// a negative value inverts it. Default: 0.1
    #[config(default = 0.1)]
    pub l1_weight: f64,

    /// Scale of the edge-consistency term. Zero disables the term,
    /// a negative value inverts it. Default: 0.1
    #[config(default = 0.1)]
    pub edge_weight: f64,

    /// Per-class rebalancing weights for the classification term.
    pub class_weights: Option<Vec<f32>>,
}

impl LayoutLossConfig {
    /// Initialize [Layout loss](LayoutLoss).
    ///
    /// All three criteria are constructed up front; the scalar weights are
    /// consulted per call to decide which terms run.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LayoutLoss<B> {
        LayoutLoss {
            l1_weight: self.l1_weight,
            edge_weight: self.edge_weight,
            classification: ClassificationLossConfig::new()
                .with_class_weights(self.class_weights.clone())
                .init(device),
            seg_area: SegAreaLossConfig::new().init(),
            edge: LaplacianEdgeLossConfig::new().init(device),
        }
    }
}

/// Composite loss for layout-prediction segmentation training.
#[derive(Module, Debug)]
#[module(custom_display)]
pub struct LayoutLoss<B: Backend> {
    /// Scale of the area-regularization term.
    pub l1_weight: f64,
    /// Scale of the edge-consistency term.
    pub edge_weight: f64,
    /// Pixel-wise classification criterion. Always evaluated.
    pub classification: ClassificationLoss<B>,
    /// Area-regularization criterion. Evaluated when `l1_weight != 0`.
    pub seg_area: SegAreaLoss,
    /// Edge-consistency criterion. Evaluated when `edge_weight != 0`.
    pub edge: LaplacianEdgeLoss<B>,
}

impl<B: Backend> ModuleDisplay for LayoutLoss<B> {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("l1_weight", &self.l1_weight)
            .add("edge_weight", &self.edge_weight)
            .optional()
    }
}

impl<B: Backend> LayoutLoss<B> {
    /// Create a new layout loss with default configuration.
    pub fn new(device: &B::Device) -> Self {
        LayoutLossConfig::new().init(device)
    }

    /// Compute the composite loss.
    ///
    /// # Shapes
    ///
    /// - score: `[batch_size, num_classes, height, width]` (logits)
    /// - pred: `[batch_size, height, width]` (single-channel prediction map)
    /// - gt_layout: `[batch_size, height, width]` (class indices)
    /// - gt_edge: `[batch_size, height, width]`
    ///
    /// # Returns
    ///
    /// The combined loss as a `[1]` tensor plus the breakdown map with the
    /// raw value of each computed term under `classification`, `seg_area`
    /// and `edge`, and the combined value under `loss`.
    pub fn forward(
        &self,
        score: Tensor<B, 4>,
        pred: Tensor<B, 3>,
        gt_layout: Tensor<B, 3, Int>,
        gt_edge: Tensor<B, 3>,
    ) -> (Tensor<B, 1>, HashMap<String, f64>) {
        self.forward_with_observer(score, pred, gt_layout, gt_edge, None)
    }

    /// Compute the composite loss, reporting the edge response map to an
    /// observer.
    ///
    /// The observer fires exactly once per call: with `Some(response)` when
    /// the edge term runs, with `None` when `edge_weight` is zero and the
    /// term is skipped. Observers must tolerate the missing map.
    pub fn forward_with_observer(
        &self,
        score: Tensor<B, 4>,
        pred: Tensor<B, 3>,
        gt_layout: Tensor<B, 3, Int>,
        gt_edge: Tensor<B, 3>,
        mut observer: Option<EdgeObserver<'_, B>>,
    ) -> (Tensor<B, 1>, HashMap<String, f64>) {
        let mut terms = HashMap::new();

        let classification = self
            .classification
            .forward(score.clone(), gt_layout.clone());
        terms.insert(
            "classification".to_owned(),
            classification.clone().into_scalar().to_f64(),
        );
        let mut total = classification;

        if self.l1_weight != 0.0 {
            let seg_area = self.seg_area.forward(score, gt_layout, Reduction::Mean);
            terms.insert("seg_area".to_owned(), seg_area.clone().into_scalar().to_f64());
            total = total + seg_area.mul_scalar(self.l1_weight);
        }

        if self.edge_weight != 0.0 {
            let response = self.edge.response_map(pred);
            let edge = self.edge.masked_mse(response.clone(), gt_edge);
            terms.insert("edge".to_owned(), edge.clone().into_scalar().to_f64());
            total = total + edge.mul_scalar(self.edge_weight);

            if let Some(observer) = observer.as_mut() {
                observer(Some(response));
            }
        } else if let Some(observer) = observer.as_mut() {
            observer(None);
        }

        terms.insert("loss".to_owned(), total.clone().into_scalar().to_f64());

        (total, terms)
    }
}
