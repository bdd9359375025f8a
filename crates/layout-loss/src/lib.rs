//! Composite training loss for layout-prediction segmentation networks.
//!
//! The crate provides the three loss terms used for layout segmentation
//! training and a module that composes them into one backpropagatable scalar
//! with a per-term breakdown:
//!
//! - [`ClassificationLoss`]: pixel-wise negative log-likelihood over 2D class
//!   predictions, with optional per-class rebalancing weights
//! - [`SegAreaLoss`]: L1 between raw class scores and the one-hot
//!   ground-truth layout (area regularization)
//! - [`LaplacianEdgeLoss`]: masked MSE over thresholded responses of a fixed
//!   dilated Laplacian convolution (edge consistency)
//! - [`LayoutLoss`]: the weighted combination, returning the total together
//!   with a name-to-value breakdown map for the training loop to log
//!
//! All modules are generic over the Burn [`Backend`] and configured through
//! Burn's `Config` derive.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use burn::prelude::*;
//! use layout_loss::LayoutLossConfig;
//!
//! # fn example<B: burn::tensor::backend::Backend>(device: &B::Device) {
//! let loss = LayoutLossConfig::new()
//!     .with_l1_weight(0.1)
//!     .with_edge_weight(0.1)
//!     .init::<B>(device);
//!
//! // score: [N, C, H, W] logits, pred: [N, H, W] prediction map,
//! // gt_layout: [N, H, W] class indices, gt_edge: [N, H, W] edge map.
//! # let (score, pred, gt_layout, gt_edge) = unimplemented!();
//! let (total, terms) = loss.forward(score, pred, gt_layout, gt_edge);
//! # }
//! ```
//!
//! [`Backend`]: burn::tensor::backend::Backend

mod classification;
mod edge;
mod layout_loss;
mod seg_area;

pub use classification::{ClassificationLoss, ClassificationLossConfig};
pub use edge::{LaplacianEdgeLoss, LaplacianEdgeLossConfig};
pub use layout_loss::{EdgeObserver, LayoutLoss, LayoutLossConfig};
pub use seg_area::{one_hot_layout, SegAreaLoss, SegAreaLossConfig};
