//! Edge-consistency loss via a fixed Laplacian convolution.
//!
//! Convolves the single-channel prediction map with the 3x3 Laplacian kernel
//! `[[-1,-1,-1],[-1,8,-1],[-1,-1,-1]]` using dilated taps, suppresses
//! small-magnitude responses as numerical noise, and evaluates the mean
//! squared error between the surviving responses and the ground-truth edge
//! map at the same positions.
//!
//! With the default padding and dilation of 4 the convolution reads a 9x9
//! receptive field with holes and preserves the spatial size of its input.

use burn::{
    config::Config,
    module::{Content, DisplaySettings, Module, ModuleDisplay},
    tensor::{backend::Backend, module::conv2d, ops::ConvOptions, Tensor},
};

/// Configuration for creating a [Laplacian edge loss](LaplacianEdgeLoss).
#[derive(Config, Debug)]
pub struct LaplacianEdgeLossConfig {
    /// Zero padding applied on both spatial axes. Default: 4
    #[config(default = 4)]
    pub padding: usize,

    /// Spacing between kernel taps. Default: 4
    #[config(default = 4)]
    pub dilation: usize,

    /// Responses with absolute value strictly below this are treated as
    /// numerical noise and zeroed. Default: 0.1
    #[config(default = 0.1)]
    pub threshold: f64,
}

impl LaplacianEdgeLossConfig {
    /// Initialize [Laplacian edge loss](LaplacianEdgeLoss).
    pub fn init<B: Backend>(&self, device: &B::Device) -> LaplacianEdgeLoss<B> {
        LaplacianEdgeLoss {
            kernel: laplacian_kernel(device),
            padding: self.padding,
            dilation: self.dilation,
            threshold: self.threshold,
        }
    }
}

/// The fixed 3x3 Laplacian kernel as a conv2d weight of shape `[1, 1, 3, 3]`.
fn laplacian_kernel<B: Backend>(device: &B::Device) -> Tensor<B, 4> {
    Tensor::<B, 2>::from_floats(
        [[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]],
        device,
    )
    .unsqueeze::<4>()
}

/// Edge-consistency loss over Laplacian responses of the prediction map.
#[derive(Module, Debug)]
#[module(custom_display)]
pub struct LaplacianEdgeLoss<B: Backend> {
    /// Fixed Laplacian kernel, shape `[1, 1, 3, 3]`. Constant, never trained.
    pub kernel: Tensor<B, 4>,
    /// Zero padding applied on both spatial axes.
    pub padding: usize,
    /// Spacing between kernel taps.
    pub dilation: usize,
    /// Noise-suppression threshold on response magnitudes.
    pub threshold: f64,
}

impl<B: Backend> ModuleDisplay for LaplacianEdgeLoss<B> {
    fn custom_settings(&self) -> Option<DisplaySettings> {
        DisplaySettings::new()
            .with_new_line_after_attribute(false)
            .optional()
    }

    fn custom_content(&self, content: Content) -> Option<Content> {
        content
            .add("padding", &self.padding)
            .add("dilation", &self.dilation)
            .add("threshold", &self.threshold)
            .optional()
    }
}

impl<B: Backend> LaplacianEdgeLoss<B> {
    /// Create a new Laplacian edge loss with default configuration.
    pub fn new(device: &B::Device) -> Self {
        LaplacianEdgeLossConfig::new().init(device)
    }

    /// Compute the criterion on the input tensor.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, height, width]` (single-channel, float)
    /// - edge_targets: `[batch_size, height, width]`
    /// - output: `[1]`
    ///
    /// When every response is suppressed by the noise threshold the selection
    /// is empty and the result is NaN (0/0); callers that cannot tolerate
    /// this must check the response map first.
    pub fn forward(
        &self,
        predictions: Tensor<B, 3>,
        edge_targets: Tensor<B, 3>,
    ) -> Tensor<B, 1> {
        let response = self.response_map(predictions);
        self.masked_mse(response, edge_targets)
    }

    /// Thresholded Laplacian response of the prediction map.
    ///
    /// # Shapes
    ///
    /// - predictions: `[batch_size, height, width]`
    /// - output: `[batch_size, height, width]` (spatial size preserved)
    pub fn response_map(&self, predictions: Tensor<B, 3>) -> Tensor<B, 3> {
        let response = conv2d(
            predictions.unsqueeze_dim::<4>(1),
            self.kernel.clone(),
            None,
            ConvOptions::new(
                [1, 1],
                [self.padding, self.padding],
                [self.dilation, self.dilation],
                1,
            ),
        )
        .squeeze::<3>(1);

        // Strict less-than: a response of exactly `threshold` survives.
        let noise = response.clone().abs().lower_elem(self.threshold);
        response.mask_fill(noise, 0.0)
    }

    /// Mean squared error restricted to the nonzero response positions.
    pub fn masked_mse(&self, response: Tensor<B, 3>, edge_targets: Tensor<B, 3>) -> Tensor<B, 1> {
        self.assertions(&response, &edge_targets);

        let mask = response.clone().not_equal(response.zeros_like()).float();
        let count = mask.clone().sum();
        let squared = ((response - edge_targets) * mask).powi_scalar(2);

        // NaN when the mask selects nothing.
        squared.sum() / count
    }

    fn assertions(&self, response: &Tensor<B, 3>, edge_targets: &Tensor<B, 3>) {
        let response_dims = response.dims();
        let target_dims = edge_targets.dims();
        assert_eq!(
            response_dims, target_dims,
            "Shape of edge responses ({response_dims:?}) must match edge targets ({target_dims:?})"
        );
    }
}

#[cfg(test)]
mod tests {
    use burn::tensor::{cast::ToElement, TensorData, Tolerance};

    use super::*;
    use crate::tests::TestBackend;

    fn impulse_input(value: f32) -> Tensor<TestBackend, 3> {
        let device = Default::default();
        let mut data = [[0.0f32; 9]; 9];
        data[4][4] = value;
        Tensor::from_data(TensorData::from([data]), &device)
    }

    #[test]
    fn response_map_preserves_spatial_size() {
        let device = Default::default();
        let loss = LaplacianEdgeLoss::<TestBackend>::new(&device);

        let predictions = Tensor::<TestBackend, 3>::zeros([2, 6, 7], &device);
        let response = loss.response_map(predictions);

        assert_eq!(response.dims(), [2, 6, 7]);
    }

    #[test]
    fn response_map_zeroes_magnitudes_below_threshold_and_keeps_boundary() {
        let device = Default::default();
        let loss = LaplacianEdgeLoss::<TestBackend>::new(&device);

        // A lone impulse of 0.0125 produces a center response of exactly
        // 8 * 0.0125 = 0.1 and side responses of -0.0125. The side responses
        // fall strictly below the threshold and must vanish; the center sits
        // exactly at the threshold and must survive.
        let response = loss.response_map(impulse_input(0.0125));

        let data = response.into_data();
        let values = data.as_slice::<f32>().unwrap();
        let nonzero: Vec<f32> = values.iter().copied().filter(|v| *v != 0.0).collect();

        assert_eq!(nonzero, vec![0.1], "only the boundary response survives");
    }

    #[test]
    fn forward_computes_mse_over_surviving_responses_only() {
        let device = Default::default();
        let loss = LaplacianEdgeLoss::<TestBackend>::new(&device);

        // Single surviving response of 0.1 at the center; the edge target is
        // 1.0 there and arbitrary elsewhere (excluded positions must not
        // contribute).
        let mut edge_data = [[7.0f32; 9]; 9];
        edge_data[4][4] = 1.0;
        let edge_targets =
            Tensor::<TestBackend, 3>::from_data(TensorData::from([edge_data]), &device);

        let result = loss.forward(impulse_input(0.0125), edge_targets);

        let expected = TensorData::from([(0.1f32 - 1.0) * (0.1 - 1.0)]);
        result
            .into_data()
            .assert_approx_eq::<f32>(&expected, Tolerance::default());
    }

    #[test]
    fn forward_with_empty_selection_is_nan() {
        let device = Default::default();
        let loss = LaplacianEdgeLoss::<TestBackend>::new(&device);

        let predictions = Tensor::<TestBackend, 3>::zeros([1, 8, 8], &device);
        let edge_targets = Tensor::<TestBackend, 3>::zeros([1, 8, 8], &device);

        let result = loss.forward(predictions, edge_targets);

        assert!(result.into_scalar().to_f64().is_nan());
    }

    #[test]
    fn constant_regions_produce_no_interior_response() {
        let device = Default::default();
        let loss = LaplacianEdgeLoss::<TestBackend>::new(&device);

        // The kernel sums to zero, so a constant map only responds where the
        // dilated taps read the zero padding.
        let predictions = Tensor::<TestBackend, 3>::ones([1, 12, 12], &device);
        let response = loss.response_map(predictions);

        let center = response
            .slice([0..1, 5..6, 5..6])
            .into_scalar()
            .to_f64();
        assert_eq!(center, 0.0);
    }

    #[test]
    #[should_panic = "Shape of edge responses"]
    fn masked_mse_mismatched_shapes_panics() {
        let device = Default::default();
        let loss = LaplacianEdgeLoss::<TestBackend>::new(&device);

        let response = Tensor::<TestBackend, 3>::ones([1, 4, 4], &device);
        let edge_targets = Tensor::<TestBackend, 3>::ones([1, 4, 5], &device);

        let _result = loss.masked_mse(response, edge_targets);
    }

    #[test]
    fn laplacian_edge_loss_display_shows_parameters() {
        let device = Default::default();
        let loss = LaplacianEdgeLossConfig::new()
            .with_threshold(0.2)
            .init::<TestBackend>(&device);

        let display_str = format!("{loss}");
        assert!(display_str.contains("LaplacianEdgeLoss"));
        assert!(display_str.contains("threshold: 0.2"));
    }
}
