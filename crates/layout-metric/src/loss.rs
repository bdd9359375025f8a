//! Loss tracking metrics for layout segmentation training.
//!
//! [`LossMetric`] tracks the combined loss; [`LossTermMetric`] tracks one
//! named term of the breakdown (for example `seg_area`), reporting zero for
//! batches where the term was disabled.

use core::marker::PhantomData;

use burn::{
    tensor::{backend::Backend, cast::ToElement},
    train::metric::{
        state::{FormatOptions, NumericMetricState},
        Metric, MetricEntry, MetricMetadata, Numeric,
    },
};

use super::input::LayoutLossInput;

/// Running average of the combined layout loss.
#[derive(Default)]
pub struct LossMetric<B: Backend> {
    state: NumericMetricState,
    _b: PhantomData<B>,
}

impl<B: Backend> LossMetric<B> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend> Metric for LossMetric<B> {
    type Input = LayoutLossInput<B>;

    fn name(&self) -> String {
        "Loss".to_owned()
    }

    fn update(&mut self, item: &Self::Input, _metadata: &MetricMetadata) -> MetricEntry {
        let loss = item.loss.clone().into_scalar().to_f64();
        self.state.update(
            loss,
            item.batch_size,
            FormatOptions::new(self.name()).precision(5),
        )
    }

    fn clear(&mut self) {
        self.state.reset();
    }
}

impl<B: Backend> Numeric for LossMetric<B> {
    fn value(&self) -> f64 {
        self.state.value()
    }
}

/// Running average of one named term of the loss breakdown.
pub struct LossTermMetric<B: Backend> {
    term: String,
    state: NumericMetricState,
    _b: PhantomData<B>,
}

impl<B: Backend> LossTermMetric<B> {
    /// Track the term stored under `term` in the breakdown map.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            state: NumericMetricState::default(),
            _b: PhantomData,
        }
    }
}

impl<B: Backend> Metric for LossTermMetric<B> {
    type Input = LayoutLossInput<B>;

    fn name(&self) -> String {
        format!("Loss ({})", self.term)
    }

    fn update(&mut self, item: &Self::Input, _metadata: &MetricMetadata) -> MetricEntry {
        // A disabled term contributes nothing.
        let value = item.terms.get(&self.term).copied().unwrap_or(0.0);
        self.state.update(
            value,
            item.batch_size,
            FormatOptions::new(self.name()).precision(5),
        )
    }

    fn clear(&mut self) {
        self.state.reset();
    }
}

impl<B: Backend> Numeric for LossTermMetric<B> {
    fn value(&self) -> f64 {
        self.state.value()
    }
}
