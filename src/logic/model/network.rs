//! Feed-forward binary classifier
//!
//! input → linear(128) → relu → batch_norm → dropout(0.3)
//!       → linear(64)  → relu → batch_norm → dropout(0.3)
//!       → linear(32)  → relu → batch_norm → dropout(0.2)
//!       → linear(16)  → relu → linear(1) → sigmoid
//!
//! Training runs on `Autodiff<NdArray>`. A fitted model lives on the plain
//! `NdArray` backend, where batch norm uses its running statistics and
//! dropout passes activations through.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Initializer, Linear, LinearConfig, Relu,
};
use burn::tensor::{activation, backend::Backend, Int, Tensor, TensorData};
use ndarray::{Array1, Array2};
use parking_lot::{Mutex, MutexGuard};

pub type InferenceBackend = NdArray<f32>;
pub type TrainingBackend = Autodiff<InferenceBackend>;

/// Hidden block widths and the dropout rate after each normalized block
const BLOCKS: [(usize, f64); 3] = [(128, 0.3), (64, 0.3), (32, 0.2)];
const HEAD_UNITS: usize = 16;

const BN_EPSILON: f64 = 1e-3;
/// Weight of the current batch in the running statistics
const BN_MOMENTUM: f64 = 0.1;

/// The NdArray backend draws weight init and dropout masks from one
/// process-wide generator.
static BACKEND_RNG: Mutex<()> = parking_lot::const_mutex(());

pub fn device() -> NdArrayDevice {
    NdArrayDevice::default()
}

/// Seed the backend generator and hold it until the guard drops
pub fn seed_backend(seed: u64) -> MutexGuard<'static, ()> {
    let guard = BACKEND_RNG.lock();
    TrainingBackend::seed(seed);
    guard
}

// ============================================================================
// MODULES
// ============================================================================

#[derive(Module, Debug)]
pub struct Block<B: Backend> {
    linear: Linear<B>,
    norm: BatchNorm<B, 0>,
    dropout: Dropout,
    activation: Relu,
}

impl<B: Backend> Block<B> {
    fn new(inputs: usize, units: usize, rate: f64, device: &B::Device) -> Self {
        Self {
            linear: glorot(inputs, units, device),
            norm: BatchNormConfig::new(units)
                .with_epsilon(BN_EPSILON)
                .with_momentum(BN_MOMENTUM)
                .init(device),
            dropout: DropoutConfig::new(rate).init(),
            activation: Relu::new(),
        }
    }

    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.linear.forward(x));
        self.dropout.forward(self.norm.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    blocks: Vec<Block<B>>,
    head: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> Classifier<B> {
    /// Fresh classifier; weights are drawn lazily from the backend generator
    pub fn new(input_dim: usize, device: &B::Device) -> Self {
        let mut blocks = Vec::with_capacity(BLOCKS.len());
        let mut width = input_dim;
        for (units, rate) in BLOCKS {
            blocks.push(Block::new(width, units, rate, device));
            width = units;
        }

        Self {
            blocks,
            head: glorot(width, HEAD_UNITS, device),
            output: glorot(HEAD_UNITS, 1, device),
            activation: Relu::new(),
        }
    }

    /// Logits, shape (rows, 1)
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.blocks.iter().fold(x, |x, block| block.forward(x));
        let x = self.activation.forward(self.head.forward(x));
        self.output.forward(x)
    }

    pub fn probabilities(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::sigmoid(self.forward(x))
    }

    /// Layer shapes chain from `input_dim` to a single output
    pub fn has_shapes_for(&self, input_dim: usize) -> bool {
        if self.blocks.len() != BLOCKS.len() {
            return false;
        }

        let mut width = input_dim;
        for (block, (units, _)) in self.blocks.iter().zip(BLOCKS) {
            if block.linear.weight.val().dims() != [width, units]
                || block.norm.gamma.val().dims() != [units]
                || block.norm.running_mean.value().dims() != [units]
            {
                return false;
            }
            width = units;
        }

        self.head.weight.val().dims() == [width, HEAD_UNITS]
            && self.output.weight.val().dims() == [HEAD_UNITS, 1]
    }
}

impl Classifier<InferenceBackend> {
    /// Probabilities, one per row
    pub fn predict(&self, x: &Array2<f32>) -> Array1<f32> {
        if x.nrows() == 0 {
            return Array1::zeros(0);
        }
        let scores = self.probabilities(to_tensor(x, &device()));
        scores.into_data().iter::<f32>().collect()
    }
}

fn glorot<B: Backend>(inputs: usize, units: usize, device: &B::Device) -> Linear<B> {
    LinearConfig::new(inputs, units)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device)
}

/// Human-readable layer list
pub fn architecture() -> Vec<String> {
    let mut layers = Vec::new();
    for (units, rate) in BLOCKS {
        layers.push(format!("dense({}, relu)", units));
        layers.push(format!("batch_norm({})", units));
        layers.push(format!("dropout({})", rate));
    }
    layers.push(format!("dense({}, relu)", HEAD_UNITS));
    layers.push("dense(1, sigmoid)".to_string());
    layers
}

// ============================================================================
// TENSORS
// ============================================================================

pub fn to_tensor<B: Backend>(x: &Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let data = TensorData::new(x.iter().copied().collect::<Vec<f32>>(), [x.nrows(), x.ncols()]);
    Tensor::from_data(data, device)
}

/// 0/1 labels as an integer column, shape (rows, 1)
pub fn to_targets<B: Backend>(y: &Array1<f32>, device: &B::Device) -> Tensor<B, 2, Int> {
    let data = TensorData::new(y.iter().map(|&v| v as i64).collect::<Vec<i64>>(), [y.len(), 1]);
    Tensor::from_data(data, device)
}
