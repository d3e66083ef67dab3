use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::tensor::activation::softmax;

use crate::encoding::{ENCODING_LEN, MOVE_COUNT};

pub const DEFAULT_HIDDEN_UNITS: usize = 64;

/// Two dense layers over the raw board encoding.
///
/// ```text
/// Input:   [batch, 19]  (board encoding bytes as f32)
/// Dense:   19 -> hidden, ReLU
/// Logits:  hidden -> 9, ReLU
/// Softmax over the 9 squares
/// ```
#[derive(Module, Debug)]
pub struct TicTacToeNet<B: Backend> {
    dense: Linear<B>,
    logits: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct TicTacToeNetConfig {
    #[config(default = 64)]
    pub hidden_units: usize,
}

impl TicTacToeNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TicTacToeNet<B> {
        TicTacToeNet {
            dense: LinearConfig::new(ENCODING_LEN, self.hidden_units).init(device),
            logits: LinearConfig::new(self.hidden_units, MOVE_COUNT).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> TicTacToeNet<B> {
    /// Forward pass: input [batch, 19] -> move probabilities [batch, 9].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.dense.forward(input));
        let x = self.relu.forward(self.logits.forward(x));
        softmax(x, 1)
    }
}
