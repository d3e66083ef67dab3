use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use super::network::TicTacToeNet;
use super::state_encoding::minibatch_tensors;
use crate::dataset::Minibatch;
use crate::encoding::{ENCODING_LEN, MOVE_COUNT};
use crate::error::TrainError;
use crate::snapshot::TrainingState;

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Everything a training run mutates: the network, its optimizer, the
/// global step and the device. Passed by reference instead of living in
/// globals.
pub struct TrainingSession<B: AutodiffBackend, O> {
    model: TicTacToeNet<B>,
    optimizer: O,
    state: TrainingState,
    device: B::Device,
}

/// A session that trains with plain stochastic gradient descent.
pub fn sgd_session<B: AutodiffBackend>(
    model: TicTacToeNet<B>,
    state: TrainingState,
    device: B::Device,
) -> TrainingSession<B, impl Optimizer<TicTacToeNet<B>, B>> {
    let optimizer = SgdConfig::new().init::<B, TicTacToeNet<B>>();
    TrainingSession::new(model, optimizer, state, device)
}

impl<B, O> TrainingSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TicTacToeNet<B>, B>,
{
    pub fn new(model: TicTacToeNet<B>, optimizer: O, state: TrainingState, device: B::Device) -> Self {
        TrainingSession {
            model,
            optimizer,
            state,
            device,
        }
    }

    pub fn model(&self) -> &TicTacToeNet<B> {
        &self.model
    }

    /// Copy of the network without autodiff tracking.
    pub fn inference_model(&self) -> TicTacToeNet<B::InnerBackend> {
        self.model.valid()
    }

    pub fn state(&self) -> &TrainingState {
        &self.state
    }

    /// Minibatches consumed over the model's whole life.
    pub fn global_step(&self) -> u64 {
        self.state.global_step
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn record_epoch(&mut self) {
        self.state.epochs_completed += 1;
    }

    /// One gradient step on mean-squared error between the softmax output
    /// and the move distribution. Returns the loss before the update.
    pub fn train_step(&mut self, batch: &Minibatch) -> Result<f32, TrainError> {
        check_len(batch.examples.len(), batch.len * ENCODING_LEN)?;
        check_len(batch.labels.len(), batch.len * MOVE_COUNT)?;

        let (inputs, labels) = minibatch_tensors::<B>(batch, &self.device);
        let output = self.model.forward(inputs);
        let loss = MseLoss::new().forward(output, labels, Reduction::Mean);
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optimizer
            .step(self.state.learning_rate, self.model.clone(), grads);

        self.state.global_step += 1;
        Ok(loss_value)
    }
}

fn check_len(got: usize, expected: usize) -> Result<(), TrainError> {
    if got == expected && expected > 0 {
        Ok(())
    } else {
        Err(TrainError::BatchShape { got, expected })
    }
}
