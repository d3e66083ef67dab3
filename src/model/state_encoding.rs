use burn::prelude::*;
use burn::tensor::TensorData;

use crate::dataset::Minibatch;
use crate::encoding::{BoardEncoding, ENCODING_LEN, MOVE_COUNT};

/// Encode board encodings as a float tensor of shape [batch, 19].
pub fn encode_boards<B: Backend>(boards: &[BoardEncoding], device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = boards.iter().flat_map(|b| b.to_f32()).collect();
    Tensor::from_data(TensorData::new(flat, [boards.len(), ENCODING_LEN]), device)
}

/// Input [batch, 19] and label [batch, 9] tensors for a minibatch.
pub fn minibatch_tensors<B: Backend>(
    batch: &Minibatch,
    device: &B::Device,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let inputs = Tensor::from_data(
        TensorData::new(batch.examples.clone(), [batch.len, ENCODING_LEN]),
        device,
    );
    let labels = Tensor::from_data(
        TensorData::new(batch.labels.clone(), [batch.len, MOVE_COUNT]),
        device,
    );
    (inputs, labels)
}
