use burn::prelude::*;

use super::network::TicTacToeNet;
use super::state_encoding::encode_boards;
use crate::encoding::{BoardEncoding, MOVE_COUNT};
use crate::game::GameState;

/// An inference-only network, as loaded from a serving export.
pub struct Policy<B: Backend> {
    net: TicTacToeNet<B>,
    device: B::Device,
}

impl<B: Backend> Policy<B> {
    pub fn new(net: TicTacToeNet<B>, device: B::Device) -> Self {
        Policy { net, device }
    }

    /// Move probabilities for each board.
    pub fn predict(&self, boards: &[BoardEncoding]) -> Vec<[f32; MOVE_COUNT]> {
        if boards.is_empty() {
            return Vec::new();
        }
        let output = self.net.forward(encode_boards::<B>(boards, &self.device));
        let flat: Vec<f32> = output.into_data().iter::<f32>().collect();
        flat.chunks_exact(MOVE_COUNT)
            .map(|row| {
                let mut probs = [0.0; MOVE_COUNT];
                probs.copy_from_slice(row);
                probs
            })
            .collect()
    }

    /// The network's distribution restricted to legal moves and
    /// renormalised. Falls back to uniform when the network puts no mass on
    /// any legal move. All zeros once the game is over.
    pub fn legal_distribution(&self, state: &GameState) -> [f32; MOVE_COUNT] {
        let legal = state.legal_actions();
        let mut dist = [0.0; MOVE_COUNT];
        if legal.is_empty() {
            return dist;
        }

        let probs = self.predict(&[state.encode()])[0];
        for &sq in &legal {
            dist[sq] = probs[sq].max(0.0);
        }
        let total: f32 = dist.iter().sum();
        if total > 0.0 && total.is_finite() {
            dist.iter_mut().for_each(|p| *p /= total);
        } else {
            let uniform = 1.0 / legal.len() as f32;
            for &sq in &legal {
                dist[sq] = uniform;
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InferBackend, TicTacToeNetConfig};

    fn policy() -> Policy<InferBackend> {
        let device = Default::default();
        let net = TicTacToeNetConfig::new().init::<InferBackend>(&device);
        Policy::new(net, device)
    }

    #[test]
    fn test_predict_one_row_per_board() {
        let policy = policy();
        let board = GameState::initial().encode();
        let rows = policy.predict(&[board, board, board]);
        assert_eq!(rows.len(), 3);
        assert!(policy.predict(&[]).is_empty());
    }

    #[test]
    fn test_legal_distribution_masks_occupied_squares() {
        let policy = policy();
        let state = GameState::initial()
            .apply_move(0)
            .unwrap()
            .apply_move(4)
            .unwrap();
        let dist = policy.legal_distribution(&state);
        assert_eq!(dist[0], 0.0);
        assert_eq!(dist[4], 0.0);
        assert!((dist.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }
}
