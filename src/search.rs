//! Policy-guided Monte Carlo tree search.
//!
//! Each readout walks from the root by PUCT, expanding every new node with
//! the policy's move distribution as priors, until the game ends. The final
//! result is backed up the path with alternating sign. There is no value
//! head, so readouts always play out to a terminal position.

use burn::prelude::Backend;
use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::encoding::MOVE_COUNT;
use crate::game::{GameOutcome, GameState, MoveError};
use crate::model::Policy;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Readouts per move.
    pub readouts: usize,
    /// Exploration constant in the PUCT score.
    pub cpuct: f32,
    /// Before this ply moves are sampled by visit count; from it on the most
    /// visited move is played.
    pub tempering_point: usize,
    /// Concentration of the Dirichlet noise mixed into the root priors.
    pub dirichlet_alpha: f64,
    /// Fraction of each root prior taken from the noise. Zero disables it.
    pub dirichlet_epsilon: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            readouts: 200,
            cpuct: 1.0,
            tempering_point: 1,
            dirichlet_alpha: 0.5,
            dirichlet_epsilon: 0.25,
        }
    }
}

/// Outcome of searching one position.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub visits: [u32; MOVE_COUNT],
    pub chosen: usize,
}

impl SearchResult {
    /// Root visit counts normalised to a distribution.
    pub fn visit_distribution(&self) -> [f32; MOVE_COUNT] {
        let total: u32 = self.visits.iter().sum();
        let mut dist = [0.0; MOVE_COUNT];
        if total > 0 {
            for (p, &n) in dist.iter_mut().zip(&self.visits) {
                *p = n as f32 / total as f32;
            }
        }
        dist
    }
}

struct Node {
    state: GameState,
    visit_count: u32,
    /// From the perspective of the player who moved into this node.
    value_sum: f32,
    prior: f32,
    children: [Option<usize>; MOVE_COUNT],
    expanded: bool,
}

impl Node {
    fn new(state: GameState, prior: f32) -> Self {
        Node {
            state,
            visit_count: 0,
            value_sum: 0.0,
            prior,
            children: [None; MOVE_COUNT],
            expanded: false,
        }
    }
}

/// Arena-backed search tree, rebuilt for every move.
pub struct SearchTree {
    nodes: Vec<Node>,
    options: SearchOptions,
}

impl SearchTree {
    pub fn new(options: SearchOptions) -> Self {
        SearchTree {
            nodes: Vec::with_capacity(1024),
            options,
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Search `root` and pick a move from the resulting visit counts.
    pub fn search<B: Backend, R: Rng + ?Sized>(
        &mut self,
        root: &GameState,
        policy: &Policy<B>,
        rng: &mut R,
    ) -> Result<SearchResult, MoveError> {
        if root.is_terminal() {
            return Err(MoveError::GameOver);
        }

        self.nodes.clear();
        self.nodes.push(Node::new(*root, 1.0));
        self.expand(0, policy);
        self.add_root_noise(rng);

        for _ in 0..self.options.readouts.max(1) {
            self.readout(policy);
        }

        let mut visits = [0u32; MOVE_COUNT];
        for (square, child) in self.nodes[0].children.iter().enumerate() {
            if let Some(idx) = child {
                visits[square] = self.nodes[*idx].visit_count;
            }
        }
        let legal = root.legal_actions();
        let chosen = if root.plies() < self.options.tempering_point {
            sample_by_visits(&visits, &legal, rng)
        } else {
            most_visited(&visits, &legal)
        };
        Ok(SearchResult { visits, chosen })
    }

    /// One walk from the root to the end of the game.
    fn readout<B: Backend>(&mut self, policy: &Policy<B>) {
        let mut path = vec![0];
        let mut current = 0;
        let value = loop {
            let state = self.nodes[current].state;
            if let Some(outcome) = state.outcome() {
                break match outcome {
                    // only the player who just moved can have won
                    GameOutcome::Winner(_) => 1.0,
                    GameOutcome::Draw => 0.0,
                };
            }
            if !self.nodes[current].expanded {
                self.expand(current, policy);
            }
            match self.select_child(current) {
                Some(next) => {
                    path.push(next);
                    current = next;
                }
                None => break 0.0,
            }
        };
        self.backup(&path, value);
    }

    fn expand<B: Backend>(&mut self, idx: usize, policy: &Policy<B>) {
        let state = self.nodes[idx].state;
        let priors = policy.legal_distribution(&state);
        let mut children = [None; MOVE_COUNT];
        for square in state.legal_actions() {
            if let Ok(next) = state.apply_move(square) {
                children[square] = Some(self.nodes.len());
                self.nodes.push(Node::new(next, priors[square]));
            }
        }
        self.nodes[idx].children = children;
        self.nodes[idx].expanded = true;
    }

    /// Child maximising Q + cpuct * P * sqrt(N) / (1 + n).
    fn select_child(&self, idx: usize) -> Option<usize> {
        let node = &self.nodes[idx];
        let parent_sqrt = (node.visit_count.max(1) as f32).sqrt();
        let mut best = None;
        let mut best_score = f32::NEG_INFINITY;
        for child_idx in node.children.iter().flatten().copied() {
            let child = &self.nodes[child_idx];
            let q = if child.visit_count == 0 {
                0.0
            } else {
                child.value_sum / child.visit_count as f32
            };
            let u = self.options.cpuct * child.prior * parent_sqrt
                / (1.0 + child.visit_count as f32);
            if q + u > best_score {
                best_score = q + u;
                best = Some(child_idx);
            }
        }
        best
    }

    fn backup(&mut self, path: &[usize], leaf_value: f32) {
        let mut v = leaf_value;
        for &idx in path.iter().rev() {
            self.nodes[idx].visit_count += 1;
            self.nodes[idx].value_sum += v;
            v = -v;
        }
    }

    /// Mix Dirichlet(alpha) noise, drawn as normalised Gamma(alpha, 1)
    /// variates, into the root's child priors.
    fn add_root_noise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let eps = self.options.dirichlet_epsilon;
        if eps <= 0.0 {
            return;
        }
        let Ok(gamma) = Gamma::new(self.options.dirichlet_alpha, 1.0) else {
            return;
        };
        let children: Vec<usize> = self.nodes[0].children.iter().flatten().copied().collect();
        if children.len() < 2 {
            return;
        }

        let mut noise: Vec<f32> = children.iter().map(|_| gamma.sample(rng) as f32).collect();
        let sum: f32 = noise.iter().sum();
        if sum > 0.0 && sum.is_finite() {
            noise.iter_mut().for_each(|n| *n /= sum);
        } else {
            let p = 1.0 / children.len() as f32;
            noise.iter_mut().for_each(|n| *n = p);
        }
        for (&idx, n) in children.iter().zip(noise) {
            let child = &mut self.nodes[idx];
            child.prior = (1.0 - eps) * child.prior + eps * n;
        }
    }
}

/// Most visited legal move; ties go to the lowest square.
fn most_visited(visits: &[u32; MOVE_COUNT], legal: &[usize]) -> usize {
    let mut best = legal[0];
    for &sq in legal {
        if visits[sq] > visits[best] {
            best = sq;
        }
    }
    best
}

/// Legal move drawn with probability proportional to its visit count.
fn sample_by_visits<R: Rng + ?Sized>(
    visits: &[u32; MOVE_COUNT],
    legal: &[usize],
    rng: &mut R,
) -> usize {
    let total: u32 = legal.iter().map(|&sq| visits[sq]).sum();
    if total == 0 {
        return legal[rng.random_range(0..legal.len())];
    }
    let mut pick = rng.random_range(0..total);
    for &sq in legal {
        if pick < visits[sq] {
            return sq;
        }
        pick -= visits[sq];
    }
    most_visited(visits, legal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InferBackend, TicTacToeNetConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn policy() -> Policy<InferBackend> {
        let device = Default::default();
        let net = TicTacToeNetConfig::new()
            .with_hidden_units(8)
            .init::<InferBackend>(&device);
        Policy::new(net, device)
    }

    fn play(moves: &[usize]) -> GameState {
        moves
            .iter()
            .fold(GameState::initial(), |s, &sq| s.apply_move(sq).unwrap())
    }

    fn quiet(readouts: usize) -> SearchOptions {
        SearchOptions {
            readouts,
            tempering_point: 0,
            dirichlet_epsilon: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_visits_add_up_to_readouts() {
        let mut tree = SearchTree::new(quiet(40));
        let state = play(&[4]);
        let result = tree.search(&state, &policy(), &mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(result.visits.iter().sum::<u32>(), 40);
        assert_eq!(result.visits[4], 0);
        assert!((result.visit_distribution().iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_finds_immediate_win() {
        // x x .
        // o o .
        // . . .
        let state = play(&[0, 3, 1, 4]);
        let mut tree = SearchTree::new(quiet(300));
        let result = tree.search(&state, &policy(), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(result.chosen, 2, "visits {:?}", result.visits);
    }

    #[test]
    fn test_blocks_opponent_win() {
        // x x .
        // o . .
        // . . .  o to move must take 2
        let state = play(&[0, 3, 1]);
        let mut tree = SearchTree::new(quiet(600));
        let result = tree.search(&state, &policy(), &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(result.chosen, 2, "visits {:?}", result.visits);
    }

    #[test]
    fn test_terminal_root_is_rejected() {
        let state = play(&[0, 3, 1, 4, 2]);
        let mut tree = SearchTree::new(quiet(10));
        assert_eq!(
            tree.search(&state, &policy(), &mut StdRng::seed_from_u64(0)),
            Err(MoveError::GameOver)
        );
    }

    #[test]
    fn test_past_tempering_point_is_deterministic() {
        let policy = policy();
        let state = play(&[4]);
        let chosen: Vec<usize> = (0..5)
            .map(|seed| {
                SearchTree::new(quiet(30))
                    .search(&state, &policy, &mut StdRng::seed_from_u64(seed))
                    .unwrap()
                    .chosen
            })
            .collect();
        assert!(chosen.iter().all(|&c| c == chosen[0]), "{chosen:?}");
    }

    #[test]
    fn test_before_tempering_point_samples() {
        let policy = policy();
        let options = SearchOptions {
            readouts: 30,
            tempering_point: 9,
            ..Default::default()
        };
        let mut distinct: Vec<usize> = (0..30)
            .map(|seed| {
                SearchTree::new(options.clone())
                    .search(&GameState::initial(), &policy, &mut StdRng::seed_from_u64(seed))
                    .unwrap()
                    .chosen
            })
            .collect();
        distinct.sort();
        distinct.dedup();
        assert!(distinct.len() > 1, "always played {distinct:?}");
    }

    #[test]
    fn test_root_noise_keeps_priors_normalised() {
        let policy = policy();
        let mut tree = SearchTree::new(SearchOptions {
            dirichlet_epsilon: 0.5,
            ..quiet(1)
        });
        let state = GameState::initial();
        tree.nodes.push(Node::new(state, 1.0));
        tree.expand(0, &policy);
        let before: Vec<f32> = tree.nodes[1..].iter().map(|n| n.prior).collect();

        tree.add_root_noise(&mut StdRng::seed_from_u64(5));
        let after: Vec<f32> = tree.nodes[1..].iter().map(|n| n.prior).collect();

        assert_ne!(before, after);
        assert!((after.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        assert!(after.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_sample_by_visits_skips_unvisited() {
        let mut visits = [0u32; MOVE_COUNT];
        visits[3] = 5;
        visits[6] = 1;
        let legal = [0, 3, 6, 8];
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let sq = sample_by_visits(&visits, &legal, &mut rng);
            assert!(sq == 3 || sq == 6);
        }
        assert_eq!(most_visited(&visits, &legal), 3);
    }
}
