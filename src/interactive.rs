//! A human against a model's search, over any line-based input and output.

use std::io::{BufRead, Write};

use burn::prelude::Backend;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::PlayError;
use crate::game::{GameOutcome, GameState, Player};
use crate::model::Policy;
use crate::search::{SearchOptions, SearchTree};

/// One line of human input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero-based square.
    Move(usize),
    Quit,
}

/// Parse `1`-`9` (row-major, top left first) or `q`.
pub fn parse_command(line: &str, state: &GameState) -> Result<Command, String> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Ok(Command::Quit);
    }
    let square = match line.parse::<usize>() {
        Ok(n @ 1..=9) => n - 1,
        _ => return Err(format!("expected a square 1-9 or q, got '{line}'")),
    };
    if !state.board().is_empty_at(square) {
        return Err(format!("square {} is taken", square + 1));
    }
    Ok(Command::Move(square))
}

pub struct InteractiveSession<'a, B: Backend> {
    policy: &'a Policy<B>,
    tree: SearchTree,
    human: Player,
    rng: StdRng,
}

impl<'a, B: Backend> InteractiveSession<'a, B> {
    pub fn new(policy: &'a Policy<B>, options: SearchOptions, human: Player, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        InteractiveSession {
            policy,
            tree: SearchTree::new(options),
            human,
            rng,
        }
    }

    /// Play one game. Returns `None` if the human quit or input ran out.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        out: &mut W,
    ) -> Result<Option<GameOutcome>, PlayError> {
        let mut lines = input.lines();
        let mut state = GameState::initial();
        writeln!(out, "You are {}. Squares are numbered 1-9 from the top left.", self.human.mark())?;

        loop {
            writeln!(out, "{state}")?;
            if let Some(outcome) = state.outcome() {
                let verdict = match outcome {
                    GameOutcome::Winner(p) if p == self.human => "You win.".to_string(),
                    GameOutcome::Winner(p) => format!("{} wins.", p.mark()),
                    GameOutcome::Draw => "Draw.".to_string(),
                };
                writeln!(out, "{verdict}")?;
                return Ok(Some(outcome));
            }

            let square = if state.current_player() == self.human {
                match prompt(&state, &mut lines, out)? {
                    Some(square) => square,
                    None => return Ok(None),
                }
            } else {
                let result = self.tree.search(&state, self.policy, &mut self.rng)?;
                let total: u32 = result.visits.iter().sum();
                writeln!(
                    out,
                    "{} plays {} ({}/{} visits)",
                    state.current_player().mark(),
                    result.chosen + 1,
                    result.visits[result.chosen],
                    total
                )?;
                result.chosen
            };
            state.apply_move_mut(square)?;
        }
    }
}

/// Ask until a legal square is given. `None` on quit or end of input.
fn prompt<I, W>(state: &GameState, lines: &mut I, out: &mut W) -> Result<Option<usize>, PlayError>
where
    I: Iterator<Item = std::io::Result<String>>,
    W: Write,
{
    loop {
        write!(out, "{} to play: ", state.current_player().mark())?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            return Ok(None);
        };
        match parse_command(&line?, state) {
            Ok(Command::Move(square)) => return Ok(Some(square)),
            Ok(Command::Quit) => return Ok(None),
            Err(msg) => writeln!(out, "{msg}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InferBackend, TicTacToeNetConfig};
    use std::io::Cursor;

    fn policy() -> Policy<InferBackend> {
        let device = Default::default();
        let net = TicTacToeNetConfig::new()
            .with_hidden_units(8)
            .init::<InferBackend>(&device);
        Policy::new(net, device)
    }

    fn options() -> SearchOptions {
        SearchOptions {
            readouts: 32,
            tempering_point: 0,
            dirichlet_epsilon: 0.0,
            ..Default::default()
        }
    }

    fn play(human: Player, input: &str) -> (Option<GameOutcome>, String) {
        let policy = policy();
        let mut session = InteractiveSession::new(&policy, options(), human, Some(5));
        let mut out = Vec::new();
        let outcome = session.run(Cursor::new(input), &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_command() {
        let state = GameState::initial().apply_move(4).unwrap();
        assert_eq!(parse_command(" 3 \n", &state), Ok(Command::Move(2)));
        assert_eq!(parse_command("Q", &state), Ok(Command::Quit));
        assert!(parse_command("5", &state).unwrap_err().contains("taken"));
        assert!(parse_command("0", &state).is_err());
        assert!(parse_command("10", &state).is_err());
        assert!(parse_command("middle", &state).is_err());
    }

    #[test]
    fn test_game_runs_to_completion() {
        // trying every square in order always finds a free one
        let (outcome, out) = play(Player::X, "1\n2\n3\n4\n5\n6\n7\n8\n9\n");
        assert!(outcome.is_some());
        assert!(out.contains("o plays"));
        assert!(!out.contains("x plays"));
    }

    #[test]
    fn test_model_opens_when_human_is_o() {
        let (outcome, out) = play(Player::O, "q\n");
        assert_eq!(outcome, None);
        let first_move = out.find("x plays").unwrap();
        let first_prompt = out.find("o to play").unwrap();
        assert!(first_move < first_prompt);
    }

    #[test]
    fn test_bad_input_reprompts() {
        let (outcome, out) = play(Player::X, "zero\n0\nq\n");
        assert_eq!(outcome, None);
        assert_eq!(out.matches("x to play").count(), 3);
        assert_eq!(out.matches("expected a square").count(), 2);
    }

    #[test]
    fn test_end_of_input_quits() {
        let (outcome, _) = play(Player::X, "");
        assert_eq!(outcome, None);
    }
}
