use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ttt_selfplay::encoding::{TrainingExample, MOVE_COUNT};
use ttt_selfplay::gamedata::GameDataDir;
use ttt_selfplay::record::read_examples;

/// Print the examples stored in record files.
#[derive(Parser)]
#[command(name = "inspect", about = "Print the examples stored in game record files")]
struct Cli {
    /// A record file, or a game-data directory to read every completed file of
    path: PathBuf,

    /// Number of examples to print in full
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let files = if cli.path.is_dir() {
        GameDataDir::new(&cli.path)
            .completed_files()
            .with_context(|| format!("listing {}", cli.path.display()))?
    } else {
        vec![cli.path.clone()]
    };

    let mut printed = 0;
    let mut by_ply = vec![(0usize, [0.0f64; MOVE_COUNT]); MOVE_COUNT];
    let mut total = 0;

    for file in &files {
        let examples =
            read_examples(file).with_context(|| format!("reading {}", file.display()))?;
        println!("{}: {} examples", file.display(), examples.len());
        for example in &examples {
            if printed < cli.limit {
                print_example(example);
                printed += 1;
            }
            let ply = stones(example).min(MOVE_COUNT - 1);
            let (count, sums) = &mut by_ply[ply];
            *count += 1;
            for (sum, &p) in sums.iter_mut().zip(&example.choice) {
                *sum += f64::from(p);
            }
        }
        total += examples.len();
    }

    println!();
    println!("{total} examples in {} files", files.len());
    println!("mean move distribution by ply:");
    for (ply, (count, sums)) in by_ply.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let means: Vec<String> = sums
            .iter()
            .map(|s| format!("{:.2}", s / *count as f64))
            .collect();
        println!("  ply {ply} ({count:>6}): [{}]", means.join(" "));
    }
    Ok(())
}

fn stones(example: &TrainingExample) -> usize {
    example.board.as_bytes()[..2 * MOVE_COUNT]
        .iter()
        .filter(|&&b| b != 0)
        .count()
}

fn print_example(example: &TrainingExample) {
    println!("{}", example.board);
    let choice: Vec<String> = example.choice.iter().map(|p| format!("{p:.2}")).collect();
    println!("choice [{}] -> {}", choice.join(" "), example.chosen_move());
    println!();
}
