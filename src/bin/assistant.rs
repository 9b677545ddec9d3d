use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use advisor_2048::engine::{Board, InvalidBoardError, Move};
use advisor_2048::expectimax::{BranchEval, Expectimax, ExpectimaxConfig};
#[cfg(feature = "rayon")]
use advisor_2048::expectimax::ExpectimaxParallel;

#[derive(Debug, Parser)]
#[command(name = "assistant", about = "Move advisor for 4x4 sliding-tile merge boards")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Advise the best direction for a board given as a JSON 4x4 matrix.
    Advise {
        /// Path to the board file, or `-` to read stdin.
        #[arg(short, long, default_value = "-")]
        board: PathBuf,

        /// Search depth in plies.
        #[arg(short, long, default_value_t = 3)]
        depth: u64,

        /// Also print the expected value of every direction.
        #[arg(long)]
        evals: bool,

        /// Emit the advice as a JSON object instead of plain text.
        #[arg(long)]
        json: bool,

        /// Use the rayon root-parallel search variant.
        #[arg(long)]
        parallel: bool,

        /// Seed for the uniform fallback pick when the search is
        /// inconclusive; defaults to entropy.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Play a full game with the advisor and report throughput.
    Play {
        /// Search depth in plies.
        #[arg(short, long, default_value_t = 3)]
        depth: u64,

        /// Seed for tile spawning; defaults to entropy.
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many moves.
        #[arg(long)]
        steps: Option<u64>,

        /// Suppress the status spinner.
        #[arg(short, long)]
        quiet: bool,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("board is not a JSON matrix: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid board: {0}")]
    Board(#[from] InvalidBoardError),
}

#[derive(Serialize)]
struct Advice {
    direction: Option<Move>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branches: Option<[BranchEval; 4]>,
}

fn main() {
    let args = Args::parse();
    let outcome = match args.cmd {
        Cmd::Advise { board, depth, evals, json, parallel, seed } => {
            run_advise(&board, depth, evals, json, parallel, seed)
        }
        Cmd::Play { depth, seed, steps, quiet } => run_play(depth, seed, steps, quiet),
    };
    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn read_board(path: &Path) -> Result<Board, CliError> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    let rows: Vec<Vec<i64>> = serde_json::from_str(&text)?;
    Ok(Board::try_from_rows(&rows)?)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn run_advise(
    path: &Path,
    depth: u64,
    evals: bool,
    json: bool,
    parallel: bool,
    seed: Option<u64>,
) -> Result<(), CliError> {
    let board = read_board(path)?;
    let cfg = ExpectimaxConfig { depth, ..Default::default() };
    let mut rng = seeded_rng(seed);

    #[cfg(not(feature = "rayon"))]
    if parallel {
        eprintln!("built without the rayon feature; using the sequential search");
    }

    let (direction, branches) = advise(board, cfg, parallel, evals, &mut rng);

    if json {
        let advice = Advice { direction, branches };
        println!("{}", serde_json::to_string(&advice)?);
        return Ok(());
    }
    if let Some(branches) = branches {
        for branch in branches {
            if branch.legal {
                println!("{:>5}: {:.1}", branch.dir.to_string(), branch.ev);
            } else {
                println!("{:>5}: illegal", branch.dir.to_string());
            }
        }
    }
    match direction {
        Some(direction) => println!("{}", direction),
        None => println!("no legal move"),
    }
    Ok(())
}

fn advise(
    board: Board,
    cfg: ExpectimaxConfig,
    parallel: bool,
    evals: bool,
    rng: &mut StdRng,
) -> (Option<Move>, Option<[BranchEval; 4]>) {
    #[cfg(feature = "rayon")]
    if parallel {
        let mut advisor = ExpectimaxParallel::with_config(cfg);
        let direction = advisor.best_move(board, rng);
        let branches = evals.then(|| advisor.branch_evals(board));
        return (direction, branches);
    }
    let _ = parallel;
    let mut advisor = Expectimax::with_config(cfg);
    let direction = advisor.best_move(board, rng);
    let branches = evals.then(|| advisor.branch_evals(board));
    (direction, branches)
}

fn run_play(depth: u64, seed: Option<u64>, steps: Option<u64>, quiet: bool) -> Result<(), CliError> {
    let cfg = ExpectimaxConfig { depth, ..Default::default() };
    let mut advisor = Expectimax::with_config(cfg);
    let mut rng = seeded_rng(seed);
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);

    let pb = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | {msg}")
                .expect("static template"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let start = Instant::now();
    let mut move_count = 0u64;
    while let Some(direction) = advisor.best_move(board, &mut rng) {
        board = board.make_move(direction, &mut rng);
        move_count += 1;
        if let Some(limit) = steps {
            if move_count >= limit {
                break;
            }
        }
        if move_count % 50 == 0 {
            if let Some(pb) = &pb {
                let rate = move_count as f64 / start.elapsed().as_secs_f64().max(1e-6);
                pb.set_message(format!(
                    "moves: {} | moves/sec: {:.1} | max tile: {}",
                    move_count,
                    rate,
                    board.max_tile()
                ));
            }
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    println!(
        "moves: {} | moves/sec: {:.1} | max tile: {} | peak states per move: {}",
        move_count,
        move_count as f64 / elapsed,
        board.max_tile(),
        advisor.last_stats().peak_nodes
    );
    if !quiet {
        println!("{}", board);
    }
    Ok(())
}
