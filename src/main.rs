//! go-record: inspect and produce XML Go game records.
//!
//! ## Usage
//!
//! - `go-record check <file>` - Read a record and print a summary
//! - `go-record normalize <file> [-o out]` - Rewrite a record canonically
//! - `go-record demo` - Print a randomly generated record

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use go_record::clock::{Clock, TimeSource};
use go_record::color::Color;
use go_record::constants::{DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE};
use go_record::game_info::TimeSettings;
use go_record::go::{Move, Point};
use go_record::komi::Komi;
use go_record::tree::GameTree;
use go_record::xml;

/// go-record: read, check and write XML Go game records
#[derive(Parser)]
#[command(name = "go-record")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a record and print a summary
    Check {
        file: PathBuf,
    },
    /// Read a record and write it back in canonical form
    Normalize {
        file: PathBuf,
        /// Output file (standard output if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Application name recorded in the document
        #[arg(long)]
        application: Option<String>,
    },
    /// Print a randomly generated record
    Demo {
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        board_size: usize,
        /// Number of moves in the main line
        #[arg(long, default_value_t = 20)]
        moves: usize,
        /// Random seed
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { file } => check(&file),
        Commands::Normalize {
            file,
            output,
            application,
        } => normalize(&file, output.as_deref(), application.as_deref()),
        Commands::Demo {
            board_size,
            moves,
            seed,
        } => demo(board_size, moves, seed),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load(file: &Path) -> Result<GameTree> {
    let f = File::open(file).with_context(|| format!("cannot open {}", file.display()))?;
    xml::read(f).with_context(|| format!("cannot read {}", file.display()))
}

fn check(file: &Path) -> Result<()> {
    let tree = load(file)?;
    let root = tree.root();
    let end = tree.main_line_end(root);
    println!("Board size: {}", tree.board_size());
    println!("Nodes: {}", tree.node_count());
    println!("Main line: {} moves", tree.move_number(end));
    let variations = tree
        .preorder(root)
        .filter(|&n| tree.children(n).len() > 1)
        .count();
    println!("Branching nodes: {variations}");
    if let Some(info) = tree.game_info() {
        println!("Game: {}", info.summary());
        if let Some(komi) = info.komi {
            println!("Komi: {komi}");
        }
        if let Some(t) = info.time_settings {
            println!("Time: {t}");
        }
    }
    Ok(())
}

fn normalize(file: &Path, output: Option<&Path>, application: Option<&str>) -> Result<()> {
    let tree = load(file)?;
    match output {
        Some(path) => {
            let f = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            xml::write(BufWriter::new(f), &tree, application)?;
            info!(path = %path.display(), "wrote normalized record");
        }
        None => xml::write(io::stdout().lock(), &tree, application)?,
    }
    Ok(())
}

/// Clock time advanced by hand, for simulated thinking times.
#[derive(Clone, Default)]
struct SimulatedTime(Arc<AtomicU64>);

impl TimeSource for SimulatedTime {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn demo(board_size: usize, moves: usize, seed: u64) -> Result<()> {
    if !(1..=MAX_BOARD_SIZE).contains(&board_size) {
        bail!("board size must be between 1 and {MAX_BOARD_SIZE}");
    }
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut tree = GameTree::new(board_size)?;
    let root = tree.root();
    let settings = TimeSettings::with_byoyomi(60, 30, 5);
    tree.create_game_info(root)?
        .set_player(Color::Black, "Random Black")
        .set_player(Color::White, "Random White")
        .set_komi(Komi::new(6.5)?)
        .set_time_settings(settings);

    let time = SimulatedTime::default();
    let clock = Clock::new(time.clone());
    clock.set_time_settings(Some(settings));

    let mut points: Vec<Point> = (0..board_size)
        .flat_map(|x| (0..board_size).map(move |y| Point::new(x, y)))
        .collect();
    rng.shuffle(&mut points);

    let mut node = root;
    let mut color = Color::Black;
    for (i, point) in points.iter().copied().take(moves).enumerate() {
        clock.start(color);
        time.0.fetch_add(rng.u64(500..8_000), Ordering::SeqCst);
        node = tree.append_move(node, Move::new(color, Some(point)))?;
        clock.stop_into(Some(tree.node_mut(node)));
        if i == 1 {
            // Show an alternative answer to Black's first move.
            let father = tree.father(node).unwrap_or(root);
            let alt = tree.append_move(father, Move::pass(color))?;
            tree.node_mut(alt).set_comment("Tenuki");
        }
        color = color.other();
    }

    xml::write(io::stdout().lock(), &tree, Some(concat!("go-record:", env!("CARGO_PKG_VERSION"))))?;
    Ok(())
}
