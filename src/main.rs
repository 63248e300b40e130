//! Quantum Go command-line front end.
//!
//! ## Usage
//!
//! - `quantum-go` - Show a demo
//! - `quantum-go play` - Start the text protocol on stdin/stdout
//! - `quantum-go demo` - Play a short scripted quantum game
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quantum_go::ai::Difficulty;
use quantum_go::board::{Color, str_coord};
use quantum_go::constants::DEFAULT_SIZE;
use quantum_go::engine::{Game, GameConfig};
use quantum_go::game::GameMode;
use quantum_go::protocol::ProtocolEngine;

/// Quantum Go: Go rules with superposition, entanglement and decoherence
#[derive(Parser)]
#[command(name = "quantum-go")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Board size
    #[arg(long, global = true, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Game mode: classic, superposition, entanglement or quantum
    #[arg(long, global = true, default_value = "quantum")]
    mode: GameMode,

    /// Seed for quantum randomness
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Let the engine play white at the given difficulty (easy, medium, hard)
    #[arg(long, global = true)]
    ai: Option<Difficulty>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text protocol server on stdin/stdout
    Play,
    /// Run a short scripted demo
    Demo,
}

impl Cli {
    fn config(&self) -> GameConfig {
        let mut config = GameConfig::default()
            .with_size(self.size)
            .with_mode(self.mode);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(difficulty) = self.ai {
            config = config.with_ai(Color::White, difficulty);
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        Some(Commands::Play) => {
            let mut engine = ProtocolEngine::new(config);
            engine.run().context("protocol loop failed")?;
        }
        Some(Commands::Demo) | None => run_demo(config)?,
    }
    Ok(())
}

fn run_demo(config: GameConfig) -> Result<()> {
    println!("Quantum Go ({} mode)\n", config.mode);
    let mut game = Game::new(config);
    let size = game.board().size();
    let center = size * size / 2;

    game.place_stone(center)?;
    game.run_pending();
    if !game.is_over() && config.ai.is_none() {
        game.place_stone(0)?;
        game.run_pending();
    }
    println!("{}", game.board());

    if game.mode().is_quantum() && !game.is_over() {
        match game.hadamard(None) {
            Ok(pt) => println!("Hadamard superposed {}", str_coord(pt, size)),
            Err(e) => println!("Hadamard failed: {e}"),
        }
        println!("{}", game.board());
        println!(
            "Energy: black {} white {}",
            game.energy(Color::Black),
            game.energy(Color::White)
        );
    }

    println!("Score so far: {}", game.provisional_score());
    Ok(())
}
