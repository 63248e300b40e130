//! Line-based text protocol in the style of GTP version 2.
//!
//! Each request is one line, optionally prefixed by a numeric id. Replies
//! start with `=` on success or `?` on failure, echo the id, and end with a
//! blank line. Deferred follow-up work (turn handoff, end-of-game checks, AI
//! replies) is drained after every command, so each reply reflects a settled
//! game.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`, `known_command <cmd>`, `quit`
//! - `showboard` - Render the board
//! - `play <vertex|pass>` / `pass` - Move for the player to move
//! - `hadamard [vertex]`, `entangle <v> <v>`, `pauli_x <v>`, `pauli_z <v>`,
//!   `measure <v>`, `measure_all`, `tunnel <from> <to>`, `teleport <from> <to>`,
//!   `bell <v> <v>` - Quantum gates for the player to move
//! - `energy` - Both energy balances
//! - `score` - Final or provisional score
//! - `reset` - Start over
//! - `savegame` / `loadgame <json>` - Snapshot as a single JSON line
//!
//! ## Example
//!
//! ```ignore
//! use quantum_go::engine::GameConfig;
//! use quantum_go::protocol::ProtocolEngine;
//! let mut engine = ProtocolEngine::new(GameConfig::default());
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::board::{Point, parse_coord, str_coord};
use crate::engine::{Game, GameConfig};
use crate::error::GameError;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "bell",
    "energy",
    "entangle",
    "hadamard",
    "known_command",
    "list_commands",
    "loadgame",
    "measure",
    "measure_all",
    "name",
    "pass",
    "pauli_x",
    "pauli_z",
    "play",
    "protocol_version",
    "quit",
    "reset",
    "savegame",
    "score",
    "showboard",
    "teleport",
    "tunnel",
    "version",
];

type Reply = (bool, String);

fn fail(e: GameError) -> Reply {
    (false, e.to_string())
}

/// Protocol front end owning one game.
pub struct ProtocolEngine {
    game: Game,
}

impl ProtocolEngine {
    pub fn new(config: GameConfig) -> Self {
        Self {
            game: Game::new(config),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run the command loop on stdin and stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop until `quit` or end of input.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    fn vertex(&self, arg: Option<&&str>) -> Result<Point, String> {
        let arg = arg.ok_or_else(|| "missing argument".to_string())?;
        parse_coord(arg, self.game.board().size()).ok_or_else(|| format!("invalid vertex: {arg}"))
    }

    fn vertex_pair(&self, args: &[&str]) -> Result<(Point, Point), String> {
        Ok((self.vertex(args.first())?, self.vertex(args.get(1))?))
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> Reply {
        debug!(command, ?args, "protocol command");
        let reply = self.dispatch(command, args);
        self.game.run_pending();
        reply
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Reply {
        let size = self.game.board().size();
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => match args.first() {
                Some(cmd) => {
                    let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                    (true, known.to_string())
                }
                None => (false, "missing argument".to_string()),
            },

            "quit" => (true, String::new()),

            "showboard" => (true, format!("\n{}", self.game.board())),

            "play" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                if arg.eq_ignore_ascii_case("pass") {
                    return self.dispatch("pass", &[]);
                }
                let pt = match self.vertex(Some(arg)) {
                    Ok(pt) => pt,
                    Err(e) => return (false, e),
                };
                match self.game.place_stone(pt) {
                    Ok(()) => (true, String::new()),
                    Err(e) => fail(e),
                }
            }

            "pass" => match self.game.pass() {
                Ok(()) => (true, String::new()),
                Err(e) => fail(e),
            },

            "hadamard" => {
                let target = match args.first() {
                    Some(_) => match self.vertex(args.first()) {
                        Ok(pt) => Some(pt),
                        Err(e) => return (false, e),
                    },
                    None => None,
                };
                match self.game.hadamard(target) {
                    Ok(pt) => (true, str_coord(pt, size)),
                    Err(e) => fail(e),
                }
            }

            "entangle" | "teleport" | "tunnel" | "bell" => {
                let (a, b) = match self.vertex_pair(args) {
                    Ok(pair) => pair,
                    Err(e) => return (false, e),
                };
                let result = match command {
                    "entangle" => self.game.entangle(a, b).map(|()| String::new()),
                    "teleport" => self.game.teleport(a, b).map(|()| String::new()),
                    "tunnel" => self.game.tunnel(a, b).map(|o| {
                        let verb = if o.moved { "moved" } else { "stayed" };
                        format!("{verb} {:.3}", o.probability)
                    }),
                    _ => self.game.bell_measure(a, b).map(|o| {
                        let relation = if o.same { "same" } else { "opposite" };
                        format!("{relation} {} {}", o.colors.0, o.colors.1)
                    }),
                };
                result.map_or_else(fail, |msg| (true, msg))
            }

            "pauli_x" | "pauli_z" | "measure" => {
                let pt = match self.vertex(args.first()) {
                    Ok(pt) => pt,
                    Err(e) => return (false, e),
                };
                let result = match command {
                    "pauli_x" => self.game.pauli_x(pt).map(|c| c.to_string()),
                    "pauli_z" => self.game.pauli_z(pt).map(|p| format!("{p:.2}")),
                    _ => self
                        .game
                        .measure(pt)
                        .map(|c| c.map_or("empty".to_string(), |c| c.to_string())),
                };
                result.map_or_else(fail, |msg| (true, msg))
            }

            "measure_all" => match self.game.measure_all() {
                Ok(n) => (true, n.to_string()),
                Err(e) => fail(e),
            },

            "energy" => {
                let q = self.game.quantum();
                (
                    true,
                    format!("black {} white {}", q.energy.black, q.energy.white),
                )
            }

            "score" => match self.game.result() {
                Some(result) => (true, result.to_string()),
                None => (true, self.game.provisional_score().to_string()),
            },

            "reset" => {
                self.game.reset();
                (true, String::new())
            }

            "savegame" => match self.game.save_json() {
                Ok(json) => (true, json),
                Err(e) => fail(e),
            },

            "loadgame" => {
                if args.is_empty() {
                    return (false, "missing argument".to_string());
                }
                match self.game.load_json(&args.join(" ")) {
                    Ok(()) => (true, String::new()),
                    Err(e) => fail(e),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}
