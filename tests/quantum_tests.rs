//! Quantum layer tests: gates through the orchestrator, the energy economy,
//! entanglement symmetry, decoherence and save/load.

use proptest::prelude::*;

use quantum_go::board::{Board, Color, Point};
use quantum_go::constants::{DECOHERENCE_CEIL, DECOHERENCE_FLOOR, MAX_ENERGY};
use quantum_go::engine::{Game, GameConfig};
use quantum_go::error::GameError;
use quantum_go::game::GameMode;
use quantum_go::quantum::{Gate, QuantumState};

// =============================================================================
// Helper functions
// =============================================================================

fn quantum_game(seed: u64) -> Game {
    Game::new(
        GameConfig::default()
            .with_size(9)
            .with_mode(GameMode::Quantum)
            .with_seed(seed),
    )
}

fn play(game: &mut Game, pt: Point) {
    game.place_stone(pt).unwrap();
    game.run_pending();
}

/// Every link has a matching back-reference.
fn assert_symmetric(board: &Board) {
    for pt in board.points() {
        if let Some(p) = board.cell(pt).entangled_with {
            assert_ne!(p, pt);
            assert_eq!(board.cell(p).entangled_with, Some(pt), "{pt} -> {p} is one-sided");
        }
    }
}

// =============================================================================
// Gates via the orchestrator
// =============================================================================

#[test]
fn test_gates_keep_the_turn() {
    let mut game = quantum_game(1);
    play(&mut game, 40);
    play(&mut game, 0);
    let turn = game.state().turn_number;

    let pt = game.hadamard(Some(31)).unwrap();
    assert_eq!(pt, 31);
    assert_eq!(game.current_player(), Color::Black);
    assert_eq!(game.state().turn_number, turn);
    assert!(!game.is_processing_move());
}

#[test]
fn test_hadamard_needs_an_own_stone() {
    let mut game = quantum_game(1);
    assert_eq!(
        game.hadamard(None),
        Err(GameError::NoEligibleTarget {
            gate: Gate::Hadamard,
            player: Color::Black
        })
    );
    assert_eq!(game.energy(Color::Black), 3);
}

#[test]
fn test_entangle_rules_through_game() {
    let mut game = quantum_game(3);
    play(&mut game, 0);
    play(&mut game, 80);
    play(&mut game, 2);
    play(&mut game, 78);

    game.entangle(0, 2).unwrap();
    assert_eq!(game.count_entanglements(), 1);
    assert_symmetric(game.board());
    assert!(matches!(
        game.entangle(0, 2),
        Err(GameError::InvalidEntanglementTarget { .. })
    ));
    assert!(matches!(
        game.entangle(0, 80),
        Err(GameError::InvalidEntanglementTarget { .. })
    ));
}

#[test]
fn test_capture_dissolves_entanglement() {
    let mut game = quantum_game(5);
    play(&mut game, 0);
    play(&mut game, 80);
    play(&mut game, 2);
    play(&mut game, 1);
    game.entangle(0, 2).unwrap();
    play(&mut game, 40);

    // White fills the last liberty of the entangled stone at 0.
    play(&mut game, 9);
    assert_eq!(game.board().stone(0), None);
    assert_eq!(game.count_entanglements(), 0);
    assert!(!game.board().cell(2).is_entangled());
    assert_symmetric(game.board());
}

#[test]
fn test_pauli_x_flips_a_stone() {
    let mut game = quantum_game(1);
    play(&mut game, 40);
    play(&mut game, 41);
    assert_eq!(game.pauli_x(41), Ok(Color::Black));
    assert_eq!(game.count_stones(Color::White), 0);
    assert!(matches!(
        game.pauli_x(42),
        Err(GameError::InvalidGateTarget { gate: Gate::PauliX, .. })
    ));
}

#[test]
fn test_measure_collapses_superposition() {
    let mut game = quantum_game(9);
    play(&mut game, 40);
    play(&mut game, 0);
    let pt = game.hadamard(None).unwrap();
    let energy = game.energy(Color::Black);

    let outcome = game.measure(pt).unwrap();
    let cell = game.cell(pt).unwrap();
    assert!(!cell.superposition);
    assert_eq!(cell.classical, outcome);
    assert_eq!(game.energy(Color::Black), energy);

    let record = game.measurement_log().last().unwrap();
    assert_eq!(record.index, pt);
    assert_eq!(record.collapsed_to, outcome);
    assert_eq!(record.turn, game.state().turn_number);
}

#[test]
fn test_measure_all_clears_every_superposition() {
    let mut game = quantum_game(2);
    play(&mut game, 40);
    play(&mut game, 0);
    game.hadamard(None).unwrap();
    game.hadamard(None).unwrap();
    assert_eq!(game.count_superpositions(), 2);

    assert_eq!(game.measure_all(), Ok(2));
    assert_eq!(game.count_superpositions(), 0);
    assert_eq!(game.measurement_log().len(), 2);
}

#[test]
fn test_tunnel_and_teleport() {
    let mut game = quantum_game(4);
    play(&mut game, 40);
    play(&mut game, 0);

    let outcome = game.tunnel(40, 41).unwrap();
    assert!((outcome.probability - (-1.0f64 / 3.0).exp()).abs() < 1e-12);
    assert_eq!(game.energy(Color::Black), 2);
    let holder = if outcome.moved { 41 } else { 40 };
    assert_eq!(game.board().stone(holder), Some(Color::Black));
    assert_eq!(game.count_stones(Color::Black), 1);

    assert!(matches!(
        game.teleport(holder, 60),
        Err(GameError::InvalidGateTarget { gate: Gate::Teleport, .. })
    ));
}

#[test]
fn test_bell_measurement_logs_both_cells() {
    let mut game = quantum_game(6);
    play(&mut game, 0);
    play(&mut game, 80);
    play(&mut game, 2);
    play(&mut game, 78);
    game.entangle(0, 2).unwrap();

    let outcome = game.bell_measure(0, 2).unwrap();
    assert_eq!(game.board().stone(0), Some(outcome.colors.0));
    assert_eq!(game.board().stone(2), Some(outcome.colors.1));
    assert_eq!(game.count_entanglements(), 0);
    let indices: Vec<Point> = game.measurement_log().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 2]);
}

// =============================================================================
// Mode gating and maintenance
// =============================================================================

#[test]
fn test_superposition_mode_offers_two_gates() {
    let mut game = Game::new(GameConfig::default().with_size(9).with_mode(GameMode::Superposition));
    play(&mut game, 40);
    assert!(game.cell(40).unwrap().superposition);
    assert_eq!(game.count_stones(Color::Black), 0);

    for result in [
        game.tunnel(40, 41).map(drop),
        game.teleport(40, 41),
        game.pauli_z(40).map(drop),
    ] {
        assert!(matches!(result, Err(GameError::GateUnavailable { .. })));
    }
}

#[test]
fn test_classic_has_no_energy_economy() {
    let mut game = Game::new(GameConfig::default().with_size(9));
    play(&mut game, 40);
    play(&mut game, 41);
    assert_eq!(game.energy(Color::Black), 3);
    assert_eq!(game.energy(Color::White), 3);
}

#[test]
fn test_energy_regenerates_for_the_mover_only() {
    let mut game = quantum_game(1);
    play(&mut game, 40);
    assert_eq!(game.energy(Color::Black), 4);
    assert_eq!(game.energy(Color::White), 3);
    for pt in [0, 1, 2, 3] {
        play(&mut game, pt);
    }
    assert_eq!(game.energy(Color::Black), MAX_ENERGY);
    assert_eq!(game.energy(Color::White), MAX_ENERGY);
}

#[test]
fn test_decoherence_forces_measurement_over_turns() {
    let mut game = quantum_game(8);
    play(&mut game, 40);
    play(&mut game, 0);
    let pt = game.hadamard(None).unwrap();
    let mut last = game.cell(pt).unwrap().probability;

    for mv in [1, 2, 3, 4, 5] {
        let cell = game.cell(pt).unwrap().clone();
        if !cell.superposition {
            break;
        }
        assert!(cell.probability >= last);
        last = cell.probability;
        play(&mut game, 70 + mv);
    }
    assert!(!game.cell(pt).unwrap().superposition);
    assert!(game.measurement_log().iter().any(|r| r.index == pt));
}

// =============================================================================
// Save and load
// =============================================================================

#[test]
fn test_save_load_round_trip() {
    let mut game = quantum_game(12);
    play(&mut game, 0);
    play(&mut game, 80);
    play(&mut game, 2);
    play(&mut game, 78);
    game.entangle(0, 2).unwrap();
    game.hadamard(None).unwrap();
    let json = game.save_json().unwrap();

    let mut restored = Game::default();
    restored.load_json(&json).unwrap();
    assert_eq!(restored.board(), game.board());
    assert_eq!(restored.mode(), GameMode::Quantum);
    assert_eq!(restored.current_player(), game.current_player());
    assert_eq!(restored.energy(Color::Black), game.energy(Color::Black));
    assert_eq!(restored.measurement_log(), game.measurement_log());
    assert_symmetric(restored.board());

    // Play continues from the restored position.
    play(&mut restored, 40);
    assert_eq!(restored.board().stone(40), Some(Color::Black));
}

#[test]
fn test_corrupt_save_leaves_game_untouched() {
    let mut game = quantum_game(12);
    play(&mut game, 40);
    let board = game.board().clone();
    let turn = game.state().turn_number;

    assert!(matches!(game.load_json(""), Err(GameError::CorruptSaveData(_))));
    assert!(matches!(
        game.load_json(r#"{"board": [], "boardSize": 9}"#),
        Err(GameError::CorruptSaveData(_))
    ));
    assert_eq!(game.board(), &board);
    assert_eq!(game.state().turn_number, turn);
}

// =============================================================================
// Properties
// =============================================================================

#[derive(Clone, Debug)]
enum Op {
    Place(Point),
    Hadamard,
    Entangle(Point, Point),
    PauliX(Point),
    PauliZ(Point),
    Measure(Point),
    Tunnel(Point, Point),
    Teleport(Point, Point),
    Bell(Point, Point),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let pt = || 0usize..81;
    prop_oneof![
        3 => pt().prop_map(Op::Place),
        1 => Just(Op::Hadamard),
        1 => (pt(), pt()).prop_map(|(a, b)| Op::Entangle(a, b)),
        1 => pt().prop_map(Op::PauliX),
        1 => pt().prop_map(Op::PauliZ),
        1 => pt().prop_map(Op::Measure),
        1 => (pt(), pt()).prop_map(|(a, b)| Op::Tunnel(a, b)),
        1 => (pt(), pt()).prop_map(|(a, b)| Op::Teleport(a, b)),
        1 => (pt(), pt()).prop_map(|(a, b)| Op::Bell(a, b)),
    ]
}

fn apply(game: &mut Game, op: &Op) -> Result<(), GameError> {
    match *op {
        Op::Place(pt) => game.place_stone(pt),
        Op::Hadamard => game.hadamard(None).map(drop),
        Op::Entangle(a, b) => game.entangle(a, b),
        Op::PauliX(pt) => game.pauli_x(pt).map(drop),
        Op::PauliZ(pt) => game.pauli_z(pt).map(drop),
        Op::Measure(pt) => game.measure(pt).map(drop),
        Op::Tunnel(a, b) => game.tunnel(a, b).map(drop),
        Op::Teleport(a, b) => game.teleport(a, b),
        Op::Bell(a, b) => game.bell_measure(a, b).map(drop),
    }
}

proptest! {
    #[test]
    fn prop_rejected_ops_change_nothing(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut game = quantum_game(seed);
        for op in &ops {
            let board = game.board().clone();
            let energy = (game.energy(Color::Black), game.energy(Color::White));
            let scores = game.scores();

            if apply(&mut game, op).is_err() {
                prop_assert_eq!(game.board(), &board);
                prop_assert_eq!((game.energy(Color::Black), game.energy(Color::White)), energy);
                prop_assert_eq!(game.scores(), scores);
            }
            game.run_pending();

            for color in [Color::Black, Color::White] {
                prop_assert!(game.energy(color) <= MAX_ENERGY);
            }
            for pt in game.board().points() {
                let cell = game.board().cell(pt);
                if let Some(p) = cell.entangled_with {
                    prop_assert_eq!(game.board().cell(p).entangled_with, Some(pt));
                }
                prop_assert!(!(cell.superposition && cell.classical.is_some()));
                prop_assert!((0.0..=1.0).contains(&cell.probability));
            }
            if game.is_over() {
                break;
            }
        }
    }

    #[test]
    fn prop_decoherence_converges(
        p in 0.0f64..1.0,
        countdown in 1u32..12,
        seed in any::<u64>(),
    ) {
        let mut board = Board::new(9);
        let mut q = QuantumState::new();
        let mut rng = fastrand::Rng::with_seed(seed);
        board.superpose(40, Color::White, p, countdown);

        let mut last = p;
        for tick in 0..countdown {
            prop_assert!(board.cell(40).superposition);
            let forced = q.decohere(&mut board, &mut rng, tick + 1);
            if board.cell(40).superposition {
                let now = board.cell(40).probability;
                prop_assert!((now - 0.5).abs() >= (last - 0.5).abs());
                prop_assert!((DECOHERENCE_FLOOR.min(p)..=DECOHERENCE_CEIL.max(p)).contains(&now));
                last = now;
            } else {
                prop_assert_eq!(forced.len(), 1);
            }
        }
        prop_assert!(!board.cell(40).superposition);
        prop_assert_eq!(q.measurement_log.len(), 1);
    }
}
