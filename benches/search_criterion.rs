use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chess_arbiter::board::Square;
use chess_arbiter::game::{GameConfig, GameState};
use chess_arbiter::layout::BoardLayout;
use chess_arbiter::search::Search;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    layout: Option<&'static str>,
    depths: &'static [u32],
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "standard",
        layout: None,
        depths: &[1, 2],
    },
    BenchCase {
        name: "queen_and_rook_endgame",
        layout: Some(
            "e1 King White\nd1 Queen White\nh1 Rook White\n\
             e8 King Black\nd5 Rook Black\nc6 Pawn Black\na4 Knight Black",
        ),
        depths: &[1, 2, 3],
    },
];

fn two_player_game(case: &BenchCase) -> GameState {
    let config = GameConfig::default().with_computer(None);
    let layout = match case.layout {
        Some(text) => BoardLayout::parse(text).expect("bench layout parses"),
        None => BoardLayout::standard(),
    };
    GameState::with_layout(&layout, config).expect("bench layout is valid")
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("minimax");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));

    for case in CASES {
        let game = two_player_game(case);
        for &depth in case.depths {
            group.bench_with_input(BenchmarkId::new(case.name, depth), &depth, |b, &depth| {
                b.iter(|| {
                    let mut search = Search::new();
                    search.set_max_depth(depth);
                    black_box(search.find_best_move(black_box(&game)))
                })
            });
        }
    }
    group.finish();
}

fn bench_end_of_turn(c: &mut Criterion) {
    let config = GameConfig::default().with_computer(None);
    let game = GameState::standard(config).expect("standard layout");
    let pawn = game.board().piece_at(Square::new(4, 1)).expect("pawn on e2");

    c.bench_function("end_of_turn/e2e4", |b| {
        b.iter(|| {
            let mut scratch = game.scratch_copy();
            black_box(scratch.simulate_move(pawn, Square::new(4, 3)))
        })
    });
}

criterion_group!(benches, bench_search, bench_end_of_turn);
criterion_main!(benches);
