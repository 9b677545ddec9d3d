use advisor_2048::engine::Board;
use advisor_2048::expectimax::Expectimax;

fn main() {
    let mut advisor = Expectimax::new();
    let mut rng = rand::thread_rng();
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    println!("{}", board);
    let mut move_count = 0u64;
    while let Some(direction) = advisor.best_move(board, &mut rng) {
        move_count += 1;
        board = board.make_move(direction, &mut rng);
        println!("{}", board);
    }
    let stats = advisor.last_stats();
    println!(
        "Moves made: {}, states considered for the last move: {}, max states considered for a move: {}",
        move_count, stats.nodes, stats.peak_nodes
    );
}
