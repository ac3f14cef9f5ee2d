use minesweeper_ai::*;

fn main() -> anyhow::Result<()> {
    // --- 1. Initialization ---
    let config = GameConfig::from_args(std::env::args().skip(1))?;
    let mut rng = config.rng();
    let mut game = Game::new(&config, &mut rng)?;

    println!("--- Autonomous Minesweeper Bot ---");
    println!(
        "{}x{} board, {} mines. Strategy: play deduced safe cells, guess otherwise.",
        config.height, config.width, config.mines
    );
    print_board(&game);

    // --- 2. Game Loop ---
    let mut move_count = 0;
    while let Some(turn) = game.play_turn(&mut rng)? {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        match turn.kind {
            MoveKind::Deduced => println!("Logic found a guaranteed safe cell."),
            MoveKind::Guessed => println!("No logically safe move found. Made a random guess."),
        }
        match turn.outcome {
            Outcome::Revealed(count) => {
                println!("Bot reveals {} with {} adjacent mines.", turn.cell, count)
            }
            Outcome::Mine => println!("Bot reveals {} and hits a mine.", turn.cell),
        }

        print_board(&game);

        // A guess means propagation ran dry; report what exact deduction would still know.
        if turn.kind == MoveKind::Guessed && game.game_state == GameState::Playing {
            let audit = game.audit()?;
            anyhow::ensure!(audit.is_sound(), "engine made unsound deductions: {:?}", audit.unsound);
            println!(
                "Audit: exact deduction finds {} more mines and {} more safe cells.",
                audit.missed_mines, audit.missed_safe
            );
        }
    }

    // --- 3. Final Result ---
    println!("\n--- Game Over ---");
    println!("Mines were:\n{}", game.board());

    match game.game_state {
        GameState::Won => println!("Result: the bot identified every mine."),
        GameState::Lost => println!("Result: the bot hit a mine and lost."),
        GameState::Playing => println!("Result: the game ended unexpectedly."),
    }

    Ok(())
}

fn print_board(game: &Game) {
    let Dimensions { height, width } = game.dimensions();

    print!("   ");
    for col in 0..width {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(width));

    for row in 0..height {
        print!("{:^2}|", row);
        for col in 0..width {
            print!("{:^3}", game.view(Cell::new(row, col)));
        }
        println!();
    }
    println!();
}
