use minesweeper_ai as ms;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn create_game(height: u8, width: u8, mines: u16) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let config = ms::GameConfig {
        height: height as usize,
        width: width as usize,
        mines: mines as usize,
        seed: None,
    };
    let game = ms::Game::new(&config, &mut rand::rng()).map_err(|e| e.to_string())?;
    game.serialize().map_err(|e| e.to_string())
}

/// 0 while playing, 1 once won, 2 once lost.
#[wasm_bindgen]
pub fn game_state(bts: Vec<u8>) -> Result<u8, String> {
    console_error_panic_hook::set_once();

    let game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(match game.game_state {
        ms::GameState::Playing => 0,
        ms::GameState::Won => 1,
        ms::GameState::Lost => 2,
    })
}

/// Probes a cell chosen by the player.
#[wasm_bindgen]
pub fn choose_cell(bts: Vec<u8>, row: usize, col: usize) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    game.reveal(ms::Cell::new(row, col))
        .map_err(|e| e.to_string())?;
    game.serialize().map_err(|e| e.to_string())
}

/// Lets the engine pick and probe the next cell.
#[wasm_bindgen]
pub fn bot_move(bts: Vec<u8>) -> Result<Vec<u8>, String> {
    console_error_panic_hook::set_once();

    let mut game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    game.play_turn(&mut rand::rng()).map_err(|e| e.to_string())?;
    game.serialize().map_err(|e| e.to_string())
}

/// Row-major cell views: the count for revealed cells, -1 hidden, -2 known mine,
/// -3 known safe, -4 the mine that ended the game.
#[wasm_bindgen]
pub fn get_cells(bts: Vec<u8>) -> Result<Vec<i8>, String> {
    console_error_panic_hook::set_once();

    let game = ms::Game::deserialize(&bts).map_err(|e| e.to_string())?;
    Ok(game
        .dimensions()
        .cells()
        .map(|cell| match game.view(cell) {
            ms::CellView::Hidden => -1,
            ms::CellView::KnownMine => -2,
            ms::CellView::KnownSafe => -3,
            ms::CellView::Exploded => -4,
            ms::CellView::Revealed(n) => n as i8,
        })
        .collect())
}
