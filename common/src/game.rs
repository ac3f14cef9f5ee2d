use crate::board::Board;
use crate::grid::{Cell, Dimensions};
use crate::knowledge::KnowledgeBase;
use crate::sat::{self, Audit};
use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Board size, mine count and an optional seed for reproducible games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub height: usize,
    pub width: usize,
    pub mines: usize,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            height: 8,
            width: 8,
            mines: 8,
            seed: None,
        }
    }
}

impl GameConfig {
    pub const USAGE: &'static str = "usage: minesweeper-ai [HEIGHT WIDTH MINES [SEED]]";

    /// Reads `HEIGHT WIDTH MINES [SEED]`, falling back to the defaults when no
    /// arguments are given. `args` excludes the program name.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let args: Vec<String> = args.into_iter().collect();
        let mut config = GameConfig::default();

        match args.as_slice() {
            [] => {}
            [height, width, mines, rest @ ..] if rest.len() <= 1 => {
                config.height = parse_arg(height, "height")?;
                config.width = parse_arg(width, "width")?;
                config.mines = parse_arg(mines, "mine count")?;
                config.seed = rest.first().map(|seed| parse_arg(seed, "seed")).transpose()?;
            }
            _ => anyhow::bail!(Self::USAGE),
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.height > 0 && self.width > 0,
            "board dimensions must be positive, got {}x{}",
            self.height,
            self.width
        );
        let cells = Dimensions::new(self.height, self.width)
            .cell_count()
            .ok_or_else(|| {
                anyhow::anyhow!("a {}x{} board has too many cells", self.height, self.width)
            })?;
        anyhow::ensure!(
            self.mines < cells,
            "total mines must be less than the number of cells on the board"
        );
        Ok(())
    }

    /// Seeded when a seed was given, otherwise seeded from the OS.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

fn parse_arg<T>(value: &str, name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {name}: {value:?}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// How the bot picked a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// The cell is known to be safe.
    Deduced,
    /// Nothing safe was known; the cell was drawn at random from the open cells.
    Guessed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub cell: Cell,
    pub kind: MoveKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Revealed(usize),
    Mine,
}

/// One completed turn of the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    pub cell: Cell,
    pub kind: MoveKind,
    pub outcome: Outcome,
}

/// What the player sees at a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    KnownMine,
    KnownSafe,
    Revealed(usize),
    Exploded,
}

impl fmt::Display for CellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellView::Hidden => f.pad("■"),
            CellView::KnownMine => f.pad("F"),
            CellView::KnownSafe => f.pad("."),
            CellView::Revealed(count) => f.pad(&count.to_string()),
            CellView::Exploded => f.pad("*"),
        }
    }
}

/// A board together with the knowledge gathered by probing it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Game {
    board: Board,
    knowledge: KnowledgeBase,
    /// Neighbour mine count of every probed cell.
    revealed: BTreeMap<Cell, usize>,
    exploded: Option<Cell>,
    pub game_state: GameState,
}

impl Game {
    pub fn new<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> anyhow::Result<Self> {
        config.validate()?;
        let board = Board::generate(config.height, config.width, config.mines, rng)?;
        Ok(Game::from_board(board))
    }

    pub fn from_board(board: Board) -> Self {
        let knowledge = KnowledgeBase::new(board.dimensions());
        Game {
            board,
            knowledge,
            revealed: BTreeMap::new(),
            exploded: None,
            game_state: GameState::Playing,
        }
    }

    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        bcs::from_bytes(bts).context("malformed game state")
    }

    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        bcs::to_bytes(self).context("failed to encode game state")
    }

    pub fn dimensions(&self) -> Dimensions {
        self.board.dimensions()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn revealed(&self) -> &BTreeMap<Cell, usize> {
        &self.revealed
    }

    pub fn view(&self, cell: Cell) -> CellView {
        if self.exploded == Some(cell) {
            CellView::Exploded
        } else if let Some(&count) = self.revealed.get(&cell) {
            CellView::Revealed(count)
        } else if self.knowledge.known_mines().contains(&cell) {
            CellView::KnownMine
        } else if self.knowledge.known_safe().contains(&cell) {
            CellView::KnownSafe
        } else {
            CellView::Hidden
        }
    }

    /// A known safe cell if there is one, otherwise a random open cell.
    pub fn next_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        if let Some(cell) = self.knowledge.make_safe_move() {
            return Some(Move {
                cell,
                kind: MoveKind::Deduced,
            });
        }
        self.knowledge.make_random_move(rng).map(|cell| Move {
            cell,
            kind: MoveKind::Guessed,
        })
    }

    /// Probes `cell`: a mine loses the game, anything else feeds its neighbour count to
    /// the knowledge base. The game is won once every mine has been identified.
    pub fn reveal(&mut self, cell: Cell) -> anyhow::Result<Outcome> {
        if self.game_state != GameState::Playing {
            anyhow::bail!("game_ended");
        }

        if self.board.is_mine(cell) {
            self.exploded = Some(cell);
            self.game_state = GameState::Lost;
            return Ok(Outcome::Mine);
        }

        let count = self.board.nearby_mines(cell);
        self.knowledge
            .record_observation(cell, count)
            .with_context(|| format!("failed to record the count at {cell}"))?;
        self.revealed.insert(cell, count);

        if self.board.won(self.knowledge.known_mines()) {
            self.game_state = GameState::Won;
        }

        Ok(Outcome::Revealed(count))
    }

    /// Plays a single bot move. Returns `None` once the game is over.
    pub fn play_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<Option<Turn>> {
        if self.game_state != GameState::Playing {
            return Ok(None);
        }

        let Some(Move { cell, kind }) = self.next_move(rng) else {
            // Every open cell is a known mine, which with a sound engine means all of them.
            anyhow::ensure!(
                self.board.won(self.knowledge.known_mines()),
                "no moves left but the mines are not all identified"
            );
            self.game_state = GameState::Won;
            return Ok(None);
        };

        let outcome = self.reveal(cell)?;
        Ok(Some(Turn {
            cell,
            kind,
            outcome,
        }))
    }

    pub fn play_to_end<R: Rng + ?Sized>(&mut self, rng: &mut R) -> anyhow::Result<GameState> {
        while self.play_turn(rng)?.is_some() {}
        Ok(self.game_state)
    }

    /// Checks the knowledge base against exact deduction over the revealed counts.
    pub fn audit(&self) -> anyhow::Result<Audit> {
        sat::audit(&self.knowledge, &self.revealed)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Dimensions { height, width } = self.dimensions();
        for row in 0..height {
            for col in 0..width {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.view(Cell::new(row, col)))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn cell(row: usize, col: usize) -> Cell {
        Cell::new(row, col)
    }

    /// Plays a whole game, checking the engine's invariants against the true board after
    /// every turn.
    fn play_checked(config: &GameConfig, seed: u64) -> GameState {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new(config, &mut rng).unwrap();
        let mut mines = BTreeSet::new();
        let mut safe = BTreeSet::new();
        let mut moves = BTreeSet::new();

        for _ in 0..=config.height * config.width {
            let Some(turn) = game.play_turn(&mut rng).unwrap() else {
                return game.game_state;
            };
            if turn.kind == MoveKind::Deduced {
                assert_eq!(turn.outcome, Outcome::Revealed(game.board().nearby_mines(turn.cell)));
            }

            let kb = game.knowledge();
            assert!(kb.known_mines().is_disjoint(kb.known_safe()));
            assert!(kb.known_mines().is_subset(game.board().mines()));
            assert!(kb.known_safe().is_disjoint(game.board().mines()));

            assert!(mines.is_subset(kb.known_mines()));
            assert!(safe.is_subset(kb.known_safe()));
            assert!(moves.is_subset(kb.moves_made()));
            mines = kb.known_mines().clone();
            safe = kb.known_safe().clone();
            moves = kb.moves_made().clone();

            if game.game_state != GameState::Lost {
                let report = game.audit().unwrap();
                assert!(report.is_sound(), "unsound facts: {:?}", report.unsound);
            }
        }
        panic!("game did not finish");
    }

    #[test]
    fn test_engine_is_sound_on_small_boards() {
        let shapes = [(3, 3, 2), (4, 4, 3), (3, 6, 4), (5, 5, 5)];
        for (height, width, mines) in shapes {
            let config = GameConfig {
                height,
                width,
                mines,
                seed: None,
            };
            for seed in 0..40 {
                play_checked(&config, seed);
            }
        }
    }

    #[test]
    fn test_engine_is_sound_on_default_board() {
        let config = GameConfig::default();
        let mut won = 0;
        for seed in 0..20 {
            if play_checked(&config, seed) == GameState::Won {
                won += 1;
            }
        }
        assert!(won > 0);
    }

    #[test]
    fn test_mine_free_board_is_won() {
        let board = Board::from_mines(Dimensions::new(3, 3), []).unwrap();
        let mut game = Game::from_board(board);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(game.play_to_end(&mut rng).unwrap(), GameState::Won);
        assert_eq!(game.play_turn(&mut rng).unwrap(), None);
    }

    #[test]
    fn test_single_row_game() {
        let board = Board::from_mines(Dimensions::new(1, 4), [cell(0, 3)]).unwrap();
        let mut game = Game::from_board(board);

        assert_eq!(game.reveal(cell(0, 0)).unwrap(), Outcome::Revealed(0));
        assert_eq!(game.to_string(), "0 . ■ ■\n");

        let mut rng = StdRng::seed_from_u64(0);
        let turn = game.play_turn(&mut rng).unwrap().unwrap();
        assert_eq!(turn.cell, cell(0, 1));
        assert_eq!(turn.kind, MoveKind::Deduced);

        assert_eq!(game.play_to_end(&mut rng).unwrap(), GameState::Won);
        assert_eq!(game.to_string(), "0 0 1 F\n");
    }

    #[test]
    fn test_revealing_a_mine_loses() {
        let board = Board::from_mines(Dimensions::new(2, 2), [cell(1, 1)]).unwrap();
        let mut game = Game::from_board(board);

        assert_eq!(game.reveal(cell(1, 1)).unwrap(), Outcome::Mine);
        assert_eq!(game.game_state, GameState::Lost);
        assert_eq!(game.view(cell(1, 1)), CellView::Exploded);
        assert!(game.reveal(cell(0, 0)).is_err());
    }

    #[test]
    fn test_reprobe_is_an_error() {
        let board = Board::from_mines(Dimensions::new(3, 3), [cell(2, 2)]).unwrap();
        let mut game = Game::from_board(board);
        game.reveal(cell(0, 2)).unwrap();
        assert!(game.reveal(cell(0, 2)).is_err());
    }

    #[test]
    fn test_bcs_transport_mid_game() {
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = Game::new(&config, &mut rng).unwrap();
        game.play_turn(&mut rng).unwrap();
        game.play_turn(&mut rng).unwrap();

        let bts = game.serialize().unwrap();
        assert_eq!(Game::deserialize(&bts).unwrap(), game);
        assert!(Game::deserialize(&bts[..bts.len() / 2]).is_err());
    }

    #[test]
    fn test_config_from_args() {
        assert_eq!(GameConfig::from_args(vec![]).unwrap(), GameConfig::default());

        let args = ["4", "5", "3", "17"].map(String::from);
        assert_eq!(
            GameConfig::from_args(args).unwrap(),
            GameConfig {
                height: 4,
                width: 5,
                mines: 3,
                seed: Some(17),
            }
        );

        assert!(GameConfig::from_args(["4", "5"].map(String::from)).is_err());
        assert!(GameConfig::from_args(["4", "x", "3"].map(String::from)).is_err());
        assert!(GameConfig::from_args(["2", "2", "4"].map(String::from)).is_err());
        assert!(GameConfig::from_args(["0", "2", "0"].map(String::from)).is_err());
        assert!(
            GameConfig::from_args(["18446744073709551615", "2", "0"].map(String::from)).is_err()
        );
    }

    #[test]
    fn test_seeded_games_repeat() {
        let config = GameConfig {
            seed: Some(5),
            ..GameConfig::default()
        };
        let first = Game::new(&config, &mut config.rng()).unwrap();
        let second = Game::new(&config, &mut config.rng()).unwrap();
        assert_eq!(first.board(), second.board());
    }
}
