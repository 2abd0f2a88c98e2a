use crate::board::{Board, GameStatus, StateKey};
use crate::config::{CreditAssignment, LearnerConfig};
use crate::error::Result;
use crate::q_table::QTable;
use crate::rules;
use rand::prelude::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Mark {
    Cross,
    Nought,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Self::Cross => Mark::Nought,
            Self::Nought => Mark::Cross,
        }
    }
    pub fn as_char(self) -> char {
        match self {
            Self::Cross => 'X',
            Self::Nought => 'O',
        }
    }
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Self::Cross),
            'O' => Some(Self::Nought),
            _ => None,
        }
    }
}

/// An automated opponent as seen by the match controller.
pub trait Player {
    fn get_name(&self) -> &str;
    fn get_mark(&self) -> Mark;
    fn set_mark(&mut self, mark: Mark);
    /// Picks a cell for `board`, on which it must be this player's turn.
    fn choose_move(&mut self, board: &Board) -> usize;
    /// Called after every move applied to the match board, by either side.
    fn observe(&mut self, _board: &Board, _status: GameStatus) {}
    /// Called when a fresh match starts.
    fn new_match(&mut self) {}
    fn persist(&self) -> Result<()> {
        Ok(())
    }
}

/// Exhaustive minimax without pruning or depth limit.
#[derive(Debug, Clone)]
pub struct MinimaxPlayer {
    pub name: String,
    pub mark: Mark,
}

impl MinimaxPlayer {
    pub fn new(mark: Mark) -> Self {
        MinimaxPlayer {
            name: "minimax".to_owned(),
            mark,
        }
    }

    /// Best cell for this player's mark; the lowest index wins ties.
    ///
    /// # Panics
    /// If `board` is already decided or full.
    pub fn choose_action(&self, board: &Board) -> usize {
        assert!(
            !rules::is_terminal(board),
            "minimax asked to move on a finished board {board}"
        );
        let mut best: Option<(usize, i8)> = None;
        for (mv, score) in self.score_moves(board) {
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
            }
        }
        let (mv, score) = best.expect("a non-terminal board has an empty cell");
        log::debug!("{} plays {} on {} (value {})", self.name, mv, board, score);
        mv
    }

    /// Game value of every legal move, in ascending index order.
    pub fn score_moves(&self, board: &Board) -> Vec<(usize, i8)> {
        rules::legal_moves(board)
            .into_iter()
            .map(|mv| {
                let next = board.with_move(mv, self.mark);
                (mv, Self::minimax(&next, self.mark, self.mark.other()))
            })
            .collect()
    }

    /// Value of `board` for `me` with `to_move` about to play:
    /// +1 won, 0 drawn, -1 lost, regardless of depth.
    pub fn minimax(board: &Board, me: Mark, to_move: Mark) -> i8 {
        match rules::status(board) {
            GameStatus::Won(mark) if mark == me => 1,
            GameStatus::Won(_) => -1,
            GameStatus::Drawn => 0,
            GameStatus::InProgress => {
                let scores = rules::legal_moves(board)
                    .into_iter()
                    .map(|mv| Self::minimax(&board.with_move(mv, to_move), me, to_move.other()));
                let best = if to_move == me { scores.max() } else { scores.min() };
                best.expect("an unfinished board has an empty cell")
            }
        }
    }
}

impl Player for MinimaxPlayer {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn get_mark(&self) -> Mark {
        self.mark
    }
    fn set_mark(&mut self, mark: Mark) {
        self.mark = mark;
    }
    fn choose_move(&mut self, board: &Board) -> usize {
        self.choose_action(board)
    }
}

/// Picks uniformly among legal moves. Training sparring partner.
#[derive(Debug)]
pub struct RandomPlayer {
    pub name: String,
    pub mark: Mark,
    rng: ChaCha8Rng,
}

impl RandomPlayer {
    pub fn new(mark: Mark, rng: ChaCha8Rng) -> Self {
        RandomPlayer {
            name: "random".to_owned(),
            mark,
            rng,
        }
    }
}

impl Player for RandomPlayer {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn get_mark(&self) -> Mark {
        self.mark
    }
    fn set_mark(&mut self, mark: Mark) {
        self.mark = mark;
    }
    fn choose_move(&mut self, board: &Board) -> usize {
        *rules::legal_moves(board)
            .choose(&mut self.rng)
            .expect("random player asked to move on a full board")
    }
}

/// Epsilon-greedy tabular learner. Owns its value table exclusively.
#[derive(Debug)]
pub struct QLearningPlayer {
    pub name: String,
    pub mark: Mark,
    pub config: LearnerConfig,
    q: QTable,
    rng: ChaCha8Rng,
    pending: Option<(StateKey, usize)>,
    table_path: Option<PathBuf>,
}

impl QLearningPlayer {
    pub fn new(mark: Mark, config: LearnerConfig, rng: ChaCha8Rng) -> Self {
        QLearningPlayer {
            name: "RL".to_owned(),
            mark,
            config,
            q: QTable::new(),
            rng,
            pending: None,
            table_path: None,
        }
    }

    pub fn seeded(mark: Mark, config: LearnerConfig, seed: u64) -> Self {
        Self::new(mark, config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Restores the table from `path` (empty when the file does not exist yet)
    /// and saves back to the same place on every [`Player::persist`].
    pub fn from_disk(mark: Mark, config: LearnerConfig, rng: ChaCha8Rng, path: &Path) -> Result<Self> {
        let mut player = Self::new(mark, config.validate()?, rng);
        player.load(path)?;
        player.table_path = Some(path.to_path_buf());
        Ok(player)
    }

    pub fn with_table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.table_path = Some(path.into());
        self
    }

    pub fn table(&self) -> &QTable {
        &self.q
    }

    pub fn table_mut(&mut self) -> &mut QTable {
        &mut self.q
    }

    /// Explores uniformly with probability epsilon, otherwise picks uniformly
    /// among the highest-valued legal moves.
    ///
    /// # Panics
    /// If `legal_moves` is empty.
    pub fn choose_action(&mut self, state: &StateKey, legal_moves: &[usize]) -> usize {
        assert!(!legal_moves.is_empty(), "no legal moves in state {state}");
        // NaN never explores
        let epsilon = self.config.exploration_rate;
        if epsilon > 0.0 && self.rng.gen_bool(epsilon.min(1.0)) {
            return *legal_moves
                .choose(&mut self.rng)
                .expect("legal moves checked non-empty");
        }
        let best = self.q.best_actions(state, legal_moves);
        *best.choose(&mut self.rng).expect("legal moves checked non-empty")
    }

    /// Single-step value update for the pair just taken.
    pub fn learn(&mut self, state: StateKey, action: usize, reward: f64, next_state: &Board) -> f64 {
        let value = self.q.update(
            state,
            action,
            reward,
            next_state,
            self.config.learning_rate,
            self.config.discount_rate,
        );
        log::debug!("{} learned Q({state}, {action}) = {value:.4} (reward {reward})", self.name);
        value
    }

    pub fn save(&self, destination: &Path) -> Result<()> {
        self.q.save(destination)
    }

    pub fn load(&mut self, source: &Path) -> Result<()> {
        self.q = QTable::load(source)?;
        Ok(())
    }

    fn reward(&self, status: GameStatus) -> f64 {
        match status {
            GameStatus::Won(mark) if mark == self.mark => 1.0,
            GameStatus::Won(_) => -1.0,
            GameStatus::Drawn | GameStatus::InProgress => 0.0,
        }
    }
}

impl Player for QLearningPlayer {
    fn get_name(&self) -> &str {
        &self.name
    }
    fn get_mark(&self) -> Mark {
        self.mark
    }
    fn set_mark(&mut self, mark: Mark) {
        self.mark = mark;
    }
    fn choose_move(&mut self, board: &Board) -> usize {
        assert!(
            !rules::is_terminal(board),
            "learner asked to move on a finished board {board}"
        );
        let state = board.to_state_key();
        let action = self.choose_action(&state, &rules::legal_moves(board));
        self.pending = Some((state, action));
        action
    }
    fn observe(&mut self, board: &Board, status: GameStatus) {
        let Some((state, action)) = self.pending else {
            return;
        };
        match status {
            // our own move was just applied; wait for the reply
            GameStatus::InProgress if board.next_mark() != self.mark => {}
            GameStatus::InProgress => {
                self.pending = None;
                if self.config.credit == CreditAssignment::EveryMove {
                    self.learn(state, action, 0.0, board);
                }
            }
            GameStatus::Won(_) | GameStatus::Drawn => {
                self.pending = None;
                let reward = self.reward(status);
                self.learn(state, action, reward, board);
            }
        }
    }
    fn new_match(&mut self) {
        self.pending = None;
    }
    fn persist(&self) -> Result<()> {
        match &self.table_path {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }
}
