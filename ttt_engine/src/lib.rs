use crate::board::{Board, Cell, GameStatus, CELLS};
use crate::error::{Error, Result};
use crate::history::{GameRecord, HistoryLog};
use crate::players::{Mark, Player};

pub mod board;
pub mod config;
pub mod error;
pub mod history;
pub mod players;
pub mod q_table;
pub mod rules;
pub mod training;

/// Who fills the nought seat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    VsAgent,
    TwoPlayers,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::VsAgent => Mode::TwoPlayers,
            Mode::TwoPlayers => Mode::VsAgent,
        }
    }
}

/// Owns the authoritative board and serializes turns. X always opens; in
/// [`Mode::VsAgent`] the agent holds O and answers every human move.
pub struct Game {
    board: Board,
    current_mark: Mark,
    status: GameStatus,
    mode: Mode,
    agent: Box<dyn Player>,
    history: Option<HistoryLog>,
}

impl Game {
    pub fn new(mut agent: Box<dyn Player>) -> Self {
        agent.set_mark(Mark::Nought);
        agent.new_match();
        Game {
            board: Board::new(),
            current_mark: Mark::Cross,
            status: GameStatus::InProgress,
            mode: Mode::VsAgent,
            agent,
            history: None,
        }
    }

    /// Records every finished match to `history`.
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_mark(&self) -> Mark {
        self.current_mark
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn agent(&self) -> &dyn Player {
        self.agent.as_ref()
    }

    /// Places the current mark on `index` and advances the match. Rejected
    /// moves leave every piece of state untouched.
    pub fn apply_move(&mut self, index: usize) -> Result<GameStatus> {
        let reason = if self.is_over() {
            Some("the match is over")
        } else if index >= CELLS {
            Some("no such cell")
        } else if self.board.cell(index) != Cell::Empty {
            Some("cell is occupied")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(Error::InvalidMove { index, reason });
        }

        let mark = self.current_mark;
        self.board.set(index, mark);
        self.status = rules::status(&self.board);
        log::debug!("{} -> {}: {}", mark.as_char(), index, self.board);
        if self.mode == Mode::VsAgent {
            self.agent.observe(&self.board, self.status);
        }
        match self.status {
            GameStatus::InProgress => self.current_mark = mark.other(),
            _ => self.finish()?,
        }
        Ok(self.status)
    }

    /// Applies a human move and, when the agent is due, its reply.
    pub fn submit_move(&mut self, index: usize) -> Result<GameStatus> {
        self.apply_move(index)?;
        if self.mode == Mode::VsAgent
            && !self.is_over()
            && self.current_mark == self.agent.get_mark()
        {
            return self.agent_move();
        }
        Ok(self.status)
    }

    /// [`Game::submit_move`] addressed by `(row, col)`.
    pub fn submit_cell(&mut self, row: usize, col: usize) -> Result<GameStatus> {
        let index = rules::index_of(row, col).ok_or(Error::InvalidMove {
            index: row.saturating_mul(board::SIDE).saturating_add(col),
            reason: "no such cell",
        })?;
        self.submit_move(index)
    }

    /// Lets the agent pick and play its mark. Only valid on the agent's turn
    /// of a match in progress.
    pub fn agent_move(&mut self) -> Result<GameStatus> {
        let reason = if self.is_over() {
            Some("the match is over")
        } else if self.current_mark != self.agent.get_mark() {
            Some("it is not the agent's turn")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(Error::InvalidMove {
                index: CELLS,
                reason,
            });
        }
        let index = self.agent.choose_move(&self.board);
        log::debug!("{} chose {}", self.agent.get_name(), index);
        self.apply_move(index)
    }

    /// Empty board, X to move, regardless of how the last match ended.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current_mark = Mark::Cross;
        self.status = GameStatus::InProgress;
        self.agent.new_match();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset();
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    fn finish(&mut self) -> Result<()> {
        match self.status {
            GameStatus::Won(mark) => log::info!("{} wins", mark.as_char()),
            _ => log::info!("the match is drawn"),
        }
        // the table is saved even when the history write fails
        let persisted = match self.mode {
            Mode::VsAgent => self.agent.persist(),
            Mode::TwoPlayers => Ok(()),
        };
        let recorded = match &self.history {
            Some(history) => history.append(self.mode, GameRecord::from(&self.board)),
            None => Ok(()),
        };
        persisted.and(recorded)
    }
}
