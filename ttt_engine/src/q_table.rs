use crate::board::{Board, StateKey, CELLS};
use crate::error::{Error, Result};
use crate::rules;
use chrono::offset::Local;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, prelude::*, BufReader, BufWriter};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// Action values recorded for one state. Missing actions read as 0.0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Moves {
    pub moves: HashMap<usize, f64>,
}

/// Sparse state-action value table. Grows as states are visited.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable {
    qtable: HashMap<StateKey, Moves>,
}

impl Deref for Moves {
    type Target = HashMap<usize, f64>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.moves
    }
}

impl DerefMut for Moves {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.moves
    }
}

impl Deref for QTable {
    type Target = HashMap<StateKey, Moves>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.qtable
    }
}

impl DerefMut for QTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.qtable
    }
}

impl QTable {
    pub fn new() -> Self {
        QTable {
            qtable: HashMap::with_capacity(1024),
        }
    }

    pub fn value(&self, state: &StateKey, action: usize) -> f64 {
        self.get(state)
            .and_then(|moves| moves.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_value(&mut self, state: StateKey, action: usize, value: f64) {
        self.entry(state).or_default().insert(action, value);
    }

    /// Number of stored (state, action) pairs.
    pub fn pairs(&self) -> usize {
        self.values().map(|moves| moves.len()).sum()
    }

    /// Highest value over `actions`, or 0.0 when there are none.
    pub fn best_value(&self, state: &StateKey, actions: &[usize]) -> f64 {
        actions
            .iter()
            .map(|&a| self.value(state, a))
            .max_by(|a, b| a.total_cmp(b))
            .unwrap_or(0.0)
    }

    /// Every action in `actions` that attains the highest value.
    pub fn best_actions(&self, state: &StateKey, actions: &[usize]) -> Vec<usize> {
        actions
            .iter()
            .copied()
            .max_set_by(|&a, &b| self.value(state, a).total_cmp(&self.value(state, b)))
    }

    /// One-step update `Q(s,a) += alpha * (r + gamma * max_a' Q(s',a') - Q(s,a))`,
    /// where the max runs over the moves legal in `next_state`. A terminal
    /// `next_state` contributes no future value.
    pub fn update(
        &mut self,
        state: StateKey,
        action: usize,
        reward: f64,
        next_state: &Board,
        learning_rate: f64,
        discount_rate: f64,
    ) -> f64 {
        let next_key = next_state.to_state_key();
        let best_next = if rules::is_terminal(next_state) {
            0.0
        } else {
            self.best_value(&next_key, &rules::legal_moves(next_state))
        };
        let old = self.value(&state, action);
        let new = old + learning_rate * (reward + discount_rate * best_next - old);
        self.set_value(state, action, new);
        new
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_pickle::to_writer(&mut writer, self, serde_pickle::SerOptions::new()).map_err(
            |e| match e {
                serde_pickle::Error::Io(source) => Error::io(path, source),
                other => Error::io(path, io::Error::other(other.to_string())),
            },
        )?;
        writer.flush().map_err(|e| Error::io(path, e))?;
        log::info!("saved value table ({} pairs) to {}", self.pairs(), path.display());
        Ok(())
    }

    /// Reads a table saved by [`QTable::save`]. A missing file is a cold
    /// start and yields an empty table.
    pub fn load(path: &Path) -> Result<QTable> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no value table at {}, starting cold", path.display());
                return Ok(QTable::new());
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        let mut reader = BufReader::new(file);
        let mut buf: Vec<u8> = vec![];
        reader
            .read_to_end(&mut buf)
            .map_err(|e| Error::io(path, e))?;
        let decoded: QTable = serde_pickle::from_slice(&buf, serde_pickle::DeOptions::new())
            .map_err(|e| Error::CorruptTable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if let Some((state, action)) = decoded
            .iter()
            .flat_map(|(state, moves)| moves.keys().map(move |&a| (state, a)))
            .find(|&(_, a)| a >= CELLS)
        {
            return Err(Error::CorruptTable {
                path: path.to_path_buf(),
                message: format!("action {action} out of range for state {state}"),
            });
        }
        log::info!("loaded value table ({} pairs) from {}", decoded.pairs(), path.display());
        Ok(decoded)
    }

    /// Writes a date-stamped snapshot `qtable-YYYY-MM-DD.pickle` into `dir`.
    pub fn archive(&self, dir: &Path) -> Result<PathBuf> {
        let today = Local::now().date_naive();
        let filename = "qtable-".to_owned() + &today.to_string() + ".pickle";
        let path: PathBuf = [dir, Path::new(&filename)].iter().collect();
        self.save(&path)?;
        Ok(path)
    }
}
