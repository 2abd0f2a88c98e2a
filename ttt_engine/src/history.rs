//! Finished-match log: a JSON array of records, one file per play mode.

use crate::board::Board;
use crate::config::{AI_HISTORY_FILE, TWO_PLAYER_HISTORY_FILE};
use crate::error::{Error, Result};
use crate::players::Mark;
use crate::Mode;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Cells holding X at the end of the match.
    pub player_moves: Vec<usize>,
    /// Cells holding O at the end of the match.
    pub ai_moves: Vec<usize>,
}

impl From<&Board> for GameRecord {
    fn from(board: &Board) -> Self {
        GameRecord {
            player_moves: board.positions(Mark::Cross),
            ai_moves: board.positions(Mark::Nought),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryLog {
    pub vs_agent: PathBuf,
    pub two_players: PathBuf,
}

impl Default for HistoryLog {
    fn default() -> Self {
        HistoryLog {
            vs_agent: PathBuf::from(AI_HISTORY_FILE),
            two_players: PathBuf::from(TWO_PLAYER_HISTORY_FILE),
        }
    }
}

impl HistoryLog {
    /// Both destinations inside `dir`, under their default file names.
    pub fn in_dir(dir: &Path) -> Self {
        HistoryLog {
            vs_agent: dir.join(AI_HISTORY_FILE),
            two_players: dir.join(TWO_PLAYER_HISTORY_FILE),
        }
    }

    pub fn destination(&self, mode: Mode) -> &Path {
        match mode {
            Mode::VsAgent => &self.vs_agent,
            Mode::TwoPlayers => &self.two_players,
        }
    }

    pub fn append(&self, mode: Mode, record: GameRecord) -> Result<()> {
        append_record(self.destination(mode), record)
    }
}

/// All records at `path`; a missing file is an empty history.
pub fn read_records(path: &Path) -> Result<Vec<GameRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(path, e)),
    };
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::HistoryFormat {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the whole history, appends `record`, and rewrites the file.
pub fn append_record(path: &Path, record: GameRecord) -> Result<()> {
    let mut records = read_records(path)?;
    records.push(record);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    write_records(BufWriter::new(file), path, &records)?;
    log::info!("appended match #{} to {}", records.len(), path.display());
    Ok(())
}

fn write_records<W: Write>(mut writer: W, path: &Path, records: &[GameRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).map_err(|source| Error::HistoryFormat {
        path: path.to_path_buf(),
        source,
    })?;
    writer
        .write_all(json.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_cells_by_mark() {
        let board = Board::from(&"XOX-O-X--".parse::<crate::board::StateKey>().unwrap());
        let record = GameRecord::from(&board);
        assert_eq!(record.player_moves, vec![0, 2, 6]);
        assert_eq!(record.ai_moves, vec![1, 4]);
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = read_records(&dir.path().join("nothing.json")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn appends_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let first = GameRecord {
            player_moves: vec![0, 1, 2],
            ai_moves: vec![4, 8],
        };
        let second = GameRecord {
            player_moves: vec![4],
            ai_moves: vec![],
        };
        append_record(&path, first.clone()).unwrap();
        append_record(&path, second.clone()).unwrap();
        assert_eq!(read_records(&path).unwrap(), vec![first, second]);
    }

    #[test]
    fn malformed_history_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not a list").unwrap();
        assert!(matches!(
            append_record(&path, GameRecord::from(&Board::new())),
            Err(Error::HistoryFormat { .. })
        ));
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left on device"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_are_io_errors() {
        let records = vec![GameRecord::from(&Board::new())];
        assert!(matches!(
            write_records(FullDisk, Path::new("history.json"), &records),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn modes_use_distinct_files() {
        let log = HistoryLog::default();
        assert_ne!(log.destination(Mode::VsAgent), log.destination(Mode::TwoPlayers));
        assert_eq!(log.destination(Mode::VsAgent), Path::new("AI_game_history.json"));
    }
}
