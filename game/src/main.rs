use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use ttt_engine::board::GameStatus;
use ttt_engine::config::{self, CreditAssignment, LearnerConfig};
use ttt_engine::error::Error;
use ttt_engine::history::HistoryLog;
use ttt_engine::players::{Mark, MinimaxPlayer, Player, QLearningPlayer, RandomPlayer};
use ttt_engine::q_table::QTable;
use ttt_engine::{rules, training, Game, Mode};

#[derive(Parser, Debug)]
#[command(version, about = "Tic-tac-toe against minimax or a learned policy")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Value table of the learning agent
    #[arg(long, global = true, default_value = config::Q_TABLE_PATH)]
    table: PathBuf,

    /// Directory holding the match history files
    #[arg(long, global = true, default_value = ".")]
    history_dir: PathBuf,

    /// Replace a corrupt value table with an empty one instead of aborting
    #[arg(long, global = true)]
    cold_start_on_corrupt: bool,

    /// Seed for the agents' random choices
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Human X against an agent playing O
    Play {
        #[arg(long, value_enum, default_value_t = AgentKind::Minimax)]
        agent: AgentKind,
        /// Exploration rate of the learning agent; 0 plays greedily
        #[arg(long, default_value_t = config::EXPLORATION_RATE, value_parser = parse_rate)]
        epsilon: f64,
    },
    /// Two humans sharing the terminal
    TwoPlayers,
    /// Self-play training for the learning agent
    Train {
        #[arg(long, default_value_t = config::NUM_EPISODES)]
        episodes: usize,
        #[arg(long, value_enum, default_value_t = Sparring::Random)]
        against: Sparring,
        #[arg(long, default_value_t = config::EXPLORATION_RATE, value_parser = parse_rate)]
        epsilon: f64,
        /// Only update the last move of each game
        #[arg(long)]
        terminal_only: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AgentKind {
    Minimax,
    Learner,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Sparring {
    Random,
    Minimax,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    match cli.command {
        Command::Play { agent, epsilon } => {
            let agent: Box<dyn Player> = match agent {
                AgentKind::Minimax => Box::new(MinimaxPlayer::new(Mark::Nought)),
                AgentKind::Learner => {
                    let config = LearnerConfig {
                        exploration_rate: epsilon,
                        ..LearnerConfig::default()
                    }
                    .validate()?;
                    let mut learner = QLearningPlayer::new(Mark::Nought, config, rng);
                    *learner.table_mut() = load_table(&cli.table, cli.cold_start_on_corrupt)?;
                    Box::new(learner.with_table_path(&cli.table))
                }
            };
            let game = Game::new(agent).with_history(HistoryLog::in_dir(&cli.history_dir));
            play(game, Mode::VsAgent)
        }
        Command::TwoPlayers => {
            let game = Game::new(Box::new(MinimaxPlayer::new(Mark::Nought)))
                .with_history(HistoryLog::in_dir(&cli.history_dir));
            play(game, Mode::TwoPlayers)
        }
        Command::Train {
            episodes,
            against,
            epsilon,
            terminal_only,
        } => {
            let config = LearnerConfig {
                exploration_rate: epsilon,
                credit: if terminal_only {
                    CreditAssignment::TerminalOnly
                } else {
                    CreditAssignment::EveryMove
                },
                ..LearnerConfig::default()
            }
            .validate()?;
            let mut rng = rng;
            let mut learner = QLearningPlayer::new(Mark::Cross, config, ChaCha8Rng::from_rng(&mut rng)?);
            *learner.table_mut() = load_table(&cli.table, cli.cold_start_on_corrupt)?;
            let mut opponent: Box<dyn Player> = match against {
                Sparring::Random => Box::new(RandomPlayer::new(Mark::Nought, ChaCha8Rng::from_rng(&mut rng)?)),
                Sparring::Minimax => Box::new(MinimaxPlayer::new(Mark::Nought)),
            };
            let stats = training::train(&mut learner, opponent.as_mut(), episodes, &mut rng);
            println!(
                "{} episodes: {} wins, {} losses, {} draws",
                stats.episodes, stats.wins, stats.losses, stats.draws
            );
            learner.save(&cli.table)?;
            let archive = cli.table.parent().unwrap_or(Path::new(config::Q_TABLE_ARCHIVE));
            let snapshot = learner.table().archive(archive)?;
            println!("snapshot written to {}", snapshot.display());
            Ok(())
        }
    }
}

fn load_table(path: &Path, cold_start_on_corrupt: bool) -> anyhow::Result<QTable> {
    match QTable::load(path) {
        Err(Error::CorruptTable { path, message }) if cold_start_on_corrupt => {
            log::warn!(
                "value table {} is corrupt ({}); starting from an empty table",
                path.display(),
                message
            );
            Ok(QTable::new())
        }
        other => other.context("loading the value table"),
    }
}

fn play(mut game: Game, mode: Mode) -> anyhow::Result<()> {
    game.set_mode(mode);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!("{}", game.board().draw());
        match game.status() {
            GameStatus::Won(mark) => println!("Player {} wins!", mark.as_char()),
            GameStatus::Drawn => println!("It's a tie!"),
            GameStatus::InProgress => {
                print!("Player {}, your move (1-9 or 'row col'): ", game.current_mark().as_char());
                io::stdout().flush()?;
                let Some(line) = lines.next() else {
                    return Ok(());
                };
                let index = match parse_move(&line?) {
                    Ok(index) => index,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                if let Err(e) = game.submit_move(index) {
                    match e {
                        Error::InvalidMove { .. } => println!("{e}, try again."),
                        other => return Err(other.into()),
                    }
                }
                continue;
            }
        }
        print!("Play again? [y/N/m to switch mode] ");
        io::stdout().flush()?;
        match lines.next().transpose()?.as_deref().map(str::trim) {
            Some("y") | Some("Y") => game.reset(),
            Some("m") | Some("M") => {
                let mode = game.toggle_mode();
                println!("Mode: {}", if mode == Mode::VsAgent { "vs AI" } else { "2 Players" });
            }
            _ => return Ok(()),
        }
    }
}

/// A probability in `[0, 1]`; NaN and infinities are refused.
fn parse_rate(input: &str) -> anyhow::Result<f64> {
    let rate: f64 = input
        .trim()
        .parse()
        .with_context(|| format!("'{input}' is not a number"))?;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        bail!("{rate} is not a rate between 0 and 1");
    }
    Ok(rate)
}

/// Accepts a cell number 1-9 or a 1-based "row col" pair.
fn parse_move(input: &str) -> anyhow::Result<usize> {
    let numbers = input
        .split_whitespace()
        .map(|t| t.parse::<usize>().with_context(|| format!("'{t}' is not a number")))
        .collect::<anyhow::Result<Vec<usize>>>()?;
    let index = match numbers.as_slice() {
        [cell @ 1..=9] => cell - 1,
        [row @ 1..=3, col @ 1..=3] => rules::index_of(row - 1, col - 1).context("off the board")?,
        _ => bail!("enter a cell 1-9 or a row and column 1-3"),
    };
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_move_forms() {
        assert_eq!(parse_move("5").unwrap(), 4);
        assert_eq!(parse_move(" 3 1 ").unwrap(), 6);
        assert!(parse_move("0").is_err());
        assert!(parse_move("4 4").is_err());
        assert!(parse_move("x").is_err());
    }

    #[test]
    fn rates_must_be_finite_probabilities() {
        assert_eq!(parse_rate("0.25").unwrap(), 0.25);
        assert_eq!(parse_rate("0").unwrap(), 0.0);
        assert!(parse_rate("NaN").is_err());
        assert!(parse_rate("inf").is_err());
        assert!(parse_rate("1.5").is_err());
        assert!(parse_rate("-0.1").is_err());
    }

    #[test]
    fn play_takes_an_exploration_rate() {
        let cli = Cli::try_parse_from(["game", "play", "--agent", "learner", "--epsilon", "0.3"]).unwrap();
        assert!(matches!(cli.command, Command::Play { epsilon, .. } if epsilon == 0.3));
        let cli = Cli::try_parse_from(["game", "play"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Play { epsilon, .. } if epsilon == config::EXPLORATION_RATE
        ));
        assert!(Cli::try_parse_from(["game", "play", "--epsilon", "NaN"]).is_err());
        assert!(Cli::try_parse_from(["game", "train", "--epsilon", "NaN"]).is_err());
    }
}
