use crate::board::{Board, GameStatus};
use crate::config::LOG_EVERY;
use crate::players::{Mark, Player, QLearningPlayer};
use crate::rules;
use rand::Rng;
use std::mem;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrainingStats {
    pub episodes: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
}

impl TrainingStats {
    fn record(&mut self, status: GameStatus, learner: Mark) {
        self.episodes += 1;
        match status {
            GameStatus::Won(mark) if mark == learner => self.wins += 1,
            GameStatus::Won(_) => self.losses += 1,
            GameStatus::Drawn => self.draws += 1,
            GameStatus::InProgress => unreachable!("episodes run to the end"),
        }
    }
}

/// Plays one headless match to the end. `x` moves first; both players see
/// every move.
pub fn play_episode<'a>(x: &'a mut dyn Player, o: &'a mut dyn Player) -> (Board, GameStatus) {
    let mut board = Board::new();
    x.new_match();
    o.new_match();
    let mut current: &mut dyn Player = x;
    let mut other: &mut dyn Player = o;
    loop {
        let mark = current.get_mark();
        let mv = current.choose_move(&board);
        assert!(
            rules::legal_moves(&board).contains(&mv),
            "{} chose occupied or off-board cell {mv} on {board}",
            current.get_name()
        );
        board.set(mv, mark);
        let status = rules::status(&board);
        current.observe(&board, status);
        other.observe(&board, status);
        if status != GameStatus::InProgress {
            return (board, status);
        }
        mem::swap(&mut current, &mut other);
    }
}

/// Trains `learner` against `opponent`, drawing marks at random each episode.
pub fn train<R: Rng>(
    learner: &mut QLearningPlayer,
    opponent: &mut dyn Player,
    episodes: usize,
    rng: &mut R,
) -> TrainingStats {
    log::info!(
        "training {} against {} for {} episodes",
        learner.get_name(),
        opponent.get_name(),
        episodes
    );
    let mut stats = TrainingStats::default();
    for episode in 1..=episodes {
        let mark = if rng.gen_bool(0.5) { Mark::Cross } else { Mark::Nought };
        learner.set_mark(mark);
        opponent.set_mark(mark.other());
        let (_, status) = match mark {
            Mark::Cross => play_episode(learner, opponent),
            Mark::Nought => play_episode(opponent, learner),
        };
        stats.record(status, mark);
        if episode % LOG_EVERY == 0 {
            log::info!(
                "episode {:>7}  wins {:>6}  losses {:>6}  draws {:>6}  pairs {}",
                episode,
                stats.wins,
                stats.losses,
                stats.draws,
                learner.table().pairs()
            );
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearnerConfig;
    use crate::players::{MinimaxPlayer, RandomPlayer};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn minimax_self_play_is_a_draw() {
        let mut x = MinimaxPlayer::new(Mark::Cross);
        let mut o = MinimaxPlayer::new(Mark::Nought);
        let (board, status) = play_episode(&mut x, &mut o);
        assert_eq!(status, GameStatus::Drawn);
        assert!(rules::is_full(&board));
    }

    #[test]
    fn stats_cover_every_episode() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut learner = QLearningPlayer::seeded(Mark::Cross, LearnerConfig::default(), 6);
        let mut opponent = RandomPlayer::new(Mark::Nought, ChaCha8Rng::seed_from_u64(7));
        let stats = train(&mut learner, &mut opponent, 300, &mut rng);
        assert_eq!(stats.episodes, 300);
        assert_eq!(stats.wins + stats.losses + stats.draws, 300);
        assert!(learner.table().pairs() > 0);
    }

    #[test]
    fn learner_never_beats_minimax() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut learner = QLearningPlayer::seeded(Mark::Cross, LearnerConfig::default(), 10);
        let mut opponent = MinimaxPlayer::new(Mark::Nought);
        let stats = train(&mut learner, &mut opponent, 6, &mut rng);
        assert_eq!(stats.wins, 0);
    }
}
