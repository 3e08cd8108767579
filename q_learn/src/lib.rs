use crate::board::{next_state_key, GameState, Outcome};
use crate::config::Config;
use crate::players::{ComputerPlayer, HumanPlayer, Marks, Player, RandomPlayer};
use crate::q_table::QTable;
use crate::states::RewardTable;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

pub mod board;
pub mod config;
pub mod error;
pub mod players;
pub mod q_table;
pub mod states;

pub use error::{Error, Result};

/// Outcome counts of a training run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub cross_wins: usize,
    pub nought_wins: usize,
    pub draws: usize,
    pub abandoned: usize,
    pub final_exploration_rate: f32,
    /// Result of the greedy episode played after the schedule.
    pub greedy_outcome: Option<Outcome>,
}

impl TrainingSummary {
    fn record(&mut self, outcome: Outcome) {
        self.episodes += 1;
        match outcome {
            Outcome::CrossWon => self.cross_wins += 1,
            Outcome::NoughtWon => self.nought_wins += 1,
            Outcome::Drawn => self.draws += 1,
            Outcome::InPlay | Outcome::Abandoned => self.abandoned += 1,
        }
    }
}

/// Both state tables, the tunables and the learning side, in one place.
/// Nought learns; cross is whatever [`Player`] is passed to an episode.
pub struct Game {
    pub config: Config,
    pub rewards: RewardTable,
    pub q: QTable,
    pub computer: ComputerPlayer,
    episode: usize,
}

impl Game {
    pub fn new(config: Config) -> Self {
        let rewards = RewardTable::generate();
        let q = QTable::from_rewards(&rewards);
        let computer = ComputerPlayer::new(
            "RL".to_owned(),
            Marks::Nought,
            config.exploration_rate,
            config.seed,
        );
        Game {
            config,
            rewards,
            q,
            computer,
            episode: 0,
        }
    }

    /// Episodes played so far, training and evaluation alike.
    pub fn episodes_played(&self) -> usize {
        self.episode
    }

    /// Plays one game from the empty board, updating the value table after
    /// every move the learning side makes.
    pub fn play_episode(&mut self, opponent: &mut dyn Player) -> Result<Outcome> {
        let mut state = GameState::new().to_state_key();
        let mut current = Marks::Cross;
        let outcome = loop {
            if !self.rewards.contains_key(&state) {
                break Outcome::Abandoned;
            }
            let board = GameState::from_state_key(&state)?;
            let status = board.status();
            if status.is_terminal() {
                break status;
            }
            if current == self.computer.mark {
                let (action, next_state) = self.computer.choose_move(&state, &self.q)?;
                let Some(reward) = self.rewards.reward(&next_state) else {
                    break Outcome::Abandoned;
                };
                self.q.update_q_table(
                    &state,
                    action,
                    reward,
                    &next_state,
                    self.config.learning_rate,
                    self.config.discount_rate,
                )?;
                state = next_state;
            } else {
                let mv = opponent.choose_move(&board)?;
                if !board.is_blank(mv) {
                    return Err(Error::InvalidMove { action: mv, state });
                }
                state = next_state_key(&state, mv, current);
            }
            current = current.other();
        };
        self.episode += 1;
        debug!(episode = self.episode, state = %state, ?outcome, "episode finished");
        opponent.game_over(&GameState::from_state_key(&state)?, outcome)?;
        Ok(outcome)
    }

    /// Self-play against a random opponent with a decaying exploration rate,
    /// then one greedy episode.
    pub fn train(&mut self) -> Result<TrainingSummary> {
        let started = Local::now();
        info!(config = %serde_json::to_string(&self.config)?, "training started");
        let mut opponent = RandomPlayer::new(
            "random".to_owned(),
            Marks::Cross,
            self.config.seed.map(|seed| seed.wrapping_add(1)),
        );
        let mut summary = TrainingSummary::default();
        self.computer.exploration_rate = self.config.exploration_rate;
        for episode in 0..self.config.num_episodes {
            let outcome = self.play_episode(&mut opponent)?;
            summary.record(outcome);
            self.computer.exploration_rate = self
                .config
                .decayed_exploration_rate(self.computer.exploration_rate, episode);
            if self.config.log_every > 0 && (episode + 1) % self.config.log_every == 0 {
                info!(
                    episode = episode + 1,
                    exploration_rate = self.computer.exploration_rate,
                    nought_wins = summary.nought_wins,
                    cross_wins = summary.cross_wins,
                    draws = summary.draws,
                    "training progress"
                );
            }
        }
        summary.final_exploration_rate = self.computer.exploration_rate;
        self.computer.exploration_rate = 0.0;
        summary.greedy_outcome = Some(self.play_episode(&mut opponent)?);
        let elapsed = Local::now() - started;
        info!(
            elapsed_ms = elapsed.num_milliseconds(),
            summary = %serde_json::to_string(&summary)?,
            "training finished"
        );
        Ok(summary)
    }
}

/// Trains a fresh agent, then plays one game against a human reading moves
/// from `input` and drawing the board on `output`. The human plays cross.
pub fn train_then_play<R: BufRead, W: Write>(
    config: Config,
    input: R,
    output: W,
) -> Result<(TrainingSummary, Outcome)> {
    let mut game = Game::new(config);
    let summary = game.train()?;
    let mut human = HumanPlayer::new("Human".to_owned(), Marks::Cross, input, output);
    let outcome = game.play_episode(&mut human)?;
    Ok((summary, outcome))
}

/// [`train_then_play`] with the default configuration on stdin and stdout.
pub fn play() -> Result<Outcome> {
    let (_, outcome) = train_then_play(Config::default(), io::stdin().lock(), io::stdout())?;
    Ok(outcome)
}
