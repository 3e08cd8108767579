use serde::{Deserialize, Serialize};

pub const LEARNING_RATE: f32 = 0.7;
pub const DISCOUNT_RATE: f32 = 0.9;
pub const EXPLORATION_RATE: f32 = 0.2;
pub const MIN_EXPLORATION_RATE: f32 = 0.01;
pub const EXPLORATION_DECAY: f32 = 0.9999;
pub const NUM_EPISODES: usize = 100_000;
pub const LOG_EVERY: usize = 10_000;

/// Value of an action on an occupied cell. Never selectable.
pub const SENTINEL: f32 = -2.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub learning_rate: f32,
    pub discount_rate: f32,
    pub exploration_rate: f32,
    pub min_exploration_rate: f32,
    pub exploration_decay: f32,
    pub num_episodes: usize,
    pub log_every: usize,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            learning_rate: LEARNING_RATE,
            discount_rate: DISCOUNT_RATE,
            exploration_rate: EXPLORATION_RATE,
            min_exploration_rate: MIN_EXPLORATION_RATE,
            exploration_decay: EXPLORATION_DECAY,
            num_episodes: NUM_EPISODES,
            log_every: LOG_EVERY,
            seed: None,
        }
    }
}

impl Config {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_episodes(mut self, num_episodes: usize) -> Self {
        self.num_episodes = num_episodes;
        self
    }

    /// Rate to use after finishing episode `episode` while at `current`.
    pub fn decayed_exploration_rate(&self, current: f32, episode: usize) -> f32 {
        let decay = self.exploration_decay.powi(i32::try_from(episode).unwrap_or(i32::MAX));
        self.min_exploration_rate.max(current * decay)
    }
}
