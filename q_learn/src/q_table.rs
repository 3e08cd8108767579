use crate::board::{BLANK, NUM_CELLS};
use crate::config::SENTINEL;
use crate::error::{Error, Result};
use crate::states::RewardTable;
use itertools::Itertools;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use tracing::error;

/// Action values of one state, indexed by cell. Occupied cells hold [`SENTINEL`].
#[derive(Clone, Debug, PartialEq)]
pub struct Moves {
    pub moves: [f32; NUM_CELLS],
}

#[derive(Clone, Debug, Default)]
pub struct QTable {
    qtable: HashMap<String, Moves>,
}

impl Deref for Moves {
    type Target = [f32; NUM_CELLS];
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
    type Target = HashMap<String, Moves>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.qtable
    }
}

impl DerefMut for QTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.qtable
    }
}

impl Moves {
    pub fn new(state_key: &str) -> Moves {
        let mut moves = [0.0; NUM_CELLS];
        for (value, cell) in moves.iter_mut().zip(state_key.chars()) {
            if cell != BLANK {
                *value = SENTINEL;
            }
        }
        Moves { moves }
    }

    pub fn max_value(&self) -> f32 {
        self.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

impl QTable {
    /// One entry per legal state, blank cells at 0.0.
    pub fn from_rewards(rewards: &RewardTable) -> Self {
        let qtable = rewards
            .keys()
            .map(|key| (key.clone(), Moves::new(key)))
            .collect();
        QTable { qtable }
    }

    /// The actions among `valid_moves` sharing the highest value.
    pub fn best_moves(&self, state_key: &str, valid_moves: &[usize]) -> Result<Vec<usize>> {
        let moves = self.get(state_key).ok_or_else(|| Error::UnknownState {
            state: state_key.to_owned(),
        })?;
        Ok(valid_moves
            .iter()
            .copied()
            .filter(|&mv| mv < NUM_CELLS)
            .max_set_by(|&a, &b| moves[a].total_cmp(&moves[b])))
    }

    /// Q(s, a) ← Q(s, a) + α(r + γ·max Q(s', ·) − Q(s, a)). Returns the new value.
    pub fn update_q_table(
        &mut self,
        state_key: &str,
        action: usize,
        reward: f32,
        next_state_key: &str,
        learning_rate: f32,
        discount_rate: f32,
    ) -> Result<f32> {
        let Some(next) = self.get(next_state_key) else {
            error!(state = state_key, next_state = next_state_key, "next state missing from the value table");
            return Err(Error::UnknownState {
                state: next_state_key.to_owned(),
            });
        };
        let max_future = next.max_value();
        let value = self
            .get_mut(state_key)
            .and_then(|moves| moves.get_mut(action))
            .ok_or_else(|| Error::InvalidMove {
                action,
                state: state_key.to_owned(),
            })?;
        *value += learning_rate * (reward + discount_rate * max_future - *value);
        Ok(*value)
    }
}
