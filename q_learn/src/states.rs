use crate::board::{GameState, BLANK, NUM_CELLS};
use crate::players::Marks;
use itertools::Itertools;
use std::collections::HashMap;
use std::ops::Deref;

/// Every legal position, keyed by state key, with the reward for arriving there.
#[derive(Debug, Clone)]
pub struct RewardTable {
    rewards: HashMap<String, f32>,
}

impl Deref for RewardTable {
    type Target = HashMap<String, f32>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.rewards
    }
}

/// A position is legal when cross is level with or one move ahead of nought
/// and at most the player who moved last has a line.
pub fn is_valid_state(state: &GameState) -> bool {
    let x = state.count(Marks::Cross);
    let o = state.count(Marks::Nought);
    if !(x == o || x == o + 1) {
        return false;
    }
    let cross_won = state.has_won(Marks::Cross);
    let nought_won = state.has_won(Marks::Nought);
    if cross_won && nought_won {
        return false;
    }
    if cross_won && x != o + 1 {
        return false;
    }
    if nought_won && x != o {
        return false;
    }
    true
}

/// All 3^9 boards, legal or not.
pub fn all_states() -> impl Iterator<Item = GameState> {
    std::iter::repeat(['X', 'O', BLANK].into_iter())
        .take(NUM_CELLS)
        .multi_cartesian_product()
        .filter_map(|cells| GameState::from_state_key(&cells.into_iter().collect::<String>()).ok())
}

impl RewardTable {
    pub fn generate() -> Self {
        let rewards: HashMap<String, f32> = all_states()
            .filter(is_valid_state)
            .map(|state| (state.to_state_key(), state.reward()))
            .collect();
        RewardTable { rewards }
    }

    pub fn reward(&self, state_key: &str) -> Option<f32> {
        self.rewards.get(state_key).copied()
    }
}
