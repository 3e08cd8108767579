use crate::error::{Error, Result};
use crate::players::Marks;
use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Deref, DerefMut},
};

pub const BLANK: char = ' ';
pub const NUM_CELLS: usize = 9;

/// Status of a position, and the way an episode ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    InPlay,
    CrossWon,
    NoughtWon,
    Drawn,
    /// The episode stopped on a state missing from the state tables.
    Abandoned,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InPlay
    }
}

/// A 3×3 board. Serialised row-major into a 9-character state key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub state: Array2<char>,
}

impl Deref for GameState {
    type Target = Array2<char>;
    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl DerefMut for GameState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_state_key())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            state: Array::from_elem((3, 3), BLANK),
        }
    }

    pub fn from_state_key(key: &str) -> Result<Self> {
        let cells: Vec<char> = key.chars().collect();
        if cells.len() != NUM_CELLS || !cells.iter().all(|&c| c == BLANK || Marks::from_char(c).is_some()) {
            return Err(Error::MalformedState {
                state: key.to_owned(),
            });
        }
        let state = Array::from_shape_vec((3, 3), cells).map_err(|_| Error::MalformedState {
            state: key.to_owned(),
        })?;
        Ok(GameState { state })
    }

    pub fn to_state_key(&self) -> String {
        self.state.iter().collect::<String>()
    }

    /// Rows of the board as `X|O|_`, one per line.
    pub fn render(&self) -> String {
        self.state
            .iter()
            .map(|&c| if c == BLANK { '_' } else { c })
            .tuples::<(_, _, _)>()
            .map(|(a, b, c)| format!("{a}|{b}|{c}"))
            .join("\n")
    }

    /// Flat indices (0-8) of the blank cells.
    pub fn available_moves(&self) -> Vec<usize> {
        self.state
            .indexed_iter()
            .filter(|(_index, &value)| value == BLANK)
            .map(|((row, col), _)| row * 3 + col)
            .collect()
    }

    pub fn is_blank(&self, action: usize) -> bool {
        action < NUM_CELLS && self.state[[action / 3, action % 3]] == BLANK
    }

    pub fn place(&mut self, action: usize, mark: Marks) -> Result<()> {
        if !self.is_blank(action) {
            return Err(Error::InvalidMove {
                action,
                state: self.to_state_key(),
            });
        }
        self.state[[action / 3, action % 3]] = mark.as_char();
        Ok(())
    }

    pub fn count(&self, mark: Marks) -> usize {
        self.state.iter().filter(|&&c| c == mark.as_char()).count()
    }

    pub fn is_full(&self) -> bool {
        self.state.iter().all(|&c| c != BLANK)
    }

    pub fn has_won(&self, mark: Marks) -> bool {
        let m = mark.as_char();
        let full_line = |line: ArrayView1<char>| line.iter().all(|&c| c == m);
        self.rows().into_iter().any(full_line)
            || self.columns().into_iter().any(full_line)
            || full_line(self.diag())
            || (0..3).all(|i| self.state[[i, 2 - i]] == m)
    }

    pub fn is_draw(&self) -> bool {
        self.is_full() && !self.has_won(Marks::Cross) && !self.has_won(Marks::Nought)
    }

    pub fn status(&self) -> Outcome {
        if self.has_won(Marks::Nought) {
            Outcome::NoughtWon
        } else if self.has_won(Marks::Cross) {
            Outcome::CrossWon
        } else if self.is_full() {
            Outcome::Drawn
        } else {
            Outcome::InPlay
        }
    }

    /// Reward seen by the nought (learning) side for arriving in this position.
    pub fn reward(&self) -> f32 {
        match self.status() {
            Outcome::NoughtWon => 1.0,
            Outcome::CrossWon => -1.0,
            Outcome::Drawn => 0.5,
            Outcome::InPlay | Outcome::Abandoned => 0.0,
        }
    }
}

/// `state` with cell `action` set to `mark`. The cell is not checked.
pub fn next_state_key(state: &str, action: usize, mark: Marks) -> String {
    state
        .chars()
        .enumerate()
        .map(|(i, c)| if i == action { mark.as_char() } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(key: &str) -> GameState {
        GameState::from_state_key(key).unwrap()
    }

    #[test]
    fn every_line_wins() {
        let lines: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8],
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8],
            [0, 4, 8],
            [2, 4, 6],
        ];
        for mark in [Marks::Cross, Marks::Nought] {
            for line in lines {
                let mut state = GameState::new();
                for cell in line {
                    state.place(cell, mark).unwrap();
                }
                assert!(state.has_won(mark), "{line:?} for {mark:?}");
                assert!(!state.has_won(mark.other()));
            }
        }
    }

    #[test]
    fn no_line_no_win() {
        let state = board("XOXXOXOXO");
        assert!(!state.has_won(Marks::Cross));
        assert!(!state.has_won(Marks::Nought));
        assert!(!GameState::new().has_won(Marks::Cross));
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let state = board("XOXXOXOXO");
        assert!(state.is_draw());
        assert_eq!(state.status(), Outcome::Drawn);
        assert_eq!(state.reward(), 0.5);
    }

    #[test]
    fn rewards_follow_the_winner() {
        assert_eq!(board("XXX      ").reward(), -1.0);
        assert_eq!(board("XXX      ").status(), Outcome::CrossWon);
        assert_eq!(board("OOOXX X  ").reward(), 1.0);
        assert_eq!(board("X   O    ").reward(), 0.0);
        assert_eq!(GameState::new().status(), Outcome::InPlay);
    }

    #[test]
    fn full_board_with_line_is_not_draw() {
        let state = board("XXXOOXXOO");
        assert!(state.is_full());
        assert!(!state.is_draw());
        assert_eq!(state.status(), Outcome::CrossWon);
    }

    #[test]
    fn state_key_round_trip_and_render() {
        let state = board("X O  O  X");
        assert_eq!(state.to_state_key(), "X O  O  X");
        assert_eq!(state.to_string(), "X O  O  X");
        assert_eq!(state.render(), "X|_|O\n_|_|O\n_|_|X");
        assert_eq!(state.available_moves(), vec![1, 3, 4, 6, 7]);
        assert_eq!(state.count(Marks::Cross), 2);
        assert_eq!(state.count(Marks::Nought), 2);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(GameState::from_state_key("XO").is_err());
        assert!(GameState::from_state_key("XO-      ").is_err());
        assert!(GameState::from_state_key("          ").is_err());
    }

    #[test]
    fn place_rejects_occupied_and_out_of_range() {
        let mut state = board("X        ");
        assert!(matches!(
            state.place(0, Marks::Nought),
            Err(Error::InvalidMove { action: 0, .. })
        ));
        assert!(state.place(9, Marks::Nought).is_err());
        state.place(4, Marks::Nought).unwrap();
        assert_eq!(state.to_state_key(), "X   O    ");
    }

    #[test]
    fn next_state_key_sets_one_cell() {
        assert_eq!(next_state_key("X        ", 8, Marks::Nought), "X       O");
    }
}
