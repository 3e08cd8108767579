use crate::board::{next_state_key, GameState, Outcome, BLANK};
use crate::error::{Error, Result};
use crate::q_table::QTable;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Marks {
    /// Moves first.
    Cross,
    Nought,
}

impl Marks {
    pub fn other(self) -> Self {
        match self {
            Self::Cross => Marks::Nought,
            Self::Nought => Marks::Cross,
        }
    }
    pub fn as_char(self) -> char {
        match self {
            Self::Cross => 'X',
            Self::Nought => 'O',
        }
    }
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Self::Cross),
            'O' => Some(Self::Nought),
            _ => None,
        }
    }
}

/// Move source for the side that is not learning.
pub trait Player {
    fn get_mark(&self) -> Marks;
    fn get_name(&self) -> &str;
    /// Flat index (0-8) of a blank cell of `state`.
    fn choose_move(&mut self, state: &GameState) -> Result<usize>;
    /// Called once when the episode is over.
    fn game_over(&mut self, _state: &GameState, _outcome: Outcome) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Plays uniformly at random among the blank cells.
#[derive(Debug)]
pub struct RandomPlayer {
    pub name: String,
    pub mark: Marks,
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(name: String, mark: Marks, seed: Option<u64>) -> Self {
        RandomPlayer {
            name,
            mark,
            rng: build_rng(seed),
        }
    }
}

impl Player for RandomPlayer {
    fn get_mark(&self) -> Marks {
        self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, state: &GameState) -> Result<usize> {
        state
            .available_moves()
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| Error::NoValidMoves {
                state: state.to_state_key(),
            })
    }
}

/// Reads moves as lines of text, drawing the board before every prompt.
#[derive(Debug)]
pub struct HumanPlayer<R, W> {
    pub name: String,
    pub mark: Marks,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(name: String, mark: Marks, input: R, output: W) -> Self {
        HumanPlayer {
            name,
            mark,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl HumanPlayer<StdinLock<'static>, Stdout> {
    pub fn from_stdio(name: String, mark: Marks) -> Self {
        HumanPlayer::new(name, mark, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Player for HumanPlayer<R, W> {
    fn get_mark(&self) -> Marks {
        self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, state: &GameState) -> Result<usize> {
        let mut line = String::new();
        loop {
            writeln!(self.output, "{}", state.render())?;
            write!(self.output, "Enter your move (0-8): ")?;
            self.output.flush()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::InputClosed);
            }
            match line.trim().parse::<usize>() {
                Ok(mv) if state.is_blank(mv) => return Ok(mv),
                Ok(mv) if mv < 9 => {
                    writeln!(self.output, "The square is taken, please, choose another one.")?
                }
                _ => writeln!(self.output, "Please, enter a number from 0 to 8.")?,
            }
        }
    }
    fn game_over(&mut self, state: &GameState, outcome: Outcome) -> Result<()> {
        writeln!(self.output, "{}", state.render())?;
        let message = match outcome {
            Outcome::Drawn => "The game ended in a draw.".to_owned(),
            Outcome::CrossWon | Outcome::NoughtWon => {
                let winner = if outcome == Outcome::CrossWon {
                    Marks::Cross
                } else {
                    Marks::Nought
                };
                if winner == self.mark {
                    format!("Congratulations, {}! You have won!", self.name)
                } else {
                    format!("Really sorry, {}, you have lost.", self.name)
                }
            }
            Outcome::InPlay | Outcome::Abandoned => "The game was abandoned.".to_owned(),
        };
        writeln!(self.output, "{message}")?;
        self.output.flush()?;
        Ok(())
    }
}

/// The learning side: epsilon-greedy over the value table.
#[derive(Debug)]
pub struct ComputerPlayer {
    pub name: String,
    pub mark: Marks,
    pub exploration_rate: f32,
    rng: StdRng,
}

impl ComputerPlayer {
    pub fn new(name: String, mark: Marks, exploration_rate: f32, seed: Option<u64>) -> Self {
        ComputerPlayer {
            name,
            mark,
            exploration_rate,
            rng: build_rng(seed),
        }
    }

    /// Picks an action for `state_key` and returns it with the resulting state key.
    pub fn choose_move(&mut self, state_key: &str, q: &QTable) -> Result<(usize, String)> {
        let valid_moves: Vec<usize> = state_key
            .chars()
            .enumerate()
            .filter(|&(_, c)| c == BLANK)
            .map(|(i, _)| i)
            .collect();
        if valid_moves.is_empty() {
            return Err(Error::NoValidMoves {
                state: state_key.to_owned(),
            });
        }
        let n = self.rng.gen_range(0_f32..1_f32);
        let candidates = if n < self.exploration_rate {
            valid_moves
        } else {
            q.best_moves(state_key, &valid_moves)?
        };
        let mv = *candidates.choose(&mut self.rng).ok_or_else(|| Error::NoValidMoves {
            state: state_key.to_owned(),
        })?;
        Ok((mv, next_state_key(state_key, mv, self.mark)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::RewardTable;
    use std::io::Cursor;

    #[test]
    fn is_marks_working() {
        let mark_1 = Marks::Cross;
        let mark_2 = mark_1.other();
        assert_eq!(mark_2, Marks::Nought);
        assert_eq!(mark_1.as_char(), 'X');
        assert_eq!(mark_2.as_char(), 'O');
        assert_eq!(Marks::from_char('O'), Some(Marks::Nought));
        assert_eq!(Marks::from_char(' '), None);
    }

    #[test]
    fn random_player_picks_blank_cells() {
        let mut player = RandomPlayer::new("random".to_owned(), Marks::Cross, Some(3));
        let state = GameState::from_state_key("XOXOXO X ").unwrap();
        for _ in 0..20 {
            let mv = player.choose_move(&state).unwrap();
            assert!(mv == 6 || mv == 8);
        }
        let full = GameState::from_state_key("XOXXOXOXO").unwrap();
        assert!(matches!(player.choose_move(&full), Err(Error::NoValidMoves { .. })));
    }

    #[test]
    fn human_player_reprompts_on_bad_input() {
        let state = GameState::from_state_key("X        ").unwrap();
        let input = Cursor::new("abc\n12\n0\n 4 \n");
        let mut player = HumanPlayer::new("John".to_owned(), Marks::Cross, input, Vec::new());
        assert_eq!(player.choose_move(&state).unwrap(), 4);
        let output = String::from_utf8(player.into_output()).unwrap();
        assert_eq!(output.matches("Enter your move (0-8): ").count(), 4);
        assert!(output.contains("X|_|_\n_|_|_\n_|_|_"));
        assert!(output.contains("Please, enter a number from 0 to 8."));
        assert!(output.contains("The square is taken"));
    }

    #[test]
    fn human_player_fails_on_closed_input() {
        let state = GameState::new();
        let mut player = HumanPlayer::new("John".to_owned(), Marks::Cross, Cursor::new(""), Vec::new());
        assert!(matches!(player.choose_move(&state), Err(Error::InputClosed)));
    }

    #[test]
    fn human_player_is_told_the_result() {
        let state = GameState::from_state_key("OOOXX X  ").unwrap();
        let mut player = HumanPlayer::new("John".to_owned(), Marks::Cross, Cursor::new(""), Vec::new());
        player.game_over(&state, Outcome::NoughtWon).unwrap();
        let output = String::from_utf8(player.into_output()).unwrap();
        assert!(output.ends_with("Really sorry, John, you have lost.\n"));
    }

    #[test]
    fn greedy_choice_is_deterministic_for_a_single_maximum() {
        let rewards = RewardTable::generate();
        let mut q = QTable::from_rewards(&rewards);
        let state = "X        ";
        q.get_mut(state).unwrap()[5] = 0.3;
        let mut computer = ComputerPlayer::new("RL".to_owned(), Marks::Nought, 0.0, Some(11));
        for _ in 0..50 {
            let (mv, next) = computer.choose_move(state, &q).unwrap();
            assert_eq!(mv, 5);
            assert_eq!(next, "X    O   ");
        }
    }

    #[test]
    fn exploration_stays_on_blank_cells() {
        let rewards = RewardTable::generate();
        let q = QTable::from_rewards(&rewards);
        let mut computer = ComputerPlayer::new("RL".to_owned(), Marks::Nought, 1.0, Some(5));
        for _ in 0..50 {
            let (mv, _) = computer.choose_move("XOXO     ", &q).unwrap();
            assert!(mv >= 4);
        }
    }
}
