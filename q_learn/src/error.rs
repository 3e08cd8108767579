use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("state {state:?} is not a legal position")]
    UnknownState { state: String },

    #[error("cell {action} is not a blank cell of {state:?}")]
    InvalidMove { action: usize, state: String },

    #[error("no blank cells left in {state:?}")]
    NoValidMoves { state: String },

    #[error("malformed state key {state:?}: expected 9 cells of 'X', 'O' or ' '")]
    MalformedState { state: String },

    #[error("input closed before a move was entered")]
    InputClosed,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
