use thiserror::Error;

/// Reasons an action was refused. State is untouched whenever one is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("training is already in progress")]
    TrainingInProgress,
    #[error("a battle is already in progress")]
    BattleInProgress,
    #[error("no training is in progress")]
    NotTraining,
    #[error("no battle is running")]
    NoBattle,
    #[error("no opponents available")]
    NoOpponents,
    #[error("insufficient coins: need {cost}, have {coins}")]
    InsufficientCoins { cost: u32, coins: u32 },
    #[error("nickname must be 1-{max} characters")]
    InvalidNickname { max: usize },
    #[error("nickname '{0}' is already taken")]
    NicknameTaken(String),
}

impl ArenaError {
    /// Refusals caused by another action being outstanding.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::TrainingInProgress | Self::BattleInProgress)
    }
}
