// Public API
pub use driver::{DriverCommand, DriverHandle, GameDriver};
pub use memory::{CardView, MemoryAction, MemoryEngine, MemoryPhase, MemorySnapshot};
pub use puzzle::{CropOffset, Piece, PuzzleAction, PuzzleBoard, PuzzleEngine, PuzzlePhase, PuzzleSnapshot};
pub use riddle::{RiddleAction, RiddleEngine, RiddlePhase, RiddleSnapshot};
pub use shuffle::{FixedShuffler, RandomShuffler, Shuffler};

// Internal modules
mod driver;
mod flow;
mod memory;
mod puzzle;
mod riddle;
mod shuffle;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::scheduler::TimerId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Action not allowed while {0}")]
    NotPlaying(String),
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Level {0} is locked")]
    LevelLocked(String),
    #[error("Slot {0} is not on the board")]
    InvalidSlot(usize),
    #[error("A move needs two different slots, got {0} twice")]
    SameSlot(usize),
    #[error("Card {0} does not exist")]
    InvalidCard(usize),
    #[error("Card {0} is already face up or matched")]
    CardUnavailable(usize),
    #[error("Two cards are still being compared")]
    FlipPending,
    #[error("'{0}' is not a letter")]
    InvalidGuess(char),
    #[error("Waiting for the next word")]
    FeedbackPending,
}

/// Inbound surface shared by the three game state machines
#[async_trait]
pub trait GameEngine: Send {
    type Action: Send + 'static;
    type Snapshot: Clone + Send + Sync + 'static;

    /// Begins a play of `level_id`, or of the student's current level
    async fn start(&mut self, level_id: Option<String>) -> Result<(), GameError>;

    async fn apply(&mut self, action: Self::Action) -> Result<(), GameError>;

    /// Delivers a scheduler firing. Ids the engine does not own are ignored.
    async fn on_timer(&mut self, id: TimerId);

    /// Cancels every pending timer
    fn teardown(&mut self);

    fn snapshot(&self) -> Self::Snapshot;

    fn subscribe(&self) -> watch::Receiver<Self::Snapshot>;
}
