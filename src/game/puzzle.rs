use async_trait::async_trait;
use serde::Serialize;
use strum_macros::Display;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{flow, GameEngine, GameError, Shuffler};
use crate::level::{defaults, GameKind, LevelParams, PuzzleParams};
use crate::report::{GameMetrics, GameResult};
use crate::scheduler::{Countdown, TickOutcome, TimerId};
use crate::scoring::{puzzle_rating, PuzzleMetrics, Rating};
use crate::shared::{GameContext, Notice};

/// Smallest grid that can be out of order
const MIN_PIECES: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PuzzlePhase {
    #[default]
    Idle,
    Configuring,
    Playing,
    Won,
    TimedOut,
}

impl PuzzlePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PuzzlePhase::Won | PuzzlePhase::TimedOut)
    }

    fn allows(self, next: PuzzlePhase) -> bool {
        use PuzzlePhase::*;
        match (self, next) {
            (Configuring, Configuring) => false,
            (_, Configuring) => true,
            (Configuring, Playing) => true,
            (Playing, Won | TimedOut) => true,
            _ => false,
        }
    }
}

/// Background-position of the image slice a piece shows, in percent per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CropOffset {
    pub x_percent: f32,
    pub y_percent: f32,
}

impl CropOffset {
    fn for_index(index: usize, rows: u32, cols: u32) -> Self {
        let cols_usize = cols.max(1) as usize;
        let col = (index % cols_usize) as f32;
        let row = (index / cols_usize) as f32;
        Self {
            x_percent: axis_percent(col, cols),
            y_percent: axis_percent(row, rows),
        }
    }
}

fn axis_percent(cell: f32, cells: u32) -> f32 {
    if cells <= 1 {
        0.0
    } else {
        cell * 100.0 / (cells - 1) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Piece {
    /// Slot the piece belongs in
    pub index: usize,
    /// Slot the piece currently occupies
    pub position: usize,
    pub crop: CropOffset,
}

/// Pieces stored in slot order, so `pieces[i].position == i` always holds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PuzzleBoard {
    rows: u32,
    cols: u32,
    pieces: Vec<Piece>,
}

impl PuzzleBoard {
    pub fn shuffled(rows: u32, cols: u32, shuffler: &dyn Shuffler) -> Self {
        let count = (rows * cols) as usize;
        let pieces = shuffler
            .permutation(count)
            .into_iter()
            .enumerate()
            .map(|(position, index)| Piece {
                index,
                position,
                crop: CropOffset::for_index(index, rows, cols),
            })
            .collect();

        Self { rows, cols, pieces }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Exchanges the pieces in two slots
    pub fn swap(&mut self, from: usize, to: usize) -> Result<(), GameError> {
        let len = self.pieces.len();
        if from >= len {
            return Err(GameError::InvalidSlot(from));
        }
        if to >= len {
            return Err(GameError::InvalidSlot(to));
        }
        if from == to {
            return Err(GameError::SameSlot(from));
        }

        self.pieces.swap(from, to);
        self.pieces[from].position = from;
        self.pieces[to].position = to;
        Ok(())
    }

    pub fn is_solved(&self) -> bool {
        self.pieces.iter().all(|piece| piece.index == piece.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleAction {
    Swap { from: usize, to: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PuzzleSnapshot {
    pub phase: PuzzlePhase,
    pub level_id: Option<String>,
    pub image: Option<String>,
    pub rows: u32,
    pub cols: u32,
    pub pieces: Vec<Piece>,
    pub moves: u32,
    pub time_limit: u32,
    pub remaining_seconds: Option<u32>,
    pub rating: Option<Rating>,
    pub next_level: Option<String>,
    pub notices: Vec<Notice>,
}

impl PuzzleSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

struct PuzzleSession {
    level_id: String,
    params: PuzzleParams,
    board: PuzzleBoard,
    moves: u32,
    countdown: Countdown,
    rating: Option<Rating>,
    next_level: Option<String>,
    notices: Vec<Notice>,
}

/// Sliding-tile puzzle: swap pieces until every one sits in its own slot
pub struct PuzzleEngine {
    ctx: GameContext,
    phase: PuzzlePhase,
    session: Option<PuzzleSession>,
    torn_down: bool,
    snapshots: watch::Sender<PuzzleSnapshot>,
}

impl PuzzleEngine {
    pub fn new(ctx: GameContext) -> Self {
        let (snapshots, _) = watch::channel(PuzzleSnapshot::default());
        Self {
            ctx,
            phase: PuzzlePhase::Idle,
            session: None,
            torn_down: false,
            snapshots,
        }
    }

    pub fn phase(&self) -> PuzzlePhase {
        self.phase
    }

    pub fn board(&self) -> Option<&PuzzleBoard> {
        self.session.as_ref().map(|session| &session.board)
    }

    fn transition(&mut self, next: PuzzlePhase) -> Result<(), GameError> {
        if !self.phase.allows(next) {
            return Err(GameError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.phase, to = %next, "Puzzle transition");
        self.phase = next;
        self.emit();
        Ok(())
    }

    fn emit(&self) {
        self.snapshots.send_replace(self.build_snapshot());
    }

    fn build_snapshot(&self) -> PuzzleSnapshot {
        let Some(session) = &self.session else {
            return PuzzleSnapshot {
                phase: self.phase,
                ..PuzzleSnapshot::default()
            };
        };

        PuzzleSnapshot {
            phase: self.phase,
            level_id: Some(session.level_id.clone()),
            image: Some(session.params.image.clone()),
            rows: session.board.rows(),
            cols: session.board.cols(),
            pieces: session.board.pieces().to_vec(),
            moves: session.moves,
            time_limit: session.countdown.limit(),
            remaining_seconds: session.countdown.remaining(),
            rating: session.rating,
            next_level: session.next_level.clone(),
            notices: session.notices.clone(),
        }
    }

    async fn level_params(&self, notices: &mut Vec<Notice>) -> PuzzleParams {
        match flow::resolve_params(&self.ctx, GameKind::Puzzle).await {
            Some(LevelParams::Puzzle(params)) if params.piece_count() >= MIN_PIECES => params,
            Some(LevelParams::Puzzle(params)) => {
                warn!(rows = params.rows, cols = params.cols, "Puzzle level is too small");
                notices.push(Notice::InvalidLevelContent(format!(
                    "Puzzle grid {}x{} needs at least {} pieces",
                    params.rows, params.cols, MIN_PIECES
                )));
                defaults::puzzle()
            }
            _ => {
                info!(grade = %self.ctx.student.grade, "No active puzzle level, using default");
                notices.push(Notice::ConfigurationMissing(GameKind::Puzzle));
                defaults::puzzle()
            }
        }
    }

    fn stop_timers(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.countdown.stop(self.ctx.scheduler.as_ref());
        }
    }

    async fn finish(&mut self, outcome: PuzzlePhase) -> Result<(), GameError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.countdown.stop(self.ctx.scheduler.as_ref());

        let won = outcome == PuzzlePhase::Won;
        let rating = puzzle_rating(&PuzzleMetrics {
            won,
            rows: session.board.rows(),
            cols: session.board.cols(),
            moves: session.moves,
            time_limit: session.params.time_limit,
            time_left: session.countdown.remaining().unwrap_or(0),
        });
        session.rating = Some(rating);

        let result = GameResult::new(
            &self.ctx.student.id,
            &session.level_id,
            rating,
            won,
            GameMetrics::Puzzle {
                moves: session.moves,
                time_used: session.countdown.elapsed(),
            },
        );
        let level_id = session.level_id.clone();

        self.transition(outcome)?;
        info!(
            student_id = %self.ctx.student.id,
            level_id = %level_id,
            outcome = %outcome,
            score = rating.score,
            stars = rating.stars,
            "Puzzle finished"
        );
        self.ctx.reporter.report(result);

        if won {
            let mut notices = Vec::new();
            let next =
                flow::record_completion(&self.ctx, GameKind::Puzzle, &level_id, &mut notices).await;
            if let Some(session) = self.session.as_mut() {
                session.next_level = next;
                session.notices.extend(notices);
            }
            self.emit();
        }
        Ok(())
    }
}

#[async_trait]
impl GameEngine for PuzzleEngine {
    type Action = PuzzleAction;
    type Snapshot = PuzzleSnapshot;

    #[instrument(skip(self))]
    async fn start(&mut self, level_id: Option<String>) -> Result<(), GameError> {
        let mut notices = Vec::new();
        let level_id =
            flow::select_level(&self.ctx, GameKind::Puzzle, level_id, &mut notices).await?;

        self.stop_timers();
        self.torn_down = false;
        self.session = None;
        self.transition(PuzzlePhase::Configuring)?;

        let params = self.level_params(&mut notices).await;
        let board = PuzzleBoard::shuffled(params.rows, params.cols, self.ctx.shuffler.as_ref());
        let mut countdown = Countdown::new(params.time_limit);
        countdown.start(self.ctx.scheduler.as_ref(), self.ctx.config.tick_period);

        self.session = Some(PuzzleSession {
            level_id,
            params,
            board,
            moves: 0,
            countdown,
            rating: None,
            next_level: None,
            notices,
        });
        self.transition(PuzzlePhase::Playing)?;

        // The shuffle may land on the solved order; that play is already won
        if self.board().is_some_and(PuzzleBoard::is_solved) {
            info!("Puzzle dealt solved");
            return self.finish(PuzzlePhase::Won).await;
        }
        Ok(())
    }

    async fn apply(&mut self, action: PuzzleAction) -> Result<(), GameError> {
        if self.phase != PuzzlePhase::Playing {
            return Err(GameError::NotPlaying(self.phase.to_string()));
        }
        let PuzzleAction::Swap { from, to } = action;

        let solved = {
            let Some(session) = self.session.as_mut() else {
                return Err(GameError::NotPlaying(PuzzlePhase::Idle.to_string()));
            };
            session.board.swap(from, to)?;
            session.moves += 1;
            session.board.is_solved()
        };

        if solved {
            self.finish(PuzzlePhase::Won).await
        } else {
            self.emit();
            Ok(())
        }
    }

    async fn on_timer(&mut self, id: TimerId) {
        if self.torn_down || self.phase != PuzzlePhase::Playing {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.countdown.on_timer(id) {
            TickOutcome::Ignored => {}
            TickOutcome::Ticked => self.emit(),
            TickOutcome::Expired => {
                if let Err(e) = self.finish(PuzzlePhase::TimedOut).await {
                    warn!(error = %e, "Puzzle could not time out");
                }
            }
        }
    }

    fn teardown(&mut self) {
        self.stop_timers();
        self.torn_down = true;
        debug!(phase = %self.phase, "Puzzle engine torn down");
    }

    fn snapshot(&self) -> PuzzleSnapshot {
        self.snapshots.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<PuzzleSnapshot> {
        self.snapshots.subscribe()
    }
}
