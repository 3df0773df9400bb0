use async_trait::async_trait;
use serde::Serialize;
use strum_macros::Display;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{flow, shuffle, GameEngine, GameError};
use crate::level::{defaults, GameKind, LevelParams, MemoryParams};
use crate::report::{GameMetrics, GameResult};
use crate::scheduler::{Countdown, TickOutcome, TimerId};
use crate::scoring::{memory_rating, MemoryMetrics, Rating};
use crate::shared::{GameContext, Notice};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MemoryPhase {
    #[default]
    Idle,
    Configuring,
    Playing,
    Won,
    TimedOut,
    AttemptsExhausted,
}

impl MemoryPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MemoryPhase::Won | MemoryPhase::TimedOut | MemoryPhase::AttemptsExhausted
        )
    }

    fn allows(self, next: MemoryPhase) -> bool {
        use MemoryPhase::*;
        match (self, next) {
            (Configuring, Configuring) => false,
            (_, Configuring) => true,
            (Configuring, Playing) => true,
            (Playing, Won | TimedOut | AttemptsExhausted) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Card {
    pair: usize,
    image: String,
    face_up: bool,
    matched: bool,
}

/// What the player sees of a card; the image only once it is turned over
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: usize,
    pub image: Option<String>,
    pub face_up: bool,
    pub matched: bool,
}

/// Cards turned over and not yet resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Empty,
    One(usize),
    /// A mismatched pair held face up until the settle timer fires
    Settling {
        first: usize,
        second: usize,
        timer: TimerId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryAction {
    Flip(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub phase: MemoryPhase,
    pub level_id: Option<String>,
    pub cards: Vec<CardView>,
    pub pair_count: u32,
    pub matched_pairs: u32,
    pub attempts_used: u32,
    /// `None` when attempts are unlimited
    pub attempts_remaining: Option<u32>,
    pub time_limit: u32,
    pub remaining_seconds: Option<u32>,
    /// True while a mismatched pair is being shown
    pub settling: bool,
    pub rating: Option<Rating>,
    pub next_level: Option<String>,
    pub notices: Vec<Notice>,
}

impl MemorySnapshot {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

struct MemorySession {
    level_id: String,
    params: MemoryParams,
    cards: Vec<Card>,
    selection: Selection,
    matched_pairs: u32,
    attempts_used: u32,
    attempts_remaining: Option<u32>,
    countdown: Countdown,
    rating: Option<Rating>,
    next_level: Option<String>,
    notices: Vec<Notice>,
}

impl MemorySession {
    fn all_matched(&self) -> bool {
        self.matched_pairs >= self.params.pair_count
    }
}

/// Card-matching memory game
pub struct MemoryEngine {
    ctx: GameContext,
    phase: MemoryPhase,
    session: Option<MemorySession>,
    torn_down: bool,
    snapshots: watch::Sender<MemorySnapshot>,
}

impl MemoryEngine {
    pub fn new(ctx: GameContext) -> Self {
        let (snapshots, _) = watch::channel(MemorySnapshot::default());
        Self {
            ctx,
            phase: MemoryPhase::Idle,
            session: None,
            torn_down: false,
            snapshots,
        }
    }

    pub fn phase(&self) -> MemoryPhase {
        self.phase
    }

    /// Pair identity of every card in layout order
    pub fn layout(&self) -> Vec<usize> {
        self.session
            .as_ref()
            .map(|session| session.cards.iter().map(|card| card.pair).collect())
            .unwrap_or_default()
    }

    fn transition(&mut self, next: MemoryPhase) -> Result<(), GameError> {
        if !self.phase.allows(next) {
            return Err(GameError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.phase, to = %next, "Memory transition");
        self.phase = next;
        self.emit();
        Ok(())
    }

    fn emit(&self) {
        self.snapshots.send_replace(self.build_snapshot());
    }

    fn build_snapshot(&self) -> MemorySnapshot {
        let Some(session) = &self.session else {
            return MemorySnapshot {
                phase: self.phase,
                ..MemorySnapshot::default()
            };
        };

        let cards = session
            .cards
            .iter()
            .enumerate()
            .map(|(id, card)| CardView {
                id,
                image: (card.face_up || card.matched).then(|| card.image.clone()),
                face_up: card.face_up,
                matched: card.matched,
            })
            .collect();

        MemorySnapshot {
            phase: self.phase,
            level_id: Some(session.level_id.clone()),
            cards,
            pair_count: session.params.pair_count,
            matched_pairs: session.matched_pairs,
            attempts_used: session.attempts_used,
            attempts_remaining: session.attempts_remaining,
            time_limit: session.countdown.limit(),
            remaining_seconds: session.countdown.remaining(),
            settling: matches!(session.selection, Selection::Settling { .. }),
            rating: session.rating,
            next_level: session.next_level.clone(),
            notices: session.notices.clone(),
        }
    }

    async fn level_params(&self, notices: &mut Vec<Notice>) -> MemoryParams {
        let mut params = match flow::resolve_params(&self.ctx, GameKind::Memory).await {
            Some(LevelParams::Memory(params)) => params,
            _ => {
                info!(grade = %self.ctx.student.grade, "No active memory level, using default");
                notices.push(Notice::ConfigurationMissing(GameKind::Memory));
                return defaults::memory();
            }
        };

        let images = params.images.len() as u32;
        if images < params.pair_count {
            warn!(
                pair_count = params.pair_count,
                images, "Memory level has fewer images than pairs"
            );
            notices.push(Notice::InvalidLevelContent(format!(
                "{} pairs configured but only {} images",
                params.pair_count, images
            )));
            params.pair_count = images;
        }

        if params.pair_count == 0 {
            notices.push(Notice::InvalidLevelContent(
                "Memory level has no cards".to_string(),
            ));
            return defaults::memory();
        }

        params
    }

    fn deal(params: &MemoryParams, shuffler: &dyn super::Shuffler) -> Vec<Card> {
        let ordered: Vec<Card> = params
            .images
            .iter()
            .take(params.pair_count as usize)
            .enumerate()
            .flat_map(|(pair, image)| {
                let card = Card {
                    pair,
                    image: image.clone(),
                    face_up: false,
                    matched: false,
                };
                [card.clone(), card]
            })
            .collect();

        shuffle::arrange(&ordered, &shuffler.permutation(ordered.len()))
    }

    fn stop_timers(&mut self) {
        let scheduler = self.ctx.scheduler.as_ref();
        if let Some(session) = self.session.as_mut() {
            session.countdown.stop(scheduler);
            if let Selection::Settling { timer, .. } = session.selection {
                scheduler.cancel(timer);
            }
        }
    }

    async fn flip(&mut self, index: usize) -> Result<(), GameError> {
        if self.phase != MemoryPhase::Playing {
            return Err(GameError::NotPlaying(self.phase.to_string()));
        }
        let settle_delay = self.ctx.config.settle_delay;
        let scheduler = self.ctx.scheduler.clone();
        let Some(session) = self.session.as_mut() else {
            return Err(GameError::NotPlaying(self.phase.to_string()));
        };

        let first = match session.selection {
            Selection::Settling { .. } => return Err(GameError::FlipPending),
            Selection::Empty => None,
            Selection::One(first) => Some(first),
        };
        let card = session
            .cards
            .get_mut(index)
            .ok_or(GameError::InvalidCard(index))?;
        if card.face_up || card.matched {
            return Err(GameError::CardUnavailable(index));
        }
        card.face_up = true;

        let Some(first) = first else {
            session.selection = Selection::One(index);
            self.emit();
            return Ok(());
        };

        // Second card: resolve the pair now
        session.attempts_used += 1;
        if let Some(remaining) = session.attempts_remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        let is_match = session.cards[first].pair == session.cards[index].pair;

        if is_match {
            session.cards[first].matched = true;
            session.cards[index].matched = true;
            session.matched_pairs += 1;
            session.selection = Selection::Empty;
            if session.all_matched() {
                return self.finish(MemoryPhase::Won).await;
            }
        }

        if session.attempts_remaining == Some(0) {
            return self.finish(MemoryPhase::AttemptsExhausted).await;
        }

        if !is_match {
            let timer = scheduler.schedule_once(settle_delay);
            session.selection = Selection::Settling {
                first,
                second: index,
                timer,
            };
        }
        self.emit();
        Ok(())
    }

    async fn finish(&mut self, outcome: MemoryPhase) -> Result<(), GameError> {
        self.stop_timers();
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.selection = Selection::Empty;

        let won = outcome == MemoryPhase::Won;
        let rating = memory_rating(&MemoryMetrics {
            all_matched: session.all_matched(),
            attempt_limit: session.params.attempt_limit,
            attempts_used: session.attempts_used,
            time_limit: session.params.time_limit,
            time_left: session.countdown.remaining().unwrap_or(0),
        });
        session.rating = Some(rating);

        let result = GameResult::new(
            &self.ctx.student.id,
            &session.level_id,
            rating,
            won,
            GameMetrics::Memory {
                matched_pairs: session.matched_pairs,
                attempts_used: session.attempts_used,
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
            "Memory game finished"
        );
        self.ctx.reporter.report(result);

        if won {
            let mut notices = Vec::new();
            let next =
                flow::record_completion(&self.ctx, GameKind::Memory, &level_id, &mut notices).await;
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
impl GameEngine for MemoryEngine {
    type Action = MemoryAction;
    type Snapshot = MemorySnapshot;

    #[instrument(skip(self))]
    async fn start(&mut self, level_id: Option<String>) -> Result<(), GameError> {
        let mut notices = Vec::new();
        let level_id =
            flow::select_level(&self.ctx, GameKind::Memory, level_id, &mut notices).await?;

        self.stop_timers();
        self.torn_down = false;
        self.session = None;
        self.transition(MemoryPhase::Configuring)?;

        let params = self.level_params(&mut notices).await;
        let cards = Self::deal(&params, self.ctx.shuffler.as_ref());
        let attempts_remaining = (params.attempt_limit > 0).then_some(params.attempt_limit);
        let mut countdown = Countdown::new(params.time_limit);
        countdown.start(self.ctx.scheduler.as_ref(), self.ctx.config.tick_period);

        self.session = Some(MemorySession {
            level_id,
            params,
            cards,
            selection: Selection::Empty,
            matched_pairs: 0,
            attempts_used: 0,
            attempts_remaining,
            countdown,
            rating: None,
            next_level: None,
            notices,
        });
        self.transition(MemoryPhase::Playing)
    }

    async fn apply(&mut self, action: MemoryAction) -> Result<(), GameError> {
        let MemoryAction::Flip(index) = action;
        self.flip(index).await
    }

    async fn on_timer(&mut self, id: TimerId) {
        if self.torn_down || self.phase != MemoryPhase::Playing {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Selection::Settling {
            first,
            second,
            timer,
        } = session.selection
        {
            if timer == id {
                session.cards[first].face_up = false;
                session.cards[second].face_up = false;
                session.selection = Selection::Empty;
                self.emit();
                return;
            }
        }

        match session.countdown.on_timer(id) {
            TickOutcome::Ignored => {}
            TickOutcome::Ticked => self.emit(),
            TickOutcome::Expired => {
                if let Err(e) = self.finish(MemoryPhase::TimedOut).await {
                    warn!(error = %e, "Memory game could not time out");
                }
            }
        }
    }

    fn teardown(&mut self) {
        self.stop_timers();
        self.torn_down = true;
        debug!(phase = %self.phase, "Memory engine torn down");
    }

    fn snapshot(&self) -> MemorySnapshot {
        self.snapshots.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<MemorySnapshot> {
        self.snapshots.subscribe()
    }
}
