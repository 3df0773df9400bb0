use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Serialize;
use strum_macros::Display;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{flow, shuffle, GameEngine, GameError};
use crate::level::{GameKind, LevelParams, RiddleParams, RiddleWord};
use crate::report::{GameMetrics, GameResult};
use crate::scheduler::{Countdown, TickOutcome, TimerId};
use crate::scoring::{riddle_rating, Rating, RiddleMetrics};
use crate::shared::{GameContext, Notice};

const BLANK: char = '_';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiddlePhase {
    #[default]
    Idle,
    Playing,
    WordWon,
    WordLost,
    LevelComplete,
}

impl RiddlePhase {
    pub fn is_terminal(self) -> bool {
        self == RiddlePhase::LevelComplete
    }

    fn allows(self, next: RiddlePhase) -> bool {
        use RiddlePhase::*;
        match (self, next) {
            (Idle | LevelComplete, Playing | LevelComplete) => true,
            (Playing, WordWon | WordLost | LevelComplete) => true,
            (WordWon | WordLost, Playing | LevelComplete) => true,
            _ => false,
        }
    }
}

fn fold(letter: char) -> char {
    letter.to_lowercase().next().unwrap_or(letter)
}

/// The word being guessed
#[derive(Debug, Clone)]
struct WordState {
    secret: String,
    hint: Option<String>,
    guessed: BTreeSet<char>,
    incorrect: u32,
}

impl WordState {
    fn new(word: &RiddleWord) -> Self {
        Self {
            secret: word.word.clone(),
            hint: word.hint.clone(),
            guessed: BTreeSet::new(),
            incorrect: 0,
        }
    }

    fn display(&self) -> String {
        self.secret
            .chars()
            .map(|c| {
                if !c.is_alphabetic() || self.guessed.contains(&fold(c)) {
                    c
                } else {
                    BLANK
                }
            })
            .collect()
    }

    fn contains(&self, letter: char) -> bool {
        self.secret.chars().any(|c| fold(c) == letter)
    }

    fn is_solved(&self) -> bool {
        self.secret
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(|c| self.guessed.contains(&fold(c)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiddleAction {
    Guess(char),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiddleSnapshot {
    pub phase: RiddlePhase,
    pub level_id: Option<String>,
    /// Secret with unguessed letters blanked out
    pub display: String,
    pub hint: Option<String>,
    pub guessed_letters: Vec<char>,
    pub incorrect_guesses: u32,
    pub max_incorrect: u32,
    pub words_guessed: u32,
    pub words_per_round: u32,
    pub words_played: u32,
    pub total_incorrect: u32,
    pub remaining_seconds: Option<u32>,
    /// The secret, once its word is over
    pub revealed_word: Option<String>,
    pub rating: Option<Rating>,
    pub next_level: Option<String>,
    pub notices: Vec<Notice>,
}

impl RiddleSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Result record for a finished round, for callers that persist riddle
    /// outcomes themselves
    pub fn to_result(&self, student_id: &str) -> Option<GameResult> {
        if !self.is_terminal() {
            return None;
        }
        let level_id = self.level_id.as_deref()?;
        let rating = self.rating?;
        let completed = self.words_per_round > 0 && self.words_guessed >= self.words_per_round;

        Some(GameResult::new(
            student_id,
            level_id,
            rating,
            completed,
            GameMetrics::Riddle {
                words_guessed: self.words_guessed,
                total_incorrect: self.total_incorrect,
            },
        ))
    }
}

struct RiddleSession {
    level_id: String,
    words_per_round: u32,
    max_incorrect: u32,
    queue: Vec<RiddleWord>,
    words_played: u32,
    word: Option<WordState>,
    words_guessed: u32,
    total_incorrect: u32,
    countdown: Countdown,
    feedback: Option<TimerId>,
    revealed: bool,
    rating: Option<Rating>,
    next_level: Option<String>,
    notices: Vec<Notice>,
}

impl RiddleSession {
    fn empty(level_id: String, notices: Vec<Notice>) -> Self {
        Self {
            level_id,
            words_per_round: 0,
            max_incorrect: 0,
            queue: Vec::new(),
            words_played: 0,
            word: None,
            words_guessed: 0,
            total_incorrect: 0,
            countdown: Countdown::new(0),
            feedback: None,
            revealed: false,
            rating: None,
            next_level: None,
            notices,
        }
    }

    fn round_target_reached(&self) -> bool {
        self.words_per_round > 0 && self.words_guessed >= self.words_per_round
    }

    /// Moves to the next queued word, `false` when none remain
    fn next_word(&mut self) -> bool {
        let Some(word) = self.queue.get(self.words_played as usize) else {
            self.word = None;
            return false;
        };
        self.word = Some(WordState::new(word));
        self.words_played += 1;
        self.revealed = false;
        true
    }

    /// Counts the current word as lost
    fn lose_word(&mut self) {
        self.total_incorrect += self.max_incorrect;
        self.revealed = true;
    }
}

/// Hangman-style riddle played over a shuffled word list
pub struct RiddleEngine {
    ctx: GameContext,
    phase: RiddlePhase,
    session: Option<RiddleSession>,
    torn_down: bool,
    snapshots: watch::Sender<RiddleSnapshot>,
}

impl RiddleEngine {
    pub fn new(ctx: GameContext) -> Self {
        let (snapshots, _) = watch::channel(RiddleSnapshot::default());
        Self {
            ctx,
            phase: RiddlePhase::Idle,
            session: None,
            torn_down: false,
            snapshots,
        }
    }

    pub fn phase(&self) -> RiddlePhase {
        self.phase
    }

    /// Secret of the word in play
    pub fn current_word(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.word.as_ref())
            .map(|word| word.secret.as_str())
    }

    fn transition(&mut self, next: RiddlePhase) -> Result<(), GameError> {
        if !self.phase.allows(next) {
            return Err(GameError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.phase, to = %next, "Riddle transition");
        self.phase = next;
        self.emit();
        Ok(())
    }

    fn emit(&self) {
        self.snapshots.send_replace(self.build_snapshot());
    }

    fn build_snapshot(&self) -> RiddleSnapshot {
        let Some(session) = &self.session else {
            return RiddleSnapshot {
                phase: self.phase,
                ..RiddleSnapshot::default()
            };
        };
        let word = session.word.as_ref();

        RiddleSnapshot {
            phase: self.phase,
            level_id: Some(session.level_id.clone()),
            display: word.map(WordState::display).unwrap_or_default(),
            hint: word.and_then(|w| w.hint.clone()),
            guessed_letters: word
                .map(|w| w.guessed.iter().copied().collect())
                .unwrap_or_default(),
            incorrect_guesses: word.map(|w| w.incorrect).unwrap_or(0),
            max_incorrect: session.max_incorrect,
            words_guessed: session.words_guessed,
            words_per_round: session.words_per_round,
            words_played: session.words_played,
            total_incorrect: session.total_incorrect,
            remaining_seconds: session.countdown.remaining(),
            revealed_word: word.filter(|_| session.revealed).map(|w| w.secret.clone()),
            rating: session.rating,
            next_level: session.next_level.clone(),
            notices: session.notices.clone(),
        }
    }

    /// Playable parameters, or `None` when the round cannot be played
    async fn level_params(&self, notices: &mut Vec<Notice>) -> Option<RiddleParams> {
        let Some(LevelParams::Riddle(mut params)) =
            flow::resolve_params(&self.ctx, GameKind::Riddle).await
        else {
            info!(grade = %self.ctx.student.grade, "No active riddle level");
            notices.push(Notice::ConfigurationMissing(GameKind::Riddle));
            return None;
        };

        if params.words_per_round == 0 || params.max_incorrect_per_word == 0 {
            notices.push(Notice::InvalidLevelContent(
                "Riddle level needs words per round and a miss limit".to_string(),
            ));
            return None;
        }
        let configured = params.words.len();
        params
            .words
            .retain(|word| word.word.chars().any(char::is_alphabetic));
        if params.words.len() < configured {
            warn!(
                dropped = configured - params.words.len(),
                "Riddle words without letters skipped"
            );
            notices.push(Notice::InvalidLevelContent(format!(
                "{} riddle words have no letters to guess",
                configured - params.words.len()
            )));
        }
        if (params.words.len() as u32) < params.words_per_round {
            warn!(
                words = params.words.len(),
                words_per_round = params.words_per_round,
                "Riddle level has too few words"
            );
            notices.push(Notice::InvalidLevelContent(format!(
                "{} words per round but only {} configured",
                params.words_per_round,
                params.words.len()
            )));
            return None;
        }
        Some(params)
    }

    fn stop_timers(&mut self) {
        let scheduler = self.ctx.scheduler.as_ref();
        if let Some(session) = self.session.as_mut() {
            session.countdown.stop(scheduler);
            if let Some(timer) = session.feedback.take() {
                scheduler.cancel(timer);
            }
        }
    }

    fn end_word(&mut self, outcome: RiddlePhase) -> Result<(), GameError> {
        let delay = self.ctx.config.feedback_delay;
        let scheduler = self.ctx.scheduler.clone();
        if let Some(session) = self.session.as_mut() {
            session.feedback = Some(scheduler.schedule_once(delay));
        }
        self.transition(outcome)
    }

    async fn advance(&mut self) -> Result<(), GameError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.feedback = None;
        if session.round_target_reached() || !session.next_word() {
            return self.complete().await;
        }
        self.transition(RiddlePhase::Playing)
    }

    async fn complete(&mut self) -> Result<(), GameError> {
        self.stop_timers();
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let rating = riddle_rating(&RiddleMetrics {
            words_guessed: session.words_guessed,
            words_per_round: session.words_per_round,
            total_incorrect: session.total_incorrect,
            max_incorrect_per_word: session.max_incorrect,
        });
        session.rating = Some(rating);
        let level_id = session.level_id.clone();
        let target_reached = session.round_target_reached();

        self.transition(RiddlePhase::LevelComplete)?;
        info!(
            student_id = %self.ctx.student.id,
            level_id = %level_id,
            words_guessed = rating.score,
            stars = rating.stars,
            "Riddle round complete"
        );

        if target_reached {
            let mut notices = Vec::new();
            let next =
                flow::record_completion(&self.ctx, GameKind::Riddle, &level_id, &mut notices).await;
            if let Some(session) = self.session.as_mut() {
                session.next_level = next;
                session.notices.extend(notices);
            }
            self.emit();
        }
        Ok(())
    }

    fn guess(&mut self, letter: char) -> Result<(), GameError> {
        match self.phase {
            RiddlePhase::Playing => {}
            RiddlePhase::WordWon | RiddlePhase::WordLost => return Err(GameError::FeedbackPending),
            other => return Err(GameError::NotPlaying(other.to_string())),
        }
        if !letter.is_alphabetic() {
            return Err(GameError::InvalidGuess(letter));
        }
        let letter = fold(letter);

        let Some(session) = self.session.as_mut() else {
            return Err(GameError::NotPlaying(self.phase.to_string()));
        };
        let max_incorrect = session.max_incorrect;
        let Some(word) = session.word.as_mut() else {
            return Err(GameError::NotPlaying(self.phase.to_string()));
        };

        if !word.guessed.insert(letter) {
            return Ok(());
        }
        if !word.contains(letter) {
            word.incorrect += 1;
        }

        if word.is_solved() {
            let incorrect = word.incorrect;
            session.words_guessed += 1;
            session.total_incorrect += incorrect;
            session.revealed = true;
            debug!(words_guessed = session.words_guessed, incorrect, "Word guessed");
            self.end_word(RiddlePhase::WordWon)
        } else if word.incorrect >= max_incorrect {
            session.lose_word();
            debug!(total_incorrect = session.total_incorrect, "Word lost");
            self.end_word(RiddlePhase::WordLost)
        } else {
            self.emit();
            Ok(())
        }
    }

    async fn expire(&mut self) -> Result<(), GameError> {
        if self.phase == RiddlePhase::Playing {
            if let Some(session) = self.session.as_mut() {
                session.lose_word();
            }
        }
        info!(student_id = %self.ctx.student.id, "Riddle round ran out of time");
        self.complete().await
    }
}

#[async_trait]
impl GameEngine for RiddleEngine {
    type Action = RiddleAction;
    type Snapshot = RiddleSnapshot;

    #[instrument(skip(self))]
    async fn start(&mut self, level_id: Option<String>) -> Result<(), GameError> {
        let mut notices = Vec::new();
        let level_id =
            flow::select_level(&self.ctx, GameKind::Riddle, level_id, &mut notices).await?;

        self.stop_timers();
        self.torn_down = false;
        self.session = None;
        if !matches!(self.phase, RiddlePhase::Idle | RiddlePhase::LevelComplete) {
            debug!(phase = %self.phase, "Abandoning riddle round");
            self.phase = RiddlePhase::Idle;
        }

        let Some(params) = self.level_params(&mut notices).await else {
            self.session = Some(RiddleSession::empty(level_id, notices));
            return self.complete().await;
        };

        let order = self.ctx.shuffler.permutation(params.words.len());
        let mut session = RiddleSession::empty(level_id, notices);
        session.words_per_round = params.words_per_round;
        session.max_incorrect = params.max_incorrect_per_word;
        session.queue = shuffle::arrange(&params.words, &order);
        session.countdown = Countdown::new(params.round_time_limit);
        session.next_word();
        session
            .countdown
            .start(self.ctx.scheduler.as_ref(), self.ctx.config.tick_period);

        self.session = Some(session);
        self.transition(RiddlePhase::Playing)
    }

    async fn apply(&mut self, action: RiddleAction) -> Result<(), GameError> {
        let RiddleAction::Guess(letter) = action;
        self.guess(letter)
    }

    async fn on_timer(&mut self, id: TimerId) {
        let in_round = matches!(
            self.phase,
            RiddlePhase::Playing | RiddlePhase::WordWon | RiddlePhase::WordLost
        );
        if self.torn_down || !in_round {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let result = if session.feedback == Some(id) {
            self.advance().await
        } else {
            match session.countdown.on_timer(id) {
                TickOutcome::Ignored => Ok(()),
                TickOutcome::Ticked => {
                    self.emit();
                    Ok(())
                }
                TickOutcome::Expired => self.expire().await,
            }
        };

        if let Err(e) = result {
            warn!(error = %e, "Riddle timer could not be handled");
        }
    }

    fn teardown(&mut self) {
        self.stop_timers();
        self.torn_down = true;
        debug!(phase = %self.phase, "Riddle engine torn down");
    }

    fn snapshot(&self) -> RiddleSnapshot {
        self.snapshots.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<RiddleSnapshot> {
        self.snapshots.subscribe()
    }
}
