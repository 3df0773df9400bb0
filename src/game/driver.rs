use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::{GameEngine, GameError};
use crate::scheduler::TimerId;
use crate::shared::AppError;

type Reply = oneshot::Sender<Result<(), GameError>>;

pub enum DriverCommand<A> {
    Start {
        level_id: Option<String>,
        reply: Reply,
    },
    Action {
        action: A,
        reply: Reply,
    },
    Teardown,
}

/// Runs one engine on a single task, feeding it user commands and timer
/// firings one at a time so the two never interleave.
pub struct GameDriver<E: GameEngine> {
    engine: E,
    commands: mpsc::UnboundedReceiver<DriverCommand<E::Action>>,
    timers: mpsc::UnboundedReceiver<TimerId>,
}

impl<E: GameEngine> GameDriver<E> {
    pub fn new(engine: E, timers: mpsc::UnboundedReceiver<TimerId>) -> (Self, DriverHandle<E>) {
        let (sender, commands) = mpsc::unbounded_channel();
        let handle = DriverHandle {
            commands: sender,
            snapshots: engine.subscribe(),
        };
        let driver = Self {
            engine,
            commands,
            timers,
        };
        (driver, handle)
    }

    /// Processes events until teardown or until every handle is dropped,
    /// then hands the engine back.
    pub async fn run(mut self) -> E {
        info!("Game driver started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(DriverCommand::Start { level_id, reply }) => {
                        let result = self.engine.start(level_id).await;
                        let _ = reply.send(result);
                    }
                    Some(DriverCommand::Action { action, reply }) => {
                        let result = self.engine.apply(action).await;
                        if let Err(e) = &result {
                            debug!(error = %e, "Action rejected");
                        }
                        let _ = reply.send(result);
                    }
                    Some(DriverCommand::Teardown) | None => break,
                },
                Some(id) = self.timers.recv() => {
                    self.engine.on_timer(id).await;
                }
                else => break,
            }
        }

        self.engine.teardown();
        info!("Game driver stopped");
        self.engine
    }
}

/// Caller side of a running [`GameDriver`]
pub struct DriverHandle<E: GameEngine> {
    commands: mpsc::UnboundedSender<DriverCommand<E::Action>>,
    snapshots: watch::Receiver<E::Snapshot>,
}

impl<E: GameEngine> Clone for DriverHandle<E> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<E: GameEngine> DriverHandle<E> {
    pub async fn start(&self, level_id: Option<String>) -> Result<(), AppError> {
        let (reply, response) = oneshot::channel();
        self.send(DriverCommand::Start { level_id, reply })?;
        response.await.map_err(|_| AppError::DriverStopped)??;
        Ok(())
    }

    pub async fn act(&self, action: E::Action) -> Result<(), AppError> {
        let (reply, response) = oneshot::channel();
        self.send(DriverCommand::Action { action, reply })?;
        response.await.map_err(|_| AppError::DriverStopped)??;
        Ok(())
    }

    pub fn teardown(&self) -> Result<(), AppError> {
        self.send(DriverCommand::Teardown)
    }

    pub fn snapshot(&self) -> E::Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<E::Snapshot> {
        self.snapshots.clone()
    }

    fn send(&self, command: DriverCommand<E::Action>) -> Result<(), AppError> {
        self.commands.send(command).map_err(|_| {
            warn!("Game driver is no longer running");
            AppError::DriverStopped
        })
    }
}
