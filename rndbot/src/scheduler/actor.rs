//! Scheduler actor: owns the manager and serializes every request onto one task.

use super::manager::{RandomBotManager, TickReport};
use super::messages::SchedulerMessage;
use crate::host::WorldHost;
use crate::world::BotId;
use super::lifecycle::BotState;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, sleep_until};

/// Callback invoked after every tick with its report and wall time
pub type TickObserver = Box<dyn Fn(&TickReport, Duration) + Send>;

/// Handle for sending messages to the scheduler
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerMessage>,
}

impl SchedulerHandle {
    pub fn new(sender: mpsc::Sender<SchedulerMessage>) -> Self {
        Self { sender }
    }

    /// Send a message to the scheduler
    pub async fn send(&self, message: SchedulerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Scheduler is closed".to_string())
    }

    /// Run a console command and wait for its summary
    pub async fn console(&self, command: &str) -> Result<String, String> {
        let (response, rx) = oneshot::channel();
        self.send(SchedulerMessage::Console {
            command: command.to_string(),
            response,
        })
        .await?;
        rx.await
            .map_err(|_| "Scheduler dropped the request".to_string())?
            .map_err(|e| e.to_string())
    }

    /// Forward one remote protocol line and wait for the reply
    pub async fn remote(&self, request: &str) -> Result<String, String> {
        let (response, rx) = oneshot::channel();
        self.send(SchedulerMessage::Remote {
            request: request.to_string(),
            response,
        })
        .await?;
        rx.await.map_err(|_| "Scheduler dropped the request".to_string())
    }

    pub async fn bot_state(&self, guid: BotId) -> Result<BotState, String> {
        let (response, rx) = oneshot::channel();
        self.send(SchedulerMessage::GetState { guid, response }).await?;
        rx.await.map_err(|_| "Scheduler dropped the request".to_string())
    }

    pub async fn shutdown(&self) -> Result<(), String> {
        self.send(SchedulerMessage::Shutdown).await
    }
}

/// Actor driving a [`RandomBotManager`] on its own check delay
pub struct SchedulerActor<H: WorldHost> {
    /// Scheduler state
    manager: RandomBotManager<H>,

    /// Message inbox
    inbox: mpsc::Receiver<SchedulerMessage>,

    /// Set by a shutdown request
    is_closed: bool,

    /// Optional per-tick callback
    tick_observer: Option<TickObserver>,
}

impl<H: WorldHost> SchedulerActor<H> {
    /// Create a new scheduler actor
    ///
    /// # Arguments
    ///
    /// * `manager` - Initialized manager
    ///
    /// # Returns
    ///
    /// * `(SchedulerActor, SchedulerHandle)` - Actor and handle for sending messages
    pub fn new(manager: RandomBotManager<H>) -> (Self, SchedulerHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let actor = Self {
            manager,
            inbox,
            is_closed: false,
            tick_observer: None,
        };
        (actor, SchedulerHandle::new(sender))
    }

    pub fn with_tick_observer(mut self, observer: TickObserver) -> Self {
        self.tick_observer = Some(observer);
        self
    }

    /// Run until shut down or every handle is dropped.
    ///
    /// # Returns
    ///
    /// * `RandomBotManager<H>` - The manager, for inspection after shutdown
    pub async fn run(mut self) -> RandomBotManager<H> {
        log::info!("Random bot scheduler starting");
        let mut next_tick = Instant::now();

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message).await,
                        None => break,
                    }
                    if self.is_closed {
                        break;
                    }
                }

                _ = sleep_until(next_tick) => {
                    let started = Instant::now();
                    let report = self.manager.tick().await;
                    if let Some(observer) = &self.tick_observer {
                        observer(&report, started.elapsed());
                    }
                    next_tick = Instant::now() + self.manager.next_check_delay();
                }
            }
        }

        self.manager.logout_all();
        log::info!("Random bot scheduler stopped");
        self.manager
    }

    async fn handle_message(&mut self, message: SchedulerMessage) {
        match message {
            SchedulerMessage::Console { command, response } => {
                let result = self.manager.handle_console_command(&command).await;
                let _ = response.send(result);
            }

            SchedulerMessage::Remote { request, response } => {
                let reply = self.manager.handle_remote_command(&request);
                let _ = response.send(reply);
            }

            SchedulerMessage::GetState { guid, response } => {
                let state = self.manager.bot_state(guid).await;
                let _ = response.send(state);
            }

            SchedulerMessage::PlayerLogin { guid } => self.manager.on_player_login(guid),

            SchedulerMessage::PlayerLogout { guid } => self.manager.on_player_logout(guid),

            SchedulerMessage::BotLoginCompleted { guid } => self.manager.on_bot_login(guid),

            SchedulerMessage::BotLoginFailed { guid } => self.manager.on_login_error(guid).await,

            SchedulerMessage::Shutdown => {
                log::info!("Scheduler shutdown requested");
                self.is_closed = true;
            }
        }
    }
}
