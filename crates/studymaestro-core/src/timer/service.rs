//! Background stopwatch task.
//!
//! [`TimerService::spawn`] moves a [`StopwatchEngine`] onto its own task and
//! hands back a [`TimerHandle`]. Commands and ticks are handled in one loop,
//! so a tick is never applied after the stop that precedes it. The task keeps
//! running while any handle is alive, independent of screen subscriptions.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, info};

use super::announcer::SessionAnnouncer;
use super::engine::{StopwatchEngine, StopwatchEvent, TimerSnapshot};
use crate::error::{CoreError, Result};

/// One second, the tick period of a real stopwatch.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
enum Command {
    Start,
    Stop,
    Cancel,
    SetSubject(Option<i64>),
}

struct Request {
    command: Command,
    reply: oneshot::Sender<TimerSnapshot>,
}

pub struct TimerService {
    engine: StopwatchEngine,
    announcer: Arc<dyn SessionAnnouncer>,
    tick_interval: Duration,
    ticker: Option<Interval>,
    snapshot: watch::Sender<TimerSnapshot>,
}

impl TimerService {
    /// Start the stopwatch task. Must be called from within a tokio runtime.
    pub fn spawn(announcer: Arc<dyn SessionAnnouncer>, tick_interval: Duration) -> TimerHandle {
        let engine = StopwatchEngine::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (command_tx, command_rx) = mpsc::channel(16);
        let service = Self {
            engine,
            announcer,
            tick_interval,
            ticker: None,
            snapshot: snapshot_tx,
        };
        tokio::spawn(service.run(command_rx));
        TimerHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Request>) {
        loop {
            tokio::select! {
                request = commands.recv() => {
                    let Some(request) = request else { break };
                    self.handle(request.command);
                    // Publish first so the caller's next read already sees it.
                    let snapshot = self.engine.snapshot();
                    self.snapshot.send_replace(snapshot.clone());
                    // Caller may have dropped the reply.
                    let _ = request.reply.send(snapshot);
                }
                _ = next_tick(&mut self.ticker) => {
                    if let Some(StopwatchEvent::Ticked { parts, .. }) = self.engine.tick() {
                        let (h, m, s) = parts.padded();
                        self.announcer.on_tick(&h, &m, &s);
                        self.snapshot.send_replace(self.engine.snapshot());
                    }
                }
            }
        }
        debug!("timer task exiting; all handles dropped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start => {
                if let Some(StopwatchEvent::Started { elapsed_secs }) = self.engine.start() {
                    // First tick lands one full period after start.
                    self.ticker = Some(interval_at(
                        Instant::now() + self.tick_interval,
                        self.tick_interval,
                    ));
                    info!(elapsed_secs, subject_id = ?self.engine.subject_id(), "stopwatch started");
                }
            }
            Command::Stop => {
                self.ticker = None;
                if let Some(StopwatchEvent::Stopped { elapsed_secs }) = self.engine.stop() {
                    info!(elapsed_secs, "stopwatch stopped");
                }
            }
            Command::Cancel => {
                self.ticker = None;
                self.engine.cancel();
                self.announcer.dismiss();
                info!("stopwatch cancelled");
            }
            Command::SetSubject(subject_id) => {
                self.engine.set_subject(subject_id);
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

/// Cheap, cloneable control surface for the stopwatch task.
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Request>,
    snapshot: watch::Receiver<TimerSnapshot>,
}

impl TimerHandle {
    async fn send(&self, command: Command) -> Result<TimerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| CoreError::TimerUnavailable)?;
        rx.await.map_err(|_| CoreError::TimerUnavailable)
    }

    /// Begin or resume counting. No effect while already running.
    pub async fn start(&self) -> Result<TimerSnapshot> {
        self.send(Command::Start).await
    }

    /// Pause counting and keep the elapsed time.
    pub async fn stop(&self) -> Result<TimerSnapshot> {
        self.send(Command::Stop).await
    }

    /// Stop, zero the elapsed time and dismiss the announcer.
    pub async fn cancel(&self) -> Result<TimerSnapshot> {
        self.send(Command::Cancel).await
    }

    pub async fn set_subject(&self, subject_id: Option<i64>) -> Result<TimerSnapshot> {
        self.send(Command::SetSubject(subject_id)).await
    }

    /// Latest published state.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.snapshot.borrow().elapsed_secs
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot.clone()
    }
}
