//! Background worker bridging the synchronous UI loop and the async gateway.
//!
//! The worker owns a tokio runtime on its own thread. It polls the user list on
//! an interval, runs writes as independent tasks and reports everything back as
//! [`BackendEvent`]s. A successful write always triggers one refresh, and its
//! `Snapshot` is sent before the matching `MutationSucceeded`.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;

use crate::error::Operation;
use crate::gateway::UserGateway;
use crate::model::{User, UserFields};

pub const DEFAULT_REFRESH: Duration = Duration::from_millis(3000);

/// Tags one write so its outcome can be matched to whoever issued it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// A write request against the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Create(UserFields),
    Update { id: String, fields: UserFields },
    Delete { id: String },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Create(_) => MutationKind::Create,
            Mutation::Update { .. } => MutationKind::Update,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl From<MutationKind> for Operation {
    fn from(kind: MutationKind) -> Self {
        match kind {
            MutationKind::Create => Operation::Create,
            MutationKind::Update => Operation::Update,
            MutationKind::Delete => Operation::Delete,
        }
    }
}

/// Commands queued from the UI to the worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCommand {
    Refresh,
    Mutate { request: RequestId, mutation: Mutation },
    Shutdown,
}

/// Events delivered from the worker to the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    Snapshot(Vec<User>),
    FetchFailed(String),
    MutationSucceeded { request: RequestId, kind: MutationKind },
    MutationFailed { request: RequestId, kind: MutationKind, message: String },
}

pub struct BackendHandle {
    commands: UnboundedSender<BackendCommand>,
    events: Receiver<BackendEvent>,
    worker: Option<JoinHandle<()>>,
}

impl BackendHandle {
    /// Queue a command; returns false once the worker has stopped.
    pub fn send(&self, cmd: BackendCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }

    /// Non-blocking receive for the UI loop.
    pub fn try_recv(&self) -> Option<BackendEvent> {
        match self.events.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn events(&self) -> &Receiver<BackendEvent> {
        &self.events
    }

    /// Stop the worker and wait for its thread. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let _ = self.commands.send(BackendCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("backend worker panicked");
            }
        }
    }
}

impl Drop for BackendHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the worker thread with its own current-thread runtime.
pub fn spawn(gateway: UserGateway, refresh_every: Duration) -> anyhow::Result<BackendHandle> {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build backend runtime")?;
    let worker = thread::Builder::new()
        .name("userbook-backend".to_string())
        .spawn(move || {
            runtime.block_on(run_worker(gateway, refresh_every, cmd_rx, event_tx));
            tracing::debug!("backend worker stopped");
        })
        .context("spawn backend thread")?;
    Ok(BackendHandle {
        commands: cmd_tx,
        events: event_rx,
        worker: Some(worker),
    })
}

/// Worker loop: interval polling plus command handling until shutdown.
pub async fn run_worker(
    gateway: UserGateway,
    refresh_every: Duration,
    mut commands: UnboundedReceiver<BackendCommand>,
    events: Sender<BackendEvent>,
) {
    tracing::info!(url = %gateway.users_url(), every_ms = refresh_every.as_millis() as u64, "backend worker started");
    let mut ticker = tokio::time::interval(refresh_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let keep_going = tokio::select! {
            _ = ticker.tick() => refresh_or_stop(&gateway, &events, &mut commands).await,
            cmd = commands.recv() => match cmd {
                Some(BackendCommand::Refresh) => refresh_or_stop(&gateway, &events, &mut commands).await,
                Some(BackendCommand::Mutate { request, mutation }) => {
                    spawn_mutation(&gateway, &events, request, mutation);
                    true
                }
                Some(BackendCommand::Shutdown) | None => false,
            }
        };
        if !keep_going {
            break;
        }
    }
}

fn spawn_mutation(
    gateway: &UserGateway,
    events: &Sender<BackendEvent>,
    request: RequestId,
    mutation: Mutation,
) {
    let gateway = gateway.clone();
    let events = events.clone();
    tokio::spawn(async move { mutate(&gateway, request, mutation, &events).await });
}

/// Run one refresh while still serving commands, so a stalled list request
/// never blocks shutdown. Refresh requests arriving meanwhile are folded into
/// the one in flight. Returns false when the worker should stop.
async fn refresh_or_stop(
    gateway: &UserGateway,
    events: &Sender<BackendEvent>,
    commands: &mut UnboundedReceiver<BackendCommand>,
) -> bool {
    let fetch = refresh(gateway, events);
    tokio::pin!(fetch);
    loop {
        tokio::select! {
            alive = &mut fetch => return alive,
            cmd = commands.recv() => match cmd {
                Some(BackendCommand::Refresh) => {}
                Some(BackendCommand::Mutate { request, mutation }) => {
                    spawn_mutation(gateway, events, request, mutation);
                }
                Some(BackendCommand::Shutdown) | None => {
                    tracing::debug!("shutdown while a refresh was pending");
                    return false;
                }
            }
        }
    }
}

/// Fetch the list once and report it. Returns false if the UI side has gone away.
async fn refresh(gateway: &UserGateway, events: &Sender<BackendEvent>) -> bool {
    let event = match gateway.list_users().await {
        Ok(users) => BackendEvent::Snapshot(users),
        Err(err) => {
            tracing::warn!(error = %err, "user list fetch failed");
            BackendEvent::FetchFailed(err.to_string())
        }
    };
    events.send(event).is_ok()
}

async fn mutate(
    gateway: &UserGateway,
    request: RequestId,
    mutation: Mutation,
    events: &Sender<BackendEvent>,
) {
    let kind = mutation.kind();
    let result = match &mutation {
        Mutation::Create(fields) => gateway.create_user(fields).await.map(|_| ()),
        Mutation::Update { id, fields } => gateway.update_user(id, fields).await.map(|_| ()),
        Mutation::Delete { id } => gateway.delete_user(id).await,
    };
    match result {
        Ok(()) => {
            tracing::info!(op = %Operation::from(kind), request = request.0, "write succeeded");
            if refresh(gateway, events).await {
                let _ = events.send(BackendEvent::MutationSucceeded { request, kind });
            }
        }
        Err(err) => {
            tracing::error!(op = %Operation::from(kind), request = request.0, error = %err, "write failed");
            let _ = events.send(BackendEvent::MutationFailed {
                request,
                kind,
                message: err.to_string(),
            });
        }
    }
}
