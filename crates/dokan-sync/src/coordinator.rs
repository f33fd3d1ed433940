//! # Sync Coordinator
//!
//! One task that owns every side effect of a change: the local save, the
//! debounced push of the whole shop, and applying documents written by
//! other devices.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────────┐  owner signs in   ┌──────────┐  deadline fires or   │
//! │   │ Disconnected │ ────────────────► │   Idle   │  sync_now()          │
//! │   │              │ ◄──────────────── │          │ ───────────┐         │
//! │   └──────────────┘  owner signs out  └──────────┘            ▼         │
//! │                                           ▲           ┌──────────┐     │
//! │                                           └────────── │ Syncing  │     │
//! │                                          push settles └──────────┘     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Event Loop
//! ```text
//!   tokio::select! {
//!       auth watch         → subscribe / switch owner / logout
//!       remote watch       → apply if strictly newer
//!       command mpsc       → Mutated: save local, re-arm deadline
//!                            SyncNow: push immediately, reply bool
//!                            Shutdown: flush pending push, stop
//!       sleep_until(deadline), if armed → push
//!   }
//! ```
//!
//! ## Debounce
//! There is one deadline. Every mutation moves it to `now + debounce`, so a
//! burst of edits produces one push carrying the newest state. A push is
//! awaited inside the loop; mutations arriving meanwhile queue in the
//! channel and re-arm the deadline once the push has settled.

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use dokan_core::AppState;

use crate::auth::Owner;
use crate::protocol::RemoteSnapshot;
use crate::remote::RemoteDocumentStore;
use crate::store::LocalStore;

/// Quiet window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(10);

// =============================================================================
// Sync Status
// =============================================================================

/// Where the coordinator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    /// Nobody signed in; changes stay local.
    #[default]
    Disconnected,
    /// Signed in, no push in flight.
    Idle,
    /// A push is in flight.
    Syncing,
}

/// Current sync status for external queries.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    pub phase: SyncPhase,

    /// Email of the signed-in owner.
    pub owner_email: Option<String>,

    /// Stamp of the last document pushed or applied.
    pub last_sync: Option<DateTime<Utc>>,

    /// Whether a debounced push is waiting.
    pub push_pending: bool,

    /// Last push failure, cleared by the next success.
    pub last_error: Option<String>,

    /// Successful pushes since start.
    pub pushes: u64,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives coordinator events (implemented by the embedding UI).
pub trait SyncEventEmitter: Send + Sync {
    /// Emits a sync status change event.
    fn emit_status(&self, status: &SyncStatus);

    /// A remote document replaced the shop; views should re-read it.
    fn emit_remote_applied(&self, last_sync: Option<DateTime<Utc>>);

    /// Emits a sync error event.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &SyncStatus) {}
    fn emit_remote_applied(&self, _last_sync: Option<DateTime<Utc>>) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Handle
// =============================================================================

enum Command {
    Mutated,
    SyncNow(oneshot::Sender<bool>),
    Shutdown,
}

/// Cheap, cloneable handle for talking to a running coordinator.
#[derive(Clone)]
pub struct SyncHandle {
    commands_tx: mpsc::UnboundedSender<Command>,
    status: Arc<tokio::sync::RwLock<SyncStatus>>,
}

impl SyncHandle {
    /// Tells the coordinator the shared state changed.
    pub fn notify_mutation(&self) {
        if self.commands_tx.send(Command::Mutated).is_err() {
            debug!("Mutation after coordinator stopped; not persisted");
        }
    }

    /// Pushes now, cancelling any pending debounce. Returns whether the
    /// remote write succeeded; `false` when nobody is signed in.
    pub async fn sync_now(&self) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands_tx.send(Command::SyncNow(reply_tx)).is_err() {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }

    /// Gets the current sync status.
    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Signals the coordinator to flush and stop.
    pub fn shutdown(&self) {
        let _ = self.commands_tx.send(Command::Shutdown);
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Drives local saves and remote sync for one shop.
pub struct SyncCoordinator<L, R> {
    state: Arc<RwLock<AppState>>,
    store: L,
    remote: R,
    debounce: Duration,

    auth_rx: watch::Receiver<Option<Owner>>,
    auth_open: bool,
    commands_rx: mpsc::UnboundedReceiver<Command>,

    owner: Option<Owner>,
    subscription: Option<watch::Receiver<Option<RemoteSnapshot>>>,
    deadline: Option<Instant>,

    status: Arc<tokio::sync::RwLock<SyncStatus>>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl<L: LocalStore, R: RemoteDocumentStore> SyncCoordinator<L, R> {
    /// Creates a coordinator over `state` and returns a handle to it.
    /// Nothing happens until [`run`](Self::run) or [`spawn`](Self::spawn).
    pub fn new(
        state: Arc<RwLock<AppState>>,
        store: L,
        remote: R,
        auth_rx: watch::Receiver<Option<Owner>>,
    ) -> (Self, SyncHandle) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let status = Arc::new(tokio::sync::RwLock::new(SyncStatus::default()));

        let coordinator = SyncCoordinator {
            state,
            store,
            remote,
            debounce: DEFAULT_DEBOUNCE,
            auth_rx,
            auth_open: true,
            commands_rx,
            owner: None,
            subscription: None,
            deadline: None,
            status: Arc::clone(&status),
            emitter: Arc::new(NoOpEmitter),
        };

        let handle = SyncHandle {
            commands_tx,
            status,
        };

        (coordinator, handle)
    }

    /// Sets the quiet window between the last mutation and the push.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the event emitter.
    pub fn with_emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Runs the coordinator on a new tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the event loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!(debounce_ms = self.debounce.as_millis() as u64, "Sync coordinator starting");

        let initial = self.auth_rx.borrow_and_update().clone();
        if initial.is_some() {
            self.on_owner(initial).await;
        }

        loop {
            tokio::select! {
                changed = self.auth_rx.changed(), if self.auth_open => {
                    match changed {
                        Ok(()) => {
                            let owner = self.auth_rx.borrow_and_update().clone();
                            self.on_owner(owner).await;
                        }
                        Err(_) => {
                            debug!("Auth session dropped; owner is now fixed");
                            self.auth_open = false;
                        }
                    }
                }

                update = next_remote(&mut self.subscription) => {
                    match update {
                        Some(document) => self.on_remote(document).await,
                        None => {
                            warn!("Remote subscription closed");
                            self.subscription = None;
                        }
                    }
                }

                command = self.commands_rx.recv() => {
                    match command {
                        Some(Command::Mutated) => self.on_mutation().await,
                        Some(Command::SyncNow(reply)) => {
                            let ok = self.sync_now().await;
                            let _ = reply.send(ok);
                        }
                        Some(Command::Shutdown) | None => {
                            info!("Sync coordinator shutting down");
                            break;
                        }
                    }
                }

                _ = sleep_until(self.deadline.unwrap_or_else(Instant::now)), if self.deadline.is_some() => {
                    debug!("Debounce elapsed");
                    self.push().await;
                }
            }
        }

        if self.deadline.is_some() {
            info!("Flushing pending push before stopping");
            self.push().await;
        }

        info!("Sync coordinator stopped");
    }

    // =========================================================================
    // Event Handlers
    // =========================================================================

    async fn on_owner(&mut self, owner: Option<Owner>) {
        let Some(owner) = owner else {
            self.logout().await;
            return;
        };

        if self.owner.as_ref() == Some(&owner) {
            return;
        }

        if let Some(previous) = &self.owner {
            info!(from = %previous.uid, to = %owner.uid, "Switching owner");
            if self.deadline.is_some() {
                self.push().await;
            }
            self.subscription = None;
        }

        let mut rx = self.remote.subscribe(&owner);
        let current = rx.borrow_and_update().clone();
        self.subscription = Some(rx);

        let applied = {
            let mut state = self.write_state();
            state.linked_email = Some(owner.email.clone());
            current.as_ref().is_some_and(|doc| doc.apply_to(&mut state))
        };

        info!(uid = %owner.uid, email = %owner.email, applied, "Linked to owner document");

        let email = owner.email.clone();
        self.owner = Some(owner);
        self.persist().await;

        let last_sync = self.read_last_sync();
        if applied {
            self.deadline = None;
            self.emitter.emit_remote_applied(last_sync);
        }
        self.update_status(|s| {
            s.phase = SyncPhase::Idle;
            s.owner_email = Some(email);
            s.last_sync = last_sync;
            s.push_pending = false;
        })
        .await;
    }

    async fn logout(&mut self) {
        let Some(previous) = self.owner.take() else {
            return;
        };

        self.subscription = None;
        if self.deadline.take().is_some() {
            warn!(uid = %previous.uid, "Dropping pending push on logout");
        }

        {
            let mut state = self.write_state();
            state.linked_email = None;
            state.last_sync = None;
        }
        self.persist().await;

        info!(uid = %previous.uid, "Unlinked from owner document");
        self.update_status(|s| {
            s.phase = SyncPhase::Disconnected;
            s.owner_email = None;
            s.last_sync = None;
            s.push_pending = false;
        })
        .await;
    }

    async fn on_remote(&mut self, document: Option<RemoteSnapshot>) {
        let Some(document) = document else {
            debug!("Owner document is empty");
            return;
        };

        let applied = document.apply_to(&mut self.write_state());
        if !applied {
            return;
        }

        info!(last_sync = ?document.last_sync, "Applied newer remote document");
        if self.deadline.take().is_some() {
            warn!("Remote document replaced unpushed local changes");
        }
        self.persist().await;

        self.emitter.emit_remote_applied(document.last_sync);
        self.update_status(|s| {
            s.last_sync = document.last_sync;
            s.push_pending = false;
        })
        .await;
    }

    async fn on_mutation(&mut self) {
        self.persist().await;

        if self.owner.is_none() {
            return;
        }

        self.deadline = Some(Instant::now() + self.debounce);
        debug!(debounce_ms = self.debounce.as_millis() as u64, "Push scheduled");
        self.update_status(|s| s.push_pending = true).await;
    }

    async fn sync_now(&mut self) -> bool {
        if self.owner.is_none() {
            warn!("Manual sync requested with nobody signed in");
            return false;
        }
        self.push().await
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Pushes the whole shop to the owner's document.
    async fn push(&mut self) -> bool {
        self.deadline = None;
        let Some(owner) = self.owner.clone() else {
            return false;
        };

        let (snapshot, at) = {
            let mut state = self.write_state();
            state.is_syncing = true;
            let at = next_stamp(state.last_sync);
            (RemoteSnapshot::capture(&state, at), at)
        };

        self.update_status(|s| {
            s.phase = SyncPhase::Syncing;
            s.push_pending = false;
        })
        .await;

        let result = self.remote.write(&owner, snapshot).await;

        let ok = {
            let mut state = self.write_state();
            state.is_syncing = false;
            match &result {
                Ok(()) => {
                    state.last_sync = Some(at);
                    true
                }
                Err(_) => false,
            }
        };

        match result {
            Ok(()) => {
                info!(uid = %owner.uid, last_sync = %at, "Pushed shop to owner document");
                self.persist().await;
                self.update_status(|s| {
                    s.phase = SyncPhase::Idle;
                    s.last_sync = Some(at);
                    s.last_error = None;
                    s.pushes += 1;
                })
                .await;
            }
            Err(e) => {
                error!(uid = %owner.uid, error = %e, retryable = e.is_retryable(), "Push failed");
                self.emitter.emit_error(&e.to_string(), e.is_retryable());
                self.update_status(|s| {
                    s.phase = SyncPhase::Idle;
                    s.last_error = Some(e.to_string());
                })
                .await;
            }
        }

        ok
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Writes the current state to the local record. Failures are logged;
    /// the in-memory state stays authoritative.
    async fn persist(&self) {
        let snapshot = self.read_state_clone();
        if let Err(e) = self.store.save(&snapshot).await {
            error!(error = %e, "Failed to save local record");
            self.emitter.emit_error(&e.to_string(), e.is_retryable());
        }
    }

    async fn update_status(&self, f: impl FnOnce(&mut SyncStatus)) {
        let mut status = self.status.write().await;
        f(&mut status);
        self.emitter.emit_status(&status);
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AppState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_state_clone(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn read_last_sync(&self) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_sync
    }
}

/// Next change on the subscription; never resolves without one.
async fn next_remote(
    subscription: &mut Option<watch::Receiver<Option<RemoteSnapshot>>>,
) -> Option<Option<RemoteSnapshot>> {
    match subscription {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

/// Push stamp: now, but always strictly after the previous stamp so our
/// own documents keep moving forward even if the wall clock steps back.
fn next_stamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev + chrono::Duration::milliseconds(1),
        _ => now,
    }
}

// =============================================================================
// Tests
// =============================================================================
