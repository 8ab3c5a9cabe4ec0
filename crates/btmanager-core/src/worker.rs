//! Background queue for repository operations.
//!
//! The [`RepositoryWorker`] owns the only path into a shared
//! [`DeviceRepository`] from the presentation layer. It runs on one Tokio
//! task and handles [`Command`]s one at a time, so repository operations
//! are serialized relative to each other while callers never block.
//!
//! # Architecture
//!
//! - Callers hold a cloneable [`WorkerHandle`] and await a `oneshot` reply
//! - `store_device` performs the local upsert on the queue, then hands the
//!   remote submission to a tracked task so a slow backend does not hold
//!   up the queue
//! - The loop ends on [`Command::Shutdown`], when every handle is dropped,
//!   or when the [`CancellationToken`] fires; in-flight remote
//!   continuations are awaited before the worker returns

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use btmanager_store::DeviceFeed;
use btmanager_types::Device;

use crate::error::{Error, Result};
use crate::repository::{DeviceRepository, StoreOutcome, SyncReport};

/// Queue depth before callers wait for space.
const COMMAND_CAPACITY: usize = 32;

/// Requests handled by the worker.
#[derive(Debug)]
pub enum Command {
    StoreDevice {
        device: Device,
        reply: oneshot::Sender<Result<StoreOutcome>>,
    },
    FetchDevices {
        reply: oneshot::Sender<Result<DeviceFeed>>,
    },
    RefreshCache {
        reply: oneshot::Sender<Result<DeviceFeed>>,
    },
    FindBondedDevices {
        reply: oneshot::Sender<Result<Vec<Device>>>,
    },
    SynchronizeDevices {
        reply: oneshot::Sender<Result<SyncReport>>,
    },
    DiscoverDevices {
        duration: Duration,
        reply: oneshot::Sender<Result<Vec<Device>>>,
    },
    /// Stop after in-flight work completes.
    Shutdown,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::StoreDevice { .. } => "store_device",
            Self::FetchDevices { .. } => "fetch_devices",
            Self::RefreshCache { .. } => "refresh_cache",
            Self::FindBondedDevices { .. } => "find_bonded_devices",
            Self::SynchronizeDevices { .. } => "synchronize_devices",
            Self::DiscoverDevices { .. } => "discover_devices",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Single-task executor for repository commands.
pub struct RepositoryWorker {
    repo: Arc<DeviceRepository>,
    command_rx: mpsc::Receiver<Command>,
    /// Remote continuations of `store_device`.
    pending: JoinSet<()>,
    cancel_token: CancellationToken,
}

impl RepositoryWorker {
    pub fn new(
        repo: Arc<DeviceRepository>,
        command_rx: mpsc::Receiver<Command>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            repo,
            command_rx,
            pending: JoinSet::new(),
            cancel_token,
        }
    }

    /// Start a worker on the current runtime.
    pub fn spawn(repo: Arc<DeviceRepository>) -> (WorkerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let cancel_token = CancellationToken::new();
        let worker = Self::new(repo, rx, cancel_token.clone());
        let task = tokio::spawn(worker.run());
        (
            WorkerHandle {
                tx,
                cancel_token,
            },
            task,
        )
    }

    /// Run the main loop until shutdown.
    pub async fn run(mut self) {
        info!("RepositoryWorker started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("RepositoryWorker cancelled");
                    break;
                }
                Some(joined) = self.pending.join_next(), if !self.pending.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Remote continuation failed: {}", e);
                    }
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown) => {
                            info!("RepositoryWorker received shutdown command");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            info!("Command channel closed, shutting down worker");
                            break;
                        }
                    }
                }
            }
        }

        if !self.pending.is_empty() {
            debug!("Waiting for {} remote continuation(s)", self.pending.len());
        }
        while self.pending.join_next().await.is_some() {}

        info!("RepositoryWorker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        debug!(command = cmd.name(), "Handling command");

        match cmd {
            Command::StoreDevice { device, reply } => {
                if let Err(e) = self.repo.store_locally(&device) {
                    let _ = reply.send(Err(e));
                    return;
                }
                let repo = Arc::clone(&self.repo);
                self.pending.spawn(async move {
                    let outcome = repo.push_remote(device).await;
                    // The caller may have gone away; the outcome is already persisted.
                    let _ = reply.send(outcome);
                });
            }
            Command::FetchDevices { reply } => {
                let _ = reply.send(self.repo.fetch_devices().await);
            }
            Command::RefreshCache { reply } => {
                let _ = reply.send(self.repo.refresh_cache().await);
            }
            Command::FindBondedDevices { reply } => {
                let _ = reply.send(self.repo.find_bonded_devices().await);
            }
            Command::SynchronizeDevices { reply } => {
                let _ = reply.send(self.repo.synchronize_devices().await);
            }
            Command::DiscoverDevices { duration, reply } => {
                let _ = reply.send(self.repo.discover_devices(duration).await);
            }
            Command::Shutdown => {}
        }
    }
}

/// Cloneable front door to a [`RepositoryWorker`].
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Command>,
    cancel_token: CancellationToken,
}

impl WorkerHandle {
    /// Wrap an existing command channel.
    pub fn new(tx: mpsc::Sender<Command>, cancel_token: CancellationToken) -> Self {
        Self { tx, cancel_token }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| Error::WorkerStopped)?;
        rx.await.map_err(|_| Error::WorkerStopped)?
    }

    pub async fn store_device(&self, device: Device) -> Result<StoreOutcome> {
        self.request(|reply| Command::StoreDevice { device, reply })
            .await
    }

    pub async fn fetch_devices(&self) -> Result<DeviceFeed> {
        self.request(|reply| Command::FetchDevices { reply }).await
    }

    pub async fn refresh_cache(&self) -> Result<DeviceFeed> {
        self.request(|reply| Command::RefreshCache { reply }).await
    }

    pub async fn find_bonded_devices(&self) -> Result<Vec<Device>> {
        self.request(|reply| Command::FindBondedDevices { reply })
            .await
    }

    pub async fn synchronize_devices(&self) -> Result<SyncReport> {
        self.request(|reply| Command::SynchronizeDevices { reply })
            .await
    }

    pub async fn discover_devices(&self, duration: Duration) -> Result<Vec<Device>> {
        self.request(|reply| Command::DiscoverDevices { duration, reply })
            .await
    }

    /// Now, in the record timestamp format. Does not go through the queue.
    pub fn current_timestamp(&self) -> String {
        btmanager_types::current_timestamp()
    }

    /// Ask the worker to stop once queued commands ahead of this one ran.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| Error::WorkerStopped)
    }

    /// Stop the worker immediately; queued commands are dropped.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}
