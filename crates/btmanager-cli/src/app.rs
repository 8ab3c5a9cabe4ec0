//! Composition root.
//!
//! Builds the store, backend client, radio and repository once per process
//! and hands commands a [`WorkerHandle`] onto the single repository worker.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use btmanager_core::{
    DeviceRepository, HttpDeviceClient, RadioAdapter, RepositoryWorker, Store, WorkerHandle,
};

use crate::config::Config;

/// A running repository worker and the handle used to reach it.
pub struct App {
    handle: WorkerHandle,
    task: JoinHandle<()>,
}

impl App {
    /// Wire every collaborator from `config` and start the worker.
    pub async fn start(config: &Config) -> Result<Self> {
        let store = Store::open(&config.storage.path).with_context(|| {
            format!(
                "Failed to open database at {}",
                config.storage.path.display()
            )
        })?;
        let remote =
            HttpDeviceClient::with_timeout(&config.remote.base_url, config.remote.timeout())
                .context("Failed to create backend client")?;
        let radio = open_radio().await;

        let repo = DeviceRepository::with_store(
            Arc::new(store),
            Arc::new(remote),
            radio,
            config.cache.to_cache_config(),
        );
        debug!(base_url = %config.remote.base_url, "Repository ready");

        let (handle, task) = RepositoryWorker::spawn(Arc::new(repo));
        Ok(Self { handle, task })
    }

    pub fn worker(&self) -> &WorkerHandle {
        &self.handle
    }

    /// Stop the worker, letting pending backend pushes finish.
    pub async fn shutdown(self) {
        if self.handle.shutdown().await.is_err() {
            debug!("Worker already stopped");
        }
        if let Err(e) = self.task.await {
            warn!("Worker task failed: {}", e);
        }
    }
}

#[cfg(feature = "ble")]
async fn open_radio() -> Arc<dyn RadioAdapter> {
    match btmanager_core::BleRadio::first_adapter().await {
        Ok(radio) => Arc::new(radio),
        Err(e) => {
            warn!("Bluetooth unavailable: {}", e);
            Arc::new(btmanager_core::UnavailableRadio::new(e.to_string()))
        }
    }
}

#[cfg(not(feature = "ble"))]
async fn open_radio() -> Arc<dyn RadioAdapter> {
    Arc::new(btmanager_core::UnavailableRadio::default())
}
