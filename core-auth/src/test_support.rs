//! In-memory bridge fakes shared by the unit tests.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::launcher::UrlLauncher;
use bridge_traits::storage::SecureStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, Notify};

#[derive(Default)]
pub struct MemorySecureStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
    gets: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    delete_gate: StdMutex<Option<Arc<Notify>>>,
    delete_entered: Notify,
}

impl MemorySecureStore {
    pub async fn insert(&self, key: &str, value: &[u8]) {
        self.data
            .lock()
            .await
            .insert(key.to_string(), value.to_vec());
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.data.lock().await.contains_key(key)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold the next delete until the returned handle is notified.
    pub fn hold_deletes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        if let Ok(mut slot) = self.delete_gate.lock() {
            *slot = Some(gate.clone());
        }
        gate
    }

    /// Wait until a delete has been requested.
    pub async fn delete_started(&self) {
        self.delete_entered.notified().await;
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("keychain locked".to_string()));
        }
        self.insert(key, value).await;
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("keychain locked".to_string()));
        }
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> Result<()> {
        self.delete_entered.notify_one();
        let gate = self.delete_gate.lock().ok().and_then(|mut slot| slot.take());
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.data.lock().await.remove(key);
        Ok(())
    }
}

/// Records every URL it is asked to open.
#[derive(Default)]
pub struct RecordingLauncher {
    opened: StdMutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        let launcher = Self::default();
        launcher.fail.store(true, Ordering::SeqCst);
        launcher
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UrlLauncher for RecordingLauncher {
    async fn open_url(&self, url: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("no browser".to_string()));
        }
        if let Ok(mut urls) = self.opened.lock() {
            urls.push(url.to_string());
        }
        Ok(())
    }
}
