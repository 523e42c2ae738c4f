//! Per-session desks, keyed by a random id kept in the session cookie.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use rand::RngCore;

use super::desk::{DeskHandle, spawn_desk};
use crate::store::OrderStore;

struct DeskEntry {
    handle: DeskHandle,
    last_seen: Instant,
    /// Open sockets streaming this desk. A watched desk is never idle.
    watchers: usize,
}

type DeskMap = Arc<RwLock<HashMap<String, DeskEntry>>>;

/// Keeps a desk out of the idle sweep while held. Taken by a live socket
/// for as long as it streams; dropping it counts as a use of the desk.
pub struct DeskLease {
    desks: DeskMap,
    id: String,
}

impl Drop for DeskLease {
    fn drop(&mut self) {
        let mut desks = self.desks.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = desks.get_mut(&self.id) {
            entry.watchers = entry.watchers.saturating_sub(1);
            entry.last_seen = Instant::now();
        }
    }
}

#[derive(Clone)]
pub struct DeskRegistry {
    store: Arc<dyn OrderStore>,
    desks: DeskMap,
    idle_timeout: Duration,
}

pub fn new_desk_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl DeskRegistry {
    pub fn new(store: Arc<dyn OrderStore>, idle_timeout: Duration) -> Self {
        Self {
            store,
            desks: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Start a desk under a fresh id.
    pub fn open(&self) -> (String, DeskHandle) {
        let id = new_desk_id();
        let handle = spawn_desk(Arc::clone(&self.store));
        let mut desks = self.desks.write().unwrap_or_else(|e| e.into_inner());
        desks.insert(
            id.clone(),
            DeskEntry {
                handle: handle.clone(),
                last_seen: Instant::now(),
                watchers: 0,
            },
        );
        log::info!("Desk {id} opened ({} active)", desks.len());
        (id, handle)
    }

    /// Look up a live desk and mark it as used.
    pub fn get(&self, id: &str) -> Option<DeskHandle> {
        let mut desks = self.desks.write().unwrap_or_else(|e| e.into_inner());
        match desks.get_mut(id) {
            Some(entry) if !entry.handle.is_closed() => {
                entry.last_seen = Instant::now();
                Some(entry.handle.clone())
            }
            Some(_) => {
                desks.remove(id);
                None
            }
            None => None,
        }
    }

    /// Hold a live desk open until the lease is dropped.
    pub fn lease(&self, id: &str) -> Option<DeskLease> {
        let mut desks = self.desks.write().unwrap_or_else(|e| e.into_inner());
        let entry = desks.get_mut(id).filter(|entry| !entry.handle.is_closed())?;
        entry.watchers += 1;
        entry.last_seen = Instant::now();
        Some(DeskLease { desks: Arc::clone(&self.desks), id: id.to_string() })
    }

    /// The session's desk, or a new one if it was swept or never opened.
    /// Returns the id actually in use.
    pub fn get_or_open(&self, id: Option<&str>) -> (String, DeskHandle) {
        if let Some(id) = id
            && let Some(handle) = self.get(id)
        {
            return (id.to_string(), handle);
        }
        self.open()
    }

    pub async fn close(&self, id: &str) {
        let entry = {
            let mut desks = self.desks.write().unwrap_or_else(|e| e.into_inner());
            desks.remove(id)
        };
        if let Some(entry) = entry {
            entry.handle.stop().await;
            log::info!("Desk {id} closed");
        }
    }

    /// Stop every unwatched desk unused for longer than the idle timeout.
    pub async fn sweep_idle(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(String, DeskHandle)> = {
            let mut desks = self.desks.write().unwrap_or_else(|e| e.into_inner());
            let ids: Vec<String> = desks
                .iter()
                .filter(|(_, entry)| {
                    entry.watchers == 0 && now.duration_since(entry.last_seen) >= self.idle_timeout
                })
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| desks.remove(&id).map(|entry| (id, entry.handle)))
                .collect()
        };
        for (id, handle) in &expired {
            handle.stop().await;
            log::info!("Desk {id} stopped after being idle");
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.desks.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodically stop idle desks.
    pub fn spawn_sweeper(&self, every: Duration) {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let swept = registry.sweep_idle().await;
                if swept > 0 {
                    log::debug!("Desk sweeper stopped {swept} idle desks");
                }
            }
        });
    }
}
