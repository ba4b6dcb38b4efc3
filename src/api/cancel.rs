use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Handle for one in-flight request. Dropping it releases the client's slot
/// if no newer request has taken it.
#[derive(Debug)]
pub struct Ticket {
    id: u64,
    client: String,
    token: CancelToken,
    registry: Supersession,
}

impl Ticket {
    pub fn is_superseded(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.registry.release(&self.client, self.id);
    }
}

#[derive(Debug, Default)]
struct Inflight {
    next_id: AtomicU64,
    by_client: Mutex<HashMap<String, (u64, CancelToken)>>,
}

/// Tracks the latest request per client. Starting a request cancels the
/// client's previous one, so its stale result is never delivered.
#[derive(Debug, Clone, Default)]
pub struct Supersession {
    inner: Arc<Inflight>,
}

impl Supersession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, client: &str) -> Ticket {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancelToken::new();
        let mut by_client = self.inner.by_client.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, previous)) = by_client.insert(client.to_string(), (id, token.clone())) {
            previous.cancel();
        }
        Ticket {
            id,
            client: client.to_string(),
            token,
            registry: self.clone(),
        }
    }

    pub fn inflight_count(&self) -> usize {
        self.inner
            .by_client
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn release(&self, client: &str, id: u64) {
        let mut by_client = self.inner.by_client.lock().unwrap_or_else(|e| e.into_inner());
        if by_client.get(client).is_some_and(|(current, _)| *current == id) {
            by_client.remove(client);
        }
    }
}
