//! # Background Cart Store
//!
//! Wraps a blocking [`CartStore`] so request handlers never wait on disk.
//! Saves are queued to a single writer task and applied in the order they
//! were issued; failures are logged there and never reach the handler.
//! Loads go through the same queue, so they observe every earlier save.

use cart_core::{CartError, CartLine, CartResult, CartStore};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

/// Thread-safe store handle
pub type SharedCartStore = Arc<dyn CartStore + Send + Sync>;

type Loaded = CartResult<Option<Vec<CartLine>>>;

enum Job {
    Load {
        session_id: String,
        reply: oneshot::Sender<Loaded>,
    },
    Save {
        session_id: String,
        lines: Vec<CartLine>,
    },
    Discard {
        session_id: String,
    },
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget store in front of a blocking one
#[derive(Clone)]
pub struct BackgroundStore {
    inner: SharedCartStore,
    tx: mpsc::UnboundedSender<Job>,
}

impl BackgroundStore {
    /// Start the writer task. Must be called inside a Tokio runtime.
    pub fn spawn(inner: SharedCartStore) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let writer = inner.clone();

        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let (session_id, result) = match job {
                    Job::Flush(done) => {
                        let _ = done.send(());
                        continue;
                    }
                    Job::Load { session_id, reply } => {
                        let store = writer.clone();
                        let loaded = tokio::task::spawn_blocking(move || store.load(&session_id))
                            .await
                            .unwrap_or_else(|e| {
                                Err(CartError::Persistence(format!("cart load task failed: {}", e)))
                            });
                        let _ = reply.send(loaded);
                        continue;
                    }
                    Job::Save { session_id, lines } => {
                        let store = writer.clone();
                        let id = session_id.clone();
                        let result =
                            tokio::task::spawn_blocking(move || store.save(&id, &lines)).await;
                        (session_id, result)
                    }
                    Job::Discard { session_id } => {
                        let store = writer.clone();
                        let id = session_id.clone();
                        let result = tokio::task::spawn_blocking(move || store.discard(&id)).await;
                        (session_id, result)
                    }
                };

                match result {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("Failed to persist cart for session {}: {}", session_id, e),
                    Err(e) => error!("Cart writer task panicked for session {}: {}", session_id, e),
                }
            }
        });

        Self { inner, tx }
    }

    /// Wait until every save queued so far has been applied
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Load a session's saved lines without blocking the runtime
    pub async fn fetch(&self, session_id: &str) -> CartResult<Option<Vec<CartLine>>> {
        let (reply, wait) = oneshot::channel();
        self.tx
            .send(Job::Load {
                session_id: session_id.to_string(),
                reply,
            })
            .map_err(|_| CartError::Persistence("cart writer has stopped".to_string()))?;
        wait.await
            .map_err(|_| CartError::Persistence("cart writer dropped the load".to_string()))?
    }

    fn enqueue(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!("Cart writer has stopped; dropping save");
        }
    }
}

impl CartStore for BackgroundStore {
    fn load(&self, session_id: &str) -> CartResult<Option<Vec<CartLine>>> {
        self.inner.load(session_id)
    }

    fn save(&self, session_id: &str, lines: &[CartLine]) -> CartResult<()> {
        self.enqueue(Job::Save {
            session_id: session_id.to_string(),
            lines: lines.to_vec(),
        });
        Ok(())
    }

    fn discard(&self, session_id: &str) -> CartResult<()> {
        self.enqueue(Job::Discard {
            session_id: session_id.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::{Currency, MemoryCartStore, Price};

    fn line(quantity: u32) -> CartLine {
        CartLine::new("sofa-1", "Sofa", Price::new(45999.0, Currency::INR), "")
            .with_quantity(quantity)
    }

    #[tokio::test]
    async fn test_saves_apply_in_order() {
        let memory = Arc::new(MemoryCartStore::new());
        let store = BackgroundStore::spawn(memory.clone());

        for quantity in 1..=20 {
            store.save("s1", &[line(quantity)]).unwrap();
        }
        store.flush().await;

        assert_eq!(memory.load("s1").unwrap(), Some(vec![line(20)]));
    }

    #[tokio::test]
    async fn test_fetch_sees_queued_saves() {
        let memory = Arc::new(MemoryCartStore::new());
        let store = BackgroundStore::spawn(memory.clone());

        assert_eq!(store.fetch("s1").await.unwrap(), None);
        store.save("s1", &[line(3)]).unwrap();
        store.save("s1", &[]).unwrap();
        assert_eq!(store.fetch("s1").await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_discard() {
        let memory = Arc::new(MemoryCartStore::new());
        let store = BackgroundStore::spawn(memory.clone());

        store.save("s1", &[line(1)]).unwrap();
        store.discard("s1").unwrap();
        store.flush().await;

        assert!(memory.is_empty());
    }
}
