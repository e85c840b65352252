//! Update dispatcher - Routes each update as its own task

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::router::Router;
use crate::domain::entities::Update;

/// Drains a bounded update queue and routes every update concurrently.
///
/// At most `max_concurrent` updates are in flight; once they are, intake
/// stops and the queue fills, which in turn makes the transport wait.
pub struct Dispatcher {
    router: Router,
    limiter: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(router: Router, max_concurrent: usize) -> Self {
        Self {
            router,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Bounded queue for a transport to feed this dispatcher
    pub fn channel(capacity: usize) -> (mpsc::Sender<Update>, mpsc::Receiver<Update>) {
        mpsc::channel(capacity.max(1))
    }

    /// Run until every sender is dropped, then wait for in-flight updates.
    pub async fn run(self, mut updates: mpsc::Receiver<Update>) {
        let mut tasks = JoinSet::new();
        tracing::info!("Dispatcher started");

        loop {
            tokio::select! {
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join(joined);
                }
                received = updates.recv() => {
                    let Some(update) = received else {
                        break;
                    };

                    let permit = match self.limiter.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            tracing::error!("Dispatch limiter closed, stopping");
                            break;
                        }
                    };

                    let router = self.router.clone();
                    tasks.spawn(async move {
                        let report = router.route(&update).await;
                        if !report.is_empty() {
                            tracing::debug!(
                                update_id = update.id,
                                invoked = report.invoked.len(),
                                failed = report.failed.len(),
                                "Update handled"
                            );
                        }
                        drop(permit);
                    });
                }
            }
        }

        tracing::info!(in_flight = tasks.len(), "Update stream closed, draining");
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        tracing::info!("Dispatcher stopped");
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!("Update task panicked: {}", e);
        } else {
            tracing::warn!("Update task cancelled: {}", e);
        }
    }
}
