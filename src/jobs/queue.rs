use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::jobs::coordinator::JobCoordinator;
use crate::types::{AppError, Result};

/// The only thing that crosses from submission to the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchMessage {
    pub job_id: Uuid,
}

/// Sending half of the dispatch transport.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<DispatchMessage>,
}

/// Receiving half, shared by every worker.
#[derive(Debug, Clone)]
pub struct DispatchReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<DispatchMessage>>>,
}

impl DispatchQueue {
    pub fn channel() -> (Self, DispatchReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self { tx },
            DispatchReceiver {
                rx: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Non-blocking; fails only when no worker can ever receive the message.
    pub fn enqueue(&self, job_id: Uuid) -> Result<()> {
        self.tx
            .send(DispatchMessage { job_id })
            .map_err(|_| AppError::Internal("dispatch queue is closed".to_string()))
    }
}

impl DispatchReceiver {
    /// Next message for this worker, or `None` once every sender is gone.
    pub async fn next(&self) -> Option<DispatchMessage> {
        self.rx.lock().await.recv().await
    }
}

/// Worker tasks pulling job ids off the dispatch queue.
///
/// Workers hold only a weak reference to the coordinator, so dropping the
/// coordinator closes the queue and lets the workers exit.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        workers: usize,
        receiver: DispatchReceiver,
        coordinator: Weak<JobCoordinator>,
    ) -> Self {
        let handles = (0..workers.max(1))
            .map(|worker| {
                let receiver = receiver.clone();
                let coordinator = coordinator.clone();
                tokio::spawn(async move {
                    tracing::debug!(worker, "Worker started");
                    while let Some(message) = receiver.next().await {
                        let Some(coordinator) = coordinator.upgrade() else {
                            break;
                        };
                        tracing::debug!(worker, job_id = %message.job_id, "Worker picked up job");
                        if let Err(e) = coordinator.dispatch(message.job_id).await {
                            tracing::error!(
                                worker,
                                job_id = %message.job_id,
                                error = %e,
                                "Dispatch failed"
                            );
                        }
                    }
                    tracing::debug!(worker, "Worker stopped");
                })
            })
            .collect();

        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (queue, receiver) = DispatchQueue::channel();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        queue.enqueue(a).unwrap();
        queue.enqueue(b).unwrap();

        assert_eq!(receiver.next().await.unwrap().job_id, a);
        assert_eq!(receiver.next().await.unwrap().job_id, b);
    }

    #[tokio::test]
    async fn test_receiver_ends_when_senders_dropped() {
        let (queue, receiver) = DispatchQueue::channel();
        drop(queue);
        assert!(receiver.next().await.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_fails_without_receiver() {
        let (queue, receiver) = DispatchQueue::channel();
        drop(receiver);
        assert!(matches!(queue.enqueue(Uuid::new_v4()), Err(AppError::Internal(_))));
    }
}
