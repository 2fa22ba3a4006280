//! Bounded queue used to hand rows between pipeline stages.
use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Timed out waiting for space in the row queue")]
    Timeout,
    #[error("Row queue already received its final row")]
    Finished,
    #[error("Another push is already waiting on the row queue")]
    PushExceeded,
    #[error("Row queue operation cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopStatus {
    /// The popped item was the final item of the stream.
    Complete,
    NotComplete,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    finished: bool,
    /// Set while a push is waiting for space.
    push_waiting: bool,
}

/// Fixed capacity queue with a single waiting producer.
#[derive(Debug)]
pub struct RowQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    not_full: Notify,
    not_empty: Notify,
}

/// Clears the waiting flag when a waiting push returns or is dropped.
struct WaitingPush<'a, T> {
    state: &'a Mutex<QueueState<T>>,
}

impl<T> Drop for WaitingPush<'_, T> {
    fn drop(&mut self) {
        self.state.lock().push_waiting = false;
    }
}

impl<T> RowQueue<T> {
    /// Create a queue. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        RowQueue {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                finished: false,
                push_waiting: false,
            }),
            not_full: Notify::new(),
            not_empty: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// If the final item has been pushed.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Push an item, waiting up to `timeout` for space.
    ///
    /// Only one push may wait at a time. Pushing with `is_final` completes
    /// the stream.
    pub async fn push(
        &self,
        item: T,
        is_final: bool,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        let deadline = Instant::now() + timeout;
        let mut waiting: Option<WaitingPush<T>> = None;

        loop {
            let notified = self.not_full.notified();
            {
                let mut state = self.state.lock();
                if state.finished {
                    return Err(QueueError::Finished);
                }

                if state.items.len() < self.capacity {
                    state.items.push_back(item);
                    if is_final {
                        state.finished = true;
                    }
                    drop(state);
                    drop(waiting);
                    self.not_empty.notify_one();
                    return Ok(());
                }

                if waiting.is_none() {
                    if state.push_waiting {
                        return Err(QueueError::PushExceeded);
                    }
                    state.push_waiting = true;
                    waiting = Some(WaitingPush { state: &self.state });
                }
            }

            trace!(capacity = self.capacity, "row queue full, waiting");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(QueueError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => return Err(QueueError::Timeout),
                _ = notified => (),
            }
        }
    }

    /// Pop the next item, waiting while the queue is empty.
    ///
    /// The status is `Complete` only for the final item of the stream.
    /// Popping after that errors with `Finished`.
    pub async fn pop(&self, cancel: &CancellationToken) -> Result<(T, PopStatus), QueueError> {
        loop {
            let notified = self.not_empty.notified();
            {
                let mut state = self.state.lock();
                if let Some(item) = state.items.pop_front() {
                    let status = if state.finished && state.items.is_empty() {
                        PopStatus::Complete
                    } else {
                        PopStatus::NotComplete
                    };
                    drop(state);
                    self.not_full.notify_one();
                    return Ok((item, status));
                }

                if state.finished {
                    return Err(QueueError::Finished);
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(QueueError::Cancelled),
                _ = notified => (),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn push_pop_contract() {
        let queue = RowQueue::new(2);
        let cancel = CancellationToken::new();

        queue.push(1, false, &cancel, TIMEOUT).await.unwrap();
        queue.push(2, false, &cancel, TIMEOUT).await.unwrap();
        assert_eq!((1, PopStatus::NotComplete), queue.pop(&cancel).await.unwrap());

        queue.push(3, true, &cancel, TIMEOUT).await.unwrap();
        assert_eq!((2, PopStatus::NotComplete), queue.pop(&cancel).await.unwrap());
        assert_eq!((3, PopStatus::Complete), queue.pop(&cancel).await.unwrap());

        assert_eq!(
            QueueError::Finished,
            queue.push(4, false, &cancel, TIMEOUT).await.unwrap_err()
        );
        assert_eq!(QueueError::Finished, queue.pop(&cancel).await.unwrap_err());
    }

    #[tokio::test(start_paused = true)]
    async fn push_times_out_when_full() {
        let queue = RowQueue::new(1);
        let cancel = CancellationToken::new();

        queue.push(1, false, &cancel, TIMEOUT).await.unwrap();
        let err = queue
            .push(2, false, &cancel, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(QueueError::Timeout, err);

        // Waiting flag cleared, so the next push can wait again.
        assert_eq!((1, PopStatus::NotComplete), queue.pop(&cancel).await.unwrap());
        queue.push(2, false, &cancel, TIMEOUT).await.unwrap();
    }

    #[tokio::test]
    async fn second_waiting_push_exceeded() {
        let queue = Arc::new(RowQueue::new(1));
        let cancel = CancellationToken::new();

        queue.push(1, false, &cancel, TIMEOUT).await.unwrap();

        let handle = tokio::spawn({
            let queue = queue.clone();
            let cancel = cancel.clone();
            async move { queue.push(2, false, &cancel, TIMEOUT).await }
        });

        while !queue.state.lock().push_waiting {
            tokio::task::yield_now().await;
        }

        let err = queue.push(3, false, &cancel, TIMEOUT).await.unwrap_err();
        assert_eq!(QueueError::PushExceeded, err);

        assert_eq!((1, PopStatus::NotComplete), queue.pop(&cancel).await.unwrap());
        handle.await.unwrap().unwrap();
        assert_eq!((2, PopStatus::NotComplete), queue.pop(&cancel).await.unwrap());
    }

    #[tokio::test]
    async fn pop_waits_for_push() {
        let queue = Arc::new(RowQueue::new(2));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let queue = queue.clone();
            let cancel = cancel.clone();
            async move { queue.pop(&cancel).await }
        });
        tokio::task::yield_now().await;

        queue.push("a", true, &cancel, TIMEOUT).await.unwrap();
        assert_eq!(("a", PopStatus::Complete), handle.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn cancelled_operations() {
        let queue = RowQueue::new(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(QueueError::Cancelled, queue.pop(&cancel).await.unwrap_err());

        let ok = CancellationToken::new();
        queue.push(1, false, &ok, TIMEOUT).await.unwrap();
        let err = queue.push(2, false, &cancel, TIMEOUT).await.unwrap_err();
        assert_eq!(QueueError::Cancelled, err);
        assert!(!queue.state.lock().push_waiting);
    }
}
