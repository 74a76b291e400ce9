// src/report/batch.rs
//! Quiescence-delayed batch reporting
//!
//! An optional sink decorator that aggregates notifications per member and
//! flushes one summary per member once the configured quiescence window
//! passes with no new notifications. This is the crate's only timer-based
//! deferral and carries no ordering guarantee relative to other timers.

use crate::report::session::{Notification, Sink};
use chrono::Utc;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

enum BatchMessage {
    Observe(Notification),
    Flush(Sender<()>),
    Shutdown,
}

/// Wraps an inner sink with per-member aggregation.
///
/// `sink()` hands out the sink to install in the session; notifications
/// are forwarded to a worker thread and delivered to the inner sink in
/// aggregated form. Dropping the `BatchSink` flushes and joins the worker.
pub struct BatchSink {
    tx: Sender<BatchMessage>,
    worker: Option<JoinHandle<()>>,
}

impl BatchSink {
    pub fn new(inner: Sink, quiescence: Duration) -> Self {
        let (tx, rx) = unbounded::<BatchMessage>();
        let worker = thread::spawn(move || {
            let mut pending: BTreeMap<String, (usize, Notification)> = BTreeMap::new();
            loop {
                match rx.recv_timeout(quiescence) {
                    Ok(BatchMessage::Observe(notification)) => {
                        pending
                            .entry(notification.member_name.clone())
                            .and_modify(|(count, last)| {
                                *count += 1;
                                *last = notification.clone();
                            })
                            .or_insert((1, notification));
                    }
                    Ok(BatchMessage::Flush(ack)) => {
                        deliver(&inner, &mut pending);
                        let _ = ack.send(());
                    }
                    Ok(BatchMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                        deliver(&inner, &mut pending);
                        break;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        // quiescence window passed with no new notifications
                        deliver(&inner, &mut pending);
                    }
                }
            }
        });
        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// The sink to install in a `ListenerSession`.
    pub fn sink(&self) -> Sink {
        let tx = self.tx.clone();
        Arc::new(move |notification: &Notification| {
            let _ = tx.send(BatchMessage::Observe(notification.clone()));
        })
    }

    /// Force delivery of everything aggregated so far. Blocks until the
    /// worker has flushed.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = unbounded();
        if self.tx.send(BatchMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for BatchSink {
    fn drop(&mut self) {
        let _ = self.tx.send(BatchMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn deliver(inner: &Sink, pending: &mut BTreeMap<String, (usize, Notification)>) {
    if pending.is_empty() {
        return;
    }
    debug!(members = pending.len(), "flushing aggregated notifications");
    for (_, (count, last)) in std::mem::take(pending) {
        if count == 1 {
            inner(&last);
        } else {
            inner(&Notification {
                description: format!("{} [x{}]", last.description, count),
                member_name: last.member_name,
                location: last.location,
                observed_at: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn observed(member: &str) -> Notification {
        Notification {
            description: format!("touched {}", member),
            member_name: member.to_string(),
            location: None,
            observed_at: Utc::now(),
        }
    }

    fn counting_sink() -> (Sink, Arc<Mutex<Vec<Notification>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = seen.clone();
        let sink: Sink = Arc::new(move |n: &Notification| inner.lock().push(n.clone()));
        (sink, seen)
    }

    #[test]
    fn test_repeated_touches_aggregate_to_one_summary() {
        let (inner, seen) = counting_sink();
        let batch = BatchSink::new(inner, Duration::from_secs(60));
        let sink = batch.sink();

        for _ in 0..3 {
            sink(&observed("innerHTML"));
        }
        batch.flush();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].member_name, "innerHTML");
        assert!(seen[0].description.ends_with("[x3]"));
    }

    #[test]
    fn test_single_touch_passes_through_unchanged() {
        let (inner, seen) = counting_sink();
        let batch = BatchSink::new(inner, Duration::from_secs(60));
        batch.sink()(&observed("m"));
        batch.flush();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].description, "touched m");
    }

    #[test]
    fn test_drop_flushes_pending() {
        let (inner, seen) = counting_sink();
        {
            let batch = BatchSink::new(inner, Duration::from_secs(60));
            batch.sink()(&observed("m"));
        }
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_quiescence_timeout_flushes() {
        let (inner, seen) = counting_sink();
        let batch = BatchSink::new(inner, Duration::from_millis(20));
        batch.sink()(&observed("m"));

        thread::sleep(Duration::from_millis(200));
        assert_eq!(seen.lock().len(), 1);
        drop(batch);
    }
}
