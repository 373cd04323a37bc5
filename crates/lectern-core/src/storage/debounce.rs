//! Debounced write scheduling
//!
//! [`DebouncedWriter`] coalesces bursts of state changes into a single
//! durable write: each scheduled state replaces the pending one and restarts
//! the quiet period, so the write that eventually fires always carries the
//! latest state. The writer callback runs on a dedicated worker thread; the
//! store itself stays single-threaded.
//!
//! There is nothing to cancel mid-write - the underlying write is one
//! synchronous call once triggered. Cancellation only means dropping a
//! pending, not-yet-fired write.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::state::DatabaseState;

enum Msg {
    /// Replace the pending state and restart the quiet period
    Write(Box<DatabaseState>),
    /// Write any pending state now, then acknowledge
    Flush(mpsc::Sender<()>),
    /// Drop any pending state without writing, then acknowledge
    Cancel(mpsc::Sender<()>),
}

/// Pending-write scheduler with a quiet-period debounce
pub struct DebouncedWriter {
    tx: Option<mpsc::Sender<Msg>>,
    handle: Option<JoinHandle<()>>,
}

impl DebouncedWriter {
    /// Start a writer that calls `write` after `delay` of scheduling quiet
    pub fn new<F>(delay: Duration, mut write: F) -> Self
    where
        F: FnMut(&DatabaseState) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Msg>();

        let handle = thread::spawn(move || {
            let mut pending: Option<Box<DatabaseState>> = None;

            loop {
                let msg = if pending.is_some() {
                    match rx.recv_timeout(delay) {
                        Ok(msg) => msg,
                        Err(RecvTimeoutError::Timeout) => {
                            if let Some(state) = pending.take() {
                                write(&state);
                            }
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match rx.recv() {
                        Ok(msg) => msg,
                        Err(_) => break,
                    }
                };

                match msg {
                    Msg::Write(state) => pending = Some(state),
                    Msg::Flush(ack) => {
                        if let Some(state) = pending.take() {
                            write(&state);
                        }
                        let _ = ack.send(());
                    }
                    Msg::Cancel(ack) => {
                        pending = None;
                        let _ = ack.send(());
                    }
                }
            }

            // Channel closed: write whatever is still pending before exit
            if let Some(state) = pending.take() {
                write(&state);
            }
            debug!("debounced writer stopped");
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Schedule a state for writing, restarting the quiet period
    pub fn schedule(&self, state: DatabaseState) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Msg::Write(Box::new(state)));
        }
    }

    /// Write any pending state immediately, blocking until done
    pub fn flush(&self) {
        self.ack_round_trip(Msg::Flush);
    }

    /// Drop any pending state without writing it
    pub fn cancel(&self) {
        self.ack_round_trip(Msg::Cancel);
    }

    fn ack_round_trip(&self, make: impl FnOnce(mpsc::Sender<()>) -> Msg) {
        let Some(tx) = &self.tx else { return };
        let (ack_tx, ack_rx) = mpsc::channel();
        if tx.send(make(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        // Closing the channel makes the worker write any pending state
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    fn state_with_user(id: &str) -> DatabaseState {
        let mut state = DatabaseState::initial();
        state.users.insert(id.to_string(), User::new(id));
        state
    }

    fn collecting_writer(delay: Duration) -> (DebouncedWriter, Arc<Mutex<Vec<DatabaseState>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = written.clone();
        let writer = DebouncedWriter::new(delay, move |state| {
            sink.lock().unwrap().push(state.clone());
        });
        (writer, written)
    }

    #[test]
    fn test_burst_produces_exactly_one_write_with_final_state() {
        let (writer, written) = collecting_writer(Duration::from_millis(40));

        writer.schedule(state_with_user("u1"));
        writer.schedule(state_with_user("u2"));
        writer.schedule(state_with_user("u3"));

        thread::sleep(Duration::from_millis(120));

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].users.contains_key("u3"));
    }

    #[test]
    fn test_each_schedule_restarts_the_quiet_period() {
        let (writer, written) = collecting_writer(Duration::from_millis(60));

        let start = Instant::now();
        writer.schedule(state_with_user("u1"));
        thread::sleep(Duration::from_millis(30));
        // Still inside the quiet period: nothing written yet
        assert!(written.lock().unwrap().is_empty());

        writer.schedule(state_with_user("u2"));
        thread::sleep(Duration::from_millis(100));

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].users.contains_key("u2"));
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_separate_quiet_periods_produce_separate_writes() {
        let (writer, written) = collecting_writer(Duration::from_millis(30));

        writer.schedule(state_with_user("u1"));
        thread::sleep(Duration::from_millis(80));
        writer.schedule(state_with_user("u2"));
        thread::sleep(Duration::from_millis(80));

        assert_eq!(written.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_flush_writes_pending_immediately() {
        let (writer, written) = collecting_writer(Duration::from_secs(60));

        writer.schedule(state_with_user("u1"));
        writer.flush();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].users.contains_key("u1"));
    }

    #[test]
    fn test_flush_with_nothing_pending_is_a_noop() {
        let (writer, written) = collecting_writer(Duration::from_millis(30));
        writer.flush();
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_drops_pending_write() {
        let (writer, written) = collecting_writer(Duration::from_millis(30));

        writer.schedule(state_with_user("u1"));
        writer.cancel();
        thread::sleep(Duration::from_millis(80));

        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drop_writes_pending_state() {
        let (writer, written) = collecting_writer(Duration::from_secs(60));

        writer.schedule(state_with_user("u1"));
        drop(writer);

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].users.contains_key("u1"));
    }
}
