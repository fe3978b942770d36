//! engine::progress
//!
//! Progress relay: turns raw transport output into `{status, percent}`
//! events for the front end.
//!
//! # Event Stream
//!
//! Every long-running request emits, in order:
//!
//! 1. a start event (`"Fetching origin..."`, percent 0)
//! 2. zero or more transport events
//! 3. either `"<Op> completed"` with percent 100, or `"<Op> failed: <error>"`
//!    with percent -1
//!
//! Percent never decreases within one request. The only exception is the
//! terminal -1 of a failure.
//!
//! # Parsing
//!
//! Sideband text is split on `\r` and `\n`. A segment's percent is the number
//! directly before its first `%` ("Counting objects:  50% (2/4)" gives 50).
//! Segments without one carry the last reported percent. Nothing else about
//! the phrasing is assumed.

use std::fmt::Display;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::git::TransportEvent;

/// Percent reported on failure.
pub const FAILED: i32 = -1;

/// One progress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub status: String,
    pub percent: i32,
}

impl Progress {
    pub fn new(status: impl Into<String>, percent: i32) -> Self {
        Self {
            status: status.into(),
            percent,
        }
    }

    /// Whether this is a terminal failure event.
    pub fn is_failure(&self) -> bool {
        self.percent == FAILED
    }
}

/// Receiver of progress events.
///
/// Sinks are called from the thread running the request, while the
/// repository lock is held. They must not block on the same repository.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn emit(&self, event: Progress) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: Progress) {}
}

/// Collects events in memory.
impl ProgressSink for Mutex<Vec<Progress>> {
    fn emit(&self, event: Progress) {
        self.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Forwards events over a channel; a closed receiver drops them.
impl ProgressSink for tokio::sync::mpsc::UnboundedSender<Progress> {
    fn emit(&self, event: Progress) {
        let _ = self.send(event);
    }
}

/// Percent written before the first `%` of `text`, if any.
pub fn parse_percent(text: &str) -> Option<i32> {
    let (before, _) = text.split_once('%')?;
    before.split_whitespace().last()?.parse().ok()
}

/// Per-request relay state.
pub struct Relay<'s> {
    sink: &'s dyn ProgressSink,
    last: i32,
    pending: String,
}

impl<'s> Relay<'s> {
    pub fn new(sink: &'s dyn ProgressSink) -> Self {
        Self {
            sink,
            last: 0,
            pending: String::new(),
        }
    }

    /// Emit `status` with `percent` raised to the last reported value and
    /// capped at 100.
    pub fn report(&mut self, status: impl Into<String>, percent: Option<i32>) {
        let percent = percent.map_or(self.last, |p| p.clamp(self.last, 100));
        self.last = percent;
        self.sink.emit(Progress::new(status, percent));
    }

    /// Feed one transport callback.
    pub fn observe(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Sideband(text) => {
                self.pending.push_str(&text);
                while let Some(end) = self.pending.find(['\r', '\n']) {
                    let line: String = self.pending.drain(..=end).collect();
                    self.sideband_line(&line);
                }
            }
            TransportEvent::Received {
                received, total, ..
            } => self.objects("Receiving objects", received, total),
            TransportEvent::Sent { current, total } => {
                self.objects("Writing objects", current, total)
            }
        }
    }

    fn sideband_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        self.report(line, parse_percent(line));
    }

    fn objects(&mut self, label: &str, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = i32::try_from(done.saturating_mul(100) / total).unwrap_or(100);
        // Transfer callbacks fire per object; only report changes.
        if percent <= self.last && done != total {
            return;
        }
        self.report(format!("{label}: {percent}% ({done}/{total})"), Some(percent));
    }

    /// Emit whatever partial sideband line is still buffered.
    fn flush(&mut self) {
        let rest = std::mem::take(&mut self.pending);
        self.sideband_line(&rest);
    }
}

/// Run `f` between a start event and a completion or failure event.
///
/// `op` names the request in the terminal status ("Fetch" gives
/// "Fetch completed" / "Fetch failed: ...").
pub fn tracked<T, E, F>(sink: &dyn ProgressSink, start: &str, op: &str, f: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce(&mut Relay<'_>) -> Result<T, E>,
{
    let mut relay = Relay::new(sink);
    relay.report(start, Some(0));

    let result = f(&mut relay);
    relay.flush();

    match &result {
        Ok(_) => relay.report(format!("{op} completed"), Some(100)),
        Err(e) => {
            tracing::debug!(op, error = %e, "request failed");
            sink.emit(Progress::new(format!("{op} failed: {e}"), FAILED));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(sink: &Mutex<Vec<Progress>>) -> Vec<Progress> {
        sink.lock().unwrap().clone()
    }

    mod parse_percent {
        use super::*;

        #[test]
        fn number_before_percent() {
            assert_eq!(parse_percent("Counting objects: 100% (5/5), done."), Some(100));
            assert_eq!(parse_percent("Compressing objects:  50% (2/4)"), Some(50));
        }

        #[test]
        fn absent() {
            assert_eq!(parse_percent("Enumerating objects: 5, done."), None);
            assert_eq!(parse_percent("% at start"), None);
            assert_eq!(parse_percent("abc% nonsense"), None);
        }
    }

    mod relay {
        use super::*;

        #[test]
        fn splits_carriage_returns_across_chunks() {
            let sink = Mutex::new(Vec::new());
            let mut relay = Relay::new(&sink);

            relay.observe(TransportEvent::Sideband("Counting objects:  25% (1/4)\rCoun".into()));
            relay.observe(TransportEvent::Sideband("ting objects:  75% (3/4)\r".into()));

            let got = events(&sink);
            assert_eq!(got.len(), 2);
            assert_eq!(got[0], Progress::new("Counting objects:  25% (1/4)", 25));
            assert_eq!(got[1], Progress::new("Counting objects:  75% (3/4)", 75));
        }

        #[test]
        fn percent_never_decreases() {
            let sink = Mutex::new(Vec::new());
            let mut relay = Relay::new(&sink);

            relay.observe(TransportEvent::Sideband("Counting objects: 100% (4/4), done.\n".into()));
            relay.observe(TransportEvent::Sideband("Compressing objects:  10% (1/10)\n".into()));
            relay.observe(TransportEvent::Sideband("Total 4 (delta 0)\n".into()));

            let percents: Vec<i32> = events(&sink).iter().map(|e| e.percent).collect();
            assert_eq!(percents, vec![100, 100, 100]);
        }

        #[test]
        fn object_counts_report_on_change() {
            let sink = Mutex::new(Vec::new());
            let mut relay = Relay::new(&sink);

            for received in 0..=200 {
                relay.observe(TransportEvent::Received {
                    received,
                    indexed: received,
                    total: 200,
                });
            }

            let got = events(&sink);
            assert_eq!(got.len(), 100);
            assert_eq!(got.last().unwrap().status, "Receiving objects: 100% (200/200)");
        }
    }

    mod tracked {
        use super::*;

        #[test]
        fn success_ends_at_100() {
            let sink = Mutex::new(Vec::new());
            let result: Result<u8, String> = tracked(&sink, "Fetching origin...", "Fetch", |relay| {
                relay.observe(TransportEvent::Sideband("Counting objects: 40% (2/5)".into()));
                Ok(7)
            });

            assert_eq!(result, Ok(7));
            assert_eq!(
                events(&sink),
                vec![
                    Progress::new("Fetching origin...", 0),
                    Progress::new("Counting objects: 40% (2/5)", 40),
                    Progress::new("Fetch completed", 100),
                ]
            );
        }

        #[test]
        fn failure_ends_at_minus_one() {
            let sink = Mutex::new(Vec::new());
            let result: Result<(), String> =
                tracked(&sink, "Pushing to origin...", "Push", |_| Err("SSH key not found".to_string()));

            assert!(result.is_err());
            let last = events(&sink).pop().unwrap();
            assert!(last.is_failure());
            assert_eq!(last.status, "Push failed: SSH key not found");
        }

        #[test]
        fn closures_are_sinks() {
            let seen = Mutex::new(0);
            let sink = |_: Progress| *seen.lock().unwrap() += 1;
            let _: Result<(), String> = tracked(&sink, "Committing changes...", "Commit", |_| Ok(()));
            assert_eq!(*seen.lock().unwrap(), 2);
        }
    }
}
