//! Background clipboard poller.
//!
//! Sampling runs on its own thread. Each new piece of text that looks like
//! a query is evaluated there and handed to the consumer over a channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use flume::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::calculator::{Calculator, ClipboardSource, Outcome, looks_like_query};

/// Something that can be sampled for its current text.
pub trait TextSource {
    fn read(&mut self) -> Result<Option<String>>;
}

impl TextSource for ClipboardSource {
    fn read(&mut self) -> Result<Option<String>> {
        self.read_text()
    }
}

/// A query seen on the source and what it evaluated to.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub query: String,
    pub outcome: Outcome,
    pub at: NaiveDateTime,
}

/// Debounces samples and evaluates the ones worth it.
#[derive(Debug)]
pub struct Watcher {
    calculator: Calculator,
    last: Option<String>,
}

impl Watcher {
    pub fn new(calculator: Calculator) -> Self {
        Self {
            calculator,
            last: None,
        }
    }

    /// Feed one sample. Unchanged text and text that does not look like a
    /// query yield nothing.
    pub fn observe(&mut self, sample: &str, now: NaiveDateTime) -> Option<Evaluation> {
        let text = sample.trim();
        if self.last.as_deref() == Some(text) {
            return None;
        }
        self.last = Some(text.to_string());
        debug!("Clipboard content: '{}'", text);

        if !looks_like_query(text) {
            return None;
        }
        info!("Potential query detected: '{}'", text);
        let outcome = self.calculator.evaluate(text, now)?;
        Some(Evaluation {
            query: text.to_string(),
            outcome,
            at: now,
        })
    }
}

/// Handle to a running poller thread. Dropping it stops the thread.
pub struct Monitor {
    receiver: Receiver<Evaluation>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Start polling. The source is opened on the poller thread; if that
    /// fails the channel is closed right away.
    pub fn spawn<S, F>(calculator: Calculator, interval: Duration, open: F) -> Self
    where
        S: TextSource,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let (tx, receiver) = flume::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::spawn(move || match open() {
            Ok(source) => poll(source, Watcher::new(calculator), interval, &flag, &tx),
            Err(e) => error!("Clipboard monitoring unavailable: {:#}", e),
        });

        Self {
            receiver,
            stop,
            handle: Some(handle),
        }
    }

    pub fn receiver(&self) -> &Receiver<Evaluation> {
        &self.receiver
    }

    /// Stop the poller and wait for its thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("Clipboard poller panicked");
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll<S: TextSource>(
    mut source: S,
    mut watcher: Watcher,
    interval: Duration,
    stop: &AtomicBool,
    tx: &Sender<Evaluation>,
) {
    info!("Clipboard monitoring started.");
    while !stop.load(Ordering::Acquire) {
        match source.read() {
            Ok(Some(text)) => {
                let now = Local::now().naive_local();
                if let Some(evaluation) = watcher.observe(&text, now)
                    && tx.send(evaluation).is_err()
                {
                    debug!("Consumer gone, stopping poller");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Clipboard read failed: {:#}", e),
        }
        thread::sleep(interval);
    }
    info!("Clipboard monitoring stopped.");
}
