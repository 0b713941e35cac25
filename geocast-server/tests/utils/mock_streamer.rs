use async_trait::async_trait;
use geocast_server::recording::{StreamEvent, Streamer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct StartRecord {
    pub locator: String,
    pub file_path: PathBuf,
    pub log_path: PathBuf,
}

/// Streamer double: records every start and hands the test direct control
/// over each fake process's exit/error events, keyed by locator.
#[derive(Default)]
pub struct MockStreamer {
    starts: Mutex<Vec<StartRecord>>,
    senders: Mutex<HashMap<String, mpsc::Sender<StreamEvent>>>,
    fail_next: AtomicBool,
    start_delay: Mutex<Option<Duration>>,
}

impl MockStreamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn last_start(&self) -> Option<StartRecord> {
        self.starts.lock().unwrap().last().cloned()
    }

    /// The next `start` call fails as if the binary could not be spawned.
    pub fn fail_next_start(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Makes every `start` take this long, to widen race windows.
    pub fn delay_starts(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = Some(delay);
    }

    pub async fn emit_exit(&self, locator: &str, code: Option<i32>) {
        let tx = self.sender_for(locator);
        tx.send(StreamEvent::Exited { code, signal: None })
            .await
            .expect("exit event not consumed");
    }

    pub async fn emit_error(&self, locator: &str, message: &str) {
        let tx = self.sender_for(locator);
        tx.send(StreamEvent::Error(message.to_string()))
            .await
            .expect("error event not consumed");
    }

    fn sender_for(&self, locator: &str) -> mpsc::Sender<StreamEvent> {
        self.senders
            .lock()
            .unwrap()
            .get(locator)
            .cloned()
            .unwrap_or_else(|| panic!("no streamer started for {locator}"))
    }
}

#[async_trait]
impl Streamer for MockStreamer {
    async fn start(
        &self,
        locator: &str,
        file_path: &Path,
        log_path: &Path,
    ) -> std::io::Result<mpsc::Receiver<StreamEvent>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(std::io::Error::other("spawn refused by test"));
        }
        let delay = *self.start_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.starts.lock().unwrap().push(StartRecord {
            locator: locator.to_string(),
            file_path: file_path.to_path_buf(),
            log_path: log_path.to_path_buf(),
        });

        let (tx, rx) = mpsc::channel(4);
        self.senders.lock().unwrap().insert(locator.to_string(), tx);
        Ok(rx)
    }
}
