use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::error;

/// Lifecycle notifications of one streaming process. `Exited` is the sole
/// success signal; an `Error` leaves the owning session not-ready.
#[derive(Debug)]
pub enum StreamEvent {
    Error(String),
    Exited {
        code: Option<i32>,
        signal: Option<i32>,
    },
}

/// Boundary to the external RTSP-to-file transcoding process.
///
/// `start` spawns the process synchronously and fails fast when it cannot
/// be spawned; the returned channel carries its exit/error events.
#[async_trait]
pub trait Streamer: Send + Sync {
    async fn start(
        &self,
        locator: &str,
        file_path: &Path,
        log_path: &Path,
    ) -> std::io::Result<mpsc::Receiver<StreamEvent>>;
}

/// Streams an RTSP source into an mp4 file with ffmpeg, mirroring the
/// process's stderr into the per-recording log file.
pub struct FfmpegStreamer {
    binary: String,
}

impl FfmpegStreamer {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl Default for FfmpegStreamer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Streamer for FfmpegStreamer {
    async fn start(
        &self,
        locator: &str,
        file_path: &Path,
        log_path: &Path,
    ) -> std::io::Result<mpsc::Receiver<StreamEvent>> {
        let log_file = std::fs::File::create(log_path)?;

        let mut child = Command::new(&self.binary)
            .arg("-y")
            .arg("-rtsp_transport")
            .arg("tcp")
            .arg("-i")
            .arg(locator)
            .arg("-c")
            .arg("copy")
            .arg(file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log_file))
            .spawn()?;

        let (tx, rx) = mpsc::channel(2);
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    let _ = tx
                        .send(StreamEvent::Exited {
                            code: status.code(),
                            signal: exit_signal(&status),
                        })
                        .await;
                }
                Err(e) => {
                    error!("Failed to await streaming process: {e}");
                    let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
