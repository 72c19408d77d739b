//! Player that hands media files to an external streamer process.
//!
//! The streamer is invoked as `<cmd> --chat <id> --file <path> [--video]` and is
//! expected to run for as long as the track plays. When it exits the queue for
//! that destination advances.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Mutex};

use super::{PlaybackError, Player};
use crate::core::{Track, TrackQueue};
use crate::media::MediaSource;
use crate::storage::SettingsStore;

/// How long a freshly spawned streamer must survive before it counts as started.
const STARTUP_GRACE: Duration = Duration::from_millis(1500);

struct Session {
    generation: u64,
    _stop: oneshot::Sender<()>,
}

struct Inner {
    command: Option<String>,
    queue: Arc<TrackQueue>,
    store: Arc<dyn SettingsStore>,
    media: Arc<dyn MediaSource>,
    sessions: Mutex<HashMap<i64, Session>>,
    next_generation: Mutex<u64>,
}

#[derive(Clone)]
pub struct CommandPlayer {
    inner: Arc<Inner>,
}

impl CommandPlayer {
    pub fn new(
        command: Option<String>,
        queue: Arc<TrackQueue>,
        store: Arc<dyn SettingsStore>,
        media: Arc<dyn MediaSource>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                command,
                queue,
                store,
                media,
                sessions: Mutex::new(HashMap::new()),
                next_generation: Mutex::new(0),
            }),
        }
    }

    fn spawn_streamer(
        &self,
        command: &str,
        destination: i64,
        track: &Track,
        video: bool,
    ) -> Result<Child, PlaybackError> {
        let path = track.file_path.as_ref().ok_or(PlaybackError::NoMedia)?;
        let mut cmd = Command::new(command);
        cmd.arg("--chat")
            .arg(destination.to_string())
            .arg("--file")
            .arg(path);
        if video {
            cmd.arg("--video");
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd.spawn()?)
    }

    /// Register a new session for `destination`, stopping any previous one.
    async fn register(&self, destination: i64) -> (u64, oneshot::Receiver<()>) {
        let generation = {
            let mut next = self.inner.next_generation.lock().await;
            *next += 1;
            *next
        };
        let (tx, rx) = oneshot::channel();
        let previous = self.inner.sessions.lock().await.insert(
            destination,
            Session {
                generation,
                _stop: tx,
            },
        );
        if previous.is_some() {
            tracing::debug!("Stopping previous stream in {}", destination);
        }
        (generation, rx)
    }

    fn supervise(&self, destination: i64, generation: u64, mut child: Child, mut stop: oneshot::Receiver<()>) {
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!("streamer[{}]: {}", destination, line);
                }
            });
        }

        let player = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    tracing::info!("Stream in {} ended: {:?}", destination, status);
                    player.on_finished(destination, generation).await;
                }
                _ = &mut stop => {
                    let _ = child.kill().await;
                }
            }
        });
    }

    /// Advance the queue after the stream of `generation` ended on its own.
    async fn on_finished(&self, destination: i64, generation: u64) {
        {
            let mut sessions = self.inner.sessions.lock().await;
            match sessions.get(&destination) {
                Some(s) if s.generation == generation => {
                    sessions.remove(&destination);
                }
                _ => return,
            }
        }

        let store = &self.inner.store;
        while let Some(mut next) = self
            .inner
            .queue
            .advance_or_else(destination, || store.set_call(destination, false))
            .await
        {
            if next.file_path.is_none() {
                match self.inner.media.download(&next.id, next.video, next.is_live).await {
                    Ok(Some(path)) => next.file_path = Some(path),
                    Ok(None) => {
                        tracing::warn!("Skipping '{}': download produced no file", next.title);
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!("Skipping '{}': {}", next.title, e);
                        continue;
                    }
                }
                self.inner.queue.update_current(destination, next.clone()).await;
            }
            match self.play_media(destination, &next, next.video).await {
                Ok(()) => return,
                Err(e) => tracing::warn!("Skipping '{}': {}", next.title, e),
            }
        }

        tracing::info!("Queue finished in {}", destination);
    }
}

#[async_trait]
impl Player for CommandPlayer {
    async fn play_media(
        &self,
        destination: i64,
        track: &Track,
        video: bool,
    ) -> Result<(), PlaybackError> {
        let command = self
            .inner
            .command
            .as_deref()
            .ok_or(PlaybackError::NotConfigured)?;

        let mut child = self.spawn_streamer(command, destination, track, video)?;

        if let Ok(status) = tokio::time::timeout(STARTUP_GRACE, child.wait()).await {
            let status = status?;
            if !status.success() {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr).await;
                }
                let message = stderr.trim();
                return Err(PlaybackError::Stream(if message.is_empty() {
                    format!("streamer exited with {}", status)
                } else {
                    message.to_string()
                }));
            }
        }

        let (generation, stop) = self.register(destination).await;
        self.inner.store.set_call(destination, true).await;
        tracing::info!("Streaming '{}' in {}", track.title, destination);
        self.supervise(destination, generation, child, stop);
        Ok(())
    }
}
