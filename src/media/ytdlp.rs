//! yt-dlp backed media source.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::{MediaError, MediaSource, Result};
use crate::core::Track;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub struct YtDlp {
    binary: String,
    downloads_dir: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(binary: impl Into<String>, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            downloads_dir: downloads_dir.into(),
            cookies: None,
        }
    }

    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies;
        self
    }

    async fn run(&self, args: &[String]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        if let Some(cookies) = &self.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running {} {:?}", self.binary, args);
        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::NotInstalled(self.binary.clone())
            } else {
                MediaError::Io(e)
            }
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MediaError::Process(stderr.trim().to_string()))
        }
    }

    /// Previously downloaded file for `id`, if one exists.
    fn cached_file(&self, id: &str) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.downloads_dir).ok()?;
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| {
                p.file_stem().and_then(|s| s.to_str()) == Some(id)
                    && p.extension().map_or(false, |ext| ext != "part")
            })
    }
}

fn source_url(id: &str) -> String {
    if id.starts_with("http://") || id.starts_with("https://") {
        id.to_string()
    } else {
        format!("{}{}", WATCH_URL, id)
    }
}

/// Build a track from one line of `--dump-json` output.
pub fn track_from_json(value: &Value) -> Option<Track> {
    let id = value.get("id")?.as_str()?;
    let title = value
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("Unknown title");
    let duration = value.get("duration").and_then(|d| d.as_f64()).unwrap_or(0.0);
    let is_live = value.get("is_live").and_then(|l| l.as_bool()).unwrap_or(false)
        || value.get("live_status").and_then(|s| s.as_str()) == Some("is_live");
    let url = value
        .get("webpage_url")
        .or_else(|| value.get("url"))
        .and_then(|u| u.as_str())
        .map(ToString::to_string)
        .unwrap_or_else(|| source_url(id));

    let track = Track::new(id, title, duration.max(0.0) as u64).with_url(url);
    Some(if is_live { track.live() } else { track })
}

fn parse_lines(stdout: &str) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let value: Value =
            serde_json::from_str(line).map_err(|e| MediaError::Parse(e.to_string()))?;
        if let Some(track) = track_from_json(&value) {
            tracks.push(track);
        }
    }
    Ok(tracks)
}

fn download_format(video: bool) -> &'static str {
    if video {
        "best[height<=?720][width<=?1280]/best"
    } else {
        "bestaudio/best"
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    async fn search(&self, query: &str, status_id: i32, _video: bool) -> Result<Option<Track>> {
        let target = if query.starts_with("http://") || query.starts_with("https://") {
            query.to_string()
        } else {
            format!("ytsearch1:{}", query)
        };
        let args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--skip-download".to_string(),
            target,
        ];
        let stdout = self.run(&args).await?;
        let mut track = parse_lines(&stdout)?.into_iter().next();
        if let Some(t) = track.as_mut() {
            t.message_id = Some(status_id);
        }
        tracing::debug!("Search '{}' resolved: {:?}", query, track.as_ref().map(|t| &t.title));
        Ok(track)
    }

    async fn playlist(
        &self,
        limit: usize,
        requester: &str,
        url: &str,
        _video: bool,
    ) -> Result<Vec<Track>> {
        let args = vec![
            "--flat-playlist".to_string(),
            "--dump-json".to_string(),
            "--playlist-end".to_string(),
            limit.to_string(),
            url.to_string(),
        ];
        let stdout = self.run(&args).await?;
        let mut tracks = parse_lines(&stdout)?;
        tracks.truncate(limit);
        for track in &mut tracks {
            track.user = Some(requester.to_string());
        }
        tracing::debug!("Playlist {} resolved {} tracks", url, tracks.len());
        Ok(tracks)
    }

    async fn download(&self, id: &str, video: bool, is_live: bool) -> Result<Option<PathBuf>> {
        if is_live {
            // Live streams are handed to the player as their direct media URL.
            let args = vec![
                "-g".to_string(),
                "-f".to_string(),
                download_format(video).to_string(),
                source_url(id),
            ];
            let stdout = self.run(&args).await?;
            return Ok(stdout.lines().next().map(|l| PathBuf::from(l.trim())));
        }

        if let Some(path) = self.cached_file(id) {
            tracing::debug!("Using cached download {}", path.display());
            return Ok(Some(path));
        }

        std::fs::create_dir_all(&self.downloads_dir)?;
        let template = self.downloads_dir.join(format!("{}.%(ext)s", id));
        let args = vec![
            "-f".to_string(),
            download_format(video).to_string(),
            "--no-playlist".to_string(),
            "-o".to_string(),
            template.display().to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            source_url(id),
        ];
        let stdout = self.run(&args).await?;
        let path = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .map(PathBuf::from)
            .filter(|p| p.exists());
        Ok(path.or_else(|| self.cached_file(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_from_full_entry() {
        let value = serde_json::json!({
            "id": "abc123",
            "title": "Some Song",
            "duration": 215.4,
            "webpage_url": "https://www.youtube.com/watch?v=abc123",
            "live_status": "not_live"
        });
        let track = track_from_json(&value).unwrap();
        assert_eq!(track.id, "abc123");
        assert_eq!(track.duration_sec, 215);
        assert_eq!(track.duration, "3:35");
        assert!(!track.is_live);
    }

    #[test]
    fn test_track_from_flat_entry_without_duration() {
        let value = serde_json::json!({ "id": "xyz", "title": null });
        let track = track_from_json(&value).unwrap();
        assert_eq!(track.title, "Unknown title");
        assert_eq!(track.duration_sec, 0);
        assert_eq!(track.url, "https://www.youtube.com/watch?v=xyz");
    }

    #[test]
    fn test_live_entry() {
        let value = serde_json::json!({ "id": "live1", "title": "Radio", "is_live": true });
        assert!(track_from_json(&value).unwrap().is_live);
    }

    #[test]
    fn test_entry_without_id_is_skipped() {
        let stdout = "{\"title\": \"no id\"}\n{\"id\": \"ok\", \"title\": \"fine\"}\n";
        let tracks = parse_lines(stdout).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "ok");
    }

    #[test]
    fn test_garbage_output_is_parse_error() {
        assert!(matches!(parse_lines("not json"), Err(MediaError::Parse(_))));
    }

    #[test]
    fn test_cached_file_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc.part"), b"x").unwrap();
        let ytdlp = YtDlp::new("yt-dlp", dir.path());
        assert!(ytdlp.cached_file("abc").is_none());

        std::fs::write(dir.path().join("abc.m4a"), b"x").unwrap();
        assert_eq!(ytdlp.cached_file("abc"), Some(dir.path().join("abc.m4a")));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = YtDlp::new("definitely-not-a-real-ytdlp-binary", dir.path());
        let err = ytdlp.search("anything", 1, false).await.unwrap_err();
        assert!(matches!(err, MediaError::NotInstalled(_)));
    }
}
