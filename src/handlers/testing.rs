//! In-memory collaborators for handler and adapter tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{AppContext, CommandContext, CommandSender};
use crate::config::Settings;
use crate::core::{parse_command, ChannelRef, Track, TrackQueue};
use crate::media::{self, MediaError, MediaSource};
use crate::player::{PlaybackError, Player};
use crate::storage::SqliteStore;
use crate::telegram::platform::{
    ChatInfo, ChatPlatform, ChatUser, PlatformError, PlatformResult, SentMessage, TelegramMedia,
};

/// Records every send and edit; lookups answer from configured tables.
#[derive(Default)]
pub struct FakePlatform {
    sent: Mutex<Vec<(i64, String)>>,
    edits: Mutex<Vec<String>>,
    edit_attempts: Mutex<usize>,
    next_message_id: Mutex<i32>,
    send_failures: Mutex<VecDeque<PlatformError>>,
    edit_failures: Mutex<VecDeque<PlatformError>>,
    chats: Mutex<HashMap<String, ChatInfo>>,
    chat_errors: Mutex<HashMap<String, PlatformError>>,
    owners: Mutex<HashMap<i64, ChatUser>>,
    owner_errors: Mutex<HashMap<i64, PlatformError>>,
    admins: Mutex<HashSet<(i64, u64)>>,
    admin_error: Mutex<Option<PlatformError>>,
    media_error: Mutex<Option<PlatformError>>,
}

impl FakePlatform {
    pub fn fail_next_send(&self, err: PlatformError) {
        self.send_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_edit(&self, err: PlatformError) {
        self.edit_failures.lock().unwrap().push_back(err);
    }

    /// Every text that was sent, to any chat.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, t)| t.clone())
            .collect()
    }

    /// Texts of successful edits.
    pub fn edit_texts(&self) -> Vec<String> {
        self.edits.lock().unwrap().clone()
    }

    pub fn edit_attempts(&self) -> usize {
        *self.edit_attempts.lock().unwrap()
    }

    pub fn add_chat(&self, chat: &ChannelRef, info: ChatInfo) {
        self.chats.lock().unwrap().insert(chat.to_string(), info);
    }

    pub fn fail_chat(&self, chat: &ChannelRef, err: PlatformError) {
        self.chat_errors.lock().unwrap().insert(chat.to_string(), err);
    }

    pub fn set_owner(&self, chat_id: i64, owner: ChatUser) {
        self.owners.lock().unwrap().insert(chat_id, owner);
    }

    pub fn fail_owner(&self, chat_id: i64, err: PlatformError) {
        self.owner_errors.lock().unwrap().insert(chat_id, err);
    }

    pub fn add_admin(&self, chat_id: i64, user_id: u64) {
        self.admins.lock().unwrap().insert((chat_id, user_id));
    }

    pub fn fail_admin_lookup(&self, err: PlatformError) {
        *self.admin_error.lock().unwrap() = Some(err);
    }

    pub fn fail_media_download(&self, err: PlatformError) {
        *self.media_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn send_text(&self, chat_id: i64, text: &str) -> PlatformResult<SentMessage> {
        if let Some(err) = self.send_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        let mut next = self.next_message_id.lock().unwrap();
        *next += 1;
        Ok(SentMessage {
            chat_id,
            message_id: *next,
        })
    }

    async fn edit_text(&self, _message: &SentMessage, text: &str) -> PlatformResult<()> {
        *self.edit_attempts.lock().unwrap() += 1;
        if let Some(err) = self.edit_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.edits.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn get_chat(&self, chat: &ChannelRef) -> PlatformResult<ChatInfo> {
        let key = chat.to_string();
        if let Some(err) = self.chat_errors.lock().unwrap().get(&key) {
            return Err(err.clone());
        }
        self.chats
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(PlatformError::ChatNotFound)
    }

    async fn chat_owner(&self, chat_id: i64) -> PlatformResult<Option<ChatUser>> {
        if let Some(err) = self.owner_errors.lock().unwrap().get(&chat_id) {
            return Err(err.clone());
        }
        Ok(self.owners.lock().unwrap().get(&chat_id).cloned())
    }

    async fn is_admin(&self, chat_id: i64, user_id: u64) -> PlatformResult<bool> {
        if let Some(err) = self.admin_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.admins.lock().unwrap().contains(&(chat_id, user_id)))
    }

    async fn download_media(&self, media: &TelegramMedia) -> PlatformResult<PathBuf> {
        if let Some(err) = self.media_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(PathBuf::from(format!("/tmp/tunecast-test/{}", media.file_unique_id)))
    }
}

/// Search results keyed by query text.
#[derive(Default)]
pub struct FakeMedia {
    results: Mutex<HashMap<String, Track>>,
    playlist: Mutex<Option<Result<Vec<Track>, String>>>,
    fail_downloads: Mutex<bool>,
    searches: Mutex<Vec<String>>,
    downloads: Mutex<Vec<String>>,
    live_downloads: Mutex<Vec<String>>,
}

impl FakeMedia {
    pub fn add_result(&self, query: &str, track: Track) {
        self.results.lock().unwrap().insert(query.to_string(), track);
    }

    pub fn set_playlist(&self, result: Result<Vec<Track>, String>) {
        *self.playlist.lock().unwrap() = Some(result);
    }

    pub fn fail_downloads(&self) {
        *self.fail_downloads.lock().unwrap() = true;
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    /// Ids passed to `download`, live or not.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn live_downloads(&self) -> Vec<String> {
        self.live_downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for FakeMedia {
    async fn search(&self, query: &str, _status_id: i32, video: bool) -> media::Result<Option<Track>> {
        self.searches.lock().unwrap().push(query.to_string());
        Ok(self.results.lock().unwrap().get(query).cloned().map(|mut t| {
            t.video = video;
            t
        }))
    }

    async fn playlist(
        &self,
        limit: usize,
        requester: &str,
        _url: &str,
        _video: bool,
    ) -> media::Result<Vec<Track>> {
        match self.playlist.lock().unwrap().clone() {
            Some(Ok(mut tracks)) => {
                tracks.truncate(limit);
                for track in &mut tracks {
                    track.user = Some(requester.to_string());
                }
                Ok(tracks)
            }
            Some(Err(msg)) => Err(MediaError::Process(msg)),
            None => Ok(Vec::new()),
        }
    }

    async fn download(&self, id: &str, _video: bool, is_live: bool) -> media::Result<Option<PathBuf>> {
        self.downloads.lock().unwrap().push(id.to_string());
        if is_live {
            self.live_downloads.lock().unwrap().push(id.to_string());
        }
        if *self.fail_downloads.lock().unwrap() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(format!("/tmp/tunecast-test/{}.m4a", id))))
    }
}

/// Records plays; fails every call once `fail_with` was used.
#[derive(Default)]
pub struct FakePlayer {
    plays: Mutex<Vec<(i64, Track, bool)>>,
    failure: Mutex<Option<String>>,
}

impl FakePlayer {
    pub fn fail_with(&self, err: PlaybackError) {
        *self.failure.lock().unwrap() = Some(err.to_string());
    }

    pub fn plays(&self) -> Vec<(i64, Track, bool)> {
        self.plays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Player for FakePlayer {
    async fn play_media(&self, destination: i64, track: &Track, video: bool) -> Result<(), PlaybackError> {
        if let Some(msg) = self.failure.lock().unwrap().clone() {
            return Err(PlaybackError::Stream(msg));
        }
        self.plays
            .lock()
            .unwrap()
            .push((destination, track.clone(), video));
        Ok(())
    }
}

/// An [`AppContext`] wired to fakes, with handles to each fake.
pub struct TestApp {
    pub app: AppContext,
    pub platform: Arc<FakePlatform>,
    pub media: Arc<FakeMedia>,
    pub player: Arc<FakePlayer>,
    pub store: Arc<SqliteStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_sudoer(user_id: u64) -> Self {
        let settings = Settings {
            sudoers: vec![user_id],
            ..Settings::default()
        };
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: Settings) -> Self {
        let platform = Arc::new(FakePlatform::default());
        let media = Arc::new(FakeMedia::default());
        let player = Arc::new(FakePlayer::default());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let app = AppContext {
            settings,
            platform: platform.clone(),
            queue: Arc::new(TrackQueue::new()),
            player: player.clone(),
            media: media.clone(),
            store: store.clone(),
        };
        Self {
            app,
            platform,
            media,
            player,
            store,
        }
    }
}

/// A command typed by user `user_id` in group `chat_id`.
pub fn command_ctx(chat_id: i64, user_id: u64, text: &str) -> CommandContext {
    CommandContext {
        chat_id,
        chat_title: "Test Group".to_string(),
        sender: CommandSender {
            id: user_id,
            mention: format!("<a href=\"tg://user?id={}\">User {}</a>", user_id, user_id),
        },
        command: parse_command(text).unwrap(),
        reply_media: None,
    }
}
