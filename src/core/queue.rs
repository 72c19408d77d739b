//! In-process playback queue, one ordered list per destination.
//!
//! Position 0 is the track currently playing (or about to play) in a
//! destination; everything after it is waiting.

use std::collections::{HashMap, VecDeque};
use std::future::Future;

use tokio::sync::Mutex;

use super::track::Track;

/// Queue operations.
#[derive(Default)]
pub struct TrackQueue {
    inner: Mutex<HashMap<i64, VecDeque<Track>>>,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track and return its 0-based position.
    pub async fn add(&self, destination: i64, track: Track) -> usize {
        let mut inner = self.inner.lock().await;
        let queue = inner.entry(destination).or_default();
        queue.push_back(track);
        let position = queue.len() - 1;
        tracing::debug!("Queued track at position {} in {}", position, destination);
        position
    }

    /// Put a track at position 0, replacing whatever was there.
    ///
    /// Returns the replaced head so a failed force play can hand it back
    /// through [`TrackQueue::restore_head`].
    pub async fn force_add(&self, destination: i64, track: Track) -> Option<Track> {
        let mut inner = self.inner.lock().await;
        let queue = inner.entry(destination).or_default();
        let replaced = queue.pop_front();
        if let Some(replaced) = &replaced {
            tracing::debug!("Force play replaced '{}' in {}", replaced.title, destination);
        }
        queue.push_front(track);
        replaced
    }

    /// Undo a force play: drop the forced track `forced_id` and put `previous`
    /// back at position 0.
    pub async fn restore_head(&self, destination: i64, forced_id: &str, previous: Track) {
        let mut inner = self.inner.lock().await;
        let queue = inner.entry(destination).or_default();
        if let Some(idx) = queue.iter().position(|t| t.id == forced_id) {
            queue.remove(idx);
        }
        queue.push_front(previous);
    }

    /// The track at position 0.
    pub async fn current(&self, destination: i64) -> Option<Track> {
        let inner = self.inner.lock().await;
        inner.get(&destination).and_then(|q| q.front().cloned())
    }

    /// Drop the head and return the new head, if any.
    pub async fn advance(&self, destination: i64) -> Option<Track> {
        let mut inner = self.inner.lock().await;
        let queue = inner.get_mut(&destination)?;
        queue.pop_front();
        let next = queue.front().cloned();
        if queue.is_empty() {
            inner.remove(&destination);
        }
        next
    }

    /// Like [`TrackQueue::advance`], but when nothing is left `on_empty` runs
    /// before the queue lock is released, so no `add` can observe the empty
    /// queue while the destination still counts as active.
    pub async fn advance_or_else<F, Fut>(&self, destination: i64, on_empty: F) -> Option<Track>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut inner = self.inner.lock().await;
        if let Some(queue) = inner.get_mut(&destination) {
            queue.pop_front();
            if let Some(next) = queue.front().cloned() {
                return Some(next);
            }
            inner.remove(&destination);
        }
        on_empty().await;
        None
    }

    /// Replace the stored copy of the head, e.g. after its file was downloaded.
    pub async fn update_current(&self, destination: i64, track: Track) {
        let mut inner = self.inner.lock().await;
        if let Some(head) = inner.get_mut(&destination).and_then(|q| q.front_mut()) {
            if head.id == track.id {
                *head = track;
            }
        }
    }

    /// Remove the first track with `id`. Returns whether one was removed.
    pub async fn remove(&self, destination: i64, id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(queue) = inner.get_mut(&destination) else {
            return false;
        };
        let Some(idx) = queue.iter().position(|t| t.id == id) else {
            return false;
        };
        queue.remove(idx);
        if queue.is_empty() {
            inner.remove(&destination);
        }
        true
    }

    pub async fn len(&self, destination: i64) -> usize {
        let inner = self.inner.lock().await;
        inner.get(&destination).map_or(0, |q| q.len())
    }

    pub async fn is_empty(&self, destination: i64) -> bool {
        self.len(destination).await == 0
    }

    pub async fn clear(&self, destination: i64) {
        self.inner.lock().await.remove(&destination);
    }

    /// Titles in queue order.
    pub async fn titles(&self, destination: i64) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .get(&destination)
            .map(|q| q.iter().map(|t| t.title.clone()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Song {}", id), 180)
    }

    #[tokio::test]
    async fn test_positions_are_zero_based_and_increasing() {
        let queue = TrackQueue::new();

        assert_eq!(queue.add(1, track("a")).await, 0);
        assert_eq!(queue.add(1, track("b")).await, 1);
        assert_eq!(queue.add(1, track("c")).await, 2);
        assert_eq!(queue.len(1).await, 3);
    }

    #[tokio::test]
    async fn test_destinations_are_independent() {
        let queue = TrackQueue::new();

        queue.add(1, track("a")).await;
        queue.add(1, track("b")).await;
        assert_eq!(queue.add(2, track("c")).await, 0);
        assert!(queue.is_empty(3).await);
    }

    #[tokio::test]
    async fn test_force_add_replaces_head() {
        let queue = TrackQueue::new();
        queue.add(1, track("a")).await;
        queue.add(1, track("b")).await;

        queue.force_add(1, track("x")).await;

        assert_eq!(queue.titles(1).await, vec!["Song x", "Song b"]);
        assert_eq!(queue.current(1).await.unwrap().id, "x");
    }

    #[tokio::test]
    async fn test_force_add_on_empty_queue() {
        let queue = TrackQueue::new();
        assert!(queue.force_add(5, track("x")).await.is_none());
        assert_eq!(queue.len(5).await, 1);
    }

    #[tokio::test]
    async fn test_restore_head_undoes_force_add() {
        let queue = TrackQueue::new();
        queue.add(1, track("a")).await;
        queue.add(1, track("b")).await;

        let replaced = queue.force_add(1, track("x")).await.unwrap();
        assert_eq!(replaced.id, "a");
        queue.restore_head(1, "x", replaced).await;

        assert_eq!(queue.titles(1).await, vec!["Song a", "Song b"]);
    }

    #[tokio::test]
    async fn test_advance_or_else_runs_hook_only_when_drained() {
        let queue = TrackQueue::new();
        queue.add(1, track("a")).await;
        queue.add(1, track("b")).await;
        let hook_calls = Cell::new(0);
        let locked_during_hook = Cell::new(false);
        let (calls, locked, q) = (&hook_calls, &locked_during_hook, &queue);

        let next = queue
            .advance_or_else(1, move || async move { calls.set(calls.get() + 1) })
            .await;
        assert_eq!(next.unwrap().id, "b");
        assert_eq!(hook_calls.get(), 0);

        let next = queue
            .advance_or_else(1, move || async move {
                calls.set(calls.get() + 1);
                locked.set(q.inner.try_lock().is_err());
            })
            .await;
        assert!(next.is_none());
        assert_eq!(hook_calls.get(), 1);
        assert!(locked_during_hook.get());
        assert!(queue.is_empty(1).await);
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let queue = TrackQueue::new();
        queue.add(1, track("a")).await;
        queue.add(1, track("b")).await;

        assert!(queue.remove(1, "a").await);
        assert!(!queue.remove(1, "a").await);
        assert_eq!(queue.titles(1).await, vec!["Song b"]);
        assert!(queue.remove(1, "b").await);
        assert!(queue.is_empty(1).await);
    }

    #[tokio::test]
    async fn test_update_current_only_touches_matching_head() {
        let queue = TrackQueue::new();
        queue.add(1, track("a")).await;

        let mut other = track("z");
        other.file_path = Some("/tmp/z.m4a".into());
        queue.update_current(1, other).await;
        assert!(queue.current(1).await.unwrap().file_path.is_none());

        let mut same = track("a");
        same.file_path = Some("/tmp/a.m4a".into());
        queue.update_current(1, same).await;
        assert!(queue.current(1).await.unwrap().file_path.is_some());
    }
}
