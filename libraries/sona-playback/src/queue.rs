//! Dual queue model
//!
//! Implements the "play next" queue spliced in front of a positional playlist:
//! - Priority queue: tracks the user explicitly queued, drained FIFO
//! - Context queue: the album/playlist/search the user started from, plus a
//!   cursor that priority playback never moves

use sona_core::Track;

/// Dual queue for playback
///
/// Structure:
/// ```text
/// Context queue:   [ a  b  (c)  d  e ]      current_index = 2
///                           ^ current
/// Priority queue:  [ p1  p2 ]
///
/// Play order from here: p1, p2, d, e
/// ```
///
/// Every mutation validates its indices and does nothing on bad input; the
/// boolean results report whether anything changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueModel {
    /// Tracks explicitly queued by the user (play next)
    priority: Vec<Track>,

    /// Tracks from the browsing context
    context: Vec<Track>,

    /// Cursor into `context` (meaningful only when `context` is non-empty)
    current_index: usize,
}

impl QueueModel {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Context queue =====

    /// Replace the context queue and its cursor
    ///
    /// An out-of-range index is clamped to the last track.
    pub fn replace_context(&mut self, tracks: Vec<Track>, index: usize) {
        self.current_index = index.min(tracks.len().saturating_sub(1));
        self.context = tracks;
    }

    /// Full context queue, played tracks included
    pub fn context(&self) -> &[Track] {
        &self.context
    }

    /// Cursor into the context queue
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Move the cursor
    ///
    /// Returns false (and leaves the cursor alone) when `index` is out of range
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index < self.context.len() {
            self.current_index = index;
            true
        } else {
            false
        }
    }

    /// Context tracks strictly after the cursor
    pub fn upcoming(&self) -> &[Track] {
        self.context.get(self.current_index + 1..).unwrap_or(&[])
    }

    /// Index of the context track after the cursor, if any
    pub fn next_context_index(&self) -> Option<usize> {
        let next = self.current_index + 1;
        (next < self.context.len()).then_some(next)
    }

    /// Index of the context track before the cursor, if any
    pub fn previous_context_index(&self) -> Option<usize> {
        (self.current_index > 0 && !self.context.is_empty()).then(|| self.current_index - 1)
    }

    /// Reorder within the upcoming part of the context queue
    ///
    /// Indices are relative to [`upcoming`](Self::upcoming). Played tracks and
    /// the current track never move.
    pub fn reorder_upcoming(&mut self, from_index: usize, to_index: usize) -> bool {
        let start = self.current_index + 1;
        if start >= self.context.len() {
            return false;
        }

        let mut upcoming = self.context.split_off(start);
        let changed = move_within(&mut upcoming, from_index, to_index);
        self.context.append(&mut upcoming);
        changed
    }

    /// Promote an upcoming context track into the priority queue
    ///
    /// `relative_index` is relative to the upcoming tracks (0 = the next one).
    /// `priority_index` defaults to the end and is clamped into range.
    pub fn move_upcoming_to_priority(
        &mut self,
        relative_index: usize,
        priority_index: Option<usize>,
    ) -> bool {
        if relative_index >= self.upcoming().len() {
            return false;
        }

        let absolute = self.current_index + 1 + relative_index;

        let track = self.context.remove(absolute);
        self.insert_priority(track, priority_index);
        true
    }

    // ===== Priority queue =====

    /// Tracks waiting in the priority queue, head first
    pub fn priority(&self) -> &[Track] {
        &self.priority
    }

    /// Replace the priority queue wholesale
    pub fn set_priority(&mut self, tracks: Vec<Track>) {
        self.priority = tracks;
    }

    /// Take the head of the priority queue
    pub fn pop_priority(&mut self) -> Option<Track> {
        if self.priority.is_empty() {
            None
        } else {
            Some(self.priority.remove(0))
        }
    }

    /// Insert into the priority queue
    ///
    /// `index` defaults to the end and is clamped into `[0, len]`.
    pub fn insert_priority(&mut self, track: Track, index: Option<usize>) {
        let len = self.priority.len();
        let index = index.map_or(len, |i| i.min(len));
        self.priority.insert(index, track);
    }

    /// Remove-and-reinsert within the priority queue
    pub fn reorder_priority(&mut self, from_index: usize, to_index: usize) -> bool {
        move_within(&mut self.priority, from_index, to_index)
    }

    /// Remove one priority track
    pub fn remove_priority(&mut self, index: usize) -> Option<Track> {
        (index < self.priority.len()).then(|| self.priority.remove(index))
    }

    // ===== Whole queue =====

    /// Track that `next` would play
    ///
    /// Prioritizes the priority queue, then the upcoming context tracks.
    pub fn peek_next(&self) -> Option<&Track> {
        self.priority.first().or_else(|| self.upcoming().first())
    }

    /// Whether `next` has anything to play
    pub fn has_next(&self) -> bool {
        self.peek_next().is_some()
    }

    /// Clear both queues and reset the cursor
    pub fn clear(&mut self) {
        self.priority.clear();
        self.context.clear();
        self.current_index = 0;
    }
}

/// Remove the item at `from` and reinsert it at `to`
///
/// `to` is clamped into the list as it stands after the removal, so any
/// `to >= len - 1` moves the item to the end.
fn move_within(items: &mut Vec<Track>, from: usize, to: usize) -> bool {
    if from >= items.len() {
        return false;
    }

    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
    true
}
