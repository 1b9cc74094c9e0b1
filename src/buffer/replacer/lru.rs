//! LRU (Least Recently Used) replacement policy.
//!
//! Recency is measured from the moment a frame becomes evictable, so the
//! victim is the frame that has sat unpinned the longest.

use parking_lot::Mutex;

use super::Replacer;
use crate::common::FrameId;

const NIL: usize = usize::MAX;

/// LRU replacer backed by an intrusive doubly linked list.
///
/// Frame ids are dense, so the list links live in two vectors indexed by
/// frame id. Every operation is O(1) and runs under one mutex.
///
/// ```text
///   head (LRU)                                  tail (MRU)
///     │                                            │
///     ▼                                            ▼
///  [Frame 3] ⇄ [Frame 0] ⇄ [Frame 7] ⇄ ... ⇄ [Frame 2]
///     ▲                                            ▲
///  victim()                                    unpin()
/// ```
pub struct LruReplacer {
    inner: Mutex<LruList>,
    capacity: usize,
}

struct LruList {
    prev: Vec<usize>,
    next: Vec<usize>,
    tracked: Vec<bool>,
    head: usize,
    tail: usize,
    len: usize,
}

impl LruList {
    fn new(capacity: usize) -> Self {
        Self {
            prev: vec![NIL; capacity],
            next: vec![NIL; capacity],
            tracked: vec![false; capacity],
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    fn push_back(&mut self, idx: usize) {
        self.prev[idx] = self.tail;
        self.next[idx] = NIL;
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.next[self.tail] = idx;
        }
        self.tail = idx;
        self.tracked[idx] = true;
        self.len += 1;
    }

    fn push_front(&mut self, idx: usize) {
        self.prev[idx] = NIL;
        self.next[idx] = self.head;
        if self.head == NIL {
            self.tail = idx;
        } else {
            self.prev[self.head] = idx;
        }
        self.head = idx;
        self.tracked[idx] = true;
        self.len += 1;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.prev[idx], self.next[idx]);
        if prev == NIL {
            self.head = next;
        } else {
            self.next[prev] = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.prev[next] = prev;
        }
        self.prev[idx] = NIL;
        self.next[idx] = NIL;
        self.tracked[idx] = false;
        self.len -= 1;
    }
}

impl LruReplacer {
    /// Create a replacer able to track `capacity` frames (the pool size).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruList::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Replacer for LruReplacer {
    fn victim(&self) -> Option<FrameId> {
        let mut list = self.inner.lock();
        let head = list.head;
        if head == NIL {
            return None;
        }
        list.unlink(head);
        Some(FrameId::new(head))
    }

    fn pin(&self, frame_id: FrameId) {
        let idx = frame_id.index();
        let mut list = self.inner.lock();
        if idx < self.capacity && list.tracked[idx] {
            list.unlink(idx);
        }
    }

    fn unpin(&self, frame_id: FrameId) {
        let idx = frame_id.index();
        let mut list = self.inner.lock();
        if idx >= self.capacity || list.tracked[idx] || list.len >= self.capacity {
            return;
        }
        list.push_back(idx);
    }

    fn restore(&self, frame_id: FrameId) {
        let idx = frame_id.index();
        let mut list = self.inner.lock();
        if idx >= self.capacity || list.tracked[idx] || list.len >= self.capacity {
            return;
        }
        list.push_front(idx);
    }

    fn size(&self) -> usize {
        self.inner.lock().len
    }
}
