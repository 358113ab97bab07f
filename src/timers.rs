//! Virtual-time timer queue.
//!
//! Stands in for the host's `setTimeout`: the gallery schedules
//! continuations here and the host calls [`TimerQueue::pop_due`] as its clock
//! advances. Time is a [`Duration`] since the gallery was initialized.
//!
//! Timers due at the same instant fire in the order they were scheduled.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    seq: u64,
}

#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at `due`.
    pub fn schedule(&mut self, due: Duration, payload: T) {
        self.seq += 1;
        self.heap.push(Reverse(Entry {
            due,
            seq: self.seq,
            payload,
        }));
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        if self.heap.peek()?.0.due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(e)| (e.due, e.payload))
    }

    /// When the next timer fires, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(e)| e.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn pops_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(ms(300), "b");
        q.schedule(ms(0), "a");
        q.schedule(ms(600), "c");

        assert_eq!(q.pop_due(ms(1000)), Some((ms(0), "a")));
        assert_eq!(q.pop_due(ms(1000)), Some((ms(300), "b")));
        assert_eq!(q.pop_due(ms(1000)), Some((ms(600), "c")));
        assert!(q.is_empty());
    }

    #[test]
    fn nothing_due_before_time() {
        let mut q = TimerQueue::new();
        q.schedule(ms(300), ());
        assert_eq!(q.pop_due(ms(299)), None);
        assert_eq!(q.next_due(), Some(ms(300)));
        assert!(q.pop_due(ms(300)).is_some());
    }

    #[test]
    fn ties_fire_in_schedule_order() {
        let mut q = TimerQueue::new();
        for i in 0..5 {
            q.schedule(ms(100), i);
        }
        let order: Vec<i32> = std::iter::from_fn(|| q.pop_due(ms(100)).map(|(_, p)| p)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut q = TimerQueue::new();
        q.schedule(ms(1), 1);
        q.schedule(ms(2), 2);
        q.clear();
        assert_eq!(q.len(), 0);
        assert_eq!(q.next_due(), None);
    }
}
