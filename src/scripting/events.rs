use rand::Rng;
use rand::RngCore;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::time::Duration;
use tracing::trace;

/// Pending event inside an [`EventQueue`].
#[derive(Clone, Copy, Debug)]
struct QueuedEvent<E> {
    id: E,
    due: Duration,
    seq: u64,
}

/// Min-heap by due time, then by schedule order
impl<E> Ord for QueuedEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Backwards so the max-heap pops the earliest deadline first.
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<E> PartialOrd for QueuedEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> PartialEq for QueuedEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for QueuedEvent<E> {}

/// Per-actor delayed event queue.
///
/// The queue keeps its own running clock. `update` only moves the clock;
/// events are handed out by `pop_ready`, which the owner calls in a loop
/// until it returns `None`. An event is delivered once and then forgotten,
/// so recurring timers reschedule themselves from their handler.
#[derive(Debug)]
pub struct EventQueue<E> {
    now: Duration,
    next_seq: u64,
    heap: BinaryHeap<QueuedEvent<E>>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        EventQueue {
            now: Duration::ZERO,
            next_seq: 0,
            heap: BinaryHeap::new(),
        }
    }

    /// Clock value the queue has been advanced to.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Advance the clock. Never fires anything by itself.
    pub fn update(&mut self, elapsed: Duration) {
        self.now = self.now.saturating_add(elapsed);
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<E: Copy + PartialEq + Debug> EventQueue<E> {
    /// Schedule `id` to become ready `delay` after the current clock.
    pub fn schedule(&mut self, id: E, delay: Duration) {
        let due = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(event = ?id, ?due, seq, "event scheduled");
        self.heap.push(QueuedEvent { id, due, seq });
    }

    /// Signed millisecond variant; a negative delay is due immediately.
    pub fn schedule_millis(&mut self, id: E, delay_ms: i64) {
        let delay = u64::try_from(delay_ms).unwrap_or(0);
        self.schedule(id, Duration::from_millis(delay));
    }

    /// Schedule with a delay drawn once from the closed range `[min, max]`.
    pub fn schedule_range(&mut self, id: E, min: Duration, max: Duration, rng: &mut dyn RngCore) {
        let delay = roll_delay(min, max, rng);
        self.schedule(id, delay);
    }

    /// Pop the earliest event whose deadline has been reached.
    pub fn pop_ready(&mut self) -> Option<E> {
        let entry = self.heap.peek()?;
        if entry.due > self.now {
            return None;
        }
        let entry = self.heap.pop()?;
        Some(entry.id)
    }

    /// Remove every pending event with this id; returns how many were dropped.
    pub fn cancel(&mut self, id: E) -> usize {
        let before = self.heap.len();
        self.heap.retain(|entry| entry.id != id);
        before - self.heap.len()
    }

    /// Time left until the earliest pending `id` is due.
    pub fn time_until(&self, id: E) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|entry| entry.id == id)
            .map(|entry| entry.due)
            .min()
            .map(|due| due.saturating_sub(self.now))
    }
}

/// Uniform draw from `[min, max]` at millisecond resolution.
pub fn roll_delay(min: Duration, max: Duration, rng: &mut dyn RngCore) -> Duration {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    let low_ms = low.as_millis().min(u64::MAX as u128) as u64;
    let high_ms = high.as_millis().min(u64::MAX as u128) as u64;
    if low_ms == high_ms {
        return Duration::from_millis(low_ms);
    }
    Duration::from_millis(rng.gen_range(low_ms..=high_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Ev {
        X,
        Y,
        Z,
    }

    fn drain(queue: &mut EventQueue<Ev>) -> Vec<Ev> {
        let mut ready = Vec::new();
        while let Some(event) = queue.pop_ready() {
            ready.push(event);
        }
        ready
    }

    #[test]
    fn same_deadline_pops_in_schedule_order() {
        let mut queue = EventQueue::new();
        queue.schedule(Ev::X, Duration::from_secs(1));
        queue.schedule(Ev::Y, Duration::from_secs(1));

        queue.update(Duration::from_millis(1000));
        assert_eq!(drain(&mut queue), vec![Ev::X, Ev::Y]);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_ready_only_returns_due_events() {
        let mut queue = EventQueue::new();
        queue.schedule(Ev::X, Duration::from_millis(500));
        queue.schedule(Ev::Y, Duration::from_millis(1500));

        queue.update(Duration::from_millis(499));
        assert_eq!(queue.pop_ready(), None);

        queue.update(Duration::from_millis(1));
        assert_eq!(queue.pop_ready(), Some(Ev::X));
        assert_eq!(queue.pop_ready(), None);

        queue.update(Duration::from_millis(1000));
        assert_eq!(queue.pop_ready(), Some(Ev::Y));
        assert_eq!(queue.pop_ready(), None);
    }

    #[test]
    fn earlier_deadline_wins_over_schedule_order() {
        let mut queue = EventQueue::new();
        queue.schedule(Ev::X, Duration::from_millis(300));
        queue.schedule(Ev::Y, Duration::from_millis(100));
        queue.schedule(Ev::Z, Duration::from_millis(200));

        queue.update(Duration::from_secs(5));
        assert_eq!(drain(&mut queue), vec![Ev::Y, Ev::Z, Ev::X]);
    }

    #[test]
    fn delays_are_relative_to_the_running_clock() {
        let mut queue = EventQueue::new();
        queue.update(Duration::from_secs(10));
        queue.schedule(Ev::X, Duration::from_secs(1));

        queue.update(Duration::from_millis(999));
        assert_eq!(queue.pop_ready(), None);
        queue.update(Duration::from_millis(1));
        assert_eq!(queue.pop_ready(), Some(Ev::X));
    }

    #[test]
    fn negative_delay_is_due_immediately() {
        let mut queue = EventQueue::new();
        queue.schedule_millis(Ev::X, -250);
        assert_eq!(queue.pop_ready(), Some(Ev::X));
    }

    #[test]
    fn duplicate_ids_are_delivered_separately() {
        let mut queue = EventQueue::new();
        queue.schedule(Ev::X, Duration::from_millis(10));
        queue.schedule(Ev::X, Duration::from_millis(20));

        queue.update(Duration::from_millis(20));
        assert_eq!(drain(&mut queue), vec![Ev::X, Ev::X]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = EventQueue::new();
        queue.schedule(Ev::X, Duration::ZERO);
        queue.schedule(Ev::Y, Duration::from_millis(5));
        queue.clear();

        queue.update(Duration::from_secs(60));
        assert_eq!(queue.pop_ready(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_removes_only_matching_ids() {
        let mut queue = EventQueue::new();
        queue.schedule(Ev::X, Duration::from_millis(10));
        queue.schedule(Ev::Y, Duration::from_millis(10));
        queue.schedule(Ev::X, Duration::from_millis(30));

        assert_eq!(queue.cancel(Ev::X), 2);
        assert_eq!(queue.cancel(Ev::X), 0);
        queue.update(Duration::from_secs(1));
        assert_eq!(drain(&mut queue), vec![Ev::Y]);
    }

    #[test]
    fn time_until_reports_earliest_instance() {
        let mut queue = EventQueue::new();
        queue.schedule(Ev::X, Duration::from_millis(700));
        queue.schedule(Ev::X, Duration::from_millis(300));

        queue.update(Duration::from_millis(100));
        assert_eq!(queue.time_until(Ev::X), Some(Duration::from_millis(200)));
        assert_eq!(queue.time_until(Ev::Y), None);

        queue.update(Duration::from_millis(500));
        assert_eq!(queue.time_until(Ev::X), Some(Duration::ZERO));
    }

    #[test]
    fn split_updates_match_a_single_update() {
        let mut rng = StdRng::seed_from_u64(0xfeed_face);
        for _ in 0..64 {
            let mut split = EventQueue::new();
            let mut whole = EventQueue::new();
            for event in [Ev::X, Ev::Y, Ev::Z] {
                let delay = Duration::from_millis(rng.gen_range(0..2_000));
                split.schedule(event, delay);
                whole.schedule(event, delay);
            }
            let first = Duration::from_millis(rng.gen_range(0..1_000));
            let second = Duration::from_millis(rng.gen_range(0..1_000));
            split.update(first);
            split.update(second);
            whole.update(first + second);
            assert_eq!(drain(&mut split), drain(&mut whole));
        }
    }

    #[test]
    fn interleaved_operations_deliver_each_event_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut queue = EventQueue::new();
        let mut delivered = 0usize;
        let mut scheduled = 0usize;

        for _ in 0..500 {
            match rng.gen_range(0..3) {
                0 => {
                    queue.schedule(Ev::X, Duration::from_millis(rng.gen_range(0..400)));
                    scheduled += 1;
                }
                1 => queue.update(Duration::from_millis(rng.gen_range(0..150))),
                _ => {
                    if queue.pop_ready().is_some() {
                        delivered += 1;
                    }
                }
            }
        }
        queue.update(Duration::from_secs(10));
        delivered += drain(&mut queue).len();
        assert_eq!(delivered, scheduled);
        assert_eq!(queue.pop_ready(), None);
    }

    #[test]
    fn ready_deadlines_are_non_decreasing() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut queue: EventQueue<u32> = EventQueue::new();
        let mut deadlines = std::collections::HashMap::new();
        for id in 0..200u32 {
            let delay = Duration::from_millis(rng.gen_range(0..50));
            deadlines.insert(id, delay);
            queue.schedule(id, delay);
        }
        queue.update(Duration::from_millis(100));
        let mut previous = Duration::ZERO;
        let mut seen = std::collections::HashSet::new();
        while let Some(id) = queue.pop_ready() {
            let due = deadlines[&id];
            assert!(due >= previous);
            assert!(seen.insert(id), "event {id} delivered twice");
            previous = due;
        }
        assert_eq!(seen.len(), 200);
    }

    #[test]
    fn jittered_delay_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(13000);
        let min = Duration::from_millis(13_000);
        let max = Duration::from_millis(18_000);
        for _ in 0..256 {
            let delay = roll_delay(min, max, &mut rng);
            assert!(delay >= min && delay <= max);
        }
        assert_eq!(roll_delay(max, max, &mut rng), max);
        let reversed = roll_delay(max, min, &mut rng);
        assert!(reversed >= min && reversed <= max);
    }

    #[test]
    fn jitter_is_reproducible_with_a_seeded_source() {
        let mut first = EventQueue::new();
        let mut second = EventQueue::new();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let (min, max) = (Duration::from_secs(5), Duration::from_secs(12));
        first.schedule_range(Ev::X, min, max, &mut rng_a);
        second.schedule_range(Ev::X, min, max, &mut rng_b);
        assert_eq!(first.time_until(Ev::X), second.time_until(Ev::X));
    }
}
