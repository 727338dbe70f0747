use std::time::Duration;

/// Handle for a scheduled fire-once timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Fire-once timers on a virtual clock.
///
/// Time only moves when the owner says so, which keeps watchdog behaviour
/// deterministic: hosts advance it by wall-clock elapsed time, tests by
/// exact amounts.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    /// (deadline, id); unsorted, the queue stays tiny.
    pending: Vec<(Duration, TimerId)>,
}

impl TimerQueue {
    /// An empty queue at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arm a timer that fires once `delay` from now.
    pub fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push((self.now + delay, id));
        id
    }

    /// Returns false when the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(_, pending)| *pending != id);
        self.pending.len() != before
    }

    /// True while the timer has neither fired nor been cancelled.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|(_, pending)| *pending == id)
    }

    /// Time until the earliest pending timer, zero if it is already due.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending
            .iter()
            .map(|(deadline, _)| deadline.saturating_sub(self.now))
            .min()
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its deadline. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let (idx, &(deadline, id)) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (deadline, _))| *deadline <= until)
            .min_by_key(|(_, (deadline, id))| (*deadline, *id))?;
        self.pending.swap_remove(idx);
        self.now = self.now.max(deadline);
        Some(id)
    }

    /// Move the clock forward to `until` without firing anything.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when no timer is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::TimerQueue;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut timers = TimerQueue::new();
        let late = timers.schedule(ms(1000));
        let early = timers.schedule(ms(500));

        assert_eq!(timers.next_deadline(), Some(ms(500)));
        assert_eq!(timers.pop_due(ms(2000)), Some(early));
        assert_eq!(timers.now(), ms(500));
        assert_eq!(timers.pop_due(ms(2000)), Some(late));
        assert_eq!(timers.pop_due(ms(2000)), None);
    }

    #[test]
    fn does_not_fire_before_deadline() {
        let mut timers = TimerQueue::new();
        timers.schedule(ms(500));
        assert_eq!(timers.pop_due(ms(499)), None);
        timers.settle(ms(499));
        assert_eq!(timers.next_deadline(), Some(ms(1)));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(ms(500));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(!timers.is_pending(id));
        assert_eq!(timers.pop_due(ms(10_000)), None);
        assert!(timers.is_empty());
    }

    #[test]
    fn delay_is_measured_from_current_time() {
        let mut timers = TimerQueue::new();
        timers.settle(ms(300));
        let id = timers.schedule(ms(500));
        assert_eq!(timers.pop_due(ms(799)), None);
        assert_eq!(timers.pop_due(ms(800)), Some(id));
    }
}
