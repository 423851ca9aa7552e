use patrol_time::{Deadline, Instant, Millis};

/// Collapses a burst of input into one action fired `delay` after the last
/// input
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Millis,
    due: Option<Deadline>,
}

impl Debouncer {
    pub fn new(delay: Millis) -> Self {
        Self { delay, due: None }
    }

    pub fn delay(&self) -> Millis {
        self.delay
    }

    /// Restarts the wait
    pub fn touch(&mut self, now: Instant) {
        self.due = Some(Deadline::after(now, self.delay));
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// True exactly once per burst, when the wait has run out
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if due.is_expired(now) => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }
}
