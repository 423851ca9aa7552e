//! Decides when the dashboard fetches a new snapshot
//!
//! Driven by [`Poller::tick`] once per frame. Outside signals arrive on the
//! event bus: visibility changes, interval changes and teardown.

use patrol_client_core::{AppEvent, EventBus, Subscription};
use patrol_shared::const_config::client::poll::POLL_MIN_INTERVAL;
use patrol_time::{Deadline, Instant, Millis};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Poller {
    interval: Millis,
    state: PollerState,
}

#[derive(Debug, Default)]
enum PollerState {
    #[default]
    Stopped,
    Running(Running),
}

#[derive(Debug)]
struct Running {
    subscription: Subscription,
    /// `None` while hidden
    next_due: Option<Deadline>,
    cycle_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("poll interval of {requested} is below the minimum of {minimum}")]
pub struct IntervalRejected {
    pub requested: Millis,
    pub minimum: Millis,
}

impl Poller {
    pub fn new(interval: Millis) -> Self {
        let interval = interval.at_least(POLL_MIN_INTERVAL).unwrap_or_else(|| {
            warn!(?interval, "configured poll interval too small, using minimum");
            POLL_MIN_INTERVAL
        });
        Self {
            interval,
            state: PollerState::Stopped,
        }
    }

    pub fn interval(&self) -> Millis {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, PollerState::Running(_))
    }

    /// Running with the timer armed (not paused because hidden)
    pub fn is_timer_armed(&self) -> bool {
        matches!(
            &self.state,
            PollerState::Running(Running {
                next_due: Some(_),
                ..
            })
        )
    }

    /// When the next timed cycle is due, if the timer is armed
    pub fn next_due(&self) -> Option<Deadline> {
        match &self.state {
            PollerState::Running(running) => running.next_due,
            PollerState::Stopped => None,
        }
    }

    /// Arms the timer and asks for one cycle straight away. Does nothing if
    /// already running
    #[tracing::instrument(skip(self, bus))]
    pub fn start(&mut self, bus: &EventBus, now: Instant) {
        if self.is_running() {
            debug!("poller already running");
            return;
        }
        info!(interval = %self.interval, "poller started");
        self.state = PollerState::Running(Running {
            subscription: bus.subscribe(),
            next_due: Some(Deadline::after(now, self.interval)),
            cycle_requested: true,
        });
    }

    /// Cancels the timer and drops the subscription. Safe to call repeatedly
    pub fn stop(&mut self) {
        if self.is_running() {
            info!("poller stopped");
        }
        self.state = PollerState::Stopped;
    }

    /// Values below the floor are rejected and the interval is left as it was
    pub fn set_interval(&mut self, interval: Millis, now: Instant) -> Result<(), IntervalRejected> {
        let Some(interval) = interval.at_least(POLL_MIN_INTERVAL) else {
            warn!(?interval, "poll interval rejected");
            return Err(IntervalRejected {
                requested: interval,
                minimum: POLL_MIN_INTERVAL,
            });
        };
        self.interval = interval;
        if let PollerState::Running(running) = &mut self.state {
            if running.next_due.is_some() {
                running.next_due = Some(Deadline::after(now, interval));
            }
        }
        info!(%interval, "poll interval changed");
        Ok(())
    }

    /// Processes pending signals then reports if a fetch cycle should start now
    pub fn tick(&mut self, now: Instant) -> bool {
        self.process_events(now);
        let PollerState::Running(running) = &mut self.state else {
            return false;
        };
        let mut should_fetch = std::mem::take(&mut running.cycle_requested);
        if let Some(due) = running.next_due {
            if due.is_expired(now) {
                running.next_due = Some(Deadline::after(now, self.interval));
                should_fetch = true;
            }
        }
        should_fetch
    }

    fn process_events(&mut self, now: Instant) {
        let events = match &mut self.state {
            PollerState::Running(running) => running.subscription.drain(),
            PollerState::Stopped => return,
        };
        for event in events {
            match event {
                AppEvent::VisibilityChanged { hidden } => self.on_visibility(hidden, now),
                AppEvent::SetPollInterval(interval) => {
                    // Rejection is already logged
                    let _ = self.set_interval(interval, now);
                }
                AppEvent::Teardown => self.stop(),
                AppEvent::SnapshotPublished(_) | AppEvent::RoleChanged(_) | AppEvent::SignedOut => {}
            }
        }
    }

    fn on_visibility(&mut self, hidden: bool, now: Instant) {
        let PollerState::Running(running) = &mut self.state else {
            return;
        };
        if hidden {
            debug!("hidden, timer paused");
            running.next_due = None;
        } else {
            debug!("visible again");
            running.cycle_requested = true;
            if running.next_due.is_none() {
                running.next_due = Some(Deadline::after(now, self.interval));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn started(interval: u64) -> (Poller, EventBus, Instant) {
        let bus = EventBus::default();
        let now = Instant::now();
        let mut poller = Poller::new(Millis::new(interval));
        poller.start(&bus, now);
        (poller, bus, now)
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn start_fetches_immediately_then_on_interval() {
        let (mut poller, _bus, now) = started(5000);
        assert!(poller.tick(now));
        assert!(!poller.tick(now + ms(10)));
        assert!(!poller.tick(now + ms(4999)));
        assert!(poller.tick(now + ms(5000)));
        assert!(!poller.tick(now + ms(5001)));
        assert!(poller.tick(now + ms(10_000)));
    }

    #[test]
    fn start_twice_keeps_one_subscription() {
        let (mut poller, bus, now) = started(5000);
        poller.start(&bus, now);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn hidden_pauses_and_visible_resumes() {
        let (mut poller, bus, now) = started(5000);
        assert!(poller.tick(now));

        bus.publish(AppEvent::VisibilityChanged { hidden: true });
        assert!(!poller.tick(now + ms(1)));
        assert!(!poller.is_timer_armed());
        assert!(!poller.tick(now + ms(60_000)), "no fetch while hidden");

        bus.publish(AppEvent::VisibilityChanged { hidden: false });
        let back = now + ms(61_000);
        assert!(poller.tick(back), "immediate cycle on return");
        assert!(poller.is_timer_armed());
        assert!(!poller.tick(back + ms(4999)));
        assert!(poller.tick(back + ms(5000)));
    }

    #[test]
    fn visible_without_hidden_only_adds_a_cycle() {
        let (mut poller, bus, now) = started(5000);
        assert!(poller.tick(now));
        bus.publish(AppEvent::VisibilityChanged { hidden: false });
        assert!(poller.tick(now + ms(100)));
        // Timer was never stopped so the cadence is unchanged
        assert!(poller.tick(now + ms(5000)));
    }

    #[test]
    fn interval_below_floor_is_rejected() {
        let (mut poller, bus, now) = started(5000);
        assert!(poller.tick(now));
        let actual = poller.set_interval(Millis::new(500), now);
        assert_eq!(
            actual,
            Err(IntervalRejected {
                requested: Millis::new(500),
                minimum: Millis::new(1000)
            })
        );
        bus.publish(AppEvent::SetPollInterval(Millis::new(999)));
        assert!(!poller.tick(now + ms(1)));
        assert_eq!(poller.interval(), Millis::new(5000));
    }

    #[test]
    fn interval_change_restarts_timer() {
        let (mut poller, bus, now) = started(5000);
        assert!(poller.tick(now));
        let later = now + ms(3000);
        bus.publish(AppEvent::SetPollInterval(Millis::new(10_000)));
        assert!(!poller.tick(later));
        assert_eq!(poller.interval(), Millis::new(10_000));
        // Old cadence would have fired at 5000
        assert!(!poller.tick(now + ms(5000)));
        assert!(!poller.tick(later + ms(9999)));
        assert!(poller.tick(later + ms(10_000)));
    }

    #[test]
    fn interval_change_while_stopped_is_kept_for_next_start() {
        let bus = EventBus::default();
        let now = Instant::now();
        let mut poller = Poller::new(Millis::new(5000));
        poller.set_interval(Millis::new(2000), now).unwrap();
        poller.start(&bus, now);
        assert!(poller.tick(now));
        assert!(poller.tick(now + ms(2000)));
    }

    #[test]
    fn teardown_stops_and_unsubscribes() {
        let (mut poller, bus, now) = started(5000);
        bus.publish(AppEvent::Teardown);
        assert!(!poller.tick(now));
        assert!(!poller.is_running());
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!poller.tick(now + ms(50_000)));
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut poller, bus, _now) = started(5000);
        poller.stop();
        poller.stop();
        assert!(!poller.is_running());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn configured_interval_is_floored() {
        let poller = Poller::new(Millis::new(10));
        assert_eq!(poller.interval(), Millis::new(1000));
    }
}
