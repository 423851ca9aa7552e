use patrol_time::{Deadline, Instant, Millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    expires: Deadline,
}

/// Short lived notices, each dismissed on its own once its time is up
#[derive(Debug, Clone)]
pub struct Toasts {
    duration: Millis,
    entries: Vec<Toast>,
}

impl Toasts {
    pub fn new(duration: Millis) -> Self {
        Self {
            duration,
            entries: Vec::new(),
        }
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.push(message.into(), ToastKind::Success, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.push(message.into(), ToastKind::Error, now);
    }

    fn push(&mut self, message: String, kind: ToastKind, now: Instant) {
        tracing::debug!(?kind, message, "toast");
        self.entries.push(Toast {
            message,
            kind,
            expires: Deadline::after(now, self.duration),
        });
    }

    pub fn tick(&mut self, now: Instant) {
        self.entries.retain(|toast| !toast.expires.is_expired(now));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent first
    pub fn latest(&self) -> Option<&Toast> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn each_toast_expires_on_its_own() {
        let now = Instant::now();
        let mut toasts = Toasts::new(Millis::new(2000));
        toasts.success("Usuario creado", now);
        toasts.error("HTTP 500", now + Duration::from_millis(1500));

        toasts.tick(now + Duration::from_millis(1999));
        assert_eq!(toasts.iter().count(), 2);

        toasts.tick(now + Duration::from_millis(2000));
        let remaining: Vec<_> = toasts.iter().map(|t| (t.kind, t.message.as_str())).collect();
        assert_eq!(remaining, vec![(ToastKind::Error, "HTTP 500")]);

        toasts.tick(now + Duration::from_millis(3500));
        assert!(toasts.is_empty());
    }
}
