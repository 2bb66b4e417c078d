//! Change pipeline: debounced reactions to log mutations.
//!
//! Time is virtual. The host drives it with [`ChangePipeline::advance`], so
//! the pipeline stays single-threaded and deterministic under test.
//!
//! Two debounced reactions follow every mutation: serializing the log to the
//! external value and recomputing the HTML projection. A third, undebounced
//! continuation carries measurement-dependent layout to the next render tick.
//! It is stamped with the revision that scheduled it and dropped if stale.

use std::time::Duration;

/// Default quiescence window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// A cancellable, reschedulable one-shot timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Duration>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Schedule (or reschedule) to fire one window after `now`.
    pub fn schedule(&mut self, now: Duration) {
        self.deadline = Some(now + self.window);
    }

    /// Drop a pending firing. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Consume the pending firing if its deadline has passed.
    pub fn fire_if_due(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending firing immediately, whatever its deadline.
    pub fn flush(&mut self) -> bool {
        self.cancel()
    }
}

/// Work the editor must perform when a debouncer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reaction {
    SerializeValue,
    ProjectHtml,
}

#[derive(Clone, Debug)]
pub struct ChangePipeline {
    now: Duration,
    value: Debouncer,
    html: Debouncer,
    layout: Option<u64>,
}

impl Default for ChangePipeline {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ChangePipeline {
    pub fn new(window: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            value: Debouncer::new(window),
            html: Debouncer::new(window),
            layout: None,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// A mutation landed at `revision`: restart both windows and queue layout.
    pub fn on_mutation(&mut self, revision: u64) {
        self.value.schedule(self.now);
        self.html.schedule(self.now);
        self.layout = Some(revision);
    }

    /// Queue only a layout pass, as when tab stops change.
    pub fn request_layout(&mut self, revision: u64) {
        self.layout = Some(revision);
    }

    /// Move the clock forward and return the reactions that came due,
    /// earliest deadline first.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Reaction> {
        self.now += elapsed;
        let mut due: Vec<(Duration, Reaction)> = Vec::with_capacity(2);
        if let Some(deadline) = self.value.deadline() {
            if self.value.fire_if_due(self.now) {
                due.push((deadline, Reaction::SerializeValue));
            }
        }
        if let Some(deadline) = self.html.deadline() {
            if self.html.fire_if_due(self.now) {
                due.push((deadline, Reaction::ProjectHtml));
            }
        }
        due.sort_by_key(|(deadline, _)| *deadline);
        due.into_iter().map(|(_, reaction)| reaction).collect()
    }

    /// Take the queued layout continuation if it belongs to `current`.
    pub fn take_layout(&mut self, current: u64) -> bool {
        match self.layout.take() {
            Some(revision) if revision == current => true,
            Some(revision) => {
                tracing::debug!(
                    target: "quire::pipeline",
                    revision,
                    current,
                    "dropping stale layout continuation"
                );
                false
            }
            None => false,
        }
    }

    pub fn layout_pending(&self) -> bool {
        self.layout.is_some()
    }

    /// Fire the value reaction now if one is pending.
    pub fn flush_value(&mut self) -> bool {
        self.value.flush()
    }

    /// Fire the HTML reaction now if one is pending.
    pub fn flush_html(&mut self) -> bool {
        self.html.flush()
    }

    pub fn value_pending(&self) -> bool {
        self.value.is_pending()
    }

    pub fn html_pending(&self) -> bool {
        self.html.is_pending()
    }

    pub fn cancel_value(&mut self) -> bool {
        self.value.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_burst_coalesces_into_one_firing() {
        let mut pipeline = ChangePipeline::default();
        pipeline.on_mutation(1);
        assert!(pipeline.advance(ms(150)).is_empty());
        // A second edit inside the window pushes the deadline out
        pipeline.on_mutation(2);
        assert!(pipeline.advance(ms(150)).is_empty());
        assert_eq!(
            pipeline.advance(ms(50)),
            vec![Reaction::SerializeValue, Reaction::ProjectHtml]
        );
        assert!(pipeline.advance(ms(500)).is_empty());
    }

    #[test]
    fn test_flush_fires_early() {
        let mut pipeline = ChangePipeline::default();
        pipeline.on_mutation(1);
        assert!(pipeline.flush_value());
        assert!(!pipeline.flush_value());
        assert_eq!(pipeline.advance(ms(200)), vec![Reaction::ProjectHtml]);
    }

    #[test]
    fn test_stale_layout_is_dropped() {
        let mut pipeline = ChangePipeline::default();
        pipeline.on_mutation(3);
        assert!(!pipeline.take_layout(4));
        assert!(!pipeline.layout_pending());
        pipeline.request_layout(5);
        assert!(pipeline.take_layout(5));
    }

    #[test]
    fn test_debouncer_cancel() {
        let mut debouncer = Debouncer::new(ms(200));
        debouncer.schedule(ms(0));
        assert!(debouncer.cancel());
        assert!(!debouncer.fire_if_due(ms(1000)));
    }
}
