//! Browser timer adapter.

use gloo_timers::callback::{Interval, Timeout};
use host_page::{RepeatGuard, Scheduler};

/// Scheduler backed by the page's interval/timeout timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebScheduler;

impl Scheduler for WebScheduler {
    fn repeat(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> RepeatGuard {
        let mut tick = tick;
        let interval = Interval::new(period_ms, move || tick());
        RepeatGuard::new(Box::new(move || drop(interval)))
    }

    fn once(&self, delay_ms: u32, task: Box<dyn FnOnce()>) {
        Timeout::new(delay_ms, task).forget();
    }
}
