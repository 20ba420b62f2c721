//! Cooperative timer contracts and the manually driven test scheduler.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Guard for a repeating timer; dropping it stops further ticks.
///
/// There is no mid-tick cancellation: a tick that already started runs to
/// completion, and the guard only prevents scheduling of later ticks.
pub struct RepeatGuard {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl RepeatGuard {
    /// Wraps a cancellation action to run when the guard drops.
    pub fn new(cancel: Box<dyn FnOnce()>) -> Self {
        Self {
            cancel: Some(cancel),
        }
    }

    /// Guard with no cancellation action, for stub schedulers.
    pub fn noop() -> Self {
        Self { cancel: None }
    }
}

impl Drop for RepeatGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Host timer service.
pub trait Scheduler {
    /// Schedules `tick` every `period_ms` until the returned guard drops.
    fn repeat(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> RepeatGuard;
    /// Schedules `task` once, `delay_ms` from now. One-shots are not
    /// cancellable; tasks must tolerate firing after their target is gone.
    fn once(&self, delay_ms: u32, task: Box<dyn FnOnce()>);
}

/// Scheduler that never fires; useful where timing is irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn repeat(&self, _period_ms: u32, _tick: Box<dyn FnMut()>) -> RepeatGuard {
        RepeatGuard::noop()
    }

    fn once(&self, _delay_ms: u32, _task: Box<dyn FnOnce()>) {}
}

struct RepeatEntry {
    seq: u64,
    period_ms: u64,
    next_due_ms: u64,
    tick: Rc<RefCell<Box<dyn FnMut()>>>,
    cancelled: Rc<Cell<bool>>,
}

struct OneShotEntry {
    seq: u64,
    due_ms: u64,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ManualInner {
    now_ms: u64,
    next_seq: u64,
    repeats: Vec<RepeatEntry>,
    one_shots: Vec<OneShotEntry>,
}

/// Scheduler driven by hand from tests via [`ManualScheduler::advance_ms`].
///
/// Timers fire in due order (insertion order breaking ties), one at a time,
/// with no scheduler state borrowed while a task runs, so tasks may schedule
/// further timers.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

enum DueTask {
    Repeat(Rc<RefCell<Box<dyn FnMut()>>>),
    OneShot(Box<dyn FnOnce()>),
}

impl ManualScheduler {
    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    /// Advances virtual time by `ms`, firing every timer that comes due.
    pub fn advance_ms(&self, ms: u64) {
        let target = self.inner.borrow().now_ms + ms;
        loop {
            let task = self.take_next_due(target);
            let Some(task) = task else { break };
            match task {
                DueTask::Repeat(tick) => (*tick.borrow_mut())(),
                DueTask::OneShot(task) => task(),
            }
        }
        self.inner.borrow_mut().now_ms = target;
    }

    fn take_next_due(&self, target_ms: u64) -> Option<DueTask> {
        let mut inner = self.inner.borrow_mut();
        inner.repeats.retain(|entry| !entry.cancelled.get());

        let repeat_index = inner
            .repeats
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.next_due_ms <= target_ms)
            .min_by_key(|(_, entry)| (entry.next_due_ms, entry.seq))
            .map(|(index, _)| index);
        let one_shot_index = inner
            .one_shots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due_ms <= target_ms)
            .min_by_key(|(_, entry)| (entry.due_ms, entry.seq))
            .map(|(index, _)| index);

        let take_repeat = match (repeat_index, one_shot_index) {
            (None, None) => return None,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(r), Some(o)) => {
                let repeat = &inner.repeats[r];
                let one_shot = &inner.one_shots[o];
                (repeat.next_due_ms, repeat.seq) <= (one_shot.due_ms, one_shot.seq)
            }
        };

        if take_repeat {
            let index = repeat_index?;
            let due = inner.repeats[index].next_due_ms;
            inner.now_ms = due;
            let entry = &mut inner.repeats[index];
            entry.next_due_ms = due + entry.period_ms.max(1);
            Some(DueTask::Repeat(entry.tick.clone()))
        } else {
            let index = one_shot_index?;
            inner.now_ms = inner.one_shots[index].due_ms;
            let entry = inner.one_shots.remove(index);
            Some(DueTask::OneShot(entry.task))
        }
    }
}

impl Scheduler for ManualScheduler {
    fn repeat(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> RepeatGuard {
        let cancelled = Rc::new(Cell::new(false));
        {
            let mut inner = self.inner.borrow_mut();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            let next_due_ms = inner.now_ms + u64::from(period_ms);
            inner.repeats.push(RepeatEntry {
                seq,
                period_ms: u64::from(period_ms),
                next_due_ms,
                tick: Rc::new(RefCell::new(tick)),
                cancelled: cancelled.clone(),
            });
        }
        RepeatGuard::new(Box::new(move || cancelled.set(true)))
    }

    fn once(&self, delay_ms: u32, task: Box<dyn FnOnce()>) {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due_ms = inner.now_ms + u64::from(delay_ms);
        inner.one_shots.push(OneShotEntry { seq, due_ms, task });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn repeat_fires_every_period_until_guard_drops() {
        let scheduler = ManualScheduler::default();
        let count = Rc::new(Cell::new(0u32));
        let seen = count.clone();
        let guard = scheduler.repeat(500, Box::new(move || seen.set(seen.get() + 1)));

        scheduler.advance_ms(1_600);
        assert_eq!(count.get(), 3);

        drop(guard);
        scheduler.advance_ms(2_000);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let scheduler = ManualScheduler::default();
        let fired = Rc::new(Cell::new(false));
        let seen = fired.clone();
        scheduler.once(10_000, Box::new(move || seen.set(true)));

        scheduler.advance_ms(9_999);
        assert!(!fired.get());
        scheduler.advance_ms(1);
        assert!(fired.get());
    }

    #[test]
    fn tasks_may_schedule_further_timers_while_firing() {
        let scheduler = ManualScheduler::default();
        let fired = Rc::new(Cell::new(0u32));
        let inner_fired = fired.clone();
        let chained = scheduler.clone();
        scheduler.once(
            100,
            Box::new(move || {
                inner_fired.set(inner_fired.get() + 1);
                let inner_fired = inner_fired.clone();
                chained.once(100, Box::new(move || inner_fired.set(inner_fired.get() + 1)));
            }),
        );

        scheduler.advance_ms(200);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn timers_fire_in_due_order_across_kinds() {
        let scheduler = ManualScheduler::default();
        let order = Rc::new(RefCell::new(Vec::new()));
        let a = order.clone();
        let b = order.clone();
        let _guard = scheduler.repeat(300, Box::new(move || a.borrow_mut().push("tick")));
        scheduler.once(450, Box::new(move || b.borrow_mut().push("once")));

        scheduler.advance_ms(700);
        assert_eq!(*order.borrow(), vec!["tick", "once", "tick"]);
    }
}
