// Tick-driven cooperative scheduler with software timers
//
// One thread, no preemption. Each base tick runs every due task in
// registration order, each to completion, then counts down every
// running timer and fires the ones that reach zero. A slow tick
// function stalls everything behind it; nothing is timed out.
//
// `run` finds tick boundaries by polling a Clock and returns after the
// configured run duration. `tick` does one dispatch pass on its own.

use alloc::boxed::Box;

use log::{debug, info, trace, warn};

use super::clock::Clock;
use super::config::Config;
use super::control::{Control, Running};
use super::error::Error;
use super::handle::{TaskId, TimerId};
use super::tasks::TaskTable;
use super::timers::TimerTable;

/// Counters accumulated across every dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub ticks: u64,
    pub task_runs: u64,
    pub timer_expiries: u64,
}

pub struct Scheduler {
    config: Config,
    tasks: TaskTable,
    timers: TimerTable,
    stats: Stats,
}

impl Scheduler {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;
        debug!(
            "scheduler: {} tasks, {} timers, {}ms tick, {}ms run",
            config.task_capacity, config.timer_capacity, config.base_tick_ms, config.run_duration_ms
        );
        Ok(Self {
            tasks: TaskTable::new(config.task_capacity, config.base_tick_ms)?,
            timers: TimerTable::new(config.timer_capacity, config.base_tick_ms)?,
            config,
            stats: Stats::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn tasks(&self) -> &TaskTable {
        &self.tasks
    }

    pub fn timers(&self) -> &TimerTable {
        &self.timers
    }

    fn control(&mut self) -> Control<'_> {
        Control::new(&mut self.tasks, &mut self.timers, None)
    }

    // -- tasks --

    /// Registers a periodic task. The period must be a non-zero
    /// multiple of the base tick. The task is due on the first tick.
    pub fn register_task<F>(&mut self, tick: F, period_ms: u32) -> Result<TaskId, Error>
    where
        F: FnMut(&mut Control<'_>) + 'static,
    {
        self.tasks.register(None, Box::new(tick), period_ms)
    }

    /// Like [`register_task`](Self::register_task), with a hook that
    /// runs once when `run` starts, before the first tick.
    pub fn register_task_with_init<I, F>(
        &mut self,
        init: I,
        tick: F,
        period_ms: u32,
    ) -> Result<TaskId, Error>
    where
        I: FnOnce() + 'static,
        F: FnMut(&mut Control<'_>) + 'static,
    {
        self.tasks
            .register(Some(Box::new(init)), Box::new(tick), period_ms)
    }

    pub fn stop_task(&mut self, id: TaskId) -> Result<(), Error> {
        self.control().stop_task(id)
    }

    pub fn start_task(&mut self, id: TaskId) -> Result<(), Error> {
        self.control().start_task(id)
    }

    pub fn set_task_period(&mut self, id: TaskId, period_ms: u32) -> Result<(), Error> {
        self.control().set_task_period(id, period_ms)
    }

    // -- timers --

    /// Registers a stopped timer. The timeout must be a multiple of the
    /// base tick and strictly larger than it.
    pub fn register_timer(&mut self, timeout_ms: u32) -> Result<TimerId, Error> {
        self.timers.register(timeout_ms, None)
    }

    /// Registers a stopped timer whose callback runs each time it stops.
    pub fn register_timer_with_callback<F>(
        &mut self,
        timeout_ms: u32,
        callback: F,
    ) -> Result<TimerId, Error>
    where
        F: FnMut(&mut Control<'_>) + 'static,
    {
        self.timers.register(timeout_ms, Some(Box::new(callback)))
    }

    pub fn start_timer(&mut self, id: TimerId) -> Result<(), Error> {
        self.control().start_timer(id)
    }

    pub fn stop_timer(&mut self, id: TimerId) -> Result<(), Error> {
        self.control().stop_timer(id)
    }

    pub fn reload_timer(&mut self, id: TimerId, timeout_ms: u32) -> Result<(), Error> {
        self.control().reload_timer(id, timeout_ms)
    }

    pub fn timer_remaining_ms(&self, id: TimerId) -> Result<u32, Error> {
        self.timers.remaining_ms(id)
    }

    // -- dispatch --

    /// One base tick: dispatch due tasks, then count down timers.
    pub fn tick(&mut self) {
        self.stats.ticks += 1;
        trace!("tick {}", self.stats.ticks);

        for index in 0..self.tasks.len() {
            if let Some(mut tick_fn) = self.tasks.take_due(index) {
                let id = TaskId::from_index(index);
                let mut ctl = Control::new(
                    &mut self.tasks,
                    &mut self.timers,
                    Some(Running::Task(id)),
                );
                tick_fn(&mut ctl);
                self.tasks.finish_dispatch(index, tick_fn);
                self.stats.task_runs += 1;
            }
            self.tasks.advance(index);
        }

        for index in 0..self.timers.len() {
            if self.timers.count_down(index) {
                let id = TimerId::from_index(index);
                debug!("{} expired", id);
                self.stats.timer_expiries += 1;
                if let Err(err) = self.stop_timer(id) {
                    warn!("{}: {}", id, err);
                }
            }
        }
    }

    /// Runs pending init hooks, then dispatches one tick per elapsed
    /// base-tick interval until the configured run duration is used up.
    ///
    /// The gap between ticks is spent polling `clock` using the
    /// configured [`TickWait`](super::wake::TickWait).
    pub fn run<C>(&mut self, clock: &C) -> Stats
    where
        C: Clock + ?Sized,
    {
        let base = self.config.base_tick_ms as u64;
        let target = self.config.run_ticks();
        info!(
            "running {} tasks, {} timers for {} ticks",
            self.tasks.len(),
            self.timers.len(),
            target
        );

        self.tasks.run_init_hooks();

        let mut last = clock.now_ms();
        let mut done: u64 = 0;
        while done < target {
            let now = clock.now_ms();
            if now.saturating_sub(last) >= base {
                self.tick();
                last = clock.now_ms();
                done += 1;
            } else {
                self.config.wait.pause();
            }
        }

        info!(
            "run finished: {} task runs, {} timer expiries",
            self.stats.task_runs, self.stats.timer_expiries
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::clock::SimClock;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    fn sched(tick: u32, run: u64) -> Scheduler {
        Scheduler::new(
            Config::new()
                .with_task_capacity(4)
                .with_timer_capacity(4)
                .with_base_tick_ms(tick)
                .with_run_duration_ms(run),
        )
        .unwrap()
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(&mut Control<'_>) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move |_: &mut Control<'_>| c.set(c.get() + 1))
    }

    #[test]
    fn rejects_zero_tick() {
        let cfg = Config::new().with_base_tick_ms(0);
        assert!(matches!(Scheduler::new(cfg), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn oversized_tables_are_config_errors() {
        let cfg = Config::new().with_task_capacity(usize::MAX);
        assert!(matches!(
            Scheduler::new(cfg),
            Err(Error::InvalidConfig("task capacity too large"))
        ));
        let cfg = Config::new().with_timer_capacity(usize::MAX);
        assert!(matches!(
            Scheduler::new(cfg),
            Err(Error::InvalidConfig("timer capacity too large"))
        ));
    }

    #[test]
    fn tasks_dispatch_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut s = sched(100, 1000);
        for n in 1..=3u32 {
            let o = order.clone();
            s.register_task(move |_| o.borrow_mut().push(n), 100).unwrap();
        }
        s.tick();
        assert_eq!(*order.borrow(), [1, 2, 3]);
    }

    #[test]
    fn elapsed_is_one_tick_after_dispatch() {
        let mut s = sched(200, 1000);
        let (_, f) = counter();
        let task = s.register_task(f, 600).unwrap();
        s.tick();
        assert_eq!(s.tasks().elapsed_ms(task), Ok(200));
    }

    #[test]
    fn stopped_task_still_accumulates() {
        let mut s = sched(200, 1000);
        let (count, f) = counter();
        let task = s.register_task(f, 400).unwrap();
        s.stop_task(task).unwrap();
        s.tick();
        s.tick();
        assert_eq!(count.get(), 0);
        assert_eq!(s.tasks().elapsed_ms(task), Ok(800));
        s.start_task(task).unwrap();
        s.tick();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn task_can_stop_itself() {
        let mut s = sched(100, 1000);
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        s.register_task(
            move |ctl| {
                r.set(r.get() + 1);
                if r.get() == 2 {
                    let me = ctl.current_task().unwrap();
                    ctl.stop_task(me).unwrap();
                }
            },
            100,
        )
        .unwrap();
        for _ in 0..5 {
            s.tick();
        }
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn timer_fires_after_countdown_then_stops() {
        let mut s = sched(200, 1000);
        let (fired, f) = counter();
        let timer = s.register_timer_with_callback(800, f).unwrap();
        s.start_timer(timer).unwrap();
        for _ in 0..3 {
            s.tick();
        }
        assert_eq!(fired.get(), 0);
        s.tick();
        assert_eq!(fired.get(), 1);
        assert_eq!(s.timers().is_active(timer), Ok(false));
        s.tick();
        assert_eq!(fired.get(), 1);
        assert_eq!(s.stats().timer_expiries, 1);
    }

    #[test]
    fn callback_can_rearm_its_timer() {
        let mut s = sched(200, 1000);
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        let timer = s
            .register_timer_with_callback(400, move |ctl| {
                f.set(f.get() + 1);
                let me = ctl.current_timer().unwrap();
                ctl.start_timer(me).unwrap();
            })
            .unwrap();
        s.start_timer(timer).unwrap();
        for _ in 0..6 {
            s.tick();
        }
        assert_eq!(fired.get(), 3);
        assert_eq!(s.timers().is_active(timer), Ok(true));
    }

    #[test]
    fn callback_stopping_itself_does_not_recurse() {
        let mut s = sched(200, 1000);
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        let timer = s
            .register_timer_with_callback(400, move |ctl| {
                f.set(f.get() + 1);
                let me = ctl.current_timer().unwrap();
                ctl.stop_timer(me).unwrap();
            })
            .unwrap();
        s.stop_timer(timer).unwrap();
        assert_eq!(fired.get(), 1);
        s.stop_timer(timer).unwrap();
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn run_calls_init_once_then_ticks() {
        let mut s = sched(200, 1000);
        let inits = Rc::new(Cell::new(0));
        let i = inits.clone();
        let (runs, f) = counter();
        s.register_task_with_init(move || i.set(i.get() + 1), f, 200)
            .unwrap();

        let stats = s.run(&SimClock::new(0, 200));
        assert_eq!(stats.ticks, 5);
        assert_eq!(runs.get(), 5);

        s.run(&SimClock::new(0, 200));
        assert_eq!(inits.get(), 1);
        assert_eq!(runs.get(), 10);
    }

    #[test]
    fn run_waits_for_full_tick() {
        let mut s = sched(200, 400);
        let (runs, f) = counter();
        s.register_task(f, 200).unwrap();
        let clock = SimClock::new(0, 50);
        s.run(&clock);
        assert_eq!(runs.get(), 2);
        assert!(clock.peek() >= 400);
    }

    #[test]
    fn task_can_change_its_own_period() {
        let mut s = sched(200, 1000);
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let task = s
            .register_task(
                move |ctl| {
                    r.set(r.get() + 1);
                    let me = ctl.current_task().unwrap();
                    ctl.set_task_period(me, 600).unwrap();
                    assert!(ctl.set_task_period(me, 500).is_err());
                },
                200,
            )
            .unwrap();
        // fires on ticks 1, 4 and 7
        for _ in 0..7 {
            s.tick();
        }
        assert_eq!(runs.get(), 3);
        assert_eq!(s.tasks().period_ms(task), Ok(600));
    }

    #[test]
    fn callback_can_reload_with_new_timeout() {
        let mut s = sched(200, 1000);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let v = seen.clone();
        let timer = s
            .register_timer_with_callback(400, move |ctl| {
                let me = ctl.current_timer().unwrap();
                ctl.reload_timer(me, 600).unwrap();
                v.borrow_mut().push(ctl.timer_remaining_ms(me).unwrap());
            })
            .unwrap();
        s.start_timer(timer).unwrap();
        // 400ms first, then 600ms after each reload: ticks 2 and 5
        for _ in 0..5 {
            s.tick();
        }
        assert_eq!(*seen.borrow(), [600, 600]);
        assert_eq!(s.timers().timeout_ms(timer), Ok(600));
        assert_eq!(s.timers().is_active(timer), Ok(true));
        assert_eq!(s.stats().timer_expiries, 2);
    }

    #[test]
    fn task_reads_timer_remaining() {
        let mut s = sched(200, 1000);
        let timer = s.register_timer(800).unwrap();
        s.start_timer(timer).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let v = seen.clone();
        s.register_task(
            move |ctl| v.borrow_mut().push(ctl.timer_remaining_ms(timer).unwrap()),
            200,
        )
        .unwrap();
        for _ in 0..3 {
            s.tick();
        }
        // tasks run before the timer pass of the same tick
        assert_eq!(*seen.borrow(), [800, 600, 400]);
    }
}
