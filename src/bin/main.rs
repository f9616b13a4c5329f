// tick-sched demo
//
// Two periodic tasks and one self-rearming software timer on a 200ms
// base tick, run for 6 seconds against the host clock:
//   task 1 (200ms)  prints a counter, stops itself after 7 runs
//   task 2 (1000ms) prints a counter, stops itself after 6 runs
//   timer (800ms)   prints a counter and restarts itself on expiry
//
// RUST_LOG=debug shows registration and control traffic,
// RUST_LOG=trace every tick.

use std::process::ExitCode;

use log::{error, info, warn};

use tick_sched::{Config, Control, Error, Scheduler, StdClock};

const BASE_TICK_MS: u32 = 200;
const RUN_DURATION_MS: u64 = 6000;

const PERIOD_FAST_MS: u32 = 200;
const PERIOD_SLOW_MS: u32 = 1000;
const TIMER_TIMEOUT_MS: u32 = 800;

const FAST_RUNS: u32 = 7;
const SLOW_RUNS: u32 = 6;

// prints `runs` counter lines, then stops the task on the next dispatch
fn limited(label: &'static str, runs: u32) -> impl FnMut(&mut Control<'_>) {
    let mut count = 0;
    move |ctl: &mut Control<'_>| {
        if count == runs {
            if let Some(me) = ctl.current_task() {
                if let Err(err) = ctl.stop_task(me) {
                    warn!("{}: {}", me, err);
                }
            }
        } else {
            println!("This is a counter from task {}: {}", label, count);
            count += 1;
        }
    }
}

fn setup() -> Result<Scheduler, Error> {
    let config = Config::new()
        .with_task_capacity(2)
        .with_timer_capacity(1)
        .with_base_tick_ms(BASE_TICK_MS)
        .with_run_duration_ms(RUN_DURATION_MS);
    let mut sched = Scheduler::new(config)?;

    sched.register_task_with_init(
        || info!("init 200ms task"),
        limited("200ms", FAST_RUNS),
        PERIOD_FAST_MS,
    )?;
    sched.register_task_with_init(
        || info!("init 1000ms task"),
        limited("1000ms", SLOW_RUNS),
        PERIOD_SLOW_MS,
    )?;

    let mut fired = 0;
    let timer = sched.register_timer_with_callback(TIMER_TIMEOUT_MS, move |ctl| {
        println!("This is a counter from timer callback: {}", fired);
        fired += 1;
        if let Some(me) = ctl.current_timer() {
            if let Err(err) = ctl.start_timer(me) {
                warn!("{}: {}", me, err);
            }
        }
    })?;
    sched.start_timer(timer)?;

    Ok(sched)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut sched = match setup() {
        Ok(sched) => sched,
        Err(err) => {
            error!("setup failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let stats = sched.run(&StdClock::new());
    info!(
        "{} ticks, {} task runs, {} timer expiries",
        stats.ticks, stats.task_runs, stats.timer_expiries
    );
    ExitCode::SUCCESS
}
