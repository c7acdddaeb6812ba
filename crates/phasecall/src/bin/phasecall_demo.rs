//! # Phasecall Demo
//!
//! Installs a scheduler on a reference frame loop, registers a handful of
//! receivers across every phase, runs a few frames and prints the order in
//! which everything ran.
//!
//! Usage: `phasecall_demo [config.toml]`

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use phasecall::core::{global, Receiver, ReceiverId, SchedulerResult};
use phasecall::{FrameBody, FrameLoop, PhasecallConfig};

type Log = Rc<RefCell<Vec<String>>>;

/// Host work the receivers are ordered around.
struct Host {
    log: Log,
}

impl FrameBody for Host {
    fn fixed_update(&mut self, _step: Duration) {
        self.log.borrow_mut().push("  [host] fixed_update".to_string());
    }

    fn update(&mut self, _delta: Duration) {
        self.log.borrow_mut().push("  [host] update".to_string());
    }

    fn late_update(&mut self, _delta: Duration) {
        self.log.borrow_mut().push("  [host] late_update".to_string());
    }
}

fn named(log: &Log, name: &'static str) -> Receiver {
    let log = Rc::clone(log);
    Receiver::new(move || log.borrow_mut().push(format!("  {name}")))
}

fn main() -> SchedulerResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => PhasecallConfig::from_path(path)?,
        None => PhasecallConfig::default(),
    };

    let mut frame_loop = FrameLoop::new(config.frame_loop.clone())?;
    let scheduler = global::install_new(config.scheduler.clone(), frame_loop.driver())?;
    let log = Log::default();

    let input = named(&log, "input (pre_update)");
    let camera = named(&log, "camera (late_update, 10)");
    let ui = named(&log, "ui (late_update, 0)");
    let physics = named(&log, "physics (fixed_update)");
    scheduler.on_pre_update(&input);
    scheduler.add_late_update_receiver(&camera, 10);
    scheduler.add_late_update_receiver(&ui, 0);
    scheduler.on_fixed_update(&physics);

    // Runs once, then unsubscribes itself from inside its own dispatch.
    let once_slot: Rc<RefCell<Option<ReceiverId>>> = Rc::default();
    let once = {
        let log = Rc::clone(&log);
        let slot = Rc::clone(&once_slot);
        Receiver::new(move || {
            log.borrow_mut().push("  once (update, 5)".to_string());
            if let Some(id) = *slot.borrow() {
                global::with(|scheduler| scheduler.remove_update_receiver(id, 5));
            }
        })
    };
    *once_slot.borrow_mut() = Some(once.id());
    scheduler.add_update_receiver(&once, 5);

    let mut host = Host {
        log: Rc::clone(&log),
    };
    for delta_ms in [20, 45, 5] {
        let stats = frame_loop.run_frame(&mut host, Duration::from_millis(delta_ms));
        println!(
            "frame {} (delta {}ms, {} fixed steps, {} hooks)",
            stats.frame, delta_ms, stats.fixed_steps, stats.hooks_fired
        );
        for line in log.borrow_mut().drain(..) {
            println!("{line}");
        }
    }

    let pool = scheduler.pool_stats();
    println!(
        "pool: {} allocated, {} reused, {} discarded",
        pool.allocated, pool.reused, pool.discarded
    );

    global::teardown();
    println!("active hooks after teardown: {}", frame_loop.hooks().active_count());
    Ok(())
}
