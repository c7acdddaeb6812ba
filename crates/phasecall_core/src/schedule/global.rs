//! # Installed Scheduler
//!
//! One scheduler per frame-loop thread, reachable from anywhere on that
//! thread without threading a handle through every call.
//!
//! ```rust,ignore
//! global::install(Scheduler::new(config, driver)?)?;
//!
//! // Deep inside gameplay code:
//! global::with(|scheduler| scheduler.on_update(&receiver));
//!
//! // Session end:
//! global::teardown();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::schedule::hooks::FrameDriver;
use crate::schedule::registry::Scheduler;

thread_local! {
    static INSTALLED: RefCell<Option<Scheduler>> = const { RefCell::new(None) };
}

/// Makes `scheduler` the installed instance for this thread.
///
/// # Errors
///
/// Returns [`SchedulerError::AlreadyInstalled`] if one is already installed.
pub fn install(scheduler: Scheduler) -> SchedulerResult<()> {
    INSTALLED.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(SchedulerError::AlreadyInstalled);
        }
        *slot = Some(scheduler);
        tracing::debug!("scheduler installed");
        Ok(())
    })
}

/// Builds a scheduler and installs it, returning a handle to it.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidConfig`] if `config` does not validate
/// and [`SchedulerError::AlreadyInstalled`] if one is already installed.
pub fn install_new(
    config: SchedulerConfig,
    driver: Rc<dyn FrameDriver>,
) -> SchedulerResult<Scheduler> {
    config.validate()?;
    if is_installed() {
        return Err(SchedulerError::AlreadyInstalled);
    }
    let scheduler = Scheduler::new(config, driver)?;
    install(scheduler.clone())?;
    Ok(scheduler)
}

/// Returns true if a scheduler is installed on this thread.
#[must_use]
pub fn is_installed() -> bool {
    INSTALLED.with(|slot| slot.borrow().is_some())
}

/// Handle to the installed scheduler, if any.
#[must_use]
pub fn current() -> Option<Scheduler> {
    INSTALLED.with(|slot| slot.borrow().clone())
}

/// Runs `f` against the installed scheduler.
///
/// The slot is not borrowed while `f` runs, so `f` may itself call back
/// into this module (including [`teardown`]).
pub fn with<R>(f: impl FnOnce(&Scheduler) -> R) -> Option<R> {
    let scheduler = current()?;
    Some(f(&scheduler))
}

/// Clears the installed scheduler's registrations and uninstalls it.
///
/// Returns the handle that was installed.
pub fn teardown() -> Option<Scheduler> {
    let scheduler = INSTALLED.with(|slot| slot.borrow_mut().take())?;
    scheduler.clear();
    tracing::debug!("scheduler torn down");
    Some(scheduler)
}
