use std::sync::Mutex;

use log::LevelFilter;

/// Number of live guards and the level to restore once the last one drops.
static QUIET: Mutex<(usize, LevelFilter)> = Mutex::new((0, LevelFilter::Off));

/// Scoped suppression of all `log` output.
///
/// While at least one guard is alive the global max level is `Off`. Guards
/// may overlap across threads: the level seen before the first guard is
/// restored when the last guard drops, whatever order they drop in.
///
/// Restoration happens in `Drop`, so it also runs on early return, `?`
/// propagation and unwinding.
#[must_use = "logging is restored as soon as the guard is dropped"]
pub struct QuietGuard {
	_private: (),
}

impl QuietGuard {
	pub fn acquire() -> Self {
		let mut state = QUIET.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		if state.0 == 0 {
			state.1 = log::max_level();
			log::set_max_level(LevelFilter::Off);
		}
		state.0 += 1;
		Self { _private: () }
	}
}

impl Drop for QuietGuard {
	fn drop(&mut self) {
		let mut state = QUIET.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		state.0 -= 1;
		if state.0 == 0 {
			log::set_max_level(state.1);
		}
	}
}
