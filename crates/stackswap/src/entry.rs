//! How a fresh context gets from its first resume into the entry procedure.

use std::{cell::Cell, process};

use tracing::error;

use crate::{transfer, Context, Entry};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
	/// Entry procedure and argument are staged in callee-saved slots of the fresh frame, and a startup stub calls
	/// them once those slots are restored.
	Register,
	/// The fresh frame resumes into a trampoline that picks both up from a hand-off left by the initializer, then
	/// transfers straight back so the initializer can return.
	Rendezvous,
}

/// Strategy [`initialize`](crate::initialize) uses in this build.
#[cfg(not(feature = "rendezvous"))]
pub const STRATEGY: Strategy = Strategy::Register;
/// Strategy [`initialize`](crate::initialize) uses in this build.
#[cfg(feature = "rendezvous")]
pub const STRATEGY: Strategy = Strategy::Rendezvous;

#[derive(Copy, Clone)]
struct Handoff {
	entry: Entry,
	arg: *mut u8,
	fresh: *mut Context,
	creator: *mut Context,
}

thread_local! {
	static HANDOFF: Cell<Option<Handoff>> = const { Cell::new(None) };
}

/// Publishes one hand-off for the duration of one initialization.
struct Scope;

impl Scope {
	fn open(handoff: Handoff) -> Self {
		HANDOFF.set(Some(handoff));
		Scope
	}
}

impl Drop for Scope {
	fn drop(&mut self) { HANDOFF.set(None); }
}

/// Runs `fresh` into its trampoline and back, leaving it suspended right before its entry procedure.
pub(crate) unsafe fn rendezvous(fresh: *mut Context, entry: Entry, arg: *mut u8) {
	let mut creator = Context::empty();
	let creator = &raw mut creator;
	let _scope = Scope::open(Handoff {
		entry,
		arg,
		fresh,
		creator,
	});
	transfer(creator, fresh);
}

pub(crate) extern "C" fn trampoline() -> ! {
	let Some(Handoff {
		entry,
		arg,
		fresh,
		creator,
	}) = HANDOFF.take()
	else {
		error!("rendezvous trampoline entered without a pending hand-off");
		process::abort()
	};

	unsafe {
		transfer(fresh, creator);
		entry(arg);
	}
	returned()
}

pub(crate) extern "C" fn returned() -> ! {
	error!("context entry procedure returned");
	process::abort()
}

#[cfg(test)]
pub(crate) fn handoff_pending() -> bool {
	let handoff = HANDOFF.take();
	let pending = handoff.is_some();
	HANDOFF.set(handoff);
	pending
}
