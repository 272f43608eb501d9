use std::{fmt, ptr, slice};

use static_assertions::const_assert_eq;
use tracing::trace;

use crate::{
	arch::{Engine, Native, STACK_ALIGN},
	entry::{self, Strategy, STRATEGY},
};

/// Procedure a fresh context starts in, called with the argument given at initialization.
///
/// It must never return; a context that is done transfers away for good. Returning aborts the process.
pub type Entry = unsafe extern "C" fn(*mut u8);

/// A suspended execution context: the stack pointer its saved frame sits at.
///
/// Owns nothing. The stack memory behind it belongs to the caller and has to outlive every transfer into the
/// context. While the context is running the stored pointer is stale.
#[repr(C)]
pub struct Context {
	sp: *mut usize,
}

const_assert_eq!(std::mem::size_of::<Context>(), std::mem::size_of::<usize>());

unsafe impl Send for Context {}

impl Context {
	/// An inert context, valid only as the `from` side of a transfer.
	///
	/// Transferring away from it captures the running thread's own state into it, after which it can be
	/// transferred back into like any other context.
	pub const fn empty() -> Self { Self { sp: ptr::null_mut() } }

	/// Builds a context over `stack..stack + size` that starts in `entry(arg)` on first resume.
	///
	/// # Safety
	/// See [`initialize`].
	pub unsafe fn new(entry: Entry, arg: *mut u8, stack: *mut u8, size: usize) -> Self {
		let mut this = Self::empty();
		initialize(&mut this, Some(entry), arg, stack, size);
		this
	}

	#[cfg(test)]
	pub(crate) fn is_empty(&self) -> bool { self.sp.is_null() }

	#[cfg(test)]
	pub(crate) fn stack_pointer(&self) -> *const usize { self.sp }
}

impl Default for Context {
	fn default() -> Self { Self::empty() }
}

impl fmt::Debug for Context {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.debug_tuple("Context").field(&self.sp).finish() }
}

/// Lays out a fresh saved frame at the high end of `stack..stack + size` and points `ctx` at it.
///
/// With `entry` set to `None` the context becomes inert instead, see [`Context::empty`]; the other arguments are
/// then expected to be null and zero.
///
/// # Safety
/// The stack region must be unused, writable, large enough for the frame plus everything the entry procedure will
/// need, and must outlive the context. `ctx` must be valid for writes. Not reentrant: with the rendezvous strategy
/// this briefly runs the new context on its own stack before returning.
pub unsafe fn initialize(ctx: *mut Context, entry: Option<Entry>, arg: *mut u8, stack: *mut u8, size: usize) {
	initialize_with(STRATEGY, ctx, entry, arg, stack, size)
}

pub(crate) unsafe fn initialize_with(
	strategy: Strategy, ctx: *mut Context, entry: Option<Entry>, arg: *mut u8, stack: *mut u8, size: usize,
) {
	let Some(entry) = entry else {
		(*ctx).sp = ptr::null_mut();
		return;
	};

	let top = stack.add(size).map_addr(|addr| addr & !(STACK_ALIGN - 1));
	let frame = top.cast::<usize>().sub(Native::FRAME_WORDS);
	frame.write_bytes(0, Native::FRAME_WORDS);
	let slots = slice::from_raw_parts_mut(frame, Native::FRAME_WORDS);
	Native::seed(slots, stack.addr(), top.addr());
	trace!("initializing context over {:p}..{:p} ({:?})", stack, top, strategy);

	match strategy {
		Strategy::Register => {
			slots[Native::RESUME_SLOT] = Native::startup();
			slots[Native::ENTRY_SLOT] = entry as usize;
			slots[Native::ARG_SLOT] = arg.addr();
			(*ctx).sp = frame;
		},
		Strategy::Rendezvous => {
			slots[Native::RESUME_SLOT] = Native::rendezvous();
			(*ctx).sp = frame;
			entry::rendezvous(ctx, entry, arg);
		},
	}
}

/// Suspends the running context into `from` and resumes `to` where it last suspended, or at its entry procedure
/// if it has never run.
///
/// Returns once some context transfers back into `from`.
///
/// # Safety
/// `from` must describe the context running right now (or be inert) and `to` a suspended one that was initialized
/// or saved by an earlier transfer, with its stack memory still alive. Nothing is checked.
#[inline(always)]
pub unsafe fn transfer(from: *mut Context, to: *const Context) { Native::transfer(from, to) }

/// Does nothing: a context owns no resources. Kept so callers can treat this backend like ones that need teardown.
#[inline(always)]
pub fn destroy(_ctx: &mut Context) {}
