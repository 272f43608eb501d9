use std::fmt;

use tracing::debug;

use crate::{context, Context, Entry, Result, Stack};

/// A context bundled with the stack it runs on.
///
/// The thread's own fiber comes from [`Fiber::native`] and borrows the thread's stack. Dropping a fiber that is
/// suspended mid-procedure abandons it: nothing on its stack is unwound.
pub struct Fiber {
	context: Context,
	stack: Option<Stack>,
}

impl Fiber {
	/// Stands in for the calling thread until the first switch away from it.
	pub const fn native() -> Self {
		Self {
			context: Context::empty(),
			stack: None,
		}
	}

	/// A fiber on a fresh [`Stack::DEFAULT_SIZE`] stack that starts in `entry(arg)` on first resume.
	pub fn new(entry: Entry, arg: *mut u8) -> Result<Self> {
		Ok(Self::with_stack(Stack::new(Stack::DEFAULT_SIZE)?, entry, arg))
	}

	pub fn with_stack(stack: Stack, entry: Entry, arg: *mut u8) -> Self {
		debug!("creating fiber on {} byte stack at {:p}", stack.size(), stack.base());
		let mut context = Context::empty();
		unsafe {
			context::initialize(&mut context, Some(entry), arg, stack.base(), stack.size());
		}
		Self {
			context,
			stack: Some(stack),
		}
	}

	pub fn stack(&self) -> Option<&Stack> { self.stack.as_ref() }

	/// Suspends the running fiber into `from` and resumes `to`.
	///
	/// # Safety
	/// Same contract as [`transfer`](crate::transfer): `from` has to be the fiber that is running right now, and
	/// neither may move or drop while the other side can still switch back into it. The pointers may alias other
	/// live references to the fibers, as they usually do when a fiber switches out of itself.
	#[inline]
	pub unsafe fn switch(from: *mut Fiber, to: *const Fiber) {
		context::transfer(&raw mut (*from).context, &raw const (*to).context)
	}
}

impl Drop for Fiber {
	fn drop(&mut self) { context::destroy(&mut self.context); }
}

impl fmt::Debug for Fiber {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Fiber")
			.field("context", &self.context)
			.field("stack", &self.stack.as_ref().map(Stack::size))
			.finish()
	}
}
