use std::{alloc::Layout, ptr::NonNull};

use tracing::trace;

use crate::{Error, Result};

/// Page-aligned memory for a context to run on, unmapped on drop.
///
/// On unix the region is mapped directly and sits on top of one inaccessible guard page, so running off the bottom
/// faults instead of corrupting a neighbour. Elsewhere it comes from the global allocator without a guard.
pub struct Stack {
	base: NonNull<u8>,
	size: usize,
	guard: usize,
}

unsafe impl Send for Stack {}

impl Stack {
	pub const ALIGN: usize = 4096;
	pub const DEFAULT_SIZE: usize = 64 * 1024;
	pub const MIN_SIZE: usize = 16 * 1024;

	/// Maps at least `size` usable bytes, rounded up to whole pages.
	pub fn new(size: usize) -> Result<Self> {
		if size < Self::MIN_SIZE {
			return Err(Error::TooSmall {
				size,
				min: Self::MIN_SIZE,
			});
		}

		let layout = Layout::from_size_align(size, sys::page_size().max(Self::ALIGN))?.pad_to_align();
		let (base, guard) = sys::map(layout)?;
		trace!("mapped {} byte stack at {:p} with {} byte guard", layout.size(), base, guard);
		Ok(Self {
			base,
			size: layout.size(),
			guard,
		})
	}

	/// Lowest usable address of the region.
	pub fn base(&self) -> *mut u8 { self.base.as_ptr() }

	/// One past the highest address of the region, where a downward-growing stack starts.
	pub fn top(&self) -> *mut u8 { unsafe { self.base.as_ptr().add(self.size) } }

	pub fn size(&self) -> usize { self.size }

	/// Bytes of inaccessible memory directly below [`base`](Self::base), zero where none is mapped.
	pub fn guard(&self) -> usize { self.guard }
}

impl Drop for Stack {
	fn drop(&mut self) {
		trace!("unmapping {} byte stack at {:p}", self.size, self.base);
		unsafe { sys::unmap(self.base, self.size, self.guard) }
	}
}

#[cfg(unix)]
mod sys {
	use std::{alloc::Layout, ptr, ptr::NonNull};

	use crate::{Error, Result};

	pub fn page_size() -> usize { unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize } }

	/// Returns the usable base and the size of the guard mapped below it.
	pub fn map(layout: Layout) -> Result<(NonNull<u8>, usize)> {
		let guard = page_size();
		let len = layout.size() + guard;
		unsafe {
			let map = libc::mmap(
				ptr::null_mut(),
				len,
				libc::PROT_READ | libc::PROT_WRITE,
				libc::MAP_PRIVATE | libc::MAP_ANON,
				-1,
				0,
			);
			if map == libc::MAP_FAILED {
				return Err(Error::last_os("mmap"));
			}
			if libc::mprotect(map, guard, libc::PROT_NONE) != 0 {
				let err = Error::last_os("mprotect");
				libc::munmap(map, len);
				return Err(err);
			}
			Ok((NonNull::new_unchecked(map.cast::<u8>().add(guard)), guard))
		}
	}

	pub unsafe fn unmap(base: NonNull<u8>, size: usize, guard: usize) {
		libc::munmap(base.as_ptr().sub(guard).cast(), size + guard);
	}
}

#[cfg(not(unix))]
mod sys {
	use std::{
		alloc::{self, Layout},
		ptr::NonNull,
	};

	use crate::{Error, Result, Stack};

	pub fn page_size() -> usize { Stack::ALIGN }

	pub fn map(layout: Layout) -> Result<(NonNull<u8>, usize)> {
		let base = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(Error::OutOfMemory { size: layout.size() })?;
		Ok((base, 0))
	}

	pub unsafe fn unmap(base: NonNull<u8>, size: usize, _: usize) {
		alloc::dealloc(base.as_ptr(), Layout::from_size_align_unchecked(size, page_size()));
	}
}
