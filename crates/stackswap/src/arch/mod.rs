//! Per-architecture switch engines.
//!
//! Exactly one variant is compiled into a build and exposed as [`Native`]. Each variant module documents its saved
//! frame word by word; that order is shared by `transfer` and the initializer and is not meant to be portable across
//! variants or builds.

use crate::Context;

#[cfg(all(target_arch = "aarch64", not(windows)))]
mod aarch64;
#[cfg(all(
	target_arch = "arm",
	any(
		target_feature = "vfp2",
		target_feature = "vfp3",
		target_feature = "vfp4",
		target_feature = "neon"
	)
))]
mod arm;
#[cfg(all(target_arch = "riscv64", target_feature = "d"))]
mod riscv64;
#[cfg(target_arch = "x86")]
mod x86;
#[cfg(target_arch = "x86_64")]
mod x86_64;

#[cfg(all(target_arch = "aarch64", not(windows)))]
pub use self::aarch64::Aapcs64 as Native;
#[cfg(all(
	target_arch = "arm",
	any(
		target_feature = "vfp2",
		target_feature = "vfp3",
		target_feature = "vfp4",
		target_feature = "neon"
	)
))]
pub use self::arm::Aapcs as Native;
#[cfg(all(target_arch = "riscv64", target_feature = "d"))]
pub use self::riscv64::Lp64d as Native;
#[cfg(target_arch = "x86")]
pub use self::x86::Cdecl as Native;
#[cfg(all(target_arch = "x86_64", not(windows)))]
pub use self::x86_64::SysV as Native;
#[cfg(all(target_arch = "x86_64", windows))]
pub use self::x86_64::Win64 as Native;

// Raw save/restore routines, for tests that drive registers from inline assembly.
#[cfg(all(test, target_arch = "aarch64", not(windows)))]
pub(crate) use self::aarch64::switch;
#[cfg(all(test, target_arch = "riscv64", target_feature = "d"))]
pub(crate) use self::riscv64::switch;
#[cfg(all(test, target_arch = "x86_64", not(windows)))]
pub(crate) use self::x86_64::switch;

#[cfg(not(any(
	all(target_arch = "aarch64", not(windows)),
	all(
		target_arch = "arm",
		any(
			target_feature = "vfp2",
			target_feature = "vfp3",
			target_feature = "vfp4",
			target_feature = "neon"
		)
	),
	all(target_arch = "riscv64", target_feature = "d"),
	target_arch = "x86",
	target_arch = "x86_64",
)))]
compile_error!("stackswap has no switch engine for this target");

/// Stack pointer alignment every variant lays fresh frames out against.
pub const STACK_ALIGN: usize = 16;

/// A save/restore routine and the frame layout it agrees on.
///
/// Slot indices count machine words upward from the saved stack pointer.
pub trait Engine {
	/// Words in one saved frame, the resume address included.
	const FRAME_WORDS: usize;
	/// Slot the restore step resumes execution at.
	const RESUME_SLOT: usize;
	/// Callee-saved slot the startup stub calls through.
	const ENTRY_SLOT: usize;
	/// Callee-saved slot the startup stub passes as the first argument.
	const ARG_SLOT: usize;

	/// First-resume stub for the register strategy: calls `ENTRY_SLOT` with `ARG_SLOT`.
	fn startup() -> usize;

	/// First-resume stub for the rendezvous strategy: calls the hand-off trampoline.
	fn rendezvous() -> usize;

	/// Fills platform-owned slots of a zeroed frame for a stack spanning `bottom..top`.
	fn seed(_frame: &mut [usize], _bottom: usize, _top: usize) {}

	/// Saves the running register set on the current stack, stores the stack pointer in `from`, and resumes `to`.
	///
	/// # Safety
	/// `to` must hold a frame produced by this engine: either a fresh one from the initializer or one saved by an
	/// earlier transfer away from it. Nothing else may be running on it.
	unsafe fn transfer(from: *mut Context, to: *const Context);
}
