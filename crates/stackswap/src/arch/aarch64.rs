//! AArch64 procedure call standard. x18 is left alone since some platforms reserve it.

use std::arch::naked_asm;

use crate::{arch::Engine, entry, Context};

/// AAPCS64.
///
/// | slot | contents |
/// |------|----------|
/// | 0 | x19 (startup entry) |
/// | 1 | x20 (startup argument) |
/// | 2..10 | x21 through x28 |
/// | 10 | x29, frame pointer |
/// | 11 | x30, link register and resume address |
/// | 12..20 | d8 through d15 |
pub struct Aapcs64;

impl Engine for Aapcs64 {
	const FRAME_WORDS: usize = 20;
	const RESUME_SLOT: usize = 11;
	const ENTRY_SLOT: usize = 0;
	const ARG_SLOT: usize = 1;

	fn startup() -> usize { startup as *const () as usize }

	fn rendezvous() -> usize { rendezvous as *const () as usize }

	#[inline(always)]
	unsafe fn transfer(from: *mut Context, to: *const Context) { switch(from, to) }
}

#[unsafe(naked)]
pub unsafe extern "C" fn switch(_from: *mut Context, _to: *const Context) {
	naked_asm!(
		"sub sp, sp, #160",
		"stp x19, x20, [sp, #16 * 0]",
		"stp x21, x22, [sp, #16 * 1]",
		"stp x23, x24, [sp, #16 * 2]",
		"stp x25, x26, [sp, #16 * 3]",
		"stp x27, x28, [sp, #16 * 4]",
		"stp x29, x30, [sp, #16 * 5]",
		"stp d8, d9, [sp, #16 * 6]",
		"stp d10, d11, [sp, #16 * 7]",
		"stp d12, d13, [sp, #16 * 8]",
		"stp d14, d15, [sp, #16 * 9]",
		"mov x2, sp",
		"str x2, [x0]",
		"ldr x3, [x1]",
		"mov sp, x3",
		"ldp x19, x20, [sp, #16 * 0]",
		"ldp x21, x22, [sp, #16 * 1]",
		"ldp x23, x24, [sp, #16 * 2]",
		"ldp x25, x26, [sp, #16 * 3]",
		"ldp x27, x28, [sp, #16 * 4]",
		"ldp x29, x30, [sp, #16 * 5]",
		"ldp d8, d9, [sp, #16 * 6]",
		"ldp d10, d11, [sp, #16 * 7]",
		"ldp d12, d13, [sp, #16 * 8]",
		"ldp d14, d15, [sp, #16 * 9]",
		"add sp, sp, #160",
		"ret",
	);
}

// A zeroed frame record terminates frame-pointer walks at the bottom of a fresh context.
#[unsafe(naked)]
unsafe extern "C" fn startup() {
	naked_asm!(
		"stp xzr, xzr, [sp, #-16]!",
		"mov x29, sp",
		"mov x0, x20",
		"blr x19",
		"bl {returned}",
		"brk #1",
		returned = sym entry::returned,
	);
}

#[unsafe(naked)]
unsafe extern "C" fn rendezvous() {
	naked_asm!(
		"stp xzr, xzr, [sp, #-16]!",
		"mov x29, sp",
		"bl {trampoline}",
		"brk #1",
		trampoline = sym entry::trampoline,
	);
}
