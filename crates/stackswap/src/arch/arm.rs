//! 32-bit ARM procedure call standard with VFP registers.

use std::arch::naked_asm;

use crate::{arch::Engine, entry, Context};

/// AAPCS, hard or soft float as long as VFP is present.
///
/// | slot | contents |
/// |------|----------|
/// | 0 | r4 (startup entry) |
/// | 1 | r5 (startup argument) |
/// | 2..8 | r6 through r11 |
/// | 8 | lr, resume address |
/// | 9..25 | d8 through d15, two slots each |
pub struct Aapcs;

impl Engine for Aapcs {
	const FRAME_WORDS: usize = 25;
	const RESUME_SLOT: usize = 8;
	const ENTRY_SLOT: usize = 0;
	const ARG_SLOT: usize = 1;

	fn startup() -> usize { startup as *const () as usize }

	fn rendezvous() -> usize { rendezvous as *const () as usize }

	#[inline(always)]
	unsafe fn transfer(from: *mut Context, to: *const Context) { switch(from, to) }
}

#[unsafe(naked)]
unsafe extern "C" fn switch(_from: *mut Context, _to: *const Context) {
	naked_asm!(
		"vpush {{d8-d15}}",
		"push {{r4-r11, lr}}",
		"mov r2, sp",
		"str r2, [r0]",
		"ldr r3, [r1]",
		"mov sp, r3",
		"pop {{r4-r11, lr}}",
		"vpop {{d8-d15}}",
		"bx lr",
	);
}

#[unsafe(naked)]
unsafe extern "C" fn startup() {
	naked_asm!(
		"mov r0, r5",
		"blx r4",
		"bl {returned}",
		"udf #0",
		returned = sym entry::returned,
	);
}

#[unsafe(naked)]
unsafe extern "C" fn rendezvous() {
	naked_asm!("bl {trampoline}", "udf #0", trampoline = sym entry::trampoline);
}
