//! RISC-V LP64D.

use std::arch::naked_asm;

use crate::{arch::Engine, entry, Context};

/// LP64D, the hard double-float ABI.
///
/// | slot | contents |
/// |------|----------|
/// | 0 | ra, resume address |
/// | 1 | s0, frame pointer |
/// | 2 | s1 (startup entry) |
/// | 3 | s2 (startup argument) |
/// | 4..13 | s3 through s11 |
/// | 13..25 | fs0 through fs11 |
/// | 25 | padding to keep sp 16-byte aligned |
pub struct Lp64d;

impl Engine for Lp64d {
	const FRAME_WORDS: usize = 26;
	const RESUME_SLOT: usize = 0;
	const ENTRY_SLOT: usize = 2;
	const ARG_SLOT: usize = 3;

	fn startup() -> usize { startup as *const () as usize }

	fn rendezvous() -> usize { rendezvous as *const () as usize }

	#[inline(always)]
	unsafe fn transfer(from: *mut Context, to: *const Context) { switch(from, to) }
}

#[unsafe(naked)]
pub unsafe extern "C" fn switch(_from: *mut Context, _to: *const Context) {
	naked_asm!(
		"addi sp, sp, -208",
		"sd ra, 0(sp)",
		"sd s0, 8(sp)",
		"sd s1, 16(sp)",
		"sd s2, 24(sp)",
		"sd s3, 32(sp)",
		"sd s4, 40(sp)",
		"sd s5, 48(sp)",
		"sd s6, 56(sp)",
		"sd s7, 64(sp)",
		"sd s8, 72(sp)",
		"sd s9, 80(sp)",
		"sd s10, 88(sp)",
		"sd s11, 96(sp)",
		"fsd fs0, 104(sp)",
		"fsd fs1, 112(sp)",
		"fsd fs2, 120(sp)",
		"fsd fs3, 128(sp)",
		"fsd fs4, 136(sp)",
		"fsd fs5, 144(sp)",
		"fsd fs6, 152(sp)",
		"fsd fs7, 160(sp)",
		"fsd fs8, 168(sp)",
		"fsd fs9, 176(sp)",
		"fsd fs10, 184(sp)",
		"fsd fs11, 192(sp)",
		"sd sp, 0(a0)",
		"ld sp, 0(a1)",
		"ld ra, 0(sp)",
		"ld s0, 8(sp)",
		"ld s1, 16(sp)",
		"ld s2, 24(sp)",
		"ld s3, 32(sp)",
		"ld s4, 40(sp)",
		"ld s5, 48(sp)",
		"ld s6, 56(sp)",
		"ld s7, 64(sp)",
		"ld s8, 72(sp)",
		"ld s9, 80(sp)",
		"ld s10, 88(sp)",
		"ld s11, 96(sp)",
		"fld fs0, 104(sp)",
		"fld fs1, 112(sp)",
		"fld fs2, 120(sp)",
		"fld fs3, 128(sp)",
		"fld fs4, 136(sp)",
		"fld fs5, 144(sp)",
		"fld fs6, 152(sp)",
		"fld fs7, 160(sp)",
		"fld fs8, 168(sp)",
		"fld fs9, 176(sp)",
		"fld fs10, 184(sp)",
		"fld fs11, 192(sp)",
		"addi sp, sp, 208",
		"ret",
	);
}

#[unsafe(naked)]
unsafe extern "C" fn startup() {
	naked_asm!(
		"mv a0, s2",
		"jalr s1",
		"call {returned}",
		"unimp",
		returned = sym entry::returned,
	);
}

#[unsafe(naked)]
unsafe extern "C" fn rendezvous() {
	naked_asm!("call {trampoline}", "unimp", trampoline = sym entry::trampoline);
}
