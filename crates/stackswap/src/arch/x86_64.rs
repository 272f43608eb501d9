//! x86_64: System V everywhere except Windows, which gets the Microsoft x64 convention and its TEB stack fields.

#[cfg(all(test, not(windows)))]
pub use self::sysv::switch;
#[cfg(not(windows))]
pub use self::sysv::SysV;
#[cfg(windows)]
pub use self::win64::Win64;

/// Default MXCSR (all exceptions masked, round to nearest) in the low dword, default x87 control word above it.
const FPCSR: usize = 0x1f80 | (0x037f << 32);

#[cfg(not(windows))]
mod sysv {
	use std::arch::naked_asm;

	use super::FPCSR;
	use crate::{arch::Engine, entry, Context};

	/// System V AMD64.
	///
	/// | slot | contents |
	/// |------|----------|
	/// | 0 | mxcsr (bits 0..32), x87 control word (bits 32..48) |
	/// | 1 | r15 |
	/// | 2 | r14 |
	/// | 3 | r13 (startup argument) |
	/// | 4 | r12 (startup entry) |
	/// | 5 | rbx |
	/// | 6 | rbp |
	/// | 7 | resume address |
	pub struct SysV;

	impl Engine for SysV {
		const FRAME_WORDS: usize = 8;
		const RESUME_SLOT: usize = 7;
		const ENTRY_SLOT: usize = 4;
		const ARG_SLOT: usize = 3;

		fn startup() -> usize { startup as *const () as usize }

		fn rendezvous() -> usize { rendezvous as *const () as usize }

		fn seed(frame: &mut [usize], _: usize, _: usize) { frame[0] = FPCSR; }

		#[inline(always)]
		unsafe fn transfer(from: *mut Context, to: *const Context) { switch(from, to) }
	}

	#[unsafe(naked)]
	pub unsafe extern "C" fn switch(_from: *mut Context, _to: *const Context) {
		naked_asm!(
			"push rbp",
			"push rbx",
			"push r12",
			"push r13",
			"push r14",
			"push r15",
			"sub rsp, 8",
			"stmxcsr dword ptr [rsp]",
			"fnstcw word ptr [rsp + 4]",
			"mov [rdi], rsp",
			"mov rsp, [rsi]",
			"ldmxcsr dword ptr [rsp]",
			"fldcw word ptr [rsp + 4]",
			"add rsp, 8",
			"pop r15",
			"pop r14",
			"pop r13",
			"pop r12",
			"pop rbx",
			"pop rbp",
			"ret",
		);
	}

	// Entered by `ret` with rsp at the stack top, so realign before calling anything.
	#[unsafe(naked)]
	unsafe extern "C" fn startup() {
		naked_asm!(
			"mov rdi, r13",
			"and rsp, -16",
			"call r12",
			"call {returned}",
			"ud2",
			returned = sym entry::returned,
		);
	}

	#[unsafe(naked)]
	unsafe extern "C" fn rendezvous() {
		naked_asm!(
			"and rsp, -16",
			"call {trampoline}",
			"ud2",
			trampoline = sym entry::trampoline,
		);
	}
}

#[cfg(windows)]
mod win64 {
	use std::arch::naked_asm;

	use super::FPCSR;
	use crate::{arch::Engine, entry, Context};

	/// Microsoft x64.
	///
	/// | slot | contents |
	/// |------|----------|
	/// | 0 | TEB StackBase, `gs:[0x08]` |
	/// | 1 | TEB StackLimit, `gs:[0x10]` |
	/// | 2 | TEB DeallocationStack, `gs:[0x1478]` |
	/// | 3..23 | xmm6 through xmm15, two slots each, slot 3 16-byte aligned |
	/// | 23 | mxcsr (bits 0..32), x87 control word (bits 32..48) |
	/// | 24 | r15 |
	/// | 25 | r14 |
	/// | 26 | r13 (startup argument) |
	/// | 27 | r12 (startup entry) |
	/// | 28 | rdi |
	/// | 29 | rsi |
	/// | 30 | rbx |
	/// | 31 | rbp |
	/// | 32 | resume address |
	pub struct Win64;

	impl Engine for Win64 {
		const FRAME_WORDS: usize = 33;
		const RESUME_SLOT: usize = 32;
		const ENTRY_SLOT: usize = 27;
		const ARG_SLOT: usize = 26;

		fn startup() -> usize { startup as *const () as usize }

		fn rendezvous() -> usize { rendezvous as *const () as usize }

		fn seed(frame: &mut [usize], bottom: usize, top: usize) {
			frame[0] = top;
			frame[1] = bottom;
			frame[2] = bottom;
			frame[23] = FPCSR;
		}

		#[inline(always)]
		unsafe fn transfer(from: *mut Context, to: *const Context) { switch(from, to) }
	}

	#[unsafe(naked)]
	pub unsafe extern "C" fn switch(_from: *mut Context, _to: *const Context) {
		naked_asm!(
			"push rbp",
			"push rbx",
			"push rsi",
			"push rdi",
			"push r12",
			"push r13",
			"push r14",
			"push r15",
			"sub rsp, 168",
			"movaps [rsp], xmm6",
			"movaps [rsp + 16], xmm7",
			"movaps [rsp + 32], xmm8",
			"movaps [rsp + 48], xmm9",
			"movaps [rsp + 64], xmm10",
			"movaps [rsp + 80], xmm11",
			"movaps [rsp + 96], xmm12",
			"movaps [rsp + 112], xmm13",
			"movaps [rsp + 128], xmm14",
			"movaps [rsp + 144], xmm15",
			"stmxcsr dword ptr [rsp + 160]",
			"fnstcw word ptr [rsp + 164]",
			"push qword ptr gs:[0x1478]",
			"push qword ptr gs:[0x10]",
			"push qword ptr gs:[0x08]",
			"mov [rcx], rsp",
			"mov rsp, [rdx]",
			"pop qword ptr gs:[0x08]",
			"pop qword ptr gs:[0x10]",
			"pop qword ptr gs:[0x1478]",
			"movaps xmm6, [rsp]",
			"movaps xmm7, [rsp + 16]",
			"movaps xmm8, [rsp + 32]",
			"movaps xmm9, [rsp + 48]",
			"movaps xmm10, [rsp + 64]",
			"movaps xmm11, [rsp + 80]",
			"movaps xmm12, [rsp + 96]",
			"movaps xmm13, [rsp + 112]",
			"movaps xmm14, [rsp + 128]",
			"movaps xmm15, [rsp + 144]",
			"ldmxcsr dword ptr [rsp + 160]",
			"fldcw word ptr [rsp + 164]",
			"add rsp, 168",
			"pop r15",
			"pop r14",
			"pop r13",
			"pop r12",
			"pop rdi",
			"pop rsi",
			"pop rbx",
			"pop rbp",
			"ret",
		);
	}

	// The callee owns 32 bytes of home space above its return address.
	#[unsafe(naked)]
	unsafe extern "C" fn startup() {
		naked_asm!(
			"mov rcx, r13",
			"and rsp, -16",
			"sub rsp, 32",
			"call r12",
			"call {returned}",
			"ud2",
			returned = sym entry::returned,
		);
	}

	#[unsafe(naked)]
	unsafe extern "C" fn rendezvous() {
		naked_asm!(
			"and rsp, -16",
			"sub rsp, 32",
			"call {trampoline}",
			"ud2",
			trampoline = sym entry::trampoline,
		);
	}
}
