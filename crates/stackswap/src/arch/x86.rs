//! x86: cdecl with both pointers passed on the stack. Windows also swaps the TIB stack bounds and SEH chain head.

use std::arch::naked_asm;

use crate::{arch::Engine, entry, Context};

// Words the Windows TIB fields occupy below the general-purpose registers.
const TIB: usize = if cfg!(windows) { 3 } else { 0 };

/// 32-bit cdecl.
///
/// | slot | contents |
/// |------|----------|
/// | 0 | Windows only: TIB StackLimit, `fs:[8]` |
/// | 1 | Windows only: TIB StackBase, `fs:[4]` |
/// | 2 | Windows only: TIB ExceptionList, `fs:[0]` |
/// | TIB + 0 | edi |
/// | TIB + 1 | esi (startup argument) |
/// | TIB + 2 | ebx (startup entry) |
/// | TIB + 3 | ebp |
/// | TIB + 4 | resume address |
pub struct Cdecl;

impl Engine for Cdecl {
	const FRAME_WORDS: usize = TIB + 5;
	const RESUME_SLOT: usize = TIB + 4;
	const ENTRY_SLOT: usize = TIB + 2;
	const ARG_SLOT: usize = TIB + 1;

	fn startup() -> usize { startup as *const () as usize }

	fn rendezvous() -> usize { rendezvous as *const () as usize }

	fn seed(frame: &mut [usize], bottom: usize, top: usize) {
		if cfg!(windows) {
			frame[0] = bottom;
			frame[1] = top;
			// End of the SEH chain.
			frame[2] = usize::MAX;
		}
	}

	#[inline(always)]
	unsafe fn transfer(from: *mut Context, to: *const Context) { switch(from, to) }
}

#[cfg(not(windows))]
#[unsafe(naked)]
unsafe extern "C" fn switch(_from: *mut Context, _to: *const Context) {
	naked_asm!(
		"mov eax, [esp + 4]",
		"mov edx, [esp + 8]",
		"push ebp",
		"push ebx",
		"push esi",
		"push edi",
		"mov [eax], esp",
		"mov esp, [edx]",
		"pop edi",
		"pop esi",
		"pop ebx",
		"pop ebp",
		"ret",
	);
}

#[cfg(windows)]
#[unsafe(naked)]
unsafe extern "C" fn switch(_from: *mut Context, _to: *const Context) {
	naked_asm!(
		"mov eax, [esp + 4]",
		"mov edx, [esp + 8]",
		"push ebp",
		"push ebx",
		"push esi",
		"push edi",
		"push dword ptr fs:[0]",
		"push dword ptr fs:[4]",
		"push dword ptr fs:[8]",
		"mov [eax], esp",
		"mov esp, [edx]",
		"pop dword ptr fs:[8]",
		"pop dword ptr fs:[4]",
		"pop dword ptr fs:[0]",
		"pop edi",
		"pop esi",
		"pop ebx",
		"pop ebp",
		"ret",
	);
}

// The argument goes on the stack, and the call site must sit on a 16-byte boundary.
#[unsafe(naked)]
unsafe extern "C" fn startup() {
	naked_asm!(
		"and esp, -16",
		"sub esp, 12",
		"push esi",
		"call ebx",
		"call {returned}",
		"ud2",
		returned = sym entry::returned,
	);
}

#[unsafe(naked)]
unsafe extern "C" fn rendezvous() {
	naked_asm!(
		"and esp, -16",
		"call {trampoline}",
		"ud2",
		trampoline = sym entry::trampoline,
	);
}
