/// Guard which panics if dropped.
///
/// Dropped while already unwinding, the second panic aborts the process. Trampolines hold one
/// across the call so that an unwind escaping `catch_unwind` never reaches the C caller.
pub struct PanicTrap {
    msg: &'static str,
}

impl PanicTrap {
    #[inline]
    pub const fn new(msg: &'static str) -> Self {
        Self { msg }
    }

    #[inline]
    pub const fn disarm(self) {
        std::mem::forget(self)
    }
}

impl Drop for PanicTrap {
    fn drop(&mut self) {
        // Aborts when reached during an unwind.
        panic!("{}", self.msg)
    }
}
