use crate::Error;
use alloc::{
    alloc::{alloc, Layout},
    boxed::Box,
};
use core::{fmt, ptr::NonNull};

macro_rules! test_trace {
    ($($tt:tt)*) => {
        #[cfg(test)]
        tracing::trace!($($tt)*)
    }
}

pub(crate) struct FmtOption<'a, T> {
    opt: Option<&'a T>,
    or_else: &'a str,
}

/// Moves `value` to the heap, reporting [`Error::Alloc`] instead of aborting
/// if the global allocator cannot satisfy the request.
pub(crate) fn try_box<T>(value: T) -> Result<Box<T>, Error> {
    let layout = Layout::new::<T>();
    debug_assert_ne!(layout.size(), 0, "zero-sized values need no allocation");
    // Safety: `layout` has a non-zero size.
    let ptr = unsafe { alloc(layout) }.cast::<T>();
    let Some(ptr) = NonNull::new(ptr) else {
        tracing::debug!(
            size = layout.size(),
            align = layout.align(),
            "allocation failed"
        );
        return Err(Error::Alloc);
    };
    unsafe {
        // Safety: `ptr` is a fresh, properly aligned allocation made with
        // the global allocator and `Layout::new::<T>()`, which is exactly
        // what `Box::from_raw` expects.
        ptr.as_ptr().write(value);
        Ok(Box::from_raw(ptr.as_ptr()))
    }
}

// === impl FmtOption ===

impl<'a, T> FmtOption<'a, T> {
    pub(crate) fn new(opt: &'a Option<T>) -> Self {
        Self {
            opt: opt.as_ref(),
            or_else: "None",
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FmtOption<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opt {
            Some(val) => val.fmt(f),
            None => f.write_str(self.or_else),
        }
    }
}

#[cfg(test)]
pub(crate) fn assert_send<T: Send>() {}

#[cfg(test)]
pub(crate) fn trace_init() -> tracing::dispatcher::DefaultGuard {
    use tracing_subscriber::prelude::*;
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .with_target(false)
        .with_timer(())
        .set_default()
}
