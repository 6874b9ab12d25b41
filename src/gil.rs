// Copyright (c) 2017-present PyO3 Project and Contributors

//! Interaction with Python's global interpreter lock

use crate::internal_tricks::Unsendable;
use crate::{ffi, Python};
use parking_lot::{const_mutex, Mutex, Once};
use std::cell::Cell;
use std::ptr::NonNull;
use std::{mem, marker::PhantomData};

static START: Once = Once::new();

thread_local! {
    /// Number of live `GILGuard`s on this thread.
    ///
    /// If this thread has the GIL, GIL_COUNT is greater than zero.
    static GIL_COUNT: Cell<isize> = const { Cell::new(0) };
}

/// Checks whether the GIL is acquired.
///
/// Note: This uses our own count rather than `PyGILState_Check`, which always returns 1 once
/// the sub-interpreter APIs have been used.
#[inline(always)]
pub(crate) fn gil_is_acquired() -> bool {
    GIL_COUNT.try_with(|c| c.get() > 0).unwrap_or(false)
}

/// Prepares the use of Python in a free-threaded context.
///
/// If the Python interpreter is not already initialized, this function will initialize it with
/// signal handling disabled (Python will not raise the `KeyboardInterrupt` exception). Python
/// signal handling depends on the notion of a 'main thread', which must be the thread that
/// initializes the Python interpreter.
///
/// If the Python interpreter is already initialized, this function has no effect.
///
/// # Examples
/// ```ignore
/// libpy::prepare_freethreaded_python();
/// libpy::Python::with_gil(|py| py.run("print('Hello World')"))
/// ```
#[cfg(not(PyPy))]
pub fn prepare_freethreaded_python() {
    // Protect against race conditions when Python is not yet initialized and multiple threads
    // concurrently call 'prepare_freethreaded_python()'. Concurrent initialization of the
    // runtime by other users of the C API is not guarded against.
    START.call_once_force(|_| unsafe {
        if ffi::Py_IsInitialized() == 0 {
            tracing::debug!("initializing the embedded Python interpreter");
            ffi::Py_InitializeEx(0);

            // Release the GIL.
            ffi::PyEval_SaveThread();
        }
    });
}

/// RAII type that represents the Global Interpreter Lock acquisition.
///
/// Users normally do not see this type; [`Python::with_gil`] creates one around the closure.
pub enum GILGuard {
    /// Indicates the GIL was already held when this guard was acquired.
    Assumed,
    /// Indicates that we actually acquired the GIL when this guard was acquired.
    Ensured {
        gstate: ffi::PyGILState_STATE,
        #[doc(hidden)]
        _not_send: Unsendable,
    },
}

impl GILGuard {
    /// Acquires the GIL, initializing the interpreter first if the `auto-initialize` feature
    /// is enabled.
    ///
    /// # Panics
    ///
    /// If the interpreter is not initialized and cannot be initialized here.
    pub(crate) fn acquire() -> Self {
        if gil_is_acquired() {
            // SAFETY: We just checked that the GIL is already acquired.
            return unsafe { Self::assume() };
        }

        #[cfg(all(feature = "auto-initialize", not(PyPy)))]
        prepare_freethreaded_python();

        #[cfg(not(all(feature = "auto-initialize", not(PyPy))))]
        {
            // Tests within the crate itself all expect the interpreter to be running, and Cargo
            // gives no way to turn on a feature for `cargo test` of the primary package only.
            #[cfg(not(PyPy))]
            if option_env!("CARGO_PRIMARY_PACKAGE").is_some() {
                prepare_freethreaded_python();
            }

            START.call_once_force(|_| unsafe {
                // Use call_once_force because if there is a panic because the interpreter is
                // not initialized, it's fine for the user to initialize the interpreter and
                // retry.
                assert_ne!(
                    ffi::Py_IsInitialized(),
                    0,
                    "The Python interpreter is not initialized and the `auto-initialize` \
                     feature is not enabled.\n\n\
                     Consider calling `libpy::prepare_freethreaded_python()` before attempting \
                     to use Python APIs."
                );
            });
        }

        // SAFETY: the interpreter is initialized at this point.
        unsafe { Self::acquire_unchecked() }
    }

    /// Acquires the GIL without checking that the interpreter is initialized.
    ///
    /// # Safety
    ///
    /// The interpreter must be initialized.
    pub(crate) unsafe fn acquire_unchecked() -> Self {
        if gil_is_acquired() {
            return unsafe { Self::assume() };
        }

        let gstate = unsafe { ffi::PyGILState_Ensure() };
        increment_gil_count();
        POOL.update_counts(unsafe { Python::assume_gil_acquired() });
        GILGuard::Ensured {
            gstate,
            _not_send: PhantomData,
        }
    }

    /// Acquires the `GILGuard` while assuming that the GIL is already held.
    ///
    /// # Safety
    ///
    /// The current thread must hold the GIL.
    pub(crate) unsafe fn assume() -> Self {
        increment_gil_count();
        POOL.update_counts(unsafe { Python::assume_gil_acquired() });
        GILGuard::Assumed
    }

    /// Gets the Python token associated with this [`GILGuard`].
    #[inline]
    pub fn python(&self) -> Python<'_> {
        unsafe { Python::assume_gil_acquired() }
    }
}

/// The Drop implementation for `GILGuard` will release the GIL if it was acquired.
impl Drop for GILGuard {
    fn drop(&mut self) {
        if let GILGuard::Ensured { gstate, .. } = self {
            unsafe { ffi::PyGILState_Release(*gstate) };
        }
        decrement_gil_count();
    }
}

type PyObjVec = Vec<NonNull<ffi::PyObject>>;

/// Thread-safe storage for objects which were dropped while the GIL was not held.
struct ReferencePool {
    pending_decrefs: Mutex<PyObjVec>,
}

impl ReferencePool {
    const fn new() -> Self {
        Self {
            pending_decrefs: const_mutex(Vec::new()),
        }
    }

    fn register_decref(&self, obj: NonNull<ffi::PyObject>) {
        self.pending_decrefs.lock().push(obj);
    }

    fn update_counts(&self, _py: Python<'_>) {
        let mut pending = self.pending_decrefs.lock();
        if pending.is_empty() {
            return;
        }

        let decrefs = mem::take(&mut *pending);
        drop(pending);

        tracing::trace!(count = decrefs.len(), "releasing deferred references");
        for ptr in decrefs {
            unsafe { ffi::Py_DECREF(ptr.as_ptr()) };
        }
    }
}

unsafe impl Sync for ReferencePool {}

static POOL: ReferencePool = ReferencePool::new();

/// Registers a Python object pointer inside the release pool, to have its reference count
/// decreased the next time the GIL is acquired.
///
/// If the GIL is held, the reference count is decreased immediately instead of being queued.
///
/// # Safety
///
/// The object must be an owned Python reference.
pub(crate) unsafe fn register_decref(obj: NonNull<ffi::PyObject>) {
    if gil_is_acquired() {
        unsafe { ffi::Py_DECREF(obj.as_ptr()) }
    } else {
        POOL.register_decref(obj);
    }
}

/// Bumps this thread's lock depth; paired with every `GILGuard` creation.
#[inline(always)]
fn increment_gil_count() {
    // Ignores the error in case this function called from `atexit`.
    let _ = GIL_COUNT.try_with(|c| c.set(c.get() + 1));
}

/// Lowers this thread's lock depth when a `GILGuard` is dropped.
#[inline(always)]
fn decrement_gil_count() {
    // Ignores the error in case this function called from `atexit`.
    let _ = GIL_COUNT.try_with(|c| {
        let current = c.get();
        debug_assert!(
            current > 0,
            "Negative GIL count detected. Please report this error to the libpy repo as a bug."
        );
        c.set(current - 1);
    });
}
