//! Status codes, error kinds and the per-thread last error.

use ducklet_core::{CoreError, CoreResult, ErrorKind};
use std::cell::{Cell, RefCell};
use std::ffi::{c_char, CString};
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Status returned by fallible FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuckletState {
    /// Operation succeeded.
    Success = 0,
    /// Operation failed; see `ducklet_last_error`.
    Error = 1,
}

impl DuckletState {
    /// Returns true if the state indicates success.
    pub fn is_ok(self) -> bool {
        self == DuckletState::Success
    }

    /// Returns true if the state indicates an error.
    pub fn is_err(self) -> bool {
        self != DuckletState::Success
    }
}

/// Detail for the last failure on this thread.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuckletErrorKind {
    /// No error recorded.
    None = 0,
    /// Path or storage access failed.
    Io = 1,
    /// Invalid, closed or released handle.
    State = 2,
    /// Parse, semantic or evaluation failure.
    Query = 3,
    /// Column or row index out of bounds.
    Range = 4,
    /// Value could not be converted.
    Format = 5,
    /// Value does not fit the requested type.
    Overflow = 6,
    /// A required pointer argument was null.
    NullPointer = 7,
    /// An argument was malformed, such as non-UTF-8 text.
    InvalidArgument = 8,
}

impl From<ErrorKind> for DuckletErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Io => DuckletErrorKind::Io,
            ErrorKind::State => DuckletErrorKind::State,
            ErrorKind::Query => DuckletErrorKind::Query,
            ErrorKind::Range => DuckletErrorKind::Range,
            ErrorKind::Format => DuckletErrorKind::Format,
            ErrorKind::Overflow => DuckletErrorKind::Overflow,
        }
    }
}

// Thread-local storage for last error message and kind
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static LAST_KIND: Cell<DuckletErrorKind> = const { Cell::new(DuckletErrorKind::None) };
}

/// Sets the last error message and kind.
pub fn set_last_error(kind: DuckletErrorKind, message: impl Into<String>) {
    let msg = message.into();
    // Interior NULs would truncate the message on the C side
    let msg = msg.replace('\0', " ");
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
    LAST_KIND.with(|k| k.set(kind));
}

/// Records a core error as the last error.
pub fn set_core_error(err: &CoreError) {
    set_last_error(err.kind().into(), err.to_string());
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
    LAST_KIND.with(|k| k.set(DuckletErrorKind::None));
}

/// Records a null-pointer failure and returns [`DuckletState::Error`].
pub(crate) fn null_pointer(what: &str) -> DuckletState {
    set_last_error(
        DuckletErrorKind::NullPointer,
        format!("null pointer argument: {what}"),
    );
    DuckletState::Error
}

/// Converts a core result to a state, recording the error.
pub(crate) fn report(result: CoreResult<()>) -> DuckletState {
    match result {
        Ok(()) => DuckletState::Success,
        Err(e) => {
            set_core_error(&e);
            DuckletState::Error
        }
    }
}

/// Runs `f`, turning a panic into a recorded error and `fallback`.
///
/// Panics must never unwind across the C ABI.
pub(crate) fn catch<T>(fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(detail = %detail, "panic caught at FFI boundary");
            set_last_error(
                DuckletErrorKind::State,
                format!("internal error: {detail}"),
            );
            fallback
        }
    }
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn ducklet_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Gets the kind of the last error on this thread.
#[no_mangle]
pub extern "C" fn ducklet_last_error_kind() -> DuckletErrorKind {
    LAST_KIND.with(Cell::get)
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn ducklet_clear_error() {
    clear_last_error();
}
