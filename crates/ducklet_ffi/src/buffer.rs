//! Blob and string ownership across the ABI.

use crate::error::{null_pointer, set_last_error, DuckletErrorKind, DuckletState};
use std::ffi::{c_char, c_void, CStr, CString};

/// A byte buffer for FFI.
///
/// Memory is owned by Rust. Call `ducklet_free_blob` to release.
#[repr(C)]
#[derive(Debug)]
pub struct DuckletBlob {
    /// Pointer to data.
    pub data: *mut u8,
    /// Length in bytes.
    pub len: usize,
    /// Capacity (for internal use).
    pub capacity: usize,
}

impl DuckletBlob {
    /// Creates a new blob from a Vec.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        let mut vec = vec.into_boxed_slice();
        let data = vec.as_mut_ptr();
        let len = vec.len();
        std::mem::forget(vec);

        Self {
            data,
            len,
            capacity: len,
        }
    }

    /// Creates an empty blob.
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            capacity: 0,
        }
    }

    /// Returns true if the blob is null.
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Converts back to a Vec, consuming the blob.
    ///
    /// # Safety
    ///
    /// The blob must have been created by [`DuckletBlob::from_vec`].
    pub unsafe fn into_vec(self) -> Vec<u8> {
        if self.data.is_null() {
            return Vec::new();
        }
        Vec::from_raw_parts(self.data, self.len, self.capacity)
    }
}

/// Copies `s` into a C string owned by the caller.
///
/// Returns `None` if `s` contains a NUL byte.
pub(crate) fn into_c_string(s: &str) -> Option<*mut c_char> {
    CString::new(s).ok().map(CString::into_raw)
}

/// Borrows a NUL-terminated UTF-8 argument, recording the failure if it is
/// null or not UTF-8.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn arg_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, DuckletState> {
    if ptr.is_null() {
        return Err(null_pointer(what));
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| {
        set_last_error(
            DuckletErrorKind::InvalidArgument,
            format!("invalid UTF-8 in {what}"),
        );
        DuckletState::Error
    })
}

/// Frees a string allocated by Ducklet.
///
/// Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a string returned by a Ducklet FFI function that
/// has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn ducklet_free(ptr: *mut c_void) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr.cast::<c_char>()));
    }
}

/// Frees a blob allocated by Ducklet.
///
/// # Safety
///
/// The blob must have been returned by `ducklet_value_blob` and not freed.
#[no_mangle]
pub unsafe extern "C" fn ducklet_free_blob(blob: DuckletBlob) {
    if !blob.data.is_null() {
        drop(blob.into_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ducklet_last_error_kind;

    #[test]
    fn blob_from_vec() {
        let data = vec![1u8, 2, 3, 4, 5];
        let blob = DuckletBlob::from_vec(data.clone());

        assert!(!blob.is_null());
        assert_eq!(blob.len, 5);

        // Safety: we just created it
        let recovered = unsafe { blob.into_vec() };
        assert_eq!(recovered, data);
    }

    #[test]
    fn blob_empty() {
        let blob = DuckletBlob::empty();
        assert!(blob.is_null());
        assert_eq!(blob.len, 0);
        unsafe { ducklet_free_blob(blob) };
    }

    #[test]
    fn zero_length_blob_is_not_null() {
        let blob = DuckletBlob::from_vec(Vec::new());
        assert!(!blob.is_null());
        assert_eq!(blob.len, 0);
        unsafe { ducklet_free_blob(blob) };
    }

    #[test]
    fn c_string_round_trip() {
        let ptr = into_c_string("hello").unwrap();
        let s = unsafe { CStr::from_ptr(ptr) };
        assert_eq!(s.to_str().unwrap(), "hello");
        unsafe { ducklet_free(ptr.cast()) };
        unsafe { ducklet_free(std::ptr::null_mut()) };
    }

    #[test]
    fn arg_str_validates() {
        let ok = CString::new("path").unwrap();
        assert_eq!(unsafe { arg_str(ok.as_ptr(), "path") }, Ok("path"));

        assert!(unsafe { arg_str(std::ptr::null(), "path") }.is_err());
        assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::NullPointer);

        let bad = [0xFF_u8, 0xFE, 0];
        assert!(unsafe { arg_str(bad.as_ptr().cast(), "sql") }.is_err());
        assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::InvalidArgument);
    }

    #[test]
    fn string_with_null_byte_fails() {
        assert!(into_c_string("hello\0world").is_none());
    }
}
