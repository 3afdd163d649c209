//! Result set FFI functions.
//!
//! Every typed accessor writes the value to `out_value` and the cell's null
//! flag to `out_is_null`. A null cell leaves `out_value` zeroed (or null
//! for strings and blobs). Values convert through the core coercion rules,
//! so reading a `BIGINT` through `ducklet_value_int8` fails with an
//! `Overflow` error when the value does not fit.

use crate::buffer::{into_c_string, DuckletBlob};
use crate::error::{
    catch, clear_last_error, ducklet_last_error, null_pointer, report, set_core_error,
    set_last_error, DuckletErrorKind, DuckletState,
};
use crate::types::{DuckletResult, DuckletType, Idx};
use crate::ENGINE;
use ducklet_core::{CoreResult, LogicalType, ResultSet};
use std::ffi::c_char;

fn index(i: Idx) -> usize {
    // Past-the-end indexes fail the range check inside the result
    usize::try_from(i).unwrap_or(usize::MAX)
}

/// Reads one cell, recording errors and setting `out_is_null`.
unsafe fn fetch<U>(
    result: *mut DuckletResult,
    col: Idx,
    row: Idx,
    out_is_null: *mut bool,
    read: impl FnOnce(&ResultSet, usize, usize) -> CoreResult<Option<U>>,
) -> Result<Option<U>, DuckletState> {
    if !out_is_null.is_null() {
        *out_is_null = false;
    }
    if result.is_null() {
        return Err(null_pointer("result"));
    }
    let value = ENGINE
        .with_result((*result).handle(), |r| read(r, index(col), index(row)))
        .and_then(|cell| cell)
        .map_err(|e| {
            set_core_error(&e);
            DuckletState::Error
        })?;
    if !out_is_null.is_null() {
        *out_is_null = value.is_none();
    }
    Ok(value)
}

/// Reads result metadata, recording errors and returning `fallback` on
/// failure.
unsafe fn metadata<T>(
    result: *mut DuckletResult,
    fallback: T,
    read: impl FnOnce(&ResultSet) -> CoreResult<T>,
) -> T {
    if result.is_null() {
        null_pointer("result");
        return fallback;
    }
    match ENGINE
        .with_result((*result).handle(), read)
        .and_then(|value| value)
    {
        Ok(value) => value,
        Err(e) => {
            set_core_error(&e);
            fallback
        }
    }
}

/// Frees a result and resets the handle to null.
///
/// Destroying the null handle (what a failed `ducklet_query` leaves) does
/// nothing.
///
/// # Safety
///
/// `result` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_destroy_result(result: *mut DuckletResult) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if result.is_null() {
            return null_pointer("result");
        }
        let state = report(ENGINE.destroy_result((*result).handle()));
        if state.is_ok() {
            *result = DuckletResult::NULL;
        }
        state
    })
}

/// Returns the error message for a failed query.
///
/// A null or released result yields this thread's last error message; a
/// live result has no error and yields null. Does not clear the last error.
///
/// # Safety
///
/// `result` must be null or a valid pointer. The returned string is valid
/// until the next FFI call on this thread.
#[no_mangle]
pub unsafe extern "C" fn ducklet_result_error(result: *mut DuckletResult) -> *const c_char {
    catch(std::ptr::null(), || {
        if !result.is_null() && ENGINE.with_result((*result).handle(), |_| ()).is_ok() {
            return std::ptr::null();
        }
        ducklet_last_error()
    })
}

/// Returns the number of columns, or 0 for an invalid result.
///
/// # Safety
///
/// `result` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_column_count(result: *mut DuckletResult) -> Idx {
    catch(0, || {
        clear_last_error();
        metadata(result, 0, |r| Ok(r.column_count() as Idx))
    })
}

/// Returns the number of rows, or 0 for an invalid result.
///
/// # Safety
///
/// `result` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_row_count(result: *mut DuckletResult) -> Idx {
    catch(0, || {
        clear_last_error();
        metadata(result, 0, |r| Ok(r.row_count() as Idx))
    })
}

/// Returns the type code of a column, or `INVALID` (0) on error.
///
/// # Safety
///
/// `result` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_column_type(result: *mut DuckletResult, col: Idx) -> DuckletType {
    let invalid = LogicalType::Invalid.code();
    catch(invalid, || {
        clear_last_error();
        metadata(result, invalid, |r| r.column_type(index(col)).map(LogicalType::code))
    })
}

/// Copies a column name. Free the string with `ducklet_free`.
///
/// # Safety
///
/// `result` and `out_name` must be valid pointers.
#[no_mangle]
pub unsafe extern "C" fn ducklet_column_name(
    result: *mut DuckletResult,
    col: Idx,
    out_name: *mut *mut c_char,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_name.is_null() {
            return null_pointer("out_name");
        }
        *out_name = std::ptr::null_mut();

        let name = metadata(result, None, |r| {
            r.column_name(index(col)).map(|s| Some(s.to_string()))
        });
        match name {
            Some(name) => store_string(&name, out_name),
            None => DuckletState::Error,
        }
    })
}

unsafe fn store_string(s: &str, out: *mut *mut c_char) -> DuckletState {
    match into_c_string(s) {
        Some(ptr) => {
            *out = ptr;
            DuckletState::Success
        }
        None => {
            set_last_error(DuckletErrorKind::Format, "string contains a NUL byte");
            DuckletState::Error
        }
    }
}

/// Reports whether a cell is null.
///
/// Returns false and records the error for an invalid result or index.
///
/// # Safety
///
/// `result` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_value_is_null(
    result: *mut DuckletResult,
    col: Idx,
    row: Idx,
) -> bool {
    catch(false, || {
        clear_last_error();
        metadata(result, false, |r| r.is_null(index(col), index(row)))
    })
}

macro_rules! value_accessor {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $method:ident) => {
        $(#[$doc])*
        ///
        /// # Safety
        ///
        /// `result` and `out_value` must be valid pointers. `out_is_null`
        /// must be valid or null.
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            result: *mut DuckletResult,
            col: Idx,
            row: Idx,
            out_value: *mut $ty,
            out_is_null: *mut bool,
        ) -> DuckletState {
            catch(DuckletState::Error, || {
                clear_last_error();

                if out_value.is_null() {
                    return null_pointer("out_value");
                }
                *out_value = <$ty>::default();

                match fetch(result, col, row, out_is_null, ResultSet::$method) {
                    Ok(value) => {
                        *out_value = value.unwrap_or_default();
                        DuckletState::Success
                    }
                    Err(state) => state,
                }
            })
        }
    };
}

value_accessor! {
    /// Reads a cell as `bool`.
    ducklet_value_boolean, bool, value_bool
}

value_accessor! {
    /// Reads a cell as `int8_t`.
    ducklet_value_int8, i8, value_i8
}

value_accessor! {
    /// Reads a cell as `int16_t`.
    ducklet_value_int16, i16, value_i16
}

value_accessor! {
    /// Reads a cell as `int32_t`.
    ducklet_value_int32, i32, value_i32
}

value_accessor! {
    /// Reads a cell as `int64_t`.
    ducklet_value_int64, i64, value_i64
}

value_accessor! {
    /// Reads a cell as `uint8_t`.
    ducklet_value_uint8, u8, value_u8
}

value_accessor! {
    /// Reads a cell as `uint16_t`.
    ducklet_value_uint16, u16, value_u16
}

value_accessor! {
    /// Reads a cell as `uint32_t`.
    ducklet_value_uint32, u32, value_u32
}

value_accessor! {
    /// Reads a cell as `uint64_t`.
    ducklet_value_uint64, u64, value_u64
}

value_accessor! {
    /// Reads a cell as `float`.
    ducklet_value_float, f32, value_f32
}

value_accessor! {
    /// Reads a cell as `double`.
    ducklet_value_double, f64, value_f64
}

/// Reads a cell as text. Free the string with `ducklet_free`.
///
/// Any type converts to its canonical text form. A null cell leaves
/// `*out_value` null.
///
/// # Safety
///
/// `result` and `out_value` must be valid pointers. `out_is_null` must be
/// valid or null.
#[no_mangle]
pub unsafe extern "C" fn ducklet_value_varchar(
    result: *mut DuckletResult,
    col: Idx,
    row: Idx,
    out_value: *mut *mut c_char,
    out_is_null: *mut bool,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_value.is_null() {
            return null_pointer("out_value");
        }
        *out_value = std::ptr::null_mut();

        match fetch(result, col, row, out_is_null, ResultSet::value_string) {
            Ok(Some(text)) => store_string(&text, out_value),
            Ok(None) => DuckletState::Success,
            Err(state) => state,
        }
    })
}

/// Reads a cell as bytes. Free the blob with `ducklet_free_blob`.
///
/// Only `BLOB` and `VARCHAR` cells convert. A null cell leaves an empty
/// blob with a null data pointer.
///
/// # Safety
///
/// `result` and `out_value` must be valid pointers. `out_is_null` must be
/// valid or null.
#[no_mangle]
pub unsafe extern "C" fn ducklet_value_blob(
    result: *mut DuckletResult,
    col: Idx,
    row: Idx,
    out_value: *mut DuckletBlob,
    out_is_null: *mut bool,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_value.is_null() {
            return null_pointer("out_value");
        }
        *out_value = DuckletBlob::empty();

        match fetch(result, col, row, out_is_null, ResultSet::value_blob) {
            Ok(bytes) => {
                if let Some(bytes) = bytes {
                    *out_value = DuckletBlob::from_vec(bytes);
                }
                DuckletState::Success
            }
            Err(state) => state,
        }
    })
}
