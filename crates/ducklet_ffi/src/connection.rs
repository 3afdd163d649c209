//! Connection and query FFI functions.

use crate::buffer::arg_str;
use crate::error::{catch, clear_last_error, null_pointer, report, DuckletState};
use crate::types::{DuckletConnection, DuckletDatabase, DuckletResult};
use crate::ENGINE;
use std::ffi::c_char;

/// Opens a connection to a database.
///
/// # Safety
///
/// `out_connection` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_connect(
    database: DuckletDatabase,
    out_connection: *mut DuckletConnection,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_connection.is_null() {
            return null_pointer("out_connection");
        }
        *out_connection = DuckletConnection::NULL;

        match ENGINE.connect(database.handle()) {
            Ok(handle) => {
                *out_connection = handle.into();
                DuckletState::Success
            }
            Err(e) => report(Err(e)),
        }
    })
}

/// Closes a connection and resets the handle to null.
///
/// Disconnecting the null handle does nothing.
///
/// # Safety
///
/// `connection` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_disconnect(connection: *mut DuckletConnection) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if connection.is_null() {
            return null_pointer("connection");
        }
        let state = report(ENGINE.disconnect((*connection).handle()));
        if state.is_ok() {
            *connection = DuckletConnection::NULL;
        }
        state
    })
}

/// Runs a query and materializes its result.
///
/// On failure `*out_result` is the null handle, which
/// `ducklet_destroy_result` accepts.
///
/// # Safety
///
/// - `sql` must be a valid null-terminated UTF-8 string
/// - `out_result` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn ducklet_query(
    connection: DuckletConnection,
    sql: *const c_char,
    out_result: *mut DuckletResult,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_result.is_null() {
            return null_pointer("out_result");
        }
        *out_result = DuckletResult::NULL;
        let sql = match arg_str(sql, "sql") {
            Ok(s) => s,
            Err(state) => return state,
        };

        match ENGINE.query(connection.handle(), sql) {
            Ok(handle) => {
                *out_result = handle.into();
                DuckletState::Success
            }
            Err(e) => report(Err(e)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ducklet_close, ducklet_open};
    use crate::error::{ducklet_last_error, ducklet_last_error_kind, DuckletErrorKind};
    use crate::result::{ducklet_destroy_result, ducklet_row_count};
    use std::ffi::{CStr, CString};

    fn open() -> (DuckletDatabase, DuckletConnection) {
        let mut db = DuckletDatabase::NULL;
        let mut conn = DuckletConnection::NULL;
        unsafe {
            assert_eq!(ducklet_open(std::ptr::null(), &mut db), DuckletState::Success);
            assert_eq!(ducklet_connect(db, &mut conn), DuckletState::Success);
        }
        (db, conn)
    }

    #[test]
    fn query_and_release() {
        let (mut db, mut conn) = open();
        let sql = CString::new("VALUES (1), (2)").unwrap();
        let mut result = DuckletResult::NULL;
        unsafe {
            assert_eq!(ducklet_query(conn, sql.as_ptr(), &mut result), DuckletState::Success);
            assert_eq!(ducklet_row_count(&mut result), 2);
            assert_eq!(ducklet_destroy_result(&mut result), DuckletState::Success);
            assert!(result.is_null());

            assert_eq!(ducklet_disconnect(&mut conn), DuckletState::Success);
            assert!(conn.is_null());
            assert_eq!(ducklet_close(&mut db), DuckletState::Success);
        }
    }

    #[test]
    fn failed_query_leaves_null_result() {
        let (mut db, mut conn) = open();
        let sql = CString::new("SELECT * FROM nowhere").unwrap();
        let mut result = DuckletResult::NULL;
        unsafe {
            assert_eq!(ducklet_query(conn, sql.as_ptr(), &mut result), DuckletState::Error);
            assert!(result.is_null());
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::Query);
            let message = CStr::from_ptr(ducklet_last_error()).to_str().unwrap();
            assert!(message.contains("nowhere"));

            // Destroying the null result is safe
            assert_eq!(ducklet_destroy_result(&mut result), DuckletState::Success);

            ducklet_disconnect(&mut conn);
            ducklet_close(&mut db);
        }
    }

    #[test]
    fn disconnected_copy_is_stale() {
        let (mut db, mut conn) = open();
        let copy = conn;
        let sql = CString::new("SELECT 1").unwrap();
        let mut result = DuckletResult::NULL;
        unsafe {
            ducklet_disconnect(&mut conn);
            assert_eq!(ducklet_query(copy, sql.as_ptr(), &mut result), DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::State);

            let mut copy = copy;
            assert_eq!(ducklet_disconnect(&mut copy), DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::State);
            ducklet_close(&mut db);
        }
    }

    #[test]
    fn null_arguments() {
        let (mut db, mut conn) = open();
        let mut result = DuckletResult::NULL;
        unsafe {
            assert_eq!(
                ducklet_query(conn, std::ptr::null(), &mut result),
                DuckletState::Error
            );
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::NullPointer);

            let sql = CString::new("SELECT 1").unwrap();
            assert_eq!(
                ducklet_query(conn, sql.as_ptr(), std::ptr::null_mut()),
                DuckletState::Error
            );
            assert_eq!(ducklet_connect(db, std::ptr::null_mut()), DuckletState::Error);

            ducklet_disconnect(&mut conn);
            ducklet_close(&mut db);
        }
    }

    #[test]
    fn connect_to_closed_database_fails() {
        let mut db = DuckletDatabase::NULL;
        unsafe {
            ducklet_open(std::ptr::null(), &mut db);
            let copy = db;
            ducklet_close(&mut db);

            let mut conn = DuckletConnection::NULL;
            assert_eq!(ducklet_connect(copy, &mut conn), DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::State);
            assert!(conn.is_null());
        }
    }
}
