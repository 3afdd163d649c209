//! Database FFI functions.

use crate::buffer::{arg_str, into_c_string};
use crate::config::resolve;
use crate::error::{catch, clear_last_error, null_pointer, report, set_core_error, DuckletState};
use crate::types::{DuckletConfig, DuckletDatabase, DuckletStats};
use crate::ENGINE;
use std::ffi::c_char;
use std::path::Path;

/// Borrows the optional path argument.
unsafe fn path_arg<'a>(path: *const c_char) -> Result<Option<&'a Path>, DuckletState> {
    if path.is_null() {
        return Ok(None);
    }
    arg_str(path, "path").map(|s| Some(Path::new(s)))
}

/// Opens a database.
///
/// A null path, `""` or `":memory:"` opens an in-memory database.
///
/// # Arguments
///
/// * `path` - Database file path (null-terminated UTF-8) or null
/// * `out_database` - Output pointer for the database handle
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string or null
/// - `out_database` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn ducklet_open(
    path: *const c_char,
    out_database: *mut DuckletDatabase,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_database.is_null() {
            return null_pointer("out_database");
        }
        *out_database = DuckletDatabase::NULL;
        let path = match path_arg(path) {
            Ok(p) => p,
            Err(state) => return state,
        };

        match ENGINE.open(path) {
            Ok(handle) => {
                *out_database = handle.into();
                DuckletState::Success
            }
            Err(e) => report(Err(e)),
        }
    })
}

/// Opens a database with a configuration.
///
/// On failure, if `out_error` is not null, it receives a copy of the error
/// message that the caller frees with `ducklet_free`. On success it is set
/// to null.
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string or null
/// - `out_database` must be a valid pointer
/// - `out_error` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn ducklet_open_ext(
    path: *const c_char,
    out_database: *mut DuckletDatabase,
    config: DuckletConfig,
    out_error: *mut *mut c_char,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if !out_error.is_null() {
            *out_error = std::ptr::null_mut();
        }
        if out_database.is_null() {
            return null_pointer("out_database");
        }
        *out_database = DuckletDatabase::NULL;
        let path = match path_arg(path) {
            Ok(p) => p,
            Err(state) => return state,
        };

        match resolve(config).and_then(|config| ENGINE.open_with_config(path, config)) {
            Ok(handle) => {
                *out_database = handle.into();
                DuckletState::Success
            }
            Err(e) => {
                set_core_error(&e);
                if !out_error.is_null() {
                    *out_error = into_c_string(&e.to_string()).unwrap_or(std::ptr::null_mut());
                }
                DuckletState::Error
            }
        }
    })
}

/// Closes a database and resets the handle to null.
///
/// Closing the null handle does nothing. Closing while connections are
/// open fails with a `State` error and leaves the database open.
///
/// # Safety
///
/// `database` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_close(database: *mut DuckletDatabase) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if database.is_null() {
            return null_pointer("database");
        }
        let state = report(ENGINE.close((*database).handle()));
        if state.is_ok() {
            *database = DuckletDatabase::NULL;
        }
        state
    })
}

/// Copies the database's query and connection counters.
///
/// # Safety
///
/// `out_stats` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_database_stats(
    database: DuckletDatabase,
    out_stats: *mut DuckletStats,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_stats.is_null() {
            return null_pointer("out_stats");
        }
        *out_stats = DuckletStats::default();

        match ENGINE.with_database(database.handle(), |db| db.stats()) {
            Ok(snapshot) => {
                *out_stats = snapshot.into();
                DuckletState::Success
            }
            Err(e) => report(Err(e)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ducklet_free;
    use crate::config::{ducklet_create_config, ducklet_destroy_config, ducklet_set_config};
    use crate::connection::{ducklet_connect, ducklet_disconnect};
    use crate::error::{ducklet_last_error_kind, DuckletErrorKind};
    use crate::types::DuckletConnection;
    use std::ffi::{CStr, CString};
    use tempfile::tempdir;

    #[test]
    fn open_memory_and_close() {
        let mut db = DuckletDatabase::NULL;

        let state = unsafe { ducklet_open(std::ptr::null(), &mut db) };
        assert_eq!(state, DuckletState::Success);
        assert!(!db.is_null());

        let state = unsafe { ducklet_close(&mut db) };
        assert_eq!(state, DuckletState::Success);
        assert!(db.is_null());

        // Closing the reset handle is a no-op
        let state = unsafe { ducklet_close(&mut db) };
        assert_eq!(state, DuckletState::Success);
    }

    #[test]
    fn closing_a_copy_twice_is_a_state_error() {
        let mut db = DuckletDatabase::NULL;
        unsafe {
            ducklet_open(std::ptr::null(), &mut db);
            let mut copy = db;
            assert_eq!(ducklet_close(&mut db), DuckletState::Success);
            assert_eq!(ducklet_close(&mut copy), DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::State);
            assert!(!copy.is_null());
        }
    }

    #[test]
    fn null_out_pointer() {
        let state = unsafe { ducklet_open(std::ptr::null(), std::ptr::null_mut()) };
        assert_eq!(state, DuckletState::Error);
        assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::NullPointer);

        let state = unsafe { ducklet_close(std::ptr::null_mut()) };
        assert_eq!(state, DuckletState::Error);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nope").join("db.ducklet");
        let path = CString::new(path.to_str().unwrap()).unwrap();

        let mut db = DuckletDatabase::NULL;
        let state = unsafe { ducklet_open(path.as_ptr(), &mut db) };
        assert_eq!(state, DuckletState::Error);
        assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::Io);
        assert!(db.is_null());
    }

    #[test]
    fn open_ext_reports_error_string() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("absent.ducklet");
        let path = CString::new(path.to_str().unwrap()).unwrap();

        unsafe {
            let mut config = DuckletConfig::NULL;
            ducklet_create_config(&mut config);
            let name = CString::new("access_mode").unwrap();
            let value = CString::new("read_only").unwrap();
            ducklet_set_config(config, name.as_ptr(), value.as_ptr());

            let mut db = DuckletDatabase::NULL;
            let mut error: *mut c_char = std::ptr::null_mut();
            let state = ducklet_open_ext(path.as_ptr(), &mut db, config, &mut error);
            assert_eq!(state, DuckletState::Error);
            assert!(db.is_null());
            assert!(!error.is_null());
            let message = CStr::from_ptr(error).to_str().unwrap().to_string();
            assert!(message.contains("does not exist"));
            ducklet_free(error.cast());

            ducklet_destroy_config(&mut config);
        }
    }

    #[test]
    fn open_ext_with_null_config() {
        unsafe {
            let mut db = DuckletDatabase::NULL;
            let mut error: *mut c_char = std::ptr::null_mut();
            let state = ducklet_open_ext(
                std::ptr::null(),
                &mut db,
                DuckletConfig::NULL,
                &mut error,
            );
            assert_eq!(state, DuckletState::Success);
            assert!(error.is_null());
            ducklet_close(&mut db);
        }
    }

    #[test]
    fn file_lock_blocks_second_open() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("locked.ducklet");
        let path = CString::new(path.to_str().unwrap()).unwrap();

        unsafe {
            let mut first = DuckletDatabase::NULL;
            assert_eq!(ducklet_open(path.as_ptr(), &mut first), DuckletState::Success);

            let mut second = DuckletDatabase::NULL;
            assert_eq!(ducklet_open(path.as_ptr(), &mut second), DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::State);

            ducklet_close(&mut first);
            assert_eq!(ducklet_open(path.as_ptr(), &mut second), DuckletState::Success);
            ducklet_close(&mut second);
        }
    }

    #[test]
    fn close_with_open_connection_fails() {
        unsafe {
            let mut db = DuckletDatabase::NULL;
            ducklet_open(std::ptr::null(), &mut db);
            let mut conn = DuckletConnection::NULL;
            ducklet_connect(db, &mut conn);

            assert_eq!(ducklet_close(&mut db), DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::State);
            assert!(!db.is_null());

            let mut stats = DuckletStats::default();
            assert_eq!(ducklet_database_stats(db, &mut stats), DuckletState::Success);
            assert_eq!(stats.connections_opened, 1);

            ducklet_disconnect(&mut conn);
            assert_eq!(ducklet_close(&mut db), DuckletState::Success);
        }
    }
}
