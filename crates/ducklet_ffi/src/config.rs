//! Configuration FFI functions.

use crate::buffer::arg_str;
use crate::error::{catch, clear_last_error, null_pointer, report, DuckletState};
use crate::types::{ConfigKind, DuckletConfig};
use ducklet_core::handle::HandleTable;
use ducklet_core::{Config, CoreResult};
use parking_lot::Mutex;
use std::ffi::c_char;
use std::sync::LazyLock;

static CONFIGS: LazyLock<Mutex<HandleTable<ConfigKind, Config>>> =
    LazyLock::new(|| Mutex::new(HandleTable::new()));

/// Returns a copy of the configuration behind `config`.
///
/// The null handle selects the default configuration.
pub(crate) fn resolve(config: DuckletConfig) -> CoreResult<Config> {
    if config.is_null() {
        return Ok(Config::default());
    }
    CONFIGS.lock().get(config.handle()).cloned()
}

/// Creates a configuration with default options.
///
/// # Safety
///
/// `out_config` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_create_config(out_config: *mut DuckletConfig) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        if out_config.is_null() {
            return null_pointer("out_config");
        }
        *out_config = DuckletConfig::NULL;

        match CONFIGS.lock().insert(Config::default()) {
            Ok(handle) => {
                *out_config = handle.into();
                DuckletState::Success
            }
            Err(e) => report(Err(e)),
        }
    })
}

/// Sets a configuration option by name.
///
/// Recognized names are `access_mode`, `create_if_missing`,
/// `max_result_rows`, `default_null_order` and `default_order`.
///
/// # Safety
///
/// `name` and `value` must be valid null-terminated UTF-8 strings.
#[no_mangle]
pub unsafe extern "C" fn ducklet_set_config(
    config: DuckletConfig,
    name: *const c_char,
    value: *const c_char,
) -> DuckletState {
    catch(DuckletState::Error, || {
        clear_last_error();

        let name = match arg_str(name, "name") {
            Ok(s) => s,
            Err(state) => return state,
        };
        let value = match arg_str(value, "value") {
            Ok(s) => s,
            Err(state) => return state,
        };

        let mut configs = CONFIGS.lock();
        report(
            configs
                .get_mut(config.handle())
                .and_then(|cfg| cfg.set(name, value)),
        )
    })
}

/// Destroys a configuration and resets the handle to null.
///
/// Destroying the null handle does nothing.
///
/// # Safety
///
/// `config` must be null or a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn ducklet_destroy_config(config: *mut DuckletConfig) {
    catch((), || {
        clear_last_error();

        if config.is_null() || (*config).is_null() {
            return;
        }
        let removed = CONFIGS.lock().remove((*config).handle()).map(drop);
        if report(removed).is_ok() {
            *config = DuckletConfig::NULL;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ducklet_last_error_kind, DuckletErrorKind};
    use ducklet_core::AccessMode;
    use std::ffi::CString;

    #[test]
    fn create_set_destroy() {
        let mut config = DuckletConfig::NULL;
        unsafe {
            assert_eq!(ducklet_create_config(&mut config), DuckletState::Success);
            assert!(!config.is_null());

            let name = CString::new("access_mode").unwrap();
            let value = CString::new("read_only").unwrap();
            let state = ducklet_set_config(config, name.as_ptr(), value.as_ptr());
            assert_eq!(state, DuckletState::Success);
            assert_eq!(resolve(config).unwrap().access_mode, AccessMode::ReadOnly);

            ducklet_destroy_config(&mut config);
            assert!(config.is_null());
        }
    }

    #[test]
    fn bad_options_are_query_errors() {
        let mut config = DuckletConfig::NULL;
        unsafe {
            ducklet_create_config(&mut config);

            let name = CString::new("threads").unwrap();
            let value = CString::new("4").unwrap();
            let state = ducklet_set_config(config, name.as_ptr(), value.as_ptr());
            assert_eq!(state, DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::Query);

            let name = CString::new("max_result_rows").unwrap();
            let value = CString::new("lots").unwrap();
            let state = ducklet_set_config(config, name.as_ptr(), value.as_ptr());
            assert_eq!(state, DuckletState::Error);

            let state = ducklet_set_config(config, std::ptr::null(), value.as_ptr());
            assert_eq!(state, DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::NullPointer);

            ducklet_destroy_config(&mut config);
        }
    }

    #[test]
    fn null_config_is_default() {
        assert_eq!(resolve(DuckletConfig::NULL).unwrap(), Config::default());
        unsafe {
            ducklet_destroy_config(std::ptr::null_mut());
            let mut null = DuckletConfig::NULL;
            ducklet_destroy_config(&mut null);
        }
    }

    #[test]
    fn destroyed_config_is_stale() {
        let mut config = DuckletConfig::NULL;
        unsafe {
            ducklet_create_config(&mut config);
            let copy = config;
            ducklet_destroy_config(&mut config);

            assert!(resolve(copy).is_err());
            let name = CString::new("default_order").unwrap();
            let value = CString::new("desc").unwrap();
            let state = ducklet_set_config(copy, name.as_ptr(), value.as_ptr());
            assert_eq!(state, DuckletState::Error);
            assert_eq!(ducklet_last_error_kind(), DuckletErrorKind::State);
        }
    }
}
