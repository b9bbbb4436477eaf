//! Operation logging macros.
//!
//! Every entry point brackets its work with a `start` event and exactly one
//! of `end` / `end_error`, all carrying the same `op`. Extra fields use the
//! usual `tracing` syntax (`name = value`, `name = ?debug`, `name = %display`).

/// Log the start of an operation
///
/// ```
/// # use sysdesc_core::log_op_start;
/// log_op_start!("compare_descriptions");
/// log_op_start!("migrate_description", description = "host1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::sysdesc_core_types::schema::EVENT_START,
            $($($field)*)?
        )
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use sysdesc_core::log_op_end;
/// log_op_end!("compare_descriptions", duration_ms = 42, scopes = 3);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::sysdesc_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        )
    };
}

/// Log the failed end of an operation
///
/// `$err` is anything convertible into [`ExError`](crate::errors::ExError);
/// its kind and stable code are recorded.
///
/// ```
/// # use sysdesc_core::{log_op_error, errors::SysDescError};
/// let err = SysDescError::UnknownScope { scope: "foo".to_string() };
/// log_op_error!("compare_scope", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::sysdesc_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($($field)*)?
        );
    }};
}
