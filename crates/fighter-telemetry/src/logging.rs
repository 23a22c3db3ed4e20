//! Structured logging helpers.
//!
//! Every event carries a `subsystem` field so log pipelines can split the
//! session core by concern (`cf-01` … `cf-04`, `session`).

/// Log an event with a subsystem field at the given level.
#[macro_export]
macro_rules! log_event {
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a chain record event with the standard record fields.
#[macro_export]
macro_rules! log_record_event {
    ($level:ident, $subsystem:expr, $msg:expr, $sequence:expr, $hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            sequence = $sequence,
            hash = %$hash,
            $($($field)*,)?
            $msg
        )
    };
}
