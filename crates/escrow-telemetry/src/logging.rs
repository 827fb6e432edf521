//! Structured logging helpers.
//!
//! Every line carries consistent fields so log pipelines can index them:
//! - `subsystem`: emitting subsystem (ce-01, ce-02, ce-03, runtime)
//! - `message_id`, `sender`, `creator`, `amount` for escrow events
//! - `account`, `amount` for ledger events

/// Helper to create structured log entries with consistent formatting.
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

/// Log a message lifecycle event with standard fields.
#[macro_export]
macro_rules! log_message_event {
    ($level:ident, $subsystem:expr, $msg:expr, $message_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            message_id = %$message_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a ledger movement with standard fields.
#[macro_export]
macro_rules! log_ledger_event {
    ($level:ident, $subsystem:expr, $msg:expr, $account:expr, $amount:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            account = %$account,
            amount = $amount,
            $($($field)*,)?
            $msg
        )
    };
}
