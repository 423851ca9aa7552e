#[macro_export]
macro_rules! internal_error {
    ($arg: expr) => {{
        let internal_error_msg = format!(
            "{}\ninternal error: {}:{}:{}",
            $arg,
            file!(),
            line!(),
            column!()
        );
        tracing::error!(?internal_error_msg);
        internal_error_msg
    }};
}

/// Use this version if we know that under normal operation this can happen but
/// we wish to monitor it (a page dropped while its request was in flight).
/// Evaluates to the `Ok` value, `None` after logging the error
#[macro_export]
macro_rules! log_err_as_warn {
    ($arg: expr) => {
        match $arg {
            Ok(value) => Some(value),
            Err(mishap) => {
                tracing::warn!(?mishap);
                None
            }
        }
    };
    ($arg: expr, $msg: literal) => {
        match $arg {
            Ok(value) => Some(value),
            Err(mishap) => {
                tracing::warn!(?mishap, $msg);
                None
            }
        }
    };
}
