#[macro_export]
macro_rules! wrapper {
    // Single expression (like a function name or closure)
    ($f:expr) => {{
        $f()
    }};
    ($f:expr, $( $args:expr $(,)? )* ) => {{
        $f( $($args,)* )
    }};
}

/// Calls the wrapped function until it succeeds, the error is not retryable or the
/// retry policy runs out of attempts. The last result is returned as is.
#[macro_export]
macro_rules! retry {
    ($policy:expr, $( $args:expr$(,)? )+) => {{
        let policy: &$crate::config::RetryPolicy = $policy;
        let mut attempt: u32 = 0;
        loop {
            let res = $crate::wrapper!($( $args, )*);
            let again = match &res {
                Err(e) if attempt < policy.max_retries && $crate::macros::Retryable::is_retryable(e) => {
                    log::warn!("attempt {} failed: {}", attempt + 1, e);
                    true
                }
                _ => false,
            };
            if !again {
                break res;
            }
            let wait = policy.delay_for_attempt(attempt);
            log::info!("retrying in {} ms", wait.as_millis());
            std::thread::sleep(wait);
            attempt += 1;
        }
    }};
}

/// Errors that can tell whether repeating the failed operation may succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}
