//! The panic-catching safety net around plugin calls (spec.md §4.8, §7):
//! "no plugin is trusted to not throw."

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use adaptive_load_core::{Status, StatusResult};

/// Run `f`, converting a caught panic into `Status::internal`. Every
/// synchronous plugin-trait call in this crate goes through this.
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> StatusResult<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        Status::internal(format!("plugin panicked: {}", panic_message(&payload)))
    })
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions favor unwrap over verbose matches"
)]
mod tests {
    use super::*;

    #[test]
    fn non_panicking_closure_returns_ok() {
        let result = catch_panic(|| 42);
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    #[allow(clippy::panic, reason = "exercises catch_panic's conversion of a real panic payload")]
    fn panicking_closure_is_converted_to_internal_status() {
        let result: StatusResult<()> = catch_panic(|| panic!("plugin exploded"));
        let err = result.unwrap_err();
        assert_eq!(err.code(), adaptive_load_core::Code::Internal);
        assert!(err.message().contains("plugin exploded"));
    }
}
