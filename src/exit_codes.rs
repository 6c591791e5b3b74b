//! Exit code constants for the segtext CLI.
//!
//! - 0: Success
//! - 1: User error (bad arguments, unreadable config or context)
//! - 2: Render failure (compile, missing field, missing segment)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, malformed context.
pub const USER_ERROR: i32 = 1;

/// Render failure: the template did not compile or failed while executing.
pub const RENDER_FAILURE: i32 = 2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, RENDER_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
        assert_eq!(RENDER_FAILURE, 2);
    }
}
