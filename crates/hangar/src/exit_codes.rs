//! Exit codes for the CLI

/// Success
pub const SUCCESS: i32 = 0;

/// Any fatal error
pub const ERROR: i32 = 1;
