//! Simulated platform constants.

/// Region is always us-east-1 because that's the only region Lambda@Edge
/// functions can be deployed in.
pub const AWS_REGION: &str = "us-east-1";

pub const AWS_ACCOUNT_ID: u64 = 1337;

pub const FUNCTION_MEMORY_SIZE_MB: u32 = 128;

/// Informational invocation budget. Never enforced as a deadline; only
/// subtracted from for `remaining_time_millis`.
pub const FUNCTION_TIME_LIMIT_MS: i64 = 5_000;

/// Name of the simulated point of presence, surfaced via `x-amz-cf-pop`.
pub const EDGE_POP: &str = "EDGEFRONT";
