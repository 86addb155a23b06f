//! Per-invocation context handed to the invoked function.

use std::sync::Arc;
use std::time::Instant;

use crate::constants::{
    AWS_ACCOUNT_ID, AWS_REGION, FUNCTION_MEMORY_SIZE_MB, FUNCTION_TIME_LIMIT_MS,
};
use crate::logs::store::LogStream;

/// Execution metadata for one invocation, mirroring the platform's
/// function context.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub function_name: String,
    pub function_version: String,
    pub invoked_function_arn: String,
    pub memory_limit_mb: u32,
    pub request_id: String,
    pub log_group_name: String,
    pub log_stream_name: String,
    stream: Arc<LogStream>,
    started: Instant,
}

impl InvocationContext {
    pub fn new(
        function_name: &str,
        function_version: &str,
        request_id: &str,
        log_group_name: &str,
        stream: Arc<LogStream>,
    ) -> Self {
        Self {
            function_name: function_name.to_string(),
            function_version: function_version.to_string(),
            invoked_function_arn: format!(
                "arn:aws:lambda:{AWS_REGION}:{AWS_ACCOUNT_ID}:aws:function:{function_name}"
            ),
            memory_limit_mb: FUNCTION_MEMORY_SIZE_MB,
            request_id: request_id.to_string(),
            log_group_name: log_group_name.to_string(),
            log_stream_name: stream.name().to_string(),
            stream,
            started: Instant::now(),
        }
    }

    /// Milliseconds left of the fixed invocation budget. Informational:
    /// nothing cancels the invocation when this reaches zero.
    pub fn remaining_time_millis(&self) -> i64 {
        FUNCTION_TIME_LIMIT_MS - self.started.elapsed().as_millis() as i64
    }

    /// Ship a log line to the invocation's log stream. This is how a
    /// function's output reaches the subscription dispatcher.
    pub fn log(&self, line: &str) {
        self.stream.log(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::store::LogStore;

    #[test]
    fn test_context_fields() {
        let store = LogStore::new();
        let group = store.group("/aws/lambda/us-east-1.auth");
        let stream = group.stream("1");
        let ctx = InvocationContext::new("auth", "1", "req1", group.name(), stream);

        assert_eq!(
            ctx.invoked_function_arn,
            "arn:aws:lambda:us-east-1:1337:aws:function:auth"
        );
        assert_eq!(ctx.memory_limit_mb, 128);
        assert!(ctx.remaining_time_millis() <= FUNCTION_TIME_LIMIT_MS);
        assert!(ctx.remaining_time_millis() > 0);
    }

    #[test]
    fn test_context_log_lands_in_stream() {
        let store = LogStore::new();
        let group = store.group("g");
        let stream = group.stream("1");
        let ctx = InvocationContext::new("f", "1", "req1", "g", Arc::clone(&stream));
        ctx.log("hello");
        assert_eq!(stream.lines(), vec!["hello"]);
    }
}
