//! Name-keyed function registry with invocation bookkeeping.
//!
//! # Responsibilities
//! - Look up registered functions by name (missing name is an error)
//! - Open the per-invocation log stream and write the START/END/REPORT
//!   lines around each invocation, the way the platform's logs look

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::constants::{AWS_REGION, FUNCTION_MEMORY_SIZE_MB};
use crate::invoke::{EdgeFunction, InvocationContext, InvokeError};
use crate::logs::store::LogStore;

/// Registry of edge functions, shared by the pipeline and the dispatcher.
pub struct FunctionRegistry {
    functions: HashMap<String, RegisteredFunction>,
    log_store: Arc<LogStore>,
}

struct RegisteredFunction {
    version: String,
    function: Arc<dyn EdgeFunction>,
}

impl FunctionRegistry {
    pub fn new(log_store: Arc<LogStore>) -> Self {
        Self {
            functions: HashMap::new(),
            log_store,
        }
    }

    /// Register a function under `name`. Later registrations replace
    /// earlier ones.
    pub fn register(&mut self, name: &str, function: Arc<dyn EdgeFunction>) {
        self.register_version(name, "1", function);
    }

    pub fn register_version(&mut self, name: &str, version: &str, function: Arc<dyn EdgeFunction>) {
        self.functions.insert(
            name.to_string(),
            RegisteredFunction {
                version: version.to_string(),
                function,
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Log group name for a function, one group per function.
    pub fn log_group_name(name: &str) -> String {
        format!("/aws/lambda/{AWS_REGION}.{name}")
    }

    /// Invoke `name` with `event`, with invocation logging around it.
    pub async fn invoke(
        &self,
        name: &str,
        request_id: &str,
        event: Value,
    ) -> Result<Value, InvokeError> {
        let registered = self
            .functions
            .get(name)
            .ok_or_else(|| InvokeError::UnknownFunction(name.to_string()))?;

        let group_name = Self::log_group_name(name);
        let group = self.log_store.group(&group_name);
        let stream = group.stream(&registered.version);

        let ctx = InvocationContext::new(
            name,
            &registered.version,
            request_id,
            &group_name,
            Arc::clone(&stream),
        );

        stream.log(&format!(
            "START RequestId: {request_id} Version: {}",
            registered.version
        ));

        let started = Instant::now();
        let result = registered.function.invoke(request_id, event, &ctx).await;

        // Durations are reported to two decimals; billing rounds up to
        // the next millisecond.
        let duration = started.elapsed().as_secs_f64() * 1000.0;
        let duration = (duration * 100.0).round() / 100.0;
        let billed = duration.ceil() as u64;

        stream.log(&format!("END RequestId: {request_id}"));
        stream.log(&format!(
            "REPORT RequestId: {request_id}\tDuration: {duration} ms\tBilled Duration: {billed} ms\tMemory Size: {FUNCTION_MEMORY_SIZE_MB} MB\tMax Memory Used: {FUNCTION_MEMORY_SIZE_MB} MB"
        ));

        if let Err(error) = &result {
            stream.log(&format!("ERROR\t{error}"));
        }

        result
    }
}
