//! Edge request pipeline: the multi-stage invoke-or-passthrough state
//! machine.
//!
//! # Data Flow
//! ```text
//! inbound connection
//!     → VIEWER_REQUEST  (invoke bound function, or pass through)
//!     → ORIGIN_REQUEST  (decorate with viewer/geo headers, bind origin,
//!                        invoke bound function, or pass through)
//!     → FETCH_ORIGIN    (real outbound fetch)
//!     → RESPOND         (inject simulated edge headers, write out)
//! ```
//!
//! # Design Decisions
//! - An invocation failure at any invoke step is absorbed into a
//!   generated 500 response; the pipeline short-circuits to RESPOND
//! - A response produced at the origin-request stage is written as that
//!   stage's result. The observed platform emulator rewrote the viewer
//!   stage's result here instead; that was a copy-paste bug and is
//!   deliberately not preserved
//! - A fetch failure is also absorbed into a generated 500 response so
//!   the client always sees the formatted error
//! - `viewer-response`/`origin-response` bindings are accepted by the
//!   config but never invoked; they are an extension point
//! - No stage is retried and no stage enforces a deadline

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use thiserror::Error;

use crate::config::{EmulatorConfig, EventType};
use crate::edge::event::{classify, construct_request_event, EventResult};
use crate::edge::request::{construct_origin_request, construct_viewer_request, EdgeRequest};
use crate::edge::response::{
    generate_error_response, into_client_response, EdgeResponse, WriteOptions,
};
use crate::edge::viewer::construct_viewer;
use crate::http::body::EdgeBody;
use crate::http::headers::Headers;
use crate::invoke::FunctionRegistry;
use crate::origin::OriginClient;
use crate::routing::{resolve, Resolution, SelectionError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("request does not have a 'Host' header, without it the distribution cannot be selected")]
    MissingHost,

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// The raw inbound message, already read off the connection.
#[derive(Debug)]
pub struct InboundRequest {
    pub remote_addr: SocketAddr,
    pub secure: bool,
    pub http_version: String,
    pub method: String,
    /// Request target as received: path plus optional querystring.
    pub raw_path: String,
    pub headers: Headers,
    pub body: Option<EdgeBody>,
}

/// Orchestrates one connection through the pipeline stages.
pub struct EdgePipeline {
    config: Arc<EmulatorConfig>,
    registry: Arc<FunctionRegistry>,
    origin_client: Arc<OriginClient>,
}

impl EdgePipeline {
    pub fn new(
        config: Arc<EmulatorConfig>,
        registry: Arc<FunctionRegistry>,
        origin_client: Arc<OriginClient>,
    ) -> Self {
        Self {
            config,
            registry,
            origin_client,
        }
    }

    /// Drive one inbound request to a client-facing response.
    ///
    /// Selection failures are raised to the host; everything after
    /// resolution produces a response.
    pub async fn handle(&self, inbound: InboundRequest) -> Result<Response<Body>, PipelineError> {
        let id = uuid::Uuid::new_v4().simple().to_string();

        let host = inbound
            .headers
            .get("host")
            .map(str::to_string)
            .ok_or(PipelineError::MissingHost)?;
        let path = inbound.raw_path.split('?').next().unwrap_or("/");

        let resolution = resolve(&self.config.distributions, &host, path)?;
        let viewer = construct_viewer(
            inbound.remote_addr,
            inbound.secure,
            &inbound.http_version,
            &inbound.headers,
        );

        tracing::debug!(
            request_id = %id,
            method = %inbound.method,
            path = %inbound.raw_path,
            distribution = %resolution.distribution.id,
            origin = %resolution.origin.name,
            "Handling edge request"
        );

        // VIEWER_REQUEST
        let viewer_request = construct_viewer_request(
            &viewer,
            &inbound.method,
            &inbound.raw_path,
            inbound.headers,
            inbound.body,
        );

        let viewer_result = self
            .handle_request_event(&resolution, EventType::ViewerRequest, viewer_request, &id)
            .await;
        let request = match viewer_result {
            EventResult::Response(response) => {
                return Ok(self.respond(&id, &host, &inbound.method, response, true));
            }
            EventResult::Request(request) => request,
        };

        // ORIGIN_REQUEST
        let origin_request = construct_origin_request(&id, request, &viewer, resolution.origin);

        let origin_result = self
            .handle_request_event(&resolution, EventType::OriginRequest, origin_request, &id)
            .await;
        let request = match origin_result {
            EventResult::Response(response) => {
                return Ok(self.respond(&id, &host, &inbound.method, response, true));
            }
            EventResult::Request(request) => request,
        };

        // FETCH_ORIGIN
        match self.origin_client.fetch(&request).await {
            Ok(response) => Ok(self.respond(&id, &host, &inbound.method, response, false)),
            Err(error) => {
                tracing::error!(request_id = %id, error = %error, "Origin fetch failed");
                Ok(self.respond(&id, &host, &inbound.method, generate_error_response(&error), true))
            }
        }
    }

    /// Invoke the function bound to `event_type`, if any. No binding is a
    /// passthrough; an invocation or classification failure becomes a
    /// generated error response.
    async fn handle_request_event(
        &self,
        resolution: &Resolution<'_>,
        event_type: EventType,
        request: EdgeRequest,
        id: &str,
    ) -> EventResult {
        let Some(function_name) = resolution.behavior.functions.get(&event_type) else {
            return EventResult::Request(request);
        };

        let event = construct_request_event(id, event_type, resolution.distribution, &request);

        match self.registry.invoke(function_name, id, event).await {
            Ok(value) => match classify(value) {
                Ok(result) => result,
                Err(error) => {
                    tracing::error!(
                        request_id = %id,
                        function = %function_name,
                        event_type = %event_type,
                        error = %error,
                        "Function result could not be classified"
                    );
                    EventResult::Response(generate_error_response(&error))
                }
            },
            Err(error) => {
                tracing::error!(
                    request_id = %id,
                    function = %function_name,
                    event_type = %event_type,
                    error = %error,
                    "Function invocation failed"
                );
                EventResult::Response(generate_error_response(&error))
            }
        }
    }

    fn respond(
        &self,
        id: &str,
        host: &str,
        method: &str,
        response: EdgeResponse,
        generated: bool,
    ) -> Response<Body> {
        tracing::info!(
            request_id = %id,
            method = %method,
            status = response.status,
            tag = if generated { "generated" } else { "miss" },
            "Edge response"
        );

        into_client_response(
            response,
            &WriteOptions {
                id: id.to_string(),
                host: host.to_string(),
                generated,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BehaviorConfig, DistributionConfig, OriginConfig};
    use crate::invoke::{EdgeFunction, InvocationContext, InvokeError};
    use crate::logs::LogStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn config(functions: HashMap<EventType, String>) -> Arc<EmulatorConfig> {
        Arc::new(EmulatorConfig {
            distributions: vec![DistributionConfig {
                id: "DIST1".to_string(),
                domains: vec!["shop.example".to_string()],
                origins: vec![OriginConfig {
                    name: "api".to_string(),
                    protocol: "http".to_string(),
                    // Nothing listens here; FETCH_ORIGIN must not be
                    // reached by the short-circuit tests.
                    domain: "127.0.0.1".to_string(),
                    port: 9,
                    path: String::new(),
                    headers: HashMap::new(),
                }],
                behaviors: vec![BehaviorConfig {
                    pattern: "/**".to_string(),
                    origin: "api".to_string(),
                    functions,
                }],
            }],
            ..Default::default()
        })
    }

    fn inbound(path: &str) -> InboundRequest {
        InboundRequest {
            remote_addr: "192.0.2.7:40000".parse().unwrap(),
            secure: false,
            http_version: "1.1".to_string(),
            method: "GET".to_string(),
            raw_path: path.to_string(),
            headers: Headers::from([("host", "shop.example")]),
            body: None,
        }
    }

    fn pipeline(
        config: Arc<EmulatorConfig>,
        register: impl FnOnce(&mut FunctionRegistry),
    ) -> EdgePipeline {
        let store = Arc::new(LogStore::new());
        let mut registry = FunctionRegistry::new(store);
        register(&mut registry);
        EdgePipeline::new(config, Arc::new(registry), Arc::new(OriginClient::new()))
    }

    struct Respond(Value);

    #[async_trait]
    impl EdgeFunction for Respond {
        async fn invoke(
            &self,
            _request_id: &str,
            _event: Value,
            _ctx: &InvocationContext,
        ) -> Result<Value, InvokeError> {
            Ok(self.0.clone())
        }
    }

    struct Throws;

    #[async_trait]
    impl EdgeFunction for Throws {
        async fn invoke(
            &self,
            _request_id: &str,
            _event: Value,
            _ctx: &InvocationContext,
        ) -> Result<Value, InvokeError> {
            Err(InvokeError::failed("handler exploded"))
        }
    }

    /// Records how often it ran, then passes the request through.
    struct CountingPassthrough(Arc<AtomicU32>);

    #[async_trait]
    impl EdgeFunction for CountingPassthrough {
        async fn invoke(
            &self,
            _request_id: &str,
            event: Value,
            _ctx: &InvocationContext,
        ) -> Result<Value, InvokeError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(event["Records"][0]["cf"]["request"].clone())
        }
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_viewer_request_response_short_circuits_origin() {
        let bindings = HashMap::from([
            (EventType::ViewerRequest, "respond".to_string()),
            (EventType::OriginRequest, "counter".to_string()),
        ]);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_fn = Arc::new(CountingPassthrough(Arc::clone(&counter)));
        let pipeline = pipeline(config(bindings), |registry| {
            registry.register(
                "respond",
                Arc::new(Respond(json!({
                    "status": "200",
                    "statusDescription": "OK",
                    "headers": {},
                    "body": "from the edge",
                }))),
            );
            registry.register("counter", counter_fn);
        });

        let response = pipeline.handle(inbound("/anything")).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("x-cache").unwrap(),
            "LambdaGeneratedResponse from cloudfront"
        );
        assert_eq!(body_string(response).await, "from the edge");

        // The origin-request stage never ran.
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_viewer_request_failure_becomes_500_and_stops_pipeline() {
        let bindings = HashMap::from([
            (EventType::ViewerRequest, "throws".to_string()),
            (EventType::OriginRequest, "counter".to_string()),
        ]);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_fn = Arc::new(CountingPassthrough(Arc::clone(&counter)));
        let pipeline = pipeline(config(bindings), |registry| {
            registry.register("throws", Arc::new(Throws));
            registry.register("counter", counter_fn);
        });

        let response = pipeline.handle(inbound("/x")).await.unwrap();
        assert_eq!(response.status(), 500);
        let body = body_string(response).await;
        assert!(body.contains("AWS Lambda@Edge Error"));
        assert!(body.contains("handler exploded"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_origin_request_response_is_the_origin_stages_result() {
        // The viewer stage mutates the request; the origin stage responds.
        // The written response must be the origin stage's, not anything
        // derived from the viewer stage.
        struct RewritingPassthrough;

        #[async_trait]
        impl EdgeFunction for RewritingPassthrough {
            async fn invoke(
                &self,
                _request_id: &str,
                event: Value,
                _ctx: &InvocationContext,
            ) -> Result<Value, InvokeError> {
                let mut request = event["Records"][0]["cf"]["request"].clone();
                request["uri"] = json!("/rewritten");
                Ok(request)
            }
        }

        let bindings = HashMap::from([
            (EventType::ViewerRequest, "rewrite".to_string()),
            (EventType::OriginRequest, "respond".to_string()),
        ]);
        let pipeline = pipeline(config(bindings), |registry| {
            registry.register("rewrite", Arc::new(RewritingPassthrough));
            registry.register(
                "respond",
                Arc::new(Respond(json!({
                    "status": 418,
                    "statusDescription": "I'm a teapot",
                    "body": "origin stage response",
                }))),
            );
        });

        let response = pipeline.handle(inbound("/x")).await.unwrap();
        assert_eq!(response.status(), 418);
        assert_eq!(
            response.headers().get("x-cache").unwrap(),
            "LambdaGeneratedResponse from cloudfront"
        );
        assert_eq!(body_string(response).await, "origin stage response");
    }

    #[tokio::test]
    async fn test_unclassifiable_result_becomes_500() {
        let bindings = HashMap::from([(EventType::ViewerRequest, "weird".to_string())]);
        let pipeline = pipeline(config(bindings), |registry| {
            registry.register("weird", Arc::new(Respond(json!({"nonsense": true}))));
        });

        let response = pipeline.handle(inbound("/x")).await.unwrap();
        assert_eq!(response.status(), 500);
        let body = body_string(response).await;
        assert!(body.contains("AWS Lambda@Edge Error"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_absorbed_into_generated_500() {
        // No functions bound; the fetch goes to a port nothing listens on.
        let pipeline = pipeline(config(HashMap::new()), |_| {});

        let response = pipeline.handle(inbound("/x")).await.unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(
            response.headers().get("x-cache").unwrap(),
            "LambdaGeneratedResponse from cloudfront"
        );
        let body = body_string(response).await;
        assert!(body.contains("AWS Lambda@Edge Error"));
    }

    #[tokio::test]
    async fn test_selection_errors_are_raised_to_the_host() {
        let pipeline = pipeline(config(HashMap::new()), |_| {});

        let mut unmatched = inbound("/x");
        unmatched.headers.set("host", "unknown.example");
        let err = pipeline.handle(unmatched).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Selection(SelectionError::HostUnmatched(_))
        ));

        let mut hostless = inbound("/x");
        hostless.headers.remove("host");
        let err = pipeline.handle(hostless).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingHost));
    }

    #[tokio::test]
    async fn test_passthrough_functions_see_the_event_envelope() {
        struct AssertingPassthrough;

        #[async_trait]
        impl EdgeFunction for AssertingPassthrough {
            async fn invoke(
                &self,
                request_id: &str,
                event: Value,
                ctx: &InvocationContext,
            ) -> Result<Value, InvokeError> {
                let config = &event["Records"][0]["cf"]["config"];
                assert_eq!(config["distributionId"], "DIST1");
                assert_eq!(config["eventType"], "origin-request");
                assert_eq!(config["requestId"], request_id);

                let request = &event["Records"][0]["cf"]["request"];
                assert_eq!(request["origin"]["custom"]["domainName"], "127.0.0.1");
                // The decorated headers carry the simulated viewer data.
                assert!(request["headers"]["cloudfront-viewer-country"][0]["value"]
                    .as_str()
                    .is_some());
                assert!(ctx.remaining_time_millis() > 0);

                Ok(json!({"status": "204"}))
            }
        }

        let bindings = HashMap::from([(EventType::OriginRequest, "assert".to_string())]);
        let pipeline = pipeline(config(bindings), |registry| {
            registry.register("assert", Arc::new(AssertingPassthrough));
        });

        let response = pipeline.handle(inbound("/x")).await.unwrap();
        assert_eq!(response.status(), 204);
    }

    #[tokio::test]
    async fn test_invocation_logs_accumulate_in_the_store() {
        let store = Arc::new(LogStore::new());
        let mut registry = FunctionRegistry::new(Arc::clone(&store));
        registry.register(
            "respond",
            Arc::new(Respond(json!({"status": "200", "body": "ok"}))),
        );
        let bindings = HashMap::from([(EventType::ViewerRequest, "respond".to_string())]);
        let pipeline = EdgePipeline::new(
            config(bindings),
            Arc::new(registry),
            Arc::new(OriginClient::new()),
        );

        pipeline.handle(inbound("/x")).await.unwrap();

        let group = store.group(&FunctionRegistry::log_group_name("respond"));
        let lines = group.streams()[0].lines();
        assert!(lines.iter().any(|line| line.starts_with("START")));
        assert!(lines.iter().any(|line| line.starts_with("REPORT")));
    }
}
