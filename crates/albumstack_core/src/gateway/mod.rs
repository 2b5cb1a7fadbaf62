//! Local emulator of the managed gateway.
//!
//! # Responsibility
//! - Match requests to declared routes and run the validation gate.
//! - Drive request template -> table -> response template selection.
//! - Emit one access record and one trace segment per request.
//!
//! # Invariants
//! - Only routes declared in the manifest are reachable.
//! - Requests rejected by the gate never reach the table.
//! - Response bodies come only from templates or fixed gateway messages.

pub mod routing;
pub mod telemetry;

use crate::manifest::resources::{HttpMethod, RouteSpec};
use crate::manifest::{ManifestValidationError, StackManifest};
use crate::mapping::{select_integration_response, TemplateContext, INTERNAL_ERROR_MESSAGE};
use crate::store::TableStore;
use chrono::Utc;
use log::{info, warn};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;
use telemetry::{
    format_request_time, AccessLogRecord, TelemetrySink, TraceHttp, TraceSegment, ABSENT_FIELD,
};
use uuid::Uuid;

pub use routing::match_path;
pub use telemetry::{LogTelemetrySink, MemoryTelemetrySink};

pub const REQUEST_ID_HEADER: &str = "x-amzn-RequestId";
pub const TRACE_ID_HEADER: &str = "X-Amzn-Trace-Id";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

pub const MISSING_AUTH_TOKEN_MESSAGE: &str = "Missing Authentication Token";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// Inbound request as the gateway sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    pub method: String,
    /// Raw path, possibly percent-encoded and with a query string.
    pub path: String,
    pub body: Option<String>,
    pub source_ip: String,
    pub protocol: String,
    pub caller: Option<String>,
    pub user: Option<String>,
}

impl GatewayRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
            source_ip: "127.0.0.1".to_string(),
            protocol: "HTTP/1.1".to_string(),
            caller: None,
            user: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }
}

/// Public response.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// `None` renders as an empty body.
    pub body: Option<Value>,
}

impl GatewayResponse {
    fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    fn message(status: u16, message: &str) -> Self {
        Self::new(status, Some(json!({ "message": message })))
    }

    /// Serialized body text; empty when there is no body.
    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Gateway emulator over a validated manifest and a table store.
pub struct Gateway<S: TableStore, T: TelemetrySink = LogTelemetrySink> {
    manifest: StackManifest,
    store: S,
    telemetry: T,
}

impl<S: TableStore> Gateway<S, LogTelemetrySink> {
    /// Creates a gateway that writes telemetry through the `log` facade.
    pub fn new(manifest: StackManifest, store: S) -> Result<Self, ManifestValidationError> {
        Self::with_telemetry(manifest, store, LogTelemetrySink)
    }
}

impl<S: TableStore, T: TelemetrySink> Gateway<S, T> {
    /// # Errors
    /// - Returns the first manifest validation error; an invalid graph is
    ///   never served.
    pub fn with_telemetry(
        manifest: StackManifest,
        store: S,
        telemetry: T,
    ) -> Result<Self, ManifestValidationError> {
        manifest.validate()?;
        info!(
            "event=gateway_init module=gateway status=ok api={} stage={} routes={}",
            manifest.api.name,
            manifest.api.stage.name,
            manifest.api.routes.len()
        );
        Ok(Self {
            manifest,
            store,
            telemetry,
        })
    }

    pub fn manifest(&self) -> &StackManifest {
        &self.manifest
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    /// Handles one request end to end.
    pub fn handle(&self, request: &GatewayRequest) -> GatewayResponse {
        let started_at = Instant::now();
        let received_at = Utc::now();
        let request_id = Uuid::new_v4().to_string();

        let (resource_path, mut response) = match self.resolve(request) {
            Some((route, params)) => (route.path.clone(), self.dispatch(route, request, params)),
            None => (
                request.path.clone(),
                GatewayResponse::message(403, MISSING_AUTH_TOKEN_MESSAGE),
            ),
        };

        let finished_at = Utc::now();
        let segment = TraceSegment {
            trace_id: TraceSegment::new_trace_id(received_at),
            id: TraceSegment::new_segment_id(),
            name: format!("{}/{}", self.manifest.api.name, self.manifest.api.stage.name),
            start_time: epoch_seconds(received_at),
            end_time: epoch_seconds(finished_at),
            http: TraceHttp {
                method: request.method.to_ascii_uppercase(),
                path: resource_path.clone(),
                status: response.status,
            },
            error: (400..500).contains(&response.status),
            fault: response.status >= 500,
        };

        response
            .headers
            .insert(REQUEST_ID_HEADER.to_string(), request_id.clone());
        if self.manifest.api.stage.tracing_enabled {
            response
                .headers
                .insert(TRACE_ID_HEADER.to_string(), segment.header_value());
        }
        if response.body.is_some() {
            response
                .headers
                .insert(CONTENT_TYPE_HEADER.to_string(), "application/json".to_string());
        }

        let record = AccessLogRecord {
            request_id: request_id.clone(),
            caller: request.caller.clone().unwrap_or_else(|| ABSENT_FIELD.to_string()),
            http_method: request.method.to_ascii_uppercase(),
            ip: request.source_ip.clone(),
            protocol: request.protocol.clone(),
            request_time: format_request_time(received_at),
            resource_path,
            response_length: response.body_text().len(),
            status: response.status,
            user: request.user.clone().unwrap_or_else(|| ABSENT_FIELD.to_string()),
        };
        self.telemetry.record_access(&record);
        if self.manifest.api.stage.tracing_enabled {
            self.telemetry.record_segment(&segment);
        }

        info!(
            "event=gateway_request module=gateway status={} method={} resource={} request_id={} duration_ms={}",
            response.status,
            record.http_method,
            record.resource_path,
            request_id,
            started_at.elapsed().as_millis()
        );
        response
    }

    fn resolve(&self, request: &GatewayRequest) -> Option<(&RouteSpec, BTreeMap<String, String>)> {
        let method = HttpMethod::parse(&request.method)?;
        self.manifest
            .api
            .routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| match_path(&route.path, &request.path).map(|params| (route, params)))
    }

    fn dispatch(
        &self,
        route: &RouteSpec,
        request: &GatewayRequest,
        path_params: BTreeMap<String, String>,
    ) -> GatewayResponse {
        let ctx = match self.gate(route, request, path_params) {
            Ok(ctx) => ctx,
            Err(rejection) => return rejection,
        };

        let native_request = match route
            .request_template
            .render(&self.manifest.table.table_name, &ctx)
        {
            Ok(native_request) => native_request,
            Err(err) => {
                warn!(
                    "event=request_template module=gateway status=error route={} error={err}",
                    route.route_key()
                );
                return GatewayResponse::message(500, INTERNAL_ERROR_MESSAGE);
            }
        };

        let native_response = self.store.execute(&native_request);
        let Some(integration) =
            select_integration_response(&route.integration_responses, native_response.status)
        else {
            return GatewayResponse::message(500, INTERNAL_ERROR_MESSAGE);
        };

        match integration.template.render(&native_response, &ctx) {
            Ok(rendered) => GatewayResponse::new(
                rendered.status_override.unwrap_or(integration.status_code),
                rendered.body,
            ),
            Err(err) => {
                warn!(
                    "event=response_template module=gateway status=error route={} native_status={} error={err}",
                    route.route_key(),
                    native_response.status
                );
                GatewayResponse::message(500, INTERNAL_ERROR_MESSAGE)
            }
        }
    }

    /// Validation gate: body against the route model, then required params.
    fn gate(
        &self,
        route: &RouteSpec,
        request: &GatewayRequest,
        path_params: BTreeMap<String, String>,
    ) -> Result<TemplateContext, GatewayResponse> {
        let validated = route.request_validator.is_some();
        let validator = &self.manifest.request_validator;

        let body = match request.body.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => match serde_json::from_str::<Value>(text) {
                Ok(value) => Some(value),
                Err(_) if validated && route.request_model.is_some() => {
                    return Err(GatewayResponse::message(400, INVALID_BODY_MESSAGE));
                }
                Err(_) => None,
            },
            _ => None,
        };

        if validated && validator.validate_request_body {
            if let Some(model) = route
                .request_model
                .as_deref()
                .and_then(|name| self.manifest.find_model(name))
            {
                let outcome = match &body {
                    Some(value) => model.schema.validate(value).map_err(|err| err.to_string()),
                    None => Err("missing body".to_string()),
                };
                if let Err(reason) = outcome {
                    warn!(
                        "event=validation_gate module=gateway status=rejected route={} reason={reason}",
                        route.route_key()
                    );
                    return Err(GatewayResponse::message(400, INVALID_BODY_MESSAGE));
                }
            }
        }

        if validated && validator.validate_request_parameters {
            let missing: Vec<&str> = route
                .required_path_params
                .iter()
                .map(String::as_str)
                .filter(|name| {
                    path_params
                        .get(*name)
                        .map_or(true, |value| value.trim().is_empty())
                })
                .collect();
            if !missing.is_empty() {
                warn!(
                    "event=validation_gate module=gateway status=rejected route={} missing_params={}",
                    route.route_key(),
                    missing.join(",")
                );
                return Err(GatewayResponse::message(
                    400,
                    &missing_params_message(&route.required_path_params),
                ));
            }
        }

        Ok(TemplateContext { body, path_params })
    }
}

/// Message the gate returns when required path parameters are blank.
pub fn missing_params_message(required: &[String]) -> String {
    format!(
        "Missing required request parameters: [{}]",
        required.join(", ")
    )
}

fn epoch_seconds(at: chrono::DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
