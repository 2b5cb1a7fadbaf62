//! Declarative resource graph of the album stack.
//!
//! # Responsibility
//! - Declare the table, gateway routes, validator, model, role and log group.
//! - Check structural invariants of the graph before it is used or emitted.
//! - Synthesize the graph to deterministic JSON.
//!
//! # Invariants
//! - The gateway exposes exactly three routes, unique by method and path.
//! - Every route action is granted to the gateway role on the table.
//! - Route templates, models and validators reference declared resources.

pub mod resources;
pub mod schema;

use crate::config::StackConfig;
use crate::mapping::templates::{ALBUM_PARAM, ARTIST_PARAM};
use crate::mapping::{IntegrationResponse, RequestTemplate, ResponseTemplate};
use resources::{
    AccessLogSpec, AttributeType, BillingMode, Effect, HttpMethod, KeyAttribute, LogGroupSpec,
    ModelSpec, PolicyStatement, RemovalPolicy, RequestValidatorSpec, RestApiSpec, RoleSpec,
    RouteSpec, StageSpec, TableAction, TableSpec,
};
use schema::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ALBUM_MODEL_NAME: &str = "AlbumInputModel";
pub const VALIDATOR_NAME: &str = "AlbumRequestValidator";
pub const GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";
pub const EXPECTED_ROUTE_COUNT: usize = 3;

const TRACE_ACTIONS: &[&str] = &["xray:PutTraceSegments", "xray:PutTelemetryRecords"];
const LOG_RETENTION_DAYS: u32 = 731;

/// Access log fields and the gateway context variables they are filled from.
pub const ACCESS_LOG_FIELDS: &[(&str, &str)] = &[
    ("caller", "$context.identity.caller"),
    ("httpMethod", "$context.httpMethod"),
    ("ip", "$context.identity.sourceIp"),
    ("protocol", "$context.protocol"),
    ("requestId", "$context.requestId"),
    ("requestTime", "$context.requestTime"),
    ("resourcePath", "$context.resourcePath"),
    ("responseLength", "$context.responseLength"),
    ("status", "$context.status"),
    ("user", "$context.identity.user"),
];

/// Whole declared resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackManifest {
    pub table: TableSpec,
    pub api: RestApiSpec,
    pub request_validator: RequestValidatorSpec,
    pub models: Vec<ModelSpec>,
    pub role: RoleSpec,
    pub log_group: LogGroupSpec,
}

impl StackManifest {
    /// Declares the album stack for `config`.
    pub fn declare(config: &StackConfig) -> Self {
        let table = TableSpec {
            table_name: config.table_name.clone(),
            partition_key: KeyAttribute::string(ARTIST_PARAM),
            sort_key: KeyAttribute::string(ALBUM_PARAM),
            billing_mode: BillingMode::PayPerRequest,
            removal_policy: RemovalPolicy::Destroy,
        };

        let routes = vec![
            RouteSpec {
                method: HttpMethod::Post,
                path: "/create-album".to_string(),
                action: TableAction::PutItem,
                request_template: RequestTemplate::PutAlbum,
                integration_responses: IntegrationResponse::route_set(
                    204,
                    ResponseTemplate::PutAlbum,
                ),
                method_responses: vec![204, 400, 500],
                request_validator: Some(VALIDATOR_NAME.to_string()),
                request_model: Some(ALBUM_MODEL_NAME.to_string()),
                required_path_params: Vec::new(),
            },
            RouteSpec {
                method: HttpMethod::Get,
                path: "/".to_string(),
                action: TableAction::Scan,
                request_template: RequestTemplate::ScanAlbums,
                integration_responses: IntegrationResponse::route_set(
                    200,
                    ResponseTemplate::ScanAlbums,
                ),
                method_responses: vec![200, 400, 500],
                request_validator: None,
                request_model: None,
                required_path_params: Vec::new(),
            },
            RouteSpec {
                method: HttpMethod::Delete,
                path: format!("/delete-album/{{{ARTIST_PARAM}}}/{{{ALBUM_PARAM}}}"),
                action: TableAction::DeleteItem,
                request_template: RequestTemplate::DeleteAlbum,
                integration_responses: IntegrationResponse::route_set(
                    200,
                    ResponseTemplate::DeleteAlbum,
                ),
                method_responses: vec![200, 400, 404, 500],
                request_validator: Some(VALIDATOR_NAME.to_string()),
                request_model: None,
                required_path_params: vec![ARTIST_PARAM.to_string(), ALBUM_PARAM.to_string()],
            },
        ];

        let access_log = AccessLogSpec {
            destination_arn: config.log_group_arn(),
            format: ACCESS_LOG_FIELDS
                .iter()
                .map(|(field, variable)| (field.to_string(), variable.to_string()))
                .collect(),
        };

        let table_arn = config.table_arn();
        let role = RoleSpec {
            name: format!("{}IntegrationRole", config.api_name),
            assumed_by: GATEWAY_PRINCIPAL.to_string(),
            statements: vec![
                PolicyStatement {
                    effect: Effect::Allow,
                    action: routes
                        .iter()
                        .map(|route| route.action.permission().to_string())
                        .collect(),
                    resource: vec![table_arn],
                },
                PolicyStatement {
                    effect: Effect::Allow,
                    action: TRACE_ACTIONS.iter().map(|action| action.to_string()).collect(),
                    resource: vec!["*".to_string()],
                },
            ],
        };

        Self {
            table,
            api: RestApiSpec {
                name: config.api_name.clone(),
                description: "Album catalogue backed directly by a keyed table".to_string(),
                stage: StageSpec {
                    name: config.stage_name.clone(),
                    tracing_enabled: true,
                    access_log,
                },
                routes,
            },
            request_validator: RequestValidatorSpec {
                name: VALIDATOR_NAME.to_string(),
                validate_request_body: true,
                validate_request_parameters: true,
            },
            models: vec![ModelSpec {
                name: ALBUM_MODEL_NAME.to_string(),
                content_type: "application/json".to_string(),
                schema: album_input_schema(),
            }],
            role,
            log_group: LogGroupSpec {
                log_group_name: config.log_group_name.clone(),
                retention_days: LOG_RETENTION_DAYS,
                removal_policy: RemovalPolicy::Destroy,
            },
        }
    }

    pub fn find_route(&self, method: HttpMethod, path: &str) -> Option<&RouteSpec> {
        self.api
            .routes
            .iter()
            .find(|route| route.method == method && route.path == path)
    }

    pub fn find_model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|model| model.name == name)
    }

    /// Table resource identifier recovered from the role grant.
    fn table_resource(&self) -> Option<&str> {
        let suffix = format!(":table/{}", self.table.table_name);
        self.role
            .statements
            .iter()
            .flat_map(|statement| statement.resource.iter())
            .map(String::as_str)
            .find(|resource| resource.ends_with(&suffix))
    }

    /// Validates declaration-level invariants of the graph.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        require_name(&self.table.table_name, "table_name")?;
        require_name(&self.api.name, "api_name")?;
        require_name(&self.api.stage.name, "stage_name")?;
        require_name(&self.log_group.log_group_name, "log_group_name")?;

        for key in [&self.table.partition_key, &self.table.sort_key] {
            require_name(&key.name, "key_attribute")?;
            if key.attribute_type != AttributeType::S {
                return Err(ManifestValidationError::UnsupportedKeyType(key.name.clone()));
            }
        }
        if self.table.partition_key.name == self.table.sort_key.name {
            return Err(ManifestValidationError::DuplicateKeyAttribute(
                self.table.partition_key.name.clone(),
            ));
        }

        if self.api.routes.len() != EXPECTED_ROUTE_COUNT {
            return Err(ManifestValidationError::RouteCount(self.api.routes.len()));
        }

        let mut seen = BTreeSet::new();
        for route in &self.api.routes {
            let route_key = route.route_key();
            if !seen.insert(route_key.clone()) {
                return Err(ManifestValidationError::DuplicateRoute(route_key));
            }
            self.validate_route(route)?;
        }

        if !self.request_validator.validate_request_body
            || !self.request_validator.validate_request_parameters
        {
            return Err(ManifestValidationError::IncompleteValidator);
        }

        let table_resource = self
            .table_resource()
            .ok_or(ManifestValidationError::MissingPermission("table resource".to_string()))?;
        for route in &self.api.routes {
            let permission = route.action.permission();
            if !self.role.allows(permission, table_resource) {
                return Err(ManifestValidationError::MissingPermission(
                    permission.to_string(),
                ));
            }
        }
        if self.api.stage.tracing_enabled {
            for action in TRACE_ACTIONS {
                if !self.role.allows(action, "*") {
                    return Err(ManifestValidationError::MissingPermission(
                        action.to_string(),
                    ));
                }
            }
        }

        let expected_destination = format!("log-group:{}", self.log_group.log_group_name);
        if !self
            .api
            .stage
            .access_log
            .destination_arn
            .ends_with(&expected_destination)
        {
            return Err(ManifestValidationError::AccessLogDestinationMismatch(
                self.api.stage.access_log.destination_arn.clone(),
            ));
        }

        Ok(())
    }

    fn validate_route(&self, route: &RouteSpec) -> Result<(), ManifestValidationError> {
        let route_key = route.route_key();
        let defaults = route
            .integration_responses
            .iter()
            .filter(|response| response.is_default())
            .count();
        if defaults != 1 {
            return Err(ManifestValidationError::DefaultResponseCount {
                route: route_key,
                count: defaults,
            });
        }
        for response in &route.integration_responses {
            if !route.method_responses.contains(&response.status_code) {
                return Err(ManifestValidationError::UndeclaredMethodResponse {
                    route: route_key,
                    status: response.status_code,
                });
            }
        }

        if let Some(validator) = &route.request_validator {
            if validator != &self.request_validator.name {
                return Err(ManifestValidationError::UnknownValidator {
                    route: route_key,
                    validator: validator.clone(),
                });
            }
        }

        if let Some(model_name) = &route.request_model {
            let model = self.find_model(model_name).ok_or_else(|| {
                ManifestValidationError::UnknownModel {
                    route: route_key.clone(),
                    model: model_name.clone(),
                }
            })?;
            for key in [&self.table.partition_key.name, &self.table.sort_key.name] {
                if !model.schema.required.contains(key) {
                    return Err(ManifestValidationError::ModelMissingKey {
                        model: model.name.clone(),
                        key: key.clone(),
                    });
                }
            }
        }

        let declared: Vec<&str> = route.path_param_names();
        for param in &route.required_path_params {
            if !declared.contains(&param.as_str()) {
                return Err(ManifestValidationError::UnknownPathParam {
                    route: route_key,
                    param: param.clone(),
                });
            }
        }

        Ok(())
    }

    /// Renders the graph as pretty, deterministic JSON.
    pub fn synthesize(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Resource counts by kind, for summaries.
    pub fn resource_summary(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("table", 1),
            ("route", self.api.routes.len()),
            ("request_validator", 1),
            ("model", self.models.len()),
            ("role", 1),
            ("log_group", 1),
        ])
    }
}

/// Request model of the create route.
///
/// `tracks` entries carry `title` and `length`, the same names the put
/// template reads.
pub fn album_input_schema() -> JsonSchema {
    let track = JsonSchema::object([
        ("title", JsonSchema::string(), true),
        ("length", JsonSchema::string(), true),
    ]);
    JsonSchema::object([
        (ARTIST_PARAM, JsonSchema::string(), true),
        (ALBUM_PARAM, JsonSchema::string(), true),
        ("tracks", JsonSchema::array_of(track), false),
    ])
    .root(ALBUM_MODEL_NAME)
}

fn require_name(value: &str, field: &'static str) -> Result<(), ManifestValidationError> {
    if value.trim().is_empty() {
        return Err(ManifestValidationError::EmptyName(field));
    }
    Ok(())
}

/// Structural manifest faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    EmptyName(&'static str),
    UnsupportedKeyType(String),
    DuplicateKeyAttribute(String),
    RouteCount(usize),
    DuplicateRoute(String),
    DefaultResponseCount { route: String, count: usize },
    UndeclaredMethodResponse { route: String, status: u16 },
    UnknownValidator { route: String, validator: String },
    UnknownModel { route: String, model: String },
    ModelMissingKey { model: String, key: String },
    UnknownPathParam { route: String, param: String },
    IncompleteValidator,
    MissingPermission(String),
    AccessLogDestinationMismatch(String),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName(field) => write!(f, "manifest {field} must not be empty"),
            Self::UnsupportedKeyType(name) => {
                write!(f, "key attribute `{name}` must be a string (S)")
            }
            Self::DuplicateKeyAttribute(name) => {
                write!(f, "partition and sort key are both `{name}`")
            }
            Self::RouteCount(count) => write!(
                f,
                "gateway must expose exactly {EXPECTED_ROUTE_COUNT} routes, found {count}"
            ),
            Self::DuplicateRoute(route) => write!(f, "route is declared twice: {route}"),
            Self::DefaultResponseCount { route, count } => write!(
                f,
                "route {route} must have exactly one default integration response, found {count}"
            ),
            Self::UndeclaredMethodResponse { route, status } => write!(
                f,
                "route {route} maps to status {status} without a method response"
            ),
            Self::UnknownValidator { route, validator } => {
                write!(f, "route {route} references unknown validator `{validator}`")
            }
            Self::UnknownModel { route, model } => {
                write!(f, "route {route} references unknown model `{model}`")
            }
            Self::ModelMissingKey { model, key } => {
                write!(f, "model `{model}` does not require key field `{key}`")
            }
            Self::UnknownPathParam { route, param } => {
                write!(f, "route {route} requires `{param}` which is not in its path")
            }
            Self::IncompleteValidator => {
                write!(f, "request validator must check both body and parameters")
            }
            Self::MissingPermission(action) => {
                write!(f, "gateway role is missing permission: {action}")
            }
            Self::AccessLogDestinationMismatch(arn) => {
                write!(f, "access log destination `{arn}` is not the declared log group")
            }
        }
    }
}

impl Error for ManifestValidationError {}

#[cfg(test)]
mod tests {
    use super::resources::HttpMethod;
    use super::{ManifestValidationError, StackManifest};
    use crate::config::StackConfig;

    fn manifest() -> StackManifest {
        StackManifest::declare(&StackConfig::default())
    }

    #[test]
    fn declared_manifest_is_valid() {
        assert!(manifest().validate().is_ok());
    }

    #[test]
    fn rejects_extra_route() {
        let mut manifest = manifest();
        let extra = manifest.api.routes[1].clone();
        manifest.api.routes.push(extra);
        assert_eq!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::RouteCount(4)
        );
    }

    #[test]
    fn rejects_duplicate_route() {
        let mut manifest = manifest();
        manifest.api.routes[2] = manifest.api.routes[1].clone();
        assert_eq!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::DuplicateRoute("GET /".to_string())
        );
    }

    #[test]
    fn rejects_missing_table_permission() {
        let mut manifest = manifest();
        manifest.role.statements[0]
            .action
            .retain(|action| action != "dynamodb:DeleteItem");
        assert_eq!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::MissingPermission("dynamodb:DeleteItem".to_string())
        );
    }

    #[test]
    fn rejects_model_that_does_not_require_keys() {
        let mut manifest = manifest();
        manifest.models[0].schema.required.retain(|field| field != "album");
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::ModelMissingKey { key, .. } if key == "album"
        ));
    }

    #[test]
    fn rejects_half_enabled_validator() {
        let mut manifest = manifest();
        manifest.request_validator.validate_request_parameters = false;
        assert_eq!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::IncompleteValidator
        );
    }

    #[test]
    fn rejects_unknown_path_param() {
        let mut manifest = manifest();
        manifest.api.routes[2]
            .required_path_params
            .push("year".to_string());
        assert!(matches!(
            manifest.validate().unwrap_err(),
            ManifestValidationError::UnknownPathParam { param, .. } if param == "year"
        ));
    }

    #[test]
    fn finds_routes_by_method_and_path() {
        let manifest = manifest();
        let route = manifest
            .find_route(HttpMethod::Delete, "/delete-album/{artist}/{album}")
            .expect("delete route");
        assert_eq!(route.path_param_names(), vec!["artist", "album"]);
        assert!(manifest.find_route(HttpMethod::Get, "/create-album").is_none());
    }
}
