//! Declared resource types.
//!
//! Every type serializes to the JSON shape emitted by `StackManifest::synthesize`.

use super::schema::JsonSchema;
use crate::mapping::{IntegrationResponse, RequestTemplate};
use crate::store::TableKeySchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Key attribute type. The album table only uses strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    S,
    N,
    B,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::S,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    PayPerRequest,
    Provisioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemovalPolicy {
    Destroy,
    Retain,
}

/// Keyed record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub billing_mode: BillingMode,
    pub removal_policy: RemovalPolicy,
}

impl TableSpec {
    pub fn key_schema(&self) -> TableKeySchema {
        TableKeySchema::new(
            self.table_name.clone(),
            self.partition_key.name.clone(),
            self.sort_key.name.clone(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Case-insensitive parse of a request method.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table operation a route integrates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableAction {
    PutItem,
    Scan,
    DeleteItem,
}

impl TableAction {
    /// Permission action name required to invoke this operation.
    pub fn permission(self) -> &'static str {
        match self {
            Self::PutItem => "dynamodb:PutItem",
            Self::Scan => "dynamodb:Scan",
            Self::DeleteItem => "dynamodb:DeleteItem",
        }
    }
}

/// One gateway route and its direct table integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    pub method: HttpMethod,
    /// Resource path; `{name}` segments are path parameters.
    pub path: String,
    pub action: TableAction,
    pub request_template: RequestTemplate,
    /// Success entry first, then the shared error entries.
    pub integration_responses: Vec<IntegrationResponse>,
    pub method_responses: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_validator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_path_params: Vec<String>,
}

impl RouteSpec {
    /// `METHOD /path`, used as a stable route id in logs and errors.
    pub fn route_key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Names of `{param}` segments in declaration order.
    pub fn path_param_names(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestValidatorSpec {
    pub name: String,
    pub validate_request_body: bool,
    pub validate_request_parameters: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub name: String,
    pub content_type: String,
    pub schema: JsonSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogSpec {
    pub destination_arn: String,
    /// Output field name -> gateway context variable.
    pub format: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    pub name: String,
    pub tracing_enabled: bool,
    pub access_log: AccessLogSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApiSpec {
    pub name: String,
    pub description: String,
    pub stage: StageSpec,
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub action: Vec<String>,
    pub resource: Vec<String>,
}

/// Identity the gateway assumes when calling the table and trace sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSpec {
    pub name: String,
    pub assumed_by: String,
    pub statements: Vec<PolicyStatement>,
}

impl RoleSpec {
    /// Whether some `Allow` statement grants `action` on `resource`.
    ///
    /// `*` as a resource grants every resource.
    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.statements.iter().any(|statement| {
            statement.effect == Effect::Allow
                && statement.action.iter().any(|granted| granted == action)
                && statement
                    .resource
                    .iter()
                    .any(|granted| granted == "*" || granted == resource)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroupSpec {
    pub log_group_name: String,
    pub retention_days: u32,
    pub removal_policy: RemovalPolicy,
}
