//! AWS Systems Manager adapters for the three collaborator traits.
//!
//! Requests use the SSM JSON 1.1 protocol: a POST to the endpoint with
//! `X-Amz-Target: AmazonSSM.<Operation>`. Credentials are not handled here;
//! the endpoint is expected to sign requests (a SigV4 proxy) or to be an
//! emulator that does not check them.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, SsmConfig};
use crate::error::{Result, RotatorError};
use crate::executor::CommandApi;
use crate::inventory::{InstanceFilter, Inventory};
use crate::store::{ParameterStore, PutParameter};
use crate::types::{CommandInvocation, Instance, InvocationStatus, LifecycleState};

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_HEADER: &str = "X-Amz-Target";
const COMMAND_COMMENT: &str = "token-rotator";

// ─── SsmClient ────────────────────────────────────────────────────────────

/// Transport shared by the adapters. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SsmClient {
    http: Client,
    url: String,
}

impl SsmClient {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RotatorError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: format!("{}/", endpoint.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &SsmConfig) -> Result<Self> {
        let endpoint = config.resolve_endpoint()?;
        Self::new(&endpoint, Duration::from_secs(config.request_timeout_seconds))
    }

    /// Invoke one operation. Errors come back as plain messages so each
    /// adapter can file them under its own error kind.
    fn call<Req, Resp>(&self, operation: &str, request: &Req) -> std::result::Result<Resp, String>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request).map_err(|e| format!("{operation}: {e}"))?;
        debug!(operation, url = %self.url, "ssm request");

        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header(TARGET_HEADER, format!("AmazonSSM.{operation}"))
            .body(body)
            .send()
            .map_err(|e| format!("{operation}: {e}"))?;

        let status = response.status();
        let text = response.text().map_err(|e| format!("{operation}: {e}"))?;
        if !status.is_success() {
            return Err(format!("{operation}: {}", describe_error(status.as_u16(), &text)));
        }
        serde_json::from_str(&text).map_err(|e| format!("{operation}: invalid response: {e}"))
    }
}

#[derive(Debug, Deserialize)]
struct AwsErrorBody {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

/// Render an AWS JSON error body as `Type: message`.
fn describe_error(status: u16, text: &str) -> String {
    let parsed: Option<AwsErrorBody> = serde_json::from_str(text).ok();
    match parsed {
        Some(AwsErrorBody {
            kind: Some(kind),
            message,
        }) => {
            // "com.amazonaws.ssm#InvalidInstanceId" → "InvalidInstanceId"
            let short = kind.rsplit('#').next().unwrap_or(&kind);
            match message {
                Some(m) => format!("{short}: {m}"),
                None => short.to_string(),
            }
        }
        _ => {
            let excerpt: String = text.chars().take(200).collect();
            format!("HTTP {status}: {excerpt}")
        }
    }
}

// ─── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendCommandRequest<'a> {
    instance_ids: Vec<&'a str>,
    document_name: &'a str,
    parameters: HashMap<&'static str, Vec<&'a str>>,
    timeout_seconds: u32,
    comment: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendCommandResponse {
    command: SentCommand,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SentCommand {
    command_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetCommandInvocationRequest<'a> {
    command_id: &'a str,
    instance_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCommandInvocationResponse {
    status: String,
    #[serde(default)]
    standard_output_content: String,
    #[serde(default)]
    standard_error_content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutParameterRequest<'a> {
    name: &'a str,
    value: &'a str,
    #[serde(rename = "Type")]
    parameter_type: &'static str,
    overwrite: bool,
    description: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutParameterResponse {
    #[serde(default)]
    version: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstanceInformationRequest<'a> {
    filters: Vec<StringFilter<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct StringFilter<'a> {
    key: String,
    values: Vec<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstanceInformationResponse {
    #[serde(default)]
    instance_information_list: Vec<InstanceInformation>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceInformation {
    instance_id: String,
    #[serde(default)]
    ping_status: Option<String>,
}

fn lifecycle_from_ping(ping_status: Option<&str>) -> LifecycleState {
    match ping_status {
        Some("Online") => LifecycleState::Running,
        Some("Inactive") => LifecycleState::Stopped,
        _ => LifecycleState::Unknown,
    }
}

fn ping_for_lifecycle(state: LifecycleState) -> &'static str {
    match state {
        LifecycleState::Running => "Online",
        LifecycleState::Stopped | LifecycleState::Terminated => "Inactive",
        LifecycleState::Unknown => "ConnectionLost",
    }
}

// ─── SsmInventory ─────────────────────────────────────────────────────────

/// Fleet inventory backed by `DescribeInstanceInformation`. A host only
/// counts as running while its SSM agent reports `Online`, which is also the
/// precondition for running commands on it.
pub struct SsmInventory {
    client: SsmClient,
}

impl SsmInventory {
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }
}

impl Inventory for SsmInventory {
    fn find_instances(&self, filter: &InstanceFilter) -> Result<Vec<Instance>> {
        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let request = DescribeInstanceInformationRequest {
                filters: vec![
                    StringFilter {
                        key: format!("tag:{}", filter.label_key),
                        values: vec![filter.label_value.as_str()],
                    },
                    StringFilter {
                        key: "PingStatus".to_string(),
                        values: vec![ping_for_lifecycle(filter.state)],
                    },
                ],
                next_token: next_token.as_deref(),
            };
            let page: DescribeInstanceInformationResponse = self
                .client
                .call("DescribeInstanceInformation", &request)
                .map_err(RotatorError::InventoryApi)?;

            instances.extend(page.instance_information_list.into_iter().map(|info| Instance {
                id: info.instance_id,
                tags: HashMap::from([(filter.label_key.clone(), filter.label_value.clone())]),
                lifecycle_state: lifecycle_from_ping(info.ping_status.as_deref()),
            }));

            match page.next_token.filter(|t| !t.is_empty()) {
                Some(token) if next_token.as_deref() != Some(token.as_str()) => {
                    next_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(instances)
    }
}

// ─── SsmCommandApi ────────────────────────────────────────────────────────

/// Remote execution through `SendCommand` / `GetCommandInvocation`.
pub struct SsmCommandApi {
    client: SsmClient,
    document: String,
    timeout_seconds: u32,
}

impl SsmCommandApi {
    pub fn new(client: SsmClient, document: impl Into<String>, timeout_seconds: u32) -> Self {
        Self {
            client,
            document: document.into(),
            timeout_seconds,
        }
    }

    pub fn from_config(client: SsmClient, config: &Config) -> Self {
        Self::new(client, &config.ssm.document, config.commands.timeout_seconds)
    }
}

impl CommandApi for SsmCommandApi {
    fn dispatch(&self, instance_id: &str, command: &str) -> Result<String> {
        let request = SendCommandRequest {
            instance_ids: vec![instance_id],
            document_name: &self.document,
            parameters: HashMap::from([("commands", vec![command])]),
            timeout_seconds: self.timeout_seconds,
            comment: COMMAND_COMMENT,
        };
        let response: SendCommandResponse = self
            .client
            .call("SendCommand", &request)
            .map_err(RotatorError::Dispatch)?;
        Ok(response.command.command_id)
    }

    fn status(&self, invocation_id: &str, instance_id: &str) -> Result<CommandInvocation> {
        let request = GetCommandInvocationRequest {
            command_id: invocation_id,
            instance_id,
        };
        let response: GetCommandInvocationResponse = self
            .client
            .call("GetCommandInvocation", &request)
            .map_err(RotatorError::ExecutionApi)?;
        Ok(CommandInvocation {
            invocation_id: invocation_id.to_string(),
            status: response.status.parse::<InvocationStatus>()?,
            standard_output: response.standard_output_content,
            standard_error: response.standard_error_content,
        })
    }
}

// ─── SsmParameterStore ────────────────────────────────────────────────────

pub struct SsmParameterStore {
    client: SsmClient,
}

impl SsmParameterStore {
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }
}

impl ParameterStore for SsmParameterStore {
    fn put_parameter(&self, request: &PutParameter) -> Result<u64> {
        let wire = PutParameterRequest {
            name: &request.name,
            value: request.value.expose(),
            parameter_type: request.parameter_type.as_str(),
            overwrite: request.overwrite,
            description: &request.description,
        };
        let response: PutParameterResponse = self
            .client
            .call("PutParameter", &wire)
            .map_err(RotatorError::Publish)?;
        Ok(response.version)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
