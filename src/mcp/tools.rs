//! Tool surface exposed through `tools/list` and `tools/call`.
//!
//! Every tool is a thin pass-through to [`CmsClient`], [`DocsClient`],
//! [`ArchiveStager`] or [`CmsConfig`]. All failures, including invalid
//! input, come back as a [`ToolCallResult`] with `isError` set.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::cms::client::{DEFAULT_PAGE_NUM, DEFAULT_PAGE_SIZE};
use crate::cms::{CmsClient, CmsError, CmsResult, DocsClient};
use crate::config::CmsConfig;
use crate::stager::{ArchiveStager, Flavor};

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: Some(description.to_string()),
            input_schema,
        }
    }
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// The concatenated text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|ToolContent::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<&CmsError> for ToolCallResult {
    fn from(error: &CmsError) -> Self {
        let message = error.to_chain_string();
        tracing::warn!(error = %message, "Tool call failed");
        Self::error(message)
    }
}

/// Renders a serialisable value as pretty JSON text.
fn json_text<T: Serialize>(value: &T) -> ToolCallResult {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ToolCallResult::text(text),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialise tool output");
            ToolCallResult::error("Internal error: failed to serialise result")
        }
    }
}

fn render<T: Serialize>(result: &CmsResult<T>) -> ToolCallResult {
    match result {
        Ok(value) => json_text(value),
        Err(e) => e.into(),
    }
}

fn render_text(result: CmsResult<String>) -> ToolCallResult {
    match result {
        Ok(text) => ToolCallResult::text(text),
        Err(e) => (&e).into(),
    }
}

/// Reads an optional non-negative integer argument.
fn page_arg(arguments: &Value, name: &str, default: u32) -> Result<u32, ToolCallResult> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                ToolCallResult::error(format!(
                    "Invalid parameter '{name}': must be a non-negative integer"
                ))
            }),
    }
}

/// Earlier, misspelt name of `get_instruction_for_form_integration`.
/// Still dispatched, never listed.
pub const FORM_INSTRUCTIONS_ALIAS: &str = "get_instruction_for_form_integartion";

/// The tools backed by one CMS project.
#[derive(Debug, Clone)]
pub struct CmsTools {
    config: CmsConfig,
    client: CmsClient,
    docs: DocsClient,
    stager: ArchiveStager,
}

impl CmsTools {
    /// Builds every component from the runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &CmsConfig) -> CmsResult<Self> {
        let http = crate::cms::http_client()?;
        Ok(Self {
            config: config.clone(),
            client: CmsClient::with_http_client(http.clone(), config),
            docs: DocsClient::with_http_client(http.clone(), config),
            stager: ArchiveStager::with_http_client(http, config),
        })
    }

    /// Dispatches a `tools/call` by name.
    pub async fn call(&self, name: &str, arguments: &Value) -> ToolCallResult {
        tracing::debug!(tool = name, "Tool call");

        match name {
            // Content API
            "list_collections" => self.call_list_collections(arguments).await,
            "count_collections" => render(&self.client.count_collections().await),
            "get_collection" => self.call_get_collection(arguments).await,
            "list_records" => self.call_list_records(arguments).await,
            "get_record" => self.call_get_record(arguments).await,
            "count_records" => self.call_count_records(arguments).await,
            "validate_api_key" => render(&self.client.validate_api_key().await),
            "get_schema_type" => self.call_get_schema_type(arguments).await,
            // Documentation
            "get_toc" => render_text(self.docs.table_of_contents().await),
            "get_category_api" => self.call_get_category_api(arguments).await,
            "get_instruction_for_building" => render_text(self.docs.build_instructions().await),
            "get_instruction_for_form_integration" | FORM_INSTRUCTIONS_ALIAS => {
                render_text(self.docs.form_instructions().await)
            }
            // Local operations
            "create_env_file_content" => ToolCallResult::text(self.config.env_file_content()),
            "download_and_unzip_builder_script" => self.call_download_builder(arguments).await,
            _ => ToolCallResult::error(format!("Unknown tool: {name}")),
        }
    }

    // ==================== Tool Handlers ====================

    async fn call_list_collections(&self, arguments: &Value) -> ToolCallResult {
        let page_size = match page_arg(arguments, "page_size", DEFAULT_PAGE_SIZE) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let page_num = match page_arg(arguments, "page_num", DEFAULT_PAGE_NUM) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let resp = arguments
            .get("resp")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty());

        render(&self.client.list_collections(page_size, page_num, resp).await)
    }

    async fn call_get_collection(&self, arguments: &Value) -> ToolCallResult {
        let Some(collection_id) = arguments.get("collection_id").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: collection_id");
        };
        render(&self.client.get_collection(collection_id).await)
    }

    async fn call_list_records(&self, arguments: &Value) -> ToolCallResult {
        let Some(collection_id) = arguments.get("collection_id").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: collection_id");
        };
        let page_size = match page_arg(arguments, "page_size", DEFAULT_PAGE_SIZE) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let page_num = match page_arg(arguments, "page_num", DEFAULT_PAGE_NUM) {
            Ok(v) => v,
            Err(e) => return e,
        };

        render(
            &self
                .client
                .list_records(collection_id, page_size, page_num)
                .await,
        )
    }

    async fn call_get_record(&self, arguments: &Value) -> ToolCallResult {
        let Some(collection_id) = arguments.get("collection_id").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: collection_id");
        };
        let Some(record_id) = arguments.get("record_id").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: record_id");
        };
        render(&self.client.get_record(collection_id, record_id).await)
    }

    async fn call_count_records(&self, arguments: &Value) -> ToolCallResult {
        let Some(collection_id) = arguments.get("collection_id").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: collection_id");
        };
        render(&self.client.count_records(collection_id).await)
    }

    async fn call_get_schema_type(&self, arguments: &Value) -> ToolCallResult {
        let Some(collection_id) = arguments.get("collection_id").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: collection_id");
        };
        render(&self.client.get_schema_type(collection_id).await)
    }

    async fn call_get_category_api(&self, arguments: &Value) -> ToolCallResult {
        let Some(category_name) = arguments.get("category_name").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: category_name");
        };
        render_text(self.docs.category(category_name).await)
    }

    async fn call_download_builder(&self, arguments: &Value) -> ToolCallResult {
        let Some(root_path) = arguments.get("root_path").and_then(Value::as_str) else {
            return ToolCallResult::error("Missing required parameter: root_path");
        };
        let lang = arguments
            .get("lang")
            .and_then(Value::as_str)
            .unwrap_or_else(|| Flavor::default().as_str());

        render(&self.stager.stage(lang, Path::new(root_path)).await)
    }

    // ==================== Tool Definitions ====================

    /// Returns the list of available tools.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn definitions() -> Vec<ToolDefinition> {
        let no_arguments = json!({ "type": "object", "properties": {} });
        let collection_id = json!({
            "type": "string",
            "description": "The ID of the collection"
        });
        let page_size = json!({
            "type": "integer",
            "description": "Number of items to return per page (default: 10)",
            "default": DEFAULT_PAGE_SIZE
        });
        let page_num = json!({
            "type": "integer",
            "description": "1-based page number (default: 1)",
            "default": DEFAULT_PAGE_NUM
        });

        vec![
            // === Content API ===
            ToolDefinition::new(
                "list_collections",
                "List collections in the project. Useful for retrieving metadata about the \
                 collections.",
                json!({
                    "type": "object",
                    "properties": {
                        "page_size": page_size,
                        "page_num": page_num,
                        "resp": {
                            "type": "string",
                            "description": "Optional: additional response formatting options"
                        }
                    }
                }),
            ),
            ToolDefinition::new(
                "count_collections",
                "Count collections in the project. Useful for pagination and understanding \
                 the size of the dataset.",
                no_arguments.clone(),
            ),
            ToolDefinition::new(
                "get_collection",
                "Get the details of a single collection by ID.",
                json!({
                    "type": "object",
                    "properties": { "collection_id": collection_id },
                    "required": ["collection_id"]
                }),
            ),
            ToolDefinition::new(
                "list_records",
                "List records in a collection. Useful for retrieving data from a specific \
                 collection.",
                json!({
                    "type": "object",
                    "properties": {
                        "collection_id": collection_id,
                        "page_size": page_size,
                        "page_num": page_num
                    },
                    "required": ["collection_id"]
                }),
            ),
            ToolDefinition::new(
                "get_record",
                "Get the details of a single record in a collection.",
                json!({
                    "type": "object",
                    "properties": {
                        "collection_id": collection_id,
                        "record_id": {
                            "type": "string",
                            "description": "The ID of the record"
                        }
                    },
                    "required": ["collection_id", "record_id"]
                }),
            ),
            ToolDefinition::new(
                "count_records",
                "Count records in a collection. Useful for pagination.",
                json!({
                    "type": "object",
                    "properties": { "collection_id": collection_id },
                    "required": ["collection_id"]
                }),
            ),
            ToolDefinition::new(
                "validate_api_key",
                "Check whether the configured API key is accepted by the CMS.",
                no_arguments.clone(),
            ),
            ToolDefinition::new(
                "get_schema_type",
                "Get the schema of a collection: keys are custom field keys and values are \
                 their types.",
                json!({
                    "type": "object",
                    "properties": { "collection_id": collection_id },
                    "required": ["collection_id"]
                }),
            ),
            // === Documentation ===
            ToolDefinition::new(
                "get_toc",
                "Get the table of contents of the Kantan CMS API documentation, listing the \
                 available features and their category names.",
                no_arguments.clone(),
            ),
            ToolDefinition::new(
                "get_category_api",
                "Get API documentation on how to implement a specific feature in Kantan CMS.",
                json!({
                    "type": "object",
                    "properties": {
                        "category_name": {
                            "type": "string",
                            "description": "Category name as listed by get_toc"
                        }
                    },
                    "required": ["category_name"]
                }),
            ),
            ToolDefinition::new(
                "get_instruction_for_building",
                "Get the markdown instructions for creating a build script that fetches \
                 records, builds the website, and pushes it to Kantan CMS. Read this first \
                 when integrating with Kantan CMS.",
                no_arguments.clone(),
            ),
            ToolDefinition::new(
                "get_instruction_for_form_integration",
                "Get the markdown instructions for sending website form submissions to \
                 Kantan CMS.",
                no_arguments.clone(),
            ),
            // === Local operations ===
            ToolDefinition::new(
                "create_env_file_content",
                "Create .env file content for a Kantan CMS integration. The API key value is \
                 left empty.",
                no_arguments,
            ),
            ToolDefinition::new(
                "download_and_unzip_builder_script",
                "Download the starter builder project and extract it into the project root. \
                 README.md is placed in scripts/ and .gitignore is not extracted.",
                json!({
                    "type": "object",
                    "properties": {
                        "root_path": {
                            "type": "string",
                            "description": "Path to the root directory of your project"
                        },
                        "lang": {
                            "type": "string",
                            "enum": Flavor::ALL.map(Flavor::as_str),
                            "description": "Language of the builder script (default: python)",
                            "default": Flavor::default().as_str()
                        }
                    },
                    "required": ["root_path"]
                }),
            ),
        ]
    }
}
