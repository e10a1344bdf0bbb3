//! Whiteboard tool server.
//!
//! Exposes a [`SharedWhiteboard`] to agents over the JSON-RPC 2.0 methods
//! defined by MCP: tools that create, edit and connect elements, two
//! read-only resources, and two prompt templates. Every tool call is a
//! single store operation, so viewers see exactly one update per call.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use whiteboard_core::{
    Element, EmbedType, FlowShape, SharedWhiteboard, StickyColor, WhiteboardData,
    WhiteboardError, WhiteboardStats,
};

use crate::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpPrompt, McpResource, McpTool,
    PromptArgument, ToolOutput, error_codes,
};

pub const SERVER_NAME: &str = "whiteboard-mcp-server";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const CURRENT_URI: &str = "whiteboard://current";
pub const STATS_URI: &str = "whiteboard://stats";

const CONNECT_FAILED: &str =
    "Failed to connect nodes. Make sure both elements exist and the source is a flow node.";

// ---------------------------------------------------------------------------
// Tool handler type
// ---------------------------------------------------------------------------

/// Why a tool call could not produce a result.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Missing or malformed arguments. Reported as JSON-RPC `-32602`.
    #[error("{0}")]
    InvalidArgs(String),
    #[error("{0}")]
    Internal(String),
}

impl From<WhiteboardError> for ToolError {
    fn from(e: WhiteboardError) -> Self {
        match e {
            WhiteboardError::Serialization(_) => Self::Internal(e.to_string()),
            other => Self::InvalidArgs(other.user_message()),
        }
    }
}

/// Takes the `arguments` value from a `tools/call` request.
pub type ToolHandler = Box<dyn Fn(Value) -> Result<ToolOutput, ToolError> + Send + Sync>;

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tool arguments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateStickyArgs {
    x: f64,
    y: f64,
    text: String,
    #[serde(default)]
    color: StickyColor,
}

#[derive(Deserialize)]
struct CreateFlowNodeArgs {
    x: f64,
    y: f64,
    label: String,
    #[serde(default)]
    shape: FlowShape,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMermaidArgs {
    x: f64,
    y: f64,
    #[serde(alias = "sourceCode")]
    mermaid_code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEmbedArgs {
    x: f64,
    y: f64,
    url: String,
    #[serde(default)]
    embed_type: EmbedType,
}

#[derive(Deserialize)]
struct UpdateArgs {
    id: String,
    updates: Map<String, Value>,
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeArgs {
    from_id: String,
    to_id: String,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Deserialize)]
struct SetDataArgs {
    data: Value,
}

fn not_found(id: &str) -> ToolOutput {
    ToolOutput::error(format!("Element with ID {id} not found"))
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value).map_err(|e| ToolError::Internal(e.to_string()))
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Area an improvement prompt concentrates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImprovementFocus {
    Layout,
    Content,
    Connections,
    Organization,
}

impl ImprovementFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Content => "content",
            Self::Connections => "connections",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for ImprovementFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImprovementFocus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layout" => Ok(Self::Layout),
            "content" => Ok(Self::Content),
            "connections" => Ok(Self::Connections),
            "organization" => Ok(Self::Organization),
            other => Err(format!(
                "unknown focus '{other}', expected layout, content, connections or organization"
            )),
        }
    }
}

fn analyze_prompt(data: &WhiteboardData, stats: &WhiteboardStats) -> Result<String, ToolError> {
    Ok(format!(
        "Analyze this whiteboard and describe its content, its structure and what could be improved.\n\n\
         Current statistics:\n\
         - Total elements: {}\n\
         - Sticky notes: {}\n\
         - Flow nodes: {}\n\
         - Mermaid diagrams: {}\n\
         - Embedded links: {}\n\
         - Connections: {}\n\n\
         Full data:\n{}",
        stats.total_elements,
        stats.sticky_notes,
        stats.flow_nodes,
        stats.mermaid_diagrams,
        stats.embedded_links,
        stats.connections,
        pretty(data)?
    ))
}

fn suggest_prompt(
    data: &WhiteboardData,
    focus: Option<ImprovementFocus>,
) -> Result<String, ToolError> {
    let focus = focus
        .map(|f| format!(" with focus on {f}"))
        .unwrap_or_default();
    Ok(format!(
        "Suggest improvements for this whiteboard{focus}:\n\n{}\n\n\
         Consider:\n\
         - Element positioning and spacing\n\
         - Visual hierarchy and organization\n\
         - Missing connections or relationships\n\
         - Content clarity and completeness\n\
         - Overall design and usability",
        pretty(data)?
    ))
}

// ---------------------------------------------------------------------------
// WhiteboardToolServer
// ---------------------------------------------------------------------------

/// MCP server hosting the whiteboard tools.
pub struct WhiteboardToolServer {
    board: SharedWhiteboard,
    tools: HashMap<String, (McpTool, ToolHandler)>,
}

impl WhiteboardToolServer {
    pub fn new(board: SharedWhiteboard) -> Self {
        let mut server = Self {
            board,
            tools: HashMap::new(),
        };
        server.register_builtins();
        server
    }

    pub fn board(&self) -> &SharedWhiteboard {
        &self.board
    }

    /// Register a tool with its definition and handler. Replaces any tool
    /// of the same name.
    pub fn register(&mut self, tool: McpTool, handler: ToolHandler) {
        self.tools.insert(tool.name.clone(), (tool, handler));
    }

    /// All tools, sorted by name.
    pub fn list_tools(&self) -> Vec<&McpTool> {
        let mut tools: Vec<_> = self.tools.values().map(|(def, _)| def).collect();
        tools.sort_by_key(|t| &t.name);
        tools
    }

    /// Parses one raw JSON-RPC message and returns the serialized response.
    pub fn handle_json(&self, raw: &str) -> String {
        let response = match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) if request.jsonrpc != "2.0" => JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ),
            Ok(request) => self.handle_request(&request),
            Err(e) => JsonRpcResponse::error(0, JsonRpcError::parse_error(&e.to_string())),
        };
        serde_json::to_string(&response).unwrap_or_default()
    }

    /// Handle a JSON-RPC request and return a response.
    pub fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        debug!("MCP request {} ({})", request.method, request.id);
        let outcome = match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {},
                    "prompts": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => {
                let tools: Vec<Value> = self
                    .list_tools()
                    .iter()
                    .map(|t| serde_json::to_value(t).unwrap_or(Value::Null))
                    .collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => self.handle_tool_call(&request.params),
            "resources/list" => Ok(json!({ "resources": self.list_resources() })),
            "resources/read" => self.read_resource(&request.params),
            "prompts/list" => Ok(json!({ "prompts": self.list_prompts() })),
            "prompts/get" => self.get_prompt(&request.params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => {
                warn!("MCP {} failed: {}", request.method, error.message);
                JsonRpcResponse::error(request.id, error)
            }
        }
    }

    /// Dispatch a tools/call request to the appropriate handler.
    fn handle_tool_call(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("missing 'name' in tools/call"))?;
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let Some((_, handler)) = self.tools.get(name) else {
            return Err(JsonRpcError {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("Unknown tool: {name}"),
                data: None,
            });
        };

        debug!("Calling tool {name}");
        match handler(args) {
            Ok(output) => Ok(output.into_result()),
            Err(ToolError::InvalidArgs(msg)) => {
                Err(JsonRpcError::invalid_params(&format!("{name}: {msg}")))
            }
            Err(ToolError::Internal(msg)) => Err(JsonRpcError::internal(&msg)),
        }
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    pub fn list_resources(&self) -> Vec<McpResource> {
        vec![
            McpResource {
                uri: CURRENT_URI.into(),
                name: "whiteboard-data".into(),
                description: "Current state of the whiteboard with all elements".into(),
                mime_type: "application/json".into(),
            },
            McpResource {
                uri: STATS_URI.into(),
                name: "whiteboard-stats".into(),
                description: "Element and connection counts for the whiteboard".into(),
                mime_type: "application/json".into(),
            },
        ]
    }

    fn read_resource(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("missing 'uri' in resources/read"))?;

        let text = match uri {
            CURRENT_URI => pretty(&self.board.snapshot()),
            STATS_URI => pretty(&self.board.read(|s| s.get_stats())),
            other => {
                return Err(JsonRpcError::invalid_params(&format!(
                    "unknown resource: {other}"
                )));
            }
        }
        .map_err(|e| JsonRpcError::internal(&e.to_string()))?;

        Ok(json!({
            "contents": [{ "uri": uri, "mimeType": "application/json", "text": text }]
        }))
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    pub fn list_prompts(&self) -> Vec<McpPrompt> {
        vec![
            McpPrompt {
                name: "analyze-whiteboard".into(),
                description: "Analyze the current whiteboard content and provide insights".into(),
                arguments: Vec::new(),
            },
            McpPrompt {
                name: "suggest-improvements".into(),
                description: "Get suggestions for improving the whiteboard layout and content"
                    .into(),
                arguments: vec![PromptArgument {
                    name: "focus".into(),
                    description: "Area to focus on: layout, content, connections or organization"
                        .into(),
                    required: false,
                }],
            },
        ]
    }

    fn get_prompt(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("missing 'name' in prompts/get"))?;
        let arguments = params.get("arguments");

        let (description, text) = match name {
            "analyze-whiteboard" => {
                let (data, stats) = self.board.read(|s| (s.get_data(), s.get_stats()));
                ("Whiteboard analysis", analyze_prompt(&data, &stats))
            }
            "suggest-improvements" => {
                let focus = arguments
                    .and_then(|a| a.get("focus"))
                    .and_then(Value::as_str)
                    .map(str::parse::<ImprovementFocus>)
                    .transpose()
                    .map_err(|e| JsonRpcError::invalid_params(&e))?;
                (
                    "Whiteboard improvement suggestions",
                    suggest_prompt(&self.board.snapshot(), focus),
                )
            }
            other => {
                return Err(JsonRpcError::invalid_params(&format!("unknown prompt: {other}")));
            }
        };
        let text = text.map_err(|e| JsonRpcError::internal(&e.to_string()))?;

        Ok(json!({
            "description": description,
            "messages": [{
                "role": "user",
                "content": { "type": "text", "text": text }
            }]
        }))
    }

    // -----------------------------------------------------------------------
    // Built-in tool registration
    // -----------------------------------------------------------------------

    fn register_builtins(&mut self) {
        // -- create-sticky-note ----------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "create-sticky-note".into(),
                    description: "Create a new sticky note on the whiteboard".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "x": { "type": "number", "description": "X coordinate position" },
                            "y": { "type": "number", "description": "Y coordinate position" },
                            "text": { "type": "string", "description": "Text content of the sticky note" },
                            "color": {
                                "type": "string",
                                "enum": ["yellow", "pink", "blue", "green", "purple", "orange"],
                                "default": "yellow",
                                "description": "Color of the sticky note"
                            }
                        },
                        "required": ["x", "y", "text"]
                    }),
                },
                Box::new(move |args| {
                    let a: CreateStickyArgs = parse_args(args)?;
                    let el = board.write(|s| s.create_sticky_note(a.x, a.y, &a.text, a.color));
                    Ok(ToolOutput::text(format!(
                        "Created sticky note with ID: {} at position ({}, {}) with text: \"{}\"",
                        el.id(),
                        a.x,
                        a.y,
                        a.text
                    )))
                }),
            );
        }

        // -- create-flow-node ------------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "create-flow-node".into(),
                    description: "Create a new flow chart node on the whiteboard".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "x": { "type": "number", "description": "X coordinate position" },
                            "y": { "type": "number", "description": "Y coordinate position" },
                            "label": { "type": "string", "description": "Label text for the flow node" },
                            "shape": {
                                "type": "string",
                                "enum": ["rectangle", "diamond", "circle", "ellipse"],
                                "default": "rectangle",
                                "description": "Shape of the flow node"
                            }
                        },
                        "required": ["x", "y", "label"]
                    }),
                },
                Box::new(move |args| {
                    let a: CreateFlowNodeArgs = parse_args(args)?;
                    let el = board.write(|s| s.create_flow_node(a.x, a.y, &a.label, a.shape));
                    Ok(ToolOutput::text(format!(
                        "Created flow node with ID: {} at position ({}, {}) with label: \"{}\" and shape: {}",
                        el.id(),
                        a.x,
                        a.y,
                        a.label,
                        a.shape.as_str()
                    )))
                }),
            );
        }

        // -- create-mermaid-diagram ------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "create-mermaid-diagram".into(),
                    description: "Create a new Mermaid diagram on the whiteboard".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "x": { "type": "number", "description": "X coordinate position" },
                            "y": { "type": "number", "description": "Y coordinate position" },
                            "mermaidCode": { "type": "string", "description": "Mermaid diagram code" }
                        },
                        "required": ["x", "y", "mermaidCode"]
                    }),
                },
                Box::new(move |args| {
                    let a: CreateMermaidArgs = parse_args(args)?;
                    let el = board.write(|s| s.create_mermaid_diagram(a.x, a.y, &a.mermaid_code));
                    Ok(ToolOutput::text(format!(
                        "Created Mermaid diagram with ID: {} at position ({}, {})",
                        el.id(),
                        a.x,
                        a.y
                    )))
                }),
            );
        }

        // -- create-embedded-link --------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "create-embedded-link".into(),
                    description: "Create a new embedded link/iframe on the whiteboard".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "x": { "type": "number", "description": "X coordinate position" },
                            "y": { "type": "number", "description": "Y coordinate position" },
                            "url": { "type": "string", "format": "uri", "description": "URL to embed" },
                            "embedType": {
                                "type": "string",
                                "enum": ["iframe", "video"],
                                "default": "iframe",
                                "description": "Type of embed"
                            }
                        },
                        "required": ["x", "y", "url"]
                    }),
                },
                Box::new(move |args| {
                    let a: CreateEmbedArgs = parse_args(args)?;
                    Url::parse(&a.url).map_err(|e| {
                        ToolError::InvalidArgs(format!("invalid url '{}': {e}", a.url))
                    })?;
                    let el =
                        board.write(|s| s.create_embedded_link(a.x, a.y, &a.url, a.embed_type));
                    Ok(ToolOutput::text(format!(
                        "Created embedded link with ID: {} at position ({}, {}) for URL: {}",
                        el.id(),
                        a.x,
                        a.y,
                        a.url
                    )))
                }),
            );
        }

        // -- update-element --------------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "update-element".into(),
                    description: "Update an existing whiteboard element".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "ID of the element to update" },
                            "updates": {
                                "type": "object",
                                "description": "Object containing the properties to update"
                            }
                        },
                        "required": ["id", "updates"]
                    }),
                },
                Box::new(move |args| {
                    let a: UpdateArgs = parse_args(args)?;
                    let output = match board.write(|s| s.update_element(&a.id, &a.updates)) {
                        Ok(Some(_)) => {
                            ToolOutput::text(format!("Updated element {} successfully", a.id))
                        }
                        Ok(None) => not_found(&a.id),
                        Err(e @ WhiteboardError::Serialization(_)) => return Err(e.into()),
                        Err(e) => ToolOutput::error(e.user_message()),
                    };
                    Ok(output)
                }),
            );
        }

        // -- remove-element --------------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "remove-element".into(),
                    description: "Remove an element from the whiteboard".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "ID of the element to remove" }
                        },
                        "required": ["id"]
                    }),
                },
                Box::new(move |args| {
                    let a: IdArgs = parse_args(args)?;
                    if board.write(|s| s.remove_element(&a.id)) {
                        Ok(ToolOutput::text(format!("Removed element {} successfully", a.id)))
                    } else {
                        Ok(not_found(&a.id))
                    }
                }),
            );
        }

        // -- connect-flow-nodes ----------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "connect-flow-nodes".into(),
                    description: "Create a connection from a flow node to another element".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "fromId": { "type": "string", "description": "ID of the source flow node" },
                            "toId": { "type": "string", "description": "ID of the target element" }
                        },
                        "required": ["fromId", "toId"]
                    }),
                },
                Box::new(move |args| {
                    let a: EdgeArgs = parse_args(args)?;
                    let output = board.write(|s| {
                        let already = s
                            .get_element(&a.from_id)
                            .as_ref()
                            .and_then(Element::as_flow_node)
                            .is_some_and(|n| n.is_connected_to(&a.to_id));
                        if already {
                            ToolOutput::text(format!(
                                "Flow node {} is already connected to {}",
                                a.from_id, a.to_id
                            ))
                        } else if s.connect(&a.from_id, &a.to_id) {
                            ToolOutput::text(format!(
                                "Connected flow node {} to {}",
                                a.from_id, a.to_id
                            ))
                        } else {
                            ToolOutput::error(CONNECT_FAILED)
                        }
                    });
                    Ok(output)
                }),
            );
        }

        // -- disconnect-flow-nodes -------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "disconnect-flow-nodes".into(),
                    description: "Remove a connection from a flow node".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "fromId": { "type": "string", "description": "ID of the source flow node" },
                            "toId": { "type": "string", "description": "ID of the connected element" }
                        },
                        "required": ["fromId", "toId"]
                    }),
                },
                Box::new(move |args| {
                    let a: EdgeArgs = parse_args(args)?;
                    if board.write(|s| s.disconnect(&a.from_id, &a.to_id)) {
                        Ok(ToolOutput::text(format!(
                            "Disconnected flow node {} from {}",
                            a.from_id, a.to_id
                        )))
                    } else {
                        Ok(ToolOutput::error(format!(
                            "No connection from {} to {}",
                            a.from_id, a.to_id
                        )))
                    }
                }),
            );
        }

        // -- search-elements -------------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "search-elements".into(),
                    description: "Search for elements containing specific text".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "query": { "type": "string", "description": "Text to search for in element content" }
                        },
                        "required": ["query"]
                    }),
                },
                Box::new(move |args| {
                    let a: SearchArgs = parse_args(args)?;
                    let hits = board.read(|s| s.search_elements(&a.query));
                    let listed: Vec<String> = hits
                        .iter()
                        .map(|el| format!("{}:{}", el.type_tag(), el.id()))
                        .collect();
                    Ok(ToolOutput::text(format!(
                        "Found {} elements matching \"{}\": {}",
                        hits.len(),
                        a.query,
                        listed.join(", ")
                    )))
                }),
            );
        }

        // -- get-element -----------------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "get-element".into(),
                    description: "Get detailed information about a specific element".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "description": "ID of the element to retrieve" }
                        },
                        "required": ["id"]
                    }),
                },
                Box::new(move |args| {
                    let a: IdArgs = parse_args(args)?;
                    match board.read(|s| s.get_element(&a.id)) {
                        Some(el) => Ok(ToolOutput::text(pretty(&el)?)),
                        None => Ok(not_found(&a.id)),
                    }
                }),
            );
        }

        // -- set-whiteboard-data ---------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "set-whiteboard-data".into(),
                    description: "Replace the entire whiteboard with new data".into(),
                    input_schema: json!({
                        "type": "object",
                        "properties": {
                            "data": {
                                "type": "object",
                                "description": "Complete whiteboard data object",
                                "properties": {
                                    "elements": { "type": "array", "items": {} }
                                },
                                "required": ["elements"]
                            }
                        },
                        "required": ["data"]
                    }),
                },
                Box::new(move |args| {
                    let a: SetDataArgs = parse_args(args)?;
                    let replaced = board.write(|s| {
                        s.set_data_json(a.data)?;
                        Ok::<_, WhiteboardError>(s.get_data().len())
                    });
                    let output = match replaced {
                        Ok(count) => ToolOutput::text(format!(
                            "Whiteboard data updated successfully with {count} elements"
                        )),
                        Err(e) => ToolOutput::error(format!(
                            "Error updating whiteboard data: {}",
                            e.user_message()
                        )),
                    };
                    Ok(output)
                }),
            );
        }

        // -- clear-whiteboard ------------------------------------------------
        {
            let board = self.board.clone();
            self.register(
                McpTool {
                    name: "clear-whiteboard".into(),
                    description: "Remove all elements from the whiteboard".into(),
                    input_schema: json!({ "type": "object", "properties": {} }),
                },
                Box::new(move |_args| {
                    board.write(|s| s.clear_all());
                    Ok(ToolOutput::text("Whiteboard cleared successfully"))
                }),
            );
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
