pub mod protocol;
pub mod tool_server;

pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpPrompt, McpResource, McpTool,
    PromptArgument, ToolOutput, error_codes,
};
pub use tool_server::{ImprovementFocus, ToolError, ToolHandler, WhiteboardToolServer};
