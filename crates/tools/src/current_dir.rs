//! Working directory tool.

use schemars::JsonSchema;
use serde::Deserialize;
use yaa_core::error::ToolError;
use yaa_core::tool::ToolDefinition;

pub const NAME: &str = "current_dir";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CurrentDirInput {}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(NAME, "Show the current directory", |_: CurrentDirInput| async {
        std::env::current_dir()
            .map(|dir| dir.display().to_string())
            .map_err(|e| ToolError::failed(NAME, e))
    })
}
