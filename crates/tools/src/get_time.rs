//! Clock tool: the current local time in RFC 3339.

use schemars::JsonSchema;
use serde::Deserialize;
use yaa_core::error::ToolError;
use yaa_core::tool::ToolDefinition;

pub const NAME: &str = "get_time";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetTimeInput {}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        NAME,
        "Retrieve the current time as a formatted string in ISO 8601 format \
         (e.g., 2023-10-05T14:30:00Z)",
        |_: GetTimeInput| async { Ok::<_, ToolError>(now()) },
    )
}

fn now() -> String {
    chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
