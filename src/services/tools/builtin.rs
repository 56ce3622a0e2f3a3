/*
 * Responsibility
 * - scope gate の動作確認用のサンプルツール (greet / whoami)
 */
use serde_json::{Value, json};

use crate::api::mcp::extractors::Session;

use super::registry::{RegistryError, Tool, ToolError, ToolRegistry};
use super::scope::RequiredScopes;

pub const GREET_SCOPE: &str = "tool:greet";
pub const WHOAMI_SCOPE: &str = "tool:whoami";

pub fn register_tools(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(Tool::new(
        "greet",
        "Greet User",
        "Greet a user with personalized authentication information from Auth0.",
        RequiredScopes::new([GREET_SCOPE]),
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The name of the person to greet (optional)."
                }
            }
        }),
        greet,
    ))?;

    registry.register(Tool::new(
        "whoami",
        "Who Am I?",
        "Returns information about the authenticated user",
        RequiredScopes::new([WHOAMI_SCOPE]),
        json!({"type": "object", "properties": {}}),
        whoami,
    ))?;

    Ok(())
}

fn greet(args: &Value, session: &Session) -> Result<String, ToolError> {
    let name = match args.get("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name.as_str()),
        Some(_) => {
            return Err(ToolError::InvalidArguments(
                "\"name\" must be a string".into(),
            ));
        }
    };
    let user_name = name.unwrap_or("there");

    tracing::info!(sub = %session.subject(), "greet tool invoked");

    Ok(format!(
        "Hello, {user_name} ({sub})!\n\n\
         Auth0 OAuth integration is working!\n\
         Authentication and scope checks are working correctly.",
        sub = session.subject()
    ))
}

fn whoami(_args: &Value, session: &Session) -> Result<String, ToolError> {
    let info = json!({
        "user": session.extra,
        "scopes": session.scopes,
    });
    serde_json::to_string_pretty(&info).map_err(|e| ToolError::Failed(e.to_string()))
}
