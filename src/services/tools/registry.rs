use serde_json::Value;
use thiserror::Error;

use crate::api::mcp::extractors::Session;

use super::scope::RequiredScopes;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments do not match the tool's input schema (JSON-RPC invalid params).
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool ran and failed; reported to the caller as an error result.
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool already registered: {0}")]
    Duplicate(&'static str),
}

pub type ToolBody = fn(&Value, &Session) -> Result<String, ToolError>;

/// A tool exposed over MCP, gated by `required_scopes`.
pub struct Tool {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub required_scopes: RequiredScopes,
    pub input_schema: Value,
    pub read_only: bool,
    body: ToolBody,
}

impl Tool {
    pub fn new(
        name: &'static str,
        title: &'static str,
        description: &'static str,
        required_scopes: RequiredScopes,
        input_schema: Value,
        body: ToolBody,
    ) -> Self {
        Self {
            name,
            title,
            description,
            required_scopes,
            input_schema,
            read_only: true,
            body,
        }
    }

    /// Run the tool body. The caller is responsible for the scope check.
    pub fn execute(&self, args: &Value, session: &Session) -> Result<String, ToolError> {
        (self.body)(args, session)
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("required_scopes", &self.required_scopes)
            .finish()
    }
}

/// Registered tools, in registration order.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn register(&mut self, tool: Tool) -> Result<(), RegistryError> {
        if self.get(tool.name).is_some() {
            return Err(RegistryError::Duplicate(tool.name));
        }
        tracing::debug!(tool = tool.name, scopes = %tool.required_scopes.to_scope_string(), "tool registered");
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Tools the session is allowed to invoke.
    pub fn accessible<'a>(
        &'a self,
        session: Option<&'a Session>,
    ) -> impl Iterator<Item = &'a Tool> + 'a {
        self.tools
            .iter()
            .filter(move |t| t.required_scopes.can_access(session))
    }

    /// Every scope some tool requires (deduplicated, first-seen order).
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in self.tools.iter().flat_map(|t| t.required_scopes.iter()) {
            if !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.to_string());
            }
        }
        scopes
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}
