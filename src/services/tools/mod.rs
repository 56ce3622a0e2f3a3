pub mod builtin;
pub mod registry;
pub mod scope;

pub use builtin::register_tools;
pub use registry::{RegistryError, Tool, ToolError, ToolRegistry};
pub use scope::RequiredScopes;
