/*
 * Responsibility
 * - POST /mcp (JSON-RPC 2.0): initialize / ping / tools/list / tools/call
 * - tools/call の直前に scope gate を評価し、拒否時はツール本体を実行しない
 *
 * Notes
 * - 認証 (Session の組み立て) は middleware::auth::access の責務
 */
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::api::mcp::dto::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::api::mcp::dto::tools::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, ListToolsResult,
    ToolDescriptor,
};
use crate::api::mcp::extractors::{MaybeSession, Session};
use crate::error::AppError;
use crate::services::tools::ToolError;
use crate::state::AppState;

/// A request either fails inside JSON-RPC (HTTP 200 + error object)
/// or at the HTTP layer (gate denial → 403).
enum RpcFailure {
    Rpc(JsonRpcError),
    Http(AppError),
}

impl From<JsonRpcError> for RpcFailure {
    fn from(err: JsonRpcError) -> Self {
        RpcFailure::Rpc(err)
    }
}

impl From<AppError> for RpcFailure {
    fn from(err: AppError) -> Self {
        RpcFailure::Http(err)
    }
}

pub async fn rpc(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(error) => return Ok(JsonRpcResponse::error(Value::Null, error).into_response()),
    };

    let Some(id) = request.id else {
        tracing::debug!(method = %request.method, "notification received");
        return Ok(StatusCode::ACCEPTED.into_response());
    };

    let response = match dispatch(&state, session.as_ref(), &request.method, request.params) {
        Ok(result) => JsonRpcResponse::result(id, result),
        Err(RpcFailure::Rpc(error)) => JsonRpcResponse::error(id, error),
        Err(RpcFailure::Http(err)) => return Err(err),
    };

    Ok(response.into_response())
}

fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, JsonRpcError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| JsonRpcError::parse_error())?;
    if value.is_array() {
        return Err(JsonRpcError::invalid_request(
            "Batch requests are not supported",
        ));
    }

    let request: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| JsonRpcError::invalid_request(format!("Invalid request: {e}")))?;
    if request.jsonrpc != "2.0" {
        return Err(JsonRpcError::invalid_request("jsonrpc must be \"2.0\""));
    }

    Ok(request)
}

fn dispatch(
    state: &AppState,
    session: Option<&Session>,
    method: &str,
    params: Option<Value>,
) -> Result<Value, RpcFailure> {
    match method {
        "initialize" => {
            let params: InitializeParams = match params {
                Some(params) => parse_params(params)?,
                None => InitializeParams::default(),
            };
            to_value(InitializeResult::negotiate(&params))
        }
        "ping" => Ok(json!({})),
        "tools/list" => {
            let tools = state
                .tools
                .accessible(session)
                .map(ToolDescriptor::from)
                .collect();
            to_value(ListToolsResult { tools })
        }
        "tools/call" => {
            let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
            call_tool(state, session, parse_params(params)?)
        }
        other => Err(JsonRpcError::method_not_found(other).into()),
    }
}

fn call_tool(
    state: &AppState,
    session: Option<&Session>,
    params: CallToolParams,
) -> Result<Value, RpcFailure> {
    let tool = state
        .tools
        .get(&params.name)
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

    if !tool.required_scopes.can_access(session) {
        tracing::warn!(
            tool = tool.name,
            sub = session.map(Session::subject).unwrap_or("-"),
            missing = ?tool.required_scopes.missing(session),
            "tool access denied"
        );
        return Err(
            AppError::insufficient_scope(&tool.required_scopes, state.resource.metadata_url())
                .into(),
        );
    }

    let Some(session) = session else {
        tracing::error!(tool = tool.name, "tool invoked without an authenticated session");
        return Err(AppError::Internal.into());
    };

    let result = match tool.execute(&params.arguments, session) {
        Ok(text) => CallToolResult::text(text),
        Err(ToolError::InvalidArguments(message)) => {
            return Err(JsonRpcError::invalid_params(message).into());
        }
        Err(ToolError::Failed(message)) => {
            tracing::warn!(tool = tool.name, error = %message, "tool failed");
            CallToolResult::failure(message)
        }
    };

    to_value(result)
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
}

fn to_value<T: serde::Serialize>(result: T) -> Result<Value, RpcFailure> {
    serde_json::to_value(result).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize result");
        RpcFailure::Rpc(JsonRpcError::internal())
    })
}
