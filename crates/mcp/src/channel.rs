//! The command-channel pipeline: route gate, per-message check, dispatch.

use std::future::Future;

use guard::{Authorized, PolicyGuard, Route, RouteParams, RouteTable};
use policy::Principal;
use serde_json::Value;
use tracing::{debug, info};

use crate::{JsonRpcError, JsonRpcResponse, Message, Result, ToolPermissionMapper};

/// Route every command-channel message passes before per-message checks.
pub const CHANNEL_ROUTE: &str = "mcp.messages";

/// Executes a message once it has been authorized.
pub trait Dispatcher: Send + Sync {
    fn dispatch(
        &self,
        ctx: &Authorized,
        message: Message,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Guards and dispatches command-channel messages.
pub struct Channel<D> {
    guard: PolicyGuard,
    route: Route,
    mapper: ToolPermissionMapper,
    dispatcher: D,
}

impl<D: Dispatcher> Channel<D> {
    /// Build a channel gated by the [`CHANNEL_ROUTE`] entry of `routes`.
    pub fn new(
        guard: PolicyGuard,
        routes: &RouteTable,
        mapper: ToolPermissionMapper,
        dispatcher: D,
    ) -> Result<Self> {
        let route = routes.get(CHANNEL_ROUTE)?.clone();
        Ok(Self {
            guard,
            route,
            mapper,
            dispatcher,
        })
    }

    /// Authorize a message and dispatch it.
    ///
    /// A denial at either stage returns before the dispatcher runs.
    pub async fn handle(&self, principal: Option<&Principal>, message: Message) -> Result<Value> {
        let ctx = self.guard.authorize(principal, &RouteParams::new(), &self.route)?;
        info!(
            principal = %ctx.principal().email,
            method = message.method.as_deref().unwrap_or("unknown"),
            "channel message received"
        );

        let verdict = self.mapper.check(&ctx, &message)?;
        debug!(?verdict, "message authorized");

        self.dispatcher.dispatch(&ctx, message).await
    }

    /// Handle a raw message body and produce a JSON-RPC response.
    pub async fn handle_body(&self, principal: Option<&Principal>, body: &str) -> JsonRpcResponse {
        let message = match Message::parse(body) {
            Ok(message) => message,
            Err(e) => return JsonRpcResponse::failure(None, JsonRpcError::from(&e)),
        };
        let id = message.id.clone();
        match self.handle(principal, message).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::failure(id, JsonRpcError::from(&e)),
        }
    }
}

/// Dispatcher that echoes the authorized message back.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoDispatcher;

impl Dispatcher for EchoDispatcher {
    async fn dispatch(&self, ctx: &Authorized, message: Message) -> Result<Value> {
        let mut echoed = serde_json::to_value(&message)?;
        if let Value::Object(map) = &mut echoed {
            map.insert("principal".to_string(), Value::String(ctx.principal().id.clone()));
        }
        Ok(echoed)
    }
}
