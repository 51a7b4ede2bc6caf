//! Permission gate for the MCP command channel.
//!
//! Command-channel messages are loosely typed JSON-RPC requests that invoke a
//! named tool, resource or prompt. Before a message is dispatched, the
//! [`ToolPermissionMapper`] translates it into an action on a resource type
//! and checks it against the capability set the request gate already built.
//!
//! # Example
//!
//! ```
//! use guard::{PolicyGuard, RouteTable};
//! use mcp::{Channel, EchoDispatcher, Message, ToolPermissionMapper};
//! use policy::{Principal, Role};
//! use serde_json::json;
//!
//! # async fn example() -> mcp::Result<()> {
//! let channel = Channel::new(
//!     PolicyGuard::default(),
//!     &RouteTable::standard(),
//!     ToolPermissionMapper::default(),
//!     EchoDispatcher,
//! )?;
//!
//! let user = Principal::new("u1", "u1@example.com", Role::User);
//! let own = Message::tool_call("getUser", json!({"id": "u1"}));
//! assert!(channel.handle(Some(&user), own).await.is_ok());
//!
//! let delete = Message::tool_call("deleteUser", json!({"id": "u1"}));
//! assert!(channel.handle(Some(&user), delete).await.is_err());
//! # Ok(())
//! # }
//! ```

mod channel;
mod error;
mod mapper;
mod permissions;
mod protocol;

pub use channel::{CHANNEL_ROUTE, Channel, Dispatcher, EchoDispatcher};
pub use error::{Error, Result};
pub use mapper::{Target, ToolPermissionMapper, Verdict};
pub use permissions::{ItemPermission, PermissionMap, ToolPermission, Unmapped};
pub use protocol::{JsonRpcError, JsonRpcResponse, Message, MessageParams, Method, RequestId};
