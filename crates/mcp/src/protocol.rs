//! Command-channel message types (JSON-RPC 2.0 shaped).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// JSON-RPC 2.0 request id (string or number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// Methods that invoke a named tool, resource or prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    ToolsCall,
    ResourcesRead,
    PromptsGet,
}

impl Method {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "tools/call" => Some(Self::ToolsCall),
            "resources/read" => Some(Self::ResourcesRead),
            "prompts/get" => Some(Self::PromptsGet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolsCall => "tools/call",
            Self::ResourcesRead => "resources/read",
            Self::PromptsGet => "prompts/get",
        }
    }
}

/// Params of an inbound message. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Map<String, Value>>,
}

/// An inbound command-channel message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<MessageParams>,
}

impl Message {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: Some("2.0".to_string()),
            method: Some(method.into()),
            ..Default::default()
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        let mut message = Self::new(Method::ToolsCall.as_str());
        message.params = Some(MessageParams {
            name: Some(name.into()),
            arguments: arguments.as_object().cloned(),
            ..Default::default()
        });
        message
    }

    pub fn resource_read(uri: impl Into<String>) -> Self {
        let mut message = Self::new(Method::ResourcesRead.as_str());
        message.params = Some(MessageParams {
            uri: Some(uri.into()),
            ..Default::default()
        });
        message
    }

    pub fn prompt_get(name: impl Into<String>) -> Self {
        let mut message = Self::new(Method::PromptsGet.as_str());
        message.params = Some(MessageParams {
            name: Some(name.into()),
            ..Default::default()
        });
        message
    }

    pub fn with_id(mut self, id: impl Into<RequestId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Parse a message body.
    pub fn parse(body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|e| Error::InvalidMessage(e.to_string()))
    }

    /// The invocation method, if this message invokes a named item.
    pub fn invocation(&self) -> Option<Method> {
        self.method.as_deref().and_then(Method::parse)
    }

    pub fn name(&self) -> Option<&str> {
        self.params.as_ref()?.name.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.params.as_ref()?.uri.as_deref()
    }

    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.params.as_ref()?.arguments.as_ref()?.get(key)
    }
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const INVALID_REQUEST: i32 = -32600;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const UNAUTHENTICATED: i32 = -32001;
    pub const FORBIDDEN: i32 = -32003;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code;
        let message = &self.message;
        write!(f, "[{code}] {message}")
    }
}

impl std::error::Error for JsonRpcError {}

impl From<&Error> for JsonRpcError {
    fn from(error: &Error) -> Self {
        match error {
            Error::Forbidden { .. } => Self::new(Self::FORBIDDEN, error.to_string()),
            Error::Guard(guard::Error::Unauthenticated) => {
                Self::new(Self::UNAUTHENTICATED, "unauthenticated")
            }
            Error::Guard(guard::Error::Forbidden) => Self::new(Self::FORBIDDEN, "forbidden"),
            Error::InvalidMessage(_) => Self::new(Self::INVALID_REQUEST, error.to_string()),
            _ => Self::new(Self::INTERNAL_ERROR, "internal error"),
        }
    }
}

/// JSON-RPC 2.0 response sent back to the transport.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}
