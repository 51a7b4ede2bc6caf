//! Per-message permission checks for the command channel.

use std::fmt;

use guard::Authorized;
use policy::{Ability, Action, Instance, ResourceType};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    Error, ItemPermission, Message, Method, PermissionMap, Result, ToolPermission, Unmapped,
};

/// The named item a message invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Tool(String),
    Resource(String),
    Prompt(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Tool(name) => write!(f, "tool '{name}'"),
            Target::Resource(uri) => write!(f, "resource '{uri}'"),
            Target::Prompt(name) => write!(f, "prompt '{name}'"),
        }
    }
}

/// Outcome of a message check that did not deny.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The invoked item is mapped and the capability set allows it.
    Granted,
    /// The invoked item is not mapped and unmapped items are allowed.
    Unmapped,
    /// The method does not invoke a named item.
    Ungated,
}

/// Maps command-channel messages to permission checks.
#[derive(Debug, Clone, Default)]
pub struct ToolPermissionMapper {
    map: PermissionMap,
}

impl ToolPermissionMapper {
    pub fn new(map: PermissionMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &PermissionMap {
        &self.map
    }

    /// Check a message against the request's capability set.
    pub fn check(&self, ctx: &Authorized, message: &Message) -> Result<Verdict> {
        self.evaluate(ctx.ability(), message)
    }

    /// Check a message against a capability set.
    ///
    /// Returns [`Error::Forbidden`] when the operation must not run.
    pub fn evaluate(&self, ability: &Ability, message: &Message) -> Result<Verdict> {
        let Some(method) = message.method.as_deref() else {
            return Err(Error::InvalidMessage("missing method".to_string()));
        };
        let Some(invocation) = Method::parse(method) else {
            debug!(method, "method not gated per message");
            return Ok(Verdict::Ungated);
        };

        match invocation {
            Method::ToolsCall => {
                let name = required(message.name(), invocation, "name")?;
                let target = Target::Tool(name.to_string());
                let Some(permission) = self.map.tool(name) else {
                    return self.unmapped(Action::Execute, target);
                };

                let id = message.argument("id").filter(|_| permission.requires_id);
                let allowed = tool_allowed(ability, permission, name, id);
                debug!(
                    tool = name,
                    action = %permission.action,
                    resource = %permission.resource,
                    allowed,
                    "tool permission"
                );
                verdict(allowed, permission.action, target)
            }
            Method::ResourcesRead => {
                let uri = required(message.uri(), invocation, "uri")?;
                let target = Target::Resource(uri.to_string());
                let Some(permission) = self.map.resource(uri) else {
                    return self.unmapped(Action::Access, target);
                };

                // {public, adminOnly} classifies as Resource
                let allowed = ability.can_attrs(permission.action, visibility(permission));
                debug!(
                    resource = uri,
                    admin_only = permission.admin_only,
                    allowed,
                    "resource permission"
                );
                verdict(allowed, permission.action, target)
            }
            Method::PromptsGet => {
                let name = required(message.name(), invocation, "name")?;
                let target = Target::Prompt(name.to_string());
                let Some(permission) = self.map.prompt(name) else {
                    return self.unmapped(Action::Execute, target);
                };

                // the same shape would classify as Resource, so tag it
                let instance = Instance::new(ResourceType::Prompt, visibility(permission));
                let allowed = ability.can_instance(permission.action, &instance);
                debug!(
                    prompt = name,
                    admin_only = permission.admin_only,
                    allowed,
                    "prompt permission"
                );
                verdict(allowed, permission.action, target)
            }
        }
    }

    fn unmapped(&self, action: Action, target: Target) -> Result<Verdict> {
        match self.map.unmapped {
            Unmapped::Allow => {
                debug!(%target, "unmapped target allowed");
                Ok(Verdict::Unmapped)
            }
            Unmapped::Deny => {
                warn!(%target, "unmapped target denied");
                Err(Error::Forbidden { action, target })
            }
        }
    }
}

/// Tools are checked as a `{name}` instance so name-scoped rules apply.
/// Other resources are checked by `id` when one is given, else by type.
fn tool_allowed(
    ability: &Ability,
    permission: &ToolPermission,
    name: &str,
    id: Option<&Value>,
) -> bool {
    let instance = match (permission.resource, id) {
        (ResourceType::Tool, id) => {
            let instance = Instance::empty(ResourceType::Tool).with("name", name);
            match id {
                Some(id) => instance.with("id", id.clone()),
                None => instance,
            }
        }
        (resource, Some(id)) => Instance::empty(resource).with("id", id.clone()),
        (resource, None) => return ability.can(permission.action, resource),
    };
    ability.can_instance(permission.action, &instance)
}

fn required<'a>(value: Option<&'a str>, method: Method, field: &str) -> Result<&'a str> {
    value.ok_or_else(|| Error::InvalidMessage(format!("{} without {field}", method.as_str())))
}

fn visibility(permission: &ItemPermission) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("public".to_string(), Value::Bool(!permission.admin_only));
    attrs.insert("adminOnly".to_string(), Value::Bool(permission.admin_only));
    attrs
}

fn verdict(allowed: bool, action: Action, target: Target) -> Result<Verdict> {
    if allowed {
        Ok(Verdict::Granted)
    } else {
        warn!(%action, %target, "message denied");
        Err(Error::Forbidden { action, target })
    }
}
