//! Route-level policy predicates.

use std::collections::HashMap;

use policy::{Ability, Action, Instance, Principal, ResourceType};
use serde::{Deserialize, Serialize};

/// Named parameters extracted from the request path.
pub type RouteParams = HashMap<String, String>;

/// A pure predicate over a request's capability set.
///
/// Implemented for closures `Fn(&Ability, &RouteParams, &Principal) -> bool`.
pub trait PolicyHandler: Send + Sync {
    fn handle(&self, ability: &Ability, params: &RouteParams, principal: &Principal) -> bool;
}

impl<F> PolicyHandler for F
where
    F: Fn(&Ability, &RouteParams, &Principal) -> bool + Send + Sync,
{
    fn handle(&self, ability: &Ability, params: &RouteParams, principal: &Principal) -> bool {
        self(ability, params, principal)
    }
}

/// Which object a [`Requirement`] is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum Scope {
    /// An instance whose `attribute` (default `id`) is the route parameter `param`.
    Param {
        param: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<String>,
    },
    /// An instance whose `owner` attribute is the principal's own id.
    Owner { owner: String },
}

/// Declarative predicate: "can `action` on `resource`", optionally scoped to an instance.
///
/// Without a scope this is a bare type check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub action: Action,
    pub resource: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl Requirement {
    pub fn new(action: Action, resource: ResourceType) -> Self {
        Self {
            action,
            resource,
            scope: None,
        }
    }

    /// Check against the instance identified by route parameter `param`.
    pub fn by_param(mut self, param: impl Into<String>) -> Self {
        self.scope = Some(Scope::Param {
            param: param.into(),
            attribute: None,
        });
        self
    }

    /// Check against an instance owned by the requesting principal.
    pub fn owned_by(mut self, attribute: impl Into<String>) -> Self {
        self.scope = Some(Scope::Owner {
            owner: attribute.into(),
        });
        self
    }
}

impl PolicyHandler for Requirement {
    fn handle(&self, ability: &Ability, params: &RouteParams, principal: &Principal) -> bool {
        match &self.scope {
            None => ability.can(self.action, self.resource),
            Some(Scope::Param { param, attribute }) => {
                // a missing parameter fails closed
                let Some(value) = params.get(param) else {
                    return false;
                };
                let attribute = attribute.as_deref().unwrap_or("id");
                let instance = Instance::empty(self.resource).with(attribute, value.as_str());
                ability.can_instance(self.action, &instance)
            }
            Some(Scope::Owner { owner }) => {
                let instance =
                    Instance::empty(self.resource).with(owner.as_str(), principal.id.as_str());
                ability.can_instance(self.action, &instance)
            }
        }
    }
}
