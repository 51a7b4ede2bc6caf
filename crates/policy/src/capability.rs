//! The rule language: actions, resource types and allow/deny rules.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Actions a principal can perform.
///
/// [`Action::Manage`] is a wildcard: a rule for `manage` matches a check for
/// any action on the same resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Manage,
    Create,
    Read,
    List,
    Update,
    Delete,
    Access,
    Execute,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Manage,
        Action::Create,
        Action::Read,
        Action::List,
        Action::Update,
        Action::Delete,
        Action::Access,
        Action::Execute,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Manage => "manage",
            Action::Create => "create",
            Action::Read => "read",
            Action::List => "list",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Access => "access",
            Action::Execute => "execute",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}

/// Closed set of protected resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    User,
    #[serde(rename = "MCP")]
    Mcp,
    Resource,
    Prompt,
    Tool,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::User,
        ResourceType::Mcp,
        ResourceType::Resource,
        ResourceType::Prompt,
        ResourceType::Tool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::User => "User",
            ResourceType::Mcp => "MCP",
            ResourceType::Resource => "Resource",
            ResourceType::Prompt => "Prompt",
            ResourceType::Tool => "Tool",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::UnknownResourceType(s.to_string()))
    }
}

/// Whether a rule grants or revokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// Attribute predicate: every entry must equal the instance attribute exactly.
pub type Conditions = BTreeMap<String, Value>;

/// A single allow/deny rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub effect: Effect,
    pub action: Action,
    pub resource: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
}

impl Rule {
    pub fn allow(action: Action, resource: ResourceType) -> Self {
        Self {
            effect: Effect::Allow,
            action,
            resource,
            conditions: None,
        }
    }

    pub fn deny(action: Action, resource: ResourceType) -> Self {
        Self {
            effect: Effect::Deny,
            action,
            resource,
            conditions: None,
        }
    }

    /// Narrow the rule with an attribute condition.
    pub fn when(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .get_or_insert_with(Conditions::new)
            .insert(attribute.into(), value.into());
        self
    }

    /// `manage` matches every action.
    pub fn matches_action(&self, action: Action) -> bool {
        self.action == action || self.action == Action::Manage
    }

    pub fn is_conditional(&self) -> bool {
        self.conditions.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Check the attribute predicate against an instance's attributes.
    pub fn matches_attributes(&self, attrs: &serde_json::Map<String, Value>) -> bool {
        match &self.conditions {
            None => true,
            Some(conditions) => conditions
                .iter()
                .all(|(key, expected)| attrs.get(key) == Some(expected)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_known_names() {
        assert_eq!("list".parse::<Action>().unwrap(), Action::List);
        assert_eq!("MCP".parse::<ResourceType>().unwrap(), ResourceType::Mcp);
    }

    #[test]
    fn unknown_names_are_errors() {
        assert!(matches!(
            "destroy".parse::<Action>(),
            Err(Error::UnknownAction(_))
        ));
        assert!(matches!(
            "Invoice".parse::<ResourceType>(),
            Err(Error::UnknownResourceType(_))
        ));
        // case matters
        assert!("mcp".parse::<ResourceType>().is_err());
    }

    #[test]
    fn manage_matches_any_action() {
        let rule = Rule::allow(Action::Manage, ResourceType::User);
        for action in Action::ALL {
            assert!(rule.matches_action(action));
        }
        let read = Rule::allow(Action::Read, ResourceType::User);
        assert!(!read.matches_action(Action::Update));
        assert!(!read.matches_action(Action::Manage));
    }

    #[test]
    fn attribute_match_is_exact() {
        let rule = Rule::allow(Action::Read, ResourceType::User).when("id", "42");
        let attrs = |v: Value| v.as_object().cloned().unwrap();

        assert!(rule.matches_attributes(&attrs(json!({"id": "42", "email": "a@b"}))));
        assert!(!rule.matches_attributes(&attrs(json!({"id": 42}))));
        assert!(!rule.matches_attributes(&attrs(json!({}))));
    }

    #[test]
    fn serialize_rule() {
        let rule = Rule::deny(Action::Execute, ResourceType::Prompt).when("adminOnly", true);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            json!({
                "effect": "deny",
                "action": "execute",
                "resource": "Prompt",
                "conditions": {"adminOnly": true}
            })
        );
    }
}
