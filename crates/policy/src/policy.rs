//! Role rule table and capability-set construction.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Ability, Action, Conditions, Effect, Error, Principal, ResourceType, Result, Role, Rule,
    TYPE_HINT_FIELD,
};

/// Condition value bound to the principal's own id when a capability set is built.
pub const SELF_PLACEHOLDER: &str = "@self";

/// A rule template granted to every principal with `role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRule {
    pub role: Role,
    pub effect: Effect,
    pub action: Action,
    pub resource: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,
}

impl RoleRule {
    fn new(role: Role, effect: Effect, action: Action, resource: ResourceType) -> Self {
        Self {
            role,
            effect,
            action,
            resource,
            conditions: None,
        }
    }

    fn when(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .get_or_insert_with(Conditions::new)
            .insert(attribute.to_string(), value.into());
        self
    }

    fn owned_by_self(self, attribute: &str) -> Self {
        self.when(attribute, SELF_PLACEHOLDER)
    }

    /// Bind self-references to `principal` and produce a concrete rule.
    fn bind(&self, principal: &Principal) -> Rule {
        let conditions = self.conditions.as_ref().map(|conditions| {
            conditions
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) if s == SELF_PLACEHOLDER => {
                            Value::String(principal.id.clone())
                        }
                        other => other.clone(),
                    };
                    (key.clone(), value)
                })
                .collect()
        });

        Rule {
            effect: self.effect,
            action: self.action,
            resource: self.resource,
            conditions,
        }
    }
}

/// The rule table every capability set is built from.
///
/// Always starts with the standard ADMIN/USER table; configured rules are
/// appended after it and can add grants or denials but never remove the
/// standard ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTable {
    rules: Vec<RoleRule>,
}

#[derive(Debug, Default, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RoleRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleTable {
    /// The standard table.
    pub fn standard() -> Self {
        use Action::*;
        use Effect::{Allow, Deny};
        use ResourceType::*;

        let admin = |effect, action, resource| RoleRule::new(Role::Admin, effect, action, resource);
        let user = |effect, action, resource| RoleRule::new(Role::User, effect, action, resource);

        let rules = vec![
            admin(Allow, Manage, User),
            admin(Allow, Manage, Mcp),
            admin(Allow, Manage, Resource),
            admin(Allow, Manage, Prompt),
            user(Allow, Read, User).owned_by_self("id"),
            user(Allow, Update, User).owned_by_self("id"),
            user(Deny, List, User),
            user(Deny, Create, User),
            user(Deny, Delete, User),
            user(Allow, Read, Mcp).owned_by_self("userId"),
            user(Allow, Update, Mcp).owned_by_self("userId"),
            user(Allow, Access, Resource).when("public", true),
            user(Allow, Access, Resource).owned_by_self("userId"),
            user(Deny, Access, Resource).when("adminOnly", true),
            user(Allow, Execute, Prompt).when("public", true),
            user(Allow, Execute, Prompt).owned_by_self("userId"),
            user(Deny, Execute, Prompt).when("adminOnly", true),
        ];

        Self { rules }
    }

    /// The standard table extended with `extra` rules.
    pub fn with_rules(extra: impl IntoIterator<Item = RoleRule>) -> Result<Self> {
        let mut table = Self::standard();
        table.rules.extend(extra);
        table.validate()?;
        Ok(table)
    }

    /// Load table extensions from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse table extensions from a TOML string (`[[rules]]` entries).
    pub fn parse(toml: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        Self::with_rules(file.rules)
    }

    pub fn rules(&self) -> &[RoleRule] {
        &self.rules
    }

    fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            let Some(conditions) = &rule.conditions else {
                continue;
            };
            for key in conditions.keys() {
                if key.is_empty() {
                    return Err(Error::Invalid(format!(
                        "empty condition attribute on {} {} for {}",
                        rule.action, rule.resource, rule.role
                    )));
                }
                // the hint is stripped during classification and could never match
                if key == TYPE_HINT_FIELD {
                    return Err(Error::Invalid(format!(
                        "condition on reserved attribute {TYPE_HINT_FIELD}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Builds a principal's [`Ability`] from a [`RuleTable`].
///
/// Pure and deterministic; safe to call once per request.
#[derive(Debug, Clone, Default)]
pub struct AbilityBuilder {
    table: RuleTable,
}

impl AbilityBuilder {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Build the capability set for `principal`.
    pub fn build(&self, principal: &Principal) -> Ability {
        let rules = self
            .table
            .rules
            .iter()
            .filter(|r| r.role == principal.role)
            .map(|r| r.bind(principal))
            .collect();
        Ability::new(rules)
    }
}
