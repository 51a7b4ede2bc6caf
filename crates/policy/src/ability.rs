//! A principal's capability set and the decision function over it.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Action, Effect, Instance, ResourceType, Rule, Subject};

/// Ordered, immutable set of rules built for one principal.
///
/// Decisions are deny-overrides-allow and default-deny: a check is allowed
/// only when some allow rule matches and no deny rule does.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ability {
    rules: Vec<Rule>,
}

impl Ability {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// All rules, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules that apply to a resource type.
    pub fn rules_for(&self, resource: ResourceType) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.resource == resource)
    }

    /// Can `action` be performed on a resource type in general?
    ///
    /// Conditional rules never match a bare type check.
    pub fn can(&self, action: Action, resource: ResourceType) -> bool {
        self.decide(action, resource, |rule| !rule.is_conditional())
    }

    /// Can `action` be performed on this particular instance?
    pub fn can_instance(&self, action: Action, instance: &Instance) -> bool {
        self.decide(action, instance.resource(), |rule| {
            rule.matches_attributes(instance.attrs())
        })
    }

    pub fn can_subject(&self, action: Action, subject: &Subject) -> bool {
        match subject {
            Subject::Type(resource) => self.can(action, *resource),
            Subject::Instance(instance) => self.can_instance(action, instance),
        }
    }

    /// Check an untyped attribute bag, inferring its type structurally.
    ///
    /// A bag whose type cannot be determined is denied.
    pub fn can_attrs(&self, action: Action, attrs: Map<String, Value>) -> bool {
        Instance::classify(attrs).is_some_and(|instance| self.can_instance(action, &instance))
    }

    pub fn cannot(&self, action: Action, resource: ResourceType) -> bool {
        !self.can(action, resource)
    }

    fn decide(
        &self,
        action: Action,
        resource: ResourceType,
        applies: impl Fn(&Rule) -> bool,
    ) -> bool {
        let mut allowed = false;
        for rule in self
            .rules
            .iter()
            .filter(|r| r.resource == resource && r.matches_action(action))
            .filter(|r| applies(*r))
        {
            match rule.effect {
                Effect::Deny => return false,
                Effect::Allow => allowed = true,
            }
        }
        allowed
    }
}
