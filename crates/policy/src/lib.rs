//! Role- and attribute-based permission evaluation.
//!
//! Core principle: **anything not explicitly allowed is denied, and an
//! explicit denial always wins.**
//!
//! # Example
//!
//! ```
//! use policy::{AbilityBuilder, Action, Instance, Principal, ResourceType, Role};
//!
//! let principal = Principal::new("u1", "u1@example.com", Role::User);
//! let ability = AbilityBuilder::default().build(&principal);
//!
//! let me = Instance::empty(ResourceType::User).with("id", "u1");
//! let them = Instance::empty(ResourceType::User).with("id", "u2");
//!
//! assert!(ability.can_instance(Action::Read, &me));
//! assert!(!ability.can_instance(Action::Read, &them));
//! assert!(!ability.can(Action::List, ResourceType::User));
//! ```

mod ability;
mod capability;
mod error;
mod policy;
mod principal;
mod subject;

pub use ability::Ability;
pub use capability::{Action, Conditions, Effect, ResourceType, Rule};
pub use error::{Error, Result};
pub use policy::{AbilityBuilder, RoleRule, RuleTable, SELF_PLACEHOLDER};
pub use principal::{Principal, Role};
pub use subject::{Instance, Subject, TYPE_HINT_FIELD, classify};
