//! Permission tables for tools, resources and prompts.

use std::collections::BTreeMap;

use policy::{Action, ResourceType};
use serde::{Deserialize, Serialize};

/// What calling a tool requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPermission {
    pub action: Action,
    pub resource: ResourceType,
    /// Check against the instance named by `arguments.id` when present.
    #[serde(default)]
    pub requires_id: bool,
}

impl ToolPermission {
    pub fn new(action: Action, resource: ResourceType) -> Self {
        Self {
            action,
            resource,
            requires_id: false,
        }
    }

    pub fn by_id(mut self) -> Self {
        self.requires_id = true;
        self
    }
}

/// What reading a resource or getting a prompt requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPermission {
    pub action: Action,
    #[serde(default)]
    pub admin_only: bool,
}

impl ItemPermission {
    pub fn open(action: Action) -> Self {
        Self {
            action,
            admin_only: false,
        }
    }

    pub fn admin_only(action: Action) -> Self {
        Self {
            action,
            admin_only: true,
        }
    }
}

/// Treatment of tools, resources and prompts missing from the tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unmapped {
    #[default]
    Deny,
    Allow,
}

/// Lookup tables used by [`crate::ToolPermissionMapper`].
///
/// Tables omitted from configuration fall back to the built-in ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionMap {
    #[serde(default)]
    pub unmapped: Unmapped,
    #[serde(default = "default_tools")]
    pub tools: BTreeMap<String, ToolPermission>,
    #[serde(default = "default_resources")]
    pub resources: BTreeMap<String, ItemPermission>,
    #[serde(default = "default_prompts")]
    pub prompts: BTreeMap<String, ItemPermission>,
}

impl Default for PermissionMap {
    fn default() -> Self {
        Self {
            unmapped: Unmapped::default(),
            tools: default_tools(),
            resources: default_resources(),
            prompts: default_prompts(),
        }
    }
}

impl PermissionMap {
    /// Empty tables; only the unmapped policy applies.
    pub fn empty(unmapped: Unmapped) -> Self {
        Self {
            unmapped,
            tools: BTreeMap::new(),
            resources: BTreeMap::new(),
            prompts: BTreeMap::new(),
        }
    }

    pub fn tool(&self, name: &str) -> Option<&ToolPermission> {
        self.tools.get(name)
    }

    pub fn resource(&self, uri: &str) -> Option<&ItemPermission> {
        self.resources.get(uri)
    }

    pub fn prompt(&self, name: &str) -> Option<&ItemPermission> {
        self.prompts.get(name)
    }
}

fn default_tools() -> BTreeMap<String, ToolPermission> {
    use Action::*;
    use ResourceType::User;

    [
        ("listUsers", ToolPermission::new(List, User)),
        ("getUser", ToolPermission::new(Read, User).by_id()),
        ("getUserByEmail", ToolPermission::new(Read, User).by_id()),
        ("createUser", ToolPermission::new(Create, User)),
        ("updateUser", ToolPermission::new(Update, User).by_id()),
        ("deleteUser", ToolPermission::new(Delete, User).by_id()),
    ]
    .into_iter()
    .map(|(name, permission)| (name.to_string(), permission))
    .collect()
}

fn default_resources() -> BTreeMap<String, ItemPermission> {
    [
        ("schema://prisma/user", false),
        ("schema://prisma/full", true),
        ("config://api/endpoints", false),
        ("config://casl/permissions", true),
        ("stats://users/summary", true),
        ("docs://api/getting-started", false),
        ("docs://mcp/protocol", false),
    ]
    .into_iter()
    .map(|(uri, admin_only)| {
        let permission = if admin_only {
            ItemPermission::admin_only(Action::Access)
        } else {
            ItemPermission::open(Action::Access)
        };
        (uri.to_string(), permission)
    })
    .collect()
}

fn default_prompts() -> BTreeMap<String, ItemPermission> {
    [
        ("user-analysis", ItemPermission::open(Action::Execute)),
        ("user-report", ItemPermission::open(Action::Execute)),
        ("security-audit", ItemPermission::admin_only(Action::Execute)),
    ]
    .into_iter()
    .map(|(name, permission)| (name.to_string(), permission))
    .collect()
}
