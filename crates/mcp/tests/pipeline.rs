//! Request gate → per-message check → dispatch, end to end.

use std::sync::Mutex;

use guard::{Authorized, Directory, PolicyGuard, RouteParams, RouteTable};
use mcp::{Channel, Dispatcher, Error, Message, Target, ToolPermissionMapper};
use policy::{AbilityBuilder, Action, Instance, Principal, ResourceType, Role, RuleTable};
use serde_json::{Value, json};

/// Records every message that reaches dispatch.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl Dispatcher for &Recorder {
    async fn dispatch(&self, ctx: &Authorized, message: Message) -> mcp::Result<Value> {
        let label = message
            .name()
            .or(message.uri())
            .or(message.method.as_deref())
            .unwrap_or_default()
            .to_string();
        self.seen.lock().unwrap().push(label);
        Ok(json!({"ok": true, "by": ctx.principal().id}))
    }
}

fn admin() -> Principal {
    Principal::new("a1", "admin@test.com", Role::Admin)
}

fn user(id: &str) -> Principal {
    Principal::new(id, format!("{id}@test.com"), Role::User)
}

fn channel(recorder: &Recorder) -> Channel<&Recorder> {
    Channel::new(
        PolicyGuard::default(),
        &RouteTable::standard(),
        ToolPermissionMapper::default(),
        recorder,
    )
    .unwrap()
}

#[test]
fn scenario_a_user_reads_only_self() {
    let guard = PolicyGuard::default();
    let routes = RouteTable::standard();
    let read = routes.get("users.read").unwrap();
    let me = user("u1");

    let own = RouteParams::from([("id".to_string(), "u1".to_string())]);
    let ctx = guard.authorize(Some(&me), &own, read).unwrap();

    // the attached capability set answers instance checks directly
    let u1 = Instance::empty(ResourceType::User).with("id", "u1");
    let u2 = Instance::empty(ResourceType::User).with("id", "u2");
    assert!(ctx.ability().can_instance(Action::Read, &u1));
    assert!(!ctx.ability().can_instance(Action::Read, &u2));

    let other = RouteParams::from([("id".to_string(), "u2".to_string())]);
    assert!(matches!(
        guard.authorize(Some(&me), &other, read),
        Err(guard::Error::Forbidden)
    ));
}

#[tokio::test]
async fn scenario_b_admin_lists_users() {
    let recorder = Recorder::default();
    let channel = channel(&recorder);

    for arguments in [json!({}), json!({"id": "u2"}), json!({"limit": 5, "filter": "x"})] {
        let result = channel
            .handle(Some(&admin()), Message::tool_call("listUsers", arguments))
            .await
            .unwrap();
        assert_eq!(result["by"], json!("a1"));
    }
    assert_eq!(recorder.seen().len(), 3);
}

#[tokio::test]
async fn scenario_c_user_cannot_delete_self() {
    let recorder = Recorder::default();
    let channel = channel(&recorder);

    let err = channel
        .handle(Some(&user("u1")), Message::tool_call("deleteUser", json!({"id": "u1"})))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Forbidden {
            action: Action::Delete,
            target: Target::Tool(ref name),
        } if name == "deleteUser"
    ));
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn denied_messages_never_dispatch() {
    let recorder = Recorder::default();
    let channel = channel(&recorder);
    let me = user("u1");

    let denied = [
        Message::tool_call("getUser", json!({"id": "u2"})),
        Message::tool_call("listUsers", json!({})),
        Message::tool_call("createUser", json!({"email": "x@test.com"})),
        Message::tool_call("run_terminal", json!({"command": "ls"})),
        Message::resource_read("schema://prisma/full"),
        Message::resource_read("config://casl/permissions"),
        Message::prompt_get("security-audit"),
    ];
    for message in denied {
        let result = channel.handle(Some(&me), message).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
    }
    assert!(recorder.seen().is_empty());

    let allowed = [
        Message::tool_call("getUser", json!({"id": "u1"})),
        Message::tool_call("updateUser", json!({"id": "u1", "name": "New"})),
        Message::resource_read("schema://prisma/user"),
        Message::prompt_get("user-analysis"),
        Message::new("tools/list"),
    ];
    for message in allowed {
        channel.handle(Some(&me), message).await.unwrap();
    }
    assert_eq!(
        recorder.seen(),
        vec!["getUser", "updateUser", "schema://prisma/user", "user-analysis", "tools/list"]
    );
}

#[tokio::test]
async fn unauthenticated_messages_never_dispatch() {
    let recorder = Recorder::default();
    let channel = channel(&recorder);

    let result = channel.handle(None, Message::new("tools/list")).await;
    assert!(matches!(result, Err(Error::Guard(guard::Error::Unauthenticated))));
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn resolved_principals_flow_through_the_channel() {
    let directory = Directory::new().with(admin()).with(user("u1"));
    let guard = PolicyGuard::default();
    let routes = RouteTable::standard();
    let route = routes.get("users.delete").unwrap();
    let target = RouteParams::from([("id".to_string(), "u1".to_string())]);

    assert!(guard.resolve_and_authorize(&directory, Some("a1"), &target, route).await.is_ok());
    assert!(matches!(
        guard.resolve_and_authorize(&directory, Some("u1"), &target, route).await,
        Err(guard::Error::Forbidden)
    ));
}

#[tokio::test]
async fn extended_rule_table_grants_tools() {
    let table = RuleTable::parse(
        r#"
[[rules]]
role = "USER"
effect = "allow"
action = "execute"
resource = "Tool"
"#,
    )
    .unwrap();
    let map: mcp::PermissionMap = serde_json::from_value(json!({
        "tools": {
            "read_file": {"action": "execute", "resource": "Tool"},
            "list_dir": {"action": "execute", "resource": "Tool"}
        }
    }))
    .unwrap();

    let recorder = Recorder::default();
    let channel = Channel::new(
        PolicyGuard::new(AbilityBuilder::new(table)),
        &RouteTable::standard(),
        ToolPermissionMapper::new(map),
        &recorder,
    )
    .unwrap();
    let me = user("u1");

    for tool in ["read_file", "list_dir"] {
        channel
            .handle(Some(&me), Message::tool_call(tool, json!({"path": "."})))
            .await
            .unwrap();
    }
    // not in the configured table, so denied by default
    let result = channel
        .handle(Some(&me), Message::tool_call("run_terminal", json!({})))
        .await;
    assert!(matches!(result, Err(Error::Forbidden { .. })));
    // the configured table replaces the built-in user tools
    let result = channel
        .handle(Some(&me), Message::tool_call("getUser", json!({"id": "u1"})))
        .await;
    assert!(matches!(result, Err(Error::Forbidden { .. })));
    assert_eq!(recorder.seen(), vec!["read_file", "list_dir"]);
}

fn tool_channel<'a>(recorder: &'a Recorder, rules: &str) -> Channel<&'a Recorder> {
    let map: mcp::PermissionMap = serde_json::from_value(json!({
        "tools": {
            "read_file": {"action": "execute", "resource": "Tool"},
            "run_terminal": {"action": "execute", "resource": "Tool"}
        }
    }))
    .unwrap();
    Channel::new(
        PolicyGuard::new(AbilityBuilder::new(RuleTable::parse(rules).unwrap())),
        &RouteTable::standard(),
        ToolPermissionMapper::new(map),
        recorder,
    )
    .unwrap()
}

#[tokio::test]
async fn name_scoped_grants_reach_dispatch() {
    let recorder = Recorder::default();
    let channel = tool_channel(
        &recorder,
        r#"
[[rules]]
role = "USER"
effect = "allow"
action = "execute"
resource = "Tool"
conditions = { name = "read_file" }
"#,
    );
    let me = user("u1");

    channel
        .handle(Some(&me), Message::tool_call("read_file", json!({"path": "."})))
        .await
        .unwrap();
    let result = channel
        .handle(Some(&me), Message::tool_call("run_terminal", json!({})))
        .await;
    assert!(matches!(result, Err(Error::Forbidden { .. })));
    assert_eq!(recorder.seen(), vec!["read_file"]);
}

#[tokio::test]
async fn name_scoped_denials_block_dispatch() {
    let recorder = Recorder::default();
    let channel = tool_channel(
        &recorder,
        r#"
[[rules]]
role = "USER"
effect = "allow"
action = "execute"
resource = "Tool"

[[rules]]
role = "USER"
effect = "deny"
action = "execute"
resource = "Tool"
conditions = { name = "run_terminal" }
"#,
    );
    let me = user("u1");

    let result = channel
        .handle(Some(&me), Message::tool_call("run_terminal", json!({"command": "rm -rf /"})))
        .await;
    assert!(matches!(
        result,
        Err(Error::Forbidden { target: Target::Tool(ref name), .. }) if name == "run_terminal"
    ));
    channel
        .handle(Some(&me), Message::tool_call("read_file", json!({})))
        .await
        .unwrap();
    assert_eq!(recorder.seen(), vec!["read_file"]);
}
