//! Request gate for protected operations.
//!
//! Every protected request goes through [`PolicyGuard`]:
//!
//! ```text
//! Unauthenticated ──resolve──▶ Principal ──build──▶ Ability ──predicates──▶ Allowed | Denied
//! ```
//!
//! A request that passes yields an immutable [`Authorized`] context holding
//! the principal and its capability set, which downstream checks reuse.
//!
//! # Example
//!
//! ```
//! use guard::{PolicyGuard, RouteParams, RouteTable};
//! use policy::{Principal, Role};
//!
//! let guard = PolicyGuard::default();
//! let routes = RouteTable::standard();
//! let me = Principal::new("u1", "u1@example.com", Role::User);
//!
//! let params = RouteParams::from([("id".to_string(), "u1".to_string())]);
//! let ctx = guard.authorize(Some(&me), &params, routes.get("users.read")?)?;
//! assert_eq!(ctx.principal().id, "u1");
//!
//! let params = RouteParams::from([("id".to_string(), "u2".to_string())]);
//! assert!(guard.authorize(Some(&me), &params, routes.get("users.read")?).is_err());
//! # Ok::<(), guard::Error>(())
//! ```

mod context;
mod error;
mod guard;
mod handler;
mod resolver;
mod route;

pub use context::Authorized;
pub use error::{Error, Result};
pub use guard::PolicyGuard;
pub use handler::{PolicyHandler, Requirement, RouteParams, Scope};
pub use resolver::{Directory, PrincipalResolver};
pub use route::{Route, RouteTable};
