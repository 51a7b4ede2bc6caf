//! The request gate.

use std::sync::Arc;

use policy::{AbilityBuilder, Principal};
use tracing::{debug, warn};

use crate::{Authorized, Error, PrincipalResolver, Result, Route, RouteParams};

/// Resolves the principal, builds its capability set and evaluates a route's
/// predicates. All predicates must pass.
#[derive(Debug, Clone, Default)]
pub struct PolicyGuard {
    builder: Arc<AbilityBuilder>,
}

impl PolicyGuard {
    pub fn new(builder: AbilityBuilder) -> Self {
        Self {
            builder: Arc::new(builder),
        }
    }

    pub fn builder(&self) -> &AbilityBuilder {
        &self.builder
    }

    /// Gate a request whose principal is already attached.
    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        params: &RouteParams,
        route: &Route,
    ) -> Result<Authorized> {
        let Some(principal) = principal else {
            warn!(route = route.name(), "rejected request without principal");
            return Err(Error::Unauthenticated);
        };

        debug!(
            route = route.name(),
            principal = %principal.id,
            role = %principal.role,
            handlers = route.handlers().len(),
            "evaluating route policies"
        );

        let ability = self.builder.build(principal);

        let allowed = route.handlers().iter().all(|handler| {
            let result = handler.handle(&ability, params, principal);
            debug!(route = route.name(), result, "policy check");
            result
        });

        if !allowed {
            warn!(route = route.name(), principal = %principal.id, "access denied");
            return Err(Error::Forbidden);
        }

        debug!(route = route.name(), principal = %principal.id, "access granted");
        Ok(Authorized::new(principal.clone(), ability, params.clone()))
    }

    /// Resolve `identity` through `resolver`, then gate the request.
    ///
    /// An identity that does not resolve is unauthenticated.
    pub async fn resolve_and_authorize<R: PrincipalResolver>(
        &self,
        resolver: &R,
        identity: Option<&str>,
        params: &RouteParams,
        route: &Route,
    ) -> Result<Authorized> {
        let principal = match identity {
            Some(id) => resolver.resolve(id).await,
            None => None,
        };
        if principal.is_none() {
            debug!(route = route.name(), identity, "identity did not resolve");
        }
        self.authorize(principal.as_ref(), params, route)
    }
}
