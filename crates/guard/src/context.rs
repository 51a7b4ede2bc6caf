//! The immutable per-request authorization context.

use policy::{Ability, Principal};

use crate::RouteParams;

/// A request that passed the guard.
///
/// Carries the resolved principal and the capability set built for it so
/// downstream checks reuse it instead of rebuilding.
#[derive(Debug, Clone)]
pub struct Authorized {
    principal: Principal,
    ability: Ability,
    params: RouteParams,
}

impl Authorized {
    pub(crate) fn new(principal: Principal, ability: Ability, params: RouteParams) -> Self {
        Self {
            principal,
            ability,
            params,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn ability(&self) -> &Ability {
        &self.ability
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }
}
