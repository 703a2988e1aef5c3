use async_trait::async_trait;
use juniper::{FieldResult, IntoFieldError};
use serde_json::Value;
use tracing::debug;

use super::annotation::Annotation;
use crate::common::auth::{is_authorized_by_role, AuthError, HasCapabilities};
use crate::server::graphql::{FieldResolver, Resolver, ResolverParams};

/// Requirements collected from one field's directives
///
/// Only lives while the schema is being transformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRequirements {
    pub auth: bool,
    pub roles: Option<Vec<String>>,
    pub permissions: Option<Vec<String>>,
}

impl FieldRequirements {
    pub fn is_empty(&self) -> bool {
        !self.auth && self.roles.is_none() && self.permissions.is_none()
    }

    /// Record an annotation; false if the same kind was already recorded
    pub fn record(&mut self, annotation: Annotation) -> bool {
        match annotation {
            Annotation::None => true,
            Annotation::Auth => !std::mem::replace(&mut self.auth, true),
            Annotation::HasRole(roles) => self.roles.replace(roles).is_none(),
            Annotation::HasPermission(resources) => self.permissions.replace(resources).is_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Authenticated,
    Role(Vec<String>),
    Permission(Vec<String>),
}

/// Ordered checks run before a field resolves
///
/// Authentication always runs first, so role and permission failures are
/// only reported for authenticated callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    checks: Vec<Check>,
}

impl Guard {
    /// `None` when the field has no requirements
    pub fn from_requirements(requirements: FieldRequirements) -> Option<Self> {
        if requirements.is_empty() {
            return None;
        }

        let mut checks = vec![Check::Authenticated];
        if let Some(roles) = requirements.roles {
            checks.push(Check::Role(roles));
        }
        if let Some(resources) = requirements.permissions {
            checks.push(Check::Permission(resources));
        }

        Some(Self { checks })
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Run every check in order, stopping at the first failure
    pub async fn check<C>(&self, context: &C) -> Result<(), AuthError>
    where
        C: HasCapabilities + Sync + ?Sized,
    {
        for check in &self.checks {
            match check {
                Check::Authenticated => {
                    let authenticated = context
                        .capabilities()
                        .is_some_and(|capabilities| capabilities.is_authenticated());
                    if !authenticated {
                        return Err(AuthError::NotAuthenticated);
                    }
                }
                Check::Role(roles) => {
                    if !is_authorized_by_role(roles, Some(context)) {
                        return Err(AuthError::MissingRole(roles.clone()));
                    }
                }
                Check::Permission(resources) => {
                    let granted = match context.capabilities() {
                        Some(capabilities) => capabilities.has_permission(resources).await,
                        None => false,
                    };
                    if !granted {
                        return Err(AuthError::MissingPermission(resources.clone()));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Runs the guard, then the wrapped resolver with the same params
pub struct GuardedResolver {
    guard: Guard,
    inner: Resolver,
}

impl GuardedResolver {
    pub fn new(guard: Guard, inner: Resolver) -> Self {
        Self { guard, inner }
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }
}

#[async_trait]
impl FieldResolver for GuardedResolver {
    async fn resolve(&self, params: ResolverParams) -> FieldResult<Value> {
        if let Err(err) = self.guard.check(&params.context).await {
            debug!(
                type_name = %params.type_name,
                field = %params.field_name,
                error = %err,
                "Field access denied"
            );
            return Err(err.into_field_error());
        }

        self.inner.resolve(params).await
    }
}
