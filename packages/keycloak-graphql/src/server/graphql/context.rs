use std::fmt;
use std::sync::Arc;

use crate::common::auth::{CapabilityContext, ConnectionContext, HasCapabilities, RequestContext};

/// GraphQL request context
///
/// Carries the caller's capabilities into every resolver. A context without
/// capabilities is an unauthenticated caller.
#[derive(Clone, Default)]
pub struct GraphQLContext {
    capabilities: Option<Arc<dyn CapabilityContext>>,
}

impl juniper::Context for GraphQLContext {}

impl fmt::Debug for GraphQLContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQLContext")
            .field("has_capabilities", &self.capabilities.is_some())
            .finish()
    }
}

impl GraphQLContext {
    pub fn new(capabilities: Option<Arc<dyn CapabilityContext>>) -> Self {
        Self { capabilities }
    }

    pub fn with_capabilities<C>(capabilities: Arc<C>) -> Self
    where
        C: CapabilityContext + 'static,
    {
        Self {
            capabilities: Some(capabilities),
        }
    }

    /// Context for a single HTTP request
    pub fn from_request(context: RequestContext) -> Self {
        Self::with_capabilities(Arc::new(context))
    }

    /// Context for an operation running on an established connection
    pub fn from_connection(context: ConnectionContext) -> Self {
        Self::with_capabilities(Arc::new(context))
    }
}

impl HasCapabilities for GraphQLContext {
    fn capabilities(&self) -> Option<&dyn CapabilityContext> {
        self.capabilities.as_deref()
    }
}
