//! GraphQL client for integration testing.
//!
//! Executes GraphQL documents directly against the schema without HTTP overhead.

use juniper::Variables;
use keycloak_graphql::common::auth::CapabilityContext;
use keycloak_graphql::domains::directives::apply_directive_transformers;
use keycloak_graphql::server::graphql::{build_schema, GraphQLContext, Schema, SchemaDefinition};
use serde_json::Value;
use std::sync::Arc;

/// GraphQL client for executing queries and mutations in tests.
pub struct GraphQLClient {
    schema: Schema,
    context: GraphQLContext,
}

/// Result of a GraphQL execution.
#[derive(Debug)]
pub struct GraphQLResult {
    pub data: Option<Value>,
    pub errors: Vec<String>,
    /// `extensions.code` of each error, in the same order as `errors`
    pub error_codes: Vec<Option<String>>,
    /// `path` of each error, as a JSON array
    pub error_paths: Vec<Value>,
}

impl GraphQLResult {
    /// Returns true if the execution had no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Unwraps the data, panicking if there were errors.
    pub fn unwrap(self) -> Value {
        if !self.errors.is_empty() {
            panic!("GraphQL errors: {:?}", self.errors);
        }
        self.data.expect("No data returned")
    }

    /// Gets a value at the given JSON path.
    ///
    /// # Example
    /// ```ignore
    /// let title = result.get("article.title").as_str();
    /// ```
    pub fn get(&self, path: &str) -> Value {
        let data = self.data.as_ref().expect("No data returned");
        let mut current = data;
        for key in path.split('.') {
            current = &current[key];
        }
        current.clone()
    }

    /// True if any error message contains `needle`, ignoring case.
    pub fn has_error(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.errors
            .iter()
            .any(|e| e.to_lowercase().contains(&needle))
    }
}

impl GraphQLClient {
    /// Applies the authorization directives and builds the schema.
    pub fn new(definition: SchemaDefinition, context: GraphQLContext) -> Self {
        let definition =
            apply_directive_transformers(definition).expect("Invalid authorization directives");

        Self {
            schema: build_schema(definition).expect("Failed to build schema"),
            context,
        }
    }

    /// Client for a caller without capabilities.
    pub fn anonymous(definition: SchemaDefinition) -> Self {
        Self::new(definition, GraphQLContext::default())
    }

    /// Client for a caller with the given capabilities.
    pub fn with_capabilities<C>(definition: SchemaDefinition, capabilities: Arc<C>) -> Self
    where
        C: CapabilityContext + 'static,
    {
        Self::new(definition, GraphQLContext::with_capabilities(capabilities))
    }

    /// Execute a GraphQL query/mutation.
    pub async fn execute(&self, query: &str) -> GraphQLResult {
        self.execute_with_vars(query, Variables::new()).await
    }

    /// Execute a GraphQL query/mutation with variables.
    pub async fn execute_with_vars(&self, query: &str, variables: Variables) -> GraphQLResult {
        let (result, errors) =
            juniper::execute(query, None, &self.schema, &variables, &self.context)
                .await
                .expect("GraphQL execution failed");

        // Convert juniper::Value to serde_json::Value
        let data = Some(serde_json::to_value(&result).expect("Failed to serialize GraphQL result"));

        let error_messages: Vec<String> = errors
            .iter()
            .map(|e| e.error().message().to_string())
            .collect();

        let serialized = serde_json::to_value(&errors).expect("Failed to serialize GraphQL errors");
        let serialized = serialized.as_array().cloned().unwrap_or_default();

        let error_codes = serialized
            .iter()
            .map(|e| e["extensions"]["code"].as_str().map(str::to_string))
            .collect();
        let error_paths = serialized.iter().map(|e| e["path"].clone()).collect();

        GraphQLResult {
            data,
            errors: error_messages,
            error_codes,
            error_paths,
        }
    }

    /// Execute a query and expect success, returning the data.
    pub async fn query(&self, query: &str) -> Value {
        self.execute(query).await.unwrap()
    }
}
