// GraphQL schema, resolvers and context
pub mod context;
pub mod definition;
pub mod resolver;
pub mod schema;

pub use context::*;
pub use definition::*;
pub use resolver::*;
pub use schema::*;
