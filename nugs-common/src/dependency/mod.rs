pub mod definition;
pub mod resolver;

pub use definition::{DeclaredDependency, DependencyDeclaration};
pub use resolver::{
    available_platforms, resolve, DependencyResolver, IssueKind, Resolution, ResolutionIssue,
    ResolvedSet,
};
