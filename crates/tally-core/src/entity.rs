//! Traced program entities and source-location abstractions.
//!
//! The tracer attributes counter deltas to work items tied to program
//! entities (declarations, expressions, compiled functions). The entities
//! themselves are defined by the host compiler; this module only asks them
//! for two capabilities: render a short name, and hand back an opaque
//! source range that an externally supplied [`LocationResolver`] can turn
//! into a human-readable string.

use serde::{Deserialize, Serialize};

/// An opaque source location, interpreted only by the host's resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc(pub u32);

/// A half-open range of source locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourceLoc,
    pub end: SourceLoc,
}

/// Renders opaque source ranges as short human-readable strings,
/// conventionally `file:line:col-file:line:col`.
pub trait LocationResolver {
    /// Returns `None` when the range cannot be resolved; the trace row's
    /// range field is then left empty.
    fn render_range(&self, range: SourceRange) -> Option<String>;
}

/// A declaration-like entity: named, with a source range.
pub trait TracedDecl {
    /// Short name for trace attribution; `None` for anonymous declarations.
    fn short_name(&self) -> Option<String>;
    fn source_range(&self) -> Option<SourceRange>;
}

/// An expression-like entity. Expressions are unnamed, so this capability
/// only covers the source range.
pub trait TracedExpr {
    fn source_range(&self) -> Option<SourceRange>;
}

/// A compiled-function-like entity: named (e.g. by mangled symbol), with
/// the range of its originating definition.
pub trait TracedFunction {
    fn short_name(&self) -> Option<String>;
    fn source_range(&self) -> Option<SourceRange>;
}

/// The closed set of entity kinds a tracer span can be attributed to.
///
/// Holds borrows only; the trace log never owns entity lifetime. The
/// borrow lives as long as the reporter, so the events buffered for the
/// trace artifact can still render names at finalization.
#[derive(Clone, Copy, Default)]
pub enum TraceEntity<'a> {
    #[default]
    None,
    Decl(&'a dyn TracedDecl),
    Expr(&'a dyn TracedExpr),
    Function(&'a dyn TracedFunction),
}

impl<'a> TraceEntity<'a> {
    /// The entity's short name, if it has one. Expressions and anonymous
    /// declarations yield `None`.
    pub fn short_name(&self) -> Option<String> {
        match self {
            TraceEntity::None => None,
            TraceEntity::Decl(d) => d.short_name(),
            TraceEntity::Expr(_) => None,
            TraceEntity::Function(f) => f.short_name(),
        }
    }

    pub fn source_range(&self) -> Option<SourceRange> {
        match self {
            TraceEntity::None => None,
            TraceEntity::Decl(d) => d.source_range(),
            TraceEntity::Expr(e) => e.source_range(),
            TraceEntity::Function(f) => f.source_range(),
        }
    }
}

impl std::fmt::Debug for TraceEntity<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            TraceEntity::None => "None",
            TraceEntity::Decl(_) => "Decl",
            TraceEntity::Expr(_) => "Expr",
            TraceEntity::Function(_) => "Function",
        };
        f.debug_struct("TraceEntity")
            .field("kind", &kind)
            .field("name", &self.short_name())
            .finish()
    }
}
