//! Combination-driven source rewriter.
//!
//! One parse pass only sees the declarations whose conditional regions are
//! active, so the rewriter runs one pass per symbol combination derived
//! from the directive tree, folding each pass's textual result into the
//! input of the next. Both mutations are idempotent per region (an
//! already-renamed namespace or already-internal type is left alone), so
//! regions visited by several combinations are never double-edited.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::directive::{DirectiveError, DirectiveTree};
use crate::syntax::{Edit, SourceTree, SyntaxError};

/// What to rewrite.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// New namespace. A value ending in `.` is a prefix to prepend to
    /// existing names; anything else replaces the name outright.
    pub namespace: Option<String>,

    /// Demote top-level `public` type declarations to `internal`.
    pub make_types_internal: bool,
}

/// One structural edit applied during a rewrite pass. Diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeLogEntry {
    NamespaceRenamed { from: String, to: String },
    VisibilityChanged { type_name: String },
}

impl fmt::Display for ChangeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamespaceRenamed { from, to } => write!(f, "namespace {from} -> {to}"),
            Self::VisibilityChanged { type_name } => {
                write!(f, "{type_name}: public -> internal")
            }
        }
    }
}

/// The rewritten text plus the edits that produced it.
#[derive(Debug)]
pub struct MigrateOutcome {
    pub text: String,
    pub changes: Vec<ChangeLogEntry>,
}

/// Errors from a migration. Directive problems surface before any mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrateError {
    #[error(transparent)]
    Directive(#[from] DirectiveError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// A rewrite pass, applied in declaration order below.
enum Rewrite {
    Namespace(NamespaceTarget),
    Visibility,
}

enum NamespaceTarget {
    Replace(String),
    Prefix(String),
}

impl NamespaceTarget {
    fn new(target: &str) -> Self {
        if target.ends_with('.') {
            Self::Prefix(target.to_string())
        } else {
            Self::Replace(target.to_string())
        }
    }

    /// The new name for `existing`, or `None` when it is already in the
    /// requested shape.
    fn rename(&self, existing: &str) -> Option<String> {
        match self {
            Self::Replace(target) => (existing != target).then(|| target.clone()),
            Self::Prefix(prefix) => {
                (!existing.starts_with(prefix.as_str())).then(|| format!("{prefix}{existing}"))
            }
        }
    }
}

impl Rewrite {
    fn collect_edits(
        &self,
        tree: &SourceTree<'_>,
        edits: &mut Vec<Edit>,
        changes: &mut Vec<ChangeLogEntry>,
    ) {
        match self {
            // Top-level namespaces only; inner namespace declarations keep
            // their names so relative nesting is preserved.
            Self::Namespace(target) => {
                for ns in tree.namespaces().iter().filter(|n| n.nesting == 0) {
                    if let Some(new_name) = target.rename(&ns.name) {
                        changes.push(ChangeLogEntry::NamespaceRenamed {
                            from: ns.name.clone(),
                            to: new_name.clone(),
                        });
                        edits.push(Edit {
                            span: ns.name_span.clone(),
                            replacement: new_name,
                        });
                    }
                }
            }
            // Top-level types only; nested type visibility expresses an
            // encapsulation decision this tool must not override.
            Self::Visibility => {
                for ty in tree.types().iter().filter(|t| t.nesting == 0) {
                    if let Some(span) = ty.public_span.clone() {
                        changes.push(ChangeLogEntry::VisibilityChanged {
                            type_name: ty.name.clone(),
                        });
                        edits.push(Edit {
                            span,
                            replacement: "internal".to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// Rewrite `source` according to `options`.
///
/// Builds the directive tree first (failing fast on malformed directives,
/// before any mutation), then runs one pass per symbol combination.
pub fn migrate(source: &str, options: &MigrateOptions) -> Result<MigrateOutcome, MigrateError> {
    let mut rewrites = Vec::new();
    if let Some(namespace) = options.namespace.as_deref() {
        rewrites.push(Rewrite::Namespace(NamespaceTarget::new(namespace)));
    }
    if options.make_types_internal {
        rewrites.push(Rewrite::Visibility);
    }
    if rewrites.is_empty() {
        return Ok(MigrateOutcome {
            text: source.to_string(),
            changes: Vec::new(),
        });
    }

    let combinations = DirectiveTree::parse(source)?.symbol_combinations()?;

    let mut working = source.to_string();
    let mut changes = Vec::new();
    for combination in &combinations {
        debug!(symbols = ?combination, "rewrite pass");

        let defined: HashSet<String> = combination.iter().cloned().collect();
        let rewritten = {
            let tree = SourceTree::parse(&working, &defined)?;
            let mut edits = Vec::new();
            let pass_start = changes.len();
            for rewrite in &rewrites {
                rewrite.collect_edits(&tree, &mut edits, &mut changes);
            }
            for change in &changes[pass_start..] {
                debug!(%change, "applied");
            }
            (!edits.is_empty()).then(|| tree.apply(edits))
        };
        if let Some(text) = rewritten {
            working = text;
        }
    }

    Ok(MigrateOutcome {
        text: working,
        changes,
    })
}
