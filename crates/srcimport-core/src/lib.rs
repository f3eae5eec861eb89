#![deny(unsafe_code)]

//! srcimport core — fetch a file, rewrite it if it is C# source, write it out.
//!
//! The interesting part is the conditional-compilation combination engine:
//! a C# file full of `#if`/`#elif`/`#endif` directives hides part of its
//! declarations from any single parse, so the rewriter derives every symbol
//! combination that must be enabled for each conditional region to become
//! visible, and runs one rewrite pass per combination. Everything else
//! (providers, pipeline) is plumbing around that engine.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future — the standard return type for async
/// trait methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits produces opaque return types that are **not**
/// object-safe. Traits consumed via `Box<dyn Trait>` or `&dyn Trait` must
/// return a concrete `Pin<Box<dyn Future>>` instead. This alias keeps those
/// signatures readable.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// GitHub token lookup from the environment, with zeroize-on-drop storage.
pub mod auth;
/// Conditional-directive tree and symbol-combination synthesis.
pub mod directive;
/// Combination-driven source rewriter (namespace rename, visibility demotion).
pub mod migrate;
/// The import pipeline: resolve, up-to-date check, fetch, rewrite, write.
pub mod pipeline;
/// File providers (local disk, HTTPS, GitHub) and the scheme registry.
pub mod provider;
/// Lexical scanning of C# source: directives, regions, declarations, edits.
pub mod syntax;

pub use auth::GitHubAuth;
pub use directive::{DirectiveError, DirectiveTree};
pub use migrate::{ChangeLogEntry, MigrateError, MigrateOptions, MigrateOutcome, migrate};
pub use pipeline::{FileOutcome, ImportOptions, ImportSummary, PipelineError, run_import};
pub use provider::{FileProvider, ProviderError, ProviderRegistry, SourceRef};
