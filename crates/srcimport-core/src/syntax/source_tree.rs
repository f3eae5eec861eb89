//! Region-aware structural view of one C# source text.
//!
//! [`SourceTree::parse`] takes the set of defined preprocessor symbols,
//! replays the conditional-inclusion stack over the scanned item stream, and
//! collects namespace and type declarations from the regions that are active
//! under that hypothesis. Inactive regions contribute nothing — exactly the
//! behaviour that forces the rewriter upstream to try every symbol
//! combination.
//!
//! The tree hands out byte spans; [`SourceTree::apply`] splices replacement
//! text into those spans and leaves every other byte of the input untouched.

use std::collections::HashSet;
use std::ops::Range;

use super::condition::{Condition, ConditionError};
use super::scanner::{DirectiveKind, Item, Scan, ScanError, scan};

/// Errors from parsing a source text into a [`SourceTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Condition(#[from] ConditionError),
}

/// A namespace declaration found in an active region.
#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    /// Dotted name with any inter-token whitespace normalised away.
    pub name: String,
    /// Byte span of the name in the source text.
    pub name_span: Range<usize>,
    /// Number of enclosing namespace declarations.
    pub nesting: usize,
    /// Whether this is a file-scoped declaration (`namespace X;`).
    pub file_scoped: bool,
}

/// Kinds of type declaration the rewriter distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    RecordStruct,
}

/// A type declaration found in an active region.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// Number of enclosing type declarations (namespaces don't count).
    pub nesting: usize,
    /// Byte span of the `public` modifier token, when present.
    pub public_span: Option<Range<usize>>,
}

/// A single text replacement, produced by a rewrite pass.
#[derive(Debug, Clone)]
pub struct Edit {
    pub span: Range<usize>,
    pub replacement: String,
}

/// Structural view of one source text under one symbol hypothesis.
pub struct SourceTree<'a> {
    source: &'a str,
    namespaces: Vec<NamespaceDecl>,
    types: Vec<TypeDecl>,
}

impl<'a> SourceTree<'a> {
    /// Parse `source` treating exactly `defined` as the set of defined
    /// preprocessor symbols.
    pub fn parse(source: &'a str, defined: &HashSet<String>) -> Result<Self, SyntaxError> {
        let scanned = scan(source)?;
        let tokens = active_tokens(&scanned, defined)?;
        let (namespaces, types) = collect_declarations(&tokens);
        Ok(Self {
            source,
            namespaces,
            types,
        })
    }

    pub fn namespaces(&self) -> &[NamespaceDecl] {
        &self.namespaces
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    /// Splice `edits` into the source. Spans must not overlap; they come
    /// from one parse of this same text, so they cannot.
    pub fn apply(&self, mut edits: Vec<Edit>) -> String {
        edits.sort_by_key(|e| e.span.start);
        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for edit in edits {
            debug_assert!(edit.span.start >= cursor, "overlapping edits");
            out.push_str(&self.source[cursor..edit.span.start]);
            out.push_str(&edit.replacement);
            cursor = edit.span.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// A code token surviving region filtering.
#[derive(Debug, Clone, Copy)]
enum CodeTok<'a> {
    Ident {
        text: &'a str,
        start: usize,
        end: usize,
    },
    Punct {
        ch: char,
    },
}

/// One open `#if`/`#elif`/`#else` chain entry.
struct Branch {
    parent_active: bool,
    /// Whether any branch of this chain has evaluated true yet.
    taken: bool,
    /// Whether the current branch is included.
    active: bool,
}

/// Replay the conditional-inclusion stack and keep only tokens from active
/// regions. Unbalanced directives are tolerated here — the directive tree
/// builder is the component that rejects them, and it runs first.
fn active_tokens<'a>(
    scanned: &Scan<'a>,
    defined: &HashSet<String>,
) -> Result<Vec<CodeTok<'a>>, SyntaxError> {
    let mut stack: Vec<Branch> = Vec::new();
    let mut tokens = Vec::new();

    for item in scanned.items() {
        match item {
            Item::Directive(directive) => match directive.kind {
                DirectiveKind::If => {
                    let parent_active = stack.last().is_none_or(|b| b.active);
                    let cond = Condition::parse(&directive.condition)?.eval(defined);
                    stack.push(Branch {
                        parent_active,
                        taken: cond,
                        active: parent_active && cond,
                    });
                }
                DirectiveKind::Elif => {
                    let cond = Condition::parse(&directive.condition)?.eval(defined);
                    if let Some(branch) = stack.last_mut() {
                        branch.active = branch.parent_active && !branch.taken && cond;
                        branch.taken |= cond;
                    }
                }
                DirectiveKind::Else => {
                    if let Some(branch) = stack.last_mut() {
                        branch.active = branch.parent_active && !branch.taken;
                        branch.taken = true;
                    }
                }
                DirectiveKind::Endif => {
                    stack.pop();
                }
                DirectiveKind::Other => {}
            },
            _ if !stack.last().is_none_or(|b| b.active) => {}
            Item::Ident { start, end } => tokens.push(CodeTok::Ident {
                text: scanned.text(*start..*end),
                start: *start,
                end: *end,
            }),
            Item::Punct { ch } => tokens.push(CodeTok::Punct { ch: *ch }),
        }
    }
    Ok(tokens)
}

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "sealed", "abstract", "partial",
    "readonly", "ref", "unsafe", "new", "file", "extern",
];

enum ScopeKind {
    Namespace,
    Type,
    Other,
}

enum PendingBody {
    Namespace {
        name: String,
        name_span: Range<usize>,
        nesting: usize,
    },
    Type,
}

fn collect_declarations<'a>(tokens: &[CodeTok<'a>]) -> (Vec<NamespaceDecl>, Vec<TypeDecl>) {
    let mut namespaces = Vec::new();
    let mut types = Vec::new();

    let mut scopes: Vec<ScopeKind> = Vec::new();
    let mut pending: Option<PendingBody> = None;
    let mut pending_parens = 0usize;
    let mut file_scoped_count = 0usize;

    let ns_nesting = |scopes: &[ScopeKind], file_scoped: usize| {
        scopes
            .iter()
            .filter(|s| matches!(s, ScopeKind::Namespace))
            .count()
            + file_scoped
    };
    let type_nesting = |scopes: &[ScopeKind]| {
        scopes
            .iter()
            .filter(|s| matches!(s, ScopeKind::Type))
            .count()
    };

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            CodeTok::Ident { text: "namespace", .. } if pending.is_none() => {
                // Qualified name: Ident ('.' Ident)*
                let mut parts: Vec<&str> = Vec::new();
                let mut span: Option<Range<usize>> = None;
                let mut j = i + 1;
                while let Some(CodeTok::Ident { text, start, end }) = tokens.get(j).copied() {
                    parts.push(text);
                    span = Some(match span {
                        None => start..end,
                        Some(s) => s.start..end,
                    });
                    if matches!(tokens.get(j + 1), Some(CodeTok::Punct { ch: '.' }))
                        && matches!(tokens.get(j + 2), Some(CodeTok::Ident { .. }))
                    {
                        j += 2;
                    } else {
                        j += 1;
                        break;
                    }
                }
                if let Some(name_span) = span {
                    pending = Some(PendingBody::Namespace {
                        name: parts.join("."),
                        name_span,
                        nesting: ns_nesting(&scopes, file_scoped_count),
                    });
                    pending_parens = 0;
                }
                i = j;
                continue;
            }

            CodeTok::Ident { text, .. }
                if pending.is_none()
                    && matches!(text, "class" | "struct" | "interface" | "enum" | "record")
                    && !follows_colon(tokens, i) =>
            {
                let (kind, name_index) = match text {
                    "record" => match tokens.get(i + 1) {
                        Some(CodeTok::Ident { text: "struct", .. }) => {
                            (TypeKind::RecordStruct, i + 2)
                        }
                        Some(CodeTok::Ident { text: "class", .. }) => (TypeKind::Record, i + 2),
                        Some(CodeTok::Ident { .. }) => (TypeKind::Record, i + 1),
                        _ => {
                            i += 1;
                            continue;
                        }
                    },
                    "class" => (TypeKind::Class, i + 1),
                    "struct" => (TypeKind::Struct, i + 1),
                    "interface" => (TypeKind::Interface, i + 1),
                    _ => (TypeKind::Enum, i + 1),
                };

                let Some(CodeTok::Ident { text: name, .. }) = tokens.get(name_index).copied()
                else {
                    // `where T : struct`-style constraint or malformed input.
                    i += 1;
                    continue;
                };

                types.push(TypeDecl {
                    name: name.to_string(),
                    kind,
                    nesting: type_nesting(&scopes),
                    public_span: find_public_modifier(tokens, i),
                });
                pending = Some(PendingBody::Type);
                pending_parens = 0;
                i = name_index + 1;
                continue;
            }

            CodeTok::Punct { ch: '(' } if pending.is_some() => pending_parens += 1,
            CodeTok::Punct { ch: ')' } if pending.is_some() => {
                pending_parens = pending_parens.saturating_sub(1);
            }

            CodeTok::Punct { ch: '{' } => {
                let kind = match pending.take_if(|_| pending_parens == 0) {
                    Some(PendingBody::Namespace {
                        name,
                        name_span,
                        nesting,
                    }) => {
                        namespaces.push(NamespaceDecl {
                            name,
                            name_span,
                            nesting,
                            file_scoped: false,
                        });
                        ScopeKind::Namespace
                    }
                    Some(PendingBody::Type) => ScopeKind::Type,
                    None => ScopeKind::Other,
                };
                scopes.push(kind);
            }

            CodeTok::Punct { ch: '}' } => {
                scopes.pop();
            }

            CodeTok::Punct { ch: ';' } if pending_parens == 0 => {
                match pending.take() {
                    Some(PendingBody::Namespace {
                        name,
                        name_span,
                        nesting,
                    }) => {
                        namespaces.push(NamespaceDecl {
                            name,
                            name_span,
                            nesting,
                            file_scoped: true,
                        });
                        file_scoped_count += 1;
                    }
                    // Body-less `record X;` — already recorded.
                    Some(PendingBody::Type) | None => {}
                }
            }

            _ => {}
        }
        i += 1;
    }

    (namespaces, types)
}

/// `class`/`struct` directly after `:` is a generic constraint, not a
/// declaration.
fn follows_colon(tokens: &[CodeTok<'_>], i: usize) -> bool {
    i > 0 && matches!(tokens[i - 1], CodeTok::Punct { ch: ':' })
}

/// Walk backwards over the contiguous modifier run preceding the declaration
/// keyword and return the span of `public`, if present.
fn find_public_modifier(tokens: &[CodeTok<'_>], keyword_index: usize) -> Option<Range<usize>> {
    let mut public_span = None;
    let mut j = keyword_index;
    while j > 0 {
        match tokens[j - 1] {
            CodeTok::Ident { text, start, end } if MODIFIERS.contains(&text) => {
                if text == "public" {
                    public_span = Some(start..end);
                }
                j -= 1;
            }
            _ => break,
        }
    }
    public_span
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse<'a>(source: &'a str, symbols: &[&str]) -> SourceTree<'a> {
        let defined: HashSet<String> = symbols.iter().map(|s| s.to_string()).collect();
        SourceTree::parse(source, &defined).unwrap()
    }

    #[test]
    fn test_block_namespace() {
        let tree = parse("namespace Foo.Bar\n{\n}\n", &[]);
        assert_eq!(tree.namespaces().len(), 1);
        let ns = &tree.namespaces()[0];
        assert_eq!(ns.name, "Foo.Bar");
        assert_eq!(ns.nesting, 0);
        assert!(!ns.file_scoped);
    }

    #[test]
    fn test_file_scoped_namespace() {
        let tree = parse("namespace File.Scoped;\n\npublic class C { }\n", &[]);
        let ns = &tree.namespaces()[0];
        assert_eq!(ns.name, "File.Scoped");
        assert!(ns.file_scoped);
        // Types after a file-scoped namespace still have type-nesting zero.
        assert_eq!(tree.types()[0].nesting, 0);
    }

    #[test]
    fn test_nested_namespace_nesting_levels() {
        let source = "namespace A { namespace B { namespace C { } } }";
        let tree = parse(source, &[]);
        let nestings: Vec<usize> = tree.namespaces().iter().map(|n| n.nesting).collect();
        assert_eq!(nestings, vec![0, 1, 2]);
    }

    #[test]
    fn test_type_kinds_and_nesting() {
        let source = r#"
namespace N
{
    public class Outer
    {
        public class Inner { }
        public enum InnerEnum { A, B }
    }
    public struct S { }
    public interface I { }
    public enum E { }
    public record R { }
    public record struct RS { }
    public sealed partial class SP { }
}
"#;
        let tree = parse(source, &[]);
        let top: Vec<(&str, TypeKind)> = tree
            .types()
            .iter()
            .filter(|t| t.nesting == 0)
            .map(|t| (t.name.as_str(), t.kind))
            .collect();
        assert_eq!(
            top,
            vec![
                ("Outer", TypeKind::Class),
                ("S", TypeKind::Struct),
                ("I", TypeKind::Interface),
                ("E", TypeKind::Enum),
                ("R", TypeKind::Record),
                ("RS", TypeKind::RecordStruct),
                ("SP", TypeKind::Class),
            ]
        );
        let nested: Vec<&str> = tree
            .types()
            .iter()
            .filter(|t| t.nesting > 0)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(nested, vec!["Inner", "InnerEnum"]);
    }

    #[test]
    fn test_public_modifier_span() {
        let source = "public sealed class C { }";
        let tree = parse(source, &[]);
        let span = tree.types()[0].public_span.clone().unwrap();
        assert_eq!(&source[span], "public");
    }

    #[test]
    fn test_internal_type_has_no_public_span() {
        let tree = parse("internal class C { }", &[]);
        assert!(tree.types()[0].public_span.is_none());
    }

    #[test]
    fn test_generic_constraint_is_not_a_declaration() {
        let source = "public class C<T> where T : struct { }";
        let tree = parse(source, &[]);
        let names: Vec<&str> = tree.types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["C"]);
    }

    #[test]
    fn test_record_with_primary_constructor() {
        let source = "public record Point(int X, int Y);\npublic record Other(int Z) { }\n";
        let tree = parse(source, &[]);
        let names: Vec<&str> = tree.types().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Point", "Other"]);
        assert!(tree.types().iter().all(|t| t.nesting == 0));
    }

    #[test]
    fn test_inactive_region_is_invisible() {
        let source = "#if HIDDEN\nnamespace Ghost { public class G { } }\n#endif\n";
        let tree = parse(source, &[]);
        assert!(tree.namespaces().is_empty());
        assert!(tree.types().is_empty());

        let tree = parse(source, &["HIDDEN"]);
        assert_eq!(tree.namespaces()[0].name, "Ghost");
        assert_eq!(tree.types()[0].name, "G");
    }

    #[test]
    fn test_elif_and_else_regions() {
        let source = concat!(
            "#if A\n",
            "class InA { }\n",
            "#elif B\n",
            "class InB { }\n",
            "#else\n",
            "class InElse { }\n",
            "#endif\n",
        );
        let first = |symbols: &[&str]| {
            let tree = parse(source, symbols);
            tree.types()[0].name.clone()
        };
        assert_eq!(first(&["A"]), "InA");
        assert_eq!(first(&["A", "B"]), "InA");
        assert_eq!(first(&["B"]), "InB");
        assert_eq!(first(&[]), "InElse");
    }

    #[test]
    fn test_nested_directive_activity() {
        let source = concat!(
            "#if OUTER\n",
            "#if INNER\n",
            "class Both { }\n",
            "#endif\n",
            "#endif\n",
        );
        assert!(parse(source, &["INNER"]).types().is_empty());
        assert!(parse(source, &["OUTER"]).types().is_empty());
        assert_eq!(parse(source, &["OUTER", "INNER"]).types()[0].name, "Both");
    }

    #[test]
    fn test_apply_edits_preserves_everything_else() {
        let source = "namespace Old { /* keep */ }";
        let tree = parse(source, &[]);
        let span = tree.namespaces()[0].name_span.clone();
        let rewritten = tree.apply(vec![Edit {
            span,
            replacement: "New".to_string(),
        }]);
        assert_eq!(rewritten, "namespace New { /* keep */ }");
    }

    #[test]
    fn test_apply_multiple_edits_out_of_order() {
        let source = "public class A { } public class B { }";
        let tree = parse(source, &[]);
        let mut edits: Vec<Edit> = tree
            .types()
            .iter()
            .map(|t| Edit {
                span: t.public_span.clone().unwrap(),
                replacement: "internal".to_string(),
            })
            .collect();
        edits.reverse();
        let rewritten = tree.apply(edits);
        assert_eq!(rewritten, "internal class A { } internal class B { }");
    }
}
