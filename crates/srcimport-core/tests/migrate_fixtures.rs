//! End-to-end rewrites over the shared fixtures.

use std::collections::HashSet;

use pretty_assertions::assert_eq;

use srcimport_core::{ChangeLogEntry, DirectiveTree, MigrateOptions, migrate};
use srcimport_test_utils::fixtures;

#[test]
fn test_ladder_combination_count() {
    let combos = DirectiveTree::parse(fixtures::DIRECTIVE_LADDER)
        .unwrap()
        .symbol_combinations()
        .unwrap();
    assert_eq!(combos.len(), fixtures::DIRECTIVE_LADDER_COMBINATION_COUNT);

    assert!(combos[0].is_empty());
    let sets: HashSet<Vec<String>> = combos
        .iter()
        .map(|c| {
            let mut s = c.clone();
            s.sort();
            s
        })
        .collect();
    assert_eq!(sets.len(), combos.len(), "combinations must be set-distinct");
}

#[test]
fn test_conditional_declarations_every_branch_rewritten() {
    let options = MigrateOptions {
        namespace: Some("Imported.".to_string()),
        make_types_internal: true,
    };
    let outcome = migrate(fixtures::CONDITIONAL_DECLARATIONS, &options).unwrap();
    let text = &outcome.text;

    // Top-level namespaces picked up the prefix in every branch…
    assert!(text.contains("namespace Imported.Vendor.Tool.Core"));
    assert!(text.contains("namespace Imported.HELLO"));
    assert!(text.contains("namespace Imported.DeepNestNamespace"));
    // …while inner namespaces kept their names.
    assert!(text.contains("namespace InnerUntouched"));
    assert!(text.contains("namespace InnerDeep"));
    assert!(!text.contains("Imported.InnerUntouched"));
    assert!(!text.contains("Imported.InnerDeep"));

    // Every top-level type went internal, whichever branch it lives in.
    for decl in [
        "internal class Importable",
        "internal abstract partial class AbstractPartial",
        "internal static class StaticHolder",
        "internal sealed class SealedThing",
        "internal struct PlainStruct",
        "internal readonly partial struct ReadOnlyPartial",
        "internal class World",
        "internal class GuardedDeep",
        "internal interface ISomething",
        "internal enum TheEnum",
        "internal partial record PartialRecord",
        "internal record struct PlainRecordStruct",
        "internal readonly record struct ReadOnlyRecordStruct",
    ] {
        assert!(text.contains(decl), "missing {decl:?}");
    }

    // Nested types are never altered.
    assert!(text.contains("public class InnerWorld"));
    assert!(text.contains("public sealed class GuardedInner"));

    // Directive lines survive byte-for-byte.
    assert!(text.contains("#if DEBUG == true && NET == true"));
    assert!(text.contains("#elif FOO == BAR || BAZ == QUX"));
    assert!(text.contains("#if DEEP_NEST == !true"));
    assert!(text.contains("#if !NET == false"));
}

#[test]
fn test_conditional_declarations_change_counts() {
    let options = MigrateOptions {
        namespace: Some("Imported.".to_string()),
        make_types_internal: true,
    };
    let outcome = migrate(fixtures::CONDITIONAL_DECLARATIONS, &options).unwrap();

    let namespace_renames = outcome
        .changes
        .iter()
        .filter(|c| matches!(c, ChangeLogEntry::NamespaceRenamed { .. }))
        .count();
    let visibility_changes = outcome
        .changes
        .iter()
        .filter(|c| matches!(c, ChangeLogEntry::VisibilityChanged { .. }))
        .count();

    // Two `Vendor.Tool.Core` blocks, `HELLO`, and `DeepNestNamespace`.
    assert_eq!(namespace_renames, 4);
    // Thirteen top-level types across all branches, each changed once.
    assert_eq!(visibility_changes, 13);
}

#[test]
fn test_conditional_declarations_rewrite_is_idempotent() {
    let options = MigrateOptions {
        namespace: Some("Imported.".to_string()),
        make_types_internal: true,
    };
    let first = migrate(fixtures::CONDITIONAL_DECLARATIONS, &options).unwrap();
    let second = migrate(&first.text, &options).unwrap();

    assert_eq!(second.text, first.text);
    assert!(second.changes.is_empty());
}

#[test]
fn test_nested_types_fixture_round_trip() {
    let options = MigrateOptions {
        namespace: Some("Replaced".to_string()),
        make_types_internal: true,
    };
    let outcome = migrate(fixtures::NESTED_TYPES, &options).unwrap();
    assert!(outcome.text.starts_with("namespace Replaced;"));
    assert!(outcome.text.contains("internal class Root"));
    assert!(outcome.text.contains("public class Nested"));
    assert!(outcome.text.contains("public class DeepNest"));
}
