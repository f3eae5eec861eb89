//! Conditional-directive tree and symbol-combination synthesis.
//!
//! A C# parser only materialises the syntax inside an `#if` region when the
//! region's symbols are defined, so a rewriter that parses once would never
//! see declarations guarded by non-default branches. This module builds a
//! tree mirroring the lexical nesting of `#if`/`#elif`/`#endif` directives
//! and derives the minimal list of symbol combinations that must each be
//! enabled in turn so that every conditional region is visited at least
//! once.
//!
//! The tree is an arena: nodes live in a `Vec`, parent links are indices,
//! and combination synthesis is a method on the whole tree — there is no
//! way to ask a non-root node for combinations.

use std::collections::HashSet;

use tracing::trace;

use crate::syntax::condition::{Condition, ConditionError};
use crate::syntax::{DirectiveKind, ScanError, scan};

/// Most symbols allowed on one leaf-to-root path. Subsets are enumerated
/// through a 32-bit mask, and the sign bit is unusable; past this point the
/// combination space is impractical anyway.
pub const MAX_PATH_SYMBOLS: usize = 31;

/// Errors from directive-tree construction and combination synthesis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("#if/#elif and #endif pairs are unbalanced (line {line})")]
    Unbalanced { line: usize },

    #[error("directive condition on line {line} can never be true: {condition:?}")]
    NeverTrue { condition: String, line: usize },

    #[error(
        "{count} distinct preprocessor symbols on one directive path; \
         the limit is {MAX_PATH_SYMBOLS}"
    )]
    CapacityExceeded { count: usize },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Condition(#[from] ConditionError),
}

/// Index of a node within the arena.
pub type NodeId = usize;

/// The synthetic root's id. It exists even for directive-free sources.
pub const ROOT: NodeId = 0;

#[derive(Debug)]
struct Node {
    /// Distinct identifiers referenced by this directive's condition,
    /// sorted. Empty for the root and for identifier-free conditions like
    /// `#if true`.
    symbols: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree of conditional directives for one source text.
#[derive(Debug)]
pub struct DirectiveTree {
    nodes: Vec<Node>,
}

impl DirectiveTree {
    /// Build the tree from source text.
    ///
    /// Every conditional directive contributes, including directives inside
    /// regions that are unreachable under "no symbols defined" — those
    /// regions are exactly the ones later rewrite passes need to reach.
    pub fn parse(source: &str) -> Result<Self, DirectiveError> {
        let scanned = scan(source)?;

        let mut tree = DirectiveTree {
            nodes: vec![Node {
                symbols: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut stack: Vec<NodeId> = Vec::new();

        for directive in scanned.directives() {
            match directive.kind {
                DirectiveKind::If | DirectiveKind::Elif => {
                    // An #elif closes the preceding branch before opening
                    // its own as a sibling under the same parent.
                    if directive.kind == DirectiveKind::Elif {
                        pop(&mut stack, directive.line)?;
                    }

                    let condition = Condition::parse(&directive.condition)?;

                    // A condition that is false with nothing defined and
                    // references no symbols is false under every assignment.
                    if condition.identifiers().is_empty() && !condition.eval(&HashSet::new()) {
                        return Err(DirectiveError::NeverTrue {
                            condition: directive.condition.clone(),
                            line: directive.line,
                        });
                    }

                    let mut symbols = condition.identifiers().to_vec();
                    symbols.sort();
                    symbols.dedup();

                    let parent = stack.last().copied().unwrap_or(ROOT);
                    let id = tree.nodes.len();
                    tree.nodes.push(Node {
                        symbols,
                        parent: Some(parent),
                        children: Vec::new(),
                    });
                    tree.nodes[parent].children.push(id);
                    stack.push(id);

                    trace!(
                        kind = ?directive.kind,
                        condition = %directive.condition,
                        parent,
                        "directive node"
                    );
                }
                DirectiveKind::Endif => {
                    pop(&mut stack, directive.line)?;
                }
                // #else has no tree effect: only the conditions matter for
                // combinations, and an else branch introduces none.
                DirectiveKind::Else | DirectiveKind::Other => {}
            }
        }

        if let Some(&open) = stack.last() {
            // Report the unclosed branch; its line is long gone, so point at
            // the end of input instead.
            trace!(open, "unclosed directive at end of input");
            return Err(DirectiveError::Unbalanced {
                line: source.lines().count().max(1),
            });
        }

        Ok(tree)
    }

    /// Number of nodes, the synthetic root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn symbols(&self, id: NodeId) -> &[String] {
        &self.nodes[id].symbols
    }

    /// Derive every symbol combination the rewriter must try.
    ///
    /// The first element is always the empty combination. Each leaf
    /// contributes every non-empty subset of the union of symbols along its
    /// path to the root; set-equal duplicates are dropped.
    pub fn symbol_combinations(&self) -> Result<Vec<Vec<String>>, DirectiveError> {
        let mut result: Vec<Vec<String>> = vec![Vec::new()];
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        seen.insert(Vec::new());

        for (id, node) in self.nodes.iter().enumerate() {
            if !node.children.is_empty() {
                continue;
            }

            // Union of symbols from this leaf up to the root; the occurrence
            // nearest the leaf keeps its position, later duplicates drop.
            let mut path: Vec<&String> = Vec::new();
            let mut cursor = Some(id);
            while let Some(at) = cursor {
                for symbol in &self.nodes[at].symbols {
                    if !path.iter().any(|s| *s == symbol) {
                        path.push(symbol);
                    }
                }
                cursor = self.nodes[at].parent;
            }

            if path.is_empty() {
                continue;
            }
            if path.len() > MAX_PATH_SYMBOLS {
                return Err(DirectiveError::CapacityExceeded { count: path.len() });
            }

            // Subsets as bitmasks, one bit per path position.
            for mask in 1u32..(1u32 << path.len()) {
                let combination: Vec<String> = path
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| (mask >> bit) & 1 == 1)
                    .map(|(_, s)| (*s).clone())
                    .collect();

                let mut key = combination.clone();
                key.sort();
                if seen.insert(key) {
                    result.push(combination);
                }
            }
        }

        trace!(count = result.len(), "symbol combinations");
        Ok(result)
    }
}

fn pop(stack: &mut Vec<NodeId>, line: usize) -> Result<(), DirectiveError> {
    stack
        .pop()
        .map(|_| ())
        .ok_or(DirectiveError::Unbalanced { line })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn combinations(source: &str) -> Vec<Vec<String>> {
        DirectiveTree::parse(source)
            .unwrap()
            .symbol_combinations()
            .unwrap()
    }

    fn sorted_sets(combos: &[Vec<String>]) -> Vec<Vec<String>> {
        let mut sets: Vec<Vec<String>> = combos
            .iter()
            .map(|c| {
                let mut s = c.clone();
                s.sort();
                s
            })
            .collect();
        sets.sort();
        sets
    }

    fn set(symbols: &[&str]) -> Vec<String> {
        let mut s: Vec<String> = symbols.iter().map(|x| x.to_string()).collect();
        s.sort();
        s
    }

    #[test]
    fn test_no_directives_yields_only_empty() {
        let combos = combinations("class C { }\n");
        assert_eq!(combos, vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_empty_combination_is_first_and_unique() {
        let combos = combinations("#if A\n#endif\n#if B\n#endif\n");
        assert!(combos[0].is_empty());
        assert_eq!(combos.iter().filter(|c| c.is_empty()).count(), 1);
    }

    #[test]
    fn test_no_two_combinations_set_equal() {
        let combos = combinations("#if A && B\n#if B && C\n#endif\n#endif\n");
        let sets = sorted_sets(&combos);
        let mut deduped = sets.clone();
        deduped.dedup();
        assert_eq!(sets, deduped);
    }

    #[test]
    fn test_if_elif_chain() {
        let combos = combinations("#if ONE\n#elif TWO\n#endif\n");
        assert_eq!(combos.len(), 3);
        assert_eq!(
            sorted_sets(&combos),
            vec![set(&[]), set(&["ONE"]), set(&["TWO"])]
        );
    }

    #[test]
    fn test_nested_pair() {
        let combos = combinations("#if A\n#if B\n#endif\n#endif\n");
        assert_eq!(combos.len(), 4);
        assert_eq!(
            sorted_sets(&combos),
            vec![set(&[]), set(&["A"]), set(&["A", "B"]), set(&["B"])]
        );
    }

    #[test]
    fn test_same_symbol_at_two_levels_collapses() {
        let combos = combinations("#if A\n#if A\n#endif\n#endif\n");
        assert_eq!(sorted_sets(&combos), vec![set(&[]), set(&["A"])]);
    }

    #[test]
    fn test_duplicate_in_one_condition_collapses() {
        let combos = combinations("#if TEN == TEN\n#endif\n");
        assert_eq!(sorted_sets(&combos), vec![set(&[]), set(&["TEN"])]);
    }

    #[test]
    fn test_if_true_contributes_nothing() {
        let tree = DirectiveTree::parse("#if true\n#endif\n").unwrap();
        assert_eq!(tree.node_count(), 2);
        assert!(tree.symbols(tree.children(ROOT)[0]).is_empty());
        assert_eq!(tree.symbol_combinations().unwrap().len(), 1);
    }

    #[test]
    fn test_if_false_is_never_true() {
        assert!(matches!(
            DirectiveTree::parse("#if false\n#endif\n").unwrap_err(),
            DirectiveError::NeverTrue { .. }
        ));
    }

    #[test]
    fn test_if_false_equals_true_is_never_true() {
        assert!(matches!(
            DirectiveTree::parse("#if false == true\n#endif\n").unwrap_err(),
            DirectiveError::NeverTrue { .. }
        ));
    }

    #[test]
    fn test_false_with_identifier_is_fine() {
        // `false || X` is satisfiable, so it must not be rejected.
        let combos = combinations("#if false || X\n#endif\n");
        assert_eq!(sorted_sets(&combos), vec![set(&[]), set(&["X"])]);
    }

    #[test]
    fn test_lone_endif_is_unbalanced() {
        assert!(matches!(
            DirectiveTree::parse("#endif\n").unwrap_err(),
            DirectiveError::Unbalanced { line: 1 }
        ));
    }

    #[test]
    fn test_lone_elif_is_unbalanced() {
        assert!(matches!(
            DirectiveTree::parse("#elif A\n").unwrap_err(),
            DirectiveError::Unbalanced { line: 1 }
        ));
    }

    #[test]
    fn test_unclosed_if_is_unbalanced() {
        assert!(matches!(
            DirectiveTree::parse("#if A\nclass C { }\n").unwrap_err(),
            DirectiveError::Unbalanced { .. }
        ));
    }

    #[test]
    fn test_else_branch_has_no_tree_effect() {
        let combos = combinations("#if A\n#else\n#endif\n");
        assert_eq!(sorted_sets(&combos), vec![set(&[]), set(&["A"])]);
    }

    #[test]
    fn test_directives_in_disabled_regions_still_count() {
        // Under no symbols the whole outer region is inactive, but the
        // nested directive still needs its own combinations.
        let combos = combinations("#if A\n#if B\n#endif\n#endif\n");
        assert!(sorted_sets(&combos).contains(&set(&["B"])));
    }

    #[test]
    fn test_deep_tree_count_matches_subset_arithmetic() {
        // Mirrors the canonical ladder: two five-symbol paths sharing a
        // four-symbol prefix, a three-symbol elif arm, a reused single
        // symbol, and an identifier-free `#if true`.
        let source = concat!(
            "#if ONE && TWO\n",
            "  #if THREE && FOUR\n",
            "    #if FIVE\n",
            "    #elif SIX\n",
            "    #endif\n",
            "  #endif\n",
            "#elif SEVEN && EIGHT\n",
            "  #if NINE\n",
            "  #endif\n",
            "#endif\n",
            "\n",
            "#if TEN\n",
            "#endif\n",
            "\n",
            "#if TEN\n",
            "#if TEN == TEN\n",
            "#elif TEN == TEN\n",
            "#elif TEN == TEN\n",
            "#endif\n",
            "#elif TEN\n",
            "#endif\n",
            "\n",
            "#if true\n",
            "#endif\n",
        );
        let expected = 1            // empty
            + (1 << 5) - 1          // {FIVE,THREE,FOUR,ONE,TWO} subsets
            + (1 << 5) - 1          // {SIX,THREE,FOUR,ONE,TWO} subsets…
            - ((1 << 4) - 1)        // …minus those shared with the first path
            + (1 << 3) - 1          // {NINE,SEVEN,EIGHT} subsets
            + 1                     // {TEN}, all duplicates collapsed
            + 0; // #if true
        assert_eq!(combinations(source).len(), expected);
    }

    #[test]
    fn test_capacity_limit() {
        let mut source = String::new();
        for i in 0..32 {
            source.push_str(&format!("#if SYM{i:02}\n"));
        }
        for _ in 0..32 {
            source.push_str("#endif\n");
        }
        let tree = DirectiveTree::parse(&source).unwrap();
        assert_eq!(
            tree.symbol_combinations().unwrap_err(),
            DirectiveError::CapacityExceeded { count: 32 }
        );
    }

    #[test]
    fn test_subset_count_for_single_leaf() {
        let mut source = String::from("#if ");
        let names: Vec<String> = (0..10).map(|i| format!("S{i}")).collect();
        source.push_str(&names.join(" && "));
        source.push_str("\n#endif\n");
        // One leaf with n symbols yields 2^n - 1 subsets plus the empty set.
        assert_eq!(combinations(&source).len(), (1 << 10) - 1 + 1);
    }
}
