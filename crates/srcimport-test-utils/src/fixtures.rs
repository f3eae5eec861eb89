//! Shared C# source fixtures.
//!
//! The interesting ones exercise conditional compilation: declarations that
//! only materialise when particular preprocessor symbols are defined, so a
//! single-parse rewriter would silently miss them.

/// A single block-scoped namespace with one public type.
pub const NAMESPACE_SIMPLE: &str = "namespace Bar\n{\n    public class Widget { }\n}\n";

/// A file-scoped namespace with one of each top-level type kind, plus
/// nested types whose visibility must never change.
pub const NESTED_TYPES: &str = r#"namespace File.Scoped;

public class Root
{
    public class Nested
    {
        public class DeepNest { }
    }
}
public record RootRecord { }
public struct RootStruct { }
public interface IRoot { }
public enum ERoot { }
"#;

/// The canonical directive ladder: two five-symbol paths sharing a
/// four-symbol prefix, a three-symbol elif arm, one symbol reused across
/// chains and levels, and an identifier-free `#if true`.
pub const DIRECTIVE_LADDER: &str = r#"#if ONE && TWO
    #if THREE && FOUR
      #if FIVE
      #elif SIX
      #endif
    #endif
#elif SEVEN && EIGHT
    #if NINE
    #endif
#endif

#if TEN
#endif

// duplicates must be ignored
#if TEN
#if TEN == TEN
#elif TEN == TEN
#elif TEN == TEN
#endif
#elif TEN
#endif

// must be parsed as empty node
#if true
#endif
"#;

/// Expected combination count for [`DIRECTIVE_LADDER`]:
/// `1 + (2^5 - 1) + ((2^5 - 1) - (2^4 - 1)) + (2^3 - 1) + 1 + 0`.
pub const DIRECTIVE_LADDER_COMBINATION_COUNT: usize = 56;

/// Namespaces and types spread over nested conditional branches, several of
/// which are reachable only with specific symbols defined (or deliberately
/// left undefined — note the `== !true` guard).
pub const CONDITIONAL_DECLARATIONS: &str = r#"#if DEBUG == true && NET == true

namespace Vendor.Tool.Core
{
    namespace InnerUntouched
    {
        public class Importable { }
        public abstract partial class AbstractPartial { }
        public static class StaticHolder { }
        public sealed class SealedThing { }
        public struct PlainStruct { }
        public readonly partial struct ReadOnlyPartial { }
    }
}

#if true == NESTED_DIRECTIVE

namespace HELLO
{
    public class World
    {
        public class InnerWorld { }
    }
}

#elif FOO == BAR || BAZ == QUX
#if DEEP_NEST == !true

namespace DeepNestNamespace
{
    namespace InnerDeep
    {
        public class GuardedDeep
        {
            public sealed class GuardedInner { }
        }
    }
}

#endif
#endif

#endif

#if !NET == false

namespace Vendor.Tool.Core
{
    namespace OtherInner
    {
        public interface ISomething { }

        public enum TheEnum
        {
            Default,
            Value,
        }

        public partial record PartialRecord { }
        public record struct PlainRecordStruct { }
        public readonly record struct ReadOnlyRecordStruct { }
    }
}

#endif
"#;
