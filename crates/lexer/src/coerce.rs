//! Static spelling tables for enumerated token values.
//!
//! Implement [`TokenEnum`] with the [`token_enum!`](crate::token_enum) macro:
//!
//! ```
//! use schsvg_lexer::{token_enum, TokenEnum};
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Fill { Foreground, Background, None }
//!
//! token_enum!(Fill {
//!     Fill::Foreground => ["F"],
//!     Fill::Background => ["f"],
//!     Fill::None => ["N"],
//! });
//!
//! assert_eq!(Fill::lookup().get("f"), Some(&Fill::Background));
//! ```

use std::collections::HashMap;

pub trait TokenEnum: Sized + Copy + Send + Sync + 'static {
    /// Every value with the spellings that map onto it.
    fn spellings() -> &'static [(Self, &'static [&'static str])];

    /// Spelling to value map, built once on first use.
    fn lookup() -> &'static HashMap<&'static str, Self>;

    /// The accepted spellings as a comma separated list.
    fn accepted_spellings() -> String {
        Self::spellings()
            .iter()
            .flat_map(|(_, names)| names.iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Builds the lookup map for `T`; the first spelling wins on duplicates.
pub fn build_lookup<T: TokenEnum>() -> HashMap<&'static str, T> {
    let mut map = HashMap::new();
    for (value, names) in T::spellings() {
        for name in names.iter() {
            map.entry(*name).or_insert(*value);
        }
    }
    map
}

#[macro_export]
macro_rules! token_enum {
    ($ty:ty { $($value:expr => [$($spelling:literal),+ $(,)?]),+ $(,)? }) => {
        impl $crate::TokenEnum for $ty {
            fn spellings() -> &'static [(Self, &'static [&'static str])] {
                &[$(($value, &[$($spelling),+])),+]
            }

            fn lookup() -> &'static ::std::collections::HashMap<&'static str, Self> {
                static LOOKUP: $crate::__private::Lazy<
                    ::std::collections::HashMap<&'static str, $ty>,
                > = $crate::__private::Lazy::new($crate::coerce::build_lookup::<$ty>);
                &LOOKUP
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Direction {
        Up,
        Down,
    }

    crate::token_enum!(Direction {
        Direction::Up => ["U", "Up"],
        Direction::Down => ["D"],
    });

    #[test]
    fn test_lookup_contains_every_spelling() {
        let lookup = Direction::lookup();
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup["Up"], Direction::Up);
        assert_eq!(lookup["D"], Direction::Down);
    }

    #[test]
    fn test_lookup_is_built_once() {
        assert!(std::ptr::eq(Direction::lookup(), Direction::lookup()));
    }

    #[test]
    fn test_accepted_spellings_lists_in_declaration_order() {
        assert_eq!(Direction::accepted_spellings(), "U, Up, D");
    }
}
