//! Language-neutral token categories and node states.

use std::fmt;

/// General category of a token, used for matching compatibility and
/// highlighting. Language front-ends translate their own token ids into this
/// closed set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Type {
  #[default]
  Virtual,
  Identifiers,
  Jumps,
  Specifiers,
  Types,
  LeftBrackets,
  RightBrackets,
  Comparisons,
  Operators,
  LogicalOperators,
  Assignments,
  Keywords,
  Directives,
  Comments,
  StrConstants,
  IntConstants,
  FPConstants,
  CharConstants,
  UserTypes,
  Functions,
  NonInterchangeable,
  Other,
}

impl Type {
  const VALUES: [Type; 22] = [
    Type::Virtual,
    Type::Identifiers,
    Type::Jumps,
    Type::Specifiers,
    Type::Types,
    Type::LeftBrackets,
    Type::RightBrackets,
    Type::Comparisons,
    Type::Operators,
    Type::LogicalOperators,
    Type::Assignments,
    Type::Keywords,
    Type::Directives,
    Type::Comments,
    Type::StrConstants,
    Type::IntConstants,
    Type::FPConstants,
    Type::CharConstants,
    Type::UserTypes,
    Type::Functions,
    Type::NonInterchangeable,
    Type::Other,
  ];

  /// Inverse of `self as u16`, for front-ends that store the category in the
  /// token id directly. Out-of-range values map to `Other`.
  pub fn from_raw(raw: u16) -> Type {
    Type::VALUES
      .get(raw as usize)
      .copied()
      .unwrap_or(Type::Other)
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{self:?}")
  }
}

/// Collapses categories that are equivalent for matching purposes: built-in
/// and user-defined type names are interchangeable.
pub fn canonize_type(ty: Type) -> Type {
  match ty {
    Type::UserTypes => Type::Types,
    ty => ty,
  }
}

/// Comparison state of a node. Defaults to `Unchanged`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
  #[default]
  Unchanged,
  Deleted,
  Inserted,
  Updated,
}

/// Language-specific structural tag. The neutral value marks parse-tree
/// scaffolding that carries no structural information; what the other values
/// mean is private to each language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SType(pub u8);

impl SType {
  pub const NONE: SType = SType(0);

  pub fn is_none(self) -> bool {
    self == SType::NONE
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn raw_round_trip() {
    assert_eq!(Type::from_raw(Type::Keywords as u16), Type::Keywords);
    assert_eq!(Type::from_raw(Type::Other as u16), Type::Other);
    assert_eq!(Type::from_raw(10_000), Type::Other);
  }

  #[test]
  fn user_types_canonize_to_types() {
    assert_eq!(canonize_type(Type::UserTypes), Type::Types);
    assert_eq!(canonize_type(Type::Functions), Type::Functions);
    assert_eq!(canonize_type(Type::IntConstants), Type::IntConstants);
  }
}
