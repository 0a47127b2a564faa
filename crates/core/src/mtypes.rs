//! Meta-types used to classify language-specific STypes.

use std::fmt;

/// Language-neutral semantic category of a structural node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MType {
  /// Everything else.
  #[default]
  Other,
  /// Any sort of declaration.
  Declaration,
  /// Statement.
  Statement,
  /// Functions (their definitions only).
  Function,
  /// Function invocation.
  Call,
  /// Parameter in declaration of a function.
  Parameter,
  /// Comments of any kind.
  Comment,
  /// Preprocessor-alike directives.
  Directive,
  /// A container of statements.
  Block,
}

impl fmt::Display for MType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{self:?}")
  }
}

/// Checks whether nodes of the meta-type can nest.
pub fn can_nest(mtype: MType) -> bool {
  matches!(mtype, MType::Block)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn only_blocks_nest() {
    assert!(can_nest(MType::Block));
    assert!(!can_nest(MType::Function));
    assert!(!can_nest(MType::Statement));
  }
}
