//! Language policy interface.
//!
//! A front-end supplies a parser plus a set of predicates that drive tree
//! transformation and matching. Predicates receive a borrowed [`NodeView`]
//! rather than a node id so that policies never need access to a tree.

use crate::mtypes::MType;
use crate::ptree::TreeBuilder;
use crate::types::{SType, Type};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core and the front-ends.
#[derive(Debug, Error)]
pub enum Error {
  /// Front-end failure; fatal for the comparison it belongs to.
  #[error("{path}:{line}:{col}: {message}")]
  Parse {
    path: String,
    line: u32,
    col: u32,
    message: String,
  },
  /// The requested language is not registered.
  #[error("unknown language: {0}")]
  UnknownLanguage(String),
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl Error {
  pub fn parse(path: &str, line: u32, col: u32, message: impl Into<String>) -> Self {
    Error::Parse {
      path: path.to_owned(),
      line,
      col,
      message: message.into(),
    }
  }
}

/// Borrowed view of a node handed to policy predicates.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
  pub label: &'a str,
  pub ty: Type,
  pub stype: SType,
}

/// Language-specific routines. Every predicate has a default that matches the
/// behavior most languages want; a minimal front-end only implements
/// [`Language::parse`], the taxonomy hooks and the predicates it cares about.
pub trait Language: Send + Sync {
  /// Parses `contents` into a parse tree. The returned builder has its
  /// `failed` flag set when the input could not be parsed.
  fn parse(
    &self,
    contents: &str,
    path: &str,
    tab_width: usize,
    debug: bool,
  ) -> Result<TreeBuilder>;

  /// Maps a language-specific token id to a general category.
  fn map_token(&self, token: u16) -> Type {
    Type::from_raw(token)
  }

  /// Maps a structural tag to its semantic category.
  fn classify(&self, stype: SType) -> MType;

  /// Name of a structural tag, for debugging dumps.
  fn stype_name(&self, stype: SType) -> &'static str;

  /// Directive or comment that may shift within its siblings.
  fn is_travelling_node(&self, _node: NodeView) -> bool {
    false
  }

  /// Node whose children match by position, not content (e.g. a for-loop
  /// head).
  fn has_fixed_structure(&self, _node: NodeView) -> bool {
    false
  }

  /// Controls how deep coarse flattening may go under `parent`.
  fn can_be_flattened(&self, _parent: NodeView, _child: NodeView, _level: u32) -> bool {
    false
  }

  /// Containers like statement lists whose elements should not be marked as
  /// moved wholesale.
  fn is_unmovable(&self, _node: NodeView) -> bool {
    false
  }

  fn is_container(&self, _node: NodeView) -> bool {
    false
  }

  /// Whether the node's spelling can be compared token-by-token.
  fn is_diffable(&self, node: NodeView) -> bool {
    matches!(
      node.ty,
      Type::Comments
        | Type::StrConstants
        | Type::Functions
        | Type::Identifiers
        | Type::UserTypes
    )
  }

  /// Punctuation-like nodes.
  fn is_structural(&self, node: NodeView) -> bool {
    matches!(node.ty, Type::LeftBrackets | Type::RightBrackets)
  }

  fn is_eol_continuation(&self, _node: NodeView) -> bool {
    false
  }

  /// Root-like nodes that map onto each other regardless of content.
  fn always_matches(&self, _node: NodeView) -> bool {
    false
  }

  /// Placeholder parameters such as C's `void` in a parameter list.
  fn is_pseudo_parameter(&self, _node: NodeView) -> bool {
    false
  }

  /// Whether `child` should be dissolved into `parent` during
  /// materialization.
  fn should_splice(&self, _parent: SType, _child: NodeView) -> bool {
    false
  }

  /// Whether a child with this tag provides its parent's label.
  fn is_value_node(&self, _stype: SType) -> bool {
    false
  }

  /// Whether a node with this tag starts a new layer under `parent`.
  fn is_layer_break(&self, _parent: SType, _stype: SType) -> bool {
    false
  }

  /// Whether leading whitespace after inner newlines is dropped from the
  /// label (multi-line comments).
  fn should_drop_leading_ws(&self, _stype: SType) -> bool {
    false
  }

  /// Whether nodes with this tag track the state of their parent.
  fn is_satellite(&self, _stype: SType) -> bool {
    false
  }

  /// Non-satellite, non-travelling children are the payload of a
  /// fixed-structure node.
  fn is_payload_of_fixed(&self, node: NodeView) -> bool {
    !self.is_satellite(node.stype) && !self.is_travelling_node(node)
  }

  fn has_moveable_items(&self, node: NodeView) -> bool {
    !self.is_unmovable(node) || self.is_container(node)
  }
}
