/*!
This crate is the language-neutral core of zograscope.

It owns the layered tree model (parse tree, structural tree, semantic tree),
the comparison pipeline (coarse reduction, tree edit distance, change
distilling, state propagation) and the `Language` trait that front-ends
implement. Rendering and file handling live in the cli crate.
*/

pub mod arena;
pub mod compare;
pub mod distill;
pub mod language;
pub mod mtypes;
pub mod ptree;
pub mod stree;
pub mod ted;
pub mod tree;
pub mod types;

mod iterators;

#[cfg(test)]
pub(crate) mod testutil;

pub use arena::{Interner, Span};
pub use compare::compare;
pub use iterators::{Leaves, Nodes};
pub use language::{Error, Language, NodeView, Result};
pub use mtypes::MType;
pub use ptree::{Location, PNodeId, Text, TreeBuilder};
pub use stree::STree;
pub use tree::{Node, NodeId, Tree};
pub use types::{SType, State, Type};
