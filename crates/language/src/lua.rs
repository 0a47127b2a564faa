//! Lua front-end over the tree-sitter grammar.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use zograscope_core::{Language, MType, NodeView, Result, SType, TreeBuilder, Type};

use crate::stypes;
use crate::transformer::Transformer;

stypes!(LuaSType {
  Separator,
  Comment,
  Program,
  Function,
  FunctionName,
  FunctionBody,
  Parameters,
  Parameter,
  FunctionCall,
  Arguments,
  DeclStatement,
  VariableDecl,
  UnaryOperation,
  BinaryOperation,
  Expression,
  LoopExpression,
  FieldExpression,
  IfStatement,
  ElseIfStatement,
  ElseStatement,
  DoStatement,
  RepeatStatement,
  WhileStatement,
  ForStatement,
  GotoStatement,
  LabelStatement,
  ReturnStatement,
  Table,
  Field,
});

pub(crate) struct LuaLang;

fn stype_map() -> &'static HashMap<&'static str, SType> {
  static MAP: OnceLock<HashMap<&'static str, SType>> = OnceLock::new();
  MAP.get_or_init(|| {
    HashMap::from([
      ("separator", LuaSType::Separator.into()),
      ("comment", LuaSType::Comment.into()),
      ("chunk", LuaSType::Program.into()),
      ("block", LuaSType::FunctionBody.into()),
      ("function_declaration", LuaSType::Function.into()),
      ("function_definition", LuaSType::Function.into()),
      ("parameters", LuaSType::Parameters.into()),
      ("function_call", LuaSType::FunctionCall.into()),
      ("arguments", LuaSType::Arguments.into()),
      ("variable_declaration", LuaSType::DeclStatement.into()),
      ("assignment_statement", LuaSType::VariableDecl.into()),
      ("expression_list", LuaSType::Expression.into()),
      ("variable_list", LuaSType::Expression.into()),
      ("unary_expression", LuaSType::UnaryOperation.into()),
      ("binary_expression", LuaSType::BinaryOperation.into()),
      ("parenthesized_expression", LuaSType::Expression.into()),
      ("if_statement", LuaSType::IfStatement.into()),
      ("elseif_statement", LuaSType::ElseIfStatement.into()),
      ("else_statement", LuaSType::ElseStatement.into()),
      ("do_statement", LuaSType::DoStatement.into()),
      ("repeat_statement", LuaSType::RepeatStatement.into()),
      ("while_statement", LuaSType::WhileStatement.into()),
      ("for_statement", LuaSType::ForStatement.into()),
      ("for_generic_clause", LuaSType::LoopExpression.into()),
      ("for_numeric_clause", LuaSType::LoopExpression.into()),
      ("goto_statement", LuaSType::GotoStatement.into()),
      ("label_statement", LuaSType::LabelStatement.into()),
      ("return_statement", LuaSType::ReturnStatement.into()),
      ("table_constructor", LuaSType::Table.into()),
      ("field", LuaSType::Field.into()),
      ("dot_index_expression", LuaSType::FieldExpression.into()),
      ("bracket_index_expression", LuaSType::FieldExpression.into()),
      ("method_index_expression", LuaSType::FieldExpression.into()),
    ])
  })
}

fn type_map() -> &'static HashMap<&'static str, Type> {
  static MAP: OnceLock<HashMap<&'static str, Type>> = OnceLock::new();
  MAP.get_or_init(|| {
    HashMap::from([
      ("local", Type::Specifiers),
      ("comment", Type::Comments),
      ("function", Type::Keywords),
      ("while", Type::Keywords),
      ("repeat", Type::Keywords),
      ("until", Type::Keywords),
      ("if", Type::Keywords),
      ("then", Type::Keywords),
      ("else", Type::Keywords),
      ("elseif", Type::Keywords),
      ("end", Type::Keywords),
      ("for", Type::Keywords),
      ("in", Type::Keywords),
      ("do", Type::Keywords),
      ("true", Type::Keywords),
      ("false", Type::Keywords),
      ("return", Type::Keywords),
      ("nil", Type::Keywords),
      ("and", Type::Keywords),
      ("or", Type::Keywords),
      ("not", Type::Keywords),
      ("break_statement", Type::Jumps),
      ("goto", Type::Jumps),
      ("number", Type::IntConstants),
      ("string", Type::StrConstants),
      ("string_content", Type::StrConstants),
      ("escape_sequence", Type::StrConstants),
      ("identifier", Type::Identifiers),
      ("==", Type::Comparisons),
      ("~=", Type::Comparisons),
      ("<", Type::Comparisons),
      (">", Type::Comparisons),
      ("<=", Type::Comparisons),
      (">=", Type::Comparisons),
      ("~", Type::Operators),
      ("#", Type::Operators),
      ("-", Type::Operators),
      ("+", Type::Operators),
      ("%", Type::Operators),
      ("*", Type::Operators),
      ("/", Type::Operators),
      ("//", Type::Operators),
      ("^", Type::Operators),
      ("|", Type::Operators),
      ("&", Type::Operators),
      ("<<", Type::Operators),
      (">>", Type::Operators),
      ("..", Type::Operators),
      ("=", Type::Assignments),
      ("(", Type::LeftBrackets),
      ("{", Type::LeftBrackets),
      ("[", Type::LeftBrackets),
      (")", Type::RightBrackets),
      ("}", Type::RightBrackets),
      ("]", Type::RightBrackets),
      (",", Type::Other),
      (":", Type::Other),
      ("::", Type::Other),
      (";", Type::Other),
      (".", Type::Other),
      ("vararg_expression", Type::Other),
    ])
  })
}

fn bad_nodes() -> &'static HashSet<&'static str> {
  static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
  SET.get_or_init(HashSet::new)
}

impl Language for LuaLang {
  fn parse(
    &self,
    contents: &str,
    path: &str,
    tab_width: usize,
    debug: bool,
  ) -> Result<TreeBuilder> {
    Transformer::new(
      contents,
      tree_sitter_lua::LANGUAGE.into(),
      stype_map(),
      type_map(),
      bad_nodes(),
      tab_width,
      debug,
    )
    .transform(path)
  }

  fn classify(&self, stype: SType) -> MType {
    match LuaSType::of(stype) {
      LuaSType::VariableDecl => MType::Declaration,
      LuaSType::IfStatement
      | LuaSType::ElseIfStatement
      | LuaSType::ElseStatement
      | LuaSType::RepeatStatement
      | LuaSType::WhileStatement
      | LuaSType::ForStatement
      | LuaSType::GotoStatement
      | LuaSType::LabelStatement
      | LuaSType::ReturnStatement
      | LuaSType::DeclStatement => MType::Statement,
      LuaSType::Function => MType::Function,
      LuaSType::FunctionCall => MType::Call,
      LuaSType::Parameter => MType::Parameter,
      LuaSType::Comment => MType::Comment,
      LuaSType::FunctionBody | LuaSType::DoStatement => MType::Block,
      _ => MType::Other,
    }
  }

  fn stype_name(&self, stype: SType) -> &'static str {
    LuaSType::name(stype)
  }

  fn can_be_flattened(&self, _parent: NodeView, child: NodeView, level: u32) -> bool {
    match level {
      0 | 1 | 2 => false,
      _ => !matches!(
        LuaSType::of(child.stype),
        LuaSType::FunctionCall | LuaSType::VariableDecl | LuaSType::Parameter
      ),
    }
  }

  fn is_container(&self, node: NodeView) -> bool {
    matches!(
      LuaSType::of(node.stype),
      LuaSType::FunctionBody | LuaSType::DoStatement
    )
  }

  fn is_structural(&self, node: NodeView) -> bool {
    matches!(node.ty, Type::LeftBrackets | Type::RightBrackets)
      || node.label == "end"
      || node.label == ","
      || node.label == ";"
  }

  fn always_matches(&self, node: NodeView) -> bool {
    node.stype == LuaSType::Program
  }

  fn should_splice(&self, _parent: SType, child: NodeView) -> bool {
    matches!(
      LuaSType::of(child.stype),
      LuaSType::Parameters | LuaSType::Arguments
    )
  }

  fn is_value_node(&self, stype: SType) -> bool {
    stype == LuaSType::LoopExpression
  }

  fn is_layer_break(&self, _parent: SType, stype: SType) -> bool {
    match LuaSType::of(stype) {
      LuaSType::FunctionCall
      | LuaSType::Function
      | LuaSType::VariableDecl
      | LuaSType::Field
      | LuaSType::Parameter
      | LuaSType::ReturnStatement
      | LuaSType::UnaryOperation
      | LuaSType::BinaryOperation => true,
      _ => self.is_value_node(stype),
    }
  }

  fn is_satellite(&self, stype: SType) -> bool {
    stype == LuaSType::Separator
  }
}
