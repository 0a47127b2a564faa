//! Bash front-end over the tree-sitter grammar.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use zograscope_core::{Language, MType, NodeView, Result, SType, TreeBuilder, Type};

use crate::stypes;
use crate::transformer::Transformer;

stypes!(BashSType {
  Separator,
  Comment,
  Program,
  Command,
  CommandName,
  VariableAssignment,
  FunctionDefinition,
  CompoundStatement,
  IfStatement,
  ElifClause,
  ElseClause,
  WhileStatement,
  ForStatement,
  CaseStatement,
  CaseItem,
  Pipeline,
  List,
  RedirectedStatement,
  Subshell,
  TestCommand,
  CommandSubstitution,
  Expansion,
  SimpleExpansion,
  String,
});

pub(crate) struct BashLang;

fn stype_map() -> &'static HashMap<&'static str, SType> {
  static MAP: OnceLock<HashMap<&'static str, SType>> = OnceLock::new();
  MAP.get_or_init(|| {
    HashMap::from([
      ("separator", BashSType::Separator.into()),
      ("comment", BashSType::Comment.into()),
      ("program", BashSType::Program.into()),
      ("command", BashSType::Command.into()),
      ("command_name", BashSType::CommandName.into()),
      ("declaration_command", BashSType::Command.into()),
      ("unset_command", BashSType::Command.into()),
      ("negated_command", BashSType::Command.into()),
      ("variable_assignment", BashSType::VariableAssignment.into()),
      ("function_definition", BashSType::FunctionDefinition.into()),
      ("compound_statement", BashSType::CompoundStatement.into()),
      ("do_group", BashSType::CompoundStatement.into()),
      ("if_statement", BashSType::IfStatement.into()),
      ("elif_clause", BashSType::ElifClause.into()),
      ("else_clause", BashSType::ElseClause.into()),
      ("while_statement", BashSType::WhileStatement.into()),
      ("for_statement", BashSType::ForStatement.into()),
      ("c_style_for_statement", BashSType::ForStatement.into()),
      ("case_statement", BashSType::CaseStatement.into()),
      ("case_item", BashSType::CaseItem.into()),
      ("pipeline", BashSType::Pipeline.into()),
      ("list", BashSType::List.into()),
      ("redirected_statement", BashSType::RedirectedStatement.into()),
      ("subshell", BashSType::Subshell.into()),
      ("test_command", BashSType::TestCommand.into()),
      ("command_substitution", BashSType::CommandSubstitution.into()),
      ("expansion", BashSType::Expansion.into()),
      ("simple_expansion", BashSType::SimpleExpansion.into()),
      ("string", BashSType::String.into()),
    ])
  })
}

fn type_map() -> &'static HashMap<&'static str, Type> {
  static MAP: OnceLock<HashMap<&'static str, Type>> = OnceLock::new();
  MAP.get_or_init(|| {
    HashMap::from([
      ("word", Type::Identifiers),
      ("variable_name", Type::Identifiers),
      ("special_variable_name", Type::Identifiers),
      ("command_name", Type::Functions),
      ("comment", Type::Comments),
      ("string", Type::StrConstants),
      ("raw_string", Type::StrConstants),
      ("string_content", Type::StrConstants),
      ("ansi_c_string", Type::StrConstants),
      ("heredoc_body", Type::StrConstants),
      ("number", Type::IntConstants),
      ("file_descriptor", Type::IntConstants),
      ("test_operator", Type::Operators),
      ("if", Type::Keywords),
      ("then", Type::Keywords),
      ("else", Type::Keywords),
      ("elif", Type::Keywords),
      ("fi", Type::Keywords),
      ("for", Type::Keywords),
      ("in", Type::Keywords),
      ("do", Type::Keywords),
      ("done", Type::Keywords),
      ("while", Type::Keywords),
      ("until", Type::Keywords),
      ("case", Type::Keywords),
      ("esac", Type::Keywords),
      ("function", Type::Keywords),
      ("select", Type::Keywords),
      ("$", Type::Other),
      ("{", Type::LeftBrackets),
      ("(", Type::LeftBrackets),
      ("[", Type::LeftBrackets),
      ("[[", Type::LeftBrackets),
      ("}", Type::RightBrackets),
      (")", Type::RightBrackets),
      ("]", Type::RightBrackets),
      ("]]", Type::RightBrackets),
      ("&&", Type::LogicalOperators),
      ("||", Type::LogicalOperators),
      ("|", Type::Operators),
      ("|&", Type::Operators),
      ("<", Type::Operators),
      (">", Type::Operators),
      (">>", Type::Operators),
      ("<<", Type::Operators),
      ("<&", Type::Operators),
      (">&", Type::Operators),
      ("=", Type::Assignments),
      ("+=", Type::Assignments),
      (";", Type::Other),
      (";;", Type::Other),
      ("&", Type::Other),
    ])
  })
}

fn bad_nodes() -> &'static HashSet<&'static str> {
  static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
  SET.get_or_init(HashSet::new)
}

impl Language for BashLang {
  fn parse(
    &self,
    contents: &str,
    path: &str,
    tab_width: usize,
    debug: bool,
  ) -> Result<TreeBuilder> {
    Transformer::new(
      contents,
      tree_sitter_bash::LANGUAGE.into(),
      stype_map(),
      type_map(),
      bad_nodes(),
      tab_width,
      debug,
    )
    .transform(path)
  }

  fn classify(&self, stype: SType) -> MType {
    match BashSType::of(stype) {
      BashSType::Comment => MType::Comment,
      BashSType::FunctionDefinition => MType::Function,
      BashSType::Command | BashSType::Pipeline => MType::Call,
      BashSType::VariableAssignment => MType::Declaration,
      BashSType::CompoundStatement => MType::Block,
      _ => MType::Other,
    }
  }

  fn stype_name(&self, stype: SType) -> &'static str {
    BashSType::name(stype)
  }

  fn can_be_flattened(&self, _parent: NodeView, _child: NodeView, level: u32) -> bool {
    level >= 3
  }

  fn is_unmovable(&self, node: NodeView) -> bool {
    node.stype == BashSType::CompoundStatement
  }

  fn is_container(&self, node: NodeView) -> bool {
    node.stype == BashSType::CompoundStatement
  }

  fn always_matches(&self, node: NodeView) -> bool {
    node.stype == BashSType::Program
  }

  fn is_value_node(&self, stype: SType) -> bool {
    stype == BashSType::CommandName
  }

  fn is_layer_break(&self, _parent: SType, stype: SType) -> bool {
    match BashSType::of(stype) {
      BashSType::FunctionDefinition | BashSType::Command | BashSType::VariableAssignment => true,
      _ => self.is_value_node(stype),
    }
  }

  fn is_satellite(&self, stype: SType) -> bool {
    stype == BashSType::Separator
  }
}
