//! C front-end over the tree-sitter grammar.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use zograscope_core::{Language, MType, NodeView, Result, SType, TreeBuilder, Type};

use crate::stypes;
use crate::transformer::Transformer;

stypes!(CSType {
  Separator,
  Comment,
  Directive,
  TranslationUnit,
  Declaration,
  FunctionDeclaration,
  FunctionDefinition,
  CompoundStatement,
  ExprStatement,
  IfStmt,
  IfElse,
  WhileStmt,
  DoWhileStmt,
  ForStmt,
  SwitchStmt,
  CaseStmt,
  LabelStmt,
  GotoStmt,
  ContinueStmt,
  BreakStmt,
  ReturnValueStmt,
  Expression,
  ConditionExpr,
  AssignmentExpr,
  CallExpr,
  ArgumentList,
  ParameterList,
  Parameter,
  Declarator,
  Initializer,
  InitializerList,
  InitializerElement,
  PointerDecl,
  DirectDeclarator,
  MemberAccess,
  StructSpecifier,
});

pub(crate) struct CLang;

fn stype_map() -> &'static HashMap<&'static str, SType> {
  static MAP: OnceLock<HashMap<&'static str, SType>> = OnceLock::new();
  MAP.get_or_init(|| {
    HashMap::from([
      ("separator", CSType::Separator.into()),
      ("comment", CSType::Comment.into()),
      ("translation_unit", CSType::TranslationUnit.into()),
      ("preproc_include", CSType::Directive.into()),
      ("preproc_def", CSType::Directive.into()),
      ("preproc_function_def", CSType::Directive.into()),
      ("preproc_ifdef", CSType::Directive.into()),
      ("preproc_if", CSType::Directive.into()),
      ("preproc_else", CSType::Directive.into()),
      ("preproc_elif", CSType::Directive.into()),
      ("preproc_call", CSType::Directive.into()),
      ("function_definition", CSType::FunctionDefinition.into()),
      ("function_declarator", CSType::FunctionDeclaration.into()),
      ("declaration", CSType::Declaration.into()),
      ("field_declaration", CSType::Declaration.into()),
      ("init_declarator", CSType::Declarator.into()),
      ("initializer_list", CSType::InitializerList.into()),
      ("initializer_pair", CSType::InitializerElement.into()),
      ("compound_statement", CSType::CompoundStatement.into()),
      ("expression_statement", CSType::ExprStatement.into()),
      ("if_statement", CSType::IfStmt.into()),
      ("else_clause", CSType::IfElse.into()),
      ("while_statement", CSType::WhileStmt.into()),
      ("do_statement", CSType::DoWhileStmt.into()),
      ("for_statement", CSType::ForStmt.into()),
      ("switch_statement", CSType::SwitchStmt.into()),
      ("case_statement", CSType::CaseStmt.into()),
      ("labeled_statement", CSType::LabelStmt.into()),
      ("goto_statement", CSType::GotoStmt.into()),
      ("continue_statement", CSType::ContinueStmt.into()),
      ("break_statement", CSType::BreakStmt.into()),
      ("return_statement", CSType::ReturnValueStmt.into()),
      ("call_expression", CSType::CallExpr.into()),
      ("argument_list", CSType::ArgumentList.into()),
      ("parameter_list", CSType::ParameterList.into()),
      ("parameter_declaration", CSType::Parameter.into()),
      ("assignment_expression", CSType::AssignmentExpr.into()),
      ("conditional_expression", CSType::ConditionExpr.into()),
      ("binary_expression", CSType::Expression.into()),
      ("unary_expression", CSType::Expression.into()),
      ("update_expression", CSType::Expression.into()),
      ("parenthesized_expression", CSType::Expression.into()),
      ("cast_expression", CSType::Expression.into()),
      ("comma_expression", CSType::Expression.into()),
      ("sizeof_expression", CSType::Expression.into()),
      ("subscript_expression", CSType::Expression.into()),
      ("field_expression", CSType::MemberAccess.into()),
      ("pointer_declarator", CSType::PointerDecl.into()),
      ("array_declarator", CSType::DirectDeclarator.into()),
      ("struct_specifier", CSType::StructSpecifier.into()),
      ("union_specifier", CSType::StructSpecifier.into()),
      ("enum_specifier", CSType::StructSpecifier.into()),
      ("field_declaration_list", CSType::CompoundStatement.into()),
      ("enumerator_list", CSType::InitializerList.into()),
      ("enumerator", CSType::InitializerElement.into()),
    ])
  })
}

fn type_map() -> &'static HashMap<&'static str, Type> {
  static MAP: OnceLock<HashMap<&'static str, Type>> = OnceLock::new();
  MAP.get_or_init(|| {
    HashMap::from([
      ("identifier", Type::Identifiers),
      ("field_identifier", Type::Identifiers),
      ("statement_identifier", Type::Identifiers),
      ("type_identifier", Type::UserTypes),
      ("primitive_type", Type::Types),
      ("sized_type_specifier", Type::Types),
      ("number_literal", Type::IntConstants),
      ("char_literal", Type::CharConstants),
      ("string_literal", Type::StrConstants),
      ("string_content", Type::StrConstants),
      ("escape_sequence", Type::StrConstants),
      ("system_lib_string", Type::StrConstants),
      ("comment", Type::Comments),
      ("preproc_include", Type::Directives),
      ("preproc_def", Type::Directives),
      ("preproc_function_def", Type::Directives),
      ("preproc_ifdef", Type::Directives),
      ("preproc_if", Type::Directives),
      ("preproc_call", Type::Directives),
      ("preproc_arg", Type::Directives),
      ("preproc_directive", Type::Directives),
      ("#include", Type::Directives),
      ("#define", Type::Directives),
      ("#if", Type::Directives),
      ("#ifdef", Type::Directives),
      ("#ifndef", Type::Directives),
      ("#else", Type::Directives),
      ("#elif", Type::Directives),
      ("#endif", Type::Directives),
      ("storage_class_specifier", Type::Specifiers),
      ("type_qualifier", Type::Specifiers),
      ("extern", Type::Specifiers),
      ("static", Type::Specifiers),
      ("auto", Type::Specifiers),
      ("register", Type::Specifiers),
      ("inline", Type::Specifiers),
      ("const", Type::Specifiers),
      ("volatile", Type::Specifiers),
      ("restrict", Type::Specifiers),
      ("typedef", Type::Specifiers),
      ("_Atomic", Type::Specifiers),
      ("_Noreturn", Type::Specifiers),
      ("break", Type::Jumps),
      ("continue", Type::Jumps),
      ("goto", Type::Jumps),
      ("if", Type::Keywords),
      ("else", Type::Keywords),
      ("switch", Type::Keywords),
      ("case", Type::Keywords),
      ("default", Type::Keywords),
      ("while", Type::Keywords),
      ("do", Type::Keywords),
      ("for", Type::Keywords),
      ("return", Type::Keywords),
      ("sizeof", Type::Keywords),
      ("struct", Type::Keywords),
      ("union", Type::Keywords),
      ("enum", Type::Keywords),
      ("true", Type::Keywords),
      ("false", Type::Keywords),
      ("(", Type::LeftBrackets),
      ("{", Type::LeftBrackets),
      ("[", Type::LeftBrackets),
      (")", Type::RightBrackets),
      ("}", Type::RightBrackets),
      ("]", Type::RightBrackets),
      ("<=", Type::Comparisons),
      (">=", Type::Comparisons),
      ("==", Type::Comparisons),
      ("!=", Type::Comparisons),
      ("<", Type::Comparisons),
      (">", Type::Comparisons),
      ("++", Type::Operators),
      ("--", Type::Operators),
      ("<<", Type::Operators),
      (">>", Type::Operators),
      ("&", Type::Operators),
      ("|", Type::Operators),
      ("^", Type::Operators),
      ("*", Type::Operators),
      ("/", Type::Operators),
      ("%", Type::Operators),
      ("+", Type::Operators),
      ("-", Type::Operators),
      ("~", Type::Operators),
      ("!", Type::Operators),
      ("&&", Type::LogicalOperators),
      ("||", Type::LogicalOperators),
      ("=", Type::Assignments),
      ("*=", Type::Assignments),
      ("/=", Type::Assignments),
      ("%=", Type::Assignments),
      ("+=", Type::Assignments),
      ("-=", Type::Assignments),
      ("<<=", Type::Assignments),
      (">>=", Type::Assignments),
      ("&=", Type::Assignments),
      ("^=", Type::Assignments),
      ("|=", Type::Assignments),
      ("?", Type::Other),
      (":", Type::Other),
      (";", Type::Other),
      (".", Type::Other),
      (",", Type::Other),
      ("->", Type::Other),
    ])
  })
}

fn bad_nodes() -> &'static HashSet<&'static str> {
  static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
  SET.get_or_init(HashSet::new)
}

impl Language for CLang {
  fn parse(
    &self,
    contents: &str,
    path: &str,
    tab_width: usize,
    debug: bool,
  ) -> Result<TreeBuilder> {
    Transformer::new(
      contents,
      tree_sitter_c::LANGUAGE.into(),
      stype_map(),
      type_map(),
      bad_nodes(),
      tab_width,
      debug,
    )
    .transform(path)
  }

  fn classify(&self, stype: SType) -> MType {
    match CSType::of(stype) {
      CSType::Declaration | CSType::FunctionDeclaration => MType::Declaration,
      CSType::ExprStatement => MType::Statement,
      CSType::FunctionDefinition => MType::Function,
      CSType::CallExpr => MType::Call,
      CSType::Parameter => MType::Parameter,
      CSType::Comment => MType::Comment,
      CSType::Directive => MType::Directive,
      CSType::CompoundStatement => MType::Block,
      _ => MType::Other,
    }
  }

  fn stype_name(&self, stype: SType) -> &'static str {
    CSType::name(stype)
  }

  fn is_travelling_node(&self, node: NodeView) -> bool {
    matches!(CSType::of(node.stype), CSType::Directive | CSType::Comment)
  }

  fn can_be_flattened(&self, _parent: NodeView, child: NodeView, level: u32) -> bool {
    match level {
      0 => child.stype == CSType::ConditionExpr,
      1 => child.stype == CSType::ExprStatement,
      2 => child.stype == CSType::Expression,
      _ => !matches!(
        CSType::of(child.stype),
        CSType::Declaration | CSType::ReturnValueStmt | CSType::CallExpr | CSType::Parameter
      ),
    }
  }

  fn is_unmovable(&self, node: NodeView) -> bool {
    node.stype == CSType::CompoundStatement
  }

  fn is_container(&self, node: NodeView) -> bool {
    node.stype == CSType::CompoundStatement
  }

  fn is_diffable(&self, node: NodeView) -> bool {
    matches!(CSType::of(node.stype), CSType::Comment | CSType::Directive)
      || default_is_diffable(node)
  }

  fn is_structural(&self, node: NodeView) -> bool {
    matches!(node.ty, Type::LeftBrackets | Type::RightBrackets)
      || node.label == ","
      || node.label == ";"
  }

  fn always_matches(&self, node: NodeView) -> bool {
    node.stype == CSType::TranslationUnit
  }

  fn is_pseudo_parameter(&self, node: NodeView) -> bool {
    node.label == "void"
  }

  fn should_splice(&self, parent: SType, child: NodeView) -> bool {
    let parent = CSType::of(parent);
    let child = CSType::of(child.stype);

    if parent == CSType::CompoundStatement && child == CSType::CompoundStatement {
      return true;
    }
    if parent == CSType::FunctionDefinition && child == CSType::CompoundStatement {
      return true;
    }
    if matches!(
      parent,
      CSType::IfStmt
        | CSType::IfElse
        | CSType::SwitchStmt
        | CSType::WhileStmt
        | CSType::DoWhileStmt
        | CSType::ForStmt
    ) && child == CSType::CompoundStatement
    {
      return true;
    }
    if parent == CSType::CallExpr && child == CSType::ArgumentList {
      return true;
    }
    if parent == CSType::FunctionDeclaration && child == CSType::ParameterList {
      return true;
    }
    false
  }

  fn is_value_node(&self, stype: SType) -> bool {
    stype == CSType::FunctionDeclaration
  }

  fn is_layer_break(&self, _parent: SType, stype: SType) -> bool {
    match CSType::of(stype) {
      CSType::FunctionDefinition
      | CSType::InitializerElement
      | CSType::InitializerList
      | CSType::Initializer
      | CSType::Declaration
      | CSType::CallExpr
      | CSType::AssignmentExpr
      | CSType::ExprStatement
      | CSType::Expression
      | CSType::ReturnValueStmt
      | CSType::Parameter
      | CSType::MemberAccess => true,
      _ => self.is_value_node(stype),
    }
  }

  fn should_drop_leading_ws(&self, stype: SType) -> bool {
    stype == CSType::Comment
  }

  fn is_satellite(&self, stype: SType) -> bool {
    stype == CSType::Separator
  }
}

// The trait's default body, reachable here despite the override.
fn default_is_diffable(node: NodeView) -> bool {
  matches!(
    node.ty,
    Type::Comments
      | Type::StrConstants
      | Type::Functions
      | Type::Identifiers
      | Type::UserTypes
  )
}
