//! C++ front-end over the tree-sitter grammar.
//!
//! Follows the C policies and extends the tables with class, namespace,
//! template and exception constructs.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use zograscope_core::{Language, MType, NodeView, Result, SType, TreeBuilder, Type};

use crate::stypes;
use crate::transformer::Transformer;

stypes!(CxxSType {
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
  TryStmt,
  CatchClause,
  ThrowStmt,
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
  Class,
  AccessSpecifier,
  Namespace,
  TemplateDecl,
});

pub(crate) struct CppLang;

fn stype_map() -> &'static HashMap<&'static str, SType> {
  static MAP: OnceLock<HashMap<&'static str, SType>> = OnceLock::new();
  MAP.get_or_init(|| {
    HashMap::from([
      ("separator", CxxSType::Separator.into()),
      ("comment", CxxSType::Comment.into()),
      ("translation_unit", CxxSType::TranslationUnit.into()),
      ("preproc_include", CxxSType::Directive.into()),
      ("preproc_def", CxxSType::Directive.into()),
      ("preproc_function_def", CxxSType::Directive.into()),
      ("preproc_ifdef", CxxSType::Directive.into()),
      ("preproc_if", CxxSType::Directive.into()),
      ("preproc_else", CxxSType::Directive.into()),
      ("preproc_elif", CxxSType::Directive.into()),
      ("preproc_call", CxxSType::Directive.into()),
      ("function_definition", CxxSType::FunctionDefinition.into()),
      ("function_declarator", CxxSType::FunctionDeclaration.into()),
      ("declaration", CxxSType::Declaration.into()),
      ("field_declaration", CxxSType::Declaration.into()),
      ("alias_declaration", CxxSType::Declaration.into()),
      ("using_declaration", CxxSType::Declaration.into()),
      ("init_declarator", CxxSType::Declarator.into()),
      ("initializer_list", CxxSType::InitializerList.into()),
      ("initializer_pair", CxxSType::InitializerElement.into()),
      ("field_initializer_list", CxxSType::InitializerList.into()),
      ("field_initializer", CxxSType::InitializerElement.into()),
      ("compound_statement", CxxSType::CompoundStatement.into()),
      ("expression_statement", CxxSType::ExprStatement.into()),
      ("if_statement", CxxSType::IfStmt.into()),
      ("else_clause", CxxSType::IfElse.into()),
      ("while_statement", CxxSType::WhileStmt.into()),
      ("do_statement", CxxSType::DoWhileStmt.into()),
      ("for_statement", CxxSType::ForStmt.into()),
      ("for_range_loop", CxxSType::ForStmt.into()),
      ("switch_statement", CxxSType::SwitchStmt.into()),
      ("case_statement", CxxSType::CaseStmt.into()),
      ("labeled_statement", CxxSType::LabelStmt.into()),
      ("goto_statement", CxxSType::GotoStmt.into()),
      ("continue_statement", CxxSType::ContinueStmt.into()),
      ("break_statement", CxxSType::BreakStmt.into()),
      ("return_statement", CxxSType::ReturnValueStmt.into()),
      ("try_statement", CxxSType::TryStmt.into()),
      ("catch_clause", CxxSType::CatchClause.into()),
      ("throw_statement", CxxSType::ThrowStmt.into()),
      ("call_expression", CxxSType::CallExpr.into()),
      ("argument_list", CxxSType::ArgumentList.into()),
      ("template_argument_list", CxxSType::ArgumentList.into()),
      ("parameter_list", CxxSType::ParameterList.into()),
      ("template_parameter_list", CxxSType::ParameterList.into()),
      ("parameter_declaration", CxxSType::Parameter.into()),
      ("optional_parameter_declaration", CxxSType::Parameter.into()),
      ("assignment_expression", CxxSType::AssignmentExpr.into()),
      ("conditional_expression", CxxSType::ConditionExpr.into()),
      ("binary_expression", CxxSType::Expression.into()),
      ("unary_expression", CxxSType::Expression.into()),
      ("update_expression", CxxSType::Expression.into()),
      ("parenthesized_expression", CxxSType::Expression.into()),
      ("cast_expression", CxxSType::Expression.into()),
      ("comma_expression", CxxSType::Expression.into()),
      ("sizeof_expression", CxxSType::Expression.into()),
      ("subscript_expression", CxxSType::Expression.into()),
      ("new_expression", CxxSType::Expression.into()),
      ("delete_expression", CxxSType::Expression.into()),
      ("lambda_expression", CxxSType::Expression.into()),
      ("field_expression", CxxSType::MemberAccess.into()),
      ("qualified_identifier", CxxSType::MemberAccess.into()),
      ("pointer_declarator", CxxSType::PointerDecl.into()),
      ("reference_declarator", CxxSType::PointerDecl.into()),
      ("array_declarator", CxxSType::DirectDeclarator.into()),
      ("class_specifier", CxxSType::Class.into()),
      ("struct_specifier", CxxSType::Class.into()),
      ("union_specifier", CxxSType::Class.into()),
      ("enum_specifier", CxxSType::Class.into()),
      ("field_declaration_list", CxxSType::CompoundStatement.into()),
      ("enumerator_list", CxxSType::InitializerList.into()),
      ("enumerator", CxxSType::InitializerElement.into()),
      ("access_specifier", CxxSType::AccessSpecifier.into()),
      ("namespace_definition", CxxSType::Namespace.into()),
      ("template_declaration", CxxSType::TemplateDecl.into()),
    ])
  })
}

fn type_map() -> &'static HashMap<&'static str, Type> {
  static MAP: OnceLock<HashMap<&'static str, Type>> = OnceLock::new();
  MAP.get_or_init(|| {
    let mut map = HashMap::from([
      ("identifier", Type::Identifiers),
      ("field_identifier", Type::Identifiers),
      ("statement_identifier", Type::Identifiers),
      ("namespace_identifier", Type::Identifiers),
      ("destructor_name", Type::Identifiers),
      ("this", Type::Identifiers),
      ("type_identifier", Type::UserTypes),
      ("primitive_type", Type::Types),
      ("sized_type_specifier", Type::Types),
      ("auto", Type::Types),
      ("number_literal", Type::IntConstants),
      ("char_literal", Type::CharConstants),
      ("string_literal", Type::StrConstants),
      ("raw_string_literal", Type::StrConstants),
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
      ("virtual", Type::Specifiers),
      ("override", Type::Specifiers),
      ("final", Type::Specifiers),
      ("constexpr", Type::Specifiers),
      ("mutable", Type::Specifiers),
      ("explicit", Type::Specifiers),
      ("friend", Type::Specifiers),
      ("extern", Type::Specifiers),
      ("static", Type::Specifiers),
      ("inline", Type::Specifiers),
      ("const", Type::Specifiers),
      ("volatile", Type::Specifiers),
      ("typedef", Type::Specifiers),
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
      ("class", Type::Keywords),
      ("namespace", Type::Keywords),
      ("template", Type::Keywords),
      ("typename", Type::Keywords),
      ("using", Type::Keywords),
      ("try", Type::Keywords),
      ("catch", Type::Keywords),
      ("throw", Type::Keywords),
      ("new", Type::Keywords),
      ("delete", Type::Keywords),
      ("operator", Type::Keywords),
      ("public", Type::Keywords),
      ("private", Type::Keywords),
      ("protected", Type::Keywords),
      ("nullptr", Type::Keywords),
      ("true", Type::Keywords),
      ("false", Type::Keywords),
    ]);
    map.extend([
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
      ("::", Type::Other),
      (";", Type::Other),
      (".", Type::Other),
      (",", Type::Other),
      ("->", Type::Other),
    ]);
    map
  })
}

fn bad_nodes() -> &'static HashSet<&'static str> {
  static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
  SET.get_or_init(HashSet::new)
}

impl Language for CppLang {
  fn parse(
    &self,
    contents: &str,
    path: &str,
    tab_width: usize,
    debug: bool,
  ) -> Result<TreeBuilder> {
    Transformer::new(
      contents,
      tree_sitter_cpp::LANGUAGE.into(),
      stype_map(),
      type_map(),
      bad_nodes(),
      tab_width,
      debug,
    )
    .transform(path)
  }

  fn classify(&self, stype: SType) -> MType {
    match CxxSType::of(stype) {
      CxxSType::Declaration | CxxSType::FunctionDeclaration => MType::Declaration,
      CxxSType::ExprStatement | CxxSType::ThrowStmt => MType::Statement,
      CxxSType::FunctionDefinition => MType::Function,
      CxxSType::CallExpr => MType::Call,
      CxxSType::Parameter => MType::Parameter,
      CxxSType::Comment => MType::Comment,
      CxxSType::Directive => MType::Directive,
      CxxSType::CompoundStatement => MType::Block,
      _ => MType::Other,
    }
  }

  fn stype_name(&self, stype: SType) -> &'static str {
    CxxSType::name(stype)
  }

  fn is_travelling_node(&self, node: NodeView) -> bool {
    matches!(CxxSType::of(node.stype), CxxSType::Directive | CxxSType::Comment)
  }

  fn can_be_flattened(&self, _parent: NodeView, child: NodeView, level: u32) -> bool {
    match level {
      0 => child.stype == CxxSType::ConditionExpr,
      1 => child.stype == CxxSType::ExprStatement,
      2 => child.stype == CxxSType::Expression,
      _ => !matches!(
        CxxSType::of(child.stype),
        CxxSType::Declaration
          | CxxSType::ReturnValueStmt
          | CxxSType::CallExpr
          | CxxSType::Parameter
      ),
    }
  }

  fn is_unmovable(&self, node: NodeView) -> bool {
    node.stype == CxxSType::CompoundStatement
  }

  fn is_container(&self, node: NodeView) -> bool {
    node.stype == CxxSType::CompoundStatement
  }

  fn is_diffable(&self, node: NodeView) -> bool {
    matches!(CxxSType::of(node.stype), CxxSType::Comment | CxxSType::Directive)
      || matches!(
        node.ty,
        Type::Comments
          | Type::StrConstants
          | Type::Functions
          | Type::Identifiers
          | Type::UserTypes
      )
  }

  fn is_structural(&self, node: NodeView) -> bool {
    matches!(node.ty, Type::LeftBrackets | Type::RightBrackets)
      || node.label == ","
      || node.label == ";"
  }

  fn always_matches(&self, node: NodeView) -> bool {
    node.stype == CxxSType::TranslationUnit
  }

  fn is_pseudo_parameter(&self, node: NodeView) -> bool {
    node.label == "void"
  }

  fn should_splice(&self, parent: SType, child: NodeView) -> bool {
    let parent = CxxSType::of(parent);
    let child = CxxSType::of(child.stype);

    if parent == CxxSType::CompoundStatement && child == CxxSType::CompoundStatement {
      return true;
    }
    if parent == CxxSType::FunctionDefinition && child == CxxSType::CompoundStatement {
      return true;
    }
    if matches!(
      parent,
      CxxSType::IfStmt
        | CxxSType::IfElse
        | CxxSType::SwitchStmt
        | CxxSType::WhileStmt
        | CxxSType::DoWhileStmt
        | CxxSType::ForStmt
        | CxxSType::TryStmt
        | CxxSType::CatchClause
        | CxxSType::Namespace
    ) && child == CxxSType::CompoundStatement
    {
      return true;
    }
    if parent == CxxSType::Class && child == CxxSType::CompoundStatement {
      return true;
    }
    if parent == CxxSType::CallExpr && child == CxxSType::ArgumentList {
      return true;
    }
    if parent == CxxSType::FunctionDeclaration && child == CxxSType::ParameterList {
      return true;
    }
    false
  }

  fn is_value_node(&self, stype: SType) -> bool {
    stype == CxxSType::FunctionDeclaration
  }

  fn is_layer_break(&self, _parent: SType, stype: SType) -> bool {
    match CxxSType::of(stype) {
      CxxSType::FunctionDefinition
      | CxxSType::InitializerElement
      | CxxSType::InitializerList
      | CxxSType::Initializer
      | CxxSType::Declaration
      | CxxSType::CallExpr
      | CxxSType::AssignmentExpr
      | CxxSType::ExprStatement
      | CxxSType::Expression
      | CxxSType::ReturnValueStmt
      | CxxSType::ThrowStmt
      | CxxSType::Parameter
      | CxxSType::MemberAccess
      | CxxSType::Class
      | CxxSType::TemplateDecl => true,
      _ => self.is_value_node(stype),
    }
  }

  fn should_drop_leading_ws(&self, stype: SType) -> bool {
    stype == CxxSType::Comment
  }

  fn is_satellite(&self, stype: SType) -> bool {
    stype == CxxSType::Separator
  }
}
