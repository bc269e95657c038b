//! Expression and statement nodes referenced by the flow graph.
//!
//! Only the shapes the checker core inspects are modelled: narrowable
//! references, the expressions that narrow them, destructuring targets,
//! the statements that own switch clauses and `for...in`/`for...of`
//! bindings, class members, and function-like containers.

use crate::symbols::SymbolId;
use tyflow_common::interner::Atom;

/// Index of a node in the `NodeArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

/// Binary operators, including assignment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Assign,
    PlusAssign,
    MinusAssign,
    AsteriskAssign,
    SlashAssign,
    AmpersandAmpersandAssign,
    BarBarAssign,
    QuestionQuestionAssign,
    EqualsEquals,
    ExclamationEquals,
    EqualsEqualsEquals,
    ExclamationEqualsEquals,
    AmpersandAmpersand,
    BarBar,
    QuestionQuestion,
    InstanceOf,
    In,
    Comma,
    Plus,
    Minus,
    LessThan,
    GreaterThan,
}

impl BinaryOperator {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOperator::Assign
                | BinaryOperator::PlusAssign
                | BinaryOperator::MinusAssign
                | BinaryOperator::AsteriskAssign
                | BinaryOperator::SlashAssign
                | BinaryOperator::AmpersandAmpersandAssign
                | BinaryOperator::BarBarAssign
                | BinaryOperator::QuestionQuestionAssign
        )
    }

    /// Arithmetic compound assignments (`+=`, `-=`, ...). Logical assignments
    /// are excluded: they assign the right operand unchanged.
    pub fn is_compound_assignment(self) -> bool {
        matches!(
            self,
            BinaryOperator::PlusAssign
                | BinaryOperator::MinusAssign
                | BinaryOperator::AsteriskAssign
                | BinaryOperator::SlashAssign
        )
    }

    pub fn is_logical_or_coalescing_assignment(self) -> bool {
        matches!(
            self,
            BinaryOperator::AmpersandAmpersandAssign
                | BinaryOperator::BarBarAssign
                | BinaryOperator::QuestionQuestionAssign
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(
            self,
            BinaryOperator::EqualsEquals
                | BinaryOperator::ExclamationEquals
                | BinaryOperator::EqualsEqualsEquals
                | BinaryOperator::ExclamationEqualsEquals
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrefixOperator {
    Exclamation,
    Minus,
    Plus,
    Tilde,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Declaration,
    Expression,
    Arrow,
    Method,
    Constructor,
    /// `static { ... }` in a class body.
    StaticBlock,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Identifier {
        name: Atom,
        symbol: SymbolId,
    },
    /// `#name`; `symbol` is the class member it resolves to.
    PrivateIdentifier {
        name: Atom,
        symbol: SymbolId,
    },
    ThisKeyword,
    SuperKeyword,
    NullKeyword,
    TrueKeyword,
    FalseKeyword,
    StringLiteral {
        text: Atom,
    },
    NumericLiteral {
        value: f64,
    },
    BigIntLiteral {
        text: Atom,
    },
    ArrayLiteral {
        elements: Vec<NodeIndex>,
    },
    ObjectLiteral {
        properties: Vec<NodeIndex>,
    },
    /// `name: initializer` in an object literal.
    PropertyAssignment {
        name: Atom,
        initializer: NodeIndex,
    },
    /// `name` or `name = default` in an object literal; `default` is only
    /// legal when the literal is a destructuring target.
    ShorthandPropertyAssignment {
        name: NodeIndex,
        default: NodeIndex,
    },
    SpreadElement {
        expression: NodeIndex,
    },
    PropertyAccess {
        expression: NodeIndex,
        name: Atom,
        question_dot: bool,
    },
    ElementAccess {
        expression: NodeIndex,
        argument: NodeIndex,
        question_dot: bool,
    },
    Parenthesized {
        expression: NodeIndex,
    },
    NonNull {
        expression: NodeIndex,
    },
    TypeOf {
        expression: NodeIndex,
    },
    Delete {
        expression: NodeIndex,
    },
    PrefixUnary {
        operator: PrefixOperator,
        operand: NodeIndex,
    },
    Binary {
        left: NodeIndex,
        operator: BinaryOperator,
        right: NodeIndex,
    },
    Call {
        callee: NodeIndex,
        arguments: Vec<NodeIndex>,
        question_dot: bool,
    },
    /// `name` is an identifier or a binding pattern.
    VariableDeclaration {
        name: NodeIndex,
        initializer: NodeIndex,
        has_type_annotation: bool,
    },
    Parameter {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    ObjectBindingPattern {
        elements: Vec<NodeIndex>,
    },
    /// Omitted elements (`[, b]`) are `NONE`.
    ArrayBindingPattern {
        elements: Vec<NodeIndex>,
    },
    /// `property_name` is the property read from the parent value in an
    /// object pattern (`NONE` in array patterns).
    BindingElement {
        property_name: Atom,
        name: NodeIndex,
        initializer: NodeIndex,
        dot_dot_dot: bool,
    },
    ForInStatement {
        initializer: NodeIndex,
        expression: NodeIndex,
    },
    ForOfStatement {
        initializer: NodeIndex,
        expression: NodeIndex,
    },
    SwitchStatement {
        expression: NodeIndex,
        clauses: Vec<NodeIndex>,
    },
    /// `case expression:`; `expression` is `NONE` for `default:`.
    CaseClause {
        expression: NodeIndex,
    },
    Block {
        statements: Vec<NodeIndex>,
    },
    FunctionLike {
        kind: FunctionKind,
        parameters: Vec<NodeIndex>,
        body: NodeIndex,
    },
    /// A class property. `reference` is a detached `this.name` expression
    /// used to ask for the property's type at the end of a constructor or
    /// static block.
    PropertyDeclaration {
        symbol: SymbolId,
        reference: NodeIndex,
    },
    SourceFile,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: u32,
    pub end: u32,
    pub parent: NodeIndex,
}

/// Arena of nodes addressed by `NodeIndex`.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        NodeArena { nodes: Vec::new() }
    }

    /// Allocate a node spanning `[pos, end)` and adopt its children.
    pub fn alloc(&mut self, kind: NodeKind, pos: u32, end: u32) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        let children = children_of(&kind);
        self.nodes.push(Node {
            kind,
            pos,
            end,
            parent: NodeIndex::NONE,
        });
        for child in children {
            if let Some(node) = self.get_mut(child) {
                node.parent = index;
            }
        }
        index
    }

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            return None;
        }
        self.nodes.get(index.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            return None;
        }
        self.nodes.get_mut(index.0 as usize)
    }

    #[inline]
    pub fn kind(&self, index: NodeIndex) -> Option<&NodeKind> {
        self.get(index).map(|node| &node.kind)
    }

    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        self.get(index).map_or(NodeIndex::NONE, |node| node.parent)
    }

    /// Skip parentheses around an expression.
    pub fn skip_parentheses(&self, mut index: NodeIndex) -> NodeIndex {
        while let Some(NodeKind::Parenthesized { expression }) = self.kind(index) {
            index = *expression;
        }
        index
    }

    /// Whether the node participates in an optional chain (`a?.b.c`).
    pub fn is_optional_chain(&self, index: NodeIndex) -> bool {
        match self.kind(index) {
            Some(
                NodeKind::PropertyAccess {
                    expression,
                    question_dot,
                    ..
                }
                | NodeKind::ElementAccess {
                    expression,
                    question_dot,
                    ..
                },
            ) => *question_dot || self.is_optional_chain(*expression),
            Some(NodeKind::Call {
                callee,
                question_dot,
                ..
            }) => *question_dot || self.is_optional_chain(*callee),
            _ => false,
        }
    }

    /// Whether the node is the `?.` link that starts an optional chain.
    pub fn is_optional_chain_root(&self, index: NodeIndex) -> bool {
        match self.kind(index) {
            Some(
                NodeKind::PropertyAccess { question_dot, .. }
                | NodeKind::ElementAccess { question_dot, .. }
                | NodeKind::Call { question_dot, .. },
            ) => *question_dot,
            _ => false,
        }
    }

    /// The enclosing node of one of the given shapes.
    pub fn find_ancestor(&self, index: NodeIndex, pred: impl Fn(&NodeKind) -> bool) -> NodeIndex {
        let mut current = self.parent(index);
        while let Some(node) = self.get(current) {
            if pred(&node.kind) {
                return current;
            }
            current = node.parent;
        }
        NodeIndex::NONE
    }

    /// The nearest enclosing function-like node or source file.
    pub fn container_of(&self, index: NodeIndex) -> NodeIndex {
        self.find_ancestor(index, |kind| {
            matches!(kind, NodeKind::FunctionLike { .. } | NodeKind::SourceFile)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeIndex(index as u32), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn children_of(kind: &NodeKind) -> Vec<NodeIndex> {
    match kind {
        NodeKind::ArrayLiteral { elements }
        | NodeKind::ObjectBindingPattern { elements }
        | NodeKind::ArrayBindingPattern { elements } => elements.clone(),
        NodeKind::ObjectLiteral { properties } => properties.clone(),
        NodeKind::Block { statements } => statements.clone(),
        NodeKind::PropertyAccess { expression, .. }
        | NodeKind::Parenthesized { expression }
        | NodeKind::NonNull { expression }
        | NodeKind::TypeOf { expression }
        | NodeKind::Delete { expression }
        | NodeKind::SpreadElement { expression }
        | NodeKind::CaseClause { expression } => vec![*expression],
        NodeKind::PropertyAssignment { initializer, .. } => vec![*initializer],
        NodeKind::ShorthandPropertyAssignment { name, default } => vec![*name, *default],
        NodeKind::ElementAccess {
            expression,
            argument,
            ..
        } => vec![*expression, *argument],
        NodeKind::PrefixUnary { operand, .. } => vec![*operand],
        NodeKind::Binary { left, right, .. } => vec![*left, *right],
        NodeKind::Call {
            callee, arguments, ..
        } => {
            let mut children = vec![*callee];
            children.extend(arguments.iter().copied());
            children
        }
        NodeKind::VariableDeclaration {
            name, initializer, ..
        }
        | NodeKind::Parameter { name, initializer }
        | NodeKind::BindingElement {
            name, initializer, ..
        } => vec![*name, *initializer],
        NodeKind::ForInStatement {
            initializer,
            expression,
        }
        | NodeKind::ForOfStatement {
            initializer,
            expression,
        } => vec![*initializer, *expression],
        NodeKind::SwitchStatement {
            expression,
            clauses,
        } => {
            let mut children = vec![*expression];
            children.extend(clauses.iter().copied());
            children
        }
        NodeKind::FunctionLike {
            parameters, body, ..
        } => {
            let mut children = parameters.clone();
            children.push(*body);
            children
        }
        NodeKind::Identifier { .. }
        | NodeKind::PrivateIdentifier { .. }
        | NodeKind::PropertyDeclaration { .. }
        | NodeKind::ThisKeyword
        | NodeKind::SuperKeyword
        | NodeKind::NullKeyword
        | NodeKind::TrueKeyword
        | NodeKind::FalseKeyword
        | NodeKind::StringLiteral { .. }
        | NodeKind::NumericLiteral { .. }
        | NodeKind::BigIntLiteral { .. }
        | NodeKind::SourceFile => Vec::new(),
    }
}
