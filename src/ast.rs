//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes are plain immutable records.  The only mutable slot is the
//! resolution depth carried by [`VarRef`], written once by the resolver
//! before execution starts.

use std::cell::Cell;
use std::rc::Rc;

use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree.  The
/// parser copies the value out of the token so the AST does not depend on
/// the scanner's payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// A name occurrence whose binding the resolver computes ahead of time.
///
/// `depth` is the hop count: how many enclosing environments separate the
/// use from its declaring scope.  `None` means the name is global and is
/// looked up by name at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: Token,
    depth: Cell<Option<usize>>,
}

impl VarRef {
    pub fn new(name: Token) -> Self {
        Self {
            name,
            depth: Cell::new(None),
        }
    }

    /// Resolution depth recorded by the resolver, if local.
    #[inline]
    pub fn depth(&self) -> Option<usize> {
        self.depth.get()
    }

    #[inline]
    pub(crate) fn resolve_at(&self, depth: usize) {
        self.depth.set(Some(depth));
    }
}

/// Every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access.
    Variable(VarRef),

    /// Assignment expression: `identifier "=" expression`
    Assign { target: VarRef, value: Box<Expr> },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This(VarRef),

    /// `super.method` inside a subclass method.
    Super { keyword: VarRef, method: Token },
}

/// A `fun` declaration or a class method.  Shared between the AST and every
/// function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// Every kind of *statement*.  A program is a sequence of these nodes
/// returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,
        superclass: Option<VarRef>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
