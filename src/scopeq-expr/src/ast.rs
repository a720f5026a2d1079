//! Abstract Syntax Tree (AST) definitions for scopeq predicates
//!
//! This module defines the expression nodes that represent a predicate at
//! every stage: context-lookup form, closed form and resolved form.

use scopeq_shared::{Value, ValueType};
use std::fmt;

/// A named, typed lambda parameter
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: ValueType,
}

impl Parameter {
    /// Create a new parameter
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// What kind of named location a lookup reads from
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Argument of the enclosing delegate (the predicate's own item argument)
    DelegateArgument,
    /// Variable declared in an enclosing scope
    Variable,
    /// Argument declared by the root definition
    Argument,
    /// Property of the root definition
    Property,
    /// Any location the host could not classify
    Unknown(String),
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKind::DelegateArgument => write!(f, "delegate argument"),
            LocationKind::Variable => write!(f, "variable"),
            LocationKind::Argument => write!(f, "argument"),
            LocationKind::Property => write!(f, "property"),
            LocationKind::Unknown(kind) => write!(f, "unknown location '{}'", kind),
        }
    }
}

/// Reference to a named location in the execution context
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LocationRef {
    /// Location name
    pub name: String,
    /// Declared type of the location
    pub ty: ValueType,
    /// Location kind
    pub kind: LocationKind,
}

/// Core expression types
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expr {
    /// Single-parameter lambda (parameter => body)
    Lambda {
        /// The lambda parameter
        parameter: Parameter,
        /// Lambda body
        body: Box<Expr>,
    },

    /// Indirect read of a named location through the execution context
    Lookup(LocationRef),

    /// Reference to a lambda or free parameter
    Parameter(Parameter),

    /// Typed literal value
    Literal {
        /// The value
        value: Value,
        /// Static type of the literal
        ty: ValueType,
    },

    /// Member access (base.field)
    FieldAccess {
        /// Base expression
        base: Box<Expr>,
        /// Field name
        field: String,
    },

    /// Element access (base[index])
    Index {
        /// The indexed expression
        base: Box<Expr>,
        /// The index expression
        index: Box<Expr>,
    },

    /// Binary operation (left op right)
    BinaryOp {
        /// Left operand
        left: Box<Expr>,
        /// Operator
        op: BinaryOperator,
        /// Right operand
        right: Box<Expr>,
    },

    /// Unary operation (op expr)
    UnaryOp {
        /// Operator
        op: UnaryOperator,
        /// Operand
        expr: Box<Expr>,
    },

    /// Method call (target.method(args...))
    MethodCall {
        /// Receiver
        target: Box<Expr>,
        /// Method name
        method: String,
        /// Arguments
        args: Vec<Expr>,
    },

    /// Conditional (if condition then expr else expr)
    If {
        /// Condition expression
        condition: Box<Expr>,
        /// Then branch expression
        then_branch: Box<Expr>,
        /// Else branch expression
        else_branch: Box<Expr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BinaryOperator {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Multiplication (*)
    Mul,
    /// Division (/)
    Div,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than or equal (>=)
    Ge,
    /// Less than or equal (<=)
    Le,
    /// Logical AND (and)
    And,
    /// Logical OR (or)
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UnaryOperator {
    /// Logical NOT (not)
    Not,
    /// Arithmetic negation (-)
    Neg,
}

impl Expr {
    /// `parameter => body`
    pub fn lambda(parameter: Parameter, body: Expr) -> Self {
        Expr::Lambda {
            parameter,
            body: Box::new(body),
        }
    }

    /// Context lookup of a named location
    pub fn lookup(name: impl Into<String>, ty: ValueType, kind: LocationKind) -> Self {
        Expr::Lookup(LocationRef {
            name: name.into(),
            ty,
            kind,
        })
    }

    /// Parameter reference
    pub fn param(parameter: &Parameter) -> Self {
        Expr::Parameter(parameter.clone())
    }

    /// Literal typed by its own value
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let ty = ValueType::of(&value);
        Expr::Literal { value, ty }
    }

    /// Literal with an explicit static type
    pub fn typed_literal(value: Value, ty: ValueType) -> Self {
        Expr::Literal { value, ty }
    }

    /// `self.field`
    pub fn field(self, field: impl Into<String>) -> Self {
        Expr::FieldAccess {
            base: Box::new(self),
            field: field.into(),
        }
    }

    /// `self[index]`
    pub fn index(self, index: Expr) -> Self {
        Expr::Index {
            base: Box::new(self),
            index: Box::new(index),
        }
    }

    /// `self.method(args...)`
    pub fn call(self, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            target: Box::new(self),
            method: method.into(),
            args,
        }
    }

    /// `left op right`
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// `left and right`
    pub fn and(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOperator::And, right)
    }

    /// `left or right`
    pub fn or(left: Expr, right: Expr) -> Self {
        Self::binary(left, BinaryOperator::Or, right)
    }

    /// `not expr`
    pub fn not(expr: Expr) -> Self {
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: Box::new(expr),
        }
    }

    /// `if condition then a else b`
    pub fn if_then_else(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lambda { parameter, body } => write!(f, "{} => {}", parameter.name, body),
            Expr::Lookup(location) => write!(f, "${{{}}}", location.name),
            Expr::Parameter(parameter) => write!(f, "{}", parameter.name),
            Expr::Literal { value, .. } => write!(f, "{}", value),
            Expr::FieldAccess { base, field } => write!(f, "{}.{}", base, field),
            Expr::Index { base, index } => write!(f, "{}[{}]", base, index),
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::UnaryOp { op, expr } => write!(f, "{} {}", op, expr),
            Expr::MethodCall {
                target,
                method,
                args,
            } => {
                write!(f, "{}.{}(", target, method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(
                    f,
                    "if {} then {} else {} end",
                    condition, then_branch, else_branch
                )
            }
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lt => "<",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Le => "<=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "not"),
            UnaryOperator::Neg => write!(f, "-"),
        }
    }
}
