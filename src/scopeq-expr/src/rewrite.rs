//! Generic traversal helpers shared by tree transformers

use crate::ast::{Expr, LocationRef};

impl Expr {
    /// Rebuild this node with every direct child replaced by `f(child)`.
    ///
    /// Leaves are returned unchanged. A lambda's parameter is kept as is;
    /// only its body is passed to `f`.
    pub fn try_map_children<E, F>(self, mut f: F) -> Result<Expr, E>
    where
        F: FnMut(Expr) -> Result<Expr, E>,
    {
        Ok(match self {
            Expr::Lookup(_) | Expr::Parameter(_) | Expr::Literal { .. } => self,
            Expr::Lambda { parameter, body } => Expr::Lambda {
                parameter,
                body: Box::new(f(*body)?),
            },
            Expr::FieldAccess { base, field } => Expr::FieldAccess {
                base: Box::new(f(*base)?),
                field,
            },
            Expr::Index { base, index } => Expr::Index {
                base: Box::new(f(*base)?),
                index: Box::new(f(*index)?),
            },
            Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
                left: Box::new(f(*left)?),
                op,
                right: Box::new(f(*right)?),
            },
            Expr::UnaryOp { op, expr } => Expr::UnaryOp {
                op,
                expr: Box::new(f(*expr)?),
            },
            Expr::MethodCall {
                target,
                method,
                args,
            } => Expr::MethodCall {
                target: Box::new(f(*target)?),
                method,
                args: args.into_iter().map(&mut f).collect::<Result<_, _>>()?,
            },
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => Expr::If {
                condition: Box::new(f(*condition)?),
                then_branch: Box::new(f(*then_branch)?),
                else_branch: Box::new(f(*else_branch)?),
            },
        })
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Lookup(_) | Expr::Parameter(_) | Expr::Literal { .. } => Vec::new(),
            Expr::Lambda { body, .. } => vec![&**body],
            Expr::FieldAccess { base, .. } => vec![&**base],
            Expr::UnaryOp { expr, .. } => vec![&**expr],
            Expr::Index { base, index } => vec![&**base, &**index],
            Expr::BinaryOp { left, right, .. } => vec![&**left, &**right],
            Expr::MethodCall { target, args, .. } => {
                std::iter::once(&**target).chain(args.iter()).collect()
            }
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => vec![&**condition, &**then_branch, &**else_branch],
        }
    }

    /// Pre-order walk over this node and all descendants
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// All context lookups in pre-order
    pub fn lookups(&self) -> Vec<&LocationRef> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if let Expr::Lookup(location) = node {
                found.push(location);
            }
        });
        found
    }

    /// True when no lookup node remains anywhere in the tree
    pub fn is_lookup_free(&self) -> bool {
        self.lookups().is_empty()
    }

    /// Height of the tree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expr::depth)
            .max()
            .unwrap_or(0)
    }
}
