use crate::expr::Expr;
use derive_more::Deref;
use std::{fmt, ptr};

///
/// ExprPath
///
/// Child-index path from a template root to one node.
/// Paths recorded against one template resolve against any template that
/// matches it, because matching templates have aligned child lists.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct ExprPath(Vec<usize>);

impl ExprPath {
    /// Locate `target` (by node identity) beneath `root`.
    ///
    /// A node shared between several positions yields its first position in
    /// child order; parsers track paths while descending instead.
    #[must_use]
    pub fn locate(root: &Expr, target: &Expr) -> Option<Self> {
        let mut steps = Vec::new();

        locate_into(root, target, &mut steps).then_some(Self(steps))
    }

    /// Path to the `index`th child of the node this path names.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);

        Self(steps)
    }

    pub(crate) fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    /// Follow this path from `root`.
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a Expr) -> Option<&'a Expr> {
        let mut current = root;
        for &index in &self.0 {
            let child = current.children().get(index).copied()?;
            current = &**child;
        }

        Some(current)
    }
}

impl fmt::Display for ExprPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for index in &self.0 {
            write!(f, ".{index}")?;
        }

        Ok(())
    }
}

fn locate_into(node: &Expr, target: &Expr, steps: &mut Vec<usize>) -> bool {
    if ptr::eq(node, target) {
        return true;
    }

    for (index, child) in node.children().into_iter().enumerate() {
        steps.push(index);
        if locate_into(child, target, steps) {
            return true;
        }
        steps.pop();
    }

    false
}
