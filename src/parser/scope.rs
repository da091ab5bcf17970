//! Scope resolution over the AST
//!
//! There is no separate symbol table: the tree itself is the scope chain.
//! A lookup starts at the node being built and walks its parent links up to
//! the module, scanning each level's declarations (and the parameters of a
//! function) for the name. The nearest declaration wins, which is how a local
//! shadows a global of the same name.

use crate::parser::ast::{Ast, NodeId, NodeKind};

impl Ast {
    /// Finds the declaration visible from `from` under `name`
    pub fn lookup(&self, from: NodeId, name: &str) -> Option<NodeId> {
        let mut current = Some(from);

        while let Some(scope) = current {
            if let Some(found) = self.find_declaration(scope, name) {
                return Some(found);
            }
            current = self.parent(scope);
        }

        None
    }

    fn find_declaration(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        for &child in self.children(scope) {
            let node = self.node(child);
            if node.kind.is_declaration() && node.name() == name {
                return Some(child);
            }
            if node.kind == NodeKind::FuncParams {
                let param = self
                    .children(child)
                    .iter()
                    .copied()
                    .find(|&p| self.node(p).name() == name);
                if param.is_some() {
                    return param;
                }
            }
        }
        None
    }

    /// Nearest ancestor (or `from` itself) of the given kind
    pub fn enclosing(&self, from: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.kind(id) == kind {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Number of loops enclosing `from` within its function
    pub fn enclosing_loops(&self, from: NodeId) -> usize {
        let mut count = 0;
        let mut current = Some(from);
        while let Some(id) = current {
            match self.kind(id) {
                NodeKind::Function => break,
                kind if kind.is_loop() => count += 1,
                _ => {}
            }
            current = self.parent(id);
        }
        count
    }
}
