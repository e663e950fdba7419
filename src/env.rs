use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

struct EnvNode {
    parent: Option<usize>,
    bindings: HashMap<Rc<str>, Value>,
}

/// The environment tree, represented as an append-only arena indexed by
/// integer id. Closures and `EnvMarker`s carry an id rather than a direct
/// reference, which keeps the graph acyclic (nodes only point at their
/// parent) and makes environment identity a plain integer comparison.
pub struct EnvArena {
    nodes: Vec<EnvNode>,
}

impl EnvArena {
    /// Creates the arena with environment 0, the primitive environment.
    pub fn new() -> Self {
        EnvArena {
            nodes: vec![EnvNode {
                parent: None,
                bindings: HashMap::new(),
            }],
        }
    }

    /// Allocates a fresh child environment and returns its id.
    pub fn child(&mut self, parent: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(EnvNode {
            parent: Some(parent),
            bindings: HashMap::new(),
        });
        id
    }

    pub fn define(&mut self, env: usize, name: Rc<str>, value: Value) {
        self.nodes[env].bindings.insert(name, value);
    }

    /// Looks up `name` starting at `env` and walking toward environment 0.
    pub fn lookup(&self, env: usize, name: &str) -> Option<&Value> {
        let mut current = Some(env);
        while let Some(id) = current {
            if let Some(value) = self.nodes[id].bindings.get(name) {
                return Some(value);
            }
            current = self.nodes[id].parent;
        }
        None
    }

    /// True iff `ancestor`'s parent chain from `env` reaches it in finitely
    /// many steps (always true for well-formed arenas; used by tests).
    pub fn is_ancestor(&self, env: usize, ancestor: usize) -> bool {
        let mut current = Some(env);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id].parent;
        }
        false
    }
}

impl Default for EnvArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_toward_root() {
        let mut arena = EnvArena::new();
        arena.define(0, Rc::from("x"), Value::Int(1));
        let child = arena.child(0);
        arena.define(child, Rc::from("y"), Value::Int(2));
        assert_eq!(arena.lookup(child, "x"), Some(&Value::Int(1)));
        assert_eq!(arena.lookup(child, "y"), Some(&Value::Int(2)));
        assert_eq!(arena.lookup(0, "y"), None);
    }

    #[test]
    fn every_environment_reaches_zero() {
        let mut arena = EnvArena::new();
        let a = arena.child(0);
        let b = arena.child(a);
        let c = arena.child(b);
        assert!(arena.is_ancestor(c, 0));
    }

    #[test]
    fn child_shadows_parent_binding() {
        let mut arena = EnvArena::new();
        arena.define(0, Rc::from("x"), Value::Int(1));
        let child = arena.child(0);
        arena.define(child, Rc::from("x"), Value::Int(2));
        assert_eq!(arena.lookup(child, "x"), Some(&Value::Int(2)));
        assert_eq!(arena.lookup(0, "x"), Some(&Value::Int(1)));
    }
}
