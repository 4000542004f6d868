//! Namespace scopes.
//!
//! A [`ScopeChain`] is a stack of [`Scope`]s, innermost last. Each scope
//! holds the prefix bindings declared by one open element. Lookups walk from
//! the innermost scope outwards, so inner declarations shadow outer ones.

use crate::{Name, XMLNS_NAMESPACE, XML_NAMESPACE};

/// The namespace bindings introduced by one element.
#[derive(Clone, Default, Debug, PartialEq)]
#[non_exhaustive]
pub struct Scope {
    /// The resolved name of the element owning the scope.
    pub tag_name: Name,
    /// Prefix to namespace URI, in declaration order. Each prefix appears at
    /// most once. The empty prefix is the default namespace.
    bindings: Vec<(String, String)>,
}

impl Scope {
    /// Create an empty scope for `tag_name`.
    pub fn new(tag_name: Name) -> Self {
        Scope {
            tag_name,
            bindings: Vec::new(),
        }
    }

    /// Bind `prefix` to `namespace` in this scope.
    ///
    /// An existing binding for `prefix` is never replaced; returns `false` in
    /// that case.
    pub fn bind(&mut self, prefix: &str, namespace: &str) -> bool {
        if self.get(prefix).is_some() {
            return false;
        }
        self.bindings
            .push((String::from(prefix), String::from(namespace)));
        true
    }

    /// The namespace `prefix` is bound to in this scope.
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    /// Iterate the bindings of this scope in declaration order.
    pub fn bindings(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> + '_ {
        self.bindings
            .iter()
            .map(|(prefix, ns)| (prefix.as_str(), ns.as_str()))
    }

    /// Number of bindings in this scope.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Does this scope declare nothing?
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The stack of currently open scopes.
///
/// A chain is owned by exactly one tokenize or format run. `xml` and `xmlns`
/// are bound implicitly and cannot be redeclared.
#[derive(Clone, Default, Debug)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
    /// Counter for synthesized prefixes.
    last_prefix_id: usize,
}

impl ScopeChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all scopes and reset prefix synthesis.
    pub fn clear(&mut self) {
        self.scopes.clear();
        self.last_prefix_id = 0;
    }

    /// Enter a scope.
    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    /// Leave the innermost scope.
    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    /// The innermost scope.
    pub fn peek(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    /// The innermost scope, mutably.
    pub fn peek_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Is no scope open?
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Iterate the scopes from outermost to innermost.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Scope> + '_ {
        self.scopes.iter()
    }

    /// Distance from the top of the nearest scope owned by `tag_name`:
    /// `Some(0)` for the innermost scope.
    pub fn find(&self, tag_name: &Name) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .position(|scope| scope.tag_name == *tag_name)
    }

    /// Is `prefix` declared by any open scope?
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.get_namespace(prefix).is_some()
    }

    /// Is `namespace` bound to some prefix by any open scope?
    pub fn contains_namespace(&self, namespace: &str) -> bool {
        namespace == XML_NAMESPACE
            || self
                .scopes
                .iter()
                .any(|scope| scope.bindings().any(|(_, ns)| ns == namespace))
    }

    /// The namespace `prefix` resolves to, nearest scope first.
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "xml" => return Some(XML_NAMESPACE),
            "xmlns" => return Some(XMLNS_NAMESPACE),
            _ => {}
        }
        self.scopes.iter().rev().find_map(|scope| scope.get(prefix))
    }

    /// The nearest prefix currently resolving to `namespace`.
    ///
    /// A prefix counts only while it is not shadowed by an inner declaration.
    /// When `exact_only` is false and no prefix is found, a fresh unused
    /// prefix is synthesized; the caller must bind it.
    pub fn get_prefix(&mut self, namespace: &str, exact_only: bool) -> Option<String> {
        if namespace == XML_NAMESPACE {
            return Some(String::from("xml"));
        }
        let found = self.scopes.iter().rev().find_map(|scope| {
            scope
                .bindings()
                .rev()
                .find(|(prefix, ns)| *ns == namespace && self.get_namespace(prefix) == Some(*ns))
                .map(|(prefix, _)| String::from(prefix))
        });
        match found {
            Some(prefix) => Some(prefix),
            None if exact_only => None,
            None => Some(self.next_prefix()),
        }
    }

    /// Return a prefix usable for `namespace`, preferring `desired`.
    ///
    /// `desired` is returned when it already resolves to `namespace`, or when
    /// no open scope declares it. Otherwise a fresh prefix is synthesized. An
    /// existing binding is never modified; the caller binds the returned
    /// prefix if [`ScopeChain::get_namespace`] does not resolve it yet.
    pub fn ensure_prefix(&mut self, desired: &str, namespace: &str) -> String {
        match self.get_namespace(desired) {
            Some(ns) if ns != namespace => self.next_prefix(),
            _ => String::from(desired),
        }
    }

    /// Synthesize a prefix no open scope declares.
    pub(crate) fn next_prefix(&mut self) -> String {
        loop {
            self.last_prefix_id += 1;
            let prefix = format!("q{}", self.last_prefix_id);
            if !self.contains_prefix(&prefix) {
                return prefix;
            }
        }
    }
}
