use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// A qualified markup name.
///
/// Two names are equal when their local names and namespace URIs are equal.
/// The prefix is presentation only: `<a:item xmlns:a="urn:x">` and
/// `<b:item xmlns:b="urn:x">` name the same element.
///
/// A name with an empty local name denotes "no name", which is what
/// [`Name::default()`] produces.
#[derive(Clone, Default, Debug)]
#[non_exhaustive]
pub struct Name {
    /// The local part of the name.
    pub local_name: String,
    /// The prefix the name was written with, or the empty string.
    pub prefix: String,
    /// The namespace URI the prefix resolved to, or the empty string.
    pub namespace: String,
    /// Does the name belong to an attribute?
    pub is_attribute: bool,
}

impl Name {
    /// Create an element name without prefix or namespace.
    pub fn new(local_name: &str) -> Self {
        Name {
            local_name: String::from(local_name),
            ..Default::default()
        }
    }

    /// Create an element name in a namespace.
    pub fn with_namespace(local_name: &str, prefix: &str, namespace: &str) -> Self {
        Name {
            local_name: String::from(local_name),
            prefix: String::from(prefix),
            namespace: String::from(namespace),
            is_attribute: false,
        }
    }

    /// Create an attribute name without prefix or namespace.
    pub fn attribute(local_name: &str) -> Self {
        Name {
            local_name: String::from(local_name),
            is_attribute: true,
            ..Default::default()
        }
    }

    /// Create an attribute name in a namespace.
    pub fn attribute_with_namespace(local_name: &str, prefix: &str, namespace: &str) -> Self {
        Name {
            is_attribute: true,
            ..Name::with_namespace(local_name, prefix, namespace)
        }
    }

    /// Is this the "no name" placeholder?
    pub fn is_empty(&self) -> bool {
        self.local_name.is_empty()
    }

    /// Split a `prefix:local` qualified name at its first colon.
    ///
    /// Names without a colon, or with a colon at either end, have no prefix.
    pub fn split_qualified(qname: &str) -> (&str, &str) {
        match qname.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => (prefix, local),
            _ => ("", qname),
        }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.local_name == other.local_name && self.namespace == other.namespace
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local_name.hash(state);
        self.namespace.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Names order by namespace URI first, then by local name, which is the
/// attribute order of canonical form.
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace
            .cmp(&other.namespace)
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{}:{}", self.prefix, self.local_name)
        }
    }
}
