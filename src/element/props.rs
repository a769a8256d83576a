//! Props and configs.
//!
//! `Props` is the ordered name → value map stored on elements and fibers.
//! `Config` is what the authoring surface hands to `jsx`: own properties in
//! insertion order plus an optional shared prototype whose properties are
//! visible to lookups but never copied into props.

use std::rc::Rc;

use super::PropValue;

/// Name of the prop that carries an element's children.
pub const CHILDREN: &str = "children";

// =============================================================================
// Props
// =============================================================================

/// Ordered prop map.
///
/// Insertion order is preserved for iteration. Equality ignores order: two
/// maps are equal when they hold the same names with equal values.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: Vec<(Rc<str>, PropValue)>,
}

impl Props {
    /// Create an empty prop map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of props.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no props.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a prop.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Whether a prop with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace a prop. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder form of [`Props::insert`].
    pub fn with(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Remove a prop, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        let pos = self.entries.iter().position(|(n, _)| &**n == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(n, v)| (&**n, v))
    }

    /// Prop names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| &**n)
    }

    /// The `children` prop.
    pub fn children(&self) -> Option<&PropValue> {
        self.get(CHILDREN)
    }

    /// Props that differ between `old` and `new`, ignoring `children`.
    ///
    /// Removed props are reported with `None`. Order: changed or added props
    /// in `new`'s order, then removals in `old`'s order.
    pub fn diff(old: &Props, new: &Props) -> Vec<PropChange> {
        let mut changes = Vec::new();
        for (name, value) in new.iter() {
            if name == CHILDREN {
                continue;
            }
            if old.get(name) != Some(value) {
                changes.push(PropChange {
                    name: Rc::from(name),
                    value: Some(value.clone()),
                });
            }
        }
        for name in old.names() {
            if name != CHILDREN && !new.contains(name) {
                changes.push(PropChange {
                    name: Rc::from(name),
                    value: None,
                });
            }
        }
        changes
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<N: Into<Rc<str>>, V: Into<PropValue>> FromIterator<(N, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (name, value) in iter {
            props.insert(name, value);
        }
        props
    }
}

/// One entry of a prop diff.
#[derive(Debug, Clone, PartialEq)]
pub struct PropChange {
    pub name: Rc<str>,
    /// New value, or `None` when the prop was removed.
    pub value: Option<PropValue>,
}

// =============================================================================
// Config
// =============================================================================

/// Input object of the authoring surface.
///
/// Own properties keep insertion order. The prototype chain is shared and
/// read-only; its properties are visible through [`Config::lookup`] and
/// [`Config::enumerate`] but are not own properties.
#[derive(Debug, Clone, Default)]
pub struct Config {
    own: Vec<(Rc<str>, PropValue)>,
    prototype: Option<Rc<Config>>,
}

impl Config {
    /// Create an empty config with no prototype.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config inheriting from `prototype`.
    pub fn with_prototype(prototype: Rc<Config>) -> Self {
        Self {
            own: Vec::new(),
            prototype: Some(prototype),
        }
    }

    /// Set an own property, keeping its first position on overwrite.
    pub fn set(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        let value = value.into();
        match self.own.iter_mut().find(|(n, _)| &**n == name) {
            Some(entry) => entry.1 = value,
            None => self.own.push((Rc::from(name), value)),
        }
        self
    }

    /// Whether `name` is an own property.
    pub fn has_own(&self, name: &str) -> bool {
        self.own.iter().any(|(n, _)| &**n == name)
    }

    /// Property lookup through the prototype chain.
    pub fn lookup(&self, name: &str) -> Option<&PropValue> {
        match self.own.iter().find(|(n, _)| &**n == name) {
            Some((_, value)) => Some(value),
            None => self.prototype.as_deref().and_then(|p| p.lookup(name)),
        }
    }

    /// Enumerate own properties in insertion order, then inherited ones not
    /// shadowed by a nearer object. The flag is `true` for own properties.
    pub fn enumerate(&self) -> Vec<(&str, &PropValue, bool)> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        let mut level = Some(self);
        let mut own = true;
        while let Some(config) = level {
            for (name, value) in &config.own {
                if !seen.contains(&&**name) {
                    seen.push(name);
                    out.push((&**name, value, own));
                }
            }
            level = config.prototype.as_deref();
            own = false;
        }
        out
    }
}

/// Build a [`Config`] from literal pairs.
///
/// ```ignore
/// let config = config! { "key" => "row-1", "title" => "Hello", "count" => 3 };
/// ```
#[macro_export]
macro_rules! config {
    () => {
        $crate::element::Config::new()
    };
    ($($name:literal => $value:expr),+ $(,)?) => {
        $crate::element::Config::new()$(.set($name, $value))+
    };
}
