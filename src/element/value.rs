//! Prop values, element types and function components.
//!
//! Values are cheap to clone: strings are `Rc<str>`, elements and callbacks
//! are reference counted. Closures compare by identity.

use std::fmt;
use std::rc::Rc;

use super::{Element, Props};

// =============================================================================
// Callback Types
// =============================================================================

/// Event callback stored as a prop value.
///
/// Using `Rc<dyn Fn>` so props can be cloned into fibers without ownership
/// issues. Two callbacks are equal only if they are the same allocation.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&PropValue)>);

impl Callback {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&PropValue) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self, arg: &PropValue) {
        (self.0)(arg)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

// =============================================================================
// Prop Value
// =============================================================================

/// A single prop value, child, key source or ref.
///
/// `Undefined` and `Null` are distinct: an undefined `key` or `ref` in a
/// config is treated as absent, a null one is not.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Element(Element),
    List(Vec<PropValue>),
    Callback(Callback),
}

impl PropValue {
    /// Whether this value is `Undefined`.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Borrow the string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the element, if this is an element value.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow the sequence, if this is a list value.
    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Coerce to a key string the way string concatenation would.
    ///
    /// Numbers print without a trailing `.0`, lists join their items with
    /// commas, elements and callbacks become `[object Object]`.
    pub fn to_key_string(&self) -> Rc<str> {
        match self {
            Self::Str(s) => s.clone(),
            other => Rc::from(other.coerce_string()),
        }
    }

    fn coerce_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Str(s) => s.to_string(),
            Self::Element(_) | Self::Callback(_) => "[object Object]".to_string(),
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    Self::Undefined | Self::Null => String::new(),
                    other => other.coerce_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Text content if this value renders as a text node.
    pub fn as_text(&self) -> Option<Rc<str>> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(_) | Self::Float(_) => Some(self.to_key_string()),
            _ => None,
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if f == 0.0 {
        // Negative zero prints unsigned.
        "0".to_string()
    } else if f.abs() >= 1e21 || f.abs() < 1e-6 {
        // Exponent form always carries its sign: `1e+21`, `1e-7`.
        let exp = format!("{:e}", f);
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{}e+{}", mantissa, power)
            }
            _ => exp,
        }
    } else {
        // f64's Display already drops a trailing `.0`
        f.to_string()
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(e) => write!(f, "<{}>", e.element_type()),
            Self::Callback(_) => f.write_str("fn"),
            other => f.write_str(&other.coerce_string()),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Element> for PropValue {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(value: Vec<PropValue>) -> Self {
        Self::List(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        Self::Callback(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// =============================================================================
// Function Components
// =============================================================================

/// Render closure of a function component.
pub type RenderFn = Rc<dyn Fn(&Props) -> PropValue>;

/// A named function component.
///
/// Identity is the closure allocation: two clones of one component are the
/// same type, two components built from identical closures are not.
#[derive(Clone)]
pub struct FunctionComponent {
    name: Rc<str>,
    render: RenderFn,
}

impl FunctionComponent {
    /// Create a component from a render closure.
    pub fn new(name: &str, render: impl Fn(&Props) -> PropValue + 'static) -> Self {
        Self {
            name: Rc::from(name),
            render: Rc::new(render),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the component with `props`.
    pub fn render(&self, props: &Props) -> PropValue {
        (self.render)(props)
    }
}

impl PartialEq for FunctionComponent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionComponent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Element Type
// =============================================================================

/// What an element describes: a host tag or a function component.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Host(Rc<str>),
    Function(FunctionComponent),
}

impl ElementType {
    /// The host tag, if this is a host type.
    pub fn host_tag(&self) -> Option<&str> {
        match self {
            Self::Host(tag) => Some(tag),
            Self::Function(_) => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => f.write_str(tag),
            Self::Function(component) => f.write_str(component.name()),
        }
    }
}

impl From<&str> for ElementType {
    fn from(value: &str) -> Self {
        Self::Host(Rc::from(value))
    }
}

impl From<FunctionComponent> for ElementType {
    fn from(value: FunctionComponent) -> Self {
        Self::Function(value)
    }
}

impl From<&FunctionComponent> for ElementType {
    fn from(value: &FunctionComponent) -> Self {
        Self::Function(value.clone())
    }
}
