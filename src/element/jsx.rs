//! Element construction: `create_element`, `jsx` and `jsx_dev`.

use std::fmt;
use std::rc::Rc;

use super::{CHILDREN, Config, ElementType, PropValue, Props};

/// Kind marker carried by every element built through this module.
pub const ELEMENT_MARKER: u32 = 0xeac7;

/// Diagnostic mark stamped on elements.
pub const DEBUG_MARK: &str = "spark-fiber";

// =============================================================================
// Element
// =============================================================================

struct ElementData {
    marker: u32,
    element_type: ElementType,
    key: Option<Rc<str>>,
    ref_value: Option<PropValue>,
    props: Props,
    debug_mark: &'static str,
}

/// Immutable description of one UI node.
///
/// Cloning shares the same data. Equality is structural, with a fast path
/// for clones of the same element.
#[derive(Clone)]
pub struct Element(Rc<ElementData>);

impl Element {
    /// The kind marker. Equal to [`ELEMENT_MARKER`] for valid elements.
    pub fn marker(&self) -> u32 {
        self.0.marker
    }

    /// Whether this element carries the kind marker.
    pub fn is_valid(&self) -> bool {
        self.0.marker == ELEMENT_MARKER
    }

    pub fn element_type(&self) -> &ElementType {
        &self.0.element_type
    }

    pub fn key(&self) -> Option<&str> {
        self.0.key.as_deref()
    }

    pub(crate) fn key_rc(&self) -> Option<Rc<str>> {
        self.0.key.clone()
    }

    /// The opaque ref slot supplied by the author.
    pub fn ref_value(&self) -> Option<&PropValue> {
        self.0.ref_value.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub fn debug_mark(&self) -> &str {
        self.0.debug_mark
    }

    /// Whether both handles point at the same element.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.marker == other.0.marker
                && self.0.element_type == other.0.element_type
                && self.0.key == other.0.key
                && self.0.ref_value == other.0.ref_value
                && self.0.props == other.0.props)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type", &self.0.element_type)
            .field("key", &self.0.key)
            .field("ref", &self.0.ref_value)
            .field("props", &self.0.props)
            .finish()
    }
}

/// Whether `value` is an element produced by this module.
pub fn is_valid_element(value: &PropValue) -> bool {
    value.as_element().is_some_and(Element::is_valid)
}

// =============================================================================
// Construction
// =============================================================================

/// Build an element from already separated parts.
pub fn create_element(
    element_type: impl Into<ElementType>,
    key: Option<Rc<str>>,
    ref_value: Option<PropValue>,
    props: Props,
) -> Element {
    Element(Rc::new(ElementData {
        marker: ELEMENT_MARKER,
        element_type: element_type.into(),
        key,
        ref_value,
        props,
        debug_mark: DEBUG_MARK,
    }))
}

/// Build an element from a config and a list of children.
///
/// `key` and `ref` are read through the config's prototype chain and never
/// land in props. Every other own property is copied in order; inherited
/// properties are skipped. One child is stored directly under `children`,
/// several as a list, none leaves `children` unset. Never fails.
pub fn jsx(
    element_type: impl Into<ElementType>,
    config: &Config,
    children: Vec<PropValue>,
) -> Element {
    let (key, ref_value, mut props) = split_config(config);

    let mut children = children;
    match children.len() {
        0 => {}
        1 => props.insert(CHILDREN, children.remove(0)),
        _ => props.insert(CHILDREN, PropValue::List(children)),
    }

    create_element(element_type, key, ref_value, props)
}

/// Single-argument variant of [`jsx`]: children, if any, come from the
/// config's own `children` property.
pub fn jsx_dev(element_type: impl Into<ElementType>, config: &Config) -> Element {
    let (key, ref_value, props) = split_config(config);
    create_element(element_type, key, ref_value, props)
}

fn split_config(config: &Config) -> (Option<Rc<str>>, Option<PropValue>, Props) {
    let mut key = None;
    let mut ref_value = None;
    let mut props = Props::new();

    for (name, value, own) in config.enumerate() {
        match name {
            "key" => {
                if !value.is_undefined() {
                    key = Some(value.to_key_string());
                }
            }
            "ref" => {
                if !value.is_undefined() {
                    ref_value = Some(value.clone());
                }
            }
            _ if own => props.insert(name, value.clone()),
            _ => {}
        }
    }

    (key, ref_value, props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::element::{Callback, FunctionComponent};

    #[test]
    fn test_jsx_extracts_key_ref_and_children() {
        let r = PropValue::Callback(Callback::new(|_| {}));
        let child_a = jsx("span", &config! {}, vec!["a".into()]);
        let child_b = jsx("span", &config! {}, vec!["b".into()]);

        let config = config! { "key" => "k", "ref" => r.clone(), "a" => 1 };
        let element = jsx(
            "div",
            &config,
            vec![child_a.clone().into(), child_b.clone().into()],
        );

        assert_eq!(element.key(), Some("k"));
        assert_eq!(element.ref_value(), Some(&r));
        assert_eq!(element.props().get("a"), Some(&PropValue::Int(1)));
        assert_eq!(
            element.props().children(),
            Some(&PropValue::List(vec![child_a.into(), child_b.into()]))
        );
        assert!(!element.props().contains("key"));
        assert!(!element.props().contains("ref"));
    }

    #[test]
    fn test_jsx_single_child_is_not_wrapped() {
        let element = jsx("p", &config! {}, vec!["only".into()]);
        assert_eq!(element.props().children(), Some(&PropValue::from("only")));
    }

    #[test]
    fn test_jsx_without_children_leaves_children_unset() {
        let element = jsx("br", &config! { "a" => 1 }, vec![]);
        assert!(element.props().children().is_none());
        assert_eq!(element.props().len(), 1);
    }

    #[test]
    fn test_jsx_skips_inherited_properties() {
        let proto = Rc::new(config! { "leaked" => "proto" });
        let config = Config::with_prototype(proto).set("own", 1);

        let element = jsx("div", &config, vec![]);
        assert!(!element.props().contains("leaked"));
        assert_eq!(element.props().get("own"), Some(&PropValue::Int(1)));
    }

    #[test]
    fn test_jsx_reads_key_through_prototype() {
        let proto = Rc::new(config! { "key" => 5 });
        let element = jsx("div", &Config::with_prototype(proto), vec![]);
        assert_eq!(element.key(), Some("5"));
    }

    #[test]
    fn test_jsx_undefined_key_and_ref_are_absent() {
        let config = config! { "key" => PropValue::Undefined, "ref" => PropValue::Undefined };
        let element = jsx("div", &config, vec![]);
        assert_eq!(element.key(), None);
        assert_eq!(element.ref_value(), None);
        assert!(element.props().is_empty());
    }

    #[test]
    fn test_jsx_key_coercion() {
        assert_eq!(jsx("li", &config! { "key" => 3 }, vec![]).key(), Some("3"));
        assert_eq!(jsx("li", &config! { "key" => PropValue::Null }, vec![]).key(), Some("null"));
        assert_eq!(jsx("li", &config! { "key" => false }, vec![]).key(), Some("false"));
    }

    #[test]
    fn test_jsx_preserves_insertion_order() {
        let element = jsx("div", &config! { "z" => 1, "a" => 2, "m" => 3 }, vec![]);
        let names: Vec<&str> = element.props().names().collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_jsx_dev_takes_children_from_config() {
        let element = jsx_dev("div", &config! { "key" => "d", "children" => "text" });
        assert_eq!(element.key(), Some("d"));
        assert_eq!(element.props().children(), Some(&PropValue::from("text")));
    }

    #[test]
    fn test_elements_carry_marker() {
        let element = jsx("div", &config! {}, vec![]);
        assert_eq!(element.marker(), ELEMENT_MARKER);
        assert!(element.is_valid());
        assert_eq!(element.debug_mark(), DEBUG_MARK);
        assert!(is_valid_element(&element.into()));
        assert!(!is_valid_element(&PropValue::from("div")));
    }

    #[test]
    fn test_function_component_element() {
        let app = FunctionComponent::new("App", |_| PropValue::Null);
        let element = jsx(&app, &config! { "title" => "x" }, vec![]);
        assert_eq!(element.element_type(), &ElementType::Function(app));
        assert_eq!(element.props().get("title"), Some(&PropValue::from("x")));
    }
}
