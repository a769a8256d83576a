//! Element Model - immutable descriptions of the desired UI.
//!
//! Elements are what the authoring surface produces and the only input the
//! reconciler accepts. They carry no behavior:
//!
//! ```text
//! jsx("div", config! { "key" => "a", "title" => "hi" }, vec!["text".into()])
//!   → Element { type: div, key: "a", ref: None, props: { title, children } }
//! ```
//!
//! An element is shared behind an `Rc` and never mutated after construction,
//! so fibers can hold on to its props without copying.

mod jsx;
mod props;
mod value;

pub use jsx::*;
pub use props::*;
pub use value::*;
