//! Basic Example - render, update and print a small tree
//!
//! This example demonstrates the full render/commit cycle:
//! - Building elements with `jsx` and `config!`
//! - Mounting them into a terminal container
//! - Re-rendering and inspecting the host operations a commit produced
//!
//! Run with: cargo run --example basic

use spark_fiber::{
    config, jsx, FunctionComponent, PropValue, Reconciler, TerminalContainer, TerminalHost,
};

fn counter() -> FunctionComponent {
    FunctionComponent::new("Counter", |props| {
        let count = props.get("count").cloned().unwrap_or_default();
        jsx("text", &config! { "color" => "yellow" }, vec!["count: ".into(), count]).into()
    })
}

/// Component identity is the `FunctionComponent` handle, so the same one is
/// passed to every render.
fn app(counter: &FunctionComponent, count: i64) -> PropValue {
    jsx(
        "box",
        &config! { "id" => "main", "border" => "single" },
        vec![
            jsx("text", &config! {}, vec!["Hello, spark-fiber!".into()]).into(),
            jsx(counter, &config! { "count" => count }, vec![]).into(),
        ],
    )
    .into()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== spark-fiber Basic Example ===\n");

    let component = counter();
    let mut reconciler = Reconciler::new(TerminalHost::recording(), TerminalContainer::new());

    let summary = reconciler.update_container(app(&component, 0))?;
    println!("mount: {:?}", summary);
    {
        let (host, container) = reconciler.host_and_container();
        host.render(container, &mut std::io::stdout())?;
    }

    reconciler.host_mut().take_ops();
    let summary = reconciler.update_container(app(&component, 1))?;
    println!("\nupdate: {:?}", summary);
    for op in reconciler.host().ops() {
        println!("  {:?}", op);
    }

    let (host, container) = reconciler.host_and_container();
    host.render(container, &mut std::io::stdout())?;
    println!("\n{}", host.markup(container));
    Ok(())
}
