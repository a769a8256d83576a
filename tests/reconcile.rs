//! End-to-end reconciliation through the terminal host.
//!
//! Every test drives full render/commit cycles and inspects the host
//! operations and the resulting host tree.
//!
//! Run with: cargo test --test reconcile

use std::collections::HashSet;

use spark_fiber::{
    config, jsx, Element, FiberId, FunctionComponent, HostOp, NodeId, PropValue, Reconciler,
    ReconcileError, ReconcilerConfig, RenderStatus, TerminalContainer, TerminalHost, Flags,
    WorkTag,
};

// =============================================================================
// HELPERS
// =============================================================================

fn reconciler() -> Reconciler<TerminalHost> {
    Reconciler::new(TerminalHost::recording(), TerminalContainer::new())
}

fn markup(reconciler: &Reconciler<TerminalHost>) -> String {
    let (host, container) = reconciler.host_and_container();
    host.markup(container)
}

fn two_texts(first: &str, second: &str) -> Element {
    jsx("div", &config! {}, vec![first.into(), second.into()])
}

fn current_ids(reconciler: &Reconciler<TerminalHost>) -> HashSet<FiberId> {
    reconciler
        .tree()
        .descendants(reconciler.current_root())
        .into_iter()
        .collect()
}

// =============================================================================
// MOUNT
// =============================================================================

#[test]
fn test_first_render_builds_div_with_two_texts() {
    let mut reconciler = reconciler();
    reconciler.render(two_texts("a", "b")).unwrap();
    reconciler.work_until_complete().unwrap();

    // Before commit: one host component holding two placed text fibers.
    let wip = reconciler.work_in_progress_root().unwrap();
    let tree = reconciler.tree();
    let div = tree.get(wip).unwrap().child.unwrap();
    let div_fiber = tree.get(div).unwrap();
    assert!(div_fiber.is(WorkTag::HostComponent));
    assert!(div_fiber.flags.contains(Flags::PLACEMENT));
    let texts: Vec<FiberId> = tree.children(div).collect();
    assert_eq!(texts.len(), 2);
    for id in &texts {
        let fiber = tree.get(*id).unwrap();
        assert!(fiber.is(WorkTag::HostText));
        assert!(fiber.flags.contains(Flags::PLACEMENT));
    }

    // The div instance was assembled off-screen with both text instances.
    let text_nodes: Vec<NodeId> = texts
        .iter()
        .map(|id| tree.get(*id).unwrap().state_node.unwrap())
        .collect();
    let div_node = div_fiber.state_node.unwrap();
    assert_eq!(reconciler.host().node(div_node).unwrap().children, text_nodes);
    assert!(tree.get(wip).unwrap().subtree_flags.contains(Flags::PLACEMENT));
    assert!(markup(&reconciler).is_empty());

    let summary = reconciler.commit().unwrap();
    assert_eq!(summary.placements, 1);
    assert_eq!(markup(&reconciler), "<div>ab</div>");
}

#[test]
fn test_render_phase_has_no_visible_effects() {
    let mut reconciler = reconciler();
    reconciler.render(two_texts("a", "b")).unwrap();
    reconciler.work_until_complete().unwrap();

    let attach_ops = reconciler
        .host()
        .ops()
        .iter()
        .filter(|op| {
            matches!(
                op,
                HostOp::AppendChild { .. }
                    | HostOp::InsertBefore { .. }
                    | HostOp::RemoveChild { .. }
                    | HostOp::AppendToContainer { .. }
                    | HostOp::InsertInContainerBefore { .. }
                    | HostOp::RemoveFromContainer { .. }
                    | HostOp::CommitUpdate { .. }
                    | HostOp::CommitTextUpdate { .. }
            )
        })
        .count();
    assert_eq!(attach_ops, 0);
    assert!(reconciler.container().children.is_empty());
}

// =============================================================================
// UPDATE
// =============================================================================

#[test]
fn test_rerender_with_changed_text_updates_once() {
    let mut reconciler = reconciler();
    reconciler.update_container(two_texts("a", "b")).unwrap();
    let nodes = reconciler.host().node_count();
    reconciler.host_mut().take_ops();

    let summary = reconciler.update_container(two_texts("a", "c")).unwrap();

    assert_eq!(summary.updates, 1);
    assert_eq!(summary.placements, 0);
    assert_eq!(reconciler.host().node_count(), nodes);
    let ops = reconciler.host().ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], HostOp::CommitTextUpdate { text, .. } if text == "c"));
    assert_eq!(markup(&reconciler), "<div>ac</div>");
}

#[test]
fn test_rerender_with_changed_prop_updates_once() {
    let mut reconciler = reconciler();
    reconciler
        .update_container(jsx("div", &config! { "title" => "one" }, vec!["x".into()]))
        .unwrap();
    reconciler.host_mut().take_ops();

    let summary = reconciler
        .update_container(jsx("div", &config! { "title" => "two" }, vec!["x".into()]))
        .unwrap();

    assert_eq!(summary.updates, 1);
    let ops = reconciler.host().ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], HostOp::CommitUpdate { changes, .. } if changes.len() == 1));
    assert_eq!(markup(&reconciler), "<div title=\"two\">x</div>");
}

#[test]
fn test_identical_rerender_is_a_no_op() {
    let mut reconciler = reconciler();
    reconciler.update_container(two_texts("a", "b")).unwrap();
    reconciler.host_mut().take_ops();

    let summary = reconciler.update_container(two_texts("a", "b")).unwrap();

    assert_eq!(summary, Default::default());
    assert!(reconciler.host().ops().is_empty());
}

#[test]
fn test_removed_child_is_detached() {
    let mut reconciler = reconciler();
    reconciler.update_container(two_texts("a", "b")).unwrap();
    reconciler.host_mut().take_ops();
    let div = reconciler.tree().get(reconciler.current_root()).unwrap().child.unwrap();
    let removed = reconciler.tree().children(div).nth(1).unwrap();

    let summary = reconciler
        .update_container(jsx("div", &config! {}, vec!["a".into()]))
        .unwrap();

    assert_eq!(summary.deletions, 1);
    assert!(!reconciler.tree().contains(removed));
    assert!(reconciler
        .host()
        .ops()
        .iter()
        .any(|op| matches!(op, HostOp::RemoveChild { .. })));
    assert_eq!(markup(&reconciler), "<div>a</div>");
}

#[test]
fn test_type_change_replaces_root_child() {
    let mut reconciler = reconciler();
    reconciler
        .update_container(jsx("div", &config! {}, vec!["a".into()]))
        .unwrap();

    let summary = reconciler
        .update_container(jsx("section", &config! {}, vec!["a".into()]))
        .unwrap();

    assert_eq!(summary.deletions, 1);
    assert_eq!(summary.placements, 1);
    assert_eq!(markup(&reconciler), "<section>a</section>");
    assert_eq!(reconciler.container().children.len(), 1);
}

#[test]
fn test_alternating_root_types_keep_host_and_tree_bounded() {
    let mut reconciler = Reconciler::new(TerminalHost::new(), TerminalContainer::new());

    for round in 0..100 {
        let element = if round % 2 == 0 {
            jsx("div", &config! {}, vec!["a".into()])
        } else {
            jsx("section", &config! {}, vec!["b".into()])
        };
        reconciler.update_container(element).unwrap();

        assert_eq!(reconciler.host().node_count(), 2);
        assert_eq!(reconciler.container().children.len(), 1);
    }

    // Root pair plus the committed host component and its text.
    assert_eq!(reconciler.tree().len(), 4);
    assert!(reconciler.host().ops().is_empty());
    assert_eq!(markup(&reconciler), "<section>b</section>");
}

// =============================================================================
// DOUBLE BUFFERING
// =============================================================================

#[test]
fn test_buffers_alternate_between_two_fiber_sets() {
    let mut reconciler = reconciler();

    reconciler.update_container(two_texts("a", "b")).unwrap();
    let first = current_ids(&reconciler);
    reconciler.update_container(two_texts("a", "c")).unwrap();
    let second = current_ids(&reconciler);
    reconciler.update_container(two_texts("a", "d")).unwrap();
    let third = current_ids(&reconciler);

    assert!(first.is_disjoint(&second));
    assert_eq!(first, third);
    assert_eq!(reconciler.tree().len(), first.len() + second.len());

    for id in &third {
        let fiber = reconciler.tree().get(*id).unwrap();
        let alternate = fiber.alternate.unwrap();
        assert!(second.contains(&alternate));
        assert_eq!(reconciler.tree().get(alternate).unwrap().alternate, Some(*id));
    }
}

#[test]
fn test_commit_swaps_current_root() {
    let mut reconciler = reconciler();
    let before = reconciler.current_root();
    reconciler.update_container(two_texts("a", "b")).unwrap();
    let after = reconciler.current_root();

    assert_ne!(before, after);
    assert_eq!(reconciler.tree().get(after).unwrap().alternate, Some(before));
    assert!(reconciler.work_in_progress_root().is_none());
}

// =============================================================================
// INTERRUPTION
// =============================================================================

#[test]
fn test_abandoned_render_leaves_host_untouched() {
    let mut reconciler = reconciler();
    reconciler.update_container(two_texts("a", "b")).unwrap();
    let fibers = reconciler.tree().len();
    let committed = markup(&reconciler);
    reconciler.host_mut().take_ops();

    reconciler
        .render(jsx("div", &config! {}, vec!["x".into(), "y".into(), "z".into()]))
        .unwrap();
    assert_eq!(reconciler.work(3).unwrap(), RenderStatus::Yielded);
    reconciler.abandon();

    assert_eq!(markup(&reconciler), committed);
    assert_eq!(reconciler.tree().len(), fibers);
    assert!(!reconciler.is_rendering());
    assert!(reconciler.host().ops().iter().all(|op| matches!(
        op,
        HostOp::CreateText { .. } | HostOp::CreateInstance { .. } | HostOp::DiscardInstance { .. }
    )));

    reconciler.update_container(two_texts("a", "q")).unwrap();
    assert_eq!(markup(&reconciler), "<div>aq</div>");
}

#[test]
fn test_abandoned_render_releases_its_host_instances() {
    let mut reconciler = reconciler();
    reconciler.update_container(two_texts("a", "b")).unwrap();
    assert_eq!(reconciler.host().node_count(), 3);

    reconciler
        .render(jsx("section", &config! {}, vec!["x".into()]))
        .unwrap();
    reconciler.work_until_complete().unwrap();
    assert_eq!(reconciler.host().node_count(), 5);

    reconciler.abandon();
    assert_eq!(reconciler.host().node_count(), 3);
    assert_eq!(markup(&reconciler), "<div>ab</div>");
}

#[test]
fn test_yielding_render_matches_synchronous_render() {
    let app = || {
        jsx(
            "ul",
            &config! { "id" => "list" },
            vec![
                jsx("li", &config! {}, vec!["one".into()]).into(),
                jsx("li", &config! {}, vec!["two".into(), 2.into()]).into(),
                jsx("li", &config! {}, vec!["three".into()]).into(),
            ],
        )
    };

    let mut sync = reconciler();
    sync.update_container(app()).unwrap();

    let mut sliced = Reconciler::with_config(
        TerminalHost::new(),
        TerminalContainer::new(),
        ReconcilerConfig {
            units_per_slice: 1,
            verify_links: true,
        },
    );
    sliced.render(app()).unwrap();
    let mut slices = 1;
    while sliced.work(1).unwrap() == RenderStatus::Yielded {
        slices += 1;
    }
    sliced.commit().unwrap();

    assert!(slices > 1);
    assert_eq!(markup(&sliced), markup(&sync));
}

#[test]
fn test_render_restarts_over_unfinished_render() {
    let mut reconciler = reconciler();
    reconciler.render(two_texts("a", "b")).unwrap();
    reconciler.work(2).unwrap();

    reconciler.render(two_texts("c", "d")).unwrap();
    reconciler.work_until_complete().unwrap();
    reconciler.commit().unwrap();

    assert_eq!(markup(&reconciler), "<div>cd</div>");
}

// =============================================================================
// FUNCTION COMPONENTS
// =============================================================================

#[test]
fn test_function_component_output_is_mounted() {
    let greeting = FunctionComponent::new("Greeting", |props| {
        let name = props.get("name").cloned().unwrap_or_default();
        jsx("p", &config! {}, vec!["hello ".into(), name]).into()
    });
    let mut reconciler = reconciler();

    reconciler
        .update_container(jsx(&greeting, &config! { "name" => "ada" }, vec![]))
        .unwrap();
    assert_eq!(markup(&reconciler), "<p>hello ada</p>");

    reconciler
        .update_container(jsx(&greeting, &config! { "name" => "lin" }, vec![]))
        .unwrap();
    assert_eq!(markup(&reconciler), "<p>hello lin</p>");
}

#[test]
fn test_function_component_returning_list() {
    let pair = FunctionComponent::new("Pair", |_| {
        PropValue::List(vec![
            jsx("b", &config! {}, vec!["1".into()]).into(),
            jsx("i", &config! {}, vec!["2".into()]).into(),
        ])
    });
    let mut reconciler = reconciler();

    reconciler
        .update_container(jsx("div", &config! {}, vec![jsx(&pair, &config! {}, vec![]).into()]))
        .unwrap();
    assert_eq!(markup(&reconciler), "<div><b>1</b><i>2</i></div>");
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_function_child_is_rejected_and_render_abandoned() {
    let mut reconciler = reconciler();
    let callback = spark_fiber::Callback::new(|_| {});

    let err = reconciler
        .update_container(jsx("div", &config! {}, vec![callback.into()]))
        .unwrap_err();

    assert!(matches!(err, ReconcileError::InvalidChild { .. }));
    assert!(!reconciler.is_rendering());
    assert!(markup(&reconciler).is_empty());
}

#[test]
fn test_work_without_render_fails() {
    let mut reconciler = reconciler();
    assert_eq!(reconciler.work(10), Err(ReconcileError::NoWorkInProgress));
}
