use std::rc::Rc;

use piano_core::{HookWidget, SurfaceExt, SurfaceHost};
use piano_testing::{Harness, HostStats};
use piano_ui::prelude::*;

fn two_labels() -> Widget {
    column(vec![Text::new("a").into(), Text::new("b").into()]).into()
}

#[test]
fn mount_creates_and_parents_every_surface() {
    let harness = Harness::mount(two_labels()).expect("mount");
    let stats = harness.stats();

    // root frame, column frame, two labels
    assert_eq!(stats.created(), 4);
    assert_eq!(stats.destroyed(), 0);
    assert_eq!(stats.reparented(), 3);
    assert_eq!(stats.connected(), 1);

    let host = harness.host().expect("recording host");
    assert_eq!(host.find_by_class("TextLabel").len(), 2);
    let column_surface = host.find_by_name("Flex").expect("column surface");
    assert_eq!(
        host.memory().children(column_surface).expect("children").len(),
        2
    );
}

#[test]
fn dropped_trailing_child_destroys_its_surface() {
    let mut harness = Harness::mount(two_labels()).expect("mount");

    harness
        .update_home(column(vec![Text::new("a").into()]))
        .expect("update");

    let stats = harness.stats();
    assert_eq!(stats.created(), 4);
    assert_eq!(stats.destroyed(), 1);
    assert_eq!(stats.live(), 3);
    assert_eq!(stats.disconnected(), 0);
}

#[test]
fn changed_widget_type_replaces_the_surface() {
    let mut harness = Harness::mount(column(vec![Text::new("a").into()])).expect("mount");
    assert_eq!(harness.stats().created(), 3);

    harness
        .update_home(column(vec![BaseFrame::new(Vec::new()).into()]))
        .expect("update");

    let stats = harness.stats();
    assert_eq!(stats.created(), 4);
    assert_eq!(stats.destroyed(), 1);
    let host = harness.host().expect("recording host");
    assert!(host.find_by_class("TextLabel").is_empty());
    assert_eq!(host.find_by_class("Frame").len(), 3);
}

#[test]
fn home_of_another_type_replaces_the_home_element() {
    let mut harness = Harness::mount(Text::new("a")).expect("mount");
    let before = harness.home().expect("home");

    harness
        .update_home(BaseFrame::new(Vec::new()))
        .expect("update");

    let after = harness.home().expect("home");
    assert_ne!(before, after);
    assert!(!harness.root().tree().contains(before));
    let stats = harness.stats();
    assert_eq!(stats.created(), 3);
    assert_eq!(stats.destroyed(), 1);
    let host = harness.host().expect("recording host");
    assert!(host.find_by_class("TextLabel").is_empty());
    assert_eq!(host.find_by_class("Frame").len(), 2);
    assert_eq!(
        harness.surface_of(after).expect("surface").size(),
        Harness::DEFAULT_VIEWPORT
    );
}

#[test]
fn same_type_update_keeps_surfaces() {
    let mut harness = Harness::mount(two_labels()).expect("mount");

    harness
        .update_home(column(vec![
            Text::new("a").into(),
            Text::new("renamed").into(),
        ]))
        .expect("update");

    assert_eq!(harness.stats().created(), 4);
    assert_eq!(harness.stats().destroyed(), 0);
    let host = harness.host().expect("recording host");
    let labels = host.find_by_class("TextLabel");
    let second = host.memory().get(labels[1]).expect("label");
    let label = second.downcast_ref::<TextLabel>().expect("text label");
    assert_eq!(label.text(), "renamed");
}

#[test]
fn unmount_destroys_surfaces_and_disconnects_resize() {
    let harness = Harness::mount(two_labels()).expect("mount");

    let stats: Rc<HostStats> = harness.unmount().expect("unmount");

    assert_eq!(stats.live(), 0);
    assert_eq!(stats.destroyed(), 4);
    assert_eq!(stats.disconnected(), 1);
}

#[test]
fn resize_is_applied_on_the_next_tick() {
    let mut harness = Harness::mount(Center::new(Text::new("hello"))).expect("mount");
    let root_surface = harness.root().root_surface();

    harness
        .host_mut()
        .expect("recording host")
        .memory_mut()
        .resize(root_surface, Size::new(100.0, 50.0))
        .expect("resize");
    assert!(harness.root().needs_frame());
    let stats = harness.tick().expect("tick");

    assert_eq!(stats.relaid_out, 1);
    let home = harness.home().expect("home");
    assert_eq!(
        harness.surface_of(home).expect("surface").size(),
        Size::new(100.0, 50.0)
    );
}

struct Counter;

impl HookWidget for Counter {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let (count, set_count) = use_state(cx, || 0u32)?;
        Ok(column(vec![
            TextButton::new("Increment", move || set_count.update(|count| *count += 1)).into(),
            Text::new(format!("Count: {count}")).into(),
        ])
        .into())
    }
}

#[test]
fn button_press_settles_into_updated_text() {
    let mut harness = Harness::mount(Widget::hook(Counter)).expect("mount");
    let created = harness.stats().created();

    let host = harness.host_mut().expect("recording host");
    let button = host.find_by_class("TextButton")[0];
    host.memory_mut()
        .with_surface::<TextButtonSurface, _>(button, |button| button.activate())
        .expect("activate");

    assert_eq!(harness.settle(4).expect("settle"), 1);
    assert!(!harness.root().needs_frame());
    assert_eq!(harness.stats().created(), created);

    let host = harness.host().expect("recording host");
    let label = host.find_by_class("TextLabel")[0];
    let surface = host.memory().get(label).expect("label");
    assert_eq!(
        surface.downcast_ref::<TextLabel>().expect("text label").text(),
        "Count: 1"
    );
}
