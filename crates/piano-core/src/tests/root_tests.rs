use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::prelude::*;
use crate::test_widgets::*;
use crate::{FrameScheduler, MemoryHost, MountOptions, StateSetter, SurfaceHost, TickStats};

#[derive(Default)]
struct CountingScheduler {
    frames: AtomicUsize,
}

impl FrameScheduler for CountingScheduler {
    fn schedule_frame(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked(text: &'static str, probe: &Probe) -> Widget {
    Widget::stateful(Tracked {
        label: text,
        probe: probe.clone(),
    })
}

#[test]
fn mount_builds_and_lays_out_home() {
    let root = PianoRoot::mount(
        MemoryHost::new(),
        Stack::widget(vec![Leaf::widget("a"), Leaf::widget("b")]),
        MountOptions::default().with_root_name("Main"),
    )
    .expect("mount");

    let home = root.home_element().expect("home");
    let host = root.host::<MemoryHost>().expect("memory host");
    assert_eq!(host.len(), 4);
    assert_eq!(
        root.tree().host().get(root.root_surface()).expect("root").name(),
        "Main"
    );
    assert_eq!(
        root.tree().host().parent(root.tree().surface(home).expect("surface")),
        Ok(Some(root.root_surface()))
    );
    assert_eq!(root.tree().size(home), Ok(Size::new(10.0, 20.0)));
    assert_eq!(
        root.tree().constraints(home),
        Some(BoxConstraints::new(0.0, 800.0, 0.0, 600.0))
    );
    assert!(!root.needs_frame());
}

#[test]
fn idle_tick_does_nothing() {
    let mut root =
        PianoRoot::mount(MemoryHost::new(), Leaf::widget("a"), MountOptions::default())
            .expect("mount");

    assert_eq!(root.tick(), Ok(TickStats::default()));
}

#[test]
fn repeated_marks_rebuild_once() {
    let probe = Probe::default();
    let scheduler = Arc::new(CountingScheduler::default());
    let mut root = PianoRoot::mount_with_scheduler(
        MemoryHost::new(),
        tracked("a", &probe),
        MountOptions::default(),
        scheduler.clone(),
    )
    .expect("mount");
    let home = root.home_element().expect("home");

    assert_eq!(root.add_to_rebuild(home), Ok(true));
    assert_eq!(root.add_to_rebuild(home), Ok(true));
    assert_eq!(scheduler.frames.load(Ordering::SeqCst), 1);
    assert!(root.needs_frame());

    let stats = root.tick().expect("tick");

    assert_eq!(stats.rebuilt, 1);
    assert_eq!(stats.relaid_out, 1);
    assert_eq!(probe.count("build a #2"), 1);
    assert!(!root.needs_frame());
}

#[test]
fn clean_and_removed_elements_are_skipped() {
    let probe = Probe::default();
    let mut root = PianoRoot::mount(
        MemoryHost::new(),
        Stack::widget(vec![tracked("a", &probe), tracked("b", &probe)]),
        MountOptions::default(),
    )
    .expect("mount");
    let home = root.home_element().expect("home");
    let first = root.tree().child(home, 0).expect("first");
    let second = root.tree().child(home, 1).expect("second");

    root.add_to_rebuild(first).expect("mark");
    root.add_to_rebuild(second).expect("mark");
    root.tree_mut().rebuild(first).expect("rebuild early");
    root.tree_mut()
        .update(home, Stack::widget(vec![tracked("a", &probe)]))
        .expect("drop second");

    let stats = root.tick().expect("tick");

    assert_eq!(stats.rebuilt, 0);
    // the unmounted element was dropped from the queue outright
    assert_eq!(stats.skipped, 1);
}

#[test]
fn resize_relayouts_on_next_tick() {
    let mut root = PianoRoot::mount(
        MemoryHost::new(),
        Stack::widget(vec![Leaf::widget("a")]),
        MountOptions::default(),
    )
    .expect("mount");
    let home = root.home_element().expect("home");
    let root_surface = root.root_surface();

    root.host_mut::<MemoryHost>()
        .expect("memory host")
        .resize(root_surface, Size::new(5.0, 5.0))
        .expect("resize");
    assert!(root.needs_frame());

    let stats = root.tick().expect("tick");

    assert_eq!(stats.relaid_out, 1);
    assert_eq!(
        root.tree().constraints(home),
        Some(BoxConstraints::new(0.0, 5.0, 0.0, 5.0))
    );
    assert_eq!(root.tree().size(home), Ok(Size::new(5.0, 5.0)));
}

struct Switch {
    other: Rc<Cell<bool>>,
}

impl StatelessWidget for Switch {
    fn build(&self, _cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        if self.other.get() {
            Ok(Widget::foundation(OtherLeaf))
        } else {
            Ok(Leaf::widget("switch"))
        }
    }
}

#[test]
fn replaced_subtree_is_laid_out() {
    let other = Rc::new(Cell::new(false));
    let mut root = PianoRoot::mount(
        MemoryHost::new(),
        Widget::stateless(Switch {
            other: other.clone(),
        }),
        MountOptions::default(),
    )
    .expect("mount");
    let home = root.home_element().expect("home");
    let before = root.tree().child(home, 0).expect("leaf");

    other.set(true);
    root.add_to_rebuild(home).expect("mark");
    let stats = root.tick().expect("tick");

    let after = root.tree().child(home, 0).expect("other leaf");
    assert_ne!(before, after);
    assert_eq!(stats.relaid_out, 1);
    assert!(root.tree().constraints(after).is_some());
    assert_eq!(root.tree().size(after), Ok(Size::new(5.0, 5.0)));
}

struct Flaky {
    fail: Rc<Cell<bool>>,
}

impl StatelessWidget for Flaky {
    fn build(&self, _cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        if self.fail.get() {
            return Err(PianoError::ProviderNotFound { provider: "Flaky" });
        }
        Ok(Leaf::widget("flaky"))
    }
}

#[test]
fn failed_rebuild_stays_queued() {
    let fail = Rc::new(Cell::new(false));
    let mut root = PianoRoot::mount(
        MemoryHost::new(),
        Widget::stateless(Flaky { fail: fail.clone() }),
        MountOptions::default(),
    )
    .expect("mount");
    let home = root.home_element().expect("home");

    fail.set(true);
    root.add_to_rebuild(home).expect("mark");
    assert_eq!(
        root.tick(),
        Err(PianoError::ProviderNotFound { provider: "Flaky" })
    );
    assert!(root.tree().is_dirty(home));
    assert!(root.runtime().has_pending_rebuilds());

    fail.set(false);
    let stats = root.tick().expect("tick");
    assert_eq!(stats.rebuilt, 1);
    assert!(!root.tree().is_dirty(home));
}

struct Counter {
    setter: Rc<RefCell<Option<StateSetter<u32>>>>,
}

impl HookWidget for Counter {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let (count, set_count) = use_state(cx, || 0)?;
        *self.setter.borrow_mut() = Some(set_count);
        Ok(Widget::foundation(Leaf {
            label: if count > 0 { "clicked" } else { "idle" },
        }))
    }
}

#[test]
fn state_setter_drives_the_next_tick() {
    let setter = Rc::new(RefCell::new(None));
    let mut root = PianoRoot::mount(
        MemoryHost::new(),
        Widget::hook(Counter {
            setter: setter.clone(),
        }),
        MountOptions::default(),
    )
    .expect("mount");
    let leaf = root
        .tree()
        .find_child_with_component(root.root_element())
        .expect("leaf");
    let surface = root.tree().surface(leaf).expect("surface");

    setter.borrow().clone().expect("setter").update(|count| *count += 1);
    assert!(root.needs_frame());
    let stats = root.tick().expect("tick");

    assert_eq!(stats.rebuilt, 1);
    assert_eq!(root.tree().host().get(surface).expect("surface").name(), "clicked");
}

#[test]
fn unmount_releases_every_surface() {
    let probe = Probe::default();
    let root = PianoRoot::mount(
        MemoryHost::new(),
        Stack::widget(vec![tracked("a", &probe), Leaf::widget("b")]),
        MountOptions::default(),
    )
    .expect("mount");

    let host = root.unmount().expect("unmount");

    let host = host.downcast_ref::<MemoryHost>().expect("memory host");
    assert!(host.is_empty());
    assert_eq!(probe.count("dispose"), 1);
}
