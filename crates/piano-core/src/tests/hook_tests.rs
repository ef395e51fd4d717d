use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::hook_keys;
use crate::prelude::*;
use crate::test_widgets::*;
use crate::{keys_identical, ElementId, ElementTree, Frame, Key, ObjectRef, StateSetter};

fn mount_root(tree: &mut ElementTree) -> ElementId {
    let surface = tree.host_mut().insert(Box::new(Frame::default()));
    let root = tree.create_root(surface);
    tree.mount(root, None, Some(root)).expect("mount root");
    root
}

fn counting(probe: &Probe, keys: Vec<Key>, builds: &Rc<RefCell<Option<ObjectRef<usize>>>>) -> Widget {
    Widget::hook(Counting {
        probe: probe.clone(),
        effect_keys: keys,
        builds: builds.clone(),
    })
}

#[test]
fn hook_slots_survive_rebuilds() {
    let (mut tree, _runtime) = tree_with_memory_host();
    let root = mount_root(&mut tree);
    let probe = Probe::default();
    let builds = Rc::new(RefCell::new(None));

    let element = tree
        .inflate_widget(root, counting(&probe, Vec::new(), &builds), Some(0))
        .expect("inflate");
    let first_ref = builds.borrow().clone().expect("ref");
    tree.update(element, counting(&probe, Vec::new(), &builds))
        .expect("update");
    tree.update(element, counting(&probe, Vec::new(), &builds))
        .expect("update");

    let latest_ref = builds.borrow().clone().expect("ref");
    assert!(first_ref.ptr_eq(&latest_ref));
    assert_eq!(latest_ref.get(), 3);
    assert_eq!(probe.events(), vec!["effect"]);

    tree.unmount(element).expect("unmount");
    assert_eq!(probe.events(), vec!["effect", "cleanup"]);
}

#[test]
fn changed_keys_recreate_the_slot() {
    let (mut tree, _runtime) = tree_with_memory_host();
    let root = mount_root(&mut tree);
    let probe = Probe::default();
    let builds = Rc::new(RefCell::new(None));

    let element = tree
        .inflate_widget(root, counting(&probe, hook_keys![1], &builds), Some(0))
        .expect("inflate");
    tree.update(element, counting(&probe, hook_keys![1], &builds))
        .expect("same keys");
    tree.update(element, counting(&probe, hook_keys![2], &builds))
        .expect("changed key");
    tree.update(element, counting(&probe, hook_keys![2, 3], &builds))
        .expect("changed length");

    assert_eq!(
        probe.events(),
        vec!["effect", "cleanup", "effect", "cleanup", "effect"]
    );
    // the ref slot has no keys and is never recreated
    assert_eq!(builds.borrow().as_ref().map(ObjectRef::get), Some(4));
}

struct PlainUser;

impl StatelessWidget for PlainUser {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        use_ref(cx, 0u8)?;
        Ok(Leaf::widget("plain"))
    }
}

#[test]
fn hooks_fail_outside_hook_widgets() {
    let (mut tree, _runtime) = tree_with_memory_host();
    let root = mount_root(&mut tree);

    let result = tree.inflate_widget(root, Widget::stateless(PlainUser), Some(0));

    assert_eq!(
        result.err(),
        Some(PianoError::HookOutsideBuild { widget: "PlainUser" })
    );
}

struct Clicker {
    setter: Rc<RefCell<Option<StateSetter<i32>>>>,
    seen: Rc<Cell<i32>>,
}

impl HookWidget for Clicker {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let (count, set_count) = use_state(cx, || 0)?;
        self.seen.set(count);
        *self.setter.borrow_mut() = Some(set_count);
        Ok(Leaf::widget("clicker"))
    }
}

#[test]
fn state_setter_schedules_rebuild_with_new_value() {
    let (mut tree, runtime) = tree_with_memory_host();
    let root = mount_root(&mut tree);
    let setter = Rc::new(RefCell::new(None));
    let seen = Rc::new(Cell::new(-1));

    let element = tree
        .inflate_widget(
            root,
            Widget::hook(Clicker {
                setter: setter.clone(),
                seen: seen.clone(),
            }),
            Some(0),
        )
        .expect("inflate");
    assert_eq!(seen.get(), 0);
    assert!(!tree.is_dirty(element));

    let set_count = setter.borrow().clone().expect("setter");
    set_count.set(5);
    set_count.update(|count| *count += 1);

    assert!(tree.is_dirty(element));
    assert!(runtime.has_pending_rebuilds());
    assert_eq!(set_count.get(), 6);

    tree.rebuild(element).expect("rebuild");
    assert_eq!(seen.get(), 6);
    assert!(!tree.is_dirty(element));
}

struct Memo {
    key: u32,
    computed: Rc<Cell<u32>>,
    value: Rc<Cell<u32>>,
}

impl HookWidget for Memo {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let computed = self.computed.clone();
        let key = self.key;
        let value = use_memoized(
            cx,
            move || {
                computed.set(computed.get() + 1);
                key * 100
            },
            hook_keys![key],
        )?;
        self.value.set(value);
        Ok(Leaf::widget("memo"))
    }
}

#[test]
fn memoized_value_recomputes_only_on_key_change() {
    let (mut tree, _runtime) = tree_with_memory_host();
    let root = mount_root(&mut tree);
    let computed = Rc::new(Cell::new(0));
    let value = Rc::new(Cell::new(0));
    let memo = |key| {
        Widget::hook(Memo {
            key,
            computed: computed.clone(),
            value: value.clone(),
        })
    };

    let element = tree.inflate_widget(root, memo(1), Some(0)).expect("inflate");
    tree.update(element, memo(1)).expect("update");
    assert_eq!((computed.get(), value.get()), (1, 100));

    tree.update(element, memo(2)).expect("update");
    assert_eq!((computed.get(), value.get()), (2, 200));
}

struct Watcher {
    value: i32,
    result: Rc<Cell<Option<i32>>>,
}

impl HookWidget for Watcher {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let result = use_value_changed(cx, self.value, |old: &i32, previous: Option<&i32>| {
            Some(previous.copied().unwrap_or(0) + *old)
        })?;
        self.result.set(result);
        Ok(Leaf::widget("watcher"))
    }
}

#[test]
fn value_changed_fires_with_the_old_value() {
    let (mut tree, _runtime) = tree_with_memory_host();
    let root = mount_root(&mut tree);
    let result = Rc::new(Cell::new(None));
    let watcher = |value| {
        Widget::hook(Watcher {
            value,
            result: result.clone(),
        })
    };

    let element = tree.inflate_widget(root, watcher(1), Some(0)).expect("inflate");
    assert_eq!(result.get(), None);

    tree.update(element, watcher(1)).expect("unchanged");
    assert_eq!(result.get(), None);

    tree.update(element, watcher(4)).expect("changed");
    assert_eq!(result.get(), Some(1));

    tree.update(element, watcher(7)).expect("changed again");
    assert_eq!(result.get(), Some(5));
}

struct Ticker {
    probe: Probe,
}

impl HookWidget for Ticker {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let probe = self.probe.clone();
        use_effect(
            cx,
            move || {
                probe.push("run");
                let probe = probe.clone();
                Some(Box::new(move || probe.push("undo")) as crate::EffectCleanup)
            },
            Vec::new(),
            true,
        )?;
        Ok(Leaf::widget("ticker"))
    }
}

#[test]
fn dispose_now_effects_rerun_every_build() {
    let (mut tree, _runtime) = tree_with_memory_host();
    let root = mount_root(&mut tree);
    let probe = Probe::default();
    let ticker = || {
        Widget::hook(Ticker {
            probe: probe.clone(),
        })
    };

    let element = tree.inflate_widget(root, ticker(), Some(0)).expect("inflate");
    tree.update(element, ticker()).expect("update");
    tree.unmount(element).expect("unmount");

    assert_eq!(probe.events(), vec!["run", "undo", "run", "undo"]);
}

#[test]
fn keys_compare_by_length_then_elements() {
    assert!(keys_identical(&[], &[]));
    assert!(keys_identical(&hook_keys![1, "a"], &hook_keys![1, "a"]));
    assert!(!keys_identical(&hook_keys![1], &hook_keys![1, 2]));
    assert!(!keys_identical(&hook_keys![1, 2], &hook_keys![2, 1]));
}
