use std::cell::Cell;
use std::rc::Rc;

use crate::prelude::*;
use crate::test_widgets::*;
use crate::{Aspect, MemoryHost, MountOptions};

fn reader(access: Access, name: &'static str, probe: &Probe) -> (Widget, Rc<Cell<u32>>) {
    let seen = Rc::new(Cell::new(0));
    let widget = Widget::stateless(ThemeReader {
        access,
        seen: seen.clone(),
        probe: probe.clone(),
        name,
    });
    (widget, seen)
}

fn theme(value: u32, child: &Widget) -> Widget {
    Widget::inherited(Theme {
        value,
        child: child.clone(),
    })
}

#[test]
fn selectors_decide_which_dependents_rebuild() {
    let probe = Probe::default();
    let (watcher, watched) = reader(Access::Watch, "watch", &probe);
    let (plain, _) = reader(Access::Read, "read", &probe);
    let (selective, selected) = reader(Access::SelectAboveTen, "select", &probe);
    let body = Stack::widget(vec![watcher, plain, selective]);

    let mut root = PianoRoot::mount(MemoryHost::new(), theme(5, &body), MountOptions::default())
        .expect("mount");
    let provider = root.home_element().expect("theme");
    let stack = root.tree().child(provider, 0).expect("stack");
    let readers = root.tree().children(stack);
    assert_eq!(watched.get(), 5);
    assert_eq!(root.tree().dependents(provider), vec![readers[0], readers[2]]);

    root.tree_mut()
        .update(provider, theme(7, &body))
        .expect("update theme");
    let stats = root.tick().expect("tick");
    assert_eq!(stats.notified, 1);
    assert!(root.tree().is_dirty(readers[0]));
    assert!(!root.tree().is_dirty(readers[2]));

    probe.clear();
    let stats = root.tick().expect("tick");
    assert_eq!(stats.rebuilt, 1);
    assert_eq!(probe.events(), vec!["build watch"]);
    assert_eq!(watched.get(), 7);

    root.tree_mut()
        .update(provider, theme(12, &body))
        .expect("update theme");
    let stats = root.tick().expect("tick");
    assert_eq!(stats.notified, 2);
    assert_eq!(selected.get(), 12);
}

#[test]
fn unchanged_value_does_not_notify() {
    let probe = Probe::default();
    let (watcher, _) = reader(Access::Watch, "watch", &probe);

    let mut root = PianoRoot::mount(MemoryHost::new(), theme(3, &watcher), MountOptions::default())
        .expect("mount");
    let provider = root.home_element().expect("theme");

    root.tree_mut()
        .update(provider, theme(3, &watcher))
        .expect("update theme");
    let stats = root.tick().expect("tick");

    assert_eq!(stats.notified, 0);
    assert!(!root.needs_frame());
}

#[test]
fn nearest_provider_wins() {
    let probe = Probe::default();
    let (watcher, seen) = reader(Access::Watch, "watch", &probe);
    let inner = theme(2, &watcher);

    let root = PianoRoot::mount(MemoryHost::new(), theme(1, &inner), MountOptions::default())
        .expect("mount");

    let outer = root.home_element().expect("outer");
    let inner = root.tree().child(outer, 0).expect("inner");
    let reader = root.tree().child(inner, 0).expect("reader");
    assert_eq!(seen.get(), 2);
    assert_eq!(root.tree().dependents(inner), vec![reader]);
    assert!(root.tree().dependents(outer).is_empty());
}

#[test]
fn missing_provider_is_an_error() {
    let probe = Probe::default();
    let (watcher, _) = reader(Access::Watch, "watch", &probe);

    let result = PianoRoot::mount(MemoryHost::new(), watcher, MountOptions::default());

    assert_eq!(
        result.err(),
        Some(PianoError::ProviderNotFound {
            provider: std::any::type_name::<Theme>(),
        })
    );
}

#[test]
fn unmounted_dependents_are_released() {
    let probe = Probe::default();
    let (watcher, _) = reader(Access::Watch, "watch", &probe);
    let (selective, _) = reader(Access::SelectAboveTen, "select", &probe);

    let mut root = PianoRoot::mount(
        MemoryHost::new(),
        theme(1, &Stack::widget(vec![watcher.clone(), selective])),
        MountOptions::default(),
    )
    .expect("mount");
    let provider = root.home_element().expect("theme");
    assert_eq!(root.tree().dependents(provider).len(), 2);

    root.tree_mut()
        .update(provider, theme(1, &Stack::widget(vec![watcher])))
        .expect("drop a reader");
    assert_eq!(root.tree().dependents(provider).len(), 1);

    root.tree_mut()
        .update(provider, theme(20, &Stack::widget(Vec::new())))
        .expect("drop all readers");
    assert!(root.tree().dependents(provider).is_empty());
    let stats = root.tick().expect("tick");
    assert_eq!(stats.notified, 0);
}

#[test]
fn announcement_without_subscription_is_ignored() {
    let probe = Probe::default();
    let (plain, _) = reader(Access::Read, "read", &probe);

    let mut root = PianoRoot::mount(MemoryHost::new(), theme(1, &plain), MountOptions::default())
        .expect("mount");
    let provider = root.home_element().expect("theme");
    let dependent = root.tree().child(provider, 0).expect("reader");

    let marked = root
        .tree_mut()
        .announce_dependency_change(dependent, provider)
        .expect("announce");

    assert!(!marked);
    assert!(!root.tree().is_dirty(dependent));
}

#[test]
fn previous_value_is_readable_after_update() {
    let probe = Probe::default();
    let (plain, _) = reader(Access::Read, "read", &probe);

    let mut root = PianoRoot::mount(MemoryHost::new(), theme(4, &plain), MountOptions::default())
        .expect("mount");
    let provider = root.home_element().expect("theme");
    assert_eq!(root.tree().provider_old_value::<Theme>(provider), Ok(None));

    root.tree_mut()
        .update(provider, theme(9, &plain))
        .expect("update");

    assert_eq!(root.tree().provider_value::<Theme>(provider), Ok(9));
    assert_eq!(root.tree().provider_old_value::<Theme>(provider), Ok(Some(4)));
}

struct ColorReader;

impl StatelessWidget for ColorReader {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let aspect: Aspect = Rc::new("color");
        cx.select::<Theme>(Some(aspect), |new, old| Some(new) != old)?;
        Ok(Leaf::widget("color"))
    }
}

#[test]
fn dependents_remember_their_aspect() {
    let probe = Probe::default();
    let (watcher, _) = reader(Access::Watch, "watch", &probe);
    let body = Stack::widget(vec![watcher, Widget::stateless(ColorReader)]);

    let root = PianoRoot::mount(MemoryHost::new(), theme(5, &body), MountOptions::default())
        .expect("mount");
    let provider = root.home_element().expect("theme");
    let stack = root.tree().child(provider, 0).expect("stack");
    let readers = root.tree().children(stack);

    assert!(root.tree().dependent_aspect(provider, readers[0]).is_none());
    let aspect = root
        .tree()
        .dependent_aspect(provider, readers[1])
        .expect("aspect");
    assert_eq!(aspect.downcast_ref::<&str>(), Some(&"color"));
    assert!(root.tree().dependent_aspect(stack, readers[1]).is_none());
}
