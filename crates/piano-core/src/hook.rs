//! Position-indexed hook slots for hook widgets.
//!
//! Each hook widget element keeps one slot per `use_hook` call, matched by
//! call order. A slot survives a rebuild when the new hook reports the same
//! keys as the stored one; otherwise the stored state is disposed and a
//! fresh one is created in its place.

use std::any::Any;

use crate::element::ElementHandle;
use crate::Key;

/// A reusable unit of per-element state driven from a hook widget's build.
pub trait Hook: Sized + 'static {
    type Output;
    type State: HookState<Self>;

    /// Dependency keys. A change in length or any element recreates the
    /// state.
    fn keys(&self) -> &[Key];

    fn create_state(&self) -> Self::State;
}

/// State stored in a hook slot across builds.
pub trait HookState<H: Hook>: 'static {
    fn init_state(&mut self, _hook: &H, _element: &ElementHandle) {}

    /// Called when a rebuild supplies a new hook with identical keys.
    fn did_update_hook(&mut self, _hook: &H, _old_hook: &H) {}

    fn build(&mut self, hook: &H, element: &ElementHandle) -> H::Output;

    fn dispose(&mut self) {}
}

/// Two key lists match when they have the same length and equal elements.
pub fn keys_identical(a: &[Key], b: &[Key]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

pub(crate) trait HookSlot {
    fn keys(&self) -> &[Key];

    fn dispose(&mut self);

    fn slot_any_mut(&mut self) -> &mut dyn Any;
}

struct HookCell<H: Hook> {
    hook: H,
    state: H::State,
    disposed: bool,
}

impl<H: Hook> HookSlot for HookCell<H> {
    fn keys(&self) -> &[Key] {
        self.hook.keys()
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.state.dispose();
        }
    }

    fn slot_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
pub(crate) struct HookSlots {
    slots: Vec<Box<dyn HookSlot>>,
}

impl HookSlots {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Disposes every slot in call order.
    pub(crate) fn dispose_all(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.dispose();
        }
    }
}

/// Cursor over an element's hook slots for the duration of one build.
pub(crate) struct HookFrame {
    slots: HookSlots,
    cursor: usize,
}

impl HookFrame {
    pub(crate) fn new(slots: HookSlots) -> Self {
        Self { slots, cursor: 0 }
    }

    pub(crate) fn used(&self) -> usize {
        self.cursor
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn into_slots(self) -> HookSlots {
        self.slots
    }

    pub(crate) fn use_hook<H: Hook>(&mut self, hook: H, element: &ElementHandle) -> H::Output {
        let index = self.cursor;
        self.cursor += 1;

        if let Some(slot) = self.slots.slots.get_mut(index) {
            if keys_identical(slot.keys(), hook.keys()) {
                if let Some(cell) = slot.slot_any_mut().downcast_mut::<HookCell<H>>() {
                    let old_hook = std::mem::replace(&mut cell.hook, hook);
                    cell.state.did_update_hook(&cell.hook, &old_hook);
                    return cell.state.build(&cell.hook, element);
                }
                log::warn!(
                    "hook slot {index} changed type to {}",
                    std::any::type_name::<H>()
                );
            }
            slot.dispose();
        }

        let mut state = hook.create_state();
        state.init_state(&hook, element);
        let output = state.build(&hook, element);
        let cell: Box<dyn HookSlot> = Box::new(HookCell {
            hook,
            state,
            disposed: false,
        });
        if index < self.slots.slots.len() {
            self.slots.slots[index] = cell;
        } else {
            self.slots.slots.push(cell);
        }
        output
    }
}
