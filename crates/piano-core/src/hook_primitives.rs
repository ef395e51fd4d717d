//! The stock hooks.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::context::BuildContext;
use crate::element::ElementHandle;
use crate::hook::{Hook, HookState};
use crate::{Key, PianoResult};

/// A mutable box that keeps its identity for the element's lifetime.
pub struct ObjectRef<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> ObjectRef<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.inner.borrow_mut()
    }

    pub fn set(&self, value: T) -> T {
        self.inner.replace(value)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> ObjectRef<T> {
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

impl<T> Clone for ObjectRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObjectRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectRef").field(&*self.inner.borrow()).finish()
    }
}

type Builder<R> = Cell<Option<Box<dyn FnOnce() -> R>>>;

pub struct MemoizedHook<R> {
    keys: Vec<Key>,
    builder: Builder<R>,
}

pub struct MemoizedState<R> {
    value: Option<R>,
}

impl<R: Clone + 'static> Hook for MemoizedHook<R> {
    type Output = R;
    type State = MemoizedState<R>;

    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn create_state(&self) -> Self::State {
        MemoizedState { value: None }
    }
}

impl<R: Clone + 'static> HookState<MemoizedHook<R>> for MemoizedState<R> {
    fn init_state(&mut self, hook: &MemoizedHook<R>, _element: &ElementHandle) {
        self.value = hook.builder.take().map(|builder| builder());
    }

    fn build(&mut self, hook: &MemoizedHook<R>, _element: &ElementHandle) -> R {
        if self.value.is_none() {
            self.value = hook.builder.take().map(|builder| builder());
        }
        match &self.value {
            Some(value) => value.clone(),
            None => unreachable!("memoized builder runs on the first build"),
        }
    }
}

/// Computes a value once and recomputes it only when `keys` change.
pub fn use_memoized<R: Clone + 'static>(
    cx: &mut BuildContext<'_>,
    builder: impl FnOnce() -> R + 'static,
    keys: Vec<Key>,
) -> PianoResult<R> {
    cx.use_hook(MemoizedHook {
        keys,
        builder: Cell::new(Some(Box::new(builder))),
    })
}

/// A stable [`ObjectRef`] seeded with `initial` on the first build.
pub fn use_ref<T: 'static>(cx: &mut BuildContext<'_>, initial: T) -> PianoResult<ObjectRef<T>> {
    use_memoized(cx, move || ObjectRef::new(initial), Vec::new())
}

/// Keeps the first `callback` until `keys` change.
pub fn use_callback<F: Clone + 'static>(
    cx: &mut BuildContext<'_>,
    callback: F,
    keys: Vec<Key>,
) -> PianoResult<F> {
    use_memoized(cx, move || callback, keys)
}

type ValueChanged<T, R> = Rc<dyn Fn(&T, Option<&R>) -> Option<R>>;

pub struct ValueChangedHook<T, R> {
    value: T,
    on_change: ValueChanged<T, R>,
}

pub struct ValueChangedState<R> {
    result: Option<R>,
}

impl<T: PartialEq + 'static, R: Clone + 'static> Hook for ValueChangedHook<T, R> {
    type Output = Option<R>;
    type State = ValueChangedState<R>;

    fn keys(&self) -> &[Key] {
        &[]
    }

    fn create_state(&self) -> Self::State {
        ValueChangedState { result: None }
    }
}

impl<T: PartialEq + 'static, R: Clone + 'static> HookState<ValueChangedHook<T, R>>
    for ValueChangedState<R>
{
    fn did_update_hook(&mut self, hook: &ValueChangedHook<T, R>, old_hook: &ValueChangedHook<T, R>) {
        if hook.value != old_hook.value {
            self.result = (hook.on_change)(&old_hook.value, self.result.as_ref());
        }
    }

    fn build(&mut self, _hook: &ValueChangedHook<T, R>, _element: &ElementHandle) -> Option<R> {
        self.result.clone()
    }
}

/// Calls `on_change(old_value, previous_result)` whenever `value` differs
/// from the previous build's, and returns the latest result.
pub fn use_value_changed<T, R>(
    cx: &mut BuildContext<'_>,
    value: T,
    on_change: impl Fn(&T, Option<&R>) -> Option<R> + 'static,
) -> PianoResult<Option<R>>
where
    T: PartialEq + 'static,
    R: Clone + 'static,
{
    cx.use_hook(ValueChangedHook {
        value,
        on_change: Rc::new(on_change),
    })
}

/// Undo function returned by an effect.
pub type EffectCleanup = Box<dyn FnOnce()>;

type Effect = Cell<Option<Box<dyn FnOnce() -> Option<EffectCleanup>>>>;

pub struct EffectHook {
    keys: Vec<Key>,
    dispose_now: bool,
    effect: Effect,
}

pub struct EffectState {
    cleanup: Option<EffectCleanup>,
}

impl EffectState {
    fn run(&mut self, hook: &EffectHook) {
        if let Some(effect) = hook.effect.take() {
            self.cleanup = effect();
        }
    }

    fn clean_up(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Hook for EffectHook {
    type Output = ();
    type State = EffectState;

    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn create_state(&self) -> Self::State {
        EffectState { cleanup: None }
    }
}

impl HookState<EffectHook> for EffectState {
    fn init_state(&mut self, hook: &EffectHook, _element: &ElementHandle) {
        self.run(hook);
    }

    fn did_update_hook(&mut self, hook: &EffectHook, _old_hook: &EffectHook) {
        if hook.dispose_now {
            self.clean_up();
            self.run(hook);
        }
    }

    fn build(&mut self, _hook: &EffectHook, _element: &ElementHandle) {}

    fn dispose(&mut self) {
        self.clean_up();
    }
}

/// Runs `effect` when the slot is created or its keys change, and its
/// cleanup when the slot is replaced or the element unmounts.
///
/// With `dispose_now`, every rebuild with unchanged keys also cleans up and
/// reruns the effect.
pub fn use_effect(
    cx: &mut BuildContext<'_>,
    effect: impl FnOnce() -> Option<EffectCleanup> + 'static,
    keys: Vec<Key>,
    dispose_now: bool,
) -> PianoResult<()> {
    cx.use_hook(EffectHook {
        keys,
        dispose_now,
        effect: Cell::new(Some(Box::new(effect))),
    })
}

/// Writes a [`use_state`] value and schedules a rebuild of its element.
pub struct StateSetter<R> {
    cell: Rc<RefCell<R>>,
    element: ElementHandle,
}

impl<R> StateSetter<R> {
    pub fn set(&self, value: R) {
        self.element.set_state(|| {
            *self.cell.borrow_mut() = value;
        });
    }

    pub fn update(&self, f: impl FnOnce(&mut R)) {
        self.element.set_state(|| f(&mut self.cell.borrow_mut()));
    }

    pub fn element(&self) -> &ElementHandle {
        &self.element
    }
}

impl<R: Clone> StateSetter<R> {
    pub fn get(&self) -> R {
        self.cell.borrow().clone()
    }
}

impl<R> Clone for StateSetter<R> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            element: self.element.clone(),
        }
    }
}

pub struct StateHook<R> {
    initial: Builder<R>,
}

pub struct StateCell<R> {
    cell: Option<Rc<RefCell<R>>>,
}

impl<R: Clone + 'static> Hook for StateHook<R> {
    type Output = (R, StateSetter<R>);
    type State = StateCell<R>;

    fn keys(&self) -> &[Key] {
        &[]
    }

    fn create_state(&self) -> Self::State {
        StateCell { cell: None }
    }
}

impl<R: Clone + 'static> HookState<StateHook<R>> for StateCell<R> {
    fn init_state(&mut self, hook: &StateHook<R>, _element: &ElementHandle) {
        self.cell = hook
            .initial
            .take()
            .map(|initial| Rc::new(RefCell::new(initial())));
    }

    fn build(&mut self, hook: &StateHook<R>, element: &ElementHandle) -> (R, StateSetter<R>) {
        let cell = match &self.cell {
            Some(cell) => cell.clone(),
            None => {
                let initial = hook.initial.take().map(|initial| initial());
                match initial {
                    Some(value) => {
                        let cell = Rc::new(RefCell::new(value));
                        self.cell = Some(cell.clone());
                        cell
                    }
                    None => unreachable!("state hook initialises on its first build"),
                }
            }
        };
        let value = cell.borrow().clone();
        (
            value,
            StateSetter {
                cell,
                element: element.clone(),
            },
        )
    }
}

/// A value that survives rebuilds plus a setter that requests a rebuild.
pub fn use_state<R: Clone + 'static>(
    cx: &mut BuildContext<'_>,
    initial: impl FnOnce() -> R + 'static,
) -> PianoResult<(R, StateSetter<R>)> {
    cx.use_hook(StateHook {
        initial: Cell::new(Some(Box::new(initial))),
    })
}
