use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use piano_ui_graphics::{Point, Size};
use piano_ui_layout::BoxConstraints;

use crate::collections::map::HashMap;
use crate::context::{BuildContext, LayoutContext, StateContext, SurfaceContext};
use crate::hook::{HookFrame, HookSlots};
use crate::provider::{Aspect, Selector};
use crate::runtime::RuntimeHandle;
use crate::surface::{Connection, Connections, SurfaceHost, SurfaceId};
use crate::widget::{State, Widget, WidgetBody, WidgetVariant};
use crate::{PianoError, PianoResult};

/// Generational index of an element in an [`ElementTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId {
    index: u32,
    generation: u32,
}

impl ElementId {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}

/// The runtime counterpart of each widget variant, plus the tree root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Root,
    Foundation,
    Stateless,
    Stateful,
    Hook,
    Proxy,
    Inherited,
}

impl ElementKind {
    fn accepts(self, variant: WidgetVariant) -> bool {
        matches!(
            (self, variant),
            (ElementKind::Foundation, WidgetVariant::Foundation)
                | (ElementKind::Stateless, WidgetVariant::Stateless)
                | (ElementKind::Stateful, WidgetVariant::Stateful)
                | (ElementKind::Hook, WidgetVariant::Hook)
                | (ElementKind::Proxy, WidgetVariant::Proxy)
                | (ElementKind::Inherited, WidgetVariant::Inherited)
        )
    }
}

/// Flags shared between an element and the handles given out for it.
pub(crate) struct ElementFlags {
    pub(crate) dirty: Cell<bool>,
    pub(crate) mounted: Cell<bool>,
    pub(crate) owned: Cell<bool>,
}

impl ElementFlags {
    fn new() -> Self {
        Self {
            dirty: Cell::new(true),
            mounted: Cell::new(false),
            owned: Cell::new(false),
        }
    }
}

fn request_rebuild(id: ElementId, flags: &ElementFlags, runtime: &RuntimeHandle) -> bool {
    if !flags.mounted.get() {
        log::debug!("ignoring rebuild request for unmounted element {id}");
        return false;
    }
    flags.dirty.set(true);
    if flags.owned.get() {
        runtime.register_rebuild(id);
        true
    } else {
        false
    }
}

/// A cloneable reference to a live element that can request rebuilds.
///
/// Requests made after the element is unmounted are ignored.
#[derive(Clone)]
pub struct ElementHandle {
    id: ElementId,
    flags: Rc<ElementFlags>,
    runtime: RuntimeHandle,
}

impl ElementHandle {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn is_mounted(&self) -> bool {
        self.flags.mounted.get()
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.dirty.get()
    }

    /// Marks the element dirty and queues it with its root, if it has one.
    pub fn mark_rebuild(&self) -> bool {
        request_rebuild(self.id, &self.flags, &self.runtime)
    }

    /// Runs `mutate` and then requests a rebuild.
    pub fn set_state(&self, mutate: impl FnOnce()) {
        mutate();
        self.mark_rebuild();
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle")
            .field("id", &self.id)
            .field("mounted", &self.is_mounted())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

pub(crate) struct HostBody {
    pub(crate) surface: SurfaceId,
    pub(crate) constraints: Option<BoxConstraints>,
    pub(crate) connections: Connections,
    pub(crate) surface_parent: Option<ElementId>,
}

pub(crate) enum ElementBody {
    Root { surface: SurfaceId },
    Foundation(HostBody),
    Stateless,
    Stateful { state: Option<Box<dyn State>> },
    Hook { slots: Option<HookSlots> },
    Proxy,
    Inherited { dependents: HashMap<ElementId, Option<Aspect>> },
}

impl ElementBody {
    fn kind(&self) -> ElementKind {
        match self {
            ElementBody::Root { .. } => ElementKind::Root,
            ElementBody::Foundation(_) => ElementKind::Foundation,
            ElementBody::Stateless => ElementKind::Stateless,
            ElementBody::Stateful { .. } => ElementKind::Stateful,
            ElementBody::Hook { .. } => ElementKind::Hook,
            ElementBody::Proxy => ElementKind::Proxy,
            ElementBody::Inherited { .. } => ElementKind::Inherited,
        }
    }

    fn surface(&self) -> Option<SurfaceId> {
        match self {
            ElementBody::Root { surface } => Some(*surface),
            ElementBody::Foundation(body) => Some(body.surface),
            _ => None,
        }
    }
}

pub(crate) struct ElementNode {
    pub(crate) widget: Option<Widget>,
    pub(crate) old_widget: Option<Widget>,
    updated: bool,
    pub(crate) parent: Option<ElementId>,
    owner: Option<ElementId>,
    pub(crate) children: Vec<Option<ElementId>>,
    pub(crate) flags: Rc<ElementFlags>,
    pub(crate) subscriptions: HashMap<ElementId, Selector>,
    pub(crate) body: ElementBody,
}

impl ElementNode {
    fn new(widget: Option<Widget>, body: ElementBody) -> Self {
        Self {
            widget,
            old_widget: None,
            updated: false,
            parent: None,
            owner: None,
            children: Vec::new(),
            flags: Rc::new(ElementFlags::new()),
            subscriptions: HashMap::new(),
            body,
        }
    }

    fn widget_name(&self) -> &'static str {
        match (&self.widget, &self.body) {
            (Some(widget), _) => widget.name(),
            (None, ElementBody::Root { .. }) => "Root",
            (None, _) => "(no widget)",
        }
    }
}

struct Entry {
    generation: u32,
    node: Option<ElementNode>,
}

/// Arena holding every element of one mounted tree together with the
/// host that owns their surfaces.
pub struct ElementTree {
    entries: Vec<Entry>,
    free: Vec<u32>,
    host: Box<dyn SurfaceHost>,
    runtime: RuntimeHandle,
}

impl ElementTree {
    pub fn new(host: Box<dyn SurfaceHost>, runtime: RuntimeHandle) -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            host,
            runtime,
        }
    }

    pub fn host(&self) -> &(dyn SurfaceHost + 'static) {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut (dyn SurfaceHost + 'static) {
        self.host.as_mut()
    }

    pub fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }

    pub fn into_host(self) -> Box<dyn SurfaceHost> {
        self.host
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.node(id).is_ok()
    }

    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.node(id).ok().map(|node| node.body.kind())
    }

    pub fn widget(&self, id: ElementId) -> Option<&Widget> {
        self.node(id).ok().and_then(|node| node.widget.as_ref())
    }

    pub fn old_widget(&self, id: ElementId) -> Option<&Widget> {
        self.node(id).ok().and_then(|node| node.old_widget.as_ref())
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).ok().and_then(|node| node.parent)
    }

    pub fn owner(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).ok().and_then(|node| node.owner)
    }

    pub fn child(&self, id: ElementId, index: usize) -> Option<ElementId> {
        self.node(id)
            .ok()
            .and_then(|node| node.children.get(index).copied().flatten())
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.node(id)
            .map(|node| node.children.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_dirty(&self, id: ElementId) -> bool {
        self.node(id).map(|node| node.flags.dirty.get()).unwrap_or(false)
    }

    pub fn is_mounted(&self, id: ElementId) -> bool {
        self.node(id)
            .map(|node| node.flags.mounted.get())
            .unwrap_or(false)
    }

    pub fn surface(&self, id: ElementId) -> Option<SurfaceId> {
        self.node(id).ok().and_then(|node| node.body.surface())
    }

    /// Constraints from the element's last layout pass.
    pub fn constraints(&self, id: ElementId) -> Option<BoxConstraints> {
        match &self.node(id).ok()?.body {
            ElementBody::Foundation(body) => body.constraints,
            _ => None,
        }
    }

    /// The host-backed element this element's surface is parented under.
    pub fn surface_parent(&self, id: ElementId) -> Option<ElementId> {
        match &self.node(id).ok()?.body {
            ElementBody::Foundation(body) => body.surface_parent,
            _ => None,
        }
    }

    pub fn connection_count(&self, id: ElementId) -> usize {
        match self.node(id).map(|node| &node.body) {
            Ok(ElementBody::Foundation(body)) => body.connections.len(),
            _ => 0,
        }
    }

    /// Stores a host-side connection on a host-backed element, disconnecting
    /// any earlier one under the same key.
    pub fn set_connection(
        &mut self,
        id: ElementId,
        key: impl Into<String>,
        connection: Connection,
    ) -> PianoResult<()> {
        match &mut self.node_mut(id)?.body {
            ElementBody::Foundation(body) => {
                body.connections.set(key, connection);
                Ok(())
            }
            _ => Err(PianoError::NotHostBacked { id }),
        }
    }

    pub fn remove_connection(&mut self, id: ElementId, key: &str) -> PianoResult<bool> {
        match &mut self.node_mut(id)?.body {
            ElementBody::Foundation(body) => Ok(body.connections.remove(key)),
            _ => Err(PianoError::NotHostBacked { id }),
        }
    }

    pub fn widget_name(&self, id: ElementId) -> Option<&'static str> {
        self.node(id).ok().map(ElementNode::widget_name)
    }

    pub fn handle(&self, id: ElementId) -> PianoResult<ElementHandle> {
        let node = self.node(id)?;
        Ok(ElementHandle {
            id,
            flags: node.flags.clone(),
            runtime: self.runtime.clone(),
        })
    }

    pub(crate) fn node(&self, id: ElementId) -> PianoResult<&ElementNode> {
        self.entries
            .get(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_ref())
            .ok_or(PianoError::MissingElement { id })
    }

    pub(crate) fn node_mut(&mut self, id: ElementId) -> PianoResult<&mut ElementNode> {
        self.entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_mut())
            .ok_or(PianoError::MissingElement { id })
    }

    fn node_and_host(
        &mut self,
        id: ElementId,
    ) -> PianoResult<(&mut ElementNode, &mut dyn SurfaceHost)> {
        let node = self
            .entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.node.as_mut())
            .ok_or(PianoError::MissingElement { id })?;
        Ok((node, self.host.as_mut()))
    }

    fn allocate(&mut self, node: ElementNode) -> ElementId {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.node = Some(node);
            ElementId {
                index,
                generation: entry.generation,
            }
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                node: Some(node),
            });
            ElementId {
                index,
                generation: 0,
            }
        }
    }

    fn release(&mut self, id: ElementId) -> Option<ElementNode> {
        let entry = self
            .entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation)?;
        let node = entry.node.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    /// Creates the root element around an existing host surface.
    pub fn create_root(&mut self, surface: SurfaceId) -> ElementId {
        let node = ElementNode::new(None, ElementBody::Root { surface });
        node.flags.dirty.set(false);
        self.allocate(node)
    }

    /// Creates an unmounted element for `widget`.
    ///
    /// Foundation widgets create their surface here; stateful widgets create
    /// and initialise their state.
    pub fn create_element(&mut self, widget: &Widget) -> PianoResult<ElementId> {
        let body = match widget.body() {
            WidgetBody::Foundation(foundation) => {
                let mut connections = Connections::new();
                let surface = {
                    let mut cx = SurfaceContext::new(widget, &mut connections);
                    foundation.create_surface(&mut cx)
                };
                let surface = self.host.insert(surface);
                ElementBody::Foundation(HostBody {
                    surface,
                    constraints: None,
                    connections,
                    surface_parent: None,
                })
            }
            WidgetBody::Stateless(_) => ElementBody::Stateless,
            WidgetBody::Stateful(_) => ElementBody::Stateful { state: None },
            WidgetBody::Hook(_) => ElementBody::Hook {
                slots: Some(HookSlots::new()),
            },
            WidgetBody::Proxy(_) => ElementBody::Proxy,
            WidgetBody::Inherited(_) => ElementBody::Inherited {
                dependents: HashMap::new(),
            },
        };
        let id = self.allocate(ElementNode::new(Some(widget.clone()), body));
        if let WidgetBody::Stateful(stateful) = widget.body() {
            let mut state = stateful.create_state();
            let handle = self.handle(id)?;
            {
                let mut cx = StateContext::new(widget, &handle);
                state.init_state(&mut cx);
            }
            self.restore_state(id, state)?;
        }
        Ok(id)
    }

    /// Attaches an element to its parent and build owner.
    ///
    /// Without an explicit owner the parent's owner is inherited.
    pub fn mount(
        &mut self,
        id: ElementId,
        parent: Option<ElementId>,
        owner: Option<ElementId>,
    ) -> PianoResult<()> {
        let inherited = match parent {
            Some(parent) => self.node(parent)?.owner,
            None => None,
        };
        let node = self.node_mut(id)?;
        if node.flags.mounted.get() {
            log::warn!("{} ({id}) mounted twice", node.widget_name());
        }
        node.parent = parent;
        node.owner = owner.or(inherited);
        node.flags.owned.set(node.owner.is_some());
        node.flags.mounted.set(true);
        Ok(())
    }

    /// Installs `widget` on the element and brings its subtree up to date.
    ///
    /// The widget must be of the same concrete type as the one the element
    /// was created for; use [`Self::update_child`] to replace a slot.
    pub fn update(&mut self, id: ElementId, widget: Widget) -> PianoResult<()> {
        let kind = {
            let node = self.node_mut(id)?;
            let kind = node.body.kind();
            let same_kind = node
                .widget
                .as_ref()
                .map_or(true, |current| current.same_kind(&widget));
            if !kind.accepts(widget.variant()) || !same_kind {
                return Err(PianoError::WidgetMismatch {
                    expected: node.widget_name(),
                    found: widget.name(),
                });
            }
            let previous = node.widget.replace(widget.clone());
            node.old_widget = if node.updated { previous } else { None };
            node.updated = true;
            kind
        };
        match kind {
            ElementKind::Root => Ok(()),
            ElementKind::Foundation => {
                self.node(id)?.flags.dirty.set(false);
                self.update_foundation(id, &widget)
            }
            ElementKind::Stateless | ElementKind::Hook => {
                self.node(id)?.flags.dirty.set(true);
                self.rebuild(id)
            }
            ElementKind::Stateful => self.update_stateful(id, &widget),
            ElementKind::Proxy => self.update_proxy(id, &widget),
            ElementKind::Inherited => {
                self.update_proxy(id, &widget)?;
                self.notify_dependents(id)
            }
        }
    }

    fn update_foundation(&mut self, id: ElementId, widget: &Widget) -> PianoResult<()> {
        let foundation = widget
            .as_foundation()
            .cloned()
            .ok_or(PianoError::WidgetMismatch {
                expected: "FoundationWidget",
                found: widget.name(),
            })?;
        let (parent, surface, attached) = {
            let (node, host) = self.node_and_host(id)?;
            let old_widget = node.old_widget.clone();
            let parent = node.parent;
            let ElementBody::Foundation(body) = &mut node.body else {
                return Err(PianoError::NotHostBacked { id });
            };
            let surface = host.get_mut(body.surface)?;
            let mut cx = SurfaceContext::new(widget, &mut body.connections);
            if !foundation.update_surface(&mut cx, surface, old_widget.as_ref()) {
                log::trace!("{} kept its surface without an in-place update", widget.name());
            }
            (parent, body.surface, body.surface_parent.is_some())
        };

        self.update_children(id, foundation.children())?;

        if let (Some(parent), false) = (parent, attached) {
            self.host.get_mut(surface)?.set_name(widget.name());
            let surface_parent = self.connect_component_to_parent(parent, surface)?;
            if let ElementBody::Foundation(body) = &mut self.node_mut(id)?.body {
                body.surface_parent = surface_parent;
            }
        }
        Ok(())
    }

    fn update_stateful(&mut self, id: ElementId, widget: &Widget) -> PianoResult<()> {
        if let Some(old_widget) = self.node(id)?.old_widget.clone() {
            let handle = self.handle(id)?;
            let mut state = self.take_state(id)?;
            {
                let mut cx = StateContext::new(widget, &handle);
                state.did_update_widget(&mut cx, &old_widget);
            }
            self.restore_state(id, state)?;
        }
        self.node(id)?.flags.dirty.set(true);
        self.rebuild(id)
    }

    fn update_proxy(&mut self, id: ElementId, widget: &Widget) -> PianoResult<()> {
        let child = match widget.body() {
            WidgetBody::Proxy(proxy) => proxy.child(),
            WidgetBody::Inherited(inherited) => inherited.child(),
            _ => {
                return Err(PianoError::WidgetMismatch {
                    expected: "ProxyWidget",
                    found: widget.name(),
                })
            }
        };
        self.update_child(id, 0, None, Some(child))?;
        self.node(id)?.flags.dirty.set(false);
        Ok(())
    }

    fn take_state(&mut self, id: ElementId) -> PianoResult<Box<dyn State>> {
        match &mut self.node_mut(id)?.body {
            ElementBody::Stateful { state } => state.take().ok_or(PianoError::Reentrant { id }),
            _ => Err(PianoError::Reentrant { id }),
        }
    }

    fn restore_state(&mut self, id: ElementId, value: Box<dyn State>) -> PianoResult<()> {
        if let ElementBody::Stateful { state } = &mut self.node_mut(id)?.body {
            *state = Some(value);
        }
        Ok(())
    }

    fn take_hooks(&mut self, id: ElementId) -> PianoResult<HookSlots> {
        match &mut self.node_mut(id)?.body {
            ElementBody::Hook { slots } => slots.take().ok_or(PianoError::Reentrant { id }),
            _ => Err(PianoError::Reentrant { id }),
        }
    }

    fn restore_hooks(&mut self, id: ElementId, value: HookSlots) -> PianoResult<()> {
        if let ElementBody::Hook { slots } = &mut self.node_mut(id)?.body {
            *slots = Some(value);
        }
        Ok(())
    }

    /// Marks the element dirty and, if it has an owner, queues it for the
    /// next tick.
    pub fn mark_rebuild(&self, id: ElementId) -> PianoResult<bool> {
        let node = self.node(id)?;
        Ok(request_rebuild(id, &node.flags, &self.runtime))
    }

    /// Re-runs the element's build if it is dirty and reconciles the result
    /// into child slot 0.
    pub fn rebuild(&mut self, id: ElementId) -> PianoResult<()> {
        let flags = self.node(id)?.flags.clone();
        if !flags.dirty.get() {
            return Ok(());
        }
        flags.dirty.set(false);
        let result = self.perform_rebuild(id);
        if result.is_err() && flags.mounted.get() {
            flags.dirty.set(true);
        }
        result
    }

    fn perform_rebuild(&mut self, id: ElementId) -> PianoResult<()> {
        let Some(widget) = self.node(id)?.widget.clone() else {
            return Ok(());
        };
        let child = match widget.body().clone() {
            WidgetBody::Foundation(_) => return Ok(()),
            WidgetBody::Stateless(stateless) => {
                let handle = self.handle(id)?;
                let mut cx = BuildContext::new(self, handle, widget.clone(), None);
                stateless.build(&mut cx)?
            }
            WidgetBody::Stateful(_) => {
                let handle = self.handle(id)?;
                let mut state = self.take_state(id)?;
                let built = {
                    let mut cx = BuildContext::new(self, handle, widget.clone(), None);
                    state.build(&mut cx)
                };
                self.restore_state(id, state)?;
                built?
            }
            WidgetBody::Hook(hook) => {
                let handle = self.handle(id)?;
                let slots = self.take_hooks(id)?;
                let (built, frame) = {
                    let mut cx =
                        BuildContext::new(self, handle, widget.clone(), Some(HookFrame::new(slots)));
                    let built = hook.build(&mut cx);
                    (built, cx.into_hook_frame())
                };
                if let Some(frame) = frame {
                    if frame.used() != frame.len() {
                        log::warn!(
                            "{} called {} hooks but has {} slots",
                            widget.name(),
                            frame.used(),
                            frame.len()
                        );
                    }
                    self.restore_hooks(id, frame.into_slots())?;
                }
                built?
            }
            WidgetBody::Proxy(proxy) => proxy.child(),
            WidgetBody::Inherited(inherited) => inherited.child(),
        };
        self.update_child(id, 0, None, Some(child))?;
        Ok(())
    }

    fn set_child_slot(
        &mut self,
        id: ElementId,
        index: usize,
        child: Option<ElementId>,
    ) -> PianoResult<()> {
        let children = &mut self.node_mut(id)?.children;
        if children.len() <= index {
            children.resize(index + 1, None);
        }
        children[index] = child;
        Ok(())
    }

    /// Reconciles child slot `index` against `widget`.
    ///
    /// A child of the same kind is updated in place; a different kind is
    /// unmounted and replaced; a missing widget removes the child. With no
    /// existing child, `explicit` is installed as is when given, otherwise
    /// the widget is inflated.
    pub fn update_child(
        &mut self,
        id: ElementId,
        index: usize,
        explicit: Option<ElementId>,
        widget: Option<Widget>,
    ) -> PianoResult<Option<ElementId>> {
        let existing = self.child(id, index);
        match (existing, widget) {
            (Some(child), Some(widget)) => {
                let same = self
                    .widget(child)
                    .map(|current| current.same_kind(&widget))
                    .unwrap_or(false);
                if same {
                    self.update(child, widget)?;
                    Ok(Some(child))
                } else {
                    self.unmount(child)?;
                    self.inflate_widget(id, widget, Some(index)).map(Some)
                }
            }
            (Some(child), None) => {
                self.unmount(child)?;
                self.set_child_slot(id, index, None)?;
                Ok(None)
            }
            (None, Some(widget)) => match explicit {
                Some(element) => {
                    self.set_child_slot(id, index, Some(element))?;
                    if self.is_mounted(element) {
                        self.node_mut(element)?.parent = Some(id);
                    } else {
                        self.mount(element, Some(id), None)?;
                        self.update(element, widget)?;
                    }
                    Ok(Some(element))
                }
                None => self.inflate_widget(id, widget, Some(index)).map(Some),
            },
            (None, None) => Ok(None),
        }
    }

    /// Reconciles children positionally and unmounts any trailing extras.
    ///
    /// `None` leaves the current children untouched.
    pub fn update_children(
        &mut self,
        id: ElementId,
        new_children: Option<Vec<Widget>>,
    ) -> PianoResult<()> {
        let Some(new_children) = new_children else {
            return Ok(());
        };
        let count = new_children.len();
        for (index, widget) in new_children.into_iter().enumerate() {
            self.update_child(id, index, None, Some(widget))?;
        }
        let excess: Vec<ElementId> = {
            let children = &mut self.node_mut(id)?.children;
            if children.len() > count {
                children.drain(count..).flatten().collect()
            } else {
                Vec::new()
            }
        };
        for child in excess.into_iter().rev() {
            self.unmount(child)?;
        }
        Ok(())
    }

    /// Creates, mounts and updates an element for `widget` under `parent`,
    /// placing it at `index` or appending it.
    pub fn inflate_widget(
        &mut self,
        parent: ElementId,
        widget: Widget,
        index: Option<usize>,
    ) -> PianoResult<ElementId> {
        let child = self.create_element(&widget)?;
        self.mount(child, Some(parent), None)?;
        match index {
            Some(index) => self.set_child_slot(parent, index, Some(child))?,
            None => self.node_mut(parent)?.children.push(Some(child)),
        }
        self.update(child, widget)?;
        Ok(child)
    }

    /// Tears down the element and its subtree.
    ///
    /// Children go first. Surfaces are destroyed and their connections
    /// dropped, state and hooks are disposed exactly once, and provider
    /// subscriptions are released. Unmounting a missing element is a no-op.
    pub fn unmount(&mut self, id: ElementId) -> PianoResult<()> {
        let (parent, children) = {
            let Ok(node) = self.node_mut(id) else {
                return Ok(());
            };
            node.flags.mounted.set(false);
            let children: Vec<ElementId> = node.children.drain(..).flatten().collect();
            (node.parent, children)
        };
        for child in children {
            self.unmount(child)?;
        }
        if let Some(parent) = parent {
            if let Ok(parent) = self.node_mut(parent) {
                for slot in parent.children.iter_mut() {
                    if *slot == Some(id) {
                        *slot = None;
                    }
                }
            }
        }
        self.runtime.forget(id);
        let Some(mut node) = self.release(id) else {
            return Ok(());
        };
        for (provider, _) in node.subscriptions.drain() {
            self.remove_dependent(provider, id);
        }
        match node.body {
            ElementBody::Root { surface } => self.host.destroy(surface)?,
            ElementBody::Foundation(mut body) => {
                body.connections.disconnect_all();
                self.host.destroy(body.surface)?;
            }
            ElementBody::Stateful { state } => {
                if let Some(mut state) = state {
                    state.dispose();
                }
            }
            ElementBody::Hook { slots } => {
                if let Some(mut slots) = slots {
                    slots.dispose_all();
                }
            }
            ElementBody::Stateless | ElementBody::Proxy | ElementBody::Inherited { .. } => {}
        }
        Ok(())
    }

    /// Walks up from `start` to the nearest host-backed element and parents
    /// `surface` under its surface.
    pub(crate) fn connect_component_to_parent(
        &mut self,
        start: ElementId,
        surface: SurfaceId,
    ) -> PianoResult<Option<ElementId>> {
        let mut current = Some(start);
        while let Some(id) = current {
            let (target, parent) = {
                let node = self.node(id)?;
                (node.body.surface(), node.parent)
            };
            if let Some(target) = target {
                self.host.set_parent(surface, Some(target))?;
                return Ok(Some(id));
            }
            current = parent;
        }
        Ok(None)
    }

    /// The nearest host-backed element at or below `id`, following first
    /// children.
    pub fn find_child_with_component(&self, id: ElementId) -> PianoResult<ElementId> {
        let mut current = id;
        loop {
            let node = self.node(current)?;
            if let ElementBody::Foundation(_) = node.body {
                return Ok(current);
            }
            match node.children.first().copied().flatten() {
                Some(child) => current = child,
                None => {
                    return Err(PianoError::NoChildComponent {
                        widget: node.widget_name(),
                    })
                }
            }
        }
    }

    /// [`Self::find_child_with_component`] for every direct child.
    pub fn find_children_with_components(&self, id: ElementId) -> PianoResult<Vec<ElementId>> {
        self.children(id)
            .into_iter()
            .map(|child| self.find_child_with_component(child))
            .collect()
    }

    /// Records `constraints` and runs the foundation widget's layout.
    pub fn layout(&mut self, id: ElementId, constraints: BoxConstraints) -> PianoResult<()> {
        let widget = {
            let node = self.node_mut(id)?;
            let ElementBody::Foundation(body) = &mut node.body else {
                return Err(PianoError::NotHostBacked { id });
            };
            body.constraints = Some(constraints);
            node.widget.as_ref().and_then(Widget::as_foundation).cloned()
        };
        let widget = widget.ok_or(PianoError::NotHostBacked { id })?;
        let mut cx = LayoutContext::new(self, id);
        widget.layout(&mut cx, constraints)
    }

    /// The rendered size of a host-backed element.
    pub fn size(&self, id: ElementId) -> PianoResult<Size> {
        let node = self.node(id)?;
        let surface = node.body.surface().ok_or(PianoError::NotHostBacked { id })?;
        let surface = self.host.get(surface)?;
        match node.widget.as_ref().and_then(Widget::as_foundation) {
            Some(widget) => Ok(widget.size(surface)),
            None => Ok(surface.absolute_size()),
        }
    }

    pub fn position(&self, id: ElementId) -> PianoResult<Point> {
        let surface = self.surface(id).ok_or(PianoError::NotHostBacked { id })?;
        Ok(self.host.get(surface)?.position())
    }

    pub fn set_position(&mut self, id: ElementId, position: Point) -> PianoResult<()> {
        let surface = self.surface(id).ok_or(PianoError::NotHostBacked { id })?;
        self.host.get_mut(surface)?.set_position(position);
        Ok(())
    }

    /// Indented outline of the subtree rooted at `id`.
    pub fn dump_tree(&self, id: ElementId) -> String {
        let mut output = String::new();
        self.dump_element(&mut output, id, 0);
        output
    }

    fn dump_element(&self, output: &mut String, id: ElementId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Ok(node) => {
                output.push_str(&format!("{}[{}] {}", indent, id, node.widget_name()));
                if let Some(surface) = node.body.surface() {
                    output.push_str(&format!(" <surface {surface}>"));
                }
                if node.flags.dirty.get() {
                    output.push_str(" *");
                }
                output.push('\n');
                for child in node.children.iter().flatten() {
                    self.dump_element(output, *child, depth + 1);
                }
            }
            Err(_) => output.push_str(&format!("{}[{}] (missing)\n", indent, id)),
        }
    }
}
