use std::rc::Rc;

use piano_ui_graphics::{Point, Size};
use piano_ui_layout::BoxConstraints;

use crate::element::{ElementBody, ElementHandle, ElementId, ElementTree};
use crate::hook::{Hook, HookFrame};
use crate::provider::Aspect;
use crate::surface::{Connection, Connections, Surface};
use crate::widget::{InheritedWidget, Widget};
use crate::{PianoError, PianoResult};

fn typed_widget<W: 'static>(widget: &Widget) -> PianoResult<Rc<W>> {
    widget.downcast_rc::<W>().ok_or(PianoError::WidgetMismatch {
        expected: std::any::type_name::<W>(),
        found: widget.name(),
    })
}

/// Handed to [`crate::FoundationWidget`] while it creates or updates its
/// surface.
pub struct SurfaceContext<'a> {
    widget: &'a Widget,
    connections: &'a mut Connections,
}

impl<'a> SurfaceContext<'a> {
    pub(crate) fn new(widget: &'a Widget, connections: &'a mut Connections) -> Self {
        Self {
            widget,
            connections,
        }
    }

    pub fn widget(&self) -> &Widget {
        self.widget
    }

    /// Keeps `connection` alive until the element unmounts or the key is
    /// reused.
    pub fn connect(&mut self, key: impl Into<String>, connection: Connection) {
        self.connections.set(key, connection);
    }

    pub fn disconnect(&mut self, key: &str) -> bool {
        self.connections.remove(key)
    }

    pub fn is_connected(&self, key: &str) -> bool {
        self.connections.contains(key)
    }
}

/// Handed to [`crate::State`] lifecycle callbacks.
pub struct StateContext<'a> {
    widget: &'a Widget,
    handle: &'a ElementHandle,
}

impl<'a> StateContext<'a> {
    pub(crate) fn new(widget: &'a Widget, handle: &'a ElementHandle) -> Self {
        Self { widget, handle }
    }

    /// The element's current widget as its concrete type.
    pub fn widget<W: 'static>(&self) -> PianoResult<Rc<W>> {
        typed_widget(self.widget)
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle.clone()
    }
}

/// Handed to every build. Gives access to hooks and providers.
pub struct BuildContext<'a> {
    tree: &'a mut ElementTree,
    handle: ElementHandle,
    widget: Widget,
    hooks: Option<HookFrame>,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(
        tree: &'a mut ElementTree,
        handle: ElementHandle,
        widget: Widget,
        hooks: Option<HookFrame>,
    ) -> Self {
        Self {
            tree,
            handle,
            widget,
            hooks,
        }
    }

    pub(crate) fn into_hook_frame(self) -> Option<HookFrame> {
        self.hooks
    }

    pub fn element_id(&self) -> ElementId {
        self.handle.id()
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle.clone()
    }

    pub fn tree(&self) -> &ElementTree {
        &*self.tree
    }

    /// The widget being built as its concrete type.
    pub fn widget<W: 'static>(&self) -> PianoResult<Rc<W>> {
        typed_widget(&self.widget)
    }

    pub fn mark_rebuild(&self) -> bool {
        self.handle.mark_rebuild()
    }

    /// Runs `hook` in the next slot of the current hook build.
    ///
    /// Only hook widgets have slots; other builds get
    /// [`PianoError::HookOutsideBuild`].
    pub fn use_hook<H: Hook>(&mut self, hook: H) -> PianoResult<H::Output> {
        match self.hooks.as_mut() {
            Some(frame) => Ok(frame.use_hook(hook, &self.handle)),
            None => Err(PianoError::HookOutsideBuild {
                widget: self.widget.name(),
            }),
        }
    }

    /// The nearest ancestor providing `P`.
    pub fn find_provider<P: InheritedWidget>(&self) -> PianoResult<ElementId> {
        self.tree.find_provider::<P>(self.handle.id())
    }

    /// Reads the nearest `P` value without subscribing.
    pub fn read<P: InheritedWidget>(&self) -> PianoResult<P::Value> {
        let provider = self.find_provider::<P>()?;
        self.tree.provider_value::<P>(provider)
    }

    /// The value `P` held before its last update.
    pub fn read_previous<P: InheritedWidget>(&self) -> PianoResult<Option<P::Value>> {
        let provider = self.find_provider::<P>()?;
        self.tree.provider_old_value::<P>(provider)
    }

    /// Reads the nearest `P` value and rebuilds whenever it notifies.
    pub fn watch<P: InheritedWidget>(&mut self) -> PianoResult<P::Value> {
        self.select::<P>(None, |_, _| true)
    }

    /// Reads the nearest `P` value and rebuilds only when `selector`
    /// returns true for a change.
    pub fn select<P: InheritedWidget>(
        &mut self,
        aspect: Option<Aspect>,
        selector: impl Fn(&P::Value, Option<&P::Value>) -> bool + 'static,
    ) -> PianoResult<P::Value> {
        let provider = self.find_provider::<P>()?;
        self.tree
            .subscribe::<P>(self.handle.id(), provider, aspect, selector)?;
        self.tree.provider_value::<P>(provider)
    }
}

/// A host-backed child found below a direct child, with the first wrapper
/// of a requested type met on the way down.
#[derive(Clone, Debug)]
pub struct InfixChild {
    pub infix: Option<(ElementId, Widget)>,
    pub child: ElementId,
}

impl InfixChild {
    pub fn infix_widget<W: 'static>(&self) -> Option<&W> {
        self.infix
            .as_ref()
            .and_then(|(_, widget)| widget.downcast_ref::<W>())
    }

    /// The element a parent should lay out and position: the wrapper if
    /// there is one, otherwise the child.
    pub fn target(&self) -> ElementId {
        self.infix.as_ref().map(|(id, _)| *id).unwrap_or(self.child)
    }
}

/// Handed to [`crate::FoundationWidget::layout`].
pub struct LayoutContext<'a> {
    tree: &'a mut ElementTree,
    element: ElementId,
}

impl<'a> LayoutContext<'a> {
    pub(crate) fn new(tree: &'a mut ElementTree, element: ElementId) -> Self {
        Self { tree, element }
    }

    pub fn element_id(&self) -> ElementId {
        self.element
    }

    pub fn tree(&self) -> &ElementTree {
        &*self.tree
    }

    /// The nearest host-backed element under each direct child.
    pub fn children(&self) -> PianoResult<Vec<ElementId>> {
        self.tree.find_children_with_components(self.element)
    }

    /// Like [`Self::children`], also reporting the first `W` passed on the
    /// way down from each direct child.
    pub fn children_with_infix<W: 'static>(&self) -> PianoResult<Vec<InfixChild>> {
        let mut found = Vec::new();
        for child in self.tree.children(self.element) {
            let mut current = child;
            let mut infix: Option<(ElementId, Widget)> = None;
            loop {
                let node = self.tree.node(current)?;
                let is_infix = node.widget.as_ref().map(Widget::is::<W>).unwrap_or(false);
                if is_infix && infix.is_none() {
                    infix = node.widget.clone().map(|widget| (current, widget));
                } else if !is_infix && matches!(node.body, ElementBody::Foundation(_)) {
                    found.push(InfixChild {
                        infix,
                        child: current,
                    });
                    break;
                }
                match node.children.first().copied().flatten() {
                    Some(next) => current = next,
                    None => {
                        return Err(PianoError::NoChildComponent {
                            widget: node.widget.as_ref().map(Widget::name).unwrap_or("Root"),
                        })
                    }
                }
            }
        }
        Ok(found)
    }

    pub fn layout_child(&mut self, child: ElementId, constraints: BoxConstraints) -> PianoResult<()> {
        self.tree.layout(child, constraints)
    }

    pub fn child_size(&self, child: ElementId) -> PianoResult<Size> {
        self.tree.size(child)
    }

    pub fn set_child_position(&mut self, child: ElementId, position: Point) -> PianoResult<()> {
        self.tree.set_position(child, position)
    }

    pub fn size(&self) -> PianoResult<Size> {
        self.tree.size(self.element)
    }

    pub fn set_size(&mut self, size: Size) -> PianoResult<()> {
        let surface = self.surface_id()?;
        self.tree.host_mut().get_mut(surface)?.set_size(size);
        Ok(())
    }

    pub fn with_surface<R>(&mut self, f: impl FnOnce(&mut dyn Surface) -> R) -> PianoResult<R> {
        let surface = self.surface_id()?;
        Ok(f(self.tree.host_mut().get_mut(surface)?))
    }

    fn surface_id(&self) -> PianoResult<crate::SurfaceId> {
        self.tree
            .surface(self.element)
            .ok_or(PianoError::NotHostBacked { id: self.element })
    }
}
