use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use piano_ui_graphics::Size;
use piano_ui_layout::BoxConstraints;

use crate::context::{BuildContext, LayoutContext, StateContext, SurfaceContext};
use crate::surface::Surface;
use crate::PianoResult;

/// The six element kinds a widget can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetVariant {
    Foundation,
    Stateless,
    Stateful,
    Hook,
    Proxy,
    Inherited,
}

/// Variant plus concrete type; two widgets of the same kind reuse an element.
#[derive(Clone, Copy, Debug)]
pub struct WidgetKind {
    variant: WidgetVariant,
    type_id: TypeId,
    type_name: &'static str,
}

impl WidgetKind {
    fn of<W: 'static>(variant: WidgetVariant) -> Self {
        Self {
            variant,
            type_id: TypeId::of::<W>(),
            type_name: std::any::type_name::<W>(),
        }
    }

    pub fn variant(&self) -> WidgetVariant {
        self.variant
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self
            .type_name
            .split('<')
            .next()
            .unwrap_or(self.type_name);
        match base.rfind("::") {
            Some(index) => &self.type_name[index + 2..],
            None => self.type_name,
        }
    }
}

impl PartialEq for WidgetKind {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant && self.type_id == other.type_id
    }
}

impl Eq for WidgetKind {}

/// Immutable description of a piece of UI.
///
/// Cloning a widget is cheap; the configuration itself is shared.
#[derive(Clone)]
pub struct Widget {
    kind: WidgetKind,
    body: WidgetBody,
    any: Rc<dyn Any>,
}

#[derive(Clone)]
pub(crate) enum WidgetBody {
    Foundation(Rc<dyn FoundationWidget>),
    Stateless(Rc<dyn StatelessWidget>),
    Stateful(Rc<dyn StatefulWidget>),
    Hook(Rc<dyn HookWidget>),
    Proxy(Rc<dyn ProxyWidget>),
    Inherited(Rc<dyn InheritedBody>),
}

impl Widget {
    pub fn foundation<W: FoundationWidget>(widget: W) -> Self {
        let rc = Rc::new(widget);
        Self {
            kind: WidgetKind::of::<W>(WidgetVariant::Foundation),
            any: rc.clone(),
            body: WidgetBody::Foundation(rc),
        }
    }

    pub fn stateless<W: StatelessWidget>(widget: W) -> Self {
        let rc = Rc::new(widget);
        Self {
            kind: WidgetKind::of::<W>(WidgetVariant::Stateless),
            any: rc.clone(),
            body: WidgetBody::Stateless(rc),
        }
    }

    pub fn stateful<W: StatefulWidget>(widget: W) -> Self {
        let rc = Rc::new(widget);
        Self {
            kind: WidgetKind::of::<W>(WidgetVariant::Stateful),
            any: rc.clone(),
            body: WidgetBody::Stateful(rc),
        }
    }

    pub fn hook<W: HookWidget>(widget: W) -> Self {
        let rc = Rc::new(widget);
        Self {
            kind: WidgetKind::of::<W>(WidgetVariant::Hook),
            any: rc.clone(),
            body: WidgetBody::Hook(rc),
        }
    }

    pub fn proxy<W: ProxyWidget>(widget: W) -> Self {
        let rc = Rc::new(widget);
        Self {
            kind: WidgetKind::of::<W>(WidgetVariant::Proxy),
            any: rc.clone(),
            body: WidgetBody::Proxy(rc),
        }
    }

    pub fn inherited<W: InheritedWidget>(widget: W) -> Self {
        let rc = Rc::new(widget);
        Self {
            kind: WidgetKind::of::<W>(WidgetVariant::Inherited),
            any: rc.clone(),
            body: WidgetBody::Inherited(rc),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn variant(&self) -> WidgetVariant {
        self.kind.variant
    }

    pub fn name(&self) -> &'static str {
        self.kind.short_name()
    }

    /// Whether an element built for `self` can be updated to `other`.
    pub fn same_kind(&self, other: &Widget) -> bool {
        self.kind == other.kind
    }

    pub fn is<W: 'static>(&self) -> bool {
        self.any.is::<W>()
    }

    pub fn downcast_ref<W: 'static>(&self) -> Option<&W> {
        self.any.downcast_ref::<W>()
    }

    pub fn downcast_rc<W: 'static>(&self) -> Option<Rc<W>> {
        self.any.clone().downcast::<W>().ok()
    }

    pub(crate) fn body(&self) -> &WidgetBody {
        &self.body
    }

    pub(crate) fn as_foundation(&self) -> Option<&Rc<dyn FoundationWidget>> {
        match &self.body {
            WidgetBody::Foundation(widget) => Some(widget),
            _ => None,
        }
    }

    pub(crate) fn as_inherited(&self) -> Option<&Rc<dyn InheritedBody>> {
        match &self.body {
            WidgetBody::Inherited(widget) => Some(widget),
            _ => None,
        }
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("variant", &self.kind.variant)
            .field("type", &self.kind.type_name)
            .finish()
    }
}

/// A widget backed by a host surface.
pub trait FoundationWidget: 'static {
    /// Child widgets to reconcile on update. `None` leaves existing child
    /// elements untouched.
    fn children(&self) -> Option<Vec<Widget>> {
        None
    }

    fn create_surface(&self, cx: &mut SurfaceContext<'_>) -> Box<dyn Surface>;

    /// Applies this widget's configuration to an existing surface.
    ///
    /// Returning `false` means the surface could not be updated in place.
    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        _surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        false
    }

    fn size(&self, surface: &dyn Surface) -> Size {
        surface.absolute_size()
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()>;
}

pub trait StatelessWidget: 'static {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget>;
}

pub trait StatefulWidget: 'static {
    fn create_state(&self) -> Box<dyn State>;
}

/// Mutable companion of a [`StatefulWidget`], kept for the element's lifetime.
pub trait State: 'static {
    fn init_state(&mut self, _cx: &mut StateContext<'_>) {}

    fn did_update_widget(&mut self, _cx: &mut StateContext<'_>, _old_widget: &Widget) {}

    fn build(&mut self, cx: &mut BuildContext<'_>) -> PianoResult<Widget>;

    fn dispose(&mut self) {}
}

/// A widget whose build may call hooks through its [`BuildContext`].
pub trait HookWidget: 'static {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget>;
}

/// A widget that forwards to exactly one child.
pub trait ProxyWidget: 'static {
    fn child(&self) -> Widget;
}

/// A proxy that exposes a value to its descendants.
pub trait InheritedWidget: 'static {
    type Value: Clone + 'static;

    fn child(&self) -> Widget;

    fn value(&self) -> Self::Value;

    /// Whether dependents should be told about the change from `old`.
    fn update_should_notify(&self, old: &Self) -> bool;
}

/// Type-erased view of an [`InheritedWidget`].
pub(crate) trait InheritedBody {
    fn child(&self) -> Widget;

    fn should_notify(&self, old: &Widget) -> bool;
}

impl<W: InheritedWidget> InheritedBody for W {
    fn child(&self) -> Widget {
        InheritedWidget::child(self)
    }

    fn should_notify(&self, old: &Widget) -> bool {
        match old.downcast_ref::<W>() {
            Some(old) => self.update_should_notify(old),
            None => true,
        }
    }
}
