//! The boundary between Piano and the host's retained surface graph.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use piano_ui_graphics::{Point, Size};

use crate::collections::map::HashMap;

pub type SurfaceId = usize;

/// Object-safe access to `Any` for trait objects built on top of it.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A rectangular host-side object that a foundation element owns.
pub trait Surface: AsAny {
    fn class_name(&self) -> &'static str;

    fn name(&self) -> &str {
        ""
    }

    fn set_name(&mut self, _name: &str) {}

    fn size(&self) -> Size;

    fn set_size(&mut self, size: Size);

    fn position(&self) -> Point;

    fn set_position(&mut self, position: Point);

    /// The size the host actually renders, after host-side adjustments such
    /// as text auto-sizing.
    fn absolute_size(&self) -> Size {
        self.size()
    }
}

/// Typed access to a surface behind `dyn Surface`.
pub trait SurfaceExt {
    fn downcast_ref<S: Surface>(&self) -> Option<&S>;
    fn downcast_mut<S: Surface>(&mut self) -> Option<&mut S>;
}

impl<T: Surface + ?Sized> SurfaceExt for T {
    fn downcast_ref<S: Surface>(&self) -> Option<&S> {
        self.as_any().downcast_ref::<S>()
    }

    fn downcast_mut<S: Surface>(&mut self) -> Option<&mut S> {
        self.as_any_mut().downcast_mut::<S>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Missing { id: SurfaceId },
    TypeMismatch { id: SurfaceId, expected: &'static str },
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Missing { id } => write!(f, "surface {id} missing"),
            SurfaceError::TypeMismatch { id, expected } => {
                write!(f, "surface {id} type mismatch; expected {expected}")
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

/// The host's surface graph.
///
/// Piano creates, parents and destroys surfaces through this trait only; it
/// never reads a surface's children back.
pub trait SurfaceHost: AsAny {
    fn insert(&mut self, surface: Box<dyn Surface>) -> SurfaceId;

    fn get(&self, id: SurfaceId) -> Result<&dyn Surface, SurfaceError>;

    fn get_mut(&mut self, id: SurfaceId) -> Result<&mut dyn Surface, SurfaceError>;

    fn set_parent(&mut self, id: SurfaceId, parent: Option<SurfaceId>) -> Result<(), SurfaceError>;

    fn parent(&self, id: SurfaceId) -> Result<Option<SurfaceId>, SurfaceError>;

    fn destroy(&mut self, id: SurfaceId) -> Result<(), SurfaceError>;

    /// Subscribe to changes of a surface's rendered size.
    fn connect_absolute_size_changed(
        &mut self,
        id: SurfaceId,
        handler: Box<dyn Fn(Size)>,
    ) -> Result<Connection, SurfaceError>;
}

impl dyn SurfaceHost {
    pub fn downcast_ref<H: SurfaceHost>(&self) -> Option<&H> {
        self.as_any().downcast_ref::<H>()
    }

    pub fn downcast_mut<H: SurfaceHost>(&mut self) -> Option<&mut H> {
        self.as_any_mut().downcast_mut::<H>()
    }

    pub fn with_surface<S: Surface, R>(
        &mut self,
        id: SurfaceId,
        f: impl FnOnce(&mut S) -> R,
    ) -> Result<R, SurfaceError> {
        let surface = self.get_mut(id)?;
        let typed = surface
            .downcast_mut::<S>()
            .ok_or(SurfaceError::TypeMismatch {
                id,
                expected: std::any::type_name::<S>(),
            })?;
        Ok(f(typed))
    }
}

/// A live subscription. Dropping it disconnects.
pub struct Connection {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl Connection {
    pub fn new(disconnect: impl FnOnce() + 'static) -> Self {
        Self {
            disconnect: Some(Box::new(disconnect)),
        }
    }

    /// A connection with nothing to undo.
    pub fn empty() -> Self {
        Self { disconnect: None }
    }

    pub fn is_connected(&self) -> bool {
        self.disconnect.is_some()
    }

    pub fn disconnect(mut self) {
        self.run_disconnect();
    }

    fn run_disconnect(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.run_disconnect();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Named connections held by a foundation element.
#[derive(Default, Debug)]
pub struct Connections {
    map: HashMap<String, Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `connection` under `key`, disconnecting whatever was there.
    pub fn set(&mut self, key: impl Into<String>, connection: Connection) {
        if let Some(previous) = self.map.insert(key.into(), connection) {
            previous.disconnect();
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        match self.map.remove(key) {
            Some(connection) => {
                connection.disconnect();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn disconnect_all(&mut self) -> usize {
        let count = self.map.len();
        for (_, connection) in self.map.drain() {
            connection.disconnect();
        }
        count
    }
}

type Handler<T> = Rc<dyn Fn(&T)>;

struct SignalInner<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// A host-side event source.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn connect(&self, handler: impl Fn(&T) + 'static) -> Connection {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.push((id, Rc::new(handler)));
            id
        };
        let weak: Weak<RefCell<SignalInner<T>>> = Rc::downgrade(&self.inner);
        Connection::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    pub fn fire(&self, value: &T) {
        // handlers may connect or disconnect while running
        let handlers: Vec<Handler<T>> = self
            .inner
            .borrow()
            .handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(value);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// A plain rectangular surface.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Frame {
    pub name: String,
    pub size: Size,
    pub position: Point,
}

impl Frame {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

impl Surface for Frame {
    fn class_name(&self) -> &'static str {
        "Frame"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }
}

struct SurfaceEntry {
    surface: Box<dyn Surface>,
    parent: Option<SurfaceId>,
    children: Vec<SurfaceId>,
    absolute_size_changed: Signal<Size>,
}

/// In-memory [`SurfaceHost`] used by headless hosts and tests.
#[derive(Default)]
pub struct MemoryHost {
    surfaces: Vec<Option<SurfaceEntry>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.surfaces.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        matches!(self.surfaces.get(id), Some(Some(_)))
    }

    pub fn children(&self, id: SurfaceId) -> Result<&[SurfaceId], SurfaceError> {
        Ok(&self.entry(id)?.children)
    }

    pub fn with_surface<S: Surface, R>(
        &mut self,
        id: SurfaceId,
        f: impl FnOnce(&mut S) -> R,
    ) -> Result<R, SurfaceError> {
        let surface = self.entry_mut(id)?.surface.as_mut();
        let typed = surface
            .downcast_mut::<S>()
            .ok_or(SurfaceError::TypeMismatch {
                id,
                expected: std::any::type_name::<S>(),
            })?;
        Ok(f(typed))
    }

    /// Resizes a surface the way a host window would and fires its
    /// absolute-size signal.
    pub fn resize(&mut self, id: SurfaceId, size: Size) -> Result<(), SurfaceError> {
        let entry = self.entry_mut(id)?;
        entry.surface.set_size(size);
        let absolute = entry.surface.absolute_size();
        let signal = entry.absolute_size_changed.clone();
        signal.fire(&absolute);
        Ok(())
    }

    /// Surfaces in id order as `(id, class name, name)`.
    pub fn snapshot(&self) -> Vec<(SurfaceId, &'static str, String)> {
        self.surfaces
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| {
                entry
                    .as_ref()
                    .map(|e| (id, e.surface.class_name(), e.surface.name().to_owned()))
            })
            .collect()
    }

    pub fn dump_tree(&self, root: Option<SurfaceId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_surface(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_surface(&self, output: &mut String, id: SurfaceId, depth: usize) {
        let indent = "  ".repeat(depth);
        if let Some(Some(entry)) = self.surfaces.get(id) {
            let surface = entry.surface.as_ref();
            let size = surface.size();
            let position = surface.position();
            output.push_str(&format!(
                "{}[{}] {} {:?} {}x{} @ ({}, {})\n",
                indent,
                id,
                surface.class_name(),
                surface.name(),
                size.width,
                size.height,
                position.x,
                position.y
            ));
            for child in &entry.children {
                self.dump_surface(output, *child, depth + 1);
            }
        } else {
            output.push_str(&format!("{}[{}] (missing)\n", indent, id));
        }
    }

    fn entry(&self, id: SurfaceId) -> Result<&SurfaceEntry, SurfaceError> {
        self.surfaces
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(SurfaceError::Missing { id })
    }

    fn entry_mut(&mut self, id: SurfaceId) -> Result<&mut SurfaceEntry, SurfaceError> {
        self.surfaces
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(SurfaceError::Missing { id })
    }
}

impl SurfaceHost for MemoryHost {
    fn insert(&mut self, surface: Box<dyn Surface>) -> SurfaceId {
        let id = self.surfaces.len();
        self.surfaces.push(Some(SurfaceEntry {
            surface,
            parent: None,
            children: Vec::new(),
            absolute_size_changed: Signal::new(),
        }));
        id
    }

    fn get(&self, id: SurfaceId) -> Result<&dyn Surface, SurfaceError> {
        Ok(self.entry(id)?.surface.as_ref())
    }

    fn get_mut(&mut self, id: SurfaceId) -> Result<&mut dyn Surface, SurfaceError> {
        Ok(self.entry_mut(id)?.surface.as_mut())
    }

    fn set_parent(&mut self, id: SurfaceId, parent: Option<SurfaceId>) -> Result<(), SurfaceError> {
        if let Some(parent_id) = parent {
            self.entry(parent_id)?;
        }
        let previous = std::mem::replace(&mut self.entry_mut(id)?.parent, parent);
        if let Some(previous_id) = previous {
            if let Ok(previous_entry) = self.entry_mut(previous_id) {
                previous_entry.children.retain(|child| *child != id);
            }
        }
        if let Some(parent_id) = parent {
            self.entry_mut(parent_id)?.children.push(id);
        }
        Ok(())
    }

    fn parent(&self, id: SurfaceId) -> Result<Option<SurfaceId>, SurfaceError> {
        Ok(self.entry(id)?.parent)
    }

    fn destroy(&mut self, id: SurfaceId) -> Result<(), SurfaceError> {
        let entry = self
            .surfaces
            .get_mut(id)
            .and_then(Option::take)
            .ok_or(SurfaceError::Missing { id })?;
        if let Some(parent_id) = entry.parent {
            if let Ok(parent) = self.entry_mut(parent_id) {
                parent.children.retain(|child| *child != id);
            }
        }
        for child in entry.children {
            if let Ok(child_entry) = self.entry_mut(child) {
                child_entry.parent = None;
            }
        }
        Ok(())
    }

    fn connect_absolute_size_changed(
        &mut self,
        id: SurfaceId,
        handler: Box<dyn Fn(Size)>,
    ) -> Result<Connection, SurfaceError> {
        let entry = self.entry(id)?;
        Ok(entry
            .absolute_size_changed
            .connect(move |size: &Size| handler(*size)))
    }
}
