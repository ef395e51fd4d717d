//! Inherited values: lookup, subscription and change notification.

use std::any::{Any, TypeId};
use std::rc::Rc;

use crate::element::{ElementBody, ElementId, ElementTree};
use crate::runtime::DeferredTask;
use crate::widget::{InheritedWidget, Widget, WidgetVariant};
use crate::{PianoError, PianoResult};

/// Opaque per-dependent data a provider keeps alongside each subscription.
pub type Aspect = Rc<dyn Any>;

/// Decides, from the provider's new and old widget, whether a dependent
/// rebuilds.
pub(crate) type Selector = Rc<dyn Fn(&Widget, Option<&Widget>) -> bool>;

impl ElementTree {
    /// Walks parent links from `from` (exclusive) to the nearest inherited
    /// element whose widget is a `P`.
    pub fn find_provider<P: InheritedWidget>(&self, from: ElementId) -> PianoResult<ElementId> {
        let wanted = TypeId::of::<P>();
        let mut current = self.node(from)?.parent;
        while let Some(id) = current {
            let node = self.node(id)?;
            if let Some(widget) = &node.widget {
                let kind = widget.kind();
                if kind.variant() == WidgetVariant::Inherited && kind.type_id() == wanted {
                    return Ok(id);
                }
            }
            current = node.parent;
        }
        Err(PianoError::ProviderNotFound {
            provider: std::any::type_name::<P>(),
        })
    }

    fn provider_widget<P: InheritedWidget>(&self, provider: ElementId) -> PianoResult<&P> {
        let widget = self
            .node(provider)?
            .widget
            .as_ref()
            .ok_or(PianoError::MissingElement { id: provider })?;
        widget.downcast_ref::<P>().ok_or(PianoError::WidgetMismatch {
            expected: std::any::type_name::<P>(),
            found: widget.name(),
        })
    }

    pub fn provider_value<P: InheritedWidget>(&self, provider: ElementId) -> PianoResult<P::Value> {
        Ok(self.provider_widget::<P>(provider)?.value())
    }

    pub fn provider_old_value<P: InheritedWidget>(
        &self,
        provider: ElementId,
    ) -> PianoResult<Option<P::Value>> {
        Ok(self
            .node(provider)?
            .old_widget
            .as_ref()
            .and_then(|widget| widget.downcast_ref::<P>())
            .map(|widget| widget.value()))
    }

    /// Registers `dependent` with `provider`, replacing any earlier
    /// selector for the same pair.
    pub fn subscribe<P: InheritedWidget>(
        &mut self,
        dependent: ElementId,
        provider: ElementId,
        aspect: Option<Aspect>,
        selector: impl Fn(&P::Value, Option<&P::Value>) -> bool + 'static,
    ) -> PianoResult<()> {
        let selector: Selector = Rc::new(move |new: &Widget, old: Option<&Widget>| {
            let Some(new) = new.downcast_ref::<P>() else {
                return true;
            };
            let old = old
                .and_then(|widget| widget.downcast_ref::<P>())
                .map(|widget| widget.value());
            selector(&new.value(), old.as_ref())
        });
        self.update_dependent(provider, dependent, aspect)?;
        self.node_mut(dependent)?
            .subscriptions
            .insert(provider, selector);
        Ok(())
    }

    /// Stores `aspect` for `dependent` in the provider's dependent list.
    pub fn update_dependent(
        &mut self,
        provider: ElementId,
        dependent: ElementId,
        aspect: Option<Aspect>,
    ) -> PianoResult<()> {
        match &mut self.node_mut(provider)?.body {
            ElementBody::Inherited { dependents } => {
                dependents.insert(dependent, aspect);
                Ok(())
            }
            _ => Err(PianoError::ProviderNotFound {
                provider: "InheritedWidget",
            }),
        }
    }

    pub fn remove_dependent(&mut self, provider: ElementId, dependent: ElementId) -> bool {
        match self.node_mut(provider).map(|node| &mut node.body) {
            Ok(ElementBody::Inherited { dependents }) => dependents.remove(&dependent).is_some(),
            _ => false,
        }
    }

    pub fn dependents(&self, provider: ElementId) -> Vec<ElementId> {
        match self.node(provider).map(|node| &node.body) {
            Ok(ElementBody::Inherited { dependents }) => {
                let mut ids: Vec<ElementId> = dependents.keys().copied().collect();
                ids.sort();
                ids
            }
            _ => Vec::new(),
        }
    }

    pub fn dependent_aspect(&self, provider: ElementId, dependent: ElementId) -> Option<Aspect> {
        match self.node(provider).map(|node| &node.body) {
            Ok(ElementBody::Inherited { dependents }) => dependents.get(&dependent).cloned().flatten(),
            _ => None,
        }
    }

    /// Queues a dependency-change announcement for every dependent when the
    /// provider's widget asks for it.
    pub(crate) fn notify_dependents(&mut self, provider: ElementId) -> PianoResult<()> {
        let node = self.node(provider)?;
        let (Some(widget), Some(old_widget)) = (&node.widget, &node.old_widget) else {
            return Ok(());
        };
        let Some(inherited) = widget.as_inherited() else {
            return Ok(());
        };
        if !inherited.should_notify(old_widget) {
            return Ok(());
        }
        let ElementBody::Inherited { dependents } = &node.body else {
            return Ok(());
        };
        let mut dependents: Vec<ElementId> = dependents.keys().copied().collect();
        dependents.sort();
        for dependent in dependents {
            self.runtime()
                .enqueue_task(DeferredTask::AnnounceDependencyChange {
                    dependent,
                    provider,
                });
        }
        Ok(())
    }

    /// Runs the dependent's selector for `provider` and marks it for
    /// rebuild when the selector asks for one.
    pub(crate) fn announce_dependency_change(
        &mut self,
        dependent: ElementId,
        provider: ElementId,
    ) -> PianoResult<bool> {
        let Ok(node) = self.node(dependent) else {
            return Ok(false);
        };
        let Some(selector) = node.subscriptions.get(&provider).cloned() else {
            log::warn!(
                "provider change announced on {} which is not subscribed to {}",
                node.widget.as_ref().map(Widget::name).unwrap_or("Root"),
                provider
            );
            return Ok(false);
        };
        let Ok(provider_node) = self.node(provider) else {
            return Ok(false);
        };
        let Some(widget) = provider_node.widget.as_ref() else {
            return Ok(false);
        };
        if selector(widget, provider_node.old_widget.as_ref()) {
            self.mark_rebuild(dependent)
        } else {
            Ok(false)
        }
    }

    /// Runs `tasks`; returns how many elements were marked for rebuild.
    pub(crate) fn run_deferred(&mut self, tasks: Vec<DeferredTask>) -> PianoResult<usize> {
        let mut marked = 0;
        for task in tasks {
            let DeferredTask::AnnounceDependencyChange {
                dependent,
                provider,
            } = task;
            if self.announce_dependency_change(dependent, provider)? {
                marked += 1;
            }
        }
        Ok(marked)
    }
}
