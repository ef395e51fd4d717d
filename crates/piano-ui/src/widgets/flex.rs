//! Linear layouts and the flexible wrappers that share out their free space.

use piano_core::prelude::*;

use super::frame::{expand_to_constraints, frame_surface};

/// How a [`Flexible`] child fills the space it is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlexFit {
    /// The child must fill the space exactly.
    Tight,
    /// The child may be smaller than the space.
    #[default]
    Loose,
}

/// Lays its children out one after another along `axis`.
///
/// Children not wrapped in a [`Flexible`] are laid out unbounded first; the
/// remaining main-axis space is then split between flexible children by
/// their flex factors.
pub struct Flex {
    pub axis: Axis,
    pub children: Vec<Widget>,
}

impl Flex {
    pub fn new(axis: Axis, children: Vec<Widget>) -> Self {
        Self { axis, children }
    }

    fn widget_name(&self) -> &'static str {
        match self.axis {
            Axis::Horizontal => "Row",
            Axis::Vertical => "Column",
        }
    }
}

/// A horizontal [`Flex`].
pub fn row(children: Vec<Widget>) -> Flex {
    Flex::new(Axis::Horizontal, children)
}

/// A vertical [`Flex`].
pub fn column(children: Vec<Widget>) -> Flex {
    Flex::new(Axis::Vertical, children)
}

impl FoundationWidget for Flex {
    fn children(&self) -> Option<Vec<Widget>> {
        Some(self.children.clone())
    }

    fn create_surface(&self, _cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        frame_surface()
    }

    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        _surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        true
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()> {
        let children = cx.children_with_infix::<Flexible>()?;
        expand_to_constraints(cx, constraints, true, true)?;

        let mut used = 0.0;
        let mut total_flex = 0.0;
        for child in &children {
            match child.infix_widget::<Flexible>() {
                Some(flexible) => total_flex += flexible.flex,
                None => {
                    cx.layout_child(child.child, BoxConstraints::unbounded())?;
                    used += self.axis.main(cx.child_size(child.child)?);
                }
            }
        }

        let available = constraints.main_axis_max(self.axis);
        let remaining = available - used;
        if remaining < 0.0 {
            log::warn!("{} overflowed by {} pixels", self.widget_name(), -remaining);
        }
        if total_flex > 0.0 {
            let per_flex = if remaining.is_finite() {
                remaining.max(0.0) / total_flex
            } else {
                log::warn!(
                    "{} has flexible children but an unbounded main axis",
                    self.widget_name()
                );
                0.0
            };
            for child in &children {
                if let Some(flexible) = child.infix_widget::<Flexible>() {
                    let length = per_flex * flexible.flex;
                    cx.layout_child(
                        child.target(),
                        constraints.with_main_axis_length(self.axis, length),
                    )?;
                }
            }
        }

        let mut progress = 0.0;
        for child in &children {
            let target = child.target();
            cx.set_child_position(target, self.axis.point(progress, 0.0))?;
            progress += self.axis.main(cx.child_size(target)?);
        }
        Ok(())
    }
}

impl From<Flex> for Widget {
    fn from(flex: Flex) -> Self {
        Widget::foundation(flex)
    }
}

/// Gives its child a share of a [`Flex`] parent's free space.
pub struct Flexible {
    pub flex: f32,
    pub fit: FlexFit,
    pub child: Widget,
}

impl Flexible {
    pub fn new(flex: f32, child: impl Into<Widget>) -> Self {
        Self {
            flex,
            fit: FlexFit::Loose,
            child: child.into(),
        }
    }

    pub fn with_fit(mut self, fit: FlexFit) -> Self {
        self.fit = fit;
        self
    }
}

/// A [`Flexible`] whose child must fill its share.
pub fn expanded(flex: f32, child: impl Into<Widget>) -> Flexible {
    Flexible::new(flex, child).with_fit(FlexFit::Tight)
}

impl FoundationWidget for Flexible {
    fn children(&self) -> Option<Vec<Widget>> {
        Some(vec![self.child.clone()])
    }

    fn create_surface(&self, _cx: &mut SurfaceContext<'_>) -> Box<dyn Surface> {
        frame_surface()
    }

    fn update_surface(
        &self,
        _cx: &mut SurfaceContext<'_>,
        _surface: &mut dyn Surface,
        _old_widget: Option<&Widget>,
    ) -> bool {
        true
    }

    fn layout(&self, cx: &mut LayoutContext<'_>, constraints: BoxConstraints) -> PianoResult<()> {
        expand_to_constraints(cx, constraints, true, true)?;
        let children = cx.children()?;
        let Some(&child) = children.first() else {
            return Err(PianoError::NoChildComponent { widget: "Flexible" });
        };
        let child_constraints = match self.fit {
            FlexFit::Loose => constraints.loosen(),
            FlexFit::Tight => constraints,
        };
        cx.layout_child(child, child_constraints)
    }
}

impl From<Flexible> for Widget {
    fn from(flexible: Flexible) -> Self {
        Widget::foundation(flexible)
    }
}
