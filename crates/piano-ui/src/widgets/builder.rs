use std::rc::Rc;

use piano_core::prelude::*;

type BuildFn = Rc<dyn Fn(&mut BuildContext<'_>) -> PianoResult<Widget>>;

/// A stateless widget whose build is a closure.
#[derive(Clone)]
pub struct Builder {
    build: BuildFn,
}

impl Builder {
    pub fn new(build: impl Fn(&mut BuildContext<'_>) -> PianoResult<Widget> + 'static) -> Self {
        Self {
            build: Rc::new(build),
        }
    }
}

impl StatelessWidget for Builder {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        (self.build)(cx)
    }
}

impl From<Builder> for Widget {
    fn from(builder: Builder) -> Self {
        Widget::stateless(builder)
    }
}
