use log::{error, info};
use piano_core::{MemoryHost, MountOptions, SurfaceExt, SurfaceHost, SurfaceId};
use piano_runtime_std::StdRuntime;
use piano_ui::prelude::*;

const VIEWPORT: Size = Size {
    width: 320.0,
    height: 240.0,
};
const CLICKS: usize = 3;
const MAX_TICKS_PER_FRAME: usize = 8;

/// How much one click adds, provided from above the counter.
struct Step {
    amount: u32,
    child: Widget,
}

impl InheritedWidget for Step {
    type Value = u32;

    fn child(&self) -> Widget {
        self.child.clone()
    }

    fn value(&self) -> u32 {
        self.amount
    }

    fn update_should_notify(&self, old: &Self) -> bool {
        self.amount != old.amount
    }
}

struct Counter;

impl HookWidget for Counter {
    fn build(&self, cx: &mut BuildContext<'_>) -> PianoResult<Widget> {
        let step = cx.watch::<Step>()?;
        let (count, set_count) = use_state(cx, || 0u32)?;
        Ok(Padding::new(
            EdgeInsets::all(8.0),
            column(vec![
                TextButton::new("Increment", move || set_count.update(|count| *count += step))
                    .into(),
                Center::new(Text::new(format!("Count: {count}"))).into(),
            ]),
        )
        .into())
    }
}

fn home() -> Widget {
    Widget::inherited(Step {
        amount: 2,
        child: Widget::hook(Counter),
    })
}

fn find_surface(host: &MemoryHost, class_name: &str) -> Option<SurfaceId> {
    host.snapshot()
        .into_iter()
        .find(|(_, class, _)| *class == class_name)
        .map(|(id, _, _)| id)
}

fn label_text(host: &MemoryHost) -> Option<String> {
    let id = find_surface(host, "TextLabel")?;
    let surface = host.get(id).ok()?;
    surface
        .downcast_ref::<TextLabel>()
        .map(|label| label.text().to_owned())
}

fn main() {
    env_logger::init();

    println!("=== Piano Headless Counter ===");
    println!("Presses the Increment button {CLICKS} times and pumps a frame after each press.");
    println!();

    let runtime = StdRuntime::new();
    runtime.set_frame_waker(|| log::debug!("frame requested"));

    let options = MountOptions::default()
        .with_viewport(VIEWPORT)
        .with_root_name("PianoDemo")
        .with_log_tree(true);
    let mut root = match runtime.mount(MemoryHost::new(), home(), options) {
        Ok(root) => root,
        Err(err) => {
            error!("failed to mount the demo: {err}");
            std::process::exit(1);
        }
    };

    for click in 1..=CLICKS {
        let Some(host) = root.host_mut::<MemoryHost>() else {
            error!("demo root is not backed by a memory host");
            break;
        };
        let Some(button) = find_surface(host, "TextButton") else {
            error!("no button surface to press");
            break;
        };
        if let Err(err) =
            host.with_surface::<TextButtonSurface, _>(button, |button| button.activate())
        {
            error!("press {click} failed: {err}");
            break;
        }

        match runtime.pump(&mut root, MAX_TICKS_PER_FRAME) {
            Ok(ticks) => info!("press {click} settled after {ticks} tick(s)"),
            Err(err) => {
                error!("tick failed after press {click}: {err}");
                break;
            }
        }

        if let Some(text) = root.host::<MemoryHost>().and_then(label_text) {
            println!("after press {click}: {text}");
        }
    }

    if let Some(host) = root.host::<MemoryHost>() {
        println!();
        println!("{}", host.dump_tree(Some(root.root_surface())));
    }

    match root.unmount() {
        Ok(host) => {
            let remaining = host
                .downcast_ref::<MemoryHost>()
                .map(MemoryHost::len)
                .unwrap_or_default();
            info!("unmounted; {remaining} surface(s) left");
        }
        Err(err) => error!("unmount failed: {err}"),
    }
}
