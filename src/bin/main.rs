//! A small demo of toarudock on X11.
//!
//! It connects to the X server, tracks every window the window
//! manager publishes, and logs the notifications a dock would react
//! to. Set `RUST_LOG` to change what is logged, for example
//! `RUST_LOG=toarudock=debug`.

use std::error::Error;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopSignal};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use toarudock::manager::{Notification, WindowEvent};
use toarudock::x::{status::Initialized, X11Manager, X11RBConn};
use toarudock::{DockConfig, Runtime};

struct Demo {
    rt: Runtime,
    x11: X11Manager<X11RBConn<Initialized>>,
    signal: LoopSignal,
}

impl Demo {
    fn tick(&mut self) {
        if let Err(e) = self.x11.dispatch_pending(&mut self.rt) {
            error!("Lost the X connection: {}", e);
            self.signal.stop();
            return;
        }
        if self.rt.has_idle_work() {
            self.rt.run_idle();
        }
    }
}

fn log_notification(rt: &mut Runtime, n: &Notification) {
    match n {
        Notification::Window(WindowEvent::Created(id)) => {
            let Some(actor) = rt.window(*id) else {
                return;
            };
            info!(
                "New window {}: {:?} ({:?}) on desktop {}",
                id,
                actor.name(),
                actor.class(),
                actor.num_desktop()
            );
        }
        Notification::Window(WindowEvent::ZOrderChanged) => {
            let mut names = Vec::new();
            rt.for_each_window(true, |a| {
                names.push(a.class().unwrap_or("?").to_string());
            });
            info!("Stacking order: {}", names.join(", "));
        }
        Notification::Window(e) => info!("{:?}", e),
        Notification::Desktop(e) => {
            let geom = rt.desktop_geometry();
            info!(
                "{:?} (desktop {} of {}, viewport {},{})",
                e,
                geom.current_desktop + 1,
                geom.nb_desktops,
                geom.current_viewport_x,
                geom.current_viewport_y
            );
        }
    }
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .try_init()?;

    let config = DockConfig::builder().app_id("toarudock").finish()?;
    let interval = config.x11_poll_interval();

    let mut rt = Runtime::new(config);
    rt.subscribe(Box::new(log_notification));

    let conn = X11RBConn::new()?;
    info!("Connected to X (RandR: {})", conn.has_randr());
    let x11 = X11Manager::init(&mut rt, conn)?;
    info!(
        "Tracking {} windows with the '{}' backend",
        rt.registry().len(),
        rt.window_backend_names()
    );
    rt.set_ready(true);

    let mut event_loop: EventLoop<Demo> = EventLoop::try_new()?;
    let mut demo = Demo {
        rt,
        x11,
        signal: event_loop.get_signal(),
    };

    event_loop
        .handle()
        .insert_source(Timer::from_duration(interval), move |_, _, demo| {
            demo.tick();
            TimeoutAction::ToDuration(interval)
        })
        .map_err(|e| e.error)?;

    event_loop.run(None, &mut demo, |_| {})?;

    Ok(())
}
