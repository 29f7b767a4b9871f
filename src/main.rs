use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::info;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{CursorIcon, Window, WindowBuilder};

use gallery_runtime::app::print_final_state;
use gallery_runtime::input::winit::{pointer_button_event, pointer_moved_event};
use gallery_runtime::narration::RecordingNarrator;
use gallery_runtime::{
    ArtworkCatalog, Cursor, Gallery, GalleryConfig, InputEvent, InputScript, InteractionEvent,
    Scene,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let xml = fs::read_to_string(&options.scene)
        .with_context(|| format!("failed to read scene {}", options.scene.display()))?;
    let mut scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;
    if let Some(path) = &options.artworks {
        let catalog = ArtworkCatalog::from_path(path)
            .with_context(|| format!("failed to load artworks {}", path.display()))?;
        catalog.install(&mut scene);
    }
    let config = match &options.config_dir {
        Some(dir) => GalleryConfig::load_from(dir),
        None => GalleryConfig::load(),
    }
    .context("failed to load configuration")?;

    let artworks = scene.iter().filter(|(_, o)| o.artwork.is_some()).count();
    println!(
        "Loaded scene with {} objects ({} artworks)",
        scene.len(),
        artworks
    );

    let narrator = RecordingNarrator::new();
    let mut gallery = Gallery::new(scene, config, narrator.clone(), options.skip_intro);

    if options.window {
        match run_interactive(&mut gallery) {
            Ok(()) => {}
            Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
                eprintln!("{err}. Falling back to headless mode.");
                run_headless(&mut gallery, &options)?;
            }
            Err(err) => return Err(err),
        }
    } else {
        run_headless(&mut gallery, &options)?;
    }

    for utterance in narrator.spoken() {
        println!("Narrated ({}): {}", utterance.language, utterance.text);
    }
    print_final_state(&gallery);
    Ok(())
}

fn run_headless(gallery: &mut Gallery, options: &CliOptions) -> Result<()> {
    let frames = gallery.finish_intro();
    if frames > 0 {
        println!("Intro finished after {frames} frames");
    }
    gallery.core_mut().drain_events();

    if let Some(path) = &options.script {
        let script = InputScript::from_path(path)?;
        println!("Replaying {} input step(s)", script.steps.len());
        for event in script.replay(gallery)? {
            print_event(gallery, &event);
        }
    }
    Ok(())
}

fn print_event(gallery: &Gallery, event: &InteractionEvent) {
    let scene = gallery.core().scene();
    match event {
        InteractionEvent::PanelOpened { artwork, .. } => {
            let title = scene
                .get(*artwork)
                .and_then(|o| o.artwork.as_ref())
                .and_then(|a| a.title.clone())
                .unwrap_or_else(|| gallery_runtime::panel::UNTITLED.to_string());
            println!(" * panel opened: {title}");
        }
        InteractionEvent::PanelClosed { .. } => println!(" * panel closed"),
        InteractionEvent::ZoomChanged(zoom) => println!(" * zoom {zoom:.2}"),
        InteractionEvent::RigMoved(p) => {
            println!(" * rig moved to ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
        }
        other => println!(" * {other:?}"),
    }
}

fn run_interactive(gallery: &mut Gallery) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let (width, height) = {
        let viewport = &gallery.core().config().viewport;
        (viewport.width, viewport.height)
    };
    let window = WindowBuilder::new()
        .with_title("Gallery Runtime")
        .with_inner_size(LogicalSize::new(width as f64, height as f64))
        .build(&event_loop)
        .map_err(|err| WindowInitError::from_error("window", err))?;
    let size = window.inner_size();
    gallery.resize(size.width, size.height);

    let mut app = AppState {
        gallery,
        window,
        cursor: PhysicalPosition::new(0.0, 0.0),
    };
    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        app.process_event(&event, control_flow);
    });
    Ok(())
}

struct AppState<'a> {
    gallery: &'a mut Gallery,
    window: Window,
    cursor: PhysicalPosition<f64>,
}

impl AppState<'_> {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.window.id() => {
                match event {
                    WindowEvent::CloseRequested => control_flow.set_exit(),
                    WindowEvent::Resized(size) => self.gallery.resize(size.width, size.height),
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => self
                        .gallery
                        .resize(new_inner_size.width, new_inner_size.height),
                    WindowEvent::CursorMoved { position, .. } => {
                        self.cursor = *position;
                        let pointer = pointer_moved_event(*position);
                        self.gallery
                            .core_mut()
                            .handle_input(InputEvent::Pointer(pointer));
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if let Some(pointer) = pointer_button_event(*state, *button, self.cursor)
                        {
                            self.gallery
                                .core_mut()
                                .handle_input(InputEvent::Pointer(pointer));
                        }
                    }
                    _ => {}
                }
            }
            Event::MainEventsCleared => {
                self.gallery.frame();
                for event in self.gallery.core_mut().drain_events() {
                    self.apply_event(&event);
                }
            }
            _ => {}
        }
    }

    fn apply_event(&self, event: &InteractionEvent) {
        match event {
            InteractionEvent::CursorChanged(cursor) => {
                let icon = match cursor {
                    Cursor::Default => CursorIcon::Default,
                    Cursor::Pointer => CursorIcon::Hand,
                };
                self.window.set_cursor_icon(icon);
            }
            other => info!("{other:?}"),
        }
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

const USAGE: &str = "Usage: gallery-runtime <scene.xml> [--artworks <catalog.json>] \
[--script <input.json>] [--config <dir>] [--skip-intro] [--window]";

#[derive(Debug)]
struct CliOptions {
    scene: PathBuf,
    artworks: Option<PathBuf>,
    script: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    skip_intro: bool,
    window: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(scene) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = Self {
            scene: scene.into(),
            artworks: None,
            script: None,
            config_dir: None,
            skip_intro: false,
            window: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--artworks" => options.artworks = Some(value_for(&arg, args.next())?),
                "--script" => options.script = Some(value_for(&arg, args.next())?),
                "--config" => options.config_dir = Some(value_for(&arg, args.next())?),
                "--skip-intro" => options.skip_intro = true,
                "--window" => options.window = true,
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(options)
    }
}

fn value_for(flag: &str, value: Option<String>) -> Result<PathBuf> {
    value
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("{flag} expects a path"))
}
