//! Interaction core for a walkable 3D art gallery.
//!
//! The crate turns pointer and tracked-controller input into rays, resolves
//! what those rays hit in a retained scene graph, and drives the gallery's
//! interaction state: hover highlights, the artwork information panel and
//! teleporting across the floor.  Rendering, audio and platform
//! integration are kept outside of the crate so the behaviour stays
//! testable and easy to embed in headless tools.

pub mod app;
pub mod artwork;
pub mod config;
pub mod error;
pub mod gate;
pub mod hit;
pub mod hover;
pub mod input;
pub mod interaction;
pub mod narration;
pub mod overlay;
pub mod panel;
pub mod ray;
pub mod role;
pub mod scene;
pub mod script;
pub mod teleport;

pub use app::{Gallery, StaticViewport, ViewportProvider, WindowViewport};
pub use artwork::{ArtworkCatalog, ArtworkMetadata};
pub use config::GalleryConfig;
pub use error::{CatalogError, ConfigError, SceneError};
pub use gate::{GateHandle, InteractionGate, IntroSequence};
pub use hit::{CastOutcome, HitTester};
pub use hover::{Cursor, HoverState};
pub use input::{ControllerEvent, ControllerSignal, InputEvent, MouseButton, PointerEvent};
pub use interaction::{InputResponse, InteractionCore, InteractionEvent};
pub use narration::{Narrator, NullNarrator};
pub use panel::{ButtonAction, PanelState};
pub use ray::{ActionKind, Ray};
pub use role::Role;
pub use scene::{ObjectId, Scene, SceneObject};
pub use script::InputScript;
pub use teleport::VisitorRig;
