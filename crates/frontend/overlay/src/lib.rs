//! On-screen overlays for handheld hosts
//!
//! This crate provides the quick-settings menu and the virtual pointer that
//! are drawn over the emulated display, plus the traits through which they
//! reach the emulator's configuration, presentation layer and mouse.

pub mod host;
pub mod menu;
pub mod overlays;
pub mod pointer;
pub mod settings;
pub mod sprites;
pub mod text;

pub use host::{
    CpuArchitecture, CycleMode, DecoderVariant, EmulatorConfig, PointerDevice, Presentation,
    SimulatedMachine,
};
pub use menu::{MenuController, MenuItem, MenuLayout, MenuResponse};
pub use overlays::{EventOutcome, OverlayStack};
pub use pointer::VirtualPointer;
pub use settings::OverlaySettings;

use overlay_core::SurfaceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Unknown key name in bindings: {0}")]
    UnknownKey(String),
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),
}
