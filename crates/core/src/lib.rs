//! Core primitives for the in-emulator overlays: pixel surfaces, row compositing,
//! key edge detection and category logging.

pub mod blit;
pub mod color;
pub mod debounce;
pub mod input;
pub mod logging;
pub mod surface;

pub use blit::{blit_direct, blit_doubled, copy_row, fits_doubled, BLIT_CHUNK};
pub use color::Rgb;
pub use debounce::{KeyClass, KeyDebouncer, KEY_CODE_LIMIT};
pub use input::{keys, KeyCode, KeyEvent, KeyEventKind};
pub use surface::{PixelFormat, Rect, Surface, SurfaceError};
