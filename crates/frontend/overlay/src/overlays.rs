//! Event routing and render ordering for the overlays
//!
//! The menu sees every event first and captures all input while visible.
//! Events it leaves alone are offered to the virtual pointer.

use crate::host::{EmulatorConfig, PointerDevice, Presentation};
use crate::menu::{MenuController, MenuResponse};
use crate::pointer::VirtualPointer;
use crate::settings::OverlaySettings;
use crate::OverlayError;
use overlay_core::logging::{log, LogCategory, LogLevel};
use overlay_core::{KeyEvent, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Neither overlay claimed the event; deliver it to the emulated machine
    Ignored,
    Consumed,
    /// End the emulation session
    Exit,
}

pub struct OverlayStack {
    pub menu: MenuController,
    pub pointer: VirtualPointer,
}

impl OverlayStack {
    pub fn new(depth: u8, settings: &OverlaySettings) -> Result<Self, OverlayError> {
        Ok(Self {
            menu: MenuController::new(depth, &settings.menu)?,
            pointer: VirtualPointer::new(depth, &settings.pointer)?,
        })
    }

    pub fn handle_event<H>(&mut self, event: &KeyEvent, host: &mut H) -> EventOutcome
    where
        H: EmulatorConfig + Presentation + PointerDevice + ?Sized,
    {
        log(LogCategory::Input, LogLevel::Trace, || {
            format!(
                "{:?} sym={} scancode={}",
                event.kind, event.sym, event.scancode
            )
        });

        let menu_was_active = self.menu.is_active();
        let response = self.menu.check_event(event, host);
        if !menu_was_active && self.menu.is_active() {
            // The menu swallows the releases of anything held now
            self.pointer.release_all(host);
        }
        match response {
            MenuResponse::Exit => return EventOutcome::Exit,
            MenuResponse::Consumed => return EventOutcome::Consumed,
            MenuResponse::Ignored => {}
        }

        if self.pointer.check_event(event, host) {
            EventOutcome::Consumed
        } else {
            EventOutcome::Ignored
        }
    }

    /// Draw the overlays for one frame on top of the emulated display
    pub fn render<H>(&mut self, dest: &mut Surface, host: &mut H)
    where
        H: PointerDevice + ?Sized,
    {
        if self.menu.is_active() {
            self.menu.draw(dest);
            return;
        }
        if self.menu.needs_clean() {
            self.menu.clean_screen(dest);
        }
        self.pointer.blit_vmouse(dest, host);
    }

    pub fn deinit(self) {
        self.menu.deinit();
        self.pointer.deinit();
    }
}
