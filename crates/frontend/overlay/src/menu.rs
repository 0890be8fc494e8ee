//! Quick-settings menu drawn over the emulated display
//!
//! The menu is a small state machine: hidden or visible, with a selected row.
//! While visible it captures every key event. Navigation keys move the
//! selection, left/right adjust numeric settings and the activate key runs the
//! selected row's action. Each action writes straight through to the host's
//! [`EmulatorConfig`] and then re-reads it to rebuild the row values, so the
//! menu always shows the host's actual state.
//!
//! Switching buffering mode can reallocate display surfaces, so the "Double
//! buffer" row only flips a pending flag. The switch is requested once, when
//! the menu closes, and only if the pending value differs from the mode the
//! menu opened with.

use crate::host::{
    extflags_toggle_for, CpuArchitecture, CycleMode, DecoderVariant, EmulatorConfig, Presentation,
};
use crate::settings::{resolve, MenuBindings};
use crate::text::{draw_text, text_width};
use crate::OverlayError;
use overlay_core::logging::{log, LogCategory, LogLevel};
use overlay_core::{
    blit_direct, blit_doubled, fits_doubled, KeyClass, KeyCode, KeyDebouncer, KeyEvent, PixelFormat,
    Rect, Rgb, Surface,
};

/// Native overlay size; taller displays get the doubled composite
pub const MENU_WIDTH: u32 = 320;
pub const MENU_HEIGHT: u32 = 240;

/// Upper bound for the frameskip row
pub const MAX_FRAMESKIP: u32 = 10;

const LABEL_COLUMN: i32 = 40;
const HIGHLIGHT_X: i32 = 20;
const HIGHLIGHT_WIDTH: u32 = 280;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    Resume,
    Frameskip,
    Cycles,
    Core,
    CpuType,
    DoubleBuffer,
    Exit,
}

impl MenuItem {
    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Resume => "Resume",
            MenuItem::Frameskip => "Frameskip: ",
            MenuItem::Cycles => "Cycles: ",
            MenuItem::Core => "Core: ",
            MenuItem::CpuType => "CPU type: ",
            MenuItem::DoubleBuffer => "Double buffer: ",
            MenuItem::Exit => "Exit",
        }
    }
}

/// Where the first row goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPlacement {
    /// Baseline of the first row's text, in overlay pixels
    Fixed(i32),
    /// Center the block of rows in the visible overlay height
    Centered,
}

/// Build-time menu feature set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuLayout {
    pub items: &'static [MenuItem],
    pub row_spacing: i32,
    /// X position of the value string for rows that carry one
    pub value_column: i32,
    pub placement: RowPlacement,
}

impl MenuLayout {
    /// Resume, frameskip, cycles, exit
    pub const CLASSIC: MenuLayout = MenuLayout {
        items: &[
            MenuItem::Resume,
            MenuItem::Frameskip,
            MenuItem::Cycles,
            MenuItem::Exit,
        ],
        row_spacing: 40,
        value_column: 125,
        placement: RowPlacement::Fixed(40),
    };

    /// Every runtime control
    pub const FULL: MenuLayout = MenuLayout {
        items: &[
            MenuItem::Resume,
            MenuItem::Frameskip,
            MenuItem::Cycles,
            MenuItem::Core,
            MenuItem::CpuType,
            MenuItem::DoubleBuffer,
            MenuItem::Exit,
        ],
        row_spacing: 30,
        value_column: 170,
        placement: RowPlacement::Centered,
    };

    #[cfg(feature = "classic-menu")]
    pub const DEFAULT: MenuLayout = MenuLayout::CLASSIC;
    #[cfg(not(feature = "classic-menu"))]
    pub const DEFAULT: MenuLayout = MenuLayout::FULL;

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// X of a row's value string, pushed right of its label when the column is too narrow
    fn value_x(&self, item: MenuItem) -> i32 {
        self.value_column.max(LABEL_COLUMN + text_width(item.label()))
    }
}

/// Result of feeding an event or action to the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuResponse {
    /// Not for the menu; offer it to the next consumer
    Ignored,
    Consumed,
    /// The user asked to end the emulation session
    Exit,
}

impl MenuResponse {
    pub fn is_consumed(self) -> bool {
        self != MenuResponse::Ignored
    }
}

/// Formatted value strings shown next to the row labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DisplayValues {
    frameskip: String,
    cycles: String,
    core: String,
    cpu_type: String,
    double_buffer: String,
}

impl DisplayValues {
    fn get(&self, item: MenuItem) -> Option<&str> {
        match item {
            MenuItem::Frameskip => Some(&self.frameskip),
            MenuItem::Cycles => Some(&self.cycles),
            MenuItem::Core => Some(&self.core),
            MenuItem::CpuType => Some(&self.cpu_type),
            MenuItem::DoubleBuffer => Some(&self.double_buffer),
            MenuItem::Resume | MenuItem::Exit => None,
        }
    }
}

struct MenuKeys {
    up: KeyCode,
    down: KeyCode,
    decrease: KeyCode,
    increase: KeyCode,
    activate: KeyCode,
    toggle_scancode: u16,
    shutdown_scancode: u16,
}

impl MenuKeys {
    fn resolve(bindings: &MenuBindings) -> Result<Self, OverlayError> {
        Ok(Self {
            up: resolve(&bindings.up)?,
            down: resolve(&bindings.down)?,
            decrease: resolve(&bindings.decrease)?,
            increase: resolve(&bindings.increase)?,
            activate: resolve(&bindings.activate)?,
            toggle_scancode: bindings.toggle_scancode,
            shutdown_scancode: bindings.shutdown_scancode,
        })
    }
}

/// Scancode 0 means the platform did not report one
fn scancode_matches(event: &KeyEvent, scancode: u16) -> bool {
    event.scancode != 0 && event.scancode == scancode
}

pub struct MenuController {
    surface: Surface,
    layout: MenuLayout,
    keys: MenuKeys,
    debounce: KeyDebouncer,
    active: bool,
    /// Set on hide; the host must clean the display before the next frame
    was_active: bool,
    selected: usize,
    saved_buffering: bool,
    pending_buffering: bool,
    values: DisplayValues,
}

impl MenuController {
    /// Create the menu with the build's default layout at `depth` bits per pixel
    pub fn new(depth: u8, bindings: &MenuBindings) -> Result<Self, OverlayError> {
        Self::with_layout(depth, bindings, MenuLayout::DEFAULT)
    }

    pub fn with_layout(
        depth: u8,
        bindings: &MenuBindings,
        layout: MenuLayout,
    ) -> Result<Self, OverlayError> {
        debug_assert!(!layout.is_empty());
        let format = PixelFormat::from_depth(depth)?;
        let keys = MenuKeys::resolve(bindings)?;
        log(LogCategory::Menu, LogLevel::Debug, || {
            format!("menu ready: {} rows, {} bpp", layout.len(), depth)
        });
        Ok(Self {
            surface: Surface::new(MENU_WIDTH, MENU_HEIGHT, format),
            layout,
            keys,
            debounce: KeyDebouncer::new(),
            active: false,
            was_active: false,
            selected: 0,
            saved_buffering: false,
            pending_buffering: false,
            values: DisplayValues::default(),
        })
    }

    /// Release the off-screen surface
    pub fn deinit(self) {
        log(LogCategory::Menu, LogLevel::Debug, || "menu released".to_string());
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the menu was hidden and its pixels are still on the display
    pub fn needs_clean(&self) -> bool {
        self.was_active
    }

    pub fn layout(&self) -> &MenuLayout {
        &self.layout
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> MenuItem {
        self.layout.items[self.selected]
    }

    pub fn display_value(&self, item: MenuItem) -> Option<&str> {
        self.values.get(item)
    }

    /// Show or hide the menu.
    pub fn toggle<H>(&mut self, host: &mut H)
    where
        H: EmulatorConfig + Presentation + ?Sized,
    {
        self.active = !self.active;

        if self.active {
            self.saved_buffering = host.double_buffered();
            self.pending_buffering = self.saved_buffering;
            log(LogCategory::Menu, LogLevel::Info, || "menu shown".to_string());
        } else {
            self.was_active = true;
            if self.pending_buffering != self.saved_buffering {
                let double = self.pending_buffering;
                log(LogCategory::Menu, LogLevel::Info, || {
                    format!("switching to {} buffering", if double { "double" } else { "single" })
                });
                host.request_buffering(double);
            }
            log(LogCategory::Menu, LogLevel::Info, || "menu hidden".to_string());
        }

        self.debounce.reset();
        self.refresh(host);
    }

    /// Move the selection by `direction` rows, wrapping at both ends
    pub fn move_cursor(&mut self, direction: i32) {
        let count = self.layout.len() as i32;
        self.selected = (self.selected as i32 + direction).rem_euclid(count) as usize;
    }

    pub fn increase<H>(&mut self, host: &mut H)
    where
        H: EmulatorConfig + ?Sized,
    {
        match self.selected_item() {
            MenuItem::Frameskip => {
                let frames = host.frameskip();
                if frames < MAX_FRAMESKIP {
                    host.set_frameskip(frames + 1);
                }
            }
            MenuItem::Cycles => host.cycle_increase(),
            _ => {}
        }
        self.refresh(host);
    }

    pub fn decrease<H>(&mut self, host: &mut H)
    where
        H: EmulatorConfig + ?Sized,
    {
        match self.selected_item() {
            MenuItem::Frameskip => {
                let frames = host.frameskip();
                if frames > 0 {
                    host.set_frameskip(frames - 1);
                }
            }
            MenuItem::Cycles => host.cycle_decrease(),
            _ => {}
        }
        self.refresh(host);
    }

    /// Run the selected row's action
    pub fn activate<H>(&mut self, host: &mut H) -> MenuResponse
    where
        H: EmulatorConfig + Presentation + ?Sized,
    {
        match self.selected_item() {
            MenuItem::Resume => self.toggle(host),
            MenuItem::Frameskip => {}
            MenuItem::Cycles => {
                let mode = host.cycle_mode().next();
                host.set_cycle_mode(mode);
                log(LogCategory::Menu, LogLevel::Info, || {
                    format!("cycle mode -> {:?}", mode)
                });
            }
            MenuItem::Core => {
                let decoder = host.decoder().next(host.dynamic_available());
                host.set_decoder(decoder);
                if host.auto_decoder() {
                    host.set_auto_decoder(false);
                }
                log(LogCategory::Menu, LogLevel::Info, || {
                    format!("decoder -> {}", decoder.label())
                });
            }
            MenuItem::CpuType => {
                let arch = CpuArchitecture::next_code(host.arch_code());
                host.set_arch_code(arch.code());
                if let Some(queue) = arch.forced_prefetch() {
                    host.set_decoder(DecoderVariant::Prefetch);
                    host.set_prefetch_queue_size(queue);
                }
                host.set_extflags_toggle(extflags_toggle_for(arch.code()));
                log(LogCategory::Menu, LogLevel::Info, || {
                    format!("cpu type -> {} ({:#04x})", arch.label(), arch.code())
                });
            }
            MenuItem::DoubleBuffer => self.pending_buffering = !self.pending_buffering,
            MenuItem::Exit => {
                log(LogCategory::Menu, LogLevel::Info, || "exit requested".to_string());
                return MenuResponse::Exit;
            }
        }
        self.refresh(host);
        MenuResponse::Consumed
    }

    /// Offer a key event to the menu.
    ///
    /// The toggle scancode is honored in either state. While visible every
    /// event is consumed and only fresh presses trigger actions.
    pub fn check_event<H>(&mut self, event: &KeyEvent, host: &mut H) -> MenuResponse
    where
        H: EmulatorConfig + Presentation + ?Sized,
    {
        let pressed = event.is_press();

        if pressed && scancode_matches(event, self.keys.toggle_scancode) {
            self.toggle(host);
            return MenuResponse::Consumed;
        }

        if !self.active {
            return MenuResponse::Ignored;
        }

        let mut response = MenuResponse::Consumed;
        if self.debounce.classify(event.sym, pressed) == KeyClass::FreshPress {
            let sym = event.sym;
            if sym == self.keys.up {
                self.move_cursor(-1);
            } else if sym == self.keys.down {
                self.move_cursor(1);
            } else if sym == self.keys.decrease {
                self.decrease(host);
            } else if sym == self.keys.increase {
                self.increase(host);
            } else if sym == self.keys.activate {
                response = self.activate(host);
            }
        }

        if pressed && scancode_matches(event, self.keys.shutdown_scancode) {
            log(LogCategory::Menu, LogLevel::Info, || {
                format!("shutdown scancode {}", event.scancode)
            });
            response = MenuResponse::Exit;
        }

        response
    }

    /// Rebuild every row value from the host's current configuration
    pub fn refresh<H>(&mut self, host: &H)
    where
        H: EmulatorConfig + ?Sized,
    {
        self.values.frameskip = host.frameskip().to_string();
        self.values.cycles = match host.cycle_mode() {
            CycleMode::Auto => "auto".to_string(),
            CycleMode::Max => "max".to_string(),
            CycleMode::Fixed => host.cycle_target().to_string(),
        };
        self.values.core = host.decoder().label().to_string();
        self.values.cpu_type = CpuArchitecture::from_code(host.arch_code())
            .map_or("unknown", CpuArchitecture::label)
            .to_string();
        self.values.double_buffer = if self.pending_buffering { "on" } else { "off" }.to_string();
    }

    /// Render the menu and composite it onto `dest`. No-op while hidden.
    pub fn draw(&mut self, dest: &mut Surface) {
        if !self.active {
            return;
        }

        let left = dest.width().saturating_sub(MENU_WIDTH) / 2;
        let top = dest.height().saturating_sub(2 * MENU_HEIGHT) / 2;
        let doubled = dest.height() > MENU_HEIGHT && fits_doubled(&self.surface, left, top, dest);
        let visible = if doubled {
            MENU_HEIGHT as i32
        } else {
            dest.height().min(MENU_HEIGHT) as i32
        };

        self.render_rows(visible);

        if doubled {
            log(LogCategory::Blit, LogLevel::Trace, || {
                format!("menu doubled at ({}, {})", left, top)
            });
            blit_doubled(&self.surface, left, top, dest);
        } else {
            log(LogCategory::Blit, LogLevel::Trace, || {
                format!("menu direct at ({}, 0)", left)
            });
            blit_direct(&self.surface, left, 0, dest);
        }
    }

    fn render_rows(&mut self, visible: i32) {
        let surface = &mut self.surface;
        let layout = &self.layout;
        let spacing = layout.row_spacing;

        let background = surface.map_rgb(Rgb::BLUE);
        let highlight = surface.map_rgb(Rgb::WHITE);
        surface.fill(background);

        let mut y = match layout.placement {
            RowPlacement::Fixed(y) => y,
            RowPlacement::Centered => {
                (visible - layout.len() as i32 * spacing).max(0) / 2 + spacing / 4
            }
        };

        for (i, &item) in layout.items.iter().enumerate() {
            let color = if i == self.selected {
                let bar = Rect::new(
                    HIGHLIGHT_X,
                    y - spacing / 4,
                    HIGHLIGHT_WIDTH,
                    (spacing * 3 / 4) as u32,
                );
                surface.fill_rect(bar, highlight);
                Rgb::WHITE.inverted()
            } else {
                Rgb::WHITE
            };

            draw_text(surface, LABEL_COLUMN, y, item.label(), color);
            if let Some(value) = self.values.get(item) {
                draw_text(surface, layout.value_x(item), y, value, color);
            }
            y += spacing;
        }
    }

    /// Clear the whole display after the menu closes
    pub fn clean_screen(&mut self, dest: &mut Surface) {
        dest.fill(0);
        self.was_active = false;
    }
}
