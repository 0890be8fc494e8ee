//! Virtual pointer driven by directional keys
//!
//! While enabled the direction keys steer an on-screen cursor with a simple
//! linear acceleration model: every rendered frame adds one unit of velocity
//! towards each held direction, and an axis stops dead once neither of its
//! keys is held. The velocity of each frame is forwarded to the emulated mouse
//! as relative motion. A handful of keys stand in for mouse buttons.

use crate::host::{PointerDevice, Presentation};
use crate::settings::{resolve, PointerBindings};
use crate::sprites;
use crate::OverlayError;
use overlay_core::logging::{log, LogCategory, LogLevel};
use overlay_core::{blit_doubled, KeyClass, KeyCode, KeyDebouncer, KeyEvent, PixelFormat, Surface};

/// Velocity gained per frame while a direction is held
const ACCELERATION: f32 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Directions {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

struct PointerKeys {
    toggle: KeyCode,
    left: KeyCode,
    right: KeyCode,
    up: KeyCode,
    down: KeyCode,
    buttons: Vec<(KeyCode, u8)>,
    passthrough: Vec<KeyCode>,
}

impl PointerKeys {
    fn resolve(bindings: &PointerBindings) -> Result<Self, OverlayError> {
        let buttons = bindings
            .buttons
            .iter()
            .map(|b| Ok((resolve(&b.key)?, b.button)))
            .collect::<Result<Vec<_>, OverlayError>>()?;
        let passthrough = bindings
            .passthrough
            .iter()
            .map(|name| resolve(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            toggle: resolve(&bindings.toggle)?,
            left: resolve(&bindings.left)?,
            right: resolve(&bindings.right)?,
            up: resolve(&bindings.up)?,
            down: resolve(&bindings.down)?,
            buttons,
            passthrough,
        })
    }

    fn button(&self, sym: KeyCode) -> Option<u8> {
        self.buttons
            .iter()
            .find(|(key, _)| *key == sym)
            .map(|&(_, button)| button)
    }
}

/// One step of the acceleration model along an axis. The negative direction
/// wins when both keys are held.
fn accelerate(velocity: f32, negative: bool, positive: bool) -> f32 {
    if negative {
        velocity - ACCELERATION
    } else if positive {
        velocity + ACCELERATION
    } else {
        velocity
    }
}

pub struct VirtualPointer {
    cursor: Surface,
    icon: Surface,
    /// Built on first use for portrait displays
    icon_doubled: Option<Surface>,
    keys: PointerKeys,
    debounce: KeyDebouncer,
    enabled: bool,
    position: (f32, f32),
    velocity: (f32, f32),
    held: Directions,
}

impl VirtualPointer {
    pub fn new(depth: u8, bindings: &PointerBindings) -> Result<Self, OverlayError> {
        let format = PixelFormat::from_depth(depth)?;
        let keys = PointerKeys::resolve(bindings)?;
        Ok(Self {
            cursor: sprites::cursor(format),
            icon: sprites::mouse_icon(format),
            icon_doubled: None,
            keys,
            debounce: KeyDebouncer::new(),
            enabled: false,
            position: (0.0, 0.0),
            velocity: (0.0, 0.0),
            held: Directions::default(),
        })
    }

    pub fn deinit(self) {
        log(LogCategory::Pointer, LogLevel::Debug, || "pointer released".to_string());
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn velocity(&self) -> (f32, f32) {
        self.velocity
    }

    /// Enable or disable pointer emulation. Disabling stops all motion.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.velocity = (0.0, 0.0);
            self.held = Directions::default();
        }
        self.debounce.reset();
        log(LogCategory::Pointer, LogLevel::Info, || {
            format!("pointer {}", if enabled { "enabled" } else { "disabled" })
        });
    }

    /// Drop every held direction and button. Called when another overlay
    /// starts capturing input, since the releases will never reach us.
    pub fn release_all<H>(&mut self, host: &mut H)
    where
        H: PointerDevice + ?Sized,
    {
        if self.enabled {
            for &(key, button) in &self.keys.buttons {
                if self.debounce.is_held(key) {
                    host.button_released(button);
                }
            }
        }
        self.held = Directions::default();
        self.velocity = (0.0, 0.0);
        self.debounce.reset();
        log(LogCategory::Pointer, LogLevel::Debug, || "released held keys".to_string());
    }

    /// Offer a key event to the pointer. Returns whether it was claimed.
    pub fn check_event<H>(&mut self, event: &KeyEvent, host: &mut H) -> bool
    where
        H: PointerDevice + Presentation + ?Sized,
    {
        let sym = event.sym;
        if self.keys.passthrough.contains(&sym) {
            return false;
        }

        let pressed = event.is_press();
        let class = self.debounce.classify(sym, pressed);

        if sym == self.keys.toggle {
            if class == KeyClass::FreshPress {
                self.set_enabled(!self.enabled);
                // Keep the key latched across the reset so repeats stay inert
                self.debounce.classify(sym, true);
            }
            host.force_update();
            return true;
        }

        if !self.enabled {
            return false;
        }

        let mut claimed = true;
        if sym == self.keys.left {
            self.held.left = pressed;
        } else if sym == self.keys.right {
            self.held.right = pressed;
        } else if sym == self.keys.up {
            self.held.up = pressed;
        } else if sym == self.keys.down {
            self.held.down = pressed;
        } else if let Some(button) = self.keys.button(sym) {
            match class {
                KeyClass::FreshPress => host.button_pressed(button),
                KeyClass::Release => host.button_released(button),
                KeyClass::Repeat | KeyClass::OutOfRange => {}
            }
        } else {
            claimed = false;
        }

        if !self.held.left && !self.held.right {
            self.velocity.0 = 0.0;
        }
        if !self.held.up && !self.held.down {
            self.velocity.1 = 0.0;
        }

        if claimed {
            host.force_update();
        }
        claimed
    }

    /// Advance the motion model by one frame and report it to the emulated mouse
    pub fn update<H>(&mut self, host: &mut H)
    where
        H: PointerDevice + ?Sized,
    {
        if !self.enabled {
            return;
        }
        self.velocity.0 = accelerate(self.velocity.0, self.held.left, self.held.right);
        self.velocity.1 = accelerate(self.velocity.1, self.held.up, self.held.down);
        self.position.0 += self.velocity.0;
        self.position.1 += self.velocity.1;
        host.cursor_moved(self.velocity.0, self.velocity.1);
    }

    /// Integrate one frame and draw the pointer overlay onto `dest`.
    ///
    /// The arrow follows the integrated position while the emulated program
    /// shows its cursor. Otherwise a mouse icon marks the bottom-right corner,
    /// doubled in height on portrait displays.
    pub fn blit_vmouse<H>(&mut self, dest: &mut Surface, host: &mut H)
    where
        H: PointerDevice + ?Sized,
    {
        if !self.enabled {
            return;
        }
        self.update(host);

        if !host.pointer_hidden() {
            self.cursor
                .blit_to(dest, self.position.0 as i32, self.position.1 as i32);
            return;
        }

        let icon = if dest.height() > dest.width() {
            self.doubled_icon()
        } else {
            &self.icon
        };
        let x = dest.width() as i32 - icon.width() as i32;
        let y = dest.height() as i32 - icon.height() as i32;
        icon.blit_to(dest, x, y);
    }

    fn doubled_icon(&mut self) -> &Surface {
        let icon = &self.icon;
        self.icon_doubled.get_or_insert_with(|| {
            let mut doubled = Surface::new(icon.width(), icon.height() * 2, icon.format());
            blit_doubled(icon, 0, 0, &mut doubled);
            doubled.set_color_key(icon.color_key());
            log(LogCategory::Pointer, LogLevel::Debug, || {
                format!("built doubled icon {}x{}", doubled.width(), doubled.height())
            });
            doubled
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimulatedMachine;
    use crate::sprites::{CURSOR_SIZE, ICON_SIZE};
    use overlay_core::{keys, Rgb};

    fn enabled(host: &mut SimulatedMachine) -> VirtualPointer {
        let mut p = VirtualPointer::new(32, &PointerBindings::default()).expect("pointer");
        assert!(p.check_event(&KeyEvent::press(keys::BACKSPACE), host));
        p.check_event(&KeyEvent::release(keys::BACKSPACE), host);
        assert!(p.is_enabled());
        p
    }

    #[test]
    fn test_velocity_grows_one_unit_per_frame() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        p.check_event(&KeyEvent::press(keys::RIGHT), &mut host);
        for n in 1..=12 {
            p.update(&mut host);
            assert_eq!(p.velocity(), (n as f32, 0.0));
        }
        // 1 + 2 + ... + 12
        assert_eq!(p.position(), (78.0, 0.0));
        assert_eq!(host.pointer_motion, (78.0, 0.0));

        p.check_event(&KeyEvent::release(keys::RIGHT), &mut host);
        p.update(&mut host);
        assert_eq!(p.velocity(), (0.0, 0.0));
        assert_eq!(p.position(), (78.0, 0.0));
    }

    #[test]
    fn test_axis_resets_only_when_both_keys_released() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        p.check_event(&KeyEvent::press(keys::UP), &mut host);
        p.check_event(&KeyEvent::press(keys::DOWN), &mut host);
        p.update(&mut host);
        p.update(&mut host);
        // Up wins over down
        assert_eq!(p.velocity().1, -2.0);

        p.check_event(&KeyEvent::release(keys::UP), &mut host);
        p.update(&mut host);
        assert_eq!(p.velocity().1, -1.0);

        p.check_event(&KeyEvent::release(keys::DOWN), &mut host);
        assert_eq!(p.velocity().1, 0.0);
    }

    #[test]
    fn test_left_takes_precedence() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        p.check_event(&KeyEvent::press(keys::RIGHT), &mut host);
        p.check_event(&KeyEvent::press(keys::LEFT), &mut host);
        p.update(&mut host);
        assert_eq!(p.velocity().0, -1.0);
    }

    #[test]
    fn test_disabled_pointer_claims_only_toggle() {
        let mut host = SimulatedMachine::new();
        let mut p = VirtualPointer::new(16, &PointerBindings::default()).expect("pointer");
        assert!(!p.check_event(&KeyEvent::press(keys::LEFT), &mut host));
        assert!(!p.check_event(&KeyEvent::press(keys::LEFT_CTRL), &mut host));
        assert!(host.button_log.is_empty());
        assert!(p.check_event(&KeyEvent::press(keys::BACKSPACE), &mut host));
        assert!(p.is_enabled());
    }

    #[test]
    fn test_passthrough_keys_never_claimed() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        assert!(!p.check_event(&KeyEvent::press(keys::ENTER), &mut host));
        assert!(!p.check_event(&KeyEvent::press(keys::ESCAPE), &mut host));
        assert!(!p.check_event(&KeyEvent::press(keys::TAB), &mut host));
    }

    #[test]
    fn test_toggle_ignores_auto_repeat() {
        let mut host = SimulatedMachine::new();
        let mut p = VirtualPointer::new(32, &PointerBindings::default()).expect("pointer");
        for _ in 0..5 {
            p.check_event(&KeyEvent::press(keys::BACKSPACE), &mut host);
        }
        assert!(p.is_enabled());
        p.check_event(&KeyEvent::release(keys::BACKSPACE), &mut host);
        p.check_event(&KeyEvent::press(keys::BACKSPACE), &mut host);
        assert!(!p.is_enabled());
    }

    #[test]
    fn test_disable_clears_motion() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        p.check_event(&KeyEvent::press(keys::DOWN), &mut host);
        p.update(&mut host);
        p.set_enabled(false);
        assert_eq!(p.velocity(), (0.0, 0.0));
        p.set_enabled(true);
        p.update(&mut host);
        assert_eq!(p.velocity(), (0.0, 0.0));
    }

    #[test]
    fn test_buttons_forward_fresh_press_and_release() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        let before = host.forced_updates;

        assert!(p.check_event(&KeyEvent::press(keys::LEFT_CTRL), &mut host));
        p.check_event(&KeyEvent::press(keys::LEFT_CTRL), &mut host);
        assert!(host.buttons_down[0]);
        p.check_event(&KeyEvent::release(keys::LEFT_CTRL), &mut host);
        p.check_event(&KeyEvent::press(keys::SPACE), &mut host);
        p.check_event(&KeyEvent::release(keys::SPACE), &mut host);
        p.check_event(&KeyEvent::press(keys::LEFT_SHIFT), &mut host);

        assert_eq!(
            host.button_log,
            vec![(0, true), (0, false), (2, true), (2, false), (1, true)]
        );
        assert_eq!(host.forced_updates - before, 6);
    }

    #[test]
    fn test_release_all_drops_held_keys() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        p.check_event(&KeyEvent::press(keys::RIGHT), &mut host);
        p.check_event(&KeyEvent::press(keys::LEFT_CTRL), &mut host);
        p.update(&mut host);
        assert!(host.buttons_down[0]);

        p.release_all(&mut host);
        assert!(!host.buttons_down[0]);
        assert_eq!(host.button_log, vec![(0, true), (0, false)]);
        for _ in 0..5 {
            p.update(&mut host);
        }
        assert_eq!(p.velocity(), (0.0, 0.0));
        assert!(p.is_enabled());

        // A fresh press after the reset is forwarded again
        p.check_event(&KeyEvent::press(keys::LEFT_CTRL), &mut host);
        assert!(host.buttons_down[0]);
    }

    #[test]
    fn test_cursor_drawn_at_position() {
        let mut host = SimulatedMachine::new();
        let mut p = enabled(&mut host);
        p.check_event(&KeyEvent::press(keys::RIGHT), &mut host);
        p.check_event(&KeyEvent::press(keys::DOWN), &mut host);

        let mut dest = Surface::new(320, 240, PixelFormat::Argb8888);
        p.blit_vmouse(&mut dest, &mut host);
        assert_eq!(p.position(), (1.0, 1.0));
        assert_eq!(dest.get_pixel(1, 1), Rgb::BLACK.to_argb());
        assert_eq!(dest.get_pixel(2, 3), Rgb::WHITE.to_argb());
        // Key color is transparent
        assert_eq!(dest.get_pixel(1 + CURSOR_SIZE - 1, 1), 0);
    }

    #[test]
    fn test_hidden_pointer_shows_corner_icon() {
        let mut host = SimulatedMachine::new();
        host.pointer_hidden = true;
        let mut p = enabled(&mut host);

        let mut landscape = Surface::new(320, 240, PixelFormat::Argb8888);
        p.blit_vmouse(&mut landscape, &mut host);
        let (x, y) = (320 - ICON_SIZE, 240 - ICON_SIZE);
        assert_eq!(landscape.get_pixel(x + 3, y + 1), Rgb::BLACK.to_argb());
        assert_eq!(landscape.get_pixel(x + 3, y + 2), Rgb::WHITE.to_argb());
        assert!(p.icon_doubled.is_none());

        let mut portrait = Surface::new(240, 320, PixelFormat::Argb8888);
        p.blit_vmouse(&mut portrait, &mut host);
        let (x, y) = (240 - ICON_SIZE, 320 - 2 * ICON_SIZE);
        assert_eq!(portrait.get_pixel(x + 3, y + 2), Rgb::BLACK.to_argb());
        assert_eq!(portrait.get_pixel(x + 3, y + 3), Rgb::BLACK.to_argb());
        assert_eq!(portrait.get_pixel(x + 3, y + 4), Rgb::WHITE.to_argb());
        assert_eq!(portrait.get_pixel(x, y), 0);
        assert!(p.icon_doubled.is_some());
    }

    #[test]
    fn test_disabled_pointer_draws_nothing() {
        let mut host = SimulatedMachine::new();
        let mut p = VirtualPointer::new(32, &PointerBindings::default()).expect("pointer");
        let mut dest = Surface::new(64, 64, PixelFormat::Argb8888);
        p.blit_vmouse(&mut dest, &mut host);
        assert!(dest.pixels().iter().all(|&b| b == 0));
        assert_eq!(host.pointer_motion, (0.0, 0.0));
    }
}
