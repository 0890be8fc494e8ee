//! End-to-end event and render flow through the overlay stack
//!
//! Drives the overlays with raw key events the way a host event loop does and
//! checks the effects on the simulated machine and the display surface.

use overlay_core::logging::{LogCategory, LogConfig, LogLevel};
use overlay_core::{keys, KeyCode, KeyEvent, PixelFormat, Rgb, Surface};
use overlay_ui::{
    CycleMode, EventOutcome, MenuItem, OverlaySettings, OverlayStack, SimulatedMachine,
};
use std::time::Duration;

const MENU_SCANCODE: u16 = 4;
const POWER_SCANCODE: u16 = 107;

fn stack(depth: u8) -> OverlayStack {
    OverlayStack::new(depth, &OverlaySettings::default()).expect("overlay stack")
}

fn tap(stack: &mut OverlayStack, host: &mut SimulatedMachine, sym: KeyCode) -> EventOutcome {
    let outcome = stack.handle_event(&KeyEvent::press(sym), host);
    stack.handle_event(&KeyEvent::release(sym), host);
    outcome
}

fn toggle_menu(stack: &mut OverlayStack, host: &mut SimulatedMachine) {
    let event = KeyEvent::press(0).with_scancode(MENU_SCANCODE);
    assert_eq!(stack.handle_event(&event, host), EventOutcome::Consumed);
}

fn select(stack: &mut OverlayStack, host: &mut SimulatedMachine, item: MenuItem) {
    for _ in 0..stack.menu.layout().len() {
        if stack.menu.selected_item() == item {
            return;
        }
        tap(stack, host, keys::DOWN);
    }
    panic!("{:?} is not in this menu layout", item);
}

#[test]
fn test_navigation_wraps_with_key_events() {
    let mut host = SimulatedMachine::new();
    let mut stack = stack(16);
    toggle_menu(&mut stack, &mut host);

    let rows = stack.menu.layout().len();
    tap(&mut stack, &mut host, keys::UP);
    assert_eq!(stack.menu.selected(), rows - 1);
    tap(&mut stack, &mut host, keys::DOWN);
    assert_eq!(stack.menu.selected(), 0);

    for step in 1..=3 * rows {
        tap(&mut stack, &mut host, keys::DOWN);
        assert_eq!(stack.menu.selected(), step % rows);
    }
}

#[test]
fn test_menu_round_trip_leaves_buffering_alone() {
    let mut host = SimulatedMachine::new();
    host.double_buffered = true;
    let mut stack = stack(32);

    toggle_menu(&mut stack, &mut host);
    tap(&mut stack, &mut host, keys::DOWN);
    toggle_menu(&mut stack, &mut host);

    assert!(host.buffering_requests.is_empty());
    assert!(host.double_buffered);
}

#[test]
fn test_cycle_row_activation_sequence() {
    let mut host = SimulatedMachine::new();
    host.cycle_target = 12000;
    let mut stack = stack(16);
    toggle_menu(&mut stack, &mut host);
    select(&mut stack, &mut host, MenuItem::Cycles);

    let mut shown = Vec::new();
    for _ in 0..3 {
        assert_eq!(tap(&mut stack, &mut host, keys::LEFT_CTRL), EventOutcome::Consumed);
        shown.push((
            host.cycle_mode,
            stack.menu.display_value(MenuItem::Cycles).map(str::to_string),
        ));
    }

    assert_eq!(
        shown,
        vec![
            (CycleMode::Auto, Some("auto".to_string())),
            (CycleMode::Max, Some("max".to_string())),
            (CycleMode::Fixed, Some("12000".to_string())),
        ]
    );
}

#[test]
fn test_frameskip_row_with_arrow_keys() {
    let mut host = SimulatedMachine::new();
    let mut stack = stack(16);
    toggle_menu(&mut stack, &mut host);
    select(&mut stack, &mut host, MenuItem::Frameskip);

    for _ in 0..3 {
        tap(&mut stack, &mut host, keys::RIGHT);
    }
    tap(&mut stack, &mut host, keys::LEFT);
    assert_eq!(host.frameskip, 2);
    assert_eq!(stack.menu.display_value(MenuItem::Frameskip), Some("2"));
}

#[test]
fn test_exit_from_menu_and_power_switch() {
    let mut host = SimulatedMachine::new();
    let mut stack = stack(32);
    toggle_menu(&mut stack, &mut host);
    select(&mut stack, &mut host, MenuItem::Exit);
    assert_eq!(tap(&mut stack, &mut host, keys::LEFT_CTRL), EventOutcome::Exit);

    let power = KeyEvent::press(0).with_scancode(POWER_SCANCODE);
    assert_eq!(stack.handle_event(&power, &mut host), EventOutcome::Exit);
}

#[test]
fn test_pointer_motion_through_render_frames() {
    let mut host = SimulatedMachine::new();
    let mut stack = stack(32);
    let mut display = Surface::new(320, 240, PixelFormat::Argb8888);

    assert_eq!(tap(&mut stack, &mut host, keys::BACKSPACE), EventOutcome::Consumed);
    assert!(stack.pointer.is_enabled());

    stack.handle_event(&KeyEvent::press(keys::DOWN), &mut host);
    const FRAMES: u32 = 7;
    for _ in 0..FRAMES {
        stack.render(&mut display, &mut host);
    }
    assert_eq!(stack.pointer.velocity(), (0.0, FRAMES as f32));

    stack.handle_event(&KeyEvent::release(keys::DOWN), &mut host);
    stack.render(&mut display, &mut host);
    assert_eq!(stack.pointer.velocity(), (0.0, 0.0));
    assert_eq!(host.pointer_motion, (0.0, 28.0));
}

#[test]
fn test_menu_hides_pointer_and_cleans_on_close() {
    let mut host = SimulatedMachine::new();
    let mut stack = stack(32);
    let mut display = Surface::new(320, 240, PixelFormat::Argb8888);

    tap(&mut stack, &mut host, keys::BACKSPACE);
    toggle_menu(&mut stack, &mut host);
    stack.render(&mut display, &mut host);
    assert_eq!(display.get_pixel(0, 0), Rgb::BLUE.to_argb());
    assert_eq!(host.pointer_motion, (0.0, 0.0));

    toggle_menu(&mut stack, &mut host);
    assert!(stack.menu.needs_clean());
    stack.render(&mut display, &mut host);
    assert!(!stack.menu.needs_clean());
    // Pointer arrow redrawn at the origin on the cleaned display
    assert_eq!(display.get_pixel(0, 0), Rgb::BLACK.to_argb());
    assert_eq!(display.get_pixel(100, 100), 0);
}

#[test]
fn test_menu_logging_reaches_log_file() {
    let path = std::env::temp_dir().join(format!("overlay_flow_{}.log", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let config = LogConfig::global();
    config.set_log_file(path.clone()).expect("log file");
    config.set_level(LogCategory::Menu, LogLevel::Info);

    let mut host = SimulatedMachine::new();
    let mut stack = stack(16);
    toggle_menu(&mut stack, &mut host);
    toggle_menu(&mut stack, &mut host);
    assert!(!stack.menu.is_active());

    // The writer thread appends asynchronously
    let mut contents = String::new();
    for _ in 0..100 {
        contents = std::fs::read_to_string(&path).unwrap_or_default();
        if contents.contains("[Menu] menu hidden") {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    config.clear_log_file();
    let _ = std::fs::remove_file(&path);

    assert!(contents.contains("[Menu] menu shown"), "log was {:?}", contents);
    assert!(contents.contains("[Menu] menu hidden"), "log was {:?}", contents);
}

#[test]
fn test_cycle_target_saturates_under_repeated_increase() {
    let mut host = SimulatedMachine::new();
    let mut stack = stack(16);
    toggle_menu(&mut stack, &mut host);
    select(&mut stack, &mut host, MenuItem::Cycles);

    for _ in 0..200 {
        assert_eq!(tap(&mut stack, &mut host, keys::RIGHT), EventOutcome::Consumed);
    }
    assert_eq!(host.cycle_mode, CycleMode::Fixed);
    assert_eq!(host.cycle_target, SimulatedMachine::MAX_CYCLES);
    assert_eq!(
        stack.menu.display_value(MenuItem::Cycles),
        Some(SimulatedMachine::MAX_CYCLES.to_string().as_str())
    );
}

#[test]
fn test_direction_held_across_menu_does_not_stick() {
    let mut host = SimulatedMachine::new();
    let mut stack = stack(32);
    let mut display = Surface::new(320, 240, PixelFormat::Argb8888);

    tap(&mut stack, &mut host, keys::BACKSPACE);
    stack.handle_event(&KeyEvent::press(keys::RIGHT), &mut host);
    stack.render(&mut display, &mut host);
    assert_eq!(stack.pointer.velocity(), (1.0, 0.0));

    // The release lands while the menu is capturing input
    toggle_menu(&mut stack, &mut host);
    assert_eq!(
        stack.handle_event(&KeyEvent::release(keys::RIGHT), &mut host),
        EventOutcome::Consumed
    );
    toggle_menu(&mut stack, &mut host);

    let before = host.pointer_motion;
    for _ in 0..10 {
        stack.render(&mut display, &mut host);
    }
    assert_eq!(stack.pointer.velocity(), (0.0, 0.0));
    assert_eq!(host.pointer_motion, before);
}

#[cfg(not(feature = "classic-menu"))]
mod full_menu {
    use super::*;
    use overlay_ui::{CpuArchitecture, DecoderVariant};

    #[test]
    fn test_buffering_switch_requested_once_on_close() {
        let mut host = SimulatedMachine::new();
        let mut stack = stack(16);
        toggle_menu(&mut stack, &mut host);
        select(&mut stack, &mut host, MenuItem::DoubleBuffer);
        tap(&mut stack, &mut host, keys::LEFT_CTRL);
        assert!(host.buffering_requests.is_empty());

        toggle_menu(&mut stack, &mut host);
        assert_eq!(host.buffering_requests, vec![true]);

        // Reopening captures the new mode; closing again requests nothing
        toggle_menu(&mut stack, &mut host);
        assert_eq!(stack.menu.display_value(MenuItem::DoubleBuffer), Some("on"));
        toggle_menu(&mut stack, &mut host);
        assert_eq!(host.buffering_requests, vec![true]);
    }

    #[test]
    fn test_cpu_type_from_mixed_forces_prefetch() {
        let mut host = SimulatedMachine::new();
        assert_eq!(host.arch_code, CpuArchitecture::Mixed.code());
        let mut stack = stack(32);
        toggle_menu(&mut stack, &mut host);
        select(&mut stack, &mut host, MenuItem::CpuType);
        tap(&mut stack, &mut host, keys::LEFT_CTRL);

        assert_eq!(host.decoder, DecoderVariant::Prefetch);
        assert_eq!(host.prefetch_queue_size, 16);
        assert_eq!(stack.menu.display_value(MenuItem::Core), Some("prefetch"));
        assert_eq!(stack.menu.display_value(MenuItem::CpuType), Some("386 fast"));
    }
}
