//! Collaborators the overlays consult and drive
//!
//! The overlays never own emulator state. Runtime configuration, display
//! presentation and the emulated mouse are reached through the traits below,
//! implemented by the host. [`SimulatedMachine`] is a self-contained
//! implementation used by the headless driver and the tests.

use serde::{Deserialize, Serialize};

/// How the emulated CPU's cycle budget is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleMode {
    /// Cycle count determined automatically per program
    Auto,
    /// Auto-adjust towards maximum host usage
    Max,
    /// Fixed numeric target
    Fixed,
}

impl CycleMode {
    /// Next mode for the menu's cycle item: Auto -> Max -> Fixed -> Auto
    pub fn next(self) -> Self {
        match self {
            CycleMode::Auto => CycleMode::Max,
            CycleMode::Max => CycleMode::Fixed,
            CycleMode::Fixed => CycleMode::Auto,
        }
    }
}

/// Instruction decoder (core) used by the emulated CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderVariant {
    Normal,
    Simple,
    Full,
    /// Dynamic recompiler, only present in some builds
    Dynamic,
    /// Prefetch-queue emulating decoder, selected by some architecture modes
    Prefetch,
}

impl DecoderVariant {
    /// Menu cycle order: Normal -> Simple -> Full -> Dynamic -> Normal.
    /// Dynamic is skipped when unavailable; Prefetch returns to Normal.
    pub fn next(self, dynamic_available: bool) -> Self {
        match self {
            DecoderVariant::Normal => DecoderVariant::Simple,
            DecoderVariant::Simple => DecoderVariant::Full,
            DecoderVariant::Full if dynamic_available => DecoderVariant::Dynamic,
            DecoderVariant::Full | DecoderVariant::Dynamic | DecoderVariant::Prefetch => {
                DecoderVariant::Normal
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DecoderVariant::Normal => "normal",
            DecoderVariant::Simple => "simple",
            DecoderVariant::Full => "full",
            DecoderVariant::Dynamic => "dynamic",
            DecoderVariant::Prefetch => "prefetch",
        }
    }
}

/// Alignment-check flag in EFLAGS
pub const FLAG_AC: u32 = 0x0004_0000;
/// CPUID-available flag in EFLAGS
pub const FLAG_ID: u32 = 0x0020_0000;

/// Emulated processor generation, carried by the host as a raw code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuArchitecture {
    Mixed,
    Slow386,
    Fast386,
    Slow486Old,
    Slow486,
    SlowPentium,
}

impl CpuArchitecture {
    pub const fn code(self) -> u32 {
        match self {
            CpuArchitecture::Mixed => 0xFF,
            CpuArchitecture::Slow386 => 0x30,
            CpuArchitecture::Fast386 => 0x35,
            CpuArchitecture::Slow486Old => 0x40,
            CpuArchitecture::Slow486 => 0x45,
            CpuArchitecture::SlowPentium => 0x50,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0xFF => Some(CpuArchitecture::Mixed),
            0x30 => Some(CpuArchitecture::Slow386),
            0x35 => Some(CpuArchitecture::Fast386),
            0x40 => Some(CpuArchitecture::Slow486Old),
            0x45 => Some(CpuArchitecture::Slow486),
            0x50 => Some(CpuArchitecture::SlowPentium),
            _ => None,
        }
    }

    /// Menu cycle order: Mixed -> Fast386 -> Slow386 -> Slow486 -> SlowPentium -> Mixed.
    /// Unrecognized codes restart at Mixed.
    pub fn next_code(code: u32) -> Self {
        match Self::from_code(code) {
            Some(CpuArchitecture::Mixed) => CpuArchitecture::Fast386,
            Some(CpuArchitecture::Fast386) => CpuArchitecture::Slow386,
            Some(CpuArchitecture::Slow386) | Some(CpuArchitecture::Slow486Old) => {
                CpuArchitecture::Slow486
            }
            Some(CpuArchitecture::Slow486) => CpuArchitecture::SlowPentium,
            Some(CpuArchitecture::SlowPentium) | None => CpuArchitecture::Mixed,
        }
    }

    /// Decoder and prefetch queue size this mode requires, if any
    pub fn forced_prefetch(self) -> Option<u32> {
        match self {
            CpuArchitecture::Fast386 => Some(16),
            CpuArchitecture::Slow486 => Some(32),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CpuArchitecture::Mixed => "auto",
            CpuArchitecture::Slow386 => "386",
            CpuArchitecture::Fast386 => "386 fast",
            CpuArchitecture::Slow486Old => "486 old",
            CpuArchitecture::Slow486 => "486",
            CpuArchitecture::SlowPentium => "pentium",
        }
    }
}

/// EFLAGS bits that may be toggled by software for an architecture code
pub fn extflags_toggle_for(code: u32) -> u32 {
    if code >= CpuArchitecture::Slow486.code() {
        FLAG_ID | FLAG_AC
    } else if code >= CpuArchitecture::Slow486Old.code() {
        FLAG_AC
    } else {
        0
    }
}

/// Runtime CPU and renderer configuration store
pub trait EmulatorConfig {
    fn frameskip(&self) -> u32;
    fn set_frameskip(&mut self, frames: u32);

    fn cycle_mode(&self) -> CycleMode;
    fn set_cycle_mode(&mut self, mode: CycleMode);
    fn cycle_target(&self) -> i32;
    /// Step the cycle budget up the way the host's hotkeys do
    fn cycle_increase(&mut self);
    fn cycle_decrease(&mut self);

    fn decoder(&self) -> DecoderVariant;
    fn set_decoder(&mut self, decoder: DecoderVariant);
    fn dynamic_available(&self) -> bool;
    fn auto_decoder(&self) -> bool;
    fn set_auto_decoder(&mut self, enabled: bool);

    fn arch_code(&self) -> u32;
    fn set_arch_code(&mut self, code: u32);
    fn prefetch_queue_size(&self) -> u32;
    fn set_prefetch_queue_size(&mut self, bytes: u32);
    fn extflags_toggle(&self) -> u32;
    fn set_extflags_toggle(&mut self, flags: u32);
}

/// Display presentation layer
pub trait Presentation {
    fn double_buffered(&self) -> bool;
    /// Switch between single and double buffering. May reallocate surfaces.
    fn request_buffering(&mut self, double: bool);
    /// Ask for the next frame to be presented even if the emulated screen is unchanged
    fn force_update(&mut self);
}

/// Emulated mouse driver
pub trait PointerDevice {
    /// Whether the emulated program has hidden its mouse cursor
    fn pointer_hidden(&self) -> bool;
    fn cursor_moved(&mut self, dx: f32, dy: f32);
    fn button_pressed(&mut self, button: u8);
    fn button_released(&mut self, button: u8);
}

/// In-memory host used by the headless driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedMachine {
    pub frameskip: u32,
    pub cycle_mode: CycleMode,
    pub cycle_target: i32,
    /// Host usage percentage targeted in [`CycleMode::Max`]
    pub cycle_percent: u32,
    pub decoder: DecoderVariant,
    pub dynamic_available: bool,
    pub auto_decoder: bool,
    pub arch_code: u32,
    pub prefetch_queue_size: u32,
    pub extflags_toggle: u32,
    pub double_buffered: bool,
    /// Every buffering switch requested, in order
    pub buffering_requests: Vec<bool>,
    pub forced_updates: u32,
    pub pointer_hidden: bool,
    pub pointer_motion: (f32, f32),
    pub buttons_down: [bool; 4],
    /// (button, pressed) in arrival order
    pub button_log: Vec<(u8, bool)>,
}

impl SimulatedMachine {
    pub const MIN_CYCLES: i32 = 100;
    /// Fixed targets never grow past this
    pub const MAX_CYCLES: i32 = 1_000_000;

    pub fn new() -> Self {
        Self {
            frameskip: 0,
            cycle_mode: CycleMode::Fixed,
            cycle_target: 3000,
            cycle_percent: 100,
            decoder: DecoderVariant::Normal,
            dynamic_available: false,
            auto_decoder: false,
            arch_code: CpuArchitecture::Mixed.code(),
            prefetch_queue_size: 0,
            extflags_toggle: FLAG_ID | FLAG_AC,
            double_buffered: false,
            buffering_requests: Vec::new(),
            forced_updates: 0,
            pointer_hidden: false,
            pointer_motion: (0.0, 0.0),
            buttons_down: [false; 4],
            button_log: Vec::new(),
        }
    }
}

impl Default for SimulatedMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorConfig for SimulatedMachine {
    fn frameskip(&self) -> u32 {
        self.frameskip
    }

    fn set_frameskip(&mut self, frames: u32) {
        self.frameskip = frames;
    }

    fn cycle_mode(&self) -> CycleMode {
        self.cycle_mode
    }

    fn set_cycle_mode(&mut self, mode: CycleMode) {
        self.cycle_mode = mode;
    }

    fn cycle_target(&self) -> i32 {
        self.cycle_target
    }

    fn cycle_increase(&mut self) {
        match self.cycle_mode {
            CycleMode::Max => self.cycle_percent = (self.cycle_percent + 5).min(105),
            CycleMode::Auto | CycleMode::Fixed => {
                self.cycle_mode = CycleMode::Fixed;
                let scaled = (self.cycle_target as f64 * 1.1) as i32;
                self.cycle_target = scaled
                    .max(self.cycle_target.saturating_add(1))
                    .min(Self::MAX_CYCLES);
            }
        }
    }

    fn cycle_decrease(&mut self) {
        match self.cycle_mode {
            CycleMode::Max => self.cycle_percent = self.cycle_percent.saturating_sub(5).max(10),
            CycleMode::Auto | CycleMode::Fixed => {
                self.cycle_mode = CycleMode::Fixed;
                let scaled = (self.cycle_target as f64 / 1.2) as i32;
                self.cycle_target = scaled.max(Self::MIN_CYCLES);
            }
        }
    }

    fn decoder(&self) -> DecoderVariant {
        self.decoder
    }

    fn set_decoder(&mut self, decoder: DecoderVariant) {
        self.decoder = decoder;
    }

    fn dynamic_available(&self) -> bool {
        self.dynamic_available
    }

    fn auto_decoder(&self) -> bool {
        self.auto_decoder
    }

    fn set_auto_decoder(&mut self, enabled: bool) {
        self.auto_decoder = enabled;
    }

    fn arch_code(&self) -> u32 {
        self.arch_code
    }

    fn set_arch_code(&mut self, code: u32) {
        self.arch_code = code;
    }

    fn prefetch_queue_size(&self) -> u32 {
        self.prefetch_queue_size
    }

    fn set_prefetch_queue_size(&mut self, bytes: u32) {
        self.prefetch_queue_size = bytes;
    }

    fn extflags_toggle(&self) -> u32 {
        self.extflags_toggle
    }

    fn set_extflags_toggle(&mut self, flags: u32) {
        self.extflags_toggle = flags;
    }
}

impl Presentation for SimulatedMachine {
    fn double_buffered(&self) -> bool {
        self.double_buffered
    }

    fn request_buffering(&mut self, double: bool) {
        self.buffering_requests.push(double);
        self.double_buffered = double;
    }

    fn force_update(&mut self) {
        self.forced_updates += 1;
    }
}

impl PointerDevice for SimulatedMachine {
    fn pointer_hidden(&self) -> bool {
        self.pointer_hidden
    }

    fn cursor_moved(&mut self, dx: f32, dy: f32) {
        self.pointer_motion.0 += dx;
        self.pointer_motion.1 += dy;
    }

    fn button_pressed(&mut self, button: u8) {
        if let Some(down) = self.buttons_down.get_mut(button as usize) {
            *down = true;
        }
        self.button_log.push((button, true));
    }

    fn button_released(&mut self, button: u8) {
        if let Some(down) = self.buttons_down.get_mut(button as usize) {
            *down = false;
        }
        self.button_log.push((button, false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_mode_order() {
        assert_eq!(CycleMode::Fixed.next(), CycleMode::Auto);
        assert_eq!(CycleMode::Auto.next(), CycleMode::Max);
        assert_eq!(CycleMode::Max.next(), CycleMode::Fixed);
    }

    #[test]
    fn test_decoder_order_skips_unavailable_dynamic() {
        assert_eq!(DecoderVariant::Full.next(false), DecoderVariant::Normal);
        assert_eq!(DecoderVariant::Full.next(true), DecoderVariant::Dynamic);
        assert_eq!(DecoderVariant::Dynamic.next(true), DecoderVariant::Normal);
        assert_eq!(DecoderVariant::Prefetch.next(true), DecoderVariant::Normal);
    }

    #[test]
    fn test_architecture_order() {
        let mut code = CpuArchitecture::Mixed.code();
        let mut seen = Vec::new();
        for _ in 0..5 {
            let next = CpuArchitecture::next_code(code);
            seen.push(next);
            code = next.code();
        }
        assert_eq!(
            seen,
            vec![
                CpuArchitecture::Fast386,
                CpuArchitecture::Slow386,
                CpuArchitecture::Slow486,
                CpuArchitecture::SlowPentium,
                CpuArchitecture::Mixed,
            ]
        );
        assert_eq!(CpuArchitecture::next_code(0x12), CpuArchitecture::Mixed);
        assert_eq!(
            CpuArchitecture::next_code(CpuArchitecture::Slow486Old.code()),
            CpuArchitecture::Slow486
        );
    }

    #[test]
    fn test_extflags_thresholds() {
        assert_eq!(extflags_toggle_for(CpuArchitecture::Slow386.code()), 0);
        assert_eq!(extflags_toggle_for(CpuArchitecture::Fast386.code()), 0);
        assert_eq!(extflags_toggle_for(CpuArchitecture::Slow486Old.code()), FLAG_AC);
        assert_eq!(
            extflags_toggle_for(CpuArchitecture::Slow486.code()),
            FLAG_ID | FLAG_AC
        );
        assert_eq!(
            extflags_toggle_for(CpuArchitecture::Mixed.code()),
            FLAG_ID | FLAG_AC
        );
    }

    #[test]
    fn test_simulated_cycle_steps() {
        let mut m = SimulatedMachine::new();
        m.cycle_increase();
        assert_eq!(m.cycle_target, 3300);
        m.cycle_decrease();
        assert_eq!(m.cycle_target, 2750);

        m.cycle_target = 110;
        m.cycle_decrease();
        assert_eq!(m.cycle_target, SimulatedMachine::MIN_CYCLES);

        m.cycle_mode = CycleMode::Max;
        m.cycle_increase();
        assert_eq!(m.cycle_percent, 105);
        m.cycle_increase();
        assert_eq!(m.cycle_percent, 105);

        m.cycle_mode = CycleMode::Auto;
        m.cycle_increase();
        assert_eq!(m.cycle_mode, CycleMode::Fixed);
    }

    #[test]
    fn test_simulated_cycle_increase_is_capped() {
        let mut m = SimulatedMachine::new();
        for _ in 0..300 {
            m.cycle_increase();
        }
        assert_eq!(m.cycle_target, SimulatedMachine::MAX_CYCLES);

        m.cycle_target = i32::MAX;
        m.cycle_increase();
        assert_eq!(m.cycle_target, SimulatedMachine::MAX_CYCLES);
    }

    #[test]
    fn test_simulated_state_serializes() {
        let m = SimulatedMachine::new();
        let v = serde_json::to_value(&m).expect("serialize");
        assert_eq!(v["cycle_mode"], "fixed");
        assert_eq!(v["decoder"], "normal");
    }
}
