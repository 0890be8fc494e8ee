//! Symbolic colors for overlay drawing
//!
//! Overlay code works in 8-bit RGB triples and lets the destination's
//! [`PixelFormat`](crate::surface::PixelFormat) decide the stored representation.

/// An opaque 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const BLUE: Rgb = Rgb::new(0x00, 0x00, 0xFF);
    pub const MAGENTA: Rgb = Rgb::new(0xFF, 0x00, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Inverted color, used for the highlighted menu row
    #[inline]
    pub const fn inverted(self) -> Self {
        Self::new(!self.r, !self.g, !self.b)
    }

    /// Pack into ARGB8888 (0xAARRGGBB) with full alpha
    #[inline]
    pub const fn to_argb(self) -> u32 {
        0xFF00_0000 | ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Unpack from ARGB8888, ignoring alpha
    #[inline]
    pub const fn from_argb(argb: u32) -> Self {
        Self::new((argb >> 16) as u8, (argb >> 8) as u8, argb as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_packing() {
        let c = Rgb::new(0x12, 0x34, 0x56);
        assert_eq!(c.to_argb(), 0xFF123456);
        assert_eq!(Rgb::from_argb(0x00ABCDEF), Rgb::new(0xAB, 0xCD, 0xEF));
    }

    #[test]
    fn test_inverted() {
        assert_eq!(Rgb::BLACK.inverted(), Rgb::WHITE);
        assert_eq!(Rgb::BLUE.inverted(), Rgb::new(0xFF, 0xFF, 0x00));
    }
}
