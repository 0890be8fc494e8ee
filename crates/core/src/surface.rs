//! Addressable pixel buffers
//!
//! A [`Surface`] is a row-major byte buffer with an explicit row stride ("pitch")
//! that may be larger than `width * bytes_per_pixel`. All overlay drawing and
//! compositing goes through this type, so pixel access is bounds-checked.

use crate::color::Rgb;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Unsupported color depth: {0} bpp")]
    UnsupportedDepth(u8),
    #[error("Pitch of {pitch} bytes is smaller than a {row} byte row")]
    InvalidPitch { pitch: usize, row: usize },
}

/// Pixel representation of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 16-bit 5:6:5
    Rgb565,
    /// 32-bit 0xAARRGGBB
    Argb8888,
}

impl PixelFormat {
    /// Pick the format for a host color depth (bits per pixel)
    pub fn from_depth(bpp: u8) -> Result<Self, SurfaceError> {
        match bpp {
            16 => Ok(PixelFormat::Rgb565),
            32 => Ok(PixelFormat::Argb8888),
            other => Err(SurfaceError::UnsupportedDepth(other)),
        }
    }

    pub fn bits_per_pixel(self) -> u8 {
        match self {
            PixelFormat::Rgb565 => 16,
            PixelFormat::Argb8888 => 32,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Argb8888 => 4,
        }
    }

    /// Map a symbolic color to this format's pixel value
    #[inline]
    pub fn map_rgb(self, color: Rgb) -> u32 {
        match self {
            PixelFormat::Rgb565 => {
                (((color.r as u32) >> 3) << 11)
                    | (((color.g as u32) >> 2) << 5)
                    | ((color.b as u32) >> 3)
            }
            PixelFormat::Argb8888 => color.to_argb(),
        }
    }

    /// Expand a pixel value back to 8-bit channels
    #[inline]
    pub fn unmap(self, value: u32) -> Rgb {
        match self {
            PixelFormat::Rgb565 => {
                let r = ((value >> 11) & 0x1F) as u8;
                let g = ((value >> 5) & 0x3F) as u8;
                let b = (value & 0x1F) as u8;
                Rgb::new((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
            }
            PixelFormat::Argb8888 => Rgb::from_argb(value),
        }
    }
}

/// Axis-aligned rectangle in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Intersect with a `width` x `height` area anchored at the origin.
    /// Returns `(x0, y0, x1, y1)` as exclusive pixel bounds, or `None` when empty.
    fn clip(&self, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.w as i64).min(width as i64);
        let y1 = (self.y as i64 + self.h as i64).min(height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }
}

/// A pixel buffer with stride and format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pitch: usize,
    format: PixelFormat,
    pixels: Vec<u8>,
    /// Pixel value skipped when this surface is the source of [`Surface::blit_to`]
    color_key: Option<u32>,
}

impl Surface {
    /// Create a zeroed surface; rows are padded to a 4-byte boundary.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let row = width as usize * format.bytes_per_pixel();
        let pitch = (row + 3) & !3;
        Self {
            width,
            height,
            pitch,
            format,
            pixels: vec![0; pitch * height as usize],
            color_key: None,
        }
    }

    /// Create a zeroed surface with an explicit row stride
    pub fn with_pitch(
        width: u32,
        height: u32,
        pitch: usize,
        format: PixelFormat,
    ) -> Result<Self, SurfaceError> {
        let row = width as usize * format.bytes_per_pixel();
        if pitch < row {
            return Err(SurfaceError::InvalidPitch { pitch, row });
        }
        Ok(Self {
            width,
            height,
            pitch,
            format,
            pixels: vec![0; pitch * height as usize],
            color_key: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of two consecutive rows
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Raw buffer, `pitch * height` bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Visible bytes of row `y` (excludes pitch padding)
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.pitch;
        &self.pixels[start..start + self.width as usize * self.bytes_per_pixel()]
    }

    #[inline]
    pub fn map_rgb(&self, color: Rgb) -> u32 {
        self.format.map_rgb(color)
    }

    pub fn color_key(&self) -> Option<u32> {
        self.color_key
    }

    pub fn set_color_key(&mut self, key: Option<u32>) {
        self.color_key = key;
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.pitch + x * self.bytes_per_pixel()
    }

    /// Read the pixel value at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> u32 {
        let at = self.offset(x as usize, y as usize);
        match self.format {
            PixelFormat::Rgb565 => {
                u16::from_ne_bytes([self.pixels[at], self.pixels[at + 1]]) as u32
            }
            PixelFormat::Argb8888 => u32::from_ne_bytes([
                self.pixels[at],
                self.pixels[at + 1],
                self.pixels[at + 2],
                self.pixels[at + 3],
            ]),
        }
    }

    /// Write a pixel value at (x, y); out-of-bounds writes are dropped
    pub fn put_pixel(&mut self, x: i32, y: i32, value: u32) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let at = self.offset(x as usize, y as usize);
        self.store(at, value);
    }

    #[inline]
    fn store(&mut self, at: usize, value: u32) {
        match self.format {
            PixelFormat::Rgb565 => {
                self.pixels[at..at + 2].copy_from_slice(&(value as u16).to_ne_bytes())
            }
            PixelFormat::Argb8888 => self.pixels[at..at + 4].copy_from_slice(&value.to_ne_bytes()),
        }
    }

    /// Fill every visible pixel with `value`
    pub fn fill(&mut self, value: u32) {
        self.fill_rect(Rect::new(0, 0, self.width, self.height), value);
    }

    /// Fill a rectangle, clipped to the surface
    pub fn fill_rect(&mut self, rect: Rect, value: u32) {
        let Some((x0, y0, x1, y1)) = rect.clip(self.width, self.height) else {
            return;
        };
        let bpp = self.bytes_per_pixel();
        for y in y0..y1 {
            let mut at = self.offset(x0, y);
            for _ in x0..x1 {
                self.store(at, value);
                at += bpp;
            }
        }
    }

    /// Copy this surface onto `dest` with its top-left corner at (x, y).
    ///
    /// The copy is clipped to `dest`. Pixels equal to the color key are skipped.
    /// Differing formats are converted through [`Rgb`].
    pub fn blit_to(&self, dest: &mut Surface, x: i32, y: i32) {
        let target = Rect::new(x, y, self.width, self.height);
        let Some((x0, y0, x1, y1)) = target.clip(dest.width, dest.height) else {
            return;
        };
        let same_format = self.format == dest.format;
        for dy in y0..y1 {
            let sy = (dy as i64 - y as i64) as u32;
            for dx in x0..x1 {
                let sx = (dx as i64 - x as i64) as u32;
                let value = self.get_pixel(sx, sy);
                if self.color_key == Some(value) {
                    continue;
                }
                let value = if same_format {
                    value
                } else {
                    dest.format.map_rgb(self.format.unmap(value))
                };
                let at = dest.offset(dx, dy);
                dest.store(at, value);
            }
        }
    }
}
