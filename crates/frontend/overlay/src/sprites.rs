//! Pointer overlay artwork
//!
//! Sprites are kept as character bitmaps and rasterized into color-keyed
//! surfaces of the host's depth at init: `#` outline, `o` fill, anything else
//! transparent.

use overlay_core::{PixelFormat, Rgb, Surface};

pub const CURSOR_SIZE: u32 = 24;
pub const ICON_SIZE: u32 = 16;

/// Transparent key color; never used by the artwork itself
const KEY: Rgb = Rgb::MAGENTA;

#[rustfmt::skip]
const CURSOR_ART: &[&str] = &[
    "#",
    "##",
    "#o#",
    "#oo#",
    "#ooo#",
    "#oooo#",
    "#ooooo#",
    "#oooooo#",
    "#ooooooo#",
    "#oooooooo#",
    "#ooooo#####",
    "#oo#oo#",
    "#o# #oo#",
    "##  #oo#",
    "#    #oo#",
    "     #oo#",
    "      ##",
];

#[rustfmt::skip]
const ICON_ART: &[&str] = &[
    "                ",
    "   ##########   ",
    "  #oooo#oooo#   ",
    "  #oooo#oooo#   ",
    "  #oooo#oooo#   ",
    "  ###########   ",
    "  #oooooooooo#  ",
    "  #oooooooooo#  ",
    "  #oooooooooo#  ",
    "  #oooooooooo#  ",
    "  #oooooooooo#  ",
    "   #oooooooo#   ",
    "    #oooooo#    ",
    "     ######     ",
];

fn rasterize(art: &[&str], size: u32, format: PixelFormat) -> Surface {
    let mut surface = Surface::new(size, size, format);
    let key = surface.map_rgb(KEY);
    let outline = surface.map_rgb(Rgb::BLACK);
    let fill = surface.map_rgb(Rgb::WHITE);
    surface.fill(key);

    for (y, row) in art.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            let value = match c {
                '#' => outline,
                'o' => fill,
                _ => continue,
            };
            surface.put_pixel(x as i32, y as i32, value);
        }
    }
    surface.set_color_key(Some(key));
    surface
}

/// Arrow cursor drawn at the virtual pointer position
pub fn cursor(format: PixelFormat) -> Surface {
    rasterize(CURSOR_ART, CURSOR_SIZE, format)
}

/// Status icon shown when the emulated program hides its own cursor
pub fn mouse_icon(format: PixelFormat) -> Surface {
    rasterize(ICON_ART, ICON_SIZE, format)
}
