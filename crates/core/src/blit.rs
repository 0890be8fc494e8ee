//! Row-copy compositing for overlay surfaces
//!
//! Overlays are drawn at a fixed native size and composited onto the host's
//! display surface just before presentation. When the display is at least twice
//! as tall as the overlay, every source row is written twice ("pixel doubling")
//! to scale the overlay vertically by 2x without interpolation.
//!
//! Rows are copied in [`BLIT_CHUNK`]-byte blocks of 64-bit words, with a
//! byte-wise tail for whatever remains below one block.

use crate::surface::Surface;

/// Bulk copy granularity in bytes (eight 64-bit words)
pub const BLIT_CHUNK: usize = 64;

const WORD: usize = 8;

/// Copy `src` into the front of `dst`.
///
/// The largest multiple of [`BLIT_CHUNK`] is moved word by word, the remainder
/// byte by byte. `dst` must be at least as long as `src`.
#[inline]
pub fn copy_row(dst: &mut [u8], src: &[u8]) {
    debug_assert!(dst.len() >= src.len());
    let bulk = src.len() - src.len() % BLIT_CHUNK;

    for (d, s) in dst[..bulk]
        .chunks_exact_mut(BLIT_CHUNK)
        .zip(src[..bulk].chunks_exact(BLIT_CHUNK))
    {
        for (dw, sw) in d.chunks_exact_mut(WORD).zip(s.chunks_exact(WORD)) {
            dw.copy_from_slice(sw);
        }
    }

    for (d, s) in dst[bulk..src.len()].iter_mut().zip(&src[bulk..]) {
        *d = *s;
    }
}

/// Composite `source` onto `destination`, writing each source row twice.
///
/// `left` is in pixels and `top` in destination rows. Each row copies the
/// full source pitch, then skips `destination.pitch() - source.pitch() - left * bpp`
/// trailing bytes before the duplicate.
///
/// Caller guarantees `top + 2 * source.height() <= destination.height()` and
/// `left * bpp + source.pitch() <= destination.pitch()`; see [`fits_doubled`].
/// Violations panic on the slice bounds rather than corrupting memory.
pub fn blit_doubled(source: &Surface, left: u32, top: u32, destination: &mut Surface) {
    debug_assert_eq!(source.format(), destination.format());
    debug_assert!(fits_doubled(source, left, top, destination));

    let width = source.pitch();
    if width == 0 {
        return;
    }
    let offset = left as usize * source.bytes_per_pixel();
    let dst_pitch = destination.pitch();
    let src = source.pixels();
    let dst = destination.pixels_mut();

    let mut cursor = dst_pitch * top as usize;
    for row in src.chunks_exact(width).take(source.height() as usize) {
        for _ in 0..2 {
            let start = cursor + offset;
            copy_row(&mut dst[start..start + width], row);
            cursor += dst_pitch;
        }
    }
}

/// Composite `source` onto `destination` one row per row, clipped to the destination.
pub fn blit_direct(source: &Surface, left: u32, top: u32, destination: &mut Surface) {
    debug_assert_eq!(source.format(), destination.format());

    let offset = left as usize * source.bytes_per_pixel();
    let dst_pitch = destination.pitch();
    if offset >= dst_pitch || top >= destination.height() {
        return;
    }
    let width = source.pitch().min(dst_pitch - offset);
    let rows = source.height().min(destination.height() - top) as usize;
    let src_pitch = source.pitch();
    let src = source.pixels();
    let dst = destination.pixels_mut();

    for y in 0..rows {
        let s = y * src_pitch;
        let d = (top as usize + y) * dst_pitch + offset;
        copy_row(&mut dst[d..d + width], &src[s..s + width]);
    }
}

/// Whether [`blit_doubled`] may be called with these arguments
pub fn fits_doubled(source: &Surface, left: u32, top: u32, destination: &Surface) -> bool {
    let offset = left as usize * source.bytes_per_pixel();
    offset + source.pitch() <= destination.pitch()
        && top as u64 + 2 * source.height() as u64 <= destination.height() as u64
}
