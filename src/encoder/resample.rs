//! Aspect-preserving bilinear downscaling of packed RGB buffers

use crate::types::RGB_CHANNELS;

/// Output dimensions for a frame bounded by `max_dimension`
///
/// When the larger side exceeds the bound it becomes exactly `max_dimension`
/// and the other side is scaled by the same factor, rounded to nearest and
/// never below one pixel. Frames already within the bound keep their size.
pub fn target_dimensions(width: u32, height: u32, max_dimension: Option<u32>) -> (u32, u32) {
    let Some(max) = max_dimension.filter(|m| *m > 0) else {
        return (width, height);
    };
    if width.max(height) <= max {
        return (width, height);
    }

    let scale_other = |other: u32, larger: u32| -> u32 {
        let scaled = (other as u64 * max as u64 + larger as u64 / 2) / larger as u64;
        (scaled as u32).max(1)
    };

    if width >= height { (max, scale_other(height, width)) } else { (scale_other(width, height), max) }
}

/// Resample `src` (`src_width` x `src_height`, RGB) to the destination size
///
/// Each destination pixel maps its centre back into source space and blends
/// the four surrounding source pixels by their fractional distances. Edge
/// samples clamp to the border.
pub fn resample_bilinear(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Vec<u8> {
    let mut dst = Vec::new();
    resample_bilinear_into(src, src_width, src_height, dst_width, dst_height, &mut dst);
    dst
}

/// [`resample_bilinear`] writing into `dst`, which is resized to fit and
/// keeps its allocation when the destination size is unchanged
pub fn resample_bilinear_into(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
    dst: &mut Vec<u8>,
) {
    let (sw, sh) = (src_width as usize, src_height as usize);
    let (dw, dh) = (dst_width as usize, dst_height as usize);
    debug_assert_eq!(src.len(), sw * sh * RGB_CHANNELS);

    dst.resize(dw * dh * RGB_CHANNELS, 0);
    if dw == 0 || dh == 0 || sw == 0 || sh == 0 {
        dst.fill(0);
        return;
    }

    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;

    // Horizontal taps are the same for every row
    let columns: Vec<(usize, usize, f32)> =
        (0..dw).map(|dx| source_taps(dx, x_ratio, sw)).collect();

    for dy in 0..dh {
        let (y0, y1, fy) = source_taps(dy, y_ratio, sh);
        let row0 = &src[y0 * sw * RGB_CHANNELS..(y0 + 1) * sw * RGB_CHANNELS];
        let row1 = &src[y1 * sw * RGB_CHANNELS..(y1 + 1) * sw * RGB_CHANNELS];
        let out_row = &mut dst[dy * dw * RGB_CHANNELS..(dy + 1) * dw * RGB_CHANNELS];

        for (dx, &(x0, x1, fx)) in columns.iter().enumerate() {
            for c in 0..RGB_CHANNELS {
                let p00 = row0[x0 * RGB_CHANNELS + c] as f32;
                let p10 = row0[x1 * RGB_CHANNELS + c] as f32;
                let p01 = row1[x0 * RGB_CHANNELS + c] as f32;
                let p11 = row1[x1 * RGB_CHANNELS + c] as f32;

                let top = p00 + (p10 - p00) * fx;
                let bottom = p01 + (p11 - p01) * fx;
                let value = top + (bottom - top) * fy;

                out_row[dx * RGB_CHANNELS + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Neighbouring source indices and blend weight for destination index `d`
fn source_taps(d: usize, ratio: f32, len: usize) -> (usize, usize, f32) {
    let max_index = (len - 1) as f32;
    let s = ((d as f32 + 0.5) * ratio - 0.5).clamp(0.0, max_index);
    let i0 = s.floor() as usize;
    let i1 = (i0 + 1).min(len - 1);
    (i0, i1, s - i0 as f32)
}
