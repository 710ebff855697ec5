//! SMPTE 12M-1 drop-frame compensation
//!
//! Drop-frame timecode skips frame *numbers* (never real frames) at the start
//! of every minute except minutes 0, 10, 20, 30, 40 and 50, so that the
//! displayed time stays in step with wall-clock time at NTSC-derived rates.
//!
//! ```text
//! 30 fps base, 2 numbers dropped per minute:
//!   real frame 1799 -> 00:00:59;29
//!   real frame 1800 -> 00:01:00;02   (;00 and ;01 do not exist)
//! ```

/// Frame numbers dropped at each dropping minute boundary
///
/// 2 for 24/30 fps bases, 4 for 48/60, 8 for 120. The count doubles with the
/// base so the per-second correction stays the same at every rate.
pub fn drop_per_minute(rounded_fps: u32) -> u32 {
    match rounded_fps {
        0..=30 => 2,
        31..=60 => 4,
        _ => 8,
    }
}

/// Real frames in a 10-minute block (one non-dropping + nine dropping minutes)
pub fn frames_per_ten_minutes(rounded_fps: u32) -> u64 {
    let fps = rounded_fps as u64;
    let drop = drop_per_minute(rounded_fps) as u64;
    fps * 600 - drop * 9
}

/// Convert a real frame count into the timecode-visible frame number
///
/// `total_frames` is the number of frames elapsed since zero; the result is
/// `total_frames` plus every frame number skipped so far. Complete 10-minute
/// blocks each contribute `9 * drop` skipped numbers; within the remaining
/// partial block every elapsed minute after the block's first contributes
/// `drop` more. Minute lengths are measured in real frames, so a dropping
/// minute is `rounded_fps * 60 - drop` frames long.
///
/// The result is monotonically non-decreasing in `total_frames`.
///
/// # Example
/// ```
/// use bcmon_core::timecode::drop_frame::adjust_frame_count;
///
/// assert_eq!(adjust_frame_count(1799, 30), 1799);
/// assert_eq!(adjust_frame_count(1800, 30), 1802);
/// ```
pub fn adjust_frame_count(total_frames: u64, rounded_fps: u32) -> u64 {
    if rounded_fps == 0 {
        return total_frames;
    }

    let drop = drop_per_minute(rounded_fps) as u64;
    let dropping_minute = rounded_fps as u64 * 60 - drop;
    let block = frames_per_ten_minutes(rounded_fps);

    let blocks = total_frames / block;
    let remainder = total_frames % block;

    let mut dropped = blocks * drop * 9;
    // Minute 0 of the block is a full-length minute; after it, each
    // dropping minute starts `drop` numbers late.
    dropped += drop * (remainder.saturating_sub(drop) / dropping_minute);

    total_frames.saturating_add(dropped)
}

/// Inverse of [`adjust_frame_count`]: real frame count for a displayed address
///
/// `total_minutes` and the displayed `frame_number` (hours, minutes, seconds
/// and frames flattened with the integer base) must come from a valid
/// drop-frame address.
pub fn real_frame_count(frame_number: u64, total_minutes: u64, rounded_fps: u32) -> u64 {
    let drop = drop_per_minute(rounded_fps) as u64;
    let skipped = drop * (total_minutes - total_minutes / 10);
    frame_number.saturating_sub(skipped)
}
