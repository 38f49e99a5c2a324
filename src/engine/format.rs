//! Format selection expression.
//!
//! The engine evaluates `/`-separated alternatives left to right and takes
//! the first one that exists, so the most specific combination comes first.

/// Build the fallback chain for a target vertical resolution.
///
/// 1. exact height, H.264 MP4 video + M4A audio
/// 2. height at most, H.264 MP4 video + M4A audio
/// 3. height at most, any MP4 video + M4A audio
/// 4. height at most, any video + any audio
/// 5. single combined stream at most that height with a video codec
pub fn selection_expression(quality: &str) -> String {
    [
        format!("bestvideo[height={quality}][ext=mp4][vcodec^=avc1]+bestaudio[ext=m4a]"),
        format!("bestvideo[height<={quality}][ext=mp4][vcodec^=avc1]+bestaudio[ext=m4a]"),
        format!("bestvideo[height<={quality}][ext=mp4]+bestaudio[ext=m4a]"),
        format!("bestvideo[height<={quality}]+bestaudio"),
        format!("best[height<={quality}][vcodec!*=none]"),
    ]
    .join("/")
}
