use crate::detect::result::Detection;

/// Reduce one frame's raw detections to the target class at or above the
/// confidence cutoff.
///
/// Pure, O(n) over the input. Empty input yields an empty output. The
/// occupancy count for the frame is the length of the returned list.
pub fn filter_detections(
    detections: &[Detection],
    target_label: &str,
    confidence_cutoff: f32,
) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| d.label.eq_ignore_ascii_case(target_label) && d.score >= confidence_cutoff)
        .cloned()
        .collect()
}
