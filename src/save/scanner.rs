//! Bounded marker scans
//!
//! Sections whose offset depends on upstream variable-length data are found
//! by searching for their ASCII marker. Every scan is bounded and returns
//! `None` when the marker is absent; whether absence is an error is up to
//! the caller.

/// First occurrence of `marker` starting within `window` bytes of `from`
pub fn find_forward(data: &[u8], marker: &[u8], from: usize, window: usize) -> Option<usize> {
    let last_start = data.len().checked_sub(marker.len())?;
    let end = from.saturating_add(window).min(last_start + 1);
    (from..end).find(|&pos| data[pos..pos + marker.len()] == *marker)
}

/// Last occurrence of `marker` ending at or before `before`
pub fn find_backward(data: &[u8], marker: &[u8], before: usize) -> Option<usize> {
    let before = before.min(data.len());
    let last_start = before.checked_sub(marker.len())?;
    (0..=last_start)
        .rev()
        .find(|&pos| data[pos..pos + marker.len()] == *marker)
}

/// First occurrence of `marker` anywhere at or after `from`
pub fn find_next(data: &[u8], marker: &[u8], from: usize) -> Option<usize> {
    find_forward(data, marker, from, data.len().saturating_sub(from))
}

/// Whether `marker` sits exactly at `offset`
pub fn marker_at(data: &[u8], marker: &[u8], offset: usize) -> bool {
    offset
        .checked_add(marker.len())
        .and_then(|end| data.get(offset..end))
        .is_some_and(|bytes| bytes == marker)
}
