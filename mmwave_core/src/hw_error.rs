//! Maps `Box<dyn Error>` from the `FrameSource` seam to a typed `TrackerError`.
//!
//! With the `hardware-errors` feature, `mmwave_hardware::HwError` is downcast
//! for a precise mapping; otherwise the message is inspected.

use crate::error::TrackerError;

pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> TrackerError {
    #[cfg(feature = "hardware-errors")]
    {
        use mmwave_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => TrackerError::Timeout,
                other => TrackerError::Source(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        TrackerError::Timeout
    } else {
        TrackerError::Source(s)
    }
}
