//! Row types for the raw inputs and the five output relations.

mod catalog;
mod songplay;
mod time;
mod usage;

pub use catalog::{ArtistRecord, SongMetadata, SongRecord};
pub use songplay::SongplayRecord;
pub use time::TimeRecord;
pub use usage::{EnrichedEvent, LogEvent, UserRecord};

/// Bit pattern used to compare and hash nullable doubles.
///
/// All NaNs collapse to one value and `-0.0` equals `0.0`, so rows that
/// print the same also deduplicate the same.
pub(crate) fn float_key(value: Option<f64>) -> Option<u64> {
    value.map(|v| {
        if v.is_nan() {
            f64::NAN.to_bits()
        } else if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_key_normalizes_zero_and_nan() {
        assert_eq!(float_key(Some(-0.0)), float_key(Some(0.0)));
        assert_eq!(float_key(Some(f64::NAN)), float_key(Some(-f64::NAN)));
        assert_ne!(float_key(Some(1.0)), float_key(Some(2.0)));
        assert_eq!(float_key(None), None);
    }
}
