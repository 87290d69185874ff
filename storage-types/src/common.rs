//! Common formatting helpers shared across models

use num_format::{Locale, ToFormattedString};

/// Convert bytes to human-readable format (e.g., "1.50 GB")
pub fn bytes_to_pretty(bytes: &u64, add_bytes: bool) -> String {
    let mut steps = 0;
    let mut val: f64 = *bytes as f64;

    while val > 1024. && steps < 8 {
        val /= 1024.;
        steps += 1;
    }

    let unit = match steps {
        0 => "B",
        1 => "KB",
        2 => "MB",
        3 => "GB",
        4 => "TB",
        5 => "PB",
        6 => "EB",
        7 => "ZB",
        _ => "YB",
    };

    if add_bytes {
        let bytes_str = bytes.to_formatted_string(&Locale::en);
        format!("{:.2} {} ({} bytes)", val, unit, bytes_str)
    } else {
        format!("{:.2} {}", val, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_stay_in_bytes() {
        assert_eq!(bytes_to_pretty(&512, false), "512.00 B");
        assert_eq!(bytes_to_pretty(&1024, false), "1024.00 B");
    }

    #[test]
    fn gigabyte_sized_device_with_byte_count() {
        let size = 16 * 1024 * 1024 * 1024_u64 + 1;
        assert_eq!(
            bytes_to_pretty(&size, true),
            "16.00 GB (17,179,869,185 bytes)"
        );
    }
}
