//! Human-readable number formatting for logs and host UIs.

/// Format a number with commas (e.g. 1234567 → "1,234,567").
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_number(-n));
    }
    let n = (n * 10.0).round() / 10.0;
    let int_part = n.floor() as u64;
    let tenths = ((n - int_part as f64) * 10.0).round() as u8;

    let s = int_part.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    let result: String = result.chars().rev().collect();

    if tenths > 0 {
        format!("{}.{}", result, tenths)
    } else {
        result
    }
}

const SUFFIXES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Short form for large values: 1.5K, 12.3M, 4.0B.
pub fn format_compact(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if n < 0.0 {
        return format!("-{}", format_compact(-n));
    }
    for (scale, suffix) in SUFFIXES {
        if n >= scale {
            return format!("{:.1}{}", n / scale, suffix);
        }
    }
    format_number(n)
}

/// Milliseconds as "1h 02m 03s", dropping leading zero units.
pub fn format_duration(ms: u64) -> String {
    let total = ms / 1000;
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_basic() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(123.0), "123");
        assert_eq!(format_number(1234.0), "1,234");
        assert_eq!(format_number(1234567.0), "1,234,567");
    }

    #[test]
    fn format_number_with_fraction() {
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-1500.25), "-1,500.3");
    }

    #[test]
    fn format_number_rounds_up_into_integer() {
        assert_eq!(format_number(2.97), "3");
        assert_eq!(format_number(999.96), "1,000");
    }

    #[test]
    fn compact_suffixes() {
        assert_eq!(format_compact(999.0), "999");
        assert_eq!(format_compact(1_500.0), "1.5K");
        assert_eq!(format_compact(1_440_000.0), "1.4M");
        assert_eq!(format_compact(2e12), "2.0T");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(61_000), "1m 01s");
        assert_eq!(format_duration(8 * 3_600_000 + 5_000), "8h 00m 05s");
    }
}
