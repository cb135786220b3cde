//! Free-text numeric interpretation.
//!
//! Study amounts are stored exactly as typed ("2 pages", "1,5 ruku"); a
//! number is extracted only when a statistic needs one.

/// Extract the first decimal number appearing anywhere in `text`,
/// accepting either `.` or `,` as the decimal separator. Returns 0 when no
/// digit is present.
///
/// Only the first comma is treated as a decimal point, and only one
/// fractional part is taken, so "1,2,3" reads as 1.2 and "1.2.3" as 1.2.
/// This mirrors how existing records have always been interpreted.
pub fn first_number(text: &str) -> f64 {
  let normalized = text.replacen(',', ".", 1);
  let bytes = normalized.as_bytes();

  let Some(start) = bytes.iter().position(u8::is_ascii_digit) else {
    return 0.0;
  };

  let mut end = start;
  while bytes.get(end).is_some_and(u8::is_ascii_digit) {
    end += 1;
  }
  if bytes.get(end) == Some(&b'.')
    && bytes.get(end + 1).is_some_and(u8::is_ascii_digit)
  {
    end += 1;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
      end += 1;
    }
  }

  normalized[start..end].parse().unwrap_or(0.0)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
