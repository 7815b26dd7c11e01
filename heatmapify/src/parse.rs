use std::path::Path;

use crate::error::{HeatmapError, HeatmapResult};

/// Highest y bucket; buckets run over `0..=Y_BUCKETS`.
pub const Y_BUCKETS: i64 = 100;

/// How numeric fields that are not clean numbers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Use the longest numeric prefix of a field; anything else reads as zero.
    #[default]
    Permissive,
    /// Reject missing or malformed fields.
    Strict,
}

/// One data row: an x bucket and the raw y coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x_bucket: i64,
    pub y_value: f64,
}

/// Where a row came from, for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct RowLocation<'a> {
    pub path: &'a Path,
    /// 1-based line number within the file.
    pub line: usize,
}

impl Sample {
    /// Parse the first two fields of a line, separated by ASCII whitespace only.
    /// Extra fields are ignored.
    pub fn parse(line: &str, mode: ParseMode, at: RowLocation<'_>) -> HeatmapResult<Self> {
        let mut fields = line
            .split(|c: char| c.is_ascii_whitespace())
            .filter(|field| !field.is_empty());
        let x_field = fields.next();
        let y_field = fields.next();

        let sample = match mode {
            ParseMode::Permissive => Sample {
                x_bucket: x_field.map_or(0, leading_int),
                y_value: y_field.map_or(0.0, leading_float),
            },
            ParseMode::Strict => Sample {
                x_bucket: strict_field(x_field, "x", at)?,
                y_value: strict_field(y_field, "y", at)?,
            },
        };
        Ok(sample)
    }

    /// Map the y coordinate from [-1, 1] onto `0..=100`, rounding half away from zero.
    pub fn y_bucket(&self, at: RowLocation<'_>) -> HeatmapResult<i64> {
        let scaled = ((1.0 + self.y_value) * 50.0).round();
        // NaN fails the range test as well
        if !(0.0..=Y_BUCKETS as f64).contains(&scaled) {
            return Err(HeatmapError::OutOfRange {
                path: at.path.to_path_buf(),
                line: at.line,
                y_value: self.y_value,
                scaled,
            });
        }
        Ok(scaled as i64)
    }
}

fn strict_field<T: std::str::FromStr>(
    field: Option<&str>,
    name: &'static str,
    at: RowLocation<'_>,
) -> HeatmapResult<T> {
    let text = field.unwrap_or("");
    text.parse().map_err(|_| HeatmapError::Malformed {
        path: at.path.to_path_buf(),
        line: at.line,
        field: name,
        text: text.to_string(),
    })
}

/// Consume a run of ASCII digits where single underscores may sit between digits.
/// Returns the digits (underscores dropped) and the number of bytes consumed.
fn scan_digits(bytes: &[u8]) -> (String, usize) {
    let mut digits = String::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b @ b'0'..=b'9' => digits.push(b as char),
            b'_' if !digits.is_empty() && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {}
            _ => break,
        }
        i += 1;
    }
    (digits, i)
}

fn scan_sign(bytes: &[u8]) -> (bool, usize) {
    match bytes.first().copied() {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    }
}

/// Integer value of the longest numeric prefix of `text`, saturating at the i64 bounds.
pub fn leading_int(text: &str) -> i64 {
    let bytes = text.as_bytes();
    let (negative, start) = scan_sign(bytes);
    let (digits, _) = scan_digits(&bytes[start..]);

    let mut value: i64 = 0;
    for d in digits.bytes() {
        let d = i64::from(d - b'0');
        let next = value
            .checked_mul(10)
            .and_then(|v| if negative { v.checked_sub(d) } else { v.checked_add(d) });
        match next {
            Some(v) => value = v,
            None => return if negative { i64::MIN } else { i64::MAX },
        }
    }
    value
}

/// Real value of the longest numeric prefix of `text`.
pub fn leading_float(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut literal = String::new();

    let (negative, mut i) = scan_sign(bytes);
    if negative {
        literal.push('-');
    }

    let (int_digits, used) = scan_digits(&bytes[i..]);
    i += used;
    literal.push_str(&int_digits);

    let mut mantissa_digits = int_digits.len();
    if bytes.get(i) == Some(&b'.') {
        let (frac_digits, used) = scan_digits(&bytes[i + 1..]);
        if !frac_digits.is_empty() {
            literal.push('.');
            literal.push_str(&frac_digits);
            mantissa_digits += frac_digits.len();
            i += 1 + used;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(i).copied(), Some(b'e' | b'E')) {
        let (exp_negative, sign_len) = scan_sign(&bytes[i + 1..]);
        let (exp_digits, _) = scan_digits(&bytes[i + 1 + sign_len..]);
        if !exp_digits.is_empty() {
            literal.push('e');
            if exp_negative {
                literal.push('-');
            }
            literal.push_str(&exp_digits);
        }
    }

    literal.parse().unwrap_or(0.0)
}
