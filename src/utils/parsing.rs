//! Lenient number parsing for AEMET text measurements.
//!
//! AEMET exports numbers with a comma as decimal separator ("12,5") and mixes
//! in free text such as "Ip" (inappreciable precipitation) or "Varias". Parsing
//! never fails: anything without a numeric prefix becomes NaN.

/// Parse a comma-decimal measurement. Only the first comma is treated as the
/// decimal separator; the rest of the text is handled by [`parse_float_prefix`].
pub fn parse_comma_decimal(text: &str) -> f64 {
    parse_float_prefix(&text.replacen(',', ".", 1))
}

/// Parse the longest decimal prefix of `text`, ignoring leading whitespace.
/// NEL (U+0085) is not whitespace here, matching ECMAScript `parseFloat`.
///
/// Accepts an optional sign, integer digits, an optional fraction, an optional
/// exponent and the literal `Infinity`. Trailing garbage is ignored
/// (`"7.5mm"` gives `7.5`). Returns NaN when no digits are found.
pub fn parse_float_prefix(text: &str) -> f64 {
    let trimmed = text.trim_start_matches(is_leading_space);
    let bytes = trimmed.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if trimmed[end..].starts_with("Infinity") {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    trimmed[..end].parse::<f64>().unwrap_or(f64::NAN)
}

fn is_leading_space(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
