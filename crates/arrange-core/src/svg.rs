//! Minimal path-data rewriting for waveform fragments.

/// Shift every absolute X coordinate in `fragment` by `dx`.
///
/// Relative commands and Y coordinates are left alone.  Numbers keep the
/// precision they were written with.
pub fn offset_fragment(fragment: &str, dx: f64) -> String {
    if dx == 0.0 {
        return fragment.to_string();
    }

    let mut out = String::with_capacity(fragment.len() + 16);
    let mut command = ' ';
    let mut arg = 0usize;
    let mut chars = fragment.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if is_number_start(c) {
            let end = scan_number(fragment, start);
            let token = &fragment[start..end];
            if shifts_x(command, arg) {
                match token.parse::<f64>() {
                    Ok(value) => out.push_str(&format_like(value + dx, token)),
                    Err(_) => out.push_str(token),
                }
            } else {
                out.push_str(token);
            }
            arg += 1;
            while chars.peek().is_some_and(|&(i, _)| i < end) {
                chars.next();
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            command = c;
            arg = 0;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '-' || c == '+' || c == '.'
}

/// End offset of the number starting at `start`.
fn scan_number(s: &str, start: usize) -> usize {
    let bytes = s.as_bytes();
    let mut i = start;
    if matches!(bytes.get(i), Some(b'-') | Some(b'+')) {
        i += 1;
    }
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(i) {
        match b {
            b'0'..=b'9' => i += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                i += 1;
            }
            b'e' | b'E' => {
                i += 1;
                if matches!(bytes.get(i), Some(b'-') | Some(b'+')) {
                    i += 1;
                }
                while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                    i += 1;
                }
                break;
            }
            _ => break,
        }
    }
    i
}

fn shifts_x(command: char, arg: usize) -> bool {
    match command {
        'M' | 'L' | 'T' | 'C' | 'S' | 'Q' => arg % 2 == 0,
        'H' => true,
        'A' => arg % 7 == 5,
        _ => false,
    }
}

fn format_like(value: f64, original: &str) -> String {
    let decimals = original
        .split(['e', 'E'])
        .next()
        .and_then(|mantissa| mantissa.split_once('.'))
        .map_or(0, |(_, frac)| frac.len());
    format!("{:.*}", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shift_is_identity() {
        assert_eq!(offset_fragment("M0,0 L10,10", 0.0), "M0,0 L10,10");
    }

    #[test]
    fn test_shifts_absolute_x_only() {
        assert_eq!(
            offset_fragment("M0.0,35.0 L2.5,40.0 H7 V3 l1,1", 100.0),
            "M100.0,35.0 L102.5,40.0 H107 V3 l1,1"
        );
    }

    #[test]
    fn test_implicit_repeat_pairs() {
        assert_eq!(offset_fragment("M0,0 10,-5 20,5", 1.0), "M1,0 11,-5 21,5");
    }
}
