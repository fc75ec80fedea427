//! Parsing of values typed at a prompt, shared by the text session and the
//! preview window.

/// Parse exactly `N` whitespace-separated integers from `s`.
///
/// ```
/// # use darkroom::input::parse_ints;
/// assert_eq!(parse_ints::<2>(" 4  -5 "), Ok([4, -5]));
/// assert!(parse_ints::<2>("4").is_err());
/// ```
pub fn parse_ints<const N: usize>(s: &str) -> Result<[i64; N], String> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.len() != N {
        return Err(format!("expected {N} integers, got {}", tokens.len()));
    }
    let mut values = [0i64; N];
    for (value, token) in values.iter_mut().zip(&tokens) {
        *value = token
            .parse()
            .map_err(|_| format!("not an integer: {token:?}"))?;
    }
    Ok(values)
}

/// Clamp a typed value into the `i32` delta range.
pub fn clamp_delta(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
