//! Caesar shift over ASCII letters.
//!
//! A teaching toy with no security value.

/// Rotates each ASCII letter by `shift` places within its case.
///
/// Negative shifts rotate backwards; shifts wrap modulo 26. Everything
/// that is not an ASCII letter is kept as is.
pub fn caesar_shift(text: &str, shift: i32) -> String {
    let shift = shift.rem_euclid(26) as u8;

    text.chars()
        .map(|c| match c {
            'a'..='z' => rotate(c, b'a', shift),
            'A'..='Z' => rotate(c, b'A', shift),
            _ => c,
        })
        .collect()
}

fn rotate(c: char, base: u8, shift: u8) -> char {
    char::from((c as u8 - base + shift) % 26 + base)
}
