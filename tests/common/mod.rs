/// Parses a whitespace-separated hex dump into bytes.
///
/// Panics on anything that is not an even number of hex digits, which is
/// exactly what a mistyped fixture deserves.
#[allow(dead_code)]
pub fn hex(s: &str) -> Vec<u8> {
    let digits: Vec<u8> = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).expect("hex digit") as u8)
        .collect();
    assert_eq!(digits.len() % 2, 0, "odd number of hex digits");
    digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect()
}
