use unicode_normalization::UnicodeNormalization;

/// Canonicalizes text for comparison.
///
/// Lowercases, expands common ligatures, strips diacritics through NFD
/// decomposition, drops everything but alphanumerics and whitespace, and
/// collapses whitespace runs into single spaces. Pure and total: any input
/// maps to exactly one output, and applying it twice changes nothing.
#[must_use]
pub fn normalize(input: &str) -> String {
    let folded = expand_ligatures(&input.to_lowercase());

    let stripped: String = folded
        .nfd()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Ligatures survive NFD decomposition, so they are expanded by hand before
// the combining marks are stripped.
fn expand_ligatures(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            _ => out.push(c),
        }
    }
    out
}
