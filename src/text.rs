//! Text normalization for identifier segments.
//!
//! Free-text labels (asset names, floor names, location names) are folded
//! into the fixed `[A-Z0-9-]` alphabet so they can be embedded in tags.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Separator used both inside normalized tokens and between tag segments.
pub const SEPARATOR: char = '-';

/// Normalizes `input` into an identifier-safe token of at most `max_len` characters.
///
/// The input is upper-cased, accents are decomposed and dropped, every
/// character outside `[A-Z0-9]` becomes a hyphen, hyphen runs collapse into
/// one and leading/trailing hyphens are trimmed. Truncation happens before the
/// final trim so a cut never leaves a dangling hyphen.
///
/// ```
/// use facility_codes::text::normalize;
///
/// assert_eq!(normalize("Casa de Máquinas", 15), "CASA-DE-MAQUINA");
/// assert_eq!(normalize("  Área técnica / 2 ", 20), "AREA-TECNICA-2");
/// ```
pub fn normalize(input: &str, max_len: usize) -> String {
    let mut folded = String::with_capacity(input.len());
    for c in input.to_uppercase().nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            folded.push(c);
        } else if !folded.ends_with(SEPARATOR) {
            folded.push(SEPARATOR);
        }
    }

    // Output is pure ASCII at this point, so char and byte counts agree.
    let trimmed = folded.trim_start_matches(SEPARATOR);
    let cut = &trimmed[..trimmed.len().min(max_len)];
    cut.trim_matches(SEPARATOR).to_string()
}

/// Unbounded variant used for keyword matching and label comparison.
pub fn fold(input: &str) -> String {
    normalize(input, usize::MAX)
}
