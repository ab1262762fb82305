use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DISALLOWED_CHARS: Regex = Regex::new(r"[^A-Z0-9\s]").unwrap();
    static ref BODY_CODE: Regex = Regex::new(r"([A-Z]+)\s*(\d+)").unwrap();
}

/// Converts a free-text bus body number into the canonical `LETTERS-NNN` code.
///
/// The text is uppercased, trimmed and stripped of everything but ASCII
/// letters, digits and whitespace. The first `letters, optional spaces,
/// digits` run is then formatted with the digits zero-padded to three places.
/// When no such run exists the cleaned text is returned as is.
///
/// | input      | output    |
/// |------------|-----------|
/// | `b 07`     | `B-007`   |
/// | `B-7`      | `B-007`   |
/// | `   b7!!`  | `B-007`   |
/// | `TJ 1234`  | `TJ-1234` |
/// | `123`      | `123`     |
pub fn standardize_bus_body(no_body: Option<&str>) -> Option<String> {
    let upper = no_body?.to_uppercase();
    let cleaned = DISALLOWED_CHARS.replace_all(upper.trim(), "");

    match BODY_CODE.captures(&cleaned) {
        Some(caps) => Some(format!("{}-{:0>3}", &caps[1], &caps[2])),
        None => Some(cleaned.into_owned()),
    }
}
