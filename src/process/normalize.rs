/// Strip the census decorations from a county label: leading dots
/// (`.Wake County`) and the trailing `, <state>` suffix.
///
/// Applying it twice gives the same result as applying it once.
pub fn normalize_county(raw: &str, state: &str) -> String {
    let mut name = raw.trim_start_matches('.');
    let suffix = format!(", {}", state);
    while let Some(stripped) = name.strip_suffix(suffix.as_str()) {
        name = stripped;
    }
    name.to_string()
}
