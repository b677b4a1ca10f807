/// Interpret an optional string as a boolean flag, falling back to `default` when the value is missing or
/// unrecognised. Accepts the usual spellings (`1`/`0`, `true`/`false`, `yes`/`no`, `y`/`n`, `on`/`off`),
/// case-insensitively.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "y" | "on" => true,
            "0" | "false" | "no" | "n" | "off" => false,
            _ => default,
        },
        None => default,
    }
}
