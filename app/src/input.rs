use pulse_core::Platform;

/// Dollar amount with an optional `k`/`m`/`b` suffix, e.g. `250k`, `1.5m`.
pub fn parse_amount(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim().trim_start_matches('$').replace(',', "").to_ascii_lowercase();
    if trimmed.is_empty() {
        return Err("amount cannot be empty".into());
    }

    let (number, scale) = match trimmed.chars().last() {
        Some('k') => (&trimmed[..trimmed.len() - 1], 1e3),
        Some('m') => (&trimmed[..trimmed.len() - 1], 1e6),
        Some('b') => (&trimmed[..trimmed.len() - 1], 1e9),
        _ => (trimmed.as_str(), 1.0),
    };

    let amount: f64 = number
        .parse()
        .map_err(|_| format!("invalid amount: {raw}"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount must be a non-negative number: {raw}"));
    }
    Ok(amount * scale)
}

/// Repeated `--platform` flags select exactly those platforms; none leaves
/// every platform enabled.
pub fn platform_patch(selected: &[Platform]) -> Vec<(Platform, bool)> {
    if selected.is_empty() {
        return Vec::new();
    }
    Platform::ALL
        .iter()
        .map(|platform| (*platform, selected.contains(platform)))
        .collect()
}
