//! Human-readable rendering helpers shared by the snapshot resolvers.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with binary units: `0 B`, `11.0 KB`, `256.0 MB`.
///
/// Bytes are shown without decimals, larger units with one.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let value = bytes as f64;
    let exp = ((value.ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let scaled = value / 1024f64.powi(exp as i32);
    if exp == 0 {
        format!("{:.0} {}", scaled, UNITS[exp])
    } else {
        format!("{:.1} {}", scaled, UNITS[exp])
    }
}

/// Shorten a wallet address to `first10...last8`. Addresses of 18 chars or
/// fewer are returned unchanged; empty input is `unknown`.
pub fn short_wallet(wallet: &str) -> String {
    if wallet.is_empty() {
        return "unknown".to_string();
    }
    let chars: Vec<char> = wallet.chars().collect();
    if chars.len() <= 18 {
        return wallet.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{head}...{tail}")
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
