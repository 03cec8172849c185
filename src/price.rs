/// Parses a price token of unknown locale into an amount.
///
/// Everything except digits, `,` and `.` is dropped first. When both
/// separators appear, the later one is the decimal point. A lone comma is a
/// decimal comma, and several periods with no comma are thousands groupings.
/// Anything else is handed to the float parser untouched, so `"1.234"` reads
/// as `1.234`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let periods = cleaned.matches('.').count();

    let canonical = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(period)) if comma > period => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        _ if commas == 1 => cleaned.replace(',', "."),
        _ if periods > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    canonical
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
}
