//! Currency handling and money formatting

use serde::{Deserialize, Serialize};

/// Currencies the app can display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Inr,
    Cad,
    Aud,
    Chf,
}

impl Currency {
    pub const ALL: [Currency; 8] = [
        Self::Usd,
        Self::Eur,
        Self::Gbp,
        Self::Jpy,
        Self::Inr,
        Self::Cad,
        Self::Aud,
        Self::Chf,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
            Self::Inr => "INR",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
            Self::Chf => "CHF",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Jpy => "¥",
            Self::Inr => "₹",
            Self::Cad => "CA$",
            Self::Aud => "A$",
            Self::Chf => "CHF ",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Usd => "US Dollar",
            Self::Eur => "Euro",
            Self::Gbp => "British Pound",
            Self::Jpy => "Japanese Yen",
            Self::Inr => "Indian Rupee",
            Self::Cad => "Canadian Dollar",
            Self::Aud => "Australian Dollar",
            Self::Chf => "Swiss Franc",
        }
    }

    /// Parse a currency code, ignoring surrounding whitespace and case
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_uppercase();
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Unknown or missing codes fall back to the default currency
    pub fn from_code_or_default(code: Option<&str>) -> Self {
        code.and_then(Self::parse).unwrap_or_default()
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unsupported currency: {}", s))
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

fn finite_or_zero(val: f64) -> f64 {
    if val.is_finite() {
        val
    } else {
        0.0
    }
}

/// Insert `,` every three digits of an unsigned integer string
fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format with symbol, thousands separators and two decimals: `$1,234.50`
pub fn format_money(amount: f64, code: &str) -> String {
    format_currency(amount, Currency::from_code_or_default(Some(code)))
}

pub fn format_currency(amount: f64, currency: Currency) -> String {
    let val = finite_or_zero(amount);
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    // -0.001 rounds to 0.00 and must not print as negative
    let sign = if val < 0.0 && cents != "0.00" { "-" } else { "" };
    format!(
        "{sign}{}{}.{dec_part}",
        currency.symbol(),
        group_thousands(int_part)
    )
}

const COMPACT_UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

fn strip_trailing_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn compact_magnitude(abs: f64) -> String {
    for (idx, (scale, suffix)) in COMPACT_UNITS.iter().enumerate() {
        if abs < *scale {
            continue;
        }
        let scaled = abs / scale;
        let rounded = if scaled >= 100.0 {
            scaled.round()
        } else {
            (scaled * 10.0).round() / 10.0
        };
        // 999.96K rounds to 1000K; show it as 1M instead
        if rounded >= 1000.0 && idx > 0 {
            let (bigger, bigger_suffix) = COMPACT_UNITS[idx - 1];
            let promoted = ((abs / bigger) * 10.0).round() / 10.0;
            return format!("{}{}", strip_trailing_zeros(format!("{:.1}", promoted)), bigger_suffix);
        }
        let text = if scaled >= 100.0 {
            format!("{:.0}", rounded)
        } else {
            strip_trailing_zeros(format!("{:.1}", rounded))
        };
        return format!("{}{}", text, suffix);
    }
    let text = format!("{:.2}", abs);
    // 999.996 rounds to 1000.00; show it as 1K instead
    if text == "1000.00" {
        return "1K".to_string();
    }
    strip_trailing_zeros(text)
}

/// Short form for tight layouts: `1.5K`, `250K`, `1M`, `-2.3B`
pub fn format_compact(amount: f64) -> String {
    let val = finite_or_zero(amount);
    let magnitude = compact_magnitude(val.abs());
    if val < 0.0 && magnitude != "0" {
        format!("-{}", magnitude)
    } else {
        magnitude
    }
}

/// Compact form with the currency symbol: `$1.5K`, `-€2M`
pub fn format_compact_money(amount: f64, code: &str) -> String {
    let currency = Currency::from_code_or_default(Some(code));
    let compact = format_compact(amount);
    match compact.strip_prefix('-') {
        Some(rest) => format!("-{}{}", currency.symbol(), rest),
        None => format!("{}{}", currency.symbol(), compact),
    }
}
