use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub is_active: bool,
    pub decimal_places: i32,
}

impl Currency {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        symbol: Option<&str>,
        decimal_places: i32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            symbol: symbol.map(String::from),
            is_active: true,
            decimal_places,
        }
    }

    pub fn formatted_name(&self) -> String {
        match &self.symbol {
            Some(symbol) => format!("{} ({})", self.name, symbol),
            None => self.name.clone(),
        }
    }
}

/// Three ASCII letters. Whether the currency actually exists is left to the store.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Supported currencies, used to seed the store and when the store has none.
pub fn default_currencies() -> Vec<Currency> {
    vec![
        Currency::new("USD", "US Dollar", Some("$"), 2),
        Currency::new("EUR", "Euro", Some("€"), 2),
        Currency::new("GBP", "British Pound", Some("£"), 2),
        Currency::new("JPY", "Japanese Yen", Some("¥"), 0),
        Currency::new("AUD", "Australian Dollar", Some("A$"), 2),
        Currency::new("CAD", "Canadian Dollar", Some("C$"), 2),
        Currency::new("CHF", "Swiss Franc", Some("CHF"), 2),
        Currency::new("CNY", "Chinese Yuan", Some("¥"), 2),
        Currency::new("SEK", "Swedish Krona", Some("kr"), 2),
        Currency::new("NZD", "New Zealand Dollar", Some("NZ$"), 2),
        Currency::new("MXN", "Mexican Peso", Some("$"), 2),
        Currency::new("SGD", "Singapore Dollar", Some("S$"), 2),
        Currency::new("HKD", "Hong Kong Dollar", Some("HK$"), 2),
        Currency::new("NOK", "Norwegian Krone", Some("kr"), 2),
        Currency::new("MYR", "Malaysian Ringgit", Some("RM"), 2),
        Currency::new("PHP", "Philippine Peso", Some("₱"), 2),
        Currency::new("THB", "Thai Baht", Some("฿"), 2),
        Currency::new("INR", "Indian Rupee", Some("₹"), 2),
        Currency::new("KRW", "South Korean Won", Some("₩"), 0),
        Currency::new("HUF", "Hungarian Forint", Some("Ft"), 0),
    ]
}
