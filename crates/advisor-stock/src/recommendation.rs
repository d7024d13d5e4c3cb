//! Recommendation categories and extraction from analysis text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The fixed five-way recommendation scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Recommendation {
    /// All categories, strongest buy first
    pub const ALL: [Self; 5] = [
        Self::StrongBuy,
        Self::Buy,
        Self::Hold,
        Self::Sell,
        Self::StrongSell,
    ];

    /// Canonical label ("STRONG BUY", "BUY", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG SELL",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label
            .trim()
            .to_uppercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .as_str()
        {
            "STRONG BUY" => Some(Self::StrongBuy),
            "BUY" => Some(Self::Buy),
            "HOLD" => Some(Self::Hold),
            "SELL" => Some(Self::Sell),
            "STRONG SELL" => Some(Self::StrongSell),
            _ => None,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)RECOMMENDATION\s*[:\-]\s*\**\s*(STRONG\s+BUY|STRONG\s+SELL|BUY|HOLD|SELL)")
            .expect("recommendation pattern compiles")
    })
}

fn keyword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(STRONG\s+BUY|STRONG\s+SELL|BUY|HOLD|SELL)\b")
            .expect("keyword pattern compiles")
    })
}

// Contextual phrasing scanned when no explicit label or keyword is present
const BUY_SIGNALS: &[&str] = &[
    "excellent investment",
    "strong growth",
    "undervalued",
    "outperform",
    "compelling opportunity",
    "positive outlook",
    "attractive entry",
];

const SELL_SIGNALS: &[&str] = &[
    "overvalued",
    "concerning risk",
    "deteriorating",
    "underperform",
    "red flag",
    "significant risk",
    "avoid this stock",
];

/// Extract the recommendation category from analysis text
///
/// Three tiers, in order:
/// 1. an explicit `RECOMMENDATION: <category>` label,
/// 2. an exact category keyword anywhere in the text,
/// 3. contextual phrasing counted from fixed buy-leaning and sell-leaning
///    signal lists.
///
/// Text with no signal at all resolves to [`Recommendation::Hold`].
pub fn extract_recommendation(text: &str) -> Recommendation {
    if let Some(captures) = label_pattern().captures(text) {
        if let Some(rec) = Recommendation::from_label(&captures[1]) {
            return rec;
        }
    }

    let upper = text.to_uppercase();
    if let Some(captures) = keyword_pattern().captures(&upper) {
        if let Some(rec) = Recommendation::from_label(&captures[1]) {
            return rec;
        }
    }

    let lower = text.to_lowercase();
    let buy_hits = BUY_SIGNALS.iter().filter(|s| lower.contains(**s)).count();
    let sell_hits = SELL_SIGNALS.iter().filter(|s| lower.contains(**s)).count();

    if buy_hits > sell_hits {
        Recommendation::Buy
    } else if sell_hits > buy_hits {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_recommendation() {
        assert_eq!(
            extract_recommendation("Solid quarter. RECOMMENDATION: STRONG BUY"),
            Recommendation::StrongBuy
        );
        assert_eq!(
            extract_recommendation("recommendation: sell"),
            Recommendation::Sell
        );
        assert_eq!(
            extract_recommendation("RECOMMENDATION: **HOLD**"),
            Recommendation::Hold
        );
    }

    #[test]
    fn test_label_wins_over_other_keywords() {
        // The text mentions BUY earlier, but the label is authoritative
        let text = "Analysts say buy, but fundamentals disagree. RECOMMENDATION: SELL";
        assert_eq!(extract_recommendation(text), Recommendation::Sell);
    }

    #[test]
    fn test_keyword_fallback() {
        assert_eq!(
            extract_recommendation("This stock is a clear Strong Buy given the momentum."),
            Recommendation::StrongBuy
        );
        assert_eq!(
            extract_recommendation("We would hold at current prices."),
            Recommendation::Hold
        );
    }

    #[test]
    fn test_contextual_sell_leaning() {
        let text = "The shares look overvalued and carry concerning risks going forward.";
        assert_eq!(extract_recommendation(text), Recommendation::Sell);
    }

    #[test]
    fn test_contextual_buy_leaning() {
        let text = "An excellent investment with strong growth across segments.";
        assert_eq!(extract_recommendation(text), Recommendation::Buy);
    }

    #[test]
    fn test_no_signal_defaults_to_hold() {
        assert_eq!(
            extract_recommendation("Revenue was flat year over year."),
            Recommendation::Hold
        );
        assert_eq!(extract_recommendation(""), Recommendation::Hold);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(Recommendation::StrongBuy.to_string(), "STRONG BUY");
        assert_eq!(Recommendation::Hold.to_string(), "HOLD");
        assert_eq!(Recommendation::ALL.len(), 5);
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&Recommendation::StrongSell).unwrap();
        assert_eq!(json, "\"STRONG_SELL\"");
    }
}
