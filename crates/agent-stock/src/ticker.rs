//! Ticker detection
//!
//! Finds the stock symbol a query is about. Detection tries, in order:
//! a cashtag (`$AAPL`), explicit phrasing (`ticker: AAPL`, `symbol NVDA`),
//! a well-known company name, and finally a bare uppercase token that is
//! not a common acronym.

use crate::error::{Result, StockError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

#[allow(clippy::unwrap_used)]
static CASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z]{1,5}(?:\.[A-Za-z]{1,2})?)\b").unwrap());

#[allow(clippy::unwrap_used)]
static LABELED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\b(?:ticker|symbol))\s*[:=]\s*\$?([A-Za-z]{1,5}(?:\.[A-Za-z]{1,2})?)\b").unwrap()
});

#[allow(clippy::unwrap_used)]
static NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:\b(?:ticker|symbol))\s+([A-Z]{1,5}(?:\.[A-Z]{1,2})?)\b").unwrap()
});

#[allow(clippy::unwrap_used)]
static TICKER_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,5}(?:\.[A-Z]{1,2})?$").unwrap());

/// Uppercase words that look like tickers but usually are not
const STOPWORDS: &[&str] = &[
    "A", "I", "AI", "API", "BUY", "CEO", "CFO", "CPI", "CTO", "DCF", "EPS", "ESG", "ETF", "EU",
    "FED", "GDP", "HOLD", "IPO", "IT", "NYSE", "OK", "PE", "ROE", "ROI", "SEC", "SELL", "UK", "US",
    "USA", "USD", "YOY", "YTD",
];

/// Well-known company names
const COMPANIES: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("meta", "META"),
    ("facebook", "META"),
    ("netflix", "NFLX"),
    ("intel", "INTC"),
    ("berkshire", "BRK.B"),
    ("jpmorgan", "JPM"),
    ("walmart", "WMT"),
    ("disney", "DIS"),
    ("boeing", "BA"),
    ("coca-cola", "KO"),
    ("salesforce", "CRM"),
    ("oracle", "ORCL"),
    ("palantir", "PLTR"),
];

/// Normalize a symbol to uppercase and check its format
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().trim_start_matches('$').to_ascii_uppercase();
    TICKER_FORMAT.is_match(&ticker).then_some(ticker)
}

/// Detects stock tickers in natural-language queries
#[derive(Debug, Clone)]
pub struct TickerDetector {
    stopwords: HashSet<&'static str>,
}

impl Default for TickerDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TickerDetector {
    /// Create a detector with the built-in stopword list
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    /// Detect the ticker a query is about
    pub fn detect(&self, query: &str) -> Option<String> {
        let found = Self::capture(&CASHTAG, query)
            .or_else(|| Self::capture(&LABELED, query))
            .or_else(|| Self::capture(&NAMED, query))
            .or_else(|| Self::company(query))
            .or_else(|| self.uppercase_token(query));

        debug!("Detected ticker {:?} in {:?}", found, query);
        found
    }

    /// Resolve the ticker for a run; an explicit override wins over detection
    pub fn resolve(&self, query: &str, ticker_override: Option<&str>) -> Result<String> {
        match ticker_override.map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => {
                normalize_ticker(raw).ok_or_else(|| StockError::InvalidTicker(raw.to_string()))
            }
            None => self.detect(query).ok_or(StockError::TickerNotDetected),
        }
    }

    fn capture(pattern: &Regex, query: &str) -> Option<String> {
        pattern
            .captures_iter(query)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| normalize_ticker(m.as_str()))
    }

    fn company(query: &str) -> Option<String> {
        query
            .split_whitespace()
            .map(|word| {
                word.trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
                    .trim_end_matches("'s")
                    .to_lowercase()
            })
            .find_map(|word| {
                COMPANIES
                    .iter()
                    .find(|(name, _)| *name == word)
                    .map(|(_, ticker)| (*ticker).to_string())
            })
    }

    fn uppercase_token(&self, query: &str) -> Option<String> {
        query
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|word| word.chars().all(|c| c.is_ascii_uppercase() || c == '.'))
            .filter(|word| !self.stopwords.contains(word.split('.').next().unwrap_or(word)))
            .find_map(normalize_ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cashtag_wins() {
        let detector = TickerDetector::new();
        assert_eq!(
            detector.detect("Is TSLA better than $nvda right now?"),
            Some("NVDA".to_string())
        );
        assert_eq!(detector.detect("Thoughts on $BRK.B?"), Some("BRK.B".to_string()));
    }

    #[test]
    fn test_labeled_symbol() {
        let detector = TickerDetector::new();
        assert_eq!(
            detector.detect("Run the analysis for ticker: msft please"),
            Some("MSFT".to_string())
        );
        assert_eq!(detector.detect("What about symbol AMD?"), Some("AMD".to_string()));
        // Lowercase words after "symbol" are not tickers
        assert_eq!(detector.detect("what symbol is apple using"), Some("AAPL".to_string()));
    }

    #[test]
    fn test_company_names() {
        let detector = TickerDetector::new();
        assert_eq!(
            detector.detect("Should I invest in Apple's new products?"),
            Some("AAPL".to_string())
        );
        assert_eq!(detector.detect("how is nvidia doing"), Some("NVDA".to_string()));
    }

    #[test]
    fn test_uppercase_token_skips_stopwords() {
        let detector = TickerDetector::new();
        assert_eq!(
            detector.detect("I think the CEO of PLTR should BUY back shares"),
            Some("PLTR".to_string())
        );
        assert_eq!(detector.detect("Is the USA ETF market overheated?"), None);
        assert_eq!(detector.detect("what should I buy"), None);
    }

    #[test]
    fn test_override() {
        let detector = TickerDetector::new();
        assert_eq!(detector.resolve("Should I buy AAPL?", Some(" msft ")).unwrap(), "MSFT");
        assert_eq!(detector.resolve("Should I buy AAPL?", Some("")).unwrap(), "AAPL");
        assert!(matches!(
            detector.resolve("anything", Some("NOT A TICKER")),
            Err(StockError::InvalidTicker(_))
        ));
        assert!(matches!(
            detector.resolve("how are markets today", None),
            Err(StockError::TickerNotDetected)
        ));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_ticker("$aapl"), Some("AAPL".to_string()));
        assert_eq!(normalize_ticker("brk.b"), Some("BRK.B".to_string()));
        assert_eq!(normalize_ticker("TOOLONG"), None);
        assert_eq!(normalize_ticker("AB1"), None);
    }
}
