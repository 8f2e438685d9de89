use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

/// One fiscal year of reported figures.
///
/// Histories are ordered most recent first. Every field is optional because
/// upstream fundamentals feeds routinely omit line items; accessors and
/// consumers must guard each read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub fiscal_year: i32,
    pub revenue: Option<f64>,
    pub ebit: Option<f64>,
    pub ebitda: Option<f64>,
    pub pretax_income: Option<f64>,
    pub net_income: Option<f64>,
    pub tax_paid: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    /// Capital expenditure as a positive magnitude.
    pub capital_expenditure: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub interest_expense: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub short_term_investments: Option<f64>,
}

impl FinancialPeriod {
    /// Free cash flow: the reported figure when present, otherwise derived
    /// as operating cash flow minus capital expenditure.
    pub fn fcf(&self) -> Option<f64> {
        if let Some(explicit) = self.free_cash_flow {
            return Some(explicit);
        }
        match (self.operating_cash_flow, self.capital_expenditure) {
            (Some(ocf), Some(capex)) => Some(ocf - capex),
            _ => None,
        }
    }

    /// Financial debt minus cash, preferring the broader cash plus
    /// short-term-investments figure. Missing components count as zero.
    pub fn net_debt(&self) -> f64 {
        let debt = self.total_debt.unwrap_or(0.0);
        let cash = self.cash_and_equivalents.unwrap_or(0.0)
            + self.short_term_investments.unwrap_or(0.0);
        debt - cash
    }
}

/// Point-in-time market data for a company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,
    pub shares_outstanding: f64,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub country: Option<String>,
    pub sector: Option<String>,
}

impl MarketSnapshot {
    /// Market capitalization, computed from price and share count when the
    /// reported figure is absent.
    pub fn effective_market_cap(&self) -> f64 {
        self.market_cap
            .unwrap_or(self.price * self.shares_outstanding)
    }
}

/// Key ratios for one comparable company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRatios {
    pub ticker: String,
    pub ev_to_ebitda: Option<f64>,
    pub pe: Option<f64>,
}

/// Everything an analyzer may need for one company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyData {
    pub ticker: String,
    pub snapshot: MarketSnapshot,
    /// Annual statements, most recent first.
    pub financials: Vec<FinancialPeriod>,
    #[serde(default)]
    pub peers: Vec<PeerRatios>,
    #[serde(default)]
    pub price_history: Vec<Bar>,
    #[serde(default)]
    pub benchmark_history: Vec<Bar>,
}

/// The six signal families blended by the composite scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Fundamental,
    Valuation,
    Technical,
    Sentiment,
    Risk,
    Moat,
}

impl SignalKind {
    pub const ALL: [SignalKind; 6] = [
        SignalKind::Fundamental,
        SignalKind::Valuation,
        SignalKind::Technical,
        SignalKind::Sentiment,
        SignalKind::Risk,
        SignalKind::Moat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Fundamental => "fundamental",
            SignalKind::Valuation => "valuation",
            SignalKind::Technical => "technical",
            SignalKind::Sentiment => "sentiment",
            SignalKind::Risk => "risk",
            SignalKind::Moat => "moat",
        }
    }
}

/// Result emitted by any analysis engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub ticker: String,
    pub engine: String,
    pub kind: SignalKind,
    pub timestamp: DateTime<Utc>,
    /// 0 (worst) to 100 (best)
    pub score: f64,
    pub confidence: f64, // 0.0 to 1.0
    pub summary: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub detail: serde_json::Value,
}

impl AnalyzerResult {
    /// Neutral placeholder used when an engine is missing, failed, or timed
    /// out. Score 50 with low confidence keeps the composite blend alive
    /// without letting the gap dominate it.
    pub fn neutral(ticker: &str, kind: SignalKind, reason: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            engine: "degraded".to_string(),
            kind,
            timestamp: Utc::now(),
            score: 50.0,
            confidence: 0.2,
            summary: reason.to_string(),
            warnings: vec![reason.to_string()],
            detail: serde_json::Value::Null,
        }
    }
}
