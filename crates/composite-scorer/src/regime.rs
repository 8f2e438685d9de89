use serde::{Deserialize, Serialize};
use valuation_core::{std_dev, Bar, SignalKind};

/// Coarse market-condition classification used to reweight signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketRegime {
    Bull,
    Bear,
    Volatile,
    Normal,
}

impl MarketRegime {
    pub fn name(&self) -> &'static str {
        match self {
            MarketRegime::Bull => "Bull",
            MarketRegime::Bear => "Bear",
            MarketRegime::Volatile => "Volatile",
            MarketRegime::Normal => "Normal",
        }
    }

    /// Weight multiplier applied to a signal family in this regime.
    ///
    /// Volatile markets lean on risk discipline and discount sentiment;
    /// bear markets reward balance-sheet quality; bull markets let momentum
    /// and sentiment carry more of the blend.
    pub fn multiplier(&self, kind: SignalKind) -> f64 {
        match (self, kind) {
            (MarketRegime::Bull, SignalKind::Technical) => 1.2,
            (MarketRegime::Bull, SignalKind::Sentiment) => 1.2,
            (MarketRegime::Bear, SignalKind::Fundamental) => 1.2,
            (MarketRegime::Bear, SignalKind::Risk) => 1.3,
            (MarketRegime::Bear, SignalKind::Technical) => 0.9,
            (MarketRegime::Volatile, SignalKind::Risk) => 1.5,
            (MarketRegime::Volatile, SignalKind::Sentiment) => 0.7,
            _ => 1.0,
        }
    }
}

/// Outcome of regime detection over a benchmark window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeReading {
    pub regime: MarketRegime,
    /// Annualized standard deviation of daily returns.
    pub annualized_volatility: f64,
    /// Total return over the window.
    pub trend: f64,
    pub sample_size: usize,
    pub warnings: Vec<String>,
}

/// Classifies the market from broad-index bars by realized volatility and
/// window trend.
pub struct RegimeDetector {
    min_bars: usize,
    volatile_threshold: f64,
    trend_threshold: f64,
}

impl Default for RegimeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RegimeDetector {
    pub fn new() -> Self {
        Self {
            min_bars: 60,
            volatile_threshold: 0.30,
            trend_threshold: 0.10,
        }
    }

    pub fn detect(&self, bars: &[Bar]) -> RegimeReading {
        if bars.len() < self.min_bars {
            return RegimeReading {
                regime: MarketRegime::Normal,
                annualized_volatility: 0.0,
                trend: 0.0,
                sample_size: bars.len(),
                warnings: vec![format!(
                    "{} benchmark bars (need {}); defaulting to normal regime",
                    bars.len(),
                    self.min_bars
                )],
            };
        }

        let returns: Vec<f64> = bars
            .windows(2)
            .filter(|w| w[0].close > 0.0)
            .map(|w| w[1].close / w[0].close - 1.0)
            .collect();
        let annualized_volatility = std_dev(&returns) * 252.0_f64.sqrt();

        let first = bars[0].close;
        let last = bars[bars.len() - 1].close;
        let trend = if first > 0.0 { last / first - 1.0 } else { 0.0 };

        // Volatility takes precedence: a high-vol rally is not a bull tape
        let regime = if annualized_volatility >= self.volatile_threshold {
            MarketRegime::Volatile
        } else if trend >= self.trend_threshold {
            MarketRegime::Bull
        } else if trend <= -self.trend_threshold {
            MarketRegime::Bear
        } else {
            MarketRegime::Normal
        };

        RegimeReading {
            regime,
            annualized_volatility,
            trend,
            sample_size: bars.len(),
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_bars(count: usize, trend: f64) -> Vec<Bar> {
        (0..count)
            .map(|i| {
                let base_price = 100.0 + (i as f64 * trend);
                Bar {
                    timestamp: Utc::now(),
                    open: base_price,
                    high: base_price + 1.0,
                    low: base_price - 1.0,
                    close: base_price,
                    volume: 1000.0,
                    vwap: None,
                }
            })
            .collect()
    }

    #[test]
    fn test_steady_rally_reads_bull() {
        let detector = RegimeDetector::new();
        let reading = detector.detect(&create_test_bars(100, 0.5));
        assert_eq!(reading.regime, MarketRegime::Bull);
        assert!(reading.trend > 0.10);
        assert!(reading.annualized_volatility < 0.30);
    }

    #[test]
    fn test_steady_selloff_reads_bear() {
        let detector = RegimeDetector::new();
        let reading = detector.detect(&create_test_bars(100, -0.3));
        assert_eq!(reading.regime, MarketRegime::Bear);
        assert!(reading.trend < -0.10);
    }

    #[test]
    fn test_flat_market_reads_normal() {
        let detector = RegimeDetector::new();
        let reading = detector.detect(&create_test_bars(100, 0.005));
        assert_eq!(reading.regime, MarketRegime::Normal);
        assert!(reading.warnings.is_empty());
    }

    #[test]
    fn test_volatility_outranks_trend() {
        // Alternating 3% swings with a rising drift: the window trend is
        // bull-sized but the tape is too choppy to trust it
        let bars: Vec<Bar> = (0..100)
            .map(|i| {
                let drift = 100.0 + 0.3 * i as f64;
                let close = if i % 2 == 0 { drift } else { drift + 3.0 };
                Bar {
                    timestamp: Utc::now(),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000.0,
                    vwap: None,
                }
            })
            .collect();

        let detector = RegimeDetector::new();
        let reading = detector.detect(&bars);
        assert!(reading.trend > 0.10);
        assert!(reading.annualized_volatility >= 0.30);
        assert_eq!(reading.regime, MarketRegime::Volatile);
    }

    #[test]
    fn test_short_history_defaults_to_normal() {
        let detector = RegimeDetector::new();
        let reading = detector.detect(&create_test_bars(30, 0.5));
        assert_eq!(reading.regime, MarketRegime::Normal);
        assert_eq!(reading.sample_size, 30);
        assert_eq!(reading.warnings.len(), 1);
        assert!(reading.warnings[0].contains("60"));
    }

    #[test]
    fn test_normal_regime_leaves_weights_alone() {
        for kind in SignalKind::ALL {
            assert_eq!(MarketRegime::Normal.multiplier(kind), 1.0);
        }
        assert_eq!(MarketRegime::Volatile.multiplier(SignalKind::Risk), 1.5);
        assert_eq!(MarketRegime::Bull.multiplier(SignalKind::Technical), 1.2);
        assert_eq!(MarketRegime::Bear.multiplier(SignalKind::Fundamental), 1.2);
    }
}
