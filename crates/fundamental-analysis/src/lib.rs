use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;
use valuation_core::{AnalysisError, Analyzer, AnalyzerResult, CompanyData, SignalKind};

/// Profitability, balance-sheet, and cash-generation quality as one 0-100 signal.
///
/// Every computable metric contributes a weighted bullish or bearish entry to a
/// signal table; the score is the weight-normalized balance of that table mapped
/// onto 0-100, with 50 as the no-evidence midpoint.
pub struct FundamentalAnalyzer;

impl FundamentalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core of the analyzer. Statements arrive most recent first.
    pub fn evaluate(&self, data: &CompanyData) -> Result<AnalyzerResult, AnalysisError> {
        let financials = &data.financials;
        let latest = financials.first().ok_or_else(|| {
            AnalysisError::MissingData(format!("{}: no financial statements", data.ticker))
        })?;

        let mut signals: Vec<(&str, i32, bool)> = Vec::new();
        let mut metrics_map = serde_json::Map::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut data_fields_present: u32 = 0;
        let total_fields: u32 = 8;

        // Net margin
        if let (Some(net_income), Some(revenue)) = (latest.net_income, latest.revenue) {
            data_fields_present += 1;
            if revenue > 0.0 {
                let net_margin = net_income / revenue * 100.0;
                metrics_map.insert("net_margin_pct".to_string(), json!(net_margin));
                if net_margin > 15.0 {
                    signals.push(("Strong Net Margin", 3, true));
                } else if net_margin > 8.0 {
                    signals.push(("Healthy Net Margin", 2, true));
                } else if net_margin < 0.0 {
                    signals.push(("Unprofitable", 3, false));
                } else if net_margin < 3.0 {
                    signals.push(("Thin Net Margin", 2, false));
                }
            }
        }

        // Operating margin
        if let (Some(ebit), Some(revenue)) = (latest.ebit, latest.revenue) {
            data_fields_present += 1;
            if revenue > 0.0 {
                let operating_margin = ebit / revenue * 100.0;
                metrics_map.insert("operating_margin_pct".to_string(), json!(operating_margin));
                if operating_margin > 20.0 {
                    signals.push(("Strong Operating Margin", 2, true));
                } else if operating_margin < 5.0 {
                    signals.push(("Weak Operating Margin", 2, false));
                }
            }
        }

        // Earnings trajectory across the reported span, a return-trend proxy
        // when equity figures are unavailable
        if financials.len() >= 2 {
            let oldest = &financials[financials.len() - 1];
            if let (Some(now), Some(then)) = (latest.net_income, oldest.net_income) {
                data_fields_present += 1;
                if then > 0.0 {
                    let change_pct = (now - then) / then * 100.0;
                    metrics_map.insert("net_income_change_pct".to_string(), json!(change_pct));
                    if change_pct > 40.0 {
                        signals.push(("Expanding Earnings", 3, true));
                    } else if change_pct < -25.0 {
                        signals.push(("Eroding Earnings", 3, false));
                    }
                } else if now > 0.0 {
                    signals.push(("Swung To Profit", 2, true));
                } else {
                    signals.push(("Persistent Losses", 3, false));
                }
            }
            if let (Some(now), Some(then)) = (latest.ebit, oldest.ebit) {
                if then > 0.0 {
                    let change_pct = (now - then) / then * 100.0;
                    metrics_map.insert("ebit_change_pct".to_string(), json!(change_pct));
                    if change_pct > 40.0 {
                        signals.push(("Operating Income Growth", 2, true));
                    } else if change_pct < -25.0 {
                        signals.push(("Operating Income Decline", 2, false));
                    }
                }
            }
        } else {
            warnings.push("single reporting period; trend and consistency checks skipped".to_string());
        }

        // Revenue growth consistency: share of year-over-year increases
        let revenues: Vec<f64> = financials.iter().rev().filter_map(|p| p.revenue).collect();
        if revenues.len() >= 2 {
            data_fields_present += 1;
            let up_years = revenues.windows(2).filter(|w| w[1] > w[0]).count();
            let consistency = up_years as f64 / (revenues.len() - 1) as f64;
            metrics_map.insert("revenue_growth_consistency".to_string(), json!(consistency));
            if consistency >= 0.75 {
                signals.push(("Consistent Revenue Growth", 3, true));
            } else if consistency <= 0.25 {
                signals.push(("Erratic Revenue", 2, false));
            }
        }

        // Debt serviced from free cash flow
        if let (Some(debt), Some(fcf)) = (latest.total_debt, latest.fcf()) {
            data_fields_present += 1;
            if fcf > 0.0 {
                let debt_to_fcf = debt / fcf;
                metrics_map.insert("debt_to_fcf".to_string(), json!(debt_to_fcf));
                if debt_to_fcf < 2.0 {
                    signals.push(("Low Debt Load", 2, true));
                } else if debt_to_fcf > 6.0 {
                    signals.push(("Heavy Debt Load", 3, false));
                }
            } else if debt > 0.0 {
                signals.push(("Debt Without Free Cash Flow", 3, false));
            }
        }

        // Interest coverage
        if let (Some(ebit), Some(interest)) = (latest.ebit, latest.interest_expense) {
            data_fields_present += 1;
            if interest > 0.0 {
                let coverage = ebit / interest;
                metrics_map.insert("interest_coverage".to_string(), json!(coverage));
                if coverage > 8.0 {
                    signals.push(("Comfortable Interest Coverage", 2, true));
                } else if coverage < 2.0 {
                    signals.push(("Strained Interest Coverage", 3, false));
                }
            }
        }

        // Cash conversion: free cash flow against reported earnings
        if let (Some(fcf), Some(net_income)) = (latest.fcf(), latest.net_income) {
            data_fields_present += 1;
            if net_income > 0.0 {
                let conversion = fcf / net_income;
                metrics_map.insert("fcf_conversion".to_string(), json!(conversion));
                if conversion > 1.0 {
                    signals.push(("High Cash Conversion", 2, true));
                } else if conversion < 0.5 {
                    signals.push(("Low Cash Conversion", 2, false));
                }
            }
        }

        // Free cash flow persistence across the span
        let fcf_years: Vec<f64> = financials.iter().filter_map(|p| p.fcf()).collect();
        if !fcf_years.is_empty() {
            data_fields_present += 1;
            let positive_years = fcf_years.iter().filter(|fcf| **fcf > 0.0).count();
            metrics_map.insert("fcf_positive_years".to_string(), json!(positive_years));
            metrics_map.insert("fcf_years_observed".to_string(), json!(fcf_years.len()));
            if positive_years == fcf_years.len() && fcf_years.len() >= 3 {
                signals.push(("Durable Free Cash Flow", 3, true));
            } else if positive_years == 0 {
                signals.push(("No Free Cash Flow Generation", 3, false));
            }
        }

        let mut weighted_sum = 0i32;
        let mut weight_total = 0i32;
        for (_, weight, bullish) in &signals {
            weight_total += weight;
            weighted_sum += if *bullish { *weight } else { -weight };
        }
        let tilt = if weight_total > 0 {
            weighted_sum as f64 / weight_total as f64
        } else {
            0.0
        };
        let score = (50.0 + tilt * 50.0).clamp(0.0, 100.0);

        if signals.len() < 3 {
            warnings.push(format!(
                "only {} fundamental signals computed; score leans neutral",
                signals.len()
            ));
        }

        // Blend of signal coverage and raw field availability
        let signal_confidence = if signals.len() >= 5 {
            0.8
        } else if signals.len() >= 3 {
            0.6
        } else {
            0.4
        };
        let data_completeness = data_fields_present as f64 / total_fields as f64;
        let confidence = (signal_confidence * 0.6 + data_completeness * 0.4).min(0.95);

        let summary = if signals.is_empty() {
            format!("{}: insufficient fundamental data to form a view", data.ticker)
        } else {
            signals
                .iter()
                .map(|(name, _, bullish)| {
                    format!("{} {}", if *bullish { "+" } else { "-" }, name)
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        metrics_map.insert("data_fields_present".to_string(), json!(data_fields_present));
        metrics_map.insert("fields_considered".to_string(), json!(total_fields));

        debug!(
            ticker = %data.ticker,
            score,
            signal_count = signals.len(),
            "fundamental quality scored"
        );

        Ok(AnalyzerResult {
            ticker: data.ticker.clone(),
            engine: "fundamental-quality".to_string(),
            kind: SignalKind::Fundamental,
            timestamp: Utc::now(),
            score,
            confidence,
            summary,
            warnings,
            detail: serde_json::Value::Object(metrics_map),
        })
    }
}

impl Default for FundamentalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for FundamentalAnalyzer {
    fn kind(&self) -> SignalKind {
        SignalKind::Fundamental
    }

    fn name(&self) -> &'static str {
        "fundamental-quality"
    }

    async fn analyze(&self, data: &CompanyData) -> Result<AnalyzerResult, AnalysisError> {
        self.evaluate(data)
    }
}
