use crate::assembler::{price_case, PricingInputs};
use crate::config::ValuationConfig;
use crate::models::SensitivityGrid;

/// Reprice the company over a 5x5 WACC x terminal-growth sweep centered on
/// the base case, two grid steps in each direction.
///
/// Every other assumption is held fixed, so the grid isolates how much of
/// the valuation rides on the discounting inputs. Combinations where WACC
/// does not exceed terminal growth cannot be priced and stay empty.
pub fn build_grid(inputs: &PricingInputs, config: &ValuationConfig) -> SensitivityGrid {
    let wacc_values: Vec<f64> = (-2..=2)
        .map(|step| inputs.wacc + step as f64 * config.wacc_step)
        .collect();
    let terminal_growth_values: Vec<f64> = (-2..=2)
        .map(|step| inputs.terminal_growth + step as f64 * config.terminal_growth_step)
        .collect();

    let values = wacc_values
        .iter()
        .map(|&wacc| {
            terminal_growth_values
                .iter()
                .map(|&terminal_growth| {
                    let cell = PricingInputs {
                        wacc,
                        terminal_growth,
                        ..*inputs
                    };
                    price_case(&cell, config).map(|case| case.intrinsic_per_share)
                })
                .collect()
        })
        .collect();

    SensitivityGrid {
        wacc_values,
        terminal_growth_values,
        values,
    }
}
