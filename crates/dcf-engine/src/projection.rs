use crate::models::ProjectedYear;

/// Project free cash flow over two stages.
///
/// Stage 1 compounds at a constant rate. Stage 2 fades the growth rate
/// linearly into the terminal rate, reaching it exactly in the final year,
/// so the hand-off into the terminal value does not cliff. Pure function of
/// its inputs; every valuation variant (base case, sensitivity cells,
/// scenarios, Monte Carlo draws) reprices through this same path.
pub fn project_fcf(
    current_fcf: f64,
    growth_rate: f64,
    terminal_growth: f64,
    stage1_years: usize,
    stage2_years: usize,
) -> Vec<ProjectedYear> {
    let mut projection = Vec::with_capacity(stage1_years + stage2_years);
    let mut fcf = current_fcf;

    for year in 1..=stage1_years {
        fcf *= 1.0 + growth_rate;
        projection.push(ProjectedYear {
            year,
            stage: 1,
            growth_rate,
            fcf,
        });
    }

    for i in 0..stage2_years {
        let fraction = (i + 1) as f64 / stage2_years as f64;
        let faded = growth_rate + (terminal_growth - growth_rate) * fraction;
        fcf *= 1.0 + faded;
        projection.push(ProjectedYear {
            year: stage1_years + i + 1,
            stage: 2,
            growth_rate: faded,
            fcf,
        });
    }

    projection
}
