use crate::core::{CalculationResult, CalculatorType, ParameterSet};

/// Builds the analyst prompt for one projection. Parameters are embedded as
/// JSON so the model sees exactly what the user entered.
pub fn build_prompt(kind: CalculatorType, params: &ParameterSet, result: &CalculationResult) -> String {
    let inputs = serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Act as a world-class senior wealth manager and quantitative analyst.\n\
         Analyze the following {kind} calculation results for a client:\n\
         - Inputs: {inputs}\n\
         - Results: Total Projected Value: {total}, Capital Invested: {invested}, Net Growth/Gains: {returns}\n\
         \n\
         Your response should be:\n\
         1. Strategic: Explain if the user is on a healthy financial track based on common benchmarks \
         (e.g., SWR 4%, rule of 72, inflation targets).\n\
         2. Human-Centric: Translate the \"Total Projected Value\" into lifestyle terms \
         (what does this mean for their standard of living?).\n\
         3. Actionable: Provide ONE high-impact \"next step\" \
         (e.g., tax-advantaged accounts, diversification, or portfolio rebalancing).\n\
         4. Engaging: Use professional yet encouraging language. Avoid generic filler.\n\
         \n\
         Format: Use Markdown. Use bolding for key figures. Keep it between 150-180 words.",
        total = result.total_value,
        invested = result.invested_amount,
        returns = result.returns,
    )
}
