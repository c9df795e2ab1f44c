use serde::Serialize;

use super::types::CalculatorType;

/// Slider metadata for one form input. Bounds guide the UI only; the engine
/// accepts any finite non-negative value. Combining several maximums (a
/// 1000% rate over 100 years) can overflow `f64`, which the engine reports
/// as `EngineError::NonFiniteResult` rather than a projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Key in the flat parameter set.
    pub parameter: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub suffix: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInfo {
    pub id: CalculatorType,
    pub title: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
}

const MONTHLY_SAVINGS: FieldSpec = FieldSpec {
    parameter: "monthlyContribution",
    label: "Monthly Savings",
    min: 0.0,
    max: 10_000_000.0,
    step: 100.0,
    suffix: "",
};

const CURRENT_COST: FieldSpec = FieldSpec {
    parameter: "monthlyContribution",
    label: "Current Cost",
    min: 0.0,
    max: 50_000_000.0,
    step: 1_000.0,
    suffix: "",
};

const EXPECTED_RETURNS: FieldSpec = FieldSpec {
    parameter: "annualRatePercent",
    label: "Expected Returns",
    min: 0.0,
    max: 1_000.0,
    step: 0.5,
    suffix: "%",
};

const PROJECTED_INFLATION: FieldSpec = FieldSpec {
    parameter: "inflationRatePercent",
    label: "Projected Inflation",
    min: 0.0,
    max: 100.0,
    step: 0.5,
    suffix: "%",
};

const INVESTMENT_PERIOD: FieldSpec = FieldSpec {
    parameter: "years",
    label: "Investment Period",
    min: 1.0,
    max: 100.0,
    step: 1.0,
    suffix: " Years",
};

impl CalculatorType {
    pub fn title(self) -> &'static str {
        match self {
            CalculatorType::Sip => "SIP Calculator",
            CalculatorType::Fd => "FD Calculator",
            CalculatorType::MutualFund => "Mutual Fund Returns",
            CalculatorType::Retirement => "Retirement Planner",
            CalculatorType::Inflation => "Inflation Calculator",
            CalculatorType::CompoundInterest => "Compound Interest",
            CalculatorType::NetWorth => "Net Worth Tracker",
            CalculatorType::EmergencyFund => "Emergency Fund",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CalculatorType::Sip => "Systematic Investment Plan growth projections.",
            CalculatorType::Fd => "Fixed Deposit maturity and interest calculator.",
            CalculatorType::MutualFund => "Lumpsum mutual fund growth analysis.",
            CalculatorType::Retirement => "Plan for your golden years with inflation.",
            CalculatorType::Inflation => "See how inflation affects your purchasing power.",
            CalculatorType::CompoundInterest => "The 8th wonder of the world at your fingertips.",
            CalculatorType::NetWorth => "Understand your total financial position.",
            CalculatorType::EmergencyFund => "Calculate the buffer you need for rainy days.",
        }
    }

    /// Inputs shown for this calculator, in display order.
    pub fn fields(self) -> Vec<FieldSpec> {
        match self {
            CalculatorType::Sip
            | CalculatorType::Fd
            | CalculatorType::MutualFund
            | CalculatorType::CompoundInterest => {
                vec![MONTHLY_SAVINGS, EXPECTED_RETURNS, INVESTMENT_PERIOD]
            }
            CalculatorType::Inflation => {
                vec![CURRENT_COST, PROJECTED_INFLATION, INVESTMENT_PERIOD]
            }
            CalculatorType::Retirement => vec![
                PROJECTED_INFLATION,
                FieldSpec {
                    parameter: "monthlyExpense",
                    label: "Future Monthly Income",
                    min: 0.0,
                    max: 10_000_000.0,
                    step: 1_000.0,
                    suffix: "",
                },
                INVESTMENT_PERIOD,
            ],
            CalculatorType::EmergencyFund => vec![
                FieldSpec {
                    parameter: "monthlyExpense",
                    label: "Monthly Expenses",
                    min: 0.0,
                    max: 10_000_000.0,
                    step: 1_000.0,
                    suffix: "",
                },
                FieldSpec {
                    parameter: "years",
                    label: "Safety Buffer",
                    min: 1.0,
                    max: 600.0,
                    step: 1.0,
                    suffix: " Months",
                },
            ],
            CalculatorType::NetWorth => vec![
                FieldSpec {
                    parameter: "totalAssets",
                    label: "Total Financial Assets",
                    min: 0.0,
                    max: 10_000_000_000.0,
                    step: 10_000.0,
                    suffix: "",
                },
                FieldSpec {
                    parameter: "totalLiabilities",
                    label: "Total Liabilities",
                    min: 0.0,
                    max: 10_000_000_000.0,
                    step: 10_000.0,
                    suffix: "",
                },
            ],
        }
    }

    pub fn info(self) -> CalculatorInfo {
        CalculatorInfo {
            id: self,
            title: self.title(),
            description: self.description(),
            fields: self.fields(),
        }
    }
}

pub fn catalog() -> Vec<CalculatorInfo> {
    CalculatorType::ALL.into_iter().map(CalculatorType::info).collect()
}
