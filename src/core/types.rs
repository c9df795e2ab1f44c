use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::EngineError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculatorType {
    Sip,
    Fd,
    MutualFund,
    Retirement,
    Inflation,
    CompoundInterest,
    NetWorth,
    EmergencyFund,
}

impl CalculatorType {
    pub const ALL: [CalculatorType; 8] = [
        CalculatorType::Sip,
        CalculatorType::Fd,
        CalculatorType::MutualFund,
        CalculatorType::Retirement,
        CalculatorType::Inflation,
        CalculatorType::CompoundInterest,
        CalculatorType::NetWorth,
        CalculatorType::EmergencyFund,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            CalculatorType::Sip => "SIP",
            CalculatorType::Fd => "FD",
            CalculatorType::MutualFund => "MUTUAL_FUND",
            CalculatorType::Retirement => "RETIREMENT",
            CalculatorType::Inflation => "INFLATION",
            CalculatorType::CompoundInterest => "COMPOUND_INTEREST",
            CalculatorType::NetWorth => "NET_WORTH",
            CalculatorType::EmergencyFund => "EMERGENCY_FUND",
        }
    }
}

impl fmt::Display for CalculatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Accepts the canonical tags (`MUTUAL_FUND`) as well as lowercase and
/// kebab-case spellings (`mutual-fund`).
impl FromStr for CalculatorType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        CalculatorType::ALL
            .into_iter()
            .find(|kind| kind.tag() == normalized)
            .ok_or_else(|| EngineError::UnknownCalculator(s.to_string()))
    }
}

/// Flat form state shared by every calculator tab. Only the fields relevant
/// to the selected type are read when it is projected onto a [`Calculator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterSet {
    /// Monthly saving for SIP/retirement-style tabs, lumpsum principal for
    /// FD/mutual fund/compound interest, current cost for inflation.
    pub monthly_contribution: f64,
    pub annual_rate_percent: f64,
    /// Years, except for the emergency fund where it counts months.
    pub years: f64,
    pub inflation_rate_percent: f64,
    pub monthly_expense: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            monthly_contribution: 1_000.0,
            annual_rate_percent: 12.0,
            years: 10.0,
            inflation_rate_percent: 6.0,
            monthly_expense: 30_000.0,
            total_assets: 1_000_000.0,
            total_liabilities: 200_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SipParams {
    pub monthly_contribution: f64,
    pub annual_rate_percent: f64,
    pub years: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumpSumParams {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub years: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationParams {
    pub current_cost: f64,
    pub inflation_rate_percent: f64,
    pub years: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmergencyFundParams {
    pub monthly_expense: f64,
    pub months: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetWorthParams {
    pub total_assets: f64,
    pub total_liabilities: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetirementParams {
    pub monthly_expense: f64,
    pub inflation_rate_percent: f64,
    pub years: f64,
}

/// A calculation request: the calculator type together with exactly the
/// parameters that type consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calculator {
    Sip(SipParams),
    Fd(LumpSumParams),
    MutualFund(LumpSumParams),
    CompoundInterest(LumpSumParams),
    Inflation(InflationParams),
    EmergencyFund(EmergencyFundParams),
    NetWorth(NetWorthParams),
    Retirement(RetirementParams),
}

impl Calculator {
    pub fn kind(&self) -> CalculatorType {
        match self {
            Calculator::Sip(_) => CalculatorType::Sip,
            Calculator::Fd(_) => CalculatorType::Fd,
            Calculator::MutualFund(_) => CalculatorType::MutualFund,
            Calculator::CompoundInterest(_) => CalculatorType::CompoundInterest,
            Calculator::Inflation(_) => CalculatorType::Inflation,
            Calculator::EmergencyFund(_) => CalculatorType::EmergencyFund,
            Calculator::NetWorth(_) => CalculatorType::NetWorth,
            Calculator::Retirement(_) => CalculatorType::Retirement,
        }
    }

    /// Projects the shared form state onto the variant for `kind`, rejecting
    /// negative or non-finite values in the fields that variant reads.
    pub fn from_parameters(kind: CalculatorType, params: &ParameterSet) -> Result<Self, EngineError> {
        let calculator = match kind {
            CalculatorType::Sip => Calculator::Sip(SipParams {
                monthly_contribution: non_negative("monthlyContribution", params.monthly_contribution)?,
                annual_rate_percent: non_negative("annualRatePercent", params.annual_rate_percent)?,
                years: non_negative("years", params.years)?,
            }),
            CalculatorType::Fd => Calculator::Fd(lump_sum(params)?),
            CalculatorType::MutualFund => Calculator::MutualFund(lump_sum(params)?),
            CalculatorType::CompoundInterest => Calculator::CompoundInterest(lump_sum(params)?),
            CalculatorType::Inflation => Calculator::Inflation(InflationParams {
                current_cost: non_negative("monthlyContribution", params.monthly_contribution)?,
                inflation_rate_percent: non_negative(
                    "inflationRatePercent",
                    params.inflation_rate_percent,
                )?,
                years: non_negative("years", params.years)?,
            }),
            CalculatorType::EmergencyFund => Calculator::EmergencyFund(EmergencyFundParams {
                monthly_expense: non_negative("monthlyExpense", params.monthly_expense)?,
                months: non_negative("years", params.years)?,
            }),
            CalculatorType::NetWorth => Calculator::NetWorth(NetWorthParams {
                total_assets: non_negative("totalAssets", params.total_assets)?,
                total_liabilities: non_negative("totalLiabilities", params.total_liabilities)?,
            }),
            CalculatorType::Retirement => Calculator::Retirement(RetirementParams {
                monthly_expense: non_negative("monthlyExpense", params.monthly_expense)?,
                inflation_rate_percent: non_negative(
                    "inflationRatePercent",
                    params.inflation_rate_percent,
                )?,
                years: non_negative("years", params.years)?,
            }),
        };
        Ok(calculator)
    }
}

fn lump_sum(params: &ParameterSet) -> Result<LumpSumParams, EngineError> {
    Ok(LumpSumParams {
        principal: non_negative("monthlyContribution", params.monthly_contribution)?,
        annual_rate_percent: non_negative("annualRatePercent", params.annual_rate_percent)?,
        years: non_negative("years", params.years)?,
    })
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, EngineError> {
    if !value.is_finite() {
        return Err(EngineError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(EngineError::invalid(field, "must be >= 0"));
    }
    Ok(value)
}

/// One named slice of the two-part breakdown chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub total_value: f64,
    pub invested_amount: f64,
    pub returns: f64,
    /// Always two entries; the first is the base quantity.
    pub segments: [Segment; 2],
}
