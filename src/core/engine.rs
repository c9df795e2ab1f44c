use super::error::EngineError;
use super::types::{
    CalculationResult, Calculator, CalculatorType, EmergencyFundParams, InflationParams,
    LumpSumParams, NetWorthParams, ParameterSet, RetirementParams, Segment, SipParams,
};

/// Years of annual spending a retirement corpus must cover; 25x is the
/// inverse of a 4% safe withdrawal rate.
pub const RETIREMENT_CORPUS_MULTIPLIER: f64 = 25.0;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Unrounded figures for one projection, before result shaping.
#[derive(Debug, Clone, Copy)]
struct Projection {
    total: f64,
    invested: f64,
    returns: f64,
    segments: [Segment; 2],
}

/// Validates the form state for `kind` and runs the projection.
pub fn calculate(kind: CalculatorType, params: &ParameterSet) -> Result<CalculationResult, EngineError> {
    let calculator = Calculator::from_parameters(kind, params)?;
    compute(&calculator)
}

pub fn compute(calculator: &Calculator) -> Result<CalculationResult, EngineError> {
    let projection = match *calculator {
        Calculator::Sip(p) => project_sip(p),
        Calculator::Fd(p) | Calculator::MutualFund(p) | Calculator::CompoundInterest(p) => {
            project_lump_sum(p)
        }
        Calculator::Inflation(p) => project_inflation(p),
        Calculator::EmergencyFund(p) => project_emergency_fund(p),
        Calculator::NetWorth(p) => project_net_worth(p),
        Calculator::Retirement(p) => project_retirement(p),
    };
    shape_result(projection)
}

/// `amount` compounded annually; a zero amount stays zero even when the growth
/// factor itself overflows.
fn grow(amount: f64, annual_rate_percent: f64, years: f64) -> f64 {
    if amount == 0.0 {
        return 0.0;
    }
    amount * (1.0 + annual_rate_percent / 100.0).powf(years)
}

fn project_sip(p: SipParams) -> Projection {
    let i = p.annual_rate_percent / 100.0 / MONTHS_PER_YEAR;
    let n = p.years * MONTHS_PER_YEAR;
    let invested = p.monthly_contribution * n;
    let total = if i == 0.0 || p.monthly_contribution == 0.0 {
        invested
    } else {
        // Annuity due: each contribution compounds from the start of its month.
        p.monthly_contribution * (((1.0 + i).powf(n) - 1.0) / i) * (1.0 + i)
    };
    let returns = total - invested;
    Projection {
        total,
        invested,
        returns,
        segments: [
            Segment {
                label: "Invested Capital",
                value: invested,
            },
            Segment {
                label: "Total Growth",
                value: returns.max(0.0),
            },
        ],
    }
}

fn project_lump_sum(p: LumpSumParams) -> Projection {
    let total = grow(p.principal, p.annual_rate_percent, p.years);
    let invested = p.principal;
    let returns = total - invested;
    Projection {
        total,
        invested,
        returns,
        segments: [
            Segment {
                label: "Principal",
                value: invested,
            },
            Segment {
                label: "Wealth Created",
                value: returns.max(0.0),
            },
        ],
    }
}

fn project_inflation(p: InflationParams) -> Projection {
    let total = grow(p.current_cost, p.inflation_rate_percent, p.years);
    let invested = p.current_cost;
    Projection {
        total,
        invested,
        returns: total - invested,
        segments: [
            Segment {
                label: "Today Price",
                value: invested,
            },
            Segment {
                label: "Future Price",
                value: total,
            },
        ],
    }
}

fn project_emergency_fund(p: EmergencyFundParams) -> Projection {
    let total = p.monthly_expense * p.months;
    Projection {
        total,
        invested: p.monthly_expense,
        returns: 0.0,
        segments: [
            Segment {
                label: "Safety Buffer",
                value: total,
            },
            Segment {
                label: "Monthly Burn",
                value: p.monthly_expense,
            },
        ],
    }
}

// Assets and liabilities ride in the invested/returns slots.
fn project_net_worth(p: NetWorthParams) -> Projection {
    Projection {
        total: p.total_assets - p.total_liabilities,
        invested: p.total_assets,
        returns: p.total_liabilities,
        segments: [
            Segment {
                label: "Total Assets",
                value: p.total_assets,
            },
            Segment {
                label: "Total Debt",
                value: p.total_liabilities,
            },
        ],
    }
}

fn project_retirement(p: RetirementParams) -> Projection {
    let future_monthly_expense = grow(p.monthly_expense, p.inflation_rate_percent, p.years);
    let total = future_monthly_expense * MONTHS_PER_YEAR * RETIREMENT_CORPUS_MULTIPLIER;
    let invested = p.monthly_expense * MONTHS_PER_YEAR * p.years;
    let returns = total - invested;
    Projection {
        total,
        invested,
        returns,
        segments: [
            Segment {
                label: "Projected Principal",
                value: invested,
            },
            Segment {
                label: "Required Growth",
                value: returns.max(0.0),
            },
        ],
    }
}

fn shape_result(projection: Projection) -> Result<CalculationResult, EngineError> {
    for (field, value) in [
        ("totalValue", projection.total),
        ("investedAmount", projection.invested),
        ("returns", projection.returns),
        ("segments", projection.segments[0].value),
        ("segments", projection.segments[1].value),
    ] {
        if !value.is_finite() {
            return Err(EngineError::NonFiniteResult { field });
        }
    }

    // Each field is rounded on its own; returns is never re-derived from the
    // rounded total and invested amount.
    Ok(CalculationResult {
        total_value: round_half_up(projection.total),
        invested_amount: round_half_up(projection.invested),
        returns: round_half_up(projection.returns),
        segments: projection.segments,
    })
}

/// Nearest integer, ties toward positive infinity (`2.5 -> 3`, `-2.5 -> -2`).
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}
