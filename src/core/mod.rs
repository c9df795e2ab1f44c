mod catalog;
mod engine;
mod error;
mod format;
mod types;

pub use catalog::{CalculatorInfo, FieldSpec, catalog};
pub use engine::{RETIREMENT_CORPUS_MULTIPLIER, calculate, compute, round_half_up};
pub use error::EngineError;
pub use format::format_currency;
pub use types::{
    CalculationResult, Calculator, CalculatorType, EmergencyFundParams, InflationParams,
    LumpSumParams, NetWorthParams, ParameterSet, RetirementParams, Segment, SipParams,
};
