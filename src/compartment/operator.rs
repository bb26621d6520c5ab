//! Comparison operators and validated numeric conditions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ConfigError;
use crate::graph::AttrValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Inclusive range membership
    In,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "IN",
        }
    }

    /// Apply a scalar operator. `In` never matches a scalar.
    pub fn compare(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Eq => lhs == rhs,
            Operator::Ne => lhs != rhs,
            Operator::Lt => lhs < rhs,
            Operator::Le => lhs <= rhs,
            Operator::Gt => lhs > rhs,
            Operator::Ge => lhs >= rhs,
            Operator::In => false,
        }
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            op if op.eq_ignore_ascii_case("in") => Ok(Operator::In),
            other => Err(ConfigError::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reference {
    Scalar(f64),
    /// Inclusive `[low, high]`, `low <= high`
    Range(f64, f64),
}

/// An operator paired with a reference it is valid for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericCondition {
    op: Operator,
    reference: Reference,
}

impl NumericCondition {
    pub fn new(op: Operator, reference: Reference) -> Result<Self, ConfigError> {
        match (op, reference) {
            (Operator::In, Reference::Range(low, high)) => {
                if low.is_nan() || high.is_nan() || low > high {
                    return Err(ConfigError::InvalidRange(format!("[{}, {}]", low, high)));
                }
            }
            (Operator::In, Reference::Scalar(v)) => {
                return Err(ConfigError::InvalidRange(v.to_string()));
            }
            (op, Reference::Range(low, high)) => {
                return Err(ConfigError::NonNumericReference {
                    op: op.to_string(),
                    value: format!("[{}, {}]", low, high),
                });
            }
            (op, Reference::Scalar(v)) => {
                if !v.is_finite() {
                    return Err(ConfigError::NonNumericReference {
                        op: op.to_string(),
                        value: v.to_string(),
                    });
                }
            }
        }
        Ok(Self { op, reference })
    }

    pub fn scalar(op: Operator, value: f64) -> Result<Self, ConfigError> {
        Self::new(op, Reference::Scalar(value))
    }

    pub fn between(low: f64, high: f64) -> Result<Self, ConfigError> {
        Self::new(Operator::In, Reference::Range(low, high))
    }

    /// Build from loosely typed input: an operator symbol and one reference
    /// value (two for `IN`). Every reference value must be int or float.
    pub fn parse(op: &str, values: &[AttrValue]) -> Result<Self, ConfigError> {
        let op: Operator = op.parse()?;
        let numeric = values
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| ConfigError::NonNumericReference {
                    op: op.to_string(),
                    value: v.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, ConfigError>>()?;

        let reference = match (op, numeric.as_slice()) {
            (Operator::In, [low, high]) => Reference::Range(*low, *high),
            (Operator::In, _) => {
                return Err(ConfigError::InvalidRange(format!("{:?}", numeric)));
            }
            (_, [value]) => Reference::Scalar(*value),
            (op, _) => {
                return Err(ConfigError::NonNumericReference {
                    op: op.to_string(),
                    value: format!("{:?}", numeric),
                });
            }
        };
        Self::new(op, reference)
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn reference(&self) -> Reference {
        self.reference
    }

    pub fn holds(&self, value: f64) -> bool {
        match self.reference {
            Reference::Range(low, high) => low <= value && value <= high,
            Reference::Scalar(rhs) => self.op.compare(value, rhs),
        }
    }
}
