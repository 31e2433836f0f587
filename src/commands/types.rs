use std::fmt;

use super::{Command, Pid};

/// An individual trouble code from an ECU
///
/// The payload is the low 14 bits of the two raw bytes: the digit after the category letter
/// (0-3) followed by three hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtc {
    /// Powertrain, represented with `'P'`
    Powertrain(u16),
    /// Chassis, represented with `'C'`
    Chassis(u16),
    /// Body, represented with `'B'`
    Body(u16),
    /// Network, represented with `'U'` likely due to previously being the "unknown" category
    Network(u16),
}

impl From<u16> for Dtc {
    fn from(raw: u16) -> Self {
        let n = raw & 0x3fff;
        match raw >> 14 {
            0 => Dtc::Powertrain(n),
            1 => Dtc::Chassis(n),
            2 => Dtc::Body(n),
            _ => Dtc::Network(n),
        }
    }
}

impl fmt::Display for Dtc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (c, n) = match self {
            Self::Powertrain(n) => ('P', n),
            Self::Chassis(n) => ('C', n),
            Self::Body(n) => ('B', n),
            Self::Network(n) => ('U', n),
        };
        f.write_fmt(format_args!("{}{:04X}", c, n))
    }
}

/// A decoded reply
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of a Mode 01 formula. MAF is kept scaled by 100 (centigrams per second).
    Number(i32),
    /// Stored trouble codes, in reply order
    Codes(Vec<Dtc>),
    /// Whether a clear request was acknowledged with `44`
    Cleared(bool),
    /// A reply passed through without interpretation
    Raw(String),
}

/// A command together with the value decoded from its reply
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub command: Command,
    pub value: Value,
}

impl Reading {
    /// The reading a command falls back to when its reply is missing or malformed
    pub fn default_for(command: &Command) -> Self {
        Reading {
            value: command.default_value(),
            command: command.clone(),
        }
    }

    pub fn number(&self) -> Option<i32> {
        match self.value {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Mass air flow in g/s, for a [Pid::Maf] reading
    pub fn maf_grams_per_sec(&self) -> Option<f64> {
        match (&self.command, &self.value) {
            (Command::Live(Pid::Maf), Value::Number(n)) => Some(f64::from(*n) / 100.0),
            _ => None,
        }
    }

    pub fn codes(&self) -> &[Dtc] {
        match &self.value {
            Value::Codes(codes) => codes,
            _ => &[],
        }
    }

    /// Human-readable result, e.g. `"1713 RPM"` or `"P0133, P0171"`
    pub fn formatted_result(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.command, &self.value) {
            (Command::Live(Pid::Maf), Value::Number(n)) => {
                write!(f, "{:.2} {}", f64::from(*n) / 100.0, Pid::Maf.unit())
            }
            (command, Value::Number(n)) => write!(f, "{} {}", n, command.unit()),
            (_, Value::Codes(codes)) if codes.is_empty() => f.write_str("No trouble codes found."),
            (_, Value::Codes(codes)) => {
                for (i, code) in codes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", code)?;
                }
                Ok(())
            }
            (_, Value::Cleared(true)) => f.write_str("Trouble codes cleared."),
            (_, Value::Cleared(false)) => f.write_str("Clear request not acknowledged."),
            (_, Value::Raw(raw)) => write!(f, "Raw: {}", raw),
        }
    }
}

/// A PID a caller can ask for in a custom scan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PidDescriptor {
    /// Request code, e.g. `"010C"`
    pub code: String,
    /// Human label, e.g. `"Engine RPM"`
    pub label: String,
}

impl PidDescriptor {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        PidDescriptor {
            code: code.into(),
            label: label.into(),
        }
    }
}
