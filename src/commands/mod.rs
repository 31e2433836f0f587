//! Command catalog and reply decoding
//!
//! Every request the poller can issue is a [Command]. Decoding is pure: the same cleaned reply
//! always gives the same [Value], and a reply that does not match the command gives the
//! command's default value instead of an error.

#[macro_use]
mod macros;

mod catalog;
pub use catalog::supported_pids;

mod implementation;
pub use implementation::decode_dtcs;

mod types;
pub use types::{Dtc, PidDescriptor, Reading, Value};

live_pids! {
    /// Engine coolant temperature, `A - 40`
    Coolant("0105", "4105", 1, "Engine Coolant Temperature", "°C")
        => |d: &[u8]| i32::from(d[0]) - 40;
    /// Engine speed, `((A * 256) + B) / 4`
    Rpm("010C", "410C", 2, "Engine RPM", "RPM")
        => |d: &[u8]| (i32::from(d[0]) * 256 + i32::from(d[1])) / 4;
    /// Vehicle speed, `A`
    Speed("010D", "410D", 1, "Vehicle Speed", "km/h")
        => |d: &[u8]| i32::from(d[0]);
    /// Mass air flow, `(A * 256) + B` hundredths of g/s
    Maf("0110", "4110", 2, "Mass Air Flow", "g/s")
        => |d: &[u8]| i32::from(d[0]) * 256 + i32::from(d[1]);
    /// Fuel tank level, `(100 * A) / 255`
    FuelLevel("012F", "412F", 1, "Fuel Level", "%")
        => |d: &[u8]| 100 * i32::from(d[0]) / 255;
}

/// A request the poller can send
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Mode 01 live data with a known formula
    Live(Pid),
    /// Mode 03, read stored trouble codes
    ReadDtcs,
    /// Mode 04, clear trouble codes
    ClearDtcs,
    /// Any other request; the reply is passed through unparsed
    RawPid(String),
}

impl Command {
    /// Pick the command for a request code, falling back to [Command::RawPid]
    pub fn from_request_code(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        Pid::ALL
            .iter()
            .find(|pid| pid.request_code() == code)
            .map(|&pid| Command::Live(pid))
            .unwrap_or(Command::RawPid(code))
    }

    pub fn request_code(&self) -> &str {
        match self {
            Command::Live(pid) => pid.request_code(),
            Command::ReadDtcs => "03",
            Command::ClearDtcs => "04",
            Command::RawPid(code) => code,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Live(pid) => pid.name(),
            Command::ReadDtcs => "Diagnostic Trouble Codes",
            Command::ClearDtcs => "Clear Diagnostic Trouble Codes",
            Command::RawPid(code) => code,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Command::Live(pid) => pid.unit(),
            _ => "",
        }
    }

    /// Decode a cleaned reply (see [clean_response](crate::device::clean_response))
    pub fn decode(&self, raw: &str) -> Value {
        match self {
            Command::Live(pid) => match implementation::decode_pid(*pid, raw) {
                Some(n) => Value::Number(n),
                None => {
                    log::debug!(
                        "{}: reply {:?} does not match {}, using 0",
                        pid.name(),
                        raw,
                        pid.response_prefix()
                    );
                    Value::Number(0)
                }
            },
            Command::ReadDtcs => Value::Codes(decode_dtcs(raw)),
            Command::ClearDtcs => Value::Cleared(raw.starts_with("44")),
            Command::RawPid(_) => Value::Raw(raw.to_owned()),
        }
    }

    /// Value used when the reply is missing
    pub fn default_value(&self) -> Value {
        match self {
            Command::Live(_) => Value::Number(0),
            Command::ReadDtcs => Value::Codes(Vec::new()),
            Command::ClearDtcs => Value::Cleared(false),
            Command::RawPid(_) => Value::Raw(String::new()),
        }
    }
}

impl From<Pid> for Command {
    fn from(pid: Pid) -> Self {
        Command::Live(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn number(command: impl Into<Command>, raw: &str) -> i32 {
        match command.into().decode(raw) {
            Value::Number(n) => n,
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn coolant() {
        assert_eq!(number(Pid::Coolant, "410528"), 0);
        assert_eq!(number(Pid::Coolant, "4105A0"), 120);
        assert_eq!(number(Pid::Coolant, "410500"), -40);
    }

    #[test]
    fn rpm() {
        assert_eq!(number(Pid::Rpm, "410C1AF8"), 1726);
        assert_eq!(number(Pid::Rpm, "410C1AE4"), 1713);
        assert_eq!(number(Pid::Rpm, "410C0000"), 0);
    }

    #[test]
    fn speed() {
        assert_eq!(number(Pid::Speed, "410D28"), 40);
    }

    #[test]
    fn fuel_level() {
        assert_eq!(number(Pid::FuelLevel, "412FFF"), 100);
        assert_eq!(number(Pid::FuelLevel, "412F00"), 0);
        assert_eq!(number(Pid::FuelLevel, "412F80"), 50);
    }

    #[test]
    fn maf_exposes_scaled_and_float() {
        let command = Command::Live(Pid::Maf);
        let reading = Reading {
            value: command.decode("41100BB8"),
            command,
        };
        assert_eq!(reading.number(), Some(3000));
        assert_eq!(reading.maf_grams_per_sec(), Some(30.0));
        assert_eq!(reading.formatted_result(), "30.00 g/s");
    }

    #[test]
    fn mismatched_or_short_replies_decode_to_zero() {
        assert_eq!(number(Pid::Rpm, "NODATA"), 0);
        assert_eq!(number(Pid::Rpm, "410C1A"), 0);
        assert_eq!(number(Pid::Rpm, "410D1AF8"), 0);
        assert_eq!(number(Pid::Speed, ""), 0);
        assert_eq!(number(Pid::Coolant, "4105ZZ"), 0);
        assert_eq!(number(Pid::Speed, "410D+5"), 0);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        assert_eq!(number(Pid::Speed, "410D28FF"), 40);
    }

    #[test]
    fn formatted_results() {
        let rpm = Reading {
            command: Pid::Rpm.into(),
            value: Value::Number(1713),
        };
        assert_eq!(rpm.formatted_result(), "1713 RPM");

        let coolant = Reading {
            command: Pid::Coolant.into(),
            value: Value::Number(90),
        };
        assert_eq!(coolant.formatted_result(), "90 °C");

        let raw = Reading {
            command: Command::RawPid("0111".to_owned()),
            value: Value::Raw("411145".to_owned()),
        };
        assert_eq!(raw.formatted_result(), "Raw: 411145");
    }

    #[test]
    fn dtc_formatted_results() {
        let none = Reading::default_for(&Command::ReadDtcs);
        assert_eq!(none.formatted_result(), "No trouble codes found.");

        let command = Command::ReadDtcs;
        let some = Reading {
            value: command.decode("4301330171"),
            command,
        };
        assert_eq!(some.formatted_result(), "P0133, P0171");
        assert_eq!(some.codes().len(), 2);
    }

    #[test]
    fn dispatch_by_request_code() {
        assert_eq!(Command::from_request_code("010C"), Command::Live(Pid::Rpm));
        assert_eq!(Command::from_request_code("012f"), Command::Live(Pid::FuelLevel));
        assert_eq!(
            Command::from_request_code("0111"),
            Command::RawPid("0111".to_owned())
        );
        for pid in Pid::ALL {
            assert_eq!(Command::from_request_code(pid.request_code()), Command::Live(*pid));
        }
    }

    #[test]
    fn response_prefix_mirrors_request() {
        for pid in Pid::ALL {
            assert_eq!(&pid.response_prefix()[..2], "41");
            assert_eq!(&pid.response_prefix()[2..], &pid.request_code()[2..]);
        }
    }

    #[test]
    fn clear_acknowledgement() {
        assert_eq!(Command::ClearDtcs.decode("44"), Value::Cleared(true));
        assert_eq!(Command::ClearDtcs.decode("NODATA"), Value::Cleared(false));
    }

    proptest! {
        #[test]
        fn coolant_is_byte_minus_40(a in any::<u8>()) {
            prop_assert_eq!(number(Pid::Coolant, &format!("4105{:02X}", a)), i32::from(a) - 40);
        }

        #[test]
        fn speed_is_byte(a in any::<u8>()) {
            prop_assert_eq!(number(Pid::Speed, &format!("410D{:02X}", a)), i32::from(a));
        }

        #[test]
        fn fuel_level_stays_in_percent_range(a in any::<u8>()) {
            let level = number(Pid::FuelLevel, &format!("412F{:02X}", a));
            prop_assert!((0..=100).contains(&level));
        }

        #[test]
        fn rpm_matches_formula(a in any::<u8>(), b in any::<u8>()) {
            let rpm = number(Pid::Rpm, &format!("410C{:02X}{:02X}", a, b));
            prop_assert_eq!(rpm, (i32::from(a) * 256 + i32::from(b)) / 4);
        }

        #[test]
        fn decode_is_pure(raw in "[0-9A-F]{0,12}") {
            for pid in Pid::ALL {
                let command = Command::Live(*pid);
                prop_assert_eq!(command.decode(&raw), command.decode(&raw));
            }
        }
    }
}
