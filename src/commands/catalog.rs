use super::PidDescriptor;

const SUPPORTED_PIDS: &[(&str, &str)] = &[
    // engine
    ("0104", "Engine Load"),
    ("0105", "Engine Coolant Temperature"),
    ("010C", "Engine RPM"),
    ("010D", "Vehicle Speed"),
    ("0111", "Throttle Position"),
    ("011F", "Run time since engine start"),
    ("0146", "Ambient Air Temperature"),
    ("015C", "Engine Oil Temperature"),
    ("0167", "Engine Coolant Temperature at thermostat"),
    ("01A6", "Odometer"),
    // fuel system
    ("010A", "Fuel Pressure"),
    ("012F", "Fuel Level Input"),
    ("015E", "Engine Fuel Rate"),
    ("0123", "Fuel Rail Pressure"),
    ("0159", "Fuel Rail Absolute Pressure"),
    // air intake and exhaust
    ("010F", "Intake Air Temperature"),
    ("0110", "MAF Air Flow Rate"),
    ("010B", "Intake Manifold Absolute Pressure"),
    ("0133", "Barometric Pressure"),
    ("0142", "Catalyst Temperature (Bank 1, Sensor 1)"),
    ("0143", "Catalyst Temperature (Bank 2, Sensor 1)"),
    // oxygen sensors
    ("0114", "O2 Sensor 1, Bank 1 (Voltage)"),
    ("0115", "O2 Sensor 2, Bank 1 (Voltage)"),
    ("0116", "O2 Sensor 3, Bank 1 (Voltage)"),
    ("0117", "O2 Sensor 4, Bank 1 (Voltage)"),
    ("0118", "O2 Sensor 5, Bank 2 (Voltage)"),
    ("0119", "O2 Sensor 6, Bank 2 (Voltage)"),
    ("011A", "O2 Sensor 7, Bank 2 (Voltage)"),
    ("011B", "O2 Sensor 8, Bank 2 (Voltage)"),
    // emissions and EVAP
    ("012C", "Commanded EGR"),
    ("012D", "EGR Error"),
    ("012E", "Commanded Evaporative Purge"),
    ("0131", "Distance traveled with MIL on"),
    // electrical
    ("0121", "Distance traveled since codes cleared"),
    ("014D", "Control Module Voltage"),
    ("015B", "Hybrid/EV Battery Remaining Life"),
    // status and trims
    ("0103", "Fuel System Status"),
    ("0106", "Short Term Fuel Trim - Bank 1"),
    ("0107", "Long Term Fuel Trim - Bank 1"),
    ("0108", "Short Term Fuel Trim - Bank 2"),
    ("0109", "Long Term Fuel Trim - Bank 2"),
    ("011C", "OBD standards this vehicle conforms to"),
    ("011D", "Oxygen sensors present"),
];

/// Well-known Mode 01 PIDs to offer for a custom scan
///
/// Only some have a decode formula; the rest come back as raw replies.
pub fn supported_pids() -> Vec<PidDescriptor> {
    SUPPORTED_PIDS
        .iter()
        .map(|&(code, label)| PidDescriptor::new(code, label))
        .collect()
}
