use log::info;
use std::sync::mpsc;

use obd2_poller::{
    commands::PidDescriptor, device::SerialPort, Config, Error, Event, PollMode,
};

const USAGE: &str = "usage: obd2-poller <serial-port> [dashboard|fuel|dtc|clear|scan PID...]";

fn load_config() -> Result<Config, Error> {
    match std::env::var("OBD2_POLLER_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            let json = std::fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("{}: {}", path, e)))?;
            Config::from_json(&json)
        }
        Err(_) => Ok(Config::default()),
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    let mode = args.next().unwrap_or_else(|| "dashboard".to_owned());
    let pids: Vec<PidDescriptor> = args
        .map(|code| PidDescriptor::new(code.to_ascii_uppercase(), code))
        .collect();

    let config = load_config()?;
    let port = SerialPort::new(&path)?;
    let (tx, rx) = mpsc::channel();
    let poller = obd2_poller::connect(port, config, tx)?;

    match mode.as_str() {
        "dashboard" => poller.set_mode(PollMode::Dashboard),
        "fuel" => poller.set_mode(PollMode::FuelStats),
        "dtc" => poller.set_mode(PollMode::DtcScan),
        "clear" => poller.set_mode(PollMode::DtcClear),
        "scan" if !pids.is_empty() => poller.set_custom_scan_pids(pids),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    for event in rx {
        match event {
            Event::Dashboard(reading) => {
                println!("{:>4} km/h {:>6} RPM", reading.speed_kmh, reading.rpm)
            }
            Event::Fuel(reading) => println!(
                "fuel {:>3}% {:6.2} L/100km {:5.2} L/h at {} km/h",
                reading.fuel_level_percent,
                reading.smoothed_l_per_100km,
                reading.liters_per_hour,
                reading.speed_kmh
            ),
            Event::DtcResult(codes) => {
                if codes.is_empty() {
                    println!("No trouble codes found.");
                }
                for code in codes {
                    println!("{}", code);
                }
                break;
            }
            Event::CustomScanResult(results) => {
                for (code, result) in results {
                    println!("{}: {}", code, result);
                }
                println!();
            }
            Event::ConnectionLost(reason) => {
                return Err(Error::ConnectionLost(reason));
            }
            Event::InvalidDevice(response) => {
                return Err(Error::InvalidDevice { response });
            }
        }
    }

    poller.cancel();
    poller.join()
}
