//! Samples a DHT sensor forever.
//!
//! ```text
//! dht <gpio_pin> [sampling_rate_sec]
//! ```

use std::process::ExitCode;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Context;
use dht_gpiomem::linux::{GpioMem, SleepDelay, SystemClock, request_realtime_priority};
use dht_gpiomem::{Config, Dht, DhtError, GpioPin, Invocation, SampleOutcome};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match Invocation::parse(args.iter().map(String::as_str)) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(invocation: Invocation) -> anyhow::Result<()> {
    let config = Config::default();
    println!("sampling rate is {}s", invocation.interval_secs);
    println!("pulse timeout is {} polls", config.timeout_polls);
    println!("pulse sampling delay is {}us", config.poll_interval_us);

    let gpiomem = GpioMem::open().context("cannot map GPIO registers")?;
    let pin = GpioPin::new(gpiomem.registers(), invocation.pin)?;

    if let Err(e) = request_realtime_priority() {
        eprintln!("warning: running without real-time priority: {e}");
    }

    let mut dht = Dht::with_config(pin, SleepDelay, SystemClock, config);
    let interval = Duration::from_secs(u64::from(invocation.interval_secs));

    loop {
        sleep(interval);

        let report = match dht.read() {
            Ok(report) => report,
            Err(DhtError::PinError(never)) => match never {},
        };
        for outcome in report.outcomes() {
            match outcome {
                SampleOutcome::AckTimingWarning { .. } => println!(
                    "{outcome}, should be {} +/- {}us",
                    config.ack_expected_us, config.ack_deviation_us
                ),
                _ => println!("{outcome}"),
            }
        }
    }
}
