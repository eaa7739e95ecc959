use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::{thread, time};

use cc_validator::{continue_on_err, BillTypeSet, DeviceHandle, LogObserver, SerialConfig, Status};

/// Interval between POLL commands (milliseconds).
const POLLING_MS: u64 = 1_000;

fn main() -> cc_validator::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .init();

    let stop_polling = Arc::new(AtomicBool::new(false));

    // Set signal handlers
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop_polling))?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop_polling))?;

    let config = SerialConfig::from_env()?;
    let observer = LogObserver::new(config.path());
    let handle = DeviceHandle::from_config(config)?.with_observer(observer);

    let status = handle.poll()?;
    log::info!("Initial status: {status}");

    if status.status() == Status::UnitDisabled || status.status() == Status::PowerUp {
        handle.reset()?;
    }

    print_json(&handle.identification()?)?;
    print_json(&handle.get_bill_table()?)?;

    handle.enable_bill_types(&BillTypeSet::all().to_vec(), &[])?;

    while !stop_polling.load(Ordering::Relaxed) {
        thread::sleep(time::Duration::from_millis(POLLING_MS));

        let status = continue_on_err!(handle.poll(), "Failed poll command");

        match status.status() {
            Status::EscrowPosition => {
                log::info!("Bill in escrow: {status}, stacking");
                continue_on_err!(handle.stack(), "Failed stack command");
            }
            Status::BillStacked => log::info!("Credit: {status}"),
            _ if status.is_fault() => log::error!("Device fault: {status}"),
            _ => log::debug!("Status: {status}"),
        }
    }

    handle.disable_bill_types()?;
    handle.close()?;

    Ok(())
}

fn print_json<T: serde::Serialize>(val: &T) -> cc_validator::Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
