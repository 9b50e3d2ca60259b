use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use northlink_radio::{Radio, RadioUri};
use northlink_transport::SerialPortLink;

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod monitor;
pub mod params;
pub mod set;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pull the vehicle's parameter table and print it.
    Params(ParamsArgs),
    /// Pull the table, then send a new value for one parameter.
    Set(SetArgs),
    /// Print text messages from the dongle and vehicle.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Params(args) => params::run(args, format),
        Command::Set(args) => set::run(args),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial device of the radio dongle (e.g. /dev/ttyUSB0, COM3).
    pub port: String,
    /// Vehicle pipe locator.
    #[arg(long, default_value = RadioUri::DEFAULT, env = "NORTHLINK_URI")]
    pub uri: RadioUri,
    /// Serial baud rate.
    #[arg(long, default_value_t = SerialPortLink::DEFAULT_BAUD)]
    pub baud: u32,
    /// Handshake timeout (e.g. 30s, 500ms).
    #[arg(long, default_value = "30s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Wait between a parameter request and polling for its reply.
    #[arg(long, default_value = "10ms")]
    pub poll_interval: String,
    /// Give up after this many requests. Default: retry forever.
    #[arg(long)]
    pub max_requests: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub sync: SyncArgs,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    #[command(flatten)]
    pub sync: SyncArgs,
    /// Parameter index.
    pub index: u8,
    /// New value as hex bytes (e.g. 0000803F).
    pub value: String,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn open_radio(link: &LinkArgs) -> CliResult<Arc<Radio>> {
    let port = SerialPortLink::open_with_baud(&link.port, link.baud)
        .map_err(|err| transport_error("open failed", err))?;
    Ok(Arc::new(Radio::new(Arc::new(port))))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
