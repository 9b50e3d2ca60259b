mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "northlink", version, about = "Ground-to-vehicle radio link CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use northlink_radio::{Bandwidth, RadioUri};

    use super::*;

    #[test]
    fn parses_params_subcommand_with_defaults() {
        let cli = Cli::try_parse_from(["northlink", "params", "/dev/ttyUSB0"])
            .expect("params args should parse");

        let Command::Params(args) = cli.command else {
            panic!("expected params subcommand");
        };
        assert_eq!(args.link.port, "/dev/ttyUSB0");
        assert_eq!(args.link.uri, RadioUri::default());
        assert_eq!(args.link.baud, 115_200);
        assert_eq!(args.sync.max_requests, None);
    }

    #[test]
    fn parses_uri_flag() {
        let cli = Cli::try_parse_from([
            "northlink",
            "monitor",
            "COM3",
            "--uri",
            "radio:/0/80/250/E7E7E7E302",
            "--count",
            "3",
        ])
        .expect("monitor args should parse");

        let Command::Monitor(args) = cli.command else {
            panic!("expected monitor subcommand");
        };
        assert_eq!(args.link.uri.channel, 80);
        assert_eq!(args.link.uri.bandwidth, Bandwidth::Kbps250);
        assert_eq!(args.count, Some(3));
    }

    #[test]
    fn rejects_bad_uri() {
        let err = Cli::try_parse_from([
            "northlink",
            "params",
            "/dev/ttyUSB0",
            "--uri",
            "radio:/0/76/300/E7E7E7E301",
        ])
        .expect_err("unsupported bandwidth should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_set_subcommand() {
        let cli = Cli::try_parse_from(["northlink", "set", "/dev/ttyUSB0", "4", "0000803F"])
            .expect("set args should parse");
        let Command::Set(args) = cli.command else {
            panic!("expected set subcommand");
        };
        assert_eq!(args.index, 4);
        assert_eq!(args.value, "0000803F");
    }
}
