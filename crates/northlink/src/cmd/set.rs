use std::time::{Duration, Instant};

use crate::cmd::params::connect;
use crate::cmd::SetArgs;
use crate::exit::{command_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};

const SEND_WAIT: Duration = Duration::from_secs(2);

pub fn run(args: SetArgs) -> CliResult<i32> {
    let value = parse_hex(&args.value)?;
    let cmd = connect(&args.link, &args.sync)?;
    cmd.synchronize()
        .map_err(|err| command_error("synchronize failed", err))?;

    let sent_before = cmd.radio().stats().frames_sent;
    cmd.push_param(args.index, &value)
        .map_err(|err| command_error("set failed", err))?;

    let start = Instant::now();
    while cmd.radio().stats().frames_sent <= sent_before {
        if start.elapsed() >= SEND_WAIT {
            cmd.radio().close();
            return Err(CliError::new(FAILURE, "set message was not transmitted"));
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    cmd.radio().close();
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits = input.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CliError::new(USAGE, format!("invalid hex value: {input}")));
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex value: {input}")))
        })
        .collect()
}
