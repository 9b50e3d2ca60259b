use northlink_cmd::{Commander, CommanderConfig, ParamTable};

use crate::cmd::{open_radio, parse_duration, LinkArgs, ParamsArgs, SyncArgs};
use crate::exit::{command_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_params, OutputFormat};

pub fn run(args: ParamsArgs, format: OutputFormat) -> CliResult<i32> {
    let cmd = connect(&args.link, &args.sync)?;
    let report = cmd
        .synchronize()
        .map_err(|err| command_error("synchronize failed", err))?;

    cmd.with_table(|table| print_params(table.entries(), &report, format));
    cmd.radio().close();
    Ok(SUCCESS)
}

/// Open the port, register the vehicle pipe and complete the handshake.
pub fn connect(link: &LinkArgs, sync: &SyncArgs) -> CliResult<Commander<ParamTable>> {
    let timeout = parse_duration(&link.timeout)?;
    let config = CommanderConfig {
        poll_interval: parse_duration(&sync.poll_interval)?,
        connect_timeout: timeout,
        max_requests: sync.max_requests,
        ..CommanderConfig::default()
    };

    let radio = open_radio(link)?;
    let cmd = Commander::with_store(radio, &link.uri, ParamTable::new(), config)
        .map_err(|err| command_error("pipe setup failed", err))?;
    cmd.connect_default()
        .map_err(|err| command_error("connect failed", err))?;
    if !cmd.is_connected() {
        cmd.radio().close();
        return Err(CliError::new(
            TIMEOUT,
            format!("no answer from dongle on {} within {timeout:?}", link.port),
        ));
    }
    Ok(cmd)
}
