use std::fs::File;
use std::io::Write;
use std::time::Duration;

use limero_msg::{DeviceAgent, DeviceConfig, Link, LinkConfig, StaticTable};
use limero_serial::FrameWriter;
use tracing::{debug, info};

use crate::cmd::DeviceArgs;
use crate::exit::{io_error, msg_error, serial_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: DeviceArgs) -> CliResult<i32> {
    let text = std::fs::read_to_string(&args.config).map_err(|err| io_error("read config failed", err))?;
    let config = DeviceConfig::from_json(&text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid device config: {err}")))?;
    let mut agent = DeviceAgent::new(StaticTable::from(config));
    info!(src = %format!("0x{:08X}", agent.src()), "device started");

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).map_err(|err| io_error("open output failed", err))?),
        None => Box::new(std::io::stdout().lock()),
    };
    let link_config = LinkConfig::symmetric(args.max_frame);

    if args.hex {
        let mut link = Link::new(link_config);
        for _ in 0..args.cycles {
            let frame = agent
                .next_frame(&mut link)
                .map_err(|err| msg_error("encode failed", err))?;
            writeln!(out, "{}", hex::encode(frame)).map_err(|err| io_error("write failed", err))?;
            pause(args.interval_ms);
        }
        out.flush().map_err(|err| io_error("flush failed", err))?;
        return Ok(SUCCESS);
    }

    let mut writer = FrameWriter::with_config(out, link_config);
    for _ in 0..args.cycles {
        let msg = writer
            .send_next(&mut agent)
            .map_err(|err| serial_error("send failed", err))?;
        debug!(kind = %msg.kind(), "frame written");
        pause(args.interval_ms);
    }
    Ok(SUCCESS)
}

fn pause(interval_ms: u64) {
    if interval_ms > 0 {
        std::thread::sleep(Duration::from_millis(interval_ms));
    }
}
