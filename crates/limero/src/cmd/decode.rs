use limero_codec::TERMINATOR;
use limero_msg::{Link, LinkConfig};
use tracing::warn;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = match (&args.hex, &args.file) {
        (Some(text), _) => parse_hex(text)?,
        (None, Some(path)) => std::fs::read(path).map_err(|err| io_error("read failed", err))?,
        (None, None) => return Err(CliError::usage("one of --hex or --file is required")),
    };

    let mut link = Link::new(LinkConfig::symmetric(args.max_frame));
    let mut failed = 0usize;
    let mut frame_len = 0usize;

    // end of input closes a trailing unterminated frame
    for byte in bytes.iter().copied().chain(std::iter::once(TERMINATOR)) {
        frame_len += 1;
        match link.accept_byte(byte) {
            Ok(state) if state.is_complete() => {
                match link.take_message() {
                    Ok(msg) => print_message(&msg, frame_len, None, format),
                    Err(err) => {
                        warn!(error = %err, class = %err.class(), "frame rejected");
                        failed += 1;
                    }
                }
                frame_len = 0;
            }
            Ok(_) if byte == TERMINATOR => frame_len = 0,
            Ok(_) => {}
            Err(_) if byte == TERMINATOR => {
                warn!(max = args.max_frame, "frame exceeds receive buffer");
                failed += 1;
                frame_len = 0;
                link.reset();
            }
            Err(_) => {}
        }
    }

    if failed > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{failed} frame(s) could not be decoded"),
        ));
    }
    Ok(SUCCESS)
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| CliError::usage(format!("invalid --hex input: {err}")))
}
