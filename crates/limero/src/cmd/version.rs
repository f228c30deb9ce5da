use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("limero {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: limero");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("LIMERO_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("LIMERO_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("max_frame_default: {}", limero_codec::DEFAULT_MAX_FRAME);
    println!("checksum: crc16-ccitt-false");

    Ok(SUCCESS)
}
