use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("bridgewire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: bridgewire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("BRIDGEWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("transport: loopback-tcp");
    println!(
        "default_base_port: {}",
        bridgewire_transport::DEFAULT_BASE_PORT
    );
    println!(
        "max_frame_payload: {}",
        bridgewire_frame::DEFAULT_MAX_PAYLOAD
    );

    Ok(SUCCESS)
}
