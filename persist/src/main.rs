use std::path::PathBuf;

use color_eyre::eyre::Result;
use postform::Logger;
use postform_persist::{FileLogger, FileSource};
use structopt::StructOpt;

/// Writes a set of demo postform records to a binary log file. The file can
/// later be expanded into text against this binary's ELF.
#[derive(Debug, StructOpt)]
struct Opts {
    /// Path of the binary log file to write.
    #[structopt(name = "OUTPUT", parse(from_os_str))]
    output: PathBuf,
}

postform::postform_config!(timestamp_frequency: 1_000_000);

postform::timestamp!({
    use std::time::{SystemTime, UNIX_EPOCH};
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_micros() as u64,
        Err(_) => 0,
    }
});

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let opts = Opts::from_args();
    let logger: FileLogger = Logger::new(FileSource::create(&opts.output)?);
    log::info!("writing demo records to {}", opts.output.display());

    let variant = postform::intern!("host-demo");
    postform::debug!(logger, "starting up");
    postform::info!(logger, "build variant %k", variant);
    postform::info!(logger, "battery at %u mV after %d minutes", 3742u32, -5i32);
    postform::warning!(
        logger,
        "sensor %s returned %hhd (raw %hx)",
        "bmp280",
        -1i8,
        0x7ffei16
    );
    postform::error!(logger, "stale handle at %p", &opts);
    postform::info!(logger, "done, %llu ticks elapsed", u64::MAX);

    Ok(())
}
