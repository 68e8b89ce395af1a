//! Driver for the Silt command line.
use crate::cmdline::Opts;
use silt_utils::{Error, Id, SiltResult};
use std::fs::File;
use std::io::{self, BufReader};

/// Run the toolchain from the command line.
pub fn run_compiler() -> SiltResult<()> {
    let opts = Opts::get_opts();

    // enable tracing
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(opts.log_level)
        .target(env_logger::Target::Stderr)
        .init();

    let mut design = match &opts.file {
        Some(path) => {
            let file = File::open(path).map_err(|err| {
                Error::invalid_file(format!("{}: {}", path.display(), err))
            })?;
            silt_frontend::read_design(BufReader::new(file))?
        }
        None => silt_frontend::read_design(io::stdin().lock())?,
    };

    if let Some(top) = &opts.toplevel {
        let name = Id::new(top);
        if design.module(name).is_some() {
            design.set_top(name);
        } else {
            log::warn!("Toplevel module {} not found in design", top);
        }
    }

    opts.run_backend(&design)
}
