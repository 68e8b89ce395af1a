use argh::FromArgs;
use itertools::Itertools;
use silt_backend::{Backend, FirrtlBackend};
use silt_netlist::Design;
use silt_utils::{OutputFile, SiltResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(FromArgs)]
/// The Silt netlist toolchain.
///
/// Reads an elaborated netlist in the JSON interchange format and hands it
/// to the selected backend. The FIRRTL backend expects priority muxes to
/// have been rewritten into balanced binary mux trees by the producing
/// tool's pmuxtree transformation.
pub struct Opts {
    /// input netlist in the JSON interchange format; stdin when omitted
    #[argh(positional, from_str_fn(read_path))]
    pub file: Option<PathBuf>,

    /// output file; stdout when omitted
    #[argh(option, short = 'o', default = "OutputFile::default()")]
    pub output: OutputFile,

    /// select a backend
    #[argh(option, short = 'b', default = "BackendOpt::default()")]
    pub backend: BackendOpt,

    /// toplevel module override
    #[argh(option, short = 't')]
    pub toplevel: Option<String>,

    /// logging level
    #[argh(option, long = "log-level", default = "log::LevelFilter::Warn")]
    pub log_level: log::LevelFilter,
}

fn read_path(path: &str) -> Result<PathBuf, String> {
    Ok(Path::new(path).into())
}

/// Enumeration of valid backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendOpt {
    #[default]
    Firrtl,
    None,
}

/// The mapping from command-line names to backends.
fn backends() -> Vec<(&'static str, BackendOpt)> {
    vec![("firrtl", BackendOpt::Firrtl), ("none", BackendOpt::None)]
}

impl FromStr for BackendOpt {
    type Err = String;
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let backends = backends();
        match backends.iter().find(|(name, _)| *name == input) {
            Some((_, opt)) => Ok(*opt),
            None => {
                let known = backends.iter().map(|(name, _)| *name).join(", ");
                Err(format!(
                    "`{}` is not a valid backend.\nValid backends: {}",
                    input, known
                ))
            }
        }
    }
}

impl fmt::Display for BackendOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Firrtl => "firrtl",
            Self::None => "none",
        })
    }
}

impl Opts {
    /// Run the backend selected by `-b` over the design.
    pub fn run_backend(self, design: &Design) -> SiltResult<()> {
        match self.backend {
            BackendOpt::Firrtl => FirrtlBackend.run(design, self.output),
            BackendOpt::None => Ok(()),
        }
    }

    /// The current set of options from the command-line invocation.
    pub fn get_opts() -> Opts {
        argh::from_env()
    }
}
