use silt_netlist::Design;
use silt_utils::{OutputFile, SiltResult};

/// All backends must implement this trait.
/// `Backend::validate` returns `Ok(())` when the design is in the form the
/// backend expects, and `Backend::emit` converts the design to the target
/// language. `Backend::run` is the composition of the two.
pub trait Backend {
    fn name(&self) -> &'static str;
    fn validate(design: &Design) -> SiltResult<()>;
    fn emit(design: &Design, file: &mut OutputFile) -> SiltResult<()>;
    fn run(&self, design: &Design, mut file: OutputFile) -> SiltResult<()> {
        Self::validate(design)?;
        Self::emit(design, &mut file)
    }
}
