use crate::cli::CheckArgs;
use crate::error::Result;
use nexopt::engine::pipeline::Pipeline;
use nexopt::workflows::study::Study;
use tracing::info;

/// Builds the full study (including alias resolution against the forest)
/// with an empty pipeline, so every static error surfaces without running
/// any analysis.
pub fn run(args: CheckArgs) -> Result<()> {
    info!(path = %args.study.display(), "Checking study definition");
    let study = Study::load(&args.study, Pipeline::empty())?;

    println!(
        "{}: ok ({} variables, {} constraints, {} configurations)",
        args.study.display(),
        study.variable_names().len(),
        study.constraint_names().len(),
        study.nexus().forest().tags().len(),
    );
    Ok(())
}
