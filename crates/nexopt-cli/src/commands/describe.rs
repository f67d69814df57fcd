use crate::cli::DescribeArgs;
use crate::error::Result;
use nexopt::core::io::definition::StudyFile;
use nexopt::workflows::study::StudyError;
use tracing::info;

pub fn run(args: DescribeArgs) -> Result<()> {
    info!(path = %args.study.display(), "Describing study definition");
    let file = StudyFile::load(&args.study).map_err(StudyError::from)?;
    print!("{}", render(&file));
    Ok(())
}

fn render(file: &StudyFile) -> String {
    let mut out = String::new();

    out.push_str(&format!("Study: {}\n", file.study.name));
    if let Some(description) = &file.study.description {
        out.push_str(&format!("  {description}\n"));
    }

    out.push_str("\nVariables:\n");
    out.push_str(&format!(
        "  {:<20} {:>10} {:>10} {:>10} {:>8} {:>6}\n",
        "name", "initial", "lower", "upper", "scale", "units"
    ));
    for row in &file.variables {
        out.push_str(&format!(
            "  {:<20} {:>10} {:>10} {:>10} {:>8} {:>6}\n",
            row.name, row.initial, row.lower, row.upper, row.scale, row.units
        ));
    }

    out.push_str(&format!(
        "\nObjective:\n  {} (scale {}, units {})\n",
        file.objective.name, file.objective.scale, file.objective.units
    ));

    out.push_str("\nConstraints:\n");
    for row in &file.constraints {
        out.push_str(&format!(
            "  {:<20} {} {} {} (scale {})\n",
            row.name, row.sense, row.edge, row.units, row.scale
        ));
    }

    out.push_str("\nAliases:\n");
    for row in &file.aliases {
        out.push_str(&format!("  {:<20} -> {}\n", row.name, row.targets.join(", ")));
    }

    out.push_str(&format!(
        "\nConfigurations: {}",
        file.configuration.base
    ));
    for tag in file.configuration.derived.keys() {
        out.push_str(&format!(", {tag}"));
    }
    out.push('\n');

    out
}
