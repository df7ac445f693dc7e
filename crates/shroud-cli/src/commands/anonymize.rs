//! Anonymize command - search for the best transformation and export the release.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use colored::Colorize;
use indexmap::IndexMap;
use shroud::{AnonymizationResult, Anonymizer, DataTable};

use crate::cli::OutputFormat;
use crate::job::Job;

pub fn run(
    data: PathBuf,
    job_path: PathBuf,
    output: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    if !data.exists() {
        return Err(format!("Data file not found: {}", data.display()).into());
    }

    let job = Job::load(&job_path)?;
    let definition = job.definition(&job_path)?;

    println!(
        "{} {}",
        "Anonymizing".cyan().bold(),
        data.display().to_string().white()
    );
    for criterion in &job.config.criteria {
        println!("  {} {}", "•".cyan(), criterion);
    }

    let anonymizer = Anonymizer::with_config(job.config);
    let (result, source) = anonymizer.anonymize_file(&data, &definition)?;
    let stats = &result.statistics;

    let (Some(table), Some(transformation)) = (&result.output, &result.transformation) else {
        println!();
        let (label, reason) = no_solution_reason(&result);
        println!("{} {}", label.yellow().bold(), reason);
        println!(
            "Evaluated {} of {} transformations over {} records.",
            stats.evaluated, stats.nodes, source.row_count
        );
        return Ok(());
    };

    let output_path = output.unwrap_or_else(|| default_output_path(&data, &format));
    write_table(table, &output_path, &format)?;

    println!();
    println!("{}", "Transformation".cyan().bold());
    for (name, level) in result.quasi_identifiers.iter().zip(transformation.levels()) {
        println!("  {:<24} level {}", name, level);
    }
    println!();
    if let Some(loss) = &result.loss {
        println!("{:<22} {} ({})", "Information loss:", loss, result.metric);
    }
    let optimality = if result.optimal {
        "optimal".green()
    } else {
        "best found (search stopped early)".yellow()
    };
    println!("{:<22} {}", "Result:", optimality);
    println!(
        "{:<22} {} of {}",
        "Suppressed records:",
        result.suppressed_records.to_string().white().bold(),
        source.row_count
    );
    println!(
        "{:<22} {} evaluated, {} inferred, {} skipped of {} in {} ms",
        "Search:",
        stats.evaluated,
        stats.inferred_anonymous + stats.inferred_not_anonymous,
        stats.skipped_by_bound,
        stats.nodes,
        stats.elapsed_ms
    );

    if verbose {
        if let Some(summary) = &result.summary {
            println!();
            println!("{}", "Column changes".cyan().bold());
            for change in &summary.changes {
                println!(
                    "  {:<40} {} values changed",
                    change.operation.description(),
                    change.values_changed
                );
            }
        }
    }

    println!();
    if let Some(fingerprint) = &result.fingerprint {
        println!("{:<22} {}", "Fingerprint:", fingerprint.dimmed());
    }
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().cyan()
    );

    Ok(())
}

/// `<data stem>_anonymized.<ext>` next to the input.
/// Heading and explanation for a run that produced no release.
fn no_solution_reason(result: &AnonymizationResult) -> (&'static str, &'static str) {
    if result.is_proven_unsatisfiable() {
        (
            "No solution:",
            "No transformation satisfies the configured criteria.",
        )
    } else {
        (
            "Search stopped early:",
            "No satisfying transformation was found before the search limits were reached.",
        )
    }
}

fn default_output_path(data: &Path, format: &OutputFormat) -> PathBuf {
    let stem = data.file_stem().unwrap_or_default().to_string_lossy();
    data.with_file_name(format!("{}_anonymized.{}", stem, format.extension()))
}

fn write_table(table: &DataTable, path: &Path, format: &OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Tsv | OutputFormat::Csv => {
            let delimiter = if *format == OutputFormat::Tsv { b'\t' } else { b',' };
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_path(path)?;
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let records: Vec<IndexMap<&str, &str>> = table
                .rows
                .iter()
                .map(|row| {
                    table
                        .headers
                        .iter()
                        .map(String::as_str)
                        .zip(row.iter().map(String::as_str))
                        .collect()
                })
                .collect();
            let file = File::create(path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &records)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn table() -> DataTable {
        DataTable::from_records(
            ["age", "disease"],
            vec![vec!["<50", "flu"], vec![">=50", "cold, acute"]],
        )
        .unwrap()
    }

    fn limited_run(max_evaluations: Option<usize>, k: usize) -> AnonymizationResult {
        let age = shroud::Hierarchy::builder()
            .add(["34", "30-39", "*"])
            .add(["38", "30-39", "*"])
            .build()
            .unwrap();
        let table = DataTable::from_records(["age"], vec![vec!["34"], vec!["38"]]).unwrap();
        let mut config = shroud::AnonymizationConfig::new()
            .with_criterion(shroud::PrivacyCriterion::k_anonymity(k))
            .with_strategy(shroud::SearchStrategy::Exhaustive);
        if let Some(limit) = max_evaluations {
            config = config.with_max_evaluations(limit);
        }
        Anonymizer::with_config(config)
            .anonymize(&table, &shroud::DataDefinition::new().with_hierarchy("age", age))
            .unwrap()
    }

    #[test]
    fn test_no_solution_reason_separates_limits_from_proof() {
        let proven = limited_run(None, 3);
        assert!(!proven.is_result_available());
        assert_eq!(no_solution_reason(&proven).0, "No solution:");

        let truncated = limited_run(Some(1), 2);
        assert!(!truncated.is_result_available());
        assert_eq!(no_solution_reason(&truncated).0, "Search stopped early:");
    }

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("/data/patients.tsv"), &OutputFormat::Json);
        assert_eq!(path, PathBuf::from("/data/patients_anonymized.json"));
    }

    #[test]
    fn test_write_delimited() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_table(&table(), &path, &OutputFormat::Csv).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "age,disease\n<50,flu\n>=50,\"cold, acute\"\n");

        let path = dir.path().join("out.tsv");
        write_table(&table(), &path, &OutputFormat::Tsv).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().next(), Some("age\tdisease"));
    }

    #[test]
    fn test_write_json_keeps_column_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_table(&table(), &path, &OutputFormat::Json).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[1]["disease"], "cold, acute");
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.find("\"age\"").unwrap() < raw.find("\"disease\"").unwrap());
    }

    #[test]
    fn test_run_writes_release() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("people.tsv");
        fs::write(&data, "age\tdisease\n34\tflu\n38\tcold\n45\tflu\n47\tcough\n").unwrap();
        fs::write(dir.path().join("age.csv"), "34;30-39;*\n38;30-39;*\n45;40-49;*\n47;40-49;*\n")
            .unwrap();
        let job = dir.path().join("job.json");
        fs::write(
            &job,
            r#"{"attributes": {"age": {"hierarchy": "age.csv"}, "disease": {"type": "sensitive"}},
                "config": {"criteria": [{"type": "k_anonymity", "k": 2}]}}"#,
        )
        .unwrap();

        run(data.clone(), job, None, OutputFormat::Tsv, false).unwrap();
        let written = fs::read_to_string(dir.path().join("people_anonymized.tsv")).unwrap();
        assert_eq!(written, "age\tdisease\n30-39\tflu\n30-39\tcold\n40-49\tflu\n40-49\tcough\n");
    }
}
