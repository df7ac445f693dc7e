//! Check command - validate a job against the data and describe the search space.

use std::error::Error;
use std::path::PathBuf;

use colored::Colorize;
use shroud::{Anonymizer, AttributeType, Parser};

use crate::job::Job;

pub fn run(data: PathBuf, job_path: PathBuf, json_output: bool) -> Result<(), Box<dyn Error>> {
    if !data.exists() {
        return Err(format!("Data file not found: {}", data.display()).into());
    }

    let job = Job::load(&job_path)?;
    let definition = job.definition(&job_path)?;
    let (table, source) = Parser::new().parse_file(&data)?;

    let anonymizer = Anonymizer::with_config(job.config);
    let plan = anonymizer.plan(&table, &definition)?;
    let config = anonymizer.config();

    if json_output {
        let status = serde_json::json!({
            "file": source.path,
            "format": source.format,
            "plan": plan,
            "criteria": config.criteria.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "metric": config.metric,
            "strategy": config.search.strategy,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {} ({}, {} records)",
        "Job is valid for".green().bold(),
        data.display().to_string().white(),
        source.format,
        plan.records
    );
    println!();

    println!("{}", "Attributes".cyan().bold());
    for attribute in &plan.attributes {
        let role = match attribute.role {
            AttributeType::Identifying => attribute.role.label().red(),
            AttributeType::QuasiIdentifying => attribute.role.label().yellow(),
            AttributeType::Sensitive => attribute.role.label().magenta(),
            AttributeType::Insensitive => attribute.role.label().normal(),
        };
        match attribute.height {
            Some(height) => println!("  {:<24} {:<18} height {}", attribute.name, role, height),
            None => println!("  {:<24} {}", attribute.name, role),
        }
    }
    println!();

    println!("{}", "Criteria".cyan().bold());
    for criterion in &config.criteria {
        println!("  {} {}", "•".cyan(), criterion);
    }
    println!();

    println!("{:<22} {}", "Lattice size:", plan.lattice_size.to_string().white().bold());
    println!("{:<22} {} records", "Outlier budget:", plan.outlier_budget);
    println!("{:<22} {}", "Metric:", config.metric);

    Ok(())
}
