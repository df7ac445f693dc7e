//! Example: Anonymize a small patient table under k-anonymity and t-closeness.
//!
//! Usage:
//!   cargo run --example anonymize

use shroud::{
    AnonymizationConfig, Anonymizer, AttributeType, DataDefinition, DataTable, Hierarchy,
    PrivacyCriterion,
};

fn main() -> shroud::Result<()> {
    let table = DataTable::from_records(
        ["zipcode", "age", "disease"],
        vec![
            vec!["47677", "29", "gastric ulcer"],
            vec!["47602", "22", "gastritis"],
            vec!["47678", "27", "stomach cancer"],
            vec!["47905", "43", "gastritis"],
            vec!["47909", "52", "flu"],
            vec!["47906", "47", "bronchitis"],
            vec!["47605", "30", "bronchitis"],
            vec!["47673", "36", "pneumonia"],
            vec!["47607", "32", "stomach cancer"],
        ],
    )?;

    let mut zipcode = Hierarchy::builder();
    let mut age = Hierarchy::builder();
    for row in &table.rows {
        let zip = &row[0];
        zipcode = zipcode.add([
            zip.clone(),
            format!("{}*", &zip[..4]),
            format!("{}**", &zip[..3]),
            format!("{}***", &zip[..2]),
            "*****".to_string(),
        ]);
        let years: u32 = row[1].parse().unwrap_or_default();
        let band = if years <= 40 { "<=40" } else { ">40" };
        age = age.add([row[1].clone(), band.to_string(), "*".to_string()]);
    }

    let definition = DataDefinition::new()
        .with_hierarchy("zipcode", zipcode.build().map_err(|e| shroud::ShroudError::hierarchy("zipcode", e))?)
        .with_hierarchy("age", age.build().map_err(|e| shroud::ShroudError::hierarchy("age", e))?)
        .with_attribute("disease", AttributeType::Sensitive);

    let config = AnonymizationConfig::new()
        .with_criterion(PrivacyCriterion::k_anonymity(3))
        .with_criterion(PrivacyCriterion::equal_distance_t_closeness(0.6));
    let result = Anonymizer::with_config(config).anonymize(&table, &definition)?;

    let (Some(transformation), Some(output)) = (&result.transformation, &result.output) else {
        println!("No transformation satisfies the criteria.");
        return Ok(());
    };

    println!("Transformation: {}", transformation);
    println!("Loss ({}): {}", result.metric, result.loss.map(|l| l.to_string()).unwrap_or_default());
    println!();
    println!("{}", output.headers.join("\t"));
    for row in &output.rows {
        println!("{}", row.join("\t"));
    }
    println!();
    println!(
        "Evaluated {} of {} transformations, {} inferred",
        result.statistics.evaluated,
        result.statistics.nodes,
        result.statistics.inferred_anonymous + result.statistics.inferred_not_anonymous
    );

    Ok(())
}
