//! Output formatting module

use dishfill_domain::EstimationTables;
use dishfill_types::{Compartment, EstimateResponse, FillEstimate, OutputFormat, Result};
use serde::Serialize;

/// JSON body: the wire response at top level, audit detail beside it
#[derive(Serialize)]
struct EstimateOutput<'a> {
    #[serde(flatten)]
    response: EstimateResponse,
    detail: &'a FillEstimate,
}

pub fn estimate_json(estimate: &FillEstimate) -> Result<String> {
    let output = EstimateOutput {
        response: estimate.to_response(),
        detail: estimate,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn output_estimate(
    output_format: OutputFormat,
    estimate: &FillEstimate,
    tables: &EstimationTables,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", estimate_json(estimate)?);
        return Ok(());
    }

    // Table format
    println!("\nFill Estimate");
    println!("=============");
    println!(
        "{:<8} {:>6} {:>9} {:>10} {:>9}",
        "Section", "Items", "Capacity", "Remaining", "Fill"
    );
    for compartment in Compartment::ALL {
        println!(
            "{:<8} {:>6} {:>9} {:>10} {:>8.2}%",
            compartment.label(),
            estimate.counts.get(compartment),
            tables.capacity.capacity_of(compartment),
            estimate.remaining.get(compartment),
            estimate.per_compartment.get(compartment),
        );
    }
    println!("-----------------------------------------------");

    println!(
        "Overall:         {:.2}% ({})",
        estimate.fill_percentage(),
        estimate.level().label()
    );
    if estimate.is_overfilled() {
        println!("Warning:         more items than slots in at least one section");
    }
    if estimate.unclassified > 0 {
        println!("Unclassified:    {} item(s) ignored", estimate.unclassified);
    }
    println!("Source:          {}", estimate.source.label());
    if let dishfill_types::EstimateSource::Fallback { ref reason } = estimate.source {
        println!("Fallback reason: {}", reason);
    }

    if let Some(ref suggestion) = estimate.suggestion {
        println!("\nSuggestion:");
        println!("{}", suggestion);
    }

    Ok(())
}

pub fn output_classification(
    output_format: OutputFormat,
    label: &str,
    compartment: Option<Compartment>,
    tables: &EstimationTables,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(&serde_json::json!({
            "label": label,
            "compartment": compartment,
        }))?;
        println!("{}", content);
        return Ok(());
    }

    match compartment {
        Some(compartment) => {
            println!("{} -> {} ({})", label, compartment.label(), compartment.contents());
            println!(
                "Labels in this section: {}",
                tables.classification.labels_of(compartment).join(", ")
            );
        }
        None => println!("{} -> unclassified (ignored when estimating)", label),
    }

    Ok(())
}
