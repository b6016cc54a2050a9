//! rfmforge: RFM segmentation and campaign cohort CLI
//!
//! This is the main entrypoint that orchestrates record loading, feature
//! derivation, segmentation, reporting and cohort export.

use anyhow::Result;
use clap::Parser;
use rfmforge::{
    derive_features, load_records, report, segment_customers, write_ids, Args, Campaign,
};
use std::time::Instant;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    args.validate()?;

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.verbose {
        println!("rfmforge - RFM Customer Segmentation");
        println!("====================================\n");
    }

    run_pipeline(&args)
}

/// Run the full segmentation pipeline
fn run_pipeline(args: &Args) -> Result<()> {
    println!("=== Segmentation Pipeline ===\n");

    let start_time = Instant::now();

    // Step 1: Load and type records
    if args.verbose {
        println!("Step 1: Loading order records");
        println!("  Input file: {}", args.input);
    }

    let data_start = Instant::now();
    let raw = load_records(&args.input)?;
    let records = derive_features(&raw)?;
    let data_time = data_start.elapsed();

    println!("✓ Records loaded: {}", records.len());
    if args.verbose {
        println!("  Processing time: {:.2}s", data_time.as_secs_f64());
    }

    report::print_overview(&records, args.top)?;

    // Step 2: Aggregate, score and classify
    if args.verbose {
        println!("\nStep 2: Scoring customers into RFM segments");
    }

    let segment_start = Instant::now();
    let segmentation = segment_customers(&records)?;
    let segment_time = segment_start.elapsed();

    println!("\n✓ Customers segmented: {}", segmentation.customers.len());
    if args.verbose {
        println!("  Analysis date: {}", segmentation.analysis_date);
        println!("  Scoring time: {:.2}s", segment_time.as_secs_f64());
    }

    report::print_segment_profiles(&segmentation)?;

    // Step 3: Select and export campaign cohorts
    if args.verbose {
        println!("\nStep 3: Selecting campaign cohorts");
    }

    let campaigns = [
        (Campaign::premium_womens(), &args.premium_output),
        (Campaign::discount_mens_kids(), &args.discount_output),
    ];

    println!("\n=== Campaign Cohorts ===");
    for (campaign, output) in &campaigns {
        let ids = campaign.select(&segmentation.customers, &records);
        write_ids(&ids, output)?;
        println!(
            "{}: {} customers saved to {}",
            campaign.name,
            ids.len(),
            output
        );
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}
