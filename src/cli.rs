//! Command-line interface definitions and argument parsing

use clap::Parser;

/// RFM customer segmentation and campaign cohort selection
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the customer order CSV file
    #[arg(short, long, default_value = "flo_data_20k.csv")]
    pub input: String,

    /// Output CSV for the premium women's line cohort
    #[arg(long, default_value = "case1_id.csv")]
    pub premium_output: String,

    /// Output CSV for the men's and children's discount cohort
    #[arg(long, default_value = "case2_id.csv")]
    pub discount_output: String,

    /// Number of rows in the top-customer tables
    #[arg(short, long, default_value = "10")]
    pub top: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Reject argument combinations that would lose output
    pub fn validate(&self) -> crate::Result<()> {
        if self.premium_output == self.discount_output {
            anyhow::bail!(
                "Cohort outputs must differ, both are set to '{}'",
                self.premium_output
            );
        }
        if self.top == 0 {
            anyhow::bail!("--top must be at least 1");
        }
        Ok(())
    }
}
