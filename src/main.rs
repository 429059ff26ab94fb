use campaign_dashboard::config::DashboardConfig;
use campaign_dashboard::dashboard::{selector_options, DashboardView};
use campaign_dashboard::dataset::Dataset;
use campaign_dashboard::export::export_filtered_csv;
use campaign_dashboard::filter::{FilterSelection, Selection};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "campaign-dashboard")]
#[command(about = "Campaign performance summary from a message-status report")]
#[command(version)]
struct Args {
    /// Campaign report CSV (or set CAMPAIGN_REPORT_PATH)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
struct FilterArgs {
    /// Campaign ID to keep ("All" for every campaign)
    #[arg(long, default_value = "All")]
    campaign_id: String,

    /// Message status to keep ("All" for every status)
    #[arg(long, default_value = "All")]
    message_status: String,

    /// Organization to keep ("All" for every organization)
    #[arg(long, default_value = "All")]
    organization: String,
}

impl FilterArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection::new(
            Selection::parse(&self.campaign_id),
            Selection::parse(&self.message_status),
            Selection::parse(&self.organization),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print counters, funnel and the filtered rows
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List the values each selector offers
    Options,
    /// Write the filtered rows to a CSV file
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Destination CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let mut config = DashboardConfig::from_env()?;
    if let Some(data) = args.data {
        config = config.with_data_path(data);
    }

    let dataset = Dataset::load(&config.data_path)
        .with_context(|| format!("Failed to load campaign report {}", config.data_path.display()))?;

    match args.command {
        Commands::Summary { filters } => {
            let view = DashboardView::build(
                &config.title,
                &dataset,
                &filters.selection(),
                config.table_row_limit,
            )?;
            print!("{}", view.render_text());
        }
        Commands::Options => {
            for selector in selector_options(&dataset)? {
                println!("{} ({})", selector.label, selector.field.column());
                for option in selector.options {
                    println!("  {}", option);
                }
            }
        }
        Commands::Export { filters, output } => {
            let rows = export_filtered_csv(&dataset, &filters.selection(), &output)?;
            info!("Export finished");
            println!("Wrote {} rows to {}", rows, output.display());
        }
    }

    Ok(())
}
