use gas_monitor_lib::error::AnalyticsError;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub struct ConfigOptions {
    #[structopt(
        long = "config",
        default_value = "config-analytics.toml",
        help = "Path to the TOML configuration file"
    )]
    pub config: String,
}

#[derive(Debug, StructOpt)]
pub struct UpdateChainMetricsOptions {
    #[structopt(flatten)]
    pub common: ConfigOptions,

    #[structopt(
        long = "chain-id",
        help = "Business chain id to recompute derived metrics for"
    )]
    pub chain_id: String,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "gas_monitor",
    about = "Analytics backend for blockchain gas usage monitoring"
)]
pub enum CliOptions {
    /// Run migrations, provision indexes and start the HTTP server.
    #[structopt(name = "serve")]
    Serve(ConfigOptions),
    /// Apply the analytics index set to an existing database.
    #[structopt(name = "provision-indexes")]
    ProvisionIndexes(ConfigOptions),
    /// Recompute one chain's derived metrics from its transactions.
    #[structopt(name = "update-chain-metrics")]
    UpdateChainMetrics(UpdateChainMetricsOptions),
    /// Insert a small demo dataset for local development.
    #[structopt(name = "seed-demo")]
    SeedDemo(ConfigOptions),
}

pub fn validated_cli() -> Result<CliOptions, AnalyticsError> {
    let opt = CliOptions::from_args();
    if let CliOptions::UpdateChainMetrics(options) = &opt {
        if options.chain_id.is_empty() {
            return Err(AnalyticsError::OtherError(
                "No chain id specified".to_string(),
            ));
        }
    }
    Ok(opt)
}
