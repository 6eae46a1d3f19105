use anyhow::Result;
use clap::Parser;
use hcp_scorecard::cli::{Cli, Commands};
use hcp_scorecard::{init_with, utils, MCPServer, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::new()?,
    };

    // stdout belongs to the MCP protocol; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    init_with(&settings)?;

    let result = match cli.command {
        Commands::Serve => handle_serve().await,
        Commands::Revenue { weeks_back } => handle_revenue(weeks_back).await,
        Commands::Pipeline => handle_pipeline().await,
        Commands::CloseRate { days_back } => handle_close_rate(days_back).await,
        Commands::Scheduled { days_forward } => handle_scheduled(days_forward).await,
        Commands::Scorecard => handle_scorecard().await,
        Commands::Tools => handle_tools(),
    };

    if let Err(e) = &result {
        utils::print_error(&format!("Error: {}", e));
    }

    result
}

async fn handle_serve() -> Result<()> {
    let server = MCPServer::new(hcp_scorecard::registry()?);
    server.serve_stdio().await
}

async fn handle_revenue(weeks_back: u32) -> Result<()> {
    utils::print_info("Fetching completed jobs...");
    let metric = hcp_scorecard::get_weekly_revenue(weeks_back).await?;

    utils::print_header(&format!(
        "Revenue {} .. {}",
        metric.window.start.date(),
        metric.window.end.date()
    ));
    utils::print_metric("Total revenue", metric.total);
    utils::print_metric("Completed jobs", metric.count);
    utils::print_truncation_warning(metric.truncated);
    Ok(())
}

async fn handle_pipeline() -> Result<()> {
    utils::print_info("Fetching pending estimates...");
    let metric = hcp_scorecard::get_pipeline_value().await?;

    utils::print_header("Sales Pipeline");
    utils::print_metric("Pipeline value", metric.total);
    utils::print_metric("Pending estimates", metric.count);
    utils::print_truncation_warning(metric.truncated);
    Ok(())
}

async fn handle_close_rate(days_back: u32) -> Result<()> {
    utils::print_info("Fetching won and lost estimates...");
    let metric = hcp_scorecard::get_close_rate(days_back).await?;

    utils::print_header(&format!("Close Rate ({} days)", metric.period_days));
    utils::print_metric("Close rate", format!("{:.1}%", metric.rate_percent));
    utils::print_metric("Won", format!("{} ({})", metric.won_count, metric.won_value));
    utils::print_metric("Lost", format!("{} ({})", metric.lost_count, metric.lost_value));
    utils::print_truncation_warning(metric.truncated);
    Ok(())
}

async fn handle_scheduled(days_forward: u32) -> Result<()> {
    utils::print_info("Fetching scheduled jobs...");
    let metric = hcp_scorecard::get_scheduled_jobs(days_forward).await?;

    utils::print_header(&format!("Scheduled Jobs (next {} days)", metric.period_days));
    utils::print_metric("Scheduled value", metric.total);
    utils::print_metric("Scheduled jobs", metric.count);
    utils::print_truncation_warning(metric.truncated);
    Ok(())
}

async fn handle_scorecard() -> Result<()> {
    utils::print_info("Building scorecard...");
    let report = hcp_scorecard::get_scorecard_metrics().await?;

    utils::print_header(&format!("Scorecard '{}'", report.profile));
    utils::print_metric("Generated at", report.generated_at.format("%Y-%m-%d %H:%M:%S"));
    utils::print_metric("This week revenue", format!("{} ({} jobs)", report.this_week_revenue, report.this_week_jobs));
    utils::print_metric("Last week revenue", format!("{} ({} jobs)", report.last_week_revenue, report.last_week_jobs));
    utils::print_metric("Pipeline", format!("{} ({} estimates)", report.pipeline_value, report.pipeline_count));
    utils::print_metric(
        &format!("Close rate {}d", report.close_rate_days),
        format!("{:.1}% ({} won / {} lost)", report.close_rate_percent, report.won_count, report.lost_count),
    );
    utils::print_metric(
        &format!("Scheduled {}d", report.scheduled_days),
        format!("{} ({} jobs)", report.scheduled_value, report.scheduled_jobs),
    );
    utils::print_truncation_warning(report.truncated);
    Ok(())
}

fn handle_tools() -> Result<()> {
    let registry = hcp_scorecard::registry()?;
    utils::print_header("Available Tools");
    println!("{}", registry.tools_description());
    utils::print_success(&format!("\n{} tools available", registry.tool_names().len()));
    Ok(())
}
