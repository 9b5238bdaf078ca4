use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::process::ExitCode;
use uxlens_lib::analysis::comparison::build_local_comparison;
use uxlens_lib::analysis::format::{format_delta, format_value};
use uxlens_lib::analysis::headline::summarize;
use uxlens_lib::analysis::issues::filter_by_priority;
use uxlens_lib::analysis::normalize;
use uxlens_lib::commands::api::ApiClient;
use uxlens_lib::commands::compare::{fetch_version_entities, CompareOutcome, ComparisonSession};
use uxlens_lib::commands::settings::{get_settings, load_effective_settings, ComparisonSettings};
use uxlens_lib::commands::versions::VersionsProvider;
use uxlens_lib::models::alert::AlertRecord;
use uxlens_lib::models::cohort::CohortDiffRow;
use uxlens_lib::models::comparison::ComparisonView;
use uxlens_lib::models::diff::MetricKind;
use uxlens_lib::models::issue::IssueDiffRow;
use uxlens_lib::models::page::PageDiffRow;
use uxlens_lib::models::split::SplitRow;
use uxlens_lib::models::version::VersionPair;

/// Compare analyzed product versions from the UX analytics backend
#[derive(Parser, Debug)]
#[command(name = "uxlens", version, about)]
struct Cli {
    /// Directory holding `.uxlens/settings.json`
    #[arg(long, global = true, default_value = ".", env = "UXLENS_CONFIG_DIR")]
    config_dir: String,

    /// Backend base URL; overrides `apiBaseUrl` from settings
    #[arg(long, global = true, env = "UXLENS_API_BASE")]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List analyzed versions
    Versions {
        #[arg(long)]
        json: bool,
    },
    /// Compare two versions (defaults to oldest vs newest)
    Compare(CompareArgs),
    /// List detected issues
    Issues(IssuesArgs),
    /// Print the effective settings file
    Settings,
    /// Print a raw backend resource as JSON
    Fetch {
        #[command(subcommand)]
        resource: Resource,
    },
}

#[derive(Subcommand, Debug)]
enum Resource {
    Dashboard,
    DailyStats {
        #[arg(long)]
        version: i64,
    },
    Cohorts {
        #[arg(long)]
        version: i64,
    },
    Pages {
        #[arg(long)]
        version: Option<i64>,
    },
    Paths {
        #[arg(long)]
        version: Option<i64>,
    },
    IssueHistory {
        #[arg(long)]
        issue_type: Option<String>,
    },
    Funnels {
        #[arg(long)]
        version: i64,
    },
    Funnel {
        #[arg(long)]
        id: i64,
        /// Per-cohort breakdown instead of the funnel itself
        #[arg(long)]
        by_cohorts: bool,
    },
    /// Create a funnel from a JSON definition
    CreateFunnel {
        #[arg(long)]
        definition: String,
    },
    Goals,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Baseline version id
    #[arg(long)]
    v1: Option<i64>,

    /// Candidate version id
    #[arg(long)]
    v2: Option<i64>,

    /// Diff the per-version lists locally instead of using `/compare/`
    #[arg(long)]
    local: bool,

    /// Rows kept per table
    #[arg(long)]
    top: Option<usize>,

    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct IssuesArgs {
    #[arg(long)]
    version: Option<i64>,

    /// P0, P1, P2 or `all`
    #[arg(long)]
    priority: Option<String>,

    #[arg(long)]
    issue_type: Option<String>,

    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut settings = load_effective_settings(&cli.config_dir)?;
    if let Some(base) = cli.api_base {
        settings.api_base_url = base;
    }

    match cli.command {
        Command::Versions { json } => list_versions(&settings, json).await,
        Command::Compare(args) => compare(settings, args).await,
        Command::Issues(args) => list_issues(&settings, args).await,
        Command::Settings => {
            let raw = get_settings(&cli.config_dir)?;
            print_json(&raw)
        }
        Command::Fetch { resource } => fetch(&settings, resource).await,
    }
}

async fn fetch(settings: &ComparisonSettings, resource: Resource) -> Result<(), String> {
    let client = client_for(settings)?;
    let version_param = |version: Option<i64>| [("version", version.map(|v| v.to_string()).unwrap_or_default())];

    let value = match resource {
        Resource::Dashboard => client.get_dashboard().await.map_err(|e| e.to_string())?,
        Resource::DailyStats { version } => Value::Array(client.get_daily_stats(version).await.map_err(|e| e.to_string())?),
        Resource::Cohorts { version } => Value::Array(client.get_cohorts(version).await.map_err(|e| e.to_string())?),
        Resource::Pages { version } => client.get_pages(&version_param(version)).await.map_err(|e| e.to_string())?,
        Resource::Paths { version } => client.get_paths(&version_param(version)).await.map_err(|e| e.to_string())?,
        Resource::IssueHistory { issue_type } => client
            .get_issue_history(&[("issue_type", issue_type.unwrap_or_default())])
            .await
            .map_err(|e| e.to_string())?,
        Resource::Funnels { version } => Value::Array(client.get_funnels(version).await.map_err(|e| e.to_string())?),
        Resource::Funnel { id, by_cohorts: false } => client.get_funnel_detail(id).await.map_err(|e| e.to_string())?,
        Resource::Funnel { id, by_cohorts: true } => client
            .get_funnel_by_cohorts(id)
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or(Value::Null),
        Resource::CreateFunnel { definition } => {
            let body: Value = serde_json::from_str(&definition)
                .map_err(|e| format!("Invalid funnel definition: {}", e))?;
            client.create_funnel(&body).await.map_err(|e| e.to_string())?
        }
        Resource::Goals => Value::Array(client.get_goals().await.map_err(|e| e.to_string())?),
    };
    print_json(&value)
}

fn client_for(settings: &ComparisonSettings) -> Result<ApiClient, String> {
    ApiClient::from_settings(settings).map_err(|e| e.to_string())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {}", e))?;
    println!("{raw}");
    Ok(())
}

async fn list_versions(settings: &ComparisonSettings, json: bool) -> Result<(), String> {
    let provider = VersionsProvider::new(client_for(settings)?);
    let state = provider.initialize().await;
    if let Some(error) = state.error {
        return Err(error);
    }

    if json {
        return print_json(&state.versions);
    }
    let latest = provider.latest().await.map(|v| v.id);
    for version in &state.versions {
        let marker = if Some(version.id) == latest { "*" } else { " " };
        println!("{} {:>6}  {}", marker, version.id, version.name);
    }
    Ok(())
}

async fn compare(mut settings: ComparisonSettings, args: CompareArgs) -> Result<(), String> {
    if let Some(top) = args.top {
        settings.thresholds.top_n = top.max(1);
    }
    let json = args.json || settings.output_format == "json";
    let client = client_for(&settings)?;

    let provider = VersionsProvider::new(client.clone());
    let versions = provider.initialize().await;
    let pair = match (args.v1, args.v2) {
        (Some(v1), Some(v2)) => VersionPair { v1, v2 },
        _ => {
            if let Some(error) = versions.error {
                return Err(error);
            }
            provider
                .default_pair()
                .await
                .ok_or_else(|| "Need at least two versions to compare".to_string())?
        }
    };
    let name_a = provider.display_name(pair.v1).await;
    let name_b = provider.display_name(pair.v2).await;

    if args.local {
        let (entities_a, entities_b) = tokio::try_join!(
            fetch_version_entities(&client, pair.v1),
            fetch_version_entities(&client, pair.v2),
        )?;
        let local = build_local_comparison(&entities_a, &entities_b, &settings.thresholds);
        if json {
            return print_json(&local);
        }
        println!("{name_a} -> {name_b} (local diff)");
        print_issues(&local.issues);
        print_pages(&local.pages);
        print_cohorts(&local.cohorts);
        print_alerts(&local.alerts);
        return Ok(());
    }

    let session = ComparisonSession::new(settings.thresholds);
    match session.compare(&client, pair.v1, pair.v2).await {
        CompareOutcome::Applied(view) if json => print_json(view.as_ref()),
        CompareOutcome::Applied(view) => {
            print_view(&view, &name_a, &name_b);
            println!("(top {} rows per table)", session.thresholds().top_n);
            Ok(())
        }
        CompareOutcome::Superseded => Ok(()),
        CompareOutcome::Failed(e) => Err(e),
    }
}

async fn list_issues(settings: &ComparisonSettings, args: IssuesArgs) -> Result<(), String> {
    let client = client_for(settings)?;
    let params = [
        ("version", args.version.map(|v| v.to_string()).unwrap_or_default()),
        ("issue_type", args.issue_type.unwrap_or_default()),
    ];
    let raw = client.get_issues(&params).await.map_err(|e| e.to_string())?;

    let mut issues = filter_by_priority(&normalize::issues(&raw), args.priority.as_deref());
    issues.sort_by(|a, b| {
        a.effective_severity()
            .rank()
            .cmp(&b.effective_severity().rank())
            .then_with(|| b.impact_score.total_cmp(&a.impact_score))
    });

    if args.json {
        return print_json(&issues);
    }
    for issue in &issues {
        println!(
            "{:<8} {:<4} {:<18} {:>7.2}  {}",
            issue.effective_severity().as_str(),
            issue.priority.as_deref().unwrap_or("-"),
            issue.issue_type,
            issue.impact_score,
            issue.location_url
        );
    }
    Ok(())
}

fn print_view(view: &ComparisonView, name_a: &str, name_b: &str) {
    let name_a = view.v1.as_ref().map(|v| v.name.as_str()).unwrap_or(name_a);
    let name_b = view.v2.as_ref().map(|v| v.name.as_str()).unwrap_or(name_b);

    println!("{name_a} -> {name_b}");
    let headline = [
        ("visits", view.stats_v1.visits as f64, view.stats_v2.visits as f64, view.headline.visits_diff as f64, MetricKind::Count),
        ("bounce", view.stats_v1.bounce_rate, view.stats_v2.bounce_rate, view.headline.bounce_diff, MetricKind::Percentage),
        ("duration", view.stats_v1.avg_duration, view.stats_v2.avg_duration, view.headline.duration_diff, MetricKind::Duration),
    ];
    for (label, a, b, delta, metric) in headline {
        println!(
            "  {:<9} {:>9} -> {:<9} {}",
            label,
            format_value(a, metric),
            format_value(b, metric),
            format_delta(delta, metric)
        );
    }
    println!();
    println!("{}", summarize(name_a, name_b, &view.headline));

    print_splits("Devices", &view.device_split);
    print_splits("Browsers", &view.browser_split);
    print_splits("Operating systems", &view.os_split);
    print_issues(&view.issues);
    print_pages(&view.pages);
    print_cohorts(&view.cohorts);
    print_alerts(&view.alerts);

    if let Some(text) = &view.ai_analysis {
        println!("\nAnalysis\n  {text}");
    }
}

fn print_splits(title: &str, rows: &[SplitRow]) {
    if rows.is_empty() {
        return;
    }
    println!("\n{title}");
    for row in rows {
        println!(
            "  {:<16} share {:>6.2}% -> {:>6.2}% ({:>7})  bounce {}  duration {}",
            row.label,
            row.share_v1,
            row.share_v2,
            format!("{:+.2}", row.share_diff),
            format_delta(row.bounce_diff, MetricKind::Percentage),
            format_delta(row.duration_diff, MetricKind::Duration)
        );
    }
}

fn print_issues(rows: &[IssueDiffRow]) {
    if rows.is_empty() {
        return;
    }
    println!("\nIssues");
    for row in rows {
        println!(
            "  {:<9} {:<8} {:<18} {:>8}  {}",
            row.status.label(),
            row.issue.effective_severity().as_str(),
            row.issue.issue_type,
            format_delta(row.impact_diff, MetricKind::Score),
            row.location_readable
        );
    }
}

fn print_pages(rows: &[PageDiffRow]) {
    if rows.is_empty() {
        return;
    }
    println!("\nPages");
    for row in rows {
        println!(
            "  {:<8} exit {:>7}  time {:>8}  {}",
            format!("{:?}", row.status).to_lowercase(),
            format_delta(row.exit_diff, MetricKind::Percentage),
            format_delta(row.time_diff, MetricKind::Duration),
            row.readable
        );
    }
}

fn print_cohorts(rows: &[CohortDiffRow]) {
    if rows.is_empty() {
        return;
    }
    println!("\nCohorts");
    for row in rows {
        let share = row
            .share_diff
            .map(|d| format_delta(d, MetricKind::Percentage))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<8} {:>7}  {}", format!("{:?}", row.status).to_lowercase(), share, row.name);
    }
}

fn print_alerts(alerts: &[AlertRecord]) {
    if alerts.is_empty() {
        return;
    }
    println!("\nAlerts");
    for alert in alerts {
        println!("  [{:?}] {}", alert.severity, alert.message);
    }
}
