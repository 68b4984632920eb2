//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use basurant_map::{
    ClusterDetails, DetailHandler, LayerMode, MapEvent, MarkerRenderer, StatusFilter,
};
use basurant_report_models::Report;
use basurant_report_models::barangay::BarangayList;
use basurant_source::registry::{load_sources, rest_endpoints};
use basurant_source::rest::RestSource;
use basurant_source::retry::{RetryPolicy, default_client};
use basurant_source::{ReportAggregator, ReportFeed};
use basurant_store::ReportStore;
use basurant_submission::{SubmissionForm, Submitter};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Builds the configured source chain over the default local store.
fn aggregator(store: &Arc<ReportStore>) -> CliResult<ReportAggregator> {
    let defs = load_sources()?;
    let client = default_client()?;
    log::debug!("Source chain: {:?}", defs.iter().map(|d| &d.id).collect::<Vec<_>>());
    Ok(ReportAggregator::from_definitions(
        &defs,
        store,
        &client,
        RetryPolicy::default(),
    ))
}

async fn fetch_reports(combined: bool) -> CliResult<Vec<Report>> {
    let store = Arc::new(ReportStore::open_default());
    let aggregator = Arc::new(aggregator(&store)?);

    if combined {
        return Ok(aggregator.fetch_combined().await);
    }

    let feed = ReportFeed::new(aggregator);
    feed.refresh().await;
    Ok(Arc::unwrap_or_clone(feed.latest().reports))
}

fn print_report_row(report: &Report) {
    println!(
        "{:<16} {:<9} {:<8} {:<24} {}",
        report.id,
        report.canonical_status(),
        report.size.map_or_else(|| "-".to_string(), |s| s.to_string()),
        report.barangay.as_deref().unwrap_or("-"),
        report.report_type.as_deref().unwrap_or("-"),
    );
}

fn print_report(report: &Report) {
    println!("Report {}", report.id);
    println!("  Type:        {}", report.report_type.as_deref().unwrap_or("-"));
    println!(
        "  Size:        {}",
        report.size.map_or_else(|| "-".to_string(), |s| s.to_string())
    );
    println!(
        "  Status:      {} ({})",
        report.canonical_status(),
        report.status
    );
    println!("  Barangay:    {}", report.barangay.as_deref().unwrap_or("-"));
    if let Some((lat, lng)) = report.coordinates() {
        println!("  Location:    {lat:.6}, {lng:.6}");
    }
    if let Some(created) = report.created_at {
        println!(
            "  Created:     {}",
            created.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        );
    }
    if let Some(name) = &report.reporter_name {
        println!("  Reporter:    {name}");
    }
    if !report.description.is_empty() {
        println!("  Description: {}", report.description);
    }
}

/// `basurant fetch`
pub async fn fetch(combined: bool) -> CliResult {
    let reports = fetch_reports(combined).await?;

    println!(
        "{:<16} {:<9} {:<8} {:<24} Type",
        "ID", "Status", "Size", "Barangay"
    );
    println!("{}", "-".repeat(72));
    for report in &reports {
        print_report_row(report);
    }
    println!();
    println!("{} reports", reports.len());
    Ok(())
}

/// `basurant stats`
pub async fn stats() -> CliResult {
    let reports = fetch_reports(false).await?;
    let stats = basurant_analytics::dashboard_stats(&reports, &chrono::Local::now());

    let summary = stats.summary;
    println!("Total:   {:>6}", summary.total);
    println!("Pending: {:>6}", summary.pending);
    println!("Ongoing: {:>6}", summary.ongoing);
    println!("Cleaned: {:>6}", summary.cleaned);

    println!();
    println!("By type");
    for entry in &stats.by_type {
        println!("  {:<24} {:>6}", entry.label, entry.count);
    }

    println!();
    println!("By size");
    for entry in &stats.by_size {
        println!("  {:<24} {:>6}", entry.label, entry.count);
    }

    println!();
    println!("Last {} days", stats.daily.len());
    for day in stats.daily.iter().filter(|d| d.count > 0) {
        println!("  {} {:>6}", day.date, day.count);
    }

    println!();
    println!("Monthly");
    for month in &stats.monthly.months {
        let counts: Vec<String> = stats
            .monthly
            .series
            .iter()
            .map(|s| {
                format!(
                    "{}={}",
                    s.status,
                    stats.monthly.count(s.status, &month.key).unwrap_or(0)
                )
            })
            .collect();
        println!("  {:<9} {}", month.label, counts.join(" "));
    }
    Ok(())
}

/// `basurant export`
pub async fn export(out: Option<&Path>) -> CliResult {
    let reports = fetch_reports(false).await?;
    let csv = basurant_analytics::export_csv(&reports)?;

    match out {
        Some(path) => {
            tokio::fs::write(path, csv).await?;
            println!("Exported {} reports to {}", reports.len(), path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

/// Prints whatever the map asks to show.
struct PrintDetails;

impl DetailHandler for PrintDetails {
    fn show_report(&mut self, report: &Report) {
        print_report(report);
    }

    fn show_cluster(&mut self, details: &ClusterDetails) {
        for report in &details.reports {
            print_report_row(report);
        }
        if details.hidden() > 0 {
            println!("  ... and {} more", details.hidden());
        }
    }
}

/// `basurant map`
///
/// The heat view draws remote and local reports together; otherwise the
/// fetched list is drawn through `status`.
pub async fn map(zoom: f64, plain: bool, status: StatusFilter, heat: bool) -> CliResult {
    let reports = fetch_reports(heat).await?;
    let mode = if plain {
        LayerMode::Plain
    } else {
        LayerMode::Clustered
    };

    let mut renderer = MarkerRenderer::new(PrintDetails, mode);
    let drawn = if heat {
        renderer.render_heat(&reports)
    } else {
        renderer.render_filtered(&reports, status)
    };
    renderer.handle_event(MapEvent::ZoomEnd { zoom });
    println!(
        "{drawn} of {} reports on the map at zoom {}",
        reports.len(),
        renderer.zoom()
    );

    if plain {
        for marker in renderer.markers() {
            println!(
                "  {:<16} {:>10.6} {:>11.6} r={:<3} {}",
                marker.report.id, marker.lat, marker.lng, marker.radius, marker.color
            );
        }
        return Ok(());
    }

    for (index, cluster) in renderer.clusters().iter().enumerate() {
        println!();
        println!(
            "Cluster {index}: {} reports at {:.6}, {:.6}",
            cluster.len(),
            cluster.lat,
            cluster.lng
        );
        renderer.handle_event(MapEvent::ClusterClick { cluster: index });
    }
    Ok(())
}

/// `basurant show <id>`. Returns whether the report was found.
pub async fn show(id: &str) -> CliResult<bool> {
    let store = Arc::new(ReportStore::open_default());
    let aggregator = aggregator(&store)?;

    let mut renderer = MarkerRenderer::new(PrintDetails, LayerMode::default());
    Ok(renderer.open_details_by_id(&aggregator, id).await)
}

/// `basurant submit <form.json>`
pub async fn submit(form: &Path) -> CliResult {
    let text = tokio::fs::read_to_string(form).await?;
    let form: SubmissionForm = serde_json::from_str(&text)?;

    let defs = load_sources()?;
    let endpoints = rest_endpoints(&defs);
    let remote = if endpoints.is_empty() {
        log::warn!("No REST endpoints configured, saving locally only");
        None
    } else {
        Some(RestSource::new(
            "rest_api",
            "REST API",
            endpoints,
            default_client()?,
            RetryPolicy::default(),
        ))
    };

    let store = Arc::new(ReportStore::open_default());
    let submitter = Submitter::new(store, remote, BarangayList::builtin());
    let report = submitter.submit(form, &chrono::Local::now()).await?;

    println!("Submitted report {}", report.id);
    print_report(&report);
    Ok(())
}
