use anyhow::Context as _;
use cfgmgmt::compliance::{ReportingSummary, generate_status_reports};
use cfgmgmt::metrics::{HttpMetricsSink, TracingSink, report_compliance};
use cfgmgmt::utils::time::today;
use serde::Serialize;
use tracing::{info, warn};

use super::{Workspace, http_client, print};
use crate::cli::ReportArgs;
use crate::config::Settings;

#[derive(Serialize)]
struct ReportOutput<'a, T: Serialize> {
    summary: &'a ReportingSummary,
    elements: &'a [T],
}

pub async fn run(settings: &Settings, args: &ReportArgs) -> anyhow::Result<u8> {
    let workspace = Workspace::open(settings)?;
    let storage = args
        .storage
        .clone()
        .unwrap_or_else(|| settings.cfg_dir.display().to_string());
    let today = today();

    let reports = generate_status_reports(&workspace.store, &workspace.metadata, &storage);
    let summary = ReportingSummary::from_reports(storage.as_str(), &reports, today);
    info!(
        compliant = summary.compliant,
        non_compliant = summary.non_compliant,
        unmanaged = summary.unmanaged,
        "compliance evaluated"
    );

    if args.send_metrics {
        let failures = match &settings.metrics {
            Some(metrics) => {
                let sink = HttpMetricsSink::new(http_client()?, &metrics.endpoint, metrics.index.clone())
                    .context("invalid metrics settings")?;
                report_compliance(&sink, &storage, &reports, today).await
            }
            None => {
                warn!("no metrics endpoint configured, logging records instead");
                report_compliance(&TracingSink, &storage, &reports, today).await
            }
        };
        if failures > 0 {
            warn!(failures, "some metrics records were not delivered");
        }
    }

    if args.summary {
        print(&summary, args.output)?;
    } else {
        print(
            &ReportOutput {
                summary: &summary,
                elements: &reports,
            },
            args.output,
        )?;
    }
    Ok(0)
}
