use anyhow::Context as _;
use cfgmgmt::model::iter_queue_entries_to_be_deleted;
use cfgmgmt::providers::GcpIssuerFactory;
use cfgmgmt::runner::{RotationRunner, RunOptions};
use cfgmgmt::utils::time::today;

use super::{Workspace, http_client, print};
use crate::cli::{DrainArgs, OutputFormat};
use crate::config::Settings;

pub async fn run(settings: &Settings, args: &DrainArgs) -> anyhow::Result<u8> {
    let mut workspace = Workspace::open(settings)?;
    let today = today();

    if args.dry_run {
        let due: Vec<_> =
            iter_queue_entries_to_be_deleted(&workspace.metadata.queue, args.target.as_ref(), today)
                .collect();
        print(&due, OutputFormat::Yaml)?;
        return Ok(0);
    }

    let factory = GcpIssuerFactory::new(http_client()?, settings.iam_endpoint.clone());
    let options = RunOptions {
        target: args.target.clone(),
        ..RunOptions::default()
    };
    let report = RotationRunner::new(&workspace.store, &factory, options)
        .drain_queue(&mut workspace.metadata, &workspace.cfg, today)
        .await
        .context("queue drain aborted")?;

    print(&report, OutputFormat::Yaml)?;
    Ok(u8::try_from(report.exit_code()).unwrap_or(1))
}
