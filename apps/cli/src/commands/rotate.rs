use anyhow::Context as _;
use cfgmgmt::providers::GcpIssuerFactory;
use cfgmgmt::rotation::RotateOptions;
use cfgmgmt::runner::{RotationRunner, RunOptions};
use cfgmgmt::utils::time::today;
use tracing::info;

use super::{Workspace, http_client, print};
use crate::cli::{OutputFormat, RotateArgs};
use crate::config::Settings;

/// Rotate due elements; exit code 1 on clean failures, 2 on orphaned keys
pub async fn run(settings: &Settings, args: &RotateArgs) -> anyhow::Result<u8> {
    let mut workspace = Workspace::open(settings)?;
    let factory = GcpIssuerFactory::new(http_client()?, settings.iam_endpoint.clone());
    let options = RunOptions {
        max_rotations: args.max_rotations.unwrap_or(settings.max_rotations),
        target: args.select.target.clone(),
        rotation_method: args.select.method.map(Into::into),
        rotate: RotateOptions {
            key_create_timeout: settings.key_create_timeout,
        },
    };
    info!(cfg_dir = %settings.cfg_dir.display(), ?options, "rotating due credentials");

    let runner = RotationRunner::new(&workspace.store, &factory, options);
    let report = runner
        .rotate_due(&mut workspace.metadata, &workspace.store, &workspace.cfg, today())
        .await
        .context("rotation run aborted")?;

    print(&report, OutputFormat::Yaml)?;
    Ok(u8::try_from(report.exit_code()).unwrap_or(1))
}
