use std::io::Write;

use anyhow::Context as _;
use cfgmgmt::selection::{SelectionFilter, iter_elements_requiring_rotation};
use cfgmgmt::store::iter_cfg_elements;
use cfgmgmt::utils::time::today;

use super::Workspace;
use crate::cli::SelectArgs;
use crate::config::Settings;

/// Print one `type/name` line per element due for rotation
pub fn run(settings: &Settings, args: &SelectArgs) -> anyhow::Result<u8> {
    let workspace = Workspace::open(settings)?;
    let elements = iter_cfg_elements(&workspace.store, args.target.as_ref());
    let filter = SelectionFilter {
        target: args.target.as_ref(),
        element_filter: None,
        rotation_method: args.method.map(Into::into),
    };

    let mut out = std::io::stdout().lock();
    for element in iter_elements_requiring_rotation(&elements, &workspace.metadata, filter, today()) {
        writeln!(out, "{}", element.target()).context("cannot write to stdout")?;
    }
    Ok(0)
}
