use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tracing::info;

use super::{Context, DispatchError};
use crate::{
    invocation::Number,
    naming::ImageName,
    operation::Operation,
    toolkit::{Runner, ToolCommand},
};

/// Runs single-session ICA, returning the output directory.
pub(super) fn ica<R, W>(ctx: &mut Context<'_, R, W>, src: &Path) -> Result<PathBuf, DispatchError>
where
    R: Runner,
    W: Write,
{
    let dst = ImageName::from_path(src)
        .derive(Operation::Ica.tag())
        .prefix();

    ctx.run(
        ToolCommand::new("melodic")
            .arg("-i")
            .arg(src)
            .arg("-o")
            .arg(&dst)
            .arg("--report"),
    )?;

    Ok(dst)
}

/// Writes FDR-adjusted p-values at level `q`.
///
/// The probability threshold `fdr` prints is logged rather than written to stdout.
pub(super) fn fdr<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
    q: &Number,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let dst = ImageName::from_path(src).derive(Operation::Fdr.tag());

    let output = ctx.run(
        ToolCommand::new("fdr")
            .arg("-i")
            .arg(src)
            .arg("-q")
            .arg(q.as_str())
            .arg("-a")
            .output(&dst),
    )?;

    let threshold = output.split_whitespace().last().unwrap_or_default();
    info!(src = ?src, q = q.as_str(), threshold, "computed fdr threshold");

    Ok(dst)
}
