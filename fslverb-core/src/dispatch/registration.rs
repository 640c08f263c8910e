use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tracing::info;

use super::{Context, DispatchError};
use crate::{
    naming::ImageName,
    operation::Operation,
    toolkit::{Runner, ToolCommand},
};

const MATRIX_SUFFIX: &str = ".mat";

pub(super) fn reorient<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let dst = ImageName::from_path(src).derive(Operation::Reorient.tag());

    ctx.run(ToolCommand::new("fslreorient2std").arg(src).output(&dst))?;

    Ok(dst)
}

pub(super) fn moco<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let dst = ImageName::from_path(src).derive(Operation::Moco.tag());

    ctx.run(
        ToolCommand::new("mcflirt")
            .arg("-in")
            .arg(src)
            .arg("-out")
            .output(&dst)
            .arg("-plots"),
    )?;

    Ok(dst)
}

/// Motion-corrects the first echo and applies its per-volume transforms to the others.
pub(super) fn moco_echoes<R, W>(
    ctx: &mut Context<'_, R, W>,
    srcs: &[PathBuf],
) -> Result<Vec<ImageName>, DispatchError>
where
    R: Runner,
    W: Write,
{
    let Some((first, rest)) = srcs.split_first() else {
        return Ok(Vec::new());
    };

    let reference = ImageName::from_path(first).derive(Operation::MocoEchoes.tag());
    let matrices = reference.prefix_with(MATRIX_SUFFIX);

    ctx.run(
        ToolCommand::new("mcflirt")
            .arg("-in")
            .arg(first)
            .arg("-out")
            .output(&reference)
            .arg("-mats")
            .arg("-plots"),
    )?;

    info!(matrices = ?matrices, echo_count = srcs.len(), "applying transforms to echoes");

    let mut dsts = Vec::with_capacity(srcs.len());

    for src in rest {
        let dst = ImageName::from_path(src).derive(Operation::MocoEchoes.tag());

        ctx.run(
            ToolCommand::new("applyxfm4D")
                .arg(src)
                .arg(reference.path())
                .output(&dst)
                .arg(&matrices)
                .arg("-fourdigit"),
        )?;

        dsts.push(dst);
    }

    dsts.insert(0, reference);

    Ok(dsts)
}

/// Linearly registers `src` to `reference`, also writing the affine matrix.
pub(super) fn align<R, W>(
    ctx: &mut Context<'_, R, W>,
    reference: &Path,
    src: &Path,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let dst = ImageName::from_path(src).derive(Operation::Align.tag());

    ctx.run(
        ToolCommand::new("flirt")
            .arg("-in")
            .arg(src)
            .arg("-ref")
            .arg(reference)
            .arg("-out")
            .output(&dst)
            .arg("-omat")
            .arg(dst.prefix_with(MATRIX_SUFFIX)),
    )?;

    Ok(dst)
}
