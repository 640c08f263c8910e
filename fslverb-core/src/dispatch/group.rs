use std::{io::Write, path::PathBuf};

use super::{Context, DispatchError};
use crate::{
    naming::ImageName,
    operation::Operation,
    toolkit::{Runner, ToolCommand},
};

/// Merges all inputs into one image named after the first.
pub(super) fn merge<R, W>(
    ctx: &mut Context<'_, R, W>,
    operation: Operation,
    srcs: &[PathBuf],
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let axis = match operation {
        Operation::TimeMerge => "-t",
        _ => "-a",
    };

    let dst = first_name(operation, srcs)?.derive(operation.tag());

    ctx.run(
        ToolCommand::new("fslmerge")
            .arg(axis)
            .output(&dst)
            .args(srcs),
    )?;

    Ok(dst)
}

/// Averages echoes voxelwise.
pub(super) fn combine_echoes<R, W>(
    ctx: &mut Context<'_, R, W>,
    srcs: &[PathBuf],
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let operation = Operation::CombineEchoes;
    let dst = first_name(operation, srcs)?.derive(operation.tag());

    let mut command = ToolCommand::new("fslmaths").arg(&srcs[0]);

    for src in &srcs[1..] {
        command = command.arg("-add").arg(src);
    }

    let echo_count = srcs.len().to_string();

    ctx.run(
        command
            .args(["-div", echo_count.as_str()])
            .output(&dst),
    )?;

    Ok(dst)
}

/// Opens every input in the viewer and waits for it to close.
pub(super) fn view<R, W>(
    ctx: &mut Context<'_, R, W>,
    srcs: &[PathBuf],
) -> Result<(), DispatchError>
where
    R: Runner,
    W: Write,
{
    let command = ToolCommand::new(ctx.viewer).args(srcs);
    ctx.run(command)?;
    Ok(())
}

fn first_name(operation: Operation, srcs: &[PathBuf]) -> Result<ImageName, DispatchError> {
    srcs.first()
        .map(ImageName::from_path)
        .ok_or(DispatchError::TooFewFiles {
            operation,
            min: operation.min_files(),
        })
}
