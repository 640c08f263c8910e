use std::{io::Write, path::Path};

use super::{Context, DispatchError};
use crate::{
    invocation::Number,
    naming::ImageName,
    operation::Operation,
    toolkit::{Runner, ToolCommand},
};

const PROGRAM: &str = "fslmaths";

/// Runs a single-input `fslmaths` operation.
///
/// Threshold operations take `parameter` as the threshold and append it to the output tag.
pub(super) fn apply<R, W>(
    ctx: &mut Context<'_, R, W>,
    operation: Operation,
    src: &Path,
    parameter: Option<&Number>,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let flag = match operation {
        Operation::Tmean => "-Tmean",
        Operation::Tstd => "-Tstd",
        Operation::Tmax => "-Tmax",
        Operation::Tmin => "-Tmin",
        Operation::Bin => "-bin",
        Operation::Nan => "-nan",
        Operation::Abs => "-abs",
        Operation::LowerThreshold => "-thr",
        Operation::UpperThreshold => "-uthr",
        _ => unreachable!("not an fslmaths operation: {operation:?}"),
    };

    let mut command = ToolCommand::new(PROGRAM).arg(src).arg(flag);

    let tag = match parameter {
        Some(number) => {
            command = command.arg(number.as_str());
            format!("{}{}", operation.tag(), number.tag())
        }
        None => operation.tag().into(),
    };

    let dst = ImageName::from_path(src).derive(&tag);

    ctx.run(command.output(&dst))?;

    Ok(dst)
}

/// Zeroes everything in `src` outside `mask`.
pub(super) fn mask<R, W>(
    ctx: &mut Context<'_, R, W>,
    mask: &Path,
    src: &Path,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let dst = ImageName::from_path(src).derive(Operation::Mask.tag());

    ctx.run(
        ToolCommand::new(PROGRAM)
            .arg(src)
            .arg("-mas")
            .arg(mask)
            .output(&dst),
    )?;

    Ok(dst)
}
