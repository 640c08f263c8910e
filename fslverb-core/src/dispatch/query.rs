use std::{io::Write, path::Path};

use super::{Context, DispatchError};
use crate::{
    conversions,
    invocation::Number,
    operation::Operation,
    toolkit::{Runner, ToolCommand},
};

/// Runs a per-image query and returns the tool's text.
pub(super) fn describe<R, W>(
    ctx: &mut Context<'_, R, W>,
    operation: Operation,
    src: &Path,
) -> Result<String, DispatchError>
where
    R: Runner,
    W: Write,
{
    let command = match operation {
        Operation::Header => ToolCommand::new("fslhd").arg(src),
        Operation::Info => ToolCommand::new("fslinfo").arg(src),
        Operation::Mean => ToolCommand::new("fslstats").arg(src).arg("-M"),
        Operation::Sd => ToolCommand::new("fslstats").arg(src).arg("-S"),
        Operation::Volumes => ToolCommand::new("fslnvols").arg(src),
        _ => unreachable!("not a query operation: {operation:?}"),
    };

    ctx.run(command).map_err(DispatchError::from)
}

pub(super) fn xcorr<R, W>(
    ctx: &mut Context<'_, R, W>,
    reference: &Path,
    src: &Path,
) -> Result<String, DispatchError>
where
    R: Runner,
    W: Write,
{
    let text = ctx.run(ToolCommand::new("fslcc").arg(reference).arg(src))?;
    Ok(text)
}

pub(super) fn cluster<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
    threshold: &Number,
) -> Result<String, DispatchError>
where
    R: Runner,
    W: Write,
{
    let text = ctx.run(
        ToolCommand::new("cluster")
            .arg("-i")
            .arg(src)
            .arg("-t")
            .arg(threshold.as_str()),
    )?;

    Ok(text)
}

/// Runs a program that prints numbers and parses them.
pub(super) fn values<R, W>(
    ctx: &mut Context<'_, R, W>,
    command: ToolCommand,
    expected_count: usize,
) -> Result<Vec<f64>, DispatchError>
where
    R: Runner,
    W: Write,
{
    let program = command.program().to_string();
    let output = ctx.run(command)?;

    match conversions::parse_values(&output) {
        Some(values) if values.len() == expected_count => Ok(values),
        _ => Err(DispatchError::InvalidToolOutput { program, output }),
    }
}
