use std::{
    io::{self, BufWriter, Write},
    process::ExitCode,
};

use fslverb_core::{Invocation, Operation, SystemRunner, dispatch};
use tracing::info;

use crate::cli::Cli;

const NOT_IMPLEMENTED: &str = "Operation not implemented yet.";
const MISUSE: u8 = 2;

/// Resolves and runs the requested operation.
///
/// Usage errors and unknown operations exit successfully unless `--strict` is set; missing
/// inputs and failing external programs are errors.
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let stdout = io::stdout().lock();
    let mut writer = BufWriter::new(stdout);

    let misuse = if cli.strict {
        ExitCode::from(MISUSE)
    } else {
        ExitCode::SUCCESS
    };

    let Some(name) = cli.operation.as_deref().filter(|_| !cli.args.is_empty()) else {
        write_usage(&mut writer)?;
        writer.flush()?;
        return Ok(misuse);
    };

    let Some(operation) = Operation::from_alias(name) else {
        writeln!(writer, "{NOT_IMPLEMENTED}")?;
        writer.flush()?;
        return Ok(misuse);
    };

    let invocation = match Invocation::resolve(operation, &cli.args) {
        Ok(invocation) => invocation,
        Err(e) if e.is_usage() => {
            eprintln!("fslverb: {e}");
            writeln!(writer, "Usage: fslverb {}", operation.usage())?;
            writer.flush()?;
            return Ok(misuse);
        }
        Err(e) => return Err(e.into()),
    };

    info!(operation = name, "resolved invocation");

    let mut runner = SystemRunner::new(cli.fsldir);
    dispatch(&invocation, &cli.viewer, &mut runner, &mut writer)?;

    writer.flush()?;

    Ok(ExitCode::SUCCESS)
}

fn write_usage<W>(writer: &mut W) -> io::Result<()>
where
    W: Write,
{
    const WIDTH: usize = 44;

    writeln!(writer, "Usage: fslverb [OPTIONS] <OPERATION> <ARG> [<ARG> ...]")?;
    writeln!(writer)?;
    writeln!(writer, "Operations:")?;

    for (operation, aliases) in Operation::catalogue() {
        let aliases = aliases.join(", ");
        writeln!(writer, "  {aliases:<WIDTH$}{}", operation.description())?;
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "A leading number is the operation's parameter (e.g., a threshold); every other argument"
    )?;
    writeln!(
        writer,
        "is an image. Outputs are written next to their inputs and printed one per line."
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_usage() -> io::Result<()> {
        let mut buf = Vec::new();
        write_usage(&mut buf)?;

        let usage =
            String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        assert!(usage.starts_with("Usage: fslverb"));
        assert!(usage.contains("  tmean, Tmean"));
        assert!(usage.contains("uthresh, uthr, hthresh, hthr, highthresh"));
        assert!(usage.contains("susan, sue, smooth"));

        for (operation, _) in Operation::catalogue() {
            assert!(usage.contains(operation.description()));
        }

        Ok(())
    }
}
