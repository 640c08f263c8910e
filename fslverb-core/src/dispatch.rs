//! Operation dispatch.

mod analysis;
mod composite;
mod group;
mod maths;
mod query;
mod registration;

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::{
    invocation::{Invocation, Number},
    naming::ImageName,
    operation::Operation,
    toolkit::{Runner, ToolCommand, ToolError},
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("external tool error")]
    Tool(#[from] ToolError),
    #[error("{} needs at least {min} image(s)", operation.name())]
    TooFewFiles { operation: Operation, min: usize },
    #[error("missing numeric parameter for {}", .0.name())]
    MissingParameter(Operation),
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("unexpected output from {program}: {output:?}")]
    InvalidToolOutput { program: String, output: String },
    #[error("{0}: zero variance within the brain mask")]
    ZeroVariance(PathBuf),
}

/// What an operation reports on stdout.
#[derive(Debug)]
enum Product {
    Path(PathBuf),
    Text(String),
}

impl From<ImageName> for Product {
    fn from(name: ImageName) -> Self {
        Self::Path(name.path())
    }
}

/// Shared state for a single dispatch.
pub(crate) struct Context<'a, R, W> {
    runner: &'a mut R,
    out: &'a mut W,
    viewer: &'a str,
}

impl<R, W> Context<'_, R, W>
where
    R: Runner,
    W: Write,
{
    fn run(&mut self, command: ToolCommand) -> Result<String, ToolError> {
        info!(program = command.program(), "running tool");
        self.runner.run(&command)
    }

    fn emit(&mut self, product: &Product) -> io::Result<()> {
        match product {
            Product::Path(path) => writeln!(self.out, "{}", path.display())?,
            Product::Text(text) => {
                self.out.write_all(text.as_bytes())?;

                if !text.is_empty() && !text.ends_with('\n') {
                    writeln!(self.out)?;
                }
            }
        }

        self.out.flush()
    }
}

/// Runs an invocation, writing its products to `out` one per line.
///
/// Files are processed sequentially in input order, and each product is written as soon as it
/// exists. The first failing external program aborts the dispatch.
pub fn dispatch<R, W>(
    invocation: &Invocation,
    viewer: &str,
    runner: &mut R,
    out: &mut W,
) -> Result<(), DispatchError>
where
    R: Runner,
    W: Write,
{
    let operation = invocation.operation();
    let parameter = invocation.parameter();
    let files = invocation.files();

    let min = operation.min_files();

    if files.len() < min {
        return Err(DispatchError::TooFewFiles { operation, min });
    }

    info!(
        operation = operation.name(),
        layout = ?operation.layout(),
        pipeable = operation.is_pipeable(),
        file_count = files.len(),
        "dispatching"
    );

    let mut ctx = Context {
        runner,
        out,
        viewer,
    };

    match operation {
        Operation::Tmean
        | Operation::Tstd
        | Operation::Tmax
        | Operation::Tmin
        | Operation::Bin
        | Operation::Nan
        | Operation::Abs => for_each(&mut ctx, files, |ctx, src| {
            maths::apply(ctx, operation, src, None).map(Product::from)
        }),
        Operation::LowerThreshold | Operation::UpperThreshold => {
            let threshold = required(operation, parameter)?;

            for_each(&mut ctx, files, |ctx, src| {
                maths::apply(ctx, operation, src, Some(threshold)).map(Product::from)
            })
        }
        Operation::Tsnr => for_each(&mut ctx, files, |ctx, src| {
            composite::tsnr(ctx, src).map(Product::from)
        }),
        Operation::Reorient => for_each(&mut ctx, files, |ctx, src| {
            registration::reorient(ctx, src).map(Product::from)
        }),
        Operation::Moco => for_each(&mut ctx, files, |ctx, src| {
            registration::moco(ctx, src).map(Product::from)
        }),
        Operation::MocoEchoes => {
            let products = registration::moco_echoes(&mut ctx, files)?;
            emit_all(&mut ctx, products.into_iter().map(Product::from))
        }
        Operation::Align => against_reference(&mut ctx, files, |ctx, reference, src| {
            registration::align(ctx, reference, src).map(Product::from)
        }),
        Operation::Mask => against_reference(&mut ctx, files, |ctx, mask, src| {
            maths::mask(ctx, mask, src).map(Product::from)
        }),
        Operation::Merge | Operation::TimeMerge => {
            let product = group::merge(&mut ctx, operation, files)?;
            emit_all(&mut ctx, [Product::from(product)])
        }
        Operation::CombineEchoes => {
            let product = group::combine_echoes(&mut ctx, files)?;
            emit_all(&mut ctx, [Product::from(product)])
        }
        Operation::View => group::view(&mut ctx, files),
        Operation::Brain => {
            let fraction = required(operation, parameter)?;

            for_each(&mut ctx, files, |ctx, src| {
                composite::brain(ctx, src, fraction.as_str()).map(|brain| brain.image.into())
            })
        }
        Operation::Smooth => {
            let fwhm = required(operation, parameter)?;

            for_each(&mut ctx, files, |ctx, src| {
                composite::smooth(ctx, src, fwhm).map(Product::from)
            })
        }
        Operation::Highpass => {
            let cutoff = required(operation, parameter)?;

            for_each(&mut ctx, files, |ctx, src| {
                composite::highpass(ctx, src, cutoff).map(Product::from)
            })
        }
        Operation::Normalize => for_each(&mut ctx, files, |ctx, src| {
            composite::normalize(ctx, src).map(Product::from)
        }),
        Operation::Ica => for_each(&mut ctx, files, |ctx, src| {
            analysis::ica(ctx, src).map(Product::Path)
        }),
        Operation::Fdr => {
            let q = required(operation, parameter)?;

            for_each(&mut ctx, files, |ctx, src| {
                analysis::fdr(ctx, src, q).map(Product::from)
            })
        }
        Operation::Header
        | Operation::Info
        | Operation::Mean
        | Operation::Sd
        | Operation::Volumes => for_each(&mut ctx, files, |ctx, src| {
            query::describe(ctx, operation, src).map(Product::Text)
        }),
        Operation::Xcorr => against_reference(&mut ctx, files, |ctx, reference, src| {
            query::xcorr(ctx, reference, src).map(Product::Text)
        }),
        Operation::Cluster => {
            let threshold = required(operation, parameter)?;

            for_each(&mut ctx, files, |ctx, src| {
                query::cluster(ctx, src, threshold).map(Product::Text)
            })
        }
    }
}

fn required(operation: Operation, parameter: Option<&Number>) -> Result<&Number, DispatchError> {
    parameter.ok_or(DispatchError::MissingParameter(operation))
}

fn for_each<R, W, F>(
    ctx: &mut Context<'_, R, W>,
    files: &[PathBuf],
    mut f: F,
) -> Result<(), DispatchError>
where
    R: Runner,
    W: Write,
    F: FnMut(&mut Context<'_, R, W>, &Path) -> Result<Product, DispatchError>,
{
    for src in files {
        let product = f(ctx, src)?;
        ctx.emit(&product)?;
    }

    Ok(())
}

fn against_reference<R, W, F>(
    ctx: &mut Context<'_, R, W>,
    files: &[PathBuf],
    mut f: F,
) -> Result<(), DispatchError>
where
    R: Runner,
    W: Write,
    F: FnMut(&mut Context<'_, R, W>, &Path, &Path) -> Result<Product, DispatchError>,
{
    let Some((reference, srcs)) = files.split_first() else {
        return Ok(());
    };

    for src in srcs {
        let product = f(ctx, reference, src)?;
        ctx.emit(&product)?;
    }

    Ok(())
}

fn emit_all<R, W, I>(ctx: &mut Context<'_, R, W>, products: I) -> Result<(), DispatchError>
where
    R: Runner,
    W: Write,
    I: IntoIterator<Item = Product>,
{
    for product in products {
        ctx.emit(&product)?;
    }

    Ok(())
}
