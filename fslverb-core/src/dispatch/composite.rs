//! Operations built from other operations.
//!
//! Intermediates are named like the outputs of the operations that produce them (e.g.,
//! `{stem}_tmean`) and are removed once the final output exists.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tracing::info;

use super::{Context, DispatchError, maths, query};
use crate::{
    conversions,
    invocation::Number,
    naming::ImageName,
    operation::Operation,
    scratch::Scratch,
    toolkit::{Runner, ToolCommand},
};

const DEFAULT_FRACTION: &str = "0.5";
const MASK_SUFFIX: &str = "_mask";

/// A brain-extracted image and its binary mask.
pub(super) struct Brain {
    pub image: ImageName,
    pub mask: PathBuf,
}

/// Runs a single-input `fslmaths` operation whose output is an intermediate.
fn intermediate<R, W>(
    ctx: &mut Context<'_, R, W>,
    scratch: &mut Scratch,
    operation: Operation,
    src: &Path,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    scratch.track(ImageName::from_path(src).derive(operation.tag()).path());
    maths::apply(ctx, operation, src, None)
}

pub(super) fn tsnr<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let mut scratch = Scratch::default();

    let mean = intermediate(ctx, &mut scratch, Operation::Tmean, src)?;
    let sd = intermediate(ctx, &mut scratch, Operation::Tstd, src)?;

    let dst = ImageName::from_path(src).derive(Operation::Tsnr.tag());

    ctx.run(
        ToolCommand::new("fslmaths")
            .arg(mean.path())
            .arg("-div")
            .arg(sd.path())
            .output(&dst),
    )?;

    scratch.clean();

    Ok(dst)
}

/// Extracts the brain from the temporal mean of `src`.
///
/// Writes `{stem}_brain` and `{stem}_brain_mask`.
pub(super) fn brain<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
    fraction: &str,
) -> Result<Brain, DispatchError>
where
    R: Runner,
    W: Write,
{
    let mut scratch = Scratch::default();

    let mean = intermediate(ctx, &mut scratch, Operation::Tmean, src)?;

    let image = ImageName::from_path(src).derive(Operation::Brain.tag());

    ctx.run(
        ToolCommand::new("bet")
            .arg(mean.path())
            .output(&image)
            .args(["-f", fraction, "-m"]),
    )?;

    scratch.clean();

    let mask = image.companion(MASK_SUFFIX).path();

    Ok(Brain { image, mask })
}

/// Extracts the brain as an intermediate, tracking both of its files.
fn brain_intermediate<R, W>(
    ctx: &mut Context<'_, R, W>,
    scratch: &mut Scratch,
    src: &Path,
) -> Result<Brain, DispatchError>
where
    R: Runner,
    W: Write,
{
    let image = ImageName::from_path(src).derive(Operation::Brain.tag());
    scratch.track(image.path());
    scratch.track(image.companion(MASK_SUFFIX).path());

    brain(ctx, src, DEFAULT_FRACTION)
}

/// SUSAN smoothing with a brightness threshold at 75% of the median in-brain intensity.
pub(super) fn smooth<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
    fwhm: &Number,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let mut scratch = Scratch::default();

    let brain = brain_intermediate(ctx, &mut scratch, src)?;

    let stats = ToolCommand::new("fslstats")
        .arg(src)
        .arg("-k")
        .arg(&brain.mask)
        .args(["-P", "50"]);

    let median = query::values(ctx, stats, 1)?[0];

    let brightness_threshold = conversions::brightness_threshold(median);
    let sigma = conversions::fwhm_to_sigma(fwhm.value());

    info!(median, brightness_threshold, sigma, "smoothing");

    let tag = format!("{}{}", Operation::Smooth.tag(), fwhm.tag());
    let dst = ImageName::from_path(src).derive(&tag);

    ctx.run(
        ToolCommand::new("susan")
            .arg(src)
            .arg(brightness_threshold.to_string())
            .arg(sigma.to_string())
            .args(["3", "1", "0"])
            .output(&dst),
    )?;

    scratch.clean();

    Ok(dst)
}

/// Gaussian-weighted highpass filter that keeps the temporal mean.
pub(super) fn highpass<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
    cutoff: &Number,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let repetition_time =
        query::values(ctx, ToolCommand::new("fslval").arg(src).arg("pixdim4"), 1)?[0];

    let sigma = conversions::cutoff_to_sigma_volumes(cutoff.value(), repetition_time)
        .ok_or_else(|| DispatchError::InvalidParameter {
            name: "cutoff",
            value: format!("{} Hz at TR {repetition_time}", cutoff.as_str()),
        })?;

    info!(repetition_time, sigma, "filtering");

    let mut scratch = Scratch::default();

    let mean = intermediate(ctx, &mut scratch, Operation::Tmean, src)?;

    let tag = format!("{}{}", Operation::Highpass.tag(), cutoff.tag());
    let dst = ImageName::from_path(src).derive(&tag);

    ctx.run(
        ToolCommand::new("fslmaths")
            .arg(src)
            .arg("-bptf")
            .arg(sigma.to_string())
            .arg("-1")
            .arg("-add")
            .arg(mean.path())
            .output(&dst),
    )?;

    scratch.clean();

    Ok(dst)
}

/// Z-scores intensities using the mean and standard deviation within the brain.
pub(super) fn normalize<R, W>(
    ctx: &mut Context<'_, R, W>,
    src: &Path,
) -> Result<ImageName, DispatchError>
where
    R: Runner,
    W: Write,
{
    let mut scratch = Scratch::default();

    let brain = brain_intermediate(ctx, &mut scratch, src)?;

    let stats = ToolCommand::new("fslstats")
        .arg(src)
        .arg("-k")
        .arg(&brain.mask)
        .args(["-M", "-S"]);

    let values = query::values(ctx, stats, 2)?;
    let (mean, sd) = (values[0], values[1]);

    if sd == 0.0 {
        return Err(DispatchError::ZeroVariance(src.into()));
    }

    info!(mean, sd, "normalizing");

    let dst = ImageName::from_path(src).derive(Operation::Normalize.tag());

    ctx.run(
        ToolCommand::new("fslmaths")
            .arg(src)
            .arg("-sub")
            .arg(mean.to_string())
            .arg("-div")
            .arg(sd.to_string())
            .output(&dst),
    )?;

    scratch.clean();

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;
    use crate::{OutputType, toolkit::fake::FakeRunner};

    #[test]
    fn test_tsnr_removes_intermediates() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("a.nii.gz");
        File::create(&src)?;

        let mean = dir.path().join("a_tmean.nii.gz");
        let sd = dir.path().join("a_tstd.nii.gz");

        let mut runner = WritingRunner::default();
        let mut out = Vec::new();
        let mut ctx = Context {
            runner: &mut runner,
            out: &mut out,
            viewer: "fsleyes",
        };

        let dst = tsnr(&mut ctx, &src)?;

        assert_eq!(dst.path(), dir.path().join("a_tsnr.nii.gz"));
        assert!(dst.path().exists());
        assert!(!mean.exists());
        assert!(!sd.exists());

        Ok(())
    }

    #[test]
    fn test_tsnr_with_qualified_name() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("scan.v2.nii.gz");
        File::create(&src)?;

        let mut runner = WritingRunner::default();
        let mut out = Vec::new();
        let mut ctx = Context {
            runner: &mut runner,
            out: &mut out,
            viewer: "fsleyes",
        };

        let dst = tsnr(&mut ctx, &src)?;

        assert_eq!(dst.path(), dir.path().join("scan_tsnr.v2.nii.gz"));
        assert!(dst.path().exists());
        assert!(!dir.path().join("scan_tmean.v2.nii.gz").exists());
        assert!(!dir.path().join("scan_tstd.v2.nii.gz").exists());

        Ok(())
    }

    #[test]
    fn test_brain_with_qualified_name() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("bold.run1.nii");
        File::create(&src)?;

        let mut runner = WritingRunner::default();
        let mut out = Vec::new();
        let mut ctx = Context {
            runner: &mut runner,
            out: &mut out,
            viewer: "fsleyes",
        };

        let brain = brain(&mut ctx, &src, "0.5")?;

        assert_eq!(
            brain.image.path(),
            dir.path().join("bold_brain.run1.nii")
        );
        assert!(brain.image.path().exists());
        assert_eq!(brain.mask, dir.path().join("bold_brain.run1_mask.nii"));
        assert!(brain.mask.exists());

        Ok(())
    }

    #[test]
    fn test_brain_keeps_existing_intermediates() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("a.nii.gz");
        File::create(&src)?;

        let mean = dir.path().join("a_tmean.nii.gz");
        File::create(&mean)?;

        let mut runner = WritingRunner::default();
        let mut out = Vec::new();
        let mut ctx = Context {
            runner: &mut runner,
            out: &mut out,
            viewer: "fsleyes",
        };

        let brain = brain(&mut ctx, &src, "0.5")?;

        assert!(brain.image.path().exists());
        assert_eq!(brain.mask, dir.path().join("a_brain_mask.nii.gz"));
        assert!(mean.exists());

        Ok(())
    }

    #[test]
    fn test_smooth_removes_brain_intermediates() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("a.nii.gz");
        File::create(&src)?;

        let mut runner = WritingRunner {
            inner: FakeRunner::default().with_response("fslstats", "1000\n"),
        };
        let mut out = Vec::new();
        let mut ctx = Context {
            runner: &mut runner,
            out: &mut out,
            viewer: "fsleyes",
        };

        let fwhm = Number::parse("4").ok_or("invalid number")?;
        let dst = smooth(&mut ctx, &src, &fwhm)?;

        assert_eq!(dst.path(), dir.path().join("a_smooth4.nii.gz"));
        assert!(!dir.path().join("a_tmean.nii.gz").exists());
        assert!(!dir.path().join("a_brain.nii.gz").exists());
        assert!(!dir.path().join("a_brain_mask.nii.gz").exists());

        let susan = runner.inner.lines().pop().unwrap_or_default();
        assert!(susan.starts_with(&format!("susan {} 750 1.698", src.display())));

        Ok(())
    }

    /// Creates the images an FSL program would write: its output prefix with the extension
    /// `FSLOUTPUTTYPE` selects, and the `_mask` image for `bet -m`.
    #[derive(Default)]
    struct WritingRunner {
        inner: FakeRunner,
    }

    impl Runner for WritingRunner {
        fn run(&mut self, command: &ToolCommand) -> Result<String, crate::ToolError> {
            let stdout = self.inner.run(command)?;

            if let Some(output) = command.get_output() {
                let extension = match command.output_type() {
                    Some(OutputType::Nifti) => "nii",
                    Some(OutputType::NiftiPair) => "img",
                    Some(OutputType::NiftiPairGz) => "img.gz",
                    Some(OutputType::NiftiGz) | None => "nii.gz",
                };

                let mut suffixes = vec![""];

                if command.program() == "bet" {
                    suffixes.push(MASK_SUFFIX);
                }

                for suffix in suffixes {
                    let path = output.prefix_with(&format!("{suffix}.{extension}"));

                    File::create(path).map_err(|e| crate::ToolError::Spawn {
                        program: command.program().into(),
                        source: e,
                    })?;
                }
            }

            Ok(stdout)
        }
    }
}
