//! Output name derivation.

use std::path::{Path, PathBuf};

const DEFAULT_EXTENSION: &str = "nii.gz";

/// Image extensions FSL recognizes, longest first.
const IMAGE_EXTENSIONS: &[&str] = &["nii.gz", "hdr.gz", "img.gz", "nii", "hdr", "img"];

/// An image file name split at the first period of its file name.
///
/// Whatever sits between the stem and the trailing image extension (e.g., `v2` in
/// `scan.v2.nii.gz`) is kept as a qualifier. FSL programs are given the stem and qualifier as
/// the output prefix and append the image extension themselves.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageName {
    dir: PathBuf,
    stem: String,
    qualifier: Option<String>,
    extension: &'static str,
}

impl ImageName {
    /// Splits a path into its directory, stem, qualifier and image extension.
    ///
    /// Only the file name component is split, so `/data/run.1/scan.nii.gz` has the stem `scan`
    /// and the extension `nii.gz`. A file name that does not end in an FSL image extension gets
    /// the default `nii.gz`.
    pub fn from_path<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        let (stem, rest) = match file_name.split_once('.') {
            Some((stem, rest)) => (stem.to_string(), Some(rest)),
            None => (file_name.to_string(), None),
        };

        let (qualifier, extension) = match rest {
            Some(rest) => split_extension(rest),
            None => (None, DEFAULT_EXTENSION),
        };

        Self {
            dir,
            stem,
            qualifier,
            extension,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn extension(&self) -> &str {
        self.extension
    }

    /// Returns a sibling name with `_{tag}` appended to the stem.
    pub fn derive(&self, tag: &str) -> Self {
        Self {
            dir: self.dir.clone(),
            stem: format!("{}_{tag}", self.stem),
            qualifier: self.qualifier.clone(),
            extension: self.extension,
        }
    }

    /// Returns the name of a file a program writes next to this one by appending `suffix` to
    /// the output prefix, e.g., the `{prefix}_mask` written by `bet -m`.
    pub fn companion(&self, suffix: &str) -> Self {
        Self {
            dir: self.dir.clone(),
            stem: format!("{}{suffix}", self.base()),
            qualifier: None,
            extension: self.extension,
        }
    }

    /// The path without its image extension, as FSL programs expect for output arguments.
    pub fn prefix(&self) -> PathBuf {
        self.dir.join(self.base())
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.base(), self.extension))
    }

    /// The prefix with a literal suffix, e.g., `.mat` for transform outputs.
    pub fn prefix_with(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{suffix}", self.base()))
    }

    pub fn output_type(&self) -> OutputType {
        OutputType::from_extension(self.extension).unwrap_or(OutputType::NiftiGz)
    }

    fn base(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("{}.{qualifier}", self.stem),
            None => self.stem.clone(),
        }
    }
}

fn split_extension(rest: &str) -> (Option<String>, &'static str) {
    for &extension in IMAGE_EXTENSIONS {
        if rest == extension {
            return (None, extension);
        }

        if let Some(qualifier) = rest
            .strip_suffix(extension)
            .and_then(|s| s.strip_suffix('.'))
        {
            return (Some(qualifier.into()), extension);
        }
    }

    (Some(rest.into()), DEFAULT_EXTENSION)
}

/// An `FSLOUTPUTTYPE` value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputType {
    Nifti,
    NiftiGz,
    NiftiPair,
    NiftiPairGz,
}

impl OutputType {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "nii" => Some(Self::Nifti),
            "nii.gz" => Some(Self::NiftiGz),
            "hdr" | "img" => Some(Self::NiftiPair),
            "hdr.gz" | "img.gz" => Some(Self::NiftiPairGz),
            _ => None,
        }
    }
}

impl AsRef<str> for OutputType {
    fn as_ref(&self) -> &str {
        match self {
            Self::Nifti => "NIFTI",
            Self::NiftiGz => "NIFTI_GZ",
            Self::NiftiPair => "NIFTI_PAIR",
            Self::NiftiPairGz => "NIFTI_PAIR_GZ",
        }
    }
}
