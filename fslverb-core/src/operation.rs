//! The operation catalogue and its alias table.

use indexmap::IndexMap;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    Tmean,
    Tstd,
    Tmax,
    Tmin,
    Tsnr,
    Bin,
    Nan,
    Abs,
    LowerThreshold,
    UpperThreshold,
    Reorient,
    Moco,
    MocoEchoes,
    Align,
    Mask,
    Merge,
    TimeMerge,
    CombineEchoes,
    Brain,
    Smooth,
    Highpass,
    Normalize,
    Ica,
    Fdr,
    View,
    Header,
    Info,
    Mean,
    Sd,
    Volumes,
    Xcorr,
    Cluster,
}

/// Every spelling accepted on the command line, in listing order.
///
/// The first alias of each operation is its canonical name.
const ALIASES: &[(&str, Operation)] = &[
    ("tmean", Operation::Tmean),
    ("Tmean", Operation::Tmean),
    ("tstd", Operation::Tstd),
    ("Tstd", Operation::Tstd),
    ("tmax", Operation::Tmax),
    ("Tmax", Operation::Tmax),
    ("tmin", Operation::Tmin),
    ("Tmin", Operation::Tmin),
    ("tsnr", Operation::Tsnr),
    ("tSNR", Operation::Tsnr),
    ("bin", Operation::Bin),
    ("nan", Operation::Nan),
    ("nans", Operation::Nan),
    ("abs", Operation::Abs),
    ("mag", Operation::Abs),
    ("magn", Operation::Abs),
    ("lthresh", Operation::LowerThreshold),
    ("lthr", Operation::LowerThreshold),
    ("lowthresh", Operation::LowerThreshold),
    ("uthresh", Operation::UpperThreshold),
    ("uthr", Operation::UpperThreshold),
    ("hthresh", Operation::UpperThreshold),
    ("hthr", Operation::UpperThreshold),
    ("highthresh", Operation::UpperThreshold),
    ("reorient", Operation::Reorient),
    ("std", Operation::Reorient),
    ("reorient2std", Operation::Reorient),
    ("moco", Operation::Moco),
    ("mc", Operation::Moco),
    ("mcme", Operation::MocoEchoes),
    ("mocome", Operation::MocoEchoes),
    ("moco_me", Operation::MocoEchoes),
    ("align", Operation::Align),
    ("register", Operation::Align),
    ("reg", Operation::Align),
    ("flirt", Operation::Align),
    ("mask", Operation::Mask),
    ("mas", Operation::Mask),
    ("masking", Operation::Mask),
    ("merge", Operation::Merge),
    ("tmerge", Operation::TimeMerge),
    ("merget", Operation::TimeMerge),
    ("concatt", Operation::TimeMerge),
    ("tconcat", Operation::TimeMerge),
    ("echoes", Operation::CombineEchoes),
    ("combine", Operation::CombineEchoes),
    ("ecombine", Operation::CombineEchoes),
    ("bet", Operation::Brain),
    ("brain", Operation::Brain),
    ("rmskull", Operation::Brain),
    ("susan", Operation::Smooth),
    ("sue", Operation::Smooth),
    ("smooth", Operation::Smooth),
    ("highpass", Operation::Highpass),
    ("hp", Operation::Highpass),
    ("hpf", Operation::Highpass),
    ("norm", Operation::Normalize),
    ("normalize", Operation::Normalize),
    ("zscore", Operation::Normalize),
    ("ica", Operation::Ica),
    ("melodic", Operation::Ica),
    ("fdr", Operation::Fdr),
    ("view", Operation::View),
    ("v", Operation::View),
    ("header", Operation::Header),
    ("hd", Operation::Header),
    ("fslhd", Operation::Header),
    ("info", Operation::Info),
    ("fslinfo", Operation::Info),
    ("mean", Operation::Mean),
    ("avg", Operation::Mean),
    ("sd", Operation::Sd),
    ("stdev", Operation::Sd),
    ("nvols", Operation::Volumes),
    ("nvol", Operation::Volumes),
    ("length", Operation::Volumes),
    ("xcorr", Operation::Xcorr),
    ("cc", Operation::Xcorr),
    ("fslcc", Operation::Xcorr),
    ("cluster", Operation::Cluster),
    ("clusters", Operation::Cluster),
];

/// How an operation walks its file inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    /// Every file is transformed independently.
    Each,
    /// The first file is a reference applied to every following file.
    Reference,
    /// All files form a single group.
    Group,
}

/// The role of the leading numeric argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Parameter {
    None,
    Optional {
        name: &'static str,
        default: &'static str,
    },
    Required {
        name: &'static str,
    },
}

impl Operation {
    /// Looks up an operation by any of its aliases.
    ///
    /// Matching is exact and case-sensitive.
    pub fn from_alias(s: &str) -> Option<Self> {
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == s)
            .map(|(_, operation)| *operation)
    }

    /// Returns the aliases grouped by operation, in listing order.
    pub fn catalogue() -> IndexMap<Self, Vec<&'static str>> {
        let mut catalogue: IndexMap<Self, Vec<&'static str>> = IndexMap::new();

        for (alias, operation) in ALIASES {
            catalogue.entry(*operation).or_default().push(*alias);
        }

        catalogue
    }

    pub fn name(self) -> &'static str {
        ALIASES
            .iter()
            .find(|(_, operation)| *operation == self)
            .map(|(alias, _)| *alias)
            .unwrap_or_default()
    }

    /// The suffix appended to an input stem to name the output, before any numeric parameter.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Tmean => "tmean",
            Self::Tstd => "tstd",
            Self::Tmax => "tmax",
            Self::Tmin => "tmin",
            Self::Tsnr => "tsnr",
            Self::Bin => "bin",
            Self::Nan => "nan",
            Self::Abs => "abs",
            Self::LowerThreshold => "lthresh",
            Self::UpperThreshold => "uthresh",
            Self::Reorient => "reoriented",
            Self::Moco | Self::MocoEchoes => "mcf",
            Self::Align => "reg",
            Self::Mask => "masked",
            Self::Merge => "merged",
            Self::TimeMerge => "tmerged",
            Self::CombineEchoes => "echoescombined",
            Self::Brain => "brain",
            Self::Smooth => "smooth",
            Self::Highpass => "hp",
            Self::Normalize => "norm",
            Self::Ica => "ica",
            Self::Fdr => "fdr",
            Self::View
            | Self::Header
            | Self::Info
            | Self::Mean
            | Self::Sd
            | Self::Volumes
            | Self::Xcorr
            | Self::Cluster => "",
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            Self::Align | Self::Mask | Self::Xcorr => Layout::Reference,
            Self::MocoEchoes
            | Self::Merge
            | Self::TimeMerge
            | Self::CombineEchoes
            | Self::View => Layout::Group,
            _ => Layout::Each,
        }
    }

    pub fn parameter(self) -> Parameter {
        match self {
            Self::LowerThreshold | Self::UpperThreshold | Self::Cluster => Parameter::Required {
                name: "threshold",
            },
            Self::Smooth => Parameter::Required { name: "fwhm-mm" },
            Self::Highpass => Parameter::Required { name: "cutoff-hz" },
            Self::Brain => Parameter::Optional {
                name: "fraction",
                default: "0.5",
            },
            Self::Fdr => Parameter::Optional {
                name: "q",
                default: "0.05",
            },
            _ => Parameter::None,
        }
    }

    /// The minimum number of file inputs.
    pub fn min_files(self) -> usize {
        match self {
            Self::MocoEchoes | Self::CombineEchoes => 2,
            _ => match self.layout() {
                Layout::Reference => 2,
                Layout::Each | Layout::Group => 1,
            },
        }
    }

    /// Whether stdout carries output paths rather than tool text.
    pub fn is_pipeable(self) -> bool {
        !matches!(
            self,
            Self::View
                | Self::Header
                | Self::Info
                | Self::Mean
                | Self::Sd
                | Self::Volumes
                | Self::Xcorr
                | Self::Cluster
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Tmean => "temporal mean",
            Self::Tstd => "temporal standard deviation",
            Self::Tmax => "temporal maximum",
            Self::Tmin => "temporal minimum",
            Self::Tsnr => "temporal signal-to-noise ratio",
            Self::Bin => "binarize",
            Self::Nan => "replace NaNs with zero",
            Self::Abs => "absolute value (magnitude)",
            Self::LowerThreshold => "zero voxels below a threshold",
            Self::UpperThreshold => "zero voxels above a threshold",
            Self::Reorient => "reorient to the standard template orientation",
            Self::Moco => "motion correction",
            Self::MocoEchoes => "motion correction of echoes using the first echo's transforms",
            Self::Align => "linear registration to the first image",
            Self::Mask => "apply the first image as a mask",
            Self::Merge => "merge images along an automatically chosen axis",
            Self::TimeMerge => "concatenate images in time",
            Self::CombineEchoes => "average echoes",
            Self::Brain => "brain extraction",
            Self::Smooth => "SUSAN smoothing",
            Self::Highpass => "temporal highpass filter",
            Self::Normalize => "z-score intensities within the brain",
            Self::Ica => "independent component analysis",
            Self::Fdr => "false discovery rate adjusted p-values",
            Self::View => "open images in the viewer",
            Self::Header => "print the image header",
            Self::Info => "print image dimensions",
            Self::Mean => "print the mean intensity",
            Self::Sd => "print the intensity standard deviation",
            Self::Volumes => "print the number of volumes",
            Self::Xcorr => "print cross-correlations against the first image",
            Self::Cluster => "print a cluster table",
        }
    }

    /// Returns a one-line usage hint, e.g., `lthresh <threshold> <image> [<image> ...]`.
    pub fn usage(self) -> String {
        let mut s = String::from(self.name());

        match self.parameter() {
            Parameter::None => {}
            Parameter::Optional { name, .. } => s.push_str(&format!(" [<{name}>]")),
            Parameter::Required { name } => s.push_str(&format!(" <{name}>")),
        }

        match self.layout() {
            Layout::Reference => s.push_str(" <reference> <image> [<image> ...]"),
            Layout::Each | Layout::Group => {
                for _ in 0..self.min_files() {
                    s.push_str(" <image>");
                }

                s.push_str(" [<image> ...]");
            }
        }

        s
    }
}
