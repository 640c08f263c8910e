use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "fslverb",
    version,
    about = "Short verbs for FSL command-line tools",
    override_usage = "fslverb [OPTIONS] <OPERATION> <ARG> [<ARG> ...]"
)]
pub struct Cli {
    /// FSL installation directory.
    ///
    /// Programs are looked up in its `bin` directory before `PATH`.
    #[arg(long, env = "FSLDIR")]
    pub fsldir: Option<PathBuf>,

    /// Image viewer used by `view`.
    #[arg(long, env = "FSL_VIEWER", default_value = "fsleyes")]
    pub viewer: String,

    /// Exit with status 2 on usage errors and unknown operations.
    #[arg(long, env = "FSLVERB_STRICT")]
    pub strict: bool,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log every external command line.
    #[arg(short, long)]
    pub verbose: bool,

    /// Operation name or alias.
    pub operation: Option<String>,

    /// An optional numeric parameter followed by input images.
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    pub args: Vec<String>,
}
