use super::*;
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Mirror git repositories from a source to one or more replicas"
)]
pub(super) struct Cli {
    #[arg(
        long,
        value_name = "DIR",
        help = "Where repositories are cloned on the local machine"
    )]
    pub(super) clone_dir: PathBuf,
    #[arg(
        long,
        value_name = "FILE",
        help = "Tab-delimited file: a source url followed by one or more destination urls per line"
    )]
    pub(super) config: PathBuf,
    #[arg(
        long,
        visible_alias = "jobs",
        default_value_t = NonZeroUsize::MIN,
        help = "How many repositories are mirrored at the same time"
    )]
    pub(super) threads: NonZeroUsize,
    #[arg(
        long,
        default_value_t = 0,
        help = "Extra attempts for repositories that failed"
    )]
    pub(super) retries: u32,
    #[arg(
        long,
        value_name = "PROGRAM",
        default_value = "git",
        help = "git executable to run"
    )]
    pub(super) git: PathBuf,
    #[arg(long, value_name = "FILE", help = "Write a JSON run report to FILE")]
    pub(super) report: Option<PathBuf>,
    #[arg(short, long, help = "Log debug output, including every git command")]
    pub(super) verbose: bool,
}
