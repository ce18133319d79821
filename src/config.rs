use std::path::PathBuf;

use anyhow::bail;

use crate::timezone::TimezoneOffset;

const USAGE: &str = "\
exif-gps-fix - fixes wrong GPS date/time stamps in image EXIF data

USAGE:
    exif-gps-fix [OPTIONS] --timezone {+|-}HHMM <PATH>...

OPTIONS:
    --timezone {+|-}HHMM   UTC offset the photos were taken in, e.g. -0700.
                           Required with --auto-apply; prompted for otherwise.
    --auto-apply           Apply every fix without per-file confirmation.
    --no-backup            Skip copying originals aside before writing.
    --backup-dir <DIR>     Put backup copies in DIR instead of next to the
                           originals.
    --recursive            Descend into subdirectories of given folders.
    --follow-symlinks      Follow directory symlinks while recursing.
    -h, --help             Show this help.
";

/// Everything the run needs, resolved from the command line. The
/// processing layers take these as plain parameters and never look at the
/// environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    pub auto_apply: bool,
    pub backup: bool,
    pub backup_dir: Option<PathBuf>,
    pub recursive: bool,
    pub follow_symlinks: bool,
    /// `None` only in interactive mode, where the driver prompts for it.
    pub timezone: Option<TimezoneOffset>,
    pub paths: Vec<PathBuf>,
}

impl Config {
    pub fn from_args() -> anyhow::Result<Self> {
        let mut args = pico_args::Arguments::from_env();

        if args.contains(["-h", "--help"]) {
            print!("{}", USAGE);
            std::process::exit(0);
        }

        let auto_apply = args.contains("--auto-apply");
        let backup = !args.contains("--no-backup");
        let backup_dir = args
            .opt_value_from_str::<_, String>("--backup-dir")?
            .map(PathBuf::from);
        let recursive = args.contains("--recursive");
        let follow_symlinks = args.contains("--follow-symlinks");
        let timezone = args.opt_value_from_str::<_, TimezoneOffset>("--timezone")?;

        if auto_apply && timezone.is_none() {
            bail!("--timezone is required with --auto-apply");
        }

        let paths: Vec<PathBuf> = args.finish().into_iter().map(PathBuf::from).collect();
        if paths.is_empty() {
            bail!("no image paths given (try --help)");
        }

        Ok(Config {
            auto_apply,
            backup,
            backup_dir,
            recursive,
            follow_symlinks,
            timezone,
            paths,
        })
    }
}
