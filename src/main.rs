use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rayon::prelude::*;

use exif_gps_fix::config::Config;
use exif_gps_fix::error::FixError;
use exif_gps_fix::file_scanner::FileScanner;
use exif_gps_fix::photo_processor::{self, FixOutcome, ProposedFix};
use exif_gps_fix::timezone::TimezoneOffset;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_args()?;
    let timezone = match config.timezone {
        Some(timezone) => timezone,
        None => prompt_timezone()?,
    };

    let scanner = FileScanner::new(config.recursive, config.follow_symlinks);
    let files = scanner.collect(&config.paths);
    if files.is_empty() {
        println!("No image files to process.");
        return Ok(());
    }
    info!(
        "Processing {} files with timezone offset {}",
        files.len(),
        timezone
    );

    // Files are independent, so classification fans out; all writes happen
    // afterwards, behind the confirmation gate, in input order.
    let results: Vec<(PathBuf, Result<FixOutcome, FixError>)> = files
        .par_iter()
        .map(|path| (path.clone(), photo_processor::process(path, timezone)))
        .collect();

    let mut summary = Summary::default();
    let mut gate = ConfirmationGate::new(config.auto_apply);
    for (path, result) in results {
        match result {
            Ok(FixOutcome::Proposed(fix)) => match gate.ask(&path, &fix)? {
                Decision::Apply => apply_fix(&path, &fix, &config, &mut summary),
                Decision::Decline => summary.declined += 1,
            },
            Ok(FixOutcome::AlreadyCorrect) => summary.already_correct += 1,
            Ok(FixOutcome::NoGpsData) => {
                info!("{}: no GPS stamps, nothing to fix", path.display());
                summary.no_gps += 1;
            }
            Ok(FixOutcome::NoCaptureTime) => {
                warn!("{}: no usable capture timestamp, skipping", path.display());
                summary.no_capture += 1;
            }
            Err(e) => {
                error!("{}: {}", path.display(), e);
                summary.errors += 1;
            }
        }
    }

    summary.report();
    if summary.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn apply_fix(path: &Path, fix: &ProposedFix, config: &Config, summary: &mut Summary) {
    if config.backup {
        if let Err(e) = backup_original(path, config.backup_dir.as_deref()) {
            error!(
                "{}: backup failed, leaving file untouched: {}",
                path.display(),
                e
            );
            summary.errors += 1;
            return;
        }
    }
    match photo_processor::commit(path, fix) {
        Ok(()) => {
            info!("{}: GPS timestamp set to {} UTC", path.display(), fix.new_gps);
            summary.fixed += 1;
        }
        Err(e) => {
            error!("{}: {}", path.display(), e);
            summary.errors += 1;
        }
    }
}

/// Copies the original aside before it gets overwritten: `<name>.<ext>.bak`
/// next to it, or the same filename inside the backup directory.
fn backup_original(path: &Path, backup_dir: Option<&Path>) -> io::Result<()> {
    let target = match backup_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            match path.file_name() {
                Some(name) => dir.join(name),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "path has no file name",
                    ))
                }
            }
        }
        None => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".bak");
            PathBuf::from(name)
        }
    };
    fs::copy(path, &target)?;
    Ok(())
}

fn prompt_timezone() -> anyhow::Result<TimezoneOffset> {
    loop {
        print!("Timezone offset the photos were taken in ({{+|-}}HHMM, e.g. -0700): ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            anyhow::bail!("no timezone offset provided");
        }
        match line.trim().parse::<TimezoneOffset>() {
            Ok(timezone) => return Ok(timezone),
            Err(e) => println!("{}", e),
        }
    }
}

enum Decision {
    Apply,
    Decline,
}

/// Per-file confirmation in interactive mode; a pass-through with
/// `--auto-apply`. "all" stops asking, "quit" declines the rest.
struct ConfirmationGate {
    auto: bool,
    apply_all: bool,
    quit: bool,
    disclaimed: bool,
}

impl ConfirmationGate {
    fn new(auto: bool) -> Self {
        Self {
            auto,
            apply_all: false,
            quit: false,
            disclaimed: false,
        }
    }

    fn ask(&mut self, path: &Path, fix: &ProposedFix) -> anyhow::Result<Decision> {
        if self.auto || self.apply_all {
            return Ok(Decision::Apply);
        }
        if self.quit {
            return Ok(Decision::Decline);
        }
        if !self.disclaimed {
            println!("This rewrites GPS date/time EXIF fields inside your image files.");
            println!("Originals are copied aside first unless --no-backup was given.");
            self.disclaimed = true;
        }

        let old = fix
            .old_gps
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unreadable".to_string());
        println!("{}: GPS {} -> {} (UTC)", path.display(), old, fix.new_gps);
        loop {
            print!("Apply fix? [y]es / [n]o / [a]ll / [q]uit: ");
            io::stdout().flush()?;
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                self.quit = true;
                return Ok(Decision::Decline);
            }
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(Decision::Apply),
                "n" | "no" => return Ok(Decision::Decline),
                "a" | "all" => {
                    self.apply_all = true;
                    return Ok(Decision::Apply);
                }
                "q" | "quit" => {
                    self.quit = true;
                    return Ok(Decision::Decline);
                }
                _ => println!("Please answer y, n, a, or q."),
            }
        }
    }
}

#[derive(Default)]
struct Summary {
    fixed: usize,
    already_correct: usize,
    no_gps: usize,
    no_capture: usize,
    declined: usize,
    errors: usize,
}

impl Summary {
    fn report(&self) {
        println!(
            "Done: {} fixed, {} already correct, {} without GPS stamps, {} without capture time, {} declined, {} errors",
            self.fixed,
            self.already_correct,
            self.no_gps,
            self.no_capture,
            self.declined,
            self.errors
        );
    }
}
