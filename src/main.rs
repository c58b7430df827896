use anyhow::{Context, Result};
use clap::Parser;
use hbconv::batch::prepare_output_root;
use hbconv::logging::{init_tracing, ReportSink};
use hbconv::summary::write_preset_summary;
use hbconv::tools::require_tools;
use hbconv::{
    extract, load_document, translate, AppConfig, Batch, BatchOptions, CommandBuilder, Discovery,
    Mode, SystemRunner,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Convert a HandBrake JSON preset into ffmpeg commands and apply them to a media tree.",
    after_help = "Files are skipped if a '.noconvert' file exists in the same directory.\n\
                  By default, underscores in output file names are replaced with spaces.\n\
                  Use -V or --version to print the version."
)]
struct Args {
    /// HandBrake preset exported as JSON
    preset: PathBuf,

    /// Process media files recursively in subdirectories
    #[arg(short, long, default_value_t = false)]
    recursive: bool,

    /// Execute the generated ffmpeg commands
    #[arg(short, long, default_value_t = false)]
    execute: bool,

    /// Show what would be done without actually doing it
    #[arg(short, long, default_value_t = false)]
    dry_run: bool,

    /// Show only the ffmpeg equivalent of the preset
    #[arg(short = 'p', long, default_value_t = false)]
    show_preset: bool,

    /// Input directory (default: directory of the preset)
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Output directory (default: <input_dir>/converted)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Give every output the .m4v extension regardless of container
    #[arg(short = 'm', long, default_value_t = false)]
    force_m4v: bool,

    /// Keep underscores in output file names
    #[arg(short = 'u', long, default_value_t = false)]
    no_underscore_replace: bool,

    /// Name of the file that marks a directory as ignored (default: .noconvert)
    #[arg(long, value_name = "NAME")]
    ignore_flag: Option<String>,

    /// Show ffmpeg's own logs and debug diagnostics
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Write the run report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Configuration file (default: hbconv.json in the data or working directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every file succeeded.
fn run(args: &Args) -> Result<bool> {
    let cfg = AppConfig::load(args.config.as_deref())?;
    let document = load_document(&args.preset)?;
    let params = translate(&extract(&document)?);
    let builder = CommandBuilder::new(cfg.tools.ffmpeg.clone(), cfg.analyze_duration, cfg.probe_size)
        .verbose(args.verbose);
    let mode = Mode::from_flags(args.execute, args.dry_run);

    let mut sink = ReportSink::open(args.log.as_deref());

    let alternate = args.force_m4v.then(|| cfg.alternate_extension.clone());
    let output_format = match &alternate {
        Some(alt) if mode == Mode::Plan => {
            writeln!(sink, "Forcing output extension to .{}", alt)?;
            alt.clone()
        }
        Some(alt) => {
            writeln!(
                sink,
                "Force {} is enabled. Files will be converted to {} first, then renamed to .{}",
                alt, params.format, alt
            )?;
            params.format.clone()
        }
        None => params.format.clone(),
    };

    if args.show_preset {
        write_preset_summary(&mut sink, &params, &builder, &output_format)
            .context("writing preset summary")?;
        return Ok(true);
    }

    require_tools(&cfg.tools)?;

    let input_dir = match &args.input_dir {
        Some(dir) => dir.clone(),
        None => {
            let dir = match args.preset.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            writeln!(sink, "Using media directory: {}", dir.display())?;
            dir
        }
    };

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => {
            let dir = input_dir.join(&cfg.output_subdir);
            writeln!(sink, "Using output directory: {}", dir.display())?;
            dir
        }
    };

    prepare_output_root(&output_dir, mode, &mut sink)?;

    let ignore_flag = args
        .ignore_flag
        .clone()
        .unwrap_or_else(|| cfg.ignore_flag.clone());

    write_run_header(&mut sink, args, &cfg, &input_dir, &output_dir, &ignore_flag)?;

    let files = Discovery::new(&input_dir, &cfg.extensions)
        .recursive(args.recursive)
        .exclude(&output_dir)
        .run()?;
    tracing::debug!(count = files.len(), "media files found");

    let options = BatchOptions {
        input_root: input_dir,
        output_root: output_dir,
        mode,
        ignore_flag,
        replace_underscores: !args.no_underscore_replace,
        alternate_extension: alternate,
        document: Some(args.preset.clone()),
    };

    let result = Batch::new(&options, &params, &builder, SystemRunner, &mut sink)
        .prober(cfg.tools.ffprobe.clone())
        .run(&files)?;

    result
        .write_summary(&mut sink)
        .context("writing summary")?;

    Ok(result.is_clean())
}

fn write_run_header(
    out: &mut impl Write,
    args: &Args,
    cfg: &AppConfig,
    input_dir: &Path,
    output_dir: &Path,
    ignore_flag: &str,
) -> Result<()> {
    writeln!(out, "Searching for media files in {}", input_dir.display())?;
    writeln!(
        out,
        "Files with the '{}' file in their directory will be skipped",
        ignore_flag
    )?;
    writeln!(out, "Output directory set to: {}", output_dir.display())?;
    writeln!(
        out,
        "Using analyzeduration: {}, probesize: {}",
        cfg.analyze_duration, cfg.probe_size
    )?;

    if !args.no_underscore_replace {
        writeln!(
            out,
            "Underscores in filenames will be replaced with spaces in output files"
        )?;
    } else {
        writeln!(
            out,
            "Output filenames will maintain the same format as input filenames"
        )?;
    }

    if args.recursive {
        writeln!(out, "Recursive search enabled")?;
    } else {
        writeln!(out, "Non-recursive search")?;
    }

    if args.verbose {
        writeln!(out, "Verbose output enabled")?;
    }
    Ok(())
}
