use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sprite_extract::background::{FEATHER_SAMPLE_SIZE, SEGMENT_SAMPLE_SIZE};
use sprite_extract::{
    default_extract_dir, default_transparent_dir, default_transparent_path, extract_directory,
    extract_file, remove_background_directory, remove_background_file, FeatherOptions,
    ProcessOptions, ProcessResult, SegmentOptions,
};

#[derive(Parser)]
#[command(
    name = "sprite-extract",
    about = "Cut sprite sheets into elements and turn flat backgrounds into alpha",
    version,
    after_help = "Examples:\n  sprite-extract extract ui_sheet.png out/ 4 15 30\n  \
                  sprite-extract remove-bg buttons/ buttons_clean/ 25"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Split a sprite sheet (or a directory of sheets) into element PNGs
    Extract(ExtractArgs),
    /// Replace the background color with transparency
    RemoveBg(RemoveBgArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Input sheet or directory of sheets
    input: String,

    /// Output directory (default: {name}_elements)
    output: Option<String>,

    /// Extra pixels around each element
    #[arg(default_value_t = 4)]
    padding: u32,

    /// Minimum element width/height in pixels
    #[arg(default_value_t = 15)]
    min_size: u32,

    /// Color distance above which a pixel is foreground
    #[arg(default_value_t = 30.0)]
    threshold: f32,

    /// Corner window edge used to infer the background (must fit the sheet)
    #[arg(long, default_value_t = SEGMENT_SAMPLE_SIZE)]
    sample_size: u32,

    /// Do not write manifest.txt
    #[arg(long)]
    no_manifest: bool,
}

#[derive(Args)]
struct RemoveBgArgs {
    /// Input image or directory
    input: String,

    /// Output file or directory (default: {name}_transparent.png or {dir}_transparent)
    output: Option<String>,

    /// Color distance threshold (higher removes more)
    #[arg(default_value_t = 25.0)]
    threshold: f32,

    /// Corner window edge used to infer the background (must fit the image)
    #[arg(long, default_value_t = FEATHER_SAMPLE_SIZE)]
    sample_size: u32,

    /// Hard cutoff instead of feathered edges
    #[arg(long)]
    hard: bool,
}

fn init_logging(opts: &ProcessOptions) {
    let level = if opts.quiet {
        "error"
    } else if opts.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn require_input(input: &str) -> &Path {
    let path = Path::new(input);
    if !path.exists() {
        eprintln!("Error: Input path does not exist: {input}");
        process::exit(1);
    }
    path
}

fn run_extract(args: &ExtractArgs, opts: &ProcessOptions) -> Vec<ProcessResult> {
    let input = require_input(&args.input);

    let seg = SegmentOptions {
        color_threshold: args.threshold,
        padding: args.padding,
        min_size: args.min_size,
        sample_size: args.sample_size,
    };
    if let Err(e) = seg.validate() {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    let output = args
        .output
        .as_ref()
        .map_or_else(|| default_extract_dir(input), PathBuf::from);

    if !opts.quiet {
        eprintln!("Extracting UI elements from: {}", input.display());
        eprintln!("Output directory: {}", output.display());
        eprintln!();
    }

    if input.is_dir() {
        extract_directory(input, &output, &seg, opts)
    } else {
        vec![extract_file(input, &output, &seg, opts)]
    }
}

fn run_remove_bg(args: &RemoveBgArgs, opts: &ProcessOptions) -> Vec<ProcessResult> {
    let input = require_input(&args.input);

    let feather = FeatherOptions {
        threshold: args.threshold,
        feather: !args.hard,
        sample_size: args.sample_size,
    };
    if let Err(e) = feather.validate() {
        eprintln!("Error: {e}");
        process::exit(1);
    }

    if !opts.quiet {
        eprintln!(
            "Threshold: {} ({})",
            feather.threshold,
            if feather.feather { "feathered" } else { "hard cutoff" }
        );
        eprintln!();
    }

    if input.is_dir() {
        let output = args
            .output
            .as_ref()
            .map_or_else(|| default_transparent_dir(input), PathBuf::from);
        remove_background_directory(input, &output, &feather)
    } else {
        let output = args
            .output
            .as_ref()
            .map_or_else(|| default_transparent_path(input), PathBuf::from);
        vec![remove_background_file(input, &output, &feather)]
    }
}

fn main() {
    let cli = Cli::parse();

    let opts = ProcessOptions {
        write_manifest: !matches!(&cli.command, Command::Extract(a) if a.no_manifest),
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    init_logging(&opts);

    let results = match &cli.command {
        Command::Extract(args) => run_extract(args, &opts),
        Command::RemoveBg(args) => run_remove_bg(args, &opts),
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Empty: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success && result.failed_elements == 0 {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[EMPTY] {filename}: {}", result.message);
        }
    } else if result.success {
        if result.failed_elements > 0 {
            eprintln!("[PARTIAL] {filename}: {}", result.message);
        } else if !opts.quiet {
            eprintln!("[OK] {filename}: {}", result.message);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
