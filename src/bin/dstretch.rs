use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use dstretch::{default_output_path, ColorSpace, ProcessOptions, ProcessResult};

#[derive(Clone, Copy, ValueEnum)]
enum ColorSpaceArg {
    /// Stretch in CIE L*a*b* (recommended)
    Lab,
    /// Stretch the RGB channels directly
    Rgb,
}

#[derive(Parser)]
#[command(
    name = "dstretch",
    about = "Decorrelation-stretch contrast enhancement for color images",
    version,
    after_help = "Simple usage: dstretch <image>  (writes {name}_dcs.{ext})\n\n\
                  Without --target-mean/--target-sigma the output keeps the\n\
                  input's own per-channel mean and spread; the stretch only\n\
                  removes cross-channel correlation."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_dcs.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Color space to stretch in
    #[arg(short, long, value_enum, default_value_t = ColorSpaceArg::Lab)]
    colorspace: ColorSpaceArg,

    /// Desired output mean, applied to every channel (e.g. 120)
    #[arg(long)]
    target_mean: Option<f64>,

    /// Desired output standard deviation, applied to every channel (e.g. 50)
    #[arg(long)]
    target_sigma: Option<f64>,

    /// Low percentile cut for byte quantization (0.0-1.0)
    #[arg(long, default_value = "0.02")]
    p_low: f64,

    /// High percentile cut for byte quantization (0.0-1.0)
    #[arg(long, default_value = "0.98")]
    p_high: f64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if !(0.0..=1.0).contains(&cli.p_low)
        || !(0.0..=1.0).contains(&cli.p_high)
        || cli.p_low >= cli.p_high
    {
        eprintln!("Error: Percentile cuts must satisfy 0.0 <= p-low < p-high <= 1.0");
        process::exit(1);
    }

    if let Some(sigma) = cli.target_sigma {
        if sigma <= 0.0 {
            eprintln!("Error: Target sigma must be positive");
            process::exit(1);
        }
    }

    let opts = ProcessOptions {
        colorspace: match cli.colorspace {
            ColorSpaceArg::Lab => ColorSpace::Lab,
            ColorSpaceArg::Rgb => ColorSpace::Rgb,
        },
        target_mean: cli.target_mean,
        target_sigma: cli.target_sigma,
        p_low: cli.p_low,
        p_high: cli.p_high,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: dstretch <input_dir> -o <output_dir>");
            process::exit(1);
        };
        dstretch::process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![dstretch::process_file(input_path, &output_path, &opts)]
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
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            eprintln!("[OK] {filename}");
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
