use anyhow::Result;
use clap::Parser;
use entsoe_extractor::{
    extract, DatasetExtraction, ExtractConfig, GapClass, ProgressReporter, ProgressSink,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "entsoe_extractor")]
#[command(about = "Extract ENTSO-E generation and cross-border flows per country and fill their gaps")]
struct Args {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target countries (comma separated)
    #[arg(long, value_delimiter = ',')]
    countries: Vec<String>,

    /// First month (YYYY-MM or YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last month (YYYY-MM or YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Directory of monthly generation files
    #[arg(long)]
    generation_dir: Option<PathBuf>,

    /// Directory of monthly physical flow files
    #[arg(long)]
    import_dir: Option<PathBuf>,

    /// Leave generation gaps unfilled
    #[arg(long)]
    no_correct_generation: bool,

    /// Leave cross-border flow gaps unfilled
    #[arg(long)]
    no_correct_import: bool,

    /// Longest gap in hours filled by interpolation
    #[arg(long)]
    n_hours: Option<u32>,

    /// Days around a long gap used for the average day
    #[arg(long)]
    days_around: Option<u32>,

    /// Largest relative gap size still auto-completed (0-1)
    #[arg(long)]
    limit: Option<f64>,

    /// Only detect resolutions and report missing data
    #[arg(long)]
    ignore: bool,

    #[arg(long)]
    save_generation: Option<PathBuf>,

    #[arg(long)]
    save_import: Option<PathBuf>,

    /// Directory for the resolution and gap reports
    #[arg(long)]
    save_resolution: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn into_config(self) -> Result<ExtractConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractConfig::from_file(path)?,
            None => ExtractConfig::default(),
        };

        if !self.countries.is_empty() {
            config.countries = self.countries;
        }
        config.start = self.start.or(config.start);
        config.end = self.end.or(config.end);
        config.generation_dir = self.generation_dir.or(config.generation_dir);
        config.import_dir = self.import_dir.or(config.import_dir);
        config.correct_generation &= !self.no_correct_generation;
        config.correct_import &= !self.no_correct_import;
        if let Some(n_hours) = self.n_hours {
            config.policy.n_hours = n_hours;
        }
        if let Some(days_around) = self.days_around {
            config.policy.days_around = days_around;
        }
        if let Some(limit) = self.limit {
            config.policy.limit = limit;
        }
        config.policy.ignore |= self.ignore;
        config.save_generation = self.save_generation.or(config.save_generation);
        config.save_import = self.save_import.or(config.save_import);
        config.save_resolution = self.save_resolution.or(config.save_resolution);
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build_global()?;

    let args = Args::parse();
    let quiet = args.quiet;
    let config = args.into_config()?;
    let request = config.to_request()?;

    println!("⚡ ENTSO-E extraction");
    println!("Using {} CPU cores", rayon::current_num_threads());
    println!("Countries: {}", request.countries.join(", "));
    println!("{}", "=".repeat(60));

    let reporter = if quiet {
        None
    } else {
        Some(ProgressReporter::new("Extracting")?)
    };
    let progress = reporter.as_ref().map(|r| r as &dyn ProgressSink);

    let extraction = extract(&request, progress)?;
    if let Some(reporter) = &reporter {
        reporter.finish();
    }

    for dataset in [&extraction.generation, &extraction.import].into_iter().flatten() {
        print_summary(dataset);
    }

    println!("\n{}", "=".repeat(60));
    println!("✅ Extraction complete");
    info!("Done");
    Ok(())
}

fn print_summary(dataset: &DatasetExtraction) {
    let report = &dataset.report;
    println!("\n📊 {}", dataset.kind);
    println!("  {} origins", dataset.universe.len());
    for (country, matrix) in &dataset.matrices {
        println!(
            "  {}: {} quarter hours, {} missing cells",
            country,
            matrix.height(),
            matrix.missing_cells()
        );
    }
    println!(
        "  Gaps: {} short, {} long, {} oversized",
        report.count(GapClass::Short),
        report.count(GapClass::Long),
        report.count(GapClass::Oversized)
    );
    if report.total_cells > 0 {
        println!("  Missing before filling: {:.2}%", 100.0 * report.missing_share());
    }
}
