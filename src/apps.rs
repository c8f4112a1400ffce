use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::{GeneratorConfig, RunPlan};
use crate::constants::defaults::{DEFAULT_NUM_DEMOS, DEFAULT_SEED};
use crate::export::{JsonlExporter, MemoryExporter};
use crate::format::ContextFormat;
use crate::pairs::PairPool;
use crate::run::{RunSummary, generate_run};
use crate::sizer::{SizeHintCache, size_to_target};
#[cfg(feature = "huggingface")]
use crate::tokenizer::HuggingFaceTokenizer;
use crate::tokenizer::{CharWindowTokenizer, Tokenizer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
    Tsv,
    Text,
}

impl From<FormatArg> for ContextFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => ContextFormat::Json,
            FormatArg::Csv => ContextFormat::Csv,
            FormatArg::Tsv => ContextFormat::Tsv,
            FormatArg::Text => ContextFormat::Text,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "generate_kv_dataset",
    disable_help_subcommand = true,
    about = "Generate bucketed key-value extraction records",
    long_about = "Generate one benchmark split per (context size, query count) combination, with records stratified across equal-width depth buckets.",
    after_help = "Without --output-dir the records are generated in memory and only summarized, which is useful for dry runs."
)]
struct GenerateKvDatasetCli {
    #[arg(
        long = "context-size",
        value_name = "TOKENS",
        required = true,
        value_parser = parse_positive_usize,
        help = "Target context size in tokens, repeat for a batch"
    )]
    context_sizes: Vec<usize>,
    #[arg(
        long = "num-query-keys",
        value_name = "K",
        default_values_t = [1],
        value_parser = parse_positive_usize,
        help = "Keys queried per record, repeat for a batch"
    )]
    num_query_keys: Vec<usize>,
    #[arg(
        long,
        value_enum,
        default_value = "json",
        help = "Context serialization format"
    )]
    format: FormatArg,
    #[arg(
        long = "num-examples-per-bucket",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Records to collect per depth bucket"
    )]
    num_examples_per_bucket: usize,
    #[arg(
        long = "num-buckets",
        default_value_t = 10,
        value_parser = parse_positive_usize,
        help = "Number of equal-width depth buckets"
    )]
    num_buckets: usize,
    #[arg(
        long = "num-demos",
        default_value_t = DEFAULT_NUM_DEMOS,
        help = "In-context demonstration groups per record (0 disables demos)"
    )]
    num_demos: usize,
    #[arg(
        long,
        default_value_t = DEFAULT_SEED,
        help = "Deterministic seed for pair generation and group selection"
    )]
    seed: u64,
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        help = "Directory for JSONL splits; omit for an in-memory dry run"
    )]
    output_dir: Option<PathBuf>,
    #[arg(
        long,
        requires = "output_dir",
        help = "Mark exported splits as private in their manifests"
    )]
    private: bool,
    #[arg(
        long = "hint-cache",
        value_name = "PATH",
        help = "Size-hint cache file, loaded before the run and saved after"
    )]
    hint_cache: Option<PathBuf>,
    #[arg(
        long = "chars-per-token",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Window width for the built-in character-window tokenizer"
    )]
    chars_per_token: usize,
    #[cfg(feature = "huggingface")]
    #[arg(
        long = "tokenizer-file",
        value_name = "PATH",
        help = "Size against a local tokenizer.json instead of the character window"
    )]
    tokenizer_file: Option<PathBuf>,
    #[cfg(feature = "huggingface")]
    #[arg(
        long,
        value_name = "MODEL_ID",
        conflicts_with = "tokenizer_file",
        help = "Size against a hub model's tokenizer instead of the character window"
    )]
    model: Option<String>,
}

impl GenerateKvDatasetCli {
    fn tokenizer(&self) -> Result<Box<dyn Tokenizer>, Box<dyn Error>> {
        #[cfg(feature = "huggingface")]
        {
            if let Some(path) = &self.tokenizer_file {
                return Ok(Box::new(HuggingFaceTokenizer::from_file(path)?));
            }
            if let Some(model) = &self.model {
                return Ok(Box::new(HuggingFaceTokenizer::from_pretrained(model)?));
            }
        }
        Ok(Box::new(CharWindowTokenizer::new(self.chars_per_token)?))
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "size_probe",
    disable_help_subcommand = true,
    about = "Probe how many pairs a token target needs",
    long_about = "Run the adaptive sizing search for each target and report the resulting pair count and measured token count, without generating records."
)]
struct SizeProbeCli {
    #[arg(
        long = "target",
        value_name = "TOKENS",
        required = true,
        value_parser = parse_positive_usize,
        help = "Target token count, repeat as needed"
    )]
    targets: Vec<usize>,
    #[arg(
        long,
        value_enum,
        default_value = "json",
        help = "Context serialization format"
    )]
    format: FormatArg,
    #[arg(
        long = "min-pairs",
        default_value_t = 1,
        value_parser = parse_positive_usize,
        help = "Lower bound on the pair count"
    )]
    min_pairs: usize,
    #[arg(
        long,
        default_value_t = DEFAULT_SEED,
        help = "Seed for the probe's pair stream"
    )]
    seed: u64,
    #[arg(
        long = "hint-cache",
        value_name = "PATH",
        help = "Size-hint cache file, loaded before the probe and saved after"
    )]
    hint_cache: Option<PathBuf>,
    #[arg(
        long = "chars-per-token",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Window width for the built-in character-window tokenizer"
    )]
    chars_per_token: usize,
    #[cfg(feature = "huggingface")]
    #[arg(
        long = "tokenizer-file",
        value_name = "PATH",
        help = "Size against a local tokenizer.json instead of the character window"
    )]
    tokenizer_file: Option<PathBuf>,
    #[cfg(feature = "huggingface")]
    #[arg(
        long,
        value_name = "MODEL_ID",
        conflicts_with = "tokenizer_file",
        help = "Size against a hub model's tokenizer instead of the character window"
    )]
    model: Option<String>,
}

impl SizeProbeCli {
    fn tokenizer(&self) -> Result<Box<dyn Tokenizer>, Box<dyn Error>> {
        #[cfg(feature = "huggingface")]
        {
            if let Some(path) = &self.tokenizer_file {
                return Ok(Box::new(HuggingFaceTokenizer::from_file(path)?));
            }
            if let Some(model) = &self.model {
                return Ok(Box::new(HuggingFaceTokenizer::from_pretrained(model)?));
            }
        }
        Ok(Box::new(CharWindowTokenizer::new(self.chars_per_token)?))
    }
}

/// Run the dataset generator CLI over `args_iter` (binary name excluded).
pub fn run_generate_kv_dataset<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<GenerateKvDatasetCli, _>(
        std::iter::once("generate_kv_dataset".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let tokenizer = cli.tokenizer()?;
    let plan = RunPlan {
        context_sizes: cli.context_sizes.clone(),
        query_key_counts: cli.num_query_keys.clone(),
        base: GeneratorConfig {
            seed: cli.seed,
            format: cli.format.into(),
            num_demo_groups: cli.num_demos,
            num_buckets: cli.num_buckets,
            examples_per_bucket: cli.num_examples_per_bucket,
        },
    };

    let mut hints = match &cli.hint_cache {
        Some(path) => SizeHintCache::load(path, tokenizer.identity())?,
        None => SizeHintCache::new(tokenizer.identity()),
    };

    let summary = match &cli.output_dir {
        Some(dir) => {
            let mut sink = JsonlExporter::new(dir.clone()).with_private(cli.private);
            generate_run(&plan, tokenizer.as_ref(), &mut sink, &mut hints)?
        }
        None => {
            let mut sink = MemoryExporter::new();
            generate_run(&plan, tokenizer.as_ref(), &mut sink, &mut hints)?
        }
    };

    if let Some(path) = &cli.hint_cache {
        hints.save(path)?;
    }

    print_summary(&summary, cli.output_dir.as_deref());
    Ok(())
}

/// Run the sizing probe CLI over `args_iter` (binary name excluded).
pub fn run_size_probe<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) =
        parse_cli::<SizeProbeCli, _>(std::iter::once("size_probe".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let tokenizer = cli.tokenizer()?;
    let format: ContextFormat = cli.format.into();
    let mut hints = match &cli.hint_cache {
        Some(path) => SizeHintCache::load(path, tokenizer.identity())?,
        None => SizeHintCache::new(tokenizer.identity()),
    };

    let mut pool = PairPool::new(cli.seed);
    println!("=== context sizing probe ===");
    println!("format: {format}");
    println!("tokenizer: {}", tokenizer.identity());
    for &target in &cli.targets {
        let sized = size_to_target(
            &mut pool,
            tokenizer.as_ref(),
            format,
            target,
            cli.min_pairs,
            &mut hints,
        )?;
        println!(
            "target {target}: {} pairs, {} tokens",
            sized.num_pairs, sized.token_count
        );
    }

    if let Some(path) = &cli.hint_cache {
        hints.save(path)?;
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, output_dir: Option<&Path>) {
    println!("=== kv extraction dataset ===");
    match output_dir {
        Some(dir) => println!("output: {}", dir.display()),
        None => println!("output: in-memory (dry run)"),
    }
    for outcome in &summary.completed {
        let underfilled = outcome.fill.underfilled().len();
        if underfilled == 0 {
            println!("{}: {} records", outcome.key, outcome.num_records);
        } else {
            println!(
                "{}: {} records ({} of {} buckets underfilled)",
                outcome.key,
                outcome.num_records,
                underfilled,
                outcome.fill.buckets.len()
            );
        }
    }
    for (key, reason) in &summary.failed {
        println!("{key}: FAILED ({reason})");
    }
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_generate(args: &[&str]) -> Result<GenerateKvDatasetCli, clap::Error> {
        GenerateKvDatasetCli::try_parse_from(
            std::iter::once("generate_kv_dataset").chain(args.iter().copied()),
        )
    }

    #[test]
    fn generate_cli_parses_a_batch() {
        let cli = parse_generate(&[
            "--context-size",
            "4096",
            "--context-size",
            "8192",
            "--num-query-keys",
            "1",
            "--num-query-keys",
            "2",
            "--format",
            "csv",
            "--num-examples-per-bucket",
            "5",
            "--seed",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.context_sizes, vec![4096, 8192]);
        assert_eq!(cli.num_query_keys, vec![1, 2]);
        assert_eq!(ContextFormat::from(cli.format), ContextFormat::Csv);
        assert_eq!(cli.num_examples_per_bucket, 5);
        assert_eq!(cli.num_buckets, 10);
        assert_eq!(cli.num_demos, DEFAULT_NUM_DEMOS);
        assert_eq!(cli.seed, 7);
        assert!(cli.output_dir.is_none());
    }

    #[test]
    fn generate_cli_rejects_zero_context_size() {
        assert!(parse_generate(&["--context-size", "0"]).is_err());
        assert!(parse_generate(&[]).is_err());
    }

    #[test]
    fn private_requires_an_output_dir() {
        assert!(parse_generate(&["--context-size", "300", "--private"]).is_err());
        assert!(
            parse_generate(&["--context-size", "300", "--output-dir", "out", "--private"]).is_ok()
        );
    }

    #[test]
    fn format_arg_covers_all_four_formats() {
        for (tag, format) in [
            ("json", ContextFormat::Json),
            ("csv", ContextFormat::Csv),
            ("tsv", ContextFormat::Tsv),
            ("text", ContextFormat::Text),
        ] {
            let cli = parse_generate(&["--context-size", "300", "--format", tag]).unwrap();
            assert_eq!(ContextFormat::from(cli.format), format);
        }
    }

    #[test]
    fn dry_run_generates_in_memory() {
        let args = [
            "--context-size",
            "300",
            "--num-buckets",
            "2",
            "--chars-per-token",
            "1",
            "--format",
            "text",
            "--num-demos",
            "1",
        ];
        run_generate_kv_dataset(args.iter().map(|arg| arg.to_string())).unwrap();
    }

    #[test]
    fn probe_writes_its_hint_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("hints.json");
        let args = [
            "--target".to_string(),
            "200".to_string(),
            "--format".to_string(),
            "csv".to_string(),
            "--chars-per-token".to_string(),
            "1".to_string(),
            "--hint-cache".to_string(),
            cache.display().to_string(),
        ];
        run_size_probe(args.into_iter()).unwrap();
        assert!(cache.exists());
        let reloaded = SizeHintCache::load(&cache, "char-window/1").unwrap();
        assert_eq!(reloaded.initial_guess(ContextFormat::Csv, 200), Some(3));
    }
}
