use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sift_client::{FetcherConfig, ReqwestFetcher};
use sift_core::{Output, PagingJob, UrlSet, WorkerConfig, WorkerPool};

#[derive(Parser)]
#[command(name = "sift", version, about = "Declarative tag-keyed page extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch pages and extract structured results
    Run {
        /// Target URL (repeatable)
        #[arg(short, long)]
        url: Vec<String>,

        /// URL template for a page range; `{}` is replaced by the page number
        #[arg(long)]
        range: Option<String>,

        /// First page of the range (inclusive)
        #[arg(long)]
        from: Option<i64>,

        /// Last page of the range (inclusive)
        #[arg(long)]
        to: Option<i64>,

        /// Tag grouping every URL's results (defaults to each URL)
        #[arg(short, long)]
        tag: Option<String>,

        /// Also emit each page's visible text
        #[arg(long, default_value_t = false)]
        page_text: bool,

        /// CSS selector matching the repeating elements to extract
        #[arg(short, long)]
        select: Option<String>,

        /// Field as NAME=CHAIN, e.g. `link=find:a/attr:href` (repeatable)
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Maximum pages fetched at once (reads SIFT_CONCURRENCY if not provided)
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Request timeout in seconds (reads SIFT_TIMEOUT_SECS if not provided)
        #[arg(long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NarrowOp {
    Children,
    Find(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Leaf {
    Text,
    Attr(String),
}

/// One `--field`: narrowing ops, then a leaf, bound to a name.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldSpec {
    name: String,
    narrowing: Vec<NarrowOp>,
    leaf: Leaf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sift=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            url,
            range,
            from,
            to,
            tag,
            page_text,
            select,
            fields,
            concurrency,
            timeout,
            format,
        } => {
            let urls = build_url_set(url, range.as_deref(), from, to, tag)?;
            let fields = fields
                .iter()
                .map(|f| parse_field(f))
                .collect::<Result<Vec<_>>>()?;
            let columns = match format {
                Format::Csv => Some(csv_columns(page_text, &fields)?),
                Format::Json => None,
            };
            let job = build_job(urls, page_text, select.as_deref(), &fields)?;

            let mut worker_config = WorkerConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
            if let Some(n) = concurrency {
                worker_config = worker_config.with_concurrency(n);
            }
            let mut fetcher_config = FetcherConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
            if let Some(secs) = timeout {
                fetcher_config = fetcher_config.with_timeout(Duration::from_secs(secs.max(1)));
            }

            cmd_run(job, worker_config, &fetcher_config, columns).await?;
        }
    }

    Ok(())
}

fn build_url_set(
    urls: Vec<String>,
    range: Option<&str>,
    from: Option<i64>,
    to: Option<i64>,
    tag: Option<String>,
) -> Result<UrlSet> {
    let mut set = UrlSet::many(urls);
    if let Some(template) = range {
        let (Some(from), Some(to)) = (from, to) else {
            bail!("--range requires both --from and --to");
        };
        set = set.extend(UrlSet::range(template, from, to).urls().iter().cloned());
    }
    if set.is_empty() {
        bail!("No URLs given. Use --url or --range with --from/--to.");
    }
    if let Some(tag) = tag {
        set = set.tag(tag);
    }
    Ok(set)
}

/// Parse `NAME=CHAIN` where CHAIN is `/`-separated `children`, `find:EXPR`
/// ops ending in `text` or `attr:NAME`.
fn parse_field(spec: &str) -> Result<FieldSpec> {
    let (name, chain) = spec
        .split_once('=')
        .with_context(|| format!("Field '{spec}' must look like NAME=CHAIN"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Field '{spec}' has an empty name");
    }

    let mut parts: Vec<&str> = chain.split('/').map(str::trim).collect();
    let leaf = match parts.pop() {
        Some("text") => Leaf::Text,
        Some(last) if last.starts_with("attr:") && last.len() > "attr:".len() => {
            Leaf::Attr(last["attr:".len()..].to_string())
        }
        _ => bail!("Field '{spec}' must end in `text` or `attr:NAME`"),
    };

    let narrowing = parts
        .into_iter()
        .map(|op| match op {
            "children" => Ok(NarrowOp::Children),
            _ => match op.strip_prefix("find:") {
                Some(expr) if !expr.is_empty() => Ok(NarrowOp::Find(expr.to_string())),
                _ => bail!("Unknown step '{op}' in field '{spec}' (expected `children` or `find:EXPR`)"),
            },
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FieldSpec {
        name: name.to_string(),
        narrowing,
        leaf,
    })
}

fn build_job(
    urls: UrlSet,
    page_text: bool,
    select: Option<&str>,
    fields: &[FieldSpec],
) -> Result<PagingJob> {
    let mut job = PagingJob::from(urls);
    if page_text {
        job.text();
    }

    match select {
        Some(selector) => {
            if fields.is_empty() {
                bail!("--select needs at least one --field");
            }
            let mut builder = job.select(selector);
            for field in fields {
                for op in &field.narrowing {
                    builder = match op {
                        NarrowOp::Children => builder.children(),
                        NarrowOp::Find(expr) => builder.find(expr),
                    };
                }
                builder = match &field.leaf {
                    Leaf::Text => builder.text(),
                    Leaf::Attr(attr) => builder.attr(attr),
                };
                builder = builder.alias(&field.name);
            }
            builder.build().map_err(|e| anyhow::anyhow!(e))?;
        }
        None if !fields.is_empty() => bail!("--field requires --select"),
        None => {}
    }

    if job.task_count() == 0 {
        bail!("Nothing to extract. Use --select with --field, or --page-text.");
    }
    Ok(job)
}

async fn cmd_run(
    mut job: PagingJob,
    worker_config: WorkerConfig,
    fetcher_config: &FetcherConfig,
    csv_columns: Option<Vec<String>>,
) -> Result<()> {
    let fetcher = ReqwestFetcher::with_config(fetcher_config).context("Failed to create HTTP client")?;
    let pool = WorkerPool::new(fetcher, worker_config);

    tracing::info!("Processing {} URLs with {} tasks", job.urls().len(), job.task_count());
    let report = job.run(&pool).await;

    for failure in &report.failures {
        eprintln!("  skipped {} ({})", failure.url, failure.error);
    }
    if report.all_failed() {
        bail!("None of the {} URLs could be fetched", report.attempted);
    }

    let mut stdout = std::io::stdout().lock();
    match csv_columns {
        None => {
            writeln!(stdout, "{}", serde_json::to_string_pretty(job.output())?)?;
        }
        Some(columns) => write_csv(&mut stdout, &columns, job.output())?,
    }

    eprintln!(
        "\n{} of {} URLs processed, {} results",
        report.succeeded, report.attempted, report.tuples
    );
    Ok(())
}

/// CSV column names after `tag`, one per extraction slot.
///
/// Page-text rows and field rows share one tag map and cannot be told
/// apart, so a CSV table holds one or the other.
fn csv_columns(page_text: bool, fields: &[FieldSpec]) -> Result<Vec<String>> {
    if page_text && !fields.is_empty() {
        bail!("--format csv cannot mix --page-text with --field columns; use --format json");
    }
    if page_text {
        return Ok(vec!["page_text".to_string()]);
    }
    Ok(fields.iter().map(|f| f.name.clone()).collect())
}

/// One row per tuple, sorted by tag: `tag,slot0,slot1,...`.
fn write_csv<W: Write>(out: W, columns: &[String], output: &Output) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);

    let mut header = vec!["tag"];
    header.extend(columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    write_rows(&mut writer, output)?;
    writer.flush()?;
    Ok(())
}

fn write_rows<W: Write>(writer: &mut csv::Writer<W>, output: &Output) -> Result<()> {
    for tag in output.tags() {
        for tuple in output.get(tag) {
            let mut row = vec![tag];
            row.extend(tuple.values().iter().map(String::as_str));
            writer.write_record(&row)?;
        }
    }
    Ok(())
}
