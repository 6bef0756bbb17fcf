use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use termscan_core::{
    builtin_rule_set, high_risk, render_clauses, render_report, AnalysisConfig, AnalysisReport,
    AnalysisStats, Analyzer, BuiltinRuleRepository, DefaultAnalyzer, Document, DocumentId,
    DocumentSource, FileRuleRepository, OutputFormat, RuleKind, RulePack, RuleRepository,
    RuleSet, DEFAULT_MIN_RISK,
};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Pasted text shorter than this is rejected before analysis.
const MIN_PASTE_CHARS: usize = 50;
const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];

#[derive(Parser, Debug)]
#[command(
    name = "termscan",
    author,
    version,
    about = "Flag risky clauses in terms-of-service documents"
)]
struct Cli {
    /// Directory containing a rule pack (keywords.txt, patterns.json, categories.json)
    #[arg(long = "rules-dir", value_name = "DIR", global = true)]
    rules_dir: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON) overriding analysis settings
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze documents and list their risky clauses
    Analyze {
        /// Plain-text documents; reads pasted text from stdin when omitted or `-`
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// List clauses at or above a risk score across all given documents
    HighRisk {
        paths: Vec<PathBuf>,
        #[arg(long = "min-risk", default_value_t = DEFAULT_MIN_RISK)]
        min_risk: f64,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// Print aggregate counts across all given documents
    Stats {
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// List the active rule pack
    ListRules {
        /// Emit rules as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
    Yaml,
}

#[derive(Debug, Default, Deserialize)]
struct Settings {
    #[serde(default)]
    analysis: AnalysisConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze { paths, format } => {
            let reports = analyze_inputs(&cli.rules_dir, settings, &paths).await?;
            print_reports(&reports, format)?;
        }
        Commands::HighRisk {
            paths,
            min_risk,
            format,
        } => {
            let reports = analyze_inputs(&cli.rules_dir, settings, &paths).await?;
            let clauses = high_risk(&reports, min_risk);
            match format {
                Format::Human => print!("{}", render_clauses(&clauses)?),
                Format::Json => println!("{}", serde_json::to_string_pretty(&clauses)?),
                Format::Yaml => print!("{}", serde_yaml::to_string(&clauses)?),
            }
        }
        Commands::Stats { paths, format } => {
            let threshold = settings.analysis.high_risk_threshold;
            let reports = analyze_inputs(&cli.rules_dir, settings, &paths).await?;
            let stats = AnalysisStats::from_reports(&reports, threshold);
            match format {
                Format::Human => {
                    println!("Documents: {}", stats.total_documents);
                    println!("Clauses: {}", stats.total_clauses);
                    println!("High risk clauses: {}", stats.high_risk_clauses);
                }
                Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                Format::Yaml => print!("{}", serde_yaml::to_string(&stats)?),
            }
        }
        Commands::ListRules { json } => list_rules(cli.rules_dir.as_deref(), json).await?,
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    builder = builder.add_source(
        config::Environment::with_prefix("TERMSCAN")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let settings = builder
        .build()
        .context("failed to load configuration")?
        .try_deserialize::<Settings>()
        .context("invalid configuration")?;
    settings
        .analysis
        .validate()
        .context("invalid configuration")?;
    debug!(?settings, "configuration loaded");
    Ok(settings)
}

async fn load_rule_pack(rules_dir: Option<&Path>) -> Result<RulePack> {
    let repo: Box<dyn RuleRepository> = match rules_dir {
        Some(dir) => Box::new(FileRuleRepository::new(dir)),
        None => Box::new(BuiltinRuleRepository),
    };
    repo.load_rule_pack().await.with_context(|| match rules_dir {
        Some(dir) => format!("failed to load rules from {}", dir.display()),
        None => "failed to load built-in rules".to_string(),
    })
}

async fn load_rules(rules_dir: Option<&Path>) -> Result<Arc<RuleSet>> {
    match rules_dir {
        Some(dir) => {
            let pack = load_rule_pack(Some(dir)).await?;
            let rules = RuleSet::compile(&pack)
                .with_context(|| format!("invalid rule pack in {}", dir.display()))?;
            Ok(Arc::new(rules))
        }
        None => builtin_rule_set().context("failed to compile built-in rules"),
    }
}

async fn analyze_inputs(
    rules_dir: &Option<PathBuf>,
    settings: Settings,
    paths: &[PathBuf],
) -> Result<Vec<AnalysisReport>> {
    let rules = load_rules(rules_dir.as_deref()).await?;
    let analyzer = DefaultAnalyzer::with_config(rules, settings.analysis)?;
    let high_risk_threshold = analyzer.config().high_risk_threshold;
    let documents = read_documents(paths).await?;

    let mut reports = Vec::with_capacity(documents.len());
    for document in &documents {
        let clauses = analyzer
            .analyze_document(document)
            .with_context(|| format!("failed to analyze {}", document.source.display_name()))?;
        info!(
            document_id = %document.id,
            source = document.source.display_name(),
            clauses = clauses.len(),
            "document analyzed"
        );
        reports.push(AnalysisReport::new(document, clauses, high_risk_threshold));
    }
    Ok(reports)
}

async fn read_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    if paths.is_empty() {
        return Ok(vec![read_pasted(DocumentId(1)).await?]);
    }
    if paths.iter().filter(|path| path.as_os_str() == "-").count() > 1 {
        bail!("stdin (`-`) can only be given once per invocation");
    }
    let mut documents = Vec::with_capacity(paths.len());
    for (idx, path) in paths.iter().enumerate() {
        let id = DocumentId(idx as u64 + 1);
        let document = if path.as_os_str() == "-" {
            read_pasted(id).await?
        } else {
            read_file(id, path).await?
        };
        documents.push(document);
    }
    Ok(documents)
}

async fn read_pasted(id: DocumentId) -> Result<Document> {
    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("failed to read text from stdin")?;
    if content.trim().is_empty() {
        bail!("content cannot be empty");
    }
    if content.chars().count() < MIN_PASTE_CHARS {
        bail!("text is too short; paste a complete terms and conditions document");
    }
    Ok(Document::new(id, DocumentSource::Pasted, content))
}

async fn read_file(id: DocumentId, path: &Path) -> Result<Document> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    if let Some(extension) = extension.as_deref() {
        if !PLAIN_TEXT_EXTENSIONS.contains(&extension) {
            bail!(
                "unsupported file type `.{extension}` for {}; extract plain text first (supported: .txt, .text, .md)",
                path.display()
            );
        }
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read file {}", path.display()))?;
    if content.trim().is_empty() {
        bail!("no readable text found in {}", path.display());
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::new(id, DocumentSource::File(name), content))
}

fn print_reports(reports: &[AnalysisReport], format: Format) -> Result<()> {
    match format {
        Format::Human => {
            for report in reports {
                println!("{}", render_report(report, OutputFormat::Human)?);
            }
        }
        Format::Json if reports.len() == 1 => {
            println!("{}", render_report(&reports[0], OutputFormat::Json)?);
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(reports)?),
    }
    Ok(())
}

async fn list_rules(rules_dir: Option<&Path>, json: bool) -> Result<()> {
    let mut pack = load_rule_pack(rules_dir).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&pack)?);
        return Ok(());
    }

    pack.risk_rules.sort_by(|a, b| a.id.cmp(&b.id));
    let origin = rules_dir
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "built-in tables".to_string());
    println!("{} rule(s) loaded from {}", pack.risk_rules.len(), origin);
    for rule in &pack.risk_rules {
        let kind = match rule.kind {
            RuleKind::Keyword => "keyword",
            RuleKind::Regex => "regex",
        };
        println!(
            "- {id:<26} [{kind:7}] weight {weight:>4.2} :: {desc}",
            id = rule.id,
            kind = kind,
            weight = rule.weight,
            desc = rule.description,
        );
    }

    println!();
    println!("Categories (first match wins):");
    for (idx, category) in pack.categories.iter().enumerate() {
        println!("{:>3}. {:<24} /{}/", idx + 1, category.label, category.pattern);
    }
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
