use anyhow::Result;
use clap::Parser;
use selfsort::run;
use selfsort_core::config::{self, AppConfig, ConflictPolicy, RankerKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "selfsort", version, about = "Classify and file everything under a directory")]
struct Cli {
    /// Directory to organize
    root: PathBuf,

    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Files scoring below this go to staging
    #[arg(long)]
    confidence_threshold: Option<f64>,

    /// Name of the review directory under the root
    #[arg(long)]
    staging_dir_name: Option<String>,

    /// Where the cleanup report is written (default: the root)
    #[arg(long)]
    log_dir: Option<String>,

    /// Learning state file (default: <root>/.selfsort_learning.json)
    #[arg(long)]
    learning_state_path: Option<String>,

    /// rename | skip | overwrite
    #[arg(long)]
    conflict: Option<ConflictPolicy>,

    /// frequency | tfidf
    #[arg(long)]
    ranker: Option<RankerKind>,

    /// Output JSON summary
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply_overrides(&self, cfg: &mut AppConfig) {
        if let Some(threshold) = self.confidence_threshold {
            cfg.organize.confidence_threshold = threshold;
        }
        if let Some(name) = &self.staging_dir_name {
            cfg.organize.staging_dir_name = name.clone();
        }
        if let Some(dir) = &self.log_dir {
            cfg.logging.dir = Some(dir.clone());
        }
        if let Some(path) = &self.learning_state_path {
            cfg.learning.state_path = Some(path.clone());
        }
        if let Some(conflict) = self.conflict {
            cfg.organize.conflict = conflict;
        }
        if let Some(ranker) = self.ranker {
            cfg.labeling.ranker = ranker;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut cfg);

    let summary = run::run(&cli.root, &cfg)?;
    if cli.json {
        let mut summary_json = serde_json::to_value(&summary)?;
        if let Some(obj) = summary_json.as_object_mut() {
            obj.insert("status".into(), "ok".into());
        }
        println!("{}", serde_json::to_string_pretty(&summary_json)?);
    } else {
        println!(
            "removed {} empty dirs, discovered {}, moved {}, staged {}, unchanged {}, failed {}, learned {}",
            summary.removed_dirs,
            summary.discovered,
            summary.moved,
            summary.staged,
            summary.unchanged,
            summary.failed,
            summary.learned
        );
    }
    Ok(())
}
