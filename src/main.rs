use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use jira_worklog_report::{
    ConfigStore, FileConfigStore, GroupingPolicy, IssueUpsertRequest, JiraClient, JiraConfig,
    ReportConfig, ReportRequest, ReportService, WindowBounds, upsert_issue,
};

/// Jiraのworklogをストーリー・エピック・イニシアチブ単位でCSVに集計する
#[derive(Debug, Parser)]
#[command(name = "worklog-report", version)]
struct Cli {
    /// 設定ディレクトリ（省略時はOS標準の設定ディレクトリ）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// ログを詳細にする（-vv でdebug）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 期間内の作業時間レポートをCSVで出力する
    Report {
        /// 開始日 (yyyy-mm-dd)
        #[arg(long)]
        start_date: String,
        /// 終了日 (yyyy-mm-dd)
        #[arg(long)]
        end_date: String,
        /// 出力先ファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// 設定のグルーピング方法を上書き
        #[arg(long, value_enum)]
        grouping: Option<GroupingArg>,
        /// 開始日・終了日ちょうどの作業記録も含める
        #[arg(long)]
        inclusive: bool,
    },
    /// Issueを1件取得してJSONで表示する
    Issue {
        key: String,
    },
    /// JSONリクエストファイルからIssueを作成・更新する
    Upsert {
        file: PathBuf,
    },
    /// レポート設定の管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// デフォルト設定を書き出す
    Init,
    /// 現在の設定を表示する
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupingArg {
    Adjacent,
    ByStory,
}

impl From<GroupingArg> for GroupingPolicy {
    fn from(arg: GroupingArg) -> Self {
        match arg {
            GroupingArg::Adjacent => GroupingPolicy::Adjacent,
            GroupingArg::ByStory => GroupingPolicy::ByStory,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("worklog-report error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut store = match &cli.config {
        Some(dir) => FileConfigStore::new(dir),
        None => FileConfigStore::default_config_dir()?,
    };

    match cli.command {
        Commands::Config { action } => handle_config(action, &mut store).await,
        Commands::Report {
            start_date,
            end_date,
            output,
            grouping,
            inclusive,
        } => {
            let mut config = load_config(&store).await?;
            if let Some(grouping) = grouping {
                config.grouping = grouping.into();
            }
            if inclusive {
                config.window_bounds = WindowBounds::Inclusive;
            }

            let client = connect()?;
            let service = ReportService::new(&client, config);
            let report = service.generate(&ReportRequest::new(start_date, end_date)).await;

            for diagnostic in &report.diagnostics.entries {
                eprintln!("warning: {diagnostic}");
            }
            if !report.diagnostics.is_complete() {
                eprintln!(
                    "warning: report may be incomplete ({} failures)",
                    report.diagnostics.error_count()
                );
            }

            match output {
                Some(path) => tokio::fs::write(&path, &report.csv)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", report.csv),
            }
            Ok(())
        }
        Commands::Issue { key } => {
            let client = connect()?;
            let issue = client
                .get_issue(&key)
                .await
                .with_context(|| format!("failed to fetch {key}"))?;
            println!("{}", serde_json::to_string_pretty(&issue)?);
            Ok(())
        }
        Commands::Upsert { file } => {
            let body = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let request: IssueUpsertRequest =
                serde_json::from_str(&body).context("invalid upsert request")?;

            let config = load_config(&store).await?;
            let client = connect()?;
            let key = upsert_issue(&client, &request, &config).await?;
            println!("{}", serde_json::json!({ "key": key }));
            Ok(())
        }
    }
}

async fn handle_config(action: ConfigAction, store: &mut FileConfigStore) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            store.initialize().await?;
            store.save_report_config(&ReportConfig::default()).await?;
            println!("wrote {}", store.config_dir().join("report_config.json").display());
        }
        ConfigAction::Show => {
            let config = load_config(store).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

async fn load_config(store: &FileConfigStore) -> anyhow::Result<ReportConfig> {
    let config = store
        .load_report_config()
        .await
        .context("failed to load report config")?;
    Ok(config.unwrap_or_else(|| {
        tracing::debug!("no report config found; using defaults");
        ReportConfig::default()
    }))
}

fn connect() -> anyhow::Result<JiraClient> {
    let config = JiraConfig::from_env().context("Jira connection is not configured")?;
    Ok(JiraClient::new(config)?)
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("WORKLOG_REPORT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
