//! 命令行入口：翻译一个 HTML 文件

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use page_translator::logging::init_logging;
use page_translator::parsers::html::{FlowLayout, PageDocument};
use page_translator::translation::storage::open_preference_store;
use page_translator::translation::{
    ChatCompletionsClient, ConfigManager, PipelineController, RunStats, TranslationError,
    TranslationResult,
};

#[derive(Parser, Debug)]
#[command(name = "page-translator")]
#[command(about = "Translate the visible text of an HTML page in batches")]
#[command(version)]
struct Cli {
    /// Target language code, e.g. fr, de, zh
    #[arg(short, long, required_unless_present = "generate_config")]
    lang: Option<String>,

    /// Write the translated HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// Character encoding of the input document
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "PATH")]
    generate_config: Option<String>,

    /// Input HTML file
    #[arg(required_unless_present = "generate_config")]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> TranslationResult<()> {
    if let Some(path) = &cli.generate_config {
        ConfigManager::generate_example_config(path)?;
        eprintln!("已生成示例配置文件: {}", path);
        return Ok(());
    }

    let (Some(lang), Some(input)) = (cli.lang.as_deref(), cli.input.as_ref()) else {
        return Err(TranslationError::InvalidInput(
            "需要 --lang 和输入文件".to_string(),
        ));
    };

    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    let config = manager.into_config();

    let source = fs::read(input).map_err(|e| {
        TranslationError::InvalidInput(format!("无法读取 {}: {}", input.display(), e))
    })?;
    let document = PageDocument::parse(&source, &cli.encoding);

    let client = ChatCompletionsClient::from_config(&config)?;
    tracing::info!("翻译服务端点: {}", client.endpoint());

    let store = open_preference_store(config.preferences_path.as_deref());
    let layout = FlowLayout::new(config.viewport());

    let mut controller = PipelineController::new(
        document,
        Arc::new(client),
        store,
        Box::new(layout),
        config,
    );

    let stats = controller.translate_to(lang).await?;
    let html = controller.document().to_html();

    match &cli.output {
        Some(path) => fs::write(path, &html)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&html)?;
            stdout.flush()?;
        }
    }

    report(&stats);
    Ok(())
}

fn report(stats: &RunStats) {
    eprintln!(
        "units scanned: {}, batches: {}/{} succeeded, {} failed, units applied: {}",
        stats.units_scanned,
        stats.batches_succeeded,
        stats.batches_total,
        stats.batches_failed,
        stats.units_applied
    );
}
