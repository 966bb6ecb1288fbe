//! 命令行入口
//!
//! 对一段文本跑一遍完整管道：翻译、逐词分析，然后打印词表。

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use lexiflow::analysis::{AnalysisCache, AnalysisService};
use lexiflow::config::PipelineConfig;
use lexiflow::pipeline::{CharacterQuota, Session, SessionOptions};
use lexiflow::providers::{
    backends_from_settings, GoogleWebTranslator, MyMemoryTranslator, TranslationChain,
    TranslationProvider,
};
use lexiflow::store::MemoryWordStore;

#[derive(Parser)]
#[command(name = "lexiflow", about = "翻译一段文本并逐词分析语法", version)]
struct Cli {
    /// 要翻译的文本
    text: String,

    /// 源语言代码，auto 表示自动检测
    #[arg(long, default_value = "auto")]
    source: String,

    /// 目标语言代码
    #[arg(long, default_value = "uk")]
    target: String,

    /// 界面语言代码，语法说明用这种语言书写
    #[arg(long, default_value = "en")]
    ui: String,

    /// 配置文件路径，缺省时探测 lexiflow.toml 并叠加环境变量
    #[arg(long)]
    config: Option<PathBuf>,

    /// 联系邮箱，传给 MyMemory 接口
    #[arg(long, default_value = "support@lexiflow.dev")]
    contact: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lexiflow=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from(path)?,
        None => PipelineConfig::load()?,
    };

    let translators: Vec<Arc<dyn TranslationProvider>> = vec![
        Arc::new(GoogleWebTranslator::new()),
        Arc::new(MyMemoryTranslator::new(cli.contact.clone())),
    ];
    let translator = TranslationChain::new(translators, config.translate_timeout());

    let cache = Arc::new(AnalysisCache::new(
        config.cache.max_entries,
        config.cache_ttl(),
    ));
    let analyzer = Arc::new(AnalysisService::new(
        cache,
        Arc::new(MemoryWordStore::new()),
        backends_from_settings(&config.analysis),
        config.analyze_timeout(),
    ));

    let session = Session::new(
        translator,
        analyzer,
        Arc::new(CharacterQuota::unlimited()),
        &config,
        SessionOptions {
            source_lang: cli.source.clone(),
            target_lang: cli.target.clone(),
            ui_lang: cli.ui.clone(),
        },
    );

    session.submit(&cli.text).await;
    session.wait_for_analysis().await;

    let snapshot = session.snapshot();
    if let Some(error) = &snapshot.error {
        eprintln!("翻译失败: {}", error);
        std::process::exit(1);
    }

    println!("译文: {}", snapshot.translated_text);
    if let Some(detected) = &snapshot.detected_lang {
        println!("检测语言: {}", detected);
    }
    println!();
    for word in &snapshot.words {
        println!(
            "{:>4}  {:<20} {:<14} {:<12} {}",
            word.id,
            word.target_fragment,
            word.part_of_speech,
            word.source_fragment,
            word.grammar_note
        );
        if !word.definition.is_empty() {
            println!("      释义: {}", word.definition);
        }
        if !word.example_sentence.is_empty() {
            println!("      例句: {}", word.example_sentence);
        }
    }

    Ok(())
}
