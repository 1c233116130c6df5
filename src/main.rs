//! Narrator - read API content aloud
//!
//! Fetches JSON, pulls out a text field, optionally polishes it with Gemini,
//! and speaks it through Google TTS.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use narrator::config::Config;
use narrator::enhance::{EnhancerState, GeminiEnhancer, GeminiSettings};
use narrator::fetch::{FetchRequest, HttpMethod};
use narrator::pipeline::{ExtractOptions, Pipeline, SynthesisOptions};
use narrator::playback::{AudioPlayer, FallbackPlayer};
use narrator::tts::AudioFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for generated audio
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, extract, and speak
    Run(RunArgs),
    /// Speak the given text directly
    Speak {
        text: String,
        #[command(flatten)]
        speech: SpeechArgs,
    },
    /// Check that the Gemini API key works
    CheckKey,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// URL to fetch; a path starting with '/' is joined onto NEWS_API_BASE_URL
    #[arg(short, long)]
    url: Option<String>,

    /// HTTP method (GET or POST)
    #[arg(short, long, default_value = "GET")]
    method: HttpMethod,

    /// Extra request header, NAME=VALUE
    #[arg(short = 'H', long = "header", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    /// Query parameter, NAME=VALUE
    #[arg(short, long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// JSON body for POST requests
    #[arg(long)]
    body: Option<String>,

    /// Dotted path of the text field, e.g. data.0.title
    #[arg(long, default_value = "text")]
    path: String,

    /// Search nested objects when an undotted key is not at the top level
    #[arg(long)]
    search_nested: bool,

    #[command(flatten)]
    speech: SpeechArgs,
}

#[derive(Args, Debug)]
struct SpeechArgs {
    /// Output file name (without directory)
    #[arg(short, long)]
    filename: Option<String>,

    /// Language code
    #[arg(short, long)]
    lang: Option<String>,

    /// Audio format: mp3, wav or ogg
    #[arg(long)]
    format: Option<AudioFormat>,

    /// Speak slowly
    #[arg(long)]
    slow: bool,

    /// Cut text longer than this many characters
    #[arg(long)]
    max_chars: Option<usize>,

    /// Do not play the audio after writing it
    #[arg(long)]
    no_play: bool,

    /// Skip Gemini enhancement even if a key is configured
    #[arg(long)]
    no_enhance: bool,
}

impl SpeechArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(lang) = &self.lang {
            config.language = lang.clone();
        }
        if let Some(format) = self.format {
            config.audio_format = format.to_string();
        }
        if self.max_chars.is_some() {
            config.max_chars = self.max_chars;
        }
        if self.no_play {
            config.auto_play = false;
        }
    }

    fn options(&self, config: &Config) -> SynthesisOptions {
        SynthesisOptions {
            filename: self.filename.clone(),
            slow: self.slow,
            ..SynthesisOptions::from_config(config)
        }
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))
}

async fn build_pipeline(config: &Config, speech: &SpeechArgs) -> Pipeline {
    let player: Option<Arc<dyn AudioPlayer>> = if config.auto_play {
        Some(Arc::new(FallbackPlayer::default()))
    } else {
        None
    };
    Pipeline::from_config(config, !speech.no_enhance, player).await
}

async fn run(mut config: Config, args: RunArgs) -> Result<bool> {
    args.speech.apply(&mut config);

    let body = match &args.body {
        Some(raw) => Some(serde_json::from_str(raw)?),
        None => None,
    };
    let request = FetchRequest {
        url: args.url.clone(),
        method: args.method,
        headers: args.headers.iter().cloned().collect(),
        params: args.params.clone(),
        body,
    };
    let extract = ExtractOptions {
        search_nested: args.search_nested,
        ..ExtractOptions::path(&args.path)
    };
    let synth = args.speech.options(&config);

    let mut pipeline = build_pipeline(&config, &args.speech).await;
    match pipeline.process_pipeline(&request, &extract, &synth).await {
        Some(path) => {
            println!("{}", path.display());
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn speak(mut config: Config, text: &str, speech: SpeechArgs) -> Result<bool> {
    speech.apply(&mut config);
    let synth = speech.options(&config);

    let mut pipeline = build_pipeline(&config, &speech).await;
    match pipeline.speak(text, &synth).await {
        Some(path) => {
            println!("{}", path.display());
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn check_key(config: &Config) -> bool {
    let enhancer = GeminiEnhancer::connect(GeminiSettings::from_config(config)).await;
    match enhancer.state() {
        EnhancerState::Enabled => {
            println!("Gemini API key is valid ({})", config.gemini_model);
            true
        }
        EnhancerState::Disabled => {
            println!("GEMINI_API_KEY is not set. Add it to your environment or .env file.");
            false
        }
        _ => {
            println!("The Gemini API key appears to be invalid. See the log for details.");
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    // Config load can warn (corrupt file moved aside) before the real subscriber exists
    let mut config = narrator::logging::bootstrap(cli.verbose, || match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    })?;
    config.apply_env();
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }

    narrator::logging::init(cli.verbose, config.log_file.as_deref())?;
    info!("🗣️ Narrator v{} starting...", env!("CARGO_PKG_VERSION"));

    let ok = match cli.command {
        Command::Run(args) => run(config, args).await?,
        Command::Speak { text, speech } => speak(config, &text, speech).await?,
        Command::CheckKey => check_key(&config).await,
    };

    if !ok {
        warn!("⚠️ Finished without producing output");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
