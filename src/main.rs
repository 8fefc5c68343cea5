use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use braille_tutor::diagnostics::{level_meter, print_input_devices, test_microphone};
use braille_tutor::voice::{
    self, AudioSource, DeviceSelector, MicrophoneSource, RecognitionSession, WavSource, prompts,
    speech_from_config,
};
use braille_tutor::{
    BrailleDisplay, Config, Controller, Error, Grammar, IntentResolver, PhraseTable,
    ServoDisplay, SimulatedDisplay, Timing,
};

/// Braille Tutor - say a letter, feel its braille cell
#[derive(Parser, Debug)]
#[command(name = "braille-tutor", version, about)]
struct Cli {
    /// Print patterns to the console instead of driving servos
    #[arg(long)]
    simulate: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// List audio input devices and exit
    #[arg(long, group = "mode")]
    list_devices: bool,

    /// Print live recognizer output to check the microphone
    #[arg(long, group = "mode")]
    test_mic: bool,

    /// Show a live input level meter
    #[arg(long, group = "mode")]
    level_meter: bool,

    /// With --test-mic, transcribe freely instead of using the letter grammar
    #[arg(long, requires = "test_mic")]
    open: bool,

    /// Seconds to run --test-mic or --level-meter
    #[arg(long)]
    duration: Option<u64>,

    /// RMS level the meter reports as sound
    #[arg(long)]
    threshold: Option<f64>,

    /// Config file (TOML)
    #[arg(short, long, env = "BRAILLE_TUTOR_CONFIG")]
    config: Option<PathBuf>,

    /// Recognizer model directory
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Input device index or name fragment
    #[arg(short, long)]
    device: Option<String>,

    /// Replay a WAV file instead of listening to a microphone
    #[arg(long, conflicts_with = "device")]
    input: Option<PathBuf>,

    /// Seconds each pattern stays raised
    #[arg(long)]
    hold_secs: Option<f64>,

    /// Seconds to wait for a phrase before listening again
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// Disable spoken feedback
    #[arg(long)]
    no_speech: bool,
}

/// What the process was started to do
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Tutor,
    ListDevices,
    TestMic {
        open_vocabulary: bool,
        duration: Duration,
    },
    LevelMeter {
        threshold: Option<f64>,
        duration: Option<Duration>,
    },
}

/// Default length of a --test-mic run
const TEST_MIC_SECS: u64 = 30;

impl Cli {
    fn mode(&self) -> Mode {
        if self.list_devices {
            Mode::ListDevices
        } else if self.test_mic {
            Mode::TestMic {
                open_vocabulary: self.open,
                duration: Duration::from_secs(self.duration.unwrap_or(TEST_MIC_SECS)),
            }
        } else if self.level_meter {
            Mode::LevelMeter {
                threshold: self.threshold,
                duration: self.duration.map(Duration::from_secs),
            }
        } else {
            Mode::Tutor
        }
    }

    /// Flags take precedence over file and environment settings
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model_path.clone_from(model);
        }
        if let Some(device) = &self.device {
            config.audio.device = Some(device.clone());
        }
        if let Some(hold) = self.hold_secs {
            config.display.hold_secs = hold;
        }
        if let Some(timeout) = self.timeout_secs {
            config.listen.timeout_secs = timeout;
        }
        if let Some(threshold) = self.threshold {
            config.audio.level_threshold = threshold;
        }
        if self.no_speech {
            config.speech.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,braille_tutor=info",
        1 => "info,braille_tutor=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            if let Some(hint) = e.downcast_ref::<Error>().and_then(Error::hint) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mode = cli.mode();
    if mode == Mode::ListDevices {
        print_input_devices(&mut io::stdout())?;
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    // Checked only once every layer is applied, so a flag can repair a bad
    // file or environment value
    config.validate()?;
    tracing::debug!(?config, "loaded configuration");

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match mode {
        Mode::Tutor => run_tutor(&cli, &config, &cancel).await,
        Mode::TestMic {
            open_vocabulary,
            duration,
        } => run_test_mic(&cli, &config, open_vocabulary, duration, &cancel).await,
        Mode::LevelMeter {
            threshold,
            duration,
        } => {
            let mut source = open_source(&cli, &config)?;
            let threshold = threshold.unwrap_or(config.audio.level_threshold);
            level_meter(
                source.as_mut(),
                threshold,
                duration,
                &cancel,
                &mut io::stdout(),
            )
            .await?;
            Ok(())
        }
        Mode::ListDevices => Ok(()),
    }
}

async fn run_tutor(cli: &Cli, config: &Config, cancel: &CancellationToken) -> anyhow::Result<()> {
    let table = PhraseTable::builtin();
    let grammar = Grammar::build(&table)?;
    let resolver = IntentResolver::new(&table)?;

    // Configuration problems are reported before any hardware is touched
    voice::check_model(&config.model_path)?;

    let source = open_source(cli, config)?;
    let recognizer =
        voice::load_recognizer(&config.model_path, source.sample_rate(), Some(&grammar))?;
    let session = RecognitionSession::new(recognizer, config.listen.min_confidence);

    let display: Box<dyn BrailleDisplay> = if cli.simulate {
        Box::new(SimulatedDisplay::new())
    } else {
        Box::new(ServoDisplay::open(&config.servo)?)
    };

    let mut speech = speech_from_config(&config.speech);
    if let Err(e) = speech.say(prompts::WELCOME) {
        tracing::warn!(error = %e, "failed to speak welcome");
    }

    println!("Braille tutor ready. Say a letter (\"bee\", \"letter see\") or \"exit\" to quit.");

    let mut controller = Controller::new(
        session,
        source,
        resolver,
        display,
        speech,
        Timing::from_config(config),
    );
    let stats = controller.run(cancel).await?;

    println!(
        "\nSession over: {} letter(s) shown, {} not understood",
        stats.letters_presented, stats.not_understood
    );
    Ok(())
}

async fn run_test_mic(
    cli: &Cli,
    config: &Config,
    open_vocabulary: bool,
    duration: Duration,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    voice::check_model(&config.model_path)?;

    let grammar = if open_vocabulary {
        None
    } else {
        Some(Grammar::build(&PhraseTable::builtin())?)
    };

    let mut source = open_source(cli, config)?;
    let recognizer =
        voice::load_recognizer(&config.model_path, source.sample_rate(), grammar.as_ref())?;
    let mut session = RecognitionSession::new(recognizer, config.listen.min_confidence);

    test_microphone(
        &mut session,
        source.as_mut(),
        duration,
        cancel,
        &mut io::stdout(),
    )
    .await?;
    Ok(())
}

fn open_source(cli: &Cli, config: &Config) -> anyhow::Result<Box<dyn AudioSource>> {
    let frame_samples = config.listen.frame_samples;

    if let Some(path) = &cli.input {
        let source = WavSource::from_file(path, frame_samples)
            .with_context(|| format!("failed to load {}", path.display()))?;
        return Ok(Box::new(source));
    }

    let selector = DeviceSelector::parse(config.audio.device.as_deref());
    let source = MicrophoneSource::new(selector, config.audio.sample_rate, frame_samples)?;
    tracing::info!(device = source.device_name(), "using microphone");
    Ok(Box::new(source))
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            cancel.cancel();
        }
    });
}
