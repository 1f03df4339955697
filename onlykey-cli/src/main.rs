use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use onlykey_lib::challenge::ChallengeCode;
use onlykey_lib::constants::RSA_PUBLIC_EXPONENT;
use onlykey_lib::{
    DeviceConfig, Field, FinalChunkPolicy, KeyFeatures, KeyLayout, OKError, OnlyKey, PinPrompt, RetryPolicy,
    RsaKeyMaterial, SlotId, Termination,
};
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Talk to an OnlyKey over its raw HID interface.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HID interface number, if the device exposes more than one raw HID interface.
    #[arg(long, global = true)]
    interface: Option<u8>,
    /// Read timeout per report, in milliseconds.
    #[arg(long, global = true, default_value_t = 2000)]
    read_timeout_ms: u64,
    /// Send an extra empty chunk when a payload fills its last chunk exactly.
    #[arg(long, global = true)]
    terminate_chunks: bool,
    /// How the end of a decrypted plaintext is found.
    #[arg(long, global = true, value_enum, default_value_t = PlaintextEnd::ZeroByte)]
    plaintext_end: PlaintextEnd,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the label of every slot.
    Labels,
    /// Print the RSA modulus of a key slot as hex.
    PublicKey {
        /// Key slot (rsa1..rsa4).
        #[arg(short, long)]
        slot: SlotId,
        /// Expected modulus length in bytes; without it the read ends when the device goes quiet.
        #[arg(short, long)]
        len: Option<usize>,
    },
    /// Write a field of a slot.
    SetField {
        /// Slot (1a..6b, rsa1..rsa4, ecc1..ecc32).
        #[arg(short, long)]
        slot: SlotId,
        /// Field name, e.g. label, user-name, password.
        #[arg(short, long)]
        field: Field,
        /// Field contents, sent as UTF-8.
        value: String,
    },
    /// Install an RSA private key from its two primes.
    InstallKey {
        /// Key slot (rsa1..rsa4).
        #[arg(short, long)]
        slot: SlotId,
        /// First prime, big-endian hex.
        #[arg(long)]
        p: HexBytes,
        /// Second prime, big-endian hex.
        #[arg(long)]
        q: HexBytes,
        /// Modulus length in bytes; defaults to the combined prime length.
        #[arg(long)]
        modulus_len: Option<usize>,
        /// Usages enabled for the key.
        #[arg(long, value_enum, num_args = 1.., default_value = "decryption")]
        features: Vec<Feature>,
        /// How the control byte is placed in the key reports.
        #[arg(long, value_enum, default_value_t = Layout::Leading)]
        layout: Layout,
    },
    /// Decrypt a ciphertext with an RSA key; the device asks for a challenge PIN.
    Decrypt {
        /// Key slot (rsa1..rsa4).
        #[arg(short, long)]
        slot: SlotId,
        /// Ciphertext as hex.
        #[arg(required_unless_present = "input")]
        ciphertext: Option<HexBytes>,
        /// Read the raw ciphertext from a file instead.
        #[arg(short, long, conflicts_with = "ciphertext")]
        input: Option<PathBuf>,
        /// Give up after this many wrong PIN entries.
        #[arg(long)]
        max_attempts: Option<NonZeroU32>,
        /// Print the plaintext as hex instead of text.
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Feature {
    Authentication,
    Decryption,
    Signature,
    Backup,
}

impl From<Feature> for KeyFeatures {
    fn from(feature: Feature) -> Self {
        match feature {
            Feature::Authentication => KeyFeatures::AUTHENTICATION,
            Feature::Decryption => KeyFeatures::DECRYPTION,
            Feature::Signature => KeyFeatures::SIGNATURE,
            Feature::Backup => KeyFeatures::BACKUP,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layout {
    /// Control byte once, at the start of the key stream.
    Leading,
    /// Control byte at the start of every report.
    PerReport,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlaintextEnd {
    /// Stop at the first zero byte (text plaintexts).
    ZeroByte,
    /// Keep every byte until the device goes quiet (binary plaintexts).
    FullReports,
}

impl From<PlaintextEnd> for Termination {
    fn from(end: PlaintextEnd) -> Self {
        match end {
            PlaintextEnd::ZeroByte => Termination::ZeroByte,
            PlaintextEnd::FullReports => Termination::FullReports,
        }
    }
}

/// Bytes given on the command line as hex, with or without a `0x` prefix.
#[derive(Clone, Debug)]
struct HexBytes(Vec<u8>);

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s.trim().trim_start_matches("0x")).map(HexBytes)
    }
}

/// Shows challenges on stdout and waits for the newline the device types once
/// the PIN has been entered.
struct StdinPrompt {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl PinPrompt for StdinPrompt {
    fn show_challenge(&mut self, code: ChallengeCode, attempt: u32) {
        if attempt > 1 {
            warn!(attempt, "Wrong PIN, try again");
        }
        println!("Enter the 3 digit challenge code on OnlyKey to authorize decrypt:");
        println!("{}", code);
    }

    async fn wait_for_pin(&mut self) -> Result<(), OKError> {
        match self.lines.next_line().await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(OKError::PromptClosed),
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                Err(OKError::PromptClosed)
            }
        }
    }
}

fn setup_logging(verbosity: &Verbosity<InfoLevel>) {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn device_config(cli: &Cli) -> DeviceConfig {
    let mut config = DeviceConfig::default().with_read_timeout(Duration::from_millis(cli.read_timeout_ms));
    if let Some(interface) = cli.interface {
        config = config.with_interface(interface);
    }
    if cli.terminate_chunks {
        config = config.with_final_chunk(FinalChunkPolicy::Terminated);
    }
    config.with_decrypt_termination(cli.plaintext_end.into())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.verbose);

    let config = device_config(&cli);
    if let Err(e) = run(cli.command, config).await {
        error!("{:?}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, mut config: DeviceConfig) -> Result<()> {
    if let Command::InstallKey { layout, .. } = &command {
        config = config.with_key_layout(match layout {
            Layout::Leading => KeyLayout::LeadingControlByte,
            Layout::PerReport => KeyLayout::ControlBytePerReport,
        });
    }
    if let Command::Decrypt {
        max_attempts: Some(n), ..
    } = &command
    {
        config = config.with_retry(RetryPolicy::Limited(*n));
    }

    let mut device = OnlyKey::open(config).context("Failed to open OnlyKey. Is it connected and unlocked?")?;

    match command {
        Command::Labels => {
            let labels = device.get_labels().await.context("Failed to read labels")?;
            for (raw, slot, label) in labels.iter() {
                match slot {
                    Some(slot) => println!("{:>5}  {}", slot.to_string(), label),
                    None => println!("{:>5}  {}", raw, label),
                }
            }
        }
        Command::PublicKey { slot, len } => {
            let modulus = device
                .get_public_key(slot, len)
                .await
                .with_context(|| format!("Failed to read public key of slot {}", slot))?;
            println!("modulus:  {}", hex::encode(modulus));
            println!("exponent: {}", hex::encode(RSA_PUBLIC_EXPONENT));
        }
        Command::SetField { slot, field, value } => {
            let status = device
                .set_field(slot, field, value.as_bytes())
                .await
                .with_context(|| format!("Failed to set {} of slot {}", field, slot))?;
            println!("{}", status);
        }
        Command::InstallKey {
            slot,
            p,
            q,
            modulus_len,
            features,
            ..
        } => {
            let modulus_len = modulus_len.unwrap_or(p.0.len() + q.0.len());
            let key = RsaKeyMaterial::new(p.0, q.0, modulus_len).context("Invalid RSA key")?;
            let features = features
                .into_iter()
                .fold(KeyFeatures::empty(), |acc, f| acc | KeyFeatures::from(f));
            let status = device
                .install_private_key(slot, features, &key)
                .await
                .with_context(|| format!("Failed to install key into slot {}", slot))?;
            println!("{}", status);
        }
        Command::Decrypt {
            slot,
            ciphertext,
            input,
            raw,
            ..
        } => {
            let ciphertext = match (ciphertext, input) {
                (Some(HexBytes(bytes)), _) => bytes,
                (None, Some(path)) => {
                    std::fs::read(&path).with_context(|| format!("Failed to read ciphertext from {:?}", path))?
                }
                (None, None) => bail!("No ciphertext given"),
            };
            info!(len = ciphertext.len(), "Ciphertext loaded");

            let mut prompt = StdinPrompt::new();
            if raw {
                let plaintext = device
                    .decrypt(slot, &ciphertext, &mut prompt)
                    .await
                    .context("Decryption failed")?;
                println!("{}", hex::encode(plaintext));
            } else {
                let plaintext = device
                    .decrypt_string(slot, &ciphertext, &mut prompt)
                    .await
                    .context("Decryption failed")?;
                println!("{}", plaintext);
            }
        }
    }
    Ok(())
}
