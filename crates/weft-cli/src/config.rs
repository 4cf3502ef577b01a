use core::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use weft::{GeneratorConfig, ProcessorConfig, SequentialId};

/// Command-line arguments for the `weft` binary.
///
/// Generator coordinates are global so every subcommand shares them. Each can
/// also be set from the environment or a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "weft",
    version,
    about = "Generate and decode Snowflake-style ids, and drive the buffered processor"
)]
pub struct CliArgs {
    /// Worker id embedded in generated ids (`0..=31`).
    ///
    /// Environment variable: `WEFT_WORKER_ID`
    #[arg(long, env = "WEFT_WORKER_ID", default_value_t = 0, global = true)]
    pub worker_id: u64,

    /// Datacenter id embedded in generated ids (`0..=31`).
    ///
    /// Environment variable: `WEFT_DATACENTER_ID`
    #[arg(long, env = "WEFT_DATACENTER_ID", default_value_t = 0, global = true)]
    pub datacenter_id: u64,

    /// Custom epoch in milliseconds since the UNIX epoch. Defaults to the
    /// Twitter epoch.
    ///
    /// Environment variable: `WEFT_EPOCH_MS`
    #[arg(long, env = "WEFT_EPOCH_MS", global = true)]
    pub epoch_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print freshly generated ids, one per line.
    Next {
        /// How many ids to generate.
        #[arg(short, long, default_value_t = 1)]
        count: usize,
    },
    /// Split an id into its fields.
    Decode {
        /// The id, as a signed decimal integer.
        id: i64,
    },
    /// Generate ids on several producer threads and feed them through a
    /// buffered processor that checks them for duplicates.
    Pump {
        /// Number of producer threads.
        #[arg(long, default_value_t = 4)]
        producers: usize,

        /// Ids generated by each producer.
        #[arg(long, default_value_t = 100_000)]
        items: usize,

        /// Pending items above which producers are throttled.
        ///
        /// Environment variable: `WEFT_WRITE_THRESHOLD`
        #[arg(long, env = "WEFT_WRITE_THRESHOLD")]
        write_threshold: Option<usize>,

        /// How long a throttled producer sleeps, in milliseconds.
        #[arg(long, default_value_t = 1)]
        backpressure_ms: u64,
    },
}

/// Validated settings for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub enum Action {
    Next { count: usize },
    Decode { id: SequentialId },
    Pump(PumpConfig),
}

#[derive(Debug, Clone)]
pub struct PumpConfig {
    pub producers: usize,
    pub items: usize,
    pub processor: ProcessorConfig,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mut generator = GeneratorConfig::new(args.worker_id, args.datacenter_id);
        if let Some(epoch_ms) = args.epoch_ms {
            generator = generator.with_epoch(Duration::from_millis(epoch_ms));
        }
        generator
            .validate()
            .context("invalid generator coordinates")?;

        let action = match args.command {
            Command::Next { count } => Action::Next { count },
            Command::Decode { id } => Action::Decode {
                id: SequentialId::try_from(id)
                    .map_err(|_| anyhow::anyhow!("id {id} is negative and cannot be decoded"))?,
            },
            Command::Pump {
                producers,
                items,
                write_threshold,
                backpressure_ms,
            } => {
                if producers == 0 {
                    bail!("--producers must be greater than 0");
                }
                let mut processor = ProcessorConfig::new("pump")
                    .with_backpressure_delay(Duration::from_millis(backpressure_ms));
                if let Some(threshold) = write_threshold {
                    processor = processor.with_write_threshold(threshold);
                }
                Action::Pump(PumpConfig {
                    producers,
                    items,
                    processor,
                })
            }
        };

        Ok(Self { generator, action })
    }
}
