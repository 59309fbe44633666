use clap::{Args, Subcommand, ValueEnum};
use pipeframe_frame::{ByteOrder, FrameConfig, Framing, DEFAULT_MAX_PAYLOAD};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Frame stdin lines and write the frames to stdout.
    Encode(EncodeArgs),
    /// Read frames from stdin and print each message.
    Decode(DecodeArgs),
    /// Read frames from stdin and write them back to stdout.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, frame: &FrameOptions, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, frame),
        Command::Decode(args) => decode::run(args, frame, format),
        Command::Echo(args) => echo::run(args, frame),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FramingArg {
    /// Payload followed by a 0x00 byte.
    Nul,
    /// 4-byte length followed by the payload.
    Length,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Nul => Framing::Nul,
            FramingArg::Length => Framing::LengthPrefixed,
        }
    }
}

/// Wire options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct FrameOptions {
    /// Message boundary strategy.
    #[arg(
        long,
        value_enum,
        default_value = "nul",
        env = "PIPEFRAME_FRAMING",
        global = true
    )]
    pub framing: FramingArg,

    /// Byte order of the length prefix (be or le).
    #[arg(
        long,
        value_name = "ORDER",
        default_value = "le",
        env = "PIPEFRAME_ENDIAN",
        global = true
    )]
    pub endian: ByteOrder,

    /// Largest accepted payload in bytes, in either direction.
    #[arg(
        long,
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_PAYLOAD,
        env = "PIPEFRAME_MAX_PAYLOAD",
        global = true
    )]
    pub max_payload: usize,
}

impl FrameOptions {
    pub fn framing(&self) -> Framing {
        self.framing.into()
    }

    pub fn config(&self) -> FrameConfig {
        FrameConfig {
            byte_order: self.endian,
            max_payload_size: self.max_payload,
        }
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Messages to frame instead of reading stdin lines.
    #[arg(long, short = 'd', value_name = "TEXT")]
    pub data: Vec<String>,
    /// Parse each message as JSON and send it in compact form.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Decode each payload as JSON; malformed payloads are an error.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Exit after echoing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
