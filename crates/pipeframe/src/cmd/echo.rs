use std::io;

use pipeframe_frame::{FrameError, FrameReader, FrameWriter};

use crate::cmd::{EchoArgs, FrameOptions};
use crate::exit::{frame_error, CliResult, SUCCESS};

pub fn run(args: EchoArgs, frame: &FrameOptions) -> CliResult<i32> {
    let config = frame.config();
    let mut reader = FrameReader::with_config(io::stdin().lock(), frame.framing(), &config);
    let mut writer = FrameWriter::with_config(io::stdout().lock(), frame.framing(), config);

    let mut echoed = 0usize;
    while args.count.is_none_or(|limit| echoed < limit) {
        let message = match reader.read_frame() {
            Ok(message) => message,
            Err(FrameError::ConnectionClosed) if reader.buffered() == 0 => break,
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        tracing::debug!(size = message.len(), "echoing frame");
        writer
            .send(&message)
            .map_err(|err| frame_error("echo send failed", err))?;
        echoed += 1;
    }

    tracing::info!(echoed, framing = %frame.framing(), "echo finished");
    Ok(SUCCESS)
}
