use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;

use pipeframe_frame::Framing;
use pipeframe_transport::{pump, BoxError, HandlerResult, Json, PayloadCodec, Raw, Transport};

use crate::cmd::{DecodeArgs, FrameOptions};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{write_message, MessageView, OutputFormat};

pub fn run(args: DecodeArgs, frame: &FrameOptions, format: OutputFormat) -> CliResult<i32> {
    let decoded = if args.json {
        decode_stdin(
            frame,
            Json::<serde_json::Value>::new(),
            format,
            |value| -> Result<Vec<u8>, BoxError> { Ok(serde_json::to_vec(&value)?) },
        )?
    } else {
        decode_stdin(frame, Raw, format, Ok)?
    };

    tracing::info!(decoded, framing = %frame.framing(), "decoded messages");
    Ok(SUCCESS)
}

/// Pump stdin through a transport whose handler prints each message.
fn decode_stdin<C, F>(
    frame: &FrameOptions,
    codec: C,
    format: OutputFormat,
    to_bytes: F,
) -> CliResult<usize>
where
    C: PayloadCodec,
    C::Message: 'static,
    F: Fn(C::Message) -> Result<Vec<u8>, BoxError> + 'static,
{
    let mut transport = Transport::with_config(io::sink(), frame.framing(), frame.config(), codec);
    transport.set_message_handler(printer(
        io::stdout(),
        frame.framing(),
        format,
        Rc::new(Cell::new(0)),
        to_bytes,
    ));
    transport.set_close_handler(|| tracing::debug!("input closed"));

    pump(&mut io::stdin().lock(), &mut transport)
        .map_err(|err| transport_error("decode failed", err))
}

fn printer<W, M, F>(
    mut out: W,
    framing: Framing,
    format: OutputFormat,
    counter: Rc<Cell<usize>>,
    to_bytes: F,
) -> impl FnMut(M) -> HandlerResult
where
    W: Write + 'static,
    F: Fn(M) -> Result<Vec<u8>, BoxError>,
{
    move |message: M| -> HandlerResult {
        let payload = to_bytes(message)?;
        let index = counter.get();
        counter.set(index + 1);
        let view = MessageView {
            index,
            framing,
            payload: &payload,
        };
        write_message(&mut out, &view, format)?;
        Ok(())
    }
}
