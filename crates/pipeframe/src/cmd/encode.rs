use std::io::{self, BufRead};

use pipeframe_transport::{Json, Text, Transport};

use crate::cmd::{EncodeArgs, FrameOptions};
use crate::exit::{io_error, transport_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub fn run(args: EncodeArgs, frame: &FrameOptions) -> CliResult<i32> {
    let messages: Box<dyn Iterator<Item = io::Result<String>>> = if args.data.is_empty() {
        Box::new(io::stdin().lock().lines())
    } else {
        Box::new(args.data.into_iter().map(Ok))
    };

    let out = io::stdout().lock();
    let sent = if args.json {
        let mut transport = Transport::with_config(
            out,
            frame.framing(),
            frame.config(),
            Json::<serde_json::Value>::new(),
        );
        let mut sent = 0usize;
        for (index, message) in messages.enumerate() {
            let message = message.map_err(|err| io_error("read stdin failed", err))?;
            let value = parse_json(index, &message)?;
            transport
                .send(&value)
                .map_err(|err| transport_error("send failed", err))?;
            sent += 1;
        }
        sent
    } else {
        let mut transport = Transport::with_config(out, frame.framing(), frame.config(), Text);
        let mut sent = 0usize;
        for message in messages {
            let message = message.map_err(|err| io_error("read stdin failed", err))?;
            transport
                .send(message.as_str())
                .map_err(|err| transport_error("send failed", err))?;
            sent += 1;
        }
        sent
    };

    tracing::info!(sent, framing = %frame.framing(), "encoded messages");
    Ok(SUCCESS)
}

fn parse_json(index: usize, message: &str) -> CliResult<serde_json::Value> {
    serde_json::from_str(message).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("message {} is not valid json: {err}", index + 1),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_reports_one_based_position() {
        let err = parse_json(2, "{oops").unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("message 3 is not valid json"));
    }

    #[test]
    fn parse_json_accepts_documents() {
        let value = parse_json(0, r#"{ "method" : "ping" }"#).unwrap();
        assert_eq!(value["method"], "ping");
    }
}
