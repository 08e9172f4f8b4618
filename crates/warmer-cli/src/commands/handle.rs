use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use warmer_invoke::{HttpInvoker, RecordingInvoker};

use super::WarmerArgs;

pub async fn handle(
    args: &WarmerArgs,
    event_path: &str,
    endpoint: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let input = read_event(event_path)?;

    if dry_run {
        let recorder = Arc::new(RecordingInvoker::new());
        let warmer = args.build_warmer(recorder.clone())?;
        let warmed = warmer
            .handle(&input)
            .await
            .context("warming fan-out failed")?;

        for request in recorder.take() {
            println!("{}", serde_json::to_string(&request)?);
        }
        println!("{warmed}");
        return Ok(());
    }

    let invoker = HttpInvoker::new(endpoint).with_timeout(args.timeout());
    let warmer = args.build_warmer(Arc::new(invoker))?;
    info!(
        function = %warmer.function().qualified(),
        id = warmer.id(),
        %endpoint,
        "handling event"
    );

    let warmed = warmer
        .handle(&input)
        .await
        .context("warming fan-out failed")?;
    println!("{warmed}");
    Ok(())
}

fn read_event(path: &str) -> anyhow::Result<Value> {
    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
    };
    parse_event(&raw)
}

/// Parse event JSON; blank input is the `null` event.
pub fn parse_event(raw: &str) -> anyhow::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).context("event is not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn blank_event_is_null() {
        assert_eq!(parse_event("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn invalid_event_is_an_error() {
        let err = parse_event("{warmer").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn reads_event_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"warmer": true}}, {{"warmer": false}}]"#).unwrap();
        let value = read_event(file.path().to_str().unwrap()).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["warmer"], true);
    }

    #[tokio::test]
    async fn dry_run_does_not_touch_the_network() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"warmer": true, "concurrency": 3}}"#).unwrap();
        let args = WarmerArgs {
            function_name: Some("f".to_string()),
            no_log: true,
            ..WarmerArgs::default()
        };

        // The endpoint is never contacted in dry-run mode.
        handle(&args, file.path().to_str().unwrap(), "127.0.0.1:1", true)
            .await
            .unwrap();
    }
}
