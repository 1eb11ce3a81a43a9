use anyhow::{anyhow, Result};
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use geotrack_application::ops::Delivery;
use geotrack_application::Metrics;

use super::{parse_event_payload, IntakeStats};

pub async fn open_input(path: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if path.trim() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path)
        .await
        .map_err(|err| anyhow!("cannot open input {}: {}", path, err))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Feeds one delivery per non-empty line until EOF or until the queue closes.
pub async fn run_jsonl_intake<R>(
    reader: R,
    sender: mpsc::Sender<Delivery>,
    metrics: &Metrics,
) -> Result<IntakeStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = IntakeStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event = match parse_event_payload(&line) {
            Ok(event) => event,
            Err(err) => {
                warn!("skipping line {}: {}", line_no, err);
                metrics.record_rejected();
                stats.rejected += 1;
                continue;
            }
        };
        if sender.send(Delivery::new(event)).await.is_err() {
            warn!("delivery queue closed, stopping intake at line {}", line_no);
            break;
        }
        stats.accepted += 1;
    }
    info!(
        "jsonl intake finished: accepted={}, rejected={}",
        stats.accepted, stats.rejected
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn intake_skips_blank_and_malformed_lines() {
        let input = concat!(
            r#"{"eventId":"e1","userId":"alice","latitude":1.0,"longitude":2.0,"timestamp":"2024-05-01T12:00:00Z"}"#,
            "\n\n",
            "not json\n",
            r#"{"eventId":"e2","userId":"bob","latitude":3.0,"longitude":4.0,"timestamp":"2024-05-01T12:00:01Z","receivedAt":"2024-05-01T12:00:02Z"}"#,
            "\n",
        );
        let metrics = Metrics::default();
        let (tx, mut rx) = mpsc::channel(8);

        let stats = run_jsonl_intake(input.as_bytes(), tx, &metrics)
            .await
            .expect("intake");

        assert_eq!(stats, IntakeStats { accepted: 2, rejected: 1 });
        assert_eq!(metrics.snapshot().events_rejected, 1);
        let first = rx.recv().await.expect("first delivery");
        assert_eq!(first.event.event_id.as_str(), "e1");
        assert_eq!(first.attempt, 1);
        let second = rx.recv().await.expect("second delivery");
        assert_eq!(second.event.user_id.as_str(), "bob");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn intake_stops_when_queue_closes() {
        let input = r#"{"eventId":"e1","userId":"alice","latitude":1.0,"longitude":2.0,"timestamp":"2024-05-01T12:00:00Z"}"#;
        let metrics = Metrics::default();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let stats = run_jsonl_intake(input.as_bytes(), tx, &metrics)
            .await
            .expect("intake");
        assert_eq!(stats.accepted, 0);
    }
}
