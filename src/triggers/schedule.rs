// src/triggers/schedule.rs — Fixed-interval tick trigger

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::{Event, EventSink, Payload};
use crate::triggers::Trigger;

#[derive(Debug, Clone, Deserialize)]
struct ScheduleParams {
    /// Seconds between ticks
    interval: u64,
}

/// Emits a payload-less event immediately on start, then every `interval`
/// seconds.
pub struct ScheduleTrigger {
    interval: Duration,
}

impl ScheduleTrigger {
    pub const KIND: &'static str = "schedule";

    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_params(params: Payload) -> anyhow::Result<Self> {
        let params: ScheduleParams = serde_json::from_value(serde_json::Value::Object(params))
            .context("schedule trigger parameters")?;
        Ok(Self::new(Duration::from_secs(params.interval)))
    }
}

impl Trigger for ScheduleTrigger {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn start(&self, sink: EventSink, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let interval = self.interval;

        tokio::spawn(async move {
            tracing::info!("schedule trigger ticking every {}s", interval.as_secs());

            loop {
                sink.dispatch(&Event::tick(ScheduleTrigger::KIND));

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.recv() => {
                        tracing::info!("schedule trigger stopping");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sink::testutil::recording_sink;

    #[test]
    fn test_from_params_requires_interval() {
        assert!(ScheduleTrigger::from_params(Payload::new()).is_err());

        let mut params = Payload::new();
        params.insert("interval".into(), 30.into());
        let trigger = ScheduleTrigger::from_params(params).unwrap();
        assert_eq!(trigger.kind(), "schedule");
        assert_eq!(trigger.interval, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_ticks_immediately_and_stops_on_shutdown() {
        let (sink, recorder) = recording_sink();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let trigger = ScheduleTrigger::new(Duration::from_secs(60));
        let handle = trigger.start(sink, shutdown_rx);

        // First tick fires on start, well before the 60s interval elapses
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("trigger task should stop on shutdown")
            .unwrap();

        let events = recorder.recorded();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].trigger, "schedule");
        assert!(events[0].payload.is_empty());
    }
}
