//! Gridded population client (coordinate → ~100 m cell population).
//!
//! The WorldPop stats API is asynchronous: a submit GET returns a task
//! identifier, and the task is then polled until it reaches a terminal
//! state. The poll loop is strictly sequential per task with a fixed
//! inter-attempt delay and a bounded attempt budget; concurrency across
//! tasks comes from the sampler fanning out multiple calls.
//!
//! See <https://www.worldpop.org/sdi/introapi/>

use std::time::Duration;

use impact_map_population_models::Coordinate;

use crate::{PopulationError, source_registry::GriddedConfig};

/// Area of one population raster cell in km² (100 m × 100 m).
pub const CELL_AREA_SQ_KM: f64 = 0.01;

/// Bounded-retry policy for the task poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Maximum poll attempts before giving up.
    pub max_attempts: u32,
    /// Fixed delay before each attempt.
    pub delay: Duration,
}

impl From<&GriddedConfig> for PollPolicy {
    fn from(config: &GriddedConfig) -> Self {
        Self {
            max_attempts: config.max_poll_attempts,
            delay: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Outcome of a single poll response.
#[derive(Debug)]
enum TaskState {
    /// Task not yet finished; keep polling.
    Pending,
    /// Task finished successfully with a total population.
    Finished(f64),
}

/// Fetches the population of the raster cell containing `coordinate`.
///
/// Submits a stats task, then polls it to completion.
///
/// # Errors
///
/// Returns [`PopulationError::Parse`] if the submit response carries no
/// task identifier or a finished task carries no numeric total,
/// [`PopulationError::RemoteTask`] if the task finished with its error
/// flag set, [`PopulationError::PollTimeout`] if the attempt budget is
/// exhausted, and [`PopulationError::Http`] on transport failures.
pub async fn cell_population(
    client: &reqwest::Client,
    config: &GriddedConfig,
    coordinate: Coordinate,
) -> Result<f64, PopulationError> {
    let task_id = submit_task(client, config, coordinate).await?;
    log::debug!(
        "Submitted gridded population task {task_id} for {:.4},{:.4}",
        coordinate.latitude,
        coordinate.longitude
    );

    let poll_url = format!("{}/v1/tasks/{task_id}", config.base_url);
    poll_until_terminal(PollPolicy::from(config), |_attempt| {
        let url = poll_url.clone();
        async move {
            let resp = client.get(&url).send().await?;
            Ok(resp.json::<serde_json::Value>().await?)
        }
    })
    .await
}

/// Submits a stats task and returns its task identifier.
async fn submit_task(
    client: &reqwest::Client,
    config: &GriddedConfig,
    coordinate: Coordinate,
) -> Result<String, PopulationError> {
    let url = format!("{}/v1/services/stats", config.base_url);
    let year = config.year.to_string();
    let lat = coordinate.latitude.to_string();
    let lon = coordinate.longitude.to_string();

    let resp = client
        .get(&url)
        .query(&[
            ("dataset", config.dataset.as_str()),
            ("year", year.as_str()),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("format", "json"),
        ])
        .send()
        .await?;

    let body: serde_json::Value = resp.json().await?;
    parse_submit_response(&body)
}

/// Parses the submit response into a task identifier.
fn parse_submit_response(body: &serde_json::Value) -> Result<String, PopulationError> {
    body.get("taskid")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| PopulationError::Parse {
            message: "submit response has no taskid".to_string(),
        })
}

/// Parses a poll response into a task state.
fn parse_poll_response(body: &serde_json::Value) -> Result<TaskState, PopulationError> {
    let status = body
        .get("status")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| PopulationError::Parse {
            message: "poll response has no status".to_string(),
        })?;

    if status != "finished" {
        return Ok(TaskState::Pending);
    }

    if body
        .get("error")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
    {
        let message = body
            .get("error_message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("remote task failed")
            .to_string();
        return Err(PopulationError::RemoteTask { message });
    }

    let total = body
        .pointer("/data/total_population")
        .and_then(serde_json::Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or_else(|| PopulationError::Parse {
            message: "finished task has no numeric data.total_population".to_string(),
        })?;

    Ok(TaskState::Finished(total))
}

/// Polls a task until it reaches a terminal state or the attempt budget
/// runs out.
///
/// `fetch` is invoked once per attempt with the 1-based attempt number;
/// factoring the transport out lets tests drive the state machine with
/// canned responses and a zero delay.
async fn poll_until_terminal<F, Fut>(
    policy: PollPolicy,
    mut fetch: F,
) -> Result<f64, PopulationError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<serde_json::Value, PopulationError>>,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.delay).await;

        let body = fetch(attempt).await?;
        match parse_poll_response(&body)? {
            TaskState::Finished(total) => return Ok(total),
            TaskState::Pending => {
                log::debug!(
                    "Task still running (attempt {attempt}/{})",
                    policy.max_attempts
                );
            }
        }
    }

    Err(PopulationError::PollTimeout {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_DELAY: PollPolicy = PollPolicy {
        max_attempts: 8,
        delay: Duration::ZERO,
    };

    fn pending() -> serde_json::Value {
        serde_json::json!({ "status": "created", "error": false })
    }

    fn finished(total: f64) -> serde_json::Value {
        serde_json::json!({
            "status": "finished",
            "error": false,
            "data": { "total_population": total }
        })
    }

    #[test]
    fn parses_taskid() {
        let body = serde_json::json!({ "status": "created", "taskid": "5e7a" });
        assert_eq!(parse_submit_response(&body).unwrap(), "5e7a");
    }

    #[test]
    fn missing_taskid_is_parse_error() {
        let body = serde_json::json!({ "status": "created" });
        let err = parse_submit_response(&body).unwrap_err();
        assert!(matches!(err, PopulationError::Parse { .. }));
    }

    #[test]
    fn finished_with_error_flag_is_remote_task_error() {
        let body = serde_json::json!({
            "status": "finished",
            "error": true,
            "error_message": "dataset not found"
        });
        let err = parse_poll_response(&body).unwrap_err();
        let PopulationError::RemoteTask { message } = err else {
            panic!("Expected RemoteTask, got {err}");
        };
        assert_eq!(message, "dataset not found");
    }

    #[test]
    fn finished_without_total_is_parse_error() {
        let body = serde_json::json!({ "status": "finished", "error": false, "data": {} });
        let err = parse_poll_response(&body).unwrap_err();
        assert!(matches!(err, PopulationError::Parse { .. }));
    }

    #[tokio::test]
    async fn poll_returns_total_once_finished() {
        let responses = [pending(), pending(), finished(153.7)];
        let mut calls = 0usize;
        let total = poll_until_terminal(ZERO_DELAY, |_| {
            let body = responses[calls].clone();
            calls += 1;
            std::future::ready(Ok(body))
        })
        .await
        .unwrap();
        assert!((total - 153.7).abs() < f64::EPSILON);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn poll_stops_on_remote_task_error() {
        // Terminal error on attempt 3 of 8: no further attempts
        let responses = [
            pending(),
            pending(),
            serde_json::json!({
                "status": "finished",
                "error": true,
                "error_message": "x"
            }),
        ];
        let mut calls = 0usize;
        let err = poll_until_terminal(ZERO_DELAY, |_| {
            let body = responses[calls].clone();
            calls += 1;
            std::future::ready(Ok(body))
        })
        .await
        .unwrap_err();
        let PopulationError::RemoteTask { message } = err else {
            panic!("Expected RemoteTask, got {err}");
        };
        assert_eq!(message, "x");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn poll_times_out_after_attempt_budget() {
        let mut calls = 0u32;
        let err = poll_until_terminal(ZERO_DELAY, |_| {
            calls += 1;
            std::future::ready(Ok(pending()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, PopulationError::PollTimeout { attempts: 8 }));
        assert_eq!(calls, 8);
    }

    #[tokio::test]
    async fn poll_propagates_transport_errors() {
        let err = poll_until_terminal(ZERO_DELAY, |_| {
            std::future::ready(Err(PopulationError::Parse {
                message: "bad body".to_string(),
            }))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, PopulationError::Parse { .. }));
    }
}
