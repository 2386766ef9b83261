//! Async driver connecting a [`StreamingController`] to a [`Transport`].
//!
//! Each fetch runs as its own task and reports back over a channel. The
//! refresh timer, the buffer tick and cancellation are multiplexed with
//! `tokio::select!`, so the controller itself is only ever touched from the
//! driver's task.

use std::collections::HashMap;
use std::future::pending;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::StreamingConfig;
use crate::controller::{ControllerEvent, StreamingController};
use crate::error::EngineError;
use crate::fetch::{FetchError, FetchResponse, RequestId, Transport};
use crate::loader::LoaderCommand;
use crate::sink::PlaybackSink;

type Completion = (RequestId, Result<FetchResponse, FetchError>);

/// How a [`run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The last segment of an ended playlist was appended.
    EndOfStream,
    /// The cancellation token fired.
    Cancelled,
}

struct Driver<T> {
    transport: Arc<T>,
    tasks: HashMap<RequestId, JoinHandle<()>>,
    completions: mpsc::UnboundedSender<Completion>,
    refresh_at: Option<Instant>,
}

impl<T: Transport + 'static> Driver<T> {
    fn execute(&mut self, command: LoaderCommand) {
        match command {
            LoaderCommand::Fetch(request) => {
                let transport = Arc::clone(&self.transport);
                let completions = self.completions.clone();
                let id = request.id;
                let handle = tokio::spawn(async move {
                    let result = transport.fetch(&request).await;
                    // The receiver only goes away when the driver returns.
                    let _ = completions.send((request.id, result));
                });
                self.tasks.insert(id, handle);
            }
            LoaderCommand::Abort(id) => {
                if let Some(handle) = self.tasks.remove(&id) {
                    trace!(id = %id, "Aborting request");
                    handle.abort();
                }
            }
            LoaderCommand::ScheduleRefresh(delay) => {
                self.refresh_at = Some(Instant::now() + delay);
            }
            LoaderCommand::CancelRefresh => {
                self.refresh_at = None;
            }
        }
    }

    fn abort_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// Drives `controller` until the stream ends, a playlist fails or `shutdown`
/// is cancelled.
///
/// Segment failures are logged and skipped. A playlist failure is returned
/// as [`EngineError::Playlist`].
pub async fn run<T, S>(
    controller: &mut StreamingController<S>,
    transport: Arc<T>,
    config: &StreamingConfig,
    shutdown: CancellationToken,
) -> Result<RunOutcome, EngineError>
where
    T: Transport + 'static,
    S: PlaybackSink,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut driver = Driver {
        transport,
        tasks: HashMap::new(),
        completions: tx,
        refresh_at: None,
    };

    let mut tick = time::interval(config.tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome = loop {
        while let Some(command) = controller.poll_command() {
            driver.execute(command);
        }
        match drain_events(controller) {
            Ok(Some(outcome)) => break Ok(outcome),
            Ok(None) => {}
            Err(err) => break Err(err),
        }

        let refresh_at = driver.refresh_at;
        let refresh = async move {
            match refresh_at {
                Some(deadline) => time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("Shutdown requested");
                break Ok(RunOutcome::Cancelled);
            }
            Some((id, result)) = rx.recv() => {
                driver.tasks.remove(&id);
                if let Err(err) = controller.handle_response(id, result) {
                    break Err(err);
                }
            }
            _ = refresh => {
                driver.refresh_at = None;
                if let Err(err) = controller.on_refresh_timeout() {
                    break Err(err);
                }
            }
            _ = tick.tick() => {
                controller.on_tick();
            }
        }
    };

    driver.abort_all();
    outcome
}

fn drain_events<S: PlaybackSink>(
    controller: &mut StreamingController<S>,
) -> Result<Option<RunOutcome>, EngineError> {
    while let Some(event) = controller.poll_event() {
        match event {
            ControllerEvent::LoadedMetadata => debug!("Metadata loaded"),
            ControllerEvent::DurationChange(duration) => {
                debug!(duration, "Duration changed");
            }
            ControllerEvent::Error(error) => {
                warn!(status = error.status, code = error.code, "Skipped segment: {}", error.message);
            }
            ControllerEvent::PlaylistError(error) => {
                return Err(EngineError::Playlist(error));
            }
            ControllerEvent::EndOfStream => return Ok(Some(RunOutcome::EndOfStream)),
        }
    }
    Ok(None)
}
