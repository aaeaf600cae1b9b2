// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission controller: owns one report form session.
//
// All state lives in a single task. Handles talk to it over a command
// channel and observe it through a watch channel, so every transition is
// applied in the order its triggering event arrived. The two slow jobs run
// elsewhere and come back as events:
//
//   photo compression  -> blocking pool, result tagged with a capture token
//   email dispatch     -> its own task, at most one in flight
//
// The post-success reset timer is the only timeout and is cancelled by a new
// submission or by teardown.

use std::future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument, warn};
use treasure_bridge::CoordinateProvider;
use treasure_core::error::{GENERIC_TRANSPORT_FAILURE, GeolocationError, Result, TreasureError};
use treasure_core::human_errors::humanize_error;
use treasure_core::report::ReportBuilder;
use treasure_core::types::{CompressedImage, Coordinates, Delivery, RawImage, SubmissionState};
use treasure_image::{FrameEncoder, ImageCompressor};
use treasure_mail::EmailTransport;

use super::capture::{CaptureToken, CaptureTracker};
use super::reset_timer::{RESET_DELAY, ResetTimer};
use crate::state::SessionSnapshot;

const COMMAND_BUFFER: usize = 32;

/// A user edit to one text field.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldEdit {
    Description(String),
    Email(String),
}

enum Command {
    Edit(FieldEdit),
    AttachPhoto(RawImage),
    Retake,
    LocationResolved(std::result::Result<Coordinates, GeolocationError>),
    Submit,
    Shutdown,
}

/// A command plus the channel that hears back once it has been applied and
/// published. The reply carries the submission state at that point.
struct Request {
    command: Command,
    applied: oneshot::Sender<SubmissionState>,
}

/// Everything the session loop can wake up for.
enum Event {
    Request(Request),
    Closed,
    Compressed(std::result::Result<(CaptureToken, Result<CompressedImage>), JoinError>),
    Dispatched(Result<Delivery>),
    ResetDue,
}

/// Starts report sessions.
pub struct SubmissionController;

impl SubmissionController {
    /// Spawn a session on the current runtime.
    pub fn spawn<E>(transport: Arc<dyn EmailTransport>, compressor: ImageCompressor<E>) -> SessionHandle
    where
        E: FrameEncoder + 'static,
    {
        Self::spawn_with_reset_delay(transport, compressor, RESET_DELAY)
    }

    pub fn spawn_with_reset_delay<E>(
        transport: Arc<dyn EmailTransport>,
        compressor: ImageCompressor<E>,
        reset_delay: Duration,
    ) -> SessionHandle
    where
        E: FrameEncoder + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let session = Session {
            snapshot: SessionSnapshot::default(),
            transport,
            compressor: Arc::new(compressor),
            commands: command_rx,
            published: snapshot_tx,
            captures: CaptureTracker::default(),
            compressions: JoinSet::new(),
            dispatch: None,
            reset: ResetTimer::default(),
            reset_delay,
        };
        let task = tokio::spawn(session.run());

        SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }
}

/// Client side of a running session.
///
/// Every command resolves only after the session has applied it, so a
/// `snapshot()` taken afterwards already reflects the change.
pub struct SessionHandle {
    commands: mpsc::Sender<Request>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub async fn set_description(&self, text: impl Into<String>) -> Result<()> {
        self.apply(Command::Edit(FieldEdit::Description(text.into()))).await.map(drop)
    }

    pub async fn set_email(&self, address: impl Into<String>) -> Result<()> {
        self.apply(Command::Edit(FieldEdit::Email(address.into()))).await.map(drop)
    }

    /// Hand over a freshly captured photo. Compression starts immediately;
    /// watch `compressing` in the snapshot for completion.
    pub async fn attach_photo(&self, raw: RawImage) -> Result<()> {
        self.apply(Command::AttachPhoto(raw)).await.map(drop)
    }

    /// Clear the photo and drop any compression still in flight.
    pub async fn retake(&self) -> Result<()> {
        self.apply(Command::Retake).await.map(drop)
    }

    /// Ask `provider` for the current position once and record the outcome.
    pub async fn locate<P>(&self, provider: &P) -> Result<()>
    where
        P: CoordinateProvider + ?Sized,
    {
        let outcome = provider.current_position().await;
        self.apply(Command::LocationResolved(outcome)).await.map(drop)
    }

    /// Request a submission of the current form.
    ///
    /// Replies with `Failed(..)` when validation stops it, `Dispatching` when
    /// the send started, or the unchanged busy state when one is already in
    /// flight.
    pub async fn submit(&self) -> Result<SubmissionState> {
        self.apply(Command::Submit).await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// True while a submission is validating or dispatching.
    pub fn is_busy(&self) -> bool {
        self.snapshots.borrow().busy()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| TreasureError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Tear the session down: cancels the reset timer and any dispatch.
    pub async fn shutdown(self) {
        // The loop may already be gone; the join below covers both cases.
        let (applied, _) = oneshot::channel();
        let _ = self
            .commands
            .send(Request {
                command: Command::Shutdown,
                applied,
            })
            .await;
        if let Err(e) = self.task.await {
            error!(error = %e, "session task ended abnormally");
        }
    }

    async fn apply(&self, command: Command) -> Result<SubmissionState> {
        let (applied, reply) = oneshot::channel();
        self.commands
            .send(Request { command, applied })
            .await
            .map_err(|_| TreasureError::SessionClosed)?;
        reply.await.map_err(|_| TreasureError::SessionClosed)
    }
}

struct Session<E> {
    snapshot: SessionSnapshot,
    transport: Arc<dyn EmailTransport>,
    compressor: Arc<ImageCompressor<E>>,
    commands: mpsc::Receiver<Request>,
    published: watch::Sender<SessionSnapshot>,
    captures: CaptureTracker,
    compressions: JoinSet<(CaptureToken, Result<CompressedImage>)>,
    dispatch: Option<JoinHandle<Result<Delivery>>>,
    reset: ResetTimer,
    reset_delay: Duration,
}

impl<E: FrameEncoder + 'static> Session<E> {
    async fn run(mut self) {
        debug!(transport = self.transport.name(), "report session started");
        loop {
            let event = tokio::select! {
                request = self.commands.recv() => match request {
                    Some(request) => Event::Request(request),
                    None => Event::Closed,
                },
                Some(joined) = self.compressions.join_next() => Event::Compressed(joined),
                outcome = join_dispatch(&mut self.dispatch), if self.dispatch.is_some() => {
                    Event::Dispatched(outcome)
                }
                _ = self.reset.fired(), if self.reset.is_armed() => Event::ResetDue,
            };

            match event {
                Event::Request(Request {
                    command: Command::Shutdown,
                    ..
                })
                | Event::Closed => break,
                Event::Request(request) => self.on_request(request),
                Event::Compressed(joined) => self.on_compressed(joined),
                Event::Dispatched(outcome) => {
                    self.dispatch = None;
                    self.on_dispatched(outcome);
                }
                Event::ResetDue => self.on_reset(),
            }
        }
        self.teardown();
    }

    fn on_request(&mut self, request: Request) {
        let state = self.on_command(request.command);
        self.publish();
        // The caller may have stopped waiting; the snapshot still has it.
        let _ = request.applied.send(state);
    }

    fn on_command(&mut self, command: Command) -> SubmissionState {
        match command {
            Command::Edit(edit) => {
                match edit {
                    FieldEdit::Description(text) => self.snapshot.form.description = text,
                    FieldEdit::Email(address) => self.snapshot.form.email = address,
                }
                self.touched();
            }
            Command::AttachPhoto(raw) => self.start_compression(raw),
            Command::Retake => {
                self.captures.invalidate();
                self.snapshot.form.image = None;
                self.touched();
            }
            Command::LocationResolved(Ok(coordinates)) => {
                debug!(
                    latitude = %coordinates.latitude_text(),
                    longitude = %coordinates.longitude_text(),
                    "position resolved"
                );
                self.snapshot.form.coordinates = Some(coordinates);
                self.touched();
            }
            Command::LocationResolved(Err(e)) => {
                warn!(error = %e, "position request failed");
                self.snapshot.notice = Some(humanize_error(&TreasureError::from(e)));
            }
            Command::Submit => return self.on_submit(),
            Command::Shutdown => {}
        }
        self.snapshot.state.clone()
    }

    /// Any user edit returns a failed submission to idle and clears the notice.
    fn touched(&mut self) {
        if matches!(self.snapshot.state, SubmissionState::Failed(_)) {
            self.snapshot.state = SubmissionState::Idle;
        }
        self.snapshot.notice = None;
    }

    fn start_compression(&mut self, raw: RawImage) {
        let token = self.captures.begin();
        debug!(
            ?token,
            width = raw.width,
            height = raw.height,
            size = raw.declared_size,
            "compressing photo"
        );
        let compressor = Arc::clone(&self.compressor);
        // A panic must still hand the token back, or `compressing` never clears.
        self.compressions.spawn_blocking(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| compressor.compress(&raw)))
                .unwrap_or_else(|_| Err(TreasureError::Encode("compression stopped unexpectedly".into())));
            (token, outcome)
        });
        self.touched();
    }

    fn on_compressed(
        &mut self,
        joined: std::result::Result<(CaptureToken, Result<CompressedImage>), JoinError>,
    ) {
        let (token, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                debug!(error = %e, "compression task cancelled");
                return;
            }
        };

        if !self.captures.accept(token) {
            debug!(?token, "discarding stale compression result");
            return;
        }

        match outcome {
            Ok(image) => {
                info!(
                    width = image.width,
                    height = image.height,
                    quality = image.quality,
                    encoded_size = image.encoded_size,
                    "photo ready"
                );
                self.snapshot.form.image = Some(image);
            }
            // The previous photo, if any, stays in the form.
            Err(e) => {
                warn!(error = %e, "photo rejected");
                self.fail_locally(e);
            }
        }
        self.publish();
    }

    /// Surface an error that happened outside a submission.
    fn fail_locally(&mut self, err: TreasureError) {
        if matches!(
            self.snapshot.state,
            SubmissionState::Idle | SubmissionState::Failed(_)
        ) {
            self.snapshot.state = SubmissionState::Failed(err.to_string());
        }
        self.snapshot.notice = Some(humanize_error(&err));
    }

    #[instrument(skip(self), fields(state = ?self.snapshot.state))]
    fn on_submit(&mut self) -> SubmissionState {
        if self.snapshot.state.is_busy() {
            debug!("submission already in flight");
            return self.snapshot.state.clone();
        }

        // A fresh submission must not be wiped by the previous one's reset.
        self.reset.cancel();
        self.snapshot.state = SubmissionState::Validating;
        self.snapshot.notice = None;
        self.publish();

        let report = match ReportBuilder::from_form(&self.snapshot.form).build() {
            Ok(report) => report,
            Err(reason) => {
                info!(%reason, "report refused");
                self.snapshot.state = SubmissionState::Failed(reason.to_string());
                self.snapshot.notice = Some(humanize_error(&TreasureError::from(reason)));
                return self.snapshot.state.clone();
            }
        };

        info!(
            report_id = %report.id,
            has_image = report.image.is_some(),
            has_coordinates = report.coordinates.is_some(),
            "dispatching report"
        );
        let transport = Arc::clone(&self.transport);
        self.dispatch = Some(tokio::spawn(async move { transport.send(&report).await }));
        self.snapshot.state = SubmissionState::Dispatching;
        self.snapshot.state.clone()
    }

    fn on_dispatched(&mut self, outcome: Result<Delivery>) {
        match outcome {
            Ok(delivery) => {
                info!(
                    report_id = %delivery.report_id,
                    transport = %delivery.transport,
                    provider_id = delivery.provider_id.as_deref().unwrap_or("-"),
                    "report sent"
                );
                self.snapshot.state = SubmissionState::Succeeded(delivery.recipient);
                self.snapshot.notice = None;
                self.reset.arm(self.reset_delay);
            }
            Err(e) => {
                warn!(error = %e, "report not sent");
                self.snapshot.state = SubmissionState::Failed(e.to_string());
                self.snapshot.notice = Some(humanize_error(&e));
            }
        }
        self.publish();
    }

    fn on_reset(&mut self) {
        debug!("clearing form after successful send");
        self.captures.invalidate();
        self.snapshot = SessionSnapshot::default();
        self.publish();
    }

    fn publish(&mut self) {
        self.snapshot.compressing = self.captures.is_compressing();
        self.published.send_replace(self.snapshot.clone());
    }

    fn teardown(&mut self) {
        self.reset.cancel();
        if let Some(dispatch) = self.dispatch.take() {
            dispatch.abort();
            debug!("in-flight dispatch aborted");
        }
        self.compressions.abort_all();
        debug!("report session stopped");
    }
}

/// Wait for the in-flight dispatch. A panicked or aborted send reports the
/// generic transport failure.
async fn join_dispatch(dispatch: &mut Option<JoinHandle<Result<Delivery>>>) -> Result<Delivery> {
    let Some(handle) = dispatch.as_mut() else {
        return future::pending().await;
    };
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "dispatch task died");
            Err(TreasureError::Transport(GENERIC_TRANSPORT_FAILURE.into()))
        }
    }
}
