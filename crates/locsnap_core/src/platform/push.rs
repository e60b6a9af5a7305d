//! Location provider fed by an external event source.
//!
//! The Flutter side (or the CLI simulator) owns the real OS calls. It pushes
//! the permission answer with `set_permission`, reads the id of the parked
//! request with `pending_request`, and resolves that request with
//! `report_fix` / `report_failure`; core only awaits those answers.

use super::{LocationProvider, PermissionStatus, Position, ProviderError};
use log::debug;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

type FixSender = oneshot::Sender<Result<Position, ProviderError>>;

/// Identifier handed out for each parked `current_position` call.
pub type RequestId = u64;

#[derive(Default)]
struct Waiters {
    next_id: RequestId,
    queue: VecDeque<(RequestId, FixSender)>,
}

impl Waiters {
    fn park(&mut self, sender: FixSender) -> RequestId {
        self.next_id += 1;
        self.queue.push_back((self.next_id, sender));
        self.next_id
    }

    /// Drops requests whose caller already gave up.
    fn prune(&mut self) {
        self.queue.retain(|(_, sender)| !sender.is_closed());
    }

    fn take(&mut self, id: RequestId) -> Option<FixSender> {
        let index = self.queue.iter().position(|(queued, _)| *queued == id)?;
        self.queue.remove(index).map(|(_, sender)| sender)
    }
}

/// Provider whose answers are pushed in from outside core.
///
/// Every parked request carries an id, and a report only resolves the request
/// it names. Reports for a request whose caller already gave up (its future
/// was dropped), or for an id that was never handed out, are discarded; they
/// never reach a later request.
pub struct PushLocationProvider {
    permission: Mutex<PermissionStatus>,
    waiters: Mutex<Waiters>,
}

impl Default for PushLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PushLocationProvider {
    /// Creates a provider with undetermined permission and no pending requests.
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(PermissionStatus::Undetermined),
            waiters: Mutex::new(Waiters::default()),
        }
    }

    /// Records the OS answer to the foreground permission prompt.
    pub fn set_permission(&self, granted: bool) {
        let status = if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner) = status;
        debug!(
            "event=permission_update module=platform status={}",
            status.as_str()
        );
    }

    /// Returns the number of live requests still waiting for an answer.
    pub fn pending_requests(&self) -> usize {
        let mut waiters = self.waiters();
        waiters.prune();
        waiters.queue.len()
    }

    /// Returns the id of the oldest live request, if any is waiting.
    pub fn pending_request(&self) -> Option<RequestId> {
        let mut waiters = self.waiters();
        waiters.prune();
        waiters.queue.front().map(|(id, _)| *id)
    }

    /// Resolves request `request_id` with a live fix.
    ///
    /// Returns `false` when that request is no longer waiting and the fix was
    /// discarded.
    pub fn report_fix(&self, request_id: RequestId, position: Position) -> bool {
        self.deliver(request_id, Ok(position))
    }

    /// Resolves request `request_id` with a failure.
    ///
    /// Returns `false` when that request is no longer waiting and the failure
    /// was discarded.
    pub fn report_failure(&self, request_id: RequestId, message: impl Into<String>) -> bool {
        self.deliver(request_id, Err(ProviderError::Unavailable(message.into())))
    }

    fn deliver(&self, request_id: RequestId, answer: Result<Position, ProviderError>) -> bool {
        let sender = {
            let mut waiters = self.waiters();
            waiters.prune();
            waiters.take(request_id)
        };
        let delivered = sender.is_some_and(|sender| sender.send(answer).is_ok());
        let status = if delivered { "delivered" } else { "discarded" };
        debug!("event=fix_report module=platform status={status} request_id={request_id}");
        delivered
    }

    fn waiters(&self) -> MutexGuard<'_, Waiters> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationProvider for PushLocationProvider {
    async fn request_foreground_permission(&self) -> PermissionStatus {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn current_position(&self) -> Result<Position, ProviderError> {
        let (sender, receiver) = oneshot::channel();
        let request_id = self.waiters().park(sender);
        debug!("event=fix_request module=platform status=parked request_id={request_id}");
        receiver.await.unwrap_or(Err(ProviderError::Disconnected))
    }
}
