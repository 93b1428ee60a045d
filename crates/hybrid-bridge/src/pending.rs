//! Completion of asynchronous member calls.

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

use hybrid_abi::{HostError, NativeValue};

use crate::error::{BindingCause, BridgeError, Result};

/// The outcome of an asynchronous call, delivered once by the host.
pub struct PendingCall {
    interface: String,
    member: String,
    receiver: Receiver<Result<NativeValue>>,
}

impl PendingCall {
    pub(crate) fn channel(interface: &str, member: &str) -> (Sender<Result<NativeValue>>, Self) {
        let (tx, rx) = channel::bounded(1);
        let pending = Self {
            interface: interface.to_string(),
            member: member.to_string(),
            receiver: rx,
        };
        (tx, pending)
    }

    /// A call that has already completed.
    pub(crate) fn ready(interface: &str, member: &str, result: Result<NativeValue>) -> Self {
        let (tx, pending) = Self::channel(interface, member);
        // capacity one, nothing else sent yet
        let _ = tx.send(result);
        pending
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    /// Block until the host completes the call.
    pub fn wait(self) -> Result<NativeValue> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(self.abandoned()),
        }
    }

    /// The result if the host has completed the call, without blocking.
    pub fn try_wait(&self) -> Option<Result<NativeValue>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.abandoned())),
        }
    }

    fn abandoned(&self) -> BridgeError {
        BridgeError::Binding {
            interface: self.interface.clone(),
            member: self.member.clone(),
            cause: BindingCause::Host(HostError::new(
                "completion was dropped without delivering a result",
            )),
        }
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("interface", &self.interface)
            .field("member", &self.member)
            .field("ready", &!self.receiver.is_empty())
            .finish()
    }
}
