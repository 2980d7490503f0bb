// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log;

/// Manages the channel carrying [`PageSignal`](super::PageSignal)s from the
/// platform side to the runtime.
///
/// The bus is generic over the signal type `T` so this crate stays decoupled
/// from signal sets defined by higher-level crates. It is an MPSC channel in
/// practice: the delegated-listener glue, the scroll subscription, and the
/// batch source each hold a cloned sender, while the runtime owns the single
/// receiver and drains it on the UI thread.
#[derive(Debug)]
pub struct SignalBus<T: Clone + Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + 'static> SignalBus<T> {
    /// Creates a new SignalBus with an unbounded channel.
    ///
    /// ## Returns
    /// A new instance of the SignalBus struct.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::info!("SignalBus initialized.");
        Self { sender, receiver }
    }

    /// Attempts to send a signal, logging an error if the receiver is disconnected.
    ///
    /// ## Arguments
    /// * `signal` - The signal to be sent over the channel.
    pub fn publish(&self, signal: T) {
        if let Err(e) = self.sender.send(signal) {
            log::error!("Failed to send signal: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sender end of the channel.
    /// Use this to hand publishing capability to platform glue code.
    ///
    /// ## Returns
    /// A clone of the sender end of the channel.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns a reference to the receiver end of the channel.
    /// Intended for the owner of the bus to drain signals.
    ///
    /// ## Returns
    /// A reference to the receiver end of the channel.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Drains every signal currently queued, without blocking.
    ///
    /// ## Returns
    /// The queued signals, in publication order.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }
}

impl<T: Clone + Send + 'static> Default for SignalBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::{SendError, TryRecvError};
    use std::time::Duration;

    /// A local, self-contained signal enum for testing purposes.
    /// This mimics the runtime's page signals without creating external
    /// dependencies.
    #[derive(Debug, Clone, PartialEq)]
    enum TestSignal {
        Interaction { target: String },
        Scrolled { at_ms: u64 },
        BatchGranted,
    }

    fn dummy_interaction() -> TestSignal {
        TestSignal::Interaction {
            target: "btn-1".to_string(),
        }
    }

    #[test]
    fn bus_creation() {
        let bus = SignalBus::<TestSignal>::new();
        let _sender = bus.sender();
        assert!(bus.receiver().is_empty());
    }

    #[test]
    fn send_receive_single_signal() {
        let bus = SignalBus::<TestSignal>::new();
        let sender = bus.sender();
        let receiver = bus.receiver();
        let signal_to_send = dummy_interaction();

        sender
            .send(signal_to_send.clone())
            .expect("Send should succeed");

        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(received) => assert_eq!(received, signal_to_send),
            Err(e) => panic!("Failed to receive signal: {e:?}"),
        }
    }

    #[test]
    fn try_receive_empty() {
        let bus = SignalBus::<TestSignal>::new();
        let receiver = bus.receiver();

        match receiver.try_recv() {
            Err(TryRecvError::Empty) => { /* This is the expected outcome */ }
            Ok(signal) => panic!("Received unexpected signal: {signal:?}"),
            Err(e) => panic!("Received unexpected error: {e:?}"),
        }
    }

    /// Signals published from several senders drain in publication order on
    /// the single receiver.
    #[test]
    fn drain_preserves_publication_order() {
        let bus = SignalBus::<TestSignal>::new();
        let listener_side = bus.sender();
        let scroll_side = bus.sender();

        listener_side
            .send(dummy_interaction())
            .expect("Send 1 should succeed");
        scroll_side
            .send(TestSignal::Scrolled { at_ms: 12 })
            .expect("Send 2 should succeed");
        listener_side
            .send(TestSignal::BatchGranted)
            .expect("Send 3 should succeed");

        let drained = bus.drain();
        assert_eq!(
            drained,
            vec![
                dummy_interaction(),
                TestSignal::Scrolled { at_ms: 12 },
                TestSignal::BatchGranted,
            ]
        );
        assert_eq!(bus.receiver().try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn send_error_on_receiver_drop() {
        let bus = SignalBus::<TestSignal>::new();
        let sender = bus.sender();
        let signal_to_send = dummy_interaction();

        drop(bus);
        log::trace!("SignalBus (and receiver) dropped.");

        match sender.send(signal_to_send) {
            Err(SendError(_)) => { /* This is the expected outcome */ }
            Ok(()) => panic!("Send unexpectedly succeeded after receiver drop"),
        }
    }
}
