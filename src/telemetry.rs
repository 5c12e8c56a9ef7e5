//! Single-byte battery telemetry responder.
//!
//! While the device is running, a bus initiator can read the battery
//! percentage from the responder's address. Every read gets exactly one byte,
//! computed from the voltage monitor at the moment of the request.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::voltage::{SAMPLE_COUNT, VoltageMonitor};

/// Trait for the target side of the telemetry bus.
pub trait TelemetryBus {
    type Error;

    /// Arms the peripheral for the next address match.
    fn listen(&mut self) -> Result<(), Self::Error>;

    /// Stops responding to the bus.
    fn stop_listening(&mut self);

    /// Transmits `byte` as the last and only byte of the current transfer.
    fn send_final(&mut self, byte: u8) -> Result<(), Self::Error>;
}

/// Direction of a transfer, seen from the initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    /// Initiator reads from the responder.
    Read,
    /// Initiator writes to the responder.
    Write,
}

/// Lifecycle of the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponderState {
    /// Not listening. Outside the running phase.
    Disabled,
    /// Armed and answering reads.
    Listening,
    /// Re-arming failed. Stays silent until enabled again.
    Faulted,
}

/// Hook through which the power controller switches telemetry on and off.
pub trait TelemetryLink {
    /// Called when the device enters the running phase.
    fn enable(&self);

    /// Called on the way to sleep.
    fn disable(&self);
}

/// Telemetry link for boards without a telemetry bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTelemetry;

impl TelemetryLink for NoTelemetry {
    fn enable(&self) {}

    fn disable(&self) {}
}

struct ResponderInner<B> {
    bus: B,
    state: ResponderState,
    last_sent: Option<u8>,
}

/// Answers battery percentage reads on a single bus address.
///
/// The bus interrupt handlers call [`on_address_match`](Self::on_address_match)
/// and [`on_transfer_complete`](Self::on_transfer_complete); the controller
/// calls [`enable`](TelemetryLink::enable) and
/// [`disable`](TelemetryLink::disable) through a shared reference.
///
/// # Type Parameters
/// * `'m` - Lifetime of the voltage monitor reference
/// * `B` - Bus implementation type
/// * `N` - Sample count of the voltage monitor
pub struct TelemetryResponder<'m, B: TelemetryBus, const N: usize = SAMPLE_COUNT> {
    inner: Mutex<RefCell<ResponderInner<B>>>,
    monitor: &'m VoltageMonitor<N>,
    address: u8,
}

impl<'m, B: TelemetryBus, const N: usize> TelemetryResponder<'m, B, N> {
    /// Creates a disabled responder for `address`.
    pub fn new(bus: B, monitor: &'m VoltageMonitor<N>, address: u8) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ResponderInner {
                bus,
                state: ResponderState::Disabled,
                last_sent: None,
            })),
            monitor,
            address,
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut ResponderInner<B>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Arms the bus. A failure leaves the responder faulted.
    pub fn start(&self) {
        self.with_inner(|inner| {
            inner.state = match inner.bus.listen() {
                Ok(()) => ResponderState::Listening,
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("telemetry listen failed, responder faulted");
                    ResponderState::Faulted
                }
            };
        });
    }

    /// Stops answering requests.
    pub fn stop(&self) {
        self.with_inner(|inner| {
            if inner.state == ResponderState::Listening {
                inner.bus.stop_listening();
            }
            inner.state = ResponderState::Disabled;
        });
    }

    /// Handles an address match. Call from the bus address interrupt.
    ///
    /// Returns the byte sent, or `None` if the request was ignored: another
    /// address, a write, or a responder that is not listening.
    pub fn on_address_match(&self, address: u8, direction: TransferDirection) -> Option<u8> {
        self.with_inner(|inner| {
            if inner.state != ResponderState::Listening
                || address != self.address
                || direction != TransferDirection::Read
            {
                return None;
            }

            let percentage = self.monitor.percentage();
            if inner.bus.send_final(percentage).is_err() {
                // The initiator may have aborted; completion re-arms the bus.
                #[cfg(feature = "defmt")]
                defmt::debug!("telemetry reply of {}% not delivered", percentage);
            }
            inner.last_sent = Some(percentage);
            Some(percentage)
        })
    }

    /// Re-arms the bus after a transfer, whether it succeeded or not.
    ///
    /// Call from the transfer-complete and bus-error interrupts.
    pub fn on_transfer_complete(&self) {
        self.with_inner(|inner| {
            if inner.state != ResponderState::Listening {
                return;
            }
            if inner.bus.listen().is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("telemetry re-listen failed, responder faulted");
                inner.state = ResponderState::Faulted;
            }
        });
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ResponderState {
        self.with_inner(|inner| inner.state)
    }

    /// Returns the bus address this responder answers on.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Byte sent by the most recent answered read.
    pub fn last_sent(&self) -> Option<u8> {
        self.with_inner(|inner| inner.last_sent)
    }

    /// Gives temporary access to the bus implementation.
    pub fn with_bus<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.with_inner(|inner| f(&mut inner.bus))
    }
}

impl<B: TelemetryBus, const N: usize> TelemetryLink for &TelemetryResponder<'_, B, N> {
    fn enable(&self) {
        self.start();
    }

    fn disable(&self) {
        self.stop();
    }
}
