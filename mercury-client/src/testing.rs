//! In-memory meter simulator for client tests

use mercury_core::{Energy, EnergyPair, MercuryResult, Tariff, ENERGY_RESPONSE_LENGTH};
use mercury_session::{build_frame, parse_frame};
use mercury_transport::ByteChannel;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Bytes of a reply delivered by the first read when replies are split
const SPLIT_AT: usize = 3;

/// Misbehaviour applied to the reply of one request
#[derive(Debug, Clone, Copy)]
enum Fault {
    Silent,
    Corrupt,
    Reject(u8),
}

#[derive(Debug, Default)]
struct State {
    requests: Vec<Vec<u8>>,
    pending: VecDeque<Vec<u8>>,
    faults: VecDeque<Fault>,
    energy: HashMap<(u8, u8), EnergyPair>,
    reply_address: Option<u8>,
    split_replies: bool,
    energy_reply_length: Option<usize>,
    silent_periods: Vec<u8>,
    closes: usize,
}

/// Meter answering requests the way a Mercury-230 does
///
/// Clones share state, so a test keeps one handle for inspection while the
/// client owns the other.
#[derive(Debug, Clone)]
pub(crate) struct FakeMeter {
    address: u8,
    state: Arc<Mutex<State>>,
}

impl FakeMeter {
    pub(crate) fn new(address: u8) -> Self {
        Self {
            address,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Ignore the next `count` requests
    pub(crate) fn stay_silent_for(&self, count: usize) {
        let mut state = self.state();
        state.faults.extend(std::iter::repeat_n(Fault::Silent, count));
    }

    /// Flip a checksum bit in the next `count` replies
    pub(crate) fn corrupt_next(&self, count: usize) {
        let mut state = self.state();
        state.faults.extend(std::iter::repeat_n(Fault::Corrupt, count));
    }

    /// Answer the next request with a status byte
    pub(crate) fn reject_next(&self, status: u8) {
        self.state().faults.push_back(Fault::Reject(status));
    }

    /// Sign every reply with another meter's address
    pub(crate) fn answer_from(&self, address: u8) {
        self.state().reply_address = Some(address);
    }

    pub(crate) fn split_replies(&self, split: bool) {
        self.state().split_replies = split;
    }

    pub(crate) fn truncate_energy_replies(&self, length: usize) {
        self.state().energy_reply_length = Some(length);
    }

    /// Never answer energy reads of `period`
    pub(crate) fn fail_energy_period(&self, period: u8) {
        self.state().silent_periods.push(period);
    }

    pub(crate) fn set_energy(&self, period: u8, tariff: Tariff, active: u32, reactive: u32) {
        let pair = EnergyPair::new(Energy::from_raw(active), Energy::from_raw(reactive));
        self.state().energy.insert((period, tariff.code()), pair);
    }

    /// Counter values reported for registers without an explicit value
    pub(crate) fn default_energy(period: u8, tariff: Tariff) -> EnergyPair {
        let active = u32::from(period) * 100_000 + u32::from(tariff.code()) * 1_000 + 1;
        EnergyPair::new(Energy::from_raw(active), Energy::from_raw(active / 2))
    }

    pub(crate) fn requests(&self) -> Vec<Vec<u8>> {
        self.state().requests.clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.state().closes
    }

    fn reply_body(&self, state: &State, command: u8, data: &[u8]) -> Option<Vec<u8>> {
        match (command, data) {
            (0x00, []) => Some(vec![0x00]),
            (0x01, [_level, password @ ..]) if password.len() == 6 => Some(vec![0x00]),
            (0x08, [0x00]) => Some(vec![3, 32, 87, 47, 15, 6, 21]),
            (0x08, [0x02]) => Some(vec![0x00, 0x01, 0x00, 0x3C]),
            (0x08, [0x03]) => Some(vec![2, 2, 84]),
            (0x08, [0x05]) => Some(vec![0x00, self.address]),
            (0x08, [0x12]) => Some(vec![0xB4, 0xE1, 0x97, 0x10, 0x00, 0x00]),
            (0x05, [period, tariff]) => {
                if state.silent_periods.contains(period) {
                    return None;
                }
                let pair = state.energy.get(&(*period, *tariff)).copied().unwrap_or_else(|| {
                    let tariff = Tariff::ALL[usize::from(*tariff)];
                    Self::default_energy(*period, tariff)
                });
                let mut body = Vec::with_capacity(ENERGY_RESPONSE_LENGTH);
                body.extend_from_slice(&pair.active.to_register());
                body.extend_from_slice(&[0x00; 4]);
                body.extend_from_slice(&pair.reactive.to_register());
                body.extend_from_slice(&[0x00; 4]);
                if let Some(length) = state.energy_reply_length {
                    body.truncate(length);
                }
                Some(body)
            }
            _ => Some(vec![0x01]),
        }
    }
}

impl ByteChannel for FakeMeter {
    fn write(&mut self, data: &[u8]) -> MercuryResult<()> {
        let mut state = self.state();
        state.requests.push(data.to_vec());

        let fault = state.faults.pop_front();
        if matches!(fault, Some(Fault::Silent)) {
            return Ok(());
        }
        let Ok(request) = parse_frame(data, self.address) else {
            return Ok(());
        };

        let body = match fault {
            Some(Fault::Reject(status)) => Some(vec![status]),
            _ => self.reply_body(&state, request.command(), request.data()),
        };
        let Some(body) = body else {
            return Ok(());
        };

        let address = state.reply_address.unwrap_or(self.address);
        let mut reply = build_frame(address, body[0], &body[1..]);
        if matches!(fault, Some(Fault::Corrupt)) {
            let last = reply.len() - 1;
            reply[last] ^= 0x01;
        }

        if state.split_replies && reply.len() > SPLIT_AT {
            let tail = reply.split_off(SPLIT_AT);
            state.pending.push_back(reply);
            state.pending.push_back(tail);
        } else {
            state.pending.push_back(reply);
        }
        Ok(())
    }

    fn read_available(&mut self, _max_wait: Duration) -> MercuryResult<Vec<u8>> {
        Ok(self.state().pending.pop_front().unwrap_or_default())
    }

    fn discard_input(&mut self) -> MercuryResult<()> {
        self.state().pending.clear();
        Ok(())
    }

    fn close(&mut self) -> MercuryResult<()> {
        self.state().closes += 1;
        Ok(())
    }
}
