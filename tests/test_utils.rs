// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common utilities for umsd tests
//!
//! Provides a scriptable SMI bus so the driver's register sequences can be
//! exercised and inspected without hardware. Registers read back the last
//! value written unless a scripted read is queued; registers marked as
//! command registers complete instantly by dropping the busy bit.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use umsd::umsd_if::{FnDriver, FnSmi};
use umsd::{DeviceInfo, FnOptions, SmiInterface};

const BUSY: u16 = 1 << 15;

#[derive(Default)]
struct BusState {
    regs: HashMap<(u8, u8), u16>,
    read_queue: HashMap<(u8, u8), VecDeque<u16>>,
    writes: Vec<(u8, u8, u16)>,
    rmu_requests: Vec<Vec<u8>>,
    rmu_responses: VecDeque<Vec<u8>>,
}

pub struct MockBus {
    state: Mutex<BusState>,
    busy_regs: HashSet<(u8, u8)>,
    info: Option<DeviceInfo>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BusState::default()),
            busy_regs: HashSet::new(),
            info: None,
        }
    }

    pub fn with_info(info: DeviceInfo) -> Self {
        Self {
            info: Some(info),
            ..Self::new()
        }
    }

    /// Mark (dev, reg) as a self-completing command register.
    pub fn busy_reg(mut self, dev: u8, reg: u8) -> Self {
        self.busy_regs.insert((dev, reg));
        self
    }

    pub fn set_reg(&self, dev: u8, reg: u8, value: u16) {
        self.state.lock().unwrap().regs.insert((dev, reg), value);
    }

    /// Queue a value returned by the next read of (dev, reg), ahead of
    /// whatever the register currently holds.
    pub fn queue_read(&self, dev: u8, reg: u8, value: u16) {
        self.state
            .lock()
            .unwrap()
            .read_queue
            .entry((dev, reg))
            .or_default()
            .push_back(value);
    }

    pub fn queue_rmu_response(&self, payload: Vec<u8>) {
        self.state.lock().unwrap().rmu_responses.push_back(payload);
    }

    pub fn writes(&self) -> Vec<(u8, u8, u16)> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Writes that hit a given device address, as (reg, value) pairs.
    pub fn writes_to(&self, dev: u8) -> Vec<(u8, u16)> {
        self.writes()
            .into_iter()
            .filter(|(d, _, _)| *d == dev)
            .map(|(_, r, v)| (r, v))
            .collect()
    }

    pub fn rmu_requests(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().rmu_requests.clone()
    }
}

/// Callback-style entry point for the detection path, mirroring how a C
/// platform would hand the driver a single function pointer.
#[allow(dead_code)]
pub fn smi_callback(
    bus: &Arc<MockBus>,
    op: FnOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    match op {
        FnOptions::Driver(FnDriver::DeviceInfo(info)) => {
            let value = bus.get_device_info()?;
            unsafe { *info = value };
        }
        FnOptions::Smi(FnSmi::Read { dev, reg, value }) => {
            let read = bus.smi_read(dev, reg)?;
            unsafe { *value = read };
        }
        FnOptions::Smi(FnSmi::Write { dev, reg, value }) => {
            bus.smi_write(dev, reg, value)?;
        }
        FnOptions::Rmu(rmu) => {
            let req = unsafe { std::slice::from_raw_parts(rmu.req, rmu.req_len) };
            let resp = unsafe { std::slice::from_raw_parts_mut(rmu.resp, rmu.resp_cap) };
            let len = bus.rmu_request(req, resp)?;
            unsafe { *rmu.resp_len = len };
        }
    }
    Ok(())
}

impl SmiInterface for MockBus {
    fn smi_read(&self, dev: u8, reg: u8) -> Result<u16, Box<dyn std::error::Error>> {
        let mut state = self.state.lock().unwrap();
        if let Some(queue) = state.read_queue.get_mut(&(dev, reg)) {
            if let Some(value) = queue.pop_front() {
                return Ok(value);
            }
        }
        Ok(*state.regs.get(&(dev, reg)).unwrap_or(&0))
    }

    fn smi_write(&self, dev: u8, reg: u8, value: u16) -> Result<(), Box<dyn std::error::Error>> {
        let mut state = self.state.lock().unwrap();
        state.writes.push((dev, reg, value));
        let stored = if self.busy_regs.contains(&(dev, reg)) {
            value & !BUSY
        } else {
            value
        };
        state.regs.insert((dev, reg), stored);
        Ok(())
    }

    fn rmu_request(
        &self,
        req: &[u8],
        resp: &mut [u8],
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut state = self.state.lock().unwrap();
        state.rmu_requests.push(req.to_vec());
        let payload = state
            .rmu_responses
            .pop_front()
            .ok_or("no RMU response queued")?;
        resp[..payload.len()].copy_from_slice(&payload);
        Ok(payload.len())
    }

    fn get_device_info(&self) -> Result<Option<DeviceInfo>, Box<dyn std::error::Error>> {
        Ok(self.info.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
