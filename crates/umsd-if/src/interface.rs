// SPDX-FileCopyrightText: © 2024 Marvell Technology, Inc.
// SPDX-License-Identifier: Apache-2.0

/// Raw SMI/MDIO transactions handed to the platform callback.
#[derive(Debug)]
pub enum FnSmi {
    Read { dev: u8, reg: u8, value: *mut u16 },
    Write { dev: u8, reg: u8, value: u16 },
}

/// An RMU request/response exchange. The platform owns the L2 framing;
/// `req`/`resp` are the RMU payloads only.
#[derive(Debug)]
pub struct FnRmu {
    pub req: *const u8,
    pub req_len: usize,
    pub resp: *mut u8,
    pub resp_cap: usize,
    pub resp_len: *mut usize,
}

#[derive(Clone, Debug)]
pub struct DeviceInfo {
    pub interface_id: u32,

    /// SMI address the switch answers on (single-chip mode) or the base
    /// address of the command/data pair (multi-chip mode).
    pub smi_addr: u8,
    pub multi_chip: bool,

    pub bus: u16,
}

#[derive(Debug)]
pub enum FnDriver {
    DeviceInfo(*mut Option<DeviceInfo>),
}

#[derive(Debug)]
pub enum FnOptions {
    Driver(FnDriver),
    Smi(FnSmi),
    Rmu(FnRmu),
}

/// The transport a switch is reached through. Implemented by platform glue;
/// everything above it is chip logic.
pub trait SmiInterface: Send + Sync {
    fn smi_read(&self, dev: u8, reg: u8) -> Result<u16, Box<dyn std::error::Error>>;

    fn smi_write(&self, dev: u8, reg: u8, value: u16) -> Result<(), Box<dyn std::error::Error>>;

    /// Send an RMU payload and return the response payload length.
    fn rmu_request(
        &self,
        req: &[u8],
        resp: &mut [u8],
    ) -> Result<usize, Box<dyn std::error::Error>>;

    fn get_device_info(&self) -> Result<Option<DeviceInfo>, Box<dyn std::error::Error>>;

    fn as_any(&self) -> &dyn std::any::Any;
}

/// Adapter that funnels every transport operation through a single C-style
/// callback. Useful for bindings where the platform hands us one function
/// pointer plus a context value.
#[derive(Clone)]
pub struct CallbackStorage<T: Clone + Send> {
    pub callback: fn(&T, FnOptions) -> Result<(), Box<dyn std::error::Error>>,
    pub user_data: T,
}

impl<T: Clone + Send> CallbackStorage<T> {
    pub fn new(
        callback: fn(&T, FnOptions) -> Result<(), Box<dyn std::error::Error>>,
        user_data: T,
    ) -> Self {
        Self {
            callback,
            user_data,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SmiInterface for CallbackStorage<T> {
    fn smi_read(&self, dev: u8, reg: u8) -> Result<u16, Box<dyn std::error::Error>> {
        let mut value = 0u16;
        (self.callback)(
            &self.user_data,
            FnOptions::Smi(FnSmi::Read {
                dev,
                reg,
                value: (&mut value) as *mut _,
            }),
        )?;

        Ok(value)
    }

    fn smi_write(&self, dev: u8, reg: u8, value: u16) -> Result<(), Box<dyn std::error::Error>> {
        (self.callback)(
            &self.user_data,
            FnOptions::Smi(FnSmi::Write { dev, reg, value }),
        )
    }

    fn rmu_request(
        &self,
        req: &[u8],
        resp: &mut [u8],
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut resp_len = 0usize;
        (self.callback)(
            &self.user_data,
            FnOptions::Rmu(FnRmu {
                req: req.as_ptr(),
                req_len: req.len(),
                resp: resp.as_mut_ptr(),
                resp_cap: resp.len(),
                resp_len: (&mut resp_len) as *mut _,
            }),
        )?;

        Ok(resp_len)
    }

    fn get_device_info(&self) -> Result<Option<DeviceInfo>, Box<dyn std::error::Error>> {
        let mut driver_info = None;
        (self.callback)(
            &self.user_data,
            FnOptions::Driver(FnDriver::DeviceInfo((&mut driver_info) as *mut _)),
        )?;

        Ok(driver_info)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
