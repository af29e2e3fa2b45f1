//! In-memory USB stack for driving discovery and transport without hardware.
//!
//! Every open, claim, release, close and transfer is appended to a shared
//! event log so tests can assert on exact resource pairing.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use rawhid_transport::{
    AltSettingInfo, ConfigDescriptorInfo, DeviceDescriptorInfo, EndpointInfo, InterfaceInfo,
    UsbBackend, UsbError, UsbHandle,
};

/// Report descriptor of the Teensy raw HID example (usage FFAB:0200)
pub const TEENSY_RAWHID_DESCRIPTOR: &[u8] = &[
    0x06, 0xAB, 0xFF, 0x0A, 0x00, 0x02, 0xA1, 0x01, 0x75, 0x08, 0x15, 0x00, 0x26, 0xFF, 0x00,
    0x95, 0x40, 0x09, 0x01, 0x81, 0x02, 0x95, 0x40, 0x09, 0x02, 0x91, 0x02, 0xC0,
];

/// Vendor page 0xFF31, usage 0x74 (another common raw HID identity)
pub const VENDOR_FF31_DESCRIPTOR: &[u8] = &[
    0x06, 0x31, 0xFF, 0x09, 0x74, 0xA1, 0x53, 0x75, 0x08, 0x15, 0x00, 0x26, 0xFF, 0x00, 0x95,
    0x40, 0x09, 0x75, 0x81, 0x02, 0xC0,
];

/// Usage page present but no usage item before the collection ends
pub const NO_USAGE_DESCRIPTOR: &[u8] = &[0x06, 0xAB, 0xFF, 0xA1, 0x01, 0x75, 0x08, 0xC0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(usize),
    Close(usize),
    Detach(usize, u8),
    Claim(usize, u8),
    Release(usize, u8),
    GetReportDescriptor(usize, u8),
    InterruptIn(usize, u8),
    InterruptOut(usize, u8, Vec<u8>),
    ControlOut {
        device: usize,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: Vec<u8>,
    },
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Scripted behaviour of one enumerated device
pub struct MockDevice {
    pub descriptor: Result<DeviceDescriptorInfo, UsbError>,
    pub config: Result<ConfigDescriptorInfo, UsbError>,
    pub report_descriptors: HashMap<u8, Result<Vec<u8>, UsbError>>,
    pub open_error: Option<UsbError>,
    pub kernel_driver: HashSet<u8>,
    pub kernel_driver_error: Option<UsbError>,
    pub detach_error: Option<UsbError>,
    pub claim_error: HashSet<u8>,
    pub incoming: RefCell<VecDeque<Result<Vec<u8>, UsbError>>>,
    pub write_error: Option<UsbError>,
}

impl MockDevice {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            descriptor: Ok(DeviceDescriptorInfo {
                vendor_id,
                product_id,
                num_configurations: 1,
            }),
            config: Ok(ConfigDescriptorInfo::default()),
            report_descriptors: HashMap::new(),
            open_error: None,
            kernel_driver: HashSet::new(),
            kernel_driver_error: None,
            detach_error: None,
            claim_error: HashSet::new(),
            incoming: RefCell::new(VecDeque::new()),
            write_error: None,
        }
    }

    /// A Teensy running the raw HID example: one interface, IN 0x83, OUT 0x04
    pub fn teensy() -> Self {
        Self::new(0x16C0, 0x0480)
            .with_interface(vec![alt(0, 0, 3, 0, 0, &[0x83, 0x04])])
            .with_report_descriptor(0, TEENSY_RAWHID_DESCRIPTOR)
    }

    pub fn with_interface(mut self, alt_settings: Vec<AltSettingInfo>) -> Self {
        if let Ok(config) = self.config.as_mut() {
            config.interfaces.push(InterfaceInfo { alt_settings });
        }
        self
    }

    pub fn with_report_descriptor(mut self, iface: u8, bytes: &[u8]) -> Self {
        self.report_descriptors.insert(iface, Ok(bytes.to_vec()));
        self
    }

    pub fn with_report_descriptor_error(mut self, iface: u8, err: UsbError) -> Self {
        self.report_descriptors.insert(iface, Err(err));
        self
    }

    pub fn with_num_configurations(mut self, n: u8) -> Self {
        if let Ok(desc) = self.descriptor.as_mut() {
            desc.num_configurations = n;
        }
        self
    }

    pub fn with_config_error(mut self) -> Self {
        self.config = Err(UsbError::NotFound);
        self
    }

    pub fn with_open_error(mut self) -> Self {
        self.open_error = Some(UsbError::Access("permission denied".into()));
        self
    }

    pub fn with_kernel_driver(mut self, iface: u8) -> Self {
        self.kernel_driver.insert(iface);
        self
    }

    /// Kernel driver state cannot be queried on this platform
    pub fn with_kernel_driver_query_error(mut self) -> Self {
        self.kernel_driver_error = Some(UsbError::NotSupported);
        self
    }

    pub fn with_detach_error(mut self) -> Self {
        self.detach_error = Some(UsbError::Busy);
        self
    }

    pub fn with_claim_error(mut self, iface: u8) -> Self {
        self.claim_error.insert(iface);
        self
    }

    pub fn with_write_error(mut self) -> Self {
        self.write_error = Some(UsbError::Other("pipe".into()));
        self
    }

    /// Queue a packet (or error) for the next interrupt IN transfer
    pub fn queue_incoming(&self, packet: Result<Vec<u8>, UsbError>) {
        self.incoming.borrow_mut().push_back(packet);
    }
}

/// Build an alternate setting
pub fn alt(
    interface_number: u8,
    setting_number: u8,
    class_code: u8,
    sub_class_code: u8,
    protocol_code: u8,
    endpoints: &[u8],
) -> AltSettingInfo {
    AltSettingInfo {
        interface_number,
        setting_number,
        class_code,
        sub_class_code,
        protocol_code,
        endpoints: endpoints
            .iter()
            .map(|&address| EndpointInfo { address })
            .collect(),
    }
}

pub struct MockBackend {
    pub devices: Vec<Rc<MockDevice>>,
    pub log: EventLog,
    pub enumerate_error: Option<UsbError>,
}

impl MockBackend {
    pub fn new(devices: Vec<MockDevice>) -> Self {
        Self {
            devices: devices.into_iter().map(Rc::new).collect(),
            log: Rc::new(RefCell::new(Vec::new())),
            enumerate_error: None,
        }
    }

    pub fn failing() -> Self {
        let mut backend = Self::new(Vec::new());
        backend.enumerate_error = Some(UsbError::Other("no context".into()));
        backend
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.log.borrow().iter().filter(|e| pred(e)).count()
    }

    pub fn opens(&self) -> usize {
        self.count(|e| matches!(e, Event::Open(_)))
    }

    pub fn closes(&self) -> usize {
        self.count(|e| matches!(e, Event::Close(_)))
    }

    pub fn claims(&self) -> usize {
        self.count(|e| matches!(e, Event::Claim(..)))
    }

    pub fn releases(&self) -> usize {
        self.count(|e| matches!(e, Event::Release(..)))
    }
}

pub struct MockHandle {
    id: usize,
    device: Rc<MockDevice>,
    log: EventLog,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Event::Close(self.id));
    }
}

impl UsbBackend for MockBackend {
    type Device = usize;
    type Handle = MockHandle;

    fn devices(&self) -> Result<Vec<usize>, UsbError> {
        match &self.enumerate_error {
            Some(e) => Err(e.clone()),
            None => Ok((0..self.devices.len()).collect()),
        }
    }

    fn device_descriptor(&self, device: &usize) -> Result<DeviceDescriptorInfo, UsbError> {
        self.devices[*device].descriptor.clone()
    }

    fn config_descriptor(&self, device: &usize, index: u8) -> Result<ConfigDescriptorInfo, UsbError> {
        assert_eq!(index, 0, "only the first configuration is inspected");
        self.devices[*device].config.clone()
    }

    fn open(&self, device: &usize) -> Result<MockHandle, UsbError> {
        let mock = &self.devices[*device];
        if let Some(e) = &mock.open_error {
            return Err(e.clone());
        }
        self.log.borrow_mut().push(Event::Open(*device));
        Ok(MockHandle {
            id: *device,
            device: Rc::clone(mock),
            log: Rc::clone(&self.log),
        })
    }
}

impl UsbHandle for MockHandle {
    fn kernel_driver_active(&mut self, interface: u8) -> Result<bool, UsbError> {
        if let Some(e) = &self.device.kernel_driver_error {
            return Err(e.clone());
        }
        Ok(self.device.kernel_driver.contains(&interface))
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), UsbError> {
        if let Some(e) = &self.device.detach_error {
            return Err(e.clone());
        }
        self.log.borrow_mut().push(Event::Detach(self.id, interface));
        Ok(())
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        if self.device.claim_error.contains(&interface) {
            return Err(UsbError::Busy);
        }
        self.log.borrow_mut().push(Event::Claim(self.id, interface));
        Ok(())
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        self.log.borrow_mut().push(Event::Release(self.id, interface));
        Ok(())
    }

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, UsbError> {
        self.log
            .borrow_mut()
            .push(Event::InterruptIn(self.id, endpoint));
        match self.device.incoming.borrow_mut().pop_front() {
            Some(Ok(packet)) => {
                let n = packet.len().min(buf.len());
                buf[..n].copy_from_slice(&packet[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e),
            None => Err(UsbError::Timeout),
        }
    }

    fn write_interrupt(
        &self,
        endpoint: u8,
        buf: &[u8],
        _timeout: Duration,
    ) -> Result<usize, UsbError> {
        self.log
            .borrow_mut()
            .push(Event::InterruptOut(self.id, endpoint, buf.to_vec()));
        match &self.device.write_error {
            Some(e) => Err(e.clone()),
            None => Ok(buf.len()),
        }
    }

    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, UsbError> {
        assert_eq!(request_type, 0x81);
        assert_eq!(request, 0x06);
        assert_eq!(value, 0x2200);
        let iface = index as u8;
        self.log
            .borrow_mut()
            .push(Event::GetReportDescriptor(self.id, iface));
        match self.device.report_descriptors.get(&iface) {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e.clone()),
            None => Err(UsbError::Other("pipe".into())),
        }
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        _timeout: Duration,
    ) -> Result<usize, UsbError> {
        self.log.borrow_mut().push(Event::ControlOut {
            device: self.id,
            request_type,
            request,
            value,
            index,
            data: buf.to_vec(),
        });
        match &self.device.write_error {
            Some(e) => Err(e.clone()),
            None => Ok(buf.len()),
        }
    }
}
