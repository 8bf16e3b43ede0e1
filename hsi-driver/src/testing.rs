//! Mock collaborators for host tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin};

use hsi_core::registers::sys;
use hsi_core::{ChannelId, HwVariant, PortEvent};
use hsi_hal::{ClockDomain, DeferredWork, DmaChannel, RegisterAccess, TransferBackend, TransferError};

use crate::controller::Controller;
use crate::device::Device;
use crate::platform::{Platform, PortConfig};

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RegFile {
    values: HashMap<u32, u32>,
    writes: Vec<(u32, u32)>,
    stuck_reset: bool,
}

/// Register file with a write log
///
/// Emulates the write-one-to-set/clear wake registers and the soft reset
/// (which clears every register).
#[derive(Clone, Default)]
pub struct MockRegs(Arc<StdMutex<RegFile>>);

impl MockRegs {
    /// Current value, without logging
    pub fn get(&self, offset: u32) -> u32 {
        self.0.lock().unwrap().values.get(&offset).copied().unwrap_or(0)
    }

    /// Set a value as the hardware would, without logging
    pub fn poke(&self, offset: u32, value: u32) {
        self.0.lock().unwrap().values.insert(offset, value);
    }

    /// Every driver write since the last [`MockRegs::clear_log`]
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.0.lock().unwrap().writes.clone()
    }

    /// Driver writes to `offset`
    pub fn writes_to(&self, offset: u32) -> Vec<u32> {
        self.writes()
            .into_iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn clear_log(&self) {
        self.0.lock().unwrap().writes.clear();
    }

    /// Make the soft reset never report completion
    pub fn set_stuck_reset(&self, stuck: bool) {
        self.0.lock().unwrap().stuck_reset = stuck;
    }
}

fn wake_port(offset: u32, reg: fn(u8) -> u32) -> Option<u8> {
    (0..hsi_core::MAX_PORTS as u8).find(|&p| reg(p) == offset)
}

impl RegisterAccess for MockRegs {
    fn base(&self) -> usize {
        0x4A05_8000
    }

    fn read32(&mut self, offset: u32) -> u32 {
        let file = self.0.lock().unwrap();
        if offset == sys::SYSSTATUS {
            return if file.stuck_reset { 0 } else { sys::RESETDONE };
        }
        file.values.get(&offset).copied().unwrap_or(0)
    }

    fn write32(&mut self, offset: u32, value: u32) {
        let mut file = self.0.lock().unwrap();
        file.writes.push((offset, value));

        if let Some(port) = wake_port(offset, sys::set_wake) {
            *file.values.entry(sys::wake(port)).or_default() |= value;
        } else if let Some(port) = wake_port(offset, sys::clear_wake) {
            *file.values.entry(sys::wake(port)).or_default() &= !value;
        } else if offset == sys::SYSCONFIG && value & sys::SOFTRESET != 0 {
            file.values.clear();
        } else {
            file.values.insert(offset, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Transfer backend
// ---------------------------------------------------------------------------

/// Backend call, as recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    WriteIrq(ChannelId, usize),
    ReadIrq(ChannelId, Option<usize>),
    CancelWriteIrq(ChannelId),
    CancelReadIrq(ChannelId),
    WriteDma(ChannelId, usize, usize),
    ReadDma(ChannelId, usize, usize),
    CancelWriteDma(ChannelId, DmaChannel),
    CancelReadDma(ChannelId, DmaChannel),
}

#[derive(Default)]
struct BackendLog {
    calls: Vec<Call>,
    fail_next: Option<TransferError>,
    next_dma: u8,
}

/// Recording backend with fault injection
#[derive(Clone, Default)]
pub struct MockBackend(Arc<StdMutex<BackendLog>>);

impl MockBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().calls.clear();
    }

    /// Fail the next submit/enable call with `err`
    pub fn fail_next(&self, err: TransferError) {
        self.0.lock().unwrap().fail_next = Some(err);
    }

    fn record(&self, call: Call) {
        self.0.lock().unwrap().calls.push(call);
    }

    fn fallible(&self, call: Call) -> Result<(), TransferError> {
        let mut log = self.0.lock().unwrap();
        log.calls.push(call);
        match log.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn dma(&self, call: Call) -> Result<DmaChannel, TransferError> {
        self.fallible(call)?;
        let mut log = self.0.lock().unwrap();
        let dma = DmaChannel(log.next_dma);
        log.next_dma = log.next_dma.wrapping_add(1);
        Ok(dma)
    }
}

impl TransferBackend for MockBackend {
    fn enable_write_interrupt(&mut self, ch: ChannelId, buf: usize) -> Result<(), TransferError> {
        self.fallible(Call::WriteIrq(ch, buf))
    }

    fn enable_read_interrupt(
        &mut self,
        ch: ChannelId,
        buf: Option<usize>,
    ) -> Result<(), TransferError> {
        self.fallible(Call::ReadIrq(ch, buf))
    }

    fn cancel_write_interrupt(&mut self, ch: ChannelId) {
        self.record(Call::CancelWriteIrq(ch));
    }

    fn cancel_read_interrupt(&mut self, ch: ChannelId) {
        self.record(Call::CancelReadIrq(ch));
    }

    fn write_dma(&mut self, ch: ChannelId, buf: usize, words: usize) -> Result<DmaChannel, TransferError> {
        self.dma(Call::WriteDma(ch, buf, words))
    }

    fn read_dma(&mut self, ch: ChannelId, buf: usize, words: usize) -> Result<DmaChannel, TransferError> {
        self.dma(Call::ReadDma(ch, buf, words))
    }

    fn cancel_write_dma(&mut self, ch: ChannelId, dma: DmaChannel) {
        self.record(Call::CancelWriteDma(ch, dma));
    }

    fn cancel_read_dma(&mut self, ch: ChannelId, dma: DmaChannel) {
        self.record(Call::CancelReadDma(ch, dma));
    }
}

// ---------------------------------------------------------------------------
// Clocks, deferred work, wake line
// ---------------------------------------------------------------------------

/// Reference-counted clock; panics on an unmatched disable
#[derive(Clone, Default)]
pub struct MockClocks(Arc<AtomicIsize>);

impl MockClocks {
    pub fn refs(&self) -> isize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ClockDomain for MockClocks {
    fn enable(&self, _channel: ChannelId, _tag: &'static str) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn disable(&self, channel: ChannelId, tag: &'static str) {
        let prev = self.0.fetch_sub(1, Ordering::SeqCst);
        assert!(prev > 0, "clock underflow: {:?} {}", channel, tag);
    }
}

#[derive(Default)]
struct WorkState {
    scheduled: AtomicBool,
    running: AtomicBool,
    schedules: AtomicUsize,
}

/// Deferred task whose running state is set by the test
#[derive(Clone, Default)]
pub struct MockWork(Arc<WorkState>);

impl MockWork {
    pub fn is_scheduled(&self) -> bool {
        self.0.scheduled.load(Ordering::SeqCst)
    }

    pub fn schedules(&self) -> usize {
        self.0.schedules.load(Ordering::SeqCst)
    }

    /// Pretend the task body has started (or finished)
    pub fn set_running(&self, running: bool) {
        self.0.running.store(running, Ordering::SeqCst);
        if running {
            self.0.scheduled.store(false, Ordering::SeqCst);
        }
    }
}

impl DeferredWork for MockWork {
    fn schedule(&self) {
        self.0.scheduled.store(true, Ordering::SeqCst);
        self.0.schedules.fetch_add(1, Ordering::SeqCst);
    }

    fn try_cancel(&self) -> bool {
        if self.0.running.load(Ordering::SeqCst) {
            return false;
        }
        self.0.scheduled.store(false, Ordering::SeqCst);
        true
    }
}

#[derive(Debug)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Peer wake line driven by the test
#[derive(Clone, Default)]
pub struct MockPin {
    high: Arc<AtomicBool>,
    broken: Arc<AtomicBool>,
}

impl MockPin {
    pub fn set(&self, high: bool) {
        self.high.store(high, Ordering::SeqCst);
    }

    pub fn break_line(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

impl ErrorType for MockPin {
    type Error = PinFault;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, PinFault> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(PinFault);
        }
        Ok(self.high.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, PinFault> {
        self.is_high().map(|high| !high)
    }
}

// ---------------------------------------------------------------------------
// Rig
// ---------------------------------------------------------------------------

pub struct TestPlatform;

impl Platform for TestPlatform {
    type Regs = MockRegs;
    type Backend = MockBackend;
    type Clocks = MockClocks;
    type Work = MockWork;
    type WakeLine = MockPin;
}

pub type TestController = Controller<CriticalSectionRawMutex, TestPlatform>;
pub type TestDevice<'a> = Device<'a, CriticalSectionRawMutex, TestPlatform>;

/// Callback invocations seen by the rig
#[derive(Clone, Default)]
pub struct Recorder {
    pub reads: Arc<StdMutex<Vec<(ChannelId, usize)>>>,
    pub writes: Arc<StdMutex<Vec<(ChannelId, usize)>>>,
    pub events: Arc<StdMutex<Vec<(ChannelId, PortEvent)>>>,
}

impl Recorder {
    pub fn reads(&self) -> Vec<(ChannelId, usize)> {
        self.reads.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<(ChannelId, usize)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<(ChannelId, PortEvent)> {
        self.events.lock().unwrap().clone()
    }
}

/// A controller with one 4-channel port and handles on every mock
pub struct Rig {
    pub ctrl: TestController,
    pub regs: MockRegs,
    pub backend: MockBackend,
    pub clocks: MockClocks,
    pub work: MockWork,
    pub peer: MockPin,
    pub seen: Recorder,
}

pub const PORT_CHANNELS: u8 = 4;

impl Rig {
    pub fn new(variant: HwVariant) -> Self {
        Self::build(variant, true)
    }

    /// Port without a peer wake line
    pub fn without_line(variant: HwVariant) -> Self {
        Self::build(variant, false)
    }

    fn build(variant: HwVariant, with_line: bool) -> Self {
        let regs = MockRegs::default();
        let backend = MockBackend::default();
        let clocks = MockClocks::default();
        let work = MockWork::default();
        let peer = MockPin::default();

        let mut ctrl = TestController::new(variant, regs.clone(), backend.clone(), clocks.clone());
        ctrl.add_port(PortConfig {
            max_channels: PORT_CHANNELS,
            irq: 0,
            wake_line: with_line.then(|| peer.clone()),
            work: work.clone(),
        })
        .unwrap();

        Self {
            ctrl,
            regs,
            backend,
            clocks,
            work,
            peer,
            seen: Recorder::default(),
        }
    }

    pub fn dev(&self, channel: u8) -> TestDevice<'_> {
        self.ctrl.device(0, channel).unwrap()
    }

    /// Register recording callbacks on `channel`
    pub fn hook(&self, channel: u8) -> TestDevice<'_> {
        let dev = self.dev(channel);

        let reads = self.seen.reads.clone();
        dev.set_read_callback(Box::leak(Box::new(move |id: ChannelId, n: usize| {
            reads.lock().unwrap().push((id, n));
        })));
        let writes = self.seen.writes.clone();
        dev.set_write_callback(Box::leak(Box::new(move |id: ChannelId, n: usize| {
            writes.lock().unwrap().push((id, n));
        })));
        let events = self.seen.events.clone();
        dev.set_event_callback(Box::leak(Box::new(move |id: ChannelId, ev: PortEvent| {
            events.lock().unwrap().push((id, ev));
        })));
        dev
    }

    /// Hook and open `channel`
    pub fn open(&self, channel: u8) -> TestDevice<'_> {
        let dev = self.hook(channel);
        dev.open().unwrap();
        dev
    }
}
