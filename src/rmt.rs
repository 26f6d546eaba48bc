//! RMT RX pulse-capture backend (ESP-IDF targets only).
//!
//! Implements [`PulseCapture`] over the legacy RMT receive driver using
//! raw ESP-IDF sys calls. The channel is clocked at 1 µs per tick
//! (`clk_div = 80` from the 80 MHz APB clock) so item durations map
//! directly to microseconds. Received items land in the driver's ring
//! buffer; `len()` drains them into a fixed `heapless` buffer up to the
//! `max_edges` bound requested by the last `resume`.

use core::cell::RefCell;

use esp_idf_svc::sys::*;
use log::info;

use crate::capture::{CAPTURE_CAPACITY, NO_ECHO_SENTINEL, PulseCapture};
use crate::error::{Error, Result};

/// 80 MHz APB / 80 = 1 tick per microsecond.
const RMT_CLK_DIV: u8 = 80;

/// Ticks of idle line that terminate a received item. Longer than any
/// in-range echo (~25 ms round trip at maximum range).
const IDLE_THRESHOLD_US: u16 = 30_000;

/// Glitch filter: ignore pulses shorter than 100 ticks of the filter
/// clock.
const FILTER_TICKS: u8 = 100;

/// Ring buffer size handed to `rmt_driver_install`, in bytes.
const RX_RINGBUF_BYTES: usize = 512;

#[derive(Debug)]
struct RxState {
    buf: heapless::Vec<u16, CAPTURE_CAPACITY>,
    max_edges: u16,
    capturing: bool,
}

/// RMT-backed pulse capture bound to one SIG pin.
pub struct RmtPulseCapture {
    channel: rmt_channel_t,
    ringbuf: RingbufHandle_t,
    installed: bool,
    state: RefCell<RxState>,
}

impl RmtPulseCapture {
    /// Claim `gpio_num` for RMT receive on `channel`.
    ///
    /// The capture starts paused with an empty buffer.
    pub fn new(gpio_num: i32, channel: rmt_channel_t) -> Result<Self> {
        // SAFETY: plain C struct; all unset fields are valid as zero.
        let mut cfg: rmt_config_t = unsafe { core::mem::zeroed() };
        cfg.rmt_mode = rmt_mode_t_RMT_MODE_RX;
        cfg.channel = channel;
        cfg.gpio_num = gpio_num;
        cfg.clk_div = RMT_CLK_DIV;
        cfg.mem_block_num = 2;
        cfg.__bindgen_anon_1.rx_config = rmt_rx_config_t {
            idle_threshold: IDLE_THRESHOLD_US,
            filter_ticks_thresh: FILTER_TICKS,
            filter_en: true,
            ..Default::default()
        };

        // SAFETY: cfg is fully initialised above and outlives the call.
        let ret = unsafe { rmt_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(Error::HardwareInit("rmt channel config failed"));
        }

        // SAFETY: channel was configured by rmt_config; install once.
        let ret = unsafe { rmt_driver_install(channel, RX_RINGBUF_BYTES, 0) };
        if ret != ESP_OK as i32 {
            return Err(Error::HardwareInit("rmt driver install failed"));
        }

        let mut ringbuf: RingbufHandle_t = core::ptr::null_mut();
        // SAFETY: driver is installed, so the ring buffer handle exists.
        let ret = unsafe { rmt_get_ringbuf_handle(channel, &mut ringbuf) };
        if ret != ESP_OK as i32 || ringbuf.is_null() {
            // SAFETY: install succeeded above; uninstall before bailing.
            unsafe { rmt_driver_uninstall(channel) };
            return Err(Error::HardwareInit("rmt ring buffer unavailable"));
        }

        // SAFETY: valid installed channel; stop is a no-op if not started.
        unsafe { rmt_rx_stop(channel) };

        info!("rmt: capture claimed gpio{gpio_num} on channel {channel}");

        Ok(Self {
            channel,
            ringbuf,
            installed: true,
            state: RefCell::new(RxState {
                buf: heapless::Vec::new(),
                max_edges: 0,
                capturing: false,
            }),
        })
    }

    /// Drain pending ring-buffer items into the reading buffer, honoring
    /// the `max_edges` auto-stop bound.
    fn drain_ringbuf(&self, st: &mut RxState) {
        while st.capturing && st.buf.len() < st.max_edges as usize {
            let mut size: usize = 0;
            // SAFETY: ringbuf handle is valid while the driver is
            // installed; zero-tick wait never blocks.
            let raw = unsafe { xRingbufferReceive(self.ringbuf, &mut size, 0) };
            if raw.is_null() {
                return;
            }

            let items = raw.cast::<rmt_item32_t>();
            let count = size / core::mem::size_of::<rmt_item32_t>();
            for i in 0..count {
                if st.buf.len() >= st.max_edges as usize {
                    break;
                }
                // SAFETY: the driver guarantees `size` bytes of items.
                let val = unsafe { (*items.add(i)).__bindgen_anon_1.val };
                // Low 15 bits carry the first half-period duration in
                // ticks (µs at clk_div 80). Zero means the pulse outran
                // idle_threshold, which is the hardware overflow case.
                let duration0 = (val & 0x7fff) as u16;
                let reading = if duration0 == 0 {
                    NO_ECHO_SENTINEL
                } else {
                    duration0
                };
                let _ = st.buf.push(reading);
            }

            // SAFETY: raw came from xRingbufferReceive on this handle.
            unsafe { vRingbufferReturnItem(self.ringbuf, raw) };
        }

        if st.capturing && st.buf.len() >= st.max_edges as usize {
            // SAFETY: valid installed channel.
            unsafe { rmt_rx_stop(self.channel) };
            st.capturing = false;
        }
    }
}

impl PulseCapture for RmtPulseCapture {
    fn clear(&mut self) {
        let mut st = self.state.borrow_mut();
        st.buf.clear();

        // Flush anything still sitting in the ring buffer.
        loop {
            let mut size: usize = 0;
            // SAFETY: valid handle, zero-tick wait.
            let raw = unsafe { xRingbufferReceive(self.ringbuf, &mut size, 0) };
            if raw.is_null() {
                break;
            }
            // SAFETY: raw came from xRingbufferReceive on this handle.
            unsafe { vRingbufferReturnItem(self.ringbuf, raw) };
        }
    }

    fn pause(&mut self) {
        // SAFETY: valid installed channel.
        unsafe { rmt_rx_stop(self.channel) };
        self.state.borrow_mut().capturing = false;
    }

    fn resume(&mut self, max_edges: u16) {
        {
            let mut st = self.state.borrow_mut();
            st.max_edges = max_edges;
            st.capturing = true;
        }
        // SAFETY: valid installed channel; true resets the write index.
        unsafe { rmt_rx_start(self.channel, true) };
    }

    fn len(&self) -> usize {
        let mut st = self.state.borrow_mut();
        self.drain_ringbuf(&mut st);
        st.buf.len()
    }

    fn get(&self, index: usize) -> Option<u16> {
        self.state.borrow().buf.get(index).copied()
    }

    fn deinit(&mut self) {
        if self.installed {
            // SAFETY: installed flag guards against double-uninstall.
            unsafe {
                rmt_rx_stop(self.channel);
                rmt_driver_uninstall(self.channel);
            }
            self.installed = false;
            self.state.borrow_mut().capturing = false;
        }
    }
}

impl Drop for RmtPulseCapture {
    fn drop(&mut self) {
        self.deinit();
    }
}
