//! USB HID keyboard and mouse output implementation.

use embassy_futures::join::join;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::hid::{
    Config as HidConfig, HidBootProtocol, HidSubclass, HidWriter, ReportId, RequestHandler, State,
};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use hid_relay_core::{KeyboardReport, MouseReport, OutputError, OutputSink};

/// HID writer over the RP2040 USB peripheral.
pub type UsbHidWriter<'d> = HidWriter<'d, Driver<'d, USB>, 8>;

/// Boot-compatible keyboard report descriptor.
///
/// - 8 modifier key bits (input)
/// - 1 reserved byte
/// - 5 LED indicators (output)
/// - 6 key code bytes (input)
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Modifier keys (8 bits) ---
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Reserved byte ---
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant)
    //
    // --- LED output (5 bits + 3 padding) ---
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant)
    //
    // --- Key codes (6 bytes) ---
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xFF, //   Usage Maximum (255)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x00, //   Input (Data, Array)
    //
    0xC0, // End Collection
];

/// Relative mouse report descriptor: 3 buttons, X/Y, wheel.
pub const MOUSE_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    //
    // --- Buttons (3 bits + 5 padding) ---
    0x05, 0x09, //     Usage Page (Buttons)
    0x19, 0x01, //     Usage Minimum (Button 1)
    0x29, 0x03, //     Usage Maximum (Button 3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x95, 0x03, //     Report Count (3)
    0x75, 0x01, //     Report Size (1)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x95, 0x01, //     Report Count (1)
    0x75, 0x05, //     Report Size (5)
    0x81, 0x01, //     Input (Constant)
    //
    // --- X, Y displacement ---
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    //
    // --- Scroll wheel ---
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    //
    0xC0, //   End Collection
    0xC0, // End Collection
];

/// USB HID keyboard + mouse output.
///
/// Wraps one embassy-usb HID writer per interface.
pub struct UsbHidOutput<'d> {
    keyboard: UsbHidWriter<'d>,
    mouse: UsbHidWriter<'d>,
    ready: bool,
}

impl<'d> UsbHidOutput<'d> {
    /// Create a new USB HID output from the keyboard and mouse writers.
    pub fn new(keyboard: UsbHidWriter<'d>, mouse: UsbHidWriter<'d>) -> Self {
        Self {
            keyboard,
            mouse,
            ready: false,
        }
    }

    /// Wait until both interfaces are ready (USB enumerated).
    pub async fn wait_ready(&mut self) {
        join(self.keyboard.ready(), self.mouse.ready()).await;
        self.ready = true;
    }
}

fn map_endpoint_error(e: EndpointError) -> OutputError {
    match e {
        EndpointError::Disabled => OutputError::Disabled,
        EndpointError::BufferOverflow => OutputError::Io,
    }
}

impl<'d> OutputSink for UsbHidOutput<'d> {
    async fn send_keyboard(&mut self, report: &KeyboardReport) -> Result<(), OutputError> {
        self.keyboard
            .write(&report.as_bytes())
            .await
            .map_err(map_endpoint_error)
    }

    async fn send_mouse(&mut self, report: &MouseReport) -> Result<(), OutputError> {
        self.mouse
            .write(&report.as_bytes())
            .await
            .map_err(map_endpoint_error)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// HID request handler (handles SET_REPORT, etc.).
///
/// Accepts and ignores keyboard LED output reports.
pub struct HidRequestHandler;

impl RequestHandler for HidRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, _id: ReportId, _data: &[u8]) -> OutResponse {
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

/// Configure the keyboard and mouse HID interfaces in the USB builder.
///
/// Returns the `(keyboard, mouse)` HID writers.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    keyboard_state: &'d mut State<'d>,
    mouse_state: &'d mut State<'d>,
    handler: &'d mut HidRequestHandler,
) -> (UsbHidWriter<'d>, UsbHidWriter<'d>) {
    let keyboard_config = HidConfig {
        report_descriptor: KEYBOARD_REPORT_DESCRIPTOR,
        request_handler: Some(handler),
        poll_ms: 1,
        max_packet_size: 8,
        hid_subclass: HidSubclass::Boot,
        hid_boot_protocol: HidBootProtocol::Keyboard,
    };
    let keyboard = HidWriter::new(builder, keyboard_state, keyboard_config);

    let mouse_config = HidConfig {
        report_descriptor: MOUSE_REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 1,
        max_packet_size: 8,
        hid_subclass: HidSubclass::Boot,
        hid_boot_protocol: HidBootProtocol::Mouse,
    };
    let mouse = HidWriter::new(builder, mouse_state, mouse_config);

    (keyboard, mouse)
}
