#![no_std]
#![no_main]

use defmt::{debug, error, info};
#[cfg(not(feature = "uart-flow-control"))]
use defmt::warn;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{UART0, USB};
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
#[cfg(not(feature = "uart-flow-control"))]
use embassy_sync::channel::TrySendError;
use embassy_time::Delay;
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use hid_relay_firmware::{
    configure_usb_hid, ChannelInput, CommandRelay, HidRequestHandler, LineChannel, LineMessage,
    Outcome, UartLineReader, UsbHidOutput, GRAMMAR, LINE_QUEUE_DEPTH,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART0_IRQ => embassy_rp::uart::InterruptHandler<UART0>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Lines from the UART task to the relay task.
///
/// A Channel rather than a Signal: every command line must be dispatched,
/// in order.
static LINE_CHANNEL: StaticCell<LineChannel> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state, one per interface.
static KEYBOARD_STATE: StaticCell<State> = StaticCell::new();
static MOUSE_STATE: StaticCell<State> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<HidRequestHandler> = StaticCell::new();

type Relay = CommandRelay<ChannelInput<'static>, UsbHidOutput<'static>, Delay>;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("HID relay starting ({:?} grammar)...", GRAMMAR);

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let channel: &'static LineChannel = LINE_CHANNEL.init(LineChannel::new());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;

    #[cfg(not(feature = "uart-flow-control"))]
    let uart = Uart::new(
        p.UART0,
        p.PIN_0, // TX
        p.PIN_1, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    #[cfg(feature = "uart-flow-control")]
    let uart = Uart::new_with_rtscts(
        p.UART0,
        p.PIN_0, // TX
        p.PIN_1, // RX
        p.PIN_3, // RTS
        p.PIN_2, // CTS
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (_tx, rx) = uart.split();
    let reader = UartLineReader::new(rx);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust HID Relay");
    usb_config.product = Some("UART-to-HID Keyboard/Mouse");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure keyboard and mouse HID interfaces
    let (keyboard_writer, mouse_writer) = configure_usb_hid(
        &mut builder,
        KEYBOARD_STATE.init(State::new()),
        MOUSE_STATE.init(State::new()),
        REQUEST_HANDLER.init(HidRequestHandler),
    );

    let usb_device = builder.build();

    let relay = CommandRelay::new(
        ChannelInput::new(channel),
        UsbHidOutput::new(keyboard_writer, mouse_writer),
        Delay,
        GRAMMAR,
    );

    // LED for error indication (on-board LED on Pico)
    let led = Output::new(p.PIN_25, Level::Low);

    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(uart_task(reader, channel.sender(), led).unwrap());
    spawner.spawn(relay_task(relay).unwrap());

    info!("HID relay initialized, waiting for commands...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// UART task - frames lines and queues them for the relay.
///
/// Keeps draining the UART while the relay is typing. When the queue is
/// full the new line is dropped, unless hardware flow control is enabled:
/// then the task waits for room and RTS holds the host off.
#[embassy_executor::task]
async fn uart_task(
    mut reader: UartLineReader<'static>,
    sender: Sender<'static, CriticalSectionRawMutex, LineMessage, LINE_QUEUE_DEPTH>,
    mut led: Output<'static>,
) {
    loop {
        let message = reader.read_line().await;
        match &message {
            Ok(line) => debug!("Received: {=[u8]:a}", line.as_slice()),
            Err(e) => {
                error!("UART error: {:?}", e);
                // Toggle LED to indicate error
                led.toggle();
            }
        }

        #[cfg(feature = "uart-flow-control")]
        {
            sender.send(message).await;
        }

        #[cfg(not(feature = "uart-flow-control"))]
        {
            if let Err(TrySendError::Full(dropped)) = sender.try_send(message) {
                match dropped {
                    Ok(line) => warn!("Line queue full, dropping: {=[u8]:a}", line.as_slice()),
                    Err(_) => warn!("Line queue full, dropping UART error"),
                }
            }
        }
    }
}

/// Relay task - dispatches queued lines to USB HID.
#[embassy_executor::task]
async fn relay_task(mut relay: Relay) {
    // Wait for USB to be ready
    relay.output_mut().wait_ready().await;
    info!("USB HID ready, relaying commands...");

    relay
        .run(|result| match result {
            Ok(Outcome::Ignored(reason)) => debug!("Ignored line: {:?}", reason),
            Ok(outcome) => debug!("Dispatched: {:?}", outcome),
            Err(e) => error!("Relay error: {:?}", e),
        })
        .await
}
