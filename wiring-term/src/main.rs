use std::env;
use std::process;

use serial_embedded_hal::{PortSettings, Serial};
use wiring::{ByteSink, Channel, Print, Stream};

const DEFAULT_PORT: &str = "/dev/ttyUSB0";

// Each attempt lasts at most one port read timeout.
const REPLY_ATTEMPTS: u32 = 20;

fn usage() -> ! {
    eprintln!("usage: wiring-term [PORT] [SEND [EXPECT [UNTIL]]]");
    eprintln!();
    eprintln!("Sends SEND as a line, then waits for EXPECT (ending the search");
    eprintln!("early on UNTIL). Without EXPECT, echoes the first line received.");
    eprintln!();
    eprintln!("The reply must start within {} port read timeouts, and is", REPLY_ATTEMPTS);
    eprintln!("considered over once the port stays quiet for one timeout.");
    process::exit(2);
}

/// `wait_for_reply` polls `port` until a byte is ready, giving up after
/// `attempts` empty polls.
fn wait_for_reply<S: Stream>(port: &mut S, attempts: u32) -> bool {
    (0..attempts).any(|_| port.available() > 0)
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage();
    }
    let path = args.get(0).map(String::as_str).unwrap_or(DEFAULT_PORT);

    let port = match Serial::new(
        path,
        &PortSettings {
            baud_rate: serial_embedded_hal::BaudRate::Baud115200,
            char_size: serial_embedded_hal::CharSize::Bits8,
            parity: serial_embedded_hal::Parity::ParityNone,
            stop_bits: serial_embedded_hal::StopBits::Stop1,
            flow_control: serial_embedded_hal::FlowControl::FlowNone,
        },
    ) {
        Ok(port) => port,
        Err(err) => {
            eprintln!("wiring-term: can't open {}: {}", path, err);
            process::exit(1);
        }
    };
    let (tx, rx) = port.split();
    let mut ch = Channel::new(tx, rx);

    if let Some(send) = args.get(1) {
        ch.println_str(send);
        ch.flush();
    }

    if !wait_for_reply(&mut ch, REPLY_ATTEMPTS) {
        eprintln!("wiring-term: no reply");
    }

    let ok = match args.get(2) {
        Some(expect) => {
            let until = args.get(3).map(String::as_str).unwrap_or("");
            let found = ch.find_until(expect, until);
            println!("{}", if found { "found" } else { "not found" });
            found
        }
        None => {
            let line = ch.read_string_until(b'\n');
            println!("{}", String::from_utf8_lossy(&line).trim_end_matches('\r'));
            true
        }
    };

    if let Some(err) = ch.take_error() {
        eprintln!("wiring-term: serial error: {:?}", err);
        process::exit(1);
    }
    if !ok {
        process::exit(1);
    }
}
