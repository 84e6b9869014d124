//! Simple dashboard subscriber, prints a summary of every frame received.
//!
//! Usage: `dash_sub [endpoint]`, the endpoint defaults to `tcp://localhost:5040`.

use comms_if::{dash::DashFrame, net::zmq};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tcp://localhost:5040".into());

    // Create context and socket
    let ctx = zmq::Context::new();
    let socket = ctx.socket(zmq::SUB)?;
    socket.connect(&endpoint)?;
    socket.set_subscribe(b"")?;

    println!("Listening on {}", endpoint);

    // Recieve frames from the dashboard server
    loop {
        let msg = socket.recv_string(0)?;

        let json = match msg {
            Ok(s) => s,
            Err(_) => {
                println!("Got a non UTF-8 message");
                continue;
            }
        };

        match serde_json::from_str::<DashFrame>(&json) {
            Ok(DashFrame::Layout { channels }) => {
                println!("Layout: {} channels", channels.len());
                for c in channels {
                    println!(
                        "    {:>3} {:?}/{} {}",
                        c.id.0,
                        c.spec.group.tab,
                        c.spec.group.layout_name().unwrap_or("-"),
                        c.spec.name
                    );
                }
            }
            Ok(DashFrame::Values {
                timestamp,
                keyframe,
                values,
            }) => println!(
                "{} {} values{}",
                timestamp,
                values.len(),
                if keyframe { " (keyframe)" } else { "" }
            ),
            Err(e) => println!("Could not parse frame: {}", e),
        }
    }
}
