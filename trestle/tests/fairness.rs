//! Readiness tie-break: with several sockets continuously readable, delivery
//! counts stay close to uniform rather than favoring a fixed poll order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use trestle::{Context, Payload, Registration, SocketKind};

const SOCKETS: usize = 3;
const SAMPLES: usize = 9_000;

#[test]
fn test_poller_fairness() {
    let ctx = Context::new("fairness");

    // All three PULL sockets share one inbound channel; each feeder stamps
    // its socket index into the message body.
    let (inbound_tx, inbound_rx) = flume::unbounded::<Payload>();
    for i in 0..SOCKETS {
        let addr = format!("inproc://fairness-{i}");
        let tx = inbound_tx.clone();
        ctx.register(
            Registration::new()
                .socket_type(SocketKind::Pull)
                .configure(move |socket| socket.bind(&addr))
                .inbound(tx),
        )
        .unwrap();
    }
    drop(inbound_tx);

    let stop = Arc::new(AtomicBool::new(false));
    let mut feeders = Vec::new();
    for i in 0..SOCKETS {
        let stop = Arc::clone(&stop);
        let zmq_ctx = ctx.zmq_context().clone();
        feeders.push(thread::spawn(move || {
            let push = zmq_ctx.socket(zmq::PUSH).unwrap();
            push.set_linger(0).unwrap();
            push.connect(&format!("inproc://fairness-{i}")).unwrap();
            let body = i.to_string();
            while !stop.load(Ordering::Relaxed) {
                match push.send(body.as_bytes(), zmq::DONTWAIT) {
                    Ok(()) => {}
                    Err(zmq::Error::EAGAIN) => thread::sleep(Duration::from_millis(1)),
                    Err(e) => panic!("feeder send failed: {e}"),
                }
            }
        }));
    }

    let mut counts = [0usize; SOCKETS];
    for _ in 0..SAMPLES {
        let payload = inbound_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let body = &payload.parts()[0];
        let index = (body[0] - b'0') as usize;
        counts[index] += 1;
    }

    stop.store(true, Ordering::Relaxed);
    for feeder in feeders {
        feeder.join().unwrap();
    }

    // Uniform would be 3000 each; a fixed-priority poller would starve two
    // sockets entirely. Allow a wide statistical margin.
    let floor = SAMPLES / SOCKETS / 5 * 3;
    for (i, count) in counts.iter().enumerate() {
        assert!(
            *count >= floor,
            "socket {i} starved: counts = {counts:?}"
        );
    }

    ctx.shutdown();
}
