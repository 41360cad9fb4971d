// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for discovery and polling against fake devices on
//! loopback UDP sockets.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use raidar_lib::protocol::{HEADER_LEN, REQUEST_LEN};
use raidar_lib::{ClientConfig, ClientEvent, ConnectionState, Error, NasClient, PollOutcome};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::time::{Instant, sleep};

const BODY: &str = "00:0d:a2:01:09:bd\tNASgul\t192.168.1.5\t\
model!!0!!mode=pro::descr=ReadyNAS NV::arch=nsp\n\
temp!!0!!status=ok::descr=38.0C/100.4F::expected=0-65C/32-149F\n\
fan!!0!!status=ok::descr=2352RPM\n\
volume!!1!!status=ok::descr=Volume C: RAID Level X, Redundant; 120 GB (13%) of 913 GB used\n\
disk!!1!!status=ok::descr=Channel 1: ST3320620AS 298 GB, 35C/95F\n\
\tRAIDiator!!version=4.1.7,time=1\t1\n";

/// Builds a full status reply: the opaque header followed by `BODY`.
fn status_reply() -> Vec<u8> {
    let mut raw = vec![0u8; HEADER_LEN];
    raw.extend_from_slice(BODY.as_bytes());
    raw
}

/// A reply too short to be a status payload.
fn short_reply() -> Vec<u8> {
    vec![0u8; HEADER_LEN]
}

/// A fake device answering every request with a configurable reply.
struct FakeNas {
    addr: SocketAddr,
    reply: Arc<Mutex<Option<Vec<u8>>>>,
    requests: Arc<AtomicUsize>,
}

impl FakeNas {
    /// Starts a device that sends `reply` `repeats` times per request.
    /// `None` keeps the device silent.
    async fn start(reply: Option<Vec<u8>>, repeats: usize) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let reply = Arc::new(Mutex::new(reply));
        let requests = Arc::new(AtomicUsize::new(0));

        let (task_reply, task_requests) = (Arc::clone(&reply), Arc::clone(&requests));
        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            while let Ok((len, from)) = socket.recv_from(&mut buf).await {
                assert_eq!(len, REQUEST_LEN, "unexpected request length");
                task_requests.fetch_add(1, Ordering::SeqCst);
                let bytes = task_reply.lock().clone();
                if let Some(bytes) = bytes {
                    for _ in 0..repeats {
                        let _ = socket.send_to(&bytes, from).await;
                    }
                }
            }
        });

        Self {
            addr,
            reply,
            requests,
        }
    }

    fn set_reply(&self, reply: Option<Vec<u8>>) {
        *self.reply.lock() = reply;
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Configuration pointing discovery at `nas` instead of the broadcast
/// address.
fn config_for(nas: &FakeNas) -> ClientConfig {
    ClientConfig::new()
        .with_local_address("0.0.0.0:0".parse().unwrap())
        .with_broadcast_address(nas.addr.ip())
        .with_port(nas.addr.port())
        .with_discovery_window(Duration::from_millis(300))
        .with_poll_timeout(Duration::from_millis(100))
}

fn drain(events: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    std::iter::from_fn(|| events.try_recv().ok()).collect()
}

async fn discovered_client(nas: &FakeNas) -> NasClient {
    let client = NasClient::bind(config_for(nas)).await.unwrap();
    let devices = client.discover().await.unwrap();
    assert_eq!(devices.len(), 1);
    client
}

// ============================================================================
// Discovery
// ============================================================================

mod discovery {
    use super::*;

    #[tokio::test]
    async fn finds_device_once_despite_repeated_replies() {
        let nas = FakeNas::start(Some(status_reply()), 3).await;
        let client = NasClient::bind(config_for(&nas)).await.unwrap();
        let mut events = client.subscribe();

        let devices = client.discover().await.unwrap();

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip(), nas.addr.ip());
        assert_eq!(client.state(), ConnectionState::Ready);
        assert_eq!(nas.requests(), 1);

        let discovered: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|event| match event {
                ClientEvent::DeviceDiscovered {
                    payload, report, ..
                } => Some((payload, report)),
                _ => None,
            })
            .collect();
        assert_eq!(discovered.len(), 1);
        let (payload, report) = &discovered[0];
        assert!(payload.starts_with("00:0d:a2:01:09:bd"));
        assert_eq!(report.as_ref().unwrap().name, "NASgul");
    }

    #[tokio::test]
    async fn short_reply_still_registers_device() {
        let nas = FakeNas::start(Some(short_reply()), 1).await;
        let client = NasClient::bind(config_for(&nas)).await.unwrap();
        let mut events = client.subscribe();

        let devices = client.discover().await.unwrap();

        assert_eq!(devices.len(), 1);
        let Some(ClientEvent::DeviceDiscovered {
            payload, report, ..
        }) = drain(&mut events)
            .into_iter()
            .find(|e| matches!(e, ClientEvent::DeviceDiscovered { .. }))
        else {
            panic!("no discovery event");
        };
        assert!(payload.is_empty());
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn silent_network_stays_discovering() {
        let nas = FakeNas::start(None, 1).await;
        let client = NasClient::bind(config_for(&nas)).await.unwrap();

        let devices = client.discover().await.unwrap();

        assert!(devices.is_empty());
        assert_eq!(client.state(), ConnectionState::Discovering);
        assert_eq!(client.request_status().await.unwrap(), PollOutcome::Skipped);
    }

    #[tokio::test]
    async fn stops_early_at_device_limit() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let config = config_for(&nas)
            .with_discovery_window(Duration::from_secs(10))
            .with_max_devices(1);
        let client = NasClient::bind(config).await.unwrap();

        let started = Instant::now();
        let devices = client.discover().await.unwrap();

        assert_eq!(devices.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(client.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn concurrent_discovery_is_busy() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = NasClient::bind(config_for(&nas)).await.unwrap();

        let running = client.start_discovery().unwrap();

        assert!(matches!(client.start_discovery(), Err(Error::Busy)));
        assert_eq!(client.request_status().await.unwrap(), PollOutcome::Skipped);
        assert_eq!(running.await.unwrap().unwrap().len(), 1);
    }
}

// ============================================================================
// Polling
// ============================================================================

mod polling {
    use super::*;

    #[tokio::test]
    async fn poll_returns_report() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        let mut events = client.subscribe();

        let outcome = client.request_status().await.unwrap();

        let report = outcome.report().expect("expected a report");
        assert_eq!(report.name, "NASgul");
        assert_eq!(report.software_version, "4.1.7");
        assert_eq!(report.volumes[0].used_percent, 13);
        assert!(report.is_healthy());
        assert_eq!(client.state(), ConnectionState::Ready);

        let events = drain(&mut events);
        assert!(events.iter().any(|e| matches!(
            e,
            ClientEvent::StatusReceived { address, .. } if *address == nas.addr.ip()
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            ClientEvent::StateChanged {
                from: ConnectionState::Ready,
                to: ConnectionState::AwaitingResponse
            }
        )));
    }

    #[tokio::test]
    async fn short_reply_is_ignored() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        nas.set_reply(Some(short_reply()));

        assert_eq!(client.request_status().await.unwrap(), PollOutcome::Ignored);
        assert_eq!(client.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn connection_lost_fires_once() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        let mut events = client.subscribe();
        nas.set_reply(None);

        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.push(client.request_status().await.unwrap());
        }

        assert_eq!(outcomes[0], PollOutcome::TimedOut { notified: true });
        assert!(
            outcomes[1..]
                .iter()
                .all(|o| *o == PollOutcome::TimedOut { notified: false })
        );
        assert_eq!(client.state(), ConnectionState::ConnectionLost);

        let lost = drain(&mut events)
            .into_iter()
            .filter(ClientEvent::is_connection_lost)
            .count();
        assert_eq!(lost, 1);
    }

    #[tokio::test]
    async fn reply_after_loss_reconnects_and_rearms() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        let mut events = client.subscribe();

        nas.set_reply(None);
        client.request_status().await.unwrap();
        client.request_status().await.unwrap();
        assert_eq!(client.state(), ConnectionState::ConnectionLost);

        nas.set_reply(Some(status_reply()));
        assert!(client.request_status().await.unwrap().report().is_some());
        assert_eq!(client.state(), ConnectionState::Ready);

        let transitions: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                ClientEvent::StateChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert!(transitions.contains(&(
            ConnectionState::ConnectionLost,
            ConnectionState::AwaitingReconnect
        )));
        assert!(transitions.contains(&(ConnectionState::AwaitingReconnect, ConnectionState::Ready)));

        nas.set_reply(None);
        assert_eq!(
            client.request_status().await.unwrap(),
            PollOutcome::TimedOut { notified: true }
        );
    }

    #[tokio::test]
    async fn undecodable_reply_returns_parse_error() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        let mut events = client.subscribe();
        let mut garbage = vec![0u8; HEADER_LEN];
        garbage.extend_from_slice("x".repeat(120).as_bytes());
        nas.set_reply(Some(garbage));

        let result = client.request_status().await;

        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(client.state(), ConnectionState::Ready);
        assert!(
            !drain(&mut events)
                .iter()
                .any(|e| matches!(e, ClientEvent::StatusReceived { .. }))
        );

        // The next poll recovers once the device answers properly
        nas.set_reply(Some(status_reply()));
        assert!(client.request_status().await.unwrap().report().is_some());
    }

    #[tokio::test]
    async fn reply_from_other_host_is_not_an_answer() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        let mut events = client.subscribe();
        nas.set_reply(None);

        let stranger = UdpSocket::bind("127.0.0.2:0").await.unwrap();
        let client_addr = SocketAddr::new(nas.addr.ip(), client.local_addr().port());
        let poll = tokio::spawn({
            let client = client.clone();
            async move { client.request_status().await }
        });
        sleep(Duration::from_millis(20)).await;
        stranger.send_to(&status_reply(), client_addr).await.unwrap();

        assert_eq!(
            poll.await.unwrap().unwrap(),
            PollOutcome::TimedOut { notified: true }
        );
        assert_eq!(client.state(), ConnectionState::ConnectionLost);
        assert!(
            !drain(&mut events)
                .iter()
                .any(|e| matches!(e, ClientEvent::StatusReceived { .. }))
        );
    }

    #[tokio::test]
    async fn stale_reply_does_not_answer_next_poll() {
        // Every request is answered twice; discovery stops after the first
        let nas = FakeNas::start(Some(status_reply()), 2).await;
        let client = NasClient::bind(config_for(&nas).with_max_devices(1))
            .await
            .unwrap();
        client.discover().await.unwrap();
        sleep(Duration::from_millis(50)).await;
        nas.set_reply(None);

        assert_eq!(
            client.request_status().await.unwrap(),
            PollOutcome::TimedOut { notified: true }
        );
        assert_eq!(client.state(), ConnectionState::ConnectionLost);
    }

    #[tokio::test]
    async fn late_reply_to_timed_out_poll_is_discarded() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        nas.set_reply(None);
        client.request_status().await.unwrap();

        // Answer arriving after the poll gave up
        let late = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client_addr = SocketAddr::new(nas.addr.ip(), client.local_addr().port());
        late.send_to(&status_reply(), client_addr).await.unwrap();
        sleep(Duration::from_millis(20)).await;

        assert_eq!(
            client.request_status().await.unwrap(),
            PollOutcome::TimedOut { notified: false }
        );
        assert_eq!(client.state(), ConnectionState::ConnectionLost);
    }

    #[tokio::test]
    async fn only_one_request_outstanding() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = discovered_client(&nas).await;
        nas.set_reply(None);

        let first = tokio::spawn({
            let client = client.clone();
            async move { client.request_status().await }
        });
        sleep(Duration::from_millis(20)).await;

        assert_eq!(client.state(), ConnectionState::AwaitingResponse);
        assert_eq!(client.request_status().await.unwrap(), PollOutcome::Skipped);
        assert_eq!(
            first.await.unwrap().unwrap(),
            PollOutcome::TimedOut { notified: true }
        );
        // Discovery request plus a single poll
        assert_eq!(nas.requests(), 2);
    }
}

// ============================================================================
// Shutdown
// ============================================================================

mod shutdown {
    use super::*;

    #[tokio::test]
    async fn unblocks_discovery() {
        let nas = FakeNas::start(None, 1).await;
        let config = config_for(&nas).with_discovery_window(Duration::from_secs(30));
        let client = NasClient::bind(config).await.unwrap();

        let running = client.start_discovery().unwrap();
        sleep(Duration::from_millis(20)).await;
        client.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), running)
            .await
            .expect("discovery did not stop")
            .unwrap();
        assert!(matches!(result, Err(Error::Shutdown)));
        assert!(matches!(client.discover().await, Err(Error::Shutdown)));
    }

    #[tokio::test]
    async fn unblocks_poll_without_connection_lost() {
        let nas = FakeNas::start(Some(status_reply()), 1).await;
        let client = NasClient::bind(
            config_for(&nas).with_poll_timeout(Duration::from_secs(30)),
        )
        .await
        .unwrap();
        client.discover().await.unwrap();
        nas.set_reply(None);
        let mut events = client.subscribe();

        let poll = tokio::spawn({
            let client = client.clone();
            async move { client.request_status().await }
        });
        sleep(Duration::from_millis(20)).await;
        client.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), poll)
            .await
            .expect("poll did not stop")
            .unwrap();
        assert!(matches!(result, Err(Error::Shutdown)));
        assert!(
            !drain(&mut events)
                .iter()
                .any(ClientEvent::is_connection_lost)
        );
        assert!(matches!(client.request_status().await, Err(Error::Shutdown)));
    }
}
