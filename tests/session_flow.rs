// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end link flow: start-up, advertising, data with credits, disconnect.

use nrf_aci::hal::sim::{Outbox, ScriptedPeer};
use nrf_aci::prelude::*;
use nrf_aci::protocol::{DeviceMode, DisconnectReason};
use nrf_aci::session::{PipeInfo, PipeStore};

const OP_CONNECT: u8 = 0x0F;
const OP_DISCONNECT: u8 = 0x11;
const OP_SEND_DATA: u8 = 0x15;

/// Peer that accepts a connection, returns one credit per sent packet and
/// confirms disconnects
fn central(frame: &[u8], outbox: &mut Outbox) {
    match frame[1] {
        OP_CONNECT => {
            outbox.push(&[3, 0x84, OP_CONNECT, 0x00]);
            outbox.push(&[
                15, 0x85, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x18, 0x00, 0x00, 0x00, 0x90,
                0x01, 0x00,
            ]);
            let mut pipe_status = [0u8; 18];
            pipe_status[0] = 17;
            pipe_status[1] = 0x88;
            pipe_status[2] = 0b0000_0011;
            outbox.push(&pipe_status);
        }
        OP_SEND_DATA => {
            outbox.push(&[2, 0x8A, 1]);
        }
        OP_DISCONNECT => {
            outbox.push(&[3, 0x84, OP_DISCONNECT, 0x00]);
            outbox.push(&[3, 0x86, 0x00, 0x16]);
        }
        _ => {}
    }
}

type Link = Aci<ScriptedPeer<fn(&[u8], &mut Outbox)>>;

fn link() -> Link {
    let mut peer = ScriptedPeer::with_responder(central as fn(&[u8], &mut Outbox));
    peer.push_event(&[4, 0x81, 0x03, 0x00, 2]);
    let transport = Transport::new(peer, TransportConfig::new(Mode::Polled));
    let pipes = PipeMap::from_slice(&[PipeInfo::new(PipeStore::Local, PipeType::TX)]).unwrap();
    Aci::new(transport, pipes)
}

/// Pull events until the link is quiet, returning what arrived
fn pump(aci: &mut Link) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..16 {
        if let Some(event) = aci.event_get().unwrap() {
            events.push(event);
        } else if aci.command_queue_empty() && aci.transport().physical().pending_events() == 0 {
            break;
        }
    }
    events
}

#[test]
fn test_connect_send_disconnect() {
    let mut aci = link();

    let events = pump(&mut aci);
    assert!(matches!(events[..], [Event::DeviceStarted { .. }]));
    assert_eq!(aci.session().device_mode(), Some(DeviceMode::Standby));
    assert_eq!(aci.session().credit().available(), 2);

    assert!(aci.connect(180, 0x0050).unwrap());
    let events = pump(&mut aci);
    assert_eq!(events.len(), 3);
    assert!(aci.session().is_connected());
    assert!(aci.session().is_discovery_finished());
    assert!(aci.session().is_pipe_open(1));
    assert_eq!(aci.session().timing().interval, 24);

    assert!(aci.send_data(1, b"hello").unwrap());
    assert_eq!(aci.session().credit().available(), 1);
    let events = pump(&mut aci);
    assert_eq!(events, vec![Event::DataCredit(1)]);
    assert_eq!(aci.session().credit().available(), 2);

    assert!(aci.disconnect(DisconnectReason::Terminate).unwrap());
    assert!(!aci.session().is_pipe_open(1));
    pump(&mut aci);
    assert!(!aci.session().is_connected());
    assert_eq!(aci.session().credit().available(), 2);

    let sent: Vec<u8> = aci
        .transport()
        .physical()
        .host_frames()
        .iter()
        .map(|frame| frame[1])
        .collect();
    assert_eq!(sent, vec![OP_CONNECT, OP_SEND_DATA, OP_DISCONNECT]);
}

#[test]
fn test_credit_exhaustion_blocks_sends() {
    let mut aci = link();
    pump(&mut aci);
    aci.connect(180, 0x0050).unwrap();
    pump(&mut aci);

    assert!(aci.send_data(1, &[1]).unwrap());
    assert!(aci.send_data(1, &[2]).unwrap());
    assert_eq!(aci.send_data(1, &[3]), Err(SessionError::CreditExhausted));

    // Each delivered packet returns one credit
    pump(&mut aci);
    assert_eq!(aci.session().credit().available(), 2);
    assert!(aci.send_data(1, &[3]).unwrap());
}

#[test]
fn test_disconnect_clears_bitmaps_when_queued() {
    let mut aci = link();
    pump(&mut aci);
    aci.connect(180, 0x0050).unwrap();
    pump(&mut aci);
    assert!(aci.session().is_pipe_open(1));

    aci.disconnect(DisconnectReason::BadTiming).unwrap();
    assert_eq!(aci.session().pipes().open, [0u8; 8]);

    let frames_before = aci.transport().physical().host_frames().len();
    let events = pump(&mut aci);
    assert!(matches!(
        events.last(),
        Some(Event::Disconnected { btle_status: 0x16, .. })
    ));
    assert_eq!(aci.transport().physical().host_frames().len(), frames_before + 1);
}
