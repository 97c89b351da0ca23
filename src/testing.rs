//! Minimal MQTT broker side for tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) const CONNACK_ACCEPTED: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

pub(crate) const CONNECT: u8 = 1;
pub(crate) const PUBLISH: u8 = 3;

/// Read one MQTT control packet: (fixed header byte, body).
pub(crate) async fn read_packet(stream: &mut TcpStream) -> (u8, Vec<u8>) {
    let header = stream.read_u8().await.unwrap();
    let mut len = 0usize;
    let mut shift = 0;
    loop {
        let byte = stream.read_u8().await.unwrap();
        len |= ((byte & 0x7f) as usize) << shift;
        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }
    let mut body = vec![0; len];
    stream.read_exact(&mut body).await.unwrap();
    (header, body)
}

/// Accept one client, acknowledge its CONNECT and return the stream.
pub(crate) async fn accept_session(listener: &TcpListener) -> TcpStream {
    let (mut stream, _) = listener.accept().await.unwrap();
    let (header, _) = read_packet(&mut stream).await;
    assert_eq!(header >> 4, CONNECT, "expected CONNECT");
    stream.write_all(&CONNACK_ACCEPTED).await.unwrap();
    stream
}

/// Read a QoS 0 PUBLISH and return (topic, payload).
pub(crate) async fn read_publish(stream: &mut TcpStream) -> (String, String) {
    let (header, body) = read_packet(stream).await;
    assert_eq!(header >> 4, PUBLISH, "expected PUBLISH");
    assert_eq!(header & 0x07, 0, "expected QoS 0 without retain");

    let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
    let topic = String::from_utf8(body[2..2 + topic_len].to_vec()).unwrap();
    let payload = String::from_utf8(body[2 + topic_len..].to_vec()).unwrap();
    (topic, payload)
}
