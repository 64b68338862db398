#![allow(dead_code)]

use bytes::BytesMut;
use sonyptp_transport::ScriptedTransport;
use sonyptp_wire::codes::{operation, response};
use sonyptp_wire::{
    decode_header, decode_params, encode_data, encode_params, ContainerType, Encoder, Params,
    HEADER_SIZE,
};

pub const OBJECT_HANDLE: u32 = 0xFFFF_C001;
pub const OBJECT_SIZE: usize = 5000;

pub fn response_container(code: u16, transaction_id: u32, params: &[u32]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    let params = Params::from_slice(params).unwrap();
    encode_params(ContainerType::Response, code, transaction_id, &params, &mut buf);
    buf.to_vec()
}

pub fn data_container(code: u16, transaction_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_data(code, transaction_id, payload, &mut buf).unwrap();
    buf.to_vec()
}

pub fn event_container(code: u16, params: &[u32]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    let params = Params::from_slice(params).unwrap();
    encode_params(ContainerType::Event, code, 0, &params, &mut buf);
    buf.to_vec()
}

pub fn object_bytes() -> Vec<u8> {
    (0..OBJECT_SIZE).map(|i| (i % 251) as u8).collect()
}

pub fn device_info_payload() -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.put_u16(100).put_u32(0x11).put_u16(100);
    enc.put_string("Sony PTP Extensions").unwrap();
    enc.put_u16(0)
        .put_u16_array(&[
            operation::GET_DEVICE_INFO,
            operation::OPEN_SESSION,
            operation::CLOSE_SESSION,
            operation::GET_OBJECT,
        ])
        .put_u16_array(&[0xC201])
        .put_u16_array(&[0x5001])
        .put_u16_array(&[])
        .put_u16_array(&[0x3801]);
    enc.put_string("Sony Corporation").unwrap();
    enc.put_string("ILCE-6000").unwrap();
    enc.put_string("3.21").unwrap();
    enc.put_string("0000000000000000").unwrap();
    enc.as_slice().to_vec()
}

/// Answers every command like a cooperative camera.
///
/// Operations with an outbound data phase are answered after the data
/// container arrives.
pub fn camera() -> ScriptedTransport {
    ScriptedTransport::new().with_responder(|write| {
        let header = decode_header(write).unwrap();
        let tid = header.transaction_id;
        match header.container_type() {
            Some(ContainerType::Command) => {
                let params = decode_params(&write[HEADER_SIZE..]).unwrap();
                match header.code {
                    operation::GET_DEVICE_INFO => vec![
                        data_container(header.code, tid, &device_info_payload()),
                        response_container(response::OK, tid, &[]),
                    ],
                    operation::GET_OBJECT => vec![
                        data_container(header.code, tid, &object_bytes()),
                        response_container(response::OK, tid, &[]),
                    ],
                    operation::GET_STORAGE_IDS => vec![
                        data_container(header.code, tid, &[1, 0, 0, 0, 1, 0, 1, 0]),
                        response_container(response::OK, tid, &[]),
                    ],
                    operation::SET_DEVICE_PROP_VALUE => Vec::new(),
                    operation::DELETE_OBJECT => {
                        vec![response_container(response::ACCESS_DENIED, tid, &[])]
                    }
                    _ => vec![response_container(response::OK, tid, params.as_slice())],
                }
            }
            Some(ContainerType::Data) => vec![response_container(response::OK, tid, &[])],
            _ => Vec::new(),
        }
    })
}
