#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bytes::BytesMut;
use sonyptp_transport::ScriptedTransport;
use sonyptp_vendor::codes::{operation, property};
use sonyptp_vendor::ShutterSpeed;
use sonyptp_wire::codes::{operation as pima_op, property as pima_property, response};
use sonyptp_wire::{
    decode_header, decode_params, encode_data, encode_params, ContainerType, DescriptorSpec,
    Encoder, FormSpec, Params, Scalar, HEADER_SIZE,
};

pub const ISO_TABLE: [u32; 6] = [100, 200, 400, 800, 1600, 3200];
pub const F_NUMBER_TABLE: [u16; 5] = [350, 400, 560, 800, 1100];

pub fn shutter_table() -> Vec<u32> {
    [
        (1, 4000),
        (1, 2000),
        (1, 1000),
        (1, 500),
        (1, 250),
        (1, 125),
        (1, 60),
        (4, 10),
        (10, 10),
        (300, 10),
    ]
    .iter()
    .map(|&(n, d)| ShutterSpeed::new(n, d).raw())
    .collect()
}

/// One stepped property: a value table and a position in it.
pub struct Dial {
    pub values: Vec<Scalar>,
    pub index: usize,
}

impl Dial {
    fn current(&self) -> Scalar {
        self.values[self.index]
    }
}

/// Camera state shared between the test and the responder.
pub struct SimState {
    pub dials: BTreeMap<u16, Dial>,
    /// Steps are acknowledged but leave the value unchanged.
    pub frozen: bool,
    pub steps: usize,
    pub pending: u16,
    pub battery: u8,
    /// Writes to control properties, in order.
    pub controls: Vec<(u16, u16, Vec<u8>)>,
    /// Vendor commands in order, with their first parameter.
    pub commands: Vec<(u16, Option<u32>)>,
}

impl SimState {
    fn property_block(&self) -> Vec<u8> {
        let forms: Vec<(u16, Vec<Scalar>)> = self
            .dials
            .iter()
            .map(|(&code, dial)| (code, dial.values.clone()))
            .collect();
        let mut specs: Vec<DescriptorSpec<'_>> = forms
            .iter()
            .map(|(code, values)| DescriptorSpec {
                code: *code,
                writable: true,
                factory_default: values[0],
                current: self.dials[code].current(),
                form: FormSpec::Enum(values.as_slice()),
            })
            .collect();
        specs.push(DescriptorSpec {
            code: property::PENDING_IMAGES,
            writable: false,
            factory_default: Scalar::Uint16(0),
            current: Scalar::Uint16(self.pending),
            form: FormSpec::None,
        });
        specs.push(DescriptorSpec {
            code: property::BATTERY_LEVEL,
            writable: false,
            factory_default: Scalar::Uint8(0),
            current: Scalar::Uint8(self.battery),
            form: FormSpec::Range {
                min: Scalar::Uint8(0),
                max: Scalar::Uint8(100),
                step: Scalar::Uint8(1),
            },
        });
        let mut enc = Encoder::new();
        enc.put_descriptor_list(&specs);
        enc.as_slice().to_vec()
    }

    fn step(&mut self, code: u16, delta: i8) {
        self.steps += 1;
        if self.frozen {
            return;
        }
        if let Some(dial) = self.dials.get_mut(&code) {
            dial.index = if delta > 0 {
                (dial.index + 1).min(dial.values.len() - 1)
            } else {
                dial.index.saturating_sub(1)
            };
        }
    }
}

pub fn ext_info_payload() -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.put_u16(200)
        .put_u16_array(&[
            property::SHUTTER_SPEED,
            property::ISO,
            property::PENDING_IMAGES,
            property::BATTERY_LEVEL,
        ])
        .put_u16_array(&[property::CTRL_AF_LOCK, property::CTRL_SHUTTER]);
    enc.as_slice().to_vec()
}

pub fn object_info_payload() -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.put_u32(0x0001_0001)
        .put_u16(0x3801)
        .put_u16(0)
        .put_u32(IMAGE.len() as u32)
        .put_u16(0x3808)
        .put_u32(0)
        .put_u32(160)
        .put_u32(120)
        .put_u32(6000)
        .put_u32(4000)
        .put_u32(24)
        .put_u32(0)
        .put_u16(0)
        .put_u32(0)
        .put_u32(1);
    enc.put_string("DSC00001.JPG").unwrap();
    enc.put_string("20261017T120000").unwrap();
    enc.put_string("").unwrap();
    enc.put_string("").unwrap();
    enc.as_slice().to_vec()
}

pub const IMAGE: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE1, 0x00, 0x10, 0xFF, 0xD9];

fn response_container(code: u16, tid: u32) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_params(ContainerType::Response, code, tid, &Params::new(), &mut buf);
    buf.to_vec()
}

fn data_container(code: u16, tid: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_data(code, tid, payload, &mut buf).unwrap();
    buf.to_vec()
}

pub fn event_container(code: u16, params: &[u32]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    let params = Params::from_slice(params).unwrap();
    encode_params(ContainerType::Event, code, 0, &params, &mut buf);
    buf.to_vec()
}

/// A simulated ILCE-6000 answering from `SimState`.
pub struct SimCamera {
    pub transport: Arc<ScriptedTransport>,
    pub state: Arc<Mutex<SimState>>,
}

impl SimCamera {
    pub fn new() -> Self {
        let mut dials = BTreeMap::new();
        dials.insert(
            property::SHUTTER_SPEED,
            Dial {
                values: shutter_table().into_iter().map(Scalar::Uint32).collect(),
                index: 0,
            },
        );
        dials.insert(
            property::ISO,
            Dial {
                values: ISO_TABLE.iter().copied().map(Scalar::Uint32).collect(),
                index: 0,
            },
        );
        dials.insert(
            pima_property::F_NUMBER,
            Dial {
                values: F_NUMBER_TABLE.iter().copied().map(Scalar::Uint16).collect(),
                index: 2,
            },
        );
        let state = Arc::new(Mutex::new(SimState {
            dials,
            frozen: false,
            steps: 0,
            pending: 0,
            battery: 80,
            controls: Vec::new(),
            commands: Vec::new(),
        }));

        let shared = Arc::clone(&state);
        // Code and first parameter of a command still waiting for its data.
        let mut awaiting: Option<(u16, u32)> = None;
        let transport = ScriptedTransport::new().with_responder(move |write| {
            let header = decode_header(write).unwrap();
            let tid = header.transaction_id;
            let mut sim = shared.lock().unwrap();
            match header.container_type() {
                Some(ContainerType::Command) => {
                    let params = decode_params(&write[HEADER_SIZE..]).unwrap();
                    if header.code >= 0x9000 {
                        sim.commands.push((header.code, params.get(0)));
                    }
                    match header.code {
                        operation::GET_SDIO_EXT_DEVICE_INFO => vec![
                            data_container(header.code, tid, &ext_info_payload()),
                            response_container(response::OK, tid),
                        ],
                        operation::GET_ALL_DEVICE_PROP_DATA => vec![
                            data_container(header.code, tid, &sim.property_block()),
                            response_container(response::OK, tid),
                        ],
                        operation::SET_CONTROL_DEVICE_A | operation::SET_CONTROL_DEVICE_B => {
                            awaiting = Some((header.code, params.get(0).unwrap_or(0)));
                            Vec::new()
                        }
                        pima_op::GET_OBJECT_INFO => vec![
                            data_container(header.code, tid, &object_info_payload()),
                            response_container(response::OK, tid),
                        ],
                        pima_op::GET_OBJECT => {
                            sim.pending = sim.pending.saturating_sub(1);
                            vec![
                                data_container(header.code, tid, IMAGE),
                                response_container(response::OK, tid),
                            ]
                        }
                        _ => vec![response_container(response::OK, tid)],
                    }
                }
                Some(ContainerType::Data) => {
                    let payload = &write[HEADER_SIZE..];
                    if let Some((op, param)) = awaiting.take() {
                        let code = param as u16;
                        if op == operation::SET_CONTROL_DEVICE_B && payload.len() == 1 {
                            sim.step(code, payload[0] as i8);
                        } else {
                            sim.controls.push((op, code, payload.to_vec()));
                        }
                    }
                    vec![response_container(response::OK, tid)]
                }
                _ => Vec::new(),
            }
        });
        Self {
            transport: Arc::new(transport),
            state,
        }
    }

    pub fn sim(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap()
    }

    pub fn dial(&self, code: u16) -> Scalar {
        self.sim().dials[&code].current()
    }
}
