//! Minimal MaxMind DB writer for integration tests.
//!
//! Produces IPv4 databases with a 24-bit record size holding one data
//! record per /32 address.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::net::Ipv4Addr;

const METADATA_MARKER: &[u8] = b"\xAB\xCD\xEFMaxMind.com";
const DATA_SECTION_SEPARATOR: usize = 16;

/// A value in the MMDB data section encoding.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Double(f64),
    U16(u16),
    U32(u32),
    U64(u64),
    Map(Vec<(String, Value)>),
    Array(Vec<Value>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    pub fn map(pairs: Vec<(&str, Value)>) -> Self {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Value::Str(s) => {
                control(out, 2, s.len());
                out.extend_from_slice(s.as_bytes());
            }
            Value::Double(d) => {
                control(out, 3, 8);
                out.extend_from_slice(&d.to_be_bytes());
            }
            Value::U16(n) => uint(out, 5, &n.to_be_bytes()),
            Value::U32(n) => uint(out, 6, &n.to_be_bytes()),
            Value::U64(n) => uint(out, 9, &n.to_be_bytes()),
            Value::Map(pairs) => {
                control(out, 7, pairs.len());
                for (key, value) in pairs {
                    Value::Str(key.clone()).encode(out);
                    value.encode(out);
                }
            }
            Value::Array(items) => {
                control(out, 11, items.len());
                for item in items {
                    item.encode(out);
                }
            }
        }
    }
}

fn control(out: &mut Vec<u8>, type_num: u8, size: usize) {
    let (type_bits, extended) = if type_num <= 7 {
        (type_num, None)
    } else {
        (0, Some(type_num - 7))
    };

    let (size_bits, extra): (u8, Vec<u8>) = if size < 29 {
        (size as u8, vec![])
    } else if size < 285 {
        (29, vec![(size - 29) as u8])
    } else if size < 65_821 {
        let s = size - 285;
        (30, vec![(s >> 8) as u8, s as u8])
    } else {
        let s = size - 65_821;
        (31, vec![(s >> 16) as u8, (s >> 8) as u8, s as u8])
    };

    out.push((type_bits << 5) | size_bits);
    if let Some(ext) = extended {
        out.push(ext);
    }
    out.extend(extra);
}

fn uint(out: &mut Vec<u8>, type_num: u8, be_bytes: &[u8]) {
    let significant: Vec<u8> = be_bytes.iter().copied().skip_while(|b| *b == 0).collect();
    control(out, type_num, significant.len());
    out.extend(significant);
}

/// Fields of a GeoIP2 City record.
#[derive(Debug, Clone, Default)]
pub struct CityFixture {
    pub country_code: &'static str,
    pub country_name: &'static str,
    pub continent: &'static str,
    pub region_code: &'static str,
    pub region_name: &'static str,
    pub city: &'static str,
    pub postal_code: &'static str,
    pub time_zone: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub metro_code: u16,
}

impl CityFixture {
    pub fn mountain_view() -> Self {
        Self {
            country_code: "US",
            country_name: "United States",
            continent: "North America",
            region_code: "CA",
            region_name: "California",
            city: "Mountain View",
            postal_code: "94035",
            time_zone: "America/Los_Angeles",
            latitude: 37.386,
            longitude: -122.0838,
            metro_code: 807,
        }
    }

    pub fn berlin() -> Self {
        Self {
            country_code: "DE",
            country_name: "Germany",
            continent: "Europe",
            region_code: "BE",
            region_name: "Land Berlin",
            city: "Berlin",
            postal_code: "10115",
            time_zone: "Europe/Berlin",
            latitude: 52.5244,
            longitude: 13.4105,
            metro_code: 0,
        }
    }

    pub fn to_value(&self) -> Value {
        let names = |en: &str| Value::map(vec![("de", Value::str("-")), ("en", Value::str(en))]);

        let mut location = vec![
            ("latitude", Value::Double(self.latitude)),
            ("longitude", Value::Double(self.longitude)),
            ("time_zone", Value::str(self.time_zone)),
            ("accuracy_radius", Value::U16(1000)),
        ];
        if self.metro_code != 0 {
            location.push(("metro_code", Value::U16(self.metro_code)));
        }

        Value::map(vec![
            ("city", Value::map(vec![("geoname_id", Value::U32(5375480)), ("names", names(self.city))])),
            (
                "continent",
                Value::map(vec![("code", Value::str("XX")), ("names", names(self.continent))]),
            ),
            (
                "country",
                Value::map(vec![
                    ("iso_code", Value::str(self.country_code)),
                    ("names", names(self.country_name)),
                ]),
            ),
            ("location", Value::map(location)),
            ("postal", Value::map(vec![("code", Value::str(self.postal_code))])),
            (
                "subdivisions",
                Value::Array(vec![Value::map(vec![
                    ("iso_code", Value::str(self.region_code)),
                    ("names", names(self.region_name)),
                ])]),
            ),
        ])
    }
}

/// Record carrying only country information.
pub fn country_only(code: &str, name: &str) -> Value {
    Value::map(vec![(
        "country",
        Value::map(vec![
            ("iso_code", Value::str(code)),
            ("names", Value::map(vec![("en", Value::str(name))])),
        ]),
    )])
}

#[derive(Clone, Copy)]
enum Slot {
    Empty,
    Node(usize),
    Data(usize),
}

/// Builds a database image in memory.
pub struct MmdbBuilder {
    database_type: String,
    build_epoch: u64,
    entries: Vec<(Ipv4Addr, Value)>,
}

impl MmdbBuilder {
    pub fn new(database_type: &str) -> Self {
        Self {
            database_type: database_type.to_string(),
            build_epoch: 1_700_000_000,
            entries: Vec::new(),
        }
    }

    pub fn build_epoch(mut self, epoch: u64) -> Self {
        self.build_epoch = epoch;
        self
    }

    pub fn insert(mut self, ip: &str, record: Value) -> Self {
        self.entries.push((ip.parse().expect("IPv4 address"), record));
        self
    }

    pub fn city(self, ip: &str, fixture: &CityFixture) -> Self {
        self.insert(ip, fixture.to_value())
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut nodes: Vec<[Slot; 2]> = vec![[Slot::Empty, Slot::Empty]];

        for (ip, record) in &self.entries {
            let offset = data.len();
            record.encode(&mut data);

            let bits = u32::from(*ip);
            let mut node = 0;
            for i in 0..32 {
                let bit = ((bits >> (31 - i)) & 1) as usize;
                if i == 31 {
                    nodes[node][bit] = Slot::Data(offset);
                    break;
                }
                node = match nodes[node][bit] {
                    Slot::Node(next) => next,
                    Slot::Empty => {
                        nodes.push([Slot::Empty, Slot::Empty]);
                        let next = nodes.len() - 1;
                        nodes[node][bit] = Slot::Node(next);
                        next
                    }
                    Slot::Data(_) => panic!("overlapping entries for {}", ip),
                };
            }
        }

        let node_count = nodes.len();
        let record = |slot: Slot| -> u32 {
            match slot {
                Slot::Empty => node_count as u32,
                Slot::Node(n) => n as u32,
                Slot::Data(offset) => (node_count + DATA_SECTION_SEPARATOR + offset) as u32,
            }
        };

        let mut out = Vec::new();
        for [left, right] in &nodes {
            out.extend_from_slice(&record(*left).to_be_bytes()[1..]);
            out.extend_from_slice(&record(*right).to_be_bytes()[1..]);
        }
        out.extend_from_slice(&[0u8; DATA_SECTION_SEPARATOR]);
        out.extend(data);
        out.extend_from_slice(METADATA_MARKER);

        Value::map(vec![
            ("binary_format_major_version", Value::U16(2)),
            ("binary_format_minor_version", Value::U16(0)),
            ("build_epoch", Value::U64(self.build_epoch)),
            ("database_type", Value::str(&self.database_type)),
            ("description", Value::map(vec![("en", Value::str("test database"))])),
            ("ip_version", Value::U16(4)),
            ("languages", Value::Array(vec![Value::str("en")])),
            ("node_count", Value::U32(node_count as u32)),
            ("record_size", Value::U16(24)),
        ])
        .encode(&mut out);

        out
    }
}

/// Database with Mountain View at 1.2.3.4 and a country-only record at 5.6.7.8.
pub fn us_database(database_type: &str) -> Vec<u8> {
    MmdbBuilder::new(database_type)
        .city("1.2.3.4", &CityFixture::mountain_view())
        .insert("5.6.7.8", country_only("CA", "Canada"))
        .build()
}

/// Database with Berlin at 1.2.3.4.
pub fn de_database(database_type: &str) -> Vec<u8> {
    MmdbBuilder::new(database_type)
        .build_epoch(1_800_000_000)
        .city("1.2.3.4", &CityFixture::berlin())
        .build()
}

pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}
