//! Device-side transmit scheduler over a property table.
//!
//! A device alternates between describing itself and publishing its
//! current values:
//!
//! ```text
//! info(p0) pub info(p1) pub ... info(pN-1) pub info(object) pub info(p0) ...
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::fnv::fnv1a_32;
use crate::info::PropertyInfo;
use crate::link::Link;
use crate::message::{Body, Message};
use crate::types::{MsgKind, PropertyId, ValueMode, ValueType, OBJECT_PROPERTY_ID};
use crate::value::Value;

/// Identity of the object that owns the properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ValueMode>,
}

impl ObjectInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            value_type: None,
            mode: None,
        }
    }

    /// The object as an Info record under the reserved id.
    pub fn to_info(&self) -> PropertyInfo {
        PropertyInfo {
            id: OBJECT_PROPERTY_ID,
            name: self.name.clone(),
            description: self.description.clone(),
            value_type: self.value_type,
            mode: self.mode,
        }
    }

    /// Source id derived from the object name.
    pub fn src_id(&self) -> u32 {
        fnv1a_32(&self.name)
    }
}

/// One property: its description and current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub info: PropertyInfo,
    pub value: Value,
}

impl PropertyRecord {
    pub fn is_writable(&self) -> bool {
        self.info.mode == Some(ValueMode::Write)
    }
}

/// Ordered set of properties exposed by a device.
pub trait PropertyTable {
    fn object(&self) -> &ObjectInfo;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record at `index` in table order.
    fn record(&self, index: usize) -> Option<&PropertyRecord>;

    /// Store a value received from the link. Returns false when the
    /// property is unknown or read-only.
    fn set_value(&mut self, id: PropertyId, value: Value) -> bool;
}

/// Serialized form of a device's property table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub object: ObjectInfo,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

impl DeviceConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// `Vec`-backed property table.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticTable {
    object: ObjectInfo,
    records: Vec<PropertyRecord>,
}

impl StaticTable {
    pub fn new(object: ObjectInfo) -> Self {
        Self {
            object,
            records: Vec::new(),
        }
    }

    pub fn with_property(mut self, info: PropertyInfo, value: Value) -> Self {
        self.records.push(PropertyRecord { info, value });
        self
    }

    pub fn get(&self, id: PropertyId) -> Option<&Value> {
        self.records
            .iter()
            .find(|r| r.info.id == id)
            .map(|r| &r.value)
    }

    /// Update a value from the device side, regardless of access mode.
    pub fn update(&mut self, id: PropertyId, value: Value) -> bool {
        match self.records.iter_mut().find(|r| r.info.id == id) {
            Some(record) => {
                record.value = value;
                true
            }
            None => false,
        }
    }
}

impl From<DeviceConfig> for StaticTable {
    fn from(config: DeviceConfig) -> Self {
        Self {
            object: config.object,
            records: config.properties,
        }
    }
}

impl PropertyTable for StaticTable {
    fn object(&self) -> &ObjectInfo {
        &self.object
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn record(&self, index: usize) -> Option<&PropertyRecord> {
        self.records.get(index)
    }

    fn set_value(&mut self, id: PropertyId, value: Value) -> bool {
        match self.records.iter_mut().find(|r| r.info.id == id) {
            Some(record) if record.is_writable() => {
                record.value = value;
                true
            }
            _ => false,
        }
    }
}

/// Produces the outgoing message sequence for one device.
#[derive(Debug)]
pub struct DeviceAgent<T> {
    table: T,
    src: u32,
    send_info: bool,
    info_index: usize,
}

impl<T: PropertyTable> DeviceAgent<T> {
    pub fn new(table: T) -> Self {
        let src = table.object().src_id();
        Self {
            table,
            src,
            send_info: false,
            info_index: 0,
        }
    }

    pub fn src(&self) -> u32 {
        self.src
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut T {
        &mut self.table
    }

    /// Next message in the schedule. The first call yields an Info message.
    pub fn next_message(&mut self) -> Message {
        self.send_info = !self.send_info;
        if self.send_info {
            self.next_info()
        } else {
            self.publish()
        }
    }

    /// Encode the next scheduled message into `link`.
    pub fn next_frame<'a>(&mut self, link: &'a mut Link) -> Result<&'a [u8]> {
        let msg = self.next_message();
        link.produce_frame(&msg)
    }

    /// Broadcast publish of every current value.
    pub fn publish(&self) -> Message {
        let values = (0..self.table.len())
            .filter_map(|i| self.table.record(i))
            .map(|r| (r.info.id, r.value.clone()))
            .collect();
        Message::publish(values).from_src(self.src)
    }

    fn next_info(&mut self) -> Message {
        let info = match self.table.record(self.info_index) {
            Some(record) => {
                self.info_index += 1;
                record.info.clone()
            }
            None => {
                self.info_index = 0;
                self.table.object().to_info()
            }
        };
        trace!(id = info.id, name = %info.name, "info scheduled");
        Message::info(info).from_src(self.src)
    }

    /// React to a received message.
    ///
    /// A publish directed at this device sets writable properties; a
    /// subscribe to it is answered with a publish back to the subscriber.
    pub fn handle(&mut self, msg: &Message) -> Option<Message> {
        if msg.header.dst != Some(self.src) {
            return None;
        }
        match (msg.kind(), &msg.body) {
            (MsgKind::Publish, Body::Values(values)) => {
                for (id, value) in values {
                    if !self.table.set_value(*id, value.clone()) {
                        debug!(id, "set rejected");
                    }
                }
                None
            }
            (MsgKind::Subscribe, _) => {
                let reply = self.publish();
                Some(match msg.header.src {
                    Some(src) => reply.to(src),
                    None => reply,
                })
            }
            _ => None,
        }
    }
}
