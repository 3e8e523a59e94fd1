//! JSON output sink.

use std::cell::RefCell;
use std::io::Write;

use serde::Serialize;
use sgacl::{AclApplier, AclUpdate, PortAddresses};
use sgacl_types::AclRecord;

#[derive(Serialize)]
struct PortAcls<'a> {
    port: &'a str,
    acls: &'a [AclRecord],
}

#[derive(Serialize)]
struct PortAddressList<'a> {
    port: &'a str,
    #[serde(flatten)]
    addresses: &'a PortAddresses,
}

/// Applier that writes each batch as one pretty-printed JSON document.
pub struct JsonApplier<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> JsonApplier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), String> {
        let mut out = self.out.borrow_mut();
        serde_json::to_writer_pretty(&mut *out, value).map_err(|e| e.to_string())?;
        writeln!(out).map_err(|e| e.to_string())
    }

    pub fn write_addresses(&self, port_id: &str, addresses: &PortAddresses) -> Result<(), String> {
        self.emit(&PortAddressList {
            port: port_id,
            addresses,
        })
    }
}

impl<W: Write> AclApplier for JsonApplier<W> {
    fn apply_port_acls(&self, port_id: &str, acls: &[AclRecord]) -> Result<(), String> {
        self.emit(&PortAcls {
            port: port_id,
            acls,
        })
    }

    fn apply_update(&self, update: &AclUpdate) -> Result<(), String> {
        self.emit(update)
    }
}
