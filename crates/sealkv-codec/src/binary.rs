//! Self-describing binary values (CBOR via ciborium)
//!
//! Only types registered in a [`TypeTable`] can be encoded. The first time an
//! encoder sees a type it writes a descriptor `[id, name]`; every value is
//! then written as `id` followed by the CBOR value. Ids are assigned per
//! encoder in first-use order, and a decoder learns them from the
//! descriptors it reads, checking that each value names the type the caller
//! asked for.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::Arc;

use ciborium::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};
use crate::{Codec, Decoder, Encoder};

/// Explicit mapping from Rust types to stable wire names.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    names: HashMap<TypeId, String>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`. Names must be unique and a type can only
    /// be registered once.
    pub fn register<T: 'static>(&mut self, name: impl Into<String>) -> CodecResult<&mut Self> {
        let name = name.into();
        if self.names.contains_key(&TypeId::of::<T>()) || self.names.values().any(|n| *n == name)
        {
            return Err(CodecError::DuplicateName(name));
        }
        self.names.insert(TypeId::of::<T>(), name);
        Ok(self)
    }

    /// Builder form of [`TypeTable::register`].
    pub fn with<T: 'static>(mut self, name: impl Into<String>) -> CodecResult<Self> {
        self.register::<T>(name)?;
        Ok(self)
    }

    pub fn name_of<T: 'static>(&self) -> Option<&str> {
        self.names.get(&TypeId::of::<T>()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BinaryCodec {
    table: Arc<TypeTable>,
}

impl BinaryCodec {
    pub fn new(table: TypeTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }
}

pub struct BinaryEncoder<W> {
    sink: W,
    table: Arc<TypeTable>,
    announced: HashMap<TypeId, u64>,
    next_id: u64,
}

pub struct BinaryDecoder<R> {
    source: R,
    table: Arc<TypeTable>,
    known: HashMap<u64, String>,
}

impl Codec for BinaryCodec {
    type Encoder<W: Write> = BinaryEncoder<W>;
    type Decoder<R: Read> = BinaryDecoder<R>;

    fn new_encoder<W: Write>(&self, sink: W) -> CodecResult<BinaryEncoder<W>> {
        Ok(BinaryEncoder {
            sink,
            table: Arc::clone(&self.table),
            announced: HashMap::new(),
            next_id: 1,
        })
    }

    fn new_decoder<R: Read>(&self, source: R) -> CodecResult<BinaryDecoder<R>> {
        Ok(BinaryDecoder {
            source,
            table: Arc::clone(&self.table),
            known: HashMap::new(),
        })
    }
}

impl<W: Write> BinaryEncoder<W> {
    fn write_item<T: Serialize + ?Sized>(&mut self, item: &T) -> CodecResult<()> {
        ciborium::into_writer(item, &mut self.sink).map_err(|e| match e {
            ciborium::ser::Error::Io(e) => CodecError::Io(e),
            ciborium::ser::Error::Value(msg) => CodecError::Serialization(msg),
        })
    }
}

impl<W: Write> Encoder for BinaryEncoder<W> {
    type Sink = W;

    fn encode<T: Serialize + 'static>(&mut self, value: &T) -> CodecResult<()> {
        let type_id = TypeId::of::<T>();
        let id = match self.announced.get(&type_id) {
            Some(id) => *id,
            None => {
                let name = self
                    .table
                    .name_of::<T>()
                    .ok_or(CodecError::Unregistered(type_name::<T>()))?
                    .to_string();
                let id = self.next_id;
                self.write_item(&(id, name.as_str()))?;
                tracing::trace!(id, name = %name, "announced binary type");
                self.announced.insert(type_id, id);
                self.next_id += 1;
                id
            }
        };
        self.write_item(&id)?;
        self.write_item(value)
    }

    fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }
}

impl<R: Read> BinaryDecoder<R> {
    fn read_item<T: DeserializeOwned>(&mut self) -> CodecResult<T> {
        ciborium::from_reader(&mut self.source).map_err(|e| match e {
            ciborium::de::Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                CodecError::de("unexpected end of stream")
            }
            ciborium::de::Error::Io(e) => CodecError::Io(e),
            other => CodecError::de(format_args!("{other:?}")),
        })
    }
}

impl<R: Read> Decoder for BinaryDecoder<R> {
    fn decode<T: DeserializeOwned + 'static>(&mut self) -> CodecResult<T> {
        let expected = self
            .table
            .name_of::<T>()
            .ok_or(CodecError::Unregistered(type_name::<T>()))?
            .to_string();

        loop {
            match self.read_item::<Value>()? {
                Value::Array(fields) => match fields.as_slice() {
                    [Value::Integer(id), Value::Text(name)] => {
                        let id = u64::try_from(*id)
                            .map_err(|_| CodecError::de("negative type id in descriptor"))?;
                        self.known.insert(id, name.clone());
                    }
                    _ => return Err(CodecError::de("malformed type descriptor")),
                },
                Value::Integer(id) => {
                    let id = u64::try_from(id).map_err(|_| CodecError::de("negative type id"))?;
                    let name = self
                        .known
                        .get(&id)
                        .ok_or_else(|| CodecError::de(format_args!("unknown type id {id}")))?;
                    if *name != expected {
                        return Err(CodecError::de(format_args!(
                            "stream holds {name}, expected {expected}"
                        )));
                    }
                    return self.read_item();
                }
                _ => return Err(CodecError::de("malformed binary stream")),
            }
        }
    }
}
