//! Integration tests running every codec through the encrypted store.

use sealkv::{
    BinaryCodec, EnvelopeConfig, JsonCodec, MasterSecret, MemoryBackend, PoolConfig, PrimedCodec,
    Store, StoreError, TypeTable, XmlCodec,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    id: u64,
    owner: String,
    balance: i64,
    ratio: f64,
    tag: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    text: String,
}

fn account() -> Account {
    Account {
        id: 7,
        owner: "ada".into(),
        balance: -1200,
        ratio: 0.25,
        tag: vec![1, 2, 3],
    }
}

fn secret() -> MasterSecret {
    MasterSecret::from_bytes([0x42u8; 32])
}

fn table() -> TypeTable {
    TypeTable::new()
        .with::<Account>("account")
        .unwrap()
        .with::<Note>("note")
        .unwrap()
}

#[test]
fn json_store_roundtrip() {
    let s = Store::json(MemoryBackend::new(), secret());
    s.put("a", &account()).unwrap();
    assert_eq!(s.get::<Account>("a").unwrap(), account());
}

#[test]
fn xml_store_roundtrip() {
    let s = Store::xml(MemoryBackend::new(), secret());
    s.put("a", &account()).unwrap();
    assert_eq!(s.get::<Account>("a").unwrap(), account());
}

#[test]
fn binary_store_roundtrip() {
    let s = Store::binary(MemoryBackend::new(), secret(), table());
    s.put("a", &account()).unwrap();
    s.put("n", &Note { text: "hi".into() }).unwrap();

    assert_eq!(s.get::<Account>("a").unwrap(), account());
    assert_eq!(s.get::<Note>("n").unwrap().text, "hi");
}

#[test]
fn binary_store_checks_types() {
    let s = Store::binary(MemoryBackend::new(), secret(), table());

    let err = s.put("x", &5u32).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));

    s.put("a", &account()).unwrap();
    let err = s.get::<Note>("a").unwrap_err();
    assert!(matches!(err, StoreError::Deserialization(_)));
}

#[test]
fn primed_binary_store_roundtrip() {
    let codec = PrimedCodec::new(BinaryCodec::new(table()), (account(), Note { text: String::new() }))
        .unwrap();
    let s = Store::new(
        MemoryBackend::new(),
        secret(),
        codec,
        EnvelopeConfig::default(),
        PoolConfig::default(),
    )
    .unwrap();

    s.put("a", &account()).unwrap();
    assert_eq!(s.get::<Account>("a").unwrap(), account());

    let primed_len = s.marshal(&account()).unwrap().len();
    let plain_len = Store::binary(MemoryBackend::new(), secret(), table())
        .marshal(&account())
        .unwrap()
        .len();
    assert!(primed_len < plain_len);
}

#[test]
fn switching_codec_changes_readability() {
    let backend = std::sync::Arc::new(MemoryBackend::new());
    let json = Store::json(std::sync::Arc::clone(&backend), secret());
    json.put("a", &account()).unwrap();

    let xml = json.with_codec(XmlCodec);
    assert!(matches!(
        xml.get::<Account>("a"),
        Err(StoreError::Deserialization(_))
    ));

    let json = xml.with_codec(JsonCodec);
    assert_eq!(json.get::<Account>("a").unwrap(), account());
}
