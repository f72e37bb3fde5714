#![allow(dead_code)]

use std::collections::BTreeMap;

use tabulon_common::MemTable;
use tabulon_core::{BuildContext, Document, MapKey, Message, ParseError, SheetParser, Value};
use tabulon_spec::{Manifest, Schema};

pub fn schema(body: &str) -> Schema {
    let yaml = format!("spec: tabulon\nspec_version: \"0.2.0\"\nbook: {{ name: Test }}\n{body}");
    Manifest::from_yaml_str(&yaml)
        .expect("manifest parses")
        .resolve()
        .expect("manifest resolves")
}

pub fn table(name: &str, rows: &[&[&str]]) -> MemTable {
    MemTable::from_rows(name, rows.iter().map(|row| row.iter().copied()))
}

pub fn build_with(
    schema: &Schema,
    sheet: &str,
    rows: &[&[&str]],
    ctx: &BuildContext,
) -> Result<Document, ParseError> {
    let desc = schema.sheet(sheet).expect("sheet declared");
    SheetParser::new(desc, ctx).build(&table(sheet, rows), &[])
}

pub fn build(schema: &Schema, sheet: &str, rows: &[&[&str]]) -> Result<Document, ParseError> {
    build_with(schema, sheet, rows, &BuildContext::default())
}

pub fn map(msg: &Message, number: u32) -> &BTreeMap<MapKey, Value> {
    msg.get(number).and_then(Value::as_map).expect("map field")
}

pub fn entry(entries: &BTreeMap<MapKey, Value>, key: u64) -> &Message {
    entries
        .get(&MapKey::Uint(key))
        .and_then(Value::as_message)
        .expect("message entry")
}

pub fn list(msg: &Message, number: u32) -> &[Value] {
    msg.get(number).and_then(Value::as_list).expect("list field")
}

pub const SHOP: &str = r#"
messages:
  - name: ShopConf
    fields:
      - { name: shop_map, type: "map<uint32, Shop>", options: { key: ID } }
  - name: Shop
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: goods_map, type: "map<uint32, Goods>", options: { key: ID } }
  - name: Goods
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: price, type: int32 }
sheets:
  - { message: ShopConf, sheet: Shop, typerow: 0, noterow: 0 }
  - { message: ShopConf, sheet: TypedShop, noterow: 0 }
"#;

pub const REWARD: &str = r#"
messages:
  - name: RewardConf
    fields:
      - { name: id, type: uint32, options: { name: RewardID } }
      - name: item_map
        type: "map<uint32, Item>"
        options: { name: Item, key: ID, layout: horizontal }
  - name: Item
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: num, type: int32 }
sheets:
  - { message: RewardConf, sheet: Reward, typerow: 0, noterow: 0 }
"#;
