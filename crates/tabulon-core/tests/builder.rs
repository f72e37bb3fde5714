mod common;

use std::sync::Arc;

use common::*;
use tabulon_core::{
    BuildContext, ErrorKind, MapKey, Message, ReferCache, SheetParser, Value, ValueSpace,
};
use tabulon_spec::Reference;

const SHOP_HEADER: &[&str] = &["ShopID", "ShopGoodsID", "ShopGoodsPrice"];

#[test]
fn nested_vertical_maps_share_parent_keys() {
    let schema = schema(SHOP);
    let doc = build(
        &schema,
        "Shop",
        &[SHOP_HEADER, &["1", "1", "10"], &["1", "2", "20"], &["1", "3", "30"]],
    )
    .unwrap();

    assert!(doc.present);
    let shops = map(&doc.root, 1);
    assert_eq!(shops.len(), 1);
    let goods = map(entry(shops, 1), 2);
    assert_eq!(goods.keys().cloned().collect::<Vec<_>>(), vec![
        MapKey::Uint(1),
        MapKey::Uint(2),
        MapKey::Uint(3)
    ]);
    assert_eq!(entry(goods, 3).get(2), Some(&Value::Int(30)));
}

#[test]
fn repeated_leaf_key_is_a_duplicate() {
    let schema = schema(SHOP);
    let err = build(
        &schema,
        "Shop",
        &[SHOP_HEADER, &["1", "1", "10"], &["1", "1", "20"]],
    )
    .unwrap_err();

    assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "1".into() });
    let context = err.context().unwrap();
    assert_eq!(context.sheet, "Shop");
    assert_eq!(context.position.as_deref(), Some("B3"));
    assert_eq!(context.column.as_deref(), Some("ShopGoodsID"));

    let fields: Vec<_> = err.frames().iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["goods_map", "shop_map"]);
    assert!(err.to_string().contains("in Shop.goods_map"));
}

#[test]
fn explicit_unique_overrides_deduction() {
    let schema = schema(&SHOP.replace(
        "options: { key: ID } }\n  - name: Shop",
        "options: { key: ID, prop: { unique: true } } }\n  - name: Shop",
    ));
    let err = build(
        &schema,
        "Shop",
        &[SHOP_HEADER, &["1", "1", "10"], &["1", "2", "20"]],
    )
    .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "1".into() });
    assert_eq!(err.context().unwrap().column.as_deref(), Some("ShopID"));
}

#[test]
fn blank_keys_inherit_from_previous_row() {
    let schema = schema(SHOP);
    let doc = build(
        &schema,
        "TypedShop",
        &[
            SHOP_HEADER,
            &["map<uint32, Shop>", "map<uint32, Goods>", "int32"],
            &["1", "1", "10"],
            &["", "2", "20"],
            &["2", "", ""],
        ],
    )
    .unwrap();

    let shops = map(&doc.root, 1);
    assert_eq!(shops.len(), 2);
    assert_eq!(map(entry(shops, 1), 2).len(), 2);

    // ShopID changed on the last row, so its goods key stays blank.
    let second = entry(shops, 2);
    assert!(second.has(1));
    assert!(!second.has(2));
}

#[test]
fn blank_key_with_value_takes_default_key_once() {
    let schema = schema(
        r#"
messages:
  - name: ScoreConf
    fields:
      - { name: score_map, type: "map<uint32, int32>" }
sheets:
  - { message: ScoreConf, sheet: Score, typerow: 0, noterow: 0 }
"#,
    );
    let header: &[&str] = &["ScoreKey", "ScoreValue"];

    let doc = build(&schema, "Score", &[header, &["", "10"], &["3", "30"]]).unwrap();
    let scores = map(&doc.root, 1);
    assert_eq!(scores.get(&MapKey::Uint(0)), Some(&Value::Int(10)));
    assert_eq!(scores.get(&MapKey::Uint(3)), Some(&Value::Int(30)));

    let err = build(&schema, "Score", &[header, &["", "10"], &["", "20"]]).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::ValuePresentUnderMissingKey { key: "0".into() }
    );
}

#[test]
fn horizontal_map_of_messages() {
    let schema = schema(REWARD);
    let header: &[&str] = &["RewardID", "Item1ID", "Item1Num", "Item2ID", "Item2Num"];

    let doc = build(&schema, "Reward", &[header, &["1", "1", "10", "2", "20"]]).unwrap();
    assert_eq!(doc.root.get(1), Some(&Value::Uint(1)));
    let items = map(&doc.root, 2);
    assert_eq!(items.len(), 2);
    assert_eq!(entry(items, 2).get(2), Some(&Value::Int(20)));

    let err = build(&schema, "Reward", &[header, &["1", "1", "10", "1", "20"]]).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "1".into() });
    assert_eq!(err.context().unwrap().position.as_deref(), Some("D2"));
}

#[test]
fn horizontal_gaps_are_rejected() {
    let schema = schema(REWARD);
    let header: &[&str] = &[
        "RewardID", "Item1ID", "Item1Num", "Item2ID", "Item2Num", "Item3ID", "Item3Num",
    ];

    let doc = build(&schema, "Reward", &[header, &["1", "1", "10", "", "", "", ""]]).unwrap();
    assert_eq!(map(&doc.root, 2).len(), 1);

    let err = build(
        &schema,
        "Reward",
        &[header, &["1", "1", "10", "", "", "3", "30"]],
    )
    .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::NonContiguous {
            missing: 2,
            present: 3
        }
    );
    assert_eq!(err.context().unwrap().position.as_deref(), Some("F2:G2"));
}

const RANK: &str = r#"
messages:
  - name: RankConf
    fields:
      - { name: score_list, type: "[int32]", options: { prop: { size: 5 } } }
      - { name: bonus_list, type: "[int32]", options: { prop: { fixed: true } } }
      - { name: tag_list, type: "[string]" }
sheets:
  - { message: RankConf, sheet: Rank, typerow: 0, noterow: 0 }
"#;

#[test]
fn horizontal_lists_pad_to_size() {
    let schema = schema(RANK);
    let doc = build(
        &schema,
        "Rank",
        &[
            &["Score1", "Score2", "Score3", "Bonus1", "Bonus2", "Bonus3", "Tag1", "Tag2"],
            &["10", "20", "30", "5", "", "", "a", ""],
        ],
    )
    .unwrap();

    assert_eq!(list(&doc.root, 1), &[
        Value::Int(10),
        Value::Int(20),
        Value::Int(30),
        Value::Int(0),
        Value::Int(0)
    ]);
    assert_eq!(list(&doc.root, 2), &[Value::Int(5), Value::Int(0), Value::Int(0)]);
    assert_eq!(list(&doc.root, 3), &[Value::String("a".into())]);
}

#[test]
fn padded_but_unpopulated_list_is_not_present() {
    let schema = schema(RANK);
    let doc = build(
        &schema,
        "Rank",
        &[&["Score1", "Score2", "Bonus1", "Tag1"], &["", "", "", ""]],
    )
    .unwrap();
    assert!(!doc.root.has(1));
    assert_eq!(doc.root.get(1).and_then(Value::as_list).map(<[Value]>::len), Some(5));
    assert!(!doc.present);
}

const SECTION: &str = r#"
messages:
  - name: ChapterConf
    fields:
      - name: section_list
        type: "[Section]"
        options: { key: ID, layout: vertical, prop: { sequence: 1 } }
  - name: Section
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: name, type: string }
sheets:
  - { message: ChapterConf, sheet: Chapter, typerow: 0, noterow: 0 }
"#;

#[test]
fn keyed_vertical_lists() {
    let schema = schema(SECTION);
    let header: &[&str] = &["SectionID", "SectionName"];

    let doc = build(&schema, "Chapter", &[header, &["1", "Intro"], &["2", "Forest"]]).unwrap();
    let sections = list(&doc.root, 1);
    assert_eq!(sections.len(), 2);
    assert_eq!(
        sections[1].as_message().and_then(|m| m.get(2)),
        Some(&Value::String("Forest".into()))
    );

    let err = build(
        &schema,
        "Chapter",
        &[header, &["1", "Intro"], &["2", "Forest"], &["1", "Cave"]],
    )
    .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "1".into() });

    let err = build(&schema, "Chapter", &[header, &["1", "Intro"], &["3", "Cave"]]).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::KeyNotSequent {
            key: "3".into(),
            expected: 2
        }
    );
}

const TASK: &str = r#"
enums:
  - name: TargetType
    values:
      - { name: TARGET_TYPE_NONE, number: 0 }
      - { name: TARGET_TYPE_PVP, number: 1, alias: PVP }
      - { name: TARGET_TYPE_PVE, number: 2, alias: PVE }
      - { name: TARGET_TYPE_RAID, number: 3, alias: RAID }
messages:
  - name: TaskConf
    fields:
      - { name: task_map, type: "map<uint32, Task>", options: { key: ID } }
  - name: Task
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: target, type: Target }
  - name: Pvp
    fields:
      - { name: type, type: int32 }
      - { name: damage, type: int64 }
  - name: Pve
    fields:
      - { name: mission, type: "[uint32]", options: { layout: incell } }
      - { name: heroes, type: "map<uint32, string>", options: { layout: incell } }
unions:
  - name: Target
    enum: TargetType
    variants:
      - { value: PVP, message: Pvp }
      - { value: PVE, message: Pve }
sheets:
  - { message: TaskConf, sheet: Task, typerow: 0, noterow: 0 }
"#;

const TASK_HEADER: &[&str] = &["TaskID", "TaskTargetType", "TaskTargetField1", "TaskTargetField2"];

#[test]
fn unions_select_payload_by_discriminator() {
    let schema = schema(TASK);
    let doc = build(
        &schema,
        "Task",
        &[
            TASK_HEADER,
            &["1", "PVP", "3", "100"],
            &["2", "PVE", "1,2,3", "1:Alice,2:Bob"],
            &["3", "", "", ""],
        ],
    )
    .unwrap();
    let tasks = map(&doc.root, 1);

    let Some(Value::Union(pvp)) = entry(tasks, 1).get(2) else {
        panic!("task 1 has a target");
    };
    assert_eq!(pvp.discriminator, 1);
    assert_eq!(pvp.payload.get(1), Some(&Value::Int(3)));
    assert_eq!(pvp.payload.get(2), Some(&Value::Int(100)));

    let Some(Value::Union(pve)) = entry(tasks, 2).get(2) else {
        panic!("task 2 has a target");
    };
    assert_eq!(pve.discriminator, 2);
    assert_eq!(list(&pve.payload, 1), &[Value::Uint(1), Value::Uint(2), Value::Uint(3)]);
    assert_eq!(
        map(&pve.payload, 2).get(&MapKey::Uint(2)),
        Some(&Value::String("Bob".into()))
    );

    assert!(!entry(tasks, 3).has(2));
}

#[test]
fn unknown_discriminators_fail() {
    let schema = schema(TASK);
    for tag in ["PVX", "RAID"] {
        let err = build(&schema, "Task", &[TASK_HEADER, &["1", tag, "", ""]]).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnknownUnionDiscriminator {
                union: "Target".into(),
                value: tag.into()
            }
        );
        assert_eq!(err.context().unwrap().position.as_deref(), Some("B2"));
    }
}

const HERO: &str = r#"
messages:
  - name: HeroConf
    fields:
      - { name: hero_map, type: "map<uint32, Hero>", options: { key: ID } }
  - name: Hero
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: name, type: string, options: { prop: { present: true } } }
      - { name: level, type: int32, options: { prop: { range: "1,100", default: "1" } } }
      - { name: skill_list, type: "[int32]", options: { layout: incell, prop: { range: "1,~" } } }
      - { name: attr_map, type: "map<string, int64>", options: { layout: incell } }
      - { name: pos, type: Vec2, options: { span: inner_cell, sep: ";" } }
      - { name: friend, type: uint32, options: { optional: true, prop: { refer: "Hero.ID" } } }
  - name: Vec2
    fields:
      - { name: x, type: int32 }
      - { name: y, type: int32 }
sheets:
  - { message: HeroConf, sheet: Hero, typerow: 0, noterow: 0 }
"#;

const HERO_HEADER: &[&str] = &[
    "HeroID",
    "HeroName",
    "HeroLevel",
    "HeroSkill",
    "HeroAttr",
    "HeroPos",
    "HeroFriend",
];

#[test]
fn incell_values_and_props() {
    let schema = schema(HERO);
    let doc = build(
        &schema,
        "Hero",
        &[HERO_HEADER, &["1", "Arthur", "", "3, 5", "atk:10,def:4", "2;-3", ""]],
    )
    .unwrap();
    let hero = entry(map(&doc.root, 1), 1);

    assert_eq!(hero.get(3), Some(&Value::Int(1)));
    assert!(!hero.has(3));
    assert_eq!(list(hero, 4), &[Value::Int(3), Value::Int(5)]);
    assert_eq!(
        map(hero, 5).get(&MapKey::String("def".into())),
        Some(&Value::Int(4))
    );
    let pos = hero.get(6).and_then(Value::as_message).unwrap();
    assert_eq!(pos.get(2), Some(&Value::Int(-3)));
    assert!(!hero.has(7));
}

#[test]
fn prop_violations() {
    let schema = schema(HERO);
    let cases: [([&str; 7], ErrorKind); 5] = [
        (
            ["1", "", "1", "", "", "", ""],
            ErrorKind::FieldNotPresent,
        ),
        (
            ["1", "Arthur", "101", "", "", "", ""],
            ErrorKind::ValueOutOfRange {
                value: "101".into(),
                range: "1,100".into(),
            },
        ),
        (
            ["1", "Arthur", "1", "2,0", "", "", ""],
            ErrorKind::ValueOutOfRange {
                value: "0".into(),
                range: "1,~".into(),
            },
        ),
        (
            ["1", "Arthur", "1", "2,,4", "", "", ""],
            ErrorKind::NonContiguous {
                missing: 2,
                present: 3,
            },
        ),
        (
            ["1", "Arthur", "1", "", "a:1,a:2", "", ""],
            ErrorKind::DuplicateKey { key: "a".into() },
        ),
    ];
    for (row, expected) in cases {
        let err = build(&schema, "Hero", &[HERO_HEADER, &row[..]]).unwrap_err();
        assert_eq!(err.kind(), &expected, "row {row:?}");
    }
}

#[test]
fn refer_checks_use_the_shared_cache() {
    let schema = schema(HERO);
    let cache = Arc::new(ReferCache::new(Arc::new(|reference: &Reference| {
        assert_eq!(reference.sheet, "Hero");
        Ok::<_, String>(["1", "2"].into_iter().map(String::from).collect::<ValueSpace>())
    })));
    let ctx = BuildContext::default().with_refer(cache.clone());

    build_with(
        &schema,
        "Hero",
        &[HERO_HEADER, &["1", "Arthur", "1", "", "", "", "2"]],
        &ctx,
    )
    .unwrap();
    assert_eq!(cache.len(), 1);

    let err = build_with(
        &schema,
        "Hero",
        &[HERO_HEADER, &["1", "Arthur", "1", "", "", "", "9"]],
        &ctx,
    )
    .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::ReferNotFound {
            reference: "Hero.ID".into(),
            value: "9".into()
        }
    );
}

#[test]
fn missing_columns_fail_unless_optional() {
    let schema = schema(HERO);
    let header = &HERO_HEADER[..6];
    build(&schema, "Hero", &[header, &["1", "Arthur", "1", "", "", ""]]).unwrap();

    let err = build(&schema, "Hero", &[&HERO_HEADER[..5], &["1", "Arthur", "1", "", ""]])
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::ColumnNotFound {
            name: "HeroPos".into()
        }
    );
}

#[test]
fn transposed_sheets_read_columns_as_records() {
    let schema = schema(
        r#"
messages:
  - name: GlobalConf
    fields:
      - { name: max_level, type: int32 }
      - { name: name, type: string }
sheets:
  - { message: GlobalConf, sheet: Global, typerow: 0, noterow: 0, transpose: true }
"#,
    );
    let doc = build(&schema, "Global", &[&["MaxLevel", "60"], &["Name", "Hero"]]).unwrap();
    assert_eq!(doc.root.get(1), Some(&Value::Int(60)));

    let err = build(&schema, "Global", &[&["MaxLevel", "high"], &["Name", "Hero"]]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidValue { .. }));
    assert_eq!(err.context().unwrap().position.as_deref(), Some("B1"));
}

#[test]
fn merger_tables_build_into_one_root() {
    let schema = schema(SHOP);
    let desc = schema.sheet("Shop").unwrap();
    let first = table("Shop", &[SHOP_HEADER, &["1", "1", "10"]]);
    let second = table("Shop2", &[SHOP_HEADER, &["2", "1", "15"]]);

    let doc = SheetParser::new(desc, &BuildContext::default())
        .build(&first, &[&second])
        .unwrap();
    assert_eq!(map(&doc.root, 1).len(), 2);
    assert_eq!(doc.sheet, "Shop");
}

/// Every present message field has at least one present field below it, and
/// every message without present fields reports nothing present.
fn assert_presence_consistent(msg: &Message) -> bool {
    let mut any = false;
    for (number, value) in msg.iter() {
        let explicit = match value {
            Value::Message(child) => assert_presence_consistent(child),
            Value::Map(entries) => {
                for entry in entries.values() {
                    if let Value::Message(child) = entry {
                        assert_presence_consistent(child);
                    }
                }
                !entries.is_empty()
            }
            _ => msg.has(number),
        };
        assert_eq!(msg.has(number), explicit, "field {number}");
        any |= explicit;
    }
    assert_eq!(any, !msg.is_empty());
    any
}

#[test]
fn presence_matches_explicit_leaves() {
    let schema = schema(SHOP);
    let doc = build(
        &schema,
        "Shop",
        &[SHOP_HEADER, &["1", "1", "10"], &["1", "2", ""], &["", "", ""]],
    )
    .unwrap();
    assert_eq!(assert_presence_consistent(&doc.root), doc.present);

    let goods = map(entry(map(&doc.root, 1), 1), 2);
    let second = entry(goods, 2);
    assert!(second.has(1));
    assert!(!second.has(2));
    assert_eq!(second.get(2), Some(&Value::Int(0)));
}

const LOOT: &str = r#"
messages:
  - name: LootConf
    fields:
      - { name: id, type: uint32, options: { name: LootID } }
      - { name: item_list, type: "[Item]", options: { key: ID, prop: { sequence: 1 } } }
      - { name: bonus_list, type: "[Item]", options: { key: ID, layout: incell } }
      - { name: drop_list, type: "[Item]" }
  - name: Item
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: num, type: int32 }
sheets:
  - { message: LootConf, sheet: Loot, typerow: 0, noterow: 0 }
"#;

const LOOT_HEADER: &[&str] = &[
    "LootID", "Item1ID", "Item1Num", "Item2ID", "Item2Num", "Bonus", "Drop1ID", "Drop1Num",
    "Drop2ID", "Drop2Num",
];

fn item(value: &Value) -> (Option<&Value>, Option<&Value>) {
    let msg = value.as_message().expect("item message");
    (msg.get(1), msg.get(2))
}

#[test]
fn keyed_horizontal_lists_check_keys() {
    let schema = schema(LOOT);
    let doc = build(
        &schema,
        "Loot",
        &[LOOT_HEADER, &["1", "1", "10", "2", "20", "", "", "", "", ""]],
    )
    .unwrap();
    let items = list(&doc.root, 2);
    assert_eq!(items.len(), 2);
    assert_eq!(item(&items[1]), (Some(&Value::Uint(2)), Some(&Value::Int(20))));

    let err = build(
        &schema,
        "Loot",
        &[LOOT_HEADER, &["1", "1", "10", "1", "20", "", "", "", "", ""]],
    )
    .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "1".into() });
    assert_eq!(err.context().unwrap().position.as_deref(), Some("D2"));

    let err = build(
        &schema,
        "Loot",
        &[LOOT_HEADER, &["1", "1", "10", "3", "30", "", "", "", "", ""]],
    )
    .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::KeyNotSequent {
            key: "3".into(),
            expected: 2
        }
    );

    let err = build(
        &schema,
        "Loot",
        &[LOOT_HEADER, &["1", "2", "10", "", "", "", "", "", "", ""]],
    )
    .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::KeyNotSequent {
            key: "2".into(),
            expected: 1
        }
    );
}

#[test]
fn keyed_incell_lists_check_keys() {
    let schema = schema(LOOT);
    let doc = build(
        &schema,
        "Loot",
        &[LOOT_HEADER, &["1", "", "", "", "", "7:1, 8:2", "", "", "", ""]],
    )
    .unwrap();
    let bonus = list(&doc.root, 3);
    assert_eq!(bonus.len(), 2);
    assert_eq!(item(&bonus[0]), (Some(&Value::Uint(7)), Some(&Value::Int(1))));
    assert_eq!(item(&bonus[1]), (Some(&Value::Uint(8)), Some(&Value::Int(2))));

    let err = build(
        &schema,
        "Loot",
        &[LOOT_HEADER, &["1", "", "", "", "", "7:1,7:2", "", "", "", ""]],
    )
    .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "7".into() });
    assert_eq!(err.context().unwrap().column.as_deref(), Some("Bonus"));
}

#[test]
fn unkeyed_horizontal_lists_of_messages_allow_repeats() {
    let schema = schema(LOOT);
    let doc = build(
        &schema,
        "Loot",
        &[LOOT_HEADER, &["1", "", "", "", "", "", "5", "1", "5", "2"]],
    )
    .unwrap();
    let drops = list(&doc.root, 4);
    assert_eq!(drops.len(), 2);
    assert_eq!(item(&drops[0]), (Some(&Value::Uint(5)), Some(&Value::Int(1))));
    assert_eq!(item(&drops[1]), (Some(&Value::Uint(5)), Some(&Value::Int(2))));
    assert!(!doc.root.has(2));
}

#[test]
fn embedded_messages_read_prefixed_columns() {
    let schema = schema(
        r#"
messages:
  - name: SpawnConf
    fields:
      - { name: id, type: uint32, options: { name: SpawnID } }
      - { name: pos, type: Vec2, options: { name: SpawnPos } }
  - name: Vec2
    fields:
      - { name: x, type: int32 }
      - { name: y, type: int32 }
sheets:
  - { message: SpawnConf, sheet: Spawn, typerow: 0, noterow: 0 }
"#,
    );
    let header: &[&str] = &["SpawnID", "SpawnPosX", "SpawnPosY"];

    let doc = build(&schema, "Spawn", &[header, &["1", "2", "-3"]]).unwrap();
    let pos = doc.root.get(2).and_then(Value::as_message).unwrap();
    assert_eq!(pos.get(1), Some(&Value::Int(2)));
    assert_eq!(pos.get(2), Some(&Value::Int(-3)));
    assert!(doc.root.has(2));

    let doc = build(&schema, "Spawn", &[header, &["1", "", ""]]).unwrap();
    assert!(!doc.root.has(2));

    let err = build(&schema, "Spawn", &[&header[..2], &["1", "2"]]).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::ColumnNotFound {
            name: "SpawnPosY".into()
        }
    );
}

const STAT: &str = r#"
messages:
  - name: StatConf
    fields:
      - { name: slot_list, type: "[int32]", options: { layout: incell, prop: { size: 4 } } }
      - { name: score_list, type: "[int32]", options: { layout: vertical } }
sheets:
  - { message: StatConf, sheet: Stat, typerow: 0, noterow: 0 }
"#;

#[test]
fn incell_lists_pad_to_size() {
    let schema = schema(STAT);
    let header: &[&str] = &["Slot", "Score"];

    let doc = build(&schema, "Stat", &[header, &["1,2", ""]]).unwrap();
    assert!(doc.root.has(1));
    assert_eq!(list(&doc.root, 1), &[
        Value::Int(1),
        Value::Int(2),
        Value::Int(0),
        Value::Int(0)
    ]);

    let doc = build(&schema, "Stat", &[header, &["", ""]]).unwrap();
    assert!(!doc.root.has(1));
    assert_eq!(list(&doc.root, 1).len(), 4);
}

#[test]
fn vertical_lists_of_scalars_take_one_row_each() {
    let schema = schema(STAT);
    let doc = build(
        &schema,
        "Stat",
        &[&["Slot", "Score"], &["", "10"], &["", ""], &["", "30"]],
    )
    .unwrap();
    assert!(doc.root.has(2));
    assert_eq!(list(&doc.root, 2), &[Value::Int(10), Value::Int(30)]);
}

#[test]
fn keyed_list_columns_inherit_blank_keys() {
    let schema = schema(
        r#"
messages:
  - name: GuideConf
    fields:
      - { name: stage_list, type: "[Stage]", options: { key: ID, layout: vertical } }
  - name: Stage
    fields:
      - { name: id, type: uint32, options: { name: ID } }
      - { name: step_list, type: "[int32]", options: { layout: vertical } }
sheets:
  - { message: GuideConf, sheet: Guide, noterow: 0 }
"#,
    );
    let doc = build(
        &schema,
        "Guide",
        &[
            &["StageID", "StageStep"],
            &["[Stage]<uint32>", "int32"],
            &["1", "5"],
            &["", "6"],
            &["2", "7"],
        ],
    )
    .unwrap();

    let stages = list(&doc.root, 1);
    assert_eq!(stages.len(), 2);
    let first = stages[0].as_message().unwrap();
    assert_eq!(first.get(1), Some(&Value::Uint(1)));
    assert_eq!(list(first, 2), &[Value::Int(5), Value::Int(6)]);
    assert_eq!(list(stages[1].as_message().unwrap(), 2), &[Value::Int(7)]);
}

#[test]
fn string_keys_ignore_surrounding_whitespace() {
    let schema = schema(
        r#"
messages:
  - name: TagConf
    fields:
      - { name: tag_map, type: "map<string, int32>" }
sheets:
  - { message: TagConf, sheet: Tag, typerow: 0, noterow: 0 }
"#,
    );
    let err = build(
        &schema,
        "Tag",
        &[&["TagKey", "TagValue"], &["a", "1"], &["a ", "2"]],
    )
    .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey { key: "a".into() });
    assert_eq!(err.context().unwrap().position.as_deref(), Some("A3"));
}

#[test]
fn map_props_apply_to_keys_only() {
    let schema = schema(
        r#"
messages:
  - name: ScoreConf
    fields:
      - name: score_map
        type: "map<uint32, int32>"
        options: { prop: { range: "1,9", default: "7", present: true } }
sheets:
  - { message: ScoreConf, sheet: Score, typerow: 0, noterow: 0 }
"#,
    );
    let header: &[&str] = &["ScoreKey", "ScoreValue"];

    let doc = build(&schema, "Score", &[header, &["1", ""], &["2", "50"]]).unwrap();
    let scores = map(&doc.root, 1);
    assert_eq!(scores.get(&MapKey::Uint(1)), Some(&Value::Int(0)));
    assert_eq!(scores.get(&MapKey::Uint(2)), Some(&Value::Int(50)));

    let err = build(&schema, "Score", &[header, &["10", "1"]]).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::ValueOutOfRange {
            value: "10".into(),
            range: "1,9".into()
        }
    );
}
