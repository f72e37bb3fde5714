use tabulon_spec::{FieldKind, Layout, Manifest, SchemaError};

fn load_fixture(name: &str) -> Manifest {
    let path = format!("tests/fixtures/{}.yaml", name);
    let text = std::fs::read_to_string(path).expect("failed to read fixture");
    serde_yaml::from_str::<Manifest>(&text).expect("fixture should deserialize")
}

#[test]
fn item_conf_fixture_validates() {
    let manifest = load_fixture("item_conf");
    manifest.validate().expect("fixture should validate");
}

#[test]
fn item_conf_fixture_resolves() {
    let schema = load_fixture("item_conf").resolve().expect("fixture should resolve");
    let sheet = schema.sheet("Item").expect("sheet Item");
    assert_eq!(sheet.message.name, "ItemConf");
    assert_eq!(sheet.sep, ",");
    assert_eq!(sheet.subsep, ":");
    assert_eq!(sheet.timezone, "+08:00");
    assert_eq!(sheet.header.datarow, 4);

    let item = schema.message("Item").expect("message Item");
    let target = item.field("target").expect("target field");
    let FieldKind::Union(union) = &target.kind else {
        panic!("target should be a union, got {}", target.kind);
    };
    assert_eq!(union.type_field, "Type");
    assert_eq!(union.value_field, "Field");
    assert_eq!(union.variant(2).map(|v| v.message.name.as_str()), Some("Pve"));
    assert!(union.variant(0).is_none());

    let prices = item.field("price_list").expect("price_list");
    assert_eq!(prices.annotation.layout, Some(Layout::Incell));
    assert_eq!(prices.number, 4);
}

#[test]
fn union_zero_discriminator_rejected() {
    let mut manifest = load_fixture("item_conf");
    manifest.unions[0].variants[0].value = "TARGET_TYPE_NONE".to_string();
    let err = manifest.validate().expect_err("validation should fail");
    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].path, "unions[0].variants[0].value");
}

#[test]
fn bad_props_are_collected_together() {
    let mut manifest = load_fixture("item_conf");
    let item = manifest
        .messages
        .iter_mut()
        .find(|m| m.name == "Item")
        .expect("Item message");
    let options = item.fields[3].options.as_mut().expect("price_list options");
    let prop = options.prop.as_mut().expect("price_list prop");
    prop.range = Some("1".to_string());
    prop.refer = Some("NoColumn".to_string());
    prop.size = Some(0);

    let err = manifest.validate().expect_err("validation should fail");
    let paths: Vec<_> = err.issues().iter().map(|i| i.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "messages[1].fields[3].options.prop.range",
            "messages[1].fields[3].options.prop.refer",
            "messages[1].fields[3].options.prop.size",
        ]
    );
}

#[test]
fn resolve_surfaces_validation_errors() {
    let mut manifest = load_fixture("item_conf");
    manifest.sheets[0].message = "Missing".to_string();
    match manifest.resolve() {
        Err(SchemaError::Invalid(err)) => {
            assert_eq!(err.issues()[0].path, "sheets[0].message");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn yaml_roundtrip_preserves_manifest() {
    let manifest = load_fixture("item_conf");
    let yaml = manifest.to_yaml().expect("serialize");
    let reparsed: Manifest = yaml.parse().expect("reparse");
    reparsed.validate().expect("reparsed manifest should validate");
    assert_eq!(reparsed.messages.len(), manifest.messages.len());
    assert_eq!(reparsed.spec_version, manifest.spec_version);
}

#[test]
fn generated_schema_is_well_formed() {
    let value = tabulon_spec::generate_schema_value();
    assert!(value.is_object(), "schema root should be an object");
    assert!(tabulon_spec::generate_schema_json_pretty().contains("spec_version"));
}
