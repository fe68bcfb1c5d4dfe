use docmap::{DEFAULT_DISCRIMINATOR_FIELD, core::error::ErrorClass, prelude::*};

///
/// Order
/// Derived entity with a renamed, an unindexed and a skipped field.
///

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
#[mapped(kind = "orders")]
struct Order {
    #[mapped(key, auto)]
    id: i64,

    #[mapped(rename = "Customer")]
    customer: String,

    status: Status,

    #[mapped(unindexed)]
    note: String,

    shipment: Option<Parcel>,

    #[mapped(skip)]
    cached_total: u32,
}

#[derive(Clone, Copy, Debug, Default, Mapped, PartialEq)]
enum Status {
    #[default]
    Pending,
    Shipped = 5,
    Cancelled,
}

///
/// Parcel
/// Named family; `Letter` declares its membership.
///

#[derive(Clone, Debug, Mapped, PartialEq)]
#[mapped(family = "parcel")]
enum Parcel {
    #[mapped(tag = "letter")]
    Letter(Letter),
    Crate(Carton),
}

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
#[mapped(member_of = "Parcel")]
struct Letter {
    stamps: u8,
}

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
#[mapped(name = "Crate")]
struct Carton {
    weight: f64,
}

#[derive(Clone, Debug, Default, Mapped, PartialEq)]
struct Sku {
    #[mapped(key)]
    code: String,
}

fn order() -> Order {
    Order {
        customer: "Ada".to_string(),
        status: Status::Shipped,
        note: "leave at door".to_string(),
        shipment: Some(Parcel::Letter(Letter { stamps: 2 })),
        cached_total: 99,
        ..Order::default()
    }
}

#[test]
fn derived_entity_encodes_its_declared_properties() {
    let registry = Registry::new();
    let document = registry.encoder().encode(&order()).expect("encode");

    assert_eq!(
        document
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>(),
        ["Customer", "status", "note", "shipment"]
    );
    assert_eq!(document.get("status"), Some(&Value::Integer(5)));
    assert!(
        document
            .field("note")
            .is_some_and(|field| field.exclude_from_indexes)
    );

    let Some(Value::Document(shipment)) = document.get("shipment") else {
        panic!("shipment is a nested document");
    };
    assert_eq!(
        shipment.get(DEFAULT_DISCRIMINATOR_FIELD),
        Some(&Value::from("parcel.letter"))
    );
}

#[test]
fn derived_entity_round_trips_through_a_kind() {
    let registry = Registry::new();
    let store = MemoryStore::new();
    let orders: Kind<'_, Order, _> = Kind::new(&registry, &store).expect("Order kind");
    assert_eq!(orders.name(), "orders");

    let mut placed = order();
    orders.insert_one(&mut placed).expect("insert");
    assert_eq!(placed.id, 1);

    let found = orders.find(1).expect("find").expect("stored");
    assert_eq!(
        found,
        Order {
            cached_total: 0,
            ..placed
        },
        "skipped field comes back at its default"
    );
}

#[test]
fn derived_ordinals_follow_discriminants() {
    assert_eq!(Status::Pending.ordinal(), 0);
    assert_eq!(Status::Shipped.ordinal(), 5);
    assert_eq!(Status::Cancelled.ordinal(), 6);
    assert_eq!(Status::from_ordinal(6), Some(Status::Cancelled));
    assert_eq!(Status::from_ordinal(1), None);
}

#[test]
fn derived_family_uses_variant_name_as_default_tag() {
    let registry = Registry::new();
    let parcel = Parcel::Crate(Carton { weight: 12.5 });

    let value = registry.encoder().encode_value(&parcel).expect("encode");
    let Value::Document(document) = &value else {
        panic!("family member encodes as a document");
    };
    assert_eq!(
        document.get(DEFAULT_DISCRIMINATOR_FIELD),
        Some(&Value::from("parcel.Crate"))
    );

    let back: Parcel = registry.decoder().decode(&value).expect("decode");
    assert_eq!(back, parcel);
}

#[test]
fn member_of_builds_the_family_first() {
    let registry = Registry::new();
    registry.build::<Letter>().expect("build member");

    assert!(registry.describe::<Parcel>().is_some());
    assert!(registry.resolve_by_discriminator("parcel.letter").is_some());
}

#[test]
fn manual_string_key_is_derived() {
    let registry = Registry::new();
    let mapper = registry.mapper::<Sku>().expect("Sku is an entity");

    let key = mapper.build_key("A-1").expect("build key");
    assert_eq!(key, EntityKey::complete("Sku", "A-1"));
    assert_eq!(
        mapper.build_key(7).expect_err("integer id").class(),
        ErrorClass::TypeMismatch
    );
}
