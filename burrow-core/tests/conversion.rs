#[cfg(test)]
mod tests {
    use burrow_core::{
        ConversionPolicy, Converter, ConverterConfig, CustomValue, Entity, Field, Native,
        NativeMap, StoreError, SubDocumentLayout, Value, ValueKind, WriterRegistry,
    };
    use std::sync::Arc;
    use time::{Date, Month};
    use uuid::Uuid;

    fn converter(layout: SubDocumentLayout) -> Converter {
        Converter::new(
            Arc::new(WriterRegistry::empty()),
            ConverterConfig {
                layout,
                ..Default::default()
            },
        )
    }

    fn scalar(value: impl Into<Value>) -> Native {
        Native::Scalar(value.into())
    }

    fn map<const N: usize>(entries: [(&str, Native); N]) -> Native {
        Native::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    fn person() -> Entity {
        let mut entity = Entity::new("person");
        entity
            .set("name", "Ada")
            .set("age", 36i32)
            .set("tags", vec!["math".to_string(), "engines".to_string()])
            .add(Field::documents(
                "address",
                vec![Field::new("city", "London"), Field::new("zip", "W1")],
            ));
        entity
    }

    #[test]
    fn singleton_write_shape() {
        let native = converter(SubDocumentLayout::Singleton)
            .to_native(&person())
            .unwrap();
        assert_eq!(
            native.keys().collect::<Vec<_>>(),
            ["name", "age", "tags", "address"]
        );
        assert_eq!(
            native["address"],
            Native::List(vec![
                map([("city", scalar("London"))]),
                map([("zip", scalar("W1"))]),
            ])
        );
        assert_eq!(
            native["tags"],
            Native::List(vec![scalar("math"), scalar("engines")])
        );
    }

    #[test]
    fn embedded_write_shape() {
        let native = converter(SubDocumentLayout::Embedded)
            .to_native(&person())
            .unwrap();
        assert_eq!(
            native["address"],
            map([("city", scalar("London")), ("zip", scalar("W1"))])
        );
    }

    #[test]
    fn single_document_is_a_singleton_map() {
        let mut entity = Entity::new("person");
        entity.add(Field::document("meta", Field::new("version", 3i64)));
        let converter = converter(SubDocumentLayout::Singleton);
        let native = converter.to_native(&entity).unwrap();
        assert_eq!(native["meta"], map([("version", scalar(3i64))]));
        let back = converter.from_native(native, "person");
        assert_eq!(
            back.find("meta").map(|v| &v.value),
            Some(&Value::Documents(vec![Field::new("version", 3i64)]))
        );
    }

    #[test]
    fn round_trip_singleton() {
        let converter = converter(SubDocumentLayout::Singleton);
        let mut entity = person();
        entity.add(Field::documents(
            "nested",
            vec![Field::documents(
                "inner",
                vec![Field::new("deep", true), Field::new("deeper", Value::Int8(None))],
            )],
        ));
        let native = converter.to_native(&entity).unwrap();
        assert_eq!(converter.from_native(native, "person"), entity);
    }

    #[test]
    fn round_trip_embedded_with_document_lists() {
        let converter = converter(SubDocumentLayout::Embedded);
        let mut entity = person();
        entity.add(Field::new(
            "phones",
            Value::List(
                Some(vec![
                    Value::Documents(vec![Field::new("kind", "home"), Field::new("n", 1i32)]),
                    Value::Documents(vec![Field::new("kind", "work"), Field::new("n", 2i32)]),
                ]),
                Box::new(Value::Documents(vec![])),
            ),
        ));
        let native = converter.to_native(&entity).unwrap();
        assert!(native["phones"].is_document_list());
        assert_eq!(converter.from_native(native, "person"), entity);
    }

    #[test]
    fn document_list_concatenates_under_singleton() {
        let converter = converter(SubDocumentLayout::Singleton);
        let mut native = NativeMap::new();
        native.insert(
            "items".into(),
            Native::List(vec![
                map([("a", scalar(1i32)), ("b", scalar(2i32))]),
                map([("c", scalar(3i32))]),
            ]),
        );
        let entity = converter.from_native(native, "things");
        assert_eq!(entity.collection(), "things");
        assert_eq!(
            entity.find("items").map(|v| &v.value),
            Some(&Value::Documents(vec![
                Field::new("a", 1i32),
                Field::new("b", 2i32),
                Field::new("c", 3i32),
            ]))
        );
    }

    #[test]
    fn heterogeneous_list_stays_opaque() {
        let converter = converter(SubDocumentLayout::Singleton);
        let mut native = NativeMap::new();
        native.insert(
            "mixed".into(),
            Native::List(vec![map([("a", scalar(1i32))]), scalar("loose")]),
        );
        let entity = converter.from_native(native, "things");
        assert_eq!(entity.len(), 1);
        let Some(Value::List(Some(values), ..)) = entity.find("mixed").map(|v| &v.value) else {
            panic!("Expected an opaque list");
        };
        assert_eq!(values.len(), 2);
        assert!(matches!(values[0], Value::Map(Some(..))));
        assert_eq!(values[1], Value::Varchar(Some("loose".into())));
    }

    #[test]
    fn opaque_map_keeps_the_key_order() {
        let converter = converter(SubDocumentLayout::Singleton);
        let mut native = NativeMap::new();
        native.insert(
            "mixed".into(),
            Native::List(vec![
                map([("z", scalar(1i32)), ("a", scalar(2i32)), ("m", scalar(3i32))]),
                scalar(4i32),
            ]),
        );
        let entity = converter.from_native(native, "things");
        let Some(Value::List(Some(values), ..)) = entity.find("mixed").map(|v| &v.value) else {
            panic!("Expected an opaque list");
        };
        let Value::Map(Some(opaque)) = &values[0] else {
            panic!("Expected an opaque map");
        };
        assert_eq!(opaque.keys().collect::<Vec<_>>(), ["z", "a", "m"]);
        assert_eq!(opaque["a"], Value::Int32(Some(2)));

        let written = converter.to_native_value(&values[0]).unwrap();
        let Native::Map(written) = written else {
            panic!("Expected a native map");
        };
        assert_eq!(written.keys().collect::<Vec<_>>(), ["z", "a", "m"]);
    }

    #[test]
    fn empty_list_is_not_a_document_list() {
        let converter = converter(SubDocumentLayout::Singleton);
        let mut native = NativeMap::new();
        native.insert("empty".into(), Native::List(vec![]));
        let entity = converter.from_native(native, "things");
        assert_eq!(
            entity.find("empty").map(|v| &v.value),
            Some(&Value::List(Some(vec![]), Box::new(Value::Null)))
        );
    }

    #[test]
    fn registered_writers_are_applied() {
        let converter = Converter::new(Arc::new(WriterRegistry::text()), Default::default());
        let uuid = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
        let date = Date::from_calendar_date(2024, Month::March, 9).unwrap();
        let mut entity = Entity::new("events");
        entity.set("id", uuid).set("day", date).set("count", 4i32);
        let native = converter.to_native(&entity).unwrap();
        assert_eq!(native["id"], scalar("5e915574-bb30-4430-98cf-c5854f61fbbd"));
        assert_eq!(native["day"], scalar("2024-03-09"));
        assert_eq!(native["count"], scalar(4i32));
    }

    #[derive(Debug)]
    struct Money {
        cents: i64,
    }

    #[test]
    fn custom_values_by_policy() {
        let mut entity = Entity::new("orders");
        entity.set("total", CustomValue::new(Money { cents: 1250 }));

        let passing = converter(SubDocumentLayout::Singleton);
        let native = passing.to_native(&entity).unwrap();
        assert!(matches!(native["total"], Native::Scalar(Value::Custom(..))));

        let strict = Converter::new(
            Arc::new(WriterRegistry::empty()),
            ConverterConfig {
                policy: ConversionPolicy::Strict,
                ..Default::default()
            },
        );
        let error = strict.to_native(&entity).unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::Conversion {
                kind: ValueKind::Custom,
                ..
            })
        ));

        let registry = WriterRegistry::builder()
            .custom::<Money, _>(|v| Ok(Value::Int64(Some(v.cents))))
            .build();
        let writing = Converter::new(
            Arc::new(registry),
            ConverterConfig {
                policy: ConversionPolicy::Strict,
                ..Default::default()
            },
        );
        let native = writing.to_native(&entity).unwrap();
        assert_eq!(native["total"], scalar(1250i64));
    }

    #[test]
    fn excluding_reserved_fields() {
        let converter = converter(SubDocumentLayout::Singleton);
        let mut entity = person();
        entity.set("_id", "k1");
        let native = converter.to_native_excluding(&entity, &["_id"]).unwrap();
        assert!(!native.contains_key("_id"));
        assert_eq!(native.len(), 4);
    }

    #[test]
    fn identity_fields() {
        let mut entity = person();
        entity.set("_rev", 1i64);
        let error = Converter::require_identity(&entity, "_id").unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::MissingIdentityField { field, .. }) if field == "_id"
        ));
        Converter::apply_identity(
            &mut entity,
            [Field::new("_id", "k1"), Field::new("_rev", 2i64)],
        );
        assert_eq!(entity.find_all("_rev").count(), 1);
        assert_eq!(entity.find("_rev").unwrap().get::<i64>().unwrap(), 2);
        assert_eq!(
            Converter::require_identity(&entity, "_id")
                .unwrap()
                .get::<String>()
                .unwrap(),
            "k1"
        );
        assert_eq!(entity.names().last(), Some("_rev"));
    }
}
