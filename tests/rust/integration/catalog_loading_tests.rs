//! Integration tests for loading entity catalogs from YAML files

#[cfg(test)]
mod catalog_loading_tests {
    use std::io::Write;
    use std::path::PathBuf;

    use navrewrite::entity_catalog::{EntityCatalogConfig, EntityCatalogError};
    use navrewrite::query_planner::types::TypeRef;
    use test_case::test_case;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn test_shop_fixture_loads() -> anyhow::Result<()> {
        let catalog = EntityCatalogConfig::from_yaml_file(fixture("shop.yaml"))?.to_catalog()?;

        assert_eq!(catalog.name.as_deref(), Some("shop"));
        assert_eq!(
            catalog.entity_names(),
            vec![
                "Customer",
                "Order",
                "OrderLine",
                "Shipment",
                "VipCustomer",
                "Voucher"
            ]
        );
        // Lines, Order, Orders, Customer, Shipments, Vouchers
        assert_eq!(catalog.navigations().len(), 6);

        let shipments = catalog.find_navigation("OrderLine", "Shipments").unwrap();
        assert!(shipments.foreign_key.is_composite());
        let fk: Vec<&str> = shipments
            .foreign_key
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(fk, vec!["LineOrderId", "LineNo"]);
        assert_eq!(
            shipments.foreign_key.properties[1].ty,
            TypeRef::nullable_scalar("int")
        );

        let vouchers = catalog.find_navigation("VipCustomer", "Vouchers").unwrap();
        assert_eq!(vouchers.foreign_key.principal_key[0].declaring_entity, "VipCustomer");
        assert!(catalog.find_navigation("VipCustomer", "Orders").is_some());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = EntityCatalogConfig::from_yaml_file(fixture("does_not_exist.yaml"));
        assert!(matches!(
            result,
            Err(EntityCatalogError::ConfigReadError { .. })
        ));
    }

    #[test]
    fn test_catalog_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "entities:\n  - name: Tag\n    key: Id\n    properties:\n      Id: int\n"
        )
        .unwrap();

        let catalog = EntityCatalogConfig::from_yaml_file(file.path())
            .unwrap()
            .to_catalog()
            .unwrap();
        assert_eq!(catalog.primary_key("Tag").unwrap()[0].name, "Id");
        assert!(catalog.navigations().is_empty());
    }

    #[test_case(
        "entities:\n  - name: A\n    base: Missing\n",
        "UnknownBaseType";
        "unknown base type"
    )]
    #[test_case(
        "entities:\n  - name: A\n    key: Id\n    properties:\n      Id: int\n  - name: A\n    key: Id\n    properties:\n      Id: int\n",
        "DuplicateEntity";
        "duplicate entity"
    )]
    #[test_case(
        "entities:\n  - name: A\n    key: Id\n    properties:\n      Id: int??\n",
        "InvalidPropertyType";
        "unparseable property type"
    )]
    #[test_case(
        "entities:\n  - name: A\n    key: Id\n    properties:\n      Id: int\n  - name: B\n    base: A\n    key: Id\n",
        "InvalidConfig";
        "derived type redefines key"
    )]
    #[test_case(
        "entities: []\n",
        "InvalidConfig";
        "no entities"
    )]
    #[test_case(
        "entities:\n  - name: A\n    key: Id\n    properties:\n      Id: int\n  - name: B\n    key: Id\n    properties:\n      Id: int\n      AId: int\n      OtherAId: int\nrelationships:\n  - principal: A\n    dependent: B\n    foreign_key: AId\n    principal_navigation: Bs\n  - principal: A\n    dependent: B\n    foreign_key: OtherAId\n    principal_navigation: Bs\n",
        "DuplicateNavigation";
        "duplicate navigation"
    )]
    #[test_case(
        "entities:\n  - name: A\n    key: Id\n    properties:\n      Id: int\n  - name: B\n    key: Id\n    properties:\n      Id: int\nrelationships:\n  - principal: A\n    dependent: B\n    foreign_key: AId\n    principal_navigation: Bs\n",
        "Property";
        "unknown foreign key property"
    )]
    fn test_invalid_catalogs_rejected(yaml: &str, expected: &str) {
        let err = EntityCatalogConfig::from_yaml_str(yaml)
            .and_then(|config| config.to_catalog())
            .unwrap_err();
        let variant = format!("{:?}", err);
        assert!(
            variant.starts_with(expected),
            "expected {} error, got {:?}",
            expected,
            err
        );
    }
}
